pub mod prelude;

pub mod user_drugs;
pub mod users;
