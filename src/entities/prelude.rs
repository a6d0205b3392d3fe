pub use super::user_drugs::Entity as UserDrugs;
pub use super::users::Entity as Users;
