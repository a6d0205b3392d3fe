pub mod rxnav;

pub use rxnav::{RxNavClient, UpstreamError};
