//! Data Transfer Objects for the asset API.

pub mod request;
pub mod response;
pub mod validation;

pub use request::*;
pub use response::*;
pub use validation::{validate_name_field, ValidatedJson};
