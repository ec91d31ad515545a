pub mod response;
pub mod validation;

pub use response::{ApiError, ApiResponse};
pub use validation::validate_dto;
