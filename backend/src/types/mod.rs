mod environment;
mod error;
mod extractors;

pub use environment::{ConfigError, Environment};
pub use error::{ApiErrorResponse, AppError, PROCESSING_FAILED_MESSAGE};
pub use extractors::{
    ResumeForm, FILE_FIELD, FIRST_NAME_FIELD, LAST_NAME_FIELD, RECIPIENT_FIELD,
};
