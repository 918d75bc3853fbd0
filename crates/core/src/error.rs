use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PostforgeError {
    #[error("invalid value for {field}: '{value}'")]
    InvalidValue { field: &'static str, value: String },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("illegal status transition: {from} -> {to}")]
    IllegalTransition { from: String, to: String },
}
