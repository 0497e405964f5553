use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unknown strategy template '{name}', valid templates: {}", .valid.join(", "))]
    UnknownTemplate {
        name: String,
        valid: Vec<&'static str>,
    },
}

pub type Result<T> = std::result::Result<T, EngineError>;
