use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpinMapError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("geometry error: {0}")]
    Geometry(String),

    #[error("numerical error: {0}")]
    Numerical(String),

    #[error("analysis cancelled")]
    Cancelled,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SpinMapError>;
