use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Chunk size must be at least 1")]
    InvalidChunkSize,

    #[error("Invalid option: {0}")]
    InvalidOption(String),
}
