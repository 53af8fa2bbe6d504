use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalyzerError>;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Store error: {0}")]
    Store(#[from] codemap_store::StoreError),

    #[error("Graph error: {0}")]
    Graph(#[from] codemap_graph::GraphError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid exclude pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Source loading task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
