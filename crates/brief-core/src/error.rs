use thiserror::Error;

#[derive(Error, Debug)]
pub enum BriefError {
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Not found: {0}")]
    NotFound(String),
}
