use thiserror::Error;

#[derive(Error, Debug)]
pub enum TxError {
    #[error("Empty prompt")]
    EmptyPrompt,
    #[error("No tractatus provided")]
    MissingTractatus,
    #[error("A request is already in progress")]
    Busy,
    #[error("Config error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, TxError>;
