use thiserror::Error;

#[derive(Debug, Error)]
pub enum SegmentError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt segment: {0}")]
    Corrupt(String),

    #[error("refusing to write an empty segment")]
    EmptyInput,
}
