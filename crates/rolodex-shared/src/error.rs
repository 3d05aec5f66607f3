use thiserror::Error;

/// Errors raised while loading the tabular record snapshot.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
