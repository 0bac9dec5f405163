use thiserror::Error;

#[derive(Debug, Error)]
pub enum LiveError {
    #[error("traffic feed {feed} unavailable: {reason}")]
    Unavailable { feed: String, reason: String },

    #[error("traffic feed {feed} returned no segments for {area}")]
    Empty { feed: String, area: String },

    #[error("traffic CSV parse error: {0}")]
    Parse(String),

    #[error("updater task failed: {0}")]
    Task(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type LiveResult<T> = Result<T, LiveError>;
