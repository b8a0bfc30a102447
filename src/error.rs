use core::fmt;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A layout was rejected at construction time.
    InvalidLayout(String),
    /// The response body is not valid JSON.
    Json(String),
    /// The response body could not be decompressed.
    Decompress(String),
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidLayout(msg) => write!(f, "invalid layout: {msg}"),
            Error::Json(msg) => write!(f, "invalid envelope json: {msg}"),
            Error::Decompress(msg) => write!(f, "decompression failed: {msg}"),
            Error::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e.to_string())
    }
}
