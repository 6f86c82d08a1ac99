use std::fmt;

/// Result type for termloop operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types shared across the termloop crates
#[derive(Debug)]
pub enum Error {
    /// Pop/top/lookup on a history buffer with zero entries
    EmptyBuffer,

    /// History lookup outside the live range `[0, len)`
    IndexOutOfRange { index: usize, len: usize },

    /// Engine operation after `dispose()`
    Disposed,

    /// Terminal primitive failed (raw mode, cursor movement, write)
    Terminal(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyBuffer => write!(f, "History buffer is empty"),
            Error::IndexOutOfRange { index, len } => {
                write!(f, "History index {} out of range (len {})", index, len)
            }
            Error::Disposed => write!(f, "Console engine has been disposed"),
            Error::Terminal(err) => write!(f, "Terminal error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Terminal(err) => Some(err),
            Error::EmptyBuffer | Error::IndexOutOfRange { .. } | Error::Disposed => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Terminal(err)
    }
}
