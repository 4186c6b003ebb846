use std::fmt;

#[derive(Debug)]
pub enum NoticeError {
    InvalidArgument(String),
    Asset(String),
    Pdf(String),
    Io(std::io::Error),
}

impl fmt::Display for NoticeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoticeError::InvalidArgument(message) => write!(f, "invalid argument: {}", message),
            NoticeError::Asset(message) => write!(f, "asset error: {}", message),
            NoticeError::Pdf(message) => write!(f, "pdf error: {}", message),
            NoticeError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for NoticeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NoticeError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for NoticeError {
    fn from(value: std::io::Error) -> Self {
        NoticeError::Io(value)
    }
}

impl From<lopdf::Error> for NoticeError {
    fn from(value: lopdf::Error) -> Self {
        NoticeError::Pdf(value.to_string())
    }
}
