use thiserror::Error;

/// Errors raised by the metric engine and its collaborators.
///
/// `InvalidInput` and `EmptySurface` come from the engine itself and are
/// downgraded to unavailable metrics by [`crate::metrics::MetricEvaluator`].
/// `Load` and `Codec` come from collaborators and abort a single
/// mesh / quantization level combination.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Empty surface: {0}")]
    EmptySurface(String),
    #[error("Load error: {0}")]
    Load(String),
    #[error("Codec error: {0}")]
    Codec(String),
    #[error("IO error: {0}")]
    Io(String),
}

pub type Status = Result<(), Error>;

pub type StatusResult<T> = Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

pub fn ok_status() -> Status {
    Ok(())
}

pub fn invalid_input(msg: impl Into<String>) -> Error {
    Error::InvalidInput(msg.into())
}

pub fn codec_error(msg: impl Into<String>) -> Error {
    Error::Codec(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = invalid_input("empty point set");
        assert_eq!(err.to_string(), "Invalid input: empty point set");

        let err = Error::EmptySurface("mesh has no faces".into());
        assert_eq!(err.to_string(), "Empty surface: mesh has no faces");
    }

    #[test]
    fn test_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_error.into();
        assert!(matches!(err, Error::Io(ref msg) if msg.contains("file not found")));
    }

    #[test]
    fn test_ok_status() {
        assert!(ok_status().is_ok());
        assert_eq!(codec_error("bad magic"), Error::Codec("bad magic".to_string()));
    }
}
