use thiserror::Error;

/// Recoverable runtime conditions reported by the core.
///
/// Programming errors (double publish of a record, dropping a held mutex,
/// flag bits outside the valid width) are not represented here: they panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum Error {
    #[error("operation timed out")]
    Timeout,
    #[error("resource not available")]
    Resource,
    #[error("blocking call attempted from interrupt context")]
    WouldBlockInInterrupt,
    #[error("operation not allowed from interrupt context")]
    InvalidInInterrupt,
    #[error("calling thread does not own the mutex")]
    NotOwned,
    #[error("index out of bounds")]
    OutOfBounds,
    #[error("invalid parameter")]
    InvalidParameter,
    #[error("invalid format string or argument")]
    InvalidFormat,
    #[error("out of memory")]
    OutOfMemory,
    #[error("resource still in use")]
    InUse,
}

impl Error {
    /// Static description, usable where allocating a message is not an option.
    pub fn as_str(self) -> &'static str {
        match self {
            Error::Timeout => "Operation timed out",
            Error::Resource => "Resource not available",
            Error::WouldBlockInInterrupt => "Blocking call attempted from interrupt context",
            Error::InvalidInInterrupt => "Operation not allowed from interrupt context",
            Error::NotOwned => "Calling thread does not own the mutex",
            Error::OutOfBounds => "Index out of bounds",
            Error::InvalidParameter => "Invalid parameter",
            Error::InvalidFormat => "Invalid format string or argument",
            Error::OutOfMemory => "Out of memory",
            Error::InUse => "Resource still in use",
        }
    }

    /// Whether the error came from a wait that ran out of time, as opposed
    /// to a zero-timeout poll.
    pub fn is_timeout(self) -> bool {
        self == Error::Timeout
    }
}

pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_static_message_case_insensitively() {
        let all = [
            Error::Timeout,
            Error::Resource,
            Error::WouldBlockInInterrupt,
            Error::InvalidInInterrupt,
            Error::NotOwned,
            Error::OutOfBounds,
            Error::InvalidParameter,
            Error::InvalidFormat,
            Error::OutOfMemory,
            Error::InUse,
        ];
        for err in all {
            assert_eq!(err.to_string().to_lowercase(), err.as_str().to_lowercase());
        }
    }

    #[test]
    fn test_is_timeout() {
        assert!(Error::Timeout.is_timeout());
        assert!(!Error::Resource.is_timeout());
    }
}
