//! Error type shared by every client library call.
//!
//! Each variant maps onto a stable numeric return code through
//! [`UrosError::code`], so applications can print the same status numbers
//! an embedded client would report.

use thiserror::Error;

pub type UrosResult<T> = Result<T, UrosError>;

#[derive(Debug, Error)]
pub enum UrosError {
    #[error("operation timed out")]
    Timeout,

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("allocation failed: {0}")]
    BadAlloc(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("context already initialized")]
    AlreadyInit,

    #[error("context not initialized")]
    NotInit,

    #[error("invalid topic name '{name}': {reason}")]
    TopicNameInvalid { name: String, reason: String },

    #[error("context already shut down")]
    AlreadyShutdown,

    #[error("node '{0}' is invalid")]
    NodeInvalid(String),

    #[error("invalid node name '{name}': {reason}")]
    NodeInvalidName { name: String, reason: String },

    #[error("invalid node namespace '{namespace}': {reason}")]
    NodeInvalidNamespace { namespace: String, reason: String },

    #[error("publisher on '{0}' is invalid")]
    PublisherInvalid(String),

    #[error("subscription on '{0}' is invalid")]
    SubscriptionInvalid(String),

    #[error("no message available on '{0}'")]
    SubscriptionTakeFailed(String),

    #[error("timer is invalid")]
    TimerInvalid,

    #[error("timer is canceled")]
    TimerCanceled,

    #[error("executor is full (capacity {capacity})")]
    ExecutorFull { capacity: usize },

    #[error("topic '{topic}' carries '{existing}', cannot attach '{requested}'")]
    TypeMismatch {
        topic: String,
        existing: String,
        requested: String,
    },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("parameter error: {0}")]
    Parameter(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl UrosError {
    /// Numeric return code of this error.
    pub fn code(&self) -> i32 {
        match self {
            UrosError::Timeout => 2,
            UrosError::Unsupported(_) => 3,
            UrosError::BadAlloc(_) => 10,
            UrosError::InvalidArgument(_)
            | UrosError::TypeMismatch { .. }
            | UrosError::Config(_)
            | UrosError::Parameter(_) => 11,
            UrosError::AlreadyInit => 100,
            UrosError::NotInit => 101,
            UrosError::TopicNameInvalid { .. } => 103,
            UrosError::AlreadyShutdown => 106,
            UrosError::NodeInvalid(_) => 200,
            UrosError::NodeInvalidName { .. } => 201,
            UrosError::NodeInvalidNamespace { .. } => 202,
            UrosError::PublisherInvalid(_) => 300,
            UrosError::SubscriptionInvalid(_) => 400,
            UrosError::SubscriptionTakeFailed(_) => 401,
            UrosError::TimerInvalid => 800,
            UrosError::TimerCanceled => 801,
            UrosError::ExecutorFull { .. }
            | UrosError::Transport(_)
            | UrosError::Serialization(_)
            | UrosError::Io(_)
            | UrosError::Internal(_) => 1,
        }
    }

    /// Shorthand for a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        UrosError::Config(msg.into())
    }

    /// Shorthand for an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        UrosError::InvalidArgument(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_client_return_values() {
        assert_eq!(UrosError::Timeout.code(), 2);
        assert_eq!(UrosError::NotInit.code(), 101);
        assert_eq!(
            UrosError::NodeInvalidName {
                name: "9x".into(),
                reason: "starts with a digit".into()
            }
            .code(),
            201
        );
        assert_eq!(UrosError::ExecutorFull { capacity: 3 }.code(), 1);
        assert_eq!(UrosError::TimerCanceled.code(), 801);
    }

    #[test]
    fn io_errors_convert() {
        let err: UrosError = std::io::Error::new(std::io::ErrorKind::Other, "boom").into();
        assert!(matches!(err, UrosError::Io(_)));
        assert!(err.to_string().contains("boom"));
    }
}
