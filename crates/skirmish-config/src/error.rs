//! Errors raised while loading or persisting `config.ron`.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Creating the config directory or writing the file failed.
    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not RON describing a [`crate::Config`]. The span in
    /// `source` points at the offending line and column.
    #[error("{} is not a valid skirmish config: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },

    #[error("cannot encode config: {0}")]
    Serialize(#[source] ron::Error),

    /// A setting parsed but the connection manager or grid cannot use it.
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_file_and_field() {
        let err = ConfigError::Read {
            path: PathBuf::from("/tmp/skirmish/config.ron"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.to_string(), "cannot read /tmp/skirmish/config.ron: denied");

        let err = ConfigError::Invalid {
            field: "connection.jitter",
            reason: "must be in [0.0, 1.0), got 1.5".to_string(),
        };
        assert_eq!(err.to_string(), "invalid connection.jitter: must be in [0.0, 1.0), got 1.5");
    }
}
