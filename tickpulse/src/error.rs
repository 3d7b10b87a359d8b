use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All errors generated in `tickpulse`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Error)]
pub enum TickpulseError {
    #[error("invalid price tick: {0:?}")]
    InvalidPrice(String),

    #[error("momentum engine has not been seeded with a valid price")]
    Uninitialized,

    #[error("settings schema version mismatch: found {found}, expected {expected}")]
    ConfigMismatch { found: u32, expected: u32 },

    #[error("invalid threshold profile: {0}")]
    InvalidProfile(String),

    #[error("failed to parse settings: {0}")]
    Settings(String),

    #[error("transport: {0}")]
    Transport(String),
}

impl TickpulseError {
    /// Determine if an error can be absorbed locally without stopping the pipeline.
    ///
    /// Only a transport failure that reports a bind/listen problem is fatal, everything
    /// else is either dropped input or a fallback to defaults.
    #[allow(clippy::match_like_matches_macro)]
    pub fn is_recoverable(&self) -> bool {
        match self {
            TickpulseError::Transport(error_msg) => {
                let error_lower = error_msg.to_lowercase();
                !(error_lower.contains("bind") || error_lower.contains("address in use"))
            }
            _ => true,
        }
    }
}

impl From<serde_json::Error> for TickpulseError {
    fn from(value: serde_json::Error) -> Self {
        Self::Settings(value.to_string())
    }
}

impl From<reqwest::Error> for TickpulseError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tickpulse_error_is_recoverable() {
        struct TestCase {
            input: TickpulseError,
            expected: bool,
        }

        let tests = vec![
            TestCase {
                // TC0: bad tick is dropped
                input: TickpulseError::InvalidPrice("-1".to_string()),
                expected: true,
            },
            TestCase {
                // TC1: schema mismatch falls back to defaults
                input: TickpulseError::ConfigMismatch {
                    found: 1,
                    expected: 2,
                },
                expected: true,
            },
            TestCase {
                // TC2: quote request failure is retried next interval
                input: TickpulseError::Transport("error sending request".to_string()),
                expected: true,
            },
            TestCase {
                // TC3: listener cannot bind
                input: TickpulseError::Transport("failed to bind 0.0.0.0:9101".to_string()),
                expected: false,
            },
            TestCase {
                // TC4: port already taken
                input: TickpulseError::Transport("Address in use (os error 98)".to_string()),
                expected: false,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = test.input.is_recoverable();
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_from_serde_json_error() {
        let error = serde_json::from_str::<u32>("not json").unwrap_err();
        assert!(matches!(
            TickpulseError::from(error),
            TickpulseError::Settings(_)
        ));
    }
}
