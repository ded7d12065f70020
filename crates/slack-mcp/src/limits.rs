//! Slack numeric and size limits, enforced before any request is made.

use crate::envelope::Failure;
use thiserror::Error;

/// Smallest page size / result count accepted by Slack.
pub const MIN_COUNT: u32 = 1;

/// Largest page size / result count the gateway requests.
pub const MAX_COUNT: u32 = 100;

/// Upload ceiling: 1 GiB.
pub const MAX_FILE_SIZE: u64 = 1 << 30;

/// Limit violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LimitError {
    /// File exceeds [`MAX_FILE_SIZE`].
    #[error("File too large: {size} bytes exceeds the {limit} byte upload limit")]
    FileTooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Ceiling in bytes.
        limit: u64,
    },
}

impl From<LimitError> for Failure {
    fn from(err: LimitError) -> Self {
        Failure::new(err.to_string())
    }
}

/// Clamp a requested count into `[MIN_COUNT, MAX_COUNT]`.
///
/// Out-of-range values are silently capped or raised, never rejected.
pub fn clamp_count(requested: i64) -> u32 {
    requested.clamp(i64::from(MIN_COUNT), i64::from(MAX_COUNT)) as u32
}

/// Reject payloads larger than [`MAX_FILE_SIZE`].
pub fn check_file_size(bytes: u64) -> Result<(), LimitError> {
    if bytes > MAX_FILE_SIZE {
        return Err(LimitError::FileTooLarge {
            size: bytes,
            limit: MAX_FILE_SIZE,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_count_bounds() {
        assert_eq!(clamp_count(0), 1);
        assert_eq!(clamp_count(-5), 1);
        assert_eq!(clamp_count(1000), 100);
        assert_eq!(clamp_count(37), 37);
        assert_eq!(clamp_count(1), 1);
        assert_eq!(clamp_count(100), 100);
        assert_eq!(clamp_count(i64::MAX), 100);
        assert_eq!(clamp_count(i64::MIN), 1);
    }

    #[test]
    fn test_clamp_count_always_in_range() {
        for n in -300..300 {
            let clamped = clamp_count(n);
            assert!((MIN_COUNT..=MAX_COUNT).contains(&clamped), "{} -> {}", n, clamped);
        }
    }

    #[test]
    fn test_check_file_size() {
        assert!(check_file_size(0).is_ok());
        assert!(check_file_size(MAX_FILE_SIZE).is_ok());
        assert_eq!(
            check_file_size(MAX_FILE_SIZE + 1),
            Err(LimitError::FileTooLarge {
                size: MAX_FILE_SIZE + 1,
                limit: MAX_FILE_SIZE,
            })
        );
    }

    #[test]
    fn test_limits_are_repeatable() {
        assert_eq!(clamp_count(250), clamp_count(250));
        assert_eq!(
            check_file_size(MAX_FILE_SIZE + 7),
            check_file_size(MAX_FILE_SIZE + 7)
        );
    }

    #[test]
    fn test_limit_error_into_failure() {
        let failure: Failure = check_file_size(MAX_FILE_SIZE + 1).unwrap_err().into();
        assert!(failure.error.starts_with("File too large"));
        assert!(failure.details.is_none());
    }
}
