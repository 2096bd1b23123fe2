use thiserror::Error;

/// Errors shared by every PropAMM analytics crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PammError {
    #[error("invalid event kind: {0:?}")]
    InvalidEventKind(String),

    #[error("invalid time window: start {start} is not before end {end}")]
    InvalidTimeWindow { start: i64, end: i64 },

    #[error("invalid time bin width: {0} seconds")]
    InvalidBinWidth(i64),

    #[error("invalid rank range: {first}..={last}")]
    InvalidRankRange { first: usize, last: usize },

    #[error("timestamp out of range: {0}")]
    TimestampOutOfRange(i64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_window_error_display() {
        let err = PammError::InvalidTimeWindow { start: 10, end: 5 };
        assert!(err.to_string().contains("start 10"));
    }

    #[test]
    fn test_rank_range_error_display() {
        let err = PammError::InvalidRankRange { first: 30, last: 21 };
        assert_eq!(err.to_string(), "invalid rank range: 30..=21");
    }
}
