use std::fmt;

/// Counters for one run of the controller. Reset on process start,
/// reported at shutdown, never persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub new_visitors: u64,
    pub returning_visitors: u64,
    /// Accepted face regions processed, regardless of match outcome.
    pub total_detections: u64,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} detections, {} new, {} returning",
            self.total_detections, self.new_visitors, self.returning_visitors
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_zero() {
        let stats = SessionStats::new();
        assert_eq!(stats.new_visitors, 0);
        assert_eq!(stats.returning_visitors, 0);
        assert_eq!(stats.total_detections, 0);
    }

    #[test]
    fn test_display_format() {
        let stats = SessionStats {
            new_visitors: 2,
            returning_visitors: 3,
            total_detections: 5,
        };
        assert_eq!(stats.to_string(), "5 detections, 2 new, 3 returning");
    }
}
