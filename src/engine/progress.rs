use crate::types::Progress;

/// Turns byte counts into progress events.
///
/// Fractions stay strictly below 1.0; the terminal [`Progress::DONE`] is the
/// engine's to emit once the output has been finalized.
#[derive(Debug)]
pub struct Tracker {
    total: Option<u64>,
    processed: u64,
}

impl Tracker {
    pub const fn new(total: Option<u64>) -> Self {
        Self { total, processed: 0 }
    }

    /// Records `n` more bytes and returns the event to report, if any.
    #[allow(clippy::cast_precision_loss)]
    pub fn advance(&mut self, n: usize) -> Option<Progress> {
        self.processed += n as u64;

        match self.total {
            None => Some(Progress::Indeterminate),
            Some(0) => None,
            Some(total) => {
                let fraction = self.processed as f64 / total as f64;
                (fraction < 1.0).then_some(Progress::Fraction(fraction))
            }
        }
    }

    #[inline]
    pub const fn processed(&self) -> u64 {
        self.processed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fractions_stay_below_one() {
        let mut tracker = Tracker::new(Some(100));
        assert_eq!(tracker.advance(25), Some(Progress::Fraction(0.25)));
        assert_eq!(tracker.advance(50), Some(Progress::Fraction(0.75)));
        assert_eq!(tracker.advance(25), None);
        assert_eq!(tracker.processed(), 100);
    }

    #[test]
    fn test_undersized_hint_is_suppressed() {
        let mut tracker = Tracker::new(Some(10));
        assert_eq!(tracker.advance(20), None);
        assert_eq!(tracker.advance(20), None);
    }

    #[test]
    fn test_unknown_total_is_indeterminate() {
        let mut tracker = Tracker::new(None);
        assert!(tracker.advance(8).unwrap().is_indeterminate());
        assert_eq!(Tracker::new(Some(0)).advance(1), None);
    }
}
