//! Day-rollover policy.
//!
//! Quota counters are zeroed whenever the stored reset date differs from
//! today's calendar date. This is a calendar-day boundary, not a rolling
//! 24-hour window.

use chrono::NaiveDate;

/// What a caller has to do to bring a stored record up to `today`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rollover {
    /// The record already belongs to today.
    Current,
    /// The record has never been stamped with a date.
    Initialize,
    /// The record belongs to an earlier (or otherwise different) day.
    Reset,
}

impl Rollover {
    pub fn is_required(self) -> bool {
        !matches!(self, Rollover::Current)
    }
}

/// `true` iff counters must be zeroed before `today` can be evaluated.
pub fn should_reset(last_reset_date: Option<NaiveDate>, today: NaiveDate) -> bool {
    last_reset_date != Some(today)
}

/// Same decision as [`should_reset`], labelled for logging.
pub fn classify(last_reset_date: Option<NaiveDate>, today: NaiveDate) -> Rollover {
    match last_reset_date {
        None => Rollover::Initialize,
        Some(date) if date == today => Rollover::Current,
        Some(_) => Rollover::Reset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn test_same_day_is_current() {
        assert!(!should_reset(Some(day(4)), day(4)));
        assert_eq!(classify(Some(day(4)), day(4)), Rollover::Current);
    }

    #[test]
    fn test_different_day_resets() {
        assert!(should_reset(Some(day(3)), day(4)));
        assert_eq!(classify(Some(day(3)), day(4)), Rollover::Reset);
        // A date in the future still differs from today.
        assert!(should_reset(Some(day(5)), day(4)));
    }

    #[test]
    fn test_missing_date_initializes() {
        assert!(should_reset(None, day(4)));
        assert_eq!(classify(None, day(4)), Rollover::Initialize);
        assert!(Rollover::Initialize.is_required());
        assert!(!Rollover::Current.is_required());
    }
}
