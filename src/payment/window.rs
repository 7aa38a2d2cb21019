//! Time-of-day payment gating in the store's civil timezone.
//!
//! During the night window (late hour through early hour, wrapping
//! midnight) only QR payment is offered. The policy is evaluated twice per
//! checkout: when the method keyboard is built and again when a method is
//! selected, since the window boundary can be crossed mid-conversation.

use crate::config::Config;
use chrono::{FixedOffset, NaiveDateTime, Timelike, Utc};
use chrono_tz::Tz;

const MOSCOW_UTC_OFFSET_SECS: i32 = 3 * 3600;

#[derive(Debug, Clone)]
pub struct PaymentWindow {
    tz_name: String,
    early_hour: u32,
    late_hour: u32,
}

impl PaymentWindow {
    pub fn new(tz_name: impl Into<String>, early_hour: u32, late_hour: u32) -> Self {
        Self {
            tz_name: tz_name.into(),
            early_hour,
            late_hour,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.store_tz.clone(),
            config.early_payment_hour,
            config.late_payment_hour,
        )
    }

    pub fn early_hour(&self) -> u32 {
        self.early_hour
    }

    pub fn late_hour(&self) -> u32 {
        self.late_hour
    }

    /// Current wall-clock time in the store timezone. When the tz-database
    /// lookup fails the fixed UTC+3 fallback applies; that is safe only
    /// because Moscow has no daylight-saving transitions.
    pub fn store_now(&self) -> NaiveDateTime {
        match self.tz_name.parse::<Tz>() {
            Ok(tz) => Utc::now().with_timezone(&tz).naive_local(),
            Err(_) => {
                let offset = FixedOffset::east_opt(MOSCOW_UTC_OFFSET_SECS).unwrap();
                Utc::now().with_timezone(&offset).naive_local()
            }
        }
    }

    /// True while only QR payment is permitted.
    pub fn is_restricted(&self) -> bool {
        self.is_restricted_hour(self.store_now().hour())
    }

    /// Pure hour check: restricted in `[late_hour, 24) ∪ [0, early_hour)`.
    pub fn is_restricted_hour(&self, hour: u32) -> bool {
        hour >= self.late_hour || hour < self.early_hour
    }

    /// Operator-facing timestamp, e.g. `24.08 19:05 МСК`.
    pub fn timestamp(&self) -> String {
        self.store_now().format("%d.%m %H:%M МСК").to_string()
    }

    /// Order identifier minted from the current store time. Good enough for
    /// display and operator correlation, not a global uniqueness guarantee.
    pub fn mint_order_id(&self) -> String {
        self.store_now().format("%y%m%d-%H%M%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_window() -> PaymentWindow {
        PaymentWindow::new("Europe/Moscow", 10, 22)
    }

    #[test]
    fn test_restricted_hours_with_defaults() {
        let w = default_window();
        assert!(w.is_restricted_hour(23));
        assert!(w.is_restricted_hour(5));
        assert!(w.is_restricted_hour(22)); // boundary: restriction starts
        assert!(w.is_restricted_hour(0));
        assert!(!w.is_restricted_hour(10)); // boundary: restriction ends
        assert!(!w.is_restricted_hour(12));
        assert!(!w.is_restricted_hour(21));
    }

    #[test]
    fn test_restricted_set_is_exactly_the_wrapped_interval() {
        let w = default_window();
        for hour in 0..24 {
            let expected = hour >= 22 || hour < 10;
            assert_eq!(w.is_restricted_hour(hour), expected, "hour {hour}");
        }
    }

    #[test]
    fn test_unknown_timezone_falls_back_to_utc_plus_3() {
        let w = PaymentWindow::new("Nowhere/Atlantis", 10, 22);
        let fallback = w.store_now();
        let reference = Utc::now()
            .with_timezone(&FixedOffset::east_opt(MOSCOW_UTC_OFFSET_SECS).unwrap())
            .naive_local();
        let drift = (reference - fallback).num_seconds().abs();
        assert!(drift < 5);
    }

    #[test]
    fn test_order_id_shape() {
        let id = default_window().mint_order_id();
        // yymmdd-HHMMSS
        assert_eq!(id.len(), 13);
        assert_eq!(id.as_bytes()[6], b'-');
    }
}
