//! Runtime configuration loaded from environment variables.
//!
//! Everything except `OPERATOR_CHAT_ID` has a default, so a development
//! instance starts with a single variable set. YooKassa credentials are
//! optional: without them the online payment method is simply unavailable.

use crate::error::{BotError, BotResult};
use crate::types::ChatId;

#[derive(Debug, Clone)]
pub struct Config {
    /// Chat that receives finalized order notifications.
    pub operator_chat_id: ChatId,

    /// URL of the static QR payment image. When unset, the QR flow falls
    /// back to a plain text message so checkout keeps working.
    pub qr_image_url: Option<String>,
    /// Minutes until the "did you pay?" reminder after showing the QR.
    pub qr_reminder_minutes: u64,
    /// Minutes until the pending QR payment is hard-cancelled.
    pub qr_cancel_minutes: u64,

    /// Freshness TTL for the cached catalog, in seconds.
    pub catalog_cache_ttl_seconds: u64,

    /// IANA name of the store's civil timezone.
    pub store_tz: String,
    /// Hour (0-23) at which non-QR payments become available again.
    pub early_payment_hour: u32,
    /// Hour (0-23) from which only QR payment is offered.
    pub late_payment_hour: u32,

    // YooKassa (optional)
    pub yookassa_shop_id: Option<String>,
    pub yookassa_api_key: Option<String>,
    /// Public domain used for the payment return URL.
    pub domain: Option<String>,
}

impl Config {
    pub fn from_env() -> BotResult<Self> {
        dotenv::dotenv().ok();

        let operator_chat_id = std::env::var("OPERATOR_CHAT_ID")
            .ok()
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| {
                BotError::Config("OPERATOR_CHAT_ID is required but not set".into())
            })?;

        let config = Self {
            operator_chat_id,
            qr_image_url: non_empty_var("QR_IMAGE_URL"),
            qr_reminder_minutes: parse_var("QR_REMINDER_MINUTES", 10),
            qr_cancel_minutes: parse_var("QR_CANCEL_MINUTES", 30),
            catalog_cache_ttl_seconds: parse_var("CATALOG_CACHE_TTL_SECONDS", 600),
            store_tz: non_empty_var("STORE_TZ").unwrap_or_else(|| "Europe/Moscow".into()),
            early_payment_hour: parse_var("EARLY_PAYMENT_HOUR", 10),
            late_payment_hour: parse_var("LATE_PAYMENT_HOUR", 22),
            yookassa_shop_id: non_empty_var("YOOKASSA_SHOP_ID"),
            yookassa_api_key: non_empty_var("YOOKASSA_API_KEY"),
            domain: non_empty_var("DOMAIN"),
        };

        // Caller convention, not a structural invariant: the hard cancel is
        // expected to fire after the reminder.
        if config.qr_cancel_minutes <= config.qr_reminder_minutes {
            tracing::warn!(
                reminder = config.qr_reminder_minutes,
                cancel = config.qr_cancel_minutes,
                "QR_CANCEL_MINUTES should be greater than QR_REMINDER_MINUTES"
            );
        }

        Ok(config)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
