//! YooKassa integration via REST API (no SDK dependency).

use super::{PaymentHandoff, PaymentProvider};
use crate::config::Config;
use crate::error::{BotError, BotResult};
use crate::types::UserId;
use async_trait::async_trait;
use uuid::Uuid;

const PAYMENTS_URL: &str = "https://api.yookassa.ru/v3/payments";

/// Thin client for the YooKassa payments API. Created only when shop
/// credentials are configured; without it the online method is unavailable.
pub struct YookassaClient {
    http: reqwest::Client,
    shop_id: String,
    secret_key: String,
    return_url: String,
}

impl YookassaClient {
    pub fn new(
        shop_id: impl Into<String>,
        secret_key: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            shop_id: shop_id.into(),
            secret_key: secret_key.into(),
            return_url: format!("{}/success", domain.into()),
        }
    }

    /// Build from config if all three credentials are present.
    pub fn from_config(config: &Config) -> Option<Self> {
        match (
            config.yookassa_shop_id.as_ref(),
            config.yookassa_api_key.as_ref(),
            config.domain.as_ref(),
        ) {
            (Some(shop), Some(key), Some(domain)) => Some(Self::new(shop, key, domain)),
            _ => None,
        }
    }
}

#[async_trait]
impl PaymentProvider for YookassaClient {
    async fn create_payment(&self, amount: u64, user: UserId) -> BotResult<PaymentHandoff> {
        let body = serde_json::json!({
            "amount": {
                "value": format!("{amount}.00"),
                "currency": "RUB"
            },
            "confirmation": {
                "type": "redirect",
                "return_url": self.return_url
            },
            "capture": true,
            "description": format!("Заказ от Telegram user {user}"),
            "metadata": { "tg_user_id": user }
        });

        let resp: serde_json::Value = self
            .http
            .post(PAYMENTS_URL)
            .basic_auth(&self.shop_id, Some(&self.secret_key))
            .header("Idempotence-Key", Uuid::new_v4().to_string())
            .json(&body)
            .send()
            .await
            .map_err(BotError::payment)?
            .json()
            .await
            .map_err(BotError::payment)?;

        let redirect_url = resp["confirmation"]["confirmation_url"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| BotError::Payment(format!("create_payment failed: {resp}")))?;
        let payment_id = resp["id"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| BotError::Payment(format!("create_payment failed: {resp}")))?;

        Ok(PaymentHandoff {
            redirect_url,
            payment_id,
        })
    }
}
