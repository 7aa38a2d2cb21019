//! Checkout conversation state machine.
//!
//! Phases: `Idle → AskName → AskPhone → AskAddress → AskComment →
//! AskPayment → Idle`, with a cancel signal from every Ask* step.
//!
//! # Event flow
//!
//! ```text
//! start(user)                 → AskName, prompt for name
//! handle_text(user, text)     → advance through Ask* steps with validation
//! select_payment(user, method)→ re-check window, then:
//!     cash   → notify operator → archive + clear cart → Idle
//!     online → payment handoff → notify with link → archive + clear → Idle
//!     qr     → hand the pending order to QrFlow, dialogue → Idle
//! ```
//!
//! Collaborator failures propagate; cart archival and clearing only happen
//! after the operator notification (or payment handoff) succeeded, so a
//! failed attempt leaves the user at AskPayment with the cart intact.

use crate::cart::{CartItem, CartStore, cart_total};
use crate::checkout::session::{CheckoutPhase, SessionStore};
use crate::checkout::summary::{compose_order_text, is_valid_phone};
use crate::error::{BotError, BotResult};
use crate::payment::{PaymentProvider, PaymentWindow};
use crate::qr::QrFlow;
use crate::transport::{Button, ChatTransport, Keyboard, OperatorNotifier};
use crate::types::{ChatId, PaymentMethod, UserId};
use std::sync::Arc;

/// Reply-keyboard sentinel cancelling checkout from any step.
pub const CANCEL_TEXT: &str = "❌ Отмена";
/// Reply-keyboard sentinel mapping the comment to an empty string.
pub const SKIP_TEXT: &str = "⏭️ Пропустить";

pub struct CheckoutEngine {
    transport: Arc<dyn ChatTransport>,
    operator: Arc<dyn OperatorNotifier>,
    payments: Option<Arc<dyn PaymentProvider>>,
    carts: Arc<CartStore>,
    qr: Arc<QrFlow>,
    window: PaymentWindow,
    sessions: SessionStore,
}

impl CheckoutEngine {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        operator: Arc<dyn OperatorNotifier>,
        payments: Option<Arc<dyn PaymentProvider>>,
        carts: Arc<CartStore>,
        qr: Arc<QrFlow>,
        window: PaymentWindow,
    ) -> Self {
        Self {
            transport,
            operator,
            payments,
            carts,
            qr,
            window,
            sessions: SessionStore::new(),
        }
    }

    pub fn in_checkout(&self, user: UserId) -> bool {
        self.sessions.in_checkout(user)
    }

    /// Enter checkout. Any leftover session is discarded so the attempt
    /// starts clean. An empty cart is allowed and yields a zero-total order;
    /// guarding against it is the menu layer's policy.
    pub async fn start(&self, user: UserId, chat: ChatId) -> BotResult<()> {
        self.sessions.reset(user);
        self.sessions
            .update(user, |s| s.phase = CheckoutPhase::AskName);
        tracing::info!(user_id = user, "checkout started");
        self.transport
            .send_message(chat, "👤 Введите ваше имя:", Some(cancel_kb()))
            .await?;
        Ok(())
    }

    /// Feed one free-text reply into the dialogue. Returns `false` when the
    /// user is not in checkout, so the caller can route the text elsewhere.
    pub async fn handle_text(&self, user: UserId, chat: ChatId, text: &str) -> BotResult<bool> {
        let phase = self.sessions.phase(user);
        if phase == CheckoutPhase::Idle {
            return Ok(false);
        }
        if text == CANCEL_TEXT {
            self.cancel(user, chat).await?;
            return Ok(true);
        }

        match phase {
            CheckoutPhase::Idle => unreachable!(),
            CheckoutPhase::AskName => self.on_name(user, chat, text).await?,
            CheckoutPhase::AskPhone => self.on_phone(user, chat, text.trim()).await?,
            CheckoutPhase::AskAddress => self.on_address(user, chat, text).await?,
            CheckoutPhase::AskComment => self.on_comment(user, chat, text.trim()).await?,
            CheckoutPhase::AskPayment => {
                // Method selection arrives as a discrete event; stray text
                // here is consumed and ignored.
                tracing::debug!(user_id = user, "text ignored while awaiting payment method");
            }
        }
        Ok(true)
    }

    async fn on_name(&self, user: UserId, chat: ChatId, text: &str) -> BotResult<()> {
        let order_id = self.window.mint_order_id();
        self.sessions.update(user, |s| {
            if s.order_id.is_none() {
                s.order_id = Some(order_id);
            }
            s.name = text.to_string();
            s.phase = CheckoutPhase::AskPhone;
        });
        self.transport
            .send_message(
                chat,
                "📞 Введите номер телефона в формате +7XXXXXXXXXX:",
                Some(cancel_kb()),
            )
            .await?;
        Ok(())
    }

    async fn on_phone(&self, user: UserId, chat: ChatId, text: &str) -> BotResult<()> {
        if !is_valid_phone(text) {
            // Re-prompt, stay in AskPhone, touch nothing.
            self.transport
                .send_message(
                    chat,
                    "❗ Неверный формат. Введите телефон вида +7XXXXXXXXXX:",
                    Some(cancel_kb()),
                )
                .await?;
            return Ok(());
        }
        self.sessions.update(user, |s| {
            s.phone = text.to_string();
            s.phase = CheckoutPhase::AskAddress;
        });
        self.transport
            .send_message(chat, "📍 Введите адрес доставки:", Some(cancel_kb()))
            .await?;
        Ok(())
    }

    async fn on_address(&self, user: UserId, chat: ChatId, text: &str) -> BotResult<()> {
        self.sessions.update(user, |s| {
            s.address = text.to_string();
            s.phase = CheckoutPhase::AskComment;
        });
        let skip_kb = Keyboard::new(vec![
            vec![Button::reply(SKIP_TEXT)],
            vec![Button::reply(CANCEL_TEXT)],
        ]);
        self.transport
            .send_message(chat, "💬 Комментарий к заказу (опционально):", Some(skip_kb))
            .await?;
        Ok(())
    }

    async fn on_comment(&self, user: UserId, chat: ChatId, text: &str) -> BotResult<()> {
        let comment = if text == SKIP_TEXT { "" } else { text };
        self.sessions.update(user, |s| {
            s.comment = comment.to_string();
            s.phase = CheckoutPhase::AskPayment;
        });

        let restricted = self.window.is_restricted();
        let note = format!(
            "ℹ️ С {:02}:00 до {:02}:00 по МСК доступна только оплата по QR.",
            self.window.late_hour(),
            self.window.early_hour()
        );
        let text_msg = if restricted {
            format!(
                "💳 Выберите способ оплаты:\n{note}\nСейчас (МСК {}) доступна только оплата по QR.",
                self.window.store_now().format("%H:%M")
            )
        } else {
            format!("💳 Выберите способ оплаты:\n{note}")
        };
        self.transport
            .send_message(chat, &text_msg, Some(payment_kb(restricted)))
            .await?;
        Ok(())
    }

    /// Discrete payment-method selection event. The payment window is
    /// re-validated here: the boundary may have been crossed since the
    /// keyboard was offered.
    pub async fn select_payment(
        &self,
        user: UserId,
        chat: ChatId,
        method: PaymentMethod,
    ) -> BotResult<()> {
        if self.sessions.phase(user) != CheckoutPhase::AskPayment {
            tracing::debug!(user_id = user, %method, "stale payment selection ignored");
            return Ok(());
        }

        if self.window.is_restricted() && method != PaymentMethod::Qr {
            let text = format!(
                "⏰ С {:02}:00 до {:02}:00 по МСК доступна только оплата по QR. \
                 Пожалуйста, выберите QR-оплату.",
                self.window.late_hour(),
                self.window.early_hour()
            );
            self.transport
                .send_message(chat, &text, Some(payment_kb(true)))
                .await?;
            return Ok(());
        }

        let session = self.sessions.get(user);
        let order_id = session
            .order_id
            .clone()
            .unwrap_or_else(|| self.window.mint_order_id());
        let items = self.carts.list(user);
        let total = cart_total(&items);
        let order_text = compose_order_text(&order_id, &session, &items);

        match method {
            PaymentMethod::Cash => {
                self.operator
                    .notify(&format!(
                        "📦 Новый заказ (Наличные)\n{order_text}\n⏱ {}",
                        self.window.timestamp()
                    ))
                    .await?;
                // Once the operator has the order, the attempt is over: clear
                // state before the user-facing confirmation so a failed send
                // cannot be retried into a second notification.
                self.finish_order(user, &items);
                tracing::info!(user_id = user, %order_id, total, "cash order placed");
                self.transport
                    .send_message(chat, "✅ Ваш заказ принят!", None)
                    .await?;
            }
            PaymentMethod::Online => {
                let provider = self.payments.as_ref().ok_or_else(|| {
                    BotError::Payment("online payment provider is not configured".into())
                })?;
                let handoff = provider.create_payment(total, user).await?;
                self.transport
                    .send_message(
                        chat,
                        &format!("✅ Перейдите для оплаты:\n{}", handoff.redirect_url),
                        None,
                    )
                    .await?;
                self.operator
                    .notify(&format!(
                        "📦 Новый заказ (Онлайн)\n{order_text}\n🔗 {}\n⏱ {}",
                        handoff.redirect_url,
                        self.window.timestamp()
                    ))
                    .await?;
                self.finish_order(user, &items);
                tracing::info!(
                    user_id = user,
                    %order_id,
                    payment_id = %handoff.payment_id,
                    "online order placed"
                );
            }
            PaymentMethod::Qr => {
                // Operator is NOT notified yet; that happens on QR confirm.
                Arc::clone(&self.qr)
                    .begin(user, chat, order_text, total)
                    .await?;
                self.sessions.reset(user);
                tracing::info!(user_id = user, %order_id, total, "qr payment pending");
            }
        }
        Ok(())
    }

    /// Terminal success bookkeeping for the synchronous payment paths.
    fn finish_order(&self, user: UserId, items: &[CartItem]) {
        self.carts.archive_as_last(user, items);
        self.carts.clear(user);
        self.sessions.reset(user);
    }

    /// Cancel from any Ask* step: the session dies, the cart and any QR
    /// pending state stay untouched.
    pub async fn cancel(&self, user: UserId, chat: ChatId) -> BotResult<()> {
        self.sessions.reset(user);
        tracing::info!(user_id = user, "checkout cancelled");
        self.transport
            .send_message(chat, "Оформление заказа отменено.", None)
            .await?;
        Ok(())
    }
}

fn cancel_kb() -> Keyboard {
    Keyboard::row(vec![Button::reply(CANCEL_TEXT)])
}

fn payment_kb(restricted: bool) -> Keyboard {
    let qr = Button::callback("📷 Оплата по QR", "pay:qr");
    if restricted {
        Keyboard::row(vec![qr])
    } else {
        Keyboard::new(vec![
            vec![Button::callback("💵 Наличные", "pay:cash")],
            vec![qr],
            vec![Button::callback("🌐 Онлайн (В РАЗРАБОТКЕ! ^_^)", "pay:online")],
        ])
    }
}
