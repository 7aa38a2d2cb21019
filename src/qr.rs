//! QR payment confirmation sub-protocol.
//!
//! After the user picks QR at checkout, the dialogue itself ends but a
//! confirmation obligation stays attached to the user:
//!
//! ```text
//! begin ──▶ AwaitingConfirmation ──▶ Confirmed  (operator notified, cart cleared)
//!                 │        │
//!                 │        ├──▶ Cancelled  (no notification, cart untouched)
//!                 │        └──▶ TimedOut   (no notification, cart untouched)
//!                 └── Repeat: fresh artifact, same deadlines
//! ```
//!
//! Entering the awaiting state arms two deferred actions: a reminder and a
//! hard timeout. Every exit path revokes both handles (best-effort) and
//! clears the pending record; the record's presence is the exclusivity
//! gate, so a late duplicate of any terminal event is a no-op.

use crate::cart::CartStore;
use crate::error::BotResult;
use crate::payment::PaymentWindow;
use crate::scheduler::{self, TaskHandle};
use crate::transport::{Button, ChatTransport, Keyboard, OperatorNotifier};
use crate::types::{ChatId, MessageId, UserId};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

/// User-initiated QR control events, as carried by callback payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QrAction {
    Confirm,
    Repeat,
    Cancel,
}

impl QrAction {
    pub fn parse(data: &str) -> Option<Self> {
        match data {
            "qr_confirm" => Some(QrAction::Confirm),
            "qr_repeat" => Some(QrAction::Repeat),
            "qr_cancel" => Some(QrAction::Cancel),
            _ => None,
        }
    }
}

/// Pending QR payment for one user. At most one per user; owning the
/// scheduled-task handles so clearing the record can revoke them.
#[derive(Debug)]
struct QrPending {
    pending_text: String,
    qr_message_id: Option<MessageId>,
    awaiting: bool,
    jobs: Vec<TaskHandle>,
}

pub struct QrFlow {
    transport: Arc<dyn ChatTransport>,
    operator: Arc<dyn OperatorNotifier>,
    carts: Arc<CartStore>,
    window: PaymentWindow,
    qr_image_url: Option<String>,
    reminder_delay: Duration,
    cancel_delay: Duration,
    pending: DashMap<UserId, QrPending>,
}

impl QrFlow {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        operator: Arc<dyn OperatorNotifier>,
        carts: Arc<CartStore>,
        window: PaymentWindow,
        qr_image_url: Option<String>,
        reminder_delay: Duration,
        cancel_delay: Duration,
    ) -> Self {
        Self {
            transport,
            operator,
            carts,
            window,
            qr_image_url,
            reminder_delay,
            cancel_delay,
            pending: DashMap::new(),
        }
    }

    /// Wire the flow from runtime configuration.
    pub fn from_config(
        config: &crate::config::Config,
        transport: Arc<dyn ChatTransport>,
        operator: Arc<dyn OperatorNotifier>,
        carts: Arc<CartStore>,
    ) -> Self {
        Self::new(
            transport,
            operator,
            carts,
            PaymentWindow::from_config(config),
            config.qr_image_url.clone(),
            Duration::from_secs(config.qr_reminder_minutes * 60),
            Duration::from_secs(config.qr_cancel_minutes * 60),
        )
    }

    /// Whether the user has a live pending QR payment.
    pub fn awaiting_confirmation(&self, user: UserId) -> bool {
        self.pending.get(&user).map(|p| p.awaiting).unwrap_or(false)
    }

    /// Start the awaiting state: show the QR artifact, arm the reminder and
    /// the hard timeout. A previous pending payment for the same user is
    /// replaced (its handles revoked, its artifact deleted).
    pub async fn begin(
        self: Arc<Self>,
        user: UserId,
        chat: ChatId,
        pending_text: String,
        total: u64,
    ) -> BotResult<()> {
        if let Some((_, old)) = self.pending.remove(&user) {
            revoke_jobs(&old.jobs);
            if let Some(id) = old.qr_message_id {
                self.transport.try_delete(chat, id).await;
            }
        }

        let caption = format!(
            "Отсканируйте QR-код для оплаты на сумму {total}₽.\n\
             После оплаты нажмите кнопку ниже, чтобы отправить заказ оператору."
        );
        let message_id = self.show_artifact(chat, &caption, initial_kb()).await?;

        let flow = Arc::clone(&self);
        let reminder = scheduler::schedule(self.reminder_delay, async move {
            flow.on_reminder(user, chat).await;
        });
        let flow = Arc::clone(&self);
        let timeout = scheduler::schedule(self.cancel_delay, async move {
            flow.on_timeout(user, chat).await;
        });

        self.pending.insert(
            user,
            QrPending {
                pending_text,
                qr_message_id: Some(message_id),
                awaiting: true,
                jobs: vec![reminder, timeout],
            },
        );
        tracing::info!(user_id = user, total, "qr confirmation pending");
        Ok(())
    }

    /// User self-reported a completed payment. The single point where a QR
    /// order reaches the operator.
    pub async fn confirm(
        self: Arc<Self>,
        user: UserId,
        chat: ChatId,
        username: Option<&str>,
    ) -> BotResult<()> {
        // Claiming the record up front makes a racing timeout (or a
        // duplicate confirm) a no-op while the notification is in flight.
        let Some((_, pending)) = self.pending.remove(&user) else {
            self.transport
                .send_message(chat, "Кажется, активного заказа для подтверждения нет.", None)
                .await?;
            return Ok(());
        };

        let handle = match username {
            Some(name) => format!("@{name}"),
            None => "—".to_string(),
        };
        let operator_text = format!(
            "📦 Новый заказ (QR-код)\n{}\n💳 Оплата: QR — клиент подтвердил оплату\n⏱ {}\n👤 Telegram: {handle} (id {user})",
            pending.pending_text,
            self.window.timestamp()
        );

        if let Err(e) = self.operator.notify(&operator_text).await {
            // Leave the session resumable: the user can press confirm again.
            // The old handles may have been consumed while the notification
            // was in flight (a fired timeout finds the record claimed and
            // no-ops), so the revived record gets a fresh timeout.
            tracing::warn!(user_id = user, error = %e, "qr confirm notification failed");
            revoke_jobs(&pending.jobs);
            let flow = Arc::clone(&self);
            let timeout = scheduler::schedule(self.cancel_delay, async move {
                flow.on_timeout(user, chat).await;
            });
            self.pending.insert(
                user,
                QrPending {
                    jobs: vec![timeout],
                    ..pending
                },
            );
            return Err(e);
        }

        revoke_jobs(&pending.jobs);
        if let Some(id) = pending.qr_message_id {
            self.transport.try_delete(chat, id).await;
        }

        let items = self.carts.list(user);
        self.carts.archive_as_last(user, &items);
        self.carts.clear(user);

        tracing::info!(user_id = user, "qr order confirmed and sent to operator");
        self.transport
            .send_message(
                chat,
                "✅ Спасибо! Подтверждение получено. Заказ отправлен оператору. Ожидайте звонка.",
                None,
            )
            .await?;
        Ok(())
    }

    /// Show the artifact again. The stored message id is updated; the
    /// original reminder/timeout deadlines stand.
    pub async fn repeat(&self, user: UserId, chat: ChatId) -> BotResult<()> {
        // Copy what we need out of the map before awaiting anything; the
        // shard guard must not be held across a transport call.
        let live = self
            .pending
            .get(&user)
            .filter(|p| p.awaiting)
            .map(|p| p.qr_message_id);
        let Some(old_message) = live else {
            self.transport
                .send_message(chat, "Кажется, активного заказа для подтверждения нет.", None)
                .await?;
            return Ok(());
        };

        if let Some(id) = old_message {
            self.transport.try_delete(chat, id).await;
        }
        let caption = "Отсканируйте QR-код для оплаты.\n\
                       После оплаты нажмите кнопку ниже, чтобы отправить заказ оператору.";
        let message_id = self.show_artifact(chat, caption, controls_kb()).await?;

        if let Some(mut pending) = self.pending.get_mut(&user) {
            pending.qr_message_id = Some(message_id);
        }
        Ok(())
    }

    /// User-initiated cancellation. Never notifies the operator and never
    /// touches the cart. A duplicate cancel after any terminal event is a
    /// silent no-op.
    pub async fn cancel(&self, user: UserId, chat: ChatId) -> BotResult<()> {
        let Some((_, pending)) = self.pending.remove(&user) else {
            return Ok(());
        };
        revoke_jobs(&pending.jobs);
        if let Some(id) = pending.qr_message_id {
            self.transport.try_delete(chat, id).await;
        }
        tracing::info!(user_id = user, "qr payment cancelled by user");
        self.transport
            .send_message(
                chat,
                "❌ Оплата по QR отменена. Вы можете выбрать другой способ оплаты или оформить заказ заново.",
                None,
            )
            .await?;
        Ok(())
    }

    /// Deferred reminder. Re-reads current state: fires only while the user
    /// is still awaiting confirmation.
    async fn on_reminder(&self, user: UserId, chat: ChatId) {
        if !self.awaiting_confirmation(user) {
            return;
        }
        let text = "⏰ Напоминание: после оплаты нажмите кнопку ниже, чтобы отправить заказ оператору.";
        if let Err(e) = self
            .transport
            .send_message(chat, text, Some(controls_kb()))
            .await
        {
            tracing::warn!(user_id = user, error = %e, "qr reminder send failed");
        }
    }

    /// Deferred hard cancel. Claims the record first so a concurrent user
    /// event sees the session as already gone.
    async fn on_timeout(&self, user: UserId, chat: ChatId) {
        let Some((_, pending)) = self.pending.remove(&user) else {
            return;
        };
        if !pending.awaiting {
            return;
        }
        revoke_jobs(&pending.jobs);
        if let Some(id) = pending.qr_message_id {
            self.transport.try_delete(chat, id).await;
        }
        tracing::info!(user_id = user, "qr payment session expired");
        let text = "⏳ Время на подтверждение оплаты истекло. Сессия оплаты отменена. \
                    Вы можете оформить заказ заново из меню.";
        if let Err(e) = self.transport.send_message(chat, text, None).await {
            tracing::warn!(user_id = user, error = %e, "qr expiry notice send failed");
        }
    }

    async fn show_artifact(
        &self,
        chat: ChatId,
        caption: &str,
        keyboard: Keyboard,
    ) -> BotResult<MessageId> {
        match &self.qr_image_url {
            Some(url) => {
                self.transport
                    .send_photo(chat, url, caption, Some(keyboard))
                    .await
            }
            None => {
                let text = format!("QR_IMAGE_URL не задан. Укажите ссылку в конфигурации.\n\n{caption}");
                self.transport.send_message(chat, &text, Some(keyboard)).await
            }
        }
    }
}

/// Cancel both handles even if one already fired; revocation is best-effort.
fn revoke_jobs(jobs: &[TaskHandle]) {
    for job in jobs {
        job.cancel();
    }
}

fn confirm_button() -> Button {
    Button::callback("✅ Я отправил подтверждение оплаты!", "qr_confirm")
}

fn initial_kb() -> Keyboard {
    Keyboard::new(vec![
        vec![confirm_button()],
        vec![Button::callback("❌ Отменить оплату", "qr_cancel")],
    ])
}

fn controls_kb() -> Keyboard {
    Keyboard::new(vec![
        vec![confirm_button()],
        vec![
            Button::callback("🔁 Показать QR ещё раз", "qr_repeat"),
            Button::callback("❌ Отменить оплату", "qr_cancel"),
        ],
    ])
}
