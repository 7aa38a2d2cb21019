//! Per-user checkout session state.
//!
//! One tagged phase enum per user instead of scattered booleans: a user is
//! either idle or at exactly one Ask* step, and illegal combinations are
//! unrepresentable.

use crate::types::UserId;
use dashmap::DashMap;

/// Where the user currently is in the checkout dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckoutPhase {
    #[default]
    Idle,
    AskName,
    AskPhone,
    AskAddress,
    AskComment,
    AskPayment,
}

/// Fields collected during one checkout attempt. The order id is minted
/// once per attempt and survives retries within it; a fresh attempt after
/// reset always gets a new one.
#[derive(Debug, Clone, Default)]
pub struct CheckoutSession {
    pub phase: CheckoutPhase,
    pub order_id: Option<String>,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub comment: String,
}

/// User-keyed session store with an explicit lifecycle: created on first
/// use, removed on cancel or completion.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<UserId, CheckoutSession>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self, user: UserId) -> CheckoutPhase {
        self.sessions
            .get(&user)
            .map(|s| s.phase)
            .unwrap_or(CheckoutPhase::Idle)
    }

    pub fn in_checkout(&self, user: UserId) -> bool {
        self.phase(user) != CheckoutPhase::Idle
    }

    /// Snapshot of the session (default if none exists).
    pub fn get(&self, user: UserId) -> CheckoutSession {
        self.sessions
            .get(&user)
            .map(|s| s.value().clone())
            .unwrap_or_default()
    }

    /// Mutate the session in place, creating it on first use. The closure
    /// must not await; the map shard lock is held for its duration.
    pub fn update<R>(&self, user: UserId, f: impl FnOnce(&mut CheckoutSession) -> R) -> R {
        let mut entry = self.sessions.entry(user).or_default();
        f(&mut entry)
    }

    /// Destroy the session. The next attempt starts from scratch with a new
    /// order id.
    pub fn reset(&self, user: UserId) {
        self.sessions.remove(&user);
    }
}
