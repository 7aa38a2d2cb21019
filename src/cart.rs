//! Per-user shopping carts and last-order snapshots.
//!
//! In-memory only: a process restart loses all carts and snapshots. That is
//! intentional — the storefront treats an unfinished cart as disposable.
//! The store is keyed by user id and safe for concurrent access from
//! independent per-user flows; no operation touches another user's cart.

use crate::transport::{Button, Keyboard};
use crate::types::UserId;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// One unit of a dish in a cart. Adding the same dish twice appends two
/// items; grouping happens only at display time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub dish_name: String,
    /// Unit price in whole rubles.
    pub price: u32,
    /// Catalog category (sheet) the dish came from.
    pub category: String,
    pub dish_id: String,
}

/// Sum of unit prices over all items.
pub fn cart_total(items: &[CartItem]) -> u64 {
    items.iter().map(|i| i.price as u64).sum()
}

/// Live carts plus a frozen snapshot of each user's last completed order.
#[derive(Debug, Default)]
pub struct CartStore {
    carts: DashMap<UserId, Vec<CartItem>>,
    last_orders: DashMap<UserId, Vec<CartItem>>,
}

impl CartStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, user: UserId, item: CartItem) {
        self.carts.entry(user).or_default().push(item);
    }

    /// Defensive copy of the user's cart; empty if none exists.
    pub fn list(&self, user: UserId) -> Vec<CartItem> {
        self.carts
            .get(&user)
            .map(|c| c.value().clone())
            .unwrap_or_default()
    }

    /// Remove by position. Out-of-bounds indices are a no-op, not an error.
    pub fn remove_at(&self, user: UserId, index: usize) {
        if let Some(mut cart) = self.carts.get_mut(&user)
            && index < cart.len()
        {
            cart.remove(index);
        }
    }

    /// Remove the first item matching (category, dish id). Returns whether
    /// anything was removed.
    pub fn remove_matching(&self, user: UserId, category: &str, dish_id: &str) -> bool {
        if let Some(mut cart) = self.carts.get_mut(&user)
            && let Some(pos) = cart
                .iter()
                .position(|i| i.category == category && i.dish_id == dish_id)
        {
            cart.remove(pos);
            return true;
        }
        false
    }

    pub fn clear(&self, user: UserId) {
        self.carts.insert(user, Vec::new());
    }

    /// Overwrite the cart wholesale (used by "repeat last order").
    pub fn replace(&self, user: UserId, items: Vec<CartItem>) {
        self.carts.insert(user, items);
    }

    pub fn total(&self, user: UserId) -> u64 {
        self.carts
            .get(&user)
            .map(|c| cart_total(&c))
            .unwrap_or(0)
    }

    /// Freeze a copy of `items` as the user's last order. Independent of the
    /// live cart: later mutations never reach the snapshot.
    pub fn archive_as_last(&self, user: UserId, items: &[CartItem]) {
        self.last_orders.insert(user, items.to_vec());
    }

    /// Copy of the last completed order, empty if none exists.
    pub fn last_order(&self, user: UserId) -> Vec<CartItem> {
        self.last_orders
            .get(&user)
            .map(|c| c.value().clone())
            .unwrap_or_default()
    }

    /// Replace the live cart with the last-order snapshot. Returns false
    /// when the user has no completed order to repeat.
    pub fn restore_last(&self, user: UserId) -> bool {
        let last = self.last_order(user);
        if last.is_empty() {
            return false;
        }
        self.replace(user, last);
        true
    }
}

// =============================================================================
// Cart view
// =============================================================================

/// Rendered cart: grouped item lines plus management controls.
#[derive(Debug, Clone)]
pub struct CartView {
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

/// Build the user-facing cart view. Items are grouped by
/// (category, dish id, name, price) in first-seen order; each group gets a
/// remove button carrying `del:<category>:<dish id>`.
pub fn build_cart_view(items: &[CartItem]) -> CartView {
    if items.is_empty() {
        return CartView {
            text: "🛒 Ваша корзина пуста.".into(),
            keyboard: None,
        };
    }

    let mut groups: Vec<(&CartItem, u32)> = Vec::new();
    for item in items {
        match groups.iter_mut().find(|(first, _)| {
            first.category == item.category
                && first.dish_id == item.dish_id
                && first.dish_name == item.dish_name
                && first.price == item.price
        }) {
            Some((_, count)) => *count += 1,
            None => groups.push((item, 1)),
        }
    }

    let mut lines = Vec::new();
    let mut rows = Vec::new();
    for (item, count) in &groups {
        let line_total = *count as u64 * item.price as u64;
        lines.push(format!(
            "{count} X {} — {} = {line_total}",
            item.dish_name, item.price
        ));
        rows.push(vec![Button::callback(
            format!("❌ Удалить {}", item.dish_name),
            format!("del:{}:{}", item.category, item.dish_id),
        )]);
    }
    lines.push(format!("💰 Итого: {}₽", cart_total(items)));

    rows.push(vec![
        Button::callback("🧹 Очистить корзину", "clear"),
        Button::callback("✅ Оформить заказ", "checkout"),
    ]);
    rows.push(vec![Button::callback("⬅️ Назад", "back")]);

    CartView {
        text: lines.join("\n"),
        keyboard: Some(Keyboard::new(rows)),
    }
}
