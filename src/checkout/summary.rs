//! Order summary composition.
//!
//! Pure functions: grouping is display-only and never reorders or mutates
//! the underlying cart sequence.

use crate::cart::{CartItem, cart_total};
use crate::checkout::session::CheckoutSession;

/// Group cart items by (dish name, unit price) in first-seen order.
pub fn group_for_summary(items: &[CartItem]) -> Vec<(String, u32, u32)> {
    let mut groups: Vec<(String, u32, u32)> = Vec::new();
    for item in items {
        match groups
            .iter_mut()
            .find(|(name, price, _)| *name == item.dish_name && *price == item.price)
        {
            Some((_, _, count)) => *count += 1,
            None => groups.push((item.dish_name.clone(), item.price, 1)),
        }
    }
    groups
}

/// One line per (dish, price) group: `- <count> X <name> — <price> = <sum>`.
pub fn order_lines(items: &[CartItem]) -> Vec<String> {
    group_for_summary(items)
        .into_iter()
        .map(|(name, price, count)| {
            let line_total = count as u64 * price as u64;
            format!("- {count} X {name} — {price} = {line_total}")
        })
        .collect()
}

/// The order block sent to the operator (and stored as pending text on the
/// QR path): header, contact fields, grouped positions, total.
pub fn compose_order_text(order_id: &str, session: &CheckoutSession, items: &[CartItem]) -> String {
    let mut text = format!(
        "🧾 Заказ #{order_id}\n👤 {}\n📞 {}\n📍 {}\n",
        session.name, session.phone, session.address
    );
    if !session.comment.is_empty() {
        text.push_str(&format!("💬 {}\n", session.comment));
    }
    text.push_str("🛒 Позиции:\n");
    text.push_str(&order_lines(items).join("\n"));
    text.push_str(&format!("\n💰 Итого: {}₽", cart_total(items)));
    text
}

/// Delivery phone rule: `+7` followed by exactly ten digits.
pub fn is_valid_phone(text: &str) -> bool {
    match text.strip_prefix("+7") {
        Some(rest) => rest.len() == 10 && rest.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, price: u32) -> CartItem {
        CartItem {
            dish_name: name.into(),
            price,
            category: "Меню".into(),
            dish_id: "1".into(),
        }
    }

    fn pizza_cart() -> Vec<CartItem> {
        vec![item("Pizza", 500), item("Pizza", 500), item("Cola", 100)]
    }

    #[test]
    fn test_grouping_keeps_first_seen_order() {
        let groups = group_for_summary(&pizza_cart());
        assert_eq!(
            groups,
            vec![("Pizza".into(), 500, 2), ("Cola".into(), 100, 1)]
        );
    }

    #[test]
    fn test_same_dish_different_price_is_two_groups() {
        let items = vec![item("Pizza", 500), item("Pizza", 450)];
        assert_eq!(group_for_summary(&items).len(), 2);
    }

    #[test]
    fn test_compose_order_text() {
        let session = CheckoutSession {
            name: "Ann".into(),
            phone: "+71234567890".into(),
            address: "Main 1".into(),
            comment: String::new(),
            ..Default::default()
        };
        let text = compose_order_text("250830-120000", &session, &pizza_cart());

        assert!(text.contains("🧾 Заказ #250830-120000"));
        assert!(text.contains("👤 Ann"));
        assert!(text.contains("- 2 X Pizza — 500 = 1000"));
        assert!(text.contains("- 1 X Cola — 100 = 100"));
        assert!(text.contains("Итого: 1100₽"));
        // skipped comment leaves no comment line
        assert!(!text.contains("💬"));
    }

    #[test]
    fn test_comment_line_present_when_set() {
        let session = CheckoutSession {
            comment: "без лука".into(),
            ..Default::default()
        };
        let text = compose_order_text("x", &session, &[]);
        assert!(text.contains("💬 без лука"));
    }

    #[test]
    fn test_phone_validation() {
        assert!(is_valid_phone("+79991234567"));
        assert!(!is_valid_phone("+7999123456")); // 9 digits
        assert!(!is_valid_phone("+799912345678")); // 11 digits
        assert!(!is_valid_phone("89991234567")); // wrong prefix
        assert!(!is_valid_phone("+7999123456a"));
        assert!(!is_valid_phone(""));
    }
}
