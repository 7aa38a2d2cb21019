//! Conversational ordering assistant for a food-delivery storefront.
//!
//! The crate is the state-bearing core of a chat ordering bot: per-user
//! carts, the multi-step checkout dialogue, the time-of-day payment window,
//! and the QR payment confirmation sub-protocol with its reminder/timeout
//! machinery. The chat platform, the catalog backend, and the payment
//! provider are reached through traits and wired in by the hosting process.
//!
//! ```text
//! user event ──▶ CheckoutEngine ──▶ OperatorNotifier (cash/online)
//!                     │   │
//!                     │   └──▶ QrFlow ──(confirm)──▶ OperatorNotifier
//!                     ▼
//!                 CartStore ◀── CachedCatalog (browse/add, out of core)
//! ```

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod logger;
pub mod payment;
pub mod qr;
pub mod scheduler;
pub mod transport;
pub mod types;

// Re-exports
pub use cart::{CartItem, CartStore, build_cart_view};
pub use catalog::{CachedCatalog, CatalogSource, Dish};
pub use checkout::{CheckoutEngine, CheckoutPhase};
pub use config::Config;
pub use error::{BotError, BotResult};
pub use payment::{PaymentHandoff, PaymentProvider, PaymentWindow, YookassaClient};
pub use qr::{QrAction, QrFlow};
pub use transport::{Button, ChatTransport, Keyboard, OperatorChat, OperatorNotifier};
pub use types::{ChatId, MessageId, PaymentMethod, UserId};
