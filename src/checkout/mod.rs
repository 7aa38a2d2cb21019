//! Checkout dialogue: session state, summary composition, and the
//! conversation state machine.

pub mod engine;
pub mod session;
pub mod summary;

pub use engine::{CANCEL_TEXT, CheckoutEngine, SKIP_TEXT};
pub use session::{CheckoutPhase, CheckoutSession, SessionStore};
pub use summary::{compose_order_text, is_valid_phone, order_lines};
