//! Hand-off of accepted intents to an external relay service, plus the
//! best-effort operator notification channel.
//!
//! Broadcasting, gas bidding and retries belong to the relay service; this
//! crate only defines the boundary and a thin HTTP client for it.

pub mod dispatcher;
pub mod error;
pub mod mode;
pub mod notify;

pub use dispatcher::{HttpRelayDispatcher, RelayDispatcher};
pub use error::{NotifyError, RelayError};
pub use mode::RelayMode;
pub use notify::{Notifier, SilentNotifier, WebhookNotifier};
