//! Error handling for the ChatWatch client.
//!
//! Every fallible public operation returns [`ChatWatchResult`]. Errors carry
//! an [`ErrorCategory`] so callers can decide whether to retry:
//!
//! | Category | Examples | Retryable |
//! |----------|----------|-----------|
//! | Network | transport failures, socket open failures, ready timeout | Yes |
//! | Server | non-200 acquire, unusable session URL | Yes |
//! | Auth | missing credential, 401/403 on acquire | No |
//! | Protocol | malformed JSON | No |
//! | Configuration | bad environment values | No |
//! | Client | not connected, shut down | No |

mod category;
mod chatwatch_error;

pub use category::ErrorCategory;
pub use chatwatch_error::ChatWatchError;

/// Result alias used across the crate.
pub type ChatWatchResult<T> = Result<T, ChatWatchError>;
