//! Connected clients for the noughts server.
//!
//! - [`Client`]: one connection's outbound queue, close flag and
//!   set-once username.
//! - [`ActiveUsers`]: which usernames are logged in right now.
//!
//! ```text
//! Game layer (above)   ← sends ServerMessages to Clients
//!     ↕
//! Player layer (this crate)
//!     ↕
//! Transport / Protocol (below)
//! ```

mod client;
mod error;
mod users;

pub use client::{Client, Outbox};
pub use error::PlayerError;
pub use users::{ActiveUsers, normalize_username};
