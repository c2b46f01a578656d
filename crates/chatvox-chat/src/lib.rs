//! Twitch chat connection supervision for chatvox.
//!
//! Two pieces:
//!
//! - [`irc`] — the transport: an anonymous Twitch IRC client over TCP,
//!   plus the [`ChatSource`]/[`ChatStream`] port traits that keep the
//!   supervisor testable without a network.
//! - [`supervisor`] — the [`ConnectionSupervisor`]: owner of the single
//!   connection's lifecycle state machine. It forwards incoming chat
//!   text into the synthesis pipeline and emits a `connection:status`
//!   event on every state transition.

pub mod error;
pub mod irc;
pub mod supervisor;

pub use error::ChatError;
pub use irc::{ChatMessage, ChatSource, ChatStream, TwitchChatSource, parse_message};
pub use supervisor::{ConnectionConfig, ConnectionSupervisor};
