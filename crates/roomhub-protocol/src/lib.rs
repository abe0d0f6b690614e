//! Message and identity types for Roomhub.
//!
//! This crate defines the values that flow between the transport and the
//! room system:
//!
//! - **Identity** ([`SessionId`], [`RoomId`]): who is talking, and where.
//! - **Messages** ([`Message`], [`Arg`]): a string discriminator plus
//!   positional arguments, with typed accessors.
//! - **Signals** ([`JOIN`], [`JOIN_DENIED`]): the only message kinds the
//!   room core itself understands. Everything else is application-defined.
//!
//! # Architecture
//!
//! ```text
//! Transport (Connection) → Protocol (Message) → Session (router) → Room
//! ```
//!
//! Wire encoding is left to the transport. The types derive serde traits
//! so any codec can carry them.

mod error;
mod types;

pub use error::ProtocolError;
pub use types::{Arg, Message, RoomId, SessionId, JOIN, JOIN_DENIED};
