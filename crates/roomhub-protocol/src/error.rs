//! Error types for the protocol layer.
//!
//! Each crate in Roomhub defines its own error enum. A `ProtocolError`
//! always means a message did not have the shape a handler asked for,
//! never that anything went wrong on the network.

/// Errors raised by the typed argument accessors on [`Message`](crate::Message).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The message has fewer arguments than the requested index.
    #[error("missing argument at index {0}")]
    MissingArgument(usize),

    /// The argument exists but holds a different type.
    #[error("argument {index} is a {found}, expected {expected}")]
    WrongArgumentType {
        /// Position of the offending argument.
        index: usize,
        /// Name of the type the caller asked for.
        expected: &'static str,
        /// Name of the type actually stored.
        found: &'static str,
    },
}
