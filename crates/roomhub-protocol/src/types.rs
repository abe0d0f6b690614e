//! Core types shared by every Roomhub layer.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Message kind a lobby understands: `join(room_id)`.
pub const JOIN: &str = "join";

/// Message kind sent to a session whose join was rejected.
pub const JOIN_DENIED: &str = "joinDenied";

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Process-unique identity of one logical client connection.
///
/// Issued by the session manager from a monotonically increasing counter,
/// so the first session of a server is `S-0`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.0)
    }
}

/// The name a room is registered under.
///
/// Unique within a registry. Implements `Borrow<str>` so maps keyed by
/// `RoomId` can be queried with a plain `&str`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Creates a room id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for RoomId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for RoomId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for RoomId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Arg
// ---------------------------------------------------------------------------

/// One positional argument of a [`Message`].
///
/// Untagged on the wire: a JSON string is `Str`, an integer is `Int`, and
/// so on, so `["arena1", 3]` decodes without extra type markers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Arg {
    /// UTF-8 text.
    Str(String),
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Boolean flag.
    Bool(bool),
    /// Raw bytes.
    Bytes(Vec<u8>),
}

impl Arg {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Str(_) => "string",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Bool(_) => "bool",
            Self::Bytes(_) => "bytes",
        }
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for Arg {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Arg {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for Arg {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Arg {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Arg {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<u8>> for Arg {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// An immutable typed payload: a string discriminator plus positional
/// arguments.
///
/// Room handlers receive messages by reference and never mutate them.
///
/// ```rust
/// use roomhub_protocol::Message;
///
/// let msg = Message::new("join").with_arg("arena1");
/// assert_eq!(msg.kind(), "join");
/// assert_eq!(msg.get_string(0).unwrap(), "arena1");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    args: Vec<Arg>,
}

impl Message {
    /// Creates a message with no arguments.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            args: Vec::new(),
        }
    }

    /// Creates a message with the given arguments.
    pub fn with_args(kind: impl Into<String>, args: Vec<Arg>) -> Self {
        Self {
            kind: kind.into(),
            args,
        }
    }

    /// Appends one argument, builder style.
    pub fn with_arg(mut self, arg: impl Into<Arg>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// The string discriminator.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// `true` if the discriminator equals `kind`.
    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }

    /// All positional arguments.
    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    /// Number of positional arguments.
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// `true` if the message carries no arguments.
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// The argument at `index`, if present.
    pub fn get(&self, index: usize) -> Option<&Arg> {
        self.args.get(index)
    }

    /// The argument at `index` as a string.
    pub fn get_string(&self, index: usize) -> Result<&str, ProtocolError> {
        match self.arg(index)? {
            Arg::Str(s) => Ok(s),
            other => Err(mismatch(index, other, "string")),
        }
    }

    /// The argument at `index` as an integer.
    pub fn get_int(&self, index: usize) -> Result<i64, ProtocolError> {
        match self.arg(index)? {
            Arg::Int(n) => Ok(*n),
            other => Err(mismatch(index, other, "integer")),
        }
    }

    /// The argument at `index` as a float. Integers widen.
    pub fn get_float(&self, index: usize) -> Result<f64, ProtocolError> {
        match self.arg(index)? {
            Arg::Float(f) => Ok(*f),
            Arg::Int(n) => Ok(*n as f64),
            other => Err(mismatch(index, other, "float")),
        }
    }

    /// The argument at `index` as a bool.
    pub fn get_bool(&self, index: usize) -> Result<bool, ProtocolError> {
        match self.arg(index)? {
            Arg::Bool(b) => Ok(*b),
            other => Err(mismatch(index, other, "bool")),
        }
    }

    /// The argument at `index` as raw bytes.
    pub fn get_bytes(&self, index: usize) -> Result<&[u8], ProtocolError> {
        match self.arg(index)? {
            Arg::Bytes(b) => Ok(b),
            other => Err(mismatch(index, other, "bytes")),
        }
    }

    fn arg(&self, index: usize) -> Result<&Arg, ProtocolError> {
        self.args
            .get(index)
            .ok_or(ProtocolError::MissingArgument(index))
    }
}

fn mismatch(index: usize, found: &Arg, expected: &'static str) -> ProtocolError {
    ProtocolError::WrongArgumentType {
        index,
        expected,
        found: found.type_name(),
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.kind)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match arg {
                Arg::Str(s) => write!(f, "{s:?}")?,
                Arg::Int(n) => write!(f, "{n}")?,
                Arg::Float(x) => write!(f, "{x}")?,
                Arg::Bool(b) => write!(f, "{b}")?,
                Arg::Bytes(b) => write!(f, "<{} bytes>", b.len())?,
            }
        }
        f.write_str(")")
    }
}

// =========================================================================
// Tests
// =========================================================================
