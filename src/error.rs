use thiserror;

use std;

pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the crate reports. `Display` gives the human-readable
/// string surfaced to the embedding host.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("cannot encode a {0} value")]
    UnsupportedKind(&'static str),
    #[error("no wire signature for a {0} value")]
    NoSignature(&'static str),
    #[error("a {0} value cannot key a dictionary")]
    InvalidDictKey(&'static str),
    #[error("array element signature mismatch: expected {expected:?}, got {found:?}")]
    ElementMismatch { expected: String, found: String },
    #[error("message truncated at byte {0}")]
    Truncated(usize),
    #[error("malformed type signature {0:?}")]
    MalformedSignature(String),
    #[error("invalid boolean wire value {0}")]
    InvalidBool(u32),
    #[error("invalid utf-8 in wire string")]
    InvalidUtf8,
    #[error("method call parameters must be a map")]
    RecordNotMap,
    #[error("missing or wrong type for '{0}'")]
    BadCallRecord(&'static str),
    #[error("method call arguments must be a list")]
    BadCallArguments,
    #[error("no bus connection")]
    NotConnected,
    #[error("unknown bus {0:?}")]
    UnknownBus(String),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("call failed: {name}: {text}")]
    CallFailed { name: String, text: String },
    #[error("{0}() called without sub-path")]
    MissingSubpath(&'static str),
    #[error("Execute() called without an argument")]
    MissingArgument,
    #[error("undefined subpath for {verb}({path})")]
    UndefinedSubpath { verb: &'static str, path: String },
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Transport(err.to_string())
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(_: std::str::Utf8Error) -> Self {
        Error::InvalidUtf8
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(_: std::string::FromUtf8Error) -> Self {
        Error::InvalidUtf8
    }
}
