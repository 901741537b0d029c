// Error types surfaced at the crate boundary.
//
// Parsing itself never fails mid-stream: the engine runs to end of input and
// structural problems come back as a partial result carrying the rows that
// were recovered before the problem. Only configuration construction and the
// streaming back-pressure guard return ordinary `Result` errors.

use std::{error, fmt};

/// Rejected separator/escape configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The separator list was empty.
    NoSeparators,
    /// More separator patterns than the supported maximum.
    TooManySeparators(usize),
    /// A separator pattern was zero-length.
    EmptySeparator,
    /// A separator pattern exceeded the maximum pattern length.
    SeparatorTooLong(usize),
    /// The escape pattern was zero-length.
    EmptyEscape,
    /// The escape pattern exceeded the maximum pattern length.
    EscapeTooLong(usize),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ConfigError::NoSeparators => write!(f, "at least one separator is required"),
            ConfigError::TooManySeparators(n) => {
                write!(f, "{} separators given, at most {} supported", n, crate::config::MAX_SEPARATORS)
            }
            ConfigError::EmptySeparator => write!(f, "separator patterns must be non-empty"),
            ConfigError::SeparatorTooLong(n) => {
                write!(f, "separator of {} bytes exceeds the {}-byte limit", n, crate::config::MAX_PATTERN_LEN)
            }
            ConfigError::EmptyEscape => write!(f, "escape pattern must be non-empty"),
            ConfigError::EscapeTooLong(n) => {
                write!(f, "escape of {} bytes exceeds the {}-byte limit", n, crate::config::MAX_PATTERN_LEN)
            }
        }
    }
}

impl error::Error for ConfigError {}

/// Why a parse came back partial instead of complete.
///
/// The rows gathered before the problem are always preserved alongside the
/// reason; see [`crate::strategy::ParseOutput`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartialReason {
    /// End of input was reached inside a quoted field.
    UnterminatedEscape,
    /// The escape pattern appeared inside an unquoted field at this byte
    /// offset.
    UnexpectedEscape { at: usize },
    /// The row collector could not grow; rows after the failure were dropped.
    OutOfMemory,
}

impl fmt::Display for PartialReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            PartialReason::UnterminatedEscape => {
                write!(f, "input ended inside a quoted field")
            }
            PartialReason::UnexpectedEscape { at } => {
                write!(f, "escape character inside an unquoted field at byte {at}")
            }
            PartialReason::OutOfMemory => write!(f, "row storage could not grow"),
        }
    }
}

impl error::Error for PartialReason {}

/// Raised by [`crate::strategy::StreamingParser::feed`] when accepting a chunk
/// would push the retained buffer past the configured cap.
///
/// This bounds memory when the input contains a quoted field that never
/// closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferOverflow {
    /// Bytes the buffer would have held after the feed.
    pub required: usize,
    /// The configured cap.
    pub limit: usize,
}

impl fmt::Display for BufferOverflow {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "streaming buffer would grow to {} bytes, over the {}-byte limit",
            self.required, self.limit
        )
    }
}

impl error::Error for BufferOverflow {}
