// Output strategies.
//
// Each strategy is an emitter over the shared engine plus a small entry
// point. They differ only in how fields are materialized:
//
// copying:   owned byte vectors per field
// slicing:   Cow sub-slices of the input, owned only when decoding is needed
// chunked:   owned rows plus the offset where the last complete row ended
// streaming: stateful chunk feeding with bounded buffering
// parallel:  row-aligned batches parsed on a rayon pool

pub mod chunked;
pub mod copying;
pub mod parallel;
pub mod slicing;
pub mod streaming;

use std::borrow::Cow;

use crate::error::PartialReason;

/// One parsed row of owned field values.
pub type Row = Vec<Vec<u8>>;

/// One parsed row of fields borrowing from the input where possible.
pub type BorrowedRow<'a> = Vec<Cow<'a, [u8]>>;

/// Result of a parse: either every row, or the rows recovered before the
/// first structural problem together with its reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutput<R> {
    Complete(Vec<R>),
    Partial(PartialReason, Vec<R>),
}

impl<R> ParseOutput<R> {
    pub fn rows(&self) -> &[R] {
        match self {
            ParseOutput::Complete(rows) | ParseOutput::Partial(_, rows) => rows,
        }
    }

    pub fn into_rows(self) -> Vec<R> {
        match self {
            ParseOutput::Complete(rows) | ParseOutput::Partial(_, rows) => rows,
        }
    }

    pub fn is_partial(&self) -> bool {
        matches!(self, ParseOutput::Partial(..))
    }

    pub fn partial_reason(&self) -> Option<PartialReason> {
        match self {
            ParseOutput::Complete(_) => None,
            ParseOutput::Partial(reason, _) => Some(*reason),
        }
    }
}

pub use chunked::parse_chunk;
pub use copying::{parse, parse_with};
pub use parallel::parse_parallel;
pub use slicing::parse_borrowed;
pub use streaming::StreamingParser;
