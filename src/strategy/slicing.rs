// Slicing strategy: zero-copy field references.
//
// Clean fields borrow straight from the input buffer; only fields whose
// interior contains doubled escapes allocate for the decoded bytes. The
// output therefore lives no longer than the input slice, which the lifetime
// enforces.

use std::borrow::Cow;

use crate::config::Config;
use crate::core::collector::RowCollector;
use crate::core::engine::{self, Emitter};
use crate::core::unescape::unescape;
use crate::error::PartialReason;
use crate::strategy::{BorrowedRow, ParseOutput};

pub struct SlicingEmitter<'i> {
    collector: RowCollector<BorrowedRow<'i>>,
    row: BorrowedRow<'i>,
    error: Option<PartialReason>,
}

impl<'i> SlicingEmitter<'i> {
    pub fn new() -> Self {
        SlicingEmitter {
            collector: RowCollector::new(),
            row: Vec::new(),
            error: None,
        }
    }

    fn record(&mut self, reason: PartialReason) {
        if self.error.is_none() {
            self.error = Some(reason);
        }
    }
}

impl<'i> Default for SlicingEmitter<'i> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'i> Emitter<'i> for SlicingEmitter<'i> {
    type Output = ParseOutput<BorrowedRow<'i>>;

    fn on_field(
        &mut self,
        input: &'i [u8],
        start: usize,
        end: usize,
        needs_unescape: bool,
        config: &Config,
    ) {
        if self.error.is_some() {
            return;
        }
        let raw = &input[start..end];
        let value = if needs_unescape {
            Cow::Owned(unescape(raw, config.escape()))
        } else {
            Cow::Borrowed(raw)
        };
        self.row.push(value);
    }

    fn on_row_end(&mut self, _end_pos: usize, _newline_terminated: bool) {
        if self.error.is_some() {
            return;
        }
        let row = std::mem::take(&mut self.row);
        if !self.collector.push(row) {
            self.on_oom();
        }
    }

    fn finish(self) -> ParseOutput<BorrowedRow<'i>> {
        let rows = self.collector.finish();
        match self.error {
            None => ParseOutput::Complete(rows),
            Some(reason) => ParseOutput::Partial(reason, rows),
        }
    }

    fn on_unterminated_quote(&mut self) {
        self.record(PartialReason::UnterminatedEscape);
    }

    fn on_mid_field_escape(&mut self, at: usize) {
        self.record(PartialReason::UnexpectedEscape { at });
    }

    fn on_oom(&mut self) {
        self.record(PartialReason::OutOfMemory);
    }
}

/// Parse into rows of sub-slices, decoding only where doubled escapes force
/// an allocation. The result borrows from `input`.
pub fn parse_borrowed<'a>(input: &'a [u8], config: &Config) -> ParseOutput<BorrowedRow<'a>> {
    engine::parse(input, config, SlicingEmitter::new())
}
