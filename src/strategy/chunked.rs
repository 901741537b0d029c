// Chunked strategy: owned rows plus the byte offset where the last
// newline-terminated row ended.
//
// Callers that hand-manage their own buffering parse a chunk, take the rows,
// and resume from the returned offset; the bytes past it are the beginning
// of a row that has not seen its newline yet.

use crate::config::Config;
use crate::core::engine::{self, Emitter};
use crate::strategy::copying::CopyingEmitter;
use crate::strategy::{ParseOutput, Row};

pub struct ChunkingEmitter {
    inner: CopyingEmitter,
    last_row_end: usize,
}

impl ChunkingEmitter {
    pub fn new() -> Self {
        ChunkingEmitter {
            inner: CopyingEmitter::new(),
            last_row_end: 0,
        }
    }
}

impl Default for ChunkingEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl<'i> Emitter<'i> for ChunkingEmitter {
    type Output = (ParseOutput<Row>, usize);

    fn on_field(
        &mut self,
        input: &'i [u8],
        start: usize,
        end: usize,
        needs_unescape: bool,
        config: &Config,
    ) {
        self.inner.on_field(input, start, end, needs_unescape, config);
    }

    fn on_row_end(&mut self, end_pos: usize, newline_terminated: bool) {
        self.inner.on_row_end(end_pos, newline_terminated);
        if newline_terminated {
            self.last_row_end = end_pos;
        }
    }

    fn finish(self) -> (ParseOutput<Row>, usize) {
        (self.inner.finish(), self.last_row_end)
    }

    fn on_unterminated_quote(&mut self) {
        self.inner.on_unterminated_quote();
    }

    fn on_mid_field_escape(&mut self, at: usize) {
        self.inner.on_mid_field_escape(at);
    }

    fn on_oom(&mut self) {
        self.inner.on_oom();
    }
}

/// Parse into owned rows and report where the last complete row ended
/// (0 when no row terminator was seen).
pub fn parse_chunk(input: &[u8], config: &Config) -> (ParseOutput<Row>, usize) {
    engine::parse(input, config, ChunkingEmitter::new())
}
