// Copying strategy: every field becomes an owned byte vector.
//
// The workhorse strategy; streaming and parallel parses delegate to it per
// prefix/batch. The first structural problem latches: the offending row and
// everything after it are dropped, rows gathered before it survive in the
// partial result.

use crate::config::Config;
use crate::core::collector::RowCollector;
use crate::core::engine::{self, Emitter};
use crate::core::unescape::unescape_into;
use crate::error::PartialReason;
use crate::strategy::{ParseOutput, Row};

pub struct CopyingEmitter {
    collector: RowCollector<Row>,
    row: Row,
    error: Option<PartialReason>,
}

impl CopyingEmitter {
    pub fn new() -> Self {
        CopyingEmitter {
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

impl Default for CopyingEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl<'i> Emitter<'i> for CopyingEmitter {
    type Output = ParseOutput<Row>;

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
            let mut out = Vec::with_capacity(raw.len());
            unescape_into(raw, config.escape(), &mut out);
            out
        } else {
            raw.to_vec()
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

    fn finish(self) -> ParseOutput<Row> {
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

/// Parse with the default comma/double-quote configuration.
pub fn parse(input: &[u8]) -> ParseOutput<Row> {
    parse_with(input, &Config::default())
}

/// Parse into owned rows.
pub fn parse_with(input: &[u8], config: &Config) -> ParseOutput<Row> {
    engine::parse(input, config, CopyingEmitter::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(input: &[u8]) -> Vec<Vec<Vec<u8>>> {
        match parse(input) {
            ParseOutput::Complete(rows) => rows,
            other => panic!("expected complete parse, got {other:?}"),
        }
    }

    fn owned(row: &[&[u8]]) -> Row {
        row.iter().map(|f| f.to_vec()).collect()
    }

    #[test]
    fn test_basic_rows() {
        assert_eq!(
            rows(b"a,b,c\n1,2,3\n"),
            vec![owned(&[b"a", b"b", b"c"]), owned(&[b"1", b"2", b"3"])]
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(rows(b""), Vec::<Row>::new());
    }

    #[test]
    fn test_quoted_comma_and_doubled_quotes() {
        assert_eq!(
            rows(b"\"hello, world\",\"he said \"\"hi\"\"\"\n"),
            vec![owned(&[b"hello, world", b"he said \"hi\""])]
        );
    }

    #[test]
    fn test_quoted_newline() {
        assert_eq!(
            rows(b"\"line1\nline2\",x\n"),
            vec![owned(&[b"line1\nline2", b"x"])]
        );
    }

    #[test]
    fn test_no_trailing_newline() {
        assert_eq!(
            rows(b"a,b\nc,d"),
            vec![owned(&[b"a", b"b"]), owned(&[b"c", b"d"])]
        );
    }

    #[test]
    fn test_ragged_rows() {
        assert_eq!(
            rows(b"a,b,c\nd\ne,f\n"),
            vec![
                owned(&[b"a", b"b", b"c"]),
                owned(&[b"d"]),
                owned(&[b"e", b"f"]),
            ]
        );
    }

    #[test]
    fn test_empty_fields_and_rows() {
        assert_eq!(
            rows(b"a,,b\n\nc\n"),
            vec![owned(&[b"a", b"", b"b"]), owned(&[b""]), owned(&[b"c"])]
        );
    }

    #[test]
    fn test_multi_pattern_separators() {
        let c = Config::new(vec![b",".to_vec(), b"|".to_vec()], b"\"".to_vec()).unwrap();
        assert_eq!(
            parse_with(b"a,b|c\n", &c).into_rows(),
            vec![owned(&[b"a", b"b", b"c"])]
        );
    }

    #[test]
    fn test_multi_byte_separator() {
        let c = Config::new(vec![b"||".to_vec()], b"\"".to_vec()).unwrap();
        assert_eq!(
            parse_with(b"a||b||c\n", &c).into_rows(),
            vec![owned(&[b"a", b"b", b"c"])]
        );
    }

    #[test]
    fn test_multi_byte_escape_decodes() {
        let c = Config::new(vec![b"::".to_vec()], b"$$".to_vec()).unwrap();
        assert_eq!(
            parse_with(b"$$val$$$$ue$$::other\n", &c).into_rows(),
            vec![owned(&[b"val$$ue", b"other"])]
        );
    }

    #[test]
    fn test_unterminated_quote_drops_open_row() {
        assert_eq!(
            parse(b"\"unterminated,x\n"),
            ParseOutput::Partial(PartialReason::UnterminatedEscape, vec![])
        );
        // rows before the open quote survive
        assert_eq!(
            parse(b"a,b\n\"oops"),
            ParseOutput::Partial(
                PartialReason::UnterminatedEscape,
                vec![owned(&[b"a", b"b"])]
            )
        );
    }

    #[test]
    fn test_mid_field_escape_is_partial_with_position() {
        assert_eq!(
            parse(b"a,b\nc\"d,e\nf,g\n"),
            ParseOutput::Partial(
                PartialReason::UnexpectedEscape { at: 5 },
                vec![owned(&[b"a", b"b"])]
            )
        );
    }

    #[test]
    fn test_trailing_escape_in_unquoted_field_is_partial() {
        assert_eq!(
            parse(b"ab\",x\n"),
            ParseOutput::Partial(PartialReason::UnexpectedEscape { at: 2 }, vec![])
        );
    }

    #[test]
    fn test_cr_only_line_endings() {
        assert_eq!(
            rows(b"a,b\rc,d\r"),
            vec![owned(&[b"a", b"b"]), owned(&[b"c", b"d"])]
        );
    }

    #[test]
    fn test_embedded_nul_and_control_bytes() {
        assert_eq!(
            rows(b"a\x00b,c\x01\n"),
            vec![owned(&[b"a\x00b", b"c\x01"])]
        );
    }
}
