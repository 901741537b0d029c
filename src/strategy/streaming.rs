// Streaming strategy: feed chunks, get complete rows back, bounded memory.
//
// State is just the retained buffer and the configuration. Each feed appends
// the chunk, finds the last complete-row boundary with a quote-aware walk,
// parses everything before it with the copying strategy, and keeps the
// suffix for the next feed. A separator, escape pattern, or \r\n pair split
// across chunks is therefore handled for free: no cut falls inside one.
//
// At rest the buffer holds either nothing or the continuation of a row whose
// terminating newline has not arrived. The buffer cap turns a quoted field
// that never closes into an error instead of unbounded growth.
//
// Rows consisting of a single empty field are skipped, so a \r\n pair split
// across two feeds ("\r" closes a row in one feed, the leading "\n" of the
// next would otherwise parse as an empty row) yields exactly one row
// boundary.

use memchr::{memchr, memchr3};

use crate::config::Config;
use crate::error::BufferOverflow;
use crate::strategy::{copying, ParseOutput, Row};

/// Default cap on retained bytes: 256 MB.
pub const DEFAULT_MAX_BUFFER: usize = 256 * 1024 * 1024;

/// Offset just past the last row that is complete in `buffer`: an unquoted
/// newline with no quote left open before it. 0 when there is none.
pub fn last_complete_row_boundary(buffer: &[u8], config: &Config) -> usize {
    if config.is_single_byte_escape() {
        return boundary_single_byte(buffer, config.escape_byte());
    }
    boundary_general(buffer, config.escape())
}

/// Single-byte escape walk: memchr jumps between interesting bytes.
fn boundary_single_byte(buffer: &[u8], esc: u8) -> usize {
    let mut cut = 0;
    let mut pos = 0;
    let mut in_quotes = false;

    while pos < buffer.len() {
        if in_quotes {
            // Inside quotes only the escape byte matters.
            match memchr(esc, &buffer[pos..]) {
                Some(offset) => {
                    let found = pos + offset;
                    if found + 1 < buffer.len() && buffer[found + 1] == esc {
                        pos = found + 2;
                    } else {
                        in_quotes = false;
                        pos = found + 1;
                    }
                }
                None => return cut,
            }
        } else {
            match memchr3(esc, b'\n', b'\r', &buffer[pos..]) {
                Some(offset) => {
                    let found = pos + offset;
                    match buffer[found] {
                        b if b == esc => {
                            in_quotes = true;
                            pos = found + 1;
                        }
                        b'\n' => {
                            pos = found + 1;
                            cut = pos;
                        }
                        _ => {
                            // \r, alone or as the start of \r\n
                            pos = found + 1;
                            if pos < buffer.len() && buffer[pos] == b'\n' {
                                pos += 1;
                            }
                            cut = pos;
                        }
                    }
                }
                None => return cut,
            }
        }
    }

    cut
}

/// Multi-byte escape walk.
fn boundary_general(buffer: &[u8], esc: &[u8]) -> usize {
    let k = esc.len();
    let mut cut = 0;
    let mut pos = 0;
    let mut in_quotes = false;

    while pos < buffer.len() {
        if in_quotes {
            if buffer[pos..].starts_with(esc) {
                if buffer[pos + k..].starts_with(esc) {
                    pos += 2 * k;
                } else {
                    in_quotes = false;
                    pos += k;
                }
            } else {
                pos += 1;
            }
        } else if buffer[pos..].starts_with(esc) {
            in_quotes = true;
            pos += k;
        } else if buffer[pos] == b'\n' {
            pos += 1;
            cut = pos;
        } else if buffer[pos] == b'\r' {
            pos += 1;
            if pos < buffer.len() && buffer[pos] == b'\n' {
                pos += 1;
            }
            cut = pos;
        } else {
            pos += 1;
        }
    }

    cut
}

fn skip_empty_rows(out: ParseOutput<Row>) -> ParseOutput<Row> {
    let keep = |row: &Row| !(row.len() == 1 && row[0].is_empty());
    match out {
        ParseOutput::Complete(mut rows) => {
            rows.retain(keep);
            ParseOutput::Complete(rows)
        }
        ParseOutput::Partial(reason, mut rows) => {
            rows.retain(keep);
            ParseOutput::Partial(reason, rows)
        }
    }
}

/// Stateful chunk-feeding parser.
pub struct StreamingParser {
    buffer: Vec<u8>,
    config: Config,
    max_buffer_size: usize,
}

impl StreamingParser {
    pub fn new(config: Config) -> Self {
        StreamingParser {
            buffer: Vec::new(),
            config,
            max_buffer_size: DEFAULT_MAX_BUFFER,
        }
    }

    /// Cap on retained bytes; exceeded feeds fail with [`BufferOverflow`].
    pub fn set_max_buffer_size(&mut self, max: usize) {
        self.max_buffer_size = max;
    }

    /// Append a chunk and parse every row completed by it.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<ParseOutput<Row>, BufferOverflow> {
        let required = self.buffer.len() + chunk.len();
        if required > self.max_buffer_size {
            return Err(BufferOverflow {
                required,
                limit: self.max_buffer_size,
            });
        }

        self.buffer.extend_from_slice(chunk);
        let cut = last_complete_row_boundary(&self.buffer, &self.config);
        if cut == 0 {
            return Ok(ParseOutput::Complete(Vec::new()));
        }

        let out = copying::parse_with(&self.buffer[..cut], &self.config);
        self.buffer.drain(..cut);
        Ok(skip_empty_rows(out))
    }

    /// Parse whatever remains in the buffer as the final row(s) and clear it.
    pub fn finalize(&mut self) -> ParseOutput<Row> {
        if self.buffer.is_empty() {
            return ParseOutput::Complete(Vec::new());
        }
        let rest = std::mem::take(&mut self.buffer);
        skip_empty_rows(copying::parse_with(&rest, &self.config))
    }

    /// `(retained bytes, partial row pending)`.
    pub fn status(&self) -> (usize, bool) {
        (self.buffer.len(), !self.buffer.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PartialReason;

    fn owned(row: &[&[u8]]) -> Row {
        row.iter().map(|f| f.to_vec()).collect()
    }

    fn feed_ok(parser: &mut StreamingParser, chunk: &[u8]) -> Vec<Row> {
        parser.feed(chunk).unwrap().into_rows()
    }

    #[test]
    fn test_boundary_simple() {
        let c = Config::default();
        assert_eq!(last_complete_row_boundary(b"a,b\n1,", &c), 4);
        assert_eq!(last_complete_row_boundary(b"a,b\n1,2\n", &c), 8);
        assert_eq!(last_complete_row_boundary(b"a,b", &c), 0);
        assert_eq!(last_complete_row_boundary(b"", &c), 0);
    }

    #[test]
    fn test_boundary_ignores_quoted_newlines() {
        let c = Config::default();
        assert_eq!(last_complete_row_boundary(b"\"a\nb", &c), 0);
        assert_eq!(last_complete_row_boundary(b"\"a\nb\",c\nd", &c), 8);
        // doubled escape stays inside the quote
        assert_eq!(last_complete_row_boundary(b"\"a\"\"\nb", &c), 0);
    }

    #[test]
    fn test_boundary_crlf_and_bare_cr() {
        let c = Config::default();
        assert_eq!(last_complete_row_boundary(b"a\r\nb", &c), 3);
        assert_eq!(last_complete_row_boundary(b"a\rb", &c), 2);
        // trailing \r: boundary sits right after it
        assert_eq!(last_complete_row_boundary(b"a,b\r", &c), 4);
    }

    #[test]
    fn test_boundary_multi_byte_escape() {
        let c = Config::new(vec![b",".to_vec()], b"$$".to_vec()).unwrap();
        assert_eq!(last_complete_row_boundary(b"$$a\nb", &c), 0);
        assert_eq!(last_complete_row_boundary(b"$$a\nb$$,c\nd", &c), 10);
        assert_eq!(last_complete_row_boundary(b"$$a$$$$\nb", &c), 0);
    }

    #[test]
    fn test_feed_across_field_boundary() {
        let mut parser = StreamingParser::new(Config::default());
        assert_eq!(feed_ok(&mut parser, b"a,b\n1,"), vec![owned(&[b"a", b"b"])]);
        assert_eq!(
            feed_ok(&mut parser, b"2\n3,4\n"),
            vec![owned(&[b"1", b"2"]), owned(&[b"3", b"4"])]
        );
        assert_eq!(parser.status(), (0, false));
    }

    #[test]
    fn test_feed_quoted_field_split_across_chunks() {
        let mut parser = StreamingParser::new(Config::default());
        assert_eq!(feed_ok(&mut parser, b"\"he"), Vec::<Row>::new());
        let (buffered, partial) = parser.status();
        assert_eq!((buffered, partial), (3, true));
        assert_eq!(
            feed_ok(&mut parser, b"llo\",world\n"),
            vec![owned(&[b"hello", b"world"])]
        );
    }

    #[test]
    fn test_quoted_newline_never_cuts() {
        let mut parser = StreamingParser::new(Config::default());
        assert_eq!(feed_ok(&mut parser, b"a,\"line1\n"), Vec::<Row>::new());
        assert_eq!(
            feed_ok(&mut parser, b"line2\",c\n"),
            vec![owned(&[b"a", b"line1\nline2", b"c"])]
        );
    }

    #[test]
    fn test_crlf_split_across_chunks() {
        let mut parser = StreamingParser::new(Config::default());
        assert_eq!(feed_ok(&mut parser, b"a,b\r"), vec![owned(&[b"a", b"b"])]);
        // the dangling \n parses as an empty row, which streaming skips
        assert_eq!(feed_ok(&mut parser, b"\nc,d\n"), vec![owned(&[b"c", b"d"])]);
    }

    #[test]
    fn test_separator_split_across_chunks() {
        let c = Config::new(vec![b"||".to_vec()], b"\"".to_vec()).unwrap();
        let mut parser = StreamingParser::new(c);
        assert_eq!(feed_ok(&mut parser, b"a|"), Vec::<Row>::new());
        assert_eq!(feed_ok(&mut parser, b"|b\n"), vec![owned(&[b"a", b"b"])]);
    }

    #[test]
    fn test_escape_split_across_chunks() {
        let c = Config::new(vec![b",".to_vec()], b"$$".to_vec()).unwrap();
        let mut parser = StreamingParser::new(c);
        assert_eq!(feed_ok(&mut parser, b"$$a,b$"), Vec::<Row>::new());
        assert_eq!(feed_ok(&mut parser, b"$,c\n"), vec![owned(&[b"a,b", b"c"])]);
    }

    #[test]
    fn test_finalize_flushes_partial_row() {
        let mut parser = StreamingParser::new(Config::default());
        assert_eq!(feed_ok(&mut parser, b"a,b\n1,2"), vec![owned(&[b"a", b"b"])]);
        assert_eq!(
            parser.finalize(),
            ParseOutput::Complete(vec![owned(&[b"1", b"2"])])
        );
        assert_eq!(parser.status(), (0, false));
        assert_eq!(parser.finalize(), ParseOutput::Complete(vec![]));
    }

    #[test]
    fn test_finalize_surfaces_unterminated_quote() {
        let mut parser = StreamingParser::new(Config::default());
        assert_eq!(feed_ok(&mut parser, b"a\n\"open"), vec![owned(&[b"a"])]);
        assert_eq!(
            parser.finalize(),
            ParseOutput::Partial(PartialReason::UnterminatedEscape, vec![])
        );
    }

    #[test]
    fn test_feed_surfaces_mid_field_escape() {
        let mut parser = StreamingParser::new(Config::default());
        let out = parser.feed(b"a\"b,c\n").unwrap();
        assert_eq!(
            out,
            ParseOutput::Partial(PartialReason::UnexpectedEscape { at: 1 }, vec![])
        );
    }

    #[test]
    fn test_buffer_cap() {
        let mut parser = StreamingParser::new(Config::default());
        parser.set_max_buffer_size(8);
        assert!(parser.feed(b"\"openquote").is_err());
        // under the cap still works
        assert!(parser.feed(b"a,b\n").is_ok());
    }

    #[test]
    fn test_many_small_feeds() {
        let input = b"aa,bb\ncc,dd\nee,ff\n";
        let mut parser = StreamingParser::new(Config::default());
        let mut rows = Vec::new();
        for chunk in input.chunks(1) {
            rows.extend(parser.feed(chunk).unwrap().into_rows());
        }
        rows.extend(parser.finalize().into_rows());
        assert_eq!(
            rows,
            vec![
                owned(&[b"aa", b"bb"]),
                owned(&[b"cc", b"dd"]),
                owned(&[b"ee", b"ff"]),
            ]
        );
    }
}
