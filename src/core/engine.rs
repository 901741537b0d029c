// Generic parse driver.
//
// One loop walks the input in field/row units and reports everything it sees
// to an `Emitter`. The output strategies differ only in how they materialize
// fields and rows, so they plug in here as emitter implementations and the
// driver monomorphizes per strategy.
//
// Quote discipline is strict: a field is quoted only when the escape pattern
// sits at the field start. Inside a quoted field, a doubled escape encodes a
// literal copy of itself and anything else (separators, newlines, CR, LF) is
// data. An escape pattern anywhere inside an unquoted field is reported
// through `on_mid_field_escape`; reaching end of input with an open quote is
// reported through `on_unterminated_quote`. The driver itself never fails and
// always runs to end of input.

use crate::config::Config;
use crate::core::scanner;

/// Event sink driven by [`parse`].
///
/// Guarantees to implementors:
///
/// - every `on_field` of a row precedes that row's `on_row_end`;
/// - fields and rows arrive in input-byte order;
/// - field ranges satisfy `start <= end <= input.len()`;
/// - `needs_unescape` is true only for quoted fields whose interior contains
///   a doubled escape sequence;
/// - error hooks fire before the field/row events they taint.
pub trait Emitter<'i> {
    type Output;

    /// One field, as a range into `input`. For quoted fields the range is
    /// the interior (escape delimiters stripped).
    fn on_field(
        &mut self,
        input: &'i [u8],
        start: usize,
        end: usize,
        needs_unescape: bool,
        config: &Config,
    );

    /// End of a row. `end_pos` is the driver position just past the row
    /// terminator (or end of input); `newline_terminated` distinguishes a
    /// newline-terminated row from one cut short by end of input.
    fn on_row_end(&mut self, end_pos: usize, newline_terminated: bool);

    /// End of input; produce the strategy's result.
    fn finish(self) -> Self::Output;

    /// End of input was reached inside a quoted field.
    fn on_unterminated_quote(&mut self) {}

    /// The escape pattern occurred inside an unquoted field at `at`.
    fn on_mid_field_escape(&mut self, _at: usize) {}

    /// Row storage failed to grow.
    fn on_oom(&mut self) {}
}

/// Drive `emitter` over `input`.
pub fn parse<'i, E: Emitter<'i>>(input: &'i [u8], config: &Config, mut emitter: E) -> E::Output {
    if input.is_empty() {
        return emitter.finish();
    }

    let mut pos = 0;
    while pos < input.len() {
        // One row: fields until an unquoted newline or end of input.
        let (end_pos, newline_terminated) = loop {
            if let Some(k) = config.match_escape_at(input, pos) {
                // Quoted field: scan escape occurrences until one is not
                // doubled; that one closes the field.
                pos += k;
                let content_start = pos;
                let mut needs_unescape = false;
                let content_end = loop {
                    match scanner::find_escape(input, pos, config) {
                        None => {
                            emitter.on_unterminated_quote();
                            pos = input.len();
                            break pos.saturating_sub(k).max(content_start);
                        }
                        Some(hit) => {
                            let after = hit + k;
                            if config.match_escape_at(input, after).is_some() {
                                needs_unescape = true;
                                pos = after + k;
                            } else {
                                pos = after;
                                break hit;
                            }
                        }
                    }
                };
                emitter.on_field(input, content_start, content_end, needs_unescape, config);
            } else {
                // Unquoted field: runs to the next separator or newline.
                let start = pos;
                let end = match scanner::find_next_delimiter(&input[pos..], config) {
                    Some(d) => pos + d.pos,
                    None => input.len(),
                };
                if let Some(at) = scanner::find_escape(&input[..end], start, config) {
                    emitter.on_mid_field_escape(at);
                }
                emitter.on_field(input, start, end, false, config);
                pos = end;
            }

            // Row boundary decision.
            if pos < input.len() {
                if let Some(sep_len) = config.match_separator_at(input, pos) {
                    pos += sep_len;
                    continue;
                }
                match input[pos] {
                    b'\n' => {
                        pos += 1;
                        break (pos, true);
                    }
                    b'\r' => {
                        pos += 1;
                        if pos < input.len() && input[pos] == b'\n' {
                            pos += 1;
                        }
                        break (pos, true);
                    }
                    // Anything else (stray bytes after a closing quote)
                    // starts the next field of the same row immediately.
                    _ => {}
                }
            } else {
                break (pos, false);
            }
        };
        emitter.on_row_end(end_pos, newline_terminated);
    }

    emitter.finish()
}
