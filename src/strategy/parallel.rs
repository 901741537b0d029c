// Parallel strategy.
//
// Phase 1 (single thread): quote-aware scan for every row start position.
// Phase 2: group contiguous rows into batches, one parse task per batch.
// Phase 3 (rayon global pool): run the copying strategy over each batch,
// then splice the results back in input order.
//
// Batch boundaries are real row starts, so every worker sees well-formed
// rows and the concatenated output is byte-identical to a single-threaded
// parse. Rows consisting of a single empty field are skipped, matching the
// streaming strategy. `UnexpectedEscape` offsets are rebased from
// batch-relative to absolute input positions.

use memchr::{memchr, memchr3};
use rayon::prelude::*;

use crate::config::Config;
use crate::core::scanner;
use crate::error::PartialReason;
use crate::strategy::{copying, ParseOutput, Row};

/// Minimum rows per parallel batch; below this the task overhead dominates.
const MIN_BATCH_ROWS: usize = 64;

/// All row start positions (always includes 0), quote-aware.
fn row_starts(input: &[u8], config: &Config) -> Vec<usize> {
    let mut starts = Vec::with_capacity(scanner::count_byte(input, b'\n') + 1);
    starts.push(0);

    if config.is_single_byte_escape() {
        let esc = config.escape_byte();
        let mut pos = 0;
        let mut in_quotes = false;
        while pos < input.len() {
            if in_quotes {
                match memchr(esc, &input[pos..]) {
                    Some(offset) => {
                        let found = pos + offset;
                        if found + 1 < input.len() && input[found + 1] == esc {
                            pos = found + 2;
                        } else {
                            in_quotes = false;
                            pos = found + 1;
                        }
                    }
                    None => break,
                }
            } else {
                match memchr3(esc, b'\n', b'\r', &input[pos..]) {
                    Some(offset) => {
                        let found = pos + offset;
                        match input[found] {
                            b if b == esc => {
                                in_quotes = true;
                                pos = found + 1;
                            }
                            b'\n' => {
                                pos = found + 1;
                                if pos < input.len() {
                                    starts.push(pos);
                                }
                            }
                            _ => {
                                pos = found + 1;
                                if pos < input.len() && input[pos] == b'\n' {
                                    pos += 1;
                                }
                                if pos < input.len() {
                                    starts.push(pos);
                                }
                            }
                        }
                    }
                    None => break,
                }
            }
        }
        return starts;
    }

    let esc = config.escape();
    let k = esc.len();
    let mut pos = 0;
    let mut in_quotes = false;
    while pos < input.len() {
        if in_quotes {
            if input[pos..].starts_with(esc) {
                if input[pos + k..].starts_with(esc) {
                    pos += 2 * k;
                } else {
                    in_quotes = false;
                    pos += k;
                }
            } else {
                pos += 1;
            }
        } else if input[pos..].starts_with(esc) {
            in_quotes = true;
            pos += k;
        } else if input[pos] == b'\n' {
            pos += 1;
            if pos < input.len() {
                starts.push(pos);
            }
        } else if input[pos] == b'\r' {
            pos += 1;
            if pos < input.len() && input[pos] == b'\n' {
                pos += 1;
            }
            if pos < input.len() {
                starts.push(pos);
            }
        } else {
            pos += 1;
        }
    }
    starts
}

fn rebase(out: ParseOutput<Row>, offset: usize) -> ParseOutput<Row> {
    match out {
        ParseOutput::Partial(PartialReason::UnexpectedEscape { at }, rows) => {
            ParseOutput::Partial(PartialReason::UnexpectedEscape { at: at + offset }, rows)
        }
        other => other,
    }
}

/// Parse on the rayon global pool, batching contiguous rows per worker.
pub fn parse_parallel(input: &[u8], config: &Config) -> ParseOutput<Row> {
    if input.is_empty() {
        return ParseOutput::Complete(Vec::new());
    }

    let starts = row_starts(input, config);
    // Aim for a few batches per worker so uneven row sizes still balance.
    let batch = (starts.len() / (rayon::current_num_threads() * 4)).max(MIN_BATCH_ROWS);

    let mut ranges = Vec::with_capacity(starts.len() / batch + 1);
    let mut i = 0;
    while i < starts.len() {
        let begin = starts[i];
        let end = if i + batch < starts.len() {
            starts[i + batch]
        } else {
            input.len()
        };
        ranges.push((begin, end));
        i += batch;
    }

    let results: Vec<ParseOutput<Row>> = ranges
        .par_iter()
        .map(|&(begin, end)| rebase(copying::parse_with(&input[begin..end], config), begin))
        .collect();

    // Splice in input order, stopping at the first partial batch: the rows
    // after a structural problem are dropped, exactly as in a single parse.
    let mut rows: Vec<Row> = Vec::new();
    for result in results {
        let partial = result.partial_reason();
        let batch_rows = result.into_rows();
        rows.extend(
            batch_rows
                .into_iter()
                .filter(|row| !(row.len() == 1 && row[0].is_empty())),
        );
        if let Some(reason) = partial {
            return ParseOutput::Partial(reason, rows);
        }
    }
    ParseOutput::Complete(rows)
}
