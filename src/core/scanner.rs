// SIMD byte-class scanning.
//
// Every search here is "find the first member of a small byte set" or a thin
// composition of one: single byte, three bytes, up to ten bytes (separator
// first bytes plus the two newline bytes), a multi-byte pattern, or the next
// field/row delimiter. Each routine broadcasts its targets, compares a chunk
// per iteration, ORs the comparison masks, and extracts the lowest set bit;
// a scalar loop handles the tail.
//
// ## Stabilization-safe API subset (std::simd)
//
// Only Simd::from_slice, splat, simd_eq, to_bitmask, and bitwise ops are
// used. On current nightly `Mask::to_bitmask()` returns u64 regardless of
// lane count; the upper bits are zero for 16/32 lanes, so trailing_zeros and
// count_ones work on the raw mask.
//
// The AVX2 wide path (32 bytes) runs first, then 16-byte chunks, then the
// scalar tail.

use std::simd::prelude::*;

use crate::config::Config;

/// Baseline SIMD chunk size (128-bit).
pub(crate) const CHUNK: usize = 16;

/// Wide chunk size for AVX2 targets.
#[cfg(target_feature = "avx2")]
pub(crate) const WIDE: usize = 32;

// ---------------------------------------------------------------------------
// Single-byte search
// ---------------------------------------------------------------------------

/// Find the first occurrence of `needle`.
pub fn find_byte(haystack: &[u8], needle: u8) -> Option<usize> {
    let mut pos = 0;

    #[cfg(target_feature = "avx2")]
    {
        let splat = Simd::<u8, WIDE>::splat(needle);
        while pos + WIDE <= haystack.len() {
            let chunk = Simd::<u8, WIDE>::from_slice(&haystack[pos..pos + WIDE]);
            let mask = chunk.simd_eq(splat).to_bitmask();
            if mask != 0 {
                return Some(pos + mask.trailing_zeros() as usize);
            }
            pos += WIDE;
        }
    }

    {
        let splat = Simd::<u8, CHUNK>::splat(needle);
        while pos + CHUNK <= haystack.len() {
            let chunk = Simd::<u8, CHUNK>::from_slice(&haystack[pos..pos + CHUNK]);
            let mask = chunk.simd_eq(splat).to_bitmask();
            if mask != 0 {
                return Some(pos + mask.trailing_zeros() as usize);
            }
            pos += CHUNK;
        }
    }

    haystack[pos..]
        .iter()
        .position(|&b| b == needle)
        .map(|i| pos + i)
}

/// Find the first occurrence of any of three target bytes.
pub fn find_any_of_three(haystack: &[u8], a: u8, b: u8, c: u8) -> Option<usize> {
    let mut pos = 0;

    #[cfg(target_feature = "avx2")]
    {
        let sa = Simd::<u8, WIDE>::splat(a);
        let sb = Simd::<u8, WIDE>::splat(b);
        let sc = Simd::<u8, WIDE>::splat(c);
        while pos + WIDE <= haystack.len() {
            let chunk = Simd::<u8, WIDE>::from_slice(&haystack[pos..pos + WIDE]);
            let hits = chunk.simd_eq(sa) | chunk.simd_eq(sb) | chunk.simd_eq(sc);
            let mask = hits.to_bitmask();
            if mask != 0 {
                return Some(pos + mask.trailing_zeros() as usize);
            }
            pos += WIDE;
        }
    }

    {
        let sa = Simd::<u8, CHUNK>::splat(a);
        let sb = Simd::<u8, CHUNK>::splat(b);
        let sc = Simd::<u8, CHUNK>::splat(c);
        while pos + CHUNK <= haystack.len() {
            let chunk = Simd::<u8, CHUNK>::from_slice(&haystack[pos..pos + CHUNK]);
            let hits = chunk.simd_eq(sa) | chunk.simd_eq(sb) | chunk.simd_eq(sc);
            let mask = hits.to_bitmask();
            if mask != 0 {
                return Some(pos + mask.trailing_zeros() as usize);
            }
            pos += CHUNK;
        }
    }

    haystack[pos..]
        .iter()
        .position(|&x| x == a || x == b || x == c)
        .map(|i| pos + i)
}

/// Find the first occurrence of any byte in `targets` (at most ten in
/// practice: separator first bytes plus `\n` and `\r`).
pub fn find_any_in_set(haystack: &[u8], targets: &[u8]) -> Option<usize> {
    let mut pos = 0;

    #[cfg(target_feature = "avx2")]
    {
        let splats: Vec<Simd<u8, WIDE>> =
            targets.iter().map(|&t| Simd::<u8, WIDE>::splat(t)).collect();
        while pos + WIDE <= haystack.len() {
            let chunk = Simd::<u8, WIDE>::from_slice(&haystack[pos..pos + WIDE]);
            let mut mask = 0u64;
            for splat in &splats {
                mask |= chunk.simd_eq(*splat).to_bitmask();
            }
            if mask != 0 {
                return Some(pos + mask.trailing_zeros() as usize);
            }
            pos += WIDE;
        }
    }

    {
        let splats: Vec<Simd<u8, CHUNK>> =
            targets.iter().map(|&t| Simd::<u8, CHUNK>::splat(t)).collect();
        while pos + CHUNK <= haystack.len() {
            let chunk = Simd::<u8, CHUNK>::from_slice(&haystack[pos..pos + CHUNK]);
            let mut mask = 0u64;
            for splat in &splats {
                mask |= chunk.simd_eq(*splat).to_bitmask();
            }
            if mask != 0 {
                return Some(pos + mask.trailing_zeros() as usize);
            }
            pos += CHUNK;
        }
    }

    haystack[pos..]
        .iter()
        .position(|b| targets.contains(b))
        .map(|i| pos + i)
}

/// Count occurrences of `needle` via per-chunk mask popcounts.
pub fn count_byte(haystack: &[u8], needle: u8) -> usize {
    let mut pos = 0;
    let mut count = 0usize;

    #[cfg(target_feature = "avx2")]
    {
        let splat = Simd::<u8, WIDE>::splat(needle);
        while pos + WIDE <= haystack.len() {
            let chunk = Simd::<u8, WIDE>::from_slice(&haystack[pos..pos + WIDE]);
            count += chunk.simd_eq(splat).to_bitmask().count_ones() as usize;
            pos += WIDE;
        }
    }

    {
        let splat = Simd::<u8, CHUNK>::splat(needle);
        while pos + CHUNK <= haystack.len() {
            let chunk = Simd::<u8, CHUNK>::from_slice(&haystack[pos..pos + CHUNK]);
            count += chunk.simd_eq(splat).to_bitmask().count_ones() as usize;
            pos += CHUNK;
        }
    }

    count + haystack[pos..].iter().filter(|&&b| b == needle).count()
}

// ---------------------------------------------------------------------------
// Multi-byte pattern search
// ---------------------------------------------------------------------------

/// Find the first occurrence of a multi-byte `pattern`.
///
/// `find_byte` on the first pattern byte filters candidates; each candidate
/// gets a full equality check of the remaining bytes. On mismatch the search
/// resumes one byte past the candidate.
pub fn find_pattern(haystack: &[u8], pattern: &[u8]) -> Option<usize> {
    let (&first, rest) = pattern.split_first()?;
    if rest.is_empty() {
        return find_byte(haystack, first);
    }

    let mut pos = 0;
    while pos + pattern.len() <= haystack.len() {
        let candidate = pos + find_byte(&haystack[pos..], first)?;
        if candidate + pattern.len() > haystack.len() {
            return None;
        }
        if haystack[candidate + 1..candidate + pattern.len()] == *rest {
            return Some(candidate);
        }
        pos = candidate + 1;
    }
    None
}

/// Find the next occurrence of the configured escape pattern at or after
/// `from`. Returns an absolute position.
#[inline]
pub fn find_escape(input: &[u8], from: usize, config: &Config) -> Option<usize> {
    if from >= input.len() {
        return None;
    }
    let tail = &input[from..];
    let hit = if config.is_single_byte_escape() {
        find_byte(tail, config.escape_byte())
    } else {
        find_pattern(tail, config.escape())
    };
    hit.map(|i| from + i)
}

// ---------------------------------------------------------------------------
// Delimiter search
// ---------------------------------------------------------------------------

/// What `find_next_delimiter` found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelimiterKind {
    Separator,
    Newline,
}

/// The next field or row boundary in a haystack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiter {
    /// Byte offset of the boundary, relative to the haystack.
    pub pos: usize,
    /// Bytes the boundary spans (separator pattern length, or 1 for `\n` and
    /// bare `\r`, or 2 for `\r\n`).
    pub len: usize,
    pub kind: DelimiterKind,
}

#[inline]
fn newline_at(haystack: &[u8], at: usize) -> Delimiter {
    let len = if haystack[at] == b'\r' && haystack.get(at + 1) == Some(&b'\n') {
        2
    } else {
        1
    };
    Delimiter {
        pos: at,
        len,
        kind: DelimiterKind::Newline,
    }
}

/// Find the next separator match or newline.
///
/// The single-byte-separator configuration reduces to a three-target scan.
/// The general path scans for any separator first byte or newline byte,
/// verifies the full separator at each candidate, and steps past candidates
/// that fail verification. Separator matches take priority over newline
/// classification at the same position.
pub fn find_next_delimiter(haystack: &[u8], config: &Config) -> Option<Delimiter> {
    if config.is_single_byte_sep() {
        let sep = config.separator_byte();
        let at = find_any_of_three(haystack, sep, b'\n', b'\r')?;
        if haystack[at] == sep {
            return Some(Delimiter {
                pos: at,
                len: 1,
                kind: DelimiterKind::Separator,
            });
        }
        return Some(newline_at(haystack, at));
    }

    let first_bytes = config.separator_first_bytes();
    let mut probe = [0u8; crate::config::MAX_SEPARATORS + 2];
    probe[..first_bytes.len()].copy_from_slice(first_bytes);
    probe[first_bytes.len()] = b'\n';
    probe[first_bytes.len() + 1] = b'\r';
    let probe = &probe[..first_bytes.len() + 2];

    let mut pos = 0;
    loop {
        let at = pos + find_any_in_set(&haystack[pos..], probe)?;
        if let Some(len) = config.match_separator_at(haystack, at) {
            return Some(Delimiter {
                pos: at,
                len,
                kind: DelimiterKind::Separator,
            });
        }
        if haystack[at] == b'\n' || haystack[at] == b'\r' {
            return Some(newline_at(haystack, at));
        }
        // A separator first byte without a full match; keep scanning.
        pos = at + 1;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
