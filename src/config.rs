// Separator and escape configuration.
//
// Validated once at construction, immutable afterwards. Separators are an
// ordered list of patterns; matching tries them in caller order so that the
// caller controls the tie-break when patterns share a prefix (e.g. "," before
// ",,"). The escape is a single pattern that both quotes a field and, when
// doubled inside a quoted field, encodes a literal copy of itself.

use crate::error::ConfigError;

/// Maximum number of separator patterns.
pub const MAX_SEPARATORS: usize = 8;

/// Maximum length in bytes of a separator or escape pattern.
pub const MAX_PATTERN_LEN: usize = 16;

/// Parsed parser configuration.
#[derive(Debug, Clone)]
pub struct Config {
    separators: Vec<Vec<u8>>,
    escape: Vec<u8>,
    /// Deduplicated first bytes of all separators, in first-seen order.
    /// Prefilter targets for the general delimiter scan.
    first_bytes: Vec<u8>,
}

impl Config {
    /// Validate and build a configuration.
    pub fn new(separators: Vec<Vec<u8>>, escape: Vec<u8>) -> Result<Config, ConfigError> {
        if separators.is_empty() {
            return Err(ConfigError::NoSeparators);
        }
        if separators.len() > MAX_SEPARATORS {
            return Err(ConfigError::TooManySeparators(separators.len()));
        }
        for sep in &separators {
            if sep.is_empty() {
                return Err(ConfigError::EmptySeparator);
            }
            if sep.len() > MAX_PATTERN_LEN {
                return Err(ConfigError::SeparatorTooLong(sep.len()));
            }
        }
        if escape.is_empty() {
            return Err(ConfigError::EmptyEscape);
        }
        if escape.len() > MAX_PATTERN_LEN {
            return Err(ConfigError::EscapeTooLong(escape.len()));
        }

        let mut first_bytes = Vec::with_capacity(separators.len());
        for sep in &separators {
            if !first_bytes.contains(&sep[0]) {
                first_bytes.push(sep[0]);
            }
        }

        Ok(Config {
            separators,
            escape,
            first_bytes,
        })
    }

    /// Decode the length-prefixed separator wire format:
    /// `<count:u8><len1:u8><sep1><len2:u8><sep2>…`
    ///
    /// Returns `None` when any bound is violated or the bytes are truncated.
    pub fn decode_separators(encoded: &[u8]) -> Option<Vec<Vec<u8>>> {
        let (&count, mut rest) = encoded.split_first()?;
        let count = count as usize;
        if count == 0 || count > MAX_SEPARATORS {
            return None;
        }
        let mut separators = Vec::with_capacity(count);
        for _ in 0..count {
            let (&len, tail) = rest.split_first()?;
            let len = len as usize;
            if len == 0 || len > MAX_PATTERN_LEN || tail.len() < len {
                return None;
            }
            separators.push(tail[..len].to_vec());
            rest = &tail[len..];
        }
        if !rest.is_empty() {
            return None;
        }
        Some(separators)
    }

    /// Build from the wire separator encoding and a raw escape sequence.
    ///
    /// An undecodable separator encoding falls back to a single comma; the
    /// escape is still validated.
    pub fn from_encoded(encoded: &[u8], escape: &[u8]) -> Result<Config, ConfigError> {
        let separators =
            Config::decode_separators(encoded).unwrap_or_else(|| vec![b",".to_vec()]);
        Config::new(separators, escape.to_vec())
    }

    /// Try each separator in caller order at `pos`; first full match wins.
    #[inline]
    pub fn match_separator_at(&self, input: &[u8], pos: usize) -> Option<usize> {
        let tail = input.get(pos..)?;
        for sep in &self.separators {
            if tail.starts_with(sep) {
                return Some(sep.len());
            }
        }
        None
    }

    /// Full-equality check of the escape pattern at `pos`.
    #[inline]
    pub fn match_escape_at(&self, input: &[u8], pos: usize) -> Option<usize> {
        let tail = input.get(pos..)?;
        if tail.starts_with(&self.escape) {
            Some(self.escape.len())
        } else {
            None
        }
    }

    /// Exactly one separator, one byte long: the fast scanning path.
    #[inline]
    pub fn is_single_byte_sep(&self) -> bool {
        self.separators.len() == 1 && self.separators[0].len() == 1
    }

    #[inline]
    pub fn is_single_byte_escape(&self) -> bool {
        self.escape.len() == 1
    }

    /// First byte of the first separator (the fast-path separator).
    #[inline]
    pub fn separator_byte(&self) -> u8 {
        self.separators[0][0]
    }

    #[inline]
    pub fn escape_byte(&self) -> u8 {
        self.escape[0]
    }

    #[inline]
    pub fn separator_first_bytes(&self) -> &[u8] {
        &self.first_bytes
    }

    #[inline]
    pub fn separators(&self) -> &[Vec<u8>] {
        &self.separators
    }

    #[inline]
    pub fn escape(&self) -> &[u8] {
        &self.escape
    }
}

impl Default for Config {
    /// Comma separator, double-quote escape.
    fn default() -> Config {
        Config {
            separators: vec![vec![b',']],
            escape: vec![b'"'],
            first_bytes: vec![b','],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(seps: &[&[u8]], esc: &[u8]) -> Config {
        Config::new(seps.iter().map(|s| s.to_vec()).collect(), esc.to_vec()).unwrap()
    }

    #[test]
    fn test_default_is_comma_quote() {
        let c = Config::default();
        assert!(c.is_single_byte_sep());
        assert!(c.is_single_byte_escape());
        assert_eq!(c.separator_byte(), b',');
        assert_eq!(c.escape_byte(), b'"');
    }

    #[test]
    fn test_validation_limits() {
        assert!(matches!(
            Config::new(vec![], b"\"".to_vec()),
            Err(ConfigError::NoSeparators)
        ));
        let nine: Vec<Vec<u8>> = (0u8..9).map(|i| vec![i + b'0']).collect();
        assert!(matches!(
            Config::new(nine, b"\"".to_vec()),
            Err(ConfigError::TooManySeparators(9))
        ));
        assert!(matches!(
            Config::new(vec![vec![]], b"\"".to_vec()),
            Err(ConfigError::EmptySeparator)
        ));
        assert!(matches!(
            Config::new(vec![vec![b'x'; 17]], b"\"".to_vec()),
            Err(ConfigError::SeparatorTooLong(17))
        ));
        assert!(matches!(
            Config::new(vec![vec![b',']], vec![]),
            Err(ConfigError::EmptyEscape)
        ));
        assert!(matches!(
            Config::new(vec![vec![b',']], vec![b'$'; 17]),
            Err(ConfigError::EscapeTooLong(17))
        ));
    }

    #[test]
    fn test_wire_decoding() {
        // one comma
        assert_eq!(
            Config::decode_separators(&[1, 1, b',']),
            Some(vec![vec![b',']])
        );
        // comma and "::"
        assert_eq!(
            Config::decode_separators(&[2, 1, b',', 2, b':', b':']),
            Some(vec![vec![b','], vec![b':', b':']])
        );
        // truncated bytes
        assert_eq!(Config::decode_separators(&[1, 2, b',']), None);
        // zero count
        assert_eq!(Config::decode_separators(&[0]), None);
        // zero-length pattern
        assert_eq!(Config::decode_separators(&[1, 0]), None);
        // trailing garbage
        assert_eq!(Config::decode_separators(&[1, 1, b',', 9]), None);
        // over-long pattern
        let mut enc = vec![1u8, 17];
        enc.extend_from_slice(&[b'x'; 17]);
        assert_eq!(Config::decode_separators(&enc), None);
    }

    #[test]
    fn test_from_encoded_falls_back_to_comma() {
        let c = Config::from_encoded(&[0], b"\"").unwrap();
        assert_eq!(c.separators(), &[vec![b',']]);
        // but the escape is still validated
        assert!(Config::from_encoded(&[0], b"").is_err());
    }

    #[test]
    fn test_match_separator_first_wins() {
        // "," listed before ",," → the shorter pattern wins at a ",," site
        let c = cfg(&[b",", b",,"], b"\"");
        assert_eq!(c.match_separator_at(b"a,,b", 1), Some(1));

        // reversed order → the longer pattern wins
        let c = cfg(&[b",,", b","], b"\"");
        assert_eq!(c.match_separator_at(b"a,,b", 1), Some(2));
        assert_eq!(c.match_separator_at(b"a,b", 1), Some(1));
    }

    #[test]
    fn test_match_separator_bounds() {
        let c = cfg(&[b"::"], b"\"");
        assert_eq!(c.match_separator_at(b"a::b", 1), Some(2));
        assert_eq!(c.match_separator_at(b"a::b", 3), None);
        // position past the end is not a match, not a panic
        assert_eq!(c.match_separator_at(b"a:", 1), None);
        assert_eq!(c.match_separator_at(b"a:", 9), None);
    }

    #[test]
    fn test_match_escape_multi_byte() {
        let c = cfg(&[b","], b"$$");
        assert_eq!(c.match_escape_at(b"$$x$$", 0), Some(2));
        assert_eq!(c.match_escape_at(b"$$x$$", 1), None);
        assert_eq!(c.match_escape_at(b"$$x$$", 3), Some(2));
        assert_eq!(c.match_escape_at(b"$$x$", 3), None);
    }

    #[test]
    fn test_first_bytes_deduped() {
        let c = cfg(&[b",", b",,", b"|", b"||"], b"\"");
        assert_eq!(c.separator_first_bytes(), &[b',', b'|']);
        assert!(!c.is_single_byte_sep());
    }
}
