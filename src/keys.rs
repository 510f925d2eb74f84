//! # Key Extraction Strategies
//!
//! A key strategy turns one dictionary entry into zero or more searchable key
//! substrings. The parser drives a strategy by calling it repeatedly for the
//! same entry with the same continuation word (reset to 0 per entry) until it
//! returns `None`, so a strategy may emit any number of keys by threading
//! whatever state it likes through the continuation.
//!
//! Built-ins cover the two EDICT fields:
//!
//! - [`KeyStrategy::Headword`]: the text before the first space
//! - [`KeyStrategy::Reading`]: the text between the first `[` and `]`
//!
//! Both emit at most one key and use the continuation purely as an
//! "already emitted" guard. [`KeyStrategy::Custom`] accepts any caller
//! function with the same shape.

/// A key extractor: called with the entry bytes and a continuation word,
/// returns the next key or `None` when the entry is exhausted.
pub type KeyFn = for<'e> fn(&'e [u8], &mut u32) -> Option<&'e [u8]>;

/// Selects which key extractor an index is built (and verified) with.
///
/// An index file does not record its strategy; build, verify, and lookup
/// callers coordinate on it out of band.
#[derive(Debug, Clone, Copy)]
pub enum KeyStrategy {
    /// Exact headword: substring before the first space.
    Headword,
    /// Exact reading: substring between the first `[` and the following `]`.
    Reading,
    /// Caller-supplied extractor.
    Custom(KeyFn),
}

impl KeyStrategy {
    /// The extractor function for this strategy.
    pub fn key_fn(self) -> KeyFn {
        match self {
            KeyStrategy::Headword => headword_key,
            KeyStrategy::Reading => reading_key,
            KeyStrategy::Custom(f) => f,
        }
    }

    /// Parses a strategy name as used by the CLI harness.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "headword" => Some(KeyStrategy::Headword),
            "reading" => Some(KeyStrategy::Reading),
            _ => None,
        }
    }
}

/// Emits the substring before the first space, once per entry.
pub fn headword_key<'e>(entry: &'e [u8], continuation: &mut u32) -> Option<&'e [u8]> {
    if *continuation != 0 {
        return None;
    }
    *continuation = 1;

    let end = entry
        .iter()
        .position(|&b| b == b' ')
        .unwrap_or(entry.len());

    if end == 0 {
        None
    } else {
        Some(&entry[..end])
    }
}

/// Emits the substring between the first `[` and the following `]`, once per
/// entry. Entries without a reading field yield no key.
pub fn reading_key<'e>(entry: &'e [u8], continuation: &mut u32) -> Option<&'e [u8]> {
    if *continuation != 0 {
        return None;
    }
    *continuation = 1;

    let open = entry.iter().position(|&b| b == b'[')? + 1;
    let len = entry[open..].iter().position(|&b| b == b']')?;

    if len == 0 {
        None
    } else {
        Some(&entry[open..open + len])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(f: KeyFn, entry: &[u8]) -> Vec<Vec<u8>> {
        let mut continuation = 0u32;
        let mut keys = Vec::new();
        while let Some(key) = f(entry, &mut continuation) {
            keys.push(key.to_vec());
        }
        keys
    }

    #[test]
    fn headword_stops_at_first_space() {
        let keys = drain(headword_key, "犬 [いぬ] /dog/".as_bytes());

        assert_eq!(keys, vec!["犬".as_bytes().to_vec()]);
    }

    #[test]
    fn headword_without_space_takes_whole_entry() {
        let keys = drain(headword_key, b"standalone");

        assert_eq!(keys, vec![b"standalone".to_vec()]);
    }

    #[test]
    fn headword_of_leading_space_entry_is_absent() {
        assert!(drain(headword_key, b" no headword").is_empty());
        assert!(drain(headword_key, b"").is_empty());
    }

    #[test]
    fn reading_takes_bracketed_field() {
        let keys = drain(reading_key, "犬 [いぬ] /dog/".as_bytes());

        assert_eq!(keys, vec!["いぬ".as_bytes().to_vec()]);
    }

    #[test]
    fn reading_absent_without_brackets() {
        assert!(drain(reading_key, b"no reading here /gloss/").is_empty());
        assert!(drain(reading_key, b"unclosed [bracket").is_empty());
        assert!(drain(reading_key, b"empty [] field").is_empty());
    }

    #[test]
    fn custom_strategy_may_emit_many_keys() {
        // Splits on '/' using the continuation as a byte cursor.
        fn slashes<'e>(entry: &'e [u8], continuation: &mut u32) -> Option<&'e [u8]> {
            let mut start = *continuation as usize;
            while start < entry.len() {
                let len = entry[start..]
                    .iter()
                    .position(|&b| b == b'/')
                    .unwrap_or(entry.len() - start);
                *continuation = (start + len + 1) as u32;
                if len > 0 {
                    return Some(&entry[start..start + len]);
                }
                start += 1;
            }
            None
        }

        let keys = drain(slashes, b"dog/hound//canine");

        assert_eq!(
            keys,
            vec![b"dog".to_vec(), b"hound".to_vec(), b"canine".to_vec()]
        );
    }

    #[test]
    fn strategy_name_round_trip() {
        assert!(matches!(
            KeyStrategy::from_name("headword"),
            Some(KeyStrategy::Headword)
        ));
        assert!(matches!(
            KeyStrategy::from_name("reading"),
            Some(KeyStrategy::Reading)
        ));
        assert!(KeyStrategy::from_name("gloss").is_none());
    }
}
