//! Multi-pattern literal matcher (component C8).

use crate::rtf::registry::ReplacementRegistry;

/// Outcome of scanning the rendered-text buffer against the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// No registered key can possibly start here.
    NoMatch,
    /// At least one key matches the available text so far, but more bytes could extend or
    /// break the match (the key is longer than what's buffered). Carries the offset at which
    /// the prefix agreement starts, so the caller can discard everything before it.
    Partial { offset: usize },
    /// `registry.key(key_index)` matches `txt[offset..offset + key.len()]` exactly.
    Match { key_index: usize, offset: usize },
}

/// Scan `txt` for the earliest, then first-registered, occurrence of any registry key.
///
/// Mirrors the source's nested loop: for each starting `offset` from left to right, walk every
/// registered key (`curkey`) and compare byte by byte, returning as soon as either a full match
/// or a prefix-exhaustion (the buffer ran out before the key did) is found at that offset. This
/// early return matters: it is what makes the offset reported by `Partial` the leftmost one, so
/// the caller discards exactly the text that can no longer participate in any match and nothing
/// more.
pub fn pattern_match(txt: &[u8], registry: &ReplacementRegistry) -> MatchOutcome {
    for offset in 0..txt.len() {
        let remaining = &txt[offset..];
        for key_index in 0..registry.len() {
            let key = registry.key(key_index);
            if key.is_empty() {
                continue;
            }
            if remaining.len() >= key.len() {
                if &remaining[..key.len()] == key {
                    return MatchOutcome::Match { key_index, offset };
                }
            } else if remaining == &key[..remaining.len()] {
                return MatchOutcome::Partial { offset };
            }
        }
    }

    MatchOutcome::NoMatch
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(pairs: &[(&str, &str)]) -> ReplacementRegistry {
        let mut reg = ReplacementRegistry::new();
        reg.add_replacements(pairs.iter().map(|&(k, v)| (k, v)));
        reg
    }

    #[test]
    fn no_match_on_unrelated_text() {
        let reg = registry(&[("ABC", "xyz")]);
        assert_eq!(pattern_match(b"hello world", &reg), MatchOutcome::NoMatch);
    }

    #[test]
    fn exact_match_reports_offset() {
        let reg = registry(&[("BOOBEAR", "x")]);
        assert_eq!(
            pattern_match(b"hi BOOBEAR there", &reg),
            MatchOutcome::Match { key_index: 0, offset: 3 }
        );
    }

    #[test]
    fn leftmost_offset_wins() {
        let reg = registry(&[("AB", "1")]);
        assert_eq!(
            pattern_match(b"xAByAB", &reg),
            MatchOutcome::Match { key_index: 0, offset: 1 }
        );
    }

    #[test]
    fn first_registered_key_wins_tie_at_same_offset() {
        // Both "AT" and "ATTORNEY" start at offset 0 in "ATTORNEY"; "AT" is a full match first
        // only if registered earlier and shorter-equal — exercise tie-break via two keys that
        // both fully match at the same offset.
        let reg = registry(&[("AT", "one"), ("ATTORNEY", "two")]);
        assert_eq!(
            pattern_match(b"ATTORNEY", &reg),
            MatchOutcome::Match { key_index: 0, offset: 0 },
            "first-registered key wins when both match at the same offset"
        );
    }

    #[test]
    fn trailing_prefix_is_partial() {
        let reg = registry(&[("ATTORNEY", "x")]);
        assert_eq!(pattern_match(b"the ATTOR", &reg), MatchOutcome::Partial { offset: 4 });
    }

    #[test]
    fn partial_offset_is_leftmost_viable_start() {
        // "A" at offset 4 is itself a one-byte prefix of "ATTORNEY", and offset 5's "TTOR" is
        // not a prefix of anything; the reported offset must be 4, not some later start.
        let reg = registry(&[("ATTORNEY", "x")]);
        assert_eq!(pattern_match(b"xxxxATTOR", &reg), MatchOutcome::Partial { offset: 4 });
    }

    #[test]
    fn partial_does_not_suppress_earlier_full_match() {
        let reg = registry(&[("HI", "x"), ("ATTORNEY", "y")]);
        assert_eq!(
            pattern_match(b"HI ATTOR", &reg),
            MatchOutcome::Match { key_index: 0, offset: 0 }
        );
    }

    #[test]
    fn empty_registry_never_matches() {
        let reg = ReplacementRegistry::new();
        assert_eq!(pattern_match(b"anything", &reg), MatchOutcome::NoMatch);
    }
}
