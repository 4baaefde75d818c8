//! Pattern matching for operation ids and principal identifiers
//!
//! Patterns are split into segments on `.` and `:`. Supports wildcards:
//! - `*` as a whole inner segment - matches exactly one segment (e.g., `vm.*.disk`)
//! - `prefix*` as an inner segment - matches one segment starting with `prefix`
//! - a trailing `*`, `**` or `prefix*` - matches any non-empty remainder,
//!   including further segments (e.g., `vm.create.*`, `11111111-*`); so
//!   `vm.create*` also matches `vm.create.disk`
//!
//! Empty segments never satisfy a wildcard, trailing or inner.
//!
//! Matching is case-sensitive and anchored: the whole candidate must be consumed.
//! Evaluation is a single left-to-right pass with no backtracking.

/// Pattern matcher for operation ids and identifiers
pub struct PatternMatcher;

/// One segment of a pattern or candidate
#[derive(Debug, Clone, Copy)]
struct Segment<'a> {
    /// Separator preceding this segment (`None` for the first one)
    sep: Option<char>,
    /// Segment text without its separator
    text: &'a str,
    /// Byte offset of `text` in the source string
    start: usize,
}

impl PatternMatcher {
    /// Check if a candidate matches a pattern
    ///
    /// # Examples
    /// ```
    /// use rbac_guard::iam::PatternMatcher;
    ///
    /// assert!(PatternMatcher::matches("vm.create.*", "vm.create.disk"));
    /// assert!(!PatternMatcher::matches("vm.create.*", "vm.create"));
    /// assert!(!PatternMatcher::matches("vm.create.*", "vm.createX"));
    /// assert!(PatternMatcher::matches("11111111-*", "11111111-2222-3333"));
    /// ```
    pub fn matches(pattern: &str, candidate: &str) -> bool {
        // Exact match
        if pattern == candidate {
            return !pattern.is_empty();
        }

        // Check for wildcards
        if !pattern.contains('*') {
            return false;
        }

        let pattern_parts = Self::segments(pattern);
        let candidate_parts = Self::segments(candidate);

        Self::match_segments(&pattern_parts, &candidate_parts, candidate)
    }

    /// Split a string into segments, remembering each preceding separator
    fn segments(s: &str) -> Vec<Segment<'_>> {
        let mut parts = Vec::new();
        let mut sep = None;
        let mut start = 0;

        for (idx, ch) in s.char_indices() {
            if ch == '.' || ch == ':' {
                parts.push(Segment {
                    sep,
                    text: &s[start..idx],
                    start,
                });
                sep = Some(ch);
                start = idx + ch.len_utf8();
            }
        }
        parts.push(Segment {
            sep,
            text: &s[start..],
            start,
        });

        parts
    }

    /// Match segment lists left to right
    fn match_segments(pattern: &[Segment<'_>], candidate: &[Segment<'_>], source: &str) -> bool {
        for (idx, pat) in pattern.iter().enumerate() {
            // Candidate exhausted but pattern remains - no match
            let Some(cand) = candidate.get(idx) else {
                return false;
            };

            if pat.sep != cand.sep {
                return false;
            }

            let is_last = idx + 1 == pattern.len();

            match pat.text.strip_suffix('*') {
                // Trailing wildcard consumes the rest of the candidate
                Some(prefix) if is_last => {
                    let prefix = prefix.trim_end_matches('*');
                    let rest = &source[cand.start..];
                    return rest.len() > prefix.len()
                        && rest.starts_with(prefix)
                        && candidate[idx..].iter().all(|c| !c.text.is_empty());
                }
                // Inner wildcard stands for exactly one segment
                Some(prefix) => {
                    if cand.text.len() <= prefix.len() || !cand.text.starts_with(prefix) {
                        return false;
                    }
                }
                // Literal match
                None => {
                    if pat.text != cand.text {
                        return false;
                    }
                }
            }
        }

        // Pattern exhausted - candidate must be too
        pattern.len() == candidate.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(PatternMatcher::matches("vm.start", "vm.start"));
        assert!(!PatternMatcher::matches("vm.start", "vm.stop"));
        assert!(!PatternMatcher::matches("vm.start", "vm.start.now"));
        assert!(!PatternMatcher::matches("", ""));
    }

    #[test]
    fn test_case_sensitive() {
        assert!(!PatternMatcher::matches("vm.start", "VM.start"));
        assert!(!PatternMatcher::matches("vm.*", "VM.start"));
    }

    #[test]
    fn test_trailing_wildcard() {
        assert!(PatternMatcher::matches("vm.*", "vm.start"));
        assert!(PatternMatcher::matches("vm.*", "vm.create.disk"));
        assert!(PatternMatcher::matches("vm.create.*", "vm.create.disk"));
        assert!(!PatternMatcher::matches("vm.create.*", "vm.create"));
        assert!(!PatternMatcher::matches("vm.create.*", "vm.createX"));
        assert!(!PatternMatcher::matches("vm.*", "vm."));
        assert!(!PatternMatcher::matches("vm.*", "volume.attach"));
    }

    #[test]
    fn test_trailing_wildcard_rejects_empty_segments() {
        assert!(!PatternMatcher::matches("vm.*", "vm..x"));
        assert!(!PatternMatcher::matches("vm.*", "vm.x."));
        assert!(!PatternMatcher::matches("vm.a*", "vm.a."));
        assert!(!PatternMatcher::matches("vm.**", "vm.a..b"));
        assert!(!PatternMatcher::matches("*", "vm..start"));
    }

    #[test]
    fn test_trailing_prefix_spans_segments() {
        assert!(PatternMatcher::matches("vm.create*", "vm.createDisk"));
        assert!(PatternMatcher::matches("vm.create*", "vm.create.disk"));
        assert!(PatternMatcher::matches("vm.create*", "vm.create:disk"));
        assert!(!PatternMatcher::matches("vm.create*", "vm.create"));
        assert!(!PatternMatcher::matches("vm.create*", "vm.creat.disk"));
    }

    #[test]
    fn test_recursive_wildcard() {
        assert!(PatternMatcher::matches(
            "compute.**",
            "compute.header.vm.APIStartVmInstanceMsg"
        ));
        assert!(!PatternMatcher::matches("compute.**", "compute"));
    }

    #[test]
    fn test_inner_wildcard() {
        assert!(PatternMatcher::matches("vm.*.disk", "vm.create.disk"));
        assert!(PatternMatcher::matches("vm.*.disk", "vm.resize.disk"));
        assert!(!PatternMatcher::matches("vm.*.disk", "vm.create.nic"));
        assert!(!PatternMatcher::matches("vm.*.disk", "vm.create.more.disk"));
        assert!(!PatternMatcher::matches("vm.*.disk", "vm..disk"));
    }

    #[test]
    fn test_prefix_wildcard() {
        assert!(PatternMatcher::matches("11111111-*", "11111111-aaaa-bbbb"));
        assert!(!PatternMatcher::matches("11111111-*", "11111111-"));
        assert!(!PatternMatcher::matches("11111111-*", "22222222-aaaa"));
        assert!(PatternMatcher::matches("vm.APIStart*", "vm.APIStartVmInstanceMsg"));
        assert!(PatternMatcher::matches("vm.API*.start", "vm.APIVm.start"));
        assert!(!PatternMatcher::matches("vm.API*.start", "vm.API.start"));
    }

    #[test]
    fn test_separators_must_agree() {
        assert!(PatternMatcher::matches("zone:*", "zone:a"));
        assert!(!PatternMatcher::matches("zone:*", "zone.a"));
        assert!(!PatternMatcher::matches("zone.*.x", "zone:a.x"));
    }

    #[test]
    fn test_lone_wildcard() {
        assert!(PatternMatcher::matches("*", "vm.start"));
        assert!(PatternMatcher::matches("*", "acct-1"));
        assert!(!PatternMatcher::matches("*", ""));
    }
}
