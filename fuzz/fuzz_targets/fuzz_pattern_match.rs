#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rbac_guard::iam::PatternMatcher;

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    pattern: &'a str,
    candidate: &'a str,
}

fuzz_target!(|input: Input<'_>| {
    let matched = PatternMatcher::matches(input.pattern, input.candidate);

    // Empty patterns never match
    if input.pattern.is_empty() {
        assert!(!matched);
    }

    // A pattern without wildcards matches only itself
    if !input.pattern.contains('*') {
        assert_eq!(matched, !input.pattern.is_empty() && input.pattern == input.candidate);
    }
});
