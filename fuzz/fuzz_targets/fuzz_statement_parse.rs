#![no_main]
use libfuzzer_sys::fuzz_target;
use rbac_guard::iam::{ActionPattern, Policy, PrincipalRef, ResourceFilter};

// Malformed statement strings must fail cleanly; accepted ones must survive
// a display/parse cycle unchanged
fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(action) = s.parse::<ActionPattern>() {
        assert_eq!(action.to_string().parse::<ActionPattern>().ok(), Some(action));
    }

    if let Ok(principal) = s.parse::<PrincipalRef>() {
        assert_eq!(principal.to_string().parse::<PrincipalRef>().ok(), Some(principal));
    }

    if let Ok(filter) = s.parse::<ResourceFilter>() {
        assert_eq!(filter.to_string().parse::<ResourceFilter>().ok(), Some(filter));
    }

    let _ = Policy::from_json(s);
});
