//! Property-based tests for matcher anchoring and deny precedence
//!
//! Uses proptest to check the decision invariants over random operation ids

use proptest::prelude::*;
use rbac_guard::iam::{AuthorizationEngine, PatternMatcher, Policy, Statement};
use rbac_guard::request::{AuthorizationRequest, RequestSchema, Session};
use rbac_guard::{InMemoryPolicyStore, RbacError};

fn segment() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9]{0,7}"
}

fn operation_id() -> impl Strategy<Value = String> {
    prop::collection::vec(segment(), 1..5).prop_map(|parts| parts.join("."))
}

fn engine_for(policies: Vec<Policy>) -> AuthorizationEngine<InMemoryPolicyStore> {
    let store = InMemoryPolicyStore::new();
    for policy in policies {
        let uuid = policy.uuid.clone();
        store.insert_policy(policy);
        store.attach_global(&uuid);
    }
    AuthorizationEngine::new(store)
}

fn request(operation_id: &str, session: Session) -> AuthorizationRequest {
    AuthorizationRequest::new(RequestSchema::new(operation_id).build(), session)
}

proptest! {
    #[test]
    fn prop_literal_pattern_matches_only_itself(a in operation_id(), b in operation_id()) {
        prop_assert!(PatternMatcher::matches(&a, &a));
        prop_assert_eq!(PatternMatcher::matches(&a, &b), a == b);
    }

    #[test]
    fn prop_trailing_wildcard_is_anchored(prefix in operation_id(), rest in operation_id()) {
        let pattern = format!("{}.*", prefix);

        // Anything below the prefix matches
        let below = format!("{}.{}", prefix, rest);
        prop_assert!(PatternMatcher::matches(&pattern, &below));

        // The prefix itself does not
        prop_assert!(!PatternMatcher::matches(&pattern, &prefix));

        // Extending the last prefix segment does not
        let extended = format!("{}X.{}", prefix, rest);
        prop_assert!(!PatternMatcher::matches(&pattern, &extended));

        // Something in front of the prefix does not
        let shifted = format!("x{}.{}", prefix, rest);
        prop_assert!(!PatternMatcher::matches(&pattern, &shifted));
    }

    #[test]
    fn prop_inner_wildcard_spans_one_segment(
        head in segment(),
        middle in prop::collection::vec(segment(), 1..4),
        tail in segment(),
    ) {
        let pattern = format!("{}.*.{}", head, tail);
        let candidate = format!("{}.{}.{}", head, middle.join("."), tail);
        prop_assert_eq!(PatternMatcher::matches(&pattern, &candidate), middle.len() == 1);
    }

    #[test]
    fn prop_deny_overrides_any_allow(op in operation_id(), account in segment()) {
        let engine = engine_for(vec![
            Policy::new("everything").statement(Statement::allow(&["**"]).unwrap()),
            Policy::new("this-one").statement(Statement::deny(&[op.as_str()]).unwrap()),
        ]);

        let result = engine.check(&request(&op, Session::account(&account)));
        let is_operation_denied = matches!(result, Err(RbacError::OperationDenied { .. }));
        prop_assert!(is_operation_denied);
    }

    #[test]
    fn prop_no_applicable_statement_is_default_deny(
        op in operation_id(),
        unrelated in operation_id(),
    ) {
        prop_assume!(op != unrelated);
        let engine = engine_for(vec![
            Policy::new("unrelated").statement(Statement::allow(&[unrelated.as_str()]).unwrap()),
        ]);

        let result = engine.check(&request(&op, Session::account("acct-1")));
        let is_default_denied = matches!(result, Err(RbacError::DefaultDenied { .. }));
        prop_assert!(is_default_denied);
    }

    #[test]
    fn prop_split_coverage_allows(a in operation_id(), b in operation_id()) {
        let engine = engine_for(vec![
            Policy::new("a").statement(Statement::allow(&[a.as_str()]).unwrap()),
            Policy::new("b").statement(Statement::allow(&[b.as_str()]).unwrap()),
        ]);

        let req = request(&a, Session::account("acct-1")).also_check(&b);
        prop_assert!(engine.check(&req).is_ok());
    }
}
