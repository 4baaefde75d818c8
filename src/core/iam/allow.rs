//! Allow statement evaluation
//!
//! Two independent checks, both of which must pass:
//! - action coverage: every operation id the request needs is matched by some
//!   principal-matched allow statement (different statements may cover
//!   different ids)
//! - resource filters: see [`AllowEvaluator::resources_allowed`]

use super::resource::{self, LazyResourceRefs};
use super::{Policy, PrincipalMatcher, Statement};
use crate::error::Result;
use crate::request::AuthorizationRequest;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, trace};

/// Evaluates allow statements
pub struct AllowEvaluator;

impl AllowEvaluator {
    /// True if both the action and resource checks pass
    pub fn evaluate(
        statements: &[(&Policy, &Statement)],
        request: &AuthorizationRequest,
        refs: &mut LazyResourceRefs<'_>,
    ) -> Result<bool> {
        if !Self::actions_covered(statements, request) {
            return Ok(false);
        }

        Self::resources_allowed(statements, request, refs)
    }

    /// Remove every operation id matched by an allow action from the pending
    /// set; succeed as soon as nothing is pending
    pub fn actions_covered(
        statements: &[(&Policy, &Statement)],
        request: &AuthorizationRequest,
    ) -> bool {
        let mut pending: BTreeSet<&str> = request.operation_ids().collect();

        for (policy, statement) in statements {
            if !PrincipalMatcher::matches(statement.principal_list(), request.session()) {
                continue;
            }

            for action in &statement.actions {
                // Field lists only carry meaning on deny statements
                pending.retain(|id| !action.matches_operation(id));

                if pending.is_empty() {
                    trace!(
                        "[RBAC] policy[name:{}, uuid:{}]'s statement[{}] allows the operation[{}]",
                        policy.name,
                        policy.uuid,
                        action,
                        request.operation_id()
                    );
                    return true;
                }
            }
        }

        false
    }

    /// Resource filter check over all principal-matched allow statements
    ///
    /// Filters are merged per resource type. A type referenced by the request
    /// fails the check when any referenced id is in the merged id set; types
    /// no allow statement filters are unconstrained.
    ///
    /// NOTE: failing on an intersection is the inverse of the allow-list reading
    /// one would expect. It is kept for compatibility with deployed policies and
    /// is pending product-owner confirmation.
    pub fn resources_allowed(
        statements: &[(&Policy, &Statement)],
        request: &AuthorizationRequest,
        refs: &mut LazyResourceRefs<'_>,
    ) -> Result<bool> {
        let refs = refs.get()?;
        if resource::is_empty(refs) {
            return Ok(true);
        }

        let mut filtered: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for (_, statement) in statements {
            if !PrincipalMatcher::matches(statement.principal_list(), request.session()) {
                continue;
            }

            for filter in statement.resource_filters() {
                filtered
                    .entry(filter.resource_type())
                    .or_default()
                    .extend(filter.ids().iter().map(String::as_str));
            }
        }

        for (resource_type, ids) in &filtered {
            let Some(requested) = refs.get(*resource_type) else {
                continue;
            };

            let hits: Vec<&str> = requested
                .iter()
                .map(String::as_str)
                .filter(|id| ids.contains(id))
                .collect();

            if !hits.is_empty() {
                debug!(
                    "[RBAC] resources{:?} of type[{}] are not allowed by resource filter policy for operation[{}]",
                    hits,
                    resource_type,
                    request.operation_id()
                );
                return Ok(false);
            }
        }

        Ok(true)
    }
}
