//! Deny statement evaluation
//!
//! Every principal-matched deny statement is checked twice:
//! - its actions against the request's operation ids (optionally scoped to fields)
//! - its resource filters against the resources the request references
//!
//! The first statement that denies aborts evaluation.

use super::resource::{self, LazyResourceRefs};
use super::{Policy, PrincipalMatcher, Statement};
use crate::error::{RbacError, Result};
use crate::request::AuthorizationRequest;
use tracing::{trace, warn};

/// Evaluates deny statements; any match is an immediate denial
pub struct DenyEvaluator {
    warn_unknown_fields: bool,
}

impl DenyEvaluator {
    pub fn new(warn_unknown_fields: bool) -> Self {
        DenyEvaluator {
            warn_unknown_fields,
        }
    }

    /// Return `Err` with the first denial found, `Ok(())` if nothing denies
    pub fn evaluate(
        &self,
        statements: &[(&Policy, &Statement)],
        request: &AuthorizationRequest,
        refs: &mut LazyResourceRefs<'_>,
    ) -> Result<()> {
        for (policy, statement) in statements {
            if !PrincipalMatcher::matches(statement.principal_list(), request.session()) {
                continue;
            }

            self.check_actions(policy, statement, request)?;
            Self::check_resources(policy, statement, refs)?;
        }

        Ok(())
    }

    fn check_actions(
        &self,
        policy: &Policy,
        statement: &Statement,
        request: &AuthorizationRequest,
    ) -> Result<()> {
        for action in &statement.actions {
            // Statement must name this operation or one that is checked with it
            if !request.operation_ids().any(|id| action.matches_operation(id)) {
                continue;
            }

            let Some(fields) = action.fields() else {
                trace!(
                    "[RBAC] policy[name:{}, uuid:{}]'s statement[{}] denies the operation[{}]",
                    policy.name,
                    policy.uuid,
                    action,
                    request.operation_id()
                );
                return Err(RbacError::OperationDenied {
                    policy_name: policy.name.clone(),
                    policy_uuid: policy.uuid.clone(),
                    action: action.to_string(),
                });
            };

            for field in fields {
                if self.warn_unknown_fields
                    && request.schema.descriptor(field).is_none()
                    && !request.values.contains_key(field)
                {
                    warn!(
                        "[RBAC] policy[name:{}, uuid:{}] restricts field[{}] which operation[{}] does not declare",
                        policy.name,
                        policy.uuid,
                        field,
                        request.operation_id()
                    );
                }

                if request.is_field_set(field) {
                    trace!(
                        "[RBAC] policy[name:{}, uuid:{}]'s statement[{}] denies field[{}] of operation[{}]",
                        policy.name,
                        policy.uuid,
                        action,
                        field,
                        request.operation_id()
                    );
                    return Err(RbacError::FieldDenied {
                        policy_name: policy.name.clone(),
                        policy_uuid: policy.uuid.clone(),
                        field: field.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    fn check_resources(
        policy: &Policy,
        statement: &Statement,
        refs: &mut LazyResourceRefs<'_>,
    ) -> Result<()> {
        let filters = statement.resource_filters();
        if filters.is_empty() {
            return Ok(());
        }

        let refs = refs.get()?;
        if resource::is_empty(refs) {
            return Ok(());
        }

        for filter in filters {
            // No matching resource in the request, skip
            let Some(ids) = refs.get(filter.resource_type()).filter(|ids| !ids.is_empty()) else {
                continue;
            };

            let denied_id = if filter.covers_all() {
                None
            } else {
                match ids.iter().find(|id| filter.ids().contains(*id)) {
                    Some(id) => Some(id.clone()),
                    None => continue,
                }
            };

            trace!(
                "[RBAC] policy[name:{}, uuid:{}]'s resource filter[{}] denies resource[{}]",
                policy.name,
                policy.uuid,
                filter,
                denied_id.as_deref().unwrap_or("*")
            );
            return Err(RbacError::ResourceDenied {
                policy_name: policy.name.clone(),
                policy_uuid: policy.uuid.clone(),
                resource_type: filter.resource_type().to_string(),
                resource_id: denied_id,
            });
        }

        Ok(())
    }
}
