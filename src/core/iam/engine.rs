//! Authorization engine with deny precedence
//!
//! Rule evaluation order for one request:
//! 1. exempt operations and skip-flagged requests bypass the check
//! 2. if any deny statement applicable to the session denies, deny
//! 3. if the allow statements cover every operation id and pass the
//!    resource filter check, allow
//! 4. otherwise deny by default
//!
//! The engine holds no per-call state. Every pending set and merged filter
//! map lives on the stack of a single call, so one instance can be shared
//! across threads without locking.

use super::resource::LazyResourceRefs;
use super::{AllowEvaluator, DenyEvaluator, Effect, Policy, Statement};
use crate::config::EngineConfig;
use crate::error::{RbacError, Result};
use crate::request::{AuthorizationRequest, Session};
use crate::store::PolicyStore;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, trace};

/// Why a request was let through without evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BypassReason {
    /// The operation's schema is marked exempt
    ExemptOperation,
    /// An exempt pattern in the engine configuration matched
    ConfiguredExemption,
    /// The request carried the skip flag
    SkipFlag,
}

impl fmt::Display for BypassReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            BypassReason::ExemptOperation => "exempt operation",
            BypassReason::ConfiguredExemption => "configured exemption",
            BypassReason::SkipFlag => "skip flag",
        };
        f.write_str(reason)
    }
}

/// Successful outcome of a decision pass; denials are errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Bypassed(BypassReason),
    Allowed,
}

/// Policy evaluation engine
pub struct AuthorizationEngine<S: PolicyStore> {
    store: S,
    config: EngineConfig,
    deny: DenyEvaluator,
}

impl<S: PolicyStore> AuthorizationEngine<S> {
    /// Create an engine with the default configuration
    pub fn new(store: S) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    pub fn with_config(store: S, config: EngineConfig) -> Self {
        let deny = DenyEvaluator::new(config.warn_unknown_fields);
        AuthorizationEngine {
            store,
            config,
            deny,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Authorize a request, raising the denial or defect as an error
    ///
    /// # Examples
    ///
    /// ```
    /// use rbac_guard::iam::{AuthorizationEngine, Policy, Statement};
    /// use rbac_guard::request::{AuthorizationRequest, RequestSchema, Session};
    /// use rbac_guard::store::InMemoryPolicyStore;
    ///
    /// let store = InMemoryPolicyStore::new();
    /// let policy = Policy::new("vm-operator")
    ///     .statement(Statement::allow(&["vm.*"]).unwrap());
    /// let uuid = policy.uuid.clone();
    /// store.insert_policy(policy);
    /// store.attach_to_account("acct-1", &uuid);
    ///
    /// let engine = AuthorizationEngine::new(store);
    /// let schema = RequestSchema::new("vm.start").build();
    ///
    /// let allowed = AuthorizationRequest::new(schema.clone(), Session::account("acct-1"));
    /// assert!(engine.check(&allowed).is_ok());
    ///
    /// let stranger = AuthorizationRequest::new(schema, Session::account("acct-2"));
    /// assert!(engine.check(&stranger).is_err());
    /// ```
    pub fn check(&self, request: &AuthorizationRequest) -> Result<()> {
        self.decide(request).map(|_| ())
    }

    /// Authorize a request, reporting whether the check was bypassed
    pub fn decide(&self, request: &AuthorizationRequest) -> Result<Decision> {
        if let Some(reason) = self.bypass_reason(request) {
            debug!(
                "[RBAC] operation[{}] bypasses the check: {}",
                request.operation_id(),
                reason
            );
            return Ok(Decision::Bypassed(reason));
        }

        match self.evaluate(request) {
            Ok(()) => Ok(Decision::Allowed),
            Err(e) => {
                if e.is_fatal() {
                    error!(
                        "[RBAC] cannot evaluate operation[{}]: {}",
                        request.operation_id(),
                        e
                    );
                }
                Err(e)
            }
        }
    }

    fn bypass_reason(&self, request: &AuthorizationRequest) -> Option<BypassReason> {
        if request.schema.exempt {
            Some(BypassReason::ExemptOperation)
        } else if self.config.is_exempt(request.operation_id()) {
            Some(BypassReason::ConfiguredExemption)
        } else if request.skip_check && self.config.honor_skip_flag {
            Some(BypassReason::SkipFlag)
        } else {
            None
        }
    }

    fn evaluate(&self, request: &AuthorizationRequest) -> Result<()> {
        let policies = self.store.policies_for_session(request.session());
        let (deny, allow) = partition(&policies);
        let mut refs = LazyResourceRefs::new(request);

        self.deny.evaluate(&deny, request, &mut refs)?;

        if AllowEvaluator::evaluate(&allow, request, &mut refs)? {
            return Ok(());
        }

        trace!(
            "[RBAC] no statement allows operation[{}], denied by default",
            request.operation_id()
        );
        Err(RbacError::DefaultDenied {
            operation_id: request.operation_id().to_string(),
        })
    }

    /// Coarse per-operation verdicts for a session
    ///
    /// Only action patterns are consulted: a matching deny statement gives
    /// `false`, otherwise a matching allow statement gives `true`, otherwise
    /// `false`. Principals, field lists and resource filters are ignored and
    /// nothing is raised.
    pub fn evaluate_permissions<I, T>(
        &self,
        operation_ids: I,
        session: &Session,
    ) -> BTreeMap<String, bool>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let policies = self.store.policies_for_session(session);
        let (deny, allow) = partition(&policies);

        operation_ids
            .into_iter()
            .map(|id| {
                let id = id.as_ref();
                let permitted = !mentions(&deny, id) && mentions(&allow, id);
                (id.to_string(), permitted)
            })
            .collect()
    }

    /// Every stored policy with a statement naming the operation
    pub fn governing_policies(&self, operation_id: &str) -> Vec<Arc<Policy>> {
        self.store.policies_for_operation(operation_id)
    }
}

fn mentions(statements: &[(&Policy, &Statement)], operation_id: &str) -> bool {
    statements.iter().any(|(_, statement)| {
        statement
            .actions
            .iter()
            .any(|a| a.matches_operation(operation_id))
    })
}

type Partitioned<'a> = (Vec<(&'a Policy, &'a Statement)>, Vec<(&'a Policy, &'a Statement)>);

/// Split statements into (deny, allow), keeping policy and statement order
fn partition(policies: &[Arc<Policy>]) -> Partitioned<'_> {
    let mut deny = Vec::new();
    let mut allow = Vec::new();

    for policy in policies {
        let policy: &Policy = policy;
        for statement in &policy.statements {
            match statement.effect {
                Effect::Deny => deny.push((policy, statement)),
                Effect::Allow => allow.push((policy, statement)),
            }
        }
    }

    (deny, allow)
}
