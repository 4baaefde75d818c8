//! # rbac-guard - Role-Based Authorization for API Operations
//!
//! `rbac-guard` decides whether an incoming management operation may proceed,
//! based on allow/deny policies attached to the caller's account or user.
//!
//! - **Deny precedence**: any applicable deny statement rejects the request
//! - **Default deny**: an operation nobody allows is rejected
//! - **Fine-grained statements**: wildcard operation patterns, field-scoped
//!   denies, principal patterns and resource filters
//! - **Stateless engine**: one shared instance serves any number of threads
//!
//! ## Quick Start
//!
//! ```rust
//! use rbac_guard::{AuthorizationEngine, InMemoryPolicyStore, Policy, Result, Statement};
//! use rbac_guard::request::{AuthorizationRequest, FieldDescriptor, RequestSchema, Session};
//!
//! # fn main() -> Result<()> {
//! let store = InMemoryPolicyStore::new();
//! let policy = Policy::new("vm-operator")
//!     .statement(Statement::allow(&["vm.*"])?)
//!     .statement(Statement::deny(&["vm.create:rootVolumeUuid"])?);
//! let uuid = policy.uuid.clone();
//! store.insert_policy(policy);
//! store.attach_global(&uuid);
//!
//! let engine = AuthorizationEngine::new(store);
//!
//! // Built once per operation
//! let schema = RequestSchema::new("vm.create")
//!     .field(FieldDescriptor::resource("rootVolumeUuid", "Volume"))
//!     .build();
//!
//! let plain = AuthorizationRequest::new(schema.clone(), Session::account("acct-1"));
//! engine.check(&plain)?;
//!
//! let with_root = AuthorizationRequest::new(schema, Session::account("acct-1"))
//!     .set("rootVolumeUuid", "vol-1");
//! assert!(engine.check(&with_root).is_err());
//! # Ok(())
//! # }
//! ```

pub mod core;

// Module paths used throughout the crate and by callers
pub use crate::core::{config, error, iam, request, store, validation};

// Re-export the types most callers need
pub use crate::core::{
    config::EngineConfig,
    error::{RbacError, Result},
    iam::{
        AuthorizationEngine, BypassReason, Decision, Effect, PatternMatcher, Policy, Statement,
    },
    request::{AuthorizationRequest, RequestSchema, Session},
    store::{InMemoryPolicyStore, PolicySnapshot, PolicyStore},
};
