//! Role-based access control for API operations
//!
//! Provides policy-driven authorization with:
//! - JSON policy documents with compact statement strings
//! - Allow/Deny statements with explicit deny precedence and default deny
//! - Segmented wildcard matching for operation ids and principals
//! - Field-scoped denies and per-resource filters
//! - A coarse bulk verdict for capability listings

mod allow;
mod deny;
mod engine;
mod pattern;
mod policy;
mod principal;
pub mod resource;

pub use allow::AllowEvaluator;
pub use deny::DenyEvaluator;
pub use engine::{AuthorizationEngine, BypassReason, Decision};
pub use pattern::PatternMatcher;
pub use policy::{
    ActionPattern, Effect, Policy, PrincipalKind, PrincipalRef, ResourceFilter, Statement,
};
pub(crate) use policy::PolicyDocument;
pub use principal::PrincipalMatcher;
pub use resource::{LazyResourceRefs, ResourceRefs};
