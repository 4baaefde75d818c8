//! RBAC policy document structure
//!
//! A policy is a named, ordered list of allow/deny statements. Statement
//! parts keep their compact string form on the wire:
//!
//! ```json
//! {
//!   "uuid": "5d0b9a4c-...",
//!   "name": "no-root-volume",
//!   "statements": [
//!     { "effect": "Deny", "actions": ["vm.create:rootVolumeUuid"] },
//!     { "effect": "Allow", "actions": ["vm.*"], "principals": ["account:acct-1"],
//!       "targetResources": ["Volume:vol-1,vol-2"] }
//!   ]
//! }
//! ```
//!
//! Every string is parsed and validated on load; a malformed statement
//! never reaches the evaluator.

use super::PatternMatcher;
use crate::error::{RbacError, Result};
use crate::validation::{
    validate_field_name, validate_pattern, validate_resource_id, validate_resource_type,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Effect of a policy statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effect {
    /// Allow the action
    Allow,
    /// Deny the action (takes precedence over Allow)
    Deny,
}

/// Action pattern: `<operation-pattern>[:<field1>,<field2>,...]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ActionPattern {
    operation: String,
    fields: Option<Vec<String>>,
}

impl ActionPattern {
    /// Create an action pattern without a field list
    pub fn new(operation: &str) -> Result<Self> {
        validate_pattern(operation)?;
        Ok(ActionPattern {
            operation: operation.to_string(),
            fields: None,
        })
    }

    /// The operation-pattern part
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Fields that must be unset for a deny statement to let the request through
    pub fn fields(&self) -> Option<&[String]> {
        self.fields.as_deref()
    }

    /// Check the operation-pattern part against a concrete operation id
    pub fn matches_operation(&self, operation_id: &str) -> bool {
        PatternMatcher::matches(&self.operation, operation_id)
    }
}

impl FromStr for ActionPattern {
    type Err = RbacError;

    fn from_str(s: &str) -> Result<Self> {
        let (operation, fields) = match s.split_once(':') {
            Some((operation, fields)) => (operation, Some(fields)),
            None => (s, None),
        };

        validate_pattern(operation).map_err(|e| {
            RbacError::malformed("action", s, format!("bad operation pattern: {}", e))
        })?;

        let fields = match fields {
            None => None,
            Some(list) => {
                let names: Vec<String> = list.split(',').map(|f| f.trim().to_string()).collect();
                for name in &names {
                    validate_field_name(name)
                        .map_err(|e| RbacError::malformed("action", s, e.to_string()))?;
                }
                Some(names)
            }
        };

        Ok(ActionPattern {
            operation: operation.to_string(),
            fields,
        })
    }
}

impl TryFrom<String> for ActionPattern {
    type Error = RbacError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ActionPattern> for String {
    fn from(action: ActionPattern) -> Self {
        action.to_string()
    }
}

impl fmt::Display for ActionPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.fields {
            Some(fields) => write!(f, "{}:{}", self.operation, fields.join(",")),
            None => write!(f, "{}", self.operation),
        }
    }
}

/// Kind of identity a principal reference names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrincipalKind {
    Account,
    User,
}

impl PrincipalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrincipalKind::Account => "account",
            PrincipalKind::User => "user",
        }
    }
}

impl FromStr for PrincipalKind {
    type Err = RbacError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "account" => Ok(PrincipalKind::Account),
            "user" => Ok(PrincipalKind::User),
            other => Err(RbacError::InvalidPrincipalKind(other.to_string())),
        }
    }
}

/// Principal reference: `kind:pattern`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PrincipalRef {
    pub kind: PrincipalKind,
    pattern: String,
}

impl PrincipalRef {
    pub fn account(pattern: &str) -> Result<Self> {
        Self::new(PrincipalKind::Account, pattern)
    }

    pub fn user(pattern: &str) -> Result<Self> {
        Self::new(PrincipalKind::User, pattern)
    }

    fn new(kind: PrincipalKind, pattern: &str) -> Result<Self> {
        validate_pattern(pattern)?;
        Ok(PrincipalRef {
            kind,
            pattern: pattern.to_string(),
        })
    }

    /// Identifier pattern matched against account or user ids
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl FromStr for PrincipalRef {
    type Err = RbacError;

    fn from_str(s: &str) -> Result<Self> {
        let (kind, pattern) = s
            .split_once(':')
            .ok_or_else(|| RbacError::malformed("principal", s, "expected 'kind:pattern'"))?;

        let kind: PrincipalKind = kind.parse()?;
        validate_pattern(pattern)
            .map_err(|e| RbacError::malformed("principal", s, e.to_string()))?;

        Ok(PrincipalRef {
            kind,
            pattern: pattern.to_string(),
        })
    }
}

impl TryFrom<String> for PrincipalRef {
    type Error = RbacError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<PrincipalRef> for String {
    fn from(principal: PrincipalRef) -> Self {
        principal.to_string()
    }
}

impl fmt::Display for PrincipalRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.pattern)
    }
}

/// Resource filter: `type` or `type:id1,id2,...`
///
/// An empty id set means every resource of the type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceFilter {
    resource_type: String,
    ids: BTreeSet<String>,
}

impl ResourceFilter {
    /// Filter over every resource of a type
    pub fn all(resource_type: &str) -> Result<Self> {
        validate_resource_type(resource_type)?;
        Ok(ResourceFilter {
            resource_type: resource_type.to_string(),
            ids: BTreeSet::new(),
        })
    }

    /// Filter over specific resources of a type
    pub fn with_ids<I, S>(resource_type: &str, ids: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut filter = Self::all(resource_type)?;
        for id in ids {
            let id = id.into();
            validate_resource_id(&id)?;
            filter.ids.insert(id);
        }
        Ok(filter)
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Listed identifiers (empty = all identifiers of the type)
    pub fn ids(&self) -> &BTreeSet<String> {
        &self.ids
    }

    pub fn covers_all(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromStr for ResourceFilter {
    type Err = RbacError;

    fn from_str(s: &str) -> Result<Self> {
        let (resource_type, ids) = match s.split_once(':') {
            Some((resource_type, ids)) => (resource_type, Some(ids)),
            None => (s, None),
        };

        validate_resource_type(resource_type)
            .map_err(|e| RbacError::malformed("resource filter", s, e.to_string()))?;

        let mut filter = ResourceFilter {
            resource_type: resource_type.to_string(),
            ids: BTreeSet::new(),
        };

        if let Some(ids) = ids {
            for id in ids.split(',').map(str::trim) {
                validate_resource_id(id)
                    .map_err(|e| RbacError::malformed("resource filter", s, e.to_string()))?;
                filter.ids.insert(id.to_string());
            }
        }

        Ok(filter)
    }
}

impl TryFrom<String> for ResourceFilter {
    type Error = RbacError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ResourceFilter> for String {
    fn from(filter: ResourceFilter) -> Self {
        filter.to_string()
    }
}

impl fmt::Display for ResourceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ids.is_empty() {
            write!(f, "{}", self.resource_type)
        } else {
            let ids: Vec<&str> = self.ids.iter().map(String::as_str).collect();
            write!(f, "{}:{}", self.resource_type, ids.join(","))
        }
    }
}

/// A single policy statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statement {
    /// Effect of this statement
    pub effect: Effect,

    /// Action patterns this statement applies to
    pub actions: Vec<ActionPattern>,

    /// Principals this statement applies to (absent = everyone)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principals: Option<Vec<PrincipalRef>>,

    /// Resource instances this statement applies to (absent = all)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_resources: Option<Vec<ResourceFilter>>,
}

impl Statement {
    /// Create a new statement from serialized action strings
    pub fn new(effect: Effect, actions: &[&str]) -> Result<Self> {
        let actions = actions
            .iter()
            .map(|a| a.parse())
            .collect::<Result<Vec<ActionPattern>>>()?;

        Ok(Statement {
            effect,
            actions,
            principals: None,
            target_resources: None,
        })
    }

    pub fn allow(actions: &[&str]) -> Result<Self> {
        Self::new(Effect::Allow, actions)
    }

    pub fn deny(actions: &[&str]) -> Result<Self> {
        Self::new(Effect::Deny, actions)
    }

    /// Restrict the statement to principals (`"kind:pattern"` strings)
    pub fn with_principals(mut self, principals: &[&str]) -> Result<Self> {
        let principals = principals
            .iter()
            .map(|p| p.parse())
            .collect::<Result<Vec<PrincipalRef>>>()?;
        self.principals = Some(principals);
        Ok(self)
    }

    /// Restrict the statement to resources (`"type:id1,id2"` strings)
    pub fn with_target_resources(mut self, filters: &[&str]) -> Result<Self> {
        let filters = filters
            .iter()
            .map(|f| f.parse())
            .collect::<Result<Vec<ResourceFilter>>>()?;
        self.target_resources = Some(filters);
        Ok(self)
    }

    /// Principals, treating an empty list like an absent one
    pub fn principal_list(&self) -> &[PrincipalRef] {
        self.principals.as_deref().unwrap_or(&[])
    }

    /// Resource filters, treating an absent list as empty
    pub fn resource_filters(&self) -> &[ResourceFilter] {
        self.target_resources.as_deref().unwrap_or(&[])
    }
}

/// Complete RBAC policy document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Policy {
    /// Policy identifier
    pub uuid: String,

    /// Human-readable policy name
    pub name: String,

    /// Ordered list of policy statements
    #[serde(default)]
    pub statements: Vec<Statement>,
}

impl Policy {
    /// Create a new empty policy with a fresh uuid
    pub fn new(name: &str) -> Self {
        Policy {
            uuid: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            statements: Vec::new(),
        }
    }

    /// Create a new empty policy with a known uuid
    pub fn with_uuid(uuid: &str, name: &str) -> Self {
        Policy {
            uuid: uuid.to_string(),
            name: name.to_string(),
            statements: Vec::new(),
        }
    }

    /// Add a statement to this policy
    pub fn add_statement(&mut self, statement: Statement) {
        self.statements.push(statement);
    }

    /// Builder form of [`Policy::add_statement`]
    pub fn statement(mut self, statement: Statement) -> Self {
        self.statements.push(statement);
        self
    }

    pub fn deny_statements(&self) -> impl Iterator<Item = &Statement> {
        self.statements.iter().filter(|s| s.effect == Effect::Deny)
    }

    pub fn allow_statements(&self) -> impl Iterator<Item = &Statement> {
        self.statements.iter().filter(|s| s.effect == Effect::Allow)
    }

    /// True if any statement action pattern matches the operation id
    pub fn mentions_operation(&self, operation_id: &str) -> bool {
        self.statements
            .iter()
            .flat_map(|s| s.actions.iter())
            .any(|a| a.matches_operation(operation_id))
    }

    /// Parse policy from JSON string
    ///
    /// Statement strings are parsed after the JSON itself, so a bad principal
    /// kind surfaces as [`RbacError::InvalidPrincipalKind`] and any other bad
    /// string as [`RbacError::MalformedStatement`].
    pub fn from_json(json: &str) -> Result<Self> {
        let document: PolicyDocument = serde_json::from_str(json)?;
        document.into_policy()
    }

    /// Serialize policy to JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate policy structure
    pub fn validate(&self) -> Result<()> {
        if self.statements.is_empty() {
            return Err(RbacError::malformed(
                "policy",
                &self.name,
                "policy must have at least one statement",
            ));
        }

        for (i, stmt) in self.statements.iter().enumerate() {
            if stmt.actions.is_empty() {
                return Err(RbacError::malformed(
                    "policy",
                    &self.name,
                    format!("statement {} has no actions", i),
                ));
            }
        }

        Ok(())
    }
}

/// Wire form of a statement, every part still a raw string
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatementDocument {
    effect: Effect,
    actions: Vec<String>,
    #[serde(default)]
    principals: Option<Vec<String>>,
    #[serde(default)]
    target_resources: Option<Vec<String>>,
}

impl StatementDocument {
    fn into_statement(self) -> Result<Statement> {
        Ok(Statement {
            effect: self.effect,
            actions: parse_all(&self.actions)?,
            principals: self.principals.as_deref().map(parse_all).transpose()?,
            target_resources: self.target_resources.as_deref().map(parse_all).transpose()?,
        })
    }
}

/// Wire form of a policy
///
/// Statement strings are parsed after deserialization so their typed
/// errors reach the caller instead of a serde message.
#[derive(Debug, Deserialize)]
pub(crate) struct PolicyDocument {
    uuid: String,
    name: String,
    #[serde(default)]
    statements: Vec<StatementDocument>,
}

impl PolicyDocument {
    pub(crate) fn into_policy(self) -> Result<Policy> {
        let statements = self
            .statements
            .into_iter()
            .map(StatementDocument::into_statement)
            .collect::<Result<Vec<_>>>()?;

        Ok(Policy {
            uuid: self.uuid,
            name: self.name,
            statements,
        })
    }
}

fn parse_all<T>(items: &[String]) -> Result<Vec<T>>
where
    T: FromStr<Err = RbacError>,
{
    items.iter().map(|item| item.parse()).collect()
}
