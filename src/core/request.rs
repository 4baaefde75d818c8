//! Authorization requests and sessions
//!
//! A request pairs a shared, per-operation [`RequestSchema`] with the values
//! supplied by one caller. The schema is a static field descriptor list built
//! once when the operation is registered; the engine reads it instead of
//! inspecting request types at runtime.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Kind of authenticated session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Account,
    User,
}

/// Authenticated session a request is issued under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub kind: SessionKind,
    pub account_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Administrative privilege
    #[serde(default)]
    pub admin: bool,
}

impl Session {
    /// Account-level session
    pub fn account(account_id: &str) -> Self {
        Session {
            kind: SessionKind::Account,
            account_id: account_id.to_string(),
            user_id: None,
            admin: false,
        }
    }

    /// User-level session inside an account
    pub fn user(account_id: &str, user_id: &str) -> Self {
        Session {
            kind: SessionKind::User,
            account_id: account_id.to_string(),
            user_id: Some(user_id.to_string()),
            admin: false,
        }
    }

    /// Grant administrative privilege
    pub fn with_admin(mut self) -> Self {
        self.admin = true;
        self
    }

    pub fn is_account_session(&self) -> bool {
        self.kind == SessionKind::Account
    }

    pub fn is_user_session(&self) -> bool {
        self.kind == SessionKind::User
    }

    pub fn has_admin_privilege(&self) -> bool {
        self.admin
    }
}

/// Declared type of a request field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    /// Single string value
    String,
    /// Collection of strings
    StringList,
    /// Anything else, by declared type name
    Other(String),
}

/// Static description of one request field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub name: String,
    /// Resource type the field refers to (`None` = untyped)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    pub field_type: FieldType,
}

impl FieldDescriptor {
    /// Plain field carrying no resource reference
    pub fn untyped(name: &str, field_type: FieldType) -> Self {
        FieldDescriptor {
            name: name.to_string(),
            resource_type: None,
            field_type,
        }
    }

    /// Field holding one resource identifier
    pub fn resource(name: &str, resource_type: &str) -> Self {
        FieldDescriptor {
            name: name.to_string(),
            resource_type: Some(resource_type.to_string()),
            field_type: FieldType::String,
        }
    }

    /// Field holding a list of resource identifiers
    pub fn resource_list(name: &str, resource_type: &str) -> Self {
        FieldDescriptor {
            name: name.to_string(),
            resource_type: Some(resource_type.to_string()),
            field_type: FieldType::StringList,
        }
    }

    pub fn is_collection(&self) -> bool {
        self.field_type == FieldType::StringList
    }
}

/// Field descriptor list for one operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSchema {
    /// Fully-qualified operation identifier
    pub operation_id: String,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    /// Operation never needs an authorization check
    #[serde(default)]
    pub exempt: bool,
}

impl RequestSchema {
    pub fn new(operation_id: &str) -> Self {
        RequestSchema {
            operation_id: operation_id.to_string(),
            fields: Vec::new(),
            exempt: false,
        }
    }

    pub fn field(mut self, descriptor: FieldDescriptor) -> Self {
        self.fields.push(descriptor);
        self
    }

    pub fn exempt(mut self) -> Self {
        self.exempt = true;
        self
    }

    pub fn descriptor(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Finish building and share
    pub fn build(self) -> Arc<RequestSchema> {
        Arc::new(self)
    }
}

/// Current value of a request field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Text(String),
    List(Vec<Option<String>>),
    Number(f64),
    Bool(bool),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Short shape name used in diagnostics
    pub fn shape(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Text(_) => "string",
            FieldValue::List(_) => "list",
            FieldValue::Number(_) => "number",
            FieldValue::Bool(_) => "bool",
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(values: Vec<&str>) -> Self {
        FieldValue::List(values.into_iter().map(|v| Some(v.to_string())).collect())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

/// One incoming management operation to authorize
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationRequest {
    pub schema: Arc<RequestSchema>,
    #[serde(default)]
    pub additional_operation_ids: BTreeSet<String>,
    pub session: Session,
    #[serde(default)]
    pub values: HashMap<String, FieldValue>,
    /// Per-request override to skip the check
    #[serde(default)]
    pub skip_check: bool,
}

impl AuthorizationRequest {
    pub fn new(schema: Arc<RequestSchema>, session: Session) -> Self {
        AuthorizationRequest {
            schema,
            additional_operation_ids: BTreeSet::new(),
            session,
            values: HashMap::new(),
            skip_check: false,
        }
    }

    /// Set a field value
    pub fn set(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.values.insert(field.to_string(), value.into());
        self
    }

    /// Require another operation to be authorized alongside this one
    pub fn also_check(mut self, operation_id: &str) -> Self {
        self.additional_operation_ids.insert(operation_id.to_string());
        self
    }

    pub fn skip_check(mut self) -> Self {
        self.skip_check = true;
        self
    }

    pub fn operation_id(&self) -> &str {
        &self.schema.operation_id
    }

    pub fn additional_operation_ids(&self) -> &BTreeSet<String> {
        &self.additional_operation_ids
    }

    /// Primary operation id followed by the additional ones
    pub fn operation_ids(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.operation_id())
            .chain(self.additional_operation_ids.iter().map(String::as_str))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn field_descriptors(&self) -> &[FieldDescriptor] {
        &self.schema.fields
    }

    /// Current value of a field (`Null` when never set)
    pub fn field(&self, name: &str) -> &FieldValue {
        const NULL: &FieldValue = &FieldValue::Null;
        self.values.get(name).unwrap_or(NULL)
    }

    /// True if the field holds a non-null value
    pub fn is_field_set(&self, name: &str) -> bool {
        !self.field(name).is_null()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Arc<RequestSchema> {
        RequestSchema::new("vm.create")
            .field(FieldDescriptor::resource("rootVolumeUuid", "Volume"))
            .field(FieldDescriptor::resource_list("dataVolumeUuids", "Volume"))
            .field(FieldDescriptor::untyped("cpuNum", FieldType::Other("int".to_string())))
            .build()
    }

    #[test]
    fn test_session_kinds() {
        let s = Session::account("acct-1");
        assert!(s.is_account_session());
        assert!(!s.is_user_session());
        assert!(!s.has_admin_privilege());

        let s = Session::user("acct-1", "user-1").with_admin();
        assert!(s.is_user_session());
        assert!(s.has_admin_privilege());
        assert_eq!(s.user_id.as_deref(), Some("user-1"));
    }

    #[test]
    fn test_field_presence() {
        let req = AuthorizationRequest::new(schema(), Session::account("acct-1"))
            .set("cpuNum", 4_i64)
            .set("rootVolumeUuid", FieldValue::Null);

        assert!(req.is_field_set("cpuNum"));
        assert!(!req.is_field_set("rootVolumeUuid"));
        assert!(!req.is_field_set("memorySize"));
        assert_eq!(req.field("memorySize"), &FieldValue::Null);
    }

    #[test]
    fn test_operation_ids() {
        let req = AuthorizationRequest::new(schema(), Session::account("acct-1"))
            .also_check("volume.attach");
        let ids: Vec<&str> = req.operation_ids().collect();
        assert_eq!(ids, vec!["vm.create", "volume.attach"]);
    }

    #[test]
    fn test_request_from_json() {
        let json = r#"{
            "schema": {
                "operationId": "vm.create",
                "fields": [
                    { "name": "rootVolumeUuid", "resourceType": "Volume", "fieldType": "string" },
                    { "name": "dataVolumeUuids", "resourceType": "Volume", "fieldType": "stringList" }
                ]
            },
            "session": { "kind": "user", "accountId": "acct-1", "userId": "user-1" },
            "values": {
                "rootVolumeUuid": "vol-1",
                "dataVolumeUuids": ["vol-2", null],
                "description": null
            }
        }"#;

        let req: AuthorizationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.operation_id(), "vm.create");
        assert!(req.session().is_user_session());
        assert_eq!(req.field("rootVolumeUuid"), &FieldValue::from("vol-1"));
        assert_eq!(
            req.field("dataVolumeUuids"),
            &FieldValue::List(vec![Some("vol-2".to_string()), None])
        );
        assert!(!req.is_field_set("description"));
        assert!(req.schema.descriptor("dataVolumeUuids").unwrap().is_collection());
    }
}
