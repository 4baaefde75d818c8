//! Error types for authorization decisions and policy loading

use thiserror::Error;

/// Authorization errors
///
/// Denials are the normal outcome of a completed check; the remaining
/// variants report defects in schemas, policies or configuration.
#[derive(Error, Debug)]
pub enum RbacError {
    /// A deny statement names the operation
    #[error("the operation is denied by the policy[name:{policy_name}, uuid:{policy_uuid}], action[{action}]")]
    OperationDenied {
        policy_name: String,
        policy_uuid: String,
        action: String,
    },

    /// A field-scoped deny statement matched a field the request sets
    #[error("the operation is denied by the policy[name:{policy_name}, uuid:{policy_uuid}], field[{field}] is not permitted to set")]
    FieldDenied {
        policy_name: String,
        policy_uuid: String,
        field: String,
    },

    /// A deny statement's resource filter matched a referenced resource
    #[error("operation to resource[type:{resource_type}{}] is denied by the policy[name:{policy_name}, uuid:{policy_uuid}]", .resource_id.as_deref().map(|id| format!(", uuid:{}", id)).unwrap_or_default())]
    ResourceDenied {
        policy_name: String,
        policy_uuid: String,
        resource_type: String,
        /// `None` when the filter denies every resource of the type
        resource_id: Option<String>,
    },

    /// No allow statement covered the request
    #[error("operation[{operation_id}] is denied by default, please contact admin to correct it")]
    DefaultDenied { operation_id: String },

    /// A request schema declares a field the checker cannot read
    #[error("not supported field type[{declared}] for {operation_id}#{field}")]
    UnsupportedFieldType {
        operation_id: String,
        field: String,
        declared: String,
    },

    /// Principal reference with a kind other than `account` or `user`
    #[error("unknown principal kind[{0}]")]
    InvalidPrincipalKind(String),

    /// Statement string that failed to parse or validate
    #[error("malformed {kind}[{input}]: {reason}")]
    MalformedStatement {
        kind: &'static str,
        input: String,
        reason: String,
    },

    /// Engine configuration failed validation
    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON syntax or shape error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML syntax or shape error
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl RbacError {
    pub(crate) fn malformed(
        kind: &'static str,
        input: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        RbacError::MalformedStatement {
            kind,
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// True for the outcomes of a completed decision pass.
    pub fn is_denial(&self) -> bool {
        matches!(
            self,
            RbacError::OperationDenied { .. }
                | RbacError::FieldDenied { .. }
                | RbacError::ResourceDenied { .. }
                | RbacError::DefaultDenied { .. }
        )
    }

    /// True for schema or policy-authoring defects that must abort request processing.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RbacError::UnsupportedFieldType { .. }
                | RbacError::InvalidPrincipalKind(_)
                | RbacError::MalformedStatement { .. }
                | RbacError::InvalidConfig(_)
        )
    }
}

/// Authorization result type
pub type Result<T> = std::result::Result<T, RbacError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denial_classification() {
        let err = RbacError::DefaultDenied {
            operation_id: "vm.start".to_string(),
        };
        assert!(err.is_denial());
        assert!(!err.is_fatal());

        let err = RbacError::InvalidPrincipalKind("group".to_string());
        assert!(err.is_fatal());
        assert!(!err.is_denial());
    }

    #[test]
    fn test_resource_denied_message() {
        let err = RbacError::ResourceDenied {
            policy_name: "p".to_string(),
            policy_uuid: "u".to_string(),
            resource_type: "Volume".to_string(),
            resource_id: Some("vol-1".to_string()),
        };
        assert!(err.to_string().contains("uuid:vol-1"));

        let err = RbacError::ResourceDenied {
            policy_name: "p".to_string(),
            policy_uuid: "u".to_string(),
            resource_type: "Volume".to_string(),
            resource_id: None,
        };
        assert!(err.to_string().contains("type:Volume]"));
    }
}
