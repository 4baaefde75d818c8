//! Resource reference extraction
//!
//! Collects, per resource type, the identifiers a request refers to through
//! its resource-typed fields.

use crate::error::{RbacError, Result};
use crate::request::{AuthorizationRequest, FieldType, FieldValue};
use std::collections::{BTreeMap, BTreeSet};

/// Resource type name -> identifiers referenced by a request
pub type ResourceRefs = BTreeMap<String, BTreeSet<String>>;

/// Extract resource references from a request
///
/// Fields without a resource type are skipped. A resource-typed field must be
/// declared as a string or string list and hold a matching value; anything
/// else is a schema defect and fails with `UnsupportedFieldType`.
pub fn extract(request: &AuthorizationRequest) -> Result<ResourceRefs> {
    let mut refs = ResourceRefs::new();

    for descriptor in request.field_descriptors() {
        let Some(resource_type) = descriptor.resource_type.as_deref() else {
            continue;
        };

        let unsupported = |declared: String| RbacError::UnsupportedFieldType {
            operation_id: request.operation_id().to_string(),
            field: descriptor.name.clone(),
            declared,
        };

        let mut ids = Vec::new();
        match (&descriptor.field_type, request.field(&descriptor.name)) {
            (FieldType::Other(declared), _) => return Err(unsupported(declared.clone())),
            (_, FieldValue::Null) => {}
            (FieldType::String, FieldValue::Text(id)) => ids.push(id.clone()),
            (FieldType::StringList, FieldValue::List(values)) => {
                ids.extend(values.iter().flatten().cloned());
            }
            (declared, value) => {
                return Err(unsupported(format!(
                    "{:?} holding a {} value",
                    declared,
                    value.shape()
                )))
            }
        }

        // Repeated types merge; a typed field that is unset still registers its type
        refs.entry(resource_type.to_string()).or_default().extend(ids);
    }

    Ok(refs)
}

/// Resource references of one request, extracted on first use
///
/// Lives for a single decision pass; never shared between calls.
pub struct LazyResourceRefs<'a> {
    request: &'a AuthorizationRequest,
    refs: Option<ResourceRefs>,
}

impl<'a> LazyResourceRefs<'a> {
    pub fn new(request: &'a AuthorizationRequest) -> Self {
        LazyResourceRefs {
            request,
            refs: None,
        }
    }

    /// Extract on first call, then reuse
    pub fn get(&mut self) -> Result<&ResourceRefs> {
        let refs = match self.refs.take() {
            Some(refs) => refs,
            None => extract(self.request)?,
        };
        Ok(self.refs.insert(refs))
    }
}

/// True if no identifier of any type is referenced
pub fn is_empty(refs: &ResourceRefs) -> bool {
    refs.values().all(BTreeSet::is_empty)
}
