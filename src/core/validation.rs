//! Validation for the serialized pieces of a policy statement
//!
//! Statements arrive as compact strings (`"vm.create:rootVolumeUuid"`,
//! `"account:11111111-*"`, `"Volume:vol-1,vol-2"`). Each piece is checked
//! here before it becomes part of a loaded policy, so that a typo fails
//! loudly instead of matching too broadly or too narrowly.

use crate::error::{RbacError, Result};
use regex::Regex;
use std::sync::OnceLock;

/// Segmented wildcard pattern: segments separated by `.` or `:`, each either
/// a literal, a literal followed by one `*`, `*`, or `**`
const PATTERN: &str = r"^(\*\*?|[A-Za-z0-9_$\-]+\*?)([.:](\*\*?|[A-Za-z0-9_$\-]+\*?))*$";

/// Request field name (identifier)
const FIELD_NAME: &str = r"^[A-Za-z_][A-Za-z0-9_]*$";

/// Resource type canonical name
const RESOURCE_TYPE: &str = r"^[A-Za-z][A-Za-z0-9_]*$";

/// Resource identifier: anything without whitespace or list separators
const RESOURCE_ID: &str = r"^[^\s,:]+$";

fn regex(cell: &'static OnceLock<Regex>, pattern: &'static str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static validation regex"))
}

fn pattern_regex() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    regex(&CELL, PATTERN)
}

fn field_name_regex() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    regex(&CELL, FIELD_NAME)
}

fn resource_type_regex() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    regex(&CELL, RESOURCE_TYPE)
}

fn resource_id_regex() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    regex(&CELL, RESOURCE_ID)
}

/// Validate a wildcard pattern used for operation ids or principal identifiers
///
/// `**` is only accepted as the final segment.
///
/// # Examples
///
/// ```
/// use rbac_guard::core::validation::validate_pattern;
///
/// assert!(validate_pattern("vm.create.*").is_ok());
/// assert!(validate_pattern("11111111-*").is_ok());
/// assert!(validate_pattern("vm.*.disk").is_ok());
///
/// assert!(validate_pattern("").is_err());
/// assert!(validate_pattern("vm.**.disk").is_err()); // ** must terminate
/// assert!(validate_pattern("vm.*x").is_err()); // * must end its segment
/// ```
pub fn validate_pattern(pattern: &str) -> Result<()> {
    if pattern.is_empty() {
        return Err(RbacError::malformed("pattern", pattern, "pattern cannot be empty"));
    }

    if !pattern_regex().is_match(pattern) {
        return Err(RbacError::malformed(
            "pattern",
            pattern,
            "segments must be separated by '.' or ':' and a '*' may only end a segment",
        ));
    }

    if let Some(pos) = pattern.find("**") {
        if pos + 2 != pattern.len() {
            return Err(RbacError::malformed(
                "pattern",
                pattern,
                "'**' may only terminate a pattern",
            ));
        }
    }

    Ok(())
}

/// Validate a request field name referenced by a field-scoped action
pub fn validate_field_name(field: &str) -> Result<()> {
    if !field_name_regex().is_match(field) {
        return Err(RbacError::malformed(
            "field name",
            field,
            "must be an identifier (letters, digits, underscores)",
        ));
    }
    Ok(())
}

/// Validate a resource type canonical name
pub fn validate_resource_type(name: &str) -> Result<()> {
    if !resource_type_regex().is_match(name) {
        return Err(RbacError::malformed(
            "resource type",
            name,
            "must start with a letter and contain only letters, digits, underscores",
        ));
    }
    Ok(())
}

/// Validate a single resource identifier inside a resource filter
pub fn validate_resource_id(id: &str) -> Result<()> {
    if !resource_id_regex().is_match(id) {
        return Err(RbacError::malformed(
            "resource id",
            id,
            "must be non-empty and contain no whitespace, ',' or ':'",
        ));
    }
    Ok(())
}
