//! Per-step field validation.
//!
//! Validation never fails as an operation: it returns the set of offending
//! fields, and an empty set means the step may be left forward.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::payload::{value_text, FormPayload};
use super::step::WizardStep;

/// Reason a single field failed
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldError {
    #[error("is required")]
    Required,

    #[error("must be a positive number")]
    NotPositiveNumber,
}

/// Field name to failure reason; empty means the step passes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrorSet(BTreeMap<String, FieldError>);

impl ValidationErrorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<FieldError> {
        self.0.get(field).copied()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, error: FieldError) {
        self.0.insert(field.into(), error);
    }

    /// Drop the error for `field` and for anything nested under it
    /// (clearing `address` also clears `address.city`).
    pub fn clear_field(&mut self, field: &str) {
        let nested = format!("{field}.");
        self.0
            .retain(|name, _| name != field && !name.starts_with(&nested));
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, FieldError)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl fmt::Display for ValidationErrorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, error)| format!("{field} {error}"))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Validate the fields owned by `step`
pub fn validate(step: WizardStep, payload: &FormPayload) -> ValidationErrorSet {
    let mut errors = ValidationErrorSet::new();

    match step {
        WizardStep::BasicInfo => {
            for field in step.required_fields() {
                require_present(payload, field, &mut errors);
            }
            require_positive(payload, "price", &mut errors);
        }
        WizardStep::Details => {
            for field in step.required_fields() {
                require_present(payload, field, &mut errors);
                require_positive(payload, field, &mut errors);
            }
        }
        WizardStep::Location => {
            for field in step.required_fields() {
                require_present(payload, field, &mut errors);
            }
        }
        // Images are optional and review only reads the payload
        WizardStep::Images | WizardStep::Review => {}
    }

    errors
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

fn require_present(payload: &FormPayload, field: &str, errors: &mut ValidationErrorSet) {
    if !payload.get(field).is_some_and(is_present) {
        errors.insert(field, FieldError::Required);
    }
}

/// Only checked once the field is present; a missing field already carries `Required`
fn require_positive(payload: &FormPayload, field: &str, errors: &mut ValidationErrorSet) {
    if errors.contains(field) {
        return;
    }
    let Some(value) = payload.get(field) else {
        return;
    };
    if !parses_positive(value) {
        errors.insert(field, FieldError::NotPositiveNumber);
    }
}

fn parses_positive(value: &Value) -> bool {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(_) => value_text(value).and_then(|s| s.trim().parse::<f64>().ok()),
        _ => None,
    };
    number.is_some_and(|n| n.is_finite() && n > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> FormPayload {
        FormPayload::from_value(value).unwrap()
    }

    #[test]
    fn test_empty_basic_info_reports_every_required_field() {
        let errors = validate(WizardStep::BasicInfo, &FormPayload::new());
        let fields: Vec<&str> = errors.fields().collect();
        assert_eq!(
            fields,
            vec!["description", "price", "propertyType", "status", "title"]
        );
        assert!(errors.iter().all(|(_, e)| e == FieldError::Required));
    }

    #[test]
    fn test_valid_basic_info_passes() {
        let p = payload(json!({
            "title": "A", "description": "B", "price": "100",
            "propertyType": "house", "status": "available"
        }));
        assert!(validate(WizardStep::BasicInfo, &p).is_empty());
    }

    #[test]
    fn test_whitespace_title_is_missing() {
        let p = payload(json!({
            "title": "   ", "description": "B", "price": 100,
            "propertyType": "house", "status": "available"
        }));
        let errors = validate(WizardStep::BasicInfo, &p);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("title"), Some(FieldError::Required));
    }

    #[test]
    fn test_price_must_be_positive_number() {
        for bad in [json!("abc"), json!("-5"), json!("0"), json!(0), json!(true)] {
            let p = payload(json!({
                "title": "A", "description": "B", "price": bad,
                "propertyType": "house", "status": "available"
            }));
            let errors = validate(WizardStep::BasicInfo, &p);
            assert_eq!(errors.get("price"), Some(FieldError::NotPositiveNumber), "{p:?}");
        }
    }

    #[test]
    fn test_details_numeric_rules() {
        let p = payload(json!({"bedrooms": "2", "bathrooms": " 1.5 ", "squareFootage": "-1"}));
        let errors = validate(WizardStep::Details, &p);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("squareFootage"), Some(FieldError::NotPositiveNumber));

        let p = payload(json!({"bedrooms": 3, "bathrooms": 2, "squareFootage": 1200}));
        assert!(validate(WizardStep::Details, &p).is_empty());
    }

    #[test]
    fn test_location_requires_nested_address_fields() {
        let p = payload(json!({"address": {"street": "1 Elm", "city": " ", "zipCode": "10001"}}));
        let errors = validate(WizardStep::Location, &p);
        let fields: Vec<&str> = errors.fields().collect();
        assert_eq!(fields, vec!["address.city", "address.country", "address.state"]);
    }

    #[test]
    fn test_images_and_review_always_pass() {
        assert!(validate(WizardStep::Images, &FormPayload::new()).is_empty());
        assert!(validate(WizardStep::Review, &FormPayload::new()).is_empty());
    }

    #[test]
    fn test_clear_field_drops_nested_errors() {
        let mut errors = ValidationErrorSet::new();
        errors.insert("address.city", FieldError::Required);
        errors.insert("address.state", FieldError::Required);
        errors.insert("addressLine", FieldError::Required);

        errors.clear_field("address.city");
        assert!(!errors.contains("address.city"));
        assert!(errors.contains("address.state"));

        errors.clear_field("address");
        assert!(!errors.contains("address.state"));
        assert!(errors.contains("addressLine"));
    }

    #[test]
    fn test_display_lists_fields() {
        let mut errors = ValidationErrorSet::new();
        errors.insert("price", FieldError::NotPositiveNumber);
        errors.insert("title", FieldError::Required);
        assert_eq!(
            errors.to_string(),
            "price must be a positive number, title is required"
        );
    }
}
