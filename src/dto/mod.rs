pub mod landed_cost;

use crate::errors::FieldViolation;
use validator::ValidationErrors;

/// Flattens `validator` field errors into path-addressed violations, sorted by
/// field so responses are stable. `prefix` addresses nested structs, e.g.
/// `items[1]` turns `quantity` into `items[1].quantity`.
pub fn violations_from(prefix: Option<&str>, errors: &ValidationErrors) -> Vec<FieldViolation> {
    let mut violations: Vec<FieldViolation> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, field_errors)| {
            let path = match prefix {
                Some(prefix) => format!("{}.{}", prefix, field),
                None => field.to_string(),
            };
            field_errors.iter().map(move |error| {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| error.code.to_string());
                FieldViolation::new(path.clone(), message)
            })
        })
        .collect();
    violations.sort_by(|a, b| a.field.cmp(&b.field));
    violations
}
