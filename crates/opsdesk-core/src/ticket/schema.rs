//! Built-in ticket forms and form lookup.

use opsdesk_types::config::{FieldMapping, FieldTransform, TicketSchema};
use opsdesk_types::error::TicketError;

pub const DEFAULT_FORM: &str = "issue";

/// The general-purpose form: summary, description, issue type, priority.
pub fn builtin_issue() -> TicketSchema {
    TicketSchema {
        name: DEFAULT_FORM.to_string(),
        issue_type: "Task".to_string(),
        fields: vec![FieldMapping {
            input: "priority".to_string(),
            target: "priority".to_string(),
            transform: FieldTransform::Named,
            required: false,
        }],
    }
}

/// Every available form: configured forms first, then built-ins they do not
/// shadow.
pub fn available_forms(configured: &[TicketSchema]) -> Vec<TicketSchema> {
    let mut forms = configured.to_vec();
    let builtin = builtin_issue();
    if !forms.iter().any(|f| f.name == builtin.name) {
        forms.push(builtin);
    }
    forms
}

/// Find a form by name. A configured form with a built-in name replaces the
/// built-in.
pub fn resolve_schema(
    name: &str,
    configured: &[TicketSchema],
) -> Result<TicketSchema, TicketError> {
    available_forms(configured)
        .into_iter()
        .find(|form| form.name == name)
        .ok_or_else(|| TicketError::UnknownForm(name.to_string()))
}
