//! Create-issue payload building.

use std::collections::BTreeMap;

use serde_json::{Map, Value, json};

use opsdesk_types::config::{FieldMapping, FieldTransform, TicketSchema};
use opsdesk_types::error::TicketError;
use opsdesk_types::issue::RichTextDocument;

/// A filled-in ticket form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketForm {
    pub summary: String,
    pub description: String,
    /// Overrides the schema's issue type when set.
    pub issue_type: Option<String>,
    /// Schema inputs by name.
    pub values: BTreeMap<String, String>,
}

impl TicketForm {
    pub fn new(summary: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn with_value(mut self, input: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(input.into(), value.into());
        self
    }
}

/// Build `{ "fields": { .. } }` for the create-issue endpoint.
///
/// # Errors
///
/// - [`TicketError::MissingField`] for a blank project, summary, or required input.
/// - [`TicketError::InvalidValue`] for an input the schema does not declare or a
///   value its transform rejects.
pub fn build_issue_payload(
    schema: &TicketSchema,
    project: &str,
    form: &TicketForm,
) -> Result<Value, TicketError> {
    let project = project.trim();
    if project.is_empty() {
        return Err(TicketError::MissingField("project".to_string()));
    }
    let summary = form.summary.trim();
    if summary.is_empty() {
        return Err(TicketError::MissingField("summary".to_string()));
    }

    if let Some(unknown) = form
        .values
        .keys()
        .find(|input| !schema.fields.iter().any(|f| &f.input == *input))
    {
        return Err(TicketError::InvalidValue {
            field: unknown.clone(),
            reason: format!("not an input of form '{}'", schema.name),
        });
    }

    let issue_type = form
        .issue_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(&schema.issue_type);
    let description = serde_json::to_value(RichTextDocument::paragraph(form.description.trim()))
        .map_err(|e| TicketError::Deserialization(e.to_string()))?;

    let mut fields = Map::new();
    fields.insert("project".to_string(), json!({ "key": project }));
    fields.insert("summary".to_string(), json!(summary));
    fields.insert("issuetype".to_string(), json!({ "name": issue_type }));
    fields.insert("description".to_string(), description);

    for mapping in &schema.fields {
        let value = form
            .values
            .get(&mapping.input)
            .map(|v| v.trim())
            .unwrap_or_default();
        if let Some(shaped) = shape_value(mapping, value)? {
            fields.insert(mapping.target.clone(), shaped);
        }
    }

    Ok(json!({ "fields": fields }))
}

/// Apply a mapping's transform. `Ok(None)` means the optional input was left
/// empty and the field is omitted.
fn shape_value(mapping: &FieldMapping, value: &str) -> Result<Option<Value>, TicketError> {
    let shaped = match mapping.transform {
        _ if value.is_empty() => None,
        FieldTransform::Text => Some(json!(value)),
        FieldTransform::Named => Some(json!({ "name": value })),
        FieldTransform::Keyed => Some(json!({ "key": value })),
        FieldTransform::Choice => Some(json!({ "value": value })),
        FieldTransform::Number => Some(parse_number(&mapping.input, value)?),
        FieldTransform::Labels => {
            let labels: Vec<&str> = value
                .split(',')
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .collect();
            if labels.iter().any(|l| l.contains(char::is_whitespace)) {
                return Err(TicketError::InvalidValue {
                    field: mapping.input.clone(),
                    reason: "labels cannot contain spaces".to_string(),
                });
            }
            (!labels.is_empty()).then(|| json!(labels))
        }
        FieldTransform::RichText => Some(
            serde_json::to_value(RichTextDocument::paragraph(value))
                .map_err(|e| TicketError::Deserialization(e.to_string()))?,
        ),
    };

    if shaped.is_none() && mapping.required {
        return Err(TicketError::MissingField(mapping.input.clone()));
    }
    Ok(shaped)
}

fn parse_number(field: &str, value: &str) -> Result<Value, TicketError> {
    if let Ok(int) = value.parse::<i64>() {
        return Ok(json!(int));
    }
    value
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| TicketError::InvalidValue {
            field: field.to_string(),
            reason: format!("'{value}' is not a number"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticket::schema::builtin_issue;

    fn outage_form() -> TicketSchema {
        let field = |input: &str, target: &str, transform, required| FieldMapping {
            input: input.to_string(),
            target: target.to_string(),
            transform,
            required,
        };
        TicketSchema {
            name: "site-outage".to_string(),
            issue_type: "Incident".to_string(),
            fields: vec![
                field("site", "customfield_10010", FieldTransform::Choice, true),
                field("crews", "customfield_10011", FieldTransform::Number, false),
                field("labels", "labels", FieldTransform::Labels, false),
                field("parent", "parent", FieldTransform::Keyed, false),
                field("impact", "customfield_10012", FieldTransform::RichText, false),
                field("contact", "customfield_10013", FieldTransform::Text, false),
            ],
        }
    }

    #[test]
    fn test_builtin_issue_payload() {
        let form =
            TicketForm::new(" Printer offline ", "Floor 2 printer").with_value("priority", "High");
        let payload = build_issue_payload(&builtin_issue(), "OPS", &form).unwrap();
        assert_eq!(
            payload,
            json!({
                "fields": {
                    "project": {"key": "OPS"},
                    "summary": "Printer offline",
                    "issuetype": {"name": "Task"},
                    "priority": {"name": "High"},
                    "description": {
                        "type": "doc",
                        "version": 1,
                        "content": [{
                            "type": "paragraph",
                            "content": [{"type": "text", "text": "Floor 2 printer"}]
                        }]
                    }
                }
            })
        );
    }

    #[test]
    fn test_blank_description_and_priority_are_omitted_or_empty() {
        let mut form = TicketForm::new("Summary", "   ");
        form.issue_type = Some("Bug".to_string());
        let payload = build_issue_payload(&builtin_issue(), "OPS", &form).unwrap();
        let fields = &payload["fields"];
        assert_eq!(fields["issuetype"]["name"], "Bug");
        assert_eq!(fields["description"]["content"][0]["content"], json!([]));
        assert!(fields.get("priority").is_none());
    }

    #[test]
    fn test_schema_transforms() {
        let form = TicketForm::new("Site down", "")
            .with_value("site", "Denver")
            .with_value("crews", "3")
            .with_value("labels", "outage, hvac,,")
            .with_value("parent", "OPS-1")
            .with_value("impact", "No heat")
            .with_value("contact", "front desk");
        let payload = build_issue_payload(&outage_form(), "OPS", &form).unwrap();
        let fields = &payload["fields"];

        assert_eq!(fields["issuetype"]["name"], "Incident");
        assert_eq!(fields["customfield_10010"], json!({"value": "Denver"}));
        assert_eq!(fields["customfield_10011"], json!(3));
        assert_eq!(fields["labels"], json!(["outage", "hvac"]));
        assert_eq!(fields["parent"], json!({"key": "OPS-1"}));
        assert_eq!(fields["customfield_10012"]["content"][0]["content"][0]["text"], "No heat");
        assert_eq!(fields["customfield_10013"], "front desk");
    }

    #[test]
    fn test_decimal_numbers() {
        let form = TicketForm::new("s", "").with_value("site", "x").with_value("crews", "2.5");
        let payload = build_issue_payload(&outage_form(), "OPS", &form).unwrap();
        assert_eq!(payload["fields"]["customfield_10011"], json!(2.5));
    }

    #[test]
    fn test_missing_required_input() {
        let form = TicketForm::new("Site down", "");
        assert_eq!(
            build_issue_payload(&outage_form(), "OPS", &form),
            Err(TicketError::MissingField("site".to_string()))
        );
    }

    #[test]
    fn test_missing_project_and_summary() {
        let form = TicketForm::new("Summary", "");
        assert_eq!(
            build_issue_payload(&builtin_issue(), " ", &form),
            Err(TicketError::MissingField("project".to_string()))
        );
        assert_eq!(
            build_issue_payload(&builtin_issue(), "OPS", &TicketForm::default()),
            Err(TicketError::MissingField("summary".to_string()))
        );
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad_number = TicketForm::new("s", "")
            .with_value("site", "x")
            .with_value("crews", "many");
        assert!(matches!(
            build_issue_payload(&outage_form(), "OPS", &bad_number),
            Err(TicketError::InvalidValue { ref field, .. }) if field == "crews"
        ));

        let bad_label = TicketForm::new("s", "")
            .with_value("site", "x")
            .with_value("labels", "two words");
        assert!(matches!(
            build_issue_payload(&outage_form(), "OPS", &bad_label),
            Err(TicketError::InvalidValue { ref field, .. }) if field == "labels"
        ));

        let unknown = TicketForm::new("s", "").with_value("colour", "red");
        assert!(matches!(
            build_issue_payload(&builtin_issue(), "OPS", &unknown),
            Err(TicketError::InvalidValue { ref field, .. }) if field == "colour"
        ));
    }
}
