//! Issue tracker request/response types.

use serde::{Deserialize, Serialize};

/// Rich-text document body used for the issue description field.
///
/// Only the subset this crate emits: one paragraph of plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichTextDocument {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: u32,
    pub content: Vec<RichTextNode>,
}

/// A block or inline node of a [`RichTextDocument`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichTextNode {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<RichTextNode>>,
}

impl RichTextDocument {
    /// A document holding one paragraph. Blank text yields an empty paragraph.
    pub fn paragraph(text: &str) -> Self {
        let inline = if text.is_empty() {
            Vec::new()
        } else {
            vec![RichTextNode {
                kind: "text".to_string(),
                text: Some(text.to_string()),
                content: None,
            }]
        };
        Self {
            kind: "doc".to_string(),
            version: 1,
            content: vec![RichTextNode {
                kind: "paragraph".to_string(),
                text: None,
                content: Some(inline),
            }],
        }
    }
}

/// Successful create-issue response.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateIssueResponse {
    pub key: String,
}

/// Error body returned by the issue tracker on a failed request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueErrorBody {
    #[serde(default)]
    pub error_messages: Vec<String>,
    #[serde(default)]
    pub errors: serde_json::Map<String, serde_json::Value>,
}

impl IssueErrorBody {
    /// Human-readable message: error messages joined, else the per-field
    /// errors as JSON, else a generic fallback.
    pub fn message(&self) -> String {
        if !self.error_messages.is_empty() {
            return self.error_messages.join(", ");
        }
        if !self.errors.is_empty() {
            return serde_json::Value::Object(self.errors.clone()).to_string();
        }
        "Unknown error".to_string()
    }
}

/// A created issue with its browse link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedIssue {
    pub key: String,
    pub url: String,
}

impl CreatedIssue {
    pub fn new(domain: &str, key: String) -> Self {
        let url = format!("https://{domain}/browse/{key}");
        Self { key, url }
    }
}

/// Field metadata for one issue type's create screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMeta {
    pub field_id: String,
    pub name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub schema: Option<FieldSchema>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    #[serde(rename = "type")]
    pub kind: String,
}

/// One page of the field metadata endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldMetaPage {
    #[serde(default, alias = "values")]
    pub fields: Vec<FieldMeta>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraph_document_shape() {
        let doc = serde_json::to_value(RichTextDocument::paragraph("Printer is down")).unwrap();
        assert_eq!(
            doc,
            serde_json::json!({
                "type": "doc",
                "version": 1,
                "content": [{
                    "type": "paragraph",
                    "content": [{"type": "text", "text": "Printer is down"}]
                }]
            })
        );
    }

    #[test]
    fn test_blank_paragraph_has_empty_content() {
        let doc = serde_json::to_value(RichTextDocument::paragraph("")).unwrap();
        assert_eq!(doc["content"][0]["content"], serde_json::json!([]));
    }

    #[test]
    fn test_error_body_prefers_error_messages() {
        let body: IssueErrorBody = serde_json::from_str(
            r#"{"errorMessages": ["first", "second"], "errors": {"summary": "required"}}"#,
        )
        .unwrap();
        assert_eq!(body.message(), "first, second");
    }

    #[test]
    fn test_error_body_falls_back_to_field_errors() {
        let body: IssueErrorBody =
            serde_json::from_str(r#"{"errorMessages": [], "errors": {"summary": "required"}}"#)
                .unwrap();
        assert_eq!(body.message(), r#"{"summary":"required"}"#);
        assert_eq!(IssueErrorBody::default().message(), "Unknown error");
    }

    #[test]
    fn test_created_issue_url() {
        let issue = CreatedIssue::new("acme.atlassian.net", "OPS-12".to_string());
        assert_eq!(issue.url, "https://acme.atlassian.net/browse/OPS-12");
    }

    #[test]
    fn test_field_meta_page_accepts_values_alias() {
        let page: FieldMetaPage = serde_json::from_str(
            r#"{"values": [{
                "fieldId": "customfield_10010",
                "name": "Site",
                "required": true,
                "schema": {"type": "option"}
            }]}"#,
        )
        .unwrap();
        assert_eq!(page.fields.len(), 1);
        assert_eq!(page.fields[0].field_id, "customfield_10010");
        assert!(page.fields[0].required);
    }
}
