use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

pub const DEFAULT_NAME_FIELD: &str = "__name";

/// Per-record options as declared. `None` inherits from the parent record,
/// or falls back to the default when there is no parent.
///
/// ```json
/// { "name_field": "kind", "include_defaults_in_output": true, "exclusions": ["cache"] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordOptions {
    pub name_field: Option<String>,
    pub name_field_required: Option<bool>,
    pub include_name_in_output: Option<bool>,
    pub include_defaults_in_output: Option<bool>,
    pub allow_null_output: Option<bool>,
    /// Added to the parent's exclusions.
    pub exclusions: Vec<String>,
    /// Never inherited; defaults to the record name.
    pub identity: Option<JsonValue>,
}

/// Options after inheritance, as a built schema uses them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedOptions {
    pub name_field: String,
    pub name_field_required: bool,
    pub include_name_in_output: bool,
    pub include_defaults_in_output: bool,
    pub allow_null_output: bool,
    pub exclusions: Vec<String>,
}

impl Default for ResolvedOptions {
    fn default() -> Self {
        Self {
            name_field: DEFAULT_NAME_FIELD.to_string(),
            name_field_required: true,
            include_name_in_output: true,
            include_defaults_in_output: false,
            allow_null_output: false,
            exclusions: Vec::new(),
        }
    }
}

impl ResolvedOptions {
    pub(crate) fn resolve(parent: Option<&ResolvedOptions>, own: &RecordOptions) -> Self {
        let base = parent.cloned().unwrap_or_default();
        let mut exclusions = base.exclusions;
        for field in &own.exclusions {
            if !exclusions.contains(field) {
                exclusions.push(field.clone());
            }
        }
        Self {
            name_field: own.name_field.clone().unwrap_or(base.name_field),
            name_field_required: own.name_field_required.unwrap_or(base.name_field_required),
            include_name_in_output: own.include_name_in_output.unwrap_or(base.include_name_in_output),
            include_defaults_in_output: own
                .include_defaults_in_output
                .unwrap_or(base.include_defaults_in_output),
            allow_null_output: own.allow_null_output.unwrap_or(base.allow_null_output),
            exclusions,
        }
    }

    /// Keys that are never schema fields and are tolerated as extra input:
    /// `_`-prefixed names and exclusions.
    pub fn is_reserved(&self, key: &str) -> bool {
        key.starts_with('_') || self.exclusions.iter().any(|e| e == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_partial_documents() {
        let opts: RecordOptions = serde_json::from_value(json!({
            "name_field": "kind",
            "exclusions": ["cache"]
        }))
        .unwrap();
        assert_eq!(opts.name_field.as_deref(), Some("kind"));
        assert_eq!(opts.include_defaults_in_output, None);
        assert_eq!(opts.exclusions, vec!["cache".to_string()]);
    }

    #[test]
    fn inherits_everything_but_accumulates_exclusions() {
        let parent = ResolvedOptions::resolve(
            None,
            &RecordOptions {
                name_field: Some("kind".into()),
                allow_null_output: Some(true),
                exclusions: vec!["a".into()],
                ..Default::default()
            },
        );
        let child = ResolvedOptions::resolve(
            Some(&parent),
            &RecordOptions {
                include_defaults_in_output: Some(true),
                exclusions: vec!["b".into(), "a".into()],
                ..Default::default()
            },
        );
        assert_eq!(child.name_field, "kind");
        assert!(child.allow_null_output);
        assert!(child.include_defaults_in_output);
        assert!(child.name_field_required);
        assert_eq!(child.exclusions, vec!["a".to_string(), "b".to_string()]);
        assert!(child.is_reserved("_private") && child.is_reserved("b") && !child.is_reserved("c"));
    }
}
