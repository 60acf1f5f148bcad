//! A [Template] representing a plain string rather than a path on disk,
//! e.g. a display label built from a handful of fields.

use crate::{
    error::{DefinitionError, TemplateError},
    key::{KeyDef, Value},
    path::TemplatePath,
    template::Template,
};
use indexmap::IndexMap;
use std::sync::Arc;

/// Sentinel prefix joined onto a string template's definition when
/// computing its `parts`/`static_tokens`, mirroring the original
/// implementation's use of a project-root-shaped prefix so that a string
/// template's parser machinery matches a path template's.
const SENTINEL_PREFIX: &str = "@";

/// A [Template] with no notion of an on-disk root. Optionally carries a
/// reference to a [`TemplatePath`] that callers can use to additionally
/// validate a string's fields against a path template's own constraints.
#[derive(Debug, Clone)]
pub struct TemplateString {
    template: Template,
    validate_with: Option<Arc<TemplatePath>>,
}

impl TemplateString {
    pub(crate) fn new(
        definition: &str,
        keys: &IndexMap<String, Arc<KeyDef>>,
        name: &str,
        validate_with: Option<Arc<TemplatePath>>,
    ) -> Result<Self, DefinitionError> {
        Ok(Self {
            template: Template::new(definition, keys, name, SENTINEL_PREFIX)?,
            validate_with,
        })
    }

    pub fn name(&self) -> &str {
        self.template.name()
    }

    pub fn definition(&self) -> &str {
        self.template.definition()
    }

    pub fn keys(&self) -> &IndexMap<String, Arc<KeyDef>> {
        self.template.keys()
    }

    /// The path template this string should additionally validate
    /// against, if one was configured.
    pub fn validate_with(&self) -> Option<&Arc<TemplatePath>> {
        self.validate_with.as_ref()
    }

    pub fn is_optional(&self, key_name: &str) -> bool {
        self.template.is_optional(key_name)
    }

    pub fn missing_keys(
        &self,
        fields: &IndexMap<String, Value>,
        skip_defaults: bool,
    ) -> Vec<String> {
        self.template.missing_keys(fields, skip_defaults)
    }

    pub fn apply_fields(
        &self,
        fields: &IndexMap<String, Value>,
    ) -> Result<String, TemplateError> {
        self.template.apply_fields(fields)
    }

    /// Strings have no on-disk parent; always `None`.
    pub fn parent(&self) -> Option<TemplateString> {
        None
    }

    pub fn get_fields(
        &self,
        input: &str,
        skip_keys: &[String],
    ) -> Result<IndexMap<String, Value>, TemplateError> {
        // The sentinel prefix was baked into `parts` at construction time
        // (matching a path template's root-anchored parsing), so it has
        // to be present in the input being parsed too.
        let prefixed = format!("{SENTINEL_PREFIX}/{input}");
        self.template.get_fields(&prefixed, skip_keys)
    }

    pub fn validate_and_get_fields(
        &self,
        input: &str,
        required_fields: Option<&IndexMap<String, Value>>,
        skip_keys: &[String],
    ) -> Option<IndexMap<String, Value>> {
        let fields = self.get_fields(input, skip_keys).ok()?;
        if let Some(required) = required_fields {
            for (name, value) in required {
                if skip_keys.iter().any(|k| k == name) {
                    continue;
                }
                if fields.get(name) != Some(value) {
                    return None;
                }
            }
        }
        Some(fields)
    }

    pub fn validate(
        &self,
        input: &str,
        required_fields: Option<&IndexMap<String, Value>>,
        skip_keys: &[String],
    ) -> bool {
        self.validate_and_get_fields(input, required_fields, skip_keys)
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{IntegerKey, StringKey};

    fn keys() -> IndexMap<String, Arc<KeyDef>> {
        let mut m = IndexMap::new();
        m.insert(
            "name".to_string(),
            Arc::new(KeyDef::String(StringKey {
                name: "name".into(),
                ..Default::default()
            })),
        );
        m.insert(
            "version".to_string(),
            Arc::new(KeyDef::Integer(IntegerKey {
                name: "version".into(),
                length: Some(3),
                default: None,
            })),
        );
        m
    }

    #[test]
    fn applies_and_recovers_fields_round_trip() {
        let template = TemplateString::new(
            "Maya Scene {name}, v{version}",
            &keys(),
            "maya_label",
            None,
        )
        .unwrap();

        let mut input_fields = IndexMap::new();
        input_fields.insert("name".to_string(), Value::String("henry".into()));
        input_fields.insert("version".to_string(), Value::Integer(3));

        let rendered = template.apply_fields(&input_fields).unwrap();
        assert_eq!(rendered, "Maya Scene henry, v003");

        let recovered = template.get_fields(&rendered, &[]).unwrap();
        assert_eq!(recovered, input_fields);
    }

    #[test]
    fn has_no_parent() {
        let template =
            TemplateString::new("{name}", &keys(), "t", None).unwrap();
        assert!(template.parent().is_none());
    }
}
