//! The public, facet-agnostic template contract: binding a definition and
//! a key table into something that can render fields into a string
//! ([`Template::apply_fields`]) and recover fields from one
//! ([`Template::get_fields`]).

use crate::{
    definition,
    error::{DefinitionError, TemplateError},
    key::{Key, KeyDef, Value},
    parser,
    variation::{Part, Variation},
};
use indexmap::IndexMap;
use std::sync::Arc;

/// A bound definition: a name, a set of concrete [Variation]s (one per
/// optional-section combination, longest/most-inclusive first), and the
/// operations to render or invert it. [`crate::TemplatePath`] and
/// [`crate::TemplateString`] both wrap one of these, adding
/// platform/sentinel-prefix behavior on top.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    variations: Vec<Variation>,
}

impl Template {
    pub(crate) fn new(
        definition: &str,
        keys: &IndexMap<String, Arc<KeyDef>>,
        name: &str,
        prefix: &str,
    ) -> Result<Self, DefinitionError> {
        let variations = definition::expand_variations(definition)?
            .iter()
            .map(|def| Variation::new(def, keys, name, prefix))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name: name.to_string(),
            variations,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The most inclusive (first) variation's alias-normalised definition.
    pub fn definition(&self) -> &str {
        &self.variations[0].fixed
    }

    /// The most inclusive variation's key table.
    pub fn keys(&self) -> &IndexMap<String, Arc<KeyDef>> {
        &self.variations[0].named_keys
    }

    /// The variation with the fewest keys: the set of keys present in
    /// every variation of this template.
    fn required_keys(&self) -> &IndexMap<String, Arc<KeyDef>> {
        self.variations
            .iter()
            .map(|v| &v.named_keys)
            .min_by_key(|keys| keys.len())
            .expect("a template always has at least one variation")
    }

    /// Is `key_name` only present in some (not all) of this template's
    /// variations, i.e. does it live inside an optional `[...]` section?
    pub fn is_optional(&self, key_name: &str) -> bool {
        !self.required_keys().contains_key(key_name)
    }

    /// Keys this template needs that are absent from `fields`. When
    /// `skip_defaults` is set, keys with a configured default value are
    /// never reported as missing.
    pub fn missing_keys(
        &self,
        fields: &IndexMap<String, Value>,
        skip_defaults: bool,
    ) -> Vec<String> {
        missing_keys_in(fields, self.required_keys(), skip_defaults)
    }

    /// Render this template given field values, picking the first (most
    /// inclusive) variation whose required keys are all satisfied.
    pub fn apply_fields(
        &self,
        fields: &IndexMap<String, Value>,
    ) -> Result<String, TemplateError> {
        self.apply_fields_ignoring_types(fields, &[])
    }

    /// Like [`Self::apply_fields`], but keys named in `ignore_types` have
    /// their usual type check relaxed (see [`Key::str_from_value`]).
    pub fn apply_fields_ignoring_types(
        &self,
        fields: &IndexMap<String, Value>,
        ignore_types: &[String],
    ) -> Result<String, TemplateError> {
        let mut last_missing = Vec::new();
        let variation = self
            .variations
            .iter()
            .find(|variation| {
                last_missing =
                    missing_keys_in(fields, &variation.named_keys, true);
                last_missing.is_empty()
            })
            .ok_or_else(|| TemplateError::MissingFields {
                template: self.name.clone(),
                missing: last_missing.clone(),
            })?;

        render(&self.name, variation, fields, ignore_types)
    }

    /// Extract field values from `input`, trying each variation from most
    /// to least inclusive and returning the first unambiguous match.
    pub fn get_fields(
        &self,
        input: &str,
        skip_keys: &[String],
    ) -> Result<IndexMap<String, Value>, TemplateError> {
        let mut last = None;
        for variation in &self.variations {
            let outcome = parser::parse(input, &variation.parts, skip_keys);
            if outcome.error.is_none() && outcome.fully_resolved.len() == 1 {
                return Ok(outcome.fully_resolved.into_iter().next().unwrap());
            }
            last = Some(outcome);
        }

        match last {
            Some(outcome) if outcome.fully_resolved.len() > 1 => {
                Err(TemplateError::AmbiguousParse {
                    template: self.name.clone(),
                    input: input.to_string(),
                    candidates: outcome
                        .fully_resolved
                        .into_iter()
                        .map(|fields| fields.into_iter().collect())
                        .collect(),
                })
            }
            Some(outcome) => Err(TemplateError::ParseFailure {
                template: self.name.clone(),
                input: input.to_string(),
                reason: outcome
                    .error
                    .unwrap_or_else(|| "no match".to_string()),
            }),
            None => Err(TemplateError::ParseFailure {
                template: self.name.clone(),
                input: input.to_string(),
                reason: "template has no variations".to_string(),
            }),
        }
    }

    /// [`Self::get_fields`], returning `None` instead of an error, and
    /// additionally requiring that `required_fields` (if any) are present
    /// in the result with matching values.
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

fn missing_keys_in(
    fields: &IndexMap<String, Value>,
    keys: &IndexMap<String, Arc<KeyDef>>,
    skip_defaults: bool,
) -> Vec<String> {
    keys.values()
        .filter(|key| !skip_defaults || key.default_value().is_none())
        .map(|key| key.name().to_string())
        .filter(|name| !fields.contains_key(name))
        .collect()
}

/// Render one variation's `render_parts`, falling back to each key's
/// configured default when `fields` doesn't supply a value.
fn render(
    template_name: &str,
    variation: &Variation,
    fields: &IndexMap<String, Value>,
    ignore_types: &[String],
) -> Result<String, TemplateError> {
    let mut rendered = String::new();
    for part in &variation.render_parts {
        match part {
            Part::Literal(lit) => rendered.push_str(lit),
            Part::Key(key) => {
                let value = fields
                    .get(key.name())
                    .cloned()
                    .or_else(|| key.default_value())
                    .ok_or_else(|| TemplateError::MissingFields {
                        template: template_name.to_string(),
                        missing: vec![key.name().to_string()],
                    })?;
                let ignore_type =
                    ignore_types.iter().any(|name| name == key.name());
                let rendered_value = key
                    .str_from_value(&value, ignore_type)
                    .map_err(|source| TemplateError::Conversion {
                        key: key.name().to_string(),
                        source,
                    })?;
                rendered.push_str(&rendered_value);
            }
        }
    }
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{IntegerKey, StringKey};

    fn keys() -> IndexMap<String, Arc<KeyDef>> {
        let mut m = IndexMap::new();
        m.insert(
            "Shot".to_string(),
            Arc::new(KeyDef::String(StringKey {
                name: "Shot".into(),
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

    fn fields(pairs: &[(&str, Value)]) -> IndexMap<String, Value> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn applies_and_recovers_fields_round_trip() {
        let template = Template::new(
            "shots/{Shot}/work.v{version}.ma",
            &keys(),
            "shot_work",
            "",
        )
        .unwrap();

        let input_fields = fields(&[
            ("Shot", Value::String("010".into())),
            ("version", Value::Integer(3)),
        ]);
        let rendered = template.apply_fields(&input_fields).unwrap();
        assert_eq!(rendered, "shots/010/work.v003.ma");

        let recovered = template.get_fields(&rendered, &[]).unwrap();
        assert_eq!(recovered, input_fields);
    }

    #[test]
    fn optional_section_key_is_reported_optional() {
        let template =
            Template::new("{Shot}[_v{version}]", &keys(), "t", "").unwrap();
        assert!(!template.is_optional("Shot"));
        assert!(template.is_optional("version"));
    }

    #[test]
    fn missing_required_field_fails_apply() {
        let template =
            Template::new("{Shot}_v{version}.ma", &keys(), "t", "").unwrap();
        let err = template
            .apply_fields(&fields(&[("Shot", Value::String("010".into()))]))
            .unwrap_err();
        assert!(matches!(err, TemplateError::MissingFields { .. }));
    }

    #[test]
    fn unparsable_input_fails_get_fields() {
        let template =
            Template::new("{Shot}_v{version}.ma", &keys(), "t", "").unwrap();
        let err = template.get_fields("nope", &[]).unwrap_err();
        assert!(matches!(err, TemplateError::ParseFailure { .. }));
    }

    #[test]
    fn validate_checks_required_fields_match() {
        let template =
            Template::new("{Shot}_v{version}.ma", &keys(), "t", "").unwrap();
        let required =
            fields(&[("Shot", Value::String("020".into()))]);
        assert!(!template.validate("010_v003.ma", Some(&required), &[]));
        assert!(template.validate("020_v003.ma", Some(&required), &[]));
    }
}
