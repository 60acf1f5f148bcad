//! A [Template] representing a complete path on disk, rooted under a
//! per-platform storage location.

use crate::{
    error::{DefinitionError, TemplateError},
    key::{KeyDef, Value},
    template::Template,
};
use indexmap::IndexMap;
use std::{path::Path, sync::Arc};

/// `sys.platform`-style identifiers this crate recognises when resolving
/// a root for a non-default platform.
const WINDOWS: &str = "win32";

/// A [Template] rooted at an absolute path on disk. The definition is
/// always written with forward slashes; rendering joins onto a
/// platform-appropriate root and, for non-native platforms, converts the
/// separator.
#[derive(Debug, Clone)]
pub struct TemplatePath {
    template: Template,
    root_path: String,
    per_platform_roots: IndexMap<String, String>,
}

impl TemplatePath {
    pub(crate) fn new(
        definition: &str,
        keys: &IndexMap<String, Arc<KeyDef>>,
        root_path: &str,
        name: &str,
        per_platform_roots: IndexMap<String, String>,
    ) -> Result<Self, DefinitionError> {
        Ok(Self {
            template: Template::new(definition, keys, name, root_path)?,
            root_path: root_path.to_string(),
            per_platform_roots,
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

    pub fn root_path(&self) -> &str {
        &self.root_path
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

    pub fn get_fields(
        &self,
        input_path: &str,
        skip_keys: &[String],
    ) -> Result<IndexMap<String, Value>, TemplateError> {
        self.template.get_fields(input_path, skip_keys)
    }

    pub fn validate_and_get_fields(
        &self,
        input_path: &str,
        required_fields: Option<&IndexMap<String, Value>>,
        skip_keys: &[String],
    ) -> Option<IndexMap<String, Value>> {
        self.template
            .validate_and_get_fields(input_path, required_fields, skip_keys)
    }

    pub fn validate(
        &self,
        input_path: &str,
        required_fields: Option<&IndexMap<String, Value>>,
        skip_keys: &[String],
    ) -> bool {
        self.template.validate(input_path, required_fields, skip_keys)
    }

    /// The directory-stripped definition, as its own `TemplatePath` over
    /// the same keys and roots, or `None` if the definition has no
    /// directory component left to strip.
    pub fn parent(&self) -> Option<Result<Self, DefinitionError>> {
        let definition = self.definition();
        let parent = match definition.rsplit_once('/') {
            Some((dir, _)) if !dir.is_empty() => dir,
            _ => return None,
        };
        Some(Self::new(
            parent,
            self.template.keys(),
            &self.root_path,
            self.name(),
            self.per_platform_roots.clone(),
        ))
    }

    /// Render this path for the current platform.
    pub fn apply_fields(
        &self,
        fields: &IndexMap<String, Value>,
    ) -> Result<String, TemplateError> {
        let relative = self.template.apply_fields(fields)?;
        Ok(join_native(&self.root_path, &relative))
    }

    /// Render this path as it would look on another platform. `platform`
    /// follows `sys.platform` convention: `"win32"`, `"darwin"`, or any
    /// string containing `"linux"`.
    pub fn apply_fields_for_platform(
        &self,
        fields: &IndexMap<String, Value>,
        platform: &str,
    ) -> Result<String, TemplateError> {
        let relative = self.template.apply_fields(fields)?;
        let root = self.per_platform_roots.get(platform).ok_or_else(|| {
            TemplateError::ParseFailure {
                template: self.name().to_string(),
                input: platform.to_string(),
                reason: format!(
                    "no storage root is configured for platform `{platform}`"
                ),
            }
        })?;

        if platform == WINDOWS {
            if relative.is_empty() {
                Ok(root.clone())
            } else {
                Ok(format!("{root}\\{}", relative.replace('/', "\\")))
            }
        } else if platform == "darwin" || platform.contains("linux") {
            if relative.is_empty() {
                Ok(root.clone())
            } else {
                Ok(format!("{root}/{relative}"))
            }
        } else {
            Err(TemplateError::ParseFailure {
                template: self.name().to_string(),
                input: platform.to_string(),
                reason: format!("unsupported platform `{platform}`"),
            })
        }
    }
}

fn join_native(root: &str, relative: &str) -> String {
    if relative.is_empty() {
        return root.to_string();
    }
    Path::new(root).join(relative).to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::StringKey;

    fn keys() -> IndexMap<String, Arc<KeyDef>> {
        let mut m = IndexMap::new();
        m.insert(
            "Shot".to_string(),
            Arc::new(KeyDef::String(StringKey {
                name: "Shot".into(),
                ..Default::default()
            })),
        );
        m
    }

    fn roots() -> IndexMap<String, String> {
        let mut r = IndexMap::new();
        r.insert("linux2".to_string(), "/studio".to_string());
        r.insert("win32".to_string(), "Z:\\studio".to_string());
        r
    }

    #[test]
    fn applies_under_root() {
        let template = TemplatePath::new(
            "shots/{Shot}/work",
            &keys(),
            "/studio",
            "t",
            roots(),
        )
        .unwrap();
        let mut fields = IndexMap::new();
        fields.insert("Shot".to_string(), Value::String("010".into()));
        assert_eq!(
            template.apply_fields(&fields).unwrap(),
            "/studio/shots/010/work"
        );
    }

    #[test]
    fn applies_for_windows_platform() {
        let template = TemplatePath::new(
            "shots/{Shot}/work",
            &keys(),
            "/studio",
            "t",
            roots(),
        )
        .unwrap();
        let mut fields = IndexMap::new();
        fields.insert("Shot".to_string(), Value::String("010".into()));
        assert_eq!(
            template
                .apply_fields_for_platform(&fields, "win32")
                .unwrap(),
            "Z:\\studio\\shots\\010\\work"
        );
    }

    #[test]
    fn parent_strips_last_component() {
        let template = TemplatePath::new(
            "shots/{Shot}/work",
            &keys(),
            "/studio",
            "t",
            roots(),
        )
        .unwrap();
        let parent = template.parent().unwrap().unwrap();
        assert_eq!(parent.definition(), "shots/{Shot}");
        assert!(parent.parent().unwrap().unwrap().parent().is_none());
    }

}
