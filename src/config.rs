//! Loading a `roots.yml` document and a templates document into ready
//! [`TemplatePath`]/[`TemplateString`] instances.
//!
//! Both inputs are accepted as already-read YAML text (or an equivalent
//! `serde_yaml::Value`), never as a file path: this crate does no
//! filesystem I/O of its own, so callers decide how the documents reach
//! it (a file on disk, a config-service response, a test fixture).

use crate::{
    error::ConfigError,
    key::KeyDef,
    path::TemplatePath,
    string::TemplateString,
};
use indexmap::IndexMap;
use serde::Deserialize;
use std::sync::Arc;

/// The conventional name for a project's primary storage root.
pub const PRIMARY_STORAGE_NAME: &str = "primary";

/// One storage root: a path per supported platform, with an optional
/// flag marking it as the project's default root.
#[derive(Debug, Clone, Deserialize)]
pub struct RootEntry {
    #[serde(default)]
    pub default: bool,
    #[serde(flatten)]
    pub platforms: IndexMap<String, String>,
}

/// A parsed `roots.yml`: every configured storage root, and which one
/// (if any) is marked as the default.
#[derive(Debug, Clone, Default)]
pub struct Roots {
    pub entries: IndexMap<String, RootEntry>,
    pub default_root: Option<String>,
}

impl Roots {
    pub fn load(yaml: &str) -> Result<Self, ConfigError> {
        let entries: IndexMap<String, RootEntry> = if yaml.trim().is_empty() {
            IndexMap::new()
        } else {
            serde_yaml::from_str(yaml)?
        };

        let mut default_root = None;
        for (name, entry) in &entries {
            if entry.default {
                if let Some(existing) = &default_root {
                    tracing::warn!(
                        target: "sgtk_template::config",
                        existing, candidate = name.as_str(),
                        "multiple storage roots flagged default; keeping the first",
                    );
                } else {
                    default_root = Some(name.clone());
                }
            }
        }

        Ok(Self {
            entries,
            default_root,
        })
    }

    fn root_path(&self, root_name: &str, platform: &str) -> Option<&str> {
        self.entries
            .get(root_name)
            .and_then(|entry| entry.platforms.get(platform))
            .map(String::as_str)
    }
}

/// One entry under `paths`/`strings`: either a bare definition string, or
/// a map with `definition` plus optional `root_name`/`validate_with`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum TemplateEntry {
    Bare(String),
    Detailed(DetailedEntry),
}

#[derive(Debug, Clone, Default, Deserialize)]
struct DetailedEntry {
    definition: Option<String>,
    #[serde(default)]
    root_name: Option<String>,
    #[serde(default)]
    validate_with: Option<String>,
}

impl TemplateEntry {
    fn into_parts(
        self,
        template_name: &str,
    ) -> Result<(String, Option<String>, Option<String>), ConfigError> {
        match self {
            Self::Bare(definition) => Ok((definition, None, None)),
            Self::Detailed(entry) => {
                let definition = entry.definition.ok_or_else(|| {
                    ConfigError::MissingDefinition {
                        template: template_name.to_string(),
                    }
                })?;
                Ok((definition, entry.root_name, entry.validate_with))
            }
        }
    }
}

/// The `keys`/`paths`/`strings` document, as written in a templates YAML
/// file.
#[derive(Debug, Clone, Default, Deserialize)]
struct TemplatesDocument {
    #[serde(default)]
    keys: IndexMap<String, KeyDef>,
    #[serde(default)]
    paths: IndexMap<String, TemplateEntry>,
    #[serde(default)]
    strings: IndexMap<String, TemplateEntry>,
}

/// A fully-resolved set of templates and the key table they share.
#[derive(Debug, Clone, Default)]
pub struct Templates {
    pub keys: IndexMap<String, Arc<KeyDef>>,
    pub paths: IndexMap<String, TemplatePath>,
    pub strings: IndexMap<String, TemplateString>,
}

fn current_platform_id() -> &'static str {
    if cfg!(windows) {
        "win32"
    } else if cfg!(target_os = "macos") {
        "darwin"
    } else {
        "linux2"
    }
}

/// Parse `roots.yml` and a templates document into a ready [`Templates`].
/// Mirrors the original `read_templates`: keys are parsed first, then
/// paths (each resolved against `roots` for the current platform), then
/// strings (each optionally cross-referencing an already-built path
/// template via `validate_with`), with duplicate/collision checks
/// matching `_process_templates_data`.
pub fn load_templates(
    roots_yaml: &str,
    templates_yaml: &str,
) -> Result<Templates, ConfigError> {
    let roots = Roots::load(roots_yaml)?;
    let document: TemplatesDocument = if templates_yaml.trim().is_empty() {
        TemplatesDocument::default()
    } else {
        serde_yaml::from_str(templates_yaml)?
    };

    let keys: IndexMap<String, Arc<KeyDef>> = document
        .keys
        .into_iter()
        .map(|(name, mut key)| {
            key.set_name(name.clone());
            (name, Arc::new(key))
        })
        .collect();

    if !document.paths.is_empty() && roots.entries.is_empty() {
        return Err(ConfigError::NoRoots);
    }

    let mut paths = IndexMap::new();
    let mut seen_definitions: IndexMap<(Option<String>, String), Vec<String>> =
        IndexMap::new();

    for (template_name, entry) in document.paths {
        let (definition, root_name, _) = entry.into_parts(&template_name)?;

        if !definition.contains('/') {
            return Err(ConfigError::NotAPath {
                template: template_name,
                definition,
            });
        }

        let root_name = root_name.or_else(|| roots.default_root.clone()).ok_or_else(|| {
            ConfigError::NoDefaultRoot {
                template: template_name.clone(),
                definition: definition.clone(),
            }
        })?;

        seen_definitions
            .entry((Some(root_name.clone()), definition.clone()))
            .or_default()
            .push(template_name.clone());

        let root_path = roots
            .root_path(&root_name, current_platform_id())
            .ok_or_else(|| ConfigError::UndefinedRoot {
                root_name: root_name.clone(),
            })?
            .to_string();

        let per_platform_roots = roots
            .entries
            .get(&root_name)
            .map(|entry| entry.platforms.clone())
            .unwrap_or_default();

        let template = TemplatePath::new(
            &definition,
            &keys,
            &root_path,
            &template_name,
            per_platform_roots,
        )
        .map_err(|source| {
            tracing::error!(target: "sgtk_template::config", template = %template_name, %source, "failed to build path template");
            ConfigError::from(source)
        })?;
        paths.insert(template_name, template);
    }

    for ((root_name, definition), templates) in &seen_definitions {
        if templates.len() > 1 {
            return Err(ConfigError::DuplicateDefinition {
                root_name: root_name.clone(),
                definition: definition.clone(),
                templates: templates.clone(),
            });
        }
    }

    let mut strings = IndexMap::new();
    for (template_name, entry) in document.strings {
        let (definition, _, validator_name) = entry.into_parts(&template_name)?;

        let validate_with = match validator_name {
            Some(name) => {
                let validator = paths.get(&name).ok_or_else(|| {
                    ConfigError::UnknownValidator {
                        template: template_name.clone(),
                        validator: name.clone(),
                    }
                })?;
                Some(Arc::new(validator.clone()))
            }
            None => None,
        };

        if paths.contains_key(&template_name) {
            return Err(ConfigError::NameCollision {
                name: template_name,
            });
        }

        let template = TemplateString::new(&definition, &keys, &template_name, validate_with)
            .map_err(|source| {
                tracing::error!(target: "sgtk_template::config", template = %template_name, %source, "failed to build string template");
                ConfigError::from(source)
            })?;
        strings.insert(template_name, template);
    }

    Ok(Templates {
        keys,
        paths,
        strings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Value;
    use pretty_assertions::assert_eq;

    const ROOTS: &str = r"
primary:
  linux2: /studio
  win32: Z:\studio
  darwin: /Volumes/studio
  default: true
";

    const TEMPLATES: &str = r#"
keys:
  Shot:
    type: string
  version:
    type: integer
    length: 3
paths:
  shot_work:
    definition: shots/{Shot}/work.v{version}.ma
strings:
  maya_label:
    definition: "Maya Scene {Shot}, v{version}"
    validate_with: shot_work
"#;

    #[test]
    fn loads_paths_and_strings() {
        let templates = load_templates(ROOTS, TEMPLATES).unwrap();
        assert!(templates.paths.contains_key("shot_work"));
        assert!(templates.strings.contains_key("maya_label"));

        let path = &templates.paths["shot_work"];
        assert_eq!(path.root_path(), "/studio");

        let string = &templates.strings["maya_label"];
        assert!(string.validate_with().is_some());
    }

    #[test]
    fn path_without_slash_is_rejected() {
        let templates = "paths:\n  bad:\n    definition: \"no_slash_here\"\n";
        let err = load_templates(ROOTS, templates).unwrap_err();
        assert!(matches!(err, ConfigError::NotAPath { .. }));
    }

    #[test]
    fn missing_default_root_without_root_name_is_rejected() {
        let roots = "primary:\n  linux2: /studio\n";
        let templates = "paths:\n  shot_work:\n    definition: \"shots/{Shot}\"\n";
        let err = load_templates(roots, templates).unwrap_err();
        assert!(matches!(err, ConfigError::NoDefaultRoot { .. }));
    }

    #[test]
    fn unknown_validator_is_rejected() {
        let templates = r#"
keys:
  Shot:
    type: string
paths:
  shot_work:
    definition: shots/{Shot}
strings:
  label:
    definition: "{Shot}"
    validate_with: nope
"#;
        let err = load_templates(ROOTS, templates).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownValidator { .. }));
    }

    #[test]
    fn name_collision_between_paths_and_strings_is_rejected() {
        let templates = r#"
keys:
  Shot:
    type: string
paths:
  shared:
    definition: shots/{Shot}
strings:
  shared:
    definition: "{Shot}"
"#;
        let err = load_templates(ROOTS, templates).unwrap_err();
        assert!(matches!(err, ConfigError::NameCollision { .. }));
    }

    #[test]
    fn duplicate_definitions_under_same_root_are_rejected() {
        let templates = r"
keys:
  Shot:
    type: string
paths:
  a:
    definition: shots/{Shot}
  b:
    definition: shots/{Shot}
";
        let err = load_templates(ROOTS, templates).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateDefinition { .. }));
    }

    #[test]
    fn loaded_path_template_renders_and_parses() {
        let templates = load_templates(ROOTS, TEMPLATES).unwrap();
        let path = &templates.paths["shot_work"];
        let mut fields = IndexMap::new();
        fields.insert("Shot".to_string(), Value::String("010".into()));
        fields.insert("version".to_string(), Value::Integer(3));
        let rendered = path.apply_fields(&fields).unwrap();
        assert_eq!(rendered, "/studio/shots/010/work.v003.ma");
        assert_eq!(path.get_fields(&rendered, &[]).unwrap(), fields);
    }
}
