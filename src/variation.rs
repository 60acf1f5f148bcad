//! A single concrete definition, with brackets already resolved.

use crate::{
    definition::{self, Token},
    error::DefinitionError,
    key::{Key, KeyDef},
};
use indexmap::IndexMap;
use std::{path::PathBuf, sync::Arc};

/// A literal substring, or a reference to a resolved [`KeyDef`]
#[derive(Debug, Clone)]
pub(crate) enum Part {
    Literal(String),
    Key(Arc<KeyDef>),
}

/// One concrete definition obtained by choosing, per optional section,
/// include-or-omit. `original` is the source form, `fixed` is
/// alias-normalised, `expanded` additionally carries the platform/sentinel
/// prefix, and `parts`/`static_tokens` (both derived from `expanded`) are
/// what the [parser](crate::parser) anchors against.
#[derive(Debug, Clone)]
#[allow(dead_code)] // full attribute set kept for Debug/introspection parity with the data model
pub(crate) struct Variation {
    pub original: String,
    pub fixed: String,
    pub expanded: String,
    /// `fixed` with each `{name}` replaced by a `{}` placeholder. Kept for
    /// display/debugging parity with the source format; rendering itself is
    /// done directly off `render_parts`, since Rust has no equivalent of
    /// Python's `%(name)s` dict-formatting.
    pub cleaned: String,
    /// Tokens of `expanded`, used by the parser to anchor against an input
    /// string that includes the root prefix.
    pub parts: Vec<Part>,
    /// Tokens of `fixed` (no prefix), used to render output on apply.
    pub render_parts: Vec<Part>,
    pub ordered_keys: Vec<Arc<KeyDef>>,
    pub named_keys: IndexMap<String, Arc<KeyDef>>,
    pub static_tokens: Vec<String>,
}

impl Variation {
    /// Build a variation from one already-bracket-resolved definition
    /// string, an alias table of key names to [`KeyDef`]s, and a prefix to
    /// join onto the front (a root path, or a sentinel for string
    /// templates).
    pub(crate) fn new(
        original: &str,
        keys: &IndexMap<String, Arc<KeyDef>>,
        template_name: &str,
        prefix: &str,
    ) -> Result<Self, DefinitionError> {
        let mut fixed = String::new();
        let mut render_parts = Vec::new();
        let mut ordered_keys = Vec::new();
        let mut named_keys = IndexMap::new();

        for token in definition::scan_tokens(original) {
            match token {
                Token::Literal(lit) => {
                    fixed.push_str(&lit);
                    render_parts.push(Part::Literal(lit));
                }
                Token::KeyRef(alias) => {
                    let key = keys.get(&alias).ok_or_else(|| {
                        DefinitionError::UnknownKey {
                            template: template_name.to_string(),
                            key_name: alias.clone(),
                        }
                    })?;
                    let canonical = key.name();
                    if let Some(existing) = named_keys.get(canonical)
                        && existing != key
                    {
                        return Err(DefinitionError::DuplicateKeyName {
                            template: template_name.to_string(),
                            key_name: canonical.to_string(),
                        });
                    }
                    named_keys
                        .insert(canonical.to_string(), Arc::clone(key));
                    fixed.push('{');
                    fixed.push_str(canonical);
                    fixed.push('}');
                    ordered_keys.push(Arc::clone(key));
                    render_parts.push(Part::Key(Arc::clone(key)));
                }
            }
        }

        let expanded = join_prefix(prefix, &fixed);

        let mut parts = Vec::new();
        for token in definition::scan_tokens(&expanded) {
            match token {
                Token::Literal(lit) => parts.push(Part::Literal(lit)),
                Token::KeyRef(name) => {
                    let key = named_keys.get(&name).unwrap_or_else(|| {
                        panic!(
                            "key `{name}` resolved in fixed form but \
                             missing from named_keys"
                        )
                    });
                    parts.push(Part::Key(Arc::clone(key)));
                }
            }
        }

        let static_tokens = parts
            .iter()
            .filter_map(|part| match part {
                Part::Literal(lit) if !lit.is_empty() => {
                    Some(lit.to_lowercase())
                }
                _ => None,
            })
            .collect();

        let cleaned = render_parts
            .iter()
            .map(|part| match part {
                Part::Literal(lit) => lit.clone(),
                Part::Key(_) => "{}".to_string(),
            })
            .collect();

        Ok(Self {
            original: original.to_string(),
            fixed,
            expanded,
            cleaned,
            parts,
            render_parts,
            ordered_keys,
            named_keys,
            static_tokens,
        })
    }
}

/// Join a prefix (root path, or sentinel) onto a relative definition, the
/// way `os.path.join` does: an empty `fixed` yields the prefix unchanged.
fn join_prefix(prefix: &str, fixed: &str) -> String {
    if fixed.is_empty() {
        return prefix.to_string();
    }
    if prefix.is_empty() {
        return fixed.to_string();
    }
    PathBuf::from(prefix)
        .join(fixed)
        .to_string_lossy()
        .into_owned()
}
