//! Error types for the template engine

use crate::key::Value;
use thiserror::Error;

/// Any error that can occur while constructing or evaluating a template.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// A definition's grammar is malformed, or refers to keys that don't
    /// exist / collide
    #[error(transparent)]
    Definition(#[from] DefinitionError),

    /// `apply` was called without values for one or more required keys
    #[error(
        "Missing required fields for template `{template}`: {missing:?}"
    )]
    MissingFields {
        template: String,
        missing: Vec<String>,
    },

    /// A key's `value_from_str`/`str_from_value` rejected a value
    #[error("Key `{key}`: {source}")]
    Conversion {
        key: String,
        #[source]
        source: ConversionError,
    },

    /// An input string did not fit any variation of a template
    #[error("Failed to parse `{input}` against template `{template}`: {reason}")]
    ParseFailure {
        template: String,
        input: String,
        reason: String,
    },

    /// More than one variation, or more than one branch of one variation,
    /// produced a distinct, fully-resolved field mapping
    #[error(
        "Ambiguous parse of `{input}` against template `{template}`: \
         found {} distinct solutions: {candidates:?}", candidates.len()
    )]
    AmbiguousParse {
        template: String,
        input: String,
        candidates: Vec<Vec<(String, Value)>>,
    },

    /// Loading `roots.yml` / the templates document failed
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// An error constructing a [Definition](crate::definition::Definition) or one
/// of its [Variation](crate::variation::Variation)s
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("Optional section `[{section}]` contains no key reference")]
    EmptyOptionalSection { section: String },

    #[error(
        "Square brackets are not allowed outside of optional sections \
         (in `{definition}`)"
    )]
    UnbalancedBrackets { definition: String },

    #[error(
        "Template `{template}` refers to key `{key_name}`, which does not \
         appear in the supplied key table"
    )]
    UnknownKey { template: String, key_name: String },

    #[error(
        "Template `{template}` uses two different keys both named `{key_name}`"
    )]
    DuplicateKeyName { template: String, key_name: String },
}

/// An error converting a value to or from its string representation
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("`{value}` does not satisfy the choices for this key: {choices:?}")]
    NotAChoice { value: String, choices: Vec<String> },

    #[error("`{value}` is shorter than the required length {length}")]
    TooShort { value: String, length: usize },

    #[error("`{value}` is not a valid integer")]
    NotAnInteger { value: String },

    #[error("`{value}` does not match the expected timestamp format `{format}`")]
    BadTimestamp { value: String, format: String },

    #[error(
        "Value `{value:?}` is not a {expected} value, and `ignore_type` was \
         not set"
    )]
    WrongType { value: Value, expected: &'static str },
}

/// An error loading `roots.yml` or a templates document
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("At least one storage root must be defined to use path templates")]
    NoRoots,

    #[error(
        "Storage root `{root_name}` is not defined for the current platform"
    )]
    UndefinedRoot { root_name: String },

    #[error(
        "Template `{template}` ({definition}) does not look like a path: a \
         valid path needs at least one `/`. Should this be a string \
         template instead?"
    )]
    NotAPath { template: String, definition: String },

    #[error(
        "Template `{template}` ({definition}) has no `root_name`, and no \
         default storage root is configured. Add a `root_name` or mark a \
         storage root as `default: true` in roots.yml"
    )]
    NoDefaultRoot { template: String, definition: String },

    #[error(
        "Duplicate template definitions detected for root `{root_name:?}`: \
         {templates:?} all define `{definition}`"
    )]
    DuplicateDefinition {
        root_name: Option<String>,
        definition: String,
        templates: Vec<String>,
    },

    #[error(
        "Template `{template}` has `validate_with: {validator}`, but \
         `{validator}` is not a known path template"
    )]
    UnknownValidator { template: String, validator: String },

    #[error(
        "Template name `{name}` is defined in both the `paths` and `strings` \
         sections"
    )]
    NameCollision { name: String },

    #[error("Template `{template}` is missing a `definition`")]
    MissingDefinition { template: String },

    #[error(transparent)]
    Definition(#[from] DefinitionError),
}
