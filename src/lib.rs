//! A bidirectional path/string template engine for a creative-production
//! pipeline toolkit: a declarative grammar binds a human-authored
//! definition such as `shots/{Sequence}/{Shot}/work/{name}.v{version}.ma`
//! to two operations, [`apply`](template::Template::apply_fields) (field
//! values in, a concrete string out) and
//! [`parse`](template::Template::get_fields) (a concrete string in, field
//! values out).
//!
//! [`path::TemplatePath`] and [`string::TemplateString`] are the two
//! concrete facets callers construct directly; [`config::load_templates`]
//! builds a whole set of both from a `roots.yml` document plus a templates
//! document, the way a pipeline's configuration layer would load them.
//!
//! This crate does no filesystem I/O, no network calls, and caches nothing
//! between calls; callers own reading YAML off disk (or wherever it lives)
//! and pass the text in.

pub mod config;
pub(crate) mod definition;
pub mod error;
pub mod key;
pub(crate) mod parser;
pub mod path;
pub mod string;
pub mod template;
pub(crate) mod variation;

pub use config::{Roots, Templates, load_templates};
pub use path::TemplatePath;
pub use string::TemplateString;
pub use template::Template;
