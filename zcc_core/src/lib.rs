//! Resolution engine for Zowe configuration.
//!
//! A deployment's configuration starts as one or more YAML/JSON documents
//! joined with `@include`, is completed with the defaults shipped in each
//! component manifest, and is then specialised per high-availability
//! instance. The engine renders the result as per-component JSON, as a
//! composed YAML document and as legacy flat `KEY=value` environment files,
//! and converts those flat files back into a tree.
//!
//! Entry points by stage:
//!
//! - [`file::resolve`] composes a document from its includes.
//! - [`components::discover_components`] and [`components::apply_defaults`]
//!   fill in manifest defaults.
//! - [`instance::resolve_instance`] produces the effective tree of one
//!   instance.
//! - [`mapping::to_tree`] and [`mapping::to_flat`] translate between the tree
//!   and the flat namespace.
//! - [`workspace::convert`] drives the whole pipeline into a workspace.
//! - [`editor::YamlDocument`] edits YAML files without losing comments.
//!
//! Every operation takes a [`Context`] that decides whether notices are shown
//! and records what was reported.

pub mod components;
pub mod diagnostics;
pub mod editor;
pub mod env_file;
mod error;
pub mod file;
mod flat;
pub mod instance;
pub mod mapping;
mod result_ext;
pub mod tree;
pub mod workspace;

pub use diagnostics::{Context, Diagnostic, Severity};
pub use error::{ZccError, ZccResult};
pub use flat::FlatNamespace;
pub use result_ext::ZccResultExt;
