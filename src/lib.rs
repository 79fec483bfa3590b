//! Reference Page Generation Library
//!
//! This library denormalizes a small RDF knowledge graph into grouped,
//! alphabetized collections of reference entries, and renders them through
//! Jinja2 templates into Markdown pages for a documentation site.
//!
//! # Overview
//!
//! Three reference types are supported:
//!
//! - **Bibliography**: entries keyed by citekey, with their authors and
//!   publisher inlined as full attribute records
//! - **Glossary**: terms keyed by label, with synonym redirects, related
//!   resources, hypernym links and citation links into the bibliography
//! - **API docs**: classes, functions and type aliases of a package, read
//!   from a manifest, with docstrings checked against their signatures
//!
//! Each graph-backed reference is built by:
//!
//! 1. Querying the graph for entries and their relations
//! 2. Flattening the graph into abbreviated attribute records
//! 3. Replacing each related identifier with the record it names
//! 4. Sorting the entries and grouping them by initial letter
//!
//! Templates never look identifiers up: every relation a template needs is
//! already inlined in the entry.
//!
//! # Usage
//!
//! ```ignore
//! use mkrefs::{denorm_biblio_groups, render_reference, BiblioQueries, KnowledgeGraph, LetterCase};
//!
//! let graph = KnowledgeGraph::load(Path::new("docs/biblio.ttl"))?;
//! let groups = denorm_biblio_groups(&graph, &queries, LetterCase::Upper)?;
//! render_reference(
//!     Path::new("docs/biblio.template"),
//!     Path::new("docs/biblio.md"),
//!     &groups,
//! )?;
//! ```

pub mod apidocs;
pub mod biblio;
pub mod config;
pub mod denorm;
pub mod docstring;
pub mod error;
pub mod glossary;
pub mod graph;
pub mod group;
pub mod iri;
pub mod pipeline;
pub mod render;
pub mod vocab;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use crate::apidocs::{document_package, load_manifest, PackageDoc, PackageManifest};
pub use crate::biblio::{denorm_biblio_groups, BiblioEntry, BiblioQueries};
pub use crate::config::{MkRefsConfig, Settings};
pub use crate::denorm::{denorm_entity, get_item_list, EntityMap, RelationList};
pub use crate::error::MkRefsError;
pub use crate::glossary::{denorm_glossary_groups, GlossaryItem, GlossaryQueries};
pub use crate::graph::{flatten_graph, FlatGraph, KnowledgeGraph, KnowledgeSource, QueryTable};
pub use crate::group::{group_by_initial, GroupCollection, LetterCase};
pub use crate::iri::{abbrev_iri, abbrev_key};
pub use crate::pipeline::{PipelineContext, RefKind, RenderOutcome};
pub use crate::render::{render_reference, render_template};
