//! Reference page pipelines
//!
//! A [`PipelineContext`] holds the validated settings and the graphs loaded
//! so far. Each graph file is parsed once and shared by every reference
//! type reading it.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::Serialize;
use tracing::{error, info};

use crate::apidocs::{apidocs_groups, document_package, load_manifest};
use crate::biblio::denorm_biblio_groups;
use crate::config::{MkRefsConfig, Settings};
use crate::error::MkRefsError;
use crate::glossary::denorm_glossary_groups;
use crate::graph::KnowledgeGraph;
use crate::group::GroupCollection;
use crate::render::render_reference;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefKind {
    Biblio,
    Glossary,
    Apidocs,
}

impl RefKind {
    pub const ALL: [RefKind; 3] = [RefKind::Biblio, RefKind::Glossary, RefKind::Apidocs];
}

impl fmt::Display for RefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RefKind::Biblio => "biblio",
            RefKind::Glossary => "glossary",
            RefKind::Apidocs => "apidocs",
        };
        write!(f, "{}", name)
    }
}

/// Result of rendering one reference page
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    pub kind: RefKind,
    /// Entries across all groups
    pub entries: usize,
    pub groups: usize,
    pub page: PathBuf,
    /// Grouped collection as bound to the template
    pub collection: serde_json::Value,
    pub markdown: String,
}

pub struct PipelineContext {
    pub settings: Settings,
    graphs: HashMap<PathBuf, Rc<KnowledgeGraph>>,
}

impl PipelineContext {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            graphs: HashMap::new(),
        }
    }

    /// Load and validate a configuration file
    ///
    /// # Arguments
    /// * `config_path` - YAML configuration
    /// * `docs_dir` - Overrides the configured `docs_dir`
    pub fn from_config_file(config_path: &Path, docs_dir: Option<&Path>) -> Result<Self, MkRefsError> {
        let mut config = MkRefsConfig::load(config_path)?;

        let base_dir = match docs_dir {
            Some(dir) => {
                config.docs_dir = None;
                dir.to_path_buf()
            }
            None => config_path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."))
                .to_path_buf(),
        };

        Ok(Self::new(config.validate(&base_dir)?))
    }

    /// Graph of an RDF file, parsed on first use
    pub fn graph(&mut self, path: &Path) -> Result<Rc<KnowledgeGraph>, MkRefsError> {
        if let Some(graph) = self.graphs.get(path) {
            return Ok(Rc::clone(graph));
        }

        info!("Loading graph {}", path.display());
        let graph = Rc::new(KnowledgeGraph::load(path)?);
        self.graphs.insert(path.to_path_buf(), Rc::clone(&graph));
        Ok(graph)
    }

    pub fn loaded_graphs(&self) -> usize {
        self.graphs.len()
    }

    /// Whether the configuration enables a reference type
    pub fn is_enabled(&self, kind: RefKind) -> bool {
        match kind {
            RefKind::Biblio => self.settings.biblio.is_some(),
            RefKind::Glossary => self.settings.glossary.is_some(),
            RefKind::Apidocs => self.settings.apidocs.is_some(),
        }
    }

    pub fn render(&mut self, kind: RefKind) -> Result<RenderOutcome, MkRefsError> {
        match kind {
            RefKind::Biblio => self.render_biblio(),
            RefKind::Glossary => self.render_glossary(),
            RefKind::Apidocs => self.render_apidocs(),
        }
    }

    pub fn render_biblio(&mut self) -> Result<RenderOutcome, MkRefsError> {
        let settings = self.settings.biblio.clone().ok_or_else(|| disabled(RefKind::Biblio))?;
        let graph = self.graph(&settings.graph)?;

        let groups = denorm_biblio_groups(&*graph, &settings.queries, settings.group_case)?;
        finish(RefKind::Biblio, &settings.template, &settings.page, &groups)
    }

    pub fn render_glossary(&mut self) -> Result<RenderOutcome, MkRefsError> {
        let settings = self.settings.glossary.clone().ok_or_else(|| disabled(RefKind::Glossary))?;
        let graph = self.graph(&settings.graph)?;

        let groups = denorm_glossary_groups(
            &*graph,
            &settings.queries,
            &settings.biblio_page,
            settings.group_case,
        )?;
        finish(RefKind::Glossary, &settings.template, &settings.page, &groups)
    }

    pub fn render_apidocs(&mut self) -> Result<RenderOutcome, MkRefsError> {
        let settings = self.settings.apidocs.clone().ok_or_else(|| disabled(RefKind::Apidocs))?;

        let manifest = load_manifest(&settings.manifest)?;
        let doc = document_package(&manifest, settings.git.as_str(), &settings.includes)?;
        let groups = apidocs_groups(doc);
        finish(RefKind::Apidocs, &settings.template, &settings.page, &groups)
    }

    /// Render every enabled reference type
    ///
    /// A failure is logged and does not stop the remaining types.
    pub fn render_all(&mut self) -> Vec<(RefKind, Result<RenderOutcome, MkRefsError>)> {
        let mut results = Vec::new();

        for kind in RefKind::ALL {
            if !self.is_enabled(kind) {
                continue;
            }

            let result = self.render(kind);
            match &result {
                Ok(outcome) => info!(
                    "Rendered {}: {} entries in {} groups -> {}",
                    kind,
                    outcome.entries,
                    outcome.groups,
                    outcome.page.display()
                ),
                Err(e) => error!("Failed to render {}: {}", kind, e),
            }
            results.push((kind, result));
        }

        results
    }
}

fn disabled(kind: RefKind) -> MkRefsError {
    MkRefsError::InvalidConfig(format!("no '{}' section configured", kind))
}

fn finish<T: Serialize>(
    kind: RefKind,
    template: &Path,
    page: &Path,
    groups: &GroupCollection<T>,
) -> Result<RenderOutcome, MkRefsError> {
    let markdown = render_reference(template, page, groups)?;

    Ok(RenderOutcome {
        kind,
        entries: groups.values().map(Vec::len).sum(),
        groups: groups.len(),
        page: page.to_path_buf(),
        collection: serde_json::to_value(groups)?,
        markdown,
    })
}
