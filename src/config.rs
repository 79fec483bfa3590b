//! Configuration for reference page generation
//!
//! A YAML file with one optional section per reference type. A reference
//! type is enabled when its section is present:
//!
//! ```yaml
//! docs_dir: docs
//! biblio:
//!   graph: biblio.ttl
//!   template: biblio.template
//!   page: biblio.md
//!   queries:
//!     entry: SELECT ...
//!     entry_author: SELECT ...
//!     entry_publisher: SELECT ...
//! ```
//!
//! Paths are relative to `docs_dir`, which itself defaults to the directory
//! holding the configuration file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::biblio::BiblioQueries;
use crate::error::MkRefsError;
use crate::glossary::GlossaryQueries;
use crate::group::LetterCase;
use crate::vocab::{
    BIBLIO_QUERIES, GLOSSARY_QUERIES, QUERY_ENTRY, QUERY_ENTRY_AUTHOR, QUERY_ENTRY_CITE,
    QUERY_ENTRY_HYP, QUERY_ENTRY_PUBLISHER, QUERY_ENTRY_REF, QUERY_ENTRY_SYN,
};

const BIBLIO: &str = "biblio";
const GLOSSARY: &str = "glossary";
const APIDOCS: &str = "apidocs";

// ============================================================================
// Raw configuration, as read from YAML
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MkRefsConfig {
    /// Base directory of the documentation sources
    pub docs_dir: Option<String>,
    pub biblio: Option<ReferenceConfig>,
    pub glossary: Option<ReferenceConfig>,
    pub apidocs: Option<ApidocsConfig>,
}

/// Section of a graph-backed reference type
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceConfig {
    /// RDF file holding the knowledge graph
    pub graph: Option<String>,
    pub template: Option<String>,
    /// Output Markdown page
    pub page: Option<String>,
    pub group_case: Option<LetterCase>,
    /// Query name -> SPARQL text
    pub queries: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApidocsConfig {
    pub template: Option<String>,
    pub page: Option<String>,
    pub package: Option<String>,
    /// Base URL of the package's source tree
    pub git: Option<String>,
    /// Comma-separated class names
    pub includes: Option<String>,
    /// JSON or YAML description of the package's symbols
    pub manifest: Option<String>,
}

// ============================================================================
// Validated settings
// ============================================================================

#[derive(Debug, Clone)]
pub struct Settings {
    pub docs_dir: PathBuf,
    pub biblio: Option<BiblioSettings>,
    pub glossary: Option<GlossarySettings>,
    pub apidocs: Option<ApidocsSettings>,
}

#[derive(Debug, Clone)]
pub struct BiblioSettings {
    pub graph: PathBuf,
    pub template: PathBuf,
    pub page: PathBuf,
    pub group_case: LetterCase,
    pub queries: BiblioQueries,
}

#[derive(Debug, Clone)]
pub struct GlossarySettings {
    pub graph: PathBuf,
    pub template: PathBuf,
    pub page: PathBuf,
    pub group_case: LetterCase,
    pub queries: GlossaryQueries,
    /// Bibliography page as configured, target of citation links
    pub biblio_page: String,
}

#[derive(Debug, Clone)]
pub struct ApidocsSettings {
    pub template: PathBuf,
    pub page: PathBuf,
    pub manifest: PathBuf,
    pub package: String,
    pub git: Url,
    pub includes: Vec<String>,
}

// ============================================================================
// Loading and validation
// ============================================================================

impl MkRefsConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self, MkRefsError> {
        let content = fs::read_to_string(path).map_err(|e| MkRefsError::ConfigLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Self::from_yaml(&content).map_err(|e| MkRefsError::ConfigLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    pub fn from_yaml(content: &str) -> Result<Self, MkRefsError> {
        Ok(yaml_serde::from_str(content)?)
    }

    /// Check every enabled section for its required keys and resolve paths
    ///
    /// # Arguments
    /// * `base_dir` - Directory `docs_dir` is resolved against, usually the
    ///   directory of the configuration file
    pub fn validate(&self, base_dir: &Path) -> Result<Settings, MkRefsError> {
        let docs_dir = match &self.docs_dir {
            Some(dir) => base_dir.join(dir),
            None => base_dir.to_path_buf(),
        };

        let biblio = self
            .biblio
            .as_ref()
            .map(|section| validate_biblio(section, &docs_dir))
            .transpose()?;

        let glossary = match &self.glossary {
            Some(section) => {
                let biblio_page = self
                    .biblio
                    .as_ref()
                    .and_then(|b| b.page.clone())
                    .ok_or_else(|| missing(BIBLIO, "page"))?;
                Some(validate_glossary(section, &docs_dir, biblio_page)?)
            }
            None => None,
        };

        let apidocs = self
            .apidocs
            .as_ref()
            .map(|section| validate_apidocs(section, &docs_dir))
            .transpose()?;

        Ok(Settings {
            docs_dir,
            biblio,
            glossary,
            apidocs,
        })
    }
}

fn missing(section: &str, key: &str) -> MkRefsError {
    MkRefsError::MissingConfigKey {
        section: section.to_string(),
        key: key.to_string(),
    }
}

fn required<'a>(value: &'a Option<String>, section: &str, key: &str) -> Result<&'a str, MkRefsError> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| missing(section, key))
}

fn required_query(section: &ReferenceConfig, name: &str, section_name: &str) -> Result<String, MkRefsError> {
    section
        .queries
        .get(name)
        .cloned()
        .ok_or_else(|| missing(section_name, &format!("queries.{}", name)))
}

fn check_queries(section: &ReferenceConfig, names: &[&str], section_name: &str) -> Result<(), MkRefsError> {
    for name in names {
        required_query(section, name, section_name)?;
    }
    Ok(())
}

fn validate_biblio(section: &ReferenceConfig, docs_dir: &Path) -> Result<BiblioSettings, MkRefsError> {
    let graph = required(&section.graph, BIBLIO, "graph")?;
    let template = required(&section.template, BIBLIO, "template")?;
    let page = required(&section.page, BIBLIO, "page")?;
    check_queries(section, BIBLIO_QUERIES, BIBLIO)?;

    Ok(BiblioSettings {
        graph: docs_dir.join(graph),
        template: docs_dir.join(template),
        page: docs_dir.join(page),
        group_case: section.group_case.unwrap_or(LetterCase::Upper),
        queries: BiblioQueries {
            entry: required_query(section, QUERY_ENTRY, BIBLIO)?,
            entry_author: required_query(section, QUERY_ENTRY_AUTHOR, BIBLIO)?,
            entry_publisher: required_query(section, QUERY_ENTRY_PUBLISHER, BIBLIO)?,
        },
    })
}

fn validate_glossary(
    section: &ReferenceConfig,
    docs_dir: &Path,
    biblio_page: String,
) -> Result<GlossarySettings, MkRefsError> {
    let graph = required(&section.graph, GLOSSARY, "graph")?;
    let template = required(&section.template, GLOSSARY, "template")?;
    let page = required(&section.page, GLOSSARY, "page")?;
    check_queries(section, GLOSSARY_QUERIES, GLOSSARY)?;

    Ok(GlossarySettings {
        graph: docs_dir.join(graph),
        template: docs_dir.join(template),
        page: docs_dir.join(page),
        group_case: section.group_case.unwrap_or(LetterCase::Lower),
        queries: GlossaryQueries {
            entry: required_query(section, QUERY_ENTRY, GLOSSARY)?,
            entry_syn: required_query(section, QUERY_ENTRY_SYN, GLOSSARY)?,
            entry_ref: required_query(section, QUERY_ENTRY_REF, GLOSSARY)?,
            entry_hyp: required_query(section, QUERY_ENTRY_HYP, GLOSSARY)?,
            entry_cite: required_query(section, QUERY_ENTRY_CITE, GLOSSARY)?,
        },
        biblio_page,
    })
}

fn validate_apidocs(section: &ApidocsConfig, docs_dir: &Path) -> Result<ApidocsSettings, MkRefsError> {
    let template = required(&section.template, APIDOCS, "template")?;
    let page = required(&section.page, APIDOCS, "page")?;
    let package = required(&section.package, APIDOCS, "package")?;
    let git = required(&section.git, APIDOCS, "git")?;
    let includes = required(&section.includes, APIDOCS, "includes")?;
    let manifest = required(&section.manifest, APIDOCS, "manifest")?;

    let git = Url::parse(git)
        .map_err(|e| MkRefsError::InvalidConfig(format!("apidocs.git '{}': {}", git, e)))?;

    Ok(ApidocsSettings {
        template: docs_dir.join(template),
        page: docs_dir.join(page),
        manifest: docs_dir.join(manifest),
        package: package.to_string(),
        git,
        includes: parse_includes(includes),
    })
}

/// Split a comma-separated include list
pub fn parse_includes(includes: &str) -> Vec<String> {
    includes
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
