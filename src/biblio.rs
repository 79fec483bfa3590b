//! Bibliography assembly
//!
//! Builds one [`BiblioEntry`] per citable work, with its authors and
//! publisher inlined as full attribute records, then sorts the entries by
//! citation key and groups them by initial letter.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::denorm::{denorm_entity, get_item_list, EntityRecord};
use crate::error::MkRefsError;
use crate::graph::{flatten_graph, AttributeRecord, FlatGraph, KnowledgeSource};
use crate::group::{group_by_initial, GroupCollection, LetterCase};
use crate::iri::abbrev_key;
use crate::vocab::{COL_CITEKEY, COL_ENTRY, PUBLICATION_DETAILS};

/// Queries that drive the bibliography
#[derive(Debug, Clone)]
pub struct BiblioQueries {
    /// Entries with their core attributes; entity column `entry`, plus `citekey`
    pub entry: String,
    /// entry -> author, in author order
    pub entry_author: String,
    /// entry -> publisher
    pub entry_publisher: String,
}

/// A render-ready bibliography entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BiblioEntry {
    pub url: String,
    pub citekey: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "abstract", skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open: Option<String>,
    /// Any further columns selected by the entry query
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
    pub auth: Vec<AttributeRecord>,
    #[serde(rename = "pub", skip_serializing_if = "Option::is_none")]
    pub publisher: Option<Publisher>,
}

/// The publisher of an entry, with the entry's publication details
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Publisher {
    #[serde(flatten)]
    pub record: AttributeRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue: Option<Value>,
    #[serde(rename = "pageStart", skip_serializing_if = "Option::is_none")]
    pub page_start: Option<Value>,
    #[serde(rename = "pageEnd", skip_serializing_if = "Option::is_none")]
    pub page_end: Option<Value>,
}

const CORE_COLUMNS: &[&str] = &[COL_CITEKEY, "type", "date", "title", "abstract", "doi", "open"];

/// Keys filled by the assembler; query columns of the same name are dropped
const ASSEMBLED_FIELDS: &[&str] = &["url", "auth", "pub"];

/// Denormalize a graph into groups of bibliography entries
pub fn denorm_biblio_groups(
    source: &dyn KnowledgeSource,
    queries: &BiblioQueries,
    case: LetterCase,
) -> Result<GroupCollection<BiblioEntry>, MkRefsError> {
    let entry_ids = denorm_entity(&source.query(&queries.entry)?, COL_ENTRY)?;
    debug!(entries = entry_ids.len(), "bibliography entries");

    let (auth_name, authors) = get_item_list(source, &queries.entry_author)?;
    let (pub_name, publishers) = get_item_list(source, &queries.entry_publisher)?;

    let flat = flatten_graph(source)?;

    let mut entries = Vec::with_capacity(entry_ids.len());
    for (id, attrs) in &entry_ids {
        let mut entry = core_entry(id, attrs)?;

        for auth_id in authors.get(id).into_iter().flatten() {
            entry.auth.push(lookup(&flat, &auth_name, id, auth_id)?.clone());
        }

        if let Some(pub_ids) = publishers.get(id) {
            if pub_ids.len() > 1 {
                warn!(entry = %id, publishers = pub_ids.len(), "entry has several publishers, using the first");
            }
            if let Some(pub_id) = pub_ids.first() {
                let record = lookup(&flat, &pub_name, id, pub_id)?;
                entry.publisher = Some(publisher(record, attrs, flat.get(id)));
            }
        }

        entries.push(entry);
    }

    let groups = group_by_initial(entries, |e| e.citekey.as_str(), case);
    info!(
        entries = entry_ids.len(),
        groups = groups.len(),
        "assembled bibliography"
    );
    Ok(groups)
}

fn core_entry(id: &str, attrs: &EntityRecord) -> Result<BiblioEntry, MkRefsError> {
    let get = |name: &str| attrs.get(name).cloned().flatten();

    let citekey = get(COL_CITEKEY)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| MkRefsError::MissingAttribute {
            entity: id.to_string(),
            attribute: COL_CITEKEY.to_string(),
        })?;

    let extra = attrs
        .iter()
        .filter(|(k, _)| !CORE_COLUMNS.contains(&k.as_str()))
        .filter(|(k, _)| !PUBLICATION_DETAILS.contains(&k.as_str()))
        .filter(|(k, _)| {
            let assembled = ASSEMBLED_FIELDS.contains(&k.as_str());
            if assembled {
                warn!(entry = %id, column = %k, "query column shadows an assembled field, dropping it");
            }
            !assembled
        })
        .filter_map(|(k, v)| v.clone().map(|v| (k.clone(), v)))
        .collect();

    Ok(BiblioEntry {
        url: id.to_string(),
        citekey,
        kind: get("type").map(|t| abbrev_key(&t).to_string()),
        date: get("date"),
        title: get("title"),
        abstract_text: get("abstract"),
        doi: get("doi"),
        open: get("open"),
        extra,
        auth: Vec::new(),
        publisher: None,
    })
}

fn lookup<'a>(
    flat: &'a FlatGraph,
    relation: &str,
    subject: &str,
    target: &str,
) -> Result<&'a AttributeRecord, MkRefsError> {
    flat.get(target).ok_or_else(|| MkRefsError::UnknownEntity {
        relation: relation.to_string(),
        subject: subject.to_string(),
        target: target.to_string(),
    })
}

/// Inline a publisher record, copying over the entry's volume, issue and
/// pages when the entry has them
fn publisher(
    record: &AttributeRecord,
    attrs: &EntityRecord,
    entry_record: Option<&AttributeRecord>,
) -> Publisher {
    let detail = |name: &str| -> Option<Value> {
        attrs
            .get(name)
            .cloned()
            .flatten()
            .map(Value::String)
            .or_else(|| entry_record.and_then(|r| r.get(name)).cloned())
    };

    let mut record = record.clone();
    for name in PUBLICATION_DETAILS {
        record.remove(*name);
    }

    Publisher {
        record,
        volume: detail("volume"),
        issue: detail("issue"),
        page_start: detail("pageStart"),
        page_end: detail("pageEnd"),
    }
}
