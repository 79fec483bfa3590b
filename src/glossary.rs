//! Glossary assembly
//!
//! Glossary entries are keyed by their human-readable label. Besides the
//! terms themselves the glossary carries redirect stubs for synonyms, and
//! localizes hypernyms and citations into Markdown links so that templates
//! never need to resolve an identifier.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::denorm::{denorm_entity, get_item_list, EntityMap, RelationList};
use crate::error::MkRefsError;
use crate::graph::{flatten_graph, AttributeRecord, FlatGraph, KnowledgeSource};
use crate::group::{group_by_initial, GroupCollection, LetterCase};
use crate::vocab::{COL_ENTRY, COL_LABEL, MARKDOWN_EXT};

/// Queries that drive the glossary
#[derive(Debug, Clone)]
pub struct GlossaryQueries {
    /// Terms with their labels; entity column `entry`, plus `label`
    pub entry: String,
    /// term -> synonym label
    pub entry_syn: String,
    /// term -> related resource
    pub entry_ref: String,
    /// term -> broader term
    pub entry_hyp: String,
    /// term -> bibliography citekey
    pub entry_cite: String,
}

/// One item of the glossary: a term, or a stub pointing a synonym at its term
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GlossaryItem {
    Term(GlossaryTerm),
    Redirect(GlossaryRedirect),
}

impl GlossaryItem {
    pub fn label(&self) -> &str {
        match self {
            GlossaryItem::Term(term) => &term.label,
            GlossaryItem::Redirect(redirect) => &redirect.label,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlossaryTerm {
    pub label: String,
    /// The term's own attributes from the graph
    #[serde(flatten)]
    pub attributes: AttributeRecord,
    /// Relation name -> inlined records or rendered links
    #[serde(flatten)]
    pub relations: BTreeMap<String, RelationField>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlossaryRedirect {
    pub label: String,
    pub redirect: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RelationField {
    Records(Vec<AttributeRecord>),
    Links(Vec<String>),
}

/// Link base of the bibliography page, relative to the glossary page
///
/// "biblio.md" -> "../biblio/"
pub fn biblio_link_base(biblio_page: &str) -> String {
    let stem = biblio_page.strip_suffix(MARKDOWN_EXT).unwrap_or(biblio_page);
    format!("../{}/", stem)
}

/// Anchor fragment of a glossary term on the glossary page
pub fn term_anchor(label: &str) -> String {
    label.replace(' ', "-")
}

/// Render hypernyms as links: an internal anchor when the hypernym is a
/// known glossary term, otherwise an external link to the raw identifier
pub fn localize_hypernyms(hypernyms: &RelationList, entry_ids: &EntityMap) -> RelationList {
    hypernyms
        .iter()
        .map(|(topic, items)| {
            let links = items
                .iter()
                .map(|hypernym| match known_label(entry_ids, hypernym) {
                    Some(label) => format!("[{}](#{})", label, term_anchor(label)),
                    None => format!("<a href='{0}' target='_blank'>{0}</a>", hypernym),
                })
                .collect();
            (topic.clone(), links)
        })
        .collect()
}

/// Render citekeys as links into the bibliography page
pub fn localize_citations(citations: &RelationList, biblio_page: &str) -> RelationList {
    let base = biblio_link_base(biblio_page);

    citations
        .iter()
        .map(|(topic, keys)| {
            let links = keys
                .iter()
                .map(|key| format!("[[{0}]]({1}#{0})", key, base))
                .collect();
            (topic.clone(), links)
        })
        .collect()
}

fn known_label<'a>(entry_ids: &'a EntityMap, id: &str) -> Option<&'a str> {
    entry_ids
        .get(id)
        .and_then(|attrs| attrs.get(COL_LABEL))
        .and_then(|label| label.as_deref())
}

/// Inline related resources; identifiers outside the graph become a
/// minimal record holding just the identifier
fn inline_refs(ids: &[String], flat: &FlatGraph) -> Vec<AttributeRecord> {
    ids.iter()
        .map(|id| match flat.get(id) {
            Some(record) => record.clone(),
            None => {
                let mut record = AttributeRecord::new();
                record.insert("id".to_string(), json!(id));
                record
            }
        })
        .collect()
}

/// Denormalize a graph into groups of glossary items
///
/// # Arguments
/// * `source` - The knowledge graph
/// * `queries` - Glossary queries
/// * `biblio_page` - Output page of the bibliography, target of citation links
/// * `case` - Letter case of the group keys
pub fn denorm_glossary_groups(
    source: &dyn KnowledgeSource,
    queries: &GlossaryQueries,
    biblio_page: &str,
    case: LetterCase,
) -> Result<GroupCollection<GlossaryItem>, MkRefsError> {
    let entry_ids = denorm_entity(&source.query(&queries.entry)?, COL_ENTRY)?;
    debug!(terms = entry_ids.len(), "glossary terms");

    let (syn_name, syn_labels) = get_item_list(source, &queries.entry_syn)?;
    let (ref_name, ref_ids) = get_item_list(source, &queries.entry_ref)?;

    let (hyp_name, hyp_ids) = get_item_list(source, &queries.entry_hyp)?;
    let hyp_links = localize_hypernyms(&hyp_ids, &entry_ids);

    let (cite_name, cite_ids) = get_item_list(source, &queries.entry_cite)?;
    let cite_links = localize_citations(&cite_ids, biblio_page);

    let flat = flatten_graph(source)?;

    let mut entries: BTreeMap<String, GlossaryItem> = BTreeMap::new();

    for id in entry_ids.keys() {
        let label = known_label(&entry_ids, id)
            .filter(|l| !l.is_empty())
            .ok_or_else(|| MkRefsError::MissingAttribute {
                entity: id.clone(),
                attribute: COL_LABEL.to_string(),
            })?
            .to_string();

        let mut attributes = flat.get(id).cloned().unwrap_or_default();
        attributes.remove(COL_LABEL);

        let mut relations = BTreeMap::new();
        if let Some(ids) = ref_ids.get(id) {
            relations.insert(ref_name.clone(), RelationField::Records(inline_refs(ids, &flat)));
        }
        if let Some(links) = hyp_links.get(id) {
            relations.insert(hyp_name.clone(), RelationField::Links(links.clone()));
        }
        if let Some(links) = cite_links.get(id) {
            relations.insert(cite_name.clone(), RelationField::Links(links.clone()));
        }
        for name in relations.keys() {
            attributes.remove(name);
        }

        let term = GlossaryItem::Term(GlossaryTerm {
            label: label.clone(),
            attributes,
            relations,
        });
        if entries.insert(label.clone(), term).is_some() {
            warn!(label = %label, entry = %id, "duplicate glossary label, keeping the later term");
        }
    }

    for (topic, synonyms) in &syn_labels {
        let canonical = known_label(&entry_ids, topic).ok_or_else(|| MkRefsError::UnknownEntity {
            relation: syn_name.clone(),
            subject: synonyms.join(", "),
            target: topic.clone(),
        })?;

        for synonym in synonyms {
            if entries.contains_key(synonym) {
                warn!(synonym = %synonym, "synonym collides with a glossary label, skipping redirect");
                continue;
            }
            entries.insert(
                synonym.clone(),
                GlossaryItem::Redirect(GlossaryRedirect {
                    label: synonym.clone(),
                    redirect: canonical.to_string(),
                }),
            );
        }
    }

    let total = entries.len();
    let groups = group_by_initial(entries.into_values().collect(), |i| i.label(), case);
    info!(items = total, groups = groups.len(), "assembled glossary");
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StaticSource;

    fn queries() -> GlossaryQueries {
        GlossaryQueries {
            entry: "entry".to_string(),
            entry_syn: "entry_syn".to_string(),
            entry_ref: "entry_ref".to_string(),
            entry_hyp: "entry_hyp".to_string(),
            entry_cite: "entry_cite".to_string(),
        }
    }

    fn sample_source() -> StaticSource {
        StaticSource::default()
            .with_table(
                "entry",
                &["entry", "label"],
                vec![
                    vec![Some("<http://x/g/machine-learning>"), Some("Machine Learning")],
                    vec![Some("<http://x/g/ai>"), Some("artificial intelligence")],
                    vec![Some("<http://x/g/graph>"), Some("Knowledge Graph")],
                ],
            )
            .with_table(
                "entry_syn",
                &["entry", "syn"],
                vec![vec![Some("<http://x/g/machine-learning>"), Some("ML")]],
            )
            .with_table(
                "entry_ref",
                &["entry", "ref"],
                vec![
                    vec![Some("<http://x/g/graph>"), Some("<http://x/g/ai>")],
                    vec![Some("<http://x/g/graph>"), Some("<https://www.wikidata.org/wiki/Q33002955>")],
                ],
            )
            .with_table(
                "entry_hyp",
                &["entry", "hyp"],
                vec![
                    vec![Some("<http://x/g/machine-learning>"), Some("<http://x/g/ai>")],
                    vec![Some("<http://x/g/ai>"), Some("<http://dbpedia.org/resource/Computer_science>")],
                ],
            )
            .with_table(
                "entry_cite",
                &["entry", "cite"],
                vec![vec![Some("<http://x/g/graph>"), Some("hogan2020kg")]],
            )
            .with_nodes(vec![
                json!({
                    "@id": "http://x/g/machine-learning",
                    "http://www.w3.org/2004/02/skos/core#prefLabel": "Machine Learning",
                    "http://www.w3.org/2004/02/skos/core#definition": "learning from data"
                }),
                json!({
                    "@id": "http://x/g/ai",
                    "http://www.w3.org/2004/02/skos/core#prefLabel": "artificial intelligence"
                }),
                json!({
                    "@id": "http://x/g/graph",
                    "http://www.w3.org/2004/02/skos/core#prefLabel": "Knowledge Graph"
                }),
            ])
    }

    fn find<'a>(groups: &'a GroupCollection<GlossaryItem>, label: &str) -> &'a GlossaryItem {
        groups
            .values()
            .flatten()
            .find(|i| i.label() == label)
            .unwrap_or_else(|| panic!("no glossary item labelled {}", label))
    }

    #[test]
    fn test_synonym_redirect_stub() {
        let groups =
            denorm_glossary_groups(&sample_source(), &queries(), "biblio.md", LetterCase::Lower)
                .unwrap();

        let stub = serde_json::to_value(find(&groups, "ML")).unwrap();
        assert_eq!(stub, json!({"label": "ML", "redirect": "Machine Learning"}));
    }

    #[test]
    fn test_groups_by_lowercase_label() {
        let groups =
            denorm_glossary_groups(&sample_source(), &queries(), "biblio.md", LetterCase::Lower)
                .unwrap();

        assert_eq!(groups.keys().collect::<Vec<_>>(), vec!["a", "k", "m"]);
        let m: Vec<&str> = groups["m"].iter().map(|i| i.label()).collect();
        assert_eq!(m, vec!["Machine Learning", "ML"]);
    }

    #[test]
    fn test_hypernyms_localized() {
        let groups =
            denorm_glossary_groups(&sample_source(), &queries(), "biblio.md", LetterCase::Lower)
                .unwrap();

        let ml = serde_json::to_value(find(&groups, "Machine Learning")).unwrap();
        assert_eq!(
            ml["hyp"],
            json!(["[artificial intelligence](#artificial-intelligence)"])
        );
        assert_eq!(ml["definition"], "learning from data");
    }

    #[test]
    fn test_unknown_hypernym_is_external_link() {
        let groups =
            denorm_glossary_groups(&sample_source(), &queries(), "biblio.md", LetterCase::Lower)
                .unwrap();

        let ai = serde_json::to_value(find(&groups, "artificial intelligence")).unwrap();
        let iri = "http://dbpedia.org/resource/Computer_science";
        assert_eq!(
            ai["hyp"][0],
            format!("<a href='{0}' target='_blank'>{0}</a>", iri)
        );
    }

    #[test]
    fn test_citations_link_into_bibliography() {
        let groups = denorm_glossary_groups(
            &sample_source(),
            &queries(),
            "reference/biblio.md",
            LetterCase::Lower,
        )
        .unwrap();

        let kg = serde_json::to_value(find(&groups, "Knowledge Graph")).unwrap();
        assert_eq!(
            kg["cite"],
            json!(["[[hogan2020kg]](../reference/biblio/#hogan2020kg)"])
        );
    }

    #[test]
    fn test_refs_inlined_with_fallback() {
        let groups =
            denorm_glossary_groups(&sample_source(), &queries(), "biblio.md", LetterCase::Lower)
                .unwrap();

        let kg = serde_json::to_value(find(&groups, "Knowledge Graph")).unwrap();
        let refs = kg["ref"].as_array().unwrap();
        assert_eq!(refs[0]["prefLabel"], "artificial intelligence");
        assert_eq!(
            refs[1],
            json!({"id": "https://www.wikidata.org/wiki/Q33002955"})
        );
    }

    #[test]
    fn test_synonym_for_unknown_term_is_an_error() {
        let source = sample_source().with_table(
            "entry_syn",
            &["entry", "syn"],
            vec![vec![Some("<http://x/g/missing>"), Some("XX")]],
        );

        assert!(matches!(
            denorm_glossary_groups(&source, &queries(), "biblio.md", LetterCase::Lower),
            Err(MkRefsError::UnknownEntity { .. })
        ));
    }

    #[test]
    fn test_synonym_colliding_with_label_keeps_term() {
        let source = sample_source().with_table(
            "entry_syn",
            &["entry", "syn"],
            vec![vec![Some("<http://x/g/ai>"), Some("Machine Learning")]],
        );

        let groups =
            denorm_glossary_groups(&source, &queries(), "biblio.md", LetterCase::Lower).unwrap();
        assert!(matches!(
            find(&groups, "Machine Learning"),
            GlossaryItem::Term(_)
        ));
    }

    #[test]
    fn test_biblio_link_base() {
        assert_eq!(biblio_link_base("biblio.md"), "../biblio/");
        assert_eq!(biblio_link_base("refs/biblio.md"), "../refs/biblio/");
        assert_eq!(biblio_link_base("biblio"), "../biblio/");
    }
}
