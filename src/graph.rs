//! Knowledge graph access
//!
//! The assemblers only ever see the graph through [`KnowledgeSource`]: a
//! SPARQL query returning a [`QueryTable`], and a full dump of the graph as
//! JSON-LD node objects. [`KnowledgeGraph`] implements both on top of an
//! in-memory oxigraph store.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use oxigraph::io::RdfFormat;
use oxigraph::model::{Subject, Term};
use oxigraph::sparql::QueryResults;
use oxigraph::store::Store;
use serde_json::{json, Map, Number, Value};
use tracing::debug;

use crate::error::MkRefsError;
use crate::iri::abbrev_map;
use crate::vocab::{is_xsd_numeric, RDF_FIRST, RDF_NIL, RDF_REST, RDF_TYPE, XSD_BOOLEAN};

/// Flattened view of one entity: abbreviated attribute name -> value(s)
pub type AttributeRecord = Map<String, Value>;

/// Every entity of a graph, keyed by its identifier
pub type FlatGraph = BTreeMap<String, AttributeRecord>;

/// Tabular result of a SELECT query
///
/// Cells hold the textual form of each RDF term: IRIs wrapped in angle
/// brackets, literals as their lexical value, blank nodes as `_:id`.
/// Unbound variables are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl QueryTable {
    /// Position of a named column
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// Read-only access to a loaded knowledge graph
pub trait KnowledgeSource {
    /// Run a SPARQL SELECT query
    fn query(&self, sparql: &str) -> Result<QueryTable, MkRefsError>;

    /// Serialize the whole graph as JSON-LD node objects
    fn dump(&self) -> Result<Vec<Value>, MkRefsError>;
}

/// RDF term, independent of the store that produced it
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RdfTerm {
    Iri(String),
    Blank(String),
    Literal {
        value: String,
        datatype: String,
        language: Option<String>,
    },
}

impl RdfTerm {
    /// Textual cell form used in query tables
    pub fn to_cell(&self) -> String {
        match self {
            RdfTerm::Iri(iri) => format!("<{}>", iri),
            RdfTerm::Blank(id) => format!("_:{}", id),
            RdfTerm::Literal { value, .. } => value.clone(),
        }
    }

    fn node_key(&self) -> Option<String> {
        match self {
            RdfTerm::Iri(iri) => Some(iri.clone()),
            RdfTerm::Blank(id) => Some(format!("_:{}", id)),
            RdfTerm::Literal { .. } => None,
        }
    }
}

/// A single triple
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub subject: RdfTerm,
    pub predicate: String,
    pub object: RdfTerm,
}

/// In-memory knowledge graph backed by oxigraph
pub struct KnowledgeGraph {
    store: Store,
}

impl KnowledgeGraph {
    /// Load an RDF file; the serialization is chosen by file extension,
    /// defaulting to Turtle
    pub fn load(path: &Path) -> Result<Self, MkRefsError> {
        let load_err = |reason: String| MkRefsError::GraphLoad {
            path: path.display().to_string(),
            reason,
        };

        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(RdfFormat::from_extension)
            .unwrap_or(RdfFormat::Turtle);

        let file = File::open(path).map_err(|e| load_err(e.to_string()))?;
        let store = Store::new().map_err(|e| load_err(e.to_string()))?;
        store
            .load_from_reader(format, BufReader::new(file))
            .map_err(|e| load_err(e.to_string()))?;

        debug!(path = %path.display(), quads = store.len().unwrap_or(0), "loaded graph");
        Ok(Self { store })
    }

    /// Parse a Turtle document held in memory
    pub fn from_turtle(text: &str) -> Result<Self, MkRefsError> {
        let load_err = |reason: String| MkRefsError::GraphLoad {
            path: "<inline>".to_string(),
            reason,
        };

        let store = Store::new().map_err(|e| load_err(e.to_string()))?;
        store
            .load_from_reader(RdfFormat::Turtle, text.as_bytes())
            .map_err(|e| load_err(e.to_string()))?;

        Ok(Self { store })
    }

    fn statements(&self) -> Result<Vec<Statement>, MkRefsError> {
        let mut statements = Vec::new();

        for quad in self.store.iter() {
            let quad = quad.map_err(|e| MkRefsError::GraphLoad {
                path: "<store>".to_string(),
                reason: e.to_string(),
            })?;

            let subject = match &quad.subject {
                Subject::NamedNode(n) => RdfTerm::Iri(n.as_str().to_string()),
                Subject::BlankNode(b) => RdfTerm::Blank(b.as_str().to_string()),
                #[allow(unreachable_patterns)]
                _ => continue,
            };
            let object = match from_oxigraph(&quad.object) {
                Some(term) => term,
                None => continue,
            };

            statements.push(Statement {
                subject,
                predicate: quad.predicate.as_str().to_string(),
                object,
            });
        }

        Ok(statements)
    }
}

impl KnowledgeSource for KnowledgeGraph {
    fn query(&self, sparql: &str) -> Result<QueryTable, MkRefsError> {
        let query_err = |reason: String| MkRefsError::Query {
            query: sparql.trim().to_string(),
            reason,
        };

        let results = self.store.query(sparql).map_err(|e| query_err(e.to_string()))?;

        let solutions = match results {
            QueryResults::Solutions(solutions) => solutions,
            _ => return Err(query_err("expected a SELECT query".to_string())),
        };

        let columns: Vec<String> = solutions
            .variables()
            .iter()
            .map(|v| v.as_str().to_string())
            .collect();

        let mut rows = Vec::new();
        for solution in solutions {
            let solution = solution.map_err(|e| query_err(e.to_string()))?;
            let row = (0..columns.len())
                .map(|i| solution.get(i).and_then(from_oxigraph).map(|t| t.to_cell()))
                .collect();
            rows.push(row);
        }

        debug!(columns = ?columns, rows = rows.len(), "query complete");
        Ok(QueryTable { columns, rows })
    }

    fn dump(&self) -> Result<Vec<Value>, MkRefsError> {
        Ok(statements_to_nodes(&self.statements()?))
    }
}

fn from_oxigraph(term: &Term) -> Option<RdfTerm> {
    match term {
        Term::NamedNode(n) => Some(RdfTerm::Iri(n.as_str().to_string())),
        Term::BlankNode(b) => Some(RdfTerm::Blank(b.as_str().to_string())),
        Term::Literal(l) => Some(RdfTerm::Literal {
            value: l.value().to_string(),
            datatype: l.datatype().as_str().to_string(),
            language: l.language().map(str::to_string),
        }),
        #[allow(unreachable_patterns)]
        _ => None,
    }
}

type NodeIndex = BTreeMap<String, BTreeMap<String, Vec<RdfTerm>>>;

/// Build JSON-LD node objects from a set of triples
///
/// IRI subjects become top-level nodes with an `@id`. Blank nodes that are
/// the object of some triple are embedded where they are referenced; RDF
/// collections are collapsed into arrays. Output is ordered by identifier,
/// and multi-valued properties are sorted, so the dump is deterministic.
pub fn statements_to_nodes(statements: &[Statement]) -> Vec<Value> {
    let mut index: NodeIndex = BTreeMap::new();
    let mut embedded: HashSet<String> = HashSet::new();

    for st in statements {
        let Some(key) = st.subject.node_key() else {
            continue;
        };
        index
            .entry(key)
            .or_default()
            .entry(st.predicate.clone())
            .or_default()
            .push(st.object.clone());

        if let RdfTerm::Blank(id) = &st.object {
            embedded.insert(format!("_:{}", id));
        }
    }

    index
        .keys()
        .filter(|key| !embedded.contains(*key))
        .map(|key| {
            let mut visiting = BTreeSet::new();
            node_to_json(key, &index, &mut visiting, true)
        })
        .collect()
}

fn node_to_json(
    key: &str,
    index: &NodeIndex,
    visiting: &mut BTreeSet<String>,
    with_id: bool,
) -> Value {
    let mut obj = Map::new();
    if with_id {
        obj.insert("@id".to_string(), json!(key));
    }

    let Some(props) = index.get(key) else {
        return Value::Object(obj);
    };
    visiting.insert(key.to_string());

    for (predicate, objects) in props {
        if predicate == RDF_TYPE {
            let mut types: Vec<String> = objects
                .iter()
                .filter_map(|t| match t {
                    RdfTerm::Iri(iri) => Some(iri.clone()),
                    _ => None,
                })
                .collect();
            types.sort();
            types.dedup();
            let value = if types.len() == 1 {
                json!(types[0])
            } else {
                json!(types)
            };
            obj.insert("@type".to_string(), value);
            continue;
        }

        let mut values: Vec<Value> = objects
            .iter()
            .map(|t| term_to_json(t, index, visiting))
            .collect();

        let value = if values.len() == 1 {
            values.remove(0)
        } else {
            values.sort_by_key(|v| v.to_string());
            Value::Array(values)
        };
        obj.insert(predicate.clone(), value);
    }

    visiting.remove(key);
    Value::Object(obj)
}

fn term_to_json(term: &RdfTerm, index: &NodeIndex, visiting: &mut BTreeSet<String>) -> Value {
    match term {
        RdfTerm::Iri(iri) if iri == RDF_NIL => Value::Array(vec![]),
        RdfTerm::Iri(iri) => json!({ "@id": iri }),
        RdfTerm::Literal {
            value, datatype, ..
        } => literal_to_json(value, datatype),
        RdfTerm::Blank(id) => {
            let key = format!("_:{}", id);
            if visiting.contains(&key) {
                // cyclic blank node structure, refer to it instead of embedding
                return json!({ "@id": key });
            }
            if is_list_head(&key, index) {
                list_to_json(&key, index, visiting)
            } else {
                node_to_json(&key, index, visiting, false)
            }
        }
    }
}

fn literal_to_json(value: &str, datatype: &str) -> Value {
    if datatype == XSD_BOOLEAN {
        return match value {
            "true" | "1" => Value::Bool(true),
            "false" | "0" => Value::Bool(false),
            _ => json!(value),
        };
    }

    if is_xsd_numeric(datatype) {
        if let Ok(n) = value.parse::<i64>() {
            return Value::Number(n.into());
        }
        if let Some(n) = value.parse::<f64>().ok().and_then(Number::from_f64) {
            return Value::Number(n);
        }
    }

    json!(value)
}

fn is_list_head(key: &str, index: &NodeIndex) -> bool {
    index
        .get(key)
        .map(|props| props.contains_key(RDF_FIRST))
        .unwrap_or(false)
}

fn list_to_json(head: &str, index: &NodeIndex, visiting: &mut BTreeSet<String>) -> Value {
    let mut items = Vec::new();
    let mut seen = HashSet::new();
    let mut current = head.to_string();

    while seen.insert(current.clone()) {
        let Some(props) = index.get(&current) else {
            break;
        };
        if let Some(first) = props.get(RDF_FIRST).and_then(|v| v.first()) {
            items.push(term_to_json(first, index, visiting));
        }
        match props.get(RDF_REST).and_then(|v| v.first()) {
            Some(RdfTerm::Blank(id)) => current = format!("_:{}", id),
            _ => break,
        }
    }

    Value::Array(items)
}

/// Dump a graph and key each node's abbreviated record by its identifier
pub fn flatten_graph(source: &dyn KnowledgeSource) -> Result<FlatGraph, MkRefsError> {
    let mut flat = FlatGraph::new();

    for node in source.dump()? {
        let Some(obj) = node.as_object() else {
            continue;
        };
        let Some(id) = obj.get("@id").and_then(|v| v.as_str()) else {
            continue;
        };
        flat.insert(id.to_string(), abbrev_map(obj));
    }

    debug!(entities = flat.len(), "flattened graph");
    Ok(flat)
}
