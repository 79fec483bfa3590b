//! Vocabulary and naming constants
//!
//! RDF terms the graph flattener needs to recognize, plus the names of the
//! configured queries and the columns the assemblers expect in their results.

/// RDF collection head
pub const RDF_FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";

/// RDF collection tail
pub const RDF_REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";

/// Empty RDF collection
pub const RDF_NIL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";

/// Class membership, serialized as `@type`
pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";

/// XSD datatypes mapped onto JSON numbers
pub const XSD_NUMERIC: &[&str] = &[
    "integer",
    "int",
    "long",
    "short",
    "nonNegativeInteger",
    "positiveInteger",
    "decimal",
    "double",
    "float",
];

pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";

// Query names, as keys of the `queries` table of each reference section

pub const QUERY_ENTRY: &str = "entry";
pub const QUERY_ENTRY_AUTHOR: &str = "entry_author";
pub const QUERY_ENTRY_PUBLISHER: &str = "entry_publisher";
pub const QUERY_ENTRY_SYN: &str = "entry_syn";
pub const QUERY_ENTRY_REF: &str = "entry_ref";
pub const QUERY_ENTRY_HYP: &str = "entry_hyp";
pub const QUERY_ENTRY_CITE: &str = "entry_cite";

/// Queries every bibliography section must define
pub const BIBLIO_QUERIES: &[&str] = &[QUERY_ENTRY, QUERY_ENTRY_AUTHOR, QUERY_ENTRY_PUBLISHER];

/// Queries every glossary section must define
pub const GLOSSARY_QUERIES: &[&str] = &[
    QUERY_ENTRY,
    QUERY_ENTRY_SYN,
    QUERY_ENTRY_REF,
    QUERY_ENTRY_HYP,
    QUERY_ENTRY_CITE,
];

// Result columns

/// Entity column of every `entry` query
pub const COL_ENTRY: &str = "entry";
pub const COL_CITEKEY: &str = "citekey";
pub const COL_LABEL: &str = "label";

/// Publication details copied from an entry onto its publisher
pub const PUBLICATION_DETAILS: &[&str] = &["volume", "issue", "pageStart", "pageEnd"];

/// Extension stripped from the bibliography page when linking to it
pub const MARKDOWN_EXT: &str = ".md";

/// Group name of the single apidocs package record
pub const APIDOCS_GROUP: &str = "package";

pub fn is_xsd_numeric(datatype: &str) -> bool {
    datatype
        .strip_prefix(XSD_NS)
        .map(|local| XSD_NUMERIC.contains(&local))
        .unwrap_or(false)
}
