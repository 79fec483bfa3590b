//! Denormalization of query results
//!
//! Turns SELECT results into the two lookup shapes every assembler joins on:
//! an entity map (one record of attributes per entity) and relation lists
//! (subject -> ordered list of related identifiers).

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::error::MkRefsError;
use crate::graph::{KnowledgeSource, QueryTable};

/// Attribute values of one entity, keyed by result column name
pub type EntityRecord = BTreeMap<String, Option<String>>;

/// Entity identifier -> attributes
pub type EntityMap = BTreeMap<String, EntityRecord>;

/// Subject identifier -> related identifiers, in result order
pub type RelationList = BTreeMap<String, Vec<String>>;

/// Extract a bare IRI from its bracketed representation
///
/// "<https://example.org/a>" -> "https://example.org/a"
/// Anything that is not a single bracketed IRI is returned unchanged.
pub fn de_bracket(value: &str) -> &str {
    match value.strip_prefix('<').and_then(|v| v.strip_suffix('>')) {
        Some(inner) if !inner.contains(|c: char| c == '<' || c == '>' || c.is_whitespace()) => {
            inner
        }
        _ => value,
    }
}

/// Collect one record of attributes per entity from a query result
///
/// # Arguments
/// * `table` - Query result; one column names the entity
/// * `entity_col` - Name of the entity column
///
/// Rows are not merged: when an entity appears in more than one row the
/// later row replaces the earlier one, so the query itself must return one
/// row per entity.
pub fn denorm_entity(table: &QueryTable, entity_col: &str) -> Result<EntityMap, MkRefsError> {
    let entity_idx = table
        .column_index(entity_col)
        .ok_or_else(|| MkRefsError::Query {
            query: format!("columns: {}", table.columns.join(", ")),
            reason: format!("result has no '{}' column", entity_col),
        })?;

    let mut denorm = EntityMap::new();

    for row in &table.rows {
        let entity = match row.get(entity_idx).and_then(|c| c.as_deref()) {
            Some(cell) => de_bracket(cell).to_string(),
            None => {
                warn!(column = entity_col, "skipping result row with unbound entity");
                continue;
            }
        };

        let values: EntityRecord = table
            .columns
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != entity_idx)
            .map(|(i, name)| {
                let value = row
                    .get(i)
                    .and_then(|c| c.as_deref())
                    .map(|cell| de_bracket(cell).to_string());
                (name.clone(), value)
            })
            .collect();

        denorm.insert(entity, values);
    }

    Ok(denorm)
}

/// Build relation lists from a two-column result
///
/// Returns the relation name (the label of the second column) together
/// with the related identifiers of every subject.
pub fn relation_lists(table: &QueryTable) -> Result<(String, RelationList), MkRefsError> {
    if table.columns.len() < 2 {
        return Err(MkRefsError::Query {
            query: format!("columns: {}", table.columns.join(", ")),
            reason: "a relation query must select a subject and a related column".to_string(),
        });
    }

    let list_name = table.columns[1].clone();
    let mut list_ids = RelationList::new();

    for row in &table.rows {
        match (
            row.first().and_then(|c| c.as_deref()),
            row.get(1).and_then(|c| c.as_deref()),
        ) {
            (Some(subject), Some(related)) => {
                list_ids
                    .entry(de_bracket(subject).to_string())
                    .or_default()
                    .push(de_bracket(related).to_string());
            }
            _ => warn!(relation = %list_name, "skipping result row with unbound value"),
        }
    }

    Ok((list_name, list_ids))
}

/// Query a graph for a relation list
pub fn get_item_list(
    source: &dyn KnowledgeSource,
    sparql: &str,
) -> Result<(String, RelationList), MkRefsError> {
    let table = source.query(sparql)?;
    let (name, lists) = relation_lists(&table)?;
    debug!(relation = %name, subjects = lists.len(), "collected relation lists");
    Ok((name, lists))
}
