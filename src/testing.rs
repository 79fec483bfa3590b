//! In-memory knowledge source for assembler tests

use std::collections::HashMap;

use serde_json::Value;

use crate::error::MkRefsError;
use crate::graph::{KnowledgeSource, QueryTable};

/// Answers queries from canned tables, keyed by the exact query text
#[derive(Default)]
pub struct StaticSource {
    pub tables: HashMap<String, QueryTable>,
    pub nodes: Vec<Value>,
}

impl StaticSource {
    pub fn with_table(mut self, query: &str, columns: &[&str], rows: Vec<Vec<Option<&str>>>) -> Self {
        let table = QueryTable {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(|c| c.map(str::to_string)).collect())
                .collect(),
        };
        self.tables.insert(query.to_string(), table);
        self
    }

    pub fn with_nodes(mut self, nodes: Vec<Value>) -> Self {
        self.nodes = nodes;
        self
    }
}

impl KnowledgeSource for StaticSource {
    fn query(&self, sparql: &str) -> Result<QueryTable, MkRefsError> {
        self.tables
            .get(sparql)
            .cloned()
            .ok_or_else(|| MkRefsError::Query {
                query: sparql.to_string(),
                reason: "no canned result".to_string(),
            })
    }

    fn dump(&self) -> Result<Vec<Value>, MkRefsError> {
        Ok(self.nodes.clone())
    }
}
