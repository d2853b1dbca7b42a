use std::fmt;

use itertools::Itertools;
use tracing::trace;

use crate::catalog::{ColumnInfo, SchemaState, TableInfo};
use crate::Column;

/// A set of columns whose values, when none of them are NULL, identify a row uniquely.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyInfo(Vec<Column>);

impl KeyInfo {
    pub fn new(columns: Vec<Column>) -> Self {
        Self(columns)
    }

    pub fn columns(&self) -> &[Column] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Column>> for KeyInfo {
    fn from(columns: Vec<Column>) -> Self {
        Self(columns)
    }
}

impl fmt::Display for KeyInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.iter().join(","))
    }
}

/// The ordered list of columns produced by a plan node, with its known unique keys.
///
/// Column order is the basis for resolving column references to row positions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    columns: Vec<Column>,
    unique_keys: Vec<KeyInfo>,
}

/// Convert catalog column metadata to column references, positioned in declaration order
pub fn columns_from_infos(table_name: &str, infos: &[ColumnInfo]) -> Vec<Column> {
    infos
        .iter()
        .enumerate()
        .map(|(position, info)| {
            Column::new(table_name, &info.name, info.field_type.clone(), position)
        })
        .collect()
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            unique_keys: Vec::new(),
        }
    }

    /// Build the schema of a full scan of the given table.
    ///
    /// Every public unique index whose columns are all `NOT NULL` becomes a unique key, in index
    /// column order. If the table's primary key is the row handle, the first primary key column
    /// is a unique key on its own as well.
    pub fn from_table_info(table: &TableInfo) -> Self {
        let columns = columns_from_infos(&table.name, &table.columns);
        let mut unique_keys = Vec::with_capacity(table.indices.len() + 1);

        for index in &table.indices {
            if !index.unique || index.state != SchemaState::Public {
                trace!(table = %table.name, index = %index.name, "Skipping non-unique or non-public index");
                continue;
            }
            let key = index
                .columns
                .iter()
                .map(|name| {
                    columns
                        .iter()
                        .find(|col| col.name.eq_ignore_ascii_case(name))
                        .filter(|col| col.ty.not_null)
                        .cloned()
                })
                .collect::<Option<Vec<_>>>();
            match key {
                Some(key) => unique_keys.push(KeyInfo(key)),
                None => {
                    trace!(table = %table.name, index = %index.name, "Skipping index with nullable or unknown column")
                }
            }
        }

        if table.pk_is_handle {
            if let Some(pk) = columns.iter().find(|col| col.ty.primary_key) {
                unique_keys.push(KeyInfo(vec![pk.clone()]));
            }
        }

        Self {
            columns,
            unique_keys,
        }
    }

    /// Concatenate the columns of two schemas. Unique keys are not carried over.
    pub fn merge(left: &Schema, right: &Schema) -> Self {
        Self::new(
            left.columns
                .iter()
                .chain(&right.columns)
                .cloned()
                .collect(),
        )
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn append(&mut self, col: Column) {
        self.columns.push(col);
    }

    /// Returns the position of `col` in this schema, if it's present
    pub fn column_index(&self, col: &Column) -> Option<usize> {
        self.columns.iter().position(|c| c.same_column(col))
    }

    pub fn contains(&self, col: &Column) -> bool {
        self.column_index(col).is_some()
    }

    /// Returns this schema's own copy of `col`, if it's present
    pub fn retrieve_column(&self, col: &Column) -> Option<&Column> {
        self.columns.iter().find(|c| c.same_column(col))
    }

    pub fn unique_keys(&self) -> &[KeyInfo] {
        &self.unique_keys
    }

    pub fn set_unique_keys(&mut self, keys: Vec<KeyInfo>) {
        self.unique_keys = keys;
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Column: [{}] Unique key: [{}]",
            self.columns.iter().join(","),
            self.unique_keys.iter().join(",")
        )
    }
}
