//! Table metadata, as stored in the catalog.

use quill_data::FieldType;
use serde::{Deserialize, Serialize};

/// The lifecycle state of a schema object which is being added or dropped online.
///
/// Only [`SchemaState::Public`] objects are visible to queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SchemaState {
    #[default]
    None,
    DeleteOnly,
    WriteOnly,
    WriteReorganization,
    DeleteReorganization,
    Public,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub field_type: FieldType,
}

impl ColumnInfo {
    pub fn new<N: Into<String>>(name: N, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexInfo {
    pub name: String,
    /// Names of the indexed columns, in index order
    pub columns: Vec<String>,
    pub unique: bool,
    pub state: SchemaState,
}

impl IndexInfo {
    /// Construct a new public index
    pub fn new<N, C, I>(name: N, columns: I, unique: bool) -> Self
    where
        N: Into<String>,
        C: Into<String>,
        I: IntoIterator<Item = C>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            unique,
            state: SchemaState::Public,
        }
    }

    pub fn with_state(mut self, state: SchemaState) -> Self {
        self.state = state;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    /// Columns in declaration order
    pub columns: Vec<ColumnInfo>,
    pub indices: Vec<IndexInfo>,
    /// Whether the table's integer primary key doubles as the row handle
    pub pk_is_handle: bool,
}
