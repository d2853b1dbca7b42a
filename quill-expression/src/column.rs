use std::fmt;

use quill_data::{Datum, FieldType, StatementContext};
use quill_errors::{QuillError, QuillResult};
use serde::{Deserialize, Serialize};

use crate::constant::{encode_for_hash, COLUMN_HASH_TAG};
use crate::{Expr, Expression, Schema};

/// A reference to a column of some table.
///
/// Two columns denote the same column if their table and column names are equal, ignoring ASCII
/// case. The remaining fields describe where the column's value is found in a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub table: String,
    pub name: String,
    pub ty: FieldType,
    /// Position of the column in its table's declaration order
    pub position: usize,
    /// Index of the column's value in the rows this expression is evaluated against
    pub index: usize,
    /// Whether this column belongs to an enclosing query rather than the current one
    pub correlated: bool,
}

impl Column {
    /// Construct a new, uncorrelated column reference whose index is its declaration position
    pub fn new<T, N>(table: T, name: N, ty: FieldType, position: usize) -> Self
    where
        T: Into<String>,
        N: Into<String>,
    {
        Self {
            table: table.into(),
            name: name.into(),
            ty,
            position,
            index: position,
            correlated: false,
        }
    }

    /// Mark this column as a reference to an enclosing query
    pub fn into_correlated(mut self) -> Self {
        self.correlated = true;
        self
    }

    /// Returns `true` if `self` and `other` denote the same table column
    pub fn same_column(&self, other: &Column) -> bool {
        self.table.eq_ignore_ascii_case(&other.table) && self.name.eq_ignore_ascii_case(&other.name)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.table.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}.{}", self.table, self.name)
        }
    }
}

impl Expression for Column {
    fn eval(&self, row: &[Datum]) -> QuillResult<Datum> {
        if self.correlated {
            return Err(QuillError::InvalidOperation(format!(
                "correlated column {self} must be substituted before evaluation"
            )));
        }
        row.get(self.index)
            .cloned()
            .ok_or(QuillError::ProjectExprInvalidColumnIndex(self.index))
    }

    fn ty(&self) -> &FieldType {
        &self.ty
    }

    fn hash_code(&self) -> Vec<u8> {
        let mut buf = vec![COLUMN_HASH_TAG];
        encode_for_hash(&mut buf, &Datum::from(self.table.to_ascii_lowercase()));
        encode_for_hash(&mut buf, &Datum::from(self.name.to_ascii_lowercase()));
        buf
    }

    fn equals(&self, other: &Expr, _ctx: &StatementContext) -> bool {
        match other {
            Expr::Column(other) => self.same_column(other),
            _ => false,
        }
    }

    fn is_correlated(&self) -> bool {
        self.correlated
    }

    fn decorrelate(&self, schema: &Schema) -> Expr {
        let mut col = self.clone();
        if self.correlated && schema.contains(self) {
            col.correlated = false;
        }
        Expr::Column(col)
    }

    fn resolve_indices(&mut self, schema: &Schema) -> QuillResult<()> {
        self.index = schema
            .column_index(self)
            .ok_or_else(|| QuillError::ColumnNotFound(self.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use quill_data::TypeCode;

    use super::*;

    fn col(table: &str, name: &str, position: usize) -> Column {
        Column::new(table, name, FieldType::new(TypeCode::BigInt), position)
    }

    #[test]
    fn eval_reads_index() {
        let c = col("t", "b", 1);
        assert_eq!(
            c.eval(&[Datum::Int(1), Datum::Int(2)]).unwrap(),
            Datum::Int(2)
        );
        assert_eq!(
            c.eval(&[Datum::Int(1)]),
            Err(QuillError::ProjectExprInvalidColumnIndex(1))
        );
    }

    #[test]
    fn identity_ignores_case() {
        let ctx = StatementContext::strict();
        assert!(col("T", "A", 0).equals(&Expr::Column(col("t", "a", 3)), &ctx));
        assert!(!col("t", "a", 0).equals(&Expr::Column(col("u", "a", 0)), &ctx));
        assert_eq!(col("T", "A", 0).hash_code(), col("t", "a", 0).hash_code());
    }

    #[test]
    fn hash_code_separates_table_and_name() {
        assert_ne!(col("t", "ab", 0).hash_code(), col("ta", "b", 0).hash_code());
        assert_ne!(col("t", "a", 0).hash_code(), col("", "t.a", 0).hash_code());
    }

    #[test]
    fn resolve_against_schema() {
        let schema = Schema::new(vec![col("t", "a", 0), col("t", "b", 1)]);
        let mut c = col("t", "B", 7);
        c.resolve_indices(&schema).unwrap();
        assert_eq!(c.index, 1);

        let mut missing = col("t", "z", 0);
        assert_eq!(
            missing.resolve_indices(&schema),
            Err(QuillError::ColumnNotFound("t.z".into()))
        );
    }

    #[test]
    fn decorrelate_known_columns() {
        let schema = Schema::new(vec![col("outer", "a", 0)]);
        let known = col("outer", "a", 0).into_correlated();
        assert!(!known.decorrelate(&schema).is_correlated());

        let unknown = col("other", "a", 0).into_correlated();
        assert!(unknown.decorrelate(&schema).is_correlated());
    }

    #[test]
    fn correlated_columns_must_be_substituted() {
        let c = col("outer", "a", 0).into_correlated();
        assert!(matches!(
            c.eval(&[Datum::Int(1)]),
            Err(QuillError::InvalidOperation(_))
        ));
    }
}
