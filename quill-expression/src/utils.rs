//! Helpers to build expression leaves without going through a catalog.
//!
//! Not intended for use outside of tests

use quill_data::{Datum, FieldType, TypeCode};

use crate::{Column, Constant, Expr};

/// Create a `bigint` column reference to `t.<name>` which reads from `index`.
pub fn make_column(name: &str, index: usize) -> Expr {
    Expr::Column(column_with_type("t", name, index, FieldType::new(TypeCode::BigInt)))
}

/// Create a column reference with the given table and type, positioned at `index`
pub fn column_with_type(table: &str, name: &str, index: usize, ty: FieldType) -> Column {
    Column::new(table, name, ty, index)
}

/// Create a constant from a [`Datum`]. Type is inferred from the value.
pub fn make_literal(val: Datum) -> Expr {
    Expr::Constant(Constant::from_datum(val))
}
