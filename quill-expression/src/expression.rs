use std::fmt;

use quill_data::{Datum, FieldType, StatementContext, TypeClass};
use quill_errors::QuillResult;
use rust_decimal::Decimal;

use crate::{Expr, Schema};

/// Operations shared by every kind of expression.
///
/// Implementors provide [`eval`] and [`ty`]; the typed `eval_*` methods are derived from those two
/// and should not normally be overridden. Each of them returns `Ok(None)` for SQL `NULL`.
///
/// [`eval`]: Expression::eval
/// [`ty`]: Expression::ty
pub trait Expression: fmt::Display {
    /// Evaluate this expression against `row`, producing its canonical value
    fn eval(&self, row: &[Datum]) -> QuillResult<Datum>;

    /// The declared type of this expression's result
    fn ty(&self) -> &FieldType;

    /// Evaluate this expression as a signed integer.
    fn eval_int(&self, row: &[Datum], ctx: &StatementContext) -> QuillResult<Option<i64>> {
        if self.ty().is_null_type() {
            return Ok(None);
        }
        let Some(val) = self.eval(row)?.into_non_null() else {
            return Ok(None);
        };
        if self.ty().class() == TypeClass::Int {
            if let Some(v) = val.get_int64() {
                return Ok(Some(v));
            }
        }
        val.to_i64(ctx).map(Some)
    }

    /// Evaluate this expression as a double.
    fn eval_real(&self, row: &[Datum], ctx: &StatementContext) -> QuillResult<Option<f64>> {
        if self.ty().is_null_type() {
            return Ok(None);
        }
        let Some(val) = self.eval(row)?.into_non_null() else {
            return Ok(None);
        };
        if self.ty().class() == TypeClass::Real {
            if let Some(v) = val.get_f64() {
                return Ok(Some(v));
            }
        }
        val.to_f64(ctx).map(Some)
    }

    /// Evaluate this expression as a string.
    fn eval_string(&self, row: &[Datum], _ctx: &StatementContext) -> QuillResult<Option<String>> {
        if self.ty().is_null_type() {
            return Ok(None);
        }
        let Some(val) = self.eval(row)?.into_non_null() else {
            return Ok(None);
        };
        if self.ty().class() == TypeClass::String {
            if let Some(s) = val.get_str() {
                return Ok(Some(s.to_owned()));
            }
        }
        val.to_text().map(Some)
    }

    /// Evaluate this expression as a decimal.
    fn eval_decimal(&self, row: &[Datum], ctx: &StatementContext) -> QuillResult<Option<Decimal>> {
        if self.ty().is_null_type() {
            return Ok(None);
        }
        let Some(val) = self.eval(row)?.into_non_null() else {
            return Ok(None);
        };
        if self.ty().class() == TypeClass::Decimal {
            if let Some(d) = val.get_decimal() {
                return Ok(Some(*d));
            }
        }
        val.to_decimal(ctx).map(Some)
    }

    /// A canonical byte encoding of this expression.
    ///
    /// Structurally equal expressions always produce the same bytes.
    fn hash_code(&self) -> Vec<u8>;

    /// Returns `true` if `other` denotes the same expression as `self`
    fn equals(&self, other: &Expr, ctx: &StatementContext) -> bool;

    /// Returns `true` if this expression references a column of an enclosing query
    fn is_correlated(&self) -> bool;

    /// Turn every correlated reference that `schema` can resolve into an ordinary column
    /// reference.
    fn decorrelate(&self, schema: &Schema) -> Expr;

    /// Point every column reference at its position within `schema`
    fn resolve_indices(&mut self, schema: &Schema) -> QuillResult<()>;
}
