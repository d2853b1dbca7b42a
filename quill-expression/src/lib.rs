//! Scalar expressions: the trees of constants, column references and function applications that
//! predicates and projections are built from, along with the rewrites the optimizer applies to
//! them.

use std::fmt;

use quill_data::{Datum, FieldType, StatementContext};
use quill_errors::{QuillError, QuillResult};
use serde::{Serialize, Serializer};

mod assignment;
pub mod catalog;
mod column;
mod constant;
mod expression;
mod fold;
pub mod function;
mod normal_form;
mod schema;
pub mod utils;

pub use crate::assignment::{Assignment, VarAssignment};
pub use crate::column::Column;
pub use crate::constant::{Constant, NULL, ONE, ZERO};
pub use crate::expression::Expression;
pub use crate::fold::{evaluate_expr_with_null, fold_constant};
pub use crate::function::{
    new_cast_func, new_function, new_values_func, BuiltinFunction, ScalarFunction,
};
pub use crate::normal_form::{
    compose_cnf_condition, compose_dnf_condition, split_cnf_items, split_dnf_items, CnfExprs,
};
pub use crate::schema::{columns_from_infos, KeyInfo, Schema};

/// A scalar expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Constant(Constant),
    Column(Column),
    ScalarFunction(ScalarFunction),
}

macro_rules! dispatch {
    ($self:expr, $e:ident => $body:expr) => {
        match $self {
            Expr::Constant($e) => $body,
            Expr::Column($e) => $body,
            Expr::ScalarFunction($e) => $body,
        }
    };
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        dispatch!(self, e => fmt::Display::fmt(e, f))
    }
}

impl Serialize for Expr {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl Expression for Expr {
    fn eval(&self, row: &[Datum]) -> QuillResult<Datum> {
        dispatch!(self, e => e.eval(row))
    }

    fn ty(&self) -> &FieldType {
        dispatch!(self, e => e.ty())
    }

    fn hash_code(&self) -> Vec<u8> {
        dispatch!(self, e => e.hash_code())
    }

    fn equals(&self, other: &Expr, ctx: &StatementContext) -> bool {
        dispatch!(self, e => e.equals(other, ctx))
    }

    fn is_correlated(&self) -> bool {
        dispatch!(self, e => e.is_correlated())
    }

    fn decorrelate(&self, schema: &Schema) -> Expr {
        dispatch!(self, e => e.decorrelate(schema))
    }

    fn resolve_indices(&mut self, schema: &Schema) -> QuillResult<()> {
        dispatch!(self, e => e.resolve_indices(schema))
    }
}

impl Expr {
    /// Returns every column referenced by this expression, depth-first and left to right
    pub fn columns(&self) -> impl Iterator<Item = &Column> + '_ {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out.into_iter()
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a Column>) {
        match self {
            Expr::Column(col) => out.push(col),
            Expr::ScalarFunction(f) => {
                for arg in f.args() {
                    arg.collect_columns(out);
                }
            }
            Expr::Constant(_) => {}
        }
    }

    /// Build a copy of this expression in which every correlated column found in `outer_schema`
    /// is replaced by a constant holding its value in `outer_row`.
    pub fn substitute_correlated(
        &self,
        outer_schema: &Schema,
        outer_row: &[Datum],
    ) -> QuillResult<Expr> {
        match self {
            Expr::Column(col) if col.correlated => match outer_schema.column_index(col) {
                Some(index) => {
                    let value = outer_row
                        .get(index)
                        .cloned()
                        .ok_or(QuillError::ProjectExprInvalidColumnIndex(index))?;
                    Ok(Expr::Constant(Constant::new(value, col.ty.clone())))
                }
                None => Ok(self.clone()),
            },
            Expr::ScalarFunction(f) => {
                let args = f
                    .args()
                    .iter()
                    .map(|arg| arg.substitute_correlated(outer_schema, outer_row))
                    .collect::<QuillResult<Vec<_>>>()?;
                Ok(Expr::ScalarFunction(f.with_args(args)))
            }
            _ => Ok(self.clone()),
        }
    }
}

impl From<Constant> for Expr {
    fn from(c: Constant) -> Self {
        Expr::Constant(c)
    }
}

impl From<Column> for Expr {
    fn from(col: Column) -> Self {
        Expr::Column(col)
    }
}

impl From<ScalarFunction> for Expr {
    fn from(f: ScalarFunction) -> Self {
        Expr::ScalarFunction(f)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use quill_data::TypeCode;

    use super::*;
    use crate::function::{EQ, PLUS};
    use crate::utils::{column_with_type, make_column, make_literal};

    fn bigint() -> FieldType {
        FieldType::new(TypeCode::BigInt)
    }

    #[test]
    fn serializes_as_display_string() {
        let ctx = StatementContext::strict();
        let expr = new_function(
            &ctx,
            EQ,
            FieldType::tiny(),
            vec![make_column("a", 0), make_literal(Datum::from("x"))],
        )
        .unwrap();
        assert_eq!(
            serde_json::to_string(&expr).unwrap(),
            r#""eq(t.a, 'x')""#
        );
    }

    #[test]
    fn columns_are_depth_first() {
        let ctx = StatementContext::strict();
        let inner = new_function(
            &ctx,
            PLUS,
            bigint(),
            vec![make_column("b", 1), make_column("c", 2)],
        )
        .unwrap();
        let expr = new_function(&ctx, EQ, FieldType::tiny(), vec![make_column("a", 0), inner])
            .unwrap();
        assert_eq!(
            expr.columns().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn resolve_indices_recurses() {
        let ctx = StatementContext::strict();
        let schema = Schema::new(vec![
            column_with_type("t", "x", 0, bigint()),
            column_with_type("t", "a", 1, bigint()),
        ]);
        let mut expr = new_function(
            &ctx,
            EQ,
            FieldType::tiny(),
            vec![make_column("a", 7), make_literal(Datum::Int(1))],
        )
        .unwrap();
        expr.resolve_indices(&schema).unwrap();
        assert_eq!(expr.columns().next().map(|c| c.index), Some(1));
        assert_eq!(
            expr.eval(&[Datum::Int(0), Datum::Int(1)]).unwrap(),
            Datum::Int(1)
        );
    }

    #[test]
    fn correlated_columns() {
        let ctx = StatementContext::strict();
        let outer = column_with_type("o", "id", 0, bigint());
        let outer_schema = Schema::new(vec![outer.clone()]);
        let expr = new_function(
            &ctx,
            EQ,
            FieldType::tiny(),
            vec![make_column("a", 0), Expr::Column(outer.into_correlated())],
        )
        .unwrap();
        assert!(expr.is_correlated());

        let substituted = expr
            .substitute_correlated(&outer_schema, &[Datum::Int(4)])
            .unwrap();
        assert!(!substituted.is_correlated());
        assert_eq!(substituted.to_string(), "eq(t.a, 4)");
        assert_eq!(substituted.eval(&[Datum::Int(4)]).unwrap(), Datum::Int(1));
        // the original tree is untouched
        assert!(expr.is_correlated());

        let decorrelated = expr.decorrelate(&outer_schema);
        assert!(!decorrelated.is_correlated());
    }

    #[test]
    fn expressions_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Expr>();
    }
}
