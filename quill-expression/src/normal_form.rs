//! Conversion between flat lists of conditions and balanced `and`/`or` trees.

use quill_data::{Datum, FieldType, StatementContext};
use quill_errors::{internal, QuillResult};
use tracing::trace;

use crate::function::{new_function, AND, OR};
use crate::{Expr, Expression};

/// Build a balanced tree of `op` applications over a non-empty list of conditions.
///
/// The list is split at its midpoint and each half composed recursively, so the result has depth
/// `ceil(log2(conditions.len()))`.
fn compose_balanced(ctx: &StatementContext, conditions: &[Expr], op: &str) -> QuillResult<Expr> {
    match conditions {
        [] => internal!("cannot compose an empty list of conditions"),
        [condition] => Ok(condition.clone()),
        _ => {
            let (left, right) = conditions.split_at(conditions.len() / 2);
            let left = compose_balanced(ctx, left, op)?;
            let right = compose_balanced(ctx, right, op)?;
            new_function(ctx, op, FieldType::tiny(), vec![left, right])
        }
    }
}

fn compose_condition_with_binary_op(
    ctx: &StatementContext,
    conditions: &[Expr],
    op: &str,
) -> QuillResult<Option<Expr>> {
    if conditions.is_empty() {
        return Ok(None);
    }
    trace!(op, num_conditions = conditions.len(), "Composing conditions");
    compose_balanced(ctx, conditions, op).map(Some)
}

/// Combine `conditions` into a single conjunction, or `None` if there are no conditions.
pub fn compose_cnf_condition(
    ctx: &StatementContext,
    conditions: &[Expr],
) -> QuillResult<Option<Expr>> {
    compose_condition_with_binary_op(ctx, conditions, AND)
}

/// Combine `conditions` into a single disjunction, or `None` if there are no conditions.
pub fn compose_dnf_condition(
    ctx: &StatementContext,
    conditions: &[Expr],
) -> QuillResult<Option<Expr>> {
    compose_condition_with_binary_op(ctx, conditions, OR)
}

fn split_normal_form_items(expr: &Expr, op: &str, out: &mut Vec<Expr>) {
    match expr {
        Expr::ScalarFunction(f) if f.name() == op => {
            for arg in f.args() {
                split_normal_form_items(arg, op, out);
            }
        }
        _ => out.push(expr.clone()),
    }
}

/// Flatten every `and` reachable from the root through other `and`s into its operands, in
/// left-to-right order.
pub fn split_cnf_items(expr: &Expr) -> Vec<Expr> {
    let mut items = Vec::new();
    split_normal_form_items(expr, AND, &mut items);
    items
}

/// Flatten every `or` reachable from the root through other `or`s into its operands, in
/// left-to-right order.
pub fn split_dnf_items(expr: &Expr) -> Vec<Expr> {
    let mut items = Vec::new();
    split_normal_form_items(expr, OR, &mut items);
    items
}

/// A list of conditions which must all hold.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CnfExprs(Vec<Expr>);

impl CnfExprs {
    pub fn new(exprs: Vec<Expr>) -> Self {
        Self(exprs)
    }

    /// Split `expr` into its top-level conjuncts
    pub fn from_condition(expr: &Expr) -> Self {
        Self(split_cnf_items(expr))
    }

    pub fn exprs(&self) -> &[Expr] {
        &self.0
    }

    pub fn into_exprs(self) -> Vec<Expr> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` if every condition is true for `row`.
    ///
    /// A NULL condition counts as not holding. An empty list always holds.
    pub fn eval_bool(&self, row: &[Datum], ctx: &StatementContext) -> QuillResult<bool> {
        for expr in &self.0 {
            match expr.eval(row)?.to_bool(ctx)? {
                Some(true) => {}
                Some(false) | None => return Ok(false),
            }
        }
        Ok(true)
    }
}

impl From<Vec<Expr>> for CnfExprs {
    fn from(exprs: Vec<Expr>) -> Self {
        Self(exprs)
    }
}

impl IntoIterator for CnfExprs {
    type Item = Expr;
    type IntoIter = std::vec::IntoIter<Expr>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
