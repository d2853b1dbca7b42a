//! Partial evaluation of expressions.
//!
//! The folder answers questions like "is this predicate null-rejecting on these columns?" by
//! forcing the columns to `NULL` and folding whatever becomes constant.

use quill_data::{Datum, FieldType, StatementContext};
use quill_errors::QuillResult;
use tracing::{trace, trace_span};

use crate::function::new_function;
use crate::{Constant, Expr, Expression, Schema};

/// Replace a function application whose arguments are all constants with its value.
///
/// The resulting constant keeps the function's declared return type. Anything else is returned
/// unchanged, including functions without arguments, whose value comes from the statement rather
/// than from constants. Evaluation errors are returned rather than leaving the application in
/// place.
pub fn fold_constant(expr: Expr) -> QuillResult<Expr> {
    let Expr::ScalarFunction(f) = &expr else {
        return Ok(expr);
    };
    if f.args().is_empty() || !f.args().iter().all(|arg| matches!(arg, Expr::Constant(_))) {
        return Ok(expr);
    }

    let value = f.eval(&[])?;
    trace!(%expr, %value, "Folded constant expression");
    Ok(Expr::Constant(Constant::new(value, f.ret_type().clone())))
}

/// Rewrite `expr` with every column in `schema` replaced by an untyped `NULL`, folding every
/// function application that becomes constant as a result.
///
/// Functions are rebuilt by name through [`new_function`] with their original return type, so any
/// construction or evaluation error aborts the whole rewrite.
pub fn evaluate_expr_with_null(
    ctx: &StatementContext,
    schema: &Schema,
    expr: &Expr,
) -> QuillResult<Expr> {
    let span = trace_span!("evaluate_expr_with_null", %expr);
    let _guard = span.enter();
    substitute_null(ctx, schema, expr)
}

fn substitute_null(ctx: &StatementContext, schema: &Schema, expr: &Expr) -> QuillResult<Expr> {
    match expr {
        Expr::ScalarFunction(f) if !f.args().is_empty() => {
            let args = f
                .args()
                .iter()
                .map(|arg| substitute_null(ctx, schema, arg))
                .collect::<QuillResult<Vec<_>>>()?;
            let rebuilt = new_function(ctx, f.name(), f.ret_type().clone(), args)?;
            fold_constant(rebuilt)
        }
        Expr::Column(col) if schema.contains(col) => {
            trace!(%col, "Substituting NULL for column");
            Ok(Expr::Constant(Constant::new(Datum::None, FieldType::null())))
        }
        _ => Ok(expr.clone()),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use quill_data::TypeCode;
    use quill_errors::QuillError;
    use test_strategy::proptest;

    use super::*;
    use crate::function::{AND, EQ, GT, IF_NULL, IS_NULL, OR, PLUS};
    use crate::utils::{column_with_type, make_literal};
    use crate::Column;

    fn bigint() -> FieldType {
        FieldType::new(TypeCode::BigInt)
    }

    fn col(name: &str, index: usize) -> Column {
        column_with_type("t", name, index, bigint())
    }

    fn call(name: &str, ret_type: FieldType, args: Vec<Expr>) -> Expr {
        new_function(&StatementContext::strict(), name, ret_type, args).unwrap()
    }

    /// `a + 1 > b or isnull(a)`
    fn predicate() -> Expr {
        let plus = call(
            PLUS,
            bigint(),
            vec![Expr::Column(col("a", 0)), make_literal(Datum::Int(1))],
        );
        let gt = call(GT, FieldType::tiny(), vec![plus, Expr::Column(col("b", 1))]);
        let isnull = call(IS_NULL, FieldType::tiny(), vec![Expr::Column(col("a", 0))]);
        call(OR, FieldType::tiny(), vec![gt, isnull])
    }

    #[test]
    fn empty_schema_leaves_columns() {
        quill_tracing::init_test_logging();
        let ctx = StatementContext::strict();
        let expr = predicate();
        let folded = evaluate_expr_with_null(&ctx, &Schema::default(), &expr).unwrap();
        assert_eq!(folded, expr);
    }

    #[test]
    fn null_rejecting_predicate_folds_to_null() {
        let ctx = StatementContext::strict();
        let schema = Schema::new(vec![col("a", 0)]);
        let expr = call(
            GT,
            FieldType::tiny(),
            vec![Expr::Column(col("a", 0)), make_literal(Datum::Int(1))],
        );
        let folded = evaluate_expr_with_null(&ctx, &schema, &expr).unwrap();
        match folded {
            Expr::Constant(c) => {
                assert_eq!(c.value(), &Datum::None);
                assert_eq!(c.ty(), &FieldType::tiny());
            }
            other => panic!("expected a constant, got {other}"),
        }
    }

    #[test]
    fn partial_substitution() {
        let ctx = StatementContext::strict();
        let schema = Schema::new(vec![col("a", 0)]);
        let folded = evaluate_expr_with_null(&ctx, &schema, &predicate()).unwrap();
        // `isnull(NULL)` folds to 1, `NULL + 1` to NULL, and the comparison against `b` remains
        assert_eq!(folded.to_string(), "or(gt(NULL, t.b), 1)");
        assert_eq!(folded.eval(&[Datum::None, Datum::Int(5)]).unwrap(), Datum::Int(1));
    }

    #[test]
    fn non_null_propagating_functions_fold_by_value() {
        let ctx = StatementContext::strict();
        let schema = Schema::new(vec![col("a", 0)]);
        let expr = call(
            IF_NULL,
            bigint(),
            vec![Expr::Column(col("a", 0)), make_literal(Datum::Int(7))],
        );
        let folded = evaluate_expr_with_null(&ctx, &schema, &expr).unwrap();
        assert_eq!(folded, Expr::Constant(Constant::new(Datum::Int(7), bigint())));
    }

    #[test]
    fn fold_errors_abort() {
        let ctx = StatementContext::strict();
        let overflow = call(
            PLUS,
            bigint(),
            vec![
                make_literal(Datum::Int(i64::MAX)),
                make_literal(Datum::Int(1)),
            ],
        );
        let expr = call(
            AND,
            FieldType::tiny(),
            vec![overflow, Expr::Column(col("a", 0))],
        );
        assert!(matches!(
            evaluate_expr_with_null(&ctx, &Schema::default(), &expr),
            Err(QuillError::Overflow { .. })
        ));
    }

    #[test]
    fn fold_constant_leaves_non_constant_args() {
        let expr = call(
            EQ,
            FieldType::tiny(),
            vec![Expr::Column(col("a", 0)), make_literal(Datum::Int(1))],
        );
        assert_eq!(fold_constant(expr.clone()).unwrap(), expr);

        let lit = make_literal(Datum::Int(1));
        assert_eq!(fold_constant(lit.clone()).unwrap(), lit);
    }

    #[test]
    fn argumentless_functions_are_kept() {
        let ctx = StatementContext::strict();
        let schema = Schema::new(vec![col("a", 0)]);
        let values = crate::new_values_func(0, bigint(), &ctx);
        assert_eq!(fold_constant(values.clone()).unwrap(), values);

        let expr = call(
            EQ,
            FieldType::tiny(),
            vec![Expr::Column(col("a", 0)), values.clone()],
        );
        let folded = evaluate_expr_with_null(&ctx, &schema, &expr).unwrap();
        assert_eq!(folded.to_string(), "eq(NULL, values<0>())");
    }

    #[proptest]
    fn folding_matches_forcing_null(a: Option<i32>, b: Option<i32>) {
        let ctx = StatementContext::strict();
        let schema = Schema::new(vec![col("a", 0)]);
        let expr = predicate();
        let folded = evaluate_expr_with_null(&ctx, &schema, &expr).unwrap();

        let row = [Datum::from(a), Datum::from(b)];
        let forced = [Datum::None, Datum::from(b)];
        assert_eq!(folded.eval(&row).unwrap(), expr.eval(&forced).unwrap());
    }
}
