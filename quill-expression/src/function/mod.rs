//! Scalar function applications and the registry used to construct them.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use itertools::Itertools;
use lazy_static::lazy_static;
use quill_data::{Datum, FieldType, StatementContext};
use quill_errors::{QuillError, QuillResult};
use tracing::trace;

use crate::constant::{encode_for_hash, FUNCTION_HASH_TAG};
use crate::{Expr, Expression, Schema};

mod builtins;

pub const AND: &str = "and";
pub const OR: &str = "or";
pub const XOR: &str = "xor";
pub const UNARY_NOT: &str = "not";
pub const EQ: &str = "eq";
pub const NE: &str = "ne";
pub const LT: &str = "lt";
pub const LE: &str = "le";
pub const GT: &str = "gt";
pub const GE: &str = "ge";
pub const NULL_EQ: &str = "nulleq";
pub const IS_NULL: &str = "isnull";
pub const IF_NULL: &str = "ifnull";
pub const PLUS: &str = "plus";
pub const MINUS: &str = "minus";
pub const MUL: &str = "mul";
pub const DIV: &str = "div";
pub const CAST: &str = "cast";
pub const VALUES: &str = "values";

/// The evaluation logic of a scalar function, independent of the arguments it's applied to.
pub trait BuiltinFunction: fmt::Debug + Send + Sync {
    /// Evaluate the function applied to `args` against `row`
    fn eval(&self, args: &[Expr], row: &[Datum], ctx: &StatementContext) -> QuillResult<Datum>;

    /// Values fixed when the function was constructed which, together with the arguments, tell
    /// two applications of the same function apart
    fn params(&self) -> Vec<Datum> {
        Vec::new()
    }
}

type Builder = fn(&FieldType) -> Arc<dyn BuiltinFunction>;

struct FunctionClass {
    min_args: usize,
    max_args: usize,
    build: Builder,
}

impl FunctionClass {
    fn check_arity(&self, name: &str, num_args: usize) -> QuillResult<()> {
        if num_args < self.min_args || num_args > self.max_args {
            return Err(QuillError::IncorrectParameterCount(name.to_owned()));
        }
        Ok(())
    }
}

lazy_static! {
    static ref FUNCTIONS: HashMap<&'static str, FunctionClass> = {
        let entries: [(&'static str, usize, usize, Builder); 18] = [
            (AND, 2, 2, builtins::build_and),
            (OR, 2, 2, builtins::build_or),
            (XOR, 2, 2, builtins::build_xor),
            (UNARY_NOT, 1, 1, builtins::build_not),
            (EQ, 2, 2, builtins::build_eq),
            (NE, 2, 2, builtins::build_ne),
            (LT, 2, 2, builtins::build_lt),
            (LE, 2, 2, builtins::build_le),
            (GT, 2, 2, builtins::build_gt),
            (GE, 2, 2, builtins::build_ge),
            (NULL_EQ, 2, 2, builtins::build_null_eq),
            (IS_NULL, 1, 1, builtins::build_is_null),
            (IF_NULL, 2, 2, builtins::build_if_null),
            (PLUS, 2, 2, builtins::build_plus),
            (MINUS, 2, 2, builtins::build_minus),
            (MUL, 2, 2, builtins::build_mul),
            (DIV, 2, 2, builtins::build_div),
            (CAST, 1, 1, builtins::build_cast),
        ];
        entries
            .into_iter()
            .map(|(name, min_args, max_args, build)| {
                (
                    name,
                    FunctionClass {
                        min_args,
                        max_args,
                        build,
                    },
                )
            })
            .collect()
    };
}

/// Returns `true` if a function with the given name can be constructed with [`new_function`]
pub fn is_builtin(name: &str) -> bool {
    FUNCTIONS.contains_key(name.to_lowercase().as_str())
}

/// An application of a named scalar function to a list of arguments.
///
/// Constructed with [`new_function`], [`new_cast_func`] or [`new_values_func`].
#[derive(Clone)]
pub struct ScalarFunction {
    name: String,
    ret_type: FieldType,
    args: Vec<Expr>,
    function: Arc<dyn BuiltinFunction>,
    ctx: StatementContext,
}

impl ScalarFunction {
    /// The lowercased name of the function
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ret_type(&self) -> &FieldType {
        &self.ret_type
    }

    pub fn args(&self) -> &[Expr] {
        &self.args
    }

    /// The statement context this function evaluates under
    pub fn ctx(&self) -> &StatementContext {
        &self.ctx
    }

    /// Apply the same function to a different list of arguments of the same length
    pub(crate) fn with_args(&self, args: Vec<Expr>) -> Self {
        Self {
            name: self.name.clone(),
            ret_type: self.ret_type.clone(),
            args,
            function: Arc::clone(&self.function),
            ctx: self.ctx.clone(),
        }
    }
}

impl fmt::Debug for ScalarFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScalarFunction")
            .field("name", &self.name)
            .field("ret_type", &self.ret_type)
            .field("args", &self.args)
            .field("function", &self.function)
            .finish_non_exhaustive()
    }
}

impl PartialEq for ScalarFunction {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.ret_type == other.ret_type
            && self.args == other.args
            && self.function.params() == other.function.params()
    }
}

impl Eq for ScalarFunction {}

impl fmt::Display for ScalarFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self.function.params();
        if params.is_empty() {
            write!(f, "{}({})", self.name, self.args.iter().join(", "))
        } else {
            write!(
                f,
                "{}<{}>({})",
                self.name,
                params.iter().join(", "),
                self.args.iter().join(", ")
            )
        }
    }
}

impl Expression for ScalarFunction {
    fn eval(&self, row: &[Datum]) -> QuillResult<Datum> {
        self.function.eval(&self.args, row, &self.ctx)
    }

    fn ty(&self) -> &FieldType {
        &self.ret_type
    }

    fn hash_code(&self) -> Vec<u8> {
        let mut buf = vec![FUNCTION_HASH_TAG];
        encode_for_hash(&mut buf, &Datum::from(self.name.as_str()));
        let params = self.function.params();
        encode_for_hash(&mut buf, &Datum::from(params.len() as u64));
        for param in &params {
            encode_for_hash(&mut buf, param);
        }
        encode_for_hash(&mut buf, &Datum::from(self.args.len() as u64));
        for arg in &self.args {
            buf.extend(arg.hash_code());
        }
        buf
    }

    fn equals(&self, other: &Expr, ctx: &StatementContext) -> bool {
        match other {
            Expr::ScalarFunction(other) => {
                self.name == other.name
                    && self.function.params() == other.function.params()
                    && self.args.len() == other.args.len()
                    && self
                        .args
                        .iter()
                        .zip(&other.args)
                        .all(|(a, b)| a.equals(b, ctx))
            }
            _ => false,
        }
    }

    fn is_correlated(&self) -> bool {
        self.args.iter().any(|arg| arg.is_correlated())
    }

    fn decorrelate(&self, schema: &Schema) -> Expr {
        Expr::ScalarFunction(
            self.with_args(self.args.iter().map(|arg| arg.decorrelate(schema)).collect()),
        )
    }

    fn resolve_indices(&mut self, schema: &Schema) -> QuillResult<()> {
        for arg in &mut self.args {
            arg.resolve_indices(schema)?;
        }
        Ok(())
    }
}

/// Construct an application of the builtin function called `name` (case-insensitively) to
/// `args`, with the given declared return type.
///
/// Fails with [`QuillError::FunctionNotExists`] if there is no such function, and with
/// [`QuillError::IncorrectParameterCount`] if it can't be applied to that many arguments.
pub fn new_function(
    ctx: &StatementContext,
    name: &str,
    ret_type: FieldType,
    args: Vec<Expr>,
) -> QuillResult<Expr> {
    let name = name.to_lowercase();
    let Some(class) = FUNCTIONS.get(name.as_str()) else {
        trace!(%name, "Unknown function");
        return Err(QuillError::FunctionNotExists(name));
    };
    class.check_arity(&name, args.len())?;

    let function = (class.build)(&ret_type);
    Ok(Expr::ScalarFunction(ScalarFunction {
        name,
        ret_type,
        args,
        function,
        ctx: ctx.clone(),
    }))
}

/// Construct a conversion of `arg` to `ty`.
///
/// Unlike [`new_function`] this can't fail, since `cast` always exists and always takes exactly
/// one argument.
pub fn new_cast_func(ty: FieldType, arg: Expr, ctx: &StatementContext) -> Expr {
    let function = builtins::build_cast(&ty);
    Expr::ScalarFunction(ScalarFunction {
        name: CAST.to_owned(),
        ret_type: ty,
        args: vec![arg],
        function,
        ctx: ctx.clone(),
    })
}

/// Construct a read of the column at `offset` in the row an `INSERT ... ON DUPLICATE KEY UPDATE`
/// tried to insert, converted to `ret_type`.
///
/// The row is supplied at execution time through [`StatementContext::set_values_row`].
pub fn new_values_func(offset: usize, ret_type: FieldType, ctx: &StatementContext) -> Expr {
    let function = Arc::new(builtins::Values::new(offset, &ret_type));
    Expr::ScalarFunction(ScalarFunction {
        name: VALUES.to_owned(),
        ret_type,
        args: Vec::new(),
        function,
        ctx: ctx.clone(),
    })
}
