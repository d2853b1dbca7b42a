use std::cmp::Ordering;
use std::sync::Arc;

use quill_data::{Datum, FieldType, StatementContext, TypeClass};
use quill_errors::{QuillError, QuillResult};
use rust_decimal::Decimal;

use super::BuiltinFunction;
use crate::{Expr, Expression};

macro_rules! non_null {
    ($datum:expr) => {
        match $datum {
            Some(val) => val,
            None => return Ok(Datum::None),
        }
    };
}

fn unary_arg<'a>(name: &str, args: &'a [Expr]) -> QuillResult<&'a Expr> {
    match args {
        [arg] => Ok(arg),
        _ => Err(QuillError::IncorrectParameterCount(name.to_owned())),
    }
}

fn binary_args<'a>(name: &str, args: &'a [Expr]) -> QuillResult<(&'a Expr, &'a Expr)> {
    match args {
        [left, right] => Ok((left, right)),
        _ => Err(QuillError::IncorrectParameterCount(name.to_owned())),
    }
}

fn eval_bool(arg: &Expr, row: &[Datum], ctx: &StatementContext) -> QuillResult<Option<bool>> {
    arg.eval(row)?.to_bool(ctx)
}

/// `and`: false if any argument is false, otherwise NULL if any argument is NULL
#[derive(Debug)]
pub(crate) struct LogicAnd;

impl BuiltinFunction for LogicAnd {
    fn eval(&self, args: &[Expr], row: &[Datum], ctx: &StatementContext) -> QuillResult<Datum> {
        let mut saw_null = false;
        for arg in args {
            match eval_bool(arg, row, ctx)? {
                Some(false) => return Ok(Datum::from(false)),
                Some(true) => {}
                None => saw_null = true,
            }
        }
        Ok(if saw_null {
            Datum::None
        } else {
            Datum::from(true)
        })
    }
}

/// `or`: true if any argument is true, otherwise NULL if any argument is NULL
#[derive(Debug)]
pub(crate) struct LogicOr;

impl BuiltinFunction for LogicOr {
    fn eval(&self, args: &[Expr], row: &[Datum], ctx: &StatementContext) -> QuillResult<Datum> {
        let mut saw_null = false;
        for arg in args {
            match eval_bool(arg, row, ctx)? {
                Some(true) => return Ok(Datum::from(true)),
                Some(false) => {}
                None => saw_null = true,
            }
        }
        Ok(if saw_null {
            Datum::None
        } else {
            Datum::from(false)
        })
    }
}

#[derive(Debug)]
pub(crate) struct LogicXor;

impl BuiltinFunction for LogicXor {
    fn eval(&self, args: &[Expr], row: &[Datum], ctx: &StatementContext) -> QuillResult<Datum> {
        let (left, right) = binary_args(super::XOR, args)?;
        let left = eval_bool(left, row, ctx)?;
        let right = eval_bool(right, row, ctx)?;
        Ok(Datum::from(non_null!(left) != non_null!(right)))
    }
}

#[derive(Debug)]
pub(crate) struct UnaryNot;

impl BuiltinFunction for UnaryNot {
    fn eval(&self, args: &[Expr], row: &[Datum], ctx: &StatementContext) -> QuillResult<Datum> {
        let arg = unary_arg(super::UNARY_NOT, args)?;
        Ok(Datum::from(!non_null!(eval_bool(arg, row, ctx)?)))
    }
}

#[derive(Debug)]
pub(crate) struct IsNull;

impl BuiltinFunction for IsNull {
    fn eval(&self, args: &[Expr], row: &[Datum], _ctx: &StatementContext) -> QuillResult<Datum> {
        let arg = unary_arg(super::IS_NULL, args)?;
        Ok(Datum::from(arg.eval(row)?.is_none()))
    }
}

#[derive(Debug)]
pub(crate) struct IfNull;

impl BuiltinFunction for IfNull {
    fn eval(&self, args: &[Expr], row: &[Datum], _ctx: &StatementContext) -> QuillResult<Datum> {
        let (expr, fallback) = binary_args(super::IF_NULL, args)?;
        match expr.eval(row)? {
            Datum::None => fallback.eval(row),
            val => Ok(val),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// Like `Eq`, but `NULL <=> NULL` is true and `NULL <=> x` is false
    NullEq,
}

impl CompareOp {
    fn name(self) -> &'static str {
        match self {
            CompareOp::Eq => super::EQ,
            CompareOp::Ne => super::NE,
            CompareOp::Lt => super::LT,
            CompareOp::Le => super::LE,
            CompareOp::Gt => super::GT,
            CompareOp::Ge => super::GE,
            CompareOp::NullEq => super::NULL_EQ,
        }
    }

    fn holds(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq | CompareOp::NullEq => ordering.is_eq(),
            CompareOp::Ne => ordering.is_ne(),
            CompareOp::Lt => ordering.is_lt(),
            CompareOp::Le => ordering.is_le(),
            CompareOp::Gt => ordering.is_gt(),
            CompareOp::Ge => ordering.is_ge(),
        }
    }
}

#[derive(Debug)]
pub(crate) struct Compare(pub(crate) CompareOp);

impl BuiltinFunction for Compare {
    fn eval(&self, args: &[Expr], row: &[Datum], ctx: &StatementContext) -> QuillResult<Datum> {
        let (left, right) = binary_args(self.0.name(), args)?;
        let left = left.eval(row)?;
        let right = right.eval(row)?;

        if self.0 == CompareOp::NullEq {
            match (left.is_none(), right.is_none()) {
                (true, true) => return Ok(Datum::from(true)),
                (true, false) | (false, true) => return Ok(Datum::from(false)),
                (false, false) => {}
            }
        } else if left.is_none() || right.is_none() {
            return Ok(Datum::None);
        }

        Ok(Datum::from(self.0.holds(left.compare(ctx, &right)?)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArithmeticOp {
    Plus,
    Minus,
    Mul,
    Div,
}

impl ArithmeticOp {
    fn name(self) -> &'static str {
        match self {
            ArithmeticOp::Plus => super::PLUS,
            ArithmeticOp::Minus => super::MINUS,
            ArithmeticOp::Mul => super::MUL,
            ArithmeticOp::Div => super::DIV,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            ArithmeticOp::Plus => "+",
            ArithmeticOp::Minus => "-",
            ArithmeticOp::Mul => "*",
            ArithmeticOp::Div => "/",
        }
    }
}

/// Binary arithmetic, computed in the evaluation class of the declared return type.
///
/// Division by zero yields NULL. A result outside the range of the return type is an error.
#[derive(Debug)]
pub(crate) struct Arithmetic {
    op: ArithmeticOp,
    ret_type: FieldType,
}

impl Arithmetic {
    pub(crate) fn new(op: ArithmeticOp, ret_type: &FieldType) -> Self {
        Self {
            op,
            ret_type: ret_type.clone(),
        }
    }

    fn overflow(&self, left: impl ToString, right: impl ToString) -> QuillError {
        QuillError::Overflow {
            value: format!(
                "({} {} {})",
                left.to_string(),
                self.op.symbol(),
                right.to_string()
            ),
            target_type: self.ret_type.to_string(),
        }
    }

    fn int_operand(val: Datum, ctx: &StatementContext) -> QuillResult<Option<i128>> {
        Ok(match val {
            Datum::None => None,
            Datum::UnsignedInt(v) => Some(i128::from(v)),
            val => Some(i128::from(val.to_i64(ctx)?)),
        })
    }

    fn eval_int(&self, left: Datum, right: Datum, ctx: &StatementContext) -> QuillResult<Datum> {
        let left = Self::int_operand(left, ctx)?;
        let right = Self::int_operand(right, ctx)?;
        let (a, b) = (non_null!(left), non_null!(right));

        let result = match self.op {
            ArithmeticOp::Plus => a.checked_add(b),
            ArithmeticOp::Minus => a.checked_sub(b),
            ArithmeticOp::Mul => a.checked_mul(b),
            ArithmeticOp::Div if b == 0 => return Ok(Datum::None),
            ArithmeticOp::Div => a.checked_div(b),
        };
        let result = result.ok_or_else(|| self.overflow(a, b))?;

        if self.ret_type.unsigned {
            u64::try_from(result)
                .map(Datum::UnsignedInt)
                .map_err(|_| self.overflow(a, b))
        } else {
            i64::try_from(result)
                .map(Datum::Int)
                .map_err(|_| self.overflow(a, b))
        }
    }

    fn eval_real(&self, left: Datum, right: Datum, ctx: &StatementContext) -> QuillResult<Datum> {
        let left = left.non_null().map(|v| v.to_f64(ctx)).transpose()?;
        let right = right.non_null().map(|v| v.to_f64(ctx)).transpose()?;
        let (a, b) = (non_null!(left), non_null!(right));

        let result = match self.op {
            ArithmeticOp::Plus => a + b,
            ArithmeticOp::Minus => a - b,
            ArithmeticOp::Mul => a * b,
            ArithmeticOp::Div if b == 0.0 => return Ok(Datum::None),
            ArithmeticOp::Div => a / b,
        };
        if !result.is_finite() {
            return Err(self.overflow(a, b));
        }
        Ok(Datum::Double(result))
    }

    fn eval_decimal(
        &self,
        left: Datum,
        right: Datum,
        ctx: &StatementContext,
    ) -> QuillResult<Datum> {
        let left = left.non_null().map(|v| v.to_decimal(ctx)).transpose()?;
        let right = right.non_null().map(|v| v.to_decimal(ctx)).transpose()?;
        let (a, b): (Decimal, Decimal) = (non_null!(left), non_null!(right));

        let result = match self.op {
            ArithmeticOp::Plus => a.checked_add(b),
            ArithmeticOp::Minus => a.checked_sub(b),
            ArithmeticOp::Mul => a.checked_mul(b),
            ArithmeticOp::Div if b.is_zero() => return Ok(Datum::None),
            ArithmeticOp::Div => a.checked_div(b),
        };
        result
            .map(Datum::from)
            .ok_or_else(|| self.overflow(a, b))
    }
}

impl BuiltinFunction for Arithmetic {
    fn eval(&self, args: &[Expr], row: &[Datum], ctx: &StatementContext) -> QuillResult<Datum> {
        let (left, right) = binary_args(self.op.name(), args)?;
        let left = left.eval(row)?;
        let right = right.eval(row)?;

        match self.ret_type.class() {
            TypeClass::Int => self.eval_int(left, right, ctx),
            TypeClass::Decimal => self.eval_decimal(left, right, ctx),
            TypeClass::Real | TypeClass::String => self.eval_real(left, right, ctx),
        }
    }
}

/// Conversion of a single argument to a target type, reading the argument in the target's
/// evaluation class.
#[derive(Debug)]
pub(crate) struct Cast {
    ty: FieldType,
}

impl Cast {
    pub(crate) fn new(ty: &FieldType) -> Self {
        Self { ty: ty.clone() }
    }
}

impl BuiltinFunction for Cast {
    fn eval(&self, args: &[Expr], row: &[Datum], ctx: &StatementContext) -> QuillResult<Datum> {
        let arg = unary_arg(super::CAST, args)?;
        let val = match self.ty.class() {
            TypeClass::Int => Datum::from(arg.eval_int(row, ctx)?),
            TypeClass::Real => Datum::from(arg.eval_real(row, ctx)?),
            TypeClass::Decimal => Datum::from(arg.eval_decimal(row, ctx)?),
            TypeClass::String => Datum::from(arg.eval_string(row, ctx)?),
        };
        val.coerce_to(&self.ty, ctx)
    }
}

/// `values(col)`: the value `col` would have had in the row an `INSERT ... ON DUPLICATE KEY
/// UPDATE` failed to insert
#[derive(Debug)]
pub(crate) struct Values {
    offset: usize,
    ty: FieldType,
}

impl Values {
    pub(crate) fn new(offset: usize, ty: &FieldType) -> Self {
        Self {
            offset,
            ty: ty.clone(),
        }
    }
}

impl BuiltinFunction for Values {
    fn eval(&self, args: &[Expr], _row: &[Datum], ctx: &StatementContext) -> QuillResult<Datum> {
        if !args.is_empty() {
            return Err(QuillError::IncorrectParameterCount(super::VALUES.to_owned()));
        }
        ctx.values_row_value(self.offset)?.coerce_to(&self.ty, ctx)
    }

    fn params(&self) -> Vec<Datum> {
        vec![Datum::from(self.offset as u64)]
    }
}

pub(crate) fn build_and(_: &FieldType) -> Arc<dyn BuiltinFunction> {
    Arc::new(LogicAnd)
}

pub(crate) fn build_or(_: &FieldType) -> Arc<dyn BuiltinFunction> {
    Arc::new(LogicOr)
}

pub(crate) fn build_xor(_: &FieldType) -> Arc<dyn BuiltinFunction> {
    Arc::new(LogicXor)
}

pub(crate) fn build_not(_: &FieldType) -> Arc<dyn BuiltinFunction> {
    Arc::new(UnaryNot)
}

pub(crate) fn build_is_null(_: &FieldType) -> Arc<dyn BuiltinFunction> {
    Arc::new(IsNull)
}

pub(crate) fn build_if_null(_: &FieldType) -> Arc<dyn BuiltinFunction> {
    Arc::new(IfNull)
}

pub(crate) fn build_eq(_: &FieldType) -> Arc<dyn BuiltinFunction> {
    Arc::new(Compare(CompareOp::Eq))
}

pub(crate) fn build_ne(_: &FieldType) -> Arc<dyn BuiltinFunction> {
    Arc::new(Compare(CompareOp::Ne))
}

pub(crate) fn build_lt(_: &FieldType) -> Arc<dyn BuiltinFunction> {
    Arc::new(Compare(CompareOp::Lt))
}

pub(crate) fn build_le(_: &FieldType) -> Arc<dyn BuiltinFunction> {
    Arc::new(Compare(CompareOp::Le))
}

pub(crate) fn build_gt(_: &FieldType) -> Arc<dyn BuiltinFunction> {
    Arc::new(Compare(CompareOp::Gt))
}

pub(crate) fn build_ge(_: &FieldType) -> Arc<dyn BuiltinFunction> {
    Arc::new(Compare(CompareOp::Ge))
}

pub(crate) fn build_null_eq(_: &FieldType) -> Arc<dyn BuiltinFunction> {
    Arc::new(Compare(CompareOp::NullEq))
}

pub(crate) fn build_plus(ret_type: &FieldType) -> Arc<dyn BuiltinFunction> {
    Arc::new(Arithmetic::new(ArithmeticOp::Plus, ret_type))
}

pub(crate) fn build_minus(ret_type: &FieldType) -> Arc<dyn BuiltinFunction> {
    Arc::new(Arithmetic::new(ArithmeticOp::Minus, ret_type))
}

pub(crate) fn build_mul(ret_type: &FieldType) -> Arc<dyn BuiltinFunction> {
    Arc::new(Arithmetic::new(ArithmeticOp::Mul, ret_type))
}

pub(crate) fn build_div(ret_type: &FieldType) -> Arc<dyn BuiltinFunction> {
    Arc::new(Arithmetic::new(ArithmeticOp::Div, ret_type))
}

pub(crate) fn build_cast(ret_type: &FieldType) -> Arc<dyn BuiltinFunction> {
    Arc::new(Cast::new(ret_type))
}
