use std::fmt;

use crate::{Column, Constant, Expr};

/// One `col = expr` item of an `UPDATE ... SET` clause
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub col: Column,
    pub expr: Expr,
}

impl Assignment {
    pub fn new(col: Column, expr: Expr) -> Self {
        Self { col, expr }
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.col, self.expr)
    }
}

/// One assignment of a `SET` statement, to either a user variable or a system variable.
#[derive(Debug, Clone, PartialEq)]
pub struct VarAssignment {
    pub name: String,
    /// The assigned value; `None` when assigning `DEFAULT`
    pub expr: Option<Expr>,
    pub is_default: bool,
    pub is_global: bool,
    pub is_system: bool,
    /// Extra value for variables which take a second argument, like `SET NAMES ... COLLATE ...`
    pub extend_value: Option<Constant>,
}

impl VarAssignment {
    /// Assign `expr` to the user variable `name`
    pub fn user<N: Into<String>>(name: N, expr: Expr) -> Self {
        Self {
            name: name.into(),
            expr: Some(expr),
            is_default: false,
            is_global: false,
            is_system: false,
            extend_value: None,
        }
    }

    /// Assign `expr` to the session-scoped system variable `name`
    pub fn system<N: Into<String>>(name: N, expr: Expr) -> Self {
        Self {
            is_system: true,
            ..Self::user(name, expr)
        }
    }

    /// Reset the system variable `name` to its default value
    pub fn system_default<N: Into<String>>(name: N) -> Self {
        Self {
            name: name.into(),
            expr: None,
            is_default: true,
            is_global: false,
            is_system: true,
            extend_value: None,
        }
    }

    /// Make this a global, rather than session-scoped, assignment
    pub fn global(mut self) -> Self {
        self.is_global = true;
        self
    }

    pub fn with_extend_value(mut self, value: Constant) -> Self {
        self.extend_value = Some(value);
        self
    }
}

#[cfg(test)]
mod tests {
    use quill_data::Datum;

    use super::*;
    use crate::utils::{make_column, make_literal};

    #[test]
    fn assignment_display() {
        let Expr::Column(col) = make_column("a", 0) else {
            unreachable!()
        };
        let assignment = Assignment::new(col, make_literal(Datum::Int(5)));
        assert_eq!(assignment.to_string(), "t.a = 5");
    }

    #[test]
    fn var_assignment_flags() {
        let names = VarAssignment::system("names", make_literal(Datum::from("utf8mb4")))
            .with_extend_value(Constant::from_datum(Datum::from("utf8mb4_bin")));
        assert!(names.is_system);
        assert!(!names.is_global);
        assert!(names.extend_value.is_some());

        let reset = VarAssignment::system_default("sql_mode").global();
        assert!(reset.is_default && reset.is_global && reset.expr.is_none());

        let user = VarAssignment::user("x", make_literal(Datum::Int(1)));
        assert!(!user.is_system && !user.is_default);
    }
}
