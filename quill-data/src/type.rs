use std::fmt;

use serde::{Deserialize, Serialize};
use test_strategy::Arbitrary;

/// The storage type code of a SQL field, following MySQL's `MYSQL_TYPE_*` enumeration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Arbitrary)]
pub enum TypeCode {
    /// The type of the `NULL` literal.
    Null,
    TinyInt,
    SmallInt,
    MediumInt,
    Int,
    BigInt,
    Float,
    Double,
    NewDecimal,
    VarChar,
    Char,
    Text,
    Blob,
}

/// The evaluation class of a [`TypeCode`], which determines the direct accessor used when an
/// expression's value is read as a given kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeClass {
    Int,
    Real,
    String,
    Decimal,
}

impl TypeCode {
    /// Returns the evaluation class values of this type belong to.
    ///
    /// [`TypeCode::Null`] has no class of its own, and is grouped with strings.
    pub fn class(self) -> TypeClass {
        match self {
            TypeCode::TinyInt
            | TypeCode::SmallInt
            | TypeCode::MediumInt
            | TypeCode::Int
            | TypeCode::BigInt => TypeClass::Int,
            TypeCode::Float | TypeCode::Double => TypeClass::Real,
            TypeCode::NewDecimal => TypeClass::Decimal,
            TypeCode::Null
            | TypeCode::VarChar
            | TypeCode::Char
            | TypeCode::Text
            | TypeCode::Blob => TypeClass::String,
        }
    }

    fn sql_name(self) -> &'static str {
        match self {
            TypeCode::Null => "null",
            TypeCode::TinyInt => "tinyint",
            TypeCode::SmallInt => "smallint",
            TypeCode::MediumInt => "mediumint",
            TypeCode::Int => "int",
            TypeCode::BigInt => "bigint",
            TypeCode::Float => "float",
            TypeCode::Double => "double",
            TypeCode::NewDecimal => "decimal",
            TypeCode::VarChar => "varchar",
            TypeCode::Char => "char",
            TypeCode::Text => "text",
            TypeCode::Blob => "blob",
        }
    }
}

/// The full declared type of a column or expression result.
///
/// Two field types are equal only if every attribute, including flags, is equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Arbitrary)]
pub struct FieldType {
    pub tp: TypeCode,
    /// Display or storage length, if declared
    pub flen: Option<u32>,
    /// Number of fractional digits, if declared
    pub decimal: Option<u8>,
    pub not_null: bool,
    pub primary_key: bool,
    pub unsigned: bool,
}

impl FieldType {
    /// Construct a new nullable, signed field type with the given code and no declared length.
    pub fn new(tp: TypeCode) -> Self {
        Self {
            tp,
            flen: None,
            decimal: None,
            not_null: false,
            primary_key: false,
            unsigned: false,
        }
    }

    /// The type of the `NULL` literal
    pub fn null() -> Self {
        Self::new(TypeCode::Null)
    }

    /// The type of boolean-valued expressions: `tinyint`
    pub fn tiny() -> Self {
        Self::new(TypeCode::TinyInt)
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn unsigned(mut self) -> Self {
        self.unsigned = true;
        self
    }

    pub fn with_flen(mut self, flen: u32) -> Self {
        self.flen = Some(flen);
        self
    }

    pub fn with_decimal(mut self, decimal: u8) -> Self {
        self.decimal = Some(decimal);
        self
    }

    /// Returns the evaluation class of this type
    pub fn class(&self) -> TypeClass {
        self.tp.class()
    }

    /// Returns `true` if this is the type of the `NULL` literal
    pub fn is_null_type(&self) -> bool {
        self.tp == TypeCode::Null
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tp.sql_name())?;
        match (self.flen, self.decimal) {
            (Some(flen), Some(decimal)) => write!(f, "({flen},{decimal})")?,
            (Some(flen), None) => write!(f, "({flen})")?,
            _ => {}
        }
        if self.unsigned {
            write!(f, " unsigned")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes() {
        assert_eq!(TypeCode::TinyInt.class(), TypeClass::Int);
        assert_eq!(TypeCode::BigInt.class(), TypeClass::Int);
        assert_eq!(TypeCode::Double.class(), TypeClass::Real);
        assert_eq!(TypeCode::NewDecimal.class(), TypeClass::Decimal);
        assert_eq!(TypeCode::VarChar.class(), TypeClass::String);
    }

    #[test]
    fn flags_participate_in_equality() {
        let a = FieldType::new(TypeCode::Int);
        assert_ne!(a, a.clone().not_null());
        assert_ne!(a, a.clone().unsigned());
        assert_eq!(a, FieldType::new(TypeCode::Int));
    }

    #[test]
    fn display() {
        assert_eq!(FieldType::tiny().to_string(), "tinyint");
        assert_eq!(
            FieldType::new(TypeCode::NewDecimal)
                .with_flen(10)
                .with_decimal(2)
                .to_string(),
            "decimal(10,2)"
        );
        assert_eq!(
            FieldType::new(TypeCode::BigInt).unsigned().to_string(),
            "bigint unsigned"
        );
    }
}
