//! Error handling, definitions, and utilities

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// MySQL error number for `ER_WRONG_PARAMCOUNT_TO_NATIVE_FCT`.
pub const ER_WRONG_PARAMCOUNT_TO_NATIVE_FCT: u16 = 1582;

/// MySQL error number for `ER_SP_DOES_NOT_EXIST`.
pub const ER_SP_DOES_NOT_EXIST: u16 = 1305;

/// General error type to be used across all of the quill crates.
#[derive(Serialize, Deserialize, Error, Debug, Clone, PartialEq, Eq)]
pub enum QuillError {
    /// A value could not be converted to the requested type at all.
    #[error("Error converting value of type {src_type} to {target_type}: {details}")]
    DatumConversionError {
        /// The type of the value that was being converted.
        src_type: String,
        /// The type the value was being converted to.
        target_type: String,
        /// A human-readable description of why the conversion failed.
        details: String,
    },

    /// A value did not fit into the range of the target type.
    #[error("constant {value} overflows {target_type}")]
    Overflow {
        /// The offending value, rendered as text.
        value: String,
        /// The type the value was being converted to.
        target_type: String,
    },

    /// Only a prefix of a textual value could be interpreted as the target type.
    #[error("Truncated incorrect {target_type} value: '{value}'")]
    Truncated {
        /// The full original text.
        value: String,
        /// The type the value was being converted to.
        target_type: String,
    },

    /// A function was called with the wrong number of arguments.
    #[error("Incorrect parameter count in the call to native function '{0}'")]
    IncorrectParameterCount(String),

    /// A function with the given name is not known.
    #[error("FUNCTION {0} does not exist")]
    FunctionNotExists(String),

    /// An operation was applied to operands it cannot be applied to.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// A column reference could not be found in a schema.
    #[error("Column '{0}' not found in schema")]
    ColumnNotFound(String),

    /// A column index pointed past the end of the row being evaluated.
    #[error("Column index {0} is out of bounds for the row being evaluated")]
    ProjectExprInvalidColumnIndex(usize),

    /// A value could not be encoded into bytes.
    #[error("Failed to encode {what}: {message}")]
    EncodingError {
        /// What was being encoded.
        what: String,
        /// The underlying error message.
        message: String,
    },

    /// An internal invariant has been violated.
    ///
    /// This error should only be used when a situation is reached that should never happen; if
    /// this error is returned it indicates a bug.
    #[error("Internal invariant violated: {0}")]
    Internal(String),

    /// The user tried to do something that is not yet supported.
    #[error("Operation unsupported: {0}")]
    Unsupported(String),
}

impl QuillError {
    /// Returns the MySQL error number this error is reported to clients as, if it has one.
    pub fn mysql_code(&self) -> Option<u16> {
        match self {
            Self::IncorrectParameterCount(_) => Some(ER_WRONG_PARAMCOUNT_TO_NATIVE_FCT),
            Self::FunctionNotExists(_) => Some(ER_SP_DOES_NOT_EXIST),
            _ => None,
        }
    }

    /// Returns `true` if this error was raised while converting a value between types.
    pub fn is_conversion_error(&self) -> bool {
        matches!(
            self,
            Self::DatumConversionError { .. } | Self::Overflow { .. } | Self::Truncated { .. }
        )
    }

    /// Returns `true` if this error was raised while constructing a function application.
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            Self::IncorrectParameterCount(_) | Self::FunctionNotExists(_)
        )
    }

    /// Returns `true` if the error is [`QuillError::Unsupported`].
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(..))
    }
}

/// Standard issue [`Result`] alias.
pub type QuillResult<T> = ::std::result::Result<T, QuillError>;

/// Make a new [`QuillError::Internal`] with the provided string-able argument.
pub fn internal_err<T: Into<String>>(err: T) -> QuillError {
    QuillError::Internal(err.into())
}

/// Make a new [`QuillError::Unsupported`] with the provided string-able argument.
pub fn unsupported_err<T: Into<String>>(err: T) -> QuillError {
    QuillError::Unsupported(err.into())
}

/// Renders information about the current source location *if* building in debug mode, for use in
/// error-generating macros
#[doc(hidden)]
#[macro_export]
macro_rules! __location_info {
    () => {
        $crate::__location_info!(" (in {})")
    };
    ($fstr: literal) => {
        if cfg!(debug_assertions) {
            format!(
                $fstr,
                format!("{}:{}:{}", std::file!(), std::line!(), std::column!(),)
            )
        } else {
            "".to_owned()
        }
    };
}

/// Make a new [`QuillError::Internal`], formatting the arguments like [`format!`].
///
/// When building in debug mode, the error also captures file, line, and column information.
#[macro_export]
macro_rules! internal_err {
    ($($tt:tt)*) => {
        $crate::internal_err(format!(
            "{}{}",
            $crate::__location_info!("in {}: "),
            format_args!($($tt)*)
        ))
    };
}

/// Return a [`QuillError::Internal`] from the current function.
///
/// Usage is like [`panic!`], in that you can pass a format string and arguments. When called with
/// no arguments, generates an internal error with the text "entered unreachable code".
#[macro_export]
macro_rules! internal {
    () => {
        $crate::internal!("entered unreachable code")
    };
    ($($tt:tt)*) => {
        return Err($crate::internal_err!($($tt)*).into())
    };
}

/// Make a new [`QuillError::Unsupported`], formatting the arguments like [`format!`].
#[macro_export]
macro_rules! unsupported_err {
    ($($tt:tt)*) => {
        $crate::unsupported_err(format!(
            "{}{}",
            format_args!($($tt)*),
            $crate::__location_info!()
        ))
    };
}

/// Return a [`QuillError::Unsupported`] from the current function.
///
/// When called with no arguments, generates an error with the text "operation not implemented
/// yet".
#[macro_export]
macro_rules! unsupported {
    () => {
        $crate::unsupported!("operation not implemented yet")
    };
    ($($tt:tt)*) => {
        return Err($crate::unsupported_err!($($tt)*).into())
    };
}

/// Return a [`QuillError::Internal`] from the current function, if and only if the argument
/// evaluates to false.
///
/// This is intended to be used wherever [`assert!`] would otherwise be used.
#[macro_export]
macro_rules! invariant {
    ($expr:expr, $($tt:tt)*) => {
        if !$expr {
            $crate::internal!($($tt)*);
        }
    };
    ($expr:expr) => {
        if !$expr {
            $crate::internal!("assertion failed: {}", std::stringify!($expr));
        }
    };
}

/// Return a [`QuillError::Internal`] from the current function, if and only if the two arguments
/// aren't equal.
#[macro_export]
macro_rules! invariant_eq {
    ($expr:expr, $expr2:expr, $($tt:tt)*) => {
        if $expr != $expr2 {
            $crate::internal!(
                "assertion failed: {} == {} ({});\nleft = {:?};\nright = {:?}",
                std::stringify!($expr),
                std::stringify!($expr2),
                format_args!($($tt)*),
                $expr,
                $expr2
            )
        }
    };
    ($expr:expr, $expr2:expr) => {
        if $expr != $expr2 {
            $crate::internal!(
                "assertion failed: {} == {};\nleft = {:?};\nright = {:?}",
                std::stringify!($expr),
                std::stringify!($expr2),
                $expr,
                $expr2
            )
        }
    };
}
