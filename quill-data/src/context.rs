use std::sync::Arc;

use clap::{ArgAction, Args};
use parking_lot::{Mutex, RwLock};
use quill_errors::{QuillError, QuillResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Collation, Datum};

/// Session-level settings which control how values are converted between types.
#[derive(Debug, Clone, PartialEq, Eq, Args, Serialize, Deserialize)]
#[group(id = "session-config")]
pub struct SessionConfig {
    /// Return an error, rather than recording a warning, when text is only partially numeric or
    /// when a value overflows the type it's converted to.
    #[arg(
        long,
        env = "QUILL_STRICT_NUMERIC_CONVERSION",
        default_value_t = true,
        action = ArgAction::Set
    )]
    pub strict_numeric_conversion: bool,

    /// Collation used to compare strings.
    #[arg(
        long,
        env = "QUILL_DEFAULT_COLLATION",
        value_enum,
        default_value = "utf8-bin"
    )]
    pub default_collation: Collation,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            strict_numeric_conversion: true,
            default_collation: Collation::default(),
        }
    }
}

/// Per-statement evaluation policy.
///
/// Carries the flags which decide whether conversion problems are errors or warnings, and
/// collects those warnings. Clones share the same warning list and the same values row.
#[derive(Debug, Clone, Default)]
pub struct StatementContext {
    /// Silently accept partially-numeric text
    pub ignore_truncate: bool,
    /// Record partially-numeric text as a warning instead of failing
    pub truncate_as_warning: bool,
    /// Record out-of-range conversions as a warning and saturate instead of failing
    pub overflow_as_warning: bool,
    /// Collation used when comparing two strings
    pub collation: Collation,
    pub(crate) warnings: Arc<Mutex<Vec<QuillError>>>,
    /// The row an `INSERT ... ON DUPLICATE KEY UPDATE` tried to insert, while its update runs
    pub(crate) values_row: Arc<RwLock<Option<Vec<Datum>>>>,
}

impl StatementContext {
    /// A context which fails on every truncation or overflow.
    pub fn strict() -> Self {
        Self::default()
    }

    /// A context which turns truncation and overflow into warnings.
    pub fn lenient() -> Self {
        Self {
            truncate_as_warning: true,
            overflow_as_warning: true,
            ..Self::default()
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        let lenient = !config.strict_numeric_conversion;
        Self {
            ignore_truncate: false,
            truncate_as_warning: lenient,
            overflow_as_warning: lenient,
            collation: config.default_collation,
            warnings: Default::default(),
            values_row: Default::default(),
        }
    }

    /// Apply the truncation policy to `err`, which must describe a truncated conversion.
    ///
    /// Returns `Ok` if evaluation should continue with the value parsed so far.
    pub fn handle_truncate(&self, err: QuillError) -> QuillResult<()> {
        if self.ignore_truncate {
            return Ok(());
        }
        if self.truncate_as_warning {
            self.append_warning(err);
            return Ok(());
        }
        Err(err)
    }

    /// Apply the overflow policy to `err`, which must describe an out-of-range conversion.
    ///
    /// Returns `Ok` if evaluation should continue with the saturated value.
    pub fn handle_overflow(&self, err: QuillError) -> QuillResult<()> {
        if self.overflow_as_warning {
            self.append_warning(err);
            return Ok(());
        }
        Err(err)
    }

    pub fn append_warning(&self, warning: QuillError) {
        debug!(%warning, "Recording statement warning");
        self.warnings.lock().push(warning);
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.lock().len()
    }

    /// Returns a copy of all the warnings recorded so far
    pub fn warnings(&self) -> Vec<QuillError> {
        self.warnings.lock().clone()
    }

    /// Removes and returns all the warnings recorded so far
    pub fn take_warnings(&self) -> Vec<QuillError> {
        std::mem::take(&mut *self.warnings.lock())
    }

    /// Make `row` the values row read by `values(col)`, replacing any previous one.
    pub fn set_values_row(&self, row: Vec<Datum>) {
        *self.values_row.write() = Some(row);
    }

    pub fn clear_values_row(&self) {
        *self.values_row.write() = None;
    }

    /// Returns the value at `offset` in the current values row.
    ///
    /// Fails if no values row is set, or if it is too short.
    pub fn values_row_value(&self, offset: usize) -> QuillResult<Datum> {
        let guard = self.values_row.read();
        let row = guard.as_ref().ok_or_else(|| {
            QuillError::InvalidOperation("values() used outside of ON DUPLICATE KEY UPDATE".into())
        })?;
        row.get(offset)
            .cloned()
            .ok_or(QuillError::ProjectExprInvalidColumnIndex(offset))
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser, Debug)]
    struct Cli {
        #[command(flatten)]
        session: SessionConfig,
    }

    fn truncated() -> QuillError {
        QuillError::Truncated {
            value: "12abc".into(),
            target_type: "INTEGER".into(),
        }
    }

    #[test]
    fn strict_context_fails() {
        let ctx = StatementContext::strict();
        assert_eq!(ctx.handle_truncate(truncated()), Err(truncated()));
        assert_eq!(ctx.warning_count(), 0);
    }

    #[test]
    fn lenient_context_warns() {
        let ctx = StatementContext::lenient();
        ctx.handle_truncate(truncated()).unwrap();
        assert_eq!(ctx.warnings(), vec![truncated()]);
        assert_eq!(ctx.take_warnings(), vec![truncated()]);
        assert_eq!(ctx.warning_count(), 0);
    }

    #[test]
    fn ignore_truncate_drops_warning() {
        let ctx = StatementContext {
            ignore_truncate: true,
            ..Default::default()
        };
        ctx.handle_truncate(truncated()).unwrap();
        assert_eq!(ctx.warning_count(), 0);
    }

    #[test]
    fn clones_share_warnings() {
        let ctx = StatementContext::lenient();
        let clone = ctx.clone();
        clone.append_warning(truncated());
        assert_eq!(ctx.warning_count(), 1);
    }

    #[test]
    fn session_config_from_args() {
        let cli = Cli::parse_from([
            "quill",
            "--strict-numeric-conversion",
            "false",
            "--default-collation",
            "utf8-general-ci",
        ]);
        assert_eq!(
            cli.session,
            SessionConfig {
                strict_numeric_conversion: false,
                default_collation: Collation::Utf8GeneralCi,
            }
        );
        let ctx = StatementContext::from_config(&cli.session);
        assert!(ctx.truncate_as_warning);
        assert!(ctx.overflow_as_warning);
        assert_eq!(ctx.collation, Collation::Utf8GeneralCi);
    }

    #[test]
    fn session_config_defaults() {
        let cli = Cli::parse_from(["quill"]);
        assert_eq!(cli.session, SessionConfig::default());
        assert!(!StatementContext::from_config(&cli.session).overflow_as_warning);
    }

    #[test]
    fn values_row_is_shared_between_clones() {
        let ctx = StatementContext::strict();
        let clone = ctx.clone();
        assert!(matches!(
            clone.values_row_value(0),
            Err(QuillError::InvalidOperation(_))
        ));

        ctx.set_values_row(vec![Datum::Int(1), Datum::from("x")]);
        assert_eq!(clone.values_row_value(1).unwrap(), Datum::from("x"));
        assert_eq!(
            clone.values_row_value(2),
            Err(QuillError::ProjectExprInvalidColumnIndex(2))
        );

        ctx.clear_values_row();
        assert!(clone.values_row_value(0).is_err());
    }
}
