// error.rs — Errors surfaced by unit analysis
//
// A unit that cannot be analyzed contributes one `UnitError`; the driver
// keeps going with the remaining units and returns all of them together as
// an `AggregateError`.

use std::fmt;
use std::io;

use thiserror::Error;

/// Why one unit could not be analyzed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    /// The unit's files could not be found, read or parsed.
    #[error("{message}")]
    Load { unit: String, message: String },

    /// The unit's files parsed but did not type-check.
    #[error("{message}")]
    TypeCheck { unit: String, message: String },

    /// The sentinel module could not be imported into the unit's session.
    #[error("{unit}: cannot import sentinel module {module}: {reason}")]
    UnresolvedModule {
        unit: String,
        module: String,
        reason: String,
    },

    /// The sentinel module has no type of the requested name.
    #[error("{unit}: module {module} has no type {name}")]
    UnresolvedType {
        unit: String,
        module: String,
        name: String,
    },
}

impl UnitError {
    /// Identifier of the unit the error belongs to.
    pub fn unit(&self) -> &str {
        match self {
            UnitError::Load { unit, .. }
            | UnitError::TypeCheck { unit, .. }
            | UnitError::UnresolvedModule { unit, .. }
            | UnitError::UnresolvedType { unit, .. } => unit,
        }
    }
}

/// Every unit error of one run, in the order the units were given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateError {
    pub errors: Vec<UnitError>,
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "Error: {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}

/// Failure of a whole run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Units(#[from] AggregateError),

    #[error("writing report: {0}")]
    Io(#[from] io::Error),
}
