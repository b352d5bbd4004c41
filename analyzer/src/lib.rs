// ctxlint — overwritten-context detection for Go packages
//
// Library root. The front end (lexer, parser, checker, module universe)
// produces checked units; the analysis core (resolve, matcher, group,
// detect) turns one unit into hazards; the driver and reporter run units
// and render results.

pub mod ast;
pub mod binding;
pub mod check;
pub mod detect;
pub mod diag;
pub mod driver;
pub mod error;
pub mod group;
pub mod id;
pub mod lexer;
pub mod logging;
pub mod matcher;
pub mod modules;
pub mod parser;
pub mod provider;
pub mod report;
pub mod resolve;
pub mod source;
pub mod types;

pub use driver::{analyze_unit, run, AnalysisConfig};
pub use error::{AggregateError, RunError, UnitError};
pub use provider::{CheckedUnit, FsProvider, UnitProvider};
