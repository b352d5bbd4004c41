// driver.rs — Per-unit analysis and multi-unit runs
//
// Each unit runs load → resolve sentinel → match → group → detect in its own
// `unit` span. Units are analyzed sequentially in the order given; reports
// are written as soon as they are produced and failures are collected.
//
// Preconditions: none.
// Postconditions: every unit was attempted before `run` returns.
// Failure modes: per-unit `UnitError`s, aggregated; sink I/O errors abort.
// Side effects: writes reports to the sink.

use std::io::Write;
use std::path::Path;

use tracing::{debug, info, info_span, warn};

use crate::detect::detect_all;
use crate::error::{AggregateError, RunError, UnitError};
use crate::group::group_occurrences;
use crate::matcher::match_occurrences;
use crate::provider::UnitProvider;
use crate::report::{write_report, ReportFormat, ReportedHazard, UnitReport};
use crate::resolve::{resolve_sentinel, SentinelSpec};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisConfig {
    pub sentinel: SentinelSpec,
    pub format: ReportFormat,
}

/// Analyze one unit.
pub fn analyze_unit(
    provider: &dyn UnitProvider,
    ident: &str,
    base_dir: &Path,
    config: &AnalysisConfig,
) -> Result<UnitReport, UnitError> {
    let span = info_span!("unit", unit = ident);
    let _enter = span.enter();

    let mut unit = provider.load_unit(ident, base_dir)?;
    debug!(files = unit.files.len(), "files loaded");

    let sentinel = resolve_sentinel(&mut unit, &config.sentinel)?;

    let occurrences = match_occurrences(
        unit.files.iter().map(|f| (f.id, &f.ast)),
        &unit.session.symbols,
        &unit.session.bindings,
        sentinel,
    );
    let occurrence_count = occurrences.len();
    debug!(count = occurrence_count, "occurrences matched");

    let groups = group_occurrences(occurrences);
    debug!(count = groups.len(), "groups formed");

    let hazards = detect_all(&groups);
    debug!(count = hazards.len(), "hazards found");
    info!(
        occurrences = occurrence_count,
        groups = groups.len(),
        hazards = hazards.len(),
        "unit analyzed"
    );

    let sources = &unit.session.sources;
    let hazards = hazards
        .into_iter()
        .map(|h| ReportedHazard {
            kind: h.kind,
            symbol: h.symbol.name,
            positions: h.positions.into_iter().map(|p| sources.position(p)).collect(),
        })
        .collect();

    Ok(UnitReport {
        unit: ident.to_string(),
        fingerprint: unit.fingerprint(),
        hazards,
    })
}

/// Analyze `units` in order, writing each report to `sink`.
///
/// Returns `RunError::Units` listing every failed unit once all units were
/// attempted.
pub fn run(
    provider: &dyn UnitProvider,
    units: &[String],
    base_dir: &Path,
    config: &AnalysisConfig,
    sink: &mut dyn Write,
) -> Result<(), RunError> {
    let mut errors = Vec::new();
    for ident in units {
        match analyze_unit(provider, ident, base_dir, config) {
            Ok(report) => write_report(sink, &report, config.format)?,
            Err(e) => {
                warn!(unit = %ident, error = %e, "unit failed");
                errors.push(e);
            }
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AggregateError { errors }.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::Session;
    use crate::modules::ModuleRegistry;
    use crate::provider::CheckedUnit;
    use std::collections::HashMap;
    use std::sync::Arc;

    /// Serves units from in-memory sources, one file per unit.
    struct MemProvider {
        units: HashMap<&'static str, &'static str>,
    }

    impl UnitProvider for MemProvider {
        fn load_unit(&self, ident: &str, _base_dir: &Path) -> Result<CheckedUnit, UnitError> {
            let load = |message: String| UnitError::Load {
                unit: ident.to_string(),
                message,
            };
            let src = self
                .units
                .get(ident)
                .ok_or_else(|| load(format!("{ident}: no such unit")))?;
            let mut session = Session::new(Arc::new(ModuleRegistry::default()));
            let file = session
                .parse_file(format!("{ident}/main.go"), *src)
                .map_err(|d| load(d.render(&session.sources)))?;
            let package = session
                .check_package(&file.ast.package.name.clone(), std::slice::from_ref(&file))
                .map_err(|d| UnitError::TypeCheck {
                    unit: ident.to_string(),
                    message: d.render(&session.sources),
                })?;
            Ok(CheckedUnit {
                ident: ident.to_string(),
                session,
                files: vec![file],
                package,
            })
        }
    }

    const TWICE: &str = "package main\n\nimport \"golang.org/x/net/context\"\n\nfunc f(ctx context.Context) {\n\tctx = context.WithValue(ctx, 1, 2)\n\tctx = context.WithValue(ctx, 3, 4)\n\t_ = ctx\n}\n";
    const CLEAN: &str = "package main\n\nimport \"golang.org/x/net/context\"\n\nfunc f(ctx context.Context) {\n\t_ = ctx\n}\n";

    fn provider() -> MemProvider {
        MemProvider {
            units: HashMap::from([("twice", TWICE), ("clean", CLEAN)]),
        }
    }

    fn run_units(units: &[&str]) -> (String, Result<(), RunError>) {
        let units: Vec<String> = units.iter().map(|s| s.to_string()).collect();
        let mut out = Vec::new();
        let result = run(&provider(), &units, Path::new("."), &AnalysisConfig::default(), &mut out);
        (String::from_utf8(out).expect("utf8"), result)
    }

    #[test]
    fn reassigned_parameter_is_reported() {
        let report = analyze_unit(&provider(), "twice", Path::new("."), &AnalysisConfig::default())
            .expect("analyzes");
        assert_eq!(report.hazards.len(), 1);
        let lines: Vec<String> = report.hazards[0]
            .positions
            .iter()
            .map(|p| p.to_string())
            .collect();
        assert_eq!(lines, vec!["twice/main.go:6:2", "twice/main.go:7:2"]);
    }

    #[test]
    fn failures_are_collected_and_others_still_reported() {
        let (out, result) = run_units(&["missing", "twice", "clean"]);
        assert_eq!(out, "[Overwrite]\n\t twice/main.go:6:2\n\t twice/main.go:7:2\n");
        match result {
            Err(RunError::Units(agg)) => {
                assert_eq!(agg.errors.len(), 1);
                assert_eq!(agg.errors[0].unit(), "missing");
            }
            other => panic!("expected unit errors, got {other:?}"),
        }
    }

    #[test]
    fn clean_run_succeeds_silently() {
        let (out, result) = run_units(&["clean"]);
        assert!(out.is_empty());
        assert!(result.is_ok());
    }

    #[test]
    fn unresolvable_sentinel_fails_the_unit() {
        let config = AnalysisConfig {
            sentinel: SentinelSpec {
                module: "example.com/missing".into(),
                type_name: "Context".into(),
            },
            ..AnalysisConfig::default()
        };
        let err = analyze_unit(&provider(), "clean", Path::new("."), &config).expect_err("fails");
        assert!(matches!(err, UnitError::UnresolvedModule { .. }));
    }

    #[test]
    fn fingerprint_is_stable() {
        let a = analyze_unit(&provider(), "twice", Path::new("."), &AnalysisConfig::default())
            .expect("analyzes");
        let b = analyze_unit(&provider(), "twice", Path::new("."), &AnalysisConfig::default())
            .expect("analyzes");
        assert_eq!(a, b);
        assert_eq!(a.fingerprint.len(), 64);
    }
}
