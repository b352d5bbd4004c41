// Snapshot tests: lock the rendered report formats.
//
// Reports are produced through the library API over `tests/fixtures/` and
// stored under `analyzer/tests/snapshots/`. The JSON snapshot includes the
// unit fingerprint, so any edit to the fixture source changes it.
//
// Run `cargo insta review` after intentional output changes to update baselines.

use std::path::{Path, PathBuf};

use ctxlint::report::ReportFormat;
use ctxlint::{run, AnalysisConfig, FsProvider};

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn render(units: &[&str], format: ReportFormat) -> String {
    let units: Vec<String> = units.iter().map(|u| u.to_string()).collect();
    let config = AnalysisConfig {
        format,
        ..AnalysisConfig::default()
    };
    let mut out = Vec::new();
    run(&FsProvider::default(), &units, &fixtures_dir(), &config, &mut out)
        .unwrap_or_else(|e| panic!("run of {units:?} failed: {e}"));
    String::from_utf8(out).expect("non-UTF8 report")
}

#[test]
fn snapshot_text_two_funcs_multi_file() {
    let out = render(&["two_funcs", "local_clean", "multi_file"], ReportFormat::Text);
    insta::assert_snapshot!("text_two_funcs_multi_file", out);
}

#[test]
fn snapshot_json_local_reassigned() {
    let out = render(&["local_reassigned"], ReportFormat::Json);
    insta::assert_snapshot!("json_local_reassigned", out);
}
