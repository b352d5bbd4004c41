use clap::Parser;
use std::io::Write;
use std::path::PathBuf;

use ctxlint::driver::{self, AnalysisConfig};
use ctxlint::error::RunError;
use ctxlint::modules::ModuleRegistry;
use ctxlint::provider::FsProvider;
use ctxlint::report::{self, ReportFormat};
use ctxlint::resolve::SentinelSpec;

#[derive(Parser, Debug)]
#[command(
    name = "ctxlint",
    version,
    about = "ctxlint — reports context variables that are overwritten before they are used"
)]
struct Cli {
    /// Unit directories to analyze, relative to the working directory
    #[arg(required = true)]
    units: Vec<String>,

    /// Module that declares the sentinel type
    #[arg(long, default_value = "golang.org/x/net/context")]
    module: String,

    /// Name of the sentinel type within the module
    #[arg(long = "type", default_value = "Context")]
    type_name: String,

    /// Extra module stub root, consulted before the built-in stubs (repeatable)
    #[arg(long)]
    stub_dir: Vec<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    format: ReportFormat,

    /// Log a summary of each unit's analysis phases
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    ctxlint::logging::init(cli.verbose);

    let base_dir = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Error: cannot determine working directory: {e}");
            std::process::exit(1);
        }
    };

    let provider = FsProvider::new(ModuleRegistry::with_stub_dirs(&cli.stub_dir));
    let config = AnalysisConfig {
        sentinel: SentinelSpec {
            module: cli.module,
            type_name: cli.type_name,
        },
        format: cli.format,
    };

    let stderr = std::io::stderr();
    let mut sink = stderr.lock();
    let result = driver::run(&provider, &cli.units, &base_dir, &config, &mut sink);
    match result {
        Ok(()) => {}
        // The exit status carries the failure; a stderr that cannot be
        // written to has nowhere left to report to.
        Err(RunError::Units(errors)) => {
            let _ = report::write_errors(&mut sink, &errors);
            let _ = sink.flush();
            std::process::exit(1);
        }
        Err(e) => {
            let _ = writeln!(sink, "Error: {e}");
            let _ = sink.flush();
            std::process::exit(1);
        }
    }
}
