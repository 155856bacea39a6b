// crates/mm_cli/src/main.rs
//
// Obfuscation-mapping engine — CLI entrypoint (spec §6 "Input — CLI").
// Loads two archives, drives the Merge Engine to a fixed point, and writes
// the plain-text mapping file.

mod args;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;

use args::{Args, CliError};
use mm_core::DefaultObfuscationPredicate;
use mm_io::JsonArchiveReader;
use mm_pipeline::{passes::default_pipeline, MergeEngine};

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("mm: error: {}", CliError::Usage(e.to_string()));
            return ExitCode::from(1);
        }
    };

    init_tracing(&args);

    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("mm: error: {e}");
            ExitCode::from(1)
        }
    }
}

fn init_tracing(args: &Args) {
    let default_filter = if args.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn run(args: &Args) -> Result<ExitCode, CliError> {
    let reader = JsonArchiveReader;
    let pred = DefaultObfuscationPredicate::standard();

    let env_a = mm_io::load_environment(&args.archive_a, &reader, &pred)
        .map_err(|source| CliError::Archive { side: "A", path: args.archive_a.clone(), source })?;
    let env_b = mm_io::load_environment(&args.archive_b, &reader, &pred)
        .map_err(|source| CliError::Archive { side: "B", path: args.archive_b.clone(), source })?;

    let config = args.engine_config();
    let mut engine = MergeEngine::new(env_a, env_b, config);
    default_pipeline(&mut engine);

    let summary = engine.run().map_err(CliError::Engine)?;

    mm_report::write_to(&summary.bundle, &args.output)
        .map_err(|source| CliError::Report { path: args.output.clone(), source })?;

    if !args.quiet {
        report_summary(&summary, &args.output);
    }

    Ok(ExitCode::from(0))
}

fn report_summary(summary: &mm_pipeline::RunSummary, output: &Path) {
    let bundle = &summary.bundle;
    println!(
        "mm: classes {}/{} ({:.1}%), methods {}/{} ({:.1}%), fields {}/{} ({:.1}%)",
        bundle.class_coverage().matched,
        bundle.class_coverage().total,
        bundle.class_coverage().ratio() * 100.0,
        bundle.method_coverage().matched,
        bundle.method_coverage().total,
        bundle.method_coverage().ratio() * 100.0,
        bundle.field_coverage().matched,
        bundle.field_coverage().total,
        bundle.field_coverage().ratio() * 100.0,
    );
    println!("mm: {} iterations, mappings written to {}", summary.iterations, output.display());
    for warning in &summary.warnings {
        println!("mm: warning: {warning}");
    }
}
