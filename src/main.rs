use std::collections::HashMap;
use std::io::{self, Write};
use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use exofop_sg1::errors::Sg1Error;
use exofop_sg1::pipeline;
use exofop_sg1::plan::{FilterMetadata, PlanOutcome, UploadPlan};
use exofop_sg1::portal::{execute_plan, ExoFop, Portal};
use exofop_sg1::report::ValidationReport;
use exofop_sg1::run_context::{Coverage, RunContext};

/// TFOP SG1 utility for uploading ground-based transit observations to ExoFOP.
#[derive(Debug, Parser)]
#[command(name = "sg1-upload")]
struct Cli {
    /// ExoFOP account name.
    #[arg(long)]
    username: String,
    /// ExoFOP account password.
    #[arg(long)]
    password: String,
    /// TIC identifier with planet index, e.g. "12345678.01".
    #[arg(long)]
    tic: String,
    /// TOI identifier, e.g. "1234.01", or "0" when the target has no TOI.
    #[arg(long)]
    toi: String,
    /// Directory holding the observation package.
    #[arg(long)]
    directory: Utf8PathBuf,
    /// Transit coverage: Full, Ingress, Egress, or "Out of Transit".
    #[arg(long)]
    coverage: String,
    /// Telescope aperture size in meters.
    #[arg(long)]
    telsize: String,
    /// Camera name.
    #[arg(long)]
    camera: String,
    /// Estimated PSF in arcsec; required for single-filter runs.
    #[arg(long)]
    psf: Option<String>,
    /// Faintest-neighbor delta mag; required for single-filter runs
    /// ("0" leaves the field blank).
    #[arg(long)]
    deltamag: Option<String>,
    /// Free-text notes merged with the auto-generated ones.
    #[arg(long)]
    notes: Option<String>,
    /// Do not submit the per-filter time-series summaries.
    #[arg(long)]
    skip_summary: bool,
    /// Do not upload the recognized files.
    #[arg(long)]
    skip_files: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            eprintln!("ERROR: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Sg1Error> {
    println!("\n===== TFOP SG1 Utility for Uploading Observations to ExoFOP =====");

    let ctx = RunContext::new(
        &cli.tic,
        &cli.toi,
        &cli.username,
        Coverage::parse(&cli.coverage),
        &cli.telsize,
        &cli.camera,
    )?;

    let report = pipeline::run(&cli.directory, &ctx)?;
    println!("{}", report.display());

    if report.has_missing_required()
        && prompt("Proceed with recognized files anyway? [y/N]: ")?.to_lowercase() != "y"
    {
        return Err(Sg1Error::NotConfirmed);
    }

    let metadata = resolve_metadata(&cli, &report)?;
    let user_notes = cli.notes.as_deref().unwrap_or("");

    for (filter, payload) in UploadPlan::payloads(&report, &ctx, &metadata, user_notes) {
        println!("\nObservation Summary (filter {filter}):");
        print!("{payload}");
    }

    if cli.skip_summary && cli.skip_files {
        println!(
            "\nUploads are disabled by settings (both --skip-summary and --skip-files were set). \
             Nothing will be uploaded."
        );
        return Ok(());
    }

    let answer = prompt(
        "\nPress Enter to submit the time-series summaries and upload recognized files to \
         ExoFOP, or type 'n' to cancel: ",
    )?;
    let confirm = answer.to_lowercase() != "n";

    match UploadPlan::plan(
        &report,
        &ctx,
        &metadata,
        user_notes,
        confirm,
        cli.skip_summary,
        cli.skip_files,
    ) {
        PlanOutcome::Blocked(_) => Err(Sg1Error::NotConfirmed),
        PlanOutcome::Operations(items) => {
            let portal = ExoFop::new()?;
            portal.login(&cli.username, &cli.password)?;
            execute_plan(&portal, &cli.directory, &items)?;
            println!("All requested uploads completed.");
            Ok(())
        }
    }
}

/// Resolve PSF/Δmag per filter: command-line values for single-filter runs,
/// interactive prompts otherwise. Only statistics-complete filters need
/// metadata, and only when summaries will be submitted.
fn resolve_metadata(
    cli: &Cli,
    report: &ValidationReport,
) -> Result<HashMap<String, FilterMetadata>, Sg1Error> {
    let mut metadata = HashMap::new();
    if cli.skip_summary {
        return Ok(metadata);
    }

    if report.filters.len() == 1 {
        let psf = cli.psf.as_deref().map(str::trim).unwrap_or("");
        if psf.is_empty() {
            return Err(Sg1Error::MissingArgument(
                "single-filter run: please supply --psf (e.g., '3.41')".into(),
            ));
        }
        let delta = cli.deltamag.as_deref().map(str::trim).unwrap_or("");
        if delta.is_empty() {
            return Err(Sg1Error::MissingArgument(
                "single-filter run: please supply --deltamag (enter '0' to leave blank)".into(),
            ));
        }
        // "0" is the single-filter blank trigger; an empty prompt answer is
        // the multi-filter one. The two are deliberately distinct.
        let delta_mag = if delta == "0" { String::new() } else { delta.to_string() };
        metadata.insert(
            report.filters[0].filter_name.clone(),
            FilterMetadata {
                psf: psf.to_string(),
                delta_mag,
            },
        );
        return Ok(metadata);
    }

    for filter in report.complete_filters() {
        let psf = loop {
            let answer = prompt(&format!(
                "Estimated PSF (arcsec) for filter {} (e.g., 3.41): ",
                filter.filter_name
            ))?;
            if answer.parse::<f64>().is_ok() {
                break answer;
            }
            println!("Please enter a numeric value.");
        };
        let delta_mag = loop {
            let answer = prompt(&format!(
                "Faintest Neighbor delta Mag for filter {} (blank to leave empty): ",
                filter.filter_name
            ))?;
            if answer.is_empty() || answer.parse::<f64>().is_ok() {
                break answer;
            }
            println!("Please enter a numeric value or leave blank.");
        };
        metadata.insert(filter.filter_name.clone(), FilterMetadata { psf, delta_mag });
    }
    Ok(metadata)
}

fn prompt(message: &str) -> io::Result<String> {
    print!("{message}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
