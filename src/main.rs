use std::{path::Path, process::ExitCode};

use anyhow::{Context, Error};
use clap::Parser;
use log::{error, info};

use nfs_profile::{
    cli::{Cli, Commands, ProfileSource},
    config,
};
use profile_api::{
    config::{Options, ProfileConfig, Variant},
    error::{InternalError, InvalidInputError, ProfileError, ProfileResultExt, ReportError},
};

/// Assembles the profile request from the configuration file, variant and overrides.
fn load_request(source: &ProfileSource) -> Result<ProfileConfig, ProfileError> {
    let mut request = match &source.config {
        Some(path) => config::load_profile_config(path).message(format!(
            "Failed to load profile configuration from '{}'",
            path.display()
        ))?,
        None => ProfileConfig::default(),
    };

    if let Some(variant) = source.variant {
        request.variant = Some(variant.into());
        request.options = None;
    }

    config::apply_overrides(&mut request, source.params.iter().map(String::as_str))
        .message("Failed to apply parameter overrides")?;

    Ok(request)
}

fn write_output(path: Option<&Path>, contents: &str) -> Result<(), ProfileError> {
    match path {
        Some(path) => {
            std::fs::write(path, contents).structured(InvalidInputError::WriteOutput {
                path: path.to_string_lossy().to_string(),
            })?;
            info!("Wrote '{}'", path.display());
        }
        None => print!("{contents}"),
    }
    Ok(())
}

/// Writes `err` as a YAML error object to `path`, or to stdout when no path is given.
fn report_error(path: Option<&Path>, err: &ProfileError) {
    let report = match serde_yaml::to_string(err) {
        Ok(report) => report,
        Err(e) => {
            error!("Failed to serialize error: {e}");
            return;
        }
    };

    match path {
        Some(path) => {
            if let Err(e) = std::fs::write(path, report) {
                error!("Failed to write error to file: {e}");
            }
        }
        None => print!("{report}"),
    }
}

fn generate(source: &ProfileSource, output: Option<&Path>) -> Result<(), ProfileError> {
    let request = load_request(source)?;
    let rspec = nfs_profile::generate(&request)?;
    write_output(output, &rspec)
}

fn validate(source: &ProfileSource) -> Result<(), ProfileError> {
    let request = load_request(source)?;
    let (_, params) = nfs_profile::check(&request)?;
    info!("Profile parameters are valid");

    let rendered =
        serde_yaml::to_string(&params).structured(InternalError::SerializeOutput)?;
    write_output(None, &rendered)
}

fn describe_parameters(variant: Variant) -> Result<(), ProfileError> {
    let registry = nfs_profile::parameters(&Options::from(variant))?;
    let rendered =
        serde_yaml::to_string(&registry).structured(InternalError::SerializeOutput)?;
    write_output(None, &rendered)
}

fn run(args: &Cli) -> Result<(), ProfileError> {
    let (res, error_path) = match &args.command {
        Commands::Generate { source, output } => {
            (generate(source, output.as_deref()), source.error.as_deref())
        }
        Commands::Validate { source } => (validate(source), source.error.as_deref()),
        Commands::Parameters { variant } => (describe_parameters((*variant).into()), None),
    };

    if let Err(e) = &res {
        report_error(error_path, e);
    }

    res.message(format!("Failed to execute '{}' command", args.command))
}

fn setup_logging(args: &Cli) -> Result<(), Error> {
    env_logger::builder()
        .format_timestamp(None)
        .filter_level(args.verbosity)
        .try_init()
        .context("Logger already registered")
}

fn main() -> ExitCode {
    // Parse args
    let args = Cli::parse();

    if let Err(e) = setup_logging(&args) {
        eprintln!("Failed to initialize logging: {e:?}");
        return ExitCode::from(1);
    }

    info!("nfs-profile version: {}", nfs_profile::PROFILE_VERSION);

    if let Err(e) = run(&args) {
        error!("nfs-profile failed: {e:?}");
        return ExitCode::from(2);
    }
    ExitCode::SUCCESS
}
