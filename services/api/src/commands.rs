//! Maintenance commands over installer documents on disk.

use crate::infra::{installer_files, read_document, seed_installers, SeedReport};
use clap::Args;
use lutris_web::config::AppConfig;
use lutris_web::error::AppError;
use lutris_web::installers::{
    fix_set, CleanupReport, FixKind, InMemoryHistoryRepository, InMemoryInstallerRepository,
    InstallerCleaner, InstallerDocument, InstallerId, InstallerRepository, InstallerValidator,
    ScriptError, ValidationConfig,
};
use lutris_web::telemetry::{self, LogTarget};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Args, Debug)]
pub(crate) struct ValidateArgs {
    /// Installer documents, or directories of them
    #[arg(required = true)]
    pub(crate) paths: Vec<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct CleanArgs {
    /// Directory of installer documents
    pub(crate) dir: PathBuf,
    /// Fix to apply; repeat for several. Defaults to every fix.
    #[arg(long = "fix", value_parser = parse_fix)]
    pub(crate) fixes: Vec<FixKind>,
    /// Report what would change without writing files
    #[arg(long)]
    pub(crate) dry_run: bool,
}

fn parse_fix(raw: &str) -> Result<FixKind, String> {
    FixKind::parse(raw).ok_or_else(|| {
        let known: Vec<_> = FixKind::all().iter().map(FixKind::name).collect();
        format!("unknown fix '{raw}' (expected one of: {})", known.join(", "))
    })
}

fn load_config() -> Result<AppConfig, AppError> {
    let config = AppConfig::load()?;
    telemetry::init_with_target(&config.telemetry, LogTarget::Stderr)?;
    Ok(config)
}

pub(crate) fn run_validate(args: ValidateArgs) -> Result<ExitCode, AppError> {
    let config = load_config()?;
    let all_valid = validate_paths(&args.paths, config.installers.validation());
    Ok(if all_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Print a report per document; returns whether every document passed.
pub(crate) fn validate_paths(paths: &[PathBuf], config: ValidationConfig) -> bool {
    let validator = InstallerValidator::new(config);
    let mut all_valid = true;

    for path in expand_paths(paths) {
        match check_document(&validator, &path) {
            Ok(errors) if errors.is_empty() => println!("{}: ok", path.display()),
            Ok(errors) => {
                all_valid = false;
                println!("{}: {} problem(s)", path.display(), errors.len());
                for error in errors {
                    println!("  - {error}");
                }
            }
            Err(reason) => {
                all_valid = false;
                println!("{}: unreadable: {reason}", path.display());
            }
        }
    }

    all_valid
}

fn expand_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    paths
        .iter()
        .flat_map(|path| {
            if path.is_dir() {
                installer_files(path)
            } else {
                vec![path.clone()]
            }
        })
        .collect()
}

fn check_document(validator: &InstallerValidator, path: &Path) -> Result<Vec<String>, String> {
    let installer = read_document(path)?
        .into_installer(InstallerId(0))
        .map_err(|err| err.to_string())?;
    validator
        .validate_installer(&installer)
        .map(|report| report.errors())
        .map_err(|err| err.to_string())
}

pub(crate) fn run_clean(args: CleanArgs) -> Result<ExitCode, AppError> {
    let config = load_config()?;
    let cleanup = clean_directory(&args, config.installers.validation())?;
    Ok(if cleanup.succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Outcome of cleaning a directory: the cleanup report plus documents that never loaded.
#[derive(Debug)]
pub(crate) struct DirectoryCleanup {
    pub(crate) report: CleanupReport,
    pub(crate) not_loaded: Vec<(PathBuf, String)>,
}

impl DirectoryCleanup {
    pub(crate) fn succeeded(&self) -> bool {
        self.report.failures.is_empty() && self.not_loaded.is_empty()
    }
}

/// Run the selected fixes over a directory and write changed documents back in place.
pub(crate) fn clean_directory(
    args: &CleanArgs,
    config: ValidationConfig,
) -> Result<DirectoryCleanup, AppError> {
    let installers = Arc::new(InMemoryInstallerRepository::default());
    let history = Arc::new(InMemoryHistoryRepository::default());
    let seeded = seed_installers(installers.as_ref(), &args.dir)?;

    let report = InstallerCleaner::new(
        installers.clone(),
        history,
        fix_set(&args.fixes, &config),
    )
    .dry_run(args.dry_run)
    .run()?;

    if !args.dry_run {
        write_back(installers.as_ref(), &seeded, &report)?;
    }

    print_report(&report, &seeded);
    Ok(DirectoryCleanup {
        report,
        not_loaded: seeded.failures,
    })
}

fn write_back(
    installers: &InMemoryInstallerRepository,
    seeded: &SeedReport,
    report: &CleanupReport,
) -> Result<(), AppError> {
    for change in &report.changed {
        let (Some(source), Some(installer)) = (
            seeded.path_for(&change.slug),
            installers.fetch_by_slug(&change.slug)?,
        ) else {
            continue;
        };

        let mut document = installer.as_document();
        document.id = source.document_id;
        std::fs::write(&source.path, render_document(&source.path, &document)?)?;
        info!(installer = %change.slug, path = %source.path.display(), "installer document rewritten");
    }
    Ok(())
}

/// Serialize a document in the format its file extension names.
fn render_document(path: &Path, document: &InstallerDocument) -> Result<String, AppError> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        let mut text = serde_json::to_string_pretty(document).map_err(std::io::Error::from)?;
        text.push('\n');
        Ok(text)
    } else {
        Ok(serde_yaml::to_string(document).map_err(ScriptError::from)?)
    }
}

fn print_report(report: &CleanupReport, seeded: &SeedReport) {
    for change in &report.changed {
        println!("{} [{}]", change.slug, change.fixes.join(", "));
        for line in &change.changes {
            println!("  - {line}");
        }
    }
    for skip in &report.skipped {
        println!("{} skipped by {}: {}", skip.slug, skip.fix, skip.reason);
    }
    for failure in &report.failures {
        println!("{} failed: {}", failure.slug, failure.reason);
    }
    for (path, reason) in &seeded.failures {
        warn!(path = %path.display(), error = %reason, "document not loaded");
        println!("{} not loaded: {reason}", path.display());
    }
    println!("{}", report.summary());
    if !seeded.failures.is_empty() {
        println!("{} document(s) not loaded", seeded.failures.len());
    }
}
