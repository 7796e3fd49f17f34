use crate::cli::{Cli, Commands, StatusFormat};
use crate::config::{AGENT_DIR, APP_NAME, COMPANION_FILE_NAME};
use crate::error::KitError;
use crate::extract::find_tar;
use crate::inspect::count_contents;
use crate::install::{check_preflight, companion_path, installed_tree_path, run_pipeline};
use crate::types::*;
use crate::ui::Ui;
use anyhow::{Context, Result};
use std::path::{Component, Path, PathBuf};

/// Per-invocation options after defaults are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub dest: PathBuf,
    pub branch: String,
    pub force: bool,
    pub dry_run: bool,
}

impl RunOptions {
    pub fn from_cli(cli: &Cli, settings: &KitSettings) -> Result<Self> {
        let cwd = std::env::current_dir().context("Could not determine current directory")?;
        Ok(Self {
            dest: resolve_dest(&cwd, &cli.path),
            branch: cli
                .branch
                .clone()
                .filter(|b| !b.trim().is_empty())
                .unwrap_or_else(|| settings.default_branch.clone()),
            force: cli.force,
            dry_run: cli.dry_run,
        })
    }
}

/// Absolute form of `path`, with `.` and `..` folded lexically.
pub fn resolve_dest(cwd: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };

    let mut resolved = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            other => resolved.push(other.as_os_str()),
        }
    }
    resolved
}

pub async fn run(cli: &Cli, command: Commands, settings: &KitSettings, ui: Ui) -> Result<()> {
    let options = RunOptions::from_cli(cli, settings)?;
    tracing::debug!("Resolved options: {:?}", options);

    match command {
        Commands::Init => cmd_init(settings, &options, ui).await,
        Commands::Update => cmd_update(settings, &options, ui).await,
        Commands::Status { format } => cmd_status(&options, format, ui),
    }
}

pub async fn cmd_init(settings: &KitSettings, options: &RunOptions, ui: Ui) -> Result<()> {
    let agent_dest = installed_tree_path(&options.dest);

    ui.header(&format!("v{}", env!("CARGO_PKG_VERSION")));

    check_preflight(&options.dest, options.force)?;
    let tar = find_tar()?;

    if options.dry_run {
        // Dry-run output is what the user asked for, so it ignores --quiet
        let report = Ui::new(false);
        report.info("Dry run mode: no files will be written");
        report.step(&format!(
            "Would download from: {} (branch: {})",
            settings.full_repo(),
            options.branch
        ));
        report.step(&format!("Would extract with: {}", tar.display()));
        report.step(&format!("Would install to: {}", agent_dest.display()));
        if agent_dest.is_dir() {
            report.step(&format!("Would overwrite existing {}/ folder", AGENT_DIR));
        }
        return Ok(());
    }

    if agent_dest.is_dir() {
        ui.info(&format!("Replacing existing {}/ folder...", AGENT_DIR));
    }
    ui.info(&format!(
        "Downloading from {} (branch: {})...",
        settings.full_repo(),
        options.branch
    ));

    let request = InstallRequest {
        dest: options.dest.clone(),
        branch: options.branch.clone(),
        overwrite: options.force,
        show_progress: !ui.is_quiet(),
    };
    let outcome = run_pipeline(settings, &request, &tar).await?;

    if !ui.is_quiet() {
        let counts = count_contents(&outcome.installed_path)?;
        ui.blank();
        ui.success("Installation complete!");
        ui.blank();
        ui.counts(&counts);
        ui.blank();
        if outcome.companion_seeded {
            ui.step(&format!("📄 {} copied to project root", COMPANION_FILE_NAME));
        }
        ui.step(&format!("Installed to: {}", outcome.installed_path.display()));
        ui.blank();
    }

    Ok(())
}

/// Re-install over an existing tree, reporting only the final counts.
pub async fn cmd_update(settings: &KitSettings, options: &RunOptions, ui: Ui) -> Result<()> {
    let agent_dest = installed_tree_path(&options.dest);
    if !agent_dest.is_dir() {
        return Err(KitError::NotInstalled {
            path: options.dest.clone(),
        }
        .into());
    }

    ui.header("Update");
    ui.info(&format!("Updating {}/ folder...", AGENT_DIR));

    let forced = RunOptions {
        force: true,
        ..options.clone()
    };
    cmd_init(settings, &forced, Ui::new(true)).await?;

    if options.dry_run {
        return Ok(());
    }

    let counts = count_contents(&agent_dest)?;
    ui.blank();
    ui.success("Update complete!");
    ui.blank();
    ui.counts(&counts);
    ui.blank();
    Ok(())
}

pub fn collect_status(dest: &Path) -> Result<StatusReport> {
    let location = installed_tree_path(dest);
    let installed = location.is_dir();
    let counts = if installed {
        Some(count_contents(&location)?)
    } else {
        None
    };

    Ok(StatusReport {
        installed,
        location,
        counts,
        companion_present: companion_path(dest).is_file(),
    })
}

pub fn cmd_status(options: &RunOptions, format: StatusFormat, ui: Ui) -> Result<()> {
    let report = collect_status(&options.dest)?;

    match format {
        StatusFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        StatusFormat::Yaml => print!("{}", serde_yaml::to_string(&report)?),
        StatusFormat::Plain => print_status(&report, ui),
    }
    Ok(())
}

fn print_status(report: &StatusReport, ui: Ui) {
    ui.header("Status");

    if !report.installed {
        if report.location.symlink_metadata().is_ok() {
            ui.warn(&format!(
                "Not installed: {} exists but is not a directory",
                report.location.display()
            ));
        } else {
            ui.warn(&format!("Not installed: {}/ folder not found", AGENT_DIR));
        }
        ui.hint(&format!("Run: {} init", APP_NAME));
        ui.blank();
        return;
    }

    ui.success("Installed");
    ui.step(&format!("Location: {}", report.location.display()));
    ui.blank();
    if let Some(counts) = &report.counts {
        ui.counts(counts);
    }
    ui.blank();

    if report.companion_present {
        ui.step(&format!("📄 {} found at project root", COMPANION_FILE_NAME));
    } else {
        ui.step(&format!("📄 {} not found at project root", COMPANION_FILE_NAME));
    }
    ui.blank();
}

/// Turn a failed command into one user-facing line plus remediation hints.
pub fn report_failure(err: &anyhow::Error, settings: &KitSettings, dest: &Path, ui: &Ui) {
    tracing::debug!("Command failed: {:?}", err);

    match err.downcast_ref::<KitError>() {
        Some(kit @ (KitError::AlreadyInstalled { .. } | KitError::NotInstalled { .. })) => {
            ui.warn(&kit.to_string())
        }
        Some(kit) if kit.is_pipeline_failure() => ui.error(&format!("Download failed: {}", kit)),
        Some(kit) => ui.error(&kit.to_string()),
        None => ui.error(&format!("{:#}", err)),
    }
    for hint in failure_hints(err, settings, dest) {
        ui.hint(&hint);
    }
}

/// Remediation hints for `err`; every failure gets at least one.
pub fn failure_hints(err: &anyhow::Error, settings: &KitSettings, dest: &Path) -> Vec<String> {
    match err.downcast_ref::<KitError>() {
        Some(kit) => kit.hints(settings),
        None => vec![
            format!("Check that {} is a writable directory", dest.display()),
            "Run again with -v for more detail".to_string(),
        ],
    }
}
