use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use clap::error::ErrorKind;
use provup_cli::config::{self, ConfigMerger};
use provup_cli::render::{JsonReport, render_diagnostics, render_success};
use provup_core::adapters::FsWritePort;
use provup_core::{
    Diagnostic, Diagnostics, FsRepoView, ModuleOutcome, RegistrySource, UpgradeError,
    UpgradeSettings, run_recursive, run_upgrade,
};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Debug, Parser)]
#[command(
    name = "provup",
    version,
    about = "Consolidate the provider requirements of an HCL module into one required_providers block"
)]
struct Cli {
    /// Module directory to upgrade (default: current directory).
    #[arg(value_name = "DIR")]
    dirs: Vec<Utf8PathBuf>,

    /// Registry hostname used to look up legacy providers.
    #[arg(long, value_name = "HOST")]
    registry: Option<String>,

    /// Explicit providers.v1 base URL; skips registry service discovery.
    #[arg(long, value_name = "URL")]
    registry_url: Option<Url>,

    /// File that receives the consolidated block when no single existing file holds one.
    #[arg(long, value_name = "NAME")]
    output_file: Option<String>,

    /// Print the changes as a unified diff instead of writing them.
    #[arg(long)]
    dry_run: bool,

    /// Upgrade every module directory below DIR independently.
    #[arg(long)]
    recursive: bool,

    /// Print results as JSON.
    #[arg(long)]
    json: bool,

    /// Config file (default: provup.toml in DIR, if present).
    #[arg(long, value_name = "PATH")]
    config: Option<Utf8PathBuf>,
}

fn main() -> ExitCode {
    match real_main() {
        Ok(code) => code,
        Err(e) => {
            error!("{:?}", e);
            ExitCode::from(1)
        }
    }
}

fn real_main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            err.print()?;
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            return Ok(ExitCode::from(code));
        }
    };

    let dir = match cli.dirs.as_slice() {
        [] => Utf8PathBuf::from("."),
        [dir] => dir.clone(),
        _ => {
            let diags = Diagnostics::from(Diagnostic::error(
                "Too many arguments",
                "The command provup expects only a single argument, giving the directory containing the module to upgrade.",
            ));
            return report_failure(&cli, Some(&diags));
        }
    };

    let file_config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => config::load_or_default(&dir)?,
    };
    let merged = ConfigMerger::new(file_config).merge_args(
        cli.registry.as_deref(),
        cli.registry_url.as_ref(),
        cli.output_file.as_deref(),
    )?;
    debug!(
        "merged config: registry={}, base_url={:?}, output_file={}",
        merged.registry.host, merged.registry.base_url, merged.output_file
    );

    let settings = UpgradeSettings {
        module_dir: Utf8PathBuf::new(),
        output_file: merged.output_file,
        dry_run: cli.dry_run,
    };
    let repo = FsRepoView::new(dir);
    let source = RegistrySource::with_options(merged.registry);

    let result = if cli.recursive {
        run_recursive(&settings, &repo, &source, &FsWritePort)
    } else {
        run_upgrade(&settings, &repo, &source, &FsWritePort).map(|outcome| {
            vec![ModuleOutcome {
                module_dir: Utf8PathBuf::new(),
                outcome,
            }]
        })
    };

    match result {
        Ok(modules) => report_success(&cli, &modules),
        Err(UpgradeError::Internal(err)) => Err(err),
        Err(err) => {
            debug!("upgrade failed: {}", err);
            report_failure(&cli, err.diagnostics())
        }
    }
}

fn report_success(cli: &Cli, modules: &[ModuleOutcome]) -> anyhow::Result<ExitCode> {
    if cli.json {
        println!("{}", JsonReport::success(modules, cli.dry_run).to_json()?);
        return Ok(ExitCode::SUCCESS);
    }

    let diags: Diagnostics = modules
        .iter()
        .flat_map(|m| m.outcome.diagnostics.iter().cloned())
        .collect();
    eprint!("{}", render_diagnostics(&diags));

    if cli.dry_run {
        for module in modules {
            print!("{}", module.outcome.patch);
        }
    }
    print!("{}", render_success(!diags.is_empty()));
    Ok(ExitCode::SUCCESS)
}

fn report_failure(cli: &Cli, diags: Option<&Diagnostics>) -> anyhow::Result<ExitCode> {
    if cli.json {
        println!("{}", JsonReport::failure(diags).to_json()?);
    } else if let Some(diags) = diags {
        eprint!("{}", render_diagnostics(diags));
    }
    Ok(ExitCode::from(1))
}
