use anyhow::{bail, Result};
use clap::error::ErrorKind as ClapErrorKind;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use git_mirror::health::CheckResult;
use git_mirror::{HealthCheck, HostReporter, MirrorConfig, MirrorSettings, MirrorTask, SystemGit};

#[derive(Parser)]
#[command(name = "git-mirror")]
#[command(about = "Mirror a git repository to another remote, dropping pull request refs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path (defaults to XDG config location)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// How to report failures to the invoking host
    #[arg(long, global = true, value_enum, default_value = "auto")]
    host: HostArg,

    #[command(flatten)]
    inputs: InputArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Clone the source as a mirror and push it to the destination (default)
    Run,

    /// Check git and the task inputs without mirroring anything
    Doctor,
}

#[derive(clap::ValueEnum, Clone, Copy)]
enum HostArg {
    /// Azure Pipelines when TF_BUILD is set, console otherwise
    Auto,
    /// Plain error output
    Console,
    /// Azure Pipelines logging commands
    AzurePipelines,
}

impl HostArg {
    fn reporter(self) -> HostReporter {
        match self {
            HostArg::Auto => HostReporter::detect(),
            HostArg::Console => HostReporter::Console,
            HostArg::AzurePipelines => HostReporter::AzurePipelines,
        }
    }
}

/// Task inputs. Pipeline hosts pass them as INPUT_<NAME> variables.
#[derive(Args)]
struct InputArgs {
    /// Source repository URI
    #[arg(long, global = true, env = "INPUT_SOURCEGITREPOSITORYURI")]
    source_uri: Option<String>,

    /// Personal access token for the source repository
    #[arg(long, global = true, env = "INPUT_SOURCEGITREPOSITORYPERSONALACCESSTOKEN", hide_env_values = true)]
    source_token: Option<String>,

    /// Local clone directory (defaults to the repository name plus .git)
    #[arg(long, global = true, env = "INPUT_SOURCEGITREPOSITORYCLONEDIRECTORYNAME")]
    clone_dir: Option<String>,

    /// Verify TLS certificates when cloning
    #[arg(
        long,
        global = true,
        env = "INPUT_SOURCEVERIFYSSLCERTIFICATE",
        value_name = "BOOL"
    )]
    source_verify_ssl: Option<String>,

    /// Destination repository URI
    #[arg(long, global = true, env = "INPUT_DESTINATIONGITREPOSITORYURI")]
    destination_uri: Option<String>,

    /// Personal access token for the destination repository
    #[arg(
        long,
        global = true,
        env = "INPUT_DESTINATIONGITREPOSITORYPERSONALACCESSTOKEN",
        hide_env_values = true
    )]
    destination_token: Option<String>,

    /// Verify TLS certificates when pushing
    #[arg(
        long,
        global = true,
        env = "INPUT_DESTINATIONVERIFYSSLCERTIFICATE",
        value_name = "BOOL"
    )]
    destination_verify_ssl: Option<String>,

    /// Git executable to run
    #[arg(long, global = true, env = "INPUT_GITEXECUTABLE")]
    git: Option<String>,
}

impl From<InputArgs> for MirrorSettings {
    fn from(args: InputArgs) -> Self {
        MirrorSettings {
            source_git_repository_uri: args.source_uri,
            source_git_repository_personal_access_token: args.source_token,
            source_git_repository_clone_directory_name: args.clone_dir,
            source_verify_ssl_certificate: args.source_verify_ssl,
            destination_git_repository_uri: args.destination_uri,
            destination_git_repository_personal_access_token: args.destination_token,
            destination_verify_ssl_certificate: args.destination_verify_ssl,
            git_executable: args.git,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => e.exit(),
            // --host may be what failed to parse, so fall back to detection
            _ => std::process::exit(HostReporter::detect().report(&Err(e.into()))),
        },
    };
    let reporter = cli.host.reporter();

    let result = run(cli).await;

    std::process::exit(reporter.report(&result));
}

async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose)?;
    info!("Starting git-mirror v{}", env!("CARGO_PKG_VERSION"));

    // Flags and INPUT_* variables override the config file
    let settings =
        MirrorSettings::load_or_default(cli.config.as_deref())?.merge(cli.inputs.into());

    match cli.command {
        None | Some(Commands::Run) => cmd_run(settings).await,
        Some(Commands::Doctor) => cmd_doctor(&settings),
    }
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    Ok(())
}

/// Mirror the source repository to the destination
async fn cmd_run(settings: MirrorSettings) -> Result<()> {
    let config = MirrorConfig::from_settings(settings)?;
    let git = SystemGit::new(config.git_executable.clone());

    MirrorTask::new(config, git).run().await?;

    Ok(())
}

/// Preflight diagnostics
fn cmd_doctor(settings: &MirrorSettings) -> Result<()> {
    let health = HealthCheck::run(settings);
    print_health_report(&health);

    if !health.all_passed() {
        bail!("Some checks failed");
    }
    Ok(())
}

/// Print health check report to stdout
fn print_health_report(health: &HealthCheck) {
    fn print_check(name: &str, result: &CheckResult) {
        println!("{}:", name);
        let icon = if result.passed {
            if result.is_warning { "⚠️ " } else { "✅" }
        } else {
            "❌"
        };
        println!("  {} {}", icon, result.message);
        if let Some(details) = &result.details {
            for line in details.lines() {
                println!("     {}", line);
            }
        }
    }

    println!("🔍 git-mirror Diagnostics");
    println!();

    for (name, result) in health.all_checks() {
        print_check(name, result);
        println!();
    }

    let warnings = health.warnings();
    if !warnings.is_empty() {
        println!("⚠️  {} warning(s):", warnings.len());
        for (name, result) in warnings {
            println!("   {}: {}", name, result.message);
        }
        println!();
    }

    if health.all_passed() {
        println!("✅ All checks passed");
    } else {
        println!("❌ Some checks failed");
    }
}
