use anyhow::Result;
use clap::{Parser, Subcommand};

/// MDM SCEP SAN Patcher
///
/// Watches every local user profile for MobileIron SCEP enrollment
/// entries and rewrites the SubjectAlternativeNames type code from
/// "Other Name" to UPN before the certificate installer consumes it.
#[derive(Parser, Debug)]
#[command(name = "scep-san-patcher")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the patch loop in the foreground (Ctrl+C to stop)
    Run,
    /// Run a single scan-and-patch cycle, then exit
    CheckNow,
    /// Windows service management
    Service {
        #[command(subcommand)]
        command: ServiceCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ServiceCommands {
    /// Register the agent with the service control manager
    Install,
    /// Remove the agent from the service control manager
    Uninstall,
    /// Service entry point (invoked by the service control manager)
    Run,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command.unwrap_or(Commands::Run) {
        Commands::Run => run_foreground(),
        Commands::CheckNow => check_now(),
        Commands::Service { command } => run_service_command(command),
    }
}

/// Initialize logging
fn init_logging(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let level = if verbose { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();
}

/// Run the patch loop against the live registry until Ctrl+C.
#[cfg(windows)]
fn run_foreground() -> Result<()> {
    use anyhow::Context;
    use scep_san_patcher::{agent, registry};

    let (handle, signal) = agent::shutdown_pair();

    let runtime = tokio::runtime::Runtime::new().context("Failed to create runtime")?;
    runtime.block_on(async move {
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Ctrl+C received, stopping");
                handle.trigger();
            }
        });

        agent::run_patch_daemon(registry::WindowsRegistry, signal).await
    })
}

/// Run exactly one scan-and-patch cycle and report what happened.
#[cfg(windows)]
fn check_now() -> Result<()> {
    use scep_san_patcher::{registry, scep};

    let summary = scep::run_cycle(&registry::WindowsRegistry);

    println!(
        "Scanned {} profiles and {} enrollment entries",
        summary.profiles, summary.entries
    );
    if summary.patched > 0 {
        println!("✓ Patched {} entries", summary.patched);
    } else {
        println!("✓ Nothing to patch");
    }

    Ok(())
}

#[cfg(windows)]
fn run_service_command(command: ServiceCommands) -> Result<()> {
    use scep_san_patcher::service;

    match command {
        ServiceCommands::Install => service::install(),
        ServiceCommands::Uninstall => service::uninstall(),
        ServiceCommands::Run => service::run(),
    }
}

// The registry this agent patches only exists on Windows; the stubs
// below keep the binary buildable (and the core testable) elsewhere.

#[cfg(not(windows))]
fn run_foreground() -> Result<()> {
    anyhow::bail!("The patch loop requires the Windows registry")
}

#[cfg(not(windows))]
fn check_now() -> Result<()> {
    anyhow::bail!("The patch loop requires the Windows registry")
}

#[cfg(not(windows))]
fn run_service_command(_command: ServiceCommands) -> Result<()> {
    anyhow::bail!("Service management requires Windows")
}
