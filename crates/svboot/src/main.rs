// ABOUTME: svboot CLI entry point.
// ABOUTME: With no arguments, bootstraps and execs the supervisor; `render` only writes its config.

use clap::{Parser, Subcommand};
use svboot::{BootstrapError, ProcessEnv};

#[derive(Parser)]
#[command(name = "svboot")]
#[command(about = "Prepare the runtime workspace, render the supervisor config and exec the supervisor")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the supervisor config and print its path, without launching
    Render,
}

fn main() {
    // Load .env file if present (ignore errors if not found)
    let _ = dotenvy::dotenv();

    svboot_log::init();

    let cli = Cli::parse();

    let err = match cli.command {
        None => match svboot::bootstrap(&ProcessEnv) {
            Ok(never) => match never {},
            Err(e) => e,
        },
        Some(Commands::Render) => match svboot::render_only(&ProcessEnv) {
            Ok(rendered) => {
                println!("{}", rendered.path.display());
                return;
            }
            Err(e) => e,
        },
    };

    report(&err);
    std::process::exit(err.exit_code());
}

fn report(err: &BootstrapError) {
    let stage = err.stage();
    tracing::error!(stage, code = err.exit_code(), error = %err, "Bootstrap failed");
    eprintln!("svboot: {stage} stage failed: {err}");
}
