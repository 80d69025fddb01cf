use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::{error, info};
use core_logging::LoggingPlugin;
use widget_core::config::{AppConfig, ConfigData};
use widget_core::kernel::error::Result;
use widget_core::kernel::Application;
use widget_core::model::slugify;
use widget_core::Manifest;

/// Widget: an application-composition kernel for web apps
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, arg_required_else_help = true)]
struct CliArgs {
    /// Print "pong" and exit
    #[arg(long)]
    ping: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the slug for TEXT without checking uniqueness
    Slug {
        text: String,
        /// Owner type appended to reserved words
        #[arg(long, default_value = "post")]
        owner: String,
    },
    /// Start the server and run until Ctrl-C
    Serve {
        /// JSON, YAML or TOML configuration file
        #[arg(long)]
        config: PathBuf,
    },
    /// Boot without routes or listener and report what registered
    Check {
        /// JSON, YAML or TOML configuration file
        #[arg(long)]
        config: PathBuf,
    },
}

/// Modules statically linked into the binary. The logging plugin finds its
/// subscriber already installed and only registers itself.
fn manifest() -> Manifest {
    Manifest::new().plugin(core_logging::factory)
}

/// Load the configuration and install logging before any startup step runs.
fn configured(path: &Path, serverless: bool) -> Result<Application> {
    let mut data = ConfigData::load(path)?;
    if serverless {
        data.set("serverless", true)?;
    }
    let settings = data.to_typed::<AppConfig>()?;
    LoggingPlugin::from_config(&settings).install()?;

    let mut app = Application::new();
    app.configure(data)?;
    Ok(app)
}

async fn serve(path: &Path) -> Result<()> {
    let mut app = configured(path, false)?;
    let Some(handle) = app.start(manifest()).await? else {
        info!("Serverless configuration; nothing to serve");
        return Ok(());
    };

    println!("Listening on http://{}", handle.address());
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to wait for Ctrl-C: {}", e);
    }
    info!("Shutting down...");
    handle.shutdown().await?;
    Ok(())
}

async fn check(path: &Path) -> Result<()> {
    let mut app = configured(path, true)?;
    let summary = app.boot(manifest()).await?;

    println!("Models: {}", summary.models.join(", "));
    println!("Collections: {}", summary.collections.join(", "));
    println!("Controllers:");
    for controller in &summary.controllers {
        println!("  - {} [{}]", controller.name, controller.methods.join(", "));
    }
    println!("Plugins: {}", summary.plugins.join(", "));
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    if args.ping {
        println!("pong");
        return ExitCode::SUCCESS;
    }

    let result = match args.command {
        Some(Commands::Slug { text, owner }) => {
            println!("{}", slugify(&text, &owner));
            Ok(())
        }
        Some(Commands::Serve { config }) => serve(&config).await,
        Some(Commands::Check { config }) => check(&config).await,
        None => Ok(()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
