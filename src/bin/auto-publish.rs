//! auto-publish CLI
//!
//! Publishes an npm package only when it differs from the registry.

use anyhow::Result;
use auto_publish::{
    AutoPublishConfig, ChangeDetector, CommandRunner, GitCli, NpmRegistryClient, PipelineOptions,
    PublishArgs, PublishError, PublishOutcome, PublishPipeline, detect_changes,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

/// Conditional npm publishing for CI pipelines
#[derive(Parser)]
#[command(name = "auto-publish")]
#[command(version = "0.1.0")]
#[command(about = "Publish the package only when it differs from the registry", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the publish pipeline (detect, test, bump, publish, commit)
    Publish {
        #[command(flatten)]
        args: PublishArgs,

        /// Project directory (defaults to current directory)
        #[arg(long, value_name = "DIR")]
        cwd: Option<PathBuf>,
    },

    /// Report whether the package needs publishing, without side effects
    Check {
        /// Project directory (defaults to current directory)
        #[arg(long, value_name = "DIR")]
        cwd: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let result = run().await;

    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("\n❌ Error");
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Publish { args, cwd } => publish_command(args, cwd).await,
        Commands::Check { cwd } => check_command(cwd).await,
    }
}

async fn publish_command(mut args: PublishArgs, cwd: Option<PathBuf>) -> Result<i32> {
    println!("\n📦 auto-publish\n");

    let project_path = cwd.unwrap_or_else(|| PathBuf::from("."));
    let config = AutoPublishConfig::load(&project_path).await?;

    // CLI takes priority over the config file
    if args.bump.is_none() {
        args.bump = config.bump.clone();
    }

    let runner = Arc::new(CommandRunner::new());
    let mut registry = NpmRegistryClient::new(&project_path);
    if let Some(ref url) = config.registry {
        registry = registry.with_registry(url);
    }
    let vcs = Arc::new(GitCli::new(runner.clone()));
    let pipeline = PublishPipeline::new(Arc::new(registry), runner, vcs);

    let options = PipelineOptions {
        cwd: Some(project_path),
        ..PipelineOptions::default()
    };

    match pipeline.publish(&args, options).await {
        Ok(report) => {
            for warning in &report.warnings {
                eprintln!("⚠️  {}", warning);
            }
            if let PublishOutcome::Published { .. } = report.outcome {
                println!(
                    "\n✅ {}@{} done in {}ms",
                    report.package_name, report.version, report.duration_ms
                );
            }
            Ok(0)
        }
        Err(e) => {
            report_failure(&e);
            Ok(1)
        }
    }
}

async fn check_command(cwd: Option<PathBuf>) -> Result<i32> {
    println!("\n🔍 Change check\n");

    let project_path = cwd.unwrap_or_else(|| PathBuf::from("."));
    let config = AutoPublishConfig::load(&project_path).await?;

    let result = if let Some(ref url) = config.registry {
        let runner = Arc::new(CommandRunner::new());
        let registry = Arc::new(NpmRegistryClient::new(&project_path).with_registry(url));
        ChangeDetector::new(registry, runner)
            .detect(&project_path)
            .await
    } else {
        detect_changes(&project_path).await
    };

    match result {
        Ok(verdict) => {
            if verdict.changed {
                println!("📤 Needs publish: {}", verdict.reason);
            } else {
                println!("✅ Up to date: {}", verdict.reason);
            }
            Ok(0)
        }
        Err(e) => {
            report_failure(&e);
            Ok(1)
        }
    }
}

fn report_failure(error: &PublishError) {
    eprintln!("\n❌ [{}] {}", error.code(), error);
    for action in error.suggested_actions() {
        eprintln!("  - {}", action);
    }
}
