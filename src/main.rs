use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use recipe_extractor::{
    mcp, output, server, utils, Cli, Config, RecipeError, RecipePipeline, RecipeService,
};

#[tokio::main]
async fn main() {
    // A .env file in the working directory may provide OPENAI_API_KEY
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Logs go to stderr so stdout stays free for the MCP stdio transport
    let default_filter = if cli.verbose {
        "recipe_extractor=debug,tower_http=debug"
    } else {
        "recipe_extractor=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(err) = run(cli).await {
        eprintln!("{} {:#}", style("Error:").red().bold(), err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let api_key = cli
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .ok_or_else(|| RecipeError::MissingApiKey {
            env_var: "OPENAI_API_KEY".to_string(),
        })?;

    let config = Config::load(cli.config.as_deref())?;
    let pipeline: Arc<dyn RecipeService> = Arc::new(RecipePipeline::new(&config, api_key));

    if cli.server {
        return server::serve(&cli.host, cli.port, pipeline).await;
    }

    if cli.mcp {
        return mcp::serve(cli.mcp_transport, &cli.host, cli.port, pipeline).await;
    }

    let url = cli.url.as_deref().context("A video URL is required")?;

    // Check for required external dependencies (non-fatal)
    let missing_deps = utils::check_dependencies().await;
    if !missing_deps.is_empty() {
        eprintln!("{}", style("⚠️  Dependency check warnings:").yellow());
        for dep in missing_deps {
            eprintln!("   • {}", dep);
        }
    }

    let progress = if cli.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    progress.set_style(
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    progress.set_message(format!(
        "Extracting recipe from {}...",
        utils::extract_domain(url).unwrap_or_else(|| url.to_string())
    ));
    progress.enable_steady_tick(Duration::from_millis(100));

    let started = Instant::now();
    let result = pipeline
        .extract_recipe(url, cli.language, cli.format, cli.save_transcript.as_deref())
        .await;

    let content = match result {
        Ok(content) => {
            progress.finish_and_clear();
            content
        }
        Err(err) => {
            progress.abandon_with_message("Extraction failed");
            return Err(err);
        }
    };

    let path = output::output_path(&cli.output, cli.format);
    output::save_to_file(&content, &path)?;

    println!(
        "{} Recipe saved to: {} ({})",
        style("✅").green(),
        path.display(),
        utils::format_duration(started.elapsed().as_secs_f64())
    );

    if let Some(transcript) = &cli.save_transcript {
        println!("Transcript saved to: {}", transcript.display());
    }

    Ok(())
}
