mod config;
mod error;
mod models;
mod services;
mod utils;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, fmt};

use config::{BookConfig, DEFAULT_API_BASE, DEFAULT_MODEL, DEFAULT_TITLE};
use error::BookError;
use services::book::BookDriver;
use services::llm::GeminiClient;

/// Generate a pie-themed Python book, one chapter at a time.
#[derive(Parser, Debug)]
#[command(name = "piebook", version)]
struct Args {
    /// Book title used in every prompt
    #[arg(long, env = "BOOK_TITLE", default_value = DEFAULT_TITLE)]
    title: String,

    /// Directory that receives every generated file
    #[arg(short, long, env = "BOOK_OUTPUT_DIR", default_value = "python_pie_book")]
    output_dir: PathBuf,

    /// Seconds to wait between API calls
    #[arg(long, env = "BOOK_DELAY_SECS", default_value_t = 5)]
    delay_secs: u64,

    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    #[arg(long, env = "GEMINI_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 300)]
    timeout_secs: u64,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Also write COMPLETE_BOOK.epub
    #[arg(long)]
    epub: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    yes: bool,
}

impl Args {
    fn to_config(&self) -> BookConfig {
        BookConfig {
            title: self.title.clone(),
            output_dir: self.output_dir.clone(),
            pacing_delay: Duration::from_secs(self.delay_secs),
            model: self.model.clone(),
            api_base: self.api_base.clone(),
            request_timeout: Duration::from_secs(self.timeout_secs),
            export_epub: self.epub,
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env must be loaded before clap reads env fallbacks
    dotenvy::dotenv().ok();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<ExitCode> {
    println!("Python Pie Book Generator");
    println!("{}", "=".repeat(40));

    let config = args.to_config();

    let api_key = match resolve_api_key(args.api_key.clone()).await {
        Ok(key) => key,
        Err(e) => {
            eprintln!("{}", e);
            return Ok(ExitCode::FAILURE);
        }
    };
    let client = GeminiClient::new(api_key, &config)?;

    println!("\nAbout to generate: {}", config.title);
    println!("Estimated time: {}", config.estimated_runtime);
    println!("Files will be saved to: {}/", config.output_dir.display());

    if !args.yes {
        let answer = prompt_line("\nProceed with book generation? (yes/no): ").await?;
        if !is_affirmative(&answer) {
            println!("Book generation cancelled.");
            return Ok(ExitCode::SUCCESS);
        }
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current step");
            on_interrupt.cancel();
        }
    });

    let output_dir = config.output_dir.clone();
    let driver = BookDriver::new(config, Arc::new(client), cancel);

    let outcome = tokio::spawn(async move { driver.run_full_generation().await })
        .await
        .unwrap_or_else(|e| Err(BookError::Unexpected(e.to_string())));

    match outcome {
        Ok(report) => {
            println!("{}", report.format_summary());
            println!("SUCCESS! Your Python pie book has been generated!");
            Ok(ExitCode::SUCCESS)
        }
        Err(BookError::Cancelled) => {
            println!("\nBook generation interrupted by user.");
            println!("Partial progress saved in {}/", output_dir.display());
            Ok(ExitCode::from(130))
        }
        Err(e) => {
            println!("Any generated content saved in {}/", output_dir.display());
            Err(e.into())
        }
    }
}

/// Key from the environment, or typed in by the user.
async fn resolve_api_key(from_env: Option<String>) -> Result<String, BookError> {
    if let Some(key) = from_env.filter(|k| !k.trim().is_empty()) {
        println!("Gemini API key loaded from environment");
        return Ok(key.trim().to_string());
    }

    eprintln!("{}", BookError::CredentialMissing);
    let key = prompt_line("Enter your Gemini API key manually: ").await?;
    if key.is_empty() {
        return Err(BookError::CredentialMissing);
    }
    println!("API key accepted");
    Ok(key)
}

async fn prompt_line(message: &str) -> std::io::Result<String> {
    print!("{}", message);
    std::io::stdout().flush()?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    Ok(line.trim().to_string())
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
