use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use apec_client::ApecClient;
use apec_core::TracingReporter;
use apec_core::ledger::JsonFileLedger;
use apec_core::models::{ApplicantProfile, SearchFilter, SessionCredential};
use apec_core::pipeline::{Pipeline, PipelineConfig};
use apec_core::traits::Ledger;

#[derive(Parser)]
#[command(name = "apec-bot", version, about = "Bulk job-application pipeline for the Apec board")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch matching postings and submit an application to each new one
    Apply {
        /// Session cookie string captured from an authenticated browser session
        #[arg(long, env = "APEC_COOKIE", hide_env_values = true)]
        cookie: Option<String>,

        /// File containing the session cookie string
        #[arg(long, env = "APEC_COOKIE_FILE")]
        cookie_file: Option<PathBuf>,

        /// Member account id
        #[arg(long, env = "APEC_ID_CADRE")]
        id_cadre: String,

        /// Stored CV id attached to every application
        #[arg(long, env = "APEC_ID_CV")]
        id_cv: String,

        /// Stored cover-letter id, used when a posting requires one
        #[arg(long, env = "APEC_ID_LM")]
        id_lm: Option<i64>,

        /// Path of the submission ledger
        #[arg(long, default_value = "postulats.json")]
        ledger: PathBuf,

        /// Override the keyword expression of the search filter
        #[arg(long)]
        keywords: Option<String>,

        /// Minimum salary of the search filter, in k€
        #[arg(long)]
        salary_min: Option<String>,

        /// Maximum salary of the search filter, in k€
        #[arg(long)]
        salary_max: Option<String>,

        /// Search page size
        #[arg(long, default_value_t = 100)]
        page_size: u32,

        /// Seconds to wait between submissions
        #[arg(long, default_value_t = 10)]
        pace_secs: u64,

        /// List what would be submitted without submitting anything
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },

    /// Show the postings already recorded in the submission ledger
    Ledger {
        /// Path of the submission ledger
        #[arg(long, default_value = "postulats.json")]
        ledger: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Setup tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Apply {
            cookie,
            cookie_file,
            id_cadre,
            id_cv,
            id_lm,
            ledger,
            keywords,
            salary_min,
            salary_max,
            page_size,
            pace_secs,
            dry_run,
        } => {
            let session = load_session(cookie, cookie_file.as_deref())?;
            let profile = ApplicantProfile::new(id_cadre, id_cv);
            let filter = build_filter(keywords, salary_min, salary_max);
            let config = PipelineConfig {
                range: page_size,
                pace: Duration::from_secs(pace_secs),
                cover_letter_id: id_lm,
            };
            cmd_apply(session, profile, filter, config, &ledger, dry_run).await?;
        }
        Commands::Ledger { ledger } => {
            cmd_ledger(&ledger);
        }
    }

    Ok(())
}

/// Resolve the session credential: an inline cookie wins over a cookie file.
/// Session acquisition itself (login UI, cookie banner) is out of scope; the
/// operator captures the cookie string and hands it to the bot.
fn load_session(cookie: Option<String>, cookie_file: Option<&Path>) -> Result<SessionCredential> {
    if let Some(cookie) = cookie {
        return Ok(SessionCredential::new(cookie));
    }

    if let Some(path) = cookie_file {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read cookie file: {}", path.display()))?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            anyhow::bail!("Cookie file {} is empty", path.display());
        }
        return Ok(SessionCredential::new(trimmed));
    }

    anyhow::bail!(
        "No session credential. Pass --cookie, set APEC_COOKIE, or point --cookie-file at a captured cookie string."
    )
}

fn build_filter(
    keywords: Option<String>,
    salary_min: Option<String>,
    salary_max: Option<String>,
) -> SearchFilter {
    let mut filter = SearchFilter::default();
    if let Some(keywords) = keywords {
        filter = filter.with_keywords(keywords);
    }
    let min = salary_min.unwrap_or_else(|| filter.salaire_minimum.clone());
    let max = salary_max.unwrap_or_else(|| filter.salaire_maximum.clone());
    filter.with_salary_range(min, max)
}

async fn cmd_apply(
    session: SessionCredential,
    profile: ApplicantProfile,
    filter: SearchFilter,
    config: PipelineConfig,
    ledger_path: &Path,
    dry_run: bool,
) -> Result<()> {
    let client = ApecClient::new().context("Failed to create HTTP client")?;
    tracing::info!(ledger = %ledger_path.display(), "Using submission ledger");
    let ledger = JsonFileLedger::open(ledger_path);

    let mut pipeline = Pipeline::new(client.clone(), client, ledger, profile, filter, config);

    if dry_run {
        let fresh = pipeline.plan(&session, &TracingReporter).await?;
        if fresh.is_empty() {
            println!("Nothing new to apply to.");
            return Ok(());
        }
        println!("{} postings would get an application:\n", fresh.len());
        for posting in &fresh {
            println!(
                "  [{}] {} — {} ({})",
                posting.id,
                posting.title,
                posting.company_name,
                posting.salary_text.as_deref().unwrap_or("N/A"),
            );
        }
        return Ok(());
    }

    let summary = pipeline
        .run(&session, &TracingReporter)
        .await
        .map_err(|e| {
            if e.is_session_failure() {
                anyhow::anyhow!(e)
                    .context("The board rejected the session; re-acquire a cookie and re-run")
            } else {
                anyhow::anyhow!(e)
            }
        })?;

    println!(
        "Fetched: {} | Applied: {} | Rejected: {} | Skipped: {}",
        summary.fetched, summary.applied, summary.rejected, summary.skipped
    );

    Ok(())
}

fn cmd_ledger(path: &Path) {
    let ledger = JsonFileLedger::open(path);

    if ledger.is_empty() {
        println!("No recorded applications in {}", path.display());
        return;
    }

    println!("Recorded applications in {}:\n", path.display());
    for id in ledger.ids() {
        println!("  {id}");
    }
    println!("\nTotal: {} postings", ledger.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_cookie_wins_over_file() {
        let session = load_session(Some("a=b".into()), Some(Path::new("/nonexistent"))).unwrap();
        assert_eq!(session.as_str(), "a=b");
    }

    #[test]
    fn test_missing_credential_fails_fast() {
        let err = load_session(None, None).unwrap_err();
        assert!(err.to_string().contains("No session credential"));
    }

    #[test]
    fn test_cookie_file_is_trimmed() {
        let dir = std::env::temp_dir();
        let path = dir.join("apec-bot-test-cookie.txt");
        std::fs::write(&path, "a=b; c=d\n").unwrap();

        let session = load_session(None, Some(&path)).unwrap();
        assert_eq!(session.as_str(), "a=b; c=d");

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_filter_overrides() {
        let filter = build_filter(Some("rust".into()), Some("45".into()), None);
        assert_eq!(filter.mots_cles, "rust");
        assert_eq!(filter.salaire_minimum, "45");
        assert_eq!(filter.salaire_maximum, "200");
    }
}
