use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use engagement_risk::source::{self, RecordSet};
use engagement_risk::window::EvaluationWindows;
use engagement_risk::{db, report, telemetry};
use engagement_risk::{evaluate_client, evaluate_roster, ClientEvaluation, EngineConfig};

#[derive(Parser)]
#[command(name = "engagement-risk")]
#[command(about = "Client engagement risk scoring from periodic progress assessments", long_about = None)]
struct Cli {
    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import progress records from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Score churn risk across the client roster
    Score {
        #[command(flatten)]
        evaluation: EvaluationArgs,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Print the full roster summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        evaluation: EvaluationArgs,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Evaluate one client and print the assessment as JSON
    Client {
        #[command(flatten)]
        evaluation: EvaluationArgs,
        #[arg(long)]
        code: String,
    },
}

#[derive(Args)]
struct EvaluationArgs {
    /// Evaluation date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    as_of: Option<NaiveDate>,
    /// Override the configured window length
    #[arg(long)]
    window_days: Option<i64>,
    /// TOML file with weights and thresholds
    #[arg(long)]
    config: Option<PathBuf>,
    /// Read clients and records from a CSV export instead of Postgres
    #[arg(long)]
    csv: Option<PathBuf>,
}

impl EvaluationArgs {
    fn evaluation_date(&self) -> NaiveDate {
        self.as_of.unwrap_or_else(|| Utc::now().date_naive())
    }

    fn engine_config(&self) -> anyhow::Result<EngineConfig> {
        let config = match &self.config {
            Some(path) => EngineConfig::from_file(path)?,
            None => EngineConfig::default(),
        };
        let config = match self.window_days {
            Some(days) => config.with_window_length(days),
            None => config,
        };
        config.validate()?;
        Ok(config)
    }

    async fn load(&self, config: &EngineConfig) -> anyhow::Result<RecordSet> {
        if let Some(path) = &self.csv {
            return source::load_csv(path);
        }

        let windows = EvaluationWindows::anchored(self.evaluation_date(), config.window_length_days)?;
        let pool = connect().await?;
        let clients = db::fetch_clients(&pool).await?;
        let records = db::fetch_records(&pool, windows.baseline.start).await?;
        info!(
            clients = clients.len(),
            records = records.len(),
            "loaded records from Postgres"
        );
        Ok(RecordSet { clients, records })
    }
}

async fn connect() -> anyhow::Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    telemetry::init(&cli.log_level)?;

    match cli.command {
        Commands::InitDb => {
            let pool = connect().await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = connect().await?;
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let pool = connect().await?;
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} progress records from {}.", csv.display());
        }
        Commands::Score {
            evaluation,
            limit,
            json,
        } => {
            let config = evaluation.engine_config()?;
            let data = evaluation.load(&config).await?;
            let summary = evaluate_roster(
                &data.clients,
                &data.records,
                evaluation.evaluation_date(),
                &config,
            )?;

            if json {
                println!("{}", report::to_json(&summary)?);
                return Ok(());
            }

            if summary.predictions.is_empty() {
                println!("No clients with records in the current window.");
                return Ok(());
            }

            println!(
                "{} clients evaluated: {} high, {} medium, {} low.",
                summary.total_clients,
                summary.high_risk_count,
                summary.medium_risk_count,
                summary.low_risk_count
            );
            println!("Top clients by churn risk:");
            for prediction in summary.predictions.iter().take(limit) {
                println!(
                    "- {} ({}) score {} [{}] {}",
                    prediction.client_name,
                    prediction.client_code,
                    prediction.churn_risk_score,
                    prediction.risk_level,
                    prediction.alert_message
                );
            }
        }
        Commands::Report {
            evaluation,
            limit,
            out,
        } => {
            let config = evaluation.engine_config()?;
            let data = evaluation.load(&config).await?;
            let evaluation_date = evaluation.evaluation_date();
            let summary = evaluate_roster(&data.clients, &data.records, evaluation_date, &config)?;
            let report =
                report::build_report(&summary, evaluation_date, config.window_length_days, limit);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Client { evaluation, code } => {
            let config = evaluation.engine_config()?;
            let data = evaluation.load(&config).await?;
            let client = data
                .clients
                .iter()
                .find(|client| client.client_code == code)
                .with_context(|| format!("no client with code {code}"))?;

            match evaluate_client(client, &data.records, evaluation.evaluation_date(), &config)? {
                ClientEvaluation::Assessed(assessment) => {
                    println!("{}", serde_json::to_string_pretty(&assessment)?);
                }
                ClientEvaluation::InsufficientData => {
                    println!(
                        "{} ({}) has no records in the current window.",
                        client.full_name, client.client_code
                    );
                }
            }
        }
    }

    Ok(())
}
