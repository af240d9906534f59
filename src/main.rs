use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::error;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod analysis;
mod config;
mod db;
mod error;
mod models;
mod pipeline;
mod report;
mod summary;

use crate::config::{Config, Thresholds};
use crate::db::{SqliteStore, StudentStore};
use crate::models::Dashboard;

#[derive(Parser)]
#[command(name = "student-progress-dashboard")]
#[command(about = "Student progress and engagement early-warning dashboard", long_about = None)]
struct Cli {
    /// SQLite database location.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite://student_dashboard.db"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RecordKind {
    Academic,
    Attendance,
    Engagement,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load demo students with thirty days of records
    Seed,
    /// Import records of one kind from a CSV file
    Import {
        #[arg(long, value_enum)]
        kind: RecordKind,
        #[arg(long)]
        csv: PathBuf,
    },
    /// Build the dashboard for a student and store the alerts it raises
    Dashboard {
        #[arg(long)]
        student: String,
        #[arg(long, default_value_t = summary::DEFAULT_WINDOW_DAYS)]
        window_days: i64,
        /// Print the payload as JSON instead of text
        #[arg(long)]
        json: bool,
        /// TOML file overriding the rule thresholds
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// List stored alerts for a student
    Alerts {
        #[arg(long)]
        student: String,
        #[arg(long)]
        include_resolved: bool,
    },
    /// Mark an alert as resolved
    Resolve {
        #[arg(long)]
        alert: Uuid,
    },
    /// Write a markdown report for a student
    Report {
        #[arg(long)]
        student: String,
        #[arg(long, default_value_t = summary::DEFAULT_WINDOW_DAYS)]
        window_days: i64,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
        /// TOML file overriding the rule thresholds
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn load_thresholds(path: Option<&Path>) -> anyhow::Result<Thresholds> {
    match path {
        Some(path) => Ok(Config::load(path)?.thresholds),
        None => Ok(Thresholds::default()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let store = SqliteStore::connect(&cli.database_url)
        .await
        .context("failed to connect to the database")?;

    match cli.command {
        Commands::InitDb => {
            store.init().await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            store.seed().await?;
            println!("Seed data inserted.");
        }
        Commands::Import { kind, csv } => {
            let inserted = match kind {
                RecordKind::Academic => store.import_academic_csv(&csv).await?,
                RecordKind::Attendance => store.import_attendance_csv(&csv).await?,
                RecordKind::Engagement => store.import_engagement_csv(&csv).await?,
            };
            println!("Inserted {inserted} records from {}.", csv.display());
        }
        Commands::Dashboard {
            student,
            window_days,
            json,
            config,
        } => {
            let thresholds = load_thresholds(config.as_deref())?;
            match pipeline::build_dashboard(&store, &student, window_days, &thresholds).await {
                Ok(dashboard) => {
                    store.save_alerts(&dashboard.alerts).await?;
                    if json {
                        println!("{}", serde_json::to_string_pretty(&dashboard)?);
                    } else {
                        print_dashboard(&dashboard);
                    }
                }
                Err(err) => {
                    error!(student = %student, %err, "dashboard request failed");
                    anyhow::bail!(err.user_message());
                }
            }
        }
        Commands::Alerts {
            student,
            include_resolved,
        } => {
            let resolved = store
                .resolve_student(&student)
                .await
                .map_err(|err| anyhow::anyhow!(err.user_message()))?;
            let alerts = store.list_alerts(resolved.id, include_resolved).await?;

            if alerts.is_empty() {
                println!("No alerts for {student}.");
            } else {
                for alert in alerts.iter() {
                    let status = if alert.resolved { "resolved" } else { "open" };
                    println!(
                        "- {} [{}] {}: {} ({}, created {})",
                        alert.id,
                        alert.severity.as_str(),
                        alert.kind.as_str(),
                        alert.message,
                        status,
                        alert.created_at.format("%Y-%m-%d")
                    );
                }
            }
        }
        Commands::Resolve { alert } => {
            if store.resolve_alert(alert).await? {
                println!("Alert {alert} resolved.");
            } else {
                println!("Alert {alert} not found or already resolved.");
            }
        }
        Commands::Report {
            student,
            window_days,
            out,
            config,
        } => {
            let thresholds = load_thresholds(config.as_deref())?;
            match pipeline::build_dashboard(&store, &student, window_days, &thresholds).await {
                Ok(dashboard) => {
                    let report = report::build_report(&dashboard);
                    std::fs::write(&out, report)?;
                    println!("Report written to {}.", out.display());
                }
                Err(err) => {
                    error!(student = %student, %err, "report request failed");
                    anyhow::bail!(err.user_message());
                }
            }
        }
    }

    Ok(())
}

fn print_dashboard(dashboard: &Dashboard) {
    println!(
        "Dashboard for {} ({}), last {} days",
        dashboard.student.full_name, dashboard.student.code, dashboard.window_days
    );
    println!("Overall status: {}", dashboard.overall_status.as_str());
    println!();
    println!(
        "Academic average {:.1}% ({})",
        dashboard.academic.overall_average,
        dashboard.academic.trend.as_str()
    );
    for (subject, average) in dashboard.academic.per_subject_average.iter() {
        println!("  {subject}: {average:.1}%");
    }
    println!(
        "Attendance {:.1}% with {} absences ({})",
        dashboard.attendance.rate * 100.0,
        dashboard.attendance.absences_last_30_days,
        dashboard.attendance.trend.as_str()
    );
    println!(
        "Engagement: {} logins, {:.0}% of assignments submitted ({})",
        dashboard.engagement.logins_last_30_days,
        dashboard.engagement.submission_rate * 100.0,
        dashboard.engagement.trend.as_str()
    );
    println!();

    if dashboard.alerts.is_empty() {
        println!("No active alerts.");
    } else {
        println!("Alerts:");
        for alert in dashboard.alerts.iter() {
            println!("- [{}] {}", alert.severity.as_str(), alert.message);
        }
    }

    println!();
    println!("Insights:");
    for insight in dashboard.insights.iter() {
        println!("- {insight}");
    }
}
