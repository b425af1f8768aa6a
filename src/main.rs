use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

mod award;
mod db;
mod eligibility;
mod error;
mod feedback;
mod models;
mod points;
mod report;
mod session;

use models::Feedback;

#[derive(Parser)]
#[command(name = "peer-learning-rewards")]
#[command(about = "Peer learning sessions with points, badges and certificates", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Join a session as an attendee
    Join {
        #[arg(long)]
        session: Uuid,
        #[arg(long)]
        user: Uuid,
    },
    /// Submit feedback for a session
    Feedback {
        #[arg(long)]
        session: Uuid,
        #[arg(long)]
        student: Uuid,
        #[arg(long)]
        rating: i32,
        /// good, neutral or bad
        #[arg(long)]
        behavior: String,
        #[arg(long)]
        learned: String,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Import feedback from a CSV file
    ImportFeedback {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Preview the points a session is worth right now
    Points {
        #[arg(long)]
        session: Uuid,
    },
    /// Complete a session and award its creator
    Complete {
        #[arg(long)]
        session: Uuid,
        #[arg(long)]
        json: bool,
    },
    /// List users by total points
    Leaderboard {
        #[arg(long, default_value_t = 10)]
        limit: i64,
    },
    /// Generate a markdown session report
    Report {
        #[arg(long)]
        session: Uuid,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "peer_learning_rewards=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;
    tracing::debug!("database pool ready");

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Join { session, user } => {
            let joined = db::join_session(&pool, session, user).await?;
            println!(
                "Joined \"{}\" ({} attendees).",
                joined.title,
                joined.attendees.len()
            );
        }
        Commands::Feedback {
            session,
            student,
            rating,
            behavior,
            learned,
            comment,
        } => {
            let entry = Feedback {
                id: Uuid::new_v4(),
                session_id: session,
                student_id: student,
                rating,
                behavior: behavior.parse()?,
                learned,
                comment,
            };
            db::submit_feedback(&pool, &entry).await?;
            println!("Feedback recorded.");
        }
        Commands::ImportFeedback { csv } => {
            let inserted = db::import_feedback_csv(&pool, &csv).await?;
            println!("Inserted {inserted} feedback entries from {}.", csv.display());
        }
        Commands::Points { session } => {
            let (snapshot, entries) = db::fetch_snapshot(&pool, session).await?;
            let award = points::total_points(&snapshot, &entries);
            let summary = feedback::aggregate(&entries);
            println!(
                "\"{}\" ({}) is worth {} points: base {}, bonus {} from {} feedback (avg {:.2}).",
                snapshot.title,
                snapshot.status,
                award.total,
                award.base_points,
                award.bonus_points,
                summary.total_feedback,
                summary.average_rating
            );
        }
        Commands::Complete { session, json } => {
            let award = db::complete_session(&pool, session).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&award)?);
            } else {
                print!("{}", report::format_award(&award));
            }
        }
        Commands::Leaderboard { limit } => {
            let entries = db::fetch_leaderboard(&pool, limit).await?;
            print!("{}", report::format_leaderboard(&entries));
        }
        Commands::Report { session, out } => {
            let (snapshot, entries) = db::fetch_snapshot(&pool, session).await?;
            let certificate = db::fetch_certificate(&pool, session).await?;
            let report = report::build_report(&snapshot, &entries, certificate.as_ref());
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
