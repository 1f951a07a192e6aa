//! # Seed
//!
//! Prepares a database for first use:
//!
//! 1. Runs migrations
//! 2. Creates the admin operator if absent (an existing password is kept)
//! 3. With `--demo`, adds a handful of sample collections
//!
//! ```text
//! cargo run -p coinbox-api --bin seed -- [--demo] [--database PATH]
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::{Duration, NaiveDate};
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use coinbox_api::auth::hash_password;
use coinbox_api::ApiConfig;
use coinbox_core::validation::validate_new;
use coinbox_core::week::week_number_of;
use coinbox_core::{Clock, CollectionPayload, SystemClock};
use coinbox_db::Database;

const DEFAULT_ADMIN_EMAIL: &str = "admin@minimystery.com";
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
const DEFAULT_ADMIN_NAME: &str = "Admin";

#[derive(Debug, Default)]
struct SeedArgs {
    demo: bool,
    database: Option<PathBuf>,
}

fn parse_args() -> anyhow::Result<SeedArgs> {
    let mut args = SeedArgs::default();
    let mut iter = std::env::args().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--demo" => args.demo = true,
            "--database" => {
                let path = iter.next().context("--database needs a path")?;
                args.database = Some(PathBuf::from(path));
            }
            other => bail!("unknown argument: {other}"),
        }
    }

    Ok(args)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = parse_args()?;
    let mut config = ApiConfig::load().context("loading configuration")?;
    if let Some(path) = args.database {
        config.database_path = path;
    }

    let db = Database::new(config.db_config())
        .await
        .context("opening database")?;

    let admin = seed_admin(&db).await?;

    if args.demo {
        let today = SystemClock.today();
        seed_demo_collections(&db, admin, today).await?;
    }

    db.close().await;
    info!("Seeding complete");
    Ok(())
}

async fn seed_admin(db: &Database) -> anyhow::Result<i64> {
    let email =
        std::env::var("COINBOX_ADMIN_EMAIL").unwrap_or_else(|_| DEFAULT_ADMIN_EMAIL.to_string());
    let password = std::env::var("COINBOX_ADMIN_PASSWORD")
        .unwrap_or_else(|_| DEFAULT_ADMIN_PASSWORD.to_string());
    let name =
        std::env::var("COINBOX_ADMIN_NAME").unwrap_or_else(|_| DEFAULT_ADMIN_NAME.to_string());

    let hash = hash_password(&password).context("hashing admin password")?;
    let (user, created) = db
        .users()
        .ensure(&email, Some(name.as_str()), &hash)
        .await
        .context("creating admin user")?;

    if created {
        info!(email = %user.email, "Admin user created");
        if password == DEFAULT_ADMIN_PASSWORD {
            warn!("Admin uses the default password; change it before going live");
        }
    } else {
        info!(email = %user.email, "Admin user already exists, left unchanged");
    }

    Ok(user.id)
}

/// A week of sample collections at two sites, both rounds where the machine
/// was emptied twice.
fn demo_payloads(today: NaiveDate) -> Vec<CollectionPayload> {
    let samples: [(i64, i64, &str, i64, i64, i64); 5] = [
        // (days ago, round, location, machine coins, 1000 notes, postcards left)
        (6, 1, "Siam Paragon", 400, 12, 150),
        (6, 2, "Siam Paragon", 240, 12, 90),
        (4, 1, "Chatuchak Market", 520, 11, 120),
        (2, 1, "Siam Paragon", 160, 12, 200),
        (1, 1, "Chatuchak Market", 300, 12, 45),
    ];

    samples
        .iter()
        .filter_map(|&(days_ago, round, location, coins, notes_1000, remaining)| {
            let date = today - Duration::days(days_ago);
            let body = json!({
                "collectionDate": date.format("%Y-%m-%d").to_string(),
                "roundNumber": round,
                "weekNumber": week_number_of(date),
                "machineLocation": location,
                "machineCoins10baht": coins,
                "exchangeNote1000baht": notes_1000,
                "postcardsRemaining": remaining,
            });
            serde_json::from_value(body).ok()
        })
        .collect()
}

async fn seed_demo_collections(db: &Database, created_by: i64, today: NaiveDate) -> anyhow::Result<()> {
    let repo = db.collections();
    let mut inserted = 0usize;

    for payload in demo_payloads(today) {
        let fields = match validate_new(&payload, today) {
            Ok(fields) => fields,
            Err(errors) => {
                warn!(%errors, "Skipping invalid demo collection");
                continue;
            }
        };

        if repo.find_by_identity(&fields.identity(), None).await?.is_some() {
            continue;
        }

        repo.insert(&fields, created_by).await?;
        inserted += 1;
    }

    info!(inserted, "Demo collections seeded");
    Ok(())
}
