//! stockroom command-line tools.
//!
//! `sync` warms the whole catalog cache; `reviews` fetches listing reviews
//! through the same cache the server reads. Credentials come from the
//! environment or `.env`, exactly as for the server.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use stockroom_client::{Catalog, SyncReport};
use stockroom_core::AppConfig;
use stockroom_core::model::{ListingReviews, RatingSummary, ReviewsSummary};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "stockroom-cli")]
#[command(about = "Warm and inspect the stockroom catalog cache")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Refresh the product list and every product detail
    Sync {
        /// Pause between product fetches (default: sync_delay_ms from config)
        #[arg(long)]
        delay_ms: Option<u64>,
    },
    /// Fetch listing reviews (Etsy only)
    Reviews {
        /// Only this listing
        #[arg(long, conflicts_with = "summary")]
        listing: Option<String>,

        /// Print aggregate statistics instead of per-listing detail
        #[arg(long)]
        summary: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = AppConfig::load().context("loading configuration")?;
    let catalog = Catalog::from_config(&config).await.context("opening catalog")?;

    match args.command {
        Command::Sync { delay_ms } => {
            let delay = delay_ms.map(Duration::from_millis).unwrap_or_else(|| config.sync_delay());
            let report = catalog.sync_all(delay).await.context("refreshing product list")?;
            print!("{}", sync_digest(&report));
        }
        Command::Reviews { listing: Some(id), .. } => {
            let reviews = catalog.reviews(&id).await?;
            print!("{}", listing_digest(&reviews));
        }
        Command::Reviews { listing: None, summary: true } => {
            let summary = catalog.reviews_summary().await?;
            print!("{}", summary_digest(&summary));
        }
        Command::Reviews { listing: None, summary: false } => {
            let all = catalog.all_reviews().await?;
            for reviews in all.values() {
                print!("{}", listing_digest(reviews));
            }
            print!("{}", summary_digest(&ReviewsSummary::from_listings(all.values())));
        }
    }

    Ok(())
}

fn sync_digest(report: &SyncReport) -> String {
    let mut out = format!("Synced {} of {} products\n", report.succeeded, report.listed);
    for failure in &report.failed {
        out.push_str(&format!("  failed {}: {}\n", failure.id, failure.error));
    }
    out
}

fn distribution(summary: &RatingSummary) -> String {
    [(5, summary.five), (4, summary.four), (3, summary.three), (2, summary.two), (1, summary.one)]
        .iter()
        .map(|(stars, count)| format!("{stars}*: {count}"))
        .collect::<Vec<_>>()
        .join("  ")
}

fn listing_digest(reviews: &ListingReviews) -> String {
    if let Some(error) = &reviews.error {
        return format!("Listing {}: {error}\n", reviews.listing_id);
    }
    format!(
        "Listing {}: {} reviews, average {:.2}\n  {}\n",
        reviews.listing_id,
        reviews.total_reviews,
        reviews.average_rating,
        distribution(&reviews.summary)
    )
}

fn summary_digest(summary: &ReviewsSummary) -> String {
    format!(
        "Products: {} ({} with reviews, {:.1}%)\nReviews: {}, average {:.2}\n  {}\n",
        summary.total_products,
        summary.products_with_reviews,
        summary.reviews_percentage,
        summary.total_reviews,
        summary.overall_average_rating,
        distribution(&summary.rating_distribution)
    )
}
