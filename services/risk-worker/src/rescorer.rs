use anyhow::Result;
use chrono::{DateTime, Utc};
use common::{
    models::{ListingFilter, ListingStatus, Page},
    repositories::Repositories,
    risk::RiskService,
};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

/// Listings fetched per page while walking the approved catalogue
const LISTING_PAGE_SIZE: u32 = 100;

/// Outcome of one re-scoring pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub reservations_scored: usize,
    pub listings_priced: usize,
    pub failures: usize,
}

#[derive(Clone)]
pub struct RiskRescorer {
    repos: Repositories,
    risk: RiskService,
    batch_size: i64,
}

impl RiskRescorer {
    pub fn new(repos: Repositories, batch_size: i64) -> Self {
        Self {
            risk: RiskService::new(repos.clone()),
            repos,
            batch_size,
        }
    }

    /// Re-score upcoming pending reservations, then price every approved listing
    ///
    /// Each item is scored on its own; a failure is logged and the pass moves on.
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        let pending = self
            .repos
            .reservations
            .list_upcoming_pending(now.date_naive(), self.batch_size)
            .await?;
        info!("Re-scoring {} pending reservations", pending.len());

        for reservation in pending {
            match self.risk.score_reservation(reservation.id, now).await {
                Ok(_) => summary.reservations_scored += 1,
                Err(e) => {
                    warn!("Failed to score reservation {}: {}", reservation.id, e);
                    summary.failures += 1;
                }
            }
        }

        let filter = ListingFilter {
            status: Some(ListingStatus::Approved),
            ..ListingFilter::default()
        };
        let mut page = 1;
        loop {
            let listings = self
                .repos
                .listings
                .list(
                    &filter,
                    Page {
                        page: Some(page),
                        limit: Some(LISTING_PAGE_SIZE),
                    },
                )
                .await?;
            let last_page = listings.len() < LISTING_PAGE_SIZE as usize;

            for listing in listings {
                let priced = self.risk.price_listing(listing.id, now).await;
                let forecast = self.risk.predict_occupancy(listing.id, now).await;
                match priced.and(forecast) {
                    Ok(_) => summary.listings_priced += 1,
                    Err(e) => {
                        warn!("Failed to price listing {}: {}", listing.id, e);
                        summary.failures += 1;
                    }
                }
            }

            if last_page {
                break;
            }
            page += 1;
        }

        Ok(summary)
    }

    /// Run [`RiskRescorer::run_once`] on the cron schedule
    pub async fn start(&self, schedule: &str) -> Result<JobScheduler> {
        let rescorer = self.clone();
        let scheduler = JobScheduler::new().await?;

        let job = Job::new_async(schedule, move |_, _| {
            let rescorer = rescorer.clone();
            Box::pin(async move {
                match rescorer.run_once(Utc::now()).await {
                    Ok(summary) => info!(
                        "Risk pass finished: {} reservations, {} listings, {} failures",
                        summary.reservations_scored, summary.listings_priced, summary.failures
                    ),
                    Err(e) => error!("Risk pass aborted: {}", e),
                }
            })
        })?;

        scheduler.add(job).await?;
        scheduler.start().await?;

        info!("Started risk scheduler with schedule: {}", schedule);
        Ok(scheduler)
    }
}
