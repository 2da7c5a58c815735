use crate::{
    api_client::ApiClient,
    config::Config,
    merger::{self, SourceBatch},
    models::{proposal::Proposal, score::ActivistScore},
    output,
    prices::{self, PriceEndpoints},
    progress::CollectionTracker,
    scoring,
    sources::{boardroom, discourse, snapshot, tally},
};
use anyhow::{Context, Result};
use chrono::Duration;
use futures::future::join_all;
use serde::Serialize;
use std::fs;
use tracing::{error, info, instrument, warn};
use utils::errors::OUTPUT_DIR_CREATE_FAILED;

/// Days of price history collected before and after a proposal's creation.
const PRICE_WINDOW_BEFORE_DAYS: i64 = 90;
const PRICE_WINDOW_AFTER_DAYS: i64 = 100;

/// Where each source's traffic goes. Overridable so tests can point every
/// provider at a local server.
#[derive(Clone, Debug)]
pub struct Endpoints {
    pub snapshot: String,
    pub boardroom: String,
    pub tally: String,
    pub prices: PriceEndpoints,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            snapshot: snapshot::GRAPHQL_ENDPOINT.to_string(),
            boardroom: boardroom::API_BASE.to_string(),
            tally: tally::GRAPHQL_ENDPOINT.to_string(),
            prices: PriceEndpoints::default(),
        }
    }
}

/// Counters reported at the end of a run.
#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    pub fetched: usize,
    pub merged: usize,
    pub duplicates_dropped: usize,
    pub activist: usize,
    pub prices_attempted: usize,
    pub prices_collected: usize,
    pub prices_failed: usize,
    pub already_done: usize,
    pub missing_token: usize,
    pub missing_date: usize,
}

pub async fn run(config: Config) -> Result<RunSummary> {
    run_with_endpoints(config, Endpoints::default()).await
}

#[instrument(skip_all)]
pub async fn run_with_endpoints(config: Config, endpoints: Endpoints) -> Result<RunSummary> {
    fs::create_dir_all(&config.output_dir).context(OUTPUT_DIR_CREATE_FAILED)?;

    let api = ApiClient::new(config.providers.clone());
    let batches = collect_sources(&api, &config, &endpoints).await;

    let mut summary = RunSummary {
        fetched: batches.iter().map(|batch| batch.records.len()).sum(),
        ..Default::default()
    };

    let (proposals, stats) = merger::merge(batches);
    summary.merged = stats.kept;
    summary.duplicates_dropped = stats.dropped_total();
    for (source, dropped) in &stats.dropped_by_source {
        info!(source, dropped, "Dropped duplicates");
    }

    let activist = classify(proposals, &config);
    summary.activist = activist.len();

    let mut tracker = CollectionTracker::load(&config.progress_file);

    for (proposal, _) in &activist {
        collect_prices_for(&api, &config, &endpoints, &mut tracker, proposal, &mut summary).await;
    }

    output::write_dataset(&config.output_dir, &activist)?;

    Ok(summary)
}

/// Spawns one fetch task per configured source and waits for all of them.
/// Batches come back in configuration order so merge results are stable.
async fn collect_sources(api: &ApiClient, config: &Config, endpoints: &Endpoints) -> Vec<SourceBatch> {
    let mut handles = Vec::new();

    for org in &config.organizations {
        if let Some(space) = org.snapshot_space.clone() {
            let api = api.clone();
            let endpoint = endpoints.snapshot.clone();
            let organization = org.organization.clone();
            handles.push(tokio::spawn(async move {
                let records = snapshot::fetch_proposals(&api, &endpoint, &space).await;
                SourceBatch {
                    provider: snapshot::PROVIDER,
                    organization,
                    mapping: snapshot::field_mapping(),
                    records,
                }
            }));
        }

        if let Some(cname) = org.boardroom_cname.clone() {
            let api = api.clone();
            let endpoint = endpoints.boardroom.clone();
            let organization = org.organization.clone();
            handles.push(tokio::spawn(async move {
                let records = boardroom::fetch_proposals(&api, &endpoint, &cname).await;
                SourceBatch {
                    provider: boardroom::PROVIDER,
                    organization,
                    mapping: boardroom::field_mapping(),
                    records,
                }
            }));
        }

        if let Some(base_url) = org.discourse_base_url.clone() {
            let api = api.clone();
            let organization = org.organization.clone();
            handles.push(tokio::spawn(async move {
                let records = discourse::fetch_topics(&api, &base_url).await;
                SourceBatch {
                    provider: discourse::PROVIDER,
                    organization,
                    mapping: discourse::field_mapping(),
                    records,
                }
            }));
        }
    }

    if config.include_tally {
        let api = api.clone();
        let endpoint = endpoints.tally.clone();
        handles.push(tokio::spawn(async move {
            let records = tally::fetch_proposals(&api, &endpoint).await;
            SourceBatch {
                provider: tally::PROVIDER,
                organization: String::new(),
                mapping: tally::field_mapping(),
                records,
            }
        }));
    }

    join_all(handles)
        .await
        .into_iter()
        .filter_map(|joined| match joined {
            Ok(batch) => Some(batch),
            Err(e) => {
                error!(error = %e, "Source fetch task panicked");
                None
            }
        })
        .collect()
}

fn classify(proposals: Vec<Proposal>, config: &Config) -> Vec<(Proposal, ActivistScore)> {
    proposals
        .into_iter()
        .filter_map(|proposal| {
            let score = scoring::score_text(&proposal.title, &proposal.body, &config.scoring);
            score
                .is_activist(config.activist_threshold)
                .then_some((proposal, score))
        })
        .collect()
}

/// Fetches and persists the price window around one proposal. Failures are
/// counted, never propagated, so a bad token or provider outage cannot stop
/// the batch.
async fn collect_prices_for(
    api: &ApiClient,
    config: &Config,
    endpoints: &Endpoints,
    tracker: &mut CollectionTracker,
    proposal: &Proposal,
    summary: &mut RunSummary,
) {
    let identity = proposal.identity();
    if tracker.is_done(&identity) {
        summary.already_done += 1;
        return;
    }

    let token = match config.token_for(&proposal.organization) {
        Some(token) if !token.is_empty() => token,
        _ => {
            warn!(identity, organization = %proposal.organization, "No token mapping, skipping prices");
            summary.missing_token += 1;
            return;
        }
    };

    let Some(created) = proposal.created_at_utc() else {
        warn!(identity, created_at = %proposal.created_at, "Unparseable creation date, skipping prices");
        summary.missing_date += 1;
        return;
    };

    summary.prices_attempted += 1;
    let start = created - Duration::days(PRICE_WINDOW_BEFORE_DAYS);
    let end = created + Duration::days(PRICE_WINDOW_AFTER_DAYS);

    let series = prices::resolve_price_series(api, &endpoints.prices, token, start, end).await;
    if series.is_empty() {
        warn!(identity, organization = %proposal.organization, "No usable price series");
        summary.prices_failed += 1;
        return;
    }

    if let Err(e) = output::write_price_series(&config.output_dir, &identity, &series) {
        warn!(identity, error = %e, "Failed to write price series");
        summary.prices_failed += 1;
        return;
    }

    if let Err(e) = tracker.mark_done(&identity, &proposal.organization) {
        warn!(identity, error = %e, "Failed to persist progress");
    }
    summary.prices_collected += 1;
}
