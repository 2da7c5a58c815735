use crate::models::{price::PricePoint, proposal::Proposal, score::ActivistScore};
use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use std::{fs, path::Path};
use tracing::info;
use utils::errors::{DATASET_WRITE_FAILED, PRICE_SERIES_WRITE_FAILED};

const DATASET_CSV: &str = "proposals.csv";
const DATASET_JSON: &str = "proposals.json";
const PRICES_DIR: &str = "prices";

#[derive(Serialize)]
struct DatasetRecord<'a> {
    #[serde(flatten)]
    proposal: &'a Proposal,
    #[serde(flatten)]
    score: &'a ActivistScore,
}

/// Writes `proposals.csv` and `proposals.json` into `output_dir`. Both files
/// are assembled in memory first so a failed run never leaves a truncated
/// dataset on disk.
pub fn write_dataset(output_dir: &Path, records: &[(Proposal, ActivistScore)]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "id",
            "organization",
            "title",
            "body",
            "author",
            "created_at",
            "state",
            "link",
            "source",
            "activist_score",
            "matched_categories",
            "detection_methods",
        ])
        .context(DATASET_WRITE_FAILED)?;

    for (proposal, score) in records {
        let score_text = format!("{:.4}", score.score);
        let categories = score.categories_joined();
        let methods = score.methods_joined();
        writer
            .write_record([
                proposal.source_id.as_str(),
                proposal.organization.as_str(),
                proposal.title.as_str(),
                proposal.body.as_str(),
                proposal.author.as_str(),
                proposal.created_at.as_str(),
                proposal.state.as_str(),
                proposal.link.as_str(),
                proposal.provider.as_str(),
                score_text.as_str(),
                categories.as_str(),
                methods.as_str(),
            ])
            .context(DATASET_WRITE_FAILED)?;
    }

    let csv_bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("{e}"))
        .context(DATASET_WRITE_FAILED)?;
    fs::write(output_dir.join(DATASET_CSV), csv_bytes).context(DATASET_WRITE_FAILED)?;

    let json_records: Vec<DatasetRecord> = records
        .iter()
        .map(|(proposal, score)| DatasetRecord { proposal, score })
        .collect();
    let json_bytes = serde_json::to_vec_pretty(&json_records).context(DATASET_WRITE_FAILED)?;
    fs::write(output_dir.join(DATASET_JSON), json_bytes).context(DATASET_WRITE_FAILED)?;

    info!(records = records.len(), "Wrote proposal dataset");
    Ok(())
}

/// Writes one proposal's price series to `prices/<identity>.csv`, with the
/// identity sanitized into a safe file name.
pub fn write_price_series(output_dir: &Path, identity: &str, series: &[PricePoint]) -> Result<()> {
    let prices_dir = output_dir.join(PRICES_DIR);
    fs::create_dir_all(&prices_dir).context(PRICE_SERIES_WRITE_FAILED)?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "timestamp",
            "price_usd",
            "volume_usd",
            "market_cap_usd",
            "source",
        ])
        .context(PRICE_SERIES_WRITE_FAILED)?;

    for point in series {
        let market_cap = point
            .market_cap_usd
            .map(|cap| cap.to_string())
            .unwrap_or_default();
        writer
            .write_record([
                point.timestamp.to_string().as_str(),
                point.price_usd.to_string().as_str(),
                point.volume_usd.to_string().as_str(),
                market_cap.as_str(),
                point.source.as_str(),
            ])
            .context(PRICE_SERIES_WRITE_FAILED)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("{e}"))
        .context(PRICE_SERIES_WRITE_FAILED)?;
    let path = prices_dir.join(format!("{}.csv", sanitize_identity(identity)));
    fs::write(&path, bytes).context(PRICE_SERIES_WRITE_FAILED)?;

    info!(identity, points = series.len(), "Wrote price series");
    Ok(())
}

fn sanitize_identity(identity: &str) -> String {
    identity
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
