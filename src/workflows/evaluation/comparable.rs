use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::domain::{format_cents, BidSubmission, BidderId, BoqItemId};

const DEFAULT_OUTLIER_THRESHOLD_PERCENT: f64 = 20.0;

/// Outlier flagging dial: percent deviation from the per-item median at which
/// an extended price gets flagged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutlierPolicy {
    pub threshold_percent: f64,
}

impl OutlierPolicy {
    pub fn new(threshold_percent: f64) -> Self {
        let sanitized = if threshold_percent.is_finite() && threshold_percent > 0.0 {
            threshold_percent
        } else {
            DEFAULT_OUTLIER_THRESHOLD_PERCENT
        };

        Self {
            threshold_percent: sanitized,
        }
    }
}

impl Default for OutlierPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_OUTLIER_THRESHOLD_PERCENT)
    }
}

/// One bidder's cell in a comparable sheet row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparableEntry {
    pub bidder_id: BidderId,
    pub extended_price_cents: u64,
    pub deviation_percent: f64,
    pub outlier: bool,
}

/// Cross-bidder price comparison for one BOQ item. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparableRow {
    pub boq_item_id: BoqItemId,
    pub entries: Vec<ComparableEntry>,
    pub median_cents: f64,
}

/// Builds the per-line-item price comparison grid across qualifying bids.
#[derive(Debug, Clone, Default)]
pub struct ComparableSheetBuilder {
    policy: OutlierPolicy,
}

impl ComparableSheetBuilder {
    pub fn new(policy: OutlierPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &OutlierPolicy {
        &self.policy
    }

    /// Assemble the sheet. An empty or fully-disqualified bid set yields an
    /// empty sheet, not an error; bidders missing an item simply have no cell
    /// in that row.
    pub fn build(&self, bids: &[BidSubmission]) -> Vec<ComparableRow> {
        let mut per_item: BTreeMap<&BoqItemId, BTreeMap<&BidderId, u64>> = BTreeMap::new();

        for bid in bids.iter().filter(|bid| !bid.disqualified) {
            for line in &bid.line_items {
                let cell = per_item
                    .entry(&line.boq_item_id)
                    .or_default()
                    .entry(&bid.bidder_id)
                    .or_insert(0);
                *cell += line.extended_price_cents();
            }
        }

        per_item
            .into_iter()
            .map(|(boq_item_id, cells)| {
                let median_cents = median(cells.values().copied());

                let entries = cells
                    .into_iter()
                    .map(|(bidder_id, extended_price_cents)| {
                        let deviation_percent = if median_cents > 0.0 {
                            (extended_price_cents as f64 - median_cents) * 100.0 / median_cents
                        } else {
                            0.0
                        };
                        let deviation_percent = (deviation_percent * 100.0).round() / 100.0;

                        ComparableEntry {
                            bidder_id: bidder_id.clone(),
                            extended_price_cents,
                            deviation_percent,
                            outlier: deviation_percent.abs() > self.policy.threshold_percent,
                        }
                    })
                    .collect();

                ComparableRow {
                    boq_item_id: boq_item_id.clone(),
                    entries,
                    median_cents,
                }
            })
            .collect()
    }
}

fn median(values: impl Iterator<Item = u64>) -> f64 {
    let mut sorted: Vec<u64> = values.collect();
    sorted.sort_unstable();

    if sorted.is_empty() {
        return 0.0;
    }

    let middle = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[middle] as f64
    } else {
        (sorted[middle - 1] as f64 + sorted[middle] as f64) / 2.0
    }
}

/// Failures while rendering the sheet to CSV.
#[derive(Debug, thiserror::Error)]
pub enum SheetExportError {
    #[error("comparable sheet serialization failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("comparable sheet buffer could not be recovered after serialization")]
    Buffer,
}

/// Render the sheet as CSV: one row per BOQ item, one column per bidder, the
/// median last. Outlier cells carry a trailing asterisk.
pub fn sheet_to_csv(rows: &[ComparableRow]) -> Result<String, SheetExportError> {
    let bidders: BTreeSet<&BidderId> = rows
        .iter()
        .flat_map(|row| row.entries.iter().map(|entry| &entry.bidder_id))
        .collect();

    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec!["boq_item".to_string()];
    header.extend(bidders.iter().map(|bidder| bidder.0.clone()));
    header.push("median".to_string());
    writer.write_record(&header)?;

    for row in rows {
        let mut record = vec![row.boq_item_id.0.clone()];
        for bidder in &bidders {
            let cell = row
                .entries
                .iter()
                .find(|entry| entry.bidder_id == **bidder)
                .map(|entry| {
                    if entry.outlier {
                        format!("{}*", format_cents(entry.extended_price_cents))
                    } else {
                        format_cents(entry.extended_price_cents)
                    }
                })
                .unwrap_or_default();
            record.push(cell);
        }
        record.push(format!("{:.2}", row.median_cents / 100.0));
        writer.write_record(&record)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|_| SheetExportError::Buffer)?;
    String::from_utf8(bytes).map_err(|_| SheetExportError::Buffer)
}
