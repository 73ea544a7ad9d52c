//! Per-network device statistics
//!
//! Walks every device of an [`ActivationSource`], decodes the DevAddr it
//! holds and counts devices per NetID.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::activation::{Activation, ActivationSource};
use crate::lorawan::{decode, DecodeError, NetIdBucket};

/// Device counts per NetID
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NetIdReport {
    counts: BTreeMap<NetIdBucket, u64>,
    total: u64,
}

/// One row of the rendered report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub net_id: NetIdBucket,
    pub devices: u64,
    pub percent: f64,
}

/// JSON document written for `--format json`
#[derive(Debug, Serialize)]
pub struct ReportDocument {
    pub timestamp: DateTime<Utc>,
    pub total: u64,
    pub net_ids: Vec<ReportEntry>,
}

impl NetIdReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the report for every device `source` knows about
    pub fn from_source(source: &dyn ActivationSource) -> Self {
        let mut report = Self::new();

        for Activation { device, dev_addr } in source.activations() {
            let bucket = match decode(&dev_addr) {
                Ok(net_id) => {
                    debug!("{}: DevAddr {} → NetID {}", device, dev_addr, net_id);
                    NetIdBucket::NetId(net_id)
                }
                Err(e @ DecodeError::InvalidAddressClass { leading_ones: None }) => {
                    debug!("{}: {}", device, e);
                    NetIdBucket::Invalid
                }
                Err(e) => {
                    warn!("{}: {}", device, e);
                    NetIdBucket::Invalid
                }
            };
            report.add(bucket);
        }

        report
    }

    pub fn add(&mut self, bucket: NetIdBucket) {
        *self.counts.entry(bucket).or_insert(0) += 1;
        self.total += 1;
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn count(&self, bucket: &NetIdBucket) -> u64 {
        self.counts.get(bucket).copied().unwrap_or(0)
    }

    /// Rows ordered by NetID, `Invalid` last
    pub fn entries(&self) -> Vec<ReportEntry> {
        self.counts
            .iter()
            .map(|(bucket, &devices)| ReportEntry {
                net_id: *bucket,
                devices,
                percent: percent(devices, self.total),
            })
            .collect()
    }

    pub fn to_document(&self, timestamp: DateTime<Utc>) -> ReportDocument {
        ReportDocument {
            timestamp,
            total: self.total,
            net_ids: self.entries(),
        }
    }

    pub fn to_json(&self, timestamp: DateTime<Utc>) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_document(timestamp))?)
    }
}

/// Share of `count` in `total`, in percent rounded to 2 decimals
///
/// Ties round to even on the exact decimal value, so 1 of 32 (3.125%)
/// gives 3.12.
fn percent(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let share = 100.0 * count as f64 / total as f64;
    format!("{:.2}", share).parse().unwrap_or(share)
}

impl fmt::Display for NetIdReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Statistics:")?;
        writeln!(f, "{} in total", self.total)?;
        writeln!(f, "Net ID:")?;
        for entry in self.entries() {
            writeln!(
                f,
                " * {}: {} devices ({:?}%)",
                entry.net_id, entry.devices, entry.percent
            )?;
        }
        Ok(())
    }
}
