//! Device activation records
//!
//! The NetID report needs, for every device, the DevAddr it currently
//! holds. Network servers expose this per device; here it is read from a
//! plain text export with one record per line:
//!
//! ```text
//! # dev_eui,dev_addr
//! 70B3D57ED0000001,260B1234
//! 70B3D57ED0000002,          <- not activated
//! 48000ABC                   <- bare DevAddr, keyed by line number
//! ```

use std::path::Path;

use anyhow::Context;
use tracing::debug;

/// Lookup of the DevAddr held by each known device
pub trait ActivationSource {
    /// Every activation record, in source order
    ///
    /// A device listed twice yields two records, each with its own DevAddr.
    fn activations(&self) -> Vec<Activation>;

    /// Device identifiers, in source order
    fn devices(&self) -> Vec<String> {
        self.activations().into_iter().map(|a| a.device).collect()
    }

    /// DevAddr string for the first record of `device`
    ///
    /// `Some("")` means the device is known but was never activated;
    /// `None` means the device is unknown to this source.
    fn dev_addr(&self, device: &str) -> Option<String> {
        self.activations()
            .into_iter()
            .find(|a| a.device == device)
            .map(|a| a.dev_addr)
    }
}

/// One device and its (possibly empty) DevAddr
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub device: String,
    pub dev_addr: String,
}

/// Activation records loaded from a text export
#[derive(Debug, Default)]
pub struct ActivationFile {
    records: Vec<Activation>,
}

impl ActivationFile {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read activation file {:?}", path))?;
        let file = Self::parse(&content);
        debug!("Loaded {} activation records from {:?}", file.records.len(), path);
        Ok(file)
    }

    pub fn parse(content: &str) -> Self {
        let records = content
            .lines()
            .enumerate()
            .filter_map(|(index, line)| {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    return None;
                }

                let record = match line.split_once(',') {
                    Some((device, dev_addr)) => Activation {
                        device: device.trim().to_string(),
                        dev_addr: dev_addr.trim().to_string(),
                    },
                    None => Activation {
                        device: format!("line-{}", index + 1),
                        dev_addr: line.to_string(),
                    },
                };
                Some(record)
            })
            .collect();

        Self { records }
    }

    pub fn records(&self) -> &[Activation] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ActivationSource for ActivationFile {
    fn activations(&self) -> Vec<Activation> {
        self.records.clone()
    }

    fn dev_addr(&self, device: &str) -> Option<String> {
        self.records
            .iter()
            .find(|r| r.device == device)
            .map(|r| r.dev_addr.clone())
    }
}
