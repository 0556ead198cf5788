//! JSON persistence of networks, optionally bundled with solve results.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use cem_core::Network;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Version of the export layout; bumped on incompatible changes.
pub const EXPORT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkExport {
    pub format_version: u32,
    pub exported_at: DateTime<Utc>,
    pub network: Network,
    /// Solve results (capacities, dispatch, statistics) if the network was optimised
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<serde_json::Value>,
}

/// Write `network` (and optional results) as pretty JSON.
pub fn save_network<T: Serialize>(path: &Path, network: &Network, results: Option<&T>) -> Result<()> {
    let results = results
        .map(serde_json::to_value)
        .transpose()
        .context("serializing results")?;
    let export = NetworkExport {
        format_version: EXPORT_FORMAT_VERSION,
        exported_at: Utc::now(),
        network: network.clone(),
        results,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(&export).context("serializing network")?;
    fs::write(path, json).with_context(|| format!("writing network to {}", path.display()))?;
    info!(path = %path.display(), "exported network");
    Ok(())
}

/// Read an export written by [`save_network`]. A bare serialised
/// [`Network`] is accepted too.
pub fn load_network(path: &Path) -> Result<NetworkExport> {
    let data =
        fs::read_to_string(path).with_context(|| format!("reading network {}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
    let export = if value.get("format_version").is_some() {
        let export: NetworkExport = serde_json::from_value(value)
            .with_context(|| format!("decoding network export {}", path.display()))?;
        if export.format_version > EXPORT_FORMAT_VERSION {
            bail!(
                "{} uses export format {} but only {} is supported",
                path.display(),
                export.format_version,
                EXPORT_FORMAT_VERSION
            );
        }
        export
    } else {
        let network: Network = serde_json::from_value(value)
            .with_context(|| format!("decoding network {}", path.display()))?;
        NetworkExport {
            format_version: EXPORT_FORMAT_VERSION,
            exported_at: Utc::now(),
            network,
            results: None,
        }
    };
    Ok(export)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cem_core::{Bus, Carrier, Generator};
    use tempfile::tempdir;

    fn network() -> Network {
        let mut n = Network::new();
        n.set_snapshots_hourly("2015-01-01T00:00:00".parse().unwrap(), 2, 4.0);
        n.add_bus(Bus::new("electricity")).unwrap();
        n.add_carrier(Carrier::new("solar").with_color("gold")).unwrap();
        n.add_generator(
            Generator::new("solar", "electricity", "solar")
                .extendable()
                .with_p_max_pu(vec![0.0, 0.6]),
        )
        .unwrap();
        n
    }

    #[test]
    fn export_roundtrip_with_results() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out/network.json");
        let results = serde_json::json!({ "objective": 12.5 });
        save_network(&path, &network(), Some(&results)).unwrap();

        let loaded = load_network(&path).unwrap();
        assert_eq!(loaded.format_version, EXPORT_FORMAT_VERSION);
        assert_eq!(loaded.network.generators().len(), 1);
        assert_eq!(loaded.results.unwrap()["objective"], 12.5);
    }

    #[test]
    fn bare_network_is_accepted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bare.json");
        fs::write(&path, serde_json::to_string(&network()).unwrap()).unwrap();
        let loaded = load_network(&path).unwrap();
        assert!(loaded.results.is_none());
        assert_eq!(loaded.network.carrier_color("solar"), Some("gold"));
    }

    #[test]
    fn newer_format_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("future.json");
        let mut value = serde_json::to_value(NetworkExport {
            format_version: EXPORT_FORMAT_VERSION,
            exported_at: Utc::now(),
            network: network(),
            results: None,
        })
        .unwrap();
        value["format_version"] = serde_json::json!(EXPORT_FORMAT_VERSION + 1);
        fs::write(&path, value.to_string()).unwrap();
        assert!(load_network(&path).is_err());
    }
}
