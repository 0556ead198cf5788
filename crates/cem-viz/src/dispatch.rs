//! Dispatch chart: hourly supply by carrier against demand.

use anyhow::{bail, Result};
use cem_algo::NetworkSolution;
use cem_core::Network;

use crate::chart::{AreaChart, XValues};

/// Fixed vertical range of dispatch charts (GW).
pub const DISPATCH_Y_RANGE_GW: (f64, f64) = (-200.0, 200.0);

const MW_PER_GW: f64 = 1e3;

/// Supply by carrier in GW over the snapshots whose timestamp starts with
/// `period` (for example `2015-07`), or over all snapshots when `period` is
/// `None`.
///
/// Generators, storage units and stores are grouped by carrier. Storage
/// output and charging are split into a positive series and a negative
/// `<carrier> charging` series. Total demand is drawn as a black line. Links
/// only move energy between buses and are left out.
pub fn dispatch_chart(
    network: &Network,
    solution: &NetworkSolution,
    period: Option<&str>,
) -> Result<AreaChart> {
    let selected: Vec<usize> = network
        .snapshots()
        .iter()
        .enumerate()
        .filter(|(_, ts)| match period {
            Some(p) => ts.format("%Y-%m-%d %H:%M:%S").to_string().starts_with(p),
            None => true,
        })
        .map(|(t, _)| t)
        .collect();
    if selected.is_empty() {
        bail!(
            "no snapshots in period '{}'",
            period.unwrap_or_default()
        );
    }

    let x = selected.iter().map(|&t| network.snapshots()[t]).collect();
    let title = match period {
        Some(p) => format!("Dispatch {}", p),
        None => "Dispatch".to_string(),
    };
    let mut chart = AreaChart::new(title, XValues::Time(x))
        .with_labels("snapshot", "GW")
        .with_y_range(DISPATCH_Y_RANGE_GW.0, DISPATCH_Y_RANGE_GW.1);

    // Net output per carrier in network order
    let mut by_carrier: Vec<(String, Vec<f64>)> = Vec::new();
    let mut add = |carrier: &str, p: &[f64]| {
        let idx = match by_carrier.iter().position(|(c, _)| c == carrier) {
            Some(idx) => idx,
            None => {
                by_carrier.push((carrier.to_string(), vec![0.0; selected.len()]));
                by_carrier.len() - 1
            }
        };
        for (slot, &t) in by_carrier[idx].1.iter_mut().zip(&selected) {
            *slot += p.get(t).copied().unwrap_or(0.0) / MW_PER_GW;
        }
    };

    for gen in network.generators() {
        if let Some(r) = solution.generators.get(&gen.name) {
            add(&gen.carrier, &r.p);
        }
    }
    for unit in network.storage_units() {
        if let Some(r) = solution.storage_units.get(&unit.name) {
            add(&unit.carrier, &r.p());
        }
    }
    for store in network.stores() {
        if let Some(r) = solution.stores.get(&store.name) {
            add(&store.carrier, &r.p);
        }
    }

    for (carrier, values) in by_carrier {
        let color = network.carrier_color(&carrier).map(str::to_string);
        if values.iter().all(|v| v.abs() < 1e-9) {
            continue;
        }
        let supply: Vec<f64> = values.iter().map(|v| v.max(0.0)).collect();
        let charge: Vec<f64> = values.iter().map(|v| v.min(0.0)).collect();
        if supply.iter().any(|v| *v > 0.0) {
            chart.push_area(carrier.as_str(), color.clone(), supply)?;
        }
        if charge.iter().any(|v| *v < 0.0) {
            chart.push_area(format!("{} charging", carrier), color, charge)?;
        }
    }

    let load = selected
        .iter()
        .map(|&t| network.total_load_at(t) / MW_PER_GW)
        .collect();
    chart.push_line("load", Some("black".to_string()), load)?;
    Ok(chart)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cem_algo::{DispatchResult, StorageResult};
    use cem_core::{Bus, Carrier, Generator, Load, StorageUnit};

    fn solved() -> (Network, NetworkSolution) {
        let mut network = Network::new();
        network.set_snapshots_hourly("2015-06-30T22:00:00".parse().unwrap(), 4, 1.0);
        network.add_bus(Bus::new("electricity")).unwrap();
        network
            .add_carrier(Carrier::new("solar").with_color("gold"))
            .unwrap();
        network
            .add_carrier(Carrier::new("battery storage").with_color("yellowgreen"))
            .unwrap();
        network
            .add_generator(Generator::new("solar", "electricity", "solar").extendable())
            .unwrap();
        network
            .add_storage_unit(
                StorageUnit::new("battery storage", "electricity", "battery storage").extendable(),
            )
            .unwrap();
        network
            .add_load(Load::new("demand", "electricity", vec![10e3, 20e3, 30e3, 40e3]))
            .unwrap();

        let mut solution = NetworkSolution::new("test");
        solution.generators.insert(
            "solar".into(),
            DispatchResult {
                p_nom_opt: 60e3,
                p: vec![10e3, 20e3, 50e3, 20e3],
            },
        );
        solution.storage_units.insert(
            "battery storage".into(),
            StorageResult {
                p_nom_opt: 20e3,
                p_dispatch: vec![0.0, 0.0, 0.0, 20e3],
                p_store: vec![0.0, 0.0, 20e3, 0.0],
                state_of_charge: vec![0.0, 0.0, 20e3, 0.0],
            },
        );
        (network, solution)
    }

    #[test]
    fn period_filters_snapshots_and_converts_to_gw() {
        let (network, solution) = solved();
        let chart = dispatch_chart(&network, &solution, Some("2015-07")).unwrap();
        assert_eq!(chart.x.len(), 2);
        assert_eq!(chart.y_range, Some((-200.0, 200.0)));
        assert_eq!(chart.areas[0].label, "solar");
        assert_eq!(chart.areas[0].values, vec![50.0, 20.0]);
        assert_eq!(chart.areas[0].color.as_deref(), Some("gold"));
        assert_eq!(chart.lines[0].values, vec![30.0, 40.0]);
    }

    #[test]
    fn charging_is_negative() {
        let (network, solution) = solved();
        let chart = dispatch_chart(&network, &solution, None).unwrap();
        let labels: Vec<&str> = chart.areas.iter().map(|a| a.label.as_str()).collect();
        assert_eq!(labels, ["solar", "battery storage", "battery storage charging"]);
        assert_eq!(chart.areas[2].values, vec![0.0, 0.0, -20.0, 0.0]);
        // Supply and charging balance demand
        let totals = chart.totals();
        assert_eq!(totals, chart.lines[0].values);
    }

    #[test]
    fn empty_period_is_an_error() {
        let (network, solution) = solved();
        assert!(dispatch_chart(&network, &solution, Some("2016")).is_err());
    }
}
