//! Emission accounting shared by the optimiser report and statistics.
//!
//! Generators emit `co2(carrier) / efficiency` per MWh of output. Storage
//! units and stores with an emitting carrier that do not cycle count the
//! difference between initial and final energy.

use std::collections::BTreeMap;

use cem_core::Network;

use super::solution::NetworkSolution;

/// Emissions (t) over the horizon, grouped by carrier.
pub fn by_carrier(network: &Network, solution: &NetworkSolution) -> BTreeMap<String, f64> {
    let weights = network.snapshot_weightings();
    let mut out: BTreeMap<String, f64> = BTreeMap::new();

    for gen in network.generators() {
        let factor = network.carrier_co2(&gen.carrier);
        if factor == 0.0 {
            continue;
        }
        let Some(result) = solution.generators.get(&gen.name) else {
            continue;
        };
        let energy: f64 = result.p.iter().zip(weights).map(|(p, w)| p * w).sum();
        *out.entry(gen.carrier.clone()).or_default() += energy * factor / gen.efficiency;
    }
    for unit in network.storage_units() {
        let factor = network.carrier_co2(&unit.carrier);
        if factor == 0.0 || unit.cyclic_state_of_charge {
            continue;
        }
        if let Some(last) = solution
            .storage_units
            .get(&unit.name)
            .and_then(|r| r.state_of_charge.last())
        {
            *out.entry(unit.carrier.clone()).or_default() +=
                factor * (unit.state_of_charge_initial - last);
        }
    }
    for store in network.stores() {
        let factor = network.carrier_co2(&store.carrier);
        if factor == 0.0 || store.e_cyclic {
            continue;
        }
        if let Some(last) = solution.stores.get(&store.name).and_then(|r| r.e.last()) {
            *out.entry(store.carrier.clone()).or_default() += factor * (store.e_initial - last);
        }
    }
    out
}

/// Total emissions (t) over the horizon.
pub fn total(network: &Network, solution: &NetworkSolution) -> f64 {
    by_carrier(network, solution).values().sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expansion::solution::DispatchResult;
    use cem_core::{Bus, Carrier, Generator};

    #[test]
    fn generator_emissions_use_primary_energy() {
        let mut network = Network::new();
        network.set_snapshots_hourly("2015-01-01T00:00:00".parse().unwrap(), 2, 4.0);
        network.add_bus(Bus::new("electricity")).unwrap();
        network
            .add_carrier(Carrier::new("OCGT").with_co2_emissions(0.2))
            .unwrap();
        network.add_carrier(Carrier::new("solar")).unwrap();
        network
            .add_generator(Generator::new("OCGT", "electricity", "OCGT").with_efficiency(0.4))
            .unwrap();
        network
            .add_generator(Generator::new("solar", "electricity", "solar"))
            .unwrap();

        let mut solution = NetworkSolution::new("test");
        for name in ["OCGT", "solar"] {
            solution.generators.insert(
                name.into(),
                DispatchResult {
                    p_nom_opt: 100.0,
                    p: vec![100.0, 50.0],
                },
            );
        }
        // (100 + 50) MW * 4 h / 0.4 * 0.2 t/MWh
        assert!((total(&network, &solution) - 300.0).abs() < 1e-9);
        assert!(!by_carrier(&network, &solution).contains_key("solar"));
    }
}
