//! Network construction for the single-node expansion model.

use anyhow::{Context, Result};
use cem_core::{Bus, Carrier, Generator, GlobalConstraint, Load, Network, StorageUnit};
use cem_io::{CostTable, TimeSeries};
use tracing::{debug, info};

use crate::config::ModelConfig;

/// Name of the emissions cap added by [`apply_co2_limit`].
pub const CO2_LIMIT: &str = "CO2Limit";

pub const BATTERY: &str = "battery storage";
pub const HYDROGEN: &str = "hydrogen storage underground";

/// Build the network: one bus, configured carriers, the demand and one
/// extendable generator per configured technology.
///
/// `ts` is expected to be scaled and resampled already; its index becomes the
/// snapshot set and its resolution the snapshot weighting.
pub fn create_network(ts: &TimeSeries, costs: &CostTable, config: &ModelConfig) -> Result<Network> {
    let net_cfg = &config.network;
    let bus = net_cfg.bus.as_str();
    let mut network = Network::new();

    network.set_snapshots(ts.index().to_vec());
    let weighting = net_cfg
        .snapshot_weighting
        .unwrap_or_else(|| ts.resolution_hours());
    network.set_snapshot_weightings(weighting);

    network.add_bus(Bus::new(bus).with_carrier(bus))?;

    for style in &net_cfg.carriers {
        let co2 = costs
            .get(&style.name)
            .with_context(|| format!("emission factor for carrier '{}'", style.name))?
            .co2_intensity;
        network.add_carrier(
            Carrier::new(&style.name)
                .with_color(&style.color)
                .with_co2_emissions(co2),
        )?;
    }

    let demand = ts
        .column(&config.data.load_column)
        .context("load time series")?;
    network.add_load(Load::new("demand", bus, demand))?;

    for tech in &net_cfg.dispatchable {
        let c = costs.get(tech)?;
        network.add_generator(
            Generator::new(tech, bus, tech)
                .extendable()
                .with_costs(c.capital_cost, c.marginal_cost)
                .with_efficiency(c.efficiency),
        )?;
    }

    for tech in &net_cfg.renewables {
        let c = costs.get(tech)?;
        let p_max_pu = ts
            .column(tech)
            .with_context(|| format!("capacity factors for '{}'", tech))?;
        network.add_generator(
            Generator::new(tech, bus, tech)
                .extendable()
                .with_costs(c.capital_cost, c.marginal_cost)
                .with_efficiency(c.efficiency)
                .with_p_max_pu(p_max_pu),
        )?;
    }

    let stats = network.stats();
    info!(
        snapshots = stats.num_snapshots,
        generators = stats.num_generators,
        peak_load_mw = stats.peak_load_mw,
        "network created"
    );
    Ok(network)
}

/// Attach extendable, cyclic battery and hydrogen storage to the network bus.
///
/// Battery: inverter power plus `max_hours` of battery energy, inverter
/// efficiency both ways. Hydrogen: electrolysis and fuel cell power plus
/// `max_hours` of cavern storage.
pub fn add_storage_units(network: &mut Network, costs: &CostTable, config: &ModelConfig) -> Result<()> {
    let bus = config.network.bus.as_str();
    ensure_carrier(network, config, BATTERY)?;
    ensure_carrier(network, config, HYDROGEN)?;

    let battery_hours = config.storage.battery.max_hours;
    let inverter = costs.get("battery inverter")?;
    let battery_capital = inverter.capital_cost + battery_hours * costs.get(BATTERY)?.capital_cost;
    network.add_storage_unit(
        StorageUnit::new(BATTERY, bus, BATTERY)
            .extendable()
            .with_max_hours(battery_hours)
            .with_capital_cost(battery_capital)
            .with_efficiencies(inverter.efficiency, inverter.efficiency)
            .cyclic(),
    )?;

    let h2_hours = config.storage.hydrogen.max_hours;
    let electrolysis = costs.get("electrolysis")?;
    let fuel_cell = costs.get("fuel cell")?;
    let h2_capital = electrolysis.capital_cost
        + fuel_cell.capital_cost
        + h2_hours * costs.get(HYDROGEN)?.capital_cost;
    network.add_storage_unit(
        StorageUnit::new(HYDROGEN, bus, HYDROGEN)
            .extendable()
            .with_max_hours(h2_hours)
            .with_capital_cost(h2_capital)
            .with_efficiencies(electrolysis.efficiency, fuel_cell.efficiency)
            .cyclic(),
    )?;

    debug!(battery_capital, h2_capital, "storage units added");
    Ok(())
}

/// Cap total CO2 emissions at `limit` (tCO2), replacing an existing cap.
pub fn apply_co2_limit(network: &mut Network, limit: f64) -> Result<()> {
    match network.global_constraint_mut(CO2_LIMIT) {
        Some(existing) => existing.constant = limit,
        None => network.add_global_constraint(GlobalConstraint::co2_limit(CO2_LIMIT, limit))?,
    }
    info!(limit_t = limit, "CO2 limit applied");
    Ok(())
}

// Storage carriers may be left out of the configured list; emissions default to zero.
fn ensure_carrier(network: &mut Network, config: &ModelConfig, name: &str) -> Result<()> {
    if network.carrier(name).is_some() {
        return Ok(());
    }
    let mut carrier = Carrier::new(name);
    if let Some(style) = config.network.carrier(name) {
        carrier = carrier.with_color(&style.color);
    }
    network.add_carrier(carrier)?;
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::fixtures::{costs, series};
    use super::*;

    #[test]
    fn network_matches_inputs() {
        let config = ModelConfig::default();
        let network = create_network(&series(), &costs(), &config).unwrap();

        assert_eq!(network.num_snapshots(), 2);
        assert_eq!(network.snapshot_weightings(), &[4.0, 4.0]);
        assert_eq!(network.buses().len(), 1);
        assert_eq!(network.carriers().len(), 6);
        assert_eq!(network.carrier_color("solar"), Some("gold"));
        assert_eq!(network.carrier_co2("OCGT"), 0.2);
        assert_eq!(network.carrier_co2("onwind"), 0.0);

        let demand = network.load("demand").unwrap();
        assert_eq!(demand.p_set.at(0), 50_000.0);
        assert_eq!(demand.p_set.at(1), 58_000.0);

        let ocgt = network.generator("OCGT").unwrap();
        assert!(ocgt.p_nom_extendable);
        assert_eq!(ocgt.efficiency, 0.4);
        // fuel / efficiency, VOM defaults to zero
        assert!((ocgt.marginal_cost - 50.0).abs() < 1e-9);

        let solar = network.generator("solar").unwrap();
        assert_eq!(solar.p_max_pu.at(1), 0.1);
        assert_eq!(solar.efficiency, 0.95);
        assert_eq!(network.generator("onwind").unwrap().efficiency, 1.0);
        assert!(!network.validate().has_errors());
    }

    #[test]
    fn missing_cost_entry_names_the_technology() {
        let config = ModelConfig::default();
        let csv = fixtures::COSTS.replace("offwind,", "offshore,");
        let table = CostTable::from_reader(csv.as_bytes(), &Default::default()).unwrap();
        let err = create_network(&series(), &table, &config).unwrap_err();
        assert!(format!("{err:#}").contains("offwind"));
    }

    #[test]
    fn storage_costs_combine_power_and_energy() {
        let config = ModelConfig::default();
        let table = costs();
        let mut network = create_network(&series(), &table, &config).unwrap();
        add_storage_units(&mut network, &table, &config).unwrap();

        let battery = network.storage_unit(BATTERY).unwrap();
        let expected = table.get("battery inverter").unwrap().capital_cost
            + 6.0 * table.get(BATTERY).unwrap().capital_cost;
        assert!((battery.capital_cost - expected).abs() < 1e-6);
        assert_eq!(battery.max_hours, 6.0);
        assert_eq!(battery.efficiency_store, 0.9);
        assert_eq!(battery.efficiency_dispatch, 0.9);
        assert!(battery.cyclic_state_of_charge);

        let h2 = network.storage_unit(HYDROGEN).unwrap();
        assert_eq!(h2.max_hours, 168.0);
        assert_eq!(h2.efficiency_store, 0.7);
        assert_eq!(h2.efficiency_dispatch, 0.5);
        assert!(h2.p_nom_extendable);
    }

    #[test]
    fn co2_limit_is_upserted() {
        let config = ModelConfig::default();
        let mut network = create_network(&series(), &costs(), &config).unwrap();
        apply_co2_limit(&mut network, 100.0).unwrap();
        apply_co2_limit(&mut network, 0.0).unwrap();
        assert_eq!(network.global_constraints().len(), 1);
        let limit = network.global_constraint(CO2_LIMIT).unwrap();
        assert_eq!(limit.constant, 0.0);
        assert_eq!(limit.carrier_attribute, GlobalConstraint::CO2_EMISSIONS);
    }
}
