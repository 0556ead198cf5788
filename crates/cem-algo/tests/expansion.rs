use cem_algo::{
    LinearExpansionOptimizer, NetworkOptimizer, NetworkStatistics, OptimizeError,
};
use cem_core::{
    Bus, Carrier, ComponentKind, ConstraintSense, Generator, GlobalConstraint, Link, Load, Network,
    StorageUnit,
};

fn assert_close(actual: f64, expected: f64) {
    let tol = 1e-4 * expected.abs().max(1.0);
    assert!(
        (actual - expected).abs() <= tol,
        "expected {expected}, got {actual}"
    );
}

fn base(loads: Vec<f64>) -> Network {
    let mut network = Network::new();
    let start = "2015-01-01T00:00:00".parse().unwrap();
    network.set_snapshots_hourly(start, loads.len(), 1.0);
    network.add_bus(Bus::new("electricity")).unwrap();
    network
        .add_carrier(Carrier::new("OCGT").with_co2_emissions(0.2))
        .unwrap();
    network.add_carrier(Carrier::new("onwind")).unwrap();
    network.add_carrier(Carrier::new("solar")).unwrap();
    network.add_carrier(Carrier::new("battery storage")).unwrap();
    network
        .add_load(Load::new("demand", "electricity", loads))
        .unwrap();
    network
}

fn with_ocgt(mut network: Network) -> Network {
    network
        .add_generator(
            Generator::new("OCGT", "electricity", "OCGT")
                .extendable()
                .with_costs(1_000.0, 50.0)
                .with_efficiency(0.4),
        )
        .unwrap();
    network
}

#[test]
fn single_generator_sizes_to_peak() {
    let network = with_ocgt(base(vec![50.0, 80.0, 60.0]));
    let solution = LinearExpansionOptimizer::default()
        .optimize(&network)
        .unwrap();

    assert_close(solution.generator_capacity("OCGT").unwrap().value(), 80.0);
    // capex + opex = 80 * 1000 + 50 * 190
    assert_close(solution.objective, 89_500.0);

    let stats = NetworkStatistics::compute(&network, &solution);
    assert_close(stats.total_system_cost().value(), 89_500.0);
    // 190 MWh / 0.4 * 0.2 t/MWh
    assert_close(solution.co2_emissions.value(), 95.0);
}

#[test]
fn zero_co2_limit_removes_fossil_output() {
    let mut network = with_ocgt(base(vec![100.0, 100.0, 100.0]));
    network
        .add_generator(
            Generator::new("onwind", "electricity", "onwind")
                .extendable()
                .with_p_max_pu(0.5)
                .with_costs(2_000.0, 0.0),
        )
        .unwrap();

    let optimizer = LinearExpansionOptimizer::default();
    let unconstrained = optimizer.optimize(&network).unwrap();
    assert_close(unconstrained.generator_capacity("OCGT").unwrap().value(), 100.0);

    network
        .add_global_constraint(GlobalConstraint::co2_limit("CO2Limit", 0.0))
        .unwrap();
    let constrained = optimizer.optimize(&network).unwrap();
    let ocgt_output: f64 = constrained.generators["OCGT"].p.iter().sum();
    assert!(ocgt_output.abs() < 1e-3, "OCGT still produces {ocgt_output}");
    assert_close(constrained.generator_capacity("onwind").unwrap().value(), 200.0);
    assert!(constrained.global_constraints["CO2Limit"] < 1e-3);
}

#[test]
fn loose_co2_limit_matches_unconstrained() {
    let mut network = with_ocgt(base(vec![60_000.0, 70_000.0, 65_000.0]));
    network
        .add_generator(
            Generator::new("onwind", "electricity", "onwind")
                .extendable()
                .with_p_max_pu(vec![0.3, 0.1, 0.5])
                .with_costs(110_000.0, 1.5),
        )
        .unwrap();
    let optimizer = LinearExpansionOptimizer::default();
    let free = optimizer.optimize(&network).unwrap();

    network
        .add_global_constraint(GlobalConstraint::co2_limit("CO2Limit", 1.5e8))
        .unwrap();
    for limit in [1.5e8, 1e12, f64::INFINITY] {
        network.global_constraint_mut("CO2Limit").unwrap().constant = limit;
        let capped = optimizer.optimize(&network).unwrap();
        assert_close(capped.objective, free.objective);
        assert_close(capped.generator_capacity("OCGT").unwrap().value(), 70_000.0);
        let served: f64 = capped.generators.values().map(|g| g.p[1]).sum();
        assert_close(served, 70_000.0);
    }
}

#[test]
fn short_weightings_fail_validation() {
    let network = with_ocgt(base(vec![10.0, 20.0, 30.0]));
    let mut json = serde_json::to_value(&network).unwrap();
    json["snapshot_weightings"] = serde_json::json!([1.0]);
    let broken: Network = serde_json::from_value(json).unwrap();
    let err = LinearExpansionOptimizer::default()
        .optimize(&broken)
        .unwrap_err();
    assert!(matches!(err, OptimizeError::NetworkValidation(ref msg) if msg.contains("weightings")));
}

#[test]
fn impossible_co2_limit_is_infeasible() {
    let mut network = with_ocgt(base(vec![100.0, 100.0]));
    network
        .add_global_constraint(GlobalConstraint::co2_limit("CO2Limit", 0.0))
        .unwrap();
    let err = LinearExpansionOptimizer::default()
        .optimize(&network)
        .unwrap_err();
    assert!(matches!(err, OptimizeError::Infeasible(_)), "{err}");
}

#[test]
fn battery_shifts_solar_to_night() {
    let mut network = base(vec![1_000.0, 1_000.0]);
    network
        .add_generator(
            Generator::new("solar", "electricity", "solar")
                .extendable()
                .with_p_max_pu(vec![1.0, 0.0])
                .with_costs(100.0, 0.0),
        )
        .unwrap();
    network
        .add_storage_unit(
            StorageUnit::new("battery storage", "electricity", "battery storage")
                .extendable()
                .with_max_hours(1.0)
                .with_capital_cost(10.0)
                .cyclic(),
        )
        .unwrap();

    let solution = LinearExpansionOptimizer::default()
        .optimize(&network)
        .unwrap();
    assert_close(solution.generator_capacity("solar").unwrap().value(), 2_000.0);
    assert_close(solution.storage_capacity("battery storage").unwrap().value(), 1_000.0);
    let battery = &solution.storage_units["battery storage"];
    assert_close(battery.state_of_charge[0], 1_000.0);
    assert_close(battery.p()[1], 1_000.0);
    assert_close(solution.objective, 210_000.0);

    let stats = NetworkStatistics::compute(&network, &solution);
    let solar = stats.get(ComponentKind::Generator, "solar").unwrap();
    assert_close(solar.curtailment.value(), 0.0);
}

#[test]
fn link_converts_between_buses() {
    let mut network = base(vec![0.0, 0.0]);
    network.add_bus(Bus::new("hydrogen")).unwrap();
    network.add_carrier(Carrier::new("electrolysis")).unwrap();
    network
        .add_generator(
            Generator::new("OCGT", "electricity", "OCGT")
                .with_p_nom(30.0)
                .with_costs(0.0, 1.0),
        )
        .unwrap();
    network
        .add_link(
            Link::new("electrolysis", "electricity", "hydrogen", "electrolysis")
                .extendable()
                .with_efficiency(0.5)
                .with_capital_cost(5.0),
        )
        .unwrap();
    network
        .add_load(Load::new("h2 demand", "hydrogen", 10.0))
        .unwrap();

    let solution = LinearExpansionOptimizer::default()
        .optimize(&network)
        .unwrap();
    let link = &solution.links["electrolysis"];
    assert_close(link.p_nom_opt, 20.0);
    assert_close(link.p[0], 20.0);
    assert_close(solution.generators["OCGT"].p[1], 20.0);
}

#[test]
fn identical_inputs_give_identical_cost() {
    let network = with_ocgt(base(vec![10.0, 30.0, 20.0, 25.0]));
    let optimizer = LinearExpansionOptimizer::default();
    let first = optimizer.optimize(&network).unwrap();
    let second = optimizer.optimize(&network).unwrap();
    assert_eq!(first.objective, second.objective);
}

#[test]
fn invalid_network_is_rejected_before_solving() {
    let err = LinearExpansionOptimizer::default()
        .optimize(&Network::new())
        .unwrap_err();
    assert!(matches!(err, OptimizeError::NetworkValidation(_)));
}

#[test]
fn unsupported_global_constraint() {
    let mut network = with_ocgt(base(vec![1.0]));
    network
        .add_global_constraint(GlobalConstraint {
            name: "PE".into(),
            carrier_attribute: "primary_energy".into(),
            sense: ConstraintSense::LessEqual,
            constant: 1.0,
        })
        .unwrap();
    let err = LinearExpansionOptimizer::default()
        .optimize(&network)
        .unwrap_err();
    assert!(matches!(err, OptimizeError::Unsupported(_)));
}
