//! # cem-core: Energy System Network Model
//!
//! Data structures for single-period capacity-expansion models: buses,
//! carriers, generators, loads, storage units, stores, links, lines and
//! global constraints, all evaluated over a sequence of weighted snapshots.
//!
//! ## Design
//!
//! - Components live in insertion-ordered vectors and are addressed by
//!   unique name, which keeps LP variable indexing trivial and the JSON
//!   export stable.
//! - Every `add_*` call checks name uniqueness and bus references, so a
//!   [`Network`] never holds dangling references.
//! - Time-dependent attributes are [`Series`] values, either static or one
//!   value per snapshot; [`Network::validate`] reports length mismatches.
//! - Topology queries (islands) go through [`graph_utils`], which builds a
//!   petgraph view of buses and branches on demand.
//!
//! ## Quick Start
//!
//! ```rust
//! use cem_core::*;
//!
//! let mut network = Network::new();
//! network.set_snapshots_hourly("2015-01-01T00:00:00".parse().unwrap(), 3, 1.0);
//! network.add_carrier(Carrier::new("OCGT").with_co2_emissions(0.187)).unwrap();
//! network.add_bus(Bus::new("electricity")).unwrap();
//! network
//!     .add_load(Load::new("demand", "electricity", vec![50.0, 80.0, 60.0]))
//!     .unwrap();
//! network
//!     .add_generator(
//!         Generator::new("OCGT", "electricity", "OCGT")
//!             .extendable()
//!             .with_costs(47_000.0, 64.0),
//!     )
//!     .unwrap();
//!
//! assert_eq!(network.stats().num_generators, 1);
//! assert!(!network.validate().has_errors());
//! ```

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub mod components;
pub mod diagnostics;
pub mod error;
pub mod graph_utils;
pub mod series;
pub mod units;

pub use components::{
    Bus, Carrier, ConstraintSense, Generator, GlobalConstraint, Line, Link, Load, StorageUnit,
    Store,
};
pub use diagnostics::{Category, DiagnosticIssue, Diagnostics, Severity};
pub use error::{CemError, CemResult};
pub use series::Series;
pub use units::{EurosPerYear, MegawattHours, Megawatts, TonnesCo2};

/// Kinds of component, used for reporting and for addressing results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Generator,
    StorageUnit,
    Store,
    Link,
    Line,
    Load,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Generator => "Generator",
            ComponentKind::StorageUnit => "StorageUnit",
            ComponentKind::Store => "Store",
            ComponentKind::Link => "Link",
            ComponentKind::Line => "Line",
            ComponentKind::Load => "Load",
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Basic counts and totals, printed by the CLI and used in validation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NetworkStats {
    pub num_snapshots: usize,
    pub num_buses: usize,
    pub num_carriers: usize,
    pub num_generators: usize,
    pub num_loads: usize,
    pub num_storage_units: usize,
    pub num_stores: usize,
    pub num_links: usize,
    pub num_lines: usize,
    pub num_global_constraints: usize,
    pub num_extendable: usize,
    /// Largest total demand over all snapshots (MW)
    pub peak_load_mw: f64,
    /// Weighted demand over the horizon (MWh)
    pub total_demand_mwh: f64,
}

/// The energy system model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Network {
    #[serde(default)]
    pub name: String,
    snapshots: Vec<NaiveDateTime>,
    /// Duration represented by each snapshot (hours)
    snapshot_weightings: Vec<f64>,
    buses: Vec<Bus>,
    carriers: Vec<Carrier>,
    generators: Vec<Generator>,
    loads: Vec<Load>,
    storage_units: Vec<StorageUnit>,
    stores: Vec<Store>,
    links: Vec<Link>,
    lines: Vec<Line>,
    global_constraints: Vec<GlobalConstraint>,
}

macro_rules! named_accessors {
    ($field:ident, $ty:ty, $get:ident, $get_mut:ident, $iter:ident) => {
        pub fn $get(&self, name: &str) -> Option<&$ty> {
            self.$field.iter().find(|c| c.name == name)
        }

        pub fn $get_mut(&mut self, name: &str) -> Option<&mut $ty> {
            self.$field.iter_mut().find(|c| c.name == name)
        }

        pub fn $iter(&self) -> &[$ty] {
            &self.$field
        }
    };
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    /// Replace the snapshots; every weighting is reset to one hour.
    pub fn set_snapshots(&mut self, snapshots: Vec<NaiveDateTime>) {
        self.snapshot_weightings = vec![1.0; snapshots.len()];
        self.snapshots = snapshots;
    }

    /// Evenly spaced snapshots starting at `start`, each `hours` long.
    pub fn set_snapshots_hourly(&mut self, start: NaiveDateTime, count: usize, hours: f64) {
        let step = Duration::seconds((hours * 3600.0).round() as i64);
        let snapshots = (0..count).map(|i| start + step * i as i32).collect();
        self.set_snapshots(snapshots);
        self.set_snapshot_weightings(hours);
    }

    /// Set every snapshot weighting to `hours`.
    pub fn set_snapshot_weightings(&mut self, hours: f64) {
        self.snapshot_weightings = vec![hours; self.snapshots.len()];
    }

    pub fn set_snapshot_weightings_from(&mut self, weightings: Vec<f64>) -> CemResult<()> {
        if weightings.len() != self.snapshots.len() {
            return Err(CemError::Validation(format!(
                "{} weightings given for {} snapshots",
                weightings.len(),
                self.snapshots.len()
            )));
        }
        self.snapshot_weightings = weightings;
        Ok(())
    }

    pub fn snapshots(&self) -> &[NaiveDateTime] {
        &self.snapshots
    }

    pub fn snapshot_weightings(&self) -> &[f64] {
        &self.snapshot_weightings
    }

    pub fn num_snapshots(&self) -> usize {
        self.snapshots.len()
    }

    /// Total modelled hours
    pub fn horizon_hours(&self) -> f64 {
        self.snapshot_weightings.iter().sum()
    }

    // =========================================================================
    // Adding components
    // =========================================================================

    pub fn add_bus(&mut self, bus: Bus) -> CemResult<()> {
        if self.bus(&bus.name).is_some() {
            return Err(duplicate("bus", &bus.name));
        }
        self.buses.push(bus);
        Ok(())
    }

    /// Add a carrier, or update colour and emissions of an existing one.
    pub fn add_carrier(&mut self, carrier: Carrier) -> CemResult<()> {
        if carrier.name.trim().is_empty() {
            return Err(CemError::Validation("carrier name cannot be empty".into()));
        }
        match self.carrier_mut(&carrier.name) {
            Some(existing) => *existing = carrier,
            None => self.carriers.push(carrier),
        }
        Ok(())
    }

    pub fn add_generator(&mut self, generator: Generator) -> CemResult<()> {
        if self.generator(&generator.name).is_some() {
            return Err(duplicate("generator", &generator.name));
        }
        self.require_bus(&generator.bus, "Generator", &generator.name)?;
        self.require_carrier(&generator.carrier, "Generator", &generator.name)?;
        self.require_fit(&generator.p_max_pu, "Generator", &generator.name, "p_max_pu")?;
        self.require_fit(&generator.p_min_pu, "Generator", &generator.name, "p_min_pu")?;
        require_positive(generator.efficiency, "Generator", &generator.name, "efficiency")?;
        self.generators.push(generator);
        Ok(())
    }

    pub fn add_load(&mut self, load: Load) -> CemResult<()> {
        if self.load(&load.name).is_some() {
            return Err(duplicate("load", &load.name));
        }
        self.require_bus(&load.bus, "Load", &load.name)?;
        self.require_fit(&load.p_set, "Load", &load.name, "p_set")?;
        self.loads.push(load);
        Ok(())
    }

    pub fn add_storage_unit(&mut self, unit: StorageUnit) -> CemResult<()> {
        if self.storage_unit(&unit.name).is_some() {
            return Err(duplicate("storage unit", &unit.name));
        }
        self.require_bus(&unit.bus, "StorageUnit", &unit.name)?;
        self.require_carrier(&unit.carrier, "StorageUnit", &unit.name)?;
        require_positive(unit.efficiency_store, "StorageUnit", &unit.name, "efficiency_store")?;
        require_positive(
            unit.efficiency_dispatch,
            "StorageUnit",
            &unit.name,
            "efficiency_dispatch",
        )?;
        require_positive(unit.max_hours, "StorageUnit", &unit.name, "max_hours")?;
        self.storage_units.push(unit);
        Ok(())
    }

    pub fn add_store(&mut self, store: Store) -> CemResult<()> {
        if self.store(&store.name).is_some() {
            return Err(duplicate("store", &store.name));
        }
        self.require_bus(&store.bus, "Store", &store.name)?;
        self.require_carrier(&store.carrier, "Store", &store.name)?;
        self.require_fit(&store.e_min_pu, "Store", &store.name, "e_min_pu")?;
        self.require_fit(&store.e_max_pu, "Store", &store.name, "e_max_pu")?;
        self.stores.push(store);
        Ok(())
    }

    pub fn add_link(&mut self, link: Link) -> CemResult<()> {
        if self.link(&link.name).is_some() {
            return Err(duplicate("link", &link.name));
        }
        self.require_bus(&link.bus0, "Link", &link.name)?;
        self.require_bus(&link.bus1, "Link", &link.name)?;
        self.require_carrier(&link.carrier, "Link", &link.name)?;
        self.require_fit(&link.efficiency, "Link", &link.name, "efficiency")?;
        self.require_fit(&link.p_max_pu, "Link", &link.name, "p_max_pu")?;
        self.require_fit(&link.p_min_pu, "Link", &link.name, "p_min_pu")?;
        self.links.push(link);
        Ok(())
    }

    pub fn add_line(&mut self, line: Line) -> CemResult<()> {
        if self.line(&line.name).is_some() {
            return Err(duplicate("line", &line.name));
        }
        self.require_bus(&line.bus0, "Line", &line.name)?;
        self.require_bus(&line.bus1, "Line", &line.name)?;
        self.lines.push(line);
        Ok(())
    }

    pub fn add_global_constraint(&mut self, constraint: GlobalConstraint) -> CemResult<()> {
        if self.global_constraint(&constraint.name).is_some() {
            return Err(duplicate("global constraint", &constraint.name));
        }
        self.global_constraints.push(constraint);
        Ok(())
    }

    /// Remove a global constraint, returning it if it existed.
    pub fn remove_global_constraint(&mut self, name: &str) -> Option<GlobalConstraint> {
        let idx = self.global_constraints.iter().position(|c| c.name == name)?;
        Some(self.global_constraints.remove(idx))
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    named_accessors!(buses, Bus, bus, bus_mut, buses);
    named_accessors!(carriers, Carrier, carrier, carrier_mut, carriers);
    named_accessors!(generators, Generator, generator, generator_mut, generators);
    named_accessors!(loads, Load, load, load_mut, loads);
    named_accessors!(storage_units, StorageUnit, storage_unit, storage_unit_mut, storage_units);
    named_accessors!(stores, Store, store, store_mut, stores);
    named_accessors!(links, Link, link, link_mut, links);
    named_accessors!(lines, Line, line, line_mut, lines);
    named_accessors!(
        global_constraints,
        GlobalConstraint,
        global_constraint,
        global_constraint_mut,
        global_constraints
    );

    /// Emission factor of a carrier (tCO2/MWh_th); unknown carriers emit nothing.
    pub fn carrier_co2(&self, carrier: &str) -> f64 {
        self.carrier(carrier).map(|c| c.co2_emissions).unwrap_or(0.0)
    }

    pub fn carrier_color(&self, carrier: &str) -> Option<&str> {
        self.carrier(carrier).and_then(|c| c.color.as_deref())
    }

    /// Total demand at snapshot `t` (MW)
    pub fn total_load_at(&self, t: usize) -> f64 {
        self.loads.iter().map(|l| l.p_set.at(t)).sum()
    }

    pub fn stats(&self) -> NetworkStats {
        let n = self.num_snapshots();
        let load_fits = self.loads.iter().all(|l| l.p_set.fits(n));
        let (peak_load_mw, total_demand_mwh) = if load_fits {
            // Snapshots without a weighting count as zero hours.
            (0..n).fold((0.0_f64, 0.0), |(peak, total), t| {
                let load = self.total_load_at(t);
                let hours = self.snapshot_weightings.get(t).copied().unwrap_or(0.0);
                (peak.max(load), total + load * hours)
            })
        } else {
            (0.0, 0.0)
        };
        let num_extendable = self.generators.iter().filter(|g| g.p_nom_extendable).count()
            + self.storage_units.iter().filter(|s| s.p_nom_extendable).count()
            + self.stores.iter().filter(|s| s.e_nom_extendable).count()
            + self.links.iter().filter(|l| l.p_nom_extendable).count()
            + self.lines.iter().filter(|l| l.s_nom_extendable).count();

        NetworkStats {
            num_snapshots: n,
            num_buses: self.buses.len(),
            num_carriers: self.carriers.len(),
            num_generators: self.generators.len(),
            num_loads: self.loads.len(),
            num_storage_units: self.storage_units.len(),
            num_stores: self.stores.len(),
            num_links: self.links.len(),
            num_lines: self.lines.len(),
            num_global_constraints: self.global_constraints.len(),
            num_extendable,
            peak_load_mw,
            total_demand_mwh,
        }
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Check the model for issues that make an optimisation fail or
    /// meaningless.
    pub fn validate(&self) -> Diagnostics {
        let mut diag = Diagnostics::new();
        self.validate_into(&mut diag);
        diag
    }

    pub fn validate_into(&self, diag: &mut Diagnostics) {
        let n = self.num_snapshots();

        if self.buses.is_empty() {
            diag.error(Category::Structure, "Network has no buses");
            return;
        }
        if n == 0 {
            diag.error(Category::Structure, "Network has no snapshots");
            return;
        }
        if self.snapshot_weightings.len() != n {
            diag.error(
                Category::Structure,
                format!(
                    "{} snapshot weightings for {} snapshots",
                    self.snapshot_weightings.len(),
                    n
                ),
            );
            return;
        }
        if self.snapshot_weightings.iter().any(|w| *w <= 0.0) {
            diag.error(Category::Structure, "Snapshot weightings must be positive");
        }

        let mut check_series = |series: &Series, kind: &str, name: &str, attr: &str| {
            if !series.fits(n) {
                diag.error(
                    Category::Series,
                    format!(
                        "{attr} has {} values but the network has {n} snapshots",
                        series.len().unwrap_or(0)
                    ),
                )
                .on(format!("{kind} {name}"));
            }
        };
        for g in &self.generators {
            check_series(&g.p_max_pu, "Generator", &g.name, "p_max_pu");
            check_series(&g.p_min_pu, "Generator", &g.name, "p_min_pu");
        }
        for l in &self.loads {
            check_series(&l.p_set, "Load", &l.name, "p_set");
        }
        for s in &self.stores {
            check_series(&s.e_min_pu, "Store", &s.name, "e_min_pu");
            check_series(&s.e_max_pu, "Store", &s.name, "e_max_pu");
        }
        for l in &self.links {
            check_series(&l.efficiency, "Link", &l.name, "efficiency");
            check_series(&l.p_max_pu, "Link", &l.name, "p_max_pu");
            check_series(&l.p_min_pu, "Link", &l.name, "p_min_pu");
        }

        if self.loads.is_empty() {
            diag.warn(Category::Structure, "Network has no loads");
        }
        if self.generators.is_empty() && self.links.is_empty() && self.stores.is_empty() {
            diag.error(Category::Structure, "Network has no supply components");
        }

        for g in &self.generators {
            let entity = format!("Generator {}", g.name);
            if g.p_nom_extendable && g.p_nom_min > g.p_nom_max {
                diag.error(Category::Capacity, "p_nom_min exceeds p_nom_max")
                    .on(&entity);
            }
            if g.capital_cost < 0.0 || g.marginal_cost < 0.0 {
                diag.warn(Category::Cost, "negative cost").on(&entity);
            }
            if g.p_max_pu.fits(n) && g.p_max_pu.max() > 1.0 + 1e-9 {
                diag.warn(Category::Series, "p_max_pu exceeds 1").on(&entity);
            }
        }
        for s in &self.storage_units {
            if s.p_nom_extendable && s.p_nom_min > s.p_nom_max {
                diag.error(Category::Capacity, "p_nom_min exceeds p_nom_max")
                    .on(format!("StorageUnit {}", s.name));
            }
        }

        for c in &self.global_constraints {
            if c.carrier_attribute != GlobalConstraint::CO2_EMISSIONS {
                diag.error(
                    Category::Constraint,
                    format!("unsupported carrier attribute '{}'", c.carrier_attribute),
                )
                .on(format!("GlobalConstraint {}", c.name));
            }
        }

        // Without any extendable supply the fixed fleet must cover the peak.
        let stats = self.stats();
        let extendable_supply = self.generators.iter().any(|g| g.p_nom_extendable)
            || self.storage_units.iter().any(|s| s.p_nom_extendable)
            || self.links.iter().any(|l| l.p_nom_extendable);
        if !extendable_supply {
            let fixed: f64 = self.generators.iter().map(|g| g.p_nom).sum::<f64>()
                + self.storage_units.iter().map(|s| s.p_nom).sum::<f64>();
            if fixed < stats.peak_load_mw {
                diag.warn(
                    Category::Capacity,
                    format!(
                        "Installed capacity ({:.1} MW) is below peak load ({:.1} MW) and nothing is extendable",
                        fixed, stats.peak_load_mw
                    ),
                );
            }
        }

        if let Ok(analysis) = graph_utils::find_islands(self) {
            if analysis.islands.len() > 1 {
                diag.warn(
                    Category::Topology,
                    format!(
                        "Network splits into {} islands; each must balance on its own",
                        analysis.islands.len()
                    ),
                );
            }
        }
    }

    fn require_bus(&self, bus: &str, kind: &str, name: &str) -> CemResult<()> {
        if self.bus(bus).is_none() {
            return Err(CemError::Network(format!(
                "{kind} '{name}' references unknown bus '{bus}'"
            )));
        }
        Ok(())
    }

    fn require_carrier(&self, carrier: &str, kind: &str, name: &str) -> CemResult<()> {
        if !carrier.is_empty() && self.carrier(carrier).is_none() {
            return Err(CemError::Network(format!(
                "{kind} '{name}' references unknown carrier '{carrier}'"
            )));
        }
        Ok(())
    }

    fn require_fit(&self, series: &Series, kind: &str, name: &str, attr: &str) -> CemResult<()> {
        // Before snapshots are set any length is accepted; validate() re-checks.
        if self.snapshots.is_empty() || series.fits(self.snapshots.len()) {
            return Ok(());
        }
        Err(CemError::Validation(format!(
            "{kind} '{name}': {attr} has {} values for {} snapshots",
            series.len().unwrap_or(0),
            self.snapshots.len()
        )))
    }
}

fn duplicate(kind: &str, name: &str) -> CemError {
    CemError::Network(format!("{kind} '{name}' already exists"))
}

fn require_positive(value: f64, kind: &str, name: &str, attr: &str) -> CemResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(CemError::Validation(format!(
            "{kind} '{name}': {attr} must be positive, got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> NaiveDateTime {
        "2015-01-01T00:00:00".parse().unwrap()
    }

    fn single_bus() -> Network {
        let mut network = Network::new();
        network.set_snapshots_hourly(start(), 4, 4.0);
        network.add_bus(Bus::new("electricity")).unwrap();
        network.add_carrier(Carrier::new("solar")).unwrap();
        network
    }

    #[test]
    fn snapshots_are_evenly_spaced() {
        let network = single_bus();
        assert_eq!(network.num_snapshots(), 4);
        assert_eq!(network.snapshots()[1].to_string(), "2015-01-01 04:00:00");
        assert_eq!(network.horizon_hours(), 16.0);
    }

    #[test]
    fn short_weightings_are_reported_not_panicked_on() {
        let mut network = single_bus();
        network
            .add_load(Load::new("demand", "electricity", vec![10.0, 30.0, 20.0, 10.0]))
            .unwrap();
        let mut json = serde_json::to_value(&network).unwrap();
        json["snapshot_weightings"] = serde_json::json!([1.0]);
        let broken: Network = serde_json::from_value(json).unwrap();

        assert_eq!(broken.stats().peak_load_mw, 30.0);
        let diag = broken.validate();
        assert!(diag.has_errors());
        assert!(diag.issues[0].message.contains("1 snapshot weightings for 4 snapshots"));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut network = single_bus();
        network.add_bus(Bus::new("heat")).unwrap();
        let err = network.add_bus(Bus::new("heat")).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn dangling_bus_reference_is_rejected() {
        let mut network = single_bus();
        let err = network
            .add_generator(Generator::new("solar", "nowhere", "solar"))
            .unwrap_err();
        assert!(matches!(err, CemError::Network(_)));
    }

    #[test]
    fn unknown_carrier_is_rejected() {
        let mut network = single_bus();
        let err = network
            .add_generator(Generator::new("wind", "electricity", "onwind"))
            .unwrap_err();
        assert!(err.to_string().contains("onwind"));
    }

    #[test]
    fn wrong_series_length_is_rejected() {
        let mut network = single_bus();
        let err = network
            .add_load(Load::new("demand", "electricity", vec![1.0, 2.0]))
            .unwrap_err();
        assert!(matches!(err, CemError::Validation(_)));
    }

    #[test]
    fn carrier_upsert_replaces_attributes() {
        let mut network = single_bus();
        network
            .add_carrier(Carrier::new("solar").with_color("gold"))
            .unwrap();
        assert_eq!(network.carriers().len(), 1);
        assert_eq!(network.carrier_color("solar"), Some("gold"));
    }

    #[test]
    fn stats_report_peak_and_energy() {
        let mut network = single_bus();
        network
            .add_load(Load::new("demand", "electricity", vec![10.0, 30.0, 20.0, 10.0]))
            .unwrap();
        let stats = network.stats();
        assert_eq!(stats.peak_load_mw, 30.0);
        assert_eq!(stats.total_demand_mwh, 280.0);
    }

    #[test]
    fn validate_flags_missing_supply_and_bad_constraint() {
        let mut network = single_bus();
        network
            .add_load(Load::new("demand", "electricity", 5.0))
            .unwrap();
        network
            .add_global_constraint(GlobalConstraint {
                name: "PE".into(),
                carrier_attribute: "primary_energy".into(),
                sense: ConstraintSense::LessEqual,
                constant: 0.0,
            })
            .unwrap();
        let diag = network.validate();
        assert_eq!(diag.in_category(Category::Structure).count(), 1);
        assert_eq!(diag.in_category(Category::Constraint).count(), 1);
    }

    #[test]
    fn validate_warns_about_islands() {
        let mut network = single_bus();
        network.add_bus(Bus::new("heat")).unwrap();
        network
            .add_generator(Generator::new("solar", "electricity", "solar").extendable())
            .unwrap();
        let diag = network.validate();
        assert_eq!(diag.in_category(Category::Topology).count(), 1);
    }

    #[test]
    fn json_roundtrip_keeps_unbounded_limits() {
        let mut network = single_bus();
        network
            .add_generator(Generator::new("solar", "electricity", "solar").extendable())
            .unwrap();
        let json = serde_json::to_string(&network).unwrap();
        let parsed: Network = serde_json::from_str(&json).unwrap();
        let solar = parsed.generator("solar").unwrap();
        assert!(solar.p_nom_max.is_infinite());
        assert_eq!(parsed.num_snapshots(), 4);
    }
}
