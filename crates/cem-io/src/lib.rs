//! # cem-io: Input data for capacity-expansion models
//!
//! Loading and preprocessing of the two inputs every model run needs, plus
//! network persistence:
//!
//! - [`costs`]: technology-data cost tables (`technology,parameter,value,unit,...`),
//!   unit normalisation, defaults, annuities, capital and marginal costs.
//! - [`timeseries`]: hourly load and capacity-factor CSVs, load scaling and
//!   resampling to a coarser resolution.
//! - [`fetch`]: local paths or `http(s)` URLs, with downloads cached on disk.
//! - [`export`]: JSON export and import of [`cem_core::Network`] with optional results.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cem_io::costs::CostTable;
//! use cem_io::timeseries::TimeSeries;
//!
//! fn main() -> anyhow::Result<()> {
//!     let costs = CostTable::from_path("costs_2030.csv")?;
//!     println!("OCGT capital cost: {:.0} EUR/MW/a", costs.get("OCGT")?.capital_cost);
//!
//!     let mut ts = TimeSeries::from_path("time-series.csv")?;
//!     ts.scale_column("load", 1e3)?;
//!     let ts = ts.resample(4.0)?;
//!     println!("{} snapshots at {} h", ts.len(), ts.resolution_hours());
//!     Ok(())
//! }
//! ```

pub mod costs;
pub mod export;
#[cfg(feature = "native-io")]
pub mod fetch;
pub mod timeseries;

pub use costs::{annuity, CostDefaults, CostTable, TechnologyCosts};
pub use export::{load_network, save_network, NetworkExport};
#[cfg(feature = "native-io")]
pub use fetch::{DataSource, SourceCache};
pub use timeseries::TimeSeries;
