//! Chart specifications for capacity-expansion results.
//!
//! Charts are plain data ([`AreaChart`]) serialised as JSON; rendering is left
//! to whatever consumes the file.

pub mod chart;
pub mod dispatch;

pub use chart::{AreaChart, AreaSeries, Band, LineSeries, XValues};
pub use dispatch::{dispatch_chart, DISPATCH_Y_RANGE_GW};
