//! Unit newtypes for reported quantities.
//!
//! Component attributes stay plain `f64` (their units are documented on the
//! field) because sweeps and loaders address them generically. Aggregated
//! results are typed so that capacities, energies, costs and emissions cannot
//! be added to each other by accident.
//!
//! ```
//! use cem_core::units::{EurosPerYear, Megawatts};
//!
//! let capex = EurosPerYear(2.5e9) + EurosPerYear(0.5e9);
//! assert_eq!(capex.to_billions(), 3.0);
//!
//! // let wrong = capex + Megawatts(1.0); // does not compile
//! let _ = Megawatts(10.0);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

macro_rules! impl_unit_ops {
    ($type:ty, $unit_name:literal) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl AddAssign for $type {
            fn add_assign(&mut self, rhs: Self) {
                self.0 += rhs.0;
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Neg for $type {
            type Output = Self;
            fn neg(self) -> Self::Output {
                Self(-self.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl Div<$type> for $type {
            type Output = f64;
            fn div(self, rhs: $type) -> Self::Output {
                self.0 / rhs.0
            }
        }

        impl std::fmt::Display for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{:.4} {}", self.0, $unit_name)
            }
        }

        impl $type {
            #[inline]
            pub const fn new(value: f64) -> Self {
                Self(value)
            }

            #[inline]
            pub const fn value(self) -> f64 {
                self.0
            }

            #[inline]
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }
        }

        impl std::iter::Sum for $type {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                Self(iter.map(|x| x.0).sum())
            }
        }

        impl<'a> std::iter::Sum<&'a $type> for $type {
            fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
                Self(iter.map(|x| x.0).sum())
            }
        }
    };
}

/// Power or installed capacity in megawatts (MW)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Megawatts(pub f64);

impl_unit_ops!(Megawatts, "MW");

impl Megawatts {
    pub fn to_gigawatts(self) -> f64 {
        self.0 / 1e3
    }
}

/// Energy in megawatt-hours (MWh)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct MegawattHours(pub f64);

impl_unit_ops!(MegawattHours, "MWh");

impl MegawattHours {
    pub fn to_terawatt_hours(self) -> f64 {
        self.0 / 1e6
    }
}

/// Annualised cost in euros per year (€/a)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct EurosPerYear(pub f64);

impl_unit_ops!(EurosPerYear, "EUR/a");

impl EurosPerYear {
    pub fn to_millions(self) -> f64 {
        self.0 / 1e6
    }

    pub fn to_billions(self) -> f64 {
        self.0 / 1e9
    }
}

/// Emissions in tonnes of CO2
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct TonnesCo2(pub f64);

impl_unit_ops!(TonnesCo2, "tCO2");

impl TonnesCo2 {
    pub fn to_megatonnes(self) -> f64 {
        self.0 / 1e6
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_scaling() {
        let cost = EurosPerYear(42.0e9);
        assert!((cost.to_billions() - 42.0).abs() < 1e-12);
        assert!((cost.to_millions() - 42_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_sum_and_ratio() {
        let total: Megawatts = [Megawatts(10.0), Megawatts(30.0)].iter().sum();
        assert_eq!(total, Megawatts(40.0));
        assert_eq!(Megawatts(30.0) / total, 0.75);
    }

    #[test]
    fn test_display_includes_unit() {
        assert_eq!(TonnesCo2(1.5).to_string(), "1.5000 tCO2");
        assert!(MegawattHours(2.0).to_string().ends_with("MWh"));
    }
}
