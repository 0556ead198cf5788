//! Linear capacity expansion
//!
//! Chooses nominal capacities of extendable components and their dispatch
//! over all snapshots at minimum annualised system cost.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CAPACITY EXPANSION                                                      │
//! │  ──────────────────                                                      │
//! │                                                                          │
//! │  Given:                                                                  │
//! │    • Snapshots with weightings w_t (hours)                               │
//! │    • Demand per bus and snapshot                                         │
//! │    • Candidate technologies with capital and marginal cost               │
//! │    • Availability profiles p_max_pu(t)                                   │
//! │                                                                          │
//! │  Decide:                                                                 │
//! │    • Nominal capacity of every extendable component                     │
//! │    • Dispatch, storage operation, link and line flows                   │
//! │                                                                          │
//! │  Minimize:                                                               │
//! │    Σ capital_cost · P_nom  +  Σ_t w_t · marginal_cost · p_t             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Formulation
//!
//! ```text
//! Σ_g p_g,t + Σ_s (d_s,t − c_s,t) + Σ_e p_e,t − Σ_l p_l,t^out + Σ_l η_l,t p_l,t^in ± f_t = D_b,t
//! p_min_pu(t) · P_g ≤ p_g,t ≤ p_max_pu(t) · P_g
//! 0 ≤ d_s,t, c_s,t ≤ P_s          0 ≤ soc_s,t ≤ max_hours · P_s
//! soc_s,t = (1 − λ)^w soc_s,t−1 + w η_store c_s,t − (w / η_dispatch) d_s,t
//! e_min_pu · E_e ≤ e_e,t ≤ e_max_pu · E_e,   e_e,t = (1 − λ)^w e_e,t−1 − w p_e,t
//! |f_t| ≤ s_max_pu · S             (transport model, no KVL)
//! Σ_g Σ_t w_t p_g,t / η_g · co2_g  (sense)  constant
//! ```
//!
//! Cyclic storage wraps `t − 1` to the last snapshot; otherwise the initial
//! level is a constant.

mod check;
pub mod emissions;
pub mod optimizer;
pub mod solution;

pub use optimizer::LinearExpansionOptimizer;
pub use solution::{DispatchResult, NetworkSolution, SolveStatus, StorageResult, StoreResult};
