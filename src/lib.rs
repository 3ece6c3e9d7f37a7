//! # linkagg
//!
//! Link-aggregation flow hashing simulator.
//!
//! Models how a bundle of egress links (a LAG / port-channel) spreads traffic:
//! every frame is reduced to a flow signature by a protocol-aware hash, and
//! the signature picks one active link. Frames of one flow always land on the
//! same link, which keeps them in order but lets a few elephant flows skew
//! link utilisation no matter how good the hash is.
//!
//! ## Architecture
//!
//! ┌─────────────────────────────────────────────────────────────────┐
//! │               Flow Generator (seeded, injectable RNG)           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                   Flow Descriptor (TCP/UDP/ICMP/OSPF)           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │         Hash Selector: port-hash │ address-hash │ mac-hash      │
//! ├─────────────────────────────────────────────────────────────────┤
//! │         Egress Window Picker (active links vs. capacity)        │
//! │  ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌──────────┐         │
//! │  │  Link 1  │  │  Link 2  │  │  Link 3  │  │  Link N  │         │
//! │  └──────────┘  └──────────┘  └──────────┘  └──────────┘         │
//! ├─────────────────────────────────────────────────────────────────┤
//! │              Simulation Driver & per-link tallies               │
//! └─────────────────────────────────────────────────────────────────┘

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
// Allow stylistic lints that don't affect correctness
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]              // ASCII diagrams in docs
#![allow(clippy::unreadable_literal)]
#![allow(clippy::cast_possible_truncation)]  // Hash folding truncates on purpose
#![allow(clippy::cast_precision_loss)]       // Acceptable for stats
#![allow(clippy::use_self)]                  // Explicit type names in matches
#![allow(clippy::match_same_arms)]           // Explicit arm per variant is clearer
#![allow(clippy::return_self_not_must_use)]  // Builder methods don't need must_use

pub mod bundle;
pub mod config;
pub mod error;
pub mod flow;
pub mod hashing;
pub mod report;
pub mod sim;
pub mod types;

#[cfg(feature = "cli")]
pub mod cli;

pub use config::Config;
pub use error::{Error, Result};
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::bundle::{pick_link, window_layout, EgressAssignment, LinkBundle};
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::flow::{FlowDescriptor, FlowGenerator, FlowRecord};
    pub use crate::hashing::{compute_signature, compute_signature_with, HashPolicy};
    pub use crate::sim::{LinkTally, Simulation, SimulationReport};
    pub use crate::types::*;
}
