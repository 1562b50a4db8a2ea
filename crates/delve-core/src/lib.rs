//! delve-core: spatial world engine
//!
//! An unbounded overworld grid of named locations, bounded multi-level
//! interiors owned by overworld locations, seeded layout generators for
//! those interiors, and the reconciler that commits proposed rooms into
//! both while keeping every grid invariant.
//!
//! Everything here is synchronous and free of network I/O. File I/O is
//! limited to `save` and `WorldOptions::load_from_file`.

pub mod config;
pub mod error;
pub mod generation;
pub mod reconcile;
pub mod save;
pub mod world;

mod consts;
mod rng;

pub use config::WorldOptions;
pub use consts::*;
pub use error::{GridError, OptionsError, ReconcileError, SaveError};
pub use reconcile::{AreaReconciler, Proposal, ReconcileMode, ReconcileOutcome};
pub use rng::GameRng;
