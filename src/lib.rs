//! # vo2-sweep: Experiment Grid Orchestrator
//!
//! Drives a grid of VO2 prediction experiments: it enumerates the
//! cross-product of cohort group × time-window set × fold (or full load,
//! plus a drop-ci variant) × optional gender stratum, dispatches each point
//! to an external experiment collaborator exactly once, and records a
//! grid-key → experiment-id mapping.
//!
//! ## Guarantees
//!
//! - **Coverage**: every grid point is dispatched once; none is skipped.
//! - **Baseline filters**: every point excludes major dysrhythmia and
//!   myocardial ischemia before any run-level filter.
//! - **Unique keys**: mapping keys are checked before the first dispatch.
//! - **All-or-nothing output**: the mapping is written once, at the end.
//!
//! ## Example
//!
//! ```rust,no_run
//! use vo2_sweep::config::{RunConfiguration, RunOverrides};
//! use vo2_sweep::experiment::{CommandLauncher, TrackingRepo};
//! use vo2_sweep::sweep::run_sweep;
//!
//! let overrides = RunOverrides::from_dotlist(["full_load=true"])?;
//! let config = RunConfiguration::resolve(overrides)?;
//! let repo = TrackingRepo::open(".")?;
//! let launcher = CommandLauncher::new("python", ["-m", "utils.exp"]);
//!
//! let report = run_sweep(&config, &launcher, &repo, "data/model_mapping.yml")?;
//! println!("{} experiments", report.completed);
//! # Ok::<(), vo2_sweep::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod config;
pub mod dispatch;
pub mod error;
pub mod experiment;
pub mod filter;
pub mod grid;
pub mod logging;
pub mod mapping;
pub mod sweep;

pub use error::{Error, Result};
