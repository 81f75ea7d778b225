//! # Kuwetex Litter Box
//!
//! The simulation core: the shared [`LitterBox`], the [`CleaningMonitor`]
//! that periodically cleans it, the [`DataBank`] that keeps the history, and
//! the [`CatSimulator`] that drives the cats.
//!
//! Every component takes its collaborators at construction and stops on a
//! [`Shutdown`] signal.

mod cleaning_monitor;
mod data_bank;
mod litter_box;
mod shutdown;
mod simulator;

pub use cleaning_monitor::CleaningMonitor;
pub use data_bank::{DataBank, IllnessRecord, UsageRecord, PRESCRIPTIONS};
pub use litter_box::{BoxState, BoxTimings, CleaningOutcome, LitterBox};
pub use shutdown::{Shutdown, ShutdownTrigger};
pub use simulator::CatSimulator;
