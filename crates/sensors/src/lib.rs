//! # Kuwetex Sensors
//!
//! Each probe reads one attribute off a cat as it walks up to the litter box.
//! Probes hold no state of their own; the weight and health probes only draw
//! from an injected [`RandomSource`](shared::RandomSource).

mod probes;
mod suite;

pub use probes::{AttributeProbe, EyeProbe, HealthProbe, HealthStatus, NameProbe, WeightProbe};
pub use suite::{CatReading, SensorSuite};
