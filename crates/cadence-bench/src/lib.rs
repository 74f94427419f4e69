//! Benchmark profiles for the Cadence synchronization engine.
//!
//! Profile constructors shared between benches and ad-hoc profiling
//! runs.

#![forbid(unsafe_code)]
#![allow(missing_docs)]

use cadence_core::SyncMode;
use cadence_engine::{CoupledSystem, ModelConfig, Simulator};
use cadence_models::{Accumulator, RampSource, StepSource, Sum};

/// Reference profile: one stepped source, one ramp, two accumulators,
/// and an all-sync aggregator over the sources.
pub fn reference_profile() -> Simulator {
    let system = CoupledSystem::new()
        .model(
            ModelConfig::new("gate", Box::new(StepSource::new("b", 0.0, 10.0, 500.0)))
                .with_time_step(1.0),
        )
        .model(ModelConfig::new("ramp", Box::new(RampSource::new("r", 0.0, 0.25))).with_time_step(1.0))
        .model(
            ModelConfig::new(
                "acc_b",
                Box::new(Accumulator::new("c", "b", SyncMode::Sync, 1.0, 0.0)),
            )
            .with_time_step(1.0),
        )
        .model(
            ModelConfig::new(
                "acc_r",
                Box::new(Accumulator::new("c", "r", SyncMode::Sync, 0.0, 0.0)),
            )
            .with_time_step(1.0),
        )
        .model(ModelConfig::new("total", Box::new(Sum::new("out"))).with_all_sync())
        .couple("gate", "b", "acc_b", "b")
        .couple("ramp", "r", "acc_r", "r")
        .couple("gate", "b", "total", "b")
        .couple("ramp", "r", "total", "r");
    Simulator::new(system).expect("reference profile must validate")
}

/// Stress profile: a fan-in of `width` ramp sources into one all-sync
/// aggregator.
pub fn fan_in_profile(width: u32) -> Simulator {
    let mut system =
        CoupledSystem::new().model(ModelConfig::new("total", Box::new(Sum::new("out"))).with_all_sync());
    for i in 0..width {
        let name = format!("src{i}");
        system = system
            .model(
                ModelConfig::new(&name, Box::new(RampSource::new("r", i as f64, 0.5)))
                    .with_time_step(1.0),
            )
            .couple(&name, "r", "total", &name);
    }
    Simulator::new(system).expect("fan-in profile must validate")
}
