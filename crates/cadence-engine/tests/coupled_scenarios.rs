//! Coupled-system scenarios: shift semantics across a perturbation,
//! aggregation within one bag, sync blocking, and confluence ordering.

use cadence_core::{SyncMode, Timestamp};
use cadence_engine::{CoupledSystem, ModelConfig, SimulationError, Simulator};
use cadence_models::{Accumulator, StepSource, Sum};
use cadence_test_utils::{ConstantModel, EchoModel};

/// The perturbation system: a stepped source `b` (0 until t=5, then 10)
/// feeding `c = c(−1) + b(−1) + 1`.
fn perturbation_system() -> Simulator {
    let system = CoupledSystem::new()
        .model(
            ModelConfig::new("gate", Box::new(StepSource::new("b", 0.0, 10.0, 5.0)))
                .with_time_step(1.0),
        )
        .model(
            ModelConfig::new(
                "c1",
                Box::new(Accumulator::new("c", "b", SyncMode::Sync, 1.0, 0.0)),
            )
            .with_time_step(1.0),
        )
        .couple("gate", "b", "c1", "b");
    let mut sim = Simulator::new(system).unwrap();
    sim.start(Timestamp::ZERO).unwrap();
    sim
}

#[test]
fn shift_reads_against_not_at_the_perturbation_instant() {
    let mut sim = perturbation_system();
    sim.run_until(Timestamp(5.0)).unwrap();

    // At t=5 the bag carried b=10, but c(5) folded in b(−1) = b(4) = 0:
    // the perturbation is visible in b's history, not yet in c.
    assert_eq!(sim.value("gate", "b", 0), Some(10.0));
    assert_eq!(sim.value("c1", "b", 0), Some(10.0));
    assert_eq!(sim.value("c1", "b", -1), Some(0.0));
    assert_eq!(sim.value("c1", "c", 0), Some(5.0));

    // One step later the perturbation reaches c: c(6) = 5 + 10 + 1.
    sim.run_until(Timestamp(6.0)).unwrap();
    assert_eq!(sim.value("c1", "c", 0), Some(16.0));
}

#[test]
fn perturbation_trajectory_is_exact() {
    let mut sim = perturbation_system();
    let mut trajectory = Vec::new();
    for k in 1..=8u64 {
        sim.run_until(Timestamp(k as f64)).unwrap();
        trajectory.push(sim.value("c1", "c", 0).unwrap());
    }
    // c(t) = c(t−1) + b(t−1) + 1 with b = 0 for t < 5, 10 after.
    assert_eq!(
        trajectory,
        vec![1.0, 2.0, 3.0, 4.0, 5.0, 16.0, 27.0, 38.0]
    );
}

#[test]
fn sum_over_k_sync_inputs_fires_once_per_bag() {
    let system = CoupledSystem::new()
        .model(ModelConfig::new("x1", Box::new(ConstantModel::new("out", 1.0))).with_time_step(1.0))
        .model(ModelConfig::new("x2", Box::new(ConstantModel::new("out", 2.0))).with_time_step(1.0))
        .model(ModelConfig::new("x3", Box::new(ConstantModel::new("out", 4.0))).with_time_step(1.0))
        .model(ModelConfig::new("total", Box::new(Sum::new("out"))).with_all_sync())
        .couple("x1", "out", "total", "x1")
        .couple("x2", "out", "total", "x2")
        .couple("x3", "out", "total", "x3");
    let mut sim = Simulator::new(system).unwrap();
    sim.start(Timestamp::ZERO).unwrap();

    let out = sim.step().unwrap().unwrap();
    assert_eq!(out.time, Timestamp(1.0));

    // The aggregator fired exactly once, with all three inputs visible.
    let totals: Vec<f64> = out
        .emissions
        .iter()
        .filter(|e| e.model == "total")
        .map(|e| e.event.value)
        .collect();
    assert_eq!(totals, vec![7.0]);

    // Delivery accounting: one notification per input port in the bag.
    let metrics = sim.scheduler("total").unwrap().last_metrics();
    assert_eq!(metrics.deliveries.len(), 3);
    assert!(metrics.deliveries.iter().all(|(_, count)| *count == 1));
    assert_eq!(metrics.duplicate_deliveries, 0);
}

#[test]
fn double_delivery_within_a_bag_is_observable() {
    // Two couplings carry the same source port to the same input.
    let system = CoupledSystem::new()
        .model(ModelConfig::new("src", Box::new(ConstantModel::new("out", 5.0))).with_time_step(1.0))
        .model(ModelConfig::new("dst", Box::new(EchoModel::new("y", "x", SyncMode::Async))))
        .couple("src", "out", "dst", "x")
        .couple("src", "out", "dst", "x");
    let mut sim = Simulator::new(system).unwrap();
    sim.start(Timestamp::ZERO).unwrap();

    sim.step().unwrap().unwrap();
    assert_eq!(sim.value("dst", "y", 0), Some(5.0));

    let metrics = sim.scheduler("dst").unwrap().last_metrics();
    assert_eq!(metrics.deliveries, vec![("x".to_string(), 2)]);
    assert_eq!(metrics.duplicate_deliveries, 1);
}

#[test]
fn sync_consumer_of_a_slower_producer_fails_fast() {
    // Producer recomputes every 2 time units, consumer every 1: at t=1
    // the consumer's time advance elapses with no value for t=1.
    let system = CoupledSystem::new()
        .model(ModelConfig::new("slow", Box::new(ConstantModel::new("out", 1.0))).with_time_step(2.0))
        .model(
            ModelConfig::new("fast", Box::new(EchoModel::new("y", "x", SyncMode::Sync)))
                .with_time_step(1.0),
        )
        .couple("slow", "out", "fast", "x");
    let mut sim = Simulator::new(system).unwrap();
    sim.start(Timestamp::ZERO).unwrap();

    match sim.step() {
        Err(SimulationError::Model {
            model,
            source: cadence_core::StepError::MissingSyncInput { port, time, .. },
        }) => {
            assert_eq!(model, "fast");
            assert_eq!(port, "x");
            assert_eq!(time, Timestamp(1.0));
        }
        other => panic!("expected MissingSyncInput, got {other:?}"),
    }
}

#[test]
fn confluence_shows_the_fresh_external_value() {
    // Consumer with its own clock reading x at shift 0: at the switch
    // instant the bag value must already be applied.
    let system = CoupledSystem::new()
        .model(
            ModelConfig::new("gate", Box::new(StepSource::new("b", 0.0, 10.0, 3.0)))
                .with_time_step(1.0),
        )
        .model(
            ModelConfig::new("watch", Box::new(EchoModel::new("y", "x", SyncMode::Sync)))
                .with_time_step(1.0),
        )
        .couple("gate", "b", "watch", "x");
    let mut sim = Simulator::new(system).unwrap();
    sim.start(Timestamp::ZERO).unwrap();

    sim.run_until(Timestamp(3.0)).unwrap();
    // At t=3 the internal tick and the bag coincide; compute saw the
    // new value, never the stale pre-tick one.
    assert_eq!(sim.value("watch", "y", 0), Some(10.0));
    assert_eq!(sim.value("watch", "y", -1), Some(0.0));
}

#[test]
fn reactive_sum_stays_quiet_without_arrivals() {
    let system = CoupledSystem::new()
        .model(ModelConfig::new("total", Box::new(Sum::new("out"))).with_all_sync());
    let mut sim = Simulator::new(system).unwrap();
    sim.start(Timestamp::ZERO).unwrap();
    // No producers, no clock: nothing is ever scheduled.
    assert_eq!(sim.step().unwrap(), None);
}
