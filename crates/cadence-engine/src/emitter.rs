//! Output event construction after a transition.

use cadence_core::{HistoryReader, OutputEvent, Timestamp, VarId, VarSet};
use cadence_model::DependencySet;

/// One output port slot, fixed at construction.
#[derive(Clone, Debug)]
struct EmitPort {
    port: String,
    element: Option<u32>,
    var: VarId,
}

/// Builds output events for owned variables committed by a transition.
///
/// The port table is derived from the dependency set at construction:
/// one slot per owned scalar, one per element of an owned vector, in
/// declaration order. Emission order is therefore stable and matches
/// declaration order, which downstream tests may rely on when several
/// ports fire in the same bag.
#[derive(Clone, Debug)]
pub struct OutputEmitter {
    ports: Vec<EmitPort>,
}

impl OutputEmitter {
    /// Build the port table from a model's dependency set.
    pub fn from_deps(deps: &DependencySet) -> Self {
        let mut ports = Vec::new();
        for decl in deps.owned() {
            if decl.dimension == 1 {
                ports.push(EmitPort {
                    port: decl.name.clone(),
                    element: None,
                    var: decl.var,
                });
            } else {
                for e in 0..decl.dimension {
                    ports.push(EmitPort {
                        port: decl.name.clone(),
                        element: Some(e),
                        var: decl.var.element(e),
                    });
                }
            }
        }
        Self { ports }
    }

    /// One event per changed owned element, in declaration order.
    ///
    /// `changed` is the set of element ids committed by the last
    /// `compute`; unchanged variables emit nothing.
    pub fn collect(
        &self,
        reader: &dyn HistoryReader,
        changed: &VarSet,
        time: Timestamp,
    ) -> Vec<OutputEvent> {
        let mut events = Vec::new();
        for slot in &self.ports {
            if !changed.contains(slot.var) {
                continue;
            }
            if let Some(value) = reader.read(slot.var, 0) {
                events.push(OutputEvent {
                    port: slot.port.clone(),
                    element: slot.element,
                    value,
                    time,
                });
            }
        }
        events
    }

    /// Number of output slots (owned elements).
    pub fn port_count(&self) -> usize {
        self.ports.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::{SyncMode, VarDef};
    use cadence_history::VarArena;

    fn fixture() -> (VarArena, DependencySet) {
        let mut arena = VarArena::new();
        let mut deps = DependencySet::new(false);
        for def in [
            VarDef::owned("a"),
            VarDef::owned("v").with_dimension(2),
            VarDef::external("x", SyncMode::Async),
            VarDef::owned("z"),
        ] {
            let base = arena.declare(&def).unwrap();
            deps.insert(&def, base);
        }
        (arena, deps)
    }

    #[test]
    fn ports_follow_declaration_order() {
        let (_, deps) = fixture();
        let emitter = OutputEmitter::from_deps(&deps);
        // a, v[0], v[1], z — externals contribute no ports.
        assert_eq!(emitter.port_count(), 4);
    }

    #[test]
    fn only_changed_elements_emit() {
        let (mut arena, deps) = fixture();
        let emitter = OutputEmitter::from_deps(&deps);
        let t = Timestamp(1.0);

        // Commit a (id 0) and v[1] (id 2), leave v[0] and z untouched.
        arena.apply(VarId(0), 1.0, t).unwrap();
        arena.apply(VarId(2), 2.0, t).unwrap();
        let changed: VarSet = [VarId(0), VarId(2)].into_iter().collect();

        let events = emitter.collect(arena.store(), &changed, t);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].port, "a");
        assert_eq!(events[0].element, None);
        assert_eq!(events[0].value, 1.0);
        assert_eq!(events[1].port, "v");
        assert_eq!(events[1].element, Some(1));
        assert_eq!(events[1].value, 2.0);
        assert_eq!(events[1].time, t);
    }

    #[test]
    fn emission_order_is_declaration_order_not_commit_order() {
        let (mut arena, deps) = fixture();
        let emitter = OutputEmitter::from_deps(&deps);
        let t = Timestamp(2.0);

        // Commit z first, then a — emission must still list a before z.
        arena.apply(VarId(4), 9.0, t).unwrap();
        arena.apply(VarId(0), 1.0, t).unwrap();
        let changed: VarSet = [VarId(4), VarId(0)].into_iter().collect();

        let events = emitter.collect(arena.store(), &changed, t);
        let ports: Vec<&str> = events.iter().map(|e| e.port.as_str()).collect();
        assert_eq!(ports, vec!["a", "z"]);
    }
}
