//! Evaluation context passed to equations during `compute` and `init`.
//!
//! [`ComputeContext`] provides split-borrow access: committed history
//! through a shared [`HistoryReader`], staged writes through a mutable
//! [`StageWriter`]. Equations never touch storage directly, which keeps
//! the trait object-safe and makes equation code testable against
//! mocks.

use cadence_core::{ComputeError, HistoryReader, StageWriter, Timestamp, VarId};

use crate::deps::{DependencySet, PortDecl};

/// Read/stage access for one evaluation of an equation at one instant.
///
/// # Shift semantics
///
/// All shifts are non-positive. For an **external** reference, shift 0
/// is the latest applied value (on a triggered step, the bag value) and
/// −1 the value applied before it. For an **owned** variable the
/// current step's value is still pending: shift −1 addresses the
/// previous committed value, and shift 0 reads the staged value —
/// reading it before staging is an [`ComputeError::UnsetCurrentValue`]
/// error.
pub struct ComputeContext<'a> {
    reader: &'a dyn HistoryReader,
    writer: &'a mut dyn StageWriter,
    deps: &'a DependencySet,
    time: Timestamp,
}

impl<'a> ComputeContext<'a> {
    /// Construct a context. Typically called by the scheduler; tests
    /// construct one over mocks or a bare arena.
    pub fn new(
        reader: &'a dyn HistoryReader,
        writer: &'a mut dyn StageWriter,
        deps: &'a DependencySet,
        time: Timestamp,
    ) -> Self {
        Self {
            reader,
            writer,
            deps,
            time,
        }
    }

    /// The instant being evaluated.
    pub fn time(&self) -> Timestamp {
        self.time
    }

    /// The model's port classification, for declaration-ordered
    /// iteration over external references.
    pub fn dependencies(&self) -> &DependencySet {
        self.deps
    }

    /// Resolve a declared name to its base id.
    pub fn var(&self, name: &str) -> Result<VarId, ComputeError> {
        self.deps
            .port(name)
            .map(|d| d.var())
            .ok_or_else(|| ComputeError::UnknownVariable {
                var: name.to_string(),
            })
    }

    /// The value of a scalar variable (or a vector's addressed element
    /// id) at a non-positive shift.
    pub fn value(&self, var: VarId, shift: i32) -> Result<f64, ComputeError> {
        let decl = self
            .deps
            .decl_of(var)
            .ok_or_else(|| ComputeError::UnknownVariable {
                var: format!("#{var}"),
            })?;
        if shift > 0 {
            return Err(self.out_of_history(var, shift));
        }
        match decl {
            PortDecl::Owned(_) => {
                if shift == 0 {
                    self.writer
                        .staged(var)
                        .ok_or_else(|| ComputeError::UnsetCurrentValue {
                            var: self.label(var),
                        })
                } else {
                    // Pending step not committed yet: −1 is the head.
                    self.read_committed(var, shift + 1, shift)
                }
            }
            PortDecl::External(_) => self.read_committed(var, shift, shift),
        }
    }

    /// The value of one element of a vector variable.
    ///
    /// `var` is the declaration's base id; `element` must be below the
    /// declared dimension.
    pub fn element(&self, var: VarId, element: u32, shift: i32) -> Result<f64, ComputeError> {
        let decl = self.element_decl(var, element)?;
        self.value(decl.var().element(element), shift)
    }

    /// Stage a value for an owned variable.
    ///
    /// Re-staging within the same step overwrites the pending value
    /// (idempotent-per-instant).
    pub fn set(&mut self, var: VarId, value: f64) -> Result<(), ComputeError> {
        match self.deps.decl_of(var) {
            Some(PortDecl::Owned(_)) => {
                if self.writer.stage(var, value) {
                    Ok(())
                } else {
                    Err(ComputeError::UnknownVariable {
                        var: format!("#{var}"),
                    })
                }
            }
            Some(PortDecl::External(_)) => Err(ComputeError::ReadOnly {
                var: self.label(var),
            }),
            None => Err(ComputeError::UnknownVariable {
                var: format!("#{var}"),
            }),
        }
    }

    /// Stage a value for one element of an owned vector variable.
    pub fn set_element(&mut self, var: VarId, element: u32, value: f64) -> Result<(), ComputeError> {
        let target = self.element_decl(var, element)?.var().element(element);
        self.set(target, value)
    }

    fn element_decl(&self, var: VarId, element: u32) -> Result<PortDecl<'_>, ComputeError> {
        let decl = self
            .deps
            .decl_of(var)
            .ok_or_else(|| ComputeError::UnknownVariable {
                var: format!("#{var}"),
            })?;
        if element >= decl.dimension() {
            return Err(ComputeError::ElementOutOfRange {
                var: decl.name().to_string(),
                element,
                dimension: decl.dimension(),
            });
        }
        Ok(decl)
    }

    fn read_committed(&self, var: VarId, store_shift: i32, shift: i32) -> Result<f64, ComputeError> {
        self.reader
            .read(var, store_shift)
            .ok_or_else(|| self.out_of_history(var, shift))
    }

    fn out_of_history(&self, var: VarId, shift: i32) -> ComputeError {
        ComputeError::OutOfHistory {
            var: self.label(var),
            shift,
            depth: self.reader.retained(var).unwrap_or(0),
        }
    }

    fn label(&self, var: VarId) -> String {
        self.deps
            .label_of(var)
            .unwrap_or_else(|| format!("#{var}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::{SyncMode, VarDef};
    use cadence_history::VarArena;

    // Arena with one owned scalar `c` (id 0) and one async external `b`
    // (id 1), mirrored into a dependency set.
    fn fixture() -> (VarArena, DependencySet) {
        let mut arena = VarArena::new();
        let mut deps = DependencySet::new(false);
        for def in [
            VarDef::owned_init("c", 0.0),
            VarDef::external("b", SyncMode::Async),
        ] {
            let base = arena.declare(&def).unwrap();
            deps.insert(&def, base);
        }
        (arena, deps)
    }

    #[test]
    fn owned_shift_minus_one_is_previous_committed() {
        let (mut arena, deps) = fixture();
        arena.apply(VarId(0), 10.0, Timestamp(0.0)).unwrap();
        arena.apply(VarId(0), 20.0, Timestamp(1.0)).unwrap();

        let (store, staged) = arena.split();
        let ctx = ComputeContext::new(store, staged, &deps, Timestamp(2.0));
        assert_eq!(ctx.value(VarId(0), -1).unwrap(), 20.0);
        assert_eq!(ctx.value(VarId(0), -2).unwrap(), 10.0);
    }

    #[test]
    fn owned_shift_zero_requires_staging() {
        let (mut arena, deps) = fixture();
        arena.apply(VarId(0), 10.0, Timestamp(0.0)).unwrap();

        let (store, staged) = arena.split();
        let mut ctx = ComputeContext::new(store, staged, &deps, Timestamp(1.0));
        assert!(matches!(
            ctx.value(VarId(0), 0),
            Err(ComputeError::UnsetCurrentValue { .. })
        ));
        ctx.set(VarId(0), 42.0).unwrap();
        assert_eq!(ctx.value(VarId(0), 0).unwrap(), 42.0);
    }

    #[test]
    fn external_shift_zero_is_latest_applied() {
        let (mut arena, deps) = fixture();
        arena.apply(VarId(1), 0.0, Timestamp(0.0)).unwrap();
        arena.apply(VarId(1), 10.0, Timestamp(5.0)).unwrap();

        let (store, staged) = arena.split();
        let ctx = ComputeContext::new(store, staged, &deps, Timestamp(5.0));
        assert_eq!(ctx.value(VarId(1), 0).unwrap(), 10.0);
        assert_eq!(ctx.value(VarId(1), -1).unwrap(), 0.0);
    }

    #[test]
    fn out_of_history_reports_depth_and_shift() {
        let (mut arena, deps) = fixture();
        arena.apply(VarId(1), 1.0, Timestamp(0.0)).unwrap();

        let (store, staged) = arena.split();
        let ctx = ComputeContext::new(store, staged, &deps, Timestamp(1.0));
        match ctx.value(VarId(1), -3) {
            Err(ComputeError::OutOfHistory { var, shift, depth }) => {
                assert_eq!(var, "b");
                assert_eq!(shift, -3);
                assert_eq!(depth, 1);
            }
            other => panic!("expected OutOfHistory, got {other:?}"),
        }
    }

    #[test]
    fn positive_shift_is_rejected() {
        let (mut arena, deps) = fixture();
        let (store, staged) = arena.split();
        let ctx = ComputeContext::new(store, staged, &deps, Timestamp(0.0));
        assert!(matches!(
            ctx.value(VarId(1), 1),
            Err(ComputeError::OutOfHistory { .. })
        ));
    }

    #[test]
    fn staging_an_external_is_read_only() {
        let (mut arena, deps) = fixture();
        let (store, staged) = arena.split();
        let mut ctx = ComputeContext::new(store, staged, &deps, Timestamp(0.0));
        match ctx.set(VarId(1), 1.0) {
            Err(ComputeError::ReadOnly { var }) => assert_eq!(var, "b"),
            other => panic!("expected ReadOnly, got {other:?}"),
        }
    }

    #[test]
    fn unknown_ids_and_names_are_rejected() {
        let (mut arena, deps) = fixture();
        let (store, staged) = arena.split();
        let mut ctx = ComputeContext::new(store, staged, &deps, Timestamp(0.0));
        assert!(matches!(
            ctx.value(VarId(9), 0),
            Err(ComputeError::UnknownVariable { .. })
        ));
        assert!(matches!(
            ctx.set(VarId(9), 0.0),
            Err(ComputeError::UnknownVariable { .. })
        ));
        assert!(ctx.var("missing").is_err());
        assert_eq!(ctx.var("b").unwrap(), VarId(1));
    }

    #[test]
    fn context_reads_through_mocks() {
        use cadence_test_utils::{MockHistoryReader, MockStageWriter};

        let mut deps = DependencySet::new(false);
        deps.insert(&VarDef::owned("y"), VarId(0));
        deps.insert(&VarDef::external("x", SyncMode::Async), VarId(1));

        let mut reader = MockHistoryReader::new();
        reader.set_history(VarId(0), vec![1.0]);
        reader.set_history(VarId(1), vec![10.0, 20.0]);
        let mut writer = MockStageWriter::new(2);

        {
            let mut ctx = ComputeContext::new(&reader, &mut writer, &deps, Timestamp(1.0));
            assert_eq!(ctx.value(VarId(1), 0).unwrap(), 10.0);
            assert_eq!(ctx.value(VarId(1), -1).unwrap(), 20.0);
            assert_eq!(ctx.value(VarId(0), -1).unwrap(), 1.0);
            ctx.set(VarId(0), 5.0).unwrap();
            assert_eq!(ctx.value(VarId(0), 0).unwrap(), 5.0);
        }
        assert_eq!(writer.staged_count(), 1);
    }

    #[test]
    fn vector_elements_are_bounds_checked_at_declaration_dimension() {
        let mut arena = VarArena::new();
        let mut deps = DependencySet::new(false);
        let def = VarDef::owned("v").with_dimension(3);
        let base = arena.declare(&def).unwrap();
        deps.insert(&def, base);

        arena.apply(VarId(1), 7.0, Timestamp(0.0)).unwrap();

        let (store, staged) = arena.split();
        let mut ctx = ComputeContext::new(store, staged, &deps, Timestamp(1.0));
        assert_eq!(ctx.element(base, 1, -1).unwrap(), 7.0);
        ctx.set_element(base, 2, 3.0).unwrap();
        assert_eq!(ctx.element(base, 2, 0).unwrap(), 3.0);
        assert!(matches!(
            ctx.element(base, 3, 0),
            Err(ComputeError::ElementOutOfRange { .. })
        ));
    }
}
