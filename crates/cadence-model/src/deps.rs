//! Classification of a model's ports into owned and external variables.
//!
//! [`DependencySet`] is built once at model construction from the
//! declared [`VarDef`]s and fixed for the model's lifetime. External
//! references are enumerated in declaration order through an ordered
//! map, so iteration is stable across runs; there is no hidden cursor
//! state.

use indexmap::IndexMap;

use cadence_core::{SyncMode, VarDef, VarId, VarRole};

/// An owned variable as seen by the dependency set.
#[derive(Clone, Debug, PartialEq)]
pub struct OwnedDecl {
    /// The variable (and output port) name.
    pub name: String,
    /// Base element id.
    pub var: VarId,
    /// Declared dimension.
    pub dimension: u32,
    /// Declared seed for `history[0]`, if any.
    pub init: Option<f64>,
}

/// An external reference as seen by the dependency set.
#[derive(Clone, Debug, PartialEq)]
pub struct ExternalDecl {
    /// The input port name.
    pub name: String,
    /// Base element id.
    pub var: VarId,
    /// Synchronization mode after any `all_sync` reclassification.
    pub mode: SyncMode,
    /// Declared dimension.
    pub dimension: u32,
}

/// A resolved port declaration, owned or external.
#[derive(Clone, Copy, Debug)]
pub enum PortDecl<'a> {
    /// The port names an owned variable.
    Owned(&'a OwnedDecl),
    /// The port names an external reference.
    External(&'a ExternalDecl),
}

impl PortDecl<'_> {
    /// The declaration's name.
    pub fn name(&self) -> &str {
        match self {
            PortDecl::Owned(d) => &d.name,
            PortDecl::External(d) => &d.name,
        }
    }

    /// The declaration's base id.
    pub fn var(&self) -> VarId {
        match self {
            PortDecl::Owned(d) => d.var,
            PortDecl::External(d) => d.var,
        }
    }

    /// The declaration's dimension.
    pub fn dimension(&self) -> u32 {
        match self {
            PortDecl::Owned(d) => d.dimension,
            PortDecl::External(d) => d.dimension,
        }
    }
}

/// Fixed classification of a model's ports.
#[derive(Debug, Default)]
pub struct DependencySet {
    owned: IndexMap<String, OwnedDecl>,
    externals: IndexMap<String, ExternalDecl>,
    all_sync: bool,
}

impl DependencySet {
    /// Create an empty set.
    ///
    /// With `all_sync` set, every external reference inserted afterwards
    /// is reclassified as [`SyncMode::Sync`] regardless of its declared
    /// mode. Aggregator models over auto-discovered inputs use this to
    /// wait for all inputs before producing a result.
    pub fn new(all_sync: bool) -> Self {
        Self {
            owned: IndexMap::new(),
            externals: IndexMap::new(),
            all_sync,
        }
    }

    /// Record a declaration under its assigned base id.
    ///
    /// Called in declaration order alongside arena allocation; the
    /// arena has already rejected duplicates.
    pub fn insert(&mut self, def: &VarDef, base: VarId) {
        match def.role {
            VarRole::Owned { init } => {
                self.owned.insert(
                    def.name.clone(),
                    OwnedDecl {
                        name: def.name.clone(),
                        var: base,
                        dimension: def.dimension,
                        init,
                    },
                );
            }
            VarRole::External { mode } => {
                let mode = if self.all_sync { SyncMode::Sync } else { mode };
                self.externals.insert(
                    def.name.clone(),
                    ExternalDecl {
                        name: def.name.clone(),
                        var: base,
                        mode,
                        dimension: def.dimension,
                    },
                );
            }
        }
    }

    /// The synchronization mode of an external port, or `None` for
    /// unknown or owned names.
    pub fn classify(&self, port: &str) -> Option<SyncMode> {
        self.externals.get(port).map(|d| d.mode)
    }

    /// The external declaration for a port name.
    pub fn external(&self, port: &str) -> Option<&ExternalDecl> {
        self.externals.get(port)
    }

    /// The owned declaration for a port name.
    pub fn owned_decl(&self, port: &str) -> Option<&OwnedDecl> {
        self.owned.get(port)
    }

    /// Whether the name is an owned variable.
    pub fn is_owned(&self, port: &str) -> bool {
        self.owned.contains_key(port)
    }

    /// External references in declaration order.
    pub fn externals(&self) -> impl Iterator<Item = &ExternalDecl> {
        self.externals.values()
    }

    /// External references classified Sync, in declaration order.
    pub fn sync_externals(&self) -> impl Iterator<Item = &ExternalDecl> {
        self.externals.values().filter(|d| d.mode == SyncMode::Sync)
    }

    /// Owned variables in declaration order.
    pub fn owned(&self) -> impl Iterator<Item = &OwnedDecl> {
        self.owned.values()
    }

    /// Whether `all_sync` reclassification is active.
    pub fn all_sync(&self) -> bool {
        self.all_sync
    }

    /// Number of external references.
    pub fn external_count(&self) -> usize {
        self.externals.len()
    }

    /// Resolve a port name, owned or external.
    pub fn port(&self, name: &str) -> Option<PortDecl<'_>> {
        if let Some(d) = self.owned.get(name) {
            return Some(PortDecl::Owned(d));
        }
        self.externals.get(name).map(PortDecl::External)
    }

    /// Resolve an element id to the declaration containing it.
    pub fn decl_of(&self, var: VarId) -> Option<PortDecl<'_>> {
        let contains = |base: VarId, dim: u32| var.0 >= base.0 && var.0 < base.0 + dim;
        if let Some(d) = self
            .owned
            .values()
            .find(|d| contains(d.var, d.dimension))
        {
            return Some(PortDecl::Owned(d));
        }
        self.externals
            .values()
            .find(|d| contains(d.var, d.dimension))
            .map(PortDecl::External)
    }

    /// Display label for an element id (`name` or `name[i]`).
    pub fn label_of(&self, var: VarId) -> Option<String> {
        let decl = self.decl_of(var)?;
        let offset = var.0 - decl.var().0;
        if decl.dimension() == 1 {
            Some(decl.name().to_string())
        } else {
            Some(format!("{}[{offset}]", decl.name()))
        }
    }
}
