//! Module dependency graph.
//!
//! Ids are dense and handed out in first-discovery order by the
//! [`ModuleTable`], the only place a new module comes into existence.

use rustc_hash::FxHashMap;
use tsbundle_parser::{ImportRecord, LineIndex, Stmt};

/// Unique identifier for a module in the graph.
pub type ModuleId = usize;

/// Outcome of registering a path with the [`ModuleTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discovery {
    /// First sighting; the module still has to be parsed.
    New(ModuleId),
    /// Already known; nothing to do.
    Existing(ModuleId),
}

impl Discovery {
    #[must_use]
    pub fn id(self) -> ModuleId {
        match self {
            Self::New(id) | Self::Existing(id) => id,
        }
    }
}

/// Append-only absolute path → id mapping.
#[derive(Debug, Default)]
pub struct ModuleTable {
    ids: FxHashMap<String, ModuleId>,
    paths: Vec<String>,
}

impl ModuleTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `path`, assigning the next id if it has none yet.
    pub fn insert(&mut self, path: &str) -> Discovery {
        if let Some(&id) = self.ids.get(path) {
            return Discovery::Existing(id);
        }
        let id = self.paths.len();
        self.ids.insert(path.to_string(), id);
        self.paths.push(path.to_string());
        Discovery::New(id)
    }

    #[must_use]
    pub fn get(&self, path: &str) -> Option<ModuleId> {
        self.ids.get(path).copied()
    }

    #[must_use]
    pub fn path(&self, id: ModuleId) -> Option<&str> {
        self.paths.get(id).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// A module in the dependency graph.
#[derive(Debug, Clone)]
pub struct ModuleRecord {
    pub id: ModuleId,
    /// Absolute path to the module.
    pub path: String,
    /// Top-level statements in source order.
    pub stmts: Vec<Stmt>,
    /// Specifiers found in the module, with their resolved ids.
    pub import_records: Vec<ImportRecord>,
    /// Resolved dependency ids, deduplicated, in first-occurrence order.
    pub dependencies: Vec<ModuleId>,
    /// Line starts of the source, for diagnostics after the text is gone.
    pub lines: LineIndex,
    /// Reading or parsing the file failed; the module has no statements.
    pub failed: bool,
}

impl ModuleRecord {
    /// Stand-in for a module that could not be read or parsed.
    #[must_use]
    pub fn failed(id: ModuleId, path: &str) -> Self {
        Self {
            id,
            path: path.to_string(),
            stmts: Vec::new(),
            import_records: Vec::new(),
            dependencies: Vec::new(),
            lines: LineIndex::new(""),
            failed: true,
        }
    }
}

/// The deduplicated set of modules reachable from the entry points.
#[derive(Debug, Default)]
pub struct ModuleGraph {
    table: ModuleTable,
    /// All modules, indexed by id.
    modules: Vec<ModuleRecord>,
    entries: Vec<ModuleId>,
}

impl ModuleGraph {
    /// Assemble a graph. `modules[i].id` must equal `i`, one per table entry.
    #[must_use]
    pub fn new(table: ModuleTable, modules: Vec<ModuleRecord>, entries: Vec<ModuleId>) -> Self {
        debug_assert_eq!(table.len(), modules.len());
        debug_assert!(modules.iter().enumerate().all(|(i, m)| m.id == i));
        Self {
            table,
            modules,
            entries,
        }
    }

    /// Get a module by id.
    #[must_use]
    pub fn get(&self, id: ModuleId) -> Option<&ModuleRecord> {
        self.modules.get(id)
    }

    /// Get module id by absolute path.
    #[must_use]
    pub fn id_by_path(&self, path: &str) -> Option<ModuleId> {
        self.table.get(path)
    }

    /// Entry module ids, in the order the entry points were given.
    #[must_use]
    pub fn entries(&self) -> &[ModuleId] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Iterate over all modules in id order.
    pub fn iter(&self) -> impl Iterator<Item = &ModuleRecord> {
        self.modules.iter()
    }

    /// Every module reachable from `entry` (itself included), ascending.
    #[must_use]
    pub fn reachable_from(&self, entry: ModuleId) -> Vec<ModuleId> {
        let mut seen = vec![false; self.modules.len()];
        let mut stack = vec![entry];
        while let Some(id) = stack.pop() {
            let Some(module) = self.modules.get(id) else {
                continue;
            };
            if std::mem::replace(&mut seen[id], true) {
                continue;
            }
            stack.extend(module.dependencies.iter().copied().filter(|&dep| !seen[dep]));
        }
        seen.iter()
            .enumerate()
            .filter_map(|(id, &reached)| reached.then_some(id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: ModuleId, path: &str, dependencies: Vec<ModuleId>) -> ModuleRecord {
        ModuleRecord {
            dependencies,
            failed: false,
            ..ModuleRecord::failed(id, path)
        }
    }

    #[test]
    fn test_table_assigns_dense_ids() {
        let mut table = ModuleTable::new();
        assert_eq!(table.insert("/a.ts"), Discovery::New(0));
        assert_eq!(table.insert("/b.ts"), Discovery::New(1));
        assert_eq!(table.insert("/a.ts"), Discovery::Existing(0));
        assert_eq!(table.len(), 2);
        assert_eq!(table.path(1), Some("/b.ts"));
        assert_eq!(table.get("/c.ts"), None);
    }

    #[test]
    fn test_reachable_from_handles_cycles() {
        let mut table = ModuleTable::new();
        for path in ["/a.ts", "/b.ts", "/c.ts", "/d.ts"] {
            table.insert(path);
        }
        // a -> c -> b -> a, d unreachable from a
        let graph = ModuleGraph::new(
            table,
            vec![
                record(0, "/a.ts", vec![2]),
                record(1, "/b.ts", vec![0]),
                record(2, "/c.ts", vec![1]),
                record(3, "/d.ts", vec![0]),
            ],
            vec![0, 3],
        );
        assert_eq!(graph.reachable_from(0), vec![0, 1, 2]);
        assert_eq!(graph.reachable_from(3), vec![0, 1, 2, 3]);
        assert_eq!(graph.id_by_path("/c.ts"), Some(2));
        assert_eq!(graph.entries(), &[0, 3]);
    }
}
