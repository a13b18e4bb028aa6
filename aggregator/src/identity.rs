//! Stable series identities for PIDs that the OS reuses

use std::collections::HashMap;
use std::fmt;

/// Identity of one process lineage.
///
/// Renders as `"{pid}"` for the first lineage seen under a PID and
/// `"{pid}({n})"`, n >= 2, for each later lineage. Ordering is by PID first
/// and then by lineage, so `42(2)` sorts right after `42` and both sort
/// after `7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeriesKey {
    pid: u32,
    generation: u32,
}

impl SeriesKey {
    pub fn new(pid: u32) -> Self {
        Self { pid, generation: 1 }
    }

    pub fn with_generation(pid: u32, generation: u32) -> Self {
        Self {
            pid,
            generation: generation.max(1),
        }
    }

    /// Raw PID with any suffix stripped.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.generation > 1 {
            write!(f, "{}({})", self.pid, self.generation)
        } else {
            write!(f, "{}", self.pid)
        }
    }
}

/// Assigns series keys to raw (pid, command) pairs.
///
/// Results depend on call order: samples must be fed in chronological
/// order. One resolver lives for exactly one aggregation run.
#[derive(Debug, Default)]
pub struct IdentityResolver {
    commands: HashMap<u32, String>,
    counters: HashMap<u32, u32>,
}

impl IdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&mut self, pid: u32, cmd: &str) -> SeriesKey {
        match self.commands.get_mut(&pid) {
            None => {
                self.commands.insert(pid, cmd.to_string());
                SeriesKey::new(pid)
            }
            // Repeats keep the current lineage key. Returning the bare pid
            // here would split one (pid, command) lineage across two keys.
            Some(current) if current == cmd => {
                let generation = self.counters.get(&pid).copied().unwrap_or(1);
                SeriesKey::with_generation(pid, generation)
            }
            Some(current) => {
                let counter = self.counters.entry(pid).or_insert(1);
                *counter += 1;
                *current = cmd.to_string();
                SeriesKey::with_generation(pid, *counter)
            }
        }
    }

    /// Most recent command recorded for a raw PID.
    pub fn command_for(&self, pid: u32) -> Option<&str> {
        self.commands.get(&pid).map(String::as_str)
    }

    /// Number of distinct raw PIDs seen.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
