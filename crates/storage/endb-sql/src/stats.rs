//! Operation counters

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of adapter operation counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AdapterStats {
    /// Number of get operations
    pub get_count: u64,
    /// Number of has operations
    pub has_count: u64,
    /// Number of set operations
    pub set_count: u64,
    /// Number of delete operations
    pub delete_count: u64,
    /// Number of clear operations
    pub clear_count: u64,
    /// Number of all operations
    pub all_count: u64,
    /// Lookups (get/has) that found a row
    pub hits: u64,
    /// Lookups (get/has) that found nothing
    pub misses: u64,
}

impl AdapterStats {
    /// Fraction of lookups that found a row
    pub fn hit_rate(&self) -> Option<f64> {
        let total = self.hits + self.misses;
        (total > 0).then(|| self.hits as f64 / total as f64)
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Operation {
    Get,
    Has,
    Set,
    Delete,
    Clear,
    All,
}

impl Operation {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Operation::Get => "get",
            Operation::Has => "has",
            Operation::Set => "set",
            Operation::Delete => "delete",
            Operation::Clear => "clear",
            Operation::All => "all",
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    get: AtomicU64,
    has: AtomicU64,
    set: AtomicU64,
    delete: AtomicU64,
    clear: AtomicU64,
    all: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl StatsCounters {
    pub(crate) fn record(&self, op: Operation) {
        let counter = match op {
            Operation::Get => &self.get,
            Operation::Has => &self.has,
            Operation::Set => &self.set,
            Operation::Delete => &self.delete,
            Operation::Clear => &self.clear,
            Operation::All => &self.all,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("endb_sql_operations_total", "op" => op.as_str()).increment(1);
    }

    pub(crate) fn record_lookup(&self, found: bool) {
        if found {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn snapshot(&self) -> AdapterStats {
        AdapterStats {
            get_count: self.get.load(Ordering::Relaxed),
            has_count: self.has.load(Ordering::Relaxed),
            set_count: self.set.load(Ordering::Relaxed),
            delete_count: self.delete.load(Ordering::Relaxed),
            clear_count: self.clear.load(Ordering::Relaxed),
            all_count: self.all.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
