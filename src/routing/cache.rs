//! Per-method routing table cache.
//!
//! # Responsibilities
//! - Build the routing table for a method on first use
//! - Hand every caller the same table instance afterwards
//!
//! # Design Decisions
//! - Keys are upper-cased, so method lookup is case-insensitive
//! - Each key holds a `OnceLock` cell: the shard lock only covers inserting
//!   the empty cell, the build itself runs outside it
//! - One build per key; concurrent callers for that key wait on the cell
//! - Readers of built tables never wait on another method's build

use dashmap::DashMap;
use std::sync::{Arc, OnceLock};

use crate::handlers::registry::HandlerRegistry;
use crate::observability::metrics;
use crate::routing::table::{RoutingTable, RoutingTableBuilder};

type BuildFn = Box<dyn Fn(&str) -> RoutingTable + Send + Sync>;
type TableCell = Arc<OnceLock<Arc<RoutingTable>>>;

/// Lazily built, memoized routing tables keyed by HTTP method.
pub struct RoutingTableCache {
    tables: DashMap<String, TableCell>,
    build: BuildFn,
}

impl RoutingTableCache {
    /// Create a cache with a custom build step.
    pub fn new<F>(build: F) -> Self
    where
        F: Fn(&str) -> RoutingTable + Send + Sync + 'static,
    {
        Self {
            tables: DashMap::new(),
            build: Box::new(build),
        }
    }

    /// Create a cache that builds tables from the registered handlers.
    pub fn from_registry(registry: Arc<HandlerRegistry>) -> Self {
        Self::new(move |method| RoutingTableBuilder::new(registry.handlers_for(method)).build())
    }

    /// Routing table for `method`, building it on first use.
    pub fn table_for(&self, method: &str) -> Arc<RoutingTable> {
        let key = method.to_ascii_uppercase();
        let cell = self.cell(&key);

        Arc::clone(cell.get_or_init(|| {
            let table = (self.build)(&key);
            tracing::debug!(method = %key, routes = table.len(), "Routing table built");
            metrics::record_table_build(&key);
            Arc::new(table)
        }))
    }

    fn cell(&self, key: &str) -> TableCell {
        if let Some(cell) = self.tables.get(key) {
            return Arc::clone(cell.value());
        }
        let entry = self.tables.entry(key.to_string()).or_default();
        Arc::clone(entry.value())
    }

    /// Number of methods with a built table.
    pub fn len(&self) -> usize {
        self.tables.iter().filter(|cell| cell.value().get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_table_built_once_per_method() {
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&builds);
        let cache = RoutingTableCache::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            RoutingTable::default()
        });

        let first = cache.table_for("GET");
        let second = cache.table_for("get");
        let post = cache.table_for("POST");

        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &post));
        assert_eq!(builds.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_build_receives_normalized_method() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let record = Arc::clone(&seen);
        let cache = RoutingTableCache::new(move |method| {
            record.lock().unwrap().push(method.to_string());
            RoutingTable::default()
        });

        cache.table_for("delete");
        assert_eq!(*seen.lock().unwrap(), vec!["DELETE".to_string()]);
    }

    #[test]
    fn test_slow_build_does_not_block_built_tables() {
        use std::sync::mpsc;
        use std::thread;
        use std::time::{Duration, Instant};

        let (started_tx, started_rx) = mpsc::channel();
        let started_tx = std::sync::Mutex::new(started_tx);
        let cache = Arc::new(RoutingTableCache::new(move |method| {
            if method == "SLOW" {
                let _ = started_tx.lock().unwrap().send(());
                thread::sleep(Duration::from_millis(800));
            }
            RoutingTable::default()
        }));

        let methods: Vec<String> = (0..256).map(|i| format!("M{i}")).collect();
        for method in &methods {
            cache.table_for(method);
        }

        let slow = {
            let cache = Arc::clone(&cache);
            thread::spawn(move || cache.table_for("SLOW"))
        };
        started_rx.recv().unwrap();

        let begin = Instant::now();
        for method in &methods {
            cache.table_for(method);
        }
        assert!(begin.elapsed() < Duration::from_millis(400));
        assert!(!slow.is_finished());

        slow.join().unwrap();
        assert_eq!(cache.len(), 257);
    }
}
