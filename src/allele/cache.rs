use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::error::Result;
use crate::tensor::Tensor;

use super::scheme::Scheme;

/// Which matrix a cache entry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `(U, L, V)` matrix over the allele universe.
    Universe,
    /// `(N, L, V)` matrix over a working list.
    PerRequest,
}

/// Write-once memo of computed matrices keyed by (operation, scheme).
///
/// The lock is held while a missing entry is computed, so concurrent first
/// requests for the same key compute it once and share the result.
#[derive(Debug, Default)]
pub struct EncodingCache {
    slots: Mutex<HashMap<(Operation, Scheme), Arc<Tensor>>>,
}

impl EncodingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_try_insert_with<F>(
        &self,
        op: Operation,
        scheme: &Scheme,
        compute: F,
    ) -> Result<Arc<Tensor>>
    where
        F: FnOnce() -> Result<Tensor>,
    {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let key = (op, scheme.clone());
        if let Some(hit) = slots.get(&key) {
            return Ok(Arc::clone(hit));
        }
        debug!(?op, %scheme, "computing encoding");
        let value = Arc::new(compute()?);
        slots.insert(key, Arc::clone(&value));
        Ok(value)
    }

    pub fn get(&self, op: Operation, scheme: &Scheme) -> Option<Arc<Tensor>> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.get(&(op, scheme.clone())).map(Arc::clone)
    }

    pub fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::PrepError;

    #[test]
    fn computes_once_per_key() {
        let cache = EncodingCache::new();
        let calls = AtomicUsize::new(0);
        let scheme = Scheme::table("BLOSUM62");
        let compute = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Tensor::zeros(1, 1, 1))
        };
        let a = cache.get_or_try_insert_with(Operation::Universe, &scheme, compute).unwrap();
        let b = cache.get_or_try_insert_with(Operation::Universe, &scheme, compute).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        cache.get_or_try_insert_with(Operation::PerRequest, &scheme, compute).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn errors_are_not_cached() {
        let cache = EncodingCache::new();
        let scheme = Scheme::table("x");
        let r = cache.get_or_try_insert_with(Operation::Universe, &scheme, || {
            Err(PrepError::config("boom"))
        });
        assert!(r.is_err());
        assert!(cache.is_empty());
        assert!(cache.get(Operation::Universe, &scheme).is_none());
    }

    #[test]
    fn concurrent_first_requests_share_one_value() {
        let cache = Arc::new(EncodingCache::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let calls = Arc::clone(&calls);
                std::thread::spawn(move || {
                    cache
                        .get_or_try_insert_with(Operation::Universe, &Scheme::Raw, || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            Ok(Tensor::zeros(2, 2, 2))
                        })
                        .unwrap()
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(results.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }
}
