//! Ordered strategy list with a per-signature resolution cache.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, trace};

use super::Strategy;
use crate::error::DispatchError;

/// Scans an ordered strategy list for the first one supporting a
/// signature and caches the answer. The cache fills lazily under
/// concurrent request traffic: two first-time resolutions of the same
/// signature may both scan, last writer wins, and either answer is a
/// supporting strategy. Entries are never evicted; the key space is
/// bounded by the deployed handler signatures.
pub struct StrategyComposite<Sig, S: ?Sized> {
    label: &'static str,
    strategies: Vec<Arc<S>>,
    cache: DashMap<Sig, Arc<S>>,
}

impl<Sig, S> StrategyComposite<Sig, S>
where
    Sig: Eq + Hash + Clone + fmt::Debug,
    S: Strategy<Sig> + ?Sized,
{
    /// `label` names the composite in configuration errors
    /// ("argument resolver", "return value handler").
    pub fn new(label: &'static str, strategies: Vec<Arc<S>>) -> Self {
        debug!(label, count = strategies.len(), "strategy composite created");
        Self {
            label,
            strategies,
            cache: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// First capable strategy in registration order. A signature no
    /// strategy supports is a configuration error, not a request error.
    pub fn resolve(&self, signature: &Sig) -> Result<Arc<S>, DispatchError> {
        if let Some(hit) = self.cache.get(signature) {
            return Ok(Arc::clone(hit.value()));
        }

        for strategy in &self.strategies {
            trace!(label = self.label, ?signature, "testing strategy");
            if strategy.supports(signature) {
                self.cache.insert(signature.clone(), Arc::clone(strategy));
                return Ok(Arc::clone(strategy));
            }
        }

        Err(DispatchError::Configuration(format!(
            "no {} registered for signature {:?}",
            self.label, signature
        )))
    }

    /// Pre-resolves a batch of signatures so coverage gaps surface at
    /// registration time rather than on the first live request.
    pub fn verify_coverage<'a, I>(&self, signatures: I) -> Result<(), DispatchError>
    where
        I: IntoIterator<Item = &'a Sig>,
        Sig: 'a,
    {
        for signature in signatures {
            self.resolve(signature)?;
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn cached_count(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EvenSupporter;
    struct OddSupporter;

    impl Strategy<u32> for EvenSupporter {
        fn supports(&self, signature: &u32) -> bool {
            signature % 2 == 0
        }
    }

    impl Strategy<u32> for OddSupporter {
        fn supports(&self, signature: &u32) -> bool {
            signature % 2 == 1
        }
    }

    fn composite() -> StrategyComposite<u32, dyn Strategy<u32>> {
        StrategyComposite::new(
            "test strategy",
            vec![Arc::new(EvenSupporter), Arc::new(OddSupporter)],
        )
    }

    #[test]
    fn test_first_capable_wins_in_order() {
        let composite = composite();
        let even = composite.resolve(&4).unwrap();
        assert!(even.supports(&4));
    }

    #[test]
    fn test_second_resolution_is_cached_identity() {
        let composite = composite();
        let first = composite.resolve(&3).unwrap();
        let second = composite.resolve(&3).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(composite.cached_count(), 1);
    }

    #[test]
    fn test_unsupported_signature_is_configuration_error() {
        let lonely: StrategyComposite<u32, dyn Strategy<u32>> =
            StrategyComposite::new("test strategy", vec![Arc::new(EvenSupporter)]);
        let err = lonely.resolve(&3).err().unwrap();
        assert!(matches!(err, DispatchError::Configuration(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_verify_coverage() {
        let composite = composite();
        assert!(composite.verify_coverage([1u32, 2, 3].iter()).is_ok());

        let lonely: StrategyComposite<u32, dyn Strategy<u32>> =
            StrategyComposite::new("test strategy", vec![Arc::new(EvenSupporter)]);
        assert!(lonely.verify_coverage([2, 4].iter()).is_ok());
        assert!(lonely.verify_coverage([2, 5].iter()).is_err());
    }

    #[test]
    fn test_concurrent_first_fill_is_safe() {
        let composite = Arc::new(composite());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let composite = Arc::clone(&composite);
            handles.push(std::thread::spawn(move || {
                let strategy = composite.resolve(&10).unwrap();
                assert!(strategy.supports(&10));
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(composite.cached_count(), 1);
    }
}
