//! # IDs
//! Every document object (cel, frame, placement, timing entry) gets a `PegId<T>`
//! at construction: an ID unique for the life of the process, namespaced by the
//! type `T`. Libraries hand these out and weak links store them, so a stale link
//! can be detected by lookup instead of dereferencing freed state.
//!
//! IDs are never recycled and never serialized. Persistent formats refer to
//! cels and frames by name.

// Next available ID per namespace. RWLock'd so the common path (namespace
// already present) is a shared read plus an atomic increment.
static ID_SERVER: parking_lot::RwLock<
    std::collections::BTreeMap<std::any::TypeId, std::sync::atomic::AtomicU64>,
> = parking_lot::const_rwlock(std::collections::BTreeMap::new());

/// ID guaranteed unique within this execution of the program.
/// IDs with different namespace types may share a numeric value and are
/// distinct types as far as the compiler is concerned.
pub struct PegId<T: std::any::Any> {
    id: std::num::NonZeroU64,
    // Namespace marker
    _phantom: std::marker::PhantomData<T>,
}
impl<T: std::any::Any> Clone for PegId<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T: std::any::Any> Copy for PegId<T> {}
impl<T: std::any::Any> std::cmp::PartialEq<PegId<T>> for PegId<T> {
    fn eq(&self, other: &PegId<T>) -> bool {
        // Namespaces agree at compile time, only the value matters here.
        self.id == other.id
    }
}
impl<T: std::any::Any> std::cmp::Eq for PegId<T> {}

// Safety - the ID is a bare u64. A !Send or !Sync T would otherwise infect
// the ID through the phantom, even though no T is stored.
unsafe impl<T: std::any::Any> Send for PegId<T> {}
unsafe impl<T: std::any::Any> Sync for PegId<T> {}

impl<T: std::any::Any> std::hash::Hash for PegId<T> {
    /// Hashes include the `TypeId`, whose representation is unstable between
    /// compilations. Do NOT compare hashes across executions of the program.
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::any::TypeId::of::<T>().hash(state);
        self.id.hash(state);
    }
}

impl<T: std::any::Any> PegId<T> {
    /// Get the raw numeric value of this ID.
    /// IDs from differing namespaces may share the same numeric ID!
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id.get()
    }
    /// Mint the next free ID in this namespace.
    ///
    /// Exhausting all `u64::MAX - 1` IDs terminates the program uncleanly;
    /// at one ID per document object that is not a reachable state.
    #[must_use]
    pub fn next() -> Self {
        // ID of zero is invalid, counters start at one and go up.
        let id = {
            let read = ID_SERVER.upgradable_read();
            let ty = std::any::TypeId::of::<T>();
            if let Some(atomic) = read.get(&ty) {
                atomic.fetch_add(1, std::sync::atomic::Ordering::Relaxed)
            } else {
                // First mint for this namespace - take exclusive access once.
                let mut write = parking_lot::RwLockUpgradableReadGuard::upgrade(read);
                write.insert(ty, 2.into());
                1
            }
        };

        let Some(id) = std::num::NonZeroU64::new(id) else {
            // Counter wrapped. Global state is unfixably spent, no thread may
            // continue minting.
            #[cfg(not(test))]
            {
                log::error!("{} ID overflow! Aborting!", std::any::type_name::<T>());
                log::logger().flush();
                std::process::abort();
            }
            #[cfg(test)]
            {
                panic!("{} ID overflow! Aborting!", std::any::type_name::<T>())
            }
        };
        Self {
            id,
            _phantom: std::marker::PhantomData,
        }
    }
}
impl<T: std::any::Any> std::fmt::Display for PegId<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The rsplit always yields at least one element, even for empty strings.
        write!(
            f,
            "{}#{}",
            std::any::type_name::<T>().rsplit("::").next().unwrap(),
            self.id
        )
    }
}

impl<T: std::any::Any> std::fmt::Debug for PegId<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <PegId<T> as std::fmt::Display>::fmt(self, f)
    }
}
