use std::sync::{
    Arc, Mutex, PoisonError, RwLock,
    atomic::{AtomicBool, Ordering},
};

use crate::dataset::CityRow;

use super::index::PlaceIndex;

/// Lifecycle of a [`PlaceIndexCell`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    Unbuilt,
    Building,
    Ready,
}

/// Shared slot holding the current [`PlaceIndex`].
///
/// The first caller of [`get_or_build`](Self::get_or_build) builds the index
/// while concurrent callers wait on the build lock and then read the same
/// value. Readers only clone an `Arc`; the index itself is never mutated.
#[derive(Debug, Default)]
pub struct PlaceIndexCell {
    current: RwLock<Option<Arc<PlaceIndex>>>,
    build_lock: Mutex<()>,
    building: AtomicBool,
}

impl PlaceIndexCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cell that starts out `Ready`.
    pub fn ready(index: PlaceIndex) -> Self {
        Self {
            current: RwLock::new(Some(Arc::new(index))),
            ..Self::default()
        }
    }

    pub fn state(&self) -> IndexState {
        if self.building.load(Ordering::Acquire) {
            IndexState::Building
        } else if self.get().is_some() {
            IndexState::Ready
        } else {
            IndexState::Unbuilt
        }
    }

    /// Current index, if one has been built.
    pub fn get(&self) -> Option<Arc<PlaceIndex>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Return the index, building it with `load` on first use.
    pub fn get_or_build<F>(&self, load: F) -> Arc<PlaceIndex>
    where
        F: FnOnce() -> PlaceIndex,
    {
        if let Some(index) = self.get() {
            return index;
        }

        let _guard = self.build_lock.lock().unwrap_or_else(PoisonError::into_inner);

        // Someone else may have finished while we waited for the lock.
        if let Some(index) = self.get() {
            return index;
        }

        self.install(load)
    }

    /// Replace the current index with one built from `rows`.
    pub fn rebuild<I>(&self, rows: I) -> Arc<PlaceIndex>
    where
        I: IntoIterator<Item = CityRow>,
    {
        let _guard = self.build_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.install(|| PlaceIndex::from_rows(rows))
    }

    /// Caller must hold `build_lock`.
    fn install<F>(&self, load: F) -> Arc<PlaceIndex>
    where
        F: FnOnce() -> PlaceIndex,
    {
        let _building = BuildingFlag::raise(&self.building);
        let index = Arc::new(load());
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&index));
        index
    }
}

/// Holds `building` high until dropped, including when the loader panics.
struct BuildingFlag<'a>(&'a AtomicBool);

impl<'a> BuildingFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for BuildingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
