//! Opaque handles and the cross-boundary handle table.
//!
//! A [`Handle`] refers to a native-owned object. The binding layer never
//! dereferences it; it only passes it back into native calls or uses it to
//! look up a cached language-side wrapper identity. Generations detect
//! use-after-destroy: when a slot is reclaimed its generation is bumped, so
//! handles minted before the invalidation stop resolving.
//!
//! Ownership discipline: native code owns every object. The table reports
//! liveness and caches wrapper identities; it never frees anything. The
//! native core must call [`HandleTable::invalidate`] from its destruction
//! callback - the table cannot observe native frees on its own.

use std::fmt;
use std::sync::Mutex;

use rustc_hash::FxHashMap;

use crate::error::HandleError;

/// Identity of a native-owned object, as reported by the native core.
///
/// Typically the object's address; the layer treats it as an opaque key and
/// never dereferences it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct NativeId(pub u64);

/// Cached identity of a language-side wrapper object.
///
/// Wrappers hold a non-owning back-reference (the [`Handle`]); this id lets
/// repeated crossings of the same native object reuse one wrapper instead
/// of minting a new one per call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct WrapperId(pub u64);

/// Opaque reference to a native-owned object.
///
/// An index+generation pair into the process handle table. Copyable,
/// hashable, and safe to pass across the boundary without implying
/// ownership transfer.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    /// Sentinel for "no object". Never resolves.
    pub const NULL: Handle = Handle {
        index: u32::MAX,
        generation: u32::MAX,
    };

    /// Build a handle from raw parts.
    pub const fn new(index: u32, generation: u32) -> Self {
        Handle { index, generation }
    }

    /// Slot index component.
    pub fn index(self) -> u32 {
        self.index
    }

    /// Generation component.
    pub fn generation(self) -> u32 {
        self.generation
    }

    /// Check against the null sentinel.
    pub fn is_null(self) -> bool {
        self == Handle::NULL
    }
}

impl Default for Handle {
    fn default() -> Self {
        Handle::NULL
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Handle(null)")
        } else {
            write!(f, "Handle({}v{})", self.index, self.generation)
        }
    }
}

struct Slot {
    generation: u32,
    native: NativeId,
    wrapper: Option<WrapperId>,
    alive: bool,
}

#[derive(Default)]
struct TableInner {
    slots: Vec<Slot>,
    free: Vec<u32>,
    by_native: FxHashMap<NativeId, u32>,
}

/// Maps native object identities to handles, liveness, and cached wrapper
/// identities.
///
/// Binds and invalidations can race with resolves from other threads, so
/// the table is internally synchronized; a single mutex-guarded
/// insert-if-absent makes concurrent binds of the same identity
/// linearizable (exactly one entry survives).
pub struct HandleTable {
    inner: Mutex<TableInner>,
}

impl HandleTable {
    /// Create an empty table.
    pub fn new() -> Self {
        HandleTable {
            inner: Mutex::new(TableInner::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TableInner> {
        // A poisoned table means a panic mid-update; state cannot be
        // trusted, so propagate the abort.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("handle table poisoned"),
        }
    }

    /// Bind a native identity to a handle, creating the entry lazily on the
    /// first crossing.
    ///
    /// Idempotent: repeated binds of the same live identity return the same
    /// handle and allocate no second entry.
    pub fn bind(&self, native: NativeId) -> Handle {
        let mut inner = self.lock();
        if let Some(&index) = inner.by_native.get(&native) {
            let slot = &inner.slots[index as usize];
            return Handle::new(index, slot.generation);
        }
        let index = if let Some(index) = inner.free.pop() {
            let slot = &mut inner.slots[index as usize];
            slot.native = native;
            slot.wrapper = None;
            slot.alive = true;
            index
        } else {
            let index = inner.slots.len() as u32;
            inner.slots.push(Slot {
                generation: 0,
                native,
                wrapper: None,
                alive: true,
            });
            index
        };
        inner.by_native.insert(native, index);
        let generation = inner.slots[index as usize].generation;
        Handle::new(index, generation)
    }

    /// Look up the cached wrapper identity for a handle.
    ///
    /// Returns `None` if no wrapper has crossed yet. Fails with a stale
    /// handle error once the native object has been destroyed; stale data
    /// is never returned.
    pub fn resolve_wrapper(&self, handle: Handle) -> Result<Option<WrapperId>, HandleError> {
        let inner = self.lock();
        let slot = Self::live_slot(&inner, handle)?;
        Ok(slot.wrapper)
    }

    /// Cache the wrapper identity for a live handle.
    pub fn set_wrapper(&self, handle: Handle, wrapper: WrapperId) -> Result<(), HandleError> {
        let mut inner = self.lock();
        let index = Self::live_index(&inner, handle)?;
        inner.slots[index].wrapper = Some(wrapper);
        Ok(())
    }

    /// Native identity behind a live handle.
    pub fn native_of(&self, handle: Handle) -> Result<NativeId, HandleError> {
        let inner = self.lock();
        let slot = Self::live_slot(&inner, handle)?;
        Ok(slot.native)
    }

    /// Check liveness without failing.
    pub fn is_live(&self, handle: Handle) -> bool {
        let inner = self.lock();
        Self::live_slot(&inner, handle).is_ok()
    }

    /// Invalidate a handle after the native object is destroyed.
    ///
    /// Called from the native core's destruction notification. The slot is
    /// reclaimed for reuse with a bumped generation, so every outstanding
    /// copy of the handle turns stale at once. Invalidating an
    /// already-stale handle is a no-op error, not a panic: destruction
    /// notifications may arrive late.
    pub fn invalidate(&self, handle: Handle) -> Result<(), HandleError> {
        let mut inner = self.lock();
        let index = Self::live_index(&inner, handle)?;
        let native = inner.slots[index].native;
        inner.by_native.remove(&native);
        let slot = &mut inner.slots[index];
        slot.alive = false;
        slot.wrapper = None;
        slot.generation = slot.generation.wrapping_add(1);
        inner.free.push(index as u32);
        log::trace!("handle {:?} invalidated", handle);
        Ok(())
    }

    /// Number of live entries.
    pub fn live_count(&self) -> usize {
        let inner = self.lock();
        inner.slots.iter().filter(|s| s.alive).count()
    }

    fn live_slot<'a>(inner: &'a TableInner, handle: Handle) -> Result<&'a Slot, HandleError> {
        inner
            .slots
            .get(handle.index as usize)
            .filter(|slot| slot.alive && slot.generation == handle.generation)
            .ok_or(HandleError::Stale(handle))
    }

    fn live_index(inner: &TableInner, handle: Handle) -> Result<usize, HandleError> {
        Self::live_slot(inner, handle)?;
        Ok(handle.index as usize)
    }
}

impl Default for HandleTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HandleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("HandleTable")
            .field("slot_count", &inner.slots.len())
            .field("free_count", &inner.free.len())
            .finish()
    }
}
