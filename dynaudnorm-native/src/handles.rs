use std::collections::HashMap;
use std::ffi::c_void;
use std::ptr::NonNull;

use parking_lot::Mutex;

/// Opaque engine instance pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct InstancePtr(NonNull<c_void>);

// SAFETY: engine instances are not bound to the thread that created them.
// Calls for one instance are serialized by the session that owns its handle.
unsafe impl Send for InstancePtr {}

impl InstancePtr {
    pub fn new(raw: *mut c_void) -> Option<Self> {
        NonNull::new(raw).map(Self)
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }
}

/// Maps integer handles to live engine instances.
///
/// Ids count up from 0 and are never handed out twice, so a stale handle can
/// never reach a newer instance.
pub(crate) struct HandleTable {
    inner: Mutex<TableInner>,
}

struct TableInner {
    next_id: i32,
    instances: HashMap<i32, InstancePtr>,
}

impl HandleTable {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(TableInner {
                next_id: 0,
                instances: HashMap::new(),
            }),
        }
    }

    /// Register `instance`. Returns `None` once the id space is used up.
    pub fn insert(&self, instance: InstancePtr) -> Option<i32> {
        let mut inner = self.inner.lock();
        let id = inner.next_id;
        if id == i32::MAX {
            return None;
        }
        inner.next_id += 1;
        inner.instances.insert(id, instance);
        Some(id)
    }

    pub fn get(&self, id: i32) -> Option<InstancePtr> {
        self.inner.lock().instances.get(&id).copied()
    }

    pub fn remove(&self, id: i32) -> Option<InstancePtr> {
        self.inner.lock().instances.remove(&id)
    }

    /// Remove and return every live instance.
    pub fn drain(&self) -> Vec<(i32, InstancePtr)> {
        self.inner.lock().instances.drain().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().instances.len()
    }

    #[cfg(test)]
    fn with_next_id(next_id: i32) -> Self {
        let table = Self::new();
        table.inner.lock().next_id = next_id;
        table
    }
}
