//! Shared sample buffers
//!
//! A [`SampleBuffer`] is a reference-counted handle to image bytes. Cloning
//! a handle adds a reference; dropping one removes it. When the last handle
//! goes away the buffer's [`Release`] strategy runs, exactly once.

use std::fmt;
use std::sync::Arc;

/// Cleanup hook for buffers whose storage belongs to the caller
pub type CleanupFn = Box<dyn FnOnce(Vec<u8>) + Send + Sync>;

/// What happens to the bytes when the last reference is released
pub enum Release {
    /// Storage was allocated on the heap and is simply dropped
    Heap,
    /// Storage is `'static` and owned elsewhere; nothing to do
    External,
    /// Storage is handed back to the caller
    Custom(CleanupFn),
}

impl fmt::Debug for Release {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Heap => "Heap",
            Self::External => "External",
            Self::Custom(_) => "Custom",
        })
    }
}

enum Storage {
    Heap(Vec<u8>),
    Static(&'static [u8]),
}

struct Inner {
    storage: Storage,
    release: Release,
}

impl Drop for Inner {
    fn drop(&mut self) {
        // custom hooks are only ever paired with heap storage
        if let (Release::Custom(cleanup), Storage::Heap(bytes)) = (
            std::mem::replace(&mut self.release, Release::Heap),
            &mut self.storage,
        ) {
            tracing::trace!(len = bytes.len(), "handing sample buffer to cleanup hook");
            cleanup(std::mem::take(bytes));
        }
    }
}

/// Reference-counted image sample bytes
///
/// The count is atomic, so handles can be moved across threads; the bytes
/// themselves are never mutated after construction.
#[derive(Clone)]
pub struct SampleBuffer {
    inner: Arc<Inner>,
}

impl SampleBuffer {
    /// Adopt heap bytes; they are dropped after the last release
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self::with_release(Storage::Heap(data), Release::Heap)
    }

    /// Wrap bytes the engine did not allocate and must never free
    pub fn from_static(data: &'static [u8]) -> Self {
        Self::with_release(Storage::Static(data), Release::External)
    }

    /// Adopt heap bytes and hand them to `cleanup` after the last release
    pub fn with_cleanup<F>(data: Vec<u8>, cleanup: F) -> Self
    where
        F: FnOnce(Vec<u8>) + Send + Sync + 'static,
    {
        Self::with_release(Storage::Heap(data), Release::Custom(Box::new(cleanup)))
    }

    fn with_release(storage: Storage, release: Release) -> Self {
        Self {
            inner: Arc::new(Inner { storage, release }),
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        match &self.inner.storage {
            Storage::Heap(bytes) => bytes,
            Storage::Static(bytes) => bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    /// Strategy that runs when the last handle is dropped
    pub fn release(&self) -> &Release {
        &self.inner.release
    }

    /// Number of live handles sharing these bytes
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Whether two handles refer to the same bytes
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl AsRef<[u8]> for SampleBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl fmt::Debug for SampleBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SampleBuffer")
            .field("len", &self.len())
            .field("refs", &self.ref_count())
            .field("release", &self.inner.release)
            .finish()
    }
}
