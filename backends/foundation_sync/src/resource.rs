//! Resources a [`crate::ReadersWriterGate`] can protect.

use crate::errors::ResourceResult;

/// A resource with a read and a write operation.
///
/// `read` takes `&self` so the gate can run several readers at once;
/// `write` takes `&mut self` because the gate only ever lets one writer in.
/// Failures are returned to the caller and never affect the gate state.
pub trait SharedResource {
    type Content;

    /// # Errors
    ///
    /// Returns a [`crate::ResourceError`] when the underlying resource fails.
    fn read(&self) -> ResourceResult<Self::Content>;

    /// # Errors
    ///
    /// Returns a [`crate::ResourceError`] when the underlying resource fails.
    fn write(&mut self, content: Self::Content) -> ResourceResult<()>;
}

/// An in-memory cell holding a single value.
///
/// Reads hand out clones, writes replace the whole value, so a reader never
/// observes a partially written value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryCell<T> {
    value: T,
}

impl<T> MemoryCell<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    #[must_use]
    pub fn get(&self) -> &T {
        &self.value
    }

    #[must_use]
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T: Clone> SharedResource for MemoryCell<T> {
    type Content = T;

    fn read(&self) -> ResourceResult<T> {
        Ok(self.value.clone())
    }

    fn write(&mut self, content: T) -> ResourceResult<()> {
        self.value = content;
        Ok(())
    }
}
