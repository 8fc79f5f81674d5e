//! Thread builder for configuring thread creation.

use super::{adopt, register, unregister, Thread, ThreadId};
use crate::error::{Error, Result};

/// Builder for configuring and creating new threads.
///
/// The new thread is registered with the core before it starts, so its id
/// can receive thread flags immediately.
#[derive(Debug, Default)]
pub struct ThreadBuilder {
    /// Thread name (for debugging)
    name: Option<String>,
    /// Stack size in bytes; the platform default when unset
    stack_size: Option<usize>,
}

impl ThreadBuilder {
    /// Create a new thread builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the thread name for debugging purposes.
    ///
    /// # Arguments
    ///
    /// * `name` - Thread name
    ///
    /// # Returns
    ///
    /// Self for method chaining.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the stack size in bytes.
    ///
    /// # Arguments
    ///
    /// * `size` - Minimum stack size in bytes
    ///
    /// # Returns
    ///
    /// Self for method chaining.
    pub fn stack_size(mut self, size: usize) -> Self {
        self.stack_size = Some(size);
        self
    }

    /// Spawn a new thread with the configured parameters.
    ///
    /// # Arguments
    ///
    /// * `body` - Function to run in the new thread
    ///
    /// # Returns
    ///
    /// A [`JoinHandle`] for the new thread, or [`Error::OutOfMemory`] if the
    /// platform could not create it.
    pub fn spawn<F, T>(self, body: F) -> Result<JoinHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let inner = register(self.name.clone());
        let thread = Thread {
            inner: inner.clone(),
        };

        let mut os = std::thread::Builder::new();
        if let Some(name) = self.name {
            os = os.name(name);
        }
        if let Some(size) = self.stack_size {
            os = os.stack_size(size);
        }

        let spawned = os.spawn(move || {
            let id = inner.id;
            adopt(inner);
            log::debug!(target: "Thread", "thread {id} started");
            body()
        });

        match spawned {
            Ok(handle) => Ok(JoinHandle { thread, handle }),
            Err(err) => {
                log::error!(target: "Thread", "spawn of thread {} failed: {err}", thread.id());
                unregister(&thread.inner);
                Err(Error::OutOfMemory)
            }
        }
    }
}

/// Owned permission to join a thread started by [`ThreadBuilder`].
pub struct JoinHandle<T> {
    thread: Thread,
    handle: std::thread::JoinHandle<T>,
}

impl<T> JoinHandle<T> {
    pub fn id(&self) -> ThreadId {
        self.thread.id()
    }

    pub fn name(&self) -> Option<&str> {
        self.thread.name()
    }

    /// Handle to the thread, for signaling it while it runs.
    pub fn thread(&self) -> &Thread {
        &self.thread
    }

    /// Wait for the thread to finish and return what its body returned.
    ///
    /// Fails with the panic payload if the body panicked.
    pub fn join(self) -> std::thread::Result<T> {
        self.handle.join()
    }
}
