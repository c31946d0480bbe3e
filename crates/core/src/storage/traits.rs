use crate::errors::CoreError;

/// Durable string storage addressed by key (the browser's local storage, a
/// directory of files, an embedded app's preferences, ...).
///
/// Writes replace the whole value; there is no partial update.
pub trait KeyValueStore: Send + Sync {
    /// Human-readable name of this backend (for logs/errors).
    fn name(&self) -> &str;

    /// Read the value stored under `key`. `Ok(None)` when the key was never written.
    fn read(&self, key: &str) -> Result<Option<String>, CoreError>;

    /// Overwrite the value stored under `key`.
    fn write(&self, key: &str, value: &str) -> Result<(), CoreError>;
}

/// Lets several owners (e.g. a registry and a later reload) share one store.
impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn read(&self, key: &str) -> Result<Option<String>, CoreError> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), CoreError> {
        (**self).write(key, value)
    }
}
