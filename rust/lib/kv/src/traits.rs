use crate::error::KVError;

/// KVStore provides a key-value storage interface for singleton records.
///
/// Keys follow a namespaced convention: `production:serial`,
/// `production:shifts`, etc. Every `set` is durable when it returns `Ok`.
pub trait KVStore: Send + Sync {
    /// Get the value for a key. Returns None if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError>;

    /// Set a key-value pair.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError>;

    /// Delete a key. Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), KVError>;
}
