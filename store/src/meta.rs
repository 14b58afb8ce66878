//! Metadata storage trait.

use crate::StoreError;

/// Current on-disk schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Key under which the schema version is kept.
pub const SCHEMA_VERSION_KEY: &str = "schema_version";

/// Generic key-value store for process-wide settings (parameters, owner,
/// collected fees) that don't belong in a per-player table.
pub trait MetaStore {
    /// Retrieve a metadata value.
    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Get the database schema version, if one was ever written.
    fn get_schema_version(&self) -> Result<Option<u32>, StoreError> {
        match self.get_meta(SCHEMA_VERSION_KEY)? {
            Some(bytes) => {
                let arr: [u8; 4] = bytes.as_slice().try_into().map_err(|_| {
                    StoreError::Corruption(format!("schema version has {} bytes", bytes.len()))
                })?;
                Ok(Some(u32::from_be_bytes(arr)))
            }
            None => Ok(None),
        }
    }
}
