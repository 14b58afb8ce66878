//! LMDB storage backend for the stakevault economy core.
//!
//! Implements all storage traits from `stakevault-store` using the `heed`
//! LMDB bindings. Each logical table maps to one LMDB database (two for
//! usernames) within a single environment. Values are bincode-encoded.

pub mod codec;
pub mod environment;
pub mod error;
pub mod meta;
pub mod referral;
pub mod stake;
pub mod username;
pub mod vault;
pub mod write_batch;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
