//! # Descriptor Store
//!
//! Thin layers over the [`Backend`](noisefs_domain::ports::Backend) port
//! that (de)serialize a [`Descriptor`] to/from a single stored block: a
//! plain variant, and a password-encrypted variant that auto-detects
//! format on load.

pub mod encrypted;
pub mod plain;

pub use encrypted::EncryptedDescriptorStore;
pub use plain::PlainDescriptorStore;

use async_trait::async_trait;
use noisefs_domain::value_objects::Descriptor;
use noisefs_domain::NoiseFsError;

/// Common surface both descriptor store variants implement.
#[async_trait]
pub trait DescriptorStore: Send + Sync {
    /// Serializes and stores `descriptor`, returning its CID.
    async fn save(&self, descriptor: &Descriptor) -> Result<String, NoiseFsError>;

    /// Retrieves, decrypts (if needed), and validates the descriptor at `cid`.
    async fn load(&self, cid: &str) -> Result<Descriptor, NoiseFsError>;

    /// Stores `descriptor` unencrypted regardless of any configured password.
    async fn save_unencrypted(&self, descriptor: &Descriptor) -> Result<String, NoiseFsError>;

    /// Whether the bytes at `cid` are an encrypted envelope. Does not
    /// invoke the password provider.
    async fn is_encrypted(&self, cid: &str) -> Result<bool, NoiseFsError>;
}
