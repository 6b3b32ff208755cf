//! Credential retrieval port (spec §6).

use async_trait::async_trait;
use engine_core::CredentialId;

use crate::error::PortsError;

/// Retrieves a decrypted credential of type `T`.
///
/// Parameterized so that each integration can demand its own decrypted
/// shape (an OAuth token pair, an API key, a basic-auth pair, ...) without
/// the port layer knowing about any of them.
#[async_trait]
pub trait CredentialGetter<T>: Send + Sync {
    /// Fetch and decrypt the credential identified by `id`.
    async fn get_decrypted_credential(&self, id: CredentialId) -> Result<T, PortsError>;
}
