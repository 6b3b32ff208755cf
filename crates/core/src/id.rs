//! Unique identifiers for engine entities.
//!
//! Strongly-typed UUID identifiers built on [`domain-key`](https://crates.io/crates/domain-key)
//! `Uuid<D>` wrappers. Each identifier type is parameterized by a unique domain
//! marker, so mixing e.g. a `WorkflowId` where a `NodeId` is expected is a
//! compile error rather than a runtime one.
//!
//! All ID types are `Copy` (16 bytes, stack-allocated) and support:
//! - `v4()` for random UUID generation
//! - `nil()` for zero-valued default
//! - `parse(&str)` for string parsing
//! - Full serde support (serializes as a UUID string)
//! - `Display`, `FromStr`, `Eq`, `Ord`, `Hash`

use domain_key::define_uuid;

// Re-export for downstream parse error handling
pub use domain_key::UuidParseError;

define_uuid!(WorkspaceIdDomain => WorkspaceId);
define_uuid!(WorkflowIdDomain => WorkflowId);
define_uuid!(NodeIdDomain => NodeId);
define_uuid!(ExecutionIdDomain => ExecutionId);
define_uuid!(CredentialIdDomain => CredentialId);
define_uuid!(ResourceIdDomain => ResourceId);
define_uuid!(UserIdDomain => UserId);
