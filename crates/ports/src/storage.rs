//! Blob storage port for files passed between nodes (spec §6).

use async_trait::async_trait;
use engine_core::ExecutionId;
use serde::{Deserialize, Serialize};

use crate::error::PortsError;

/// Metadata for a file stored during an execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileItem {
    pub file_id: String,
    pub name: String,
    pub size: u64,
    pub content_type: String,
}

/// A readable handle to a previously-stored execution file.
pub struct FileReader {
    /// The file's full contents. Real drivers stream; the in-memory
    /// reference implementation just buffers.
    pub bytes: Vec<u8>,
    pub size: u64,
}

/// Stores and retrieves files that pass between nodes within one execution.
#[async_trait]
pub trait ExecutorStorageManager: Send + Sync {
    /// Store a file under the given execution, returning its metadata.
    async fn put_execution_file(
        &self,
        execution_id: ExecutionId,
        name: String,
        content_type: String,
        bytes: Vec<u8>,
    ) -> Result<FileItem, PortsError>;

    /// Retrieve a previously stored file by its upload id.
    async fn get_execution_file(&self, upload_id: &str) -> Result<FileReader, PortsError>;
}
