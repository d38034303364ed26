/// Buffer trait and buffer descriptor

use crate::error::Result;

/// Buffer usage flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// Vertex buffer
    Vertex,
    /// Index buffer
    Index,
    /// Per-frame constant buffer (host visible)
    Constant,
}

/// Descriptor for creating a buffer
#[derive(Debug, Clone)]
pub struct BufferDesc {
    /// Debug name
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Buffer usage
    pub usage: BufferUsage,
}

/// Index element type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    U16,
    U32,
}

/// GPU buffer
pub trait Buffer: Send + Sync {
    /// Debug name given at creation
    fn name(&self) -> &str;

    /// Size in bytes
    fn size(&self) -> u64;

    /// Write `data` at `offset`. Fails if the range exceeds the buffer.
    fn update(&self, offset: u64, data: &[u8]) -> Result<()>;
}
