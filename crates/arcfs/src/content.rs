// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use std::pin::Pin;
use std::sync::Arc;
use tokio::io::AsyncRead;

use crate::reader::ReaderError;

/// Byte stream over one entry's decoded content.
///
/// Owns whatever host resources it needs; dropping it releases them.
pub type EntryReader = Pin<Box<dyn AsyncRead + Send>>;

/// Opens one entry's bytes. Supplied by an archive reader per regular file.
#[async_trait]
pub trait ContentAccessor: Send + Sync {
    /// Every call yields a fresh, independent reader
    async fn open(&self) -> Result<EntryReader, ReaderError>;
}

/// A handle for a refcounted content accessor.
#[derive(Clone)]
pub struct Handle(Arc<dyn ContentAccessor>);

impl Handle {
    pub fn new(accessor: Arc<dyn ContentAccessor>) -> Self {
        Self(accessor)
    }

    pub async fn open(&self) -> Result<EntryReader, ReaderError> {
        self.0.open().await
    }
}

impl std::fmt::Debug for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(content)")
    }
}

/// Content held in memory
pub struct MemoryContent {
    content: Arc<[u8]>,
}

impl MemoryContent {
    pub fn new_handle<T: AsRef<[u8]>>(content: T) -> Handle {
        Handle::new(Arc::new(MemoryContent {
            content: Arc::from(content.as_ref()),
        }))
    }
}

#[async_trait]
impl ContentAccessor for MemoryContent {
    async fn open(&self) -> Result<EntryReader, ReaderError> {
        Ok(Box::pin(std::io::Cursor::new(self.content.to_vec())))
    }
}
