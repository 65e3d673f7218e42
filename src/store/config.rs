use serde::{Deserialize, Serialize};

use crate::chunked::DEFAULT_WINDOW_SIZE;
use crate::index::DEFAULT_TAIL_SIZE;

/// Configuration for opening a [`ScanStore`](super::ScanStore)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Bytes mapped per window by the chunked reader
    pub window_size: usize,

    /// Trailing bytes searched for the index-offset footer
    pub tail_size: usize,

    /// Skip the trailer index and always scan the file
    pub force_sequential: bool,

    /// Check that the trailer's first offset points at a record
    pub verify_trailer: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            tail_size: DEFAULT_TAIL_SIZE,
            force_sequential: false,
            verify_trailer: true,
        }
    }
}

impl StoreConfig {
    /// Set the mapped window size
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    /// Set the footer search size
    pub fn with_tail_size(mut self, tail_size: usize) -> Self {
        self.tail_size = tail_size;
        self
    }

    /// Always build the index by scanning the file
    pub fn sequential_only(mut self) -> Self {
        self.force_sequential = true;
        self
    }
}
