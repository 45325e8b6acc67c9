//! Per-item results reported by an execution channel.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::status::{native, StatusCode};

/// What happened to one item of a dispatched batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemOutcome {
    /// Path the executor operated on.
    pub source: PathBuf,
    /// Where the item ended up. Equal to `source` for an in-place overwrite.
    pub destination: Option<PathBuf>,
    /// Whether the item succeeded.
    pub succeeded: bool,
    /// Executor result code, if it reported one.
    pub native_error_code: Option<i32>,
}

impl ItemOutcome {
    /// Create a successful outcome.
    pub fn succeeded(source: impl Into<PathBuf>, destination: Option<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination,
            succeeded: true,
            native_error_code: Some(native::S_OK),
        }
    }

    /// Create a failed outcome.
    pub fn failed(source: impl Into<PathBuf>, native_error_code: Option<i32>) -> Self {
        Self {
            source: source.into(),
            destination: None,
            succeeded: false,
            native_error_code,
        }
    }

    /// Whether the item succeeded and now lives somewhere other than its source.
    ///
    /// Only relocations can be undone; an overwrite in place cannot.
    pub fn is_relocation(&self) -> bool {
        self.succeeded
            && self
                .destination
                .as_deref()
                .is_some_and(|dest| dest != self.source.as_path())
    }

    /// Whether the item failed for a reason that retrying cannot fix.
    pub fn is_terminal_failure(&self) -> bool {
        !self.succeeded && self.native_error_code.is_some_and(native::is_terminal)
    }

    /// Caller-facing status of this outcome.
    pub fn status(&self) -> StatusCode {
        if self.succeeded {
            StatusCode::Success
        } else {
            StatusCode::from_native(self.native_error_code)
        }
    }
}

/// Outcomes of one dispatched sub-batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    /// Whether the communication layer completed the round trip.
    pub success: bool,
    /// Outcomes in executor order.
    pub items: Vec<ItemOutcome>,
}

impl BatchResult {
    /// Create a result from a completed round trip.
    pub fn new(success: bool, items: Vec<ItemOutcome>) -> Self {
        Self { success, items }
    }

    /// A round trip that never completed.
    pub fn channel_failure() -> Self {
        Self {
            success: false,
            items: Vec::new(),
        }
    }

    /// Whether the round trip and every item succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.success && self.items.iter().all(|item| item.succeeded)
    }
}
