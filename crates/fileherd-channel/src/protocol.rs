//! Wire protocol spoken with the privileged executor.
//!
//! Requests are tagged by their `fileop` field. Multi-item requests carry
//! their paths as a single `|`-joined string, which is safe because `|` can
//! never appear in a path on the executor's host.

use std::path::PathBuf;

use fileherd_core::{BatchResult, ItemOutcome, OperationId};
use serde::{Deserialize, Serialize};

use crate::error::ChannelError;

/// Arguments shared by copy and move requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferArgs {
    #[serde(rename = "operationID")]
    pub operation_id: OperationId,
    #[serde(rename = "filepath", with = "pipe_list")]
    pub sources: Vec<String>,
    #[serde(rename = "destpath", with = "pipe_list")]
    pub destinations: Vec<String>,
    pub overwrite: bool,
}

/// Arguments of a delete request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteArgs {
    #[serde(rename = "operationID")]
    pub operation_id: OperationId,
    #[serde(rename = "filepath", with = "pipe_list")]
    pub sources: Vec<String>,
    pub permanently: bool,
}

/// Arguments of a rename request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameArgs {
    #[serde(rename = "operationID")]
    pub operation_id: OperationId,
    #[serde(rename = "filepath")]
    pub source: String,
    #[serde(rename = "newName")]
    pub new_name: String,
    pub overwrite: bool,
}

/// Arguments of a link creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkArgs {
    /// Where the link file is saved.
    #[serde(rename = "filepath")]
    pub link_path: String,
    /// What the link points at.
    #[serde(rename = "targetpath")]
    pub target_path: String,
    #[serde(default)]
    pub arguments: String,
    #[serde(rename = "workingdir", default)]
    pub working_dir: String,
    #[serde(rename = "runasadmin", default)]
    pub run_as_admin: bool,
}

/// A message sent to the privileged executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "fileop")]
pub enum Request {
    CopyItem(TransferArgs),
    MoveItem(TransferArgs),
    DeleteItem(DeleteArgs),
    RenameItem(RenameArgs),
    CreateLink(LinkArgs),
    CancelOperation {
        #[serde(rename = "operationID")]
        operation_id: OperationId,
    },
}

impl Request {
    /// Create a link request with no arguments or working directory.
    pub fn create_link(link_path: impl Into<String>, target_path: impl Into<String>) -> Self {
        Self::CreateLink(LinkArgs {
            link_path: link_path.into(),
            target_path: target_path.into(),
            arguments: String::new(),
            working_dir: String::new(),
            run_as_admin: false,
        })
    }

    /// Operation the request belongs to, if it is tracked by one.
    pub fn operation_id(&self) -> Option<OperationId> {
        match self {
            Self::CopyItem(args) | Self::MoveItem(args) => Some(args.operation_id),
            Self::DeleteItem(args) => Some(args.operation_id),
            Self::RenameItem(args) => Some(args.operation_id),
            Self::CancelOperation { operation_id } => Some(*operation_id),
            Self::CreateLink(_) => None,
        }
    }

    /// The `fileop` discriminator of this request.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CopyItem(_) => "CopyItem",
            Self::MoveItem(_) => "MoveItem",
            Self::DeleteItem(_) => "DeleteItem",
            Self::RenameItem(_) => "RenameItem",
            Self::CreateLink(_) => "CreateLink",
            Self::CancelOperation { .. } => "CancelOperation",
        }
    }
}

/// The executor's reply to a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Whether the executor completed the operation as a whole.
    #[serde(rename = "Success", default)]
    pub success: bool,
    /// JSON-encoded [`WireBatch`], absent for requests without item results.
    #[serde(rename = "Result", default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

impl Response {
    /// A reply without item results.
    pub fn status(success: bool) -> Self {
        Self {
            success,
            result: None,
        }
    }

    /// Encode a batch result the way the executor reports it.
    pub fn from_batch(batch: &BatchResult) -> Result<Self, ChannelError> {
        let wire = WireBatch {
            items: batch.items.iter().map(WireItem::from).collect(),
        };
        Ok(Self {
            success: batch.success,
            result: Some(serde_json::to_string(&wire)?),
        })
    }

    /// Decode the per-item results.
    ///
    /// A reply without a result payload decodes to an empty item list.
    pub fn into_batch(self) -> Result<BatchResult, ChannelError> {
        let items = match self.result.as_deref() {
            None => Vec::new(),
            Some(payload) => {
                let wire: WireBatch =
                    serde_json::from_str(payload).map_err(|e| ChannelError::Malformed {
                        message: format!("invalid result payload: {e}"),
                    })?;
                wire.items.into_iter().map(ItemOutcome::from).collect()
            }
        };
        Ok(BatchResult::new(self.success, items))
    }
}

/// Per-item results as the executor serializes them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireBatch {
    #[serde(rename = "Items", default)]
    pub items: Vec<WireItem>,
}

/// One item result as the executor serializes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireItem {
    #[serde(rename = "Succeeded")]
    pub succeeded: bool,
    #[serde(rename = "Source", default)]
    pub source: String,
    #[serde(rename = "Destination", default)]
    pub destination: Option<String>,
    #[serde(rename = "HResult", default)]
    pub hresult: Option<i32>,
}

impl From<WireItem> for ItemOutcome {
    fn from(item: WireItem) -> Self {
        Self {
            source: PathBuf::from(item.source),
            destination: item
                .destination
                .filter(|d| !d.is_empty())
                .map(PathBuf::from),
            succeeded: item.succeeded,
            native_error_code: item.hresult,
        }
    }
}

impl From<&ItemOutcome> for WireItem {
    fn from(outcome: &ItemOutcome) -> Self {
        Self {
            succeeded: outcome.succeeded,
            source: outcome.source.to_string_lossy().into_owned(),
            destination: outcome
                .destination
                .as_ref()
                .map(|d| d.to_string_lossy().into_owned()),
            hresult: outcome.native_error_code,
        }
    }
}

/// Progress pushed by the executor while an operation runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    #[serde(rename = "OperationID")]
    pub operation_id: OperationId,
    /// Percentage, nominally 0-100.
    #[serde(rename = "Progress")]
    pub progress: f32,
}

impl ProgressEvent {
    pub fn new(operation_id: OperationId, progress: f32) -> Self {
        Self {
            operation_id,
            progress,
        }
    }
}

/// Serialize a list of paths as one `|`-joined string.
mod pipe_list {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(items: &[String], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&items.join("|"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        let joined = String::deserialize(deserializer)?;
        if joined.is_empty() {
            return Ok(Vec::new());
        }
        Ok(joined.split('|').map(String::from).collect())
    }
}
