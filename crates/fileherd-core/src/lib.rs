//! Core types for fileherd.
//!
//! This crate provides the data model shared by the privileged channel and
//! the orchestrator: item references, operation requests, per-item outcomes,
//! history records, status codes and configuration.

mod config;
mod error;
mod history;
mod id;
mod item;
mod names;
mod outcome;
mod request;
mod status;

pub use config::{OrchestratorConfig, OrchestratorConfigBuilder};
pub use error::ModelError;
pub use history::{HistoryKind, HistoryRecord};
pub use id::OperationId;
pub use item::{file_name_of, path_key, paths_equal, split_file_name, ItemKind, ItemRef};
pub use names::{is_valid_filename, validate_filename, MAX_NAME_LEN};
pub use outcome::{BatchResult, ItemOutcome};
pub use request::{CollisionPolicy, OperationItem, OperationKind, OperationRequest};
pub use status::{native, StatusCode};
