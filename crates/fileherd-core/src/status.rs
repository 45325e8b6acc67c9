//! Status codes reported to callers and the executor's native result codes.

use serde::{Deserialize, Serialize};
use strum::Display;

/// Native result codes produced by the privileged executor's copy engine.
pub mod native {
    pub const S_OK: i32 = 0;
    pub const USER_CANCELLED: i32 = -2144927744;
    // Access denied
    pub const ACCESS_DENIED_SRC: i32 = -2144927711;
    pub const ACCESS_DENIED_DEST: i32 = -2144927710;
    pub const REQUIRES_ELEVATION: i32 = -2144927742;
    // Path too long
    pub const PATH_TOO_DEEP_SRC: i32 = -2144927715;
    pub const PATH_TOO_DEEP_DEST: i32 = -2144927714;
    pub const RECYCLE_PATH_TOO_LONG: i32 = -2144927688;
    pub const NEWFILE_NAME_TOO_LONG: i32 = -2144927685;
    pub const NEWFOLDER_NAME_TOO_LONG: i32 = -2144927684;
    // Not found
    pub const RECYCLE_BIN_NOT_FOUND: i32 = -2144927686;
    pub const PATH_NOT_FOUND_SRC: i32 = -2144927709;
    pub const PATH_NOT_FOUND_DEST: i32 = -2144927708;
    pub const NET_DISCONNECT_DEST: i32 = -2144927706;
    pub const NET_DISCONNECT_SRC: i32 = -2144927707;
    pub const CANT_REACH_SOURCE: i32 = -2144927691;
    // In use
    pub const SHARING_VIOLATION_SRC: i32 = -2144927705;
    pub const SHARING_VIOLATION_DEST: i32 = -2144927704;
    // Already exists
    pub const ALREADY_EXISTS_NORMAL: i32 = -2144927703;
    pub const ALREADY_EXISTS_READONLY: i32 = -2144927702;
    pub const ALREADY_EXISTS_SYSTEM: i32 = -2144927701;
    pub const ALREADY_EXISTS_FOLDER: i32 = -2144927700;
    // Wrong item type at destination
    pub const FILE_IS_FLD_DEST: i32 = -2144927732;
    pub const FLD_IS_FILE_DEST: i32 = -2144927733;

    /// Codes that end an item's processing for good: retrying cannot help.
    pub fn is_terminal(code: i32) -> bool {
        matches!(code, USER_CANCELLED | RECYCLE_BIN_NOT_FOUND)
    }
}

/// Structured status reported through a caller's error sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum StatusCode {
    Success,
    Generic,
    Unauthorized,
    #[strum(serialize = "Not found")]
    NotFound,
    #[strum(serialize = "In use")]
    InUse,
    #[strum(serialize = "Name too long")]
    NameTooLong,
    #[strum(serialize = "Already exists")]
    AlreadyExists,
    #[strum(serialize = "Not a folder")]
    NotAFolder,
    #[strum(serialize = "Not a file")]
    NotAFile,
    #[strum(serialize = "In progress")]
    InProgress,
    Cancelled,
    #[strum(serialize = "Invalid name")]
    InvalidName,
}

impl StatusCode {
    /// Convert a native executor result code.
    ///
    /// A missing code means the item failed without the executor saying why.
    pub fn from_native(code: Option<i32>) -> Self {
        use native::*;

        match code {
            Some(S_OK) => Self::Success,
            Some(USER_CANCELLED) => Self::Cancelled,
            Some(ACCESS_DENIED_SRC | ACCESS_DENIED_DEST | REQUIRES_ELEVATION) => Self::Unauthorized,
            Some(
                RECYCLE_PATH_TOO_LONG
                | NEWFILE_NAME_TOO_LONG
                | NEWFOLDER_NAME_TOO_LONG
                | PATH_TOO_DEEP_SRC
                | PATH_TOO_DEEP_DEST,
            ) => Self::NameTooLong,
            Some(
                PATH_NOT_FOUND_SRC
                | PATH_NOT_FOUND_DEST
                | NET_DISCONNECT_DEST
                | NET_DISCONNECT_SRC
                | CANT_REACH_SOURCE
                | RECYCLE_BIN_NOT_FOUND,
            ) => Self::NotFound,
            Some(
                ALREADY_EXISTS_NORMAL
                | ALREADY_EXISTS_READONLY
                | ALREADY_EXISTS_SYSTEM
                | ALREADY_EXISTS_FOLDER,
            ) => Self::AlreadyExists,
            Some(FILE_IS_FLD_DEST) => Self::NotAFile,
            Some(FLD_IS_FILE_DEST) => Self::NotAFolder,
            Some(SHARING_VIOLATION_SRC | SHARING_VIOLATION_DEST) => Self::InUse,
            _ => Self::Generic,
        }
    }

    /// Check if this status reports success.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}
