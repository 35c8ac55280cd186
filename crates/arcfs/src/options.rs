// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How a file is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpenOption {
    Read,
    Write,
    Append,
    TruncateExisting,
    Create,
    CreateNew,
    DeleteOnClose,
    Sparse,
    Sync,
    Dsync,
    NoFollowLinks,
}

impl OpenOption {
    /// Options that imply modifying the archive
    #[must_use]
    pub fn is_write_intent(&self) -> bool {
        matches!(
            self,
            OpenOption::Write
                | OpenOption::Append
                | OpenOption::TruncateExisting
                | OpenOption::Create
                | OpenOption::CreateNew
                | OpenOption::DeleteOnClose
        )
    }
}

/// Rejects any write-intent option
pub fn validate_read_only(options: &[OpenOption]) -> Result<()> {
    if options.iter().any(OpenOption::is_write_intent) {
        return Err(Error::read_only("open for writing"));
    }
    Ok(())
}

/// Access checked by `check_access`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    Read,
    Write,
    Execute,
}
