// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::io::Write;

use anyhow::Result;

use crate::common::{ArchiveContext, format_file_size};

/// Show the basic attributes of one entry, as text or JSON
pub fn stat_command<W: Write>(
    ctx: &ArchiveContext,
    path: &str,
    json: bool,
    out: &mut W,
) -> Result<()> {
    let target = ctx.path(path);
    let attrs = ctx.provider().read_attributes(&target)?;

    if json {
        serde_json::to_writer_pretty(&mut *out, &attrs)?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(out, "    Path: {}", target)?;
    writeln!(out, "    Type: {}", attrs.entry_type.as_str())?;
    writeln!(out, "    Size: {} ({})", attrs.size, format_file_size(attrs.size))?;
    writeln!(out, "Modified: {}", attrs.last_modified_time.to_rfc3339())?;
    if attrs.is_symbolic_link() {
        writeln!(out, "  Target: {}", ctx.provider().read_symbolic_link(&target)?)?;
    }
    writeln!(out, "     Key: {}", attrs.file_key)?;
    Ok(())
}
