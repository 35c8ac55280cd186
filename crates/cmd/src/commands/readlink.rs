// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::io::Write;

use anyhow::Result;

use crate::common::ArchiveContext;

/// Print a symlink's stored target without resolving it
pub fn readlink_command<W: Write>(ctx: &ArchiveContext, path: &str, out: &mut W) -> Result<()> {
    let target = ctx.provider().read_symbolic_link(&ctx.path(path))?;
    writeln!(out, "{}", target)?;
    Ok(())
}
