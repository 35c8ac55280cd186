// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::io::Write;

use anyhow::Result;
use arcfs::{ArchivePath, DirectoryStream, EntryType};

use crate::common::ArchiveContext;

fn walk<W: Write>(
    ctx: &ArchiveContext,
    dir: &ArchivePath,
    depth: usize,
    out: &mut W,
) -> Result<()> {
    for child in ctx
        .provider()
        .new_directory_stream(dir, DirectoryStream::accept_all())?
    {
        let indent = "  ".repeat(depth);
        let name = child.file_name().unwrap_or_default();
        match ctx.provider().read_attributes(&child)?.entry_type {
            EntryType::Directory => {
                writeln!(out, "{}{}/", indent, name)?;
                walk(ctx, &child, depth + 1, out)?;
            }
            EntryType::Symlink => {
                let target = ctx.provider().read_symbolic_link(&child)?;
                writeln!(out, "{}{} -> {}", indent, name, target)?;
            }
            EntryType::File => writeln!(out, "{}{}", indent, name)?,
        }
    }
    Ok(())
}

/// Print the subtree under `path`, children in archive order
pub fn tree_command<W: Write>(ctx: &ArchiveContext, path: &str, out: &mut W) -> Result<()> {
    let root = ctx.path(path);
    writeln!(out, "{}", root)?;
    walk(ctx, &root, 1, out)
}
