// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::io::Write;

use anyhow::{Context, Result};
use arcfs::OpenOption;
use tokio::io::AsyncReadExt;

use crate::common::ArchiveContext;

const CHUNK_SIZE: usize = 64 * 1024;

/// Copy the content of each file to `out`, one after another
pub async fn cat_command<W: Write>(
    ctx: &ArchiveContext,
    paths: &[String],
    out: &mut W,
) -> Result<()> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    for path in paths {
        let file = ctx.path(path);
        let mut reader = ctx
            .provider()
            .new_input_stream(&file, &[OpenOption::Read])
            .await
            .with_context(|| format!("Failed to open {}", file))?;

        let mut total = 0u64;
        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            out.write_all(&buf[..n])?;
            total += n as u64;
        }
        diagnostics::log_debug!(
            "Streamed {total} bytes from {file}",
            total: total,
            file: file.to_string()
        );
    }
    out.flush()?;
    Ok(())
}
