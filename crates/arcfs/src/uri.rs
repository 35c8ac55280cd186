// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! `archive:` URIs.
//!
//! The scheme-specific part is itself a `file:` URI naming the archive on
//! the host, and the fragment is the path inside the archive:
//!
//! ```text
//! archive:file:///tmp/photos.zip#/2024/may/beach.jpg
//! ```

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use std::path::PathBuf;
use std::str::FromStr;
use url::Url;

use crate::error::{Error, Result};
use crate::path;

pub const SCHEME: &str = "archive";

/// Characters escaped when an entry path is written into a fragment
const FRAGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'`');

/// A parsed `archive:` URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveUri {
    /// Host path of the archive file
    pub archive_file: PathBuf,
    /// Normalized path inside the archive; empty for the root
    pub path: String,
}

impl ArchiveUri {
    pub fn new<P: Into<PathBuf>>(archive_file: P, path: &str) -> Self {
        Self {
            archive_file: archive_file.into(),
            path: path::normalize(path),
        }
    }

    pub fn parse(uri: &str) -> Result<Self> {
        let url = Url::parse(uri).map_err(|e| Error::invalid_uri(format!("{}: {}", uri, e)))?;
        if url.scheme() != SCHEME {
            return Err(Error::invalid_uri(format!(
                "URI scheme must be \"{}\": {}",
                SCHEME, uri
            )));
        }

        let inner = Url::parse(url.path())
            .map_err(|e| Error::invalid_uri(format!("{}: archive location: {}", uri, e)))?;
        if inner.scheme() != "file" {
            return Err(Error::invalid_uri(format!(
                "archive location must be a file URI: {}",
                uri
            )));
        }
        let archive_file = inner
            .to_file_path()
            .map_err(|_| Error::invalid_uri(format!("not a host file path: {}", inner)))?;

        let entry_path = match url.fragment() {
            Some(fragment) => percent_decode_str(fragment)
                .decode_utf8()
                .map_err(|e| Error::invalid_uri(format!("{}: fragment: {}", uri, e)))?
                .into_owned(),
            None => String::new(),
        };

        Ok(Self::new(archive_file, &entry_path))
    }

    /// Requires an absolute archive path
    pub fn to_url(&self) -> Result<Url> {
        let file_url = Url::from_file_path(&self.archive_file).map_err(|_| {
            Error::invalid_uri(format!(
                "archive path is not absolute: {}",
                self.archive_file.display()
            ))
        })?;
        let fragment = utf8_percent_encode(&format!("/{}", self.path), FRAGMENT).to_string();
        let uri = format!("{}:{}#{}", SCHEME, file_url, fragment);
        Url::parse(&uri).map_err(|e| Error::invalid_uri(format!("{}: {}", uri, e)))
    }
}

impl FromStr for ArchiveUri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
