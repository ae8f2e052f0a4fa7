// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Temp-file staging for multipart uploads
//!
//! The decoded upload is written once to `<dir>/<uuid>` before dispatch and
//! removed once after the response arrives. A handle dropped without an
//! explicit [`StagedFile::remove`] (abandoned dispatch, runtime shutdown)
//! still deletes its file.

use std::fs::File;
use std::path::{Path, PathBuf};

use reqwest::multipart::Part;
use tokio_util::io::ReaderStream;
use uuid::Uuid;

use crate::error::{Error, Result};

/// A staged upload on disk
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    len: u64,
    armed: bool,
}

impl StagedFile {
    /// Write `bytes` to a freshly named file under `dir`
    pub fn create(dir: &Path, bytes: &[u8]) -> Result<Self> {
        let path = dir.join(Uuid::new_v4().to_string());
        std::fs::write(&path, bytes).map_err(|e| Error::staging(&path, e))?;

        tracing::debug!(path = %path.display(), len = bytes.len(), "upload staged");
        Ok(Self {
            path,
            len: bytes.len() as u64,
            armed: true,
        })
    }

    /// Location of the staged file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the staged file in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Multipart part whose body streams from the staged file.
    ///
    /// Must be called inside a tokio runtime.
    pub fn part(&self) -> Result<Part> {
        let file = File::open(&self.path).map_err(|e| Error::staging(&self.path, e))?;
        let stream = ReaderStream::new(tokio::fs::File::from_std(file));
        Ok(Part::stream_with_length(
            reqwest::Body::wrap_stream(stream),
            self.len,
        ))
    }

    /// Delete the staged file. Consumes the handle so removal happens once.
    pub fn remove(mut self) -> Result<()> {
        self.armed = false;
        std::fs::remove_file(&self.path).map_err(|e| Error::cleanup(&self.path, e))?;
        tracing::debug!(path = %self.path.display(), "staged upload removed");
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "abandoned upload removed"),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to remove abandoned upload")
            }
        }
    }
}
