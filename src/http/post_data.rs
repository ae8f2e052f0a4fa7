// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! POST payload description

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use bytes::Bytes;

use crate::error::{Error, Result};

/// Standard alphabet; trailing `=` padding is optional on decode
const UPLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Payload content: text or raw bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Bytes(Vec<u8>),
}

impl Content {
    /// Body bytes for a raw POST. Text is sent as UTF-8.
    pub fn to_bytes(&self) -> Bytes {
        match self {
            Content::Text(s) => Bytes::copy_from_slice(s.as_bytes()),
            Content::Bytes(b) => Bytes::copy_from_slice(b),
        }
    }

    /// Decode base64 text content for a multipart upload
    pub fn decode_base64(&self) -> Result<Vec<u8>> {
        match self {
            Content::Text(s) => UPLOAD_ENGINE
                .decode(s.trim())
                .map_err(|e| Error::invalid_payload(format!("content is not valid base64: {}", e))),
            Content::Bytes(_) => Err(Error::invalid_payload(
                "multipart upload requires base64 text content",
            )),
        }
    }
}

impl From<String> for Content {
    fn from(s: String) -> Self {
        Content::Text(s)
    }
}

impl From<&str> for Content {
    fn from(s: &str) -> Self {
        Content::Text(s.to_string())
    }
}

impl From<Vec<u8>> for Content {
    fn from(b: Vec<u8>) -> Self {
        Content::Bytes(b)
    }
}

impl From<&[u8]> for Content {
    fn from(b: &[u8]) -> Self {
        Content::Bytes(b.to_vec())
    }
}

/// POST payload
///
/// `name`, `filename` and `content_type` only matter for multipart uploads;
/// a raw POST sends `content` alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostData {
    /// Form field name
    pub name: String,
    /// Filename presented to the server
    pub filename: String,
    /// MIME type of the uploaded part
    pub content_type: String,
    /// Payload
    pub content: Content,
}

impl PostData {
    /// Multipart file upload with base64-encoded content
    pub fn file(
        name: impl Into<String>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
        base64_content: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            filename: filename.into(),
            content_type: content_type.into(),
            content: Content::Text(base64_content.into()),
        }
    }

    /// Raw text payload
    pub fn text(content: impl Into<String>) -> Self {
        Self::raw(Content::Text(content.into()))
    }

    /// Raw byte payload
    pub fn bytes(content: impl Into<Vec<u8>>) -> Self {
        Self::raw(Content::Bytes(content.into()))
    }

    fn raw(content: Content) -> Self {
        Self {
            name: String::new(),
            filename: String::new(),
            content_type: String::new(),
            content,
        }
    }
}
