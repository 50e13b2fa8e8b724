// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

//! Byte-buffer encoding shared by every sketch.
//!
//! A buffer is a fixed header followed by the sketch body, both encoded with `bincode`
//! using little-endian fixed-width integers, IEEE-754 floats and `u64` length prefixes for
//! sequences. Sketch bodies declare their configuration fields before their payload, so the
//! parameters needed for merge-compatibility checks come first. A buffer must end exactly
//! where the body does.

use crate::enums::SketchKind;
use crate::traits::SketchError;
use bincode::Options;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Leading bytes of every serialized sketch.
pub const MAGIC: [u8; 4] = *b"SKCH";

/// Current layout version.
pub const VERSION: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct Header {
    magic: [u8; 4],
    version: u8,
    kind: SketchKind,
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    header: Header,
    body: &'a T,
}

#[derive(Deserialize)]
struct Envelope<T> {
    #[allow(dead_code)]
    header: Header,
    body: T,
}

fn layout() -> impl Options {
    bincode::options()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

/// Encodes `body` behind a header tagged with `kind`.
pub fn encode<T: Serialize>(kind: SketchKind, body: &T) -> Result<Vec<u8>, SketchError> {
    let envelope = EnvelopeRef {
        header: Header {
            magic: MAGIC,
            version: VERSION,
            kind,
        },
        body,
    };
    layout()
        .serialize(&envelope)
        .map_err(|e| SketchError::MalformedInput(format!("{} encode error: {}", kind, e)))
}

/// Decodes a buffer produced by [`encode`], checking the header against `kind`.
pub fn decode<T: DeserializeOwned>(kind: SketchKind, bytes: &[u8]) -> Result<T, SketchError> {
    let found = peek_kind(bytes)?;
    if found != kind {
        return Err(SketchError::MalformedInput(format!(
            "Expected a {} buffer, found {}",
            kind, found
        )));
    }
    let envelope: Envelope<T> = layout()
        .deserialize(bytes)
        .map_err(|e| SketchError::MalformedInput(format!("{} decode error: {}", kind, e)))?;
    Ok(envelope.body)
}

/// Reads only the header of a serialized sketch and returns its kind.
pub fn peek_kind(bytes: &[u8]) -> Result<SketchKind, SketchError> {
    let header: Header = layout()
        .allow_trailing_bytes()
        .deserialize(bytes)
        .map_err(|e| SketchError::MalformedInput(format!("Unreadable header: {}", e)))?;
    if header.magic != MAGIC {
        return Err(SketchError::MalformedInput("Bad magic bytes".into()));
    }
    if header.version != VERSION {
        return Err(SketchError::MalformedInput(format!(
            "Unsupported layout version {}",
            header.version
        )));
    }
    Ok(header.kind)
}
