//! Binary encoding of a built estimator.
//!
//! Layout: 4-byte little-endian header length, bincode header, bincode
//! payload. Any mismatch is reported so callers can rebuild instead.

use crate::error::SerializationError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const MAGIC: [u8; 4] = *b"EDLA";

/// Increment on any change to the encoded estimator layout.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BlobHeader {
    magic: [u8; 4],
    format_version: u32,
    /// Crate version that produced the blob, informational only.
    producer: String,
}

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, SerializationError> {
    let header = BlobHeader {
        magic: MAGIC,
        format_version: FORMAT_VERSION,
        producer: env!("CARGO_PKG_VERSION").to_string(),
    };
    let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
        .map_err(|e| SerializationError::Encode {
            reason: e.to_string(),
        })?;
    let payload = bincode::serde::encode_to_vec(value, bincode::config::standard()).map_err(
        |e| SerializationError::Encode {
            reason: e.to_string(),
        },
    )?;

    let header_len = header_bytes.len() as u32;
    let mut output = Vec::with_capacity(4 + header_bytes.len() + payload.len());
    output.extend_from_slice(&header_len.to_le_bytes());
    output.extend_from_slice(&header_bytes);
    output.extend_from_slice(&payload);
    Ok(output)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SerializationError> {
    let (len_bytes, rest) = bytes
        .split_first_chunk::<4>()
        .ok_or(SerializationError::BadMagic)?;
    let header_len = u32::from_le_bytes(*len_bytes) as usize;
    if rest.len() < header_len {
        return Err(SerializationError::BadMagic);
    }
    let (header_bytes, payload) = rest.split_at(header_len);

    let (header, _): (BlobHeader, usize) =
        bincode::serde::decode_from_slice(header_bytes, bincode::config::standard())
            .map_err(|_| SerializationError::BadMagic)?;
    if header.magic != MAGIC {
        return Err(SerializationError::BadMagic);
    }
    if header.format_version != FORMAT_VERSION {
        return Err(SerializationError::VersionMismatch {
            expected: FORMAT_VERSION,
            actual: header.format_version,
        });
    }

    let (value, read) = bincode::serde::decode_from_slice(payload, bincode::config::standard())
        .map_err(|e| SerializationError::Decode {
            reason: e.to_string(),
        })?;
    if read != payload.len() {
        return Err(SerializationError::Decode {
            reason: format!("{} trailing bytes", payload.len() - read),
        });
    }
    log::debug!(
        "Decoded {} byte blob written by version {}",
        bytes.len(),
        header.producer
    );
    Ok(value)
}
