//! Namespace codec
//!
//! Encoding and decoding between a [`Namespace`] and the archive payload
//! bytes. The codec is a seam: archives record nothing about it, so a
//! deployment must read with the codec it wrote with. The shipped default
//! encodes the restricted value tree with bincode, which keeps decoding of
//! untrusted archives constrained to known shapes.

use crate::error::{PakError, Result};
use crate::namespace::Namespace;

/// Converts namespaces to and from payload bytes
pub trait Codec {
    /// Short codec name for logs
    fn name(&self) -> &'static str;

    /// Encode a namespace into payload bytes
    fn encode(&self, namespace: &Namespace) -> Result<Vec<u8>>;

    /// Decode payload bytes back into a namespace
    fn decode(&self, bytes: &[u8]) -> Result<Namespace>;
}

/// Default codec: bincode over the restricted value tree
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl Codec for BincodeCodec {
    fn name(&self) -> &'static str {
        "bincode"
    }

    fn encode(&self, namespace: &Namespace) -> Result<Vec<u8>> {
        bincode::serialize(namespace)
            .map_err(|e| PakError::Codec(format!("encode failed: {e}")))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Namespace> {
        bincode::deserialize(bytes)
            .map_err(|e| PakError::Codec(format!("decode failed: {e}")))
    }
}
