//! Codec Module
//!
//! Fixed-width integer and UTF-8 text codecs, plus an explicit registry of
//! message decoders keyed by type. Codecs never reshape stored bytes: a
//! value written through one adapter reads back bit-identical through the
//! raw byte interface.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use prost::Message;

use crate::error::{CacheError, Result};

// == Value Codecs ==
/// Encodes an i32 as 4 little-endian bytes.
pub(crate) fn encode_i32(value: i32) -> Vec<u8> {
    value.to_le_bytes().to_vec()
}

/// Decodes 4 little-endian bytes back to an i32.
///
/// Anything but exactly 4 bytes is a decode error.
pub(crate) fn decode_i32(key: &str, raw: &[u8]) -> Result<i32> {
    let bytes: [u8; 4] = raw.try_into().map_err(|_| {
        CacheError::Decode(format!(
            "key '{}': expected 4 bytes for i32, got {}",
            key,
            raw.len()
        ))
    })?;
    Ok(i32::from_le_bytes(bytes))
}

/// Decodes stored bytes as UTF-8 text.
pub(crate) fn decode_text(key: &str, raw: Vec<u8>) -> Result<String> {
    String::from_utf8(raw)
        .map_err(|e| CacheError::Decode(format!("key '{}': invalid utf-8: {}", key, e)))
}

// == Codec Registry ==
/// Decode function for a registered message type.
pub type DecodeFn<T> = fn(&[u8]) -> std::result::Result<T, prost::DecodeError>;

/// Explicit registry of message decoders.
///
/// Every message type the typed cache should decode must be registered up
/// front; asking for an unregistered type fails with
/// [`CacheError::TypeNotSupported`]. Registration happens once at startup,
/// after which the registry is read-only and shares freely between tasks.
#[derive(Default)]
pub struct CodecRegistry {
    decoders: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl CodecRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the decoder for message type `T`.
    pub fn register<T>(&mut self)
    where
        T: Message + Default + 'static,
    {
        let decode: DecodeFn<T> = |raw| T::decode(raw);
        self.decoders.insert(TypeId::of::<T>(), Box::new(decode));
    }

    /// Returns whether `T` has a registered decoder.
    pub fn supports<T: 'static>(&self) -> bool {
        self.decoders.contains_key(&TypeId::of::<T>())
    }

    /// Looks up the decoder for `T`.
    pub fn decoder<T>(&self) -> Result<DecodeFn<T>>
    where
        T: Message + Default + 'static,
    {
        self.decoders
            .get(&TypeId::of::<T>())
            .and_then(|decode| decode.downcast_ref::<DecodeFn<T>>())
            .copied()
            .ok_or_else(|| CacheError::TypeNotSupported(std::any::type_name::<T>()))
    }
}
