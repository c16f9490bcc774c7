// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Helper definitions used by the code generated by `pduc`.
//!
//! All multi-byte scalars are big-endian on the wire.

use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Type of decoding errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error(
        "when decoding {message}.{field} at offset {offset}, needed {wanted} bytes but got {got}"
    )]
    TruncatedInput {
        message: &'static str,
        field: &'static str,
        offset: usize,
        wanted: usize,
        got: usize,
    },
    #[error(
        "when decoding {message}.{field} at offset {offset}, the length {length} exceeds the input size ({input_len} bytes)"
    )]
    LengthMismatch {
        message: &'static str,
        field: &'static str,
        offset: usize,
        length: u64,
        input_len: usize,
    },
    #[error("message has trailing bytes")]
    TrailingBytes,
}

/// Type of encoding errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error(
        "the length of {message}::{field} ({actual}) does not match the value of {message}::{length_field} ({length})"
    )]
    LengthMismatch {
        message: &'static str,
        field: &'static str,
        length_field: &'static str,
        length: u64,
        actual: usize,
    },
    #[error("encoding {message} requires {wanted} bytes but the buffer only has room for {got}")]
    BufferTooSmall { message: &'static str, wanted: usize, got: usize },
}

/// Sequential big-endian reader over an input buffer.
///
/// The cursor only moves forward. Every read reports the field name
/// and the byte offset at which it failed.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    message: &'static str,
    input: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    pub fn new(message: &'static str, input: &'a [u8]) -> Self {
        Reader { message, input, offset: 0 }
    }

    /// Number of bytes consumed so far.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The unread part of the input.
    pub fn remaining(&self) -> &'a [u8] {
        &self.input[self.offset..]
    }

    fn take(&mut self, field: &'static str, wanted: usize) -> Result<&'a [u8], DecodeError> {
        let remaining = self.remaining();
        if remaining.len() < wanted {
            return Err(DecodeError::TruncatedInput {
                message: self.message,
                field,
                offset: self.offset,
                wanted,
                got: remaining.len(),
            });
        }
        self.offset += wanted;
        Ok(&remaining[..wanted])
    }

    pub fn read_u8(&mut self, field: &'static str) -> Result<u8, DecodeError> {
        Ok(self.take(field, 1)?.get_u8())
    }

    pub fn read_u16(&mut self, field: &'static str) -> Result<u16, DecodeError> {
        Ok(self.take(field, 2)?.get_u16())
    }

    pub fn read_u32(&mut self, field: &'static str) -> Result<u32, DecodeError> {
        Ok(self.take(field, 4)?.get_u32())
    }

    pub fn read_u64(&mut self, field: &'static str) -> Result<u64, DecodeError> {
        Ok(self.take(field, 8)?.get_u64())
    }

    /// Read exactly `length` bytes.
    ///
    /// A length that exceeds the size of the whole input can never be
    /// satisfied and is reported as [`DecodeError::LengthMismatch`];
    /// a length that only exceeds the unread part of the input is
    /// reported as [`DecodeError::TruncatedInput`].
    pub fn read_bytes(&mut self, field: &'static str, length: u64) -> Result<Vec<u8>, DecodeError> {
        let wanted = match usize::try_from(length) {
            Ok(wanted) if wanted <= self.input.len() => wanted,
            _ => {
                return Err(DecodeError::LengthMismatch {
                    message: self.message,
                    field,
                    offset: self.offset,
                    length,
                    input_len: self.input.len(),
                })
            }
        };
        Ok(self.take(field, wanted)?.to_vec())
    }
}

/// Trait implemented for all generated message types.
pub trait Message: Sized {
    /// Try decoding an instance of Self from the input slice.
    /// On success, returns the decoded object and the remaining undecoded slice.
    /// Trailing bytes are not an error.
    fn decode(buf: &[u8]) -> Result<(Self, &[u8]), DecodeError>;

    /// Try decoding an instance of Self updating the slice in place
    /// to the remainder of the data. The input buffer is not updated if
    /// decoding fails.
    fn decode_mut(buf: &mut &[u8]) -> Result<Self, DecodeError> {
        let (message, remaining) = Self::decode(buf)?;
        *buf = remaining;
        Ok(message)
    }

    /// Try decoding an instance of Self from the input slice.
    /// Returns an error if undecoded bytes remain at the end of the input slice.
    fn decode_full(buf: &[u8]) -> Result<Self, DecodeError> {
        let (message, remaining) = Self::decode(buf)?;
        if remaining.is_empty() {
            Ok(message)
        } else {
            Err(DecodeError::TrailingBytes)
        }
    }

    /// Return the length of the encoded message.
    fn encoded_len(&self) -> usize;

    /// Write the message to an output buffer.
    fn encode(&self, buf: &mut impl BufMut) -> Result<(), EncodeError>;

    /// Encode the message to a byte vector.
    fn encode_to_vec(&self) -> Result<Vec<u8>, EncodeError> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.encode(&mut buf)?;
        Ok(buf)
    }

    /// Encode the message to a Bytes object.
    fn encode_to_bytes(&self) -> Result<Bytes, EncodeError> {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode(&mut buf)?;
        Ok(buf.freeze())
    }
}
