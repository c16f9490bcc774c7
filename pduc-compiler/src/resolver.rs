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

//! Type resolution: maps declared type tokens and byte widths to
//! canonical field types.
//!
//! Resolution is total. Unknown tokens and widths degrade to
//! [`ResolvedType::DEFAULT`]; callers that need to report the
//! fallback use [`resolve_token`] and inspect
//! [`Resolution::defaulted`].

use serde::Serialize;
use std::fmt;

use crate::ast::TypeToken;

/// Canonical type of a field.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedType {
    U8,
    U16,
    U32,
    U64,
    /// Variable-length byte sequence.
    Bytes,
}

impl ResolvedType {
    /// Narrowest scalar type, used for unrecognized declarations.
    pub const DEFAULT: ResolvedType = ResolvedType::U8;

    /// Width in bytes of a fixed-width scalar.
    pub fn width(&self) -> Option<usize> {
        match self {
            ResolvedType::U8 => Some(1),
            ResolvedType::U16 => Some(2),
            ResolvedType::U32 => Some(4),
            ResolvedType::U64 => Some(8),
            ResolvedType::Bytes => None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        self.width().is_some()
    }
}

impl fmt::Display for ResolvedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResolvedType::U8 => "uint8",
            ResolvedType::U16 => "uint16",
            ResolvedType::U32 => "uint32",
            ResolvedType::U64 => "uint64",
            ResolvedType::Bytes => "byte_array",
        })
    }
}

/// Result of resolving a declared type.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub ty: ResolvedType,
    /// The declaration was not recognized and `ty` is the default.
    pub defaulted: bool,
}

/// Look up a symbolic type token.
pub fn lookup(token: &str) -> Option<ResolvedType> {
    match token {
        "uint8" | "byte" => Some(ResolvedType::U8),
        "uint16" => Some(ResolvedType::U16),
        "uint32" => Some(ResolvedType::U32),
        "uint64" => Some(ResolvedType::U64),
        "byte_array" | "[]byte" => Some(ResolvedType::Bytes),
        _ => None,
    }
}

/// Look up an explicit byte width.
pub fn lookup_width(width: i64) -> Option<ResolvedType> {
    match width {
        1 => Some(ResolvedType::U8),
        2 => Some(ResolvedType::U16),
        4 => Some(ResolvedType::U32),
        _ => None,
    }
}

pub fn resolve(token: &str) -> ResolvedType {
    lookup(token).unwrap_or(ResolvedType::DEFAULT)
}

pub fn resolve_by_width(width: i64) -> ResolvedType {
    lookup_width(width).unwrap_or(ResolvedType::DEFAULT)
}

pub fn resolve_token(token: &TypeToken) -> Resolution {
    let ty = match token {
        TypeToken::Symbolic(token) => lookup(token),
        TypeToken::Width(width) => lookup_width(*width),
        TypeToken::Unspecified => None,
    };
    Resolution { ty: ty.unwrap_or(ResolvedType::DEFAULT), defaulted: ty.is_none() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_symbolic_tokens() {
        assert_eq!(resolve("uint8"), ResolvedType::U8);
        assert_eq!(resolve("uint16"), ResolvedType::U16);
        assert_eq!(resolve("uint32"), ResolvedType::U32);
        assert_eq!(resolve("uint64"), ResolvedType::U64);
        assert_eq!(resolve("byte_array"), ResolvedType::Bytes);
        assert_eq!(resolve("[]byte"), ResolvedType::Bytes);
        assert_eq!(resolve("float32"), ResolvedType::U8);
        assert_eq!(resolve(""), ResolvedType::U8);
        assert_eq!(resolve("UINT16"), ResolvedType::U8);
    }

    #[test]
    fn resolve_widths() {
        assert_eq!(resolve_by_width(1), ResolvedType::U8);
        assert_eq!(resolve_by_width(2), ResolvedType::U16);
        assert_eq!(resolve_by_width(4), ResolvedType::U32);
    }

    #[test]
    fn resolve_unknown_widths_to_default() {
        for width in [i64::MIN, -4, -1, 0, 3, 5, 8, 16, i64::MAX] {
            assert_eq!(resolve_by_width(width), ResolvedType::U8, "width {width}");
            assert_eq!(lookup_width(width), None, "width {width}");
        }
    }

    #[test]
    fn resolve_token_reports_default() {
        assert_eq!(
            resolve_token(&TypeToken::Width(2)),
            Resolution { ty: ResolvedType::U16, defaulted: false }
        );
        assert_eq!(
            resolve_token(&TypeToken::Width(3)),
            Resolution { ty: ResolvedType::U8, defaulted: true }
        );
        assert_eq!(
            resolve_token(&TypeToken::Symbolic("uint8".to_owned())),
            Resolution { ty: ResolvedType::U8, defaulted: false }
        );
        assert_eq!(
            resolve_token(&TypeToken::Symbolic("int16".to_owned())),
            Resolution { ty: ResolvedType::U8, defaulted: true }
        );
        assert_eq!(
            resolve_token(&TypeToken::Unspecified),
            Resolution { ty: ResolvedType::U8, defaulted: true }
        );
    }

    #[test]
    fn scalar_widths() {
        assert_eq!(ResolvedType::U64.width(), Some(8));
        assert!(ResolvedType::U32.is_scalar());
        assert!(!ResolvedType::Bytes.is_scalar());
        assert_eq!(ResolvedType::Bytes.to_string(), "byte_array");
    }
}
