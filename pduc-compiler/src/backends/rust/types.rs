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

//! Mapping of resolved field types to Rust types and runtime calls.

use crate::resolver::ResolvedType;
use quote::{format_ident, quote};

/// Rust type of the struct member backing a field.
pub fn rust_type(ty: ResolvedType) -> proc_macro2::TokenStream {
    match ty {
        ResolvedType::U8 => quote!(u8),
        ResolvedType::U16 => quote!(u16),
        ResolvedType::U32 => quote!(u32),
        ResolvedType::U64 => quote!(u64),
        ResolvedType::Bytes => quote!(::std::vec::Vec<u8>),
    }
}

/// Suffix shared by the `bytes::BufMut::put_*` and
/// `pduc_runtime::Reader::read_*` methods for a scalar type.
fn method_suffix(ty: ResolvedType) -> &'static str {
    match ty {
        ResolvedType::U8 => "u8",
        ResolvedType::U16 => "u16",
        ResolvedType::U32 => "u32",
        ResolvedType::U64 => "u64",
        ResolvedType::Bytes => unreachable!("byte arrays are not scalars"),
    }
}

/// Generate a big-endian write of the scalar `value` into `buf`.
pub fn put_uint(
    ty: ResolvedType,
    value: &proc_macro2::TokenStream,
    buf: &proc_macro2::Ident,
) -> proc_macro2::TokenStream {
    let put = format_ident!("put_{}", method_suffix(ty));
    quote! { #buf.#put(#value) }
}

/// Generate a big-endian read of a scalar field through `reader`.
pub fn read_uint(
    ty: ResolvedType,
    reader: &proc_macro2::Ident,
    field: &str,
) -> proc_macro2::TokenStream {
    let read = format_ident!("read_{}", method_suffix(ty));
    quote! { #reader.#read(#field)? }
}
