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

use crate::analyzer;
use crate::backends::rust::{types, ToIdent};
use crate::resolver::ResolvedType;
use quote::{format_ident, quote};

/// Represents the computed size of a message,
/// composed of constant and variable size fields.
pub struct RuntimeSize {
    constant: usize,
    variable: Vec<proc_macro2::TokenStream>,
}

impl std::ops::AddAssign<&RuntimeSize> for RuntimeSize {
    fn add_assign(&mut self, other: &RuntimeSize) {
        self.constant += other.constant;
        self.variable.extend_from_slice(&other.variable)
    }
}

impl quote::ToTokens for RuntimeSize {
    fn to_tokens(&self, tokens: &mut proc_macro2::TokenStream) {
        let constant = proc_macro2::Literal::usize_unsuffixed(self.constant);
        tokens.extend(match self {
            RuntimeSize { variable, .. } if variable.is_empty() => quote! { #constant },
            RuntimeSize { variable, constant: 0 } => quote! { #(#variable)+* },
            RuntimeSize { variable, .. } => quote! { #constant + #(#variable)+* },
        })
    }
}

/// Builds the body of `Message::encode` for one message.
pub struct Encoder {
    buf: proc_macro2::Ident,
    message_id: String,
    size: RuntimeSize,
    checks: proc_macro2::TokenStream,
    tokens: proc_macro2::TokenStream,
}

impl Encoder {
    pub fn new(message_id: &str, buf: proc_macro2::Ident) -> Self {
        Encoder {
            buf,
            message_id: message_id.to_owned(),
            size: RuntimeSize { constant: 0, variable: vec![] },
            checks: quote! {},
            tokens: quote! {},
        }
    }

    fn encode_scalar_field(&mut self, field: &analyzer::Field) {
        let id = field.name.as_str().to_ident();
        let put_uint = types::put_uint(field.ty, &quote! { self.#id }, &self.buf);
        self.tokens.extend(quote! { #put_uint; });
        self.size += &RuntimeSize {
            constant: field.ty.width().unwrap_or_default(),
            variable: vec![],
        };
    }

    /// Byte arrays are written verbatim, without length prefix.
    /// The declared length must match the actual size of the array.
    fn encode_bytes_field(&mut self, field: &analyzer::Field, length_field: &analyzer::Field) {
        let id = field.name.as_str().to_ident();
        let length_id = length_field.name.as_str().to_ident();
        let message_id = &self.message_id;
        let field_id = &field.id;
        let length_field_id = &length_field.id;
        let buf = &self.buf;
        self.checks.extend(quote! {
            if self.#id.len() as u64 != u64::from(self.#length_id) {
                return ::core::result::Result::Err(::pduc_runtime::EncodeError::LengthMismatch {
                    message: #message_id,
                    field: #field_id,
                    length_field: #length_field_id,
                    length: u64::from(self.#length_id),
                    actual: self.#id.len(),
                });
            }
        });
        self.tokens.extend(quote! { #buf.put_slice(&self.#id); });
        self.size += &RuntimeSize { constant: 0, variable: vec![quote! { self.#id.len() }] };
    }

    pub fn encode_field(&mut self, message: &analyzer::Message, field: &analyzer::Field) {
        match (field.ty, field.length) {
            (ResolvedType::Bytes, Some(length)) => {
                self.encode_bytes_field(field, message.field(length))
            }
            (ResolvedType::Bytes, None) => {
                unreachable!("byte array field {} without length field", field.id)
            }
            _ => self.encode_scalar_field(field),
        }
    }

    /// Expression computing the encoded size of the message.
    pub fn encoded_len(&self) -> proc_macro2::TokenStream {
        let size = &self.size;
        quote! { #size }
    }

    /// Generate the body of `Message::encode`.
    pub fn generate(self) -> proc_macro2::TokenStream {
        let Encoder { buf, message_id, checks, tokens, .. } = self;
        let wanted = format_ident!("wanted");
        quote! {
            #checks
            let #wanted = ::pduc_runtime::Message::encoded_len(self);
            if #buf.remaining_mut() < #wanted {
                return ::core::result::Result::Err(::pduc_runtime::EncodeError::BufferTooSmall {
                    message: #message_id,
                    wanted: #wanted,
                    got: #buf.remaining_mut(),
                });
            }
            #tokens
            ::core::result::Result::Ok(())
        }
    }
}
