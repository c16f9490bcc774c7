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

/// Builds the body of `Message::decode` for one message.
///
/// Fields are read in a single forward pass; every field is bound
/// to a local variable named after the struct member.
pub struct FieldParser<'a> {
    message: &'a analyzer::Message,
    reader: proc_macro2::Ident,
    buf: proc_macro2::Ident,
    tokens: proc_macro2::TokenStream,
}

impl<'a> FieldParser<'a> {
    pub fn new(message: &'a analyzer::Message, buf: proc_macro2::Ident) -> FieldParser<'a> {
        FieldParser { message, reader: reader_ident(message), buf, tokens: quote! {} }
    }

    pub fn add(&mut self, field: &analyzer::Field) {
        let id = field.name.as_str().to_ident();
        let reader = &self.reader;
        let field_id = &field.id;
        self.tokens.extend(match (field.ty, field.length) {
            (ResolvedType::Bytes, Some(length)) => {
                let length_id = self.message.field(length).name.as_str().to_ident();
                quote! {
                    let #id = #reader.read_bytes(#field_id, u64::from(#length_id))?;
                }
            }
            (ResolvedType::Bytes, None) => {
                unreachable!("byte array field {} without length field", field.id)
            }
            (ty, _) => {
                let read_uint = types::read_uint(ty, reader, field_id);
                quote! { let #id = #read_uint; }
            }
        });
    }

    /// Generate the body of `Message::decode`.
    pub fn generate(self) -> proc_macro2::TokenStream {
        let FieldParser { message, reader, buf, tokens } = self;
        if message.fields.is_empty() {
            return quote! { ::core::result::Result::Ok((Self {}, #buf)) };
        }
        let message_id = &message.id;
        let ids = message.fields.iter().map(|field| field.name.as_str().to_ident());
        quote! {
            let mut #reader = ::pduc_runtime::Reader::new(#message_id, #buf);
            #tokens
            ::core::result::Result::Ok((Self { #(#ids),* }, #reader.remaining()))
        }
    }
}

/// Pick a name for the reader variable that does not collide with
/// any of the field variables.
fn reader_ident(message: &analyzer::Message) -> proc_macro2::Ident {
    let mut name = "reader".to_owned();
    while message.fields.iter().any(|field| field.name == name) {
        name.push('_');
    }
    format_ident!("{}", name)
}
