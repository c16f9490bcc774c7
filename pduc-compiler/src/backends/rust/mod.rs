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

//! Rust compiler backend.

use crate::analyzer;
use crate::ast;
use crate::resolver::ResolvedType;
use heck::ToSnakeCase;
use quote::{format_ident, quote};
use std::path::Path;

mod decoder;
mod encoder;
mod preamble;
pub mod test;
mod types;

use decoder::FieldParser;
use encoder::Encoder;

pub trait ToIdent {
    /// Generate a sanitized rust identifier.
    /// Rust specific keywords are renamed for validity.
    fn to_ident(self) -> proc_macro2::Ident;
}

impl ToIdent for &'_ str {
    fn to_ident(self) -> proc_macro2::Ident {
        match self {
            // Cannot be used as raw identifiers.
            "crate" | "self" | "Self" | "super" => format_ident!("{}_", self),
            "as" | "break" | "const" | "continue" | "else" | "enum" | "extern" | "false"
            | "fn" | "for" | "if" | "impl" | "in" | "let" | "loop" | "match" | "mod" | "move"
            | "mut" | "pub" | "ref" | "return" | "static" | "struct" | "trait" | "true"
            | "type" | "unsafe" | "use" | "where" | "while" | "async" | "await" | "dyn"
            | "abstract" | "become" | "box" | "do" | "final" | "macro" | "override" | "priv"
            | "typeof" | "unsized" | "virtual" | "yield" | "try" | "gen" => {
                format_ident!("r#{}", self)
            }
            _ => format_ident!("{}", self),
        }
    }
}

/// Generated declaration of a single message.
#[derive(Debug, Clone)]
pub struct GeneratedMessageType {
    /// Name of the generated struct.
    pub name: String,
    /// Struct members in declaration order.
    pub fields: Vec<(String, ResolvedType)>,
    pub tokens: proc_macro2::TokenStream,
}

/// Generate the struct declaration and `Message` implementation
/// of a message.
pub fn generate_message(message: &analyzer::Message) -> GeneratedMessageType {
    let name = message.name.as_str().to_ident();
    let buf = format_ident!("buf");

    let mut encoder = Encoder::new(&message.id, buf.clone());
    let mut parser = FieldParser::new(message, buf.clone());
    for field in &message.fields {
        encoder.encode_field(message, field);
        parser.add(field);
    }
    let encoded_len = encoder.encoded_len();
    let encode = encoder.generate();
    let decode = parser.generate();

    let field_names = message.fields.iter().map(|field| field.name.as_str().to_ident());
    let field_types = message.fields.iter().map(|field| types::rust_type(field.ty));
    let allow_case = message
        .name
        .contains('_')
        .then(|| quote! { #[allow(non_camel_case_types)] });

    let tokens = quote! {
        #[derive(Debug, Clone, PartialEq, Eq, Default)]
        #allow_case
        pub struct #name {
            #(pub #field_names: #field_types,)*
        }

        impl ::pduc_runtime::Message for #name {
            fn decode(
                #buf: &[u8],
            ) -> ::core::result::Result<(Self, &[u8]), ::pduc_runtime::DecodeError> {
                #decode
            }

            fn encoded_len(&self) -> usize {
                #encoded_len
            }

            fn encode(
                &self,
                #buf: &mut impl ::bytes::BufMut,
            ) -> ::core::result::Result<(), ::pduc_runtime::EncodeError> {
                #encode
            }
        }
    };

    GeneratedMessageType {
        name: message.name.clone(),
        fields: message.fields.iter().map(|field| (field.name.clone(), field.ty)).collect(),
        tokens,
    }
}

/// Generate every message of the schema, in schema order.
pub fn generate_messages(schema: &analyzer::Schema) -> Vec<GeneratedMessageType> {
    schema.messages.iter().map(generate_message).collect()
}

/// Convert the schema path into a list of nested module names.
///
/// The path is split on `/`, `.` and `::`; every segment is converted
/// to a snake_case identifier. Segments starting with a digit are
/// prefixed with `_`.
pub fn module_path(path: &str) -> Vec<proc_macro2::Ident> {
    path.split(['/', '.', ':'])
        .map(|segment| {
            segment
                .to_snake_case()
                .chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
                .collect::<String>()
        })
        .filter(|segment| !segment.is_empty() && segment != "_")
        .map(|segment| match segment.starts_with(|c: char| c.is_ascii_digit()) {
            true => format_ident!("_{}", segment),
            false => segment.as_str().to_ident(),
        })
        .collect()
}

/// Generate Rust code from a resolved schema.
///
/// The messages are emitted at the top level, without namespace.
/// The code is not formatted, pipe it through `prettyplease` to get
/// readable source code.
pub fn generate_tokens(
    sources: &ast::SourceDatabase,
    file: ast::FileId,
    schema: &analyzer::Schema,
) -> proc_macro2::TokenStream {
    let name = sources.get(file).map(|source| source.name().clone()).unwrap_or_default();
    let preamble = preamble::generate(Path::new(&name));
    let messages = generate_messages(schema).into_iter().map(|message| message.tokens);
    quote! {
        #preamble

        #(#messages)*
    }
}

/// Generate formatted Rust code from a resolved schema.
///
/// The messages are nested in modules following the schema path.
pub fn generate(
    sources: &ast::SourceDatabase,
    file: ast::FileId,
    schema: &analyzer::Schema,
) -> String {
    let mut tokens = generate_tokens(sources, file, schema);
    for module in module_path(&schema.path).iter().rev() {
        tokens = quote! {
            pub mod #module {
                #tokens
            }
        };
    }
    let syntax_tree = syn::parse2(tokens).expect("Could not parse code");
    prettyplease::unparse(&syntax_tree)
}
