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

//! Schema document loader.
//!
//! The input is a YAML (or JSON) document shaped as
//! `Protocol -> packetlist -> format`.

use codespan_reporting::diagnostic::{Diagnostic, Label};

use crate::ast;
use document::Bytesize;

/// Document nesting, as written by schema authors.
mod document {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct Document {
        #[serde(rename = "Protocol")]
        pub protocol: Protocol,
    }

    #[derive(Debug, Deserialize)]
    pub struct Protocol {
        pub path: String,
        pub packetlist: Vec<Packet>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Packet {
        pub msg: String,
        pub format: Vec<Format>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Format {
        pub id: String,
        #[serde(rename = "type")]
        pub type_: Option<String>,
        pub bytesize: Option<Bytesize>,
        pub tag: Option<String>,
    }

    /// `bytesize` is either a width in bytes, or the name of the field
    /// holding the length of a byte array.
    #[derive(Debug, Deserialize)]
    #[serde(untagged)]
    pub enum Bytesize {
        Width(i64),
        Reference(String),
    }
}

/// Extract the length reference from a binstruct style tag,
/// e.g. `bin:"len:Vallen"`. Only an option starting with `len:`
/// counts.
fn tag_length_ref(tag: &str) -> Option<&str> {
    tag.split(|c: char| c == '"' || c == ',' || c == '`' || c.is_whitespace())
        .find_map(|option| option.strip_prefix("len:"))
        .filter(|reference| !reference.is_empty())
}

fn convert_field(
    msg: &str,
    key: usize,
    format: document::Format,
) -> Result<ast::FieldSchema, String> {
    if format.id.trim().is_empty() {
        return Err(format!("message `{msg}` has a field with an empty identifier"));
    }
    let id = format.id;
    let tag_ref = format.tag.as_deref().and_then(tag_length_ref).map(str::to_owned);
    let (type_, size_ref) = match (format.type_, format.bytesize) {
        (Some(_), Some(_)) => {
            return Err(format!(
                "field `{msg}.{id}` declares both `type` and `bytesize`, expected only one"
            ))
        }
        (Some(token), None) => (ast::TypeToken::Symbolic(token), None),
        (None, Some(Bytesize::Width(width))) => (ast::TypeToken::Width(width), None),
        (None, Some(Bytesize::Reference(reference))) => {
            (ast::TypeToken::Symbolic("byte_array".to_owned()), Some(reference))
        }
        (None, None) => (ast::TypeToken::Unspecified, None),
    };
    let length_ref = match (size_ref, tag_ref) {
        (Some(size_ref), Some(tag_ref)) if size_ref != tag_ref => {
            return Err(format!(
                "field `{msg}.{id}` declares the length references `{size_ref}` and `{tag_ref}`"
            ))
        }
        (size_ref, tag_ref) => size_ref.or(tag_ref),
    };
    Ok(ast::FieldSchema { key: ast::FieldKey(key), id, type_, tag: format.tag, length_ref })
}

fn convert_document(file: ast::FileId, document: document::Document) -> Result<ast::File, String> {
    let mut result = ast::File::new(file, document.protocol.path);
    let mut field_key = 0;
    for (message_key, packet) in document.protocol.packetlist.into_iter().enumerate() {
        if packet.msg.trim().is_empty() {
            return Err(format!("message #{} has an empty identifier", message_key + 1));
        }
        let mut fields = Vec::with_capacity(packet.format.len());
        for format in packet.format {
            fields.push(convert_field(&packet.msg, field_key, format)?);
            field_key += 1;
        }
        result.messages.push(ast::MessageSchema {
            key: ast::MessageKey(message_key),
            id: packet.msg,
            fields,
        });
    }
    Ok(result)
}

/// Parse a schema document from a string.
pub fn parse_inline(
    sources: &mut ast::SourceDatabase,
    name: &str,
    source: String,
) -> Result<ast::File, Diagnostic<ast::FileId>> {
    let file = sources.add(name.to_owned(), source.clone());
    let document = serde_yaml::from_str::<document::Document>(&source).map_err(|e| {
        let diagnostic = Diagnostic::error()
            .with_message(format!("failed to parse input file '{}': {}", name, e));
        match e.location() {
            Some(location) => diagnostic
                .with_labels(vec![Label::primary(file, location.index()..location.index())]),
            None => diagnostic,
        }
    })?;
    convert_document(file, document).map_err(|e| Diagnostic::error().with_message(e))
}

/// Parse a new schema document from the file path.
pub fn parse_file(
    sources: &mut ast::SourceDatabase,
    name: &str,
) -> Result<ast::File, Diagnostic<ast::FileId>> {
    let source = std::fs::read_to_string(name).map_err(|e| {
        Diagnostic::error().with_message(format!("failed to read input file '{}': {}", name, e))
    })?;
    parse_inline(sources, name, source)
}
