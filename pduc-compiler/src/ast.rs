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

//! In-memory representation of a parsed protocol schema.

use codespan_reporting::files;
use serde::Serialize;
use std::fmt;

/// File identifier.
/// References a source file in the source database.
pub type FileId = usize;

/// Source database.
/// Stores the source file contents for reference.
pub type SourceDatabase = files::SimpleFiles<String, String>;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageKey(pub usize);

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldKey(pub usize);

/// Declared type of a field, before resolution.
///
/// The two schema dialects are unified here: a symbolic `type` token,
/// or an explicit `bytesize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TypeToken {
    Symbolic(String),
    Width(i64),
    Unspecified,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldSchema {
    /// Unique identifier used to refer to the AST node in
    /// compilation environments.
    #[serde(skip_serializing)]
    pub key: FieldKey,
    pub id: String,
    #[serde(rename = "type")]
    pub type_: TypeToken,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Name of the field whose decoded value gives the byte length
    /// of this field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length_ref: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageSchema {
    #[serde(skip_serializing)]
    pub key: MessageKey,
    pub id: String,
    pub fields: Vec<FieldSchema>,
}

#[derive(Debug, Clone, Serialize)]
pub struct File {
    #[serde(skip_serializing)]
    pub file: FileId,
    /// Output namespace of the generated code.
    pub path: String,
    pub messages: Vec<MessageSchema>,
}

impl fmt::Display for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeToken::Symbolic(token) => write!(f, "type `{token}`"),
            TypeToken::Width(width) => write!(f, "bytesize {width}"),
            TypeToken::Unspecified => write!(f, "no type"),
        }
    }
}

impl Eq for FieldSchema {}
impl PartialEq for FieldSchema {
    fn eq(&self, other: &Self) -> bool {
        // Implement structural equality, leave out key.
        self.id == other.id
            && self.type_ == other.type_
            && self.tag == other.tag
            && self.length_ref == other.length_ref
    }
}

impl Eq for MessageSchema {}
impl PartialEq for MessageSchema {
    fn eq(&self, other: &Self) -> bool {
        // Implement structural equality, leave out key.
        self.id == other.id && self.fields == other.fields
    }
}

impl Eq for File {}
impl PartialEq for File {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.messages == other.messages
    }
}

impl File {
    pub fn new(file: FileId, path: String) -> File {
        File { file, path, messages: vec![] }
    }

    pub fn message(&self, id: &str) -> Option<&MessageSchema> {
        self.messages.iter().find(|message| message.id == id)
    }
}

impl MessageSchema {
    pub fn field(&self, id: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|field| field.id == id)
    }
}
