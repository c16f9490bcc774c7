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

use codespan_reporting::diagnostic::{Diagnostic, Severity};
use codespan_reporting::files;
use codespan_reporting::term;
use codespan_reporting::term::termcolor;
use heck::ToSnakeCase;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::ast::*;
use crate::resolver::{self, ResolvedType};

/// List of unique errors and warnings reported as analyzer diagnostics.
#[repr(u16)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    DuplicateMessageIdentifier = 1,
    InvalidMessageIdentifier = 2,
    DuplicateFieldIdentifier = 3,
    InvalidFieldIdentifier = 4,
    UnresolvedType = 5,
    UnresolvedWidth = 6,
    UnspecifiedType = 7,
    MissingLengthReference = 8,
    UndeclaredLengthIdentifier = 9,
    ForwardLengthReference = 10,
    InvalidLengthIdentifier = 11,
    UnexpectedLengthReference = 12,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "E{}", *self as u16)
    }
}

impl From<ErrorCode> for String {
    fn from(code: ErrorCode) -> Self {
        format!("{}", code)
    }
}

/// Aggregate analyzer diagnostics.
#[derive(Debug, Default)]
pub struct Diagnostics {
    pub diagnostics: Vec<Diagnostic<FileId>>,
}

/// Index of a field within its message.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct FieldIndex(pub usize);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    /// Identifier declared in the schema.
    pub id: String,
    /// Name of the generated struct field.
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ResolvedType,
    /// Earlier scalar field holding the byte length of this field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<FieldIndex>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub id: String,
    /// Name of the generated struct.
    pub name: String,
    pub fields: Vec<Field>,
}

/// Resolved schema: the messages that passed analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schema {
    pub path: String,
    pub messages: Vec<Message>,
}

/// Outcome of the analysis. Messages with errors are left out of
/// the schema, the others are still available for generation.
#[derive(Debug)]
pub struct Analysis {
    pub schema: Schema,
    pub diagnostics: Diagnostics,
}

impl Diagnostics {
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    fn push(&mut self, diagnostic: Diagnostic<FileId>) {
        self.diagnostics.push(diagnostic)
    }

    fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic<FileId>> {
        self.diagnostics.iter().filter(|d| matches!(d.severity, Severity::Error | Severity::Bug))
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic<FileId>> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Warning)
    }

    pub fn emit(
        &self,
        sources: &SourceDatabase,
        writer: &mut dyn termcolor::WriteColor,
    ) -> Result<(), files::Error> {
        let config = term::Config::default();
        for d in self.diagnostics.iter() {
            term::emit(writer, &config, sources, d)?;
        }
        Ok(())
    }
}

impl Message {
    pub fn field(&self, index: FieldIndex) -> &Field {
        &self.fields[index.0]
    }

    /// Iterate over the variable-length fields with the scalar field
    /// holding their length.
    pub fn length_fields(&self) -> impl Iterator<Item = (&Field, &Field)> {
        self.fields
            .iter()
            .filter_map(|field| field.length.map(|length| (field, self.field(length))))
    }
}

/// Test if the input can be used verbatim as an identifier in
/// generated code.
fn is_identifier(id: &str) -> bool {
    let mut chars = id.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => (),
        _ => return false,
    }
    id != "_" && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Keywords that cannot be escaped as raw identifiers get a `_`
/// suffix.
fn escape_path_keyword(name: String) -> String {
    match name.as_str() {
        "crate" | "self" | "Self" | "super" => name + "_",
        _ => name,
    }
}

/// Name of the generated struct: the identifier with its first
/// letter capitalized.
pub fn type_name(id: &str) -> String {
    let mut chars = id.chars();
    escape_path_keyword(match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    })
}

/// Name of the generated struct field.
pub fn field_name(id: &str) -> String {
    escape_path_keyword(id.to_snake_case())
}

fn error(code: ErrorCode, message: String) -> Diagnostic<FileId> {
    Diagnostic::error().with_code(code).with_message(message)
}

fn warning(code: ErrorCode, message: String) -> Diagnostic<FileId> {
    Diagnostic::warning().with_code(code).with_message(message)
}

/// Resolve the length reference of a variable-length field.
/// The reference must name an earlier fixed-width scalar field.
fn check_length_ref(
    message: &MessageSchema,
    index: usize,
    length_ref: &str,
    fields: &[Field],
) -> Result<FieldIndex, Diagnostic<FileId>> {
    let field = &message.fields[index];
    let msg = &message.id;
    let id = &field.id;
    match message.fields.iter().position(|other| other.id == length_ref) {
        Some(position) if position < index => {
            let length_field = &fields[position];
            if length_field.ty.is_scalar() {
                Ok(FieldIndex(position))
            } else {
                Err(error(
                    ErrorCode::InvalidLengthIdentifier,
                    format!(
                        "invalid length identifier `{length_ref}` for field `{msg}.{id}`"
                    ),
                )
                .with_notes(vec![format!(
                    "`{length_ref}` has type {}, expected a fixed-width unsigned integer",
                    length_field.ty
                )]))
            }
        }
        Some(_) => Err(error(
            ErrorCode::ForwardLengthReference,
            format!("length identifier `{length_ref}` for field `{msg}.{id}` is not declared before it"),
        )
        .with_notes(vec![
            "hint: the length field must be decoded before the field it describes".to_owned(),
        ])),
        None => {
            let mut diagnostic = error(
                ErrorCode::UndeclaredLengthIdentifier,
                format!("undeclared length identifier `{length_ref}` for field `{msg}.{id}`"),
            );
            if let Some(candidate) = message.fields[..index]
                .iter()
                .find(|other| other.id.eq_ignore_ascii_case(length_ref))
            {
                diagnostic =
                    diagnostic.with_notes(vec![format!("hint: did you mean `{}`?", candidate.id)]);
            }
            Err(diagnostic)
        }
    }
}

/// Resolve the fields of a message.
/// Returns `None` if any error diagnostic was raised for the message.
fn analyze_message(message: &MessageSchema, diagnostics: &mut Diagnostics) -> Option<Message> {
    let errors = diagnostics.error_count();
    let msg = &message.id;

    if !is_identifier(msg) {
        diagnostics.push(error(
            ErrorCode::InvalidMessageIdentifier,
            format!("invalid message identifier `{msg}`"),
        ));
    }

    let mut fields: Vec<Field> = Vec::with_capacity(message.fields.len());
    let mut local_scope = HashMap::new();
    for (index, field) in message.fields.iter().enumerate() {
        let id = &field.id;
        let name = field_name(id);
        if !is_identifier(id) || !is_identifier(&name) {
            diagnostics.push(error(
                ErrorCode::InvalidFieldIdentifier,
                format!("invalid field identifier `{msg}.{id}`"),
            ));
        } else if let Some(prev) = local_scope.insert(name.clone(), field) {
            diagnostics.push(
                error(
                    ErrorCode::DuplicateFieldIdentifier,
                    format!("redeclaration of field identifier `{msg}.{id}`"),
                )
                .with_notes(vec![format!("`{}` is first declared as field `{}`", name, prev.id)]),
            );
        }

        let resolution = resolver::resolve_token(&field.type_);
        if resolution.defaulted {
            let code = match &field.type_ {
                TypeToken::Symbolic(_) => ErrorCode::UnresolvedType,
                TypeToken::Width(_) => ErrorCode::UnresolvedWidth,
                TypeToken::Unspecified => ErrorCode::UnspecifiedType,
            };
            diagnostics.push(
                warning(code, format!("unresolved {} for field `{msg}.{id}`", field.type_))
                    .with_notes(vec![format!("the field defaults to {}", resolution.ty)]),
            );
        }

        let length = match (resolution.ty, &field.length_ref) {
            (ResolvedType::Bytes, Some(length_ref)) => {
                match check_length_ref(message, index, length_ref, &fields) {
                    Ok(length) => Some(length),
                    Err(diagnostic) => {
                        diagnostics.push(diagnostic);
                        None
                    }
                }
            }
            (ResolvedType::Bytes, None) => {
                diagnostics.push(
                    error(
                        ErrorCode::MissingLengthReference,
                        format!("missing length reference for field `{msg}.{id}`"),
                    )
                    .with_notes(vec![
                        "hint: use `bytesize: <field>` or a `len:<field>` tag".to_owned(),
                    ]),
                );
                None
            }
            (ty, Some(length_ref)) => {
                diagnostics.push(
                    error(
                        ErrorCode::UnexpectedLengthReference,
                        format!(
                            "unexpected length reference `{length_ref}` for field `{msg}.{id}`"
                        ),
                    )
                    .with_notes(vec![format!(
                        "only byte_array fields take a length reference, `{id}` has type {ty}"
                    )]),
                );
                None
            }
            (_, None) => None,
        };

        fields.push(Field { id: id.clone(), name, ty: resolution.ty, length });
    }

    (diagnostics.error_count() == errors).then(|| Message {
        id: msg.clone(),
        name: type_name(msg),
        fields,
    })
}

/// Analyzer entry point, resolves every message of the file.
///
/// A message raising errors is reported and left out of the
/// resulting schema; the other messages are unaffected.
pub fn analyze(file: &File) -> Analysis {
    let mut diagnostics: Diagnostics = Default::default();
    let mut messages = vec![];
    let mut scope: HashMap<String, &MessageSchema> = HashMap::new();
    for message in &file.messages {
        if let Some(prev) = scope.get(&type_name(&message.id)) {
            diagnostics.push(
                error(
                    ErrorCode::DuplicateMessageIdentifier,
                    format!("redeclaration of message identifier `{}`", message.id),
                )
                .with_notes(vec![format!("`{}` is first declared here", prev.id)]),
            );
            continue;
        }
        scope.insert(type_name(&message.id), message);
        messages.extend(analyze_message(message, &mut diagnostics));
    }

    Analysis { schema: Schema { path: file.path.clone(), messages }, diagnostics }
}
