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

//! Generate Rust unit tests for canonical test vectors.
//!
//! The test vectors are read from a JSON file shaped as:
//!
//! ```json
//! [{ "message": "PDU1",
//!    "tests": [{ "packed": "01020004aabbccdd",
//!                "unpacked": { "Type": 258, "Vallen": 4, "Value": "aabbccdd" } }] }]
//! ```
//!
//! Scalar values are JSON numbers, byte arrays are hexadecimal
//! strings or arrays of numbers.

use quote::{format_ident, quote};
use serde::Deserialize;

use crate::analyzer;
use crate::backends::rust::ToIdent;
use crate::resolver::ResolvedType;

#[derive(Debug, Deserialize)]
pub struct TestVector {
    pub packed: String,
    pub unpacked: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct MessageVectors {
    pub message: String,
    pub tests: Vec<TestVector>,
}

/// Convert a string of hexadecimal characters into a list of bytes.
fn parse_hex(hex: &str) -> Result<Vec<u8>, String> {
    if hex.len() % 2 != 0 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(format!("invalid hexadecimal string {hex:?}"));
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|err| format!("invalid hexadecimal string {hex:?}: {err}"))
        })
        .collect()
}

/// Convert a list of bytes into a Rust vector of bytes.
///
/// The bytes `[0x80, 0x03]` become `::std::vec![0x80, 0x03]`.
fn bytes_to_vec(bytes: &[u8]) -> proc_macro2::TokenStream {
    let bytes = bytes.iter().map(|byte| {
        syn::parse_str::<syn::LitInt>(&format!("{byte:#04x}")).expect("invalid literal")
    });
    quote! {
        ::std::vec![#(#bytes),*]
    }
}

/// Convert the JSON value of a field into a Rust expression.
fn field_value(
    message: &analyzer::Message,
    field: &analyzer::Field,
    value: &serde_json::Value,
) -> Result<proc_macro2::TokenStream, String> {
    let location = format!("{}.{}", message.id, field.id);
    match (field.ty, value) {
        (ResolvedType::Bytes, serde_json::Value::String(hex)) => {
            Ok(bytes_to_vec(&parse_hex(hex).map_err(|err| format!("{location}: {err}"))?))
        }
        (ResolvedType::Bytes, serde_json::Value::Array(items)) => {
            let bytes = items
                .iter()
                .map(|item| {
                    item.as_u64()
                        .and_then(|byte| u8::try_from(byte).ok())
                        .ok_or_else(|| format!("{location}: invalid byte value {item}"))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(bytes_to_vec(&bytes))
        }
        (ty, serde_json::Value::Number(number)) if ty.is_scalar() => {
            let width = ty.width().unwrap_or_default();
            let max_value = u64::MAX >> (64 - 8 * width);
            match number.as_u64() {
                Some(value) if value <= max_value => {
                    let value = proc_macro2::Literal::u64_unsuffixed(value);
                    Ok(quote! { #value })
                }
                _ => Err(format!("{location}: value {number} does not fit into {ty}")),
            }
        }
        (ty, value) => Err(format!("{location}: unexpected value {value} for {ty} field")),
    }
}

/// Generate the struct literal for the unpacked representation.
fn message_value(
    message: &analyzer::Message,
    unpacked: &serde_json::Value,
) -> Result<proc_macro2::TokenStream, String> {
    let object = unpacked
        .as_object()
        .ok_or_else(|| format!("expected test vector object, found: {unpacked}"))?;
    if let Some(key) = object.keys().find(|key| !message.fields.iter().any(|f| &&f.id == key)) {
        return Err(format!("message `{}` has no field `{key}`", message.id));
    }
    let name = message.name.as_str().to_ident();
    let fields = message
        .fields
        .iter()
        .map(|field| -> Result<proc_macro2::TokenStream, String> {
            let id = field.name.as_str().to_ident();
            let value = object
                .get(&field.id)
                .ok_or_else(|| format!("missing value for field `{}.{}`", message.id, field.id))?;
            let value = field_value(message, field, value)?;
            Ok(quote! { #id: #value })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(quote! {
        #name { #(#fields),* }
    })
}

/// Generate unit tests for the test vectors, checking both
/// directions of the codec for every vector.
pub fn generate_unit_tests(
    schema: &analyzer::Schema,
    vectors: &[MessageVectors],
) -> Result<String, String> {
    let mut tests = Vec::new();
    for vectors in vectors {
        let message = schema
            .messages
            .iter()
            .find(|message| message.id == vectors.message)
            .ok_or_else(|| format!("unknown message `{}`", vectors.message))?;
        for (i, test_vector) in vectors.tests.iter().enumerate() {
            let packed = parse_hex(&test_vector.packed)?;
            let decode_test_name = format_ident!(
                "test_decode_{}_vector_{}_0x{}",
                message.name,
                i + 1,
                test_vector.packed
            );
            let encode_test_name = format_ident!(
                "test_encode_{}_vector_{}_0x{}",
                message.name,
                i + 1,
                test_vector.packed
            );
            let packed = bytes_to_vec(&packed);
            let name = message.name.as_str().to_ident();
            let value = message_value(message, &test_vector.unpacked)?;

            tests.push(quote! {
                #[test]
                fn #decode_test_name() {
                    let packed: ::std::vec::Vec<u8> = #packed;
                    let actual = #name::decode_full(&packed).unwrap();
                    assert_eq!(actual.encoded_len(), packed.len());
                    assert_eq!(actual, #value);
                }

                #[test]
                fn #encode_test_name() {
                    let message = #value;
                    let packed: ::std::vec::Vec<u8> = #packed;
                    assert_eq!(message.encoded_len(), packed.len());
                    assert_eq!(message.encode_to_vec(), ::core::result::Result::Ok(packed));
                }
            });
        }
    }

    let code = quote! {
        #[allow(warnings, missing_docs)]
        #[cfg(test)]
        mod test {
            use ::pduc_runtime::Message;
            use super::*;

            #(#tests)*
        }
    };
    let syntax_tree = syn::parse2::<syn::File>(code).expect("Could not parse code");
    Ok(prettyplease::unparse(&syntax_tree))
}

/// Read the test vectors from `input_file` and generate the
/// unit tests.
pub fn generate_tests(schema: &analyzer::Schema, input_file: &str) -> Result<String, String> {
    let data = std::fs::read_to_string(input_file)
        .map_err(|err| format!("could not read {input_file}: {err}"))?;
    let vectors: Vec<MessageVectors> = serde_json::from_str(&data)
        .map_err(|err| format!("could not parse test vectors from {input_file}: {err}"))?;
    generate_unit_tests(schema, &vectors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ast, parser};

    fn schema() -> analyzer::Schema {
        let mut db = ast::SourceDatabase::new();
        let file = parser::parse_inline(
            &mut db,
            "test",
            r#"
Protocol:
  path: p
  packetlist:
    - msg: PDU1
      format:
        - { id: Type, bytesize: 2 }
        - { id: Vallen, bytesize: 1 }
        - { id: Value, bytesize: Vallen }
"#
            .to_owned(),
        )
        .unwrap();
        analyzer::analyze(&file).schema
    }

    fn vectors(json: serde_json::Value) -> Vec<MessageVectors> {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("0a10ff"), Ok(vec![0x0a, 0x10, 0xff]));
        assert_eq!(parse_hex(""), Ok(vec![]));
        assert!(parse_hex("abc").is_err());
        assert!(parse_hex("zz").is_err());
        assert!(parse_hex("+1").is_err());
        assert!(parse_hex("-1").is_err());
        assert!(parse_hex("0x").is_err());
    }

    #[test]
    fn test_generate_unit_tests() {
        let code = generate_unit_tests(
            &schema(),
            &vectors(serde_json::json!([{
                "message": "PDU1",
                "tests": [
                    { "packed": "010202aabb",
                      "unpacked": { "Type": 258, "Vallen": 2, "Value": "aabb" } },
                    { "packed": "00000100",
                      "unpacked": { "Type": 0, "Vallen": 1, "Value": [0] } },
                ]
            }])),
        )
        .unwrap();
        assert!(code.contains("fn test_decode_PDU1_vector_1_0x010202aabb()"), "{code}");
        assert!(code.contains("fn test_encode_PDU1_vector_2_0x00000100()"), "{code}");
        assert!(code.contains("r#type: 258"), "{code}");
        assert!(code.contains("value: ::std::vec![0xaa, 0xbb]"), "{code}");
    }

    #[test]
    fn test_reject_invalid_vectors() {
        let schema = schema();
        let generate = |json| generate_unit_tests(&schema, &vectors(json));
        let err = generate(serde_json::json!([{ "message": "PDU2", "tests": [] }])).unwrap_err();
        assert_eq!(err, "unknown message `PDU2`");
        let err = generate(serde_json::json!([{ "message": "PDU1", "tests": [
            { "packed": "00", "unpacked": { "Type": 0, "Vallen": 0 } }
        ]}]))
        .unwrap_err();
        assert_eq!(err, "missing value for field `PDU1.Value`");
        let err = generate(serde_json::json!([{ "message": "PDU1", "tests": [
            { "packed": "00", "unpacked": { "Type": 0, "Vallen": 256, "Value": "" } }
        ]}]))
        .unwrap_err();
        assert_eq!(err, "PDU1.Vallen: value 256 does not fit into uint8");
        let err = generate(serde_json::json!([{ "message": "PDU1", "tests": [
            { "packed": "00", "unpacked": { "Type": 0, "Vallen": 0, "Value": "", "Extra": 1 } }
        ]}]))
        .unwrap_err();
        assert_eq!(err, "message `PDU1` has no field `Extra`");
        let err = generate(serde_json::json!([{ "message": "PDU1", "tests": [
            { "packed": "+1", "unpacked": { "Type": 0, "Vallen": 0, "Value": "" } }
        ]}]))
        .unwrap_err();
        assert_eq!(err, "invalid hexadecimal string \"+1\"");
    }
}
