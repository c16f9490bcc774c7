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

//! Protocol schema parser, analyzer and code generators.

pub mod analyzer;
pub mod ast;
pub mod backends;
pub mod parser;
pub mod resolver;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rust_output_is_deterministic() {
        // The generated code should be deterministic, to avoid unnecessary rebuilds during
        // incremental builds.
        let src = r#"
Protocol:
  path: "5066/message"
  packetlist:
    - msg: PDU1
      format:
        - { id: Type, bytesize: 2 }
        - { id: Vallen, bytesize: 2 }
        - { id: Value, bytesize: Vallen }
    - msg: C_PDU2
      format:
        - { id: Code, type: uint32 }
        - { id: Len, type: uint8 }
        - { id: Data, type: "[]byte", tag: 'bin:"len:Len"' }
        - { id: Stamp, type: uint64 }
    - msg: Ack
      format: []
"#
        .to_owned();

        let mut sources1 = ast::SourceDatabase::new();
        let mut sources2 = ast::SourceDatabase::new();
        let mut sources3 = ast::SourceDatabase::new();

        let file1 = parser::parse_inline(&mut sources1, "foo", src.clone()).unwrap();
        let file2 = parser::parse_inline(&mut sources2, "foo", src.clone()).unwrap();
        let file3 = parser::parse_inline(&mut sources3, "foo", src).unwrap();

        let schema1 = analyzer::analyze(&file1).schema;
        let schema2 = analyzer::analyze(&file2).schema;
        let schema3 = analyzer::analyze(&file3).schema;
        assert_eq!(schema1.messages.len(), 3);

        let result1 = backends::rust::generate(&sources1, file1.file, &schema1);
        let result2 = backends::rust::generate(&sources2, file2.file, &schema2);
        let result3 = backends::rust::generate(&sources3, file3.file, &schema3);

        assert_eq!(result1, result2);
        assert_eq!(result2, result3);

        let json1 = backends::json::generate(&schema1).unwrap();
        let json2 = backends::json::generate(&schema2).unwrap();
        assert_eq!(json1, json2);
    }
}
