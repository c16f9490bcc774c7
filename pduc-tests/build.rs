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

//! Generate the unit tests for the canonical test vectors.

use pduc_compiler::{analyzer, ast, backends, parser};
use std::env;
use std::fs;
use std::path::Path;

fn main() {
    let schema_file = "../demos/tlv.yaml";
    let vectors_file = "../demos/tlv_vectors.json";
    println!("cargo:rerun-if-changed={schema_file}");
    println!("cargo:rerun-if-changed={vectors_file}");

    let mut sources = ast::SourceDatabase::new();
    let file = parser::parse_file(&mut sources, schema_file)
        .unwrap_or_else(|err| panic!("could not parse {schema_file}: {}", err.message));
    let analysis = analyzer::analyze(&file);
    assert!(!analysis.diagnostics.has_errors(), "{schema_file} has errors");

    let tests = backends::rust::test::generate_tests(&analysis.schema, vectors_file)
        .unwrap_or_else(|err| panic!("could not generate tests: {err}"));
    let out_dir = env::var("OUT_DIR").expect("OUT_DIR is not set");
    fs::write(Path::new(&out_dir).join("tlv_vectors.rs"), tests)
        .expect("could not write generated tests");
}
