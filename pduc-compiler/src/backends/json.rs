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

//! JSON compiler backend.

use crate::analyzer;

/// Turn the resolved schema into a JSON representation.
pub fn generate(schema: &analyzer::Schema) -> Result<String, String> {
    serde_json::to_string_pretty(schema)
        .map_err(|err| format!("could not JSON serialize schema: {err}"))
}
