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

//! Protocol schema compiler.

use argh::FromArgs;
use codespan_reporting::term::{self, termcolor};

use pduc_compiler::{analyzer, ast, backends, parser};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum OutputFormat {
    Json,
    Rust,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "rust" => Ok(Self::Rust),
            _ => Err(format!("could not parse {input:?}, valid option are 'json', 'rust'.")),
        }
    }
}

#[derive(FromArgs, Debug)]
/// Protocol schema analyzer and generator.
struct Opt {
    #[argh(switch)]
    /// print tool version and exit.
    version: bool,

    #[argh(option, default = "OutputFormat::Rust")]
    /// generate output in this format ("json", "rust").
    /// The output will be printed on stdout in all cases.
    /// The input file is the source schema file.
    output_format: OutputFormat,

    #[argh(option)]
    /// generate tests for the selected output format from the provided file.
    /// This file must point to a JSON formatted file with a list of test vectors.
    /// When this option is provided, the input file must point to the schema
    /// describing the messages of the vectors.
    /// Valid for the output format "rust".
    test_file: Option<String>,

    #[argh(positional)]
    /// input file.
    input_file: Option<String>,

    #[argh(option)]
    /// exclude messages from the generated output.
    exclude_message: Vec<String>,
}

/// Remove messages listed in the input filter.
fn filter_messages(file: ast::File, exclude_messages: &[String]) -> ast::File {
    ast::File {
        messages: file
            .messages
            .into_iter()
            .filter(|message| !exclude_messages.contains(&message.id))
            .collect(),
        ..file
    }
}

fn stderr() -> termcolor::StandardStream {
    termcolor::StandardStream::stderr(termcolor::ColorChoice::Auto)
}

/// Parse and analyze the input file.
/// Diagnostics are printed on stderr.
fn analyze(
    opt: &Opt,
    sources: &mut ast::SourceDatabase,
    input_file: &str,
) -> Result<(ast::FileId, analyzer::Analysis), String> {
    let file = match parser::parse_file(sources, input_file) {
        Ok(file) => file,
        Err(err) => {
            let config = term::Config::default();
            term::emit(&mut stderr().lock(), &config, &*sources, &err)
                .map_err(|err| format!("could not print error: {err}"))?;
            return Err(String::from("Error while parsing input"));
        }
    };
    let file = filter_messages(file, &opt.exclude_message);
    let analysis = analyzer::analyze(&file);
    analysis
        .diagnostics
        .emit(sources, &mut stderr().lock())
        .map_err(|err| format!("could not print analyzer diagnostics: {err}"))?;
    Ok((file.file, analysis))
}

fn generate_backend(opt: &Opt, input_file: &str) -> Result<(), String> {
    let mut sources = ast::SourceDatabase::new();
    let (file, analysis) = analyze(opt, &mut sources, input_file)?;

    // Messages without errors are generated even if the analysis failed.
    match opt.output_format {
        OutputFormat::Json => println!("{}", backends::json::generate(&analysis.schema)?),
        OutputFormat::Rust => {
            println!("{}", backends::rust::generate(&sources, file, &analysis.schema))
        }
    }

    match analysis.diagnostics.has_errors() {
        true => Err(String::from("Analysis failed")),
        false => Ok(()),
    }
}

fn generate_tests(opt: &Opt, test_file: &str, input_file: &str) -> Result<(), String> {
    match opt.output_format {
        OutputFormat::Rust => {
            let mut sources = ast::SourceDatabase::new();
            let (_, analysis) = analyze(opt, &mut sources, input_file)?;
            if analysis.diagnostics.has_errors() {
                return Err(String::from("Analysis failed"));
            }
            println!("{}", backends::rust::test::generate_tests(&analysis.schema, test_file)?);
            Ok(())
        }
        _ => Err(format!(
            "Canonical tests cannot be generated for the format {:?}",
            opt.output_format
        )),
    }
}

fn main() -> Result<(), String> {
    let opt: Opt = argh::from_env();

    if opt.version {
        println!("pduc {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let Some(input_file) = opt.input_file.as_ref() else {
        return Err("No input file is specified".to_owned());
    };

    if let Some(test_file) = opt.test_file.as_ref() {
        generate_tests(&opt, test_file, input_file)?
    } else {
        generate_backend(&opt, input_file)?
    }

    Ok(())
}
