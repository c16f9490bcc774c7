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

//! Attribute macros generating message codecs from a protocol schema
//! at build time.

use codespan_reporting::term;
use proc_macro2::TokenStream;
use quote::{format_ident, quote, quote_spanned};
use std::env;
use std::path::Path;
use syn::parse_macro_input;

use pduc_compiler::{analyzer, ast, backends, parser};

/// Render diagnostics without colors.
fn render(
    emit: impl FnOnce(&mut termcolor::Buffer) -> Result<(), codespan_reporting::files::Error>,
) -> String {
    let mut buffer = termcolor::Buffer::no_color();
    match emit(&mut buffer) {
        Ok(()) => String::from_utf8_lossy(buffer.as_slice()).into_owned(),
        Err(err) => format!("error: could not emit diagnostics: {err}"),
    }
}

/// Render a diagnostic as a compile error attached to `span`.
fn diagnostic_error(
    span: proc_macro2::Span,
    emit: impl FnOnce(&mut termcolor::Buffer) -> Result<(), codespan_reporting::files::Error>,
) -> TokenStream {
    syn::Error::new(span, render(emit)).to_compile_error()
}

/// Report analyzer warnings through the `deprecated` lint, the only
/// warning a proc macro can raise on stable Rust.
fn diagnostic_warnings(
    span: proc_macro2::Span,
    sources: &ast::SourceDatabase,
    diagnostics: &analyzer::Diagnostics,
) -> TokenStream {
    let config = term::Config::default();
    let warnings = diagnostics.warnings().enumerate().map(|(index, warning)| {
        let note = render(|buffer| term::emit(buffer, &config, sources, warning));
        let ident = format_ident!("PDUC_WARNING_{}", index, span = span);
        quote_spanned! { span=>
            #[doc(hidden)]
            #[deprecated(note = #note)]
            const #ident: () = ();
            const _: () = #ident;
        }
    });
    quote! { #(#warnings)* }
}

/// Analyze the parsed schema and generate the message items.
fn generate_items(
    span: proc_macro2::Span,
    sources: &ast::SourceDatabase,
    file: Result<ast::File, codespan_reporting::diagnostic::Diagnostic<ast::FileId>>,
) -> TokenStream {
    let file = match file {
        Ok(file) => file,
        Err(err) => {
            return diagnostic_error(span, |buffer| {
                term::emit(buffer, &term::Config::default(), sources, &err)
            })
        }
    };

    let analysis = analyzer::analyze(&file);
    if analysis.diagnostics.has_errors() {
        return diagnostic_error(span, |buffer| analysis.diagnostics.emit(sources, buffer));
    }

    let warnings = diagnostic_warnings(span, sources, &analysis.diagnostics);
    let items = backends::rust::generate_tokens(sources, file.file, &analysis.schema);
    quote! {
        #warnings
        #items
    }
}

/// Splice `items` into the annotated module, keeping the items
/// already declared in the module.
fn splice(input: syn::ItemMod, items: TokenStream) -> TokenStream {
    let mod_ident = input.ident;
    let mod_attrs = input.attrs;
    let mod_vis = input.vis;
    let mod_items = input.content.map(|(_, items)| items).unwrap_or_default();

    quote! {
        #(#mod_attrs)*
        #mod_vis mod #mod_ident {
            #items
            #(#mod_items)*
        }
    }
}

fn protocol_proc_macro(path: syn::LitStr, input: syn::ItemMod) -> TokenStream {
    // Locate the source schema file.
    let root = env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".into());
    let Some(relative_path) =
        [Path::new(&root).join(path.value()), Path::new(&root).join("src").join(path.value())]
            .into_iter()
            .find(|path| path.exists())
    else {
        return syn::Error::new(path.span(), "error: unable to find file").to_compile_error();
    };
    let Some(relative_path) = relative_path.to_str().map(str::to_owned) else {
        return syn::Error::new(path.span(), "error: non UTF-8 file path").to_compile_error();
    };

    let mut sources = ast::SourceDatabase::new();
    let file = parser::parse_file(&mut sources, &relative_path);
    let items = generate_items(path.span(), &sources, file);

    splice(
        input,
        quote! {
            // Generate an include_bytes! statement to force a dependency
            // on the source schema file.
            const _: &[u8] = include_bytes!(#relative_path);
            #items
        },
    )
}

fn protocol_inline_proc_macro(source: syn::LitStr, input: syn::ItemMod) -> TokenStream {
    let mut sources = ast::SourceDatabase::new();
    let name = format!("{}.yaml", input.ident);
    let file = parser::parse_inline(&mut sources, &name, source.value());
    let items = generate_items(source.span(), &sources, file);
    splice(input, items)
}

/// Generate the message codecs described by a schema file.
///
/// The path is relative to the crate root, or to its `src`
/// directory. Schema errors fail the build; schema warnings are
/// reported as uses of a deprecated item.
///
/// ```ignore
/// #[protocol("schemas/message.yaml")]
/// mod message {}
/// ```
#[proc_macro_attribute]
pub fn protocol(
    attr: proc_macro::TokenStream,
    input: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    let attr = parse_macro_input!(attr as syn::LitStr);
    let input = parse_macro_input!(input as syn::ItemMod);
    protocol_proc_macro(attr, input).into()
}

/// Generate the message codecs described by an inline schema.
#[proc_macro_attribute]
pub fn protocol_inline(
    attr: proc_macro::TokenStream,
    input: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    let attr = parse_macro_input!(attr as syn::LitStr);
    let input = parse_macro_input!(input as syn::ItemMod);
    protocol_inline_proc_macro(attr, input).into()
}
