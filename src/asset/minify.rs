//! Bundle minification.
//!
//! Uses oxc for scripts and lightningcss for stylesheets. Production only.
//! Output that fails to parse is kept as-is so the emitted bundle stays
//! valid.

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier as OxcMinifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

use crate::config::MinifyConfig;
use crate::log;

#[derive(Debug, Clone, Copy)]
pub struct Minifier {
    keep_names: bool,
}

impl Minifier {
    pub fn new(config: &MinifyConfig) -> Self {
        Self {
            keep_names: config.keep_names,
        }
    }

    /// Minify a script bundle, falling back to the input on parse failure.
    pub fn script(&self, name: &str, code: Vec<u8>) -> Vec<u8> {
        let Ok(source) = std::str::from_utf8(&code) else {
            log!("warning"; "{}: script is not UTF-8, left unminified", name);
            return code;
        };
        match minify_js(source, self.keep_names) {
            Some(min) => min.into_bytes(),
            None => {
                log!("warning"; "{}: script failed to parse, left unminified", name);
                code
            }
        }
    }

    /// Minify a stylesheet, falling back to the input on parse failure.
    pub fn style(&self, name: &str, code: Vec<u8>) -> Vec<u8> {
        let Ok(source) = std::str::from_utf8(&code) else {
            log!("warning"; "{}: stylesheet is not UTF-8, left unminified", name);
            return code;
        };
        match minify_css(source) {
            Some(min) => min.into_bytes(),
            None => {
                log!("warning"; "{}: stylesheet failed to parse, left unminified", name);
                code
            }
        }
    }
}

/// Minify JavaScript source code.
///
/// Bundles are classic scripts; text with import or export statements is
/// parsed as a module. With `keep_names`, identifiers are not mangled, so code that looks up
/// functions or classes by name keeps working.
pub fn minify_js(source: &str, keep_names: bool) -> Option<String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::unambiguous()).parse();
    if !ret.errors.is_empty() {
        return None;
    }
    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: (!keep_names).then(MangleOptions::default),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = OxcMinifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Some(code)
}

/// Minify CSS source code.
pub fn minify_css(source: &str) -> Option<String> {
    let stylesheet = StyleSheet::parse(source, ParserOptions::default()).ok()?;
    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .ok()?;
    Some(result.code)
}
