//! Script bundle assembly.
//!
//! Every script module of a chunk becomes a function keyed by its module
//! id. Import and export statements are lowered inside that function:
//! imports turn into `__pack_require__(<id>)` calls hoisted to the top of
//! the body, exports into getters on the module's `exports` object. The
//! chunk is wrapped in a small loader that runs the entry last:
//!
//! ```text
//! (function () {
//! var __pack_modules__ = {
//! 1: function (module, exports) { .. },
//! 0: function (module, exports) { .. }
//! };
//! <loader>
//! __pack_require__(0);
//! })();
//! ```
//!
//! Imports of style modules evaluate to an empty object; those modules
//! live in the chunk's stylesheet. A chunk made of one module without any
//! module syntax is emitted verbatim.

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::error::{BuildError, BuildResult};
use crate::graph::{Module, ModuleGraph, ModuleId};
use crate::transform::syntax::{Edit, ImportBinding, ModuleItem, ModuleSyntax, analyze, apply_edits};

const LOADER: &str = r#"var __pack_cache__ = {};
function __pack_require__(id) {
  var cached = __pack_cache__[id];
  if (cached) return cached.exports;
  var module = (__pack_cache__[id] = { exports: {} });
  __pack_modules__[id].call(module.exports, module, module.exports);
  return module.exports;
}
function __pack_export__(exports, getters) {
  Object.defineProperty(exports, "__esModule", { value: true });
  for (var name in getters) {
    Object.defineProperty(exports, name, { enumerable: true, get: getters[name] });
  }
}
function __pack_star__(exports, source) {
  Object.keys(source).forEach(function (name) {
    if (name === "default" || Object.prototype.hasOwnProperty.call(exports, name)) return;
    Object.defineProperty(exports, name, {
      enumerable: true,
      get: function () { return source[name]; }
    });
  });
}
function __pack_interop__(source) {
  return source && source.__esModule ? source["default"] : source;
}
"#;

const DEFAULT_EXPORT: &str = "__pack_default_export__";

/// Assemble the script bundle for `ids` (a chunk's script modules, in
/// dependency order). `None` when there are no script modules.
pub fn bundle_scripts(
    graph: &ModuleGraph,
    ids: &[ModuleId],
    entry: ModuleId,
) -> BuildResult<Option<Vec<u8>>> {
    let Some(&first) = ids.first() else {
        return Ok(None);
    };

    let mut lowered = Vec::with_capacity(ids.len());
    for &id in ids {
        let module = graph.module(id);
        let text = module_text(module)?;
        let syntax = analyze(text).map_err(|cause| bundle_error(module, cause))?;

        if ids.len() == 1 && !syntax.is_esm() && !syntax.has_dependencies() {
            return Ok(Some(graph.module(first).output.code.clone()));
        }
        let body = lower(module, graph, text, &syntax)?;
        lowered.push((id, body));
    }

    let mut out = String::from("(function () {\nvar __pack_modules__ = {\n");
    for (idx, (id, body)) in lowered.iter().enumerate() {
        if idx > 0 {
            out.push_str(",\n");
        }
        out.push_str(&format!("{id}: function (module, exports) {{\n{body}\n}}"));
    }
    out.push_str("\n};\n");
    out.push_str(LOADER);

    // A style entry has no script root; run every script module instead.
    if ids.contains(&entry) {
        out.push_str(&format!("__pack_require__({entry});\n"));
    } else {
        for id in ids {
            out.push_str(&format!("__pack_require__({id});\n"));
        }
    }
    out.push_str("})();\n");
    Ok(Some(out.into_bytes()))
}

fn module_text(module: &Module) -> BuildResult<&str> {
    std::str::from_utf8(&module.output.code)
        .map_err(|e| bundle_error(module, format!("script output is not valid UTF-8: {e}")))
}

fn bundle_error(module: &Module, cause: String) -> BuildError {
    BuildError::Transform {
        path: module.path.clone(),
        stage: "bundle".to_string(),
        cause,
    }
}

/// Rewrite one module body for the loader.
fn lower(
    module: &Module,
    graph: &ModuleGraph,
    text: &str,
    syntax: &ModuleSyntax,
) -> BuildResult<String> {
    let targets: FxHashMap<&str, ModuleId> = module
        .deps
        .iter()
        .map(|dep| (dep.specifier.as_str(), dep.target))
        .collect();
    let load = |specifier: &str| -> BuildResult<String> {
        match targets.get(specifier) {
            Some(&target) if graph.module(target).style => Ok("({})".to_string()),
            Some(&target) => Ok(format!("__pack_require__({target})")),
            None => Err(bundle_error(
                module,
                format!("`{specifier}` was never resolved; the module's rule needs a `script` stage"),
            )),
        }
    };

    let mut edits = Vec::new();
    let mut getters: Vec<(String, String)> = Vec::new();
    // Hoisted statements, in source order.
    let mut imports: Vec<String> = Vec::new();

    if let Some(span) = syntax.hashbang {
        edits.push(Edit::remove(span));
    }

    for (n, item) in syntax.items.iter().enumerate() {
        let var = format!("__pack_import_{n}__");
        match item {
            ModuleItem::Import {
                span,
                source,
                bindings,
            } => {
                edits.push(Edit::remove(*span));
                let required = load(source)?;
                if bindings.is_empty() {
                    imports.push(format!("{required};"));
                    continue;
                }
                imports.push(format!("var {var} = {required};"));
                for binding in bindings {
                    imports.push(match binding {
                        ImportBinding::Default(local) => {
                            format!("var {local} = __pack_interop__({var});")
                        }
                        ImportBinding::Namespace(local) => format!("var {local} = {var};"),
                        ImportBinding::Named { imported, local } => {
                            format!("var {local} = {var}[{}];", quote(imported))
                        }
                    });
                }
            }
            ModuleItem::ExportDeclaration { keyword, names } => {
                edits.push(Edit::remove(*keyword));
                getters.extend(names.iter().map(|name| (name.clone(), name.clone())));
            }
            ModuleItem::ExportLocal { span, names } => {
                edits.push(Edit::remove(*span));
                getters.extend(names.iter().cloned());
            }
            ModuleItem::ExportFrom {
                span,
                source,
                names,
            } => {
                edits.push(Edit::remove(*span));
                imports.push(format!("var {var} = {};", load(source)?));
                getters.extend(names.iter().map(|(exported, imported)| {
                    let value = if imported == "*" {
                        var.clone()
                    } else {
                        format!("{var}[{}]", quote(imported))
                    };
                    (exported.clone(), value)
                }));
            }
            ModuleItem::ExportAll { span, source } => {
                edits.push(Edit::remove(*span));
                imports.push(format!("__pack_star__(exports, {});", load(source)?));
            }
            ModuleItem::ExportDefaultDeclaration { keyword, local } => {
                edits.push(Edit::remove(*keyword));
                getters.push(("default".to_string(), local.clone()));
            }
            ModuleItem::ExportDefaultValue { span, value } => {
                edits.push(Edit::new(
                    oxc::span::Span::new(span.start, value.start),
                    format!("var {DEFAULT_EXPORT} = ("),
                ));
                edits.push(Edit::new(oxc::span::Span::new(value.end, span.end), ");"));
                getters.push(("default".to_string(), DEFAULT_EXPORT.to_string()));
            }
        }
    }

    for call in &syntax.calls {
        let required = load(&call.source)?;
        let replacement = if call.dynamic {
            format!("Promise.resolve().then(function () {{ return {required}; }})")
        } else {
            required
        };
        edits.push(Edit::new(call.span, replacement));
    }

    let mut prologue = String::new();
    if syntax.is_esm() {
        prologue.push_str("\"use strict\";\n");
    }
    if syntax.items.iter().any(ModuleItem::is_export) {
        let getters: Vec<String> = getters
            .iter()
            .map(|(name, value)| format!("{}: function () {{ return {value}; }}", quote(name)))
            .collect();
        prologue.push_str(&format!("__pack_export__(exports, {{ {} }});\n", getters.join(", ")));
    }
    for line in imports {
        prologue.push_str(&line);
        prologue.push('\n');
    }

    Ok(format!("{prologue}{}", apply_edits(text, edits)))
}

/// A JavaScript string literal; JSON string syntax is valid JavaScript.
fn quote(name: &str) -> String {
    Value::String(name.to_string()).to_string()
}
