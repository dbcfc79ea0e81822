//! Script syntax read from the oxc AST.
//!
//! Only what bundling needs is kept: every import/export statement with
//! the names it binds, and every `require('..')` or `import('..')` call
//! with a literal specifier. All spans are byte offsets into the analyzed
//! text, so callers rewrite the text with [`apply_edits`] instead of
//! printing a new tree.

use std::collections::BTreeMap;

use oxc::allocator::Allocator;
use oxc::ast::ast::{
    Argument, CallExpression, Declaration, ExportDefaultDeclarationKind, Expression,
    IdentifierReference, ImportDeclarationSpecifier, ImportExpression, ObjectProperty, Program,
    StaticMemberExpression, Statement,
};
use oxc::ast_visit::{Visit, walk};
use oxc::parser::Parser;
use oxc::span::{GetSpan, SourceType, Span};

// ============================================================================
// Module syntax
// ============================================================================

/// A name bound by an import statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportBinding {
    /// `import local from '..'`
    Default(String),
    /// `import * as local from '..'`
    Namespace(String),
    /// `import { imported as local } from '..'`
    Named { imported: String, local: String },
}

/// One top-level import or export statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleItem {
    /// `import .. from '..'` and bare `import '..'`.
    Import {
        span: Span,
        source: String,
        bindings: Vec<ImportBinding>,
    },
    /// `export` in front of a declaration. `keyword` runs up to the
    /// declaration; `names` are the bindings it declares.
    ExportDeclaration { keyword: Span, names: Vec<String> },
    /// `export { local as exported }`, as `(exported, local)` pairs.
    ExportLocal {
        span: Span,
        names: Vec<(String, String)>,
    },
    /// `export { imported as exported } from '..'` and `export * as ns
    /// from '..'`, as `(exported, imported)` pairs; a namespace re-export
    /// imports `*`.
    ExportFrom {
        span: Span,
        source: String,
        names: Vec<(String, String)>,
    },
    /// `export * from '..'`
    ExportAll { span: Span, source: String },
    /// `export default function name() {}` or a named class.
    ExportDefaultDeclaration { keyword: Span, local: String },
    /// `export default <expression>` and anonymous functions or classes.
    ExportDefaultValue { span: Span, value: Span },
}

impl ModuleItem {
    fn source(&self) -> Option<(u32, &str)> {
        match self {
            Self::Import { span, source, .. }
            | Self::ExportFrom { span, source, .. }
            | Self::ExportAll { span, source } => Some((span.start, source)),
            _ => None,
        }
    }

    pub fn is_export(&self) -> bool {
        !matches!(self, Self::Import { .. })
    }
}

/// A `require('..')` or dynamic `import('..')` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub span: Span,
    pub source: String,
    pub dynamic: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleSyntax {
    /// Top-level import/export statements in source order.
    pub items: Vec<ModuleItem>,
    /// Loader calls in source order.
    pub calls: Vec<CallSite>,
    pub hashbang: Option<Span>,
}

impl ModuleSyntax {
    /// Whether the text uses ES module syntax.
    pub fn is_esm(&self) -> bool {
        !self.items.is_empty()
    }

    /// Whether the text refers to other modules at all.
    pub fn has_dependencies(&self) -> bool {
        self.items.iter().any(|item| item.source().is_some()) || !self.calls.is_empty()
    }

    /// Specifiers in source order, each listed at its first occurrence.
    pub fn specifiers(&self) -> Vec<String> {
        let mut found: Vec<(u32, &str)> = self
            .items
            .iter()
            .filter_map(ModuleItem::source)
            .chain(self.calls.iter().map(|c| (c.span.start, c.source.as_str())))
            .collect();
        found.sort_by_key(|&(offset, _)| offset);

        let mut specifiers: Vec<String> = Vec::with_capacity(found.len());
        for (_, spec) in found {
            if !specifiers.iter().any(|s| s == spec) {
                specifiers.push(spec.to_string());
            }
        }
        specifiers
    }
}

/// Parse `text` and collect its module syntax.
///
/// The text is parsed as a module when it contains import or export
/// statements and as a classic script otherwise.
pub fn analyze(text: &str) -> Result<ModuleSyntax, String> {
    with_program(text, |program| {
        let mut syntax = ModuleSyntax {
            hashbang: program.hashbang.as_ref().map(|h| h.span),
            ..ModuleSyntax::default()
        };
        for statement in &program.body {
            if let Some(item) = module_item(statement) {
                syntax.items.push(item);
            }
        }
        let mut calls = CallCollector::default();
        calls.visit_program(program);
        syntax.calls = calls.calls;
        syntax
    })
}

fn with_program<T>(text: &str, f: impl FnOnce(&Program<'_>) -> T) -> Result<T, String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, text, SourceType::unambiguous()).parse();
    if let Some(error) = ret.errors.first() {
        return Err(format!("syntax error: {error}"));
    }
    Ok(f(&ret.program))
}

fn module_item(statement: &Statement<'_>) -> Option<ModuleItem> {
    let item = match statement {
        Statement::ImportDeclaration(decl) => ModuleItem::Import {
            span: decl.span,
            source: decl.source.value.to_string(),
            bindings: decl
                .specifiers
                .iter()
                .flatten()
                .map(|spec| match spec {
                    ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => {
                        ImportBinding::Default(s.local.name.to_string())
                    }
                    ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => {
                        ImportBinding::Namespace(s.local.name.to_string())
                    }
                    ImportDeclarationSpecifier::ImportSpecifier(s) => ImportBinding::Named {
                        imported: s.imported.name().to_string(),
                        local: s.local.name.to_string(),
                    },
                })
                .collect(),
        },
        Statement::ExportNamedDeclaration(decl) => {
            let pairs = || {
                decl.specifiers
                    .iter()
                    .map(|s| (s.exported.name().to_string(), s.local.name().to_string()))
                    .collect()
            };
            match (&decl.declaration, &decl.source) {
                (Some(declaration), _) => ModuleItem::ExportDeclaration {
                    keyword: Span::new(decl.span.start, declaration.span().start),
                    names: declared_names(declaration),
                },
                (None, Some(source)) => ModuleItem::ExportFrom {
                    span: decl.span,
                    source: source.value.to_string(),
                    names: pairs(),
                },
                (None, None) => ModuleItem::ExportLocal {
                    span: decl.span,
                    names: pairs(),
                },
            }
        }
        Statement::ExportAllDeclaration(decl) => match &decl.exported {
            Some(exported) => ModuleItem::ExportFrom {
                span: decl.span,
                source: decl.source.value.to_string(),
                names: vec![(exported.name().to_string(), "*".to_string())],
            },
            None => ModuleItem::ExportAll {
                span: decl.span,
                source: decl.source.value.to_string(),
            },
        },
        Statement::ExportDefaultDeclaration(decl) => {
            let named = match &decl.declaration {
                ExportDefaultDeclarationKind::FunctionDeclaration(f) => {
                    f.id.as_ref().map(|id| (f.span.start, id.name.to_string()))
                }
                ExportDefaultDeclarationKind::ClassDeclaration(c) => {
                    c.id.as_ref().map(|id| (c.span.start, id.name.to_string()))
                }
                _ => None,
            };
            match named {
                Some((start, local)) => ModuleItem::ExportDefaultDeclaration {
                    keyword: Span::new(decl.span.start, start),
                    local,
                },
                None => ModuleItem::ExportDefaultValue {
                    span: decl.span,
                    value: decl.declaration.span(),
                },
            }
        }
        _ => return None,
    };
    Some(item)
}

fn declared_names(declaration: &Declaration<'_>) -> Vec<String> {
    match declaration {
        Declaration::VariableDeclaration(var) => var
            .declarations
            .iter()
            .flat_map(|d| d.id.get_binding_identifiers())
            .map(|id| id.name.to_string())
            .collect(),
        other => other.id().map(|id| vec![id.name.to_string()]).unwrap_or_default(),
    }
}

#[derive(Default)]
struct CallCollector {
    calls: Vec<CallSite>,
}

impl<'a> Visit<'a> for CallCollector {
    fn visit_call_expression(&mut self, it: &CallExpression<'a>) {
        if let Expression::Identifier(callee) = &it.callee
            && callee.name == "require"
            && let [Argument::StringLiteral(source)] = &it.arguments[..]
        {
            self.calls.push(CallSite {
                span: it.span,
                source: source.value.to_string(),
                dynamic: false,
            });
            return;
        }
        walk::walk_call_expression(self, it);
    }

    fn visit_import_expression(&mut self, it: &ImportExpression<'a>) {
        if let Expression::StringLiteral(source) = &it.source {
            self.calls.push(CallSite {
                span: it.span,
                source: source.value.to_string(),
                dynamic: true,
            });
            return;
        }
        walk::walk_import_expression(self, it);
    }
}

// ============================================================================
// Text edits
// ============================================================================

/// Replace `span` with `text`. An empty span inserts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub span: Span,
    pub text: String,
}

impl Edit {
    pub fn new(span: Span, text: impl Into<String>) -> Self {
        Self {
            span,
            text: text.into(),
        }
    }

    pub fn remove(span: Span) -> Self {
        Self::new(span, "")
    }
}

/// Apply non-overlapping edits to `text`.
pub fn apply_edits(text: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|e| (e.span.start, e.span.end));

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for edit in edits {
        let (start, end) = (edit.span.start as usize, edit.span.end as usize);
        out.push_str(&text[last..start]);
        out.push_str(&edit.text);
        last = end;
    }
    out.push_str(&text[last..]);
    out
}

// ============================================================================
// Compile-time definitions
// ============================================================================

/// Replace references to each defined name with its literal source text.
///
/// Keys are identifiers (`DEBUG`) or dotted member paths
/// (`process.env.NODE_ENV`). Only references are replaced: property names,
/// string contents and comments stay as they are.
pub fn define(text: &str, defs: &BTreeMap<String, String>) -> Result<String, String> {
    if defs.is_empty() {
        return Ok(text.to_string());
    }
    let edits = with_program(text, |program| {
        let mut replacer = DefineReplacer {
            defs,
            edits: Vec::new(),
        };
        replacer.visit_program(program);
        replacer.edits
    })?;
    Ok(apply_edits(text, edits))
}

struct DefineReplacer<'d> {
    defs: &'d BTreeMap<String, String>,
    edits: Vec<Edit>,
}

impl<'a> Visit<'a> for DefineReplacer<'_> {
    fn visit_identifier_reference(&mut self, it: &IdentifierReference<'a>) {
        if let Some(value) = self.defs.get(it.name.as_str()) {
            self.edits.push(Edit::new(it.span, value.clone()));
        }
    }

    fn visit_static_member_expression(&mut self, it: &StaticMemberExpression<'a>) {
        if let Some(object) = dotted(&it.object)
            && let Some(value) = self.defs.get(&format!("{object}.{}", it.property.name))
        {
            self.edits.push(Edit::new(it.span, value.clone()));
            return;
        }
        walk::walk_static_member_expression(self, it);
    }

    fn visit_object_property(&mut self, it: &ObjectProperty<'a>) {
        // `{ DEBUG }` needs its key spelled out once the value is replaced
        if it.shorthand
            && let Expression::Identifier(id) = &it.value
            && let Some(value) = self.defs.get(id.name.as_str())
        {
            self.edits
                .push(Edit::new(it.span, format!("{}: {value}", id.name)));
            return;
        }
        walk::walk_object_property(self, it);
    }
}

/// `a.b.c` for a chain of plain member accesses on an identifier.
fn dotted(expr: &Expression<'_>) -> Option<String> {
    match expr {
        Expression::Identifier(id) => Some(id.name.to_string()),
        Expression::StaticMemberExpression(member) if !member.optional => {
            Some(format!("{}.{}", dotted(&member.object)?, member.property.name))
        }
        _ => None,
    }
}
