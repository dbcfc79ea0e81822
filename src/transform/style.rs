//! Style stages.
//!
//! Imports between stylesheets become graph edges instead of being inlined
//! here: the bundler concatenates the imported module ahead of the importer,
//! so lifted rules are removed from the text.

use std::sync::LazyLock;

use regex::Regex;

use super::{Import, ModuleTree};

static RE_SASS_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*@(?:import|use|forward)[ \t]+([^;\n]+);?[ \t]*(?:\n|$)").unwrap()
});

static RE_CSS_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)^[ \t]*@import[ \t]+(?:url\([ \t]*)?['"]?([^'") \t;\n]+)['"]?[ \t]*\)?([^;\n]*);?[ \t]*(?:\n|$)"#,
    )
    .unwrap()
});

static RE_QUOTED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"['"]([^'"]+)['"]"#).unwrap());

/// Sass/SCSS: strip line comments and lift `@import`, `@use`, `@forward`.
///
/// A rule is kept as-is when one of its targets is a built-in module
/// (`sass:math`), a `url(..)` or a remote stylesheet.
pub fn parse_sass(bytes: &[u8]) -> Result<ModuleTree, String> {
    let text = decode(bytes)?;
    let text = strip_line_comments(text);

    let mut imports = Vec::new();
    let text = RE_SASS_IMPORT.replace_all(&text, |caps: &regex::Captures<'_>| {
        let targets = &caps[1];
        let specs: Vec<&str> = RE_QUOTED
            .captures_iter(targets)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str())
            .collect();

        let keep = specs.is_empty()
            || targets.contains("url(")
            || specs.iter().any(|s| s.starts_with("sass:") || is_remote(s));
        if keep {
            caps[0].to_string()
        } else {
            imports.extend(specs.into_iter().map(Import::style));
            String::new()
        }
    });

    Ok(ModuleTree {
        text: text.into_owned(),
        imports,
    })
}

/// Plain CSS: lift `@import` rules without media queries.
pub fn parse_css(bytes: &[u8]) -> Result<ModuleTree, String> {
    let text = decode(bytes)?;

    let mut imports = Vec::new();
    let text = RE_CSS_IMPORT.replace_all(text, |caps: &regex::Captures<'_>| {
        let spec = &caps[1];
        let conditional = !caps[2].trim().is_empty();
        if conditional || is_remote(spec) {
            caps[0].to_string()
        } else {
            imports.push(Import::style(spec));
            String::new()
        }
    });

    Ok(ModuleTree {
        text: text.into_owned(),
        imports,
    })
}

/// Remove `//` comments that sit outside strings and block comments.
///
/// A comment starts at line start or after whitespace, so `url(http://..)`
/// survives. Whitespace in front of a removed comment goes with it.
fn strip_line_comments(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut quote = None;
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' {
                i += 2;
                continue;
            }
            if b == q || b == b'\n' {
                quote = None;
            }
            i += 1;
            continue;
        }

        match b {
            b'"' | b'\'' => quote = Some(b),
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = text[i + 2..]
                    .find("*/")
                    .map_or(bytes.len(), |end| i + 2 + end + 2);
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'/')
                && (i == 0 || matches!(bytes[i - 1], b' ' | b'\t' | b'\n')) =>
            {
                out.push_str(text[start..i].trim_end_matches([' ', '\t']));
                i = text[i..].find('\n').map_or(bytes.len(), |end| i + end);
                start = i;
                continue;
            }
            _ => {}
        }
        i += 1;
    }

    out.push_str(&text[start..]);
    out
}

fn decode(bytes: &[u8]) -> Result<&str, String> {
    std::str::from_utf8(bytes).map_err(|e| format!("stylesheet is not valid UTF-8: {e}"))
}

fn is_remote(spec: &str) -> bool {
    spec.starts_with("http://") || spec.starts_with("https://") || spec.starts_with("//")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specs(tree: &ModuleTree) -> Vec<&str> {
        tree.imports.iter().map(|i| i.specifier.as_str()).collect()
    }

    #[test]
    fn test_sass_lifts_imports_and_strips_comments() {
        let src = "// theme\n@import 'variables', 'mixins';\n@use \"sass:math\";\n@forward './tokens';\nbody { color: red; } // trailing\na { background: url(http://x.test/a.png); }\n";
        let tree = parse_sass(src.as_bytes()).unwrap();
        assert_eq!(specs(&tree), vec!["variables", "mixins", "./tokens"]);
        assert!(!tree.text.contains("@import"));
        assert!(!tree.text.contains("@forward"));
        assert!(tree.text.contains("@use \"sass:math\";"));
        assert!(!tree.text.contains("theme"));
        assert!(!tree.text.contains("trailing"));
        assert!(tree.text.contains("url(http://x.test/a.png)"));
        assert!(tree.imports.iter().all(|i| i.kind == crate::transform::ImportKind::Style));
    }

    #[test]
    fn test_sass_comment_markers_inside_strings() {
        let src = "a::before { content: \"a // b\"; } // gone\nb { content: 'it\\'s // here'; }\n/* note // kept */\n";
        let tree = parse_sass(src.as_bytes()).unwrap();
        assert_eq!(
            tree.text,
            "a::before { content: \"a // b\"; }\nb { content: 'it\\'s // here'; }\n/* note // kept */\n"
        );
    }

    #[test]
    fn test_sass_comment_at_end_of_input() {
        let tree = parse_sass(b"@import 'a';\n// last").unwrap();
        assert_eq!(specs(&tree), vec!["a"]);
        assert_eq!(tree.text, "");
    }

    #[test]
    fn test_css_lifts_local_imports_only() {
        let src = "@import url(\"reset.css\");\n@import 'print.css' print;\n@import 'https://fonts.test/a.css';\nbody { margin: 0 }\n";
        let tree = parse_css(src.as_bytes()).unwrap();
        assert_eq!(specs(&tree), vec!["reset.css"]);
        assert!(tree.text.starts_with("@import 'print.css' print;"));
        assert!(tree.text.contains("https://fonts.test/a.css"));
        assert!(tree.text.ends_with("body { margin: 0 }\n"));
    }
}
