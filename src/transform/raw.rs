//! Stages that finish a module in one step: raw text, inline SVG, JSON and
//! auxiliary files.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::{Content, EmittedFile, StageContext};
use crate::utils::path::relative_slash;

static RE_XML_PROLOG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<\?xml.*?\?>|<!DOCTYPE[^>]*>|<!--.*?-->").unwrap());

static RE_BETWEEN_TAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r">[ \t\r\n]+<").unwrap());

/// `export default "<text>";`
pub fn raw(bytes: &[u8]) -> Result<Content, String> {
    let text = std::str::from_utf8(bytes).map_err(|e| format!("not valid UTF-8: {e}"))?;
    Ok(finished(export_string(text)))
}

/// Strip prolog, doctype, comments and inter-tag whitespace, then export
/// the markup as a string.
pub fn svg_inline(bytes: &[u8]) -> Result<Content, String> {
    let text = std::str::from_utf8(bytes).map_err(|e| format!("not valid UTF-8: {e}"))?;
    let text = RE_XML_PROLOG.replace_all(text, "");
    let text = RE_BETWEEN_TAGS.replace_all(&text, "><");
    let text = text.trim();
    if !text.starts_with("<svg") {
        return Err("no <svg> root element".to_string());
    }
    Ok(finished(export_string(text)))
}

/// Validate and re-serialize as `export default <json>;`.
pub fn json(bytes: &[u8]) -> Result<Content, String> {
    let value: serde_json::Value = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
    let code = format!("export default {value};");
    Ok(finished(code))
}

/// Emit the bytes as `{path}{name}.{ext}` relative to the chain's base
/// directory and export that public path.
pub fn file(bytes: Vec<u8>, ctx: &StageContext<'_>) -> Result<Content, String> {
    let path = aux_path(ctx.path, ctx.base)?;
    let code = export_string(&path);
    Ok(Content::Final {
        code: code.into_bytes(),
        emitted: Some(EmittedFile { path, bytes }),
    })
}

/// Output path of an auxiliary file. Files outside `base` keep only their
/// file name.
fn aux_path(path: &Path, base: &Path) -> Result<String, String> {
    let file_name = path
        .file_name()
        .ok_or_else(|| format!("`{}` has no file name", path.display()))?;
    if path.starts_with(base) {
        Ok(relative_slash(path, base))
    } else {
        Ok(file_name.to_string_lossy().into_owned())
    }
}

fn export_string(text: &str) -> String {
    // serde_json string escaping is valid JavaScript string syntax
    let literal = serde_json::Value::String(text.to_string());
    format!("export default {literal};")
}

fn finished(code: String) -> Content {
    Content::Final {
        code: code.into_bytes(),
        emitted: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(content: Content) -> String {
        match content {
            Content::Final { code, .. } => String::from_utf8(code).unwrap(),
            other => panic!("expected final content, got {:?}", other.repr()),
        }
    }

    #[test]
    fn test_raw_escapes_text() {
        let out = code(raw(b"line \"one\"\nline two").unwrap());
        assert_eq!(out, r#"export default "line \"one\"\nline two";"#);
    }

    #[test]
    fn test_svg_inline_cleans_markup() {
        let src = b"<?xml version=\"1.0\"?>\n<!-- icon -->\n<svg viewBox=\"0 0 1 1\">\n  <path d=\"M0 0\"/>\n</svg>\n";
        let out = code(svg_inline(src).unwrap());
        assert_eq!(
            out,
            r#"export default "<svg viewBox=\"0 0 1 1\"><path d=\"M0 0\"/></svg>";"#
        );
        assert!(svg_inline(b"<div></div>").is_err());
    }

    #[test]
    fn test_json_reserializes_and_validates() {
        let out = code(json(b"{ \"b\": 1,\n \"a\": [true, null] }").unwrap());
        assert_eq!(out, r#"export default {"b":1,"a":[true,null]};"#);
        assert!(json(b"{ nope").is_err());
    }

    #[test]
    fn test_file_emits_relative_to_base() {
        let ctx = StageContext {
            path: Path::new("/app/src/img/logo.png"),
            base: Path::new("/app/src"),
        };
        let Content::Final { code, emitted } = file(vec![1, 2, 3], &ctx).unwrap() else {
            panic!("expected final content");
        };
        let emitted = emitted.unwrap();
        assert_eq!(emitted.path, "img/logo.png");
        assert_eq!(emitted.bytes, vec![1, 2, 3]);
        assert_eq!(String::from_utf8(code).unwrap(), r#"export default "img/logo.png";"#);

        let outside = StageContext {
            path: Path::new("/elsewhere/font.woff2"),
            base: Path::new("/app/src"),
        };
        let Content::Final { emitted, .. } = file(vec![], &outside).unwrap() else {
            panic!("expected final content");
        };
        assert_eq!(emitted.unwrap().path, "font.woff2");
    }
}
