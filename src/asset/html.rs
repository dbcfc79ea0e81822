//! HTML pages with injected chunk tags.

use std::collections::BTreeMap;
use std::fs;

use super::AssetEmitter;
use crate::config::HtmlPage;
use crate::error::{BuildError, BuildResult};

/// Render `page` against the chunk assets emitted so far and write it.
///
/// `assets` maps manifest keys (`{chunk}.js`, `{chunk}.css`) to output
/// names. Chunks without a script or style asset contribute no tag.
pub fn emit_page(
    page: &HtmlPage,
    assets: &BTreeMap<String, String>,
    emitter: &mut AssetEmitter,
) -> BuildResult<String> {
    let template = fs::read_to_string(&page.template)
        .map_err(|e| BuildError::read(&page.template, e))?;

    let prefix = "../".repeat(page.output.matches('/').count());
    let lookup = |ext: &str| {
        page.chunks
            .iter()
            .filter_map(|chunk| assets.get(&format!("{chunk}.{ext}")))
            .map(|name| format!("{prefix}{name}"))
            .collect::<Vec<_>>()
    };

    let html = inject(&template, &lookup("css"), &lookup("js"));
    emitter.emit_fixed(&page.output, html.as_bytes())
}

/// Insert stylesheet links before `</head>` and scripts before `</body>`.
///
/// A missing closing tag means the tags are appended to the document.
pub fn inject(template: &str, styles: &[String], scripts: &[String]) -> String {
    let links: String = styles
        .iter()
        .map(|href| format!("<link rel=\"stylesheet\" href=\"{href}\">\n"))
        .collect();
    let tags: String = scripts
        .iter()
        .map(|src| format!("<script src=\"{src}\"></script>\n"))
        .collect();

    let html = insert_before(template, "</head>", &links);
    insert_before(&html, "</body>", &tags)
}

fn insert_before(html: &str, closing: &str, content: &str) -> String {
    if content.is_empty() {
        return html.to_string();
    }
    // ASCII lowercasing keeps byte offsets intact
    match html.to_ascii_lowercase().rfind(closing) {
        Some(pos) => format!("{}{}{}", &html[..pos], content, &html[pos..]),
        None => {
            let mut out = html.to_string();
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(content);
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testutil::write;
    use tempfile::TempDir;

    #[test]
    fn test_inject_before_closing_tags() {
        let html = inject(
            "<html><head><title>x</title></head><BODY><p>hi</p></BODY></html>",
            &["main.css".into()],
            &["main.js".into()],
        );
        assert_eq!(
            html,
            "<html><head><title>x</title><link rel=\"stylesheet\" href=\"main.css\">\n</head>\
             <BODY><p>hi</p><script src=\"main.js\"></script>\n</BODY></html>"
        );
    }

    #[test]
    fn test_inject_appends_without_body() {
        let html = inject("<div id=\"app\"></div>", &[], &["app.js".into()]);
        assert_eq!(html, "<div id=\"app\"></div>\n<script src=\"app.js\"></script>\n");
    }

    #[test]
    fn test_emit_page_uses_chunk_assets_in_order() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let template = write(src.path(), "html.html", "<head></head><body></body>");

        let page = HtmlPage {
            template,
            output: "docs/index.html".into(),
            chunks: vec!["vendor".into(), "main".into()],
        };
        let assets = BTreeMap::from([
            ("main.js".to_string(), "main.bundle.aaa.js".to_string()),
            ("main.css".to_string(), "main.bundle.bbb.css".to_string()),
            ("vendor.js".to_string(), "vendor.bundle.ccc.js".to_string()),
        ]);

        let mut emitter = AssetEmitter::new(out.path(), 20);
        let name = emit_page(&page, &assets, &mut emitter).unwrap();
        assert_eq!(name, "docs/index.html");
        emitter.commit().unwrap();

        let html = fs::read_to_string(out.path().join("docs/index.html")).unwrap();
        let vendor = html.find("../vendor.bundle.ccc.js").unwrap();
        let main = html.find("../main.bundle.aaa.js").unwrap();
        assert!(vendor < main);
        assert!(html.contains("<link rel=\"stylesheet\" href=\"../main.bundle.bbb.css\">"));
    }
}
