//! Glob style imports (`@import 'components/**/*.scss'`).
//!
//! The leading components without glob syntax name the directory to walk;
//! the rest is matched against `/`-separated paths below it. `**/` spans
//! any number of directories, while `*` and `?` stay inside one component.

use std::path::{Path, PathBuf};

use regex::Regex;

use crate::asset::collect_files;
use crate::utils::path::{normalize_path, relative_slash};

pub fn is_glob(specifier: &str) -> bool {
    specifier.contains(['*', '?'])
}

/// Stylesheets under `dir` matching `pattern`, sorted, `importer` excluded.
pub fn expand(dir: &Path, pattern: &str, importer: &Path, extensions: &[&str]) -> Vec<PathBuf> {
    let (base, rest) = split_base(pattern);
    let root = dir.join(base);
    let Ok(re) = glob_regex(rest) else {
        return Vec::new();
    };

    let mut matches: Vec<PathBuf> = collect_files(&root)
        .into_iter()
        .filter(|path| re.is_match(&relative_slash(path, &root)))
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| extensions.iter().any(|ext| name.ends_with(ext)))
        })
        .map(|path| normalize_path(&path))
        .filter(|path| path != importer)
        .collect();
    matches.sort();
    matches.dedup();
    matches
}

/// Split at the first component holding glob syntax.
fn split_base(pattern: &str) -> (&str, &str) {
    let mut offset = 0;
    for component in pattern.split('/') {
        if is_glob(component) {
            let base = pattern[..offset].trim_end_matches('/');
            return (if base.is_empty() { "." } else { base }, &pattern[offset..]);
        }
        offset += component.len() + 1;
    }
    (".", pattern)
}

fn glob_regex(glob: &str) -> Result<Regex, regex::Error> {
    let mut re = String::from("^");
    let mut rest = glob;
    while let Some(c) = rest.chars().next() {
        if let Some(after) = rest.strip_prefix("**/") {
            re.push_str("(?:[^/]+/)*");
            rest = after;
            continue;
        }
        if let Some(after) = rest.strip_prefix("**") {
            re.push_str(".*");
            rest = after;
            continue;
        }
        match c {
            '*' => re.push_str("[^/]*"),
            '?' => re.push_str("[^/]"),
            _ => re.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
        rest = &rest[c.len_utf8()..];
    }
    re.push('$');
    Regex::new(&re)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testutil::write;
    use tempfile::TempDir;

    #[test]
    fn test_split_base() {
        assert_eq!(split_base("components/**/*.scss"), ("components", "**/*.scss"));
        assert_eq!(split_base("./a/b/*.scss"), ("./a/b", "*.scss"));
        assert_eq!(split_base("*.scss"), (".", "*.scss"));
    }

    #[test]
    fn test_glob_regex_components() {
        let re = glob_regex("**/*.scss").unwrap();
        assert!(re.is_match("a.scss"));
        assert!(re.is_match("deep/er/_b.scss"));
        assert!(!re.is_match("a.scss.map"));

        let re = glob_regex("*.s?ss").unwrap();
        assert!(re.is_match("x.sass"));
        assert!(!re.is_match("dir/x.scss"));
    }

    #[test]
    fn test_expand_sorted_style_files() {
        let dir = TempDir::new().unwrap();
        let root = normalize_path(dir.path());
        let importer = write(&root, "src/main.scss", "");
        let button = write(&root, "src/components/_button.scss", "");
        let card = write(&root, "src/components/cards/card.scss", "");
        write(&root, "src/components/readme.md", "");

        let found = expand(
            &root.join("src"),
            "components/**/*",
            &importer,
            &[".scss", ".sass", ".css"],
        );
        assert_eq!(found, vec![button, card]);

        let none = expand(&root.join("src"), "missing/*.scss", &importer, &[".scss"]);
        assert!(none.is_empty());
    }

    #[test]
    fn test_expand_skips_importer() {
        let dir = TempDir::new().unwrap();
        let root = normalize_path(dir.path());
        let importer = write(&root, "src/all.scss", "");
        let other = write(&root, "src/other.scss", "");

        let found = expand(&root.join("src"), "*.scss", &importer, &[".scss"]);
        assert_eq!(found, vec![other]);
    }
}
