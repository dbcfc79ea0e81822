//! `[[rules]]` configuration.
//!
//! Rules are kept in declaration order; the dispatcher relies on it.
//!
//! ```toml
//! [[rules]]
//! pattern = '\.(sc|c)ss$'
//! include = ["src"]
//! chain = ["sass", "tag-style"]
//! ```

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;
use crate::transform::{Transformer, validate_chain};
use crate::utils::path::resolve_path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Regular expression matched against the `/`-separated module path.
    pub pattern: String,

    /// Directories the rule is limited to. Empty means everywhere.
    #[serde(default)]
    pub include: Vec<PathBuf>,

    /// Directories the rule never applies to.
    #[serde(default)]
    pub exclude: Vec<PathBuf>,

    /// Transform stages, applied in order.
    #[serde(default)]
    pub chain: Vec<Transformer>,
}

impl RuleConfig {
    pub fn normalize(&mut self, root: &Path) {
        for dir in self.include.iter_mut().chain(self.exclude.iter_mut()) {
            *dir = resolve_path(dir, root);
        }
    }

    pub fn validate(rules: &[Self], diag: &mut ConfigDiagnostics) {
        if rules.is_empty() {
            diag.error_with_hint(
                "rules",
                "no rules configured",
                "every module must match a rule, e.g. pattern = '\\.js$'",
            );
        }

        for (idx, rule) in rules.iter().enumerate() {
            if let Err(err) = Regex::new(&rule.pattern) {
                diag.error(format!("rules[{idx}].pattern"), err.to_string());
            }
            if let Err(reason) = validate_chain(&rule.chain) {
                diag.error(format!("rules[{idx}].chain"), reason);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Wrapper {
        rules: Vec<RuleConfig>,
    }

    #[test]
    fn test_parse_rules_keep_order() {
        let parsed: Wrapper = toml::from_str(
            r#"
            [[rules]]
            pattern = '\.js$'
            chain = ["script"]

            [[rules]]
            pattern = '\.scss$'
            include = ["src"]
            chain = ["sass", "tag-style"]
            "#,
        )
        .unwrap();
        assert_eq!(parsed.rules.len(), 2);
        assert_eq!(parsed.rules[0].chain, vec![Transformer::Script]);
        assert_eq!(
            parsed.rules[1].chain,
            vec![Transformer::Sass, Transformer::TagStyle]
        );
        assert_eq!(parsed.rules[1].include, vec![PathBuf::from("src")]);
    }

    #[test]
    fn test_validate_reports_regex_and_chain() {
        let rules = vec![
            RuleConfig {
                pattern: "(".into(),
                include: vec![],
                exclude: vec![],
                chain: vec![Transformer::Script],
            },
            RuleConfig {
                pattern: r"\.css$".into(),
                include: vec![],
                exclude: vec![],
                chain: vec![Transformer::TagStyle, Transformer::Css],
            },
        ];
        let mut diag = ConfigDiagnostics::new();
        RuleConfig::validate(&rules, &mut diag);
        assert_eq!(diag.len(), 2);
        assert_eq!(diag.errors()[0].field, "rules[0].pattern");
        assert_eq!(diag.errors()[1].field, "rules[1].chain");
    }
}
