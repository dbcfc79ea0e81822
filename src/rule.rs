//! Path → transform chain dispatch.
//!
//! Rules are evaluated in declaration order and the first rule whose scope
//! admits the path and whose pattern matches wins. Later rules are never
//! consulted, even when they would match too.

use std::path::{Path, PathBuf};

use regex::Regex;

use crate::config::RuleConfig;
use crate::error::{BuildError, BuildResult};
use crate::transform::TransformChain;
use crate::utils::path::to_slash;

/// One compiled rule.
#[derive(Debug)]
pub struct Rule {
    pattern: Regex,
    include: Vec<PathBuf>,
    exclude: Vec<PathBuf>,
    chain: TransformChain,
}

impl Rule {
    /// An empty include list admits everything; otherwise the path must be
    /// under one include dir. Exclusions always win.
    fn admits(&self, path: &Path) -> bool {
        let included = self.include.is_empty() || self.include.iter().any(|dir| path.starts_with(dir));
        included && !self.exclude.iter().any(|dir| path.starts_with(dir))
    }

    fn matches(&self, path: &Path) -> bool {
        self.admits(path) && self.pattern.is_match(&to_slash(path))
    }

    pub fn chain(&self) -> &TransformChain {
        &self.chain
    }
}

#[derive(Debug, Default)]
pub struct RuleDispatcher {
    rules: Vec<Rule>,
}

impl RuleDispatcher {
    /// Compile configured rules. Paths are expected to be normalized.
    ///
    /// Auxiliary file names are relative to the rule's first include dir,
    /// or to `root` when the rule has none.
    pub fn from_config(rules: &[RuleConfig], root: &Path) -> BuildResult<Self> {
        let rules = rules
            .iter()
            .enumerate()
            .map(|(idx, rule)| {
                let pattern = Regex::new(&rule.pattern).map_err(|e| {
                    BuildError::Configuration(format!("rules[{idx}].pattern: {e}"))
                })?;
                let base = rule.include.first().cloned().unwrap_or_else(|| root.to_path_buf());
                let chain = TransformChain::new(rule.chain.clone(), base)
                    .map_err(|e| BuildError::Configuration(format!("rules[{idx}].chain: {e}")))?;
                Ok(Rule {
                    pattern,
                    include: rule.include.clone(),
                    exclude: rule.exclude.clone(),
                    chain,
                })
            })
            .collect::<BuildResult<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Index of the first rule matching `path`.
    pub fn position(&self, path: &Path) -> Option<usize> {
        self.rules.iter().position(|rule| rule.matches(path))
    }

    /// The chain of the first matching rule.
    pub fn dispatch(&self, path: &Path) -> BuildResult<(usize, &TransformChain)> {
        self.position(path)
            .map(|idx| (idx, self.rules[idx].chain()))
            .ok_or_else(|| BuildError::NoMatchingRule(path.to_path_buf()))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::Transformer;

    fn rule(pattern: &str, include: &[&str], exclude: &[&str], chain: Vec<Transformer>) -> RuleConfig {
        RuleConfig {
            pattern: pattern.to_string(),
            include: include.iter().map(PathBuf::from).collect(),
            exclude: exclude.iter().map(PathBuf::from).collect(),
            chain,
        }
    }

    #[test]
    fn test_first_match_wins_with_overlapping_patterns() {
        let dispatcher = RuleDispatcher::from_config(
            &[
                rule(r"\.js$", &[], &[], vec![Transformer::Raw]),
                rule(r".*", &[], &[], vec![Transformer::Script]),
            ],
            Path::new("/app"),
        )
        .unwrap();

        let (idx, chain) = dispatcher.dispatch(Path::new("/app/src/index.js")).unwrap();
        assert_eq!(idx, 0);
        assert_eq!(chain.stages(), &[Transformer::Raw]);

        let (idx, _) = dispatcher.dispatch(Path::new("/app/src/readme.md")).unwrap();
        assert_eq!(idx, 1);
    }

    #[test]
    fn test_scope_include_exclude() {
        let dispatcher = RuleDispatcher::from_config(
            &[
                rule(r"\.js$", &["/app/src"], &["/app/src/vendor"], vec![Transformer::Script]),
                rule(r"\.js$", &[], &[], vec![]),
            ],
            Path::new("/app"),
        )
        .unwrap();

        assert_eq!(dispatcher.position(Path::new("/app/src/a.js")), Some(0));
        assert_eq!(dispatcher.position(Path::new("/app/src/vendor/lib.js")), Some(1));
        assert_eq!(dispatcher.position(Path::new("/app/node_modules/x/index.js")), Some(1));
        // sibling directory sharing a name prefix is not "under" /app/src
        assert_eq!(dispatcher.position(Path::new("/app/srcx/a.js")), Some(1));
    }

    #[test]
    fn test_no_matching_rule() {
        let dispatcher = RuleDispatcher::from_config(
            &[rule(r"\.js$", &[], &[], vec![Transformer::Script])],
            Path::new("/app"),
        )
        .unwrap();
        let err = dispatcher.dispatch(Path::new("/app/logo.png")).unwrap_err();
        assert!(matches!(err, BuildError::NoMatchingRule(p) if p == Path::new("/app/logo.png")));
    }

    #[test]
    fn test_invalid_rule_is_configuration_error() {
        let err = RuleDispatcher::from_config(
            &[rule(r"\.css$", &[], &[], vec![Transformer::TagStyle])],
            Path::new("/app"),
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::Configuration(msg) if msg.contains("rules[0].chain")));
    }
}
