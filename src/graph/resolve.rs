//! Import specifier resolution.
//!
//! Order of attempts:
//!
//! 1. aliases (`key$` matches exactly, other keys match as a prefix)
//! 2. relative specifiers (`./x`, `../x`) against the importer's directory
//! 3. bare specifiers through module directories: plain names such as
//!    `node_modules` are looked up in every ancestor of the importer, paths
//!    are searched directly
//!
//! Style imports try the importer's directory first for bare names too,
//! accept a leading `~` for module lookups and find sass partials
//! (`_name.scss`). A style specifier with glob syntax expands to every
//! matching stylesheet, see [`Resolver::resolve_all`].

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use super::glob;
use super::package::PackageJson;
use crate::config::ResolveConfig;
use crate::error::{BuildError, BuildResult};
use crate::transform::{Import, ImportKind};
use crate::utils::path::{normalize_path, resolve_path};

const STYLE_EXTENSIONS: [&str; 3] = [".scss", ".sass", ".css"];

#[derive(Debug, Clone)]
pub struct Resolver {
    root: PathBuf,
    extensions: Vec<String>,
    /// Plain directory names looked up in every ancestor.
    hierarchical: Vec<String>,
    /// Absolute module directories.
    direct: Vec<PathBuf>,
    /// `(key, exact, target)`, longest key first.
    aliases: Vec<(String, bool, String)>,
}

impl Resolver {
    pub fn new(config: &ResolveConfig, root: &Path) -> Self {
        let mut hierarchical = Vec::new();
        let mut direct = Vec::new();
        for dir in &config.modules {
            match plain_name(dir) {
                Some(name) => hierarchical.push(name),
                None => direct.push(resolve_path(dir, root)),
            }
        }

        let mut aliases: Vec<(String, bool, String)> = config
            .alias
            .iter()
            .map(|(key, target)| match key.strip_suffix('$') {
                Some(exact) => (exact.to_string(), true, target.clone()),
                None => (key.clone(), false, target.clone()),
            })
            .collect();
        aliases.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));

        Self {
            root: root.to_path_buf(),
            extensions: config.extensions.clone(),
            hierarchical,
            direct,
            aliases,
        }
    }

    /// Resolve `import` as seen from the module at `importer`.
    pub fn resolve(&self, importer: &Path, import: &Import) -> BuildResult<PathBuf> {
        let unresolved = || BuildError::UnresolvedImport {
            importer: importer.to_path_buf(),
            specifier: import.specifier.clone(),
        };

        let dir = importer.parent().unwrap_or(self.root.as_path());
        let specifier = self.apply_alias(&import.specifier);
        let kind = import.kind;

        let found = if Path::new(&specifier).is_absolute() {
            self.load(Path::new(&specifier), kind)
        } else if is_relative(&specifier) {
            self.load(&dir.join(&specifier), kind)
        } else if kind == ImportKind::Style {
            match specifier.strip_prefix('~') {
                Some(module) => self.load_module(dir, module, kind),
                None => self
                    .load(&dir.join(&specifier), kind)
                    .or_else(|| self.load_module(dir, &specifier, kind)),
            }
        } else {
            self.load_module(dir, &specifier, kind)
        };

        found.map(|p| normalize_path(&p)).ok_or_else(unresolved)
    }

    /// Resolve `import` to every file it names, in path order.
    ///
    /// Only style imports expand globs; a glob matching nothing is
    /// unresolved.
    pub fn resolve_all(&self, importer: &Path, import: &Import) -> BuildResult<Vec<PathBuf>> {
        if import.kind != ImportKind::Style || !glob::is_glob(&import.specifier) {
            return self.resolve(importer, import).map(|path| vec![path]);
        }

        let dir = importer.parent().unwrap_or(self.root.as_path());
        let pattern = self.apply_alias(&import.specifier);
        let found = glob::expand(dir, &pattern, importer, &STYLE_EXTENSIONS);
        if found.is_empty() {
            return Err(BuildError::UnresolvedImport {
                importer: importer.to_path_buf(),
                specifier: import.specifier.clone(),
            });
        }
        Ok(found)
    }

    fn apply_alias(&self, specifier: &str) -> String {
        for (key, exact, target) in &self.aliases {
            let hit = if *exact {
                specifier == key
            } else {
                specifier == key
                    || specifier
                        .strip_prefix(key.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            };
            if hit {
                let rest = &specifier[key.len()..];
                let target = if is_relative(target) {
                    resolve_path(Path::new(target), &self.root)
                        .to_string_lossy()
                        .into_owned()
                } else {
                    target.clone()
                };
                return format!("{target}{rest}");
            }
        }
        specifier.to_string()
    }

    fn load_module(&self, from: &Path, specifier: &str, kind: ImportKind) -> Option<PathBuf> {
        let hierarchical = from.ancestors().flat_map(|ancestor| {
            self.hierarchical
                .iter()
                .map(move |name| ancestor.join(name))
        });
        hierarchical
            .chain(self.direct.iter().cloned())
            .filter(|dir| dir.is_dir())
            .find_map(|dir| self.load(&dir.join(specifier), kind))
    }

    /// Try `base` as a file, then with extensions, then as a directory.
    fn load(&self, base: &Path, kind: ImportKind) -> Option<PathBuf> {
        match kind {
            ImportKind::Script => self
                .load_file(base, &self.extensions)
                .or_else(|| self.load_dir(base, kind)),
            ImportKind::Style => style_candidates(base)
                .into_iter()
                .find_map(|candidate| self.load_file(&candidate, &STYLE_EXTENSIONS))
                .or_else(|| self.load_dir(base, kind)),
        }
    }

    fn load_file<S: AsRef<str>>(&self, base: &Path, extensions: &[S]) -> Option<PathBuf> {
        if base.is_file() {
            return Some(base.to_path_buf());
        }
        extensions
            .iter()
            .map(|ext| append_extension(base, ext.as_ref()))
            .find(|candidate| candidate.is_file())
    }

    fn load_dir(&self, dir: &Path, kind: ImportKind) -> Option<PathBuf> {
        if !dir.is_dir() {
            return None;
        }

        if let Some(pkg) = PackageJson::read(dir) {
            let field = match kind {
                ImportKind::Script => pkg.main,
                ImportKind::Style => pkg.style.or(pkg.sass),
            };
            if let Some(entry) = field
                && let Some(found) = self.load_entry(&dir.join(entry), kind)
            {
                return Some(found);
            }
        }

        match kind {
            ImportKind::Script => self.load_file(&dir.join("index"), &self.extensions),
            ImportKind::Style => ["index", "_index"]
                .iter()
                .find_map(|name| self.load_file(&dir.join(name), &STYLE_EXTENSIONS)),
        }
    }

    /// A `package.json` entry point: a file or a directory with an index,
    /// never another `package.json` hop.
    fn load_entry(&self, base: &Path, kind: ImportKind) -> Option<PathBuf> {
        let extensions: Vec<&str> = match kind {
            ImportKind::Script => self.extensions.iter().map(String::as_str).collect(),
            ImportKind::Style => STYLE_EXTENSIONS.to_vec(),
        };
        self.load_file(base, &extensions).or_else(|| {
            base.is_dir()
                .then(|| self.load_file(&base.join("index"), &extensions))
                .flatten()
        })
    }
}

/// `name` plus its sass partial `_name` in the same directory.
fn style_candidates(base: &Path) -> Vec<PathBuf> {
    let mut candidates = vec![base.to_path_buf()];
    if let Some(name) = base.file_name().and_then(|n| n.to_str())
        && !name.starts_with('_')
    {
        candidates.push(base.with_file_name(format!("_{name}")));
    }
    candidates
}

fn append_extension(base: &Path, ext: &str) -> PathBuf {
    let mut s: OsString = base.as_os_str().to_owned();
    s.push(ext);
    PathBuf::from(s)
}

fn is_relative(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

/// A module directory given as a single name (`node_modules`).
fn plain_name(dir: &Path) -> Option<String> {
    let mut components = dir.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) => name.to_str().map(String::from),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testutil::write;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn resolver(root: &Path, alias: &[(&str, &str)]) -> Resolver {
        let config = ResolveConfig {
            alias: alias
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
            ..ResolveConfig::default()
        };
        Resolver::new(&config, root)
    }

    #[test]
    fn test_relative_with_extensions_and_index() {
        let dir = TempDir::new().unwrap();
        let root = normalize_path(dir.path());
        let importer = write(&root, "src/index.js", "");
        let util = write(&root, "src/util.ts", "");
        let widget = write(&root, "src/widget/index.js", "");
        let r = resolver(&root, &[]);

        assert_eq!(r.resolve(&importer, &Import::script("./util")).unwrap(), util);
        assert_eq!(r.resolve(&importer, &Import::script("./widget")).unwrap(), widget);
        // extensions are appended, never substituted
        assert!(r.resolve(&importer, &Import::script("./util.js")).is_err());
    }

    #[test]
    fn test_bare_specifier_walks_up_node_modules() {
        let dir = TempDir::new().unwrap();
        let root = normalize_path(dir.path());
        let importer = write(&root, "src/deep/a.js", "");
        write(
            &root,
            "node_modules/vue/package.json",
            r#"{ "name": "vue", "version": "2.6.0", "main": "dist/vue.runtime.js" }"#,
        );
        let main = write(&root, "node_modules/vue/dist/vue.runtime.js", "");
        let esm = write(&root, "node_modules/vue/dist/vue.esm.js", "");

        let r = resolver(&root, &[]);
        assert_eq!(r.resolve(&importer, &Import::script("vue")).unwrap(), main);
        assert_eq!(
            r.resolve(&importer, &Import::script("vue/dist/vue.esm")).unwrap(),
            esm
        );
    }

    #[test]
    fn test_alias_exact_and_prefix() {
        let dir = TempDir::new().unwrap();
        let root = normalize_path(dir.path());
        let importer = write(&root, "src/index.js", "");
        let esm = write(&root, "node_modules/vue/dist/vue.esm.js", "");
        write(&root, "node_modules/vue/index.js", "");
        let button = write(&root, "src/components/button.js", "");

        let r = resolver(
            &root,
            &[("vue$", "vue/dist/vue.esm.js"), ("@", "./src/components")],
        );
        assert_eq!(r.resolve(&importer, &Import::script("vue")).unwrap(), esm);
        assert_eq!(
            r.resolve(&importer, &Import::script("@/button")).unwrap(),
            button
        );
        // exact alias leaves deeper paths alone
        assert!(r.resolve(&importer, &Import::script("vue/missing")).is_err());
    }

    #[test]
    fn test_style_partials_and_tilde() {
        let dir = TempDir::new().unwrap();
        let root = normalize_path(dir.path());
        let importer = write(&root, "src/main.scss", "");
        let partial = write(&root, "src/_variables.scss", "");
        let reset = write(&root, "node_modules/normalize.css/normalize.css", "");

        let r = resolver(&root, &[]);
        assert_eq!(
            r.resolve(&importer, &Import::style("variables")).unwrap(),
            partial
        );
        assert_eq!(
            r.resolve(&importer, &Import::style("~normalize.css/normalize"))
                .unwrap(),
            reset
        );
    }

    #[test]
    fn test_style_glob_expands_in_path_order() {
        let dir = TempDir::new().unwrap();
        let root = normalize_path(dir.path());
        let importer = write(&root, "src/main.scss", "");
        let alert = write(&root, "src/components/alert.scss", "");
        let button = write(&root, "src/components/forms/_button.scss", "");
        write(&root, "src/components/notes.txt", "");

        let r = resolver(&root, &[("@styles", "./src")]);
        let glob = Import::style("components/**/*.scss");
        assert_eq!(r.resolve_all(&importer, &glob).unwrap(), vec![alert.clone(), button.clone()]);
        assert_eq!(
            r.resolve_all(&importer, &Import::style("@styles/components/**/*.scss"))
                .unwrap(),
            vec![alert, button]
        );

        let empty = r.resolve_all(&importer, &Import::style("missing/*.scss"));
        assert!(matches!(empty, Err(BuildError::UnresolvedImport { .. })));
        // scripts never expand
        assert!(r.resolve_all(&importer, &Import::script("./components/*")).is_err());
    }

    #[test]
    fn test_unresolved_import_reports_importer() {
        let dir = TempDir::new().unwrap();
        let root = normalize_path(dir.path());
        let importer = write(&root, "src/index.js", "");
        let err = resolver(&root, &[])
            .resolve(&importer, &Import::script("./nope"))
            .unwrap_err();
        let BuildError::UnresolvedImport { importer: from, specifier } = err else {
            panic!("expected unresolved import");
        };
        assert_eq!(from, importer);
        assert_eq!(specifier, "./nope");
    }

    #[test]
    fn test_plain_name_detection() {
        assert_eq!(plain_name(Path::new("node_modules")).as_deref(), Some("node_modules"));
        assert_eq!(plain_name(Path::new("./src")), None);
        assert_eq!(plain_name(Path::new("/abs/modules")), None);
    }
}
