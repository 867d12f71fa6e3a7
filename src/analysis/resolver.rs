//! Module and file extraction from detector paths.
//!
//! A path such as `F:\root\dtsre\Engine\src\foo.cpp` resolved against the
//! keyword `dtsre` yields module `Engine` and file `src\foo.cpp`. Both `\`
//! and `/` are accepted as separators; the path itself is never rewritten.

use serde::{Deserialize, Serialize};

/// Which keyword is tried first when resolving a module.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum ResolveOrder {
    /// Primary filter keyword first, anchor as fallback (default)
    #[default]
    PrimaryFirst,
    /// Anchor keyword first, primary filter keyword as fallback
    AnchorFirst,
}

/// Module name and module-relative file of one path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModulePath {
    pub module: String,
    pub file: String,
}

/// Resolves paths against a primary and a secondary keyword.
#[derive(Debug, Clone)]
pub struct PathResolver {
    keywords: [Option<String>; 2],
}

impl PathResolver {
    /// Create a resolver. Empty keywords are treated as absent.
    pub fn new(primary: Option<&str>, anchor: Option<&str>, order: ResolveOrder) -> Self {
        let primary = primary.filter(|k| !k.is_empty()).map(String::from);
        let anchor = anchor.filter(|k| !k.is_empty()).map(String::from);
        let keywords = match order {
            ResolveOrder::PrimaryFirst => [primary, anchor],
            ResolveOrder::AnchorFirst => [anchor, primary],
        };
        Self { keywords }
    }

    /// Resolve the module and file for `path`.
    ///
    /// The first keyword found in the path wins, even if the segment after
    /// it is empty. With no keyword found both parts are empty.
    pub fn resolve(&self, path: &str) -> ModulePath {
        self.keywords
            .iter()
            .flatten()
            .find_map(|keyword| split_after_keyword(path, keyword))
            .unwrap_or_default()
    }
}

fn is_separator(c: char) -> bool {
    c == '\\' || c == '/'
}

/// Drop the first character of `s`, normally the separator after a keyword.
fn skip_one(s: &str) -> &str {
    s.chars().next().map_or("", |c| &s[c.len_utf8()..])
}

/// Split `path` at the first occurrence of `keyword`.
///
/// Returns `None` when the keyword does not occur.
fn split_after_keyword(path: &str, keyword: &str) -> Option<ModulePath> {
    let index = path.find(keyword)?;
    let rest = skip_one(&path[index + keyword.len()..]);

    let (module, file) = match rest.find(is_separator) {
        Some(end) => (&rest[..end], skip_one(&rest[end..])),
        None => (rest, ""),
    };

    let file = if module.is_empty() { "" } else { file };

    Some(ModulePath {
        module: module.to_string(),
        file: file.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(primary: &str, anchor: &str) -> PathResolver {
        PathResolver::new(Some(primary), Some(anchor), ResolveOrder::PrimaryFirst)
    }

    #[test]
    fn test_windows_path() {
        let resolved = resolver("dtsre", "").resolve(r"F:\root\dtsre\Engine\src\foo.cpp");
        assert_eq!(resolved.module, "Engine");
        assert_eq!(resolved.file, r"src\foo.cpp");
    }

    #[test]
    fn test_forward_slash_path() {
        let resolved = resolver("engines", "").resolve("/home/dev/engines/Render/Private/gl.cpp");
        assert_eq!(resolved.module, "Render");
        assert_eq!(resolved.file, "Private/gl.cpp");
    }

    #[test]
    fn test_falls_back_to_secondary_keyword() {
        let resolved = resolver("vulkan", "Runtime").resolve(r"D:\src\Runtime\Core\mem.h");
        assert_eq!(resolved.module, "Core");
        assert_eq!(resolved.file, "mem.h");
    }

    #[test]
    fn test_primary_wins_over_secondary() {
        let resolved = resolver("org", "dtsre").resolve(r"F:\org\Old\dtsre\New\a.cpp");
        assert_eq!(resolved.module, "Old");
        assert_eq!(resolved.file, r"dtsre\New\a.cpp");
    }

    #[test]
    fn test_anchor_first_order() {
        let resolver = PathResolver::new(Some("org"), Some("dtsre"), ResolveOrder::AnchorFirst);
        let resolved = resolver.resolve(r"F:\org\Old\dtsre\New\a.cpp");
        assert_eq!(resolved.module, "New");
        assert_eq!(resolved.file, "a.cpp");
    }

    #[test]
    fn test_no_keyword_found() {
        assert_eq!(resolver("x", "y").resolve(r"C:\a\b.cpp"), ModulePath::default());
        let none = PathResolver::new(None, Some(""), ResolveOrder::PrimaryFirst);
        assert_eq!(none.resolve(r"C:\a\b.cpp"), ModulePath::default());
    }

    #[test]
    fn test_module_runs_to_end_without_separator() {
        let resolved = resolver("dtsre", "").resolve(r"F:\root\dtsre\Engine");
        assert_eq!(resolved.module, "Engine");
        assert_eq!(resolved.file, "");
    }

    #[test]
    fn test_keyword_at_end_does_not_fall_through() {
        let resolved = resolver("dtsre", "root").resolve(r"F:\root\dtsre");
        assert_eq!(resolved, ModulePath::default());
    }

    #[test]
    fn test_file_is_relative_to_resolved_segment() {
        let resolved = resolver("dtsre", "").resolve(r"C:\Engine\dtsre\Engine\x.cpp");
        assert_eq!(resolved.module, "Engine");
        assert_eq!(resolved.file, "x.cpp");
    }

    #[test]
    fn test_non_ascii_after_keyword() {
        let resolved = resolver("dtsre", "").resolve("F:/dtsreé/Mod/a.cpp");
        assert_eq!(resolved.module, "");
        let resolved = resolver("dtsre", "").resolve("F:/dtsre/Модуль/a.cpp");
        assert_eq!(resolved.module, "Модуль");
        assert_eq!(resolved.file, "a.cpp");
    }
}
