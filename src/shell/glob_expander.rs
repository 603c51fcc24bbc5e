//! GlobExpander — glob pattern matching and directory-tree expansion
//!
//! Implements spec's pathname expansion (§4.5): matches `*`, `?`, `[...]`,
//! extglob forms, and `**` (globstar) against the virtual file system.

use std::collections::HashMap;

use crate::fs::Vfs;

use super::glob_helpers::{glob_to_regex, globignore_pattern_to_regex, split_globignore_patterns};

/// Options controlling glob expansion behavior.
#[derive(Debug, Clone)]
pub struct GlobOptions {
    pub globstar: bool,
    pub nullglob: bool,
    pub failglob: bool,
    pub dotglob: bool,
    pub extglob: bool,
    /// Default true in bash >=5.2
    pub globskipdots: bool,
}

impl Default for GlobOptions {
    fn default() -> Self {
        Self {
            globstar: false,
            nullglob: false,
            failglob: false,
            dotglob: false,
            extglob: false,
            globskipdots: true, // bash >=5.2 default
        }
    }
}

/// Core glob expander with configuration and pattern matching.
///
/// Holds a reference to the virtual file system, the current working
/// directory, GLOBIGNORE patterns, and all relevant shell options.
pub struct GlobExpander<'a> {
    fs: &'a Vfs,
    cwd: String,
    globignore_patterns: Vec<String>,
    has_globignore: bool,
    globstar: bool,
    nullglob: bool,
    failglob: bool,
    dotglob: bool,
    extglob: bool,
    globskipdots: bool,
}

impl<'a> GlobExpander<'a> {
    pub fn new(
        fs: &'a Vfs,
        cwd: String,
        env: Option<&HashMap<String, String>>,
        options: GlobOptions,
    ) -> Self {
        let mut globignore_patterns = Vec::new();
        let mut has_globignore = false;
        if let Some(env_map) = env {
            if let Some(globignore) = env_map.get("GLOBIGNORE") {
                if !globignore.is_empty() {
                    has_globignore = true;
                    globignore_patterns = split_globignore_patterns(globignore);
                }
            }
        }
        Self {
            fs,
            cwd,
            globignore_patterns,
            has_globignore,
            globstar: options.globstar,
            nullglob: options.nullglob,
            failglob: options.failglob,
            dotglob: options.dotglob,
            extglob: options.extglob,
            globskipdots: options.globskipdots,
        }
    }

    pub fn has_nullglob(&self) -> bool {
        self.nullglob
    }

    pub fn has_failglob(&self) -> bool {
        self.failglob
    }

    /// Check if a string contains glob characters.
    pub fn is_glob_pattern(&self, s: &str) -> bool {
        if s.contains('*') || s.contains('?') || s.contains('[') {
            return true;
        }
        if self.extglob {
            // Check for @(...), *(...), +(...), ?(...), !(...)
            for i in 0..s.len().saturating_sub(1) {
                let c = s.as_bytes()[i];
                if (c == b'@' || c == b'*' || c == b'+' || c == b'?' || c == b'!')
                    && s.as_bytes()[i + 1] == b'('
                {
                    return true;
                }
            }
        }
        false
    }

    /// Match a filename against a glob pattern.
    pub fn match_pattern(&self, name: &str, pattern: &str) -> bool {
        let regex_str = glob_to_regex(pattern, self.extglob);
        if let Ok(re) = regex_lite::Regex::new(&regex_str) {
            re.is_match(name)
        } else {
            false
        }
    }

    /// Filter results based on GLOBIGNORE and globskipdots.
    pub(crate) fn filter_globignore(&self, results: Vec<String>) -> Vec<String> {
        if !self.has_globignore && !self.globskipdots {
            return results;
        }
        results
            .into_iter()
            .filter(|path| {
                let basename = path.rsplit('/').next().unwrap_or(path);
                // Filter . and .. when GLOBIGNORE is set or globskipdots is enabled
                if (self.has_globignore || self.globskipdots)
                    && (basename == "." || basename == "..")
                {
                    return false;
                }
                // Check GLOBIGNORE patterns
                if self.has_globignore {
                    for ignore_pattern in &self.globignore_patterns {
                        let regex_str = globignore_pattern_to_regex(ignore_pattern);
                        if let Ok(re) = regex_lite::Regex::new(&regex_str) {
                            if re.is_match(path) {
                                return false;
                            }
                        }
                    }
                }
                true
            })
            .collect()
    }

    /// Check if `**` is used as a complete path segment.
    pub(crate) fn is_globstar_valid(&self, pattern: &str) -> bool {
        let segments: Vec<&str> = pattern.split('/').collect();
        for segment in segments {
            if segment.contains("**") && segment != "**" {
                return false;
            }
        }
        true
    }

    /// Get effective dotglob (true if dotglob is set OR GLOBIGNORE is set).
    pub(crate) fn effective_dotglob(&self) -> bool {
        self.dotglob || self.has_globignore
    }

    pub(crate) fn cwd(&self) -> &str {
        &self.cwd
    }

    pub(crate) fn globstar(&self) -> bool {
        self.globstar
    }

    pub(crate) fn dotglob(&self) -> bool {
        self.dotglob
    }

    // =========================================================================
    // Expansion methods
    // =========================================================================

    /// Expand a single glob pattern to matching file paths.
    pub fn expand(&self, pattern: &str) -> Vec<String> {
        let results = if pattern.contains("**") && self.globstar && self.is_globstar_valid(pattern)
        {
            self.expand_recursive(pattern)
        } else {
            // When globstar disabled or ** not a valid segment, treat ** as *
            let normalized = pattern.replace("**", "*");
            self.expand_simple(&normalized)
        };
        // Apply GLOBIGNORE filtering and sort
        let mut filtered = self.filter_globignore(results);
        filtered.sort();
        filtered
    }

    /// Expand an array of arguments, replacing glob patterns with matched files.
    pub fn expand_args(&self, args: &[String], quoted_flags: Option<&[bool]>) -> Vec<String> {
        let mut result = Vec::new();
        for (i, arg) in args.iter().enumerate() {
            let is_quoted =
                quoted_flags.map_or(false, |flags| flags.get(i).copied().unwrap_or(false));
            if is_quoted || !self.is_glob_pattern(arg) {
                result.push(arg.clone());
            } else {
                let expanded = self.expand(arg);
                if expanded.is_empty() {
                    result.push(arg.clone()); // No matches, keep original
                } else {
                    result.extend(expanded);
                }
            }
        }
        result
    }

    /// Expand a simple glob pattern (no **).
    fn expand_simple(&self, pattern: &str) -> Vec<String> {
        let is_absolute = pattern.starts_with('/');
        let segments: Vec<String> = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect();

        // Find first segment with glob characters
        let first_glob_idx = segments.iter().position(|s| self.has_glob_chars(s));
        let first_glob_idx = match first_glob_idx {
            Some(idx) => idx,
            None => return vec![pattern.to_string()], // No glob chars
        };

        // Build base path and result prefix
        let (fs_base_path, result_prefix) = if first_glob_idx == 0 {
            if is_absolute {
                ("/".to_string(), "/".to_string())
            } else {
                (self.cwd.clone(), String::new())
            }
        } else {
            let base_segments: Vec<&str> =
                segments[..first_glob_idx].iter().map(|s| s.as_str()).collect();
            let base = base_segments.join("/");
            if is_absolute {
                (format!("/{}", base), format!("/{}", base))
            } else {
                (self.fs.resolve_path(&self.cwd, &base), base)
            }
        };

        let remaining: Vec<String> = segments[first_glob_idx..].to_vec();
        self.expand_segments(&fs_base_path, &result_prefix, &remaining)
    }

    /// Recursively expand path segments with glob patterns.
    fn expand_segments(&self, fs_path: &str, result_prefix: &str, segments: &[String]) -> Vec<String> {
        if segments.is_empty() {
            return vec![result_prefix.to_string()];
        }

        let current_segment = &segments[0];
        let remaining = &segments[1..];
        let mut results = Vec::new();

        // Read directory entries
        let entries = match self.fs.readdir_with_file_types(fs_path) {
            Ok(entries) => entries,
            Err(_) => return results,
        };

        let effective_dotglob = self.dotglob || self.has_globignore;

        for entry in &entries {
            // Skip hidden files unless pattern starts with . or dotglob enabled
            if entry.name.starts_with('.')
                && !current_segment.starts_with('.')
                && !effective_dotglob
            {
                continue;
            }

            if self.match_pattern(&entry.name, current_segment) {
                let new_fs_path = if fs_path == "/" {
                    format!("/{}", entry.name)
                } else {
                    format!("{}/{}", fs_path, entry.name)
                };

                let new_result_prefix = if result_prefix.is_empty() {
                    entry.name.clone()
                } else if result_prefix == "/" {
                    format!("/{}", entry.name)
                } else {
                    format!("{}/{}", result_prefix, entry.name)
                };

                if remaining.is_empty() {
                    results.push(new_result_prefix);
                } else if entry.is_directory {
                    let sub_results = self.expand_segments(&new_fs_path, &new_result_prefix, remaining);
                    results.extend(sub_results);
                }
            }
        }

        results
    }

    /// Expand a recursive glob pattern (contains **).
    fn expand_recursive(&self, pattern: &str) -> Vec<String> {
        let double_star_idx = pattern.find("**").unwrap();
        let before = pattern[..double_star_idx].trim_end_matches('/');
        let before = if before.is_empty() { "." } else { before };
        let after = &pattern[double_star_idx + 2..];
        let file_pattern = after.trim_start_matches('/');

        // If file_pattern contains another **, handle multi-globstar
        if file_pattern.contains("**") && self.is_globstar_valid(file_pattern) {
            let mut results = Vec::new();
            self.walk_directory_multi_globstar(before, file_pattern, &mut results);
            results.sort();
            results.dedup();
            return results;
        }

        let mut results = Vec::new();
        self.walk_directory(before, file_pattern, &mut results);
        results
    }

    /// Walk directory recursively, matching file_pattern at each level.
    fn walk_directory(&self, dir: &str, file_pattern: &str, results: &mut Vec<String>) {
        let full_path = self.fs.resolve_path(&self.cwd, dir);

        let entries = match self.fs.readdir_with_file_types(&full_path) {
            Ok(entries) => entries,
            Err(_) => return,
        };

        let mut dirs = Vec::new();
        for entry in &entries {
            let entry_path = if dir == "." {
                entry.name.clone()
            } else {
                format!("{}/{}", dir, entry.name)
            };

            if entry.is_directory {
                dirs.push(entry_path.clone());
            }

            if !file_pattern.is_empty() && self.match_pattern(&entry.name, file_pattern) {
                results.push(entry_path);
            }
        }

        for dir_path in dirs {
            self.walk_directory(&dir_path, file_pattern, results);
        }
    }

    /// Walk for multi-globstar patterns.
    fn walk_directory_multi_globstar(&self, dir: &str, sub_pattern: &str, results: &mut Vec<String>) {
        let full_path = self.fs.resolve_path(&self.cwd, dir);

        let entries = match self.fs.readdir_with_file_types(&full_path) {
            Ok(entries) => entries,
            Err(_) => return,
        };

        let mut dirs = Vec::new();
        for entry in &entries {
            let entry_path = if dir == "." {
                entry.name.clone()
            } else {
                format!("{}/{}", dir, entry.name)
            };
            if entry.is_directory {
                dirs.push(entry_path);
            }
        }

        // From this directory, expand the sub-pattern
        let pattern_from_here = if dir == "." {
            sub_pattern.to_string()
        } else {
            format!("{}/{}", dir, sub_pattern)
        };
        let sub_results = self.expand_recursive(&pattern_from_here);
        results.extend(sub_results);

        // Recurse into subdirectories
        for dir_path in dirs {
            self.walk_directory_multi_globstar(&dir_path, sub_pattern, results);
        }
    }

    /// Check if a string contains glob characters (private helper).
    fn has_glob_chars(&self, s: &str) -> bool {
        self.is_glob_pattern(s)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MkdirOptions;

    fn make_expander(fs: &Vfs, options: GlobOptions) -> GlobExpander {
        GlobExpander::new(fs, "/home/user".to_string(), None, options)
    }

    #[test]
    fn test_glob_options_default() {
        let opts = GlobOptions::default();
        assert!(!opts.globstar);
        assert!(!opts.nullglob);
        assert!(!opts.failglob);
        assert!(!opts.dotglob);
        assert!(!opts.extglob);
        assert!(opts.globskipdots); // bash >=5.2 default
    }

    #[test]
    fn test_new_with_default_options() {
        let fs = Vfs::new();
        let expander = make_expander(&fs, GlobOptions::default());
        assert!(!expander.globstar);
        assert!(!expander.nullglob);
        assert!(!expander.failglob);
        assert!(!expander.dotglob);
        assert!(!expander.extglob);
        assert!(expander.globskipdots);
        assert!(!expander.has_globignore);
        assert!(expander.globignore_patterns.is_empty());
        assert_eq!(expander.cwd(), "/home/user");
    }

    #[test]
    fn test_new_with_globignore_env() {
        let fs = Vfs::new();
        let mut env = HashMap::new();
        env.insert("GLOBIGNORE".to_string(), "*.log:*.tmp".to_string());
        let expander = GlobExpander::new(&fs, "/home/user".to_string(), Some(&env), GlobOptions::default());
        assert!(expander.has_globignore);
        assert_eq!(expander.globignore_patterns, vec!["*.log", "*.tmp"]);
    }

    #[test]
    fn test_new_with_empty_globignore() {
        let fs = Vfs::new();
        let mut env = HashMap::new();
        env.insert("GLOBIGNORE".to_string(), "".to_string());
        let expander = GlobExpander::new(&fs, "/home/user".to_string(), Some(&env), GlobOptions::default());
        assert!(!expander.has_globignore);
        assert!(expander.globignore_patterns.is_empty());
    }

    #[test]
    fn test_is_glob_pattern_star() {
        let fs = Vfs::new();
        let expander = make_expander(&fs, GlobOptions::default());
        assert!(expander.is_glob_pattern("*.txt"));
    }

    #[test]
    fn test_is_glob_pattern_question() {
        let fs = Vfs::new();
        let expander = make_expander(&fs, GlobOptions::default());
        assert!(expander.is_glob_pattern("file?.txt"));
    }

    #[test]
    fn test_is_glob_pattern_bracket() {
        let fs = Vfs::new();
        let expander = make_expander(&fs, GlobOptions::default());
        assert!(expander.is_glob_pattern("[abc]"));
    }

    #[test]
    fn test_is_glob_pattern_plain_text_returns_false() {
        let fs = Vfs::new();
        let expander = make_expander(&fs, GlobOptions::default());
        assert!(!expander.is_glob_pattern("hello"));
        assert!(!expander.is_glob_pattern("file.txt"));
        assert!(!expander.is_glob_pattern("/usr/bin/env"));
    }

    #[test]
    fn test_is_glob_pattern_extglob_at() {
        let fs = Vfs::new();
        let mut opts = GlobOptions::default();
        opts.extglob = true;
        let expander = make_expander(&fs, opts);
        assert!(expander.is_glob_pattern("@(foo|bar)"));
    }

    #[test]
    fn test_match_pattern_star() {
        let fs = Vfs::new();
        let expander = make_expander(&fs, GlobOptions::default());
        assert!(expander.match_pattern("file.txt", "*.txt"));
        assert!(!expander.match_pattern("file.rs", "*.txt"));
    }

    #[test]
    fn test_match_pattern_bracket_class() {
        let fs = Vfs::new();
        let expander = make_expander(&fs, GlobOptions::default());
        assert!(expander.match_pattern("a", "[abc]"));
        assert!(!expander.match_pattern("d", "[abc]"));
    }

    #[test]
    fn test_filter_globignore_skips_dots_with_globskipdots() {
        let fs = Vfs::new();
        let expander = make_expander(&fs, GlobOptions::default()); // globskipdots=true
        let input = vec![
            ".".to_string(),
            "..".to_string(),
            "file.txt".to_string(),
            "dir/..".to_string(),
        ];
        let result = expander.filter_globignore(input);
        assert_eq!(result, vec!["file.txt"]);
    }

    #[test]
    fn test_is_globstar_valid_double_star_alone() {
        let fs = Vfs::new();
        let expander = make_expander(&fs, GlobOptions::default());
        assert!(expander.is_globstar_valid("**"));
    }

    #[test]
    fn test_is_globstar_valid_invalid_mixed() {
        let fs = Vfs::new();
        let expander = make_expander(&fs, GlobOptions::default());
        assert!(!expander.is_globstar_valid("d**"));
    }

    #[test]
    fn test_effective_dotglob_with_dotglob_option() {
        let fs = Vfs::new();
        let mut opts = GlobOptions::default();
        opts.dotglob = true;
        let expander = make_expander(&fs, opts);
        assert!(expander.effective_dotglob());
    }

    /// A populated Vfs with a standard directory tree, for expansion tests.
    fn setup_test_fs() -> Vfs {
        let mut fs = Vfs::new();
        fs.mkdir("/home", &MkdirOptions { recursive: true }).unwrap();
        fs.mkdir("/home/user", &MkdirOptions { recursive: false }).unwrap();
        fs.mkdir("/home/user/sub", &MkdirOptions { recursive: false }).unwrap();
        fs.mkdir("/home/user/sub/deep", &MkdirOptions { recursive: false }).unwrap();
        fs.write_file("/home/user/file.txt", b"hello").unwrap();
        fs.write_file("/home/user/file.rs", b"fn main(){}").unwrap();
        fs.write_file("/home/user/data.json", b"{}").unwrap();
        fs.write_file("/home/user/.hidden", b"secret").unwrap();
        fs.write_file("/home/user/sub/nested.txt", b"nested").unwrap();
        fs.write_file("/home/user/sub/deep/file.txt", b"deep").unwrap();
        fs
    }

    #[test]
    fn test_expand_star_txt() {
        let fs = setup_test_fs();
        let expander = GlobExpander::new(&fs, "/home/user".to_string(), None, GlobOptions::default());
        let result = expander.expand("*.txt");
        assert_eq!(result, vec!["file.txt"]);
    }

    #[test]
    fn test_expand_star_excludes_hidden() {
        let fs = setup_test_fs();
        let expander = GlobExpander::new(&fs, "/home/user".to_string(), None, GlobOptions::default());
        let result = expander.expand("*");
        assert_eq!(result, vec!["data.json", "file.rs", "file.txt", "sub"]);
    }

    #[test]
    fn test_expand_dot_star_matches_hidden() {
        let fs = setup_test_fs();
        let expander = GlobExpander::new(&fs, "/home/user".to_string(), None, GlobOptions::default());
        let result = expander.expand(".*");
        assert_eq!(result, vec![".hidden"]);
    }

    #[test]
    fn test_expand_star_with_dotglob() {
        let fs = setup_test_fs();
        let mut opts = GlobOptions::default();
        opts.dotglob = true;
        let expander = GlobExpander::new(&fs, "/home/user".to_string(), None, opts);
        let result = expander.expand("*");
        assert!(result.contains(&".hidden".to_string()));
        assert!(result.contains(&"file.txt".to_string()));
        assert!(result.contains(&"data.json".to_string()));
    }

    #[test]
    fn test_expand_subdir_pattern() {
        let fs = setup_test_fs();
        let expander = GlobExpander::new(&fs, "/home/user".to_string(), None, GlobOptions::default());
        let result = expander.expand("sub/*.txt");
        assert_eq!(result, vec!["sub/nested.txt"]);
    }

    #[test]
    fn test_expand_recursive_globstar() {
        let fs = setup_test_fs();
        let mut opts = GlobOptions::default();
        opts.globstar = true;
        let expander = GlobExpander::new(&fs, "/home/user".to_string(), None, opts);
        let result = expander.expand("**/*.txt");
        assert_eq!(result, vec!["file.txt", "sub/deep/file.txt", "sub/nested.txt"]);
    }

    #[test]
    fn test_expand_recursive_without_globstar_treats_as_star() {
        let fs = setup_test_fs();
        let expander = GlobExpander::new(&fs, "/home/user".to_string(), None, GlobOptions::default());
        let result = expander.expand("**/*.txt");
        assert_eq!(result, vec!["sub/nested.txt"]);
    }

    #[test]
    fn test_expand_no_matches_returns_empty() {
        let fs = setup_test_fs();
        let expander = GlobExpander::new(&fs, "/home/user".to_string(), None, GlobOptions::default());
        let result = expander.expand("nonexistent*");
        assert!(result.is_empty());
    }

    #[test]
    fn test_expand_absolute_path() {
        let fs = setup_test_fs();
        let expander = GlobExpander::new(&fs, "/home/user".to_string(), None, GlobOptions::default());
        let result = expander.expand("/home/user/*.txt");
        assert_eq!(result, vec!["/home/user/file.txt"]);
    }

    #[test]
    fn test_expand_args_mixed() {
        let fs = setup_test_fs();
        let expander = GlobExpander::new(&fs, "/home/user".to_string(), None, GlobOptions::default());
        let args = vec!["hello".to_string(), "*.txt".to_string(), "*.rs".to_string()];
        let result = expander.expand_args(&args, None);
        assert_eq!(result, vec!["hello", "file.txt", "file.rs"]);
    }

    #[test]
    fn test_expand_args_quoted_no_expansion() {
        let fs = setup_test_fs();
        let expander = GlobExpander::new(&fs, "/home/user".to_string(), None, GlobOptions::default());
        let args = vec!["*.txt".to_string()];
        let quoted = vec![true];
        let result = expander.expand_args(&args, Some(&quoted));
        assert_eq!(result, vec!["*.txt"]);
    }

    #[test]
    fn test_expand_with_globignore() {
        let fs = setup_test_fs();
        let mut env = HashMap::new();
        env.insert("GLOBIGNORE".to_string(), "*.txt".to_string());
        let expander = GlobExpander::new(&fs, "/home/user".to_string(), Some(&env), GlobOptions::default());
        let result = expander.expand("*");
        assert!(result.contains(&"data.json".to_string()));
        assert!(result.contains(&"file.rs".to_string()));
        assert!(result.contains(&".hidden".to_string()));
        assert!(!result.contains(&"file.txt".to_string()));
    }

    #[test]
    fn test_expand_question_mark_pattern() {
        let fs = setup_test_fs();
        let expander = GlobExpander::new(&fs, "/home/user".to_string(), None, GlobOptions::default());
        let result = expander.expand("file.??");
        assert_eq!(result, vec!["file.rs"]);
    }

    #[test]
    fn test_expand_bracket_pattern() {
        let fs = setup_test_fs();
        let expander = GlobExpander::new(&fs, "/home/user".to_string(), None, GlobOptions::default());
        let result = expander.expand("[df]*.json");
        assert_eq!(result, vec!["data.json"]);
    }

    #[test]
    fn test_expand_deep_nested_pattern() {
        let fs = setup_test_fs();
        let expander = GlobExpander::new(&fs, "/home/user".to_string(), None, GlobOptions::default());
        let result = expander.expand("sub/deep/*.txt");
        assert_eq!(result, vec!["sub/deep/file.txt"]);
    }

    #[test]
    fn test_has_glob_chars_star() {
        let fs = Vfs::new();
        let expander = make_expander(&fs, GlobOptions::default());
        assert!(expander.has_glob_chars("*.txt"));
    }
}
