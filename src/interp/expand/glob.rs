//! Pathname Expansion
//!
//! Matches a glob-pattern field against the in-memory filesystem by walking
//! one path component at a time. No match leaves the word untouched (the
//! caller falls back to the literal text).

use crate::interp::state::ShellState;

use super::pattern::{has_glob_chars, pattern_match, unescape_glob};

/// Expand a pattern against the filesystem. Returns `None` when nothing
/// matches; matches come back sorted, in the same relative/absolute shape
/// as the pattern.
pub fn expand_glob(state: &ShellState, pattern: &str) -> Option<Vec<String>> {
    let absolute = pattern.starts_with('/');
    let components: Vec<&str> =
        pattern.split('/').filter(|component| !component.is_empty()).collect();
    if components.is_empty() {
        return None;
    }

    // (display form, absolute path) per surviving candidate.
    let mut candidates: Vec<(String, String)> = if absolute {
        vec![("".to_string(), "/".to_string())]
    } else {
        vec![("".to_string(), state.cwd.clone())]
    };

    for component in &components {
        let mut next = Vec::new();
        if has_glob_chars(component) {
            let allow_hidden = component.starts_with('.') || component.starts_with("\\.");
            for (display, path) in &candidates {
                let Ok(entries) = state.fs.readdir(path) else { continue };
                for entry in entries {
                    if entry.name.starts_with('.') && !allow_hidden {
                        continue;
                    }
                    if pattern_match(component, &entry.name) {
                        next.push((join_display(display, &entry.name, absolute), state.fs.resolve_path(path, &entry.name)));
                    }
                }
            }
        } else {
            let literal = unescape_glob(component);
            for (display, path) in &candidates {
                let child = state.fs.resolve_path(path, &literal);
                if state.fs.exists(&child) {
                    next.push((join_display(display, &literal, absolute), child));
                }
            }
        }
        candidates = next;
        if candidates.is_empty() {
            return None;
        }
    }

    let mut names: Vec<String> = candidates.into_iter().map(|(display, _)| display).collect();
    names.sort();
    names.dedup();
    Some(names)
}

fn join_display(display: &str, name: &str, absolute: bool) -> String {
    if display.is_empty() {
        if absolute {
            format!("/{}", name)
        } else {
            name.to_string()
        }
    } else {
        format!("{}/{}", display, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{FileSystem, InMemoryFs};
    use std::sync::Arc;

    fn state_with_files(files: &[&str]) -> ShellState {
        let fs = InMemoryFs::new();
        for path in files {
            if path.ends_with('/') {
                fs.mkdir(path.trim_end_matches('/'), true).unwrap();
            } else {
                let dir = crate::fs::dir_name(path);
                if dir != "/" {
                    fs.mkdir(&dir, true).unwrap();
                }
                fs.write_file(path, b"").unwrap();
            }
        }
        let mut state = ShellState::new(Arc::new(fs));
        state.cwd = "/work".to_string();
        state
    }

    #[test]
    fn test_star_in_cwd() {
        let state = state_with_files(&["/work/a.txt", "/work/b.txt", "/work/c.md"]);
        assert_eq!(
            expand_glob(&state, "*.txt"),
            Some(vec!["a.txt".to_string(), "b.txt".to_string()])
        );
    }

    #[test]
    fn test_no_match_returns_none() {
        let state = state_with_files(&["/work/a.txt"]);
        assert_eq!(expand_glob(&state, "*.rs"), None);
    }

    #[test]
    fn test_absolute_pattern() {
        let state = state_with_files(&["/data/x.log", "/data/y.log"]);
        assert_eq!(
            expand_glob(&state, "/data/*.log"),
            Some(vec!["/data/x.log".to_string(), "/data/y.log".to_string()])
        );
    }

    #[test]
    fn test_multi_component_glob() {
        let state = state_with_files(&["/work/a/f.txt", "/work/b/f.txt", "/work/c/g.md"]);
        assert_eq!(
            expand_glob(&state, "*/f.txt"),
            Some(vec!["a/f.txt".to_string(), "b/f.txt".to_string()])
        );
    }

    #[test]
    fn test_hidden_files_need_explicit_dot() {
        let state = state_with_files(&["/work/.hidden", "/work/shown"]);
        assert_eq!(expand_glob(&state, "*"), Some(vec!["shown".to_string()]));
        assert_eq!(expand_glob(&state, ".*"), Some(vec![".hidden".to_string()]));
    }

    #[test]
    fn test_question_mark() {
        let state = state_with_files(&["/work/ab", "/work/ac", "/work/abc"]);
        assert_eq!(expand_glob(&state, "a?"), Some(vec!["ab".to_string(), "ac".to_string()]));
    }

    #[test]
    fn test_escaped_star_matches_literal_only() {
        let state = state_with_files(&["/work/*", "/work/x"]);
        assert_eq!(expand_glob(&state, "\\*"), Some(vec!["*".to_string()]));
    }
}
