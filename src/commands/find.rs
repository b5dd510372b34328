//! `find`.
//!
//! Depth-first walk with the common predicates: `-name`, `-path`, `-type`,
//! `-maxdepth`/`-mindepth`, and the `-print`/`-print0` actions.

use crate::interp::expand::pattern::pattern_match;

use super::{Command, CommandContext, CommandResult};

pub struct FindCommand;

#[derive(Default)]
struct FindSpec {
    name: Option<String>,
    path: Option<String>,
    kind: Option<char>,
    maxdepth: Option<usize>,
    mindepth: usize,
    print0: bool,
}

impl Command for FindCommand {
    fn name(&self) -> &'static str {
        "find"
    }

    fn execute(&self, ctx: CommandContext) -> CommandResult {
        let mut roots: Vec<String> = Vec::new();
        let mut spec = FindSpec::default();

        let mut iter = ctx.args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "-name" => match iter.next() {
                    Some(value) => spec.name = Some(value.clone()),
                    None => return missing_arg("-name"),
                },
                "-path" => match iter.next() {
                    Some(value) => spec.path = Some(value.clone()),
                    None => return missing_arg("-path"),
                },
                "-type" => match iter.next().map(String::as_str) {
                    Some("f") => spec.kind = Some('f'),
                    Some("d") => spec.kind = Some('d'),
                    Some("l") => spec.kind = Some('l'),
                    Some(other) => {
                        return CommandResult::error(format!(
                            "find: unknown argument to -type: {}\n",
                            other
                        ))
                    }
                    None => return missing_arg("-type"),
                },
                "-maxdepth" => match iter.next().and_then(|v| v.parse().ok()) {
                    Some(depth) => spec.maxdepth = Some(depth),
                    None => return missing_arg("-maxdepth"),
                },
                "-mindepth" => match iter.next().and_then(|v| v.parse().ok()) {
                    Some(depth) => spec.mindepth = depth,
                    None => return missing_arg("-mindepth"),
                },
                "-print" => spec.print0 = false,
                "-print0" => spec.print0 = true,
                other if !other.starts_with('-') => roots.push(other.to_string()),
                other => {
                    return CommandResult::error(format!("find: unknown predicate: {}\n", other))
                }
            }
        }
        if roots.is_empty() {
            roots.push(".".to_string());
        }

        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut exit_code = 0;
        for root in &roots {
            if !ctx.fs.exists(&ctx.absolute(root)) {
                stderr.push_str(&format!(
                    "find: '{}': No such file or directory\n",
                    root
                ));
                exit_code = 1;
                continue;
            }
            walk(&ctx, root, 0, &spec, &mut stdout);
        }
        CommandResult::with_exit_code(stdout, stderr, exit_code)
    }
}

fn missing_arg(predicate: &str) -> CommandResult {
    CommandResult::error(format!("find: missing argument to `{}'\n", predicate))
}

fn walk(ctx: &CommandContext, shown: &str, depth: usize, spec: &FindSpec, out: &mut String) {
    let absolute = ctx.absolute(shown);
    let Ok(stat) = ctx.fs.lstat(&absolute) else { return };

    let matches = depth >= spec.mindepth
        && spec.maxdepth.map_or(true, |max| depth <= max)
        && match spec.kind {
            Some('f') => stat.is_file,
            Some('d') => stat.is_directory,
            Some('l') => stat.is_symlink,
            _ => true,
        }
        && spec
            .name
            .as_ref()
            .map_or(true, |pattern| pattern_match(pattern, &crate::fs::base_name(shown)))
        && spec.path.as_ref().map_or(true, |pattern| pattern_match(pattern, shown));

    if matches {
        out.push_str(shown);
        out.push(if spec.print0 { '\0' } else { '\n' });
    }

    if stat.is_directory && spec.maxdepth.map_or(true, |max| depth < max) {
        if let Ok(entries) = ctx.fs.readdir(&absolute) {
            for entry in entries {
                let child = format!("{}/{}", shown.trim_end_matches('/'), entry.name);
                walk(ctx, &child, depth + 1, spec, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testkit::ctx_with_files;

    fn fixture(args: &[&str]) -> CommandResult {
        FindCommand.execute(ctx_with_files(
            args,
            "",
            &[
                ("/work/a.txt", ""),
                ("/work/b.md", ""),
                ("/work/sub/c.txt", ""),
                ("/work/sub/deep/d.txt", ""),
            ],
        ))
    }

    #[test]
    fn test_walks_everything() {
        let r = fixture(&["/work"]);
        assert_eq!(
            r.stdout,
            "/work\n/work/a.txt\n/work/b.md\n/work/sub\n/work/sub/c.txt\n/work/sub/deep\n/work/sub/deep/d.txt\n"
        );
    }

    #[test]
    fn test_name_filter() {
        let r = fixture(&["/work", "-name", "*.txt"]);
        assert_eq!(r.stdout, "/work/a.txt\n/work/sub/c.txt\n/work/sub/deep/d.txt\n");
    }

    #[test]
    fn test_type_filter() {
        let r = fixture(&["/work", "-type", "d"]);
        assert_eq!(r.stdout, "/work\n/work/sub\n/work/sub/deep\n");
    }

    #[test]
    fn test_maxdepth() {
        let r = fixture(&["/work", "-maxdepth", "1"]);
        assert_eq!(r.stdout, "/work\n/work/a.txt\n/work/b.md\n/work/sub\n");
    }

    #[test]
    fn test_mindepth() {
        let r = fixture(&["/work", "-mindepth", "2", "-name", "*.txt"]);
        assert_eq!(r.stdout, "/work/sub/c.txt\n/work/sub/deep/d.txt\n");
    }

    #[test]
    fn test_print0_uses_nul_with_trailing() {
        let r = fixture(&["/work", "-maxdepth", "1", "-type", "f", "-print0"]);
        assert_eq!(r.stdout, "/work/a.txt\0/work/b.md\0");
    }

    #[test]
    fn test_missing_root() {
        let r = fixture(&["/absent"]);
        assert_eq!(r.exit_code, 1);
        assert!(r.stderr.contains("No such file"));
    }

    #[test]
    fn test_path_filter() {
        let r = fixture(&["/work", "-path", "*sub*", "-type", "f"]);
        assert_eq!(r.stdout, "/work/sub/c.txt\n/work/sub/deep/d.txt\n");
    }
}
