//! `grep`.

use regex_lite::RegexBuilder;

use super::{args, Command, CommandContext, CommandResult};

pub struct GrepCommand;

impl Command for GrepCommand {
    fn name(&self) -> &'static str {
        "grep"
    }

    fn execute(&self, ctx: CommandContext) -> CommandResult {
        let parsed = match args::parse(&ctx.args, "ivnclqoEFrh", "e") {
            Ok(parsed) => parsed,
            Err(e) => return CommandResult::error_with_code(format!("grep: {}\n", e), 2),
        };

        let (pattern, files) = match parsed.value('e') {
            Some(p) => (p.to_string(), parsed.operands.clone()),
            None => match parsed.operands.split_first() {
                Some((p, rest)) => (p.clone(), rest.to_vec()),
                None => {
                    return CommandResult::error_with_code(
                        "usage: grep [-ivnclqoEF] pattern [file ...]\n",
                        2,
                    )
                }
            },
        };

        let regex_source = if parsed.has('F') {
            regex_lite::escape(&pattern)
        } else {
            translate_posix_classes(&pattern)
        };
        let regex = match RegexBuilder::new(&regex_source)
            .case_insensitive(parsed.has('i'))
            .build()
        {
            Ok(regex) => regex,
            Err(_) => {
                return CommandResult::error_with_code(
                    format!("grep: invalid pattern: {}\n", pattern),
                    2,
                )
            }
        };

        let mut inputs: Vec<(Option<String>, String)> = Vec::new();
        let mut stderr = String::new();
        let mut failed = false;
        if files.is_empty() {
            inputs.push((None, ctx.stdin.clone()));
        } else {
            for file in &files {
                if parsed.has('r') {
                    collect_recursive(&ctx, file, &mut inputs, &mut stderr, &mut failed);
                } else {
                    match ctx.read_input(file) {
                        Ok(content) => inputs.push((Some(file.clone()), content)),
                        Err(message) => {
                            stderr.push_str(&format!("grep: {}\n", message));
                            failed = true;
                        }
                    }
                }
            }
        }

        let show_names = inputs.len() > 1 && !parsed.has('h');
        let mut stdout = String::new();
        let mut matched_any = false;

        for (name, content) in &inputs {
            let mut file_matches = 0usize;
            for (lineno, line) in content.lines().enumerate() {
                let is_match = regex.is_match(line) != parsed.has('v');
                if !is_match {
                    continue;
                }
                file_matches += 1;
                matched_any = true;
                if parsed.has('q') {
                    return CommandResult::with_exit_code(String::new(), String::new(), 0);
                }
                if parsed.has('c') || parsed.has('l') {
                    continue;
                }
                let prefix = match (show_names, name) {
                    (true, Some(n)) => format!("{}:", n),
                    _ => String::new(),
                };
                let numbered = if parsed.has('n') {
                    format!("{}{}:", prefix, lineno + 1)
                } else {
                    prefix
                };
                if parsed.has('o') {
                    for m in regex.find_iter(line) {
                        stdout.push_str(&format!("{}{}\n", numbered, m.as_str()));
                    }
                } else {
                    stdout.push_str(&format!("{}{}\n", numbered, line));
                }
            }
            if parsed.has('c') {
                match name {
                    Some(n) if show_names => stdout.push_str(&format!("{}:{}\n", n, file_matches)),
                    _ => stdout.push_str(&format!("{}\n", file_matches)),
                }
            }
            if parsed.has('l') && file_matches > 0 {
                if let Some(n) = name {
                    stdout.push_str(&format!("{}\n", n));
                }
            }
        }

        let exit_code = if failed {
            2
        } else if matched_any {
            0
        } else {
            1
        };
        CommandResult::with_exit_code(stdout, stderr, exit_code)
    }
}

fn collect_recursive(
    ctx: &CommandContext,
    root: &str,
    inputs: &mut Vec<(Option<String>, String)>,
    stderr: &mut String,
    failed: &mut bool,
) {
    let absolute = ctx.absolute(root);
    match ctx.fs.stat(&absolute) {
        Ok(stat) if stat.is_directory => match ctx.fs.readdir(&absolute) {
            Ok(entries) => {
                for entry in entries {
                    let child = format!("{}/{}", root.trim_end_matches('/'), entry.name);
                    collect_recursive(ctx, &child, inputs, stderr, failed);
                }
            }
            Err(e) => {
                stderr.push_str(&format!("grep: {}: {}\n", root, e.reason()));
                *failed = true;
            }
        },
        Ok(_) => match ctx.fs.read_file(&absolute) {
            Ok(content) => inputs.push((Some(root.to_string()), content)),
            Err(e) => {
                stderr.push_str(&format!("grep: {}: {}\n", root, e.reason()));
                *failed = true;
            }
        },
        Err(e) => {
            stderr.push_str(&format!("grep: {}: {}\n", root, e.reason()));
            *failed = true;
        }
    }
}

/// Expand `[[:alpha:]]`-style classes into plain character classes.
pub fn translate_posix_classes(pattern: &str) -> String {
    pattern
        .replace("[[:alpha:]]", "[A-Za-z]")
        .replace("[[:digit:]]", "[0-9]")
        .replace("[[:alnum:]]", "[A-Za-z0-9]")
        .replace("[[:space:]]", "[ \\t\\n\\r\\x0b\\x0c]")
        .replace("[[:upper:]]", "[A-Z]")
        .replace("[[:lower:]]", "[a-z]")
        .replace("[[:blank:]]", "[ \\t]")
        .replace("[[:punct:]]", "[!-/:-@\\[-`{-~]")
        .replace("[[:xdigit:]]", "[0-9A-Fa-f]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testkit::{ctx, ctx_with_files};

    fn run(args: &[&str], stdin: &str) -> CommandResult {
        GrepCommand.execute(ctx(args, stdin))
    }

    #[test]
    fn test_basic_match() {
        let r = run(&["world"], "hello world\ngoodbye\n");
        assert_eq!(r.stdout, "hello world\n");
        assert_eq!(r.exit_code, 0);
    }

    #[test]
    fn test_no_match_exit_1() {
        let r = run(&["absent"], "text\n");
        assert_eq!(r.exit_code, 1);
        assert!(r.stdout.is_empty());
    }

    #[test]
    fn test_invert() {
        assert_eq!(run(&["-v", "a"], "apple\nberry\n").stdout, "berry\n");
    }

    #[test]
    fn test_line_numbers() {
        assert_eq!(run(&["-n", "b"], "a\nb\nc\nb\n").stdout, "2:b\n4:b\n");
    }

    #[test]
    fn test_count() {
        assert_eq!(run(&["-c", "a"], "a\nb\na\n").stdout, "2\n");
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(run(&["-i", "hello"], "HELLO\n").stdout, "HELLO\n");
    }

    #[test]
    fn test_only_matching() {
        assert_eq!(run(&["-o", "[0-9]+"], "a1b22c\n").stdout, "1\n22\n");
    }

    #[test]
    fn test_quiet() {
        let r = run(&["-q", "x"], "x\n");
        assert!(r.stdout.is_empty());
        assert_eq!(r.exit_code, 0);
    }

    #[test]
    fn test_fixed_strings() {
        assert_eq!(run(&["-F", "a.b"], "a.b\naxb\n").stdout, "a.b\n");
    }

    #[test]
    fn test_file_and_names() {
        let r = GrepCommand.execute(ctx_with_files(
            &["x", "/a", "/b"],
            "",
            &[("/a", "x1\n"), ("/b", "nothing\nx2\n")],
        ));
        assert_eq!(r.stdout, "/a:x1\n/b:x2\n");
    }

    #[test]
    fn test_files_with_matches() {
        let r = GrepCommand.execute(ctx_with_files(
            &["-l", "x", "/a", "/b"],
            "",
            &[("/a", "x\n"), ("/b", "y\n")],
        ));
        assert_eq!(r.stdout, "/a\n");
    }

    #[test]
    fn test_posix_class() {
        assert_eq!(run(&["[[:digit:]]+"], "abc\na12\n").stdout, "a12\n");
    }

    #[test]
    fn test_recursive() {
        let r = GrepCommand.execute(ctx_with_files(
            &["-r", "needle", "/dir"],
            "",
            &[("/dir/one", "needle here\n"), ("/dir/sub/two", "nothing\n")],
        ));
        assert_eq!(r.stdout, "/dir/one:needle here\n");
    }
}
