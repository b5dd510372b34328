//! `ls`.

use chrono::{DateTime, Utc};

use crate::fs::FsStat;

use super::{args, Command, CommandContext, CommandResult};

pub struct LsCommand;

impl Command for LsCommand {
    fn name(&self) -> &'static str {
        "ls"
    }

    fn execute(&self, ctx: CommandContext) -> CommandResult {
        let parsed = match args::parse(&ctx.args, "la1dAr", "") {
            Ok(parsed) => parsed,
            Err(e) => return CommandResult::error_with_code(format!("ls: {}\n", e), 2),
        };

        let mut operands = parsed.operands.clone();
        if operands.is_empty() {
            operands.push(".".to_string());
        }

        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut exit_code = 0;
        let multiple = operands.len() > 1;

        for (i, operand) in operands.iter().enumerate() {
            let path = ctx.absolute(operand);
            let stat = match ctx.fs.stat(&path) {
                Ok(stat) => stat,
                Err(e) => {
                    stderr.push_str(&format!(
                        "ls: cannot access '{}': {}\n",
                        operand,
                        e.reason()
                    ));
                    exit_code = 2;
                    continue;
                }
            };

            let mut names: Vec<String> = Vec::new();
            if stat.is_directory && !parsed.has('d') {
                match ctx.fs.readdir(&path) {
                    Ok(entries) => {
                        if parsed.has('a') {
                            names.push(".".to_string());
                            names.push("..".to_string());
                        }
                        for entry in entries {
                            if entry.name.starts_with('.') && !parsed.has('a') && !parsed.has('A')
                            {
                                continue;
                            }
                            names.push(entry.name);
                        }
                    }
                    Err(e) => {
                        stderr.push_str(&format!("ls: {}: {}\n", operand, e.reason()));
                        exit_code = 2;
                        continue;
                    }
                }
            } else {
                names.push(operand.clone());
            }
            if parsed.has('r') {
                names.reverse();
            }

            if multiple {
                if i > 0 {
                    stdout.push('\n');
                }
                if stat.is_directory && !parsed.has('d') {
                    stdout.push_str(&format!("{}:\n", operand));
                }
            }

            if parsed.has('l') {
                for name in &names {
                    let entry_path = if stat.is_directory && !parsed.has('d') {
                        ctx.fs.resolve_path(&path, name)
                    } else {
                        path.clone()
                    };
                    let entry_stat = match ctx.fs.lstat(&entry_path) {
                        Ok(stat) => stat,
                        Err(_) => continue,
                    };
                    stdout.push_str(&long_line(&ctx, &entry_stat, &entry_path, name));
                }
            } else {
                for name in &names {
                    stdout.push_str(name);
                    stdout.push('\n');
                }
            }
        }
        CommandResult::with_exit_code(stdout, stderr, exit_code)
    }
}

/// `-rw-r--r-- 1 user user  size date name`, with the mode string derived
/// from the entry type and octal mode bits.
fn long_line(ctx: &CommandContext, stat: &FsStat, path: &str, name: &str) -> String {
    let mtime: DateTime<Utc> = stat.mtime.into();
    let suffix = if stat.is_symlink {
        match ctx.fs.readlink(path) {
            Ok(target) => format!(" -> {}", target),
            Err(_) => String::new(),
        }
    } else {
        String::new()
    };
    format!(
        "{} 1 user user {:>8} {} {}{}\n",
        mode_string(stat),
        stat.size,
        mtime.format("%b %e %H:%M"),
        name,
        suffix
    )
}

/// Type character plus the nine rwx permission characters.
pub fn mode_string(stat: &FsStat) -> String {
    let type_char = if stat.is_symlink {
        'l'
    } else if stat.is_directory {
        'd'
    } else {
        '-'
    };
    let mut out = String::with_capacity(10);
    out.push(type_char);
    for shift in [6u32, 3, 0] {
        let bits = (stat.mode >> shift) & 0o7;
        out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        out.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testkit::ctx_with_files;
    use std::time::SystemTime;

    fn stat(mode: u32, dir: bool, symlink: bool) -> FsStat {
        FsStat {
            is_file: !dir && !symlink,
            is_directory: dir,
            is_symlink: symlink,
            mode,
            size: 0,
            mtime: SystemTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn test_mode_string() {
        assert_eq!(mode_string(&stat(0o644, false, false)), "-rw-r--r--");
        assert_eq!(mode_string(&stat(0o755, true, false)), "drwxr-xr-x");
        assert_eq!(mode_string(&stat(0o777, false, true)), "lrwxrwxrwx");
        assert_eq!(mode_string(&stat(0o600, false, false)), "-rw-------");
    }

    #[test]
    fn test_lists_directory_sorted() {
        let context = ctx_with_files(&["/d"], "", &[("/d/b", ""), ("/d/a", "")]);
        assert_eq!(LsCommand.execute(context).stdout, "a\nb\n");
    }

    #[test]
    fn test_hides_dotfiles_by_default() {
        let context = ctx_with_files(&["/d"], "", &[("/d/.hidden", ""), ("/d/shown", "")]);
        assert_eq!(LsCommand.execute(context).stdout, "shown\n");

        let context = ctx_with_files(&["-A", "/d"], "", &[("/d/.hidden", ""), ("/d/shown", "")]);
        assert_eq!(LsCommand.execute(context).stdout, ".hidden\nshown\n");
    }

    #[test]
    fn test_long_listing_has_mode() {
        let context = ctx_with_files(&["-l", "/d"], "", &[("/d/f", "abc")]);
        let out = LsCommand.execute(context).stdout;
        assert!(out.starts_with("-rw-r--r-- 1 user user"), "got: {}", out);
        assert!(out.contains(" f\n"));
    }

    #[test]
    fn test_missing_operand_is_error() {
        let context = ctx_with_files(&["/nope"], "", &[]);
        let r = LsCommand.execute(context);
        assert_eq!(r.exit_code, 2);
    }

    #[test]
    fn test_file_operand_prints_name() {
        let context = ctx_with_files(&["/f"], "", &[("/f", "")]);
        assert_eq!(LsCommand.execute(context).stdout, "/f\n");
    }
}
