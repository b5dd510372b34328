//! `cp`.
//!
//! Implemented on top of the read/write/readdir contract rather than a
//! dedicated fs copy primitive.

use super::{args, Command, CommandContext, CommandResult};

pub struct CpCommand;

impl Command for CpCommand {
    fn name(&self) -> &'static str {
        "cp"
    }

    fn execute(&self, ctx: CommandContext) -> CommandResult {
        let parsed = match args::parse(&ctx.args, "rRfp", "") {
            Ok(parsed) => parsed,
            Err(e) => return CommandResult::error(format!("cp: {}\n", e)),
        };
        let recursive = parsed.has('r') || parsed.has('R');

        if parsed.operands.len() < 2 {
            return CommandResult::error("cp: missing file operand\n");
        }
        let (dest, sources) = parsed.operands.split_last().unwrap();
        let dest_abs = ctx.absolute(dest);
        let dest_is_dir = ctx.fs.stat(&dest_abs).map(|s| s.is_directory).unwrap_or(false);

        if sources.len() > 1 && !dest_is_dir {
            return CommandResult::error(format!("cp: target '{}' is not a directory\n", dest));
        }

        let mut stderr = String::new();
        let mut exit_code = 0;
        for source in sources {
            let src_abs = ctx.absolute(source);
            let target = if dest_is_dir {
                format!("{}/{}", dest_abs.trim_end_matches('/'), crate::fs::base_name(&src_abs))
            } else {
                dest_abs.clone()
            };
            if let Err(message) = copy_entry(&ctx, &src_abs, &target, source, recursive) {
                stderr.push_str(&message);
                exit_code = 1;
            }
        }
        CommandResult::with_exit_code(String::new(), stderr, exit_code)
    }
}

fn copy_entry(
    ctx: &CommandContext,
    src: &str,
    dest: &str,
    shown: &str,
    recursive: bool,
) -> Result<(), String> {
    let stat = ctx
        .fs
        .stat(src)
        .map_err(|e| format!("cp: cannot stat '{}': {}\n", shown, e.reason()))?;

    if stat.is_directory {
        if !recursive {
            return Err(format!("cp: -r not specified; omitting directory '{}'\n", shown));
        }
        ctx.fs
            .mkdir(dest, true)
            .map_err(|e| format!("cp: cannot create directory '{}': {}\n", dest, e.reason()))?;
        let entries = ctx
            .fs
            .readdir(src)
            .map_err(|e| format!("cp: cannot read '{}': {}\n", shown, e.reason()))?;
        for entry in entries {
            copy_entry(
                ctx,
                &format!("{}/{}", src, entry.name),
                &format!("{}/{}", dest, entry.name),
                &format!("{}/{}", shown, entry.name),
                recursive,
            )?;
        }
        return Ok(());
    }

    let content = ctx
        .fs
        .read_file_bytes(src)
        .map_err(|e| format!("cp: cannot read '{}': {}\n", shown, e.reason()))?;
    ctx.fs
        .write_file(dest, &content)
        .map_err(|e| format!("cp: cannot write '{}': {}\n", dest, e.reason()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testkit::ctx_with_files;

    #[test]
    fn test_copy_file() {
        let context = ctx_with_files(&["/a", "/b"], "", &[("/a", "data")]);
        let fs = context.fs.clone();
        assert_eq!(CpCommand.execute(context).exit_code, 0);
        assert_eq!(fs.read_file("/b").unwrap(), "data");
        assert_eq!(fs.read_file("/a").unwrap(), "data");
    }

    #[test]
    fn test_copy_into_directory() {
        let context = ctx_with_files(&["/a", "/dir"], "", &[("/a", "x"), ("/dir/existing", "")]);
        let fs = context.fs.clone();
        assert_eq!(CpCommand.execute(context).exit_code, 0);
        assert_eq!(fs.read_file("/dir/a").unwrap(), "x");
    }

    #[test]
    fn test_directory_requires_recursive() {
        let context = ctx_with_files(&["/d", "/e"], "", &[("/d/f", "1")]);
        let r = CpCommand.execute(context);
        assert_eq!(r.exit_code, 1);
        assert!(r.stderr.contains("-r not specified"));
    }

    #[test]
    fn test_recursive_copy() {
        let context = ctx_with_files(&["-r", "/d", "/copy"], "", &[("/d/sub/f", "deep")]);
        let fs = context.fs.clone();
        assert_eq!(CpCommand.execute(context).exit_code, 0);
        assert_eq!(fs.read_file("/copy/sub/f").unwrap(), "deep");
    }

    #[test]
    fn test_multiple_sources_need_directory_target() {
        let context = ctx_with_files(&["/a", "/b", "/c"], "", &[("/a", "1"), ("/b", "2")]);
        let r = CpCommand.execute(context);
        assert_eq!(r.exit_code, 1);
    }
}
