//! The `cd` builtin.

use crate::interp::engine::Engine;
use crate::interp::state::{ExecOutcome, ShellState};

pub fn cd(_: &Engine, state: &mut ShellState, args: &[String], _: &str) -> ExecOutcome {
    let target = match args.first().map(String::as_str) {
        None => match state.get_var("HOME") {
            Some(home) => home.to_string(),
            None => return ExecOutcome::failure("sandsh: cd: HOME not set\n", 1),
        },
        Some("-") => {
            let previous = state.previous_dir.clone();
            let out = change_dir(state, &previous, "-");
            if out.exit_code == 0 {
                return ExecOutcome { stdout: format!("{}\n", state.cwd), ..out };
            }
            return out;
        }
        Some(path) => path.to_string(),
    };
    change_dir(state, &target, &target)
}

fn change_dir(state: &mut ShellState, target: &str, shown: &str) -> ExecOutcome {
    let resolved = state.absolute(target);
    match state.fs.stat(&resolved) {
        Ok(stat) if stat.is_directory => {
            state.previous_dir = state.cwd.clone();
            state.cwd = resolved.clone();
            state.set_var("OLDPWD", state.previous_dir.clone());
            state.set_var("PWD", resolved);
            ExecOutcome::ok()
        }
        Ok(_) => ExecOutcome::failure(format!("sandsh: cd: {}: Not a directory\n", shown), 1),
        Err(_) => {
            ExecOutcome::failure(format!("sandsh: cd: {}: No such file or directory\n", shown), 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::registry::CommandRegistry;
    use crate::fs::{FileSystem, InMemoryFs};
    use crate::interp::state::ExecLimits;
    use std::sync::Arc;

    fn run_cd(args: &[&str], prep: impl FnOnce(&mut ShellState)) -> (ExecOutcome, ShellState) {
        let registry = CommandRegistry::with_defaults();
        let limits = ExecLimits::default();
        let engine = Engine::new(&registry, &limits);
        let fs = InMemoryFs::new();
        fs.mkdir("/home/user", true).unwrap();
        fs.mkdir("/tmp", true).unwrap();
        fs.write_file("/afile", b"").unwrap();
        let mut state = ShellState::new(Arc::new(fs));
        prep(&mut state);
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let out = cd(&engine, &mut state, &args, "");
        (out, state)
    }

    #[test]
    fn test_cd_to_directory() {
        let (out, state) = run_cd(&["/tmp"], |_| {});
        assert_eq!(out.exit_code, 0);
        assert_eq!(state.cwd, "/tmp");
        assert_eq!(state.get_var("PWD"), Some("/tmp"));
    }

    #[test]
    fn test_cd_missing_dir() {
        let (out, state) = run_cd(&["/nope"], |_| {});
        assert_eq!(out.exit_code, 1);
        assert!(out.stderr.contains("No such file or directory"));
        assert_eq!(state.cwd, "/");
    }

    #[test]
    fn test_cd_to_file_fails() {
        let (out, _) = run_cd(&["/afile"], |_| {});
        assert!(out.stderr.contains("Not a directory"));
    }

    #[test]
    fn test_cd_home_default() {
        let (out, state) = run_cd(&[], |st| st.set_var("HOME", "/home/user"));
        assert_eq!(out.exit_code, 0);
        assert_eq!(state.cwd, "/home/user");
    }

    #[test]
    fn test_cd_dash_prints_new_cwd() {
        let (out, state) = run_cd(&["-"], |st| {
            st.previous_dir = "/tmp".to_string();
        });
        assert_eq!(out.stdout, "/tmp\n");
        assert_eq!(state.cwd, "/tmp");
    }

    #[test]
    fn test_cd_relative() {
        let (out, state) = run_cd(&["user"], |st| st.cwd = "/home".to_string());
        assert_eq!(out.exit_code, 0);
        assert_eq!(state.cwd, "/home/user");
    }
}
