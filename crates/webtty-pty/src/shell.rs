//! Default shell resolution and the environment allowlist used when a
//! session does not inherit the server's full environment.

use std::path::Path;

/// Variables passed through to the child when `inherit_env` is off.
pub const ALLOWED_ENV_VARS: &[&str] = &[
    "HOME",
    "USER",
    "LOGNAME",
    "SHELL",
    "PATH",
    "LANG",
    "LC_ALL",
    "LC_CTYPE",
    "TMPDIR",
    "TMP",
    "TEMP",
    "XDG_RUNTIME_DIR",
    // Windows
    "USERPROFILE",
    "APPDATA",
    "LOCALAPPDATA",
    "SystemRoot",
    "COMSPEC",
];

/// Pick the shell to run when none is configured.
///
/// `$SHELL` wins when set and non-empty. Otherwise `bash` from the usual
/// location, falling back to `/bin/sh`. On Windows `%COMSPEC%` or `cmd.exe`.
pub fn detect_shell() -> String {
    #[cfg(windows)]
    {
        non_empty_var("COMSPEC").unwrap_or_else(|| "cmd.exe".to_string())
    }

    #[cfg(not(windows))]
    {
        resolve_shell(non_empty_var("SHELL"), |p| p.exists())
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg_attr(windows, allow(dead_code))]
fn resolve_shell(from_env: Option<String>, exists: impl Fn(&Path) -> bool) -> String {
    if let Some(shell) = from_env {
        return shell;
    }
    if exists(Path::new("/bin/bash")) {
        "/bin/bash".to_string()
    } else {
        "/bin/sh".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_shell_returns_non_empty() {
        assert!(!detect_shell().is_empty());
    }

    #[test]
    fn env_shell_wins() {
        let shell = resolve_shell(Some("/usr/bin/fish".into()), |_| true);
        assert_eq!(shell, "/usr/bin/fish");
    }

    #[test]
    fn falls_back_to_bash() {
        assert_eq!(resolve_shell(None, |_| true), "/bin/bash");
    }

    #[test]
    fn falls_back_to_sh_without_bash() {
        assert_eq!(resolve_shell(None, |_| false), "/bin/sh");
    }

    #[test]
    fn allowlist_covers_basics() {
        for key in ["HOME", "PATH", "LANG"] {
            assert!(ALLOWED_ENV_VARS.contains(&key), "{key} missing");
        }
        assert!(!ALLOWED_ENV_VARS.contains(&"TERM"));
    }
}
