//! Turning the loaded configuration into shell spawn options.

use std::path::PathBuf;

use webtty_config::WebTtyConfig;
use webtty_pty::shell::detect_shell;
use webtty_pty::{PtyError, SpawnOptions, TtySize};

/// Build the options every session spawns its shell with.
///
/// Fails only when the configured terminal size is zero in either dimension.
pub fn spawn_options(config: &WebTtyConfig) -> Result<SpawnOptions, PtyError> {
    let program = config
        .shell
        .program()
        .map(str::to_string)
        .unwrap_or_else(detect_shell);

    let mut options = SpawnOptions::new(program);
    options.args = config.shell.args.clone();
    options.size = TtySize::new(config.terminal.cols, config.terminal.rows)?;
    options.working_dir = config.shell.working_directory().map(PathBuf::from);
    options.inherit_env = config.shell.inherit_env;
    options.term = config.shell.term.clone();
    options.env = config.shell.env.clone();
    options.output_queue = config.terminal.output_queue.max(1) as usize;
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_detect_shell() {
        let options = spawn_options(&WebTtyConfig::default()).unwrap();
        assert!(!options.program.is_empty());
        assert_eq!(options.size, TtySize::default());
        assert_eq!(options.term, "xterm-color");
        assert!(options.working_dir.is_none());
        assert!(options.inherit_env);
        assert_eq!(options.output_queue, 256);
    }

    #[test]
    fn configured_values_are_carried_over() {
        let mut config = WebTtyConfig::default();
        config.shell.program = "/bin/zsh".into();
        config.shell.args = vec!["-l".into()];
        config.shell.working_directory = "/tmp".into();
        config.shell.inherit_env = false;
        config.shell.env.insert("EDITOR".into(), "vi".into());
        config.terminal.cols = 132;
        config.terminal.rows = 43;

        let options = spawn_options(&config).unwrap();
        assert_eq!(options.program, "/bin/zsh");
        assert_eq!(options.args, vec!["-l"]);
        assert_eq!(options.working_dir, Some(PathBuf::from("/tmp")));
        assert!(!options.inherit_env);
        assert_eq!(options.env.get("EDITOR").map(String::as_str), Some("vi"));
        assert_eq!(options.size, TtySize::new(132, 43).unwrap());
    }

    #[test]
    fn zero_size_is_rejected() {
        let mut config = WebTtyConfig::default();
        config.terminal.rows = 0;
        assert!(matches!(
            spawn_options(&config),
            Err(PtyError::InvalidSize { cols: 80, rows: 0 })
        ));
    }
}
