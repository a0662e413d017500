use std::path::PathBuf;

use clap::Parser;
use webtty_config::WebTtyConfig;

/// webtty: shell sessions for browser terminals over WebSocket.
#[derive(Parser, Debug)]
#[command(name = "webtty", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to listen on.
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Port to listen on.
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Shell program to spawn for each session.
    #[arg(short, long)]
    pub shell: Option<String>,

    /// Log filter directive (e.g. `debug` or `webtty_server=trace`).
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Args {
    /// Overlay command-line flags on the loaded config.
    pub fn apply(&self, config: &mut WebTtyConfig) {
        if let Some(bind) = &self.bind {
            config.server.bind = bind.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(shell) = &self.shell {
            config.shell.program = shell.clone();
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_flags_leave_config_untouched() {
        let args = Args::try_parse_from(["webtty"]).unwrap();
        let mut config = WebTtyConfig::default();
        args.apply(&mut config);
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.server.bind, "0.0.0.0");
        assert!(config.shell.program.is_empty());
    }

    #[test]
    fn flags_override_config() {
        let args = Args::try_parse_from([
            "webtty",
            "--bind",
            "127.0.0.1",
            "-p",
            "4000",
            "--shell",
            "/bin/zsh",
            "--log-level",
            "debug",
        ])
        .unwrap();
        let mut config = WebTtyConfig::default();
        args.apply(&mut config);
        assert_eq!(config.server.listen_addr(), "127.0.0.1:4000");
        assert_eq!(config.shell.program, "/bin/zsh");
        assert_eq!(args.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn config_path_flag() {
        let args = Args::try_parse_from(["webtty", "--config", "/etc/webtty.toml"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("/etc/webtty.toml")));
    }

    #[test]
    fn invalid_port_is_rejected() {
        assert!(Args::try_parse_from(["webtty", "--port", "70000"]).is_err());
    }
}
