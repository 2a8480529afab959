use clap::{Arg, ArgAction, Command, value_parser};

pub fn build_cli() -> Command {
    Command::new("paperview")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Mirror a rendered web page onto a Waveshare 7.5\" e-paper panel")
        .long_about("paperview renders a web page in headless Chrome on a fixed cadence and paints it onto an SPI e-paper panel, using fast partial refreshes between periodic full refreshes. A small HTTP endpoint triggers an immediate full refresh.")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug logging output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only log errors")
                .action(ArgAction::SetTrue)
                .conflicts_with("verbose")
                .global(true),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Config file layered over ~/.paperview and ./.paperview")
                .value_name("PATH")
                .global(true),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("run")
                .about("Run the refresh daemon until SIGINT or SIGTERM")
                .arg(
                    Arg::new("port")
                        .long("port")
                        .short('p')
                        .help("Control server port (overrides config)")
                        .value_parser(value_parser!(u16)),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Print the effective configuration as TOML (secrets redacted)"),
        )
        .subcommand(
            Command::new("capture")
                .about("Render the page once and save the panel-sized grayscale PNG")
                .arg(
                    Arg::new("out")
                        .long("out")
                        .short('o')
                        .help("Output PNG path")
                        .value_name("FILE")
                        .required(true),
                ),
        )
        .subcommand(Command::new("clear").about("Blank the panel and power it down"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_build() {
        let app = build_cli();
        assert_eq!(app.get_name(), "paperview");
    }

    #[test]
    fn test_cli_run_port() {
        let matches = build_cli()
            .try_get_matches_from(["paperview", "run", "--port", "6000"])
            .unwrap();
        let sub = matches.subcommand_matches("run").unwrap();
        assert_eq!(sub.get_one::<u16>("port"), Some(&6000));
    }

    #[test]
    fn test_cli_run_rejects_bad_port() {
        let result = build_cli().try_get_matches_from(["paperview", "run", "--port", "70000"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_capture_requires_out() {
        assert!(
            build_cli()
                .try_get_matches_from(["paperview", "capture"])
                .is_err()
        );
        let matches = build_cli()
            .try_get_matches_from(["paperview", "capture", "--out", "frame.png"])
            .unwrap();
        let sub = matches.subcommand_matches("capture").unwrap();
        assert_eq!(
            sub.get_one::<String>("out").map(String::as_str),
            Some("frame.png")
        );
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let matches = build_cli()
            .try_get_matches_from(["paperview", "config", "-v", "--config", "/tmp/p.toml"])
            .unwrap();
        assert!(matches.get_flag("verbose"));
        assert_eq!(
            matches.get_one::<String>("config").map(String::as_str),
            Some("/tmp/p.toml")
        );
    }

    #[test]
    fn test_cli_verbose_and_quiet_conflict() {
        let result = build_cli().try_get_matches_from(["paperview", "-v", "-q", "config"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(build_cli().try_get_matches_from(["paperview"]).is_err());
    }
}
