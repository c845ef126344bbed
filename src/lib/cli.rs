use clap::Parser;
use serde::Serialize;

use crate::lib::recommender::DEFAULT_TARGET_PERCENT;

/// Volume compression resize recommender
///
/// Reads compression savings for every volume on an aggregate and prints
/// the `volume size` commands that would give that space back to users.
/// Options are written with a single dash (`-cluster`); the double-dash
/// form is accepted as well.
#[derive(Parser, Debug)]
#[command(name = "volume-compression-resize", author, version, about, styles=get_styles())]
pub struct Cli {
    /// Cluster management hostname or IP
    ///
    /// A full `https://host:port` URL is also accepted.
    #[arg(long, value_name = "HOST")]
    pub cluster: String,

    /// Aggregate whose volumes are inspected
    #[arg(long, value_name = "AGGREGATE")]
    pub aggr: String,

    /// Username for authentication (the password is prompted for)
    #[arg(long, value_name = "USER")]
    pub user: String,

    /// Only report volumes whose utilization without compression exceeds the target
    #[arg(long)]
    pub check: bool,

    /// Target utilization percentage used by -check and FlexGroup reporting
    #[arg(
        long,
        value_name = "PERCENT",
        default_value_t = DEFAULT_TARGET_PERCENT,
        value_parser = clap::value_parser!(u8).range(1..=100)
    )]
    pub target: u8,

    /// Print the intermediate sizing figures for each volume
    #[arg(long)]
    pub debug: bool,

    /// Dump the raw volume record returned by the cluster
    #[arg(long, visible_alias = "details")]
    pub xml: bool,

    /// Output format: text (default) or json
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub output: OutputFormat,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress log output to stderr (logs still written to file)
    #[arg(short, long)]
    pub quiet: bool,
}

/// Output format for the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Resize commands and informational lines
    Text,
    /// Single JSON document
    Json,
}

/// Parse the process arguments, accepting single-dash long options
pub fn parse_args() -> Cli {
    Cli::parse_from(normalize_args(std::env::args()))
}

/// Rewrite `-name` style options to `--name` so clap can parse them
///
/// Single-character flags (`-v`, `-h`), arguments that already use two
/// dashes, negative numbers and everything after a bare `--` are left alone.
pub fn normalize_args<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut normalized = Vec::new();
    let mut passthrough = false;

    for (i, arg) in args.into_iter().enumerate() {
        if i == 0 || passthrough {
            normalized.push(arg);
            continue;
        }

        if arg == "--" {
            passthrough = true;
            normalized.push(arg);
            continue;
        }

        let is_single_dash_long = arg.len() > 2
            && arg.starts_with('-')
            && !arg.starts_with("--")
            && arg[1..].starts_with(|c: char| c.is_ascii_alphabetic());

        if is_single_dash_long {
            normalized.push(format!("-{}", arg));
        } else {
            normalized.push(arg);
        }
    }

    normalized
}

/// Set color and variants for help description
///
/// Thanks to [Praveen Perera](https://stackoverflow.com/a/76916424)
fn get_styles() -> clap::builder::Styles {
    clap::builder::Styles::styled()
        .usage(
            anstyle::Style::new()
                .bold()
                .underline()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
        )
        .header(
            anstyle::Style::new()
                .bold()
                .underline()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
        )
        .literal(
            anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
        )
        .invalid(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
        )
        .error(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
        )
        .valid(
            anstyle::Style::new()
                .bold()
                .underline()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
        )
        .placeholder(
            anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn parse(list: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(normalize_args(args(list)))
    }

    #[test]
    fn single_dash_options_are_promoted() {
        let normalized = normalize_args(args(&[
            "volume-compression-resize",
            "-cluster",
            "cluster1",
            "-v",
            "--aggr",
            "aggr1",
            "-target=80",
            "--",
            "-debug",
        ]));

        assert_eq!(
            normalized,
            args(&[
                "volume-compression-resize",
                "--cluster",
                "cluster1",
                "-v",
                "--aggr",
                "aggr1",
                "--target=80",
                "--",
                "-debug",
            ])
        );
    }

    #[test]
    fn parses_single_dash_invocation() {
        let cli = parse(&[
            "volume-compression-resize",
            "-cluster",
            "cluster1.example.com",
            "-aggr",
            "aggr1",
            "-user",
            "admin",
            "-check",
            "-target",
            "85",
            "-details",
        ])
        .unwrap();

        assert_eq!(cli.cluster, "cluster1.example.com");
        assert_eq!(cli.aggr, "aggr1");
        assert_eq!(cli.user, "admin");
        assert!(cli.check);
        assert_eq!(cli.target, 85);
        assert!(cli.xml);
        assert!(!cli.debug);
        assert_eq!(cli.output, OutputFormat::Text);
    }

    #[test]
    fn target_defaults_to_ninety() {
        let cli = parse(&[
            "volume-compression-resize",
            "-cluster",
            "c",
            "-aggr",
            "a",
            "-user",
            "u",
        ])
        .unwrap();

        assert_eq!(cli.target, 90);
        assert!(!cli.check);
    }

    #[test]
    fn rejects_out_of_range_target() {
        for target in ["0", "101"] {
            let result = parse(&[
                "volume-compression-resize",
                "-cluster",
                "c",
                "-aggr",
                "a",
                "-user",
                "u",
                "-target",
                target,
            ]);
            assert!(result.is_err(), "target {target} should be rejected");
        }
    }

    #[test]
    fn requires_cluster_aggr_and_user() {
        assert!(parse(&["volume-compression-resize", "-cluster", "c", "-aggr", "a"]).is_err());
    }
}
