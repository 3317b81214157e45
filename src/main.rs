use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use openvas_reporting::core::config::Config;
use openvas_reporting::{ReportingError, ReportingResult};

fn main() {
    let matches = build_cli().get_matches();

    // Set up the logging subscriber
    let level = if matches.get_flag("verbose") {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let config = match config_from_matches(&matches) {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            std::process::exit(2);
        }
    };

    info!(
        inputs = config.input_files.len(),
        mode = %config.report_type,
        "converting OpenVAS report"
    );

    match openvas_reporting::run(&config) {
        Ok(path) => info!("report written to {}", path.display()),
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    }
}

fn build_cli() -> Command {
    Command::new("openvas-reporting")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert OpenVAS XML scan reports into readable summaries")
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("FILE")
                .action(ArgAction::Append)
                .help("OpenVAS XML report to ingest (repeatable)"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Output file; the format's extension is appended when missing"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("YAML config file; command-line flags override its values"),
        )
        .arg(
            Arg::new("level")
                .short('l')
                .long("level")
                .value_name("LEVEL")
                .help("Minimum severity level to report (critical, high, medium, low, none)"),
        )
        .arg(
            Arg::new("type")
                .short('t')
                .long("type")
                .value_name("TYPE")
                .help("Group findings by 'vulnerability' or by 'host'"),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_name("FORMAT")
                .help("Output format (csv, txt, html, json)"),
        )
        .arg(
            Arg::new("include-network")
                .long("include-network")
                .value_name("RANGE")
                .action(ArgAction::Append)
                .help("Only report hosts in this IP, CIDR block or start-end range (repeatable)"),
        )
        .arg(
            Arg::new("exclude-network")
                .long("exclude-network")
                .value_name("RANGE")
                .action(ArgAction::Append)
                .help("Drop hosts in this IP, CIDR block or start-end range (repeatable)"),
        )
        .arg(
            Arg::new("include-regex")
                .long("include-regex")
                .value_name("PATTERN")
                .action(ArgAction::Append)
                .help("Only report findings whose name matches (case-insensitive, repeatable)"),
        )
        .arg(
            Arg::new("exclude-regex")
                .long("exclude-regex")
                .value_name("PATTERN")
                .action(ArgAction::Append)
                .help("Drop findings whose name matches (case-insensitive, repeatable)"),
        )
        .arg(
            Arg::new("include-cve")
                .long("include-cve")
                .value_name("CVE")
                .action(ArgAction::Append)
                .help("Only report findings carrying one of these CVE ids (repeatable)"),
        )
        .arg(
            Arg::new("exclude-cve")
                .long("exclude-cve")
                .value_name("CVE")
                .action(ArgAction::Append)
                .help("Drop findings carrying one of these CVE ids (repeatable)"),
        )
        .arg(
            Arg::new("exclude-threat")
                .long("exclude-threat")
                .value_name("LABEL")
                .action(ArgAction::Append)
                .help("Drop findings with this raw threat label, e.g. 'log' (repeatable)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Show detailed output"),
        )
}

/// Build the effective configuration: the optional config file first,
/// then every given command-line flag on top.
fn config_from_matches(matches: &ArgMatches) -> ReportingResult<Config> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => Config::load_from_file(path).map_err(ReportingError::Config)?,
        None => Config::default(),
    };

    if let Some(inputs) = matches.get_many::<String>("input") {
        config.input_files = inputs.map(PathBuf::from).collect();
    }
    if let Some(output) = matches.get_one::<String>("output") {
        config.output_file = PathBuf::from(output);
    }
    if let Some(level) = matches.get_one::<String>("level") {
        config.min_level = level.parse()?;
    }
    if let Some(mode) = matches.get_one::<String>("type") {
        config.report_type = mode.parse()?;
    }
    if let Some(format) = matches.get_one::<String>("format") {
        config.format = format.parse()?;
    }

    override_list(matches, "include-network", &mut config.networks_included);
    override_list(matches, "exclude-network", &mut config.networks_excluded);
    override_list(matches, "include-regex", &mut config.regex_included);
    override_list(matches, "exclude-regex", &mut config.regex_excluded);
    override_list(matches, "include-cve", &mut config.cve_included);
    override_list(matches, "exclude-cve", &mut config.cve_excluded);
    override_list(matches, "exclude-threat", &mut config.excluded_threats);

    Ok(config)
}

fn override_list(matches: &ArgMatches, id: &str, target: &mut Vec<String>) {
    if let Some(values) = matches.get_many::<String>(id) {
        *target = values.cloned().collect();
    }
}
