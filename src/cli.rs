use clap::{crate_authors, crate_description, crate_version, value_parser, Arg, ArgAction, Command};
use pretty_env_logger::env_logger::Builder;
use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::exit;

use mailsend_rs::{Configuration, Result};

const ENV_PREFIX: &str = "MAILSEND";

fn set_logger_level(b: &mut Builder) {
    if env::var("RUST_LOG").is_err() {
        b.filter_level(log::LevelFilter::Info);
    }
    b.init();
}

fn setup_logger() {
    // journald reads the <N> prefix as the syslog priority
    match env::var("RUST_LOG_STYLE") {
        Ok(s) if s == "SYSTEMD" => {
            let builder = &mut pretty_env_logger::env_logger::builder();
            builder.format(|buf, record| {
                writeln!(
                    buf,
                    "<{}>{}: {}",
                    match record.level() {
                        log::Level::Error => 3,
                        log::Level::Warn => 4,
                        log::Level::Info => 6,
                        log::Level::Debug => 7,
                        log::Level::Trace => 7,
                    },
                    record.target(),
                    record.args()
                )
            });
            set_logger_level(builder);
        }
        _ => {
            let builder = &mut pretty_env_logger::formatted_builder();
            set_logger_level(builder);
        }
    };
}

/// Read the YAML file, then apply `MAILSEND_<SECTION>__<KEY>` overrides.
fn load_config(path: &Path) -> Result<Configuration> {
    Configuration::load_with(path, |path| {
        let config = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Yaml))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(config.try_deserialize()?)
    })
}

fn override_times(config: &mut Configuration, times: u32) -> Result<()> {
    let resend = &mut config.resend;
    if !resend.enable && !resend.enable_random_interval && resend.fixed_interval.is_none() {
        resend.fixed_interval = Some(0.0);
    }
    resend.enable = true;
    resend.times = Some(times);
    resend.validate()
}

pub(crate) fn main() {
    let cli = Command::new("mailsend")
        .about(format!(
            "{}\n{} {}",
            crate_description!(),
            "Any configuration key can be overridden with environment variables,",
            "e.g. MAILSEND_SERVER_INFORMATION__PORT=587.",
        ))
        .arg(
            Arg::new("config")
                .value_parser(value_parser!(PathBuf))
                .default_value("config.yml")
                .help("Path to the YAML configuration file"),
        )
        .arg(
            Arg::new("check")
                .action(ArgAction::SetTrue)
                .short('t')
                .long("test")
                .help("Check the configuration"),
        )
        .arg(
            Arg::new("times")
                .value_parser(value_parser!(u32).range(1..))
                .long("times")
                .help("Send this many times, overriding resend_options.times"),
        )
        .version(crate_version!())
        .author(crate_authors!("\n"));

    let args = cli.get_matches();

    setup_logger();

    let path = args
        .get_one::<PathBuf>("config")
        .expect("config has a default value");

    let mut config = match load_config(path) {
        Ok(c) => c,
        Err(err) => {
            println!("{err}");
            exit(2);
        }
    };

    if let Some(times) = args.get_one::<u32>("times") {
        if let Err(err) = override_times(&mut config, *times) {
            println!("{err}");
            exit(2);
        }
    }

    if args.get_flag("check") {
        tracing::info!(
            recipients = config.recipients.count(),
            server = %config.server,
            resend = config.resend.enable,
            "Configuration is valid."
        );
        exit(0);
    }

    let report = match config.into_mailer().send() {
        Ok(report) => report,
        Err(err) => {
            println!("{err}");
            exit(2);
        }
    };

    println!("{report}");

    if report.success == 0 {
        exit(1);
    }
}
