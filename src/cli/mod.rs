// FILE: src/cli/mod.rs

mod config;
mod handlers;

use crate::database::CompatDatabase;
use crate::engine::WebCompat;
use crate::error::{CompatError, Result};
use crate::targets::default_target_browsers;
use crate::types::TargetBrowser;
use crate::CheckOptions;
use clap::{Arg, ArgAction, ArgMatches, Command, ValueEnum};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

pub struct EnhancedCli {
    config: config::ConfigFile,
    start_time: Instant,
}

impl EnhancedCli {
    pub fn new() -> Self {
        Self {
            config: config::ConfigFile::default(),
            start_time: Instant::now(),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        self.start_time = Instant::now();
        let matches = self.build_cli().get_matches();

        self.setup_logging(matches.get_count("verbose"))?;

        if let Some(config_path) = matches.get_one::<String>("config") {
            self.config = config::load(config_path)?;
        }

        match matches.subcommand() {
            Some(("css", sub_matches)) => handlers::handle_css_command(self, sub_matches),
            Some(("html", sub_matches)) => handlers::handle_html_command(self, sub_matches),
            Some(("browsers", sub_matches)) => handlers::handle_browsers_command(self, sub_matches),
            _ => {
                println!("No subcommand specified. Use --help for usage information.");
                Ok(())
            }
        }
    }

    fn build_cli(&self) -> Command {
        let browser_arg = Arg::new("browser")
            .short('b')
            .long("browser")
            .value_name("ID=VERSION")
            .help("Target browser release (repeatable); defaults to maintained releases")
            .action(ArgAction::Append);
        let format_arg = Arg::new("format")
            .short('f')
            .long("format")
            .value_parser(clap::value_parser!(OutputFormat))
            .default_value("text")
            .help("Report format");
        let recursive_arg = Arg::new("recursive")
            .short('r')
            .long("recursive")
            .help("Check every JSON file in a directory recursively")
            .action(ArgAction::SetTrue);
        let unknown_browsers_arg = Arg::new("unknown-browsers")
            .long("unknown-browsers")
            .value_name("BOOL")
            .value_parser(clap::value_parser!(bool))
            .help("Report browsers missing from the compat data as unsupported");

        Command::new(crate::NAME)
            .version(crate::VERSION)
            .about(crate::DESCRIPTION)
            .author("WebCompat Development Team")
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .value_name("FILE")
                    .help("Configuration file path")
                    .global(true)
                    .action(ArgAction::Set),
            )
            .arg(
                Arg::new("verbose")
                    .short('v')
                    .long("verbose")
                    .help("Increase verbosity (can be used multiple times)")
                    .global(true)
                    .action(ArgAction::Count),
            )
            .arg(
                Arg::new("data")
                    .short('d')
                    .long("data")
                    .value_name("SNAPSHOT")
                    .help("Compat data snapshot (JSON)")
                    .global(true)
                    .action(ArgAction::Set),
            )
            .subcommand(
                Command::new("css")
                    .about("Check CSS declarations given as a JSON array of {name, value}")
                    .arg(Arg::new("input").help("Input JSON file or directory").required(true).index(1))
                    .arg(Arg::new("values").long("values").help("Check declaration values too").action(ArgAction::SetTrue))
                    .arg(browser_arg.clone())
                    .arg(format_arg.clone())
                    .arg(recursive_arg.clone())
                    .arg(unknown_browsers_arg.clone()),
            )
            .subcommand(
                Command::new("html")
                    .about("Check HTML elements given as JSON {element, attributes}")
                    .arg(Arg::new("input").help("Input JSON file or directory").required(true).index(1))
                    .arg(browser_arg)
                    .arg(format_arg.clone())
                    .arg(recursive_arg)
                    .arg(unknown_browsers_arg),
            )
            .subcommand(
                Command::new("browsers")
                    .about("List the default target browsers")
                    .arg(format_arg),
            )
    }

    fn setup_logging(&self, verbose_count: u8) -> Result<()> {
        let log_level = match verbose_count {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };
        env_logger::Builder::from_default_env()
            .filter_level(log_level)
            .format_timestamp_secs()
            .init();
        Ok(())
    }

    pub fn elapsed_ms(&self) -> u128 {
        self.start_time.elapsed().as_millis()
    }

    /// Snapshot from `--data`, falling back to the config file
    pub fn load_engine(&self, matches: &ArgMatches) -> Result<WebCompat> {
        let path = matches
            .get_one::<String>("data")
            .cloned()
            .or_else(|| self.config.data.clone())
            .ok_or_else(|| {
                CompatError::format("No compat snapshot given; use --data or set `data` in the config file")
            })?;

        let database = CompatDatabase::load(&path)?;
        Ok(WebCompat::new(database))
    }

    pub fn build_check_options(&self, matches: &ArgMatches) -> CheckOptions {
        let mut options = CheckOptions::default();

        let values_flag = matches
            .try_get_one::<bool>("values")
            .ok()
            .flatten()
            .copied()
            .unwrap_or(false);
        options.css_values = values_flag || self.config.css_values.unwrap_or(false);

        if let Some(flag) = matches.try_get_one::<bool>("unknown-browsers").ok().flatten() {
            options.flag_unknown_browsers = *flag;
        } else if let Some(flag) = self.config.flag_unknown_browsers {
            options.flag_unknown_browsers = flag;
        }

        options
    }

    /// `--browser` values first, then config browsers, then the maintained defaults
    pub fn build_target_browsers(
        &self,
        database: &CompatDatabase,
        matches: &ArgMatches,
    ) -> Result<Vec<TargetBrowser>> {
        if let Some(specs) = matches.get_many::<String>("browser") {
            return specs
                .map(|spec| parse_browser_spec(database, spec))
                .collect();
        }

        if let Some(browsers) = &self.config.browsers {
            return Ok(browsers
                .iter()
                .map(|browser| with_known_name(database, browser.clone()))
                .collect());
        }

        Ok(default_target_browsers(database))
    }
}

impl Default for EnhancedCli {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse `ID=VERSION`; the id must be known to the snapshot
pub fn parse_browser_spec(database: &CompatDatabase, spec: &str) -> Result<TargetBrowser> {
    let (id, version) = spec.split_once('=').ok_or_else(|| {
        CompatError::format(format!(
            "Invalid browser: {}. Use ID=VERSION format.",
            spec
        ))
    })?;
    let (id, version) = (id.trim(), version.trim());
    if id.is_empty() || version.is_empty() {
        return Err(CompatError::format(format!(
            "Invalid browser: {}. Use ID=VERSION format.",
            spec
        )));
    }

    let browser = database
        .browser(id)
        .ok_or_else(|| CompatError::UnknownBrowser { id: id.to_string() })?;

    let mut target = TargetBrowser::new(id, version).with_name(&browser.name);
    target.status = browser.releases.get(version).map(|release| release.status);
    Ok(target)
}

fn with_known_name(database: &CompatDatabase, mut target: TargetBrowser) -> TargetBrowser {
    if target.name.is_none() {
        if let Some(browser) = database.browser(&target.id) {
            target.name = Some(browser.name.clone());
        }
    }
    target
}
