use anyhow::{anyhow, Result};
use clap::ArgMatches;
use lazy_static::lazy_static;
use std::fs::File;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use workload_mutator::settings::{FailurePolicy, MutationSettings, PatchStrategy};

pub static SERVICE_NAME: &str = "workload-webhook";

lazy_static! {
    pub(crate) static ref HOSTNAME: String =
        std::env::var("HOSTNAME").unwrap_or_else(|_| String::from("unknown"));
}

pub struct Config {
    pub addr: SocketAddr,
    pub tls_config: Option<TlsConfig>,
    pub mutation_settings: MutationSettings,
    pub failure_policy: FailurePolicy,
    pub log_level: String,
    pub log_fmt: String,
    pub log_no_color: bool,
}

pub struct TlsConfig {
    pub cert_file: PathBuf,
    pub key_file: PathBuf,
}

impl Config {
    pub fn from_args(matches: &ArgMatches) -> Result<Self> {
        let addr = api_bind_address(matches)?;
        let (cert_file, key_file) = tls_files(matches)?;
        let tls_config = if cert_file.is_empty() {
            None
        } else {
            Some(TlsConfig {
                cert_file: PathBuf::from(cert_file),
                key_file: PathBuf::from(key_file),
            })
        };

        let mutation_settings = mutation_settings(matches)?;
        let failure_policy = matches
            .get_one::<String>("failure-policy")
            .expect("This should not happen, there's a default value for failure-policy")
            .parse::<FailurePolicy>()?;

        let log_level = matches
            .get_one::<String>("log-level")
            .expect("This should not happen, there's a default value for log-level")
            .to_owned();
        let log_fmt = matches
            .get_one::<String>("log-fmt")
            .expect("This should not happen, there's a default value for log-fmt")
            .to_owned();
        let log_no_color = matches
            .get_one::<bool>("log-no-color")
            .expect("clap should have assigned a default value")
            .to_owned();

        Ok(Self {
            addr,
            tls_config,
            mutation_settings,
            failure_policy,
            log_level,
            log_fmt,
            log_no_color,
        })
    }
}

fn api_bind_address(matches: &ArgMatches) -> Result<SocketAddr> {
    format!(
        "{}:{}",
        matches
            .get_one::<String>("address")
            .expect("clap should have assigned a default value"),
        matches
            .get_one::<String>("port")
            .expect("clap should have assigned a default value")
    )
    .parse()
    .map_err(|e| anyhow!("error parsing arguments: {}", e))
}

fn tls_files(matches: &ArgMatches) -> Result<(String, String)> {
    let cert_file = matches
        .get_one::<String>("cert-file")
        .expect("clap should have assigned a default value")
        .to_owned();
    let key_file = matches
        .get_one::<String>("key-file")
        .expect("clap should have assigned a default value")
        .to_owned();
    if cert_file.is_empty() != key_file.is_empty() {
        Err(anyhow!("error parsing arguments: either both --cert-file and --key-file must be provided, or neither"))
    } else {
        Ok((cert_file, key_file))
    }
}

/// The settings file provides the base values, flags given on the command
/// line take precedence over it.
fn mutation_settings(matches: &ArgMatches) -> Result<MutationSettings> {
    let mut settings = match matches.get_one::<String>("settings") {
        Some(path) => {
            let path = Path::new(path);
            read_settings_file(path).map_err(|e| {
                anyhow!("error while loading mutation settings from {:?}: {}", path, e)
            })?
        }
        None => MutationSettings::default(),
    };

    if let Some(key) = matches.get_one::<String>("node-selector-key") {
        settings.node_selector_key = key.to_owned();
    }
    if let Some(value) = matches.get_one::<String>("node-selector-value") {
        settings.node_selector_value = value.to_owned();
    }
    if let Some(key) = matches.get_one::<String>("toleration-key") {
        settings.toleration_key = key.to_owned();
    }
    if let Some(value) = matches.get_one::<String>("toleration-value") {
        settings.toleration_value = value.to_owned();
    }
    if let Some(strategy) = matches.get_one::<String>("patch-strategy") {
        settings.strategy = strategy.parse::<PatchStrategy>()?;
    }

    settings.validate()?;
    Ok(settings)
}

/// Reads the mutation settings file. Keys that are not set keep their
/// default value.
fn read_settings_file(path: &Path) -> Result<MutationSettings> {
    let settings_file = File::open(path)?;
    let settings: MutationSettings = serde_yaml::from_reader(&settings_file)?;
    Ok(settings)
}
