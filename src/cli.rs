//! Command-line argument parsing.
//!
//! Every flag can also be set through the environment variable named next to
//! it, which is how the service is configured when deployed.

use crate::config::Config;
use clap::Parser;
use std::path::PathBuf;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid log format: {s}. Expected: text or json")),
        }
    }
}

/// Renders query templates and runs them on Amazon Athena.
#[derive(Parser, Debug)]
#[command(name = "athena-query-api")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(long, value_name = "PATH", env = "ATHENA_QUERY_API_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on (e.g., 0.0.0.0:8080)
    #[arg(long, value_name = "ADDR", env = "LISTEN_ADDR")]
    pub listen: Option<String>,

    /// The athena catalog name
    #[arg(long, value_name = "NAME", env = "ATHENA_CATALOG")]
    pub athena_catalog: Option<String>,

    /// The athena database name
    #[arg(long, value_name = "NAME", env = "ATHENA_DATABASE")]
    pub athena_database: Option<String>,

    /// The athena workgroup name
    #[arg(long, value_name = "NAME", env = "ATHENA_WORKGROUP")]
    pub athena_workgroup: Option<String>,

    /// The s3 bucket name containing the query templates
    #[arg(long, value_name = "BUCKET", env = "QUERY_TEMPLATES_BUCKET")]
    pub query_templates_bucket: Option<String>,

    /// Query template location: s3://bucket/prefix or a local directory
    #[arg(
        long,
        value_name = "LOCATION",
        env = "QUERY_TEMPLATES_LOCATION",
        conflicts_with = "query_templates_bucket"
    )]
    pub query_templates_location: Option<String>,

    /// Use an in-memory mock backend instead of Athena (for local testing)
    #[arg(long)]
    pub mock_backend: bool,

    /// Log output format: text or json
    #[arg(long, value_name = "FORMAT", env = "LOG_FORMAT", default_value = "text")]
    pub log_format: String,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Parses the log format from the --log-format argument.
    pub fn parse_log_format(&self) -> std::result::Result<LogFormat, String> {
        self.log_format.parse()
    }

    /// Overrides config file values with the flags that were given.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(listen) = &self.listen {
            config.server.listen_addr = listen.clone();
        }
        if let Some(catalog) = &self.athena_catalog {
            config.athena.catalog = catalog.clone();
        }
        if let Some(database) = &self.athena_database {
            config.athena.database = database.clone();
        }
        if let Some(workgroup) = &self.athena_workgroup {
            config.athena.workgroup = workgroup.clone();
        }
        if let Some(bucket) = &self.query_templates_bucket {
            config.templates.location = Some(format!("s3://{bucket}"));
        }
        if let Some(location) = &self.query_templates_location {
            config.templates.location = Some(location.clone());
        }
    }
}
