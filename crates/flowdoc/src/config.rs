use std::{env, time::Duration};

use flowdoc_core::storage::table_name;

use crate::provision::{
    ProvisionOptions, DEFAULT_POLL_INTERVAL, DEFAULT_READ_CAPACITY, DEFAULT_WRITE_CAPACITY,
};

pub const DEFAULT_TABLE_PREFIX: &str = "flowdoc";
pub const DEFAULT_REGION: &str = "us-east-1";

/// Store configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Table prefix, the table is `<prefix>.documents` (default: "flowdoc")
    pub table_prefix: String,
    /// Read capacity units for new tables (default: 10)
    pub read_capacity: i64,
    /// Write capacity units for new tables (default: 5)
    pub write_capacity: i64,
    /// Seconds between table status polls (default: 3)
    pub poll_interval_secs: u64,
    /// Status polls allowed while provisioning (default: unbounded)
    pub max_polls: Option<u32>,
    /// Custom DynamoDB endpoint, e.g. a local DynamoDB
    pub endpoint_url: Option<String>,
    /// AWS region (default: "us-east-1")
    pub region: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `FLOWDOC_TABLE_PREFIX` - Table prefix (default: "flowdoc")
    /// - `FLOWDOC_READ_CAPACITY` - Read capacity units (default: 10)
    /// - `FLOWDOC_WRITE_CAPACITY` - Write capacity units (default: 5)
    /// - `FLOWDOC_POLL_INTERVAL_SECS` - Provisioning poll interval (default: 3)
    /// - `FLOWDOC_MAX_POLLS` - Provisioning poll limit (default: unbounded)
    /// - `AWS_ENDPOINT_URL` - Custom DynamoDB endpoint (default: none)
    /// - `AWS_REGION` - AWS region (default: "us-east-1")
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Unparseable numbers fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            table_prefix: lookup("FLOWDOC_TABLE_PREFIX")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_TABLE_PREFIX.to_string()),
            read_capacity: lookup("FLOWDOC_READ_CAPACITY")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_READ_CAPACITY),
            write_capacity: lookup("FLOWDOC_WRITE_CAPACITY")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_WRITE_CAPACITY),
            poll_interval_secs: lookup("FLOWDOC_POLL_INTERVAL_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_POLL_INTERVAL.as_secs()),
            max_polls: lookup("FLOWDOC_MAX_POLLS").and_then(|v| v.parse().ok()),
            endpoint_url: lookup("AWS_ENDPOINT_URL").filter(|v| !v.is_empty()),
            region: lookup("AWS_REGION")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
        }
    }

    /// Resolved table name.
    pub fn table_name(&self) -> String {
        table_name(&self.table_prefix)
    }

    /// Get the poll interval as a Duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn provision_options(&self) -> ProvisionOptions {
        ProvisionOptions {
            read_capacity_units: self.read_capacity,
            write_capacity_units: self.write_capacity,
            poll_interval: self.poll_interval(),
            max_polls: self.max_polls,
        }
    }

    #[cfg(feature = "dynamodb")]
    pub fn aws_config(&self) -> crate::storage::AwsConfig {
        crate::storage::AwsConfig {
            endpoint_url: self.endpoint_url.clone(),
            region: self.region.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
