//! Loader for harvester configuration with YAML + environment overlays.
//!
//! Sources are merged lowest to highest precedence: built-in defaults, then any
//! YAML files/snippets in the order they were attached, then `TIMELINE__`-prefixed
//! environment variables (`TIMELINE__TWITTER__RETRY_COUNT=5`). String values may
//! reference the environment as `${VAR}`; expansion is recursive and bounded.
//!
//! The four Twitter secrets default to `${TWITTER_CONSUMER_KEY}`,
//! `${TWITTER_CONSUMER_SECRET}`, `${TWITTER_ACCESS_TOKEN}` and
//! `${TWITTER_ACCESS_SECRET}`, so a plain environment is enough to run without a file.
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use timeline_http::{OAuthCredentials, RetryPolicy};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

const DEFAULTS_YAML: &str = r#"
twitter:
  consumer_key: "${TWITTER_CONSUMER_KEY}"
  consumer_secret: "${TWITTER_CONSUMER_SECRET}"
  access_token: "${TWITTER_ACCESS_TOKEN}"
  access_secret: "${TWITTER_ACCESS_SECRET}"
"#;

#[derive(Debug, Deserialize, Default)]
pub struct TimelineConfig {
    #[serde(default)]
    pub twitter: TwitterConfig,
    #[serde(default)]
    pub timeline: HarvestConfig,
}

/// API endpoint, secrets and the client-side rate-limit policy.
#[derive(Debug, Deserialize)]
pub struct TwitterConfig {
    #[serde(default)]
    pub consumer_key: Option<String>,
    #[serde(default)]
    pub consumer_secret: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub access_secret: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_true")]
    pub wait_on_rate_limit: bool,
    #[serde(default = "default_retry_count")]
    pub retry_count: usize,
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            consumer_key: None,
            consumer_secret: None,
            access_token: None,
            access_secret: None,
            base_url: default_base_url(),
            wait_on_rate_limit: true,
            retry_count: default_retry_count(),
            retry_delay_secs: default_retry_delay_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Pagination and table-assembly settings.
#[derive(Debug, Deserialize)]
pub struct HarvestConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            timezone: default_timezone(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.twitter.com".into()
}
fn default_true() -> bool {
    true
}
fn default_retry_count() -> usize {
    3
}
fn default_retry_delay_secs() -> u64 {
    3
}
fn default_timeout_secs() -> u64 {
    15
}
fn default_page_size() -> u32 {
    200
}
fn default_timezone() -> String {
    "America/New_York".into()
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialsError {
    #[error("missing Twitter credential `{field}`: set {env_var} or twitter.{field}")]
    Missing {
        field: &'static str,
        env_var: &'static str,
    },
}

impl TwitterConfig {
    /// Validate and hand out the four secrets. Empty or unexpanded (`${...}`)
    /// values are treated as missing.
    pub fn credentials(&self) -> Result<OAuthCredentials, CredentialsError> {
        Ok(OAuthCredentials {
            consumer_key: required(
                &self.consumer_key,
                "consumer_key",
                "TWITTER_CONSUMER_KEY",
            )?,
            consumer_secret: required(
                &self.consumer_secret,
                "consumer_secret",
                "TWITTER_CONSUMER_SECRET",
            )?,
            access_token: required(
                &self.access_token,
                "access_token",
                "TWITTER_ACCESS_TOKEN",
            )?,
            access_secret: required(
                &self.access_secret,
                "access_secret",
                "TWITTER_ACCESS_SECRET",
            )?,
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            wait_on_rate_limit: self.wait_on_rate_limit,
            retry_count: self.retry_count,
            retry_delay: Duration::from_secs(self.retry_delay_secs),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn required(
    value: &Option<String>,
    field: &'static str,
    env_var: &'static str,
) -> Result<String, CredentialsError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() && !v.contains("${") => Ok(v.to_string()),
        _ => Err(CredentialsError::Missing { field, env_var }),
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (defaults + YAML + env overrides).
pub struct TimelineConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for TimelineConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl TimelineConfigLoader {
    /// Start from the built-in defaults.
    ///
    /// ```
    /// use timeline_config::TimelineConfigLoader;
    ///
    /// let config = TimelineConfigLoader::new()
    ///     .with_yaml_str("timeline:\n  page_size: 50\n")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.timeline.page_size, 50);
    /// assert_eq!(config.timeline.timezone, "America/New_York");
    /// assert_eq!(config.twitter.base_url, "https://api.twitter.com");
    /// ```
    pub fn new() -> Self {
        let builder =
            Config::builder().add_source(File::from_str(DEFAULTS_YAML, FileFormat::Yaml));
        Self { builder }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Like [`Self::with_file`], but a missing file is skipped.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly typed config.
    ///
    /// Environment overrides are layered last, then `${VAR}` placeholders are expanded
    /// before materialising the structs.
    pub fn load(self) -> Result<TimelineConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("TIMELINE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: TimelineConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;

        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use serial_test::serial;

    const CREDENTIAL_VARS: [&str; 4] = [
        "TWITTER_CONSUMER_KEY",
        "TWITTER_CONSUMER_SECRET",
        "TWITTER_ACCESS_TOKEN",
        "TWITTER_ACCESS_SECRET",
    ];

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("FOO", Some("bar"), || {
            let mut v = json!("prefix-${FOO}-suffix");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("prefix-bar-suffix"));
        });
    }

    #[test]
    fn expands_in_array_and_object() {
        temp_env::with_vars([("CITY", Some("Winston")), ("STATE", Some("NC"))], || {
            let mut v = json!(["hello-$CITY", { "loc": "${CITY}-${STATE}" }, 42, true, null]);
            expand_env_in_value(&mut v);
            assert_eq!(
                v,
                json!(["hello-Winston", { "loc": "Winston-NC" }, 42, true, null])
            );
        });
    }

    #[test]
    fn stops_on_cycles() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}-y");
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x=") && s.ends_with("-y"));
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${DOES_NOT_EXIST_ANYWHERE}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${DOES_NOT_EXIST_ANYWHERE}"));
    }

    #[test]
    #[serial]
    fn credentials_come_from_environment_by_default() {
        temp_env::with_vars(
            [
                ("TWITTER_CONSUMER_KEY", Some("ck")),
                ("TWITTER_CONSUMER_SECRET", Some("cs")),
                ("TWITTER_ACCESS_TOKEN", Some("at")),
                ("TWITTER_ACCESS_SECRET", Some("as")),
            ],
            || {
                let cfg = TimelineConfigLoader::new().load().unwrap();
                let creds = cfg.twitter.credentials().unwrap();
                assert_eq!(creds.consumer_key, "ck");
                assert_eq!(creds.consumer_secret, "cs");
                assert_eq!(creds.access_token, "at");
                assert_eq!(creds.access_secret, "as");
            },
        );
    }

    #[test]
    #[serial]
    fn missing_secret_names_the_variable() {
        temp_env::with_vars(
            [
                ("TWITTER_CONSUMER_KEY", Some("ck")),
                ("TWITTER_CONSUMER_SECRET", Some("cs")),
                ("TWITTER_ACCESS_TOKEN", None),
                ("TWITTER_ACCESS_SECRET", Some("as")),
            ],
            || {
                let cfg = TimelineConfigLoader::new().load().unwrap();
                let err = cfg.twitter.credentials().unwrap_err();
                assert_eq!(
                    err,
                    CredentialsError::Missing {
                        field: "access_token",
                        env_var: "TWITTER_ACCESS_TOKEN",
                    }
                );
                assert!(err.to_string().contains("TWITTER_ACCESS_TOKEN"));
            },
        );
    }

    #[test]
    #[serial]
    fn blank_secret_is_missing() {
        temp_env::with_vars(CREDENTIAL_VARS.map(|k| (k, Some("   "))), || {
            let cfg = TimelineConfigLoader::new().load().unwrap();
            assert!(matches!(
                cfg.twitter.credentials(),
                Err(CredentialsError::Missing { field: "consumer_key", .. })
            ));
        });
    }

    #[test]
    #[serial]
    fn env_overrides_beat_yaml() {
        temp_env::with_var("TIMELINE__TWITTER__RETRY_COUNT", Some("7"), || {
            let cfg = TimelineConfigLoader::new()
                .with_yaml_str("twitter:\n  retry_count: 1\n  wait_on_rate_limit: false\n")
                .load()
                .unwrap();
            assert_eq!(cfg.twitter.retry_count, 7);
            assert!(!cfg.twitter.wait_on_rate_limit);
        });
    }

    #[test]
    fn retry_policy_mirrors_config() {
        let cfg = TwitterConfig {
            retry_delay_secs: 9,
            wait_on_rate_limit: false,
            ..TwitterConfig::default()
        };
        let policy = cfg.retry_policy();
        assert_eq!(policy.retry_delay, Duration::from_secs(9));
        assert_eq!(policy.retry_count, 3);
        assert!(!policy.wait_on_rate_limit);
    }
}
