//! Configuration: the optional `aimastering.toml` file and the immutable
//! [`RunPlan`] built once per invocation.
//!
//! [`AppConfig`] holds connection and polling settings. Values missing from
//! the file fall back to defaults. `AIMASTERING_ACCESS_TOKEN` takes
//! precedence over the file; an explicit `--access-token` beats both.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::MasteringError;
use crate::options::MasteringOptions;
use crate::poller::PollPolicy;
use crate::retriever::OutputTarget;
use crate::state_machine::Route;
use crate::uploader::AudioSource;

pub const DEFAULT_CONFIG_FILE: &str = "aimastering.toml";
pub const ACCESS_TOKEN_ENV: &str = "AIMASTERING_ACCESS_TOKEN";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub access_token: String,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Seconds between status checks.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// 1.0 polls at a fixed interval.
    #[serde(default = "default_poll_backoff_factor")]
    pub poll_backoff_factor: f64,

    #[serde(default = "default_poll_max_interval_secs")]
    pub poll_max_interval_secs: u64,

    /// Unset waits for as long as the service keeps the job pending.
    #[serde(default)]
    pub poll_deadline_secs: Option<u64>,
}

fn default_api_base_url() -> String {
    "https://api.bakuage.com/v1".to_string()
}

fn default_user_agent() -> String {
    "aimastering-cli".to_string()
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_poll_backoff_factor() -> f64 {
    1.0
}

fn default_poll_max_interval_secs() -> u64 {
    60
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            api_base_url: default_api_base_url(),
            user_agent: default_user_agent(),
            poll_interval_secs: default_poll_interval_secs(),
            poll_backoff_factor: default_poll_backoff_factor(),
            poll_max_interval_secs: default_poll_max_interval_secs(),
            poll_deadline_secs: None,
        }
    }
}

impl AppConfig {
    /// Loads `path`, or `aimastering.toml` in the current directory when no
    /// path is given. Only an explicitly named file is required to exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_file(default)?
                } else {
                    Self::default()
                }
            }
        };

        if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV)
            && !token.is_empty()
        {
            config.access_token = token;
        }

        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str::<AppConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// The command-line token wins over the environment and the file.
    pub fn access_token(&self, cli: Option<&str>) -> Result<String, MasteringError> {
        let token = cli
            .filter(|t| !t.is_empty())
            .unwrap_or(self.access_token.as_str());
        if token.is_empty() {
            return Err(MasteringError::Config("--access-token required".to_string()));
        }
        Ok(token.to_string())
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_secs(self.poll_interval_secs),
            backoff_factor: self.poll_backoff_factor,
            max_interval: Duration::from_secs(self.poll_max_interval_secs),
            deadline: self.poll_deadline_secs.map(Duration::from_secs),
        }
    }
}

/// Everything one run needs, fixed before the first remote call.
#[derive(Debug, Clone, PartialEq)]
pub struct RunPlan {
    pub input: AudioSource,
    pub output: OutputTarget,
    pub reference: Option<AudioSource>,
    pub output_video: Option<PathBuf>,
    pub options: MasteringOptions,
    /// Delete the mastering from the service once everything is saved.
    pub remove: bool,
}

impl RunPlan {
    pub fn route(&self) -> Route {
        Route {
            reference: self.reference.is_some(),
            video: self.output_video.is_some(),
            cleanup: self.remove,
        }
    }

    pub fn validate(&self) -> Result<(), MasteringError> {
        self.options.validate()?;

        if self.input == AudioSource::Stdin && self.reference == Some(AudioSource::Stdin) {
            return Err(MasteringError::Config(
                "--input and --reference cannot both read from stdin".to_string(),
            ));
        }
        if let Some(video) = &self.output_video {
            if video == Path::new("-") {
                return Err(MasteringError::Config(
                    "--output-video must be a file path".to_string(),
                ));
            }
            if self.output == OutputTarget::File(video.clone()) {
                return Err(MasteringError::Config(
                    "--output and --output-video must differ".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> RunPlan {
        RunPlan {
            input: AudioSource::parse("song.wav"),
            output: OutputTarget::parse("out.wav"),
            reference: None,
            output_video: None,
            options: MasteringOptions::default(),
            remove: true,
        }
    }

    #[test]
    fn default_config_values() {
        let config = AppConfig::default();
        assert_eq!(config.api_base_url, "https://api.bakuage.com/v1");
        assert_eq!(config.user_agent, "aimastering-cli");
        assert_eq!(config.poll_interval_secs, 5);
        assert_eq!(config.poll_deadline_secs, None);
        assert!(config.access_token.is_empty());
    }

    #[test]
    fn deserialize_partial_toml() {
        let toml_str = r#"
            access_token = "file-token"
            poll_interval_secs = 2
            poll_deadline_secs = 600
        "#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.access_token, "file-token");
        assert_eq!(config.poll_interval_secs, 2);
        assert_eq!(config.poll_backoff_factor, 1.0);
        assert_eq!(config.user_agent, "aimastering-cli");

        let policy = config.poll_policy();
        assert_eq!(policy.interval, Duration::from_secs(2));
        assert_eq!(policy.deadline, Some(Duration::from_secs(600)));
    }

    #[test]
    fn huge_poll_settings_do_not_overflow() {
        let config: AppConfig = toml::from_str(
            "poll_interval_secs = 100000000000000\npoll_backoff_factor = 2.0\n",
        )
        .unwrap();
        let policy = config.poll_policy();
        assert_eq!(
            policy.delay_for_attempt(40),
            Duration::from_secs(100_000_000_000_000)
        );
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let result = AppConfig::load(Some(Path::new("/definitely/not/aimastering.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn load_reads_explicit_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("custom.toml");
        std::fs::write(&path, "user_agent = \"studio-bot\"\n").unwrap();
        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.user_agent, "studio-bot");
    }

    #[test]
    fn cli_token_wins() {
        let config = AppConfig {
            access_token: "from-file".into(),
            ..Default::default()
        };
        assert_eq!(config.access_token(Some("from-cli")).unwrap(), "from-cli");
        assert_eq!(config.access_token(None).unwrap(), "from-file");
        assert_eq!(config.access_token(Some("")).unwrap(), "from-file");
    }

    #[test]
    fn missing_token_is_config_error() {
        let config = AppConfig::default();
        let err = config.access_token(None).unwrap_err();
        assert!(matches!(err, MasteringError::Config(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn route_follows_plan() {
        let mut p = plan();
        assert_eq!(
            p.route(),
            Route {
                reference: false,
                video: false,
                cleanup: true
            }
        );
        p.reference = Some(AudioSource::parse("ref.wav"));
        p.output_video = Some("clip.mp4".into());
        p.remove = false;
        assert_eq!(
            p.route(),
            Route {
                reference: true,
                video: true,
                cleanup: false
            }
        );
    }

    #[test]
    fn plan_rejects_conflicting_streams() {
        let mut p = plan();
        p.input = AudioSource::Stdin;
        p.reference = Some(AudioSource::Stdin);
        assert!(p.validate().is_err());

        let mut p = plan();
        p.output_video = Some("-".into());
        assert!(p.validate().is_err());

        let mut p = plan();
        p.output_video = Some("out.wav".into());
        assert!(p.validate().is_err());

        assert!(plan().validate().is_ok());
    }
}
