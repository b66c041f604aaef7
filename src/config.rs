use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use log::{info, warn};

use crate::content::{Content, ContentError};
use crate::tutor::chatgpt::ChatGptBackend;
use crate::tutor::gemini::{self, GeminiBackend};
use crate::tutor::TutorGateway;

const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
    #[error("failed to build the HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("failed to set up ChatGPT: {0}")]
    ChatGpt(#[from] chatgpt::err::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Provider {
    #[default]
    Gemini,
    ChatGpt,
}

impl FromStr for Provider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(Provider::Gemini),
            "chatgpt" | "openai" => Ok(Provider::ChatGpt),
            _ => Err(()),
        }
    }
}

/// Settings read from the environment (and `.env`, if there is one).
///
/// API keys are optional: without one the tutor answers from its fallbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bot_token: String,
    pub provider: Provider,
    pub gemini_api_key: Option<String>,
    pub gemini_endpoint: String,
    pub gemini_model: String,
    pub chatgpt_api_key: Option<String>,
    pub timeout: Duration,
    pub content_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bot_token = var("TELOXIDE_TOKEN").ok_or(ConfigError::Missing("TELOXIDE_TOKEN"))?;

        let provider = match var("TUTOR_PROVIDER") {
            Some(value) => {
                let parsed: Result<Provider, ()> = value.parse();
                parsed.map_err(|_| ConfigError::Invalid {
                    key: "TUTOR_PROVIDER",
                    value,
                })?
            }
            None => Provider::default(),
        };

        let timeout = match var("TUTOR_TIMEOUT_SECS") {
            Some(value) => {
                let secs = value.trim().parse::<u64>().ok().filter(|&s| s > 0);
                match secs {
                    Some(secs) => Duration::from_secs(secs),
                    None => {
                        return Err(ConfigError::Invalid {
                            key: "TUTOR_TIMEOUT_SECS",
                            value,
                        })
                    }
                }
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            bot_token,
            provider,
            gemini_api_key: var("GEMINI_API_KEY"),
            gemini_endpoint: var("GEMINI_ENDPOINT")
                .unwrap_or_else(|| gemini::DEFAULT_ENDPOINT.to_string()),
            gemini_model: var("GEMINI_MODEL").unwrap_or_else(|| gemini::DEFAULT_MODEL.to_string()),
            chatgpt_api_key: var("CHATGPT_API_KEY"),
            timeout,
            content_path: var("CONTENT_PATH").map(PathBuf::from),
        })
    }

    pub fn load_content(&self) -> Result<Content, ContentError> {
        match &self.content_path {
            Some(path) => {
                info!("Loading content from {}", path.display());
                Content::open(path)
            }
            None => {
                info!("Using the built-in content");
                let content = Content::builtin();
                content.validate()?;
                Ok(content)
            }
        }
    }

    pub fn tutor_gateway(&self) -> Result<TutorGateway, ConfigError> {
        let gateway = match self.provider {
            Provider::Gemini => TutorGateway::new(GeminiBackend::new(
                self.gemini_api_key.clone(),
                &self.gemini_endpoint,
                &self.gemini_model,
                self.timeout,
            )?),
            Provider::ChatGpt => {
                TutorGateway::new(ChatGptBackend::new(self.chatgpt_api_key.clone(), self.timeout)?)
            }
        };
        if self.api_key().is_none() {
            warn!(
                "No API key for {}, the tutor will only give fallback answers",
                gateway.backend_name()
            );
        }
        Ok(gateway)
    }

    fn api_key(&self) -> Option<&str> {
        match self.provider {
            Provider::Gemini => self.gemini_api_key.as_deref(),
            Provider::ChatGpt => self.chatgpt_api_key.as_deref(),
        }
    }
}
