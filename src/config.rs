use crate::error::ConfigError;
use crate::types::ToolProfile;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

const APP_NAME: &str = "cmdllm";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_AZURE_API_VERSION: &str = "2023-05-15";
const KEY_PLACEHOLDER: &str = "your_api_key_here";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    OpenaiCompatible,
    Azure,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenaiCompatibleConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureConfig {
    pub api_key: String,
    pub endpoint: String,
    pub deployment: String,
    pub api_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    pub max_messages: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorConfig {
    pub request_timeout_secs: u64,
    pub command_timeout_secs: u64,
    pub max_output_lines: usize,
    pub history_window: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub llm_provider: Provider,
    pub tools: Vec<String>,
    pub openai_compatible: OpenaiCompatibleConfig,
    pub azure: AzureConfig,
    pub context: ContextConfig,
    pub behavior: BehaviorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_provider: Provider::OpenaiCompatible,
            tools: vec!["bash".to_string()],
            openai_compatible: OpenaiCompatibleConfig {
                base_url: DEFAULT_BASE_URL.to_string(),
                api_key: KEY_PLACEHOLDER.to_string(),
                model: DEFAULT_MODEL.to_string(),
            },
            azure: AzureConfig {
                api_key: KEY_PLACEHOLDER.to_string(),
                endpoint: "https://your-resource-name.openai.azure.com".to_string(),
                deployment: "your-deployment-name".to_string(),
                api_version: DEFAULT_AZURE_API_VERSION.to_string(),
            },
            context: ContextConfig { max_messages: 20 },
            behavior: BehaviorConfig {
                request_timeout_secs: 60,
                command_timeout_secs: 0,
                max_output_lines: 100,
                history_window: 10,
            },
        }
    }
}

impl Config {
    /// Rejects snapshots a session cannot safely start with. Credentials
    /// are only checked for the selected provider.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.context.max_messages < 1 {
            return Err(ConfigError::Invalid(
                "context.max_messages must be at least 1".to_string(),
            ));
        }
        if self.tools.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one tool must be registered".to_string(),
            ));
        }
        match self.llm_provider {
            Provider::OpenaiCompatible => {
                let c = &self.openai_compatible;
                if c.api_key.is_empty() || c.api_key == KEY_PLACEHOLDER {
                    return Err(ConfigError::MissingCredentials("openai_compatible"));
                }
                if c.base_url.is_empty() || c.model.is_empty() {
                    return Err(ConfigError::Invalid(
                        "openai_compatible.base_url and model must be set".to_string(),
                    ));
                }
            }
            Provider::Azure => {
                let c = &self.azure;
                if c.api_key.is_empty() || c.api_key == KEY_PLACEHOLDER {
                    return Err(ConfigError::MissingCredentials("azure"));
                }
                if c.endpoint.contains("your-resource-name") || c.endpoint.is_empty() {
                    return Err(ConfigError::Invalid(
                        "azure.endpoint must be set".to_string(),
                    ));
                }
                if c.deployment.contains("your-deployment") || c.deployment.is_empty() {
                    return Err(ConfigError::Invalid(
                        "azure.deployment must be set".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn tool_profile(&self, name: &str) -> Result<ToolProfile, ConfigError> {
        if self.tools.iter().any(|t| t == name) {
            Ok(ToolProfile::new(name))
        } else {
            Err(ConfigError::UnknownTool(name.to_string()))
        }
    }

    pub fn add_tool(&mut self, name: &str) -> bool {
        if self.tools.iter().any(|t| t == name) {
            return false;
        }
        self.tools.push(name.to_string());
        true
    }

    pub fn remove_tool(&mut self, name: &str) -> bool {
        let before = self.tools.len();
        self.tools.retain(|t| t != name);
        self.tools.len() != before
    }
}

pub fn get_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
        .join("config.toml")
}

/// Missing file: write the default and return it. Existing file that does
/// not parse: fatal, the session must not start on a guessed config.
pub fn load_config() -> Result<Config, ConfigError> {
    let path = get_config_path();
    if !path.exists() {
        let config = Config::default();
        save_config(&config)?;
        return Ok(config);
    }
    let content = fs::read_to_string(&path)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

pub fn save_config(config: &Config) -> Result<(), ConfigError> {
    let path = get_config_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)
        .map_err(|e| ConfigError::Invalid(e.to_string()))?;
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> Config {
        let mut config = Config::default();
        config.openai_compatible.api_key = "sk-test".to_string();
        config
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.context.max_messages, 20);
        assert_eq!(back.tools, vec!["bash".to_string()]);
        assert_eq!(back.llm_provider, Provider::OpenaiCompatible);
    }

    #[test]
    fn placeholder_key_fails_validation() {
        let config = Config::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingCredentials(_))
        ));
    }

    #[test]
    fn zero_max_messages_fails_validation() {
        let mut config = configured();
        config.context.max_messages = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn azure_placeholders_fail_validation() {
        let mut config = configured();
        config.llm_provider = Provider::Azure;
        config.azure.api_key = "azure-key".to_string();
        assert!(config.validate().is_err());

        config.azure.endpoint = "https://prod.openai.azure.com".to_string();
        config.azure.deployment = "gpt4".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn tool_registry_add_remove() {
        let mut config = configured();
        assert!(config.add_tool("kubectl"));
        assert!(!config.add_tool("kubectl"));
        assert!(config.tool_profile("kubectl").is_ok());
        assert!(config.remove_tool("kubectl"));
        assert!(!config.remove_tool("kubectl"));
        assert!(matches!(
            config.tool_profile("kubectl"),
            Err(ConfigError::UnknownTool(_))
        ));
    }
}
