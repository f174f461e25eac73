use crate::core::etl::DEFAULT_PAGE_SIZE;
use crate::core::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "https://qualysguard.qg2.apps.qualys.eu";
pub const DEFAULT_ENDPOINT: &str = "/cloudview-api/rest/v1/aws/connectors";

const PLACEHOLDER_USERNAME: &str = "your_qualys_username";
const PLACEHOLDER_PASSWORD: &str = "your_qualys_password";

const CONFIG_FILE_NAMES: [&str; 3] = ["config.toml", "config.yaml", "config.yml"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub qualys: QualysConfig,
    pub api: ApiConfig,
    pub output: OutputConfig,
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualysConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub timeout_seconds: u64,
    pub verify_ssl: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub endpoint: String,
    pub default_page_size: u32,
    pub max_pages: Option<u32>,
    /// Request timeout as laid out in `config.yaml`; wins over
    /// `qualys.timeout_seconds` when both are set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: String,
}

impl Default for QualysConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            username: String::new(),
            password: String::new(),
            timeout_seconds: 30,
            verify_ssl: true,
        }
    }
}

// Keeps the password out of logs.
impl std::fmt::Debug for QualysConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QualysConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"********")
            .field("timeout_seconds", &self.timeout_seconds)
            .field("verify_ssl", &self.verify_ssl)
            .finish()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            default_page_size: DEFAULT_PAGE_SIZE,
            max_pages: None,
            timeout_seconds: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "./output".to_string(),
        }
    }
}

impl AppConfig {
    /// 從檔案載入配置，依副檔名選擇 YAML 或 TOML
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            _ => Self::from_toml_str(&content),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content)?;
        toml::from_str::<Self>(&processed)
            .map(Self::resolve_timeout)
            .map_err(|e| EtlError::ConfigError {
                message: format!("TOML parsing error: {}", e),
            })
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content)?;
        serde_yaml::from_str::<Self>(&processed)
            .map(Self::resolve_timeout)
            .map_err(|e| EtlError::ConfigError {
                message: format!("YAML parsing error: {}", e),
            })
    }

    /// Folds `api.timeout_seconds` into the transport setting, so that a
    /// later `QUALYS_TIMEOUT` override still takes precedence.
    fn resolve_timeout(mut self) -> Self {
        if let Some(timeout) = self.api.timeout_seconds.take() {
            self.qualys.timeout_seconds = timeout;
        }
        self
    }

    /// 替換環境變數 (例如 ${QUALYS_PASSWORD})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").map_err(|e| {
            EtlError::ConfigError {
                message: format!("Invalid placeholder pattern: {}", e),
            }
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// First config file found in the working directory or its parent.
    pub fn find_config_file() -> Option<PathBuf> {
        let cwd = std::env::current_dir().ok()?;
        let mut dirs = vec![cwd.clone()];
        if let Some(parent) = cwd.parent() {
            dirs.push(parent.to_path_buf());
        }

        dirs.iter()
            .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
            .find(|candidate| candidate.is_file())
    }

    /// Loads the given file, or the first one found, or the defaults; then
    /// applies `QUALYS_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::find_config_file() {
                Some(found) => {
                    tracing::info!("Found config file: {}", found.display());
                    Self::from_file(found)?
                }
                None => {
                    tracing::info!("No config file found, using defaults and environment");
                    Self::default()
                }
            },
        };
        config.apply_env_overrides()?;
        config.warn_on_placeholder_credentials();
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|name| std::env::var(name).ok())
    }

    /// Environment values take precedence over the file.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup("QUALYS_BASE_URL") {
            self.qualys.base_url = base_url;
        }
        if let Some(username) = lookup("QUALYS_USERNAME") {
            self.qualys.username = username;
        }
        if let Some(password) = lookup("QUALYS_PASSWORD") {
            self.qualys.password = password;
        }
        if let Some(timeout) = lookup("QUALYS_TIMEOUT") {
            self.qualys.timeout_seconds =
                timeout
                    .trim()
                    .parse()
                    .map_err(|_| EtlError::InvalidConfigValueError {
                        field: "QUALYS_TIMEOUT".to_string(),
                        value: timeout.clone(),
                        reason: "expected a whole number of seconds".to_string(),
                    })?;
        }
        if let Some(verify) = lookup("QUALYS_VERIFY_SSL") {
            self.qualys.verify_ssl = verify.trim().eq_ignore_ascii_case("true");
        }
        Ok(())
    }

    pub fn warn_on_placeholder_credentials(&self) {
        if self.qualys.username.is_empty() || self.qualys.username == PLACEHOLDER_USERNAME {
            tracing::warn!(
                "Qualys username not configured. Update the config file or set QUALYS_USERNAME"
            );
        }
        if self.qualys.password.is_empty() || self.qualys.password == PLACEHOLDER_PASSWORD {
            tracing::warn!(
                "Qualys password not configured. Update the config file or set QUALYS_PASSWORD"
            );
        }
    }

    /// Live runs need real credentials; mock runs do not.
    pub fn require_credentials(&self) -> Result<()> {
        validation::validate_non_empty_string("qualys.username", &self.qualys.username)?;
        validation::validate_non_empty_string("qualys.password", &self.qualys.password)?;
        if self.qualys.username == PLACEHOLDER_USERNAME {
            return Err(EtlError::MissingConfigError {
                field: "qualys.username".to_string(),
            });
        }
        if self.qualys.password == PLACEHOLDER_PASSWORD {
            return Err(EtlError::MissingConfigError {
                field: "qualys.password".to_string(),
            });
        }
        Ok(())
    }

    pub fn listing_url(&self) -> String {
        format!(
            "{}{}",
            self.qualys.base_url.trim_end_matches('/'),
            self.api.endpoint
        )
    }
}

impl ConfigProvider for AppConfig {
    fn base_url(&self) -> &str {
        &self.qualys.base_url
    }

    fn endpoint(&self) -> &str {
        &self.api.endpoint
    }

    fn page_size(&self) -> u32 {
        self.api.default_page_size
    }

    fn max_pages(&self) -> Option<u32> {
        self.api.max_pages
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("qualys.base_url", &self.qualys.base_url)?;
        validation::validate_endpoint_path("api.endpoint", &self.api.endpoint)?;
        validation::validate_range("qualys.timeout_seconds", self.qualys.timeout_seconds, 1, 600)?;
        validation::validate_positive_number(
            "api.default_page_size",
            u64::from(self.api.default_page_size),
            1,
        )?;
        if let Some(max_pages) = self.api.max_pages {
            validation::validate_positive_number("api.max_pages", u64::from(max_pages), 1)?;
        }
        validation::validate_path("output.path", &self.output.path)?;
        Ok(())
    }
}
