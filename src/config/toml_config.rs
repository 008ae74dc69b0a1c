use crate::config::EodConfig;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// TOML 設定檔；未填的欄位沿用 [`EodConfig::default`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub input: Option<InputConfig>,
    pub output: Option<OutputConfig>,
    pub workers: Option<WorkersConfig>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkersConfig {
    pub count: Option<usize>,
    pub queue_capacity: Option<usize>,
    pub max_write_attempts: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub json_logs: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${EOD_DIR})，未定義的變數保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("invalid env substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.json_logs)
            .unwrap_or(false)
    }

    /// 轉成 engine 使用的設定
    pub fn to_eod_config(&self) -> EodConfig {
        let defaults = EodConfig::default();
        let workers = self.workers.clone().unwrap_or_default();

        EodConfig {
            input_path: self
                .input
                .as_ref()
                .map(|i| i.path.clone())
                .unwrap_or(defaults.input_path),
            output_path: self
                .output
                .as_ref()
                .map(|o| o.path.clone())
                .unwrap_or(defaults.output_path),
            workers: workers.count.unwrap_or(defaults.workers),
            queue_capacity: workers.queue_capacity.unwrap_or(defaults.queue_capacity),
            max_write_attempts: workers
                .max_write_attempts
                .unwrap_or(defaults.max_write_attempts),
            monitor: self
                .monitoring
                .as_ref()
                .map(|m| m.enabled)
                .unwrap_or(defaults.monitor),
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.to_eod_config().validate()
    }
}
