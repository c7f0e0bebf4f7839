//! 配置管理模块
//! 支持从环境变量和配置文件加载配置

use std::{path::Path, time::Duration};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    domain::address::{decode_address, Network},
    service::{batch_runner::ExecutionMode, submission::RetryPolicy},
};

pub const DEFAULT_API_BASE: &str = "https://scavenger.prod.gd.midnighttge.io/donate_to";
pub const DEFAULT_MESSAGE_TEMPLATE: &str = "Assign accumulated Scavenger rights to: {destination}";
pub const DESTINATION_PLACEHOLDER: &str = "{destination}";
pub const NETWORK_ENV: &str = "CARDANO_NETWORK";

/// 应用配置结构体
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub donation: DonationConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 捐赠目标配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DonationConfig {
    pub destination_address: String,
    pub api_base: String,
    /// 必须包含 `{destination}`
    pub message_template: String,
    pub network: Network,
}

/// 批处理调度配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// true → 有限并发，false → 顺序执行
    pub parallel: bool,
    /// 仅在 parallel=true 时使用
    pub max_concurrent: usize,
}

/// HTTP客户端配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

/// 提交重试配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// 最大重试次数（不含首次请求）
    pub max_retries: u32,
    /// 首次退避时间（毫秒），之后每次翻倍
    pub base_delay_ms: u64,
}

/// 助记词输入文件配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub csv_file: String,
    /// 优先读取的列名，缺失时取第一列
    pub column: String,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "text"
}

impl Default for DonationConfig {
    fn default() -> Self {
        Self {
            // 不提供默认目标地址，必须显式配置
            destination_address: std::env::var("DESTINATION_ADDRESS").unwrap_or_default(),
            api_base: std::env::var("DONATION_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.into()),
            message_template: std::env::var("DONATION_MESSAGE")
                .unwrap_or_else(|_| DEFAULT_MESSAGE_TEMPLATE.into()),
            // 无法解析的值由 validate 拒绝
            network: std::env::var(NETWORK_ENV)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            parallel: std::env::var("PARALLEL")
                .ok()
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            max_concurrent: std::env::var("MAX_CONCURRENT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: std::env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            connect_timeout_secs: std::env::var("HTTP_CONNECT_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: std::env::var("RETRY_MAX")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
            base_delay_ms: std::env::var("RETRY_BASE_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5000),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            csv_file: std::env::var("SEEDS_CSV").unwrap_or_else(|_| "seeds.csv".into()),
            column: std::env::var("SEEDS_COLUMN").unwrap_or_else(|_| "mnemonic".into()),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".into()),
        }
    }
}

impl DonationConfig {
    /// 生成固定签名消息（嵌入目标地址）
    pub fn message(&self) -> String {
        self.message_template
            .replace(DESTINATION_PLACEHOLDER, &self.destination_address)
    }
}

impl BatchConfig {
    pub fn mode(&self) -> ExecutionMode {
        if self.parallel {
            ExecutionMode::BoundedConcurrent {
                limit: self.max_concurrent.max(1),
            }
        } else {
            ExecutionMode::Sequential
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.base_delay_ms),
        }
    }
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            donation: DonationConfig::default(),
            batch: BatchConfig::default(),
            http: HttpConfig::default(),
            retry: RetryConfig::default(),
            input: InputConfig::default(),
            logging: LoggingConfig::default(),
        })
    }

    /// 从配置文件加载配置（缺失字段回落到环境变量/默认值）
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse config file as TOML")
    }

    /// 从环境变量和配置文件合并加载（配置文件优先级更高）
    pub fn from_env_and_file<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let mut config = Self::from_env()?;

        if let Some(path) = path {
            if path.as_ref().exists() {
                config = Self::from_file(path)?;
            } else {
                // 此时日志尚未初始化
                eprintln!(
                    "Config file not found: {}, using environment",
                    path.as_ref().display()
                );
            }
        }

        Ok(config)
    }

    /// 去除字符串配置两端空白（加载和命令行覆盖之后调用一次）
    pub fn normalize(&mut self) {
        self.donation.destination_address = self.donation.destination_address.trim().to_string();
        self.donation.api_base = self.donation.api_base.trim().to_string();
        self.input.csv_file = self.input.csv_file.trim().to_string();
        self.input.column = self.input.column.trim().to_string();
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<()> {
        let destination = self.donation.destination_address.as_str();
        if destination.is_empty() {
            anyhow::bail!("DESTINATION_ADDRESS must be set");
        }
        // 目标地址原样进入签名消息和 URL，不允许残留空白
        if destination.trim() != destination {
            anyhow::bail!("DESTINATION_ADDRESS must not contain surrounding whitespace");
        }

        let (network, _) = decode_address(destination)
            .with_context(|| format!("DESTINATION_ADDRESS is not a Cardano address: {}", destination))?;
        if let Ok(raw) = std::env::var(NETWORK_ENV) {
            parse_network_name(&raw)?;
        }
        if network != self.donation.network {
            anyhow::bail!(
                "DESTINATION_ADDRESS network {:?} does not match configured network {:?}",
                network,
                self.donation.network
            );
        }

        if !self.donation.message_template.contains(DESTINATION_PLACEHOLDER) {
            anyhow::bail!("DONATION_MESSAGE must contain {}", DESTINATION_PLACEHOLDER);
        }

        if !self.donation.api_base.starts_with("http://")
            && !self.donation.api_base.starts_with("https://")
        {
            anyhow::bail!("DONATION_API_BASE must start with http:// or https://");
        }

        if self.batch.parallel && self.batch.max_concurrent == 0 {
            anyhow::bail!("MAX_CONCURRENT must be at least 1");
        }

        // 验证日志级别
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!("LOG_LEVEL must be one of: {:?}", valid_levels);
        }

        // 验证日志格式
        if self.logging.format != "json" && self.logging.format != "text" {
            anyhow::bail!("LOG_FORMAT must be 'json' or 'text'");
        }

        Ok(())
    }
}

/// 严格解析网络名，拼写错误不会回落到 mainnet
pub fn parse_network_name(raw: &str) -> Result<Network> {
    raw.parse::<Network>()
        .with_context(|| format!("{} must be mainnet, testnet, preprod or preview", NETWORK_ENV))
}
