//! 统一错误类型
//!
//! 库代码统一返回 `Result<_, AppError>`，二进制入口使用 `anyhow` 包装上下文

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppErrorCode {
    InvalidMnemonic,
    DerivationFailed,
    InvalidAddress,
    InvalidConfig,
    InputUnavailable,
    HttpClient,
}

impl AppErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppErrorCode::InvalidMnemonic => "invalid_mnemonic",
            AppErrorCode::DerivationFailed => "derivation_failed",
            AppErrorCode::InvalidAddress => "invalid_address",
            AppErrorCode::InvalidConfig => "invalid_config",
            AppErrorCode::InputUnavailable => "input_unavailable",
            AppErrorCode::HttpClient => "http_client",
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum AppError {
    /// 助记词无效（词数、未知单词或校验和错误），只携带截断预览
    #[error("Invalid mnemonic: {preview} ({reason})")]
    InvalidMnemonic { preview: String, reason: String },

    #[error("Key derivation failed: {0}")]
    Derivation(String),

    #[error("Invalid address: {0}")]
    Address(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Input unavailable: {0}")]
    Input(String),

    #[error("HTTP client error: {0}")]
    Http(String),
}

impl AppError {
    pub fn code(&self) -> AppErrorCode {
        match self {
            AppError::InvalidMnemonic { .. } => AppErrorCode::InvalidMnemonic,
            AppError::Derivation(_) => AppErrorCode::DerivationFailed,
            AppError::Address(_) => AppErrorCode::InvalidAddress,
            AppError::Config(_) => AppErrorCode::InvalidConfig,
            AppError::Input(_) => AppErrorCode::InputUnavailable,
            AppError::Http(_) => AppErrorCode::HttpClient,
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        AppError::Config(msg.into())
    }

    pub fn input(msg: impl Into<String>) -> Self {
        AppError::Input(msg.into())
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;
