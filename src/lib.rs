//! scavenger-donor - Cardano 钱包捐赠证明批量提交工具
//!
//! 从 BIP-39 助记词派生 CIP-1852 密钥，生成 CIP-8 签名证明并提交到 donate_to 接口

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod service;
pub mod utils;

// 重新导出常用类型
pub use error::{AppError, AppErrorCode, AppResult};
