//! Domain 模块
//!
//! 助记词校验、密钥派生、地址编码与签名证明

pub mod address;
pub mod derivation;
pub mod mnemonic;
pub mod proof;

pub use address::{Network, ShelleyAddress};
pub use derivation::{ExtendedSigningKey, WalletKeys, XPrv};
pub use proof::ProofEnvelope;
