//! Cardano Shelley 地址
//!
//! Base address 组成:
//! - Header (1 byte): 高4位地址类型 (0000 = base, key/key)，低4位网络ID
//! - Payment credential (28 bytes): payment key hash
//! - Stake credential (28 bytes): stake key hash
//!
//! Bech32 编码，前缀 "addr" (mainnet) 或 "addr_test" (testnet)

use blake2::{digest::consts::U28, Blake2b, Digest};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const KEY_HASH_LEN: usize = 28;
pub const BASE_ADDRESS_LEN: usize = 1 + 2 * KEY_HASH_LEN;

const BASE_KEY_KEY_TYPE: u8 = 0b0000;

type Blake2b224 = Blake2b<U28>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    pub fn id(&self) -> u8 {
        match self {
            Network::Mainnet => 1,
            Network::Testnet => 0,
        }
    }

    pub fn hrp(&self) -> &'static str {
        match self {
            Network::Mainnet => "addr",
            Network::Testnet => "addr_test",
        }
    }

    fn from_hrp(hrp: &str) -> Option<Self> {
        match hrp {
            "addr" => Some(Network::Mainnet),
            "addr_test" => Some(Network::Testnet),
            _ => None,
        }
    }
}

impl std::str::FromStr for Network {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" | "preprod" | "preview" => Ok(Network::Testnet),
            other => Err(AppError::config(format!("unknown network: {}", other))),
        }
    }
}

/// 公钥哈希 (Blake2b-224)
pub fn key_hash(public_key: &[u8; 32]) -> [u8; KEY_HASH_LEN] {
    let digest = Blake2b224::digest(public_key);
    let mut out = [0u8; KEY_HASH_LEN];
    out.copy_from_slice(&digest);
    out
}

/// Shelley base address (payment key hash + stake key hash)
#[derive(Clone, PartialEq, Eq)]
pub struct ShelleyAddress {
    bytes: [u8; BASE_ADDRESS_LEN],
}

impl ShelleyAddress {
    pub fn base(
        network: Network,
        payment_hash: &[u8; KEY_HASH_LEN],
        stake_hash: &[u8; KEY_HASH_LEN],
    ) -> Self {
        let mut bytes = [0u8; BASE_ADDRESS_LEN];
        bytes[0] = (BASE_KEY_KEY_TYPE << 4) | network.id();
        bytes[1..1 + KEY_HASH_LEN].copy_from_slice(payment_hash);
        bytes[1 + KEY_HASH_LEN..].copy_from_slice(stake_hash);
        Self { bytes }
    }

    /// 解析 bech32 base address（只接受 key/key 类型）
    pub fn from_bech32(s: &str) -> Result<Self, AppError> {
        let (network, data) = decode_address(s)?;

        if data.len() != BASE_ADDRESS_LEN {
            return Err(AppError::Address(format!(
                "expected {} bytes, got {}",
                BASE_ADDRESS_LEN,
                data.len()
            )));
        }
        if data[0] >> 4 != BASE_KEY_KEY_TYPE {
            return Err(AppError::Address(format!(
                "not a key/key base address (header 0x{:02x})",
                data[0]
            )));
        }
        if data[0] & 0x0f != network.id() {
            return Err(AppError::Address(
                "network id does not match address prefix".to_string(),
            ));
        }

        let mut bytes = [0u8; BASE_ADDRESS_LEN];
        bytes.copy_from_slice(&data);
        Ok(Self { bytes })
    }

    pub fn to_bech32(&self) -> Result<String, AppError> {
        let hrp = bech32::Hrp::parse(self.network().hrp())
            .map_err(|e| AppError::Address(format!("invalid HRP: {:?}", e)))?;
        bech32::encode::<bech32::Bech32>(hrp, &self.bytes)
            .map_err(|e| AppError::Address(format!("bech32 encoding failed: {}", e)))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn network(&self) -> Network {
        if self.bytes[0] & 0x0f == Network::Mainnet.id() {
            Network::Mainnet
        } else {
            Network::Testnet
        }
    }

    pub fn payment_key_hash(&self) -> &[u8] {
        &self.bytes[1..1 + KEY_HASH_LEN]
    }

    pub fn stake_key_hash(&self) -> &[u8] {
        &self.bytes[1 + KEY_HASH_LEN..]
    }
}

impl std::fmt::Debug for ShelleyAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ShelleyAddress({})", hex::encode(self.bytes))
    }
}

/// 解码任意 Shelley 地址（用于校验目标地址），返回网络和原始字节
pub fn decode_address(s: &str) -> Result<(Network, Vec<u8>), AppError> {
    let (hrp, data) = bech32::decode(s.trim())
        .map_err(|e| AppError::Address(format!("bech32 decoding failed: {}", e)))?;

    let network = Network::from_hrp(hrp.as_str())
        .ok_or_else(|| AppError::Address(format!("unexpected prefix: {}", hrp.as_str())))?;

    if data.is_empty() {
        return Err(AppError::Address("empty address payload".to_string()));
    }

    Ok((network, data))
}
