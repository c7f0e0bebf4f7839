//! Cardano 钱包派生 (CIP-1852)
//!
//! 根密钥使用 Icarus 方案 (CIP-3)，子密钥使用 BIP32-Ed25519 (V2) 派生:
//! m/1852'/1815'/0'/0/0 (payment) 与 m/1852'/1815'/0'/2/0 (stake)

use curve25519_dalek::{edwards::EdwardsPoint, scalar::Scalar};
use ed25519_dalek::{
    hazmat::{raw_sign, ExpandedSecretKey},
    VerifyingKey,
};
use hmac::{Hmac, Mac};
use sha2::Sha512;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::{
    domain::{
        address::{key_hash, Network, ShelleyAddress, KEY_HASH_LEN},
        mnemonic::{self, ValidEntropy},
    },
    error::AppError,
};

pub const HARDENED_OFFSET: u32 = 0x8000_0000;
pub const PURPOSE: u32 = 1852;
pub const COIN_TYPE: u32 = 1815;
pub const ACCOUNT: u32 = 0;
pub const PAYMENT_ROLE: u32 = 0;
pub const STAKE_ROLE: u32 = 2;
pub const ADDRESS_INDEX: u32 = 0;

const PBKDF2_ITERATIONS: u32 = 4096;
pub const XPRV_LEN: usize = 96;

type HmacSha512 = Hmac<Sha512>;

pub const fn harden(index: u32) -> u32 {
    HARDENED_OFFSET + index
}

/// 扩展私钥: kL(32) ‖ kR(32) ‖ chain code(32)
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct XPrv([u8; XPRV_LEN]);

impl XPrv {
    /// Icarus 根密钥: PBKDF2-HMAC-SHA512(passphrase, entropy, 4096) 后按 Ed25519 规则钳位
    pub fn from_bip39_entropy(entropy: &[u8], passphrase: &[u8]) -> Self {
        let mut bytes = [0u8; XPRV_LEN];
        pbkdf2::pbkdf2_hmac::<Sha512>(passphrase, entropy, PBKDF2_ITERATIONS, &mut bytes);

        bytes[0] &= 0b1111_1000;
        bytes[31] &= 0b0001_1111;
        bytes[31] |= 0b0100_0000;

        Self(bytes)
    }

    /// 单级子密钥派生（index >= 2^31 为硬派生）
    pub fn derive(&self, index: u32) -> Result<XPrv, AppError> {
        let index_bytes = index.to_le_bytes();
        let chain_code = self.chain_code();

        let (z, c) = if index >= HARDENED_OFFSET {
            let kl_kr = &self.0[..64];
            (
                hmac_sha512(chain_code, 0x00, kl_kr, &index_bytes)?,
                hmac_sha512(chain_code, 0x01, kl_kr, &index_bytes)?,
            )
        } else {
            let public = self.public_key();
            (
                hmac_sha512(chain_code, 0x02, &public, &index_bytes)?,
                hmac_sha512(chain_code, 0x03, &public, &index_bytes)?,
            )
        };

        let mut child = [0u8; XPRV_LEN];
        add_28_mul8(&mut child[..32], &self.0[..32], &z[..28]);
        add_256(&mut child[32..64], &self.0[32..64], &z[32..64]);
        child[64..].copy_from_slice(&c[32..64]);

        Ok(XPrv(child))
    }

    pub fn derive_path(&self, path: &[u32]) -> Result<XPrv, AppError> {
        let mut iter = path.iter();
        let mut current = match iter.next() {
            Some(&index) => self.derive(index)?,
            None => return Ok(XPrv(self.0)),
        };
        for &index in iter {
            current = current.derive(index)?;
        }
        Ok(current)
    }

    pub fn chain_code(&self) -> &[u8] {
        &self.0[64..]
    }

    pub fn as_bytes(&self) -> &[u8; XPRV_LEN] {
        &self.0
    }

    /// A = kL·B
    pub fn public_key(&self) -> [u8; 32] {
        public_from_kl(&self.0[..32])
    }

    /// 去掉 chain code，得到可签名的原始扩展密钥
    pub fn to_raw_key(&self) -> Result<ExtendedSigningKey, AppError> {
        let mut extended = Zeroizing::new([0u8; 64]);
        extended.copy_from_slice(&self.0[..64]);
        ExtendedSigningKey::from_extended(extended)
    }
}

/// Ed25519 扩展签名密钥 (kL ‖ kR)，kL 直接作为标量，kR 作为 nonce 前缀
pub struct ExtendedSigningKey {
    extended: Zeroizing<[u8; 64]>,
    verifying_key: VerifyingKey,
}

impl ExtendedSigningKey {
    fn from_extended(extended: Zeroizing<[u8; 64]>) -> Result<Self, AppError> {
        let public = public_from_kl(&extended[..32]);
        let verifying_key = VerifyingKey::from_bytes(&public)
            .map_err(|e| AppError::Derivation(format!("invalid public key: {}", e)))?;
        Ok(Self {
            extended,
            verifying_key,
        })
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }

    pub fn key_hash(&self) -> [u8; KEY_HASH_LEN] {
        key_hash(&self.public_key_bytes())
    }

    /// 签名（确定性：同一消息总是得到同一签名）
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        let mut kl = [0u8; 32];
        kl.copy_from_slice(&self.extended[..32]);
        let mut hash_prefix = [0u8; 32];
        hash_prefix.copy_from_slice(&self.extended[32..]);

        let esk = ExpandedSecretKey {
            scalar: Scalar::from_bytes_mod_order(kl),
            hash_prefix,
        };
        kl.zeroize();

        raw_sign::<Sha512>(&esk, message, &self.verifying_key).to_bytes()
    }
}

impl std::fmt::Debug for ExtendedSigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtendedSigningKey")
            .field("public_key", &hex::encode(self.public_key_bytes()))
            .finish_non_exhaustive()
    }
}

/// 派生结果：payment 签名密钥 + base address
#[derive(Debug)]
pub struct WalletKeys {
    pub payment_key: ExtendedSigningKey,
    pub address: ShelleyAddress,
    pub address_bech32: String,
}

/// 从已校验的熵派生钱包（空 passphrase）
pub fn derive(entropy: &ValidEntropy, network: Network) -> Result<WalletKeys, AppError> {
    let root = XPrv::from_bip39_entropy(entropy.as_bytes(), b"");
    let account = root.derive_path(&[harden(PURPOSE), harden(COIN_TYPE), harden(ACCOUNT)])?;

    let payment_key = account
        .derive_path(&[PAYMENT_ROLE, ADDRESS_INDEX])?
        .to_raw_key()?;
    let stake_key = account
        .derive_path(&[STAKE_ROLE, ADDRESS_INDEX])?
        .to_raw_key()?;

    let address = ShelleyAddress::base(network, &payment_key.key_hash(), &stake_key.key_hash());
    let address_bech32 = address.to_bech32()?;

    tracing::debug!(address = %address_bech32, "Derived wallet");

    Ok(WalletKeys {
        payment_key,
        address,
        address_bech32,
    })
}

/// 校验 + 派生
pub fn derive_from_mnemonic(phrase: &str, network: Network) -> Result<WalletKeys, AppError> {
    let entropy = mnemonic::validate(phrase)?;
    derive(&entropy, network)
}

fn public_from_kl(kl: &[u8]) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(kl);
    let scalar = Scalar::from_bytes_mod_order(bytes);
    bytes.zeroize();
    EdwardsPoint::mul_base(&scalar).compress().to_bytes()
}

/// HMAC-SHA512(chain code, tag ‖ data ‖ index)
fn hmac_sha512(
    chain_code: &[u8],
    tag: u8,
    data: &[u8],
    index: &[u8; 4],
) -> Result<Zeroizing<[u8; 64]>, AppError> {
    let mut mac = <HmacSha512 as Mac>::new_from_slice(chain_code)
        .map_err(|e| AppError::Derivation(format!("HMAC key rejected: {}", e)))?;
    mac.update(&[tag]);
    mac.update(data);
    mac.update(index);
    let mut out = Zeroizing::new([0u8; 64]);
    out.copy_from_slice(&mac.finalize().into_bytes());
    Ok(out)
}

/// out = x + 8·y，y 取28字节，按小端256位相加
fn add_28_mul8(out: &mut [u8], x: &[u8], y: &[u8]) {
    let mut carry: u16 = 0;
    for i in 0..32 {
        let shifted = if i < 28 { (y[i] as u16) << 3 } else { 0 };
        let r = x[i] as u16 + shifted + carry;
        out[i] = r as u8;
        carry = r >> 8;
    }
}

/// out = x + y mod 2^256（小端）
fn add_256(out: &mut [u8], x: &[u8], y: &[u8]) {
    let mut carry: u16 = 0;
    for i in 0..32 {
        let r = x[i] as u16 + y[i] as u16 + carry;
        out[i] = r as u8;
        carry = r >> 8;
    }
}
