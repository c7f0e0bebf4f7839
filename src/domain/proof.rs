//! 消息签名证明（CIP-8 COSE_Sign1 结构）
//!
//! - protected header: 规范化 CBOR 映射 {"1": -8 (EdDSA), "address": 地址原始字节}
//! - unprotected header: 规范化 CBOR 映射 {"hashed": false}，以字节串形式携带
//! - 待签名结构: ["Signature1", protected, h'', payload]
//! - 信封: [protected, unprotected, payload, signature]
//!
//! 远端会独立重建待签名字节，任何编码差异都会导致验签失败

use crate::{
    domain::{address::ShelleyAddress, derivation::ExtendedSigningKey},
    infrastructure::cbor::Value,
};

pub const SIGNATURE_CONTEXT: &str = "Signature1";
/// COSE 算法标识 EdDSA
pub const ALG_EDDSA: i64 = -8;
/// 算法标签以文本键 "1" 编码
pub const ALG_LABEL: &str = "1";
pub const ADDRESS_LABEL: &str = "address";
pub const HASHED_LABEL: &str = "hashed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofEnvelope {
    protected: Vec<u8>,
    unprotected: Vec<u8>,
    payload: Vec<u8>,
    signature: [u8; 64],
}

impl ProofEnvelope {
    pub fn protected_header(&self) -> &[u8] {
        &self.protected
    }

    pub fn unprotected_header(&self) -> &[u8] {
        &self.unprotected
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn signature(&self) -> &[u8; 64] {
        &self.signature
    }

    /// 被签名的字节（与远端重建的一致）
    pub fn signed_bytes(&self) -> Vec<u8> {
        sig_structure(&self.protected, &self.payload)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        Value::Array(vec![
            Value::bytes(self.protected.clone()),
            Value::bytes(self.unprotected.clone()),
            Value::bytes(self.payload.clone()),
            Value::bytes(self.signature.to_vec()),
        ])
        .encode()
    }

    /// 小写十六进制
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }
}

pub fn protected_header(address: &[u8]) -> Vec<u8> {
    Value::Map(vec![
        (Value::text(ALG_LABEL), Value::int(ALG_EDDSA)),
        (Value::text(ADDRESS_LABEL), Value::bytes(address.to_vec())),
    ])
    .encode()
}

pub fn unprotected_header() -> Vec<u8> {
    Value::Map(vec![(Value::text(HASHED_LABEL), Value::Bool(false))]).encode()
}

/// Sig_structure = ["Signature1", protected, external_aad (空), payload]
pub fn sig_structure(protected: &[u8], payload: &[u8]) -> Vec<u8> {
    Value::Array(vec![
        Value::text(SIGNATURE_CONTEXT),
        Value::bytes(protected.to_vec()),
        Value::bytes(Vec::new()),
        Value::bytes(payload.to_vec()),
    ])
    .encode()
}

/// 用 payment 私钥对固定消息签名，生成证明信封
pub fn build_proof(
    payment_key: &ExtendedSigningKey,
    address: &ShelleyAddress,
    message: &str,
) -> ProofEnvelope {
    let payload = message.as_bytes().to_vec();
    let protected = protected_header(address.as_bytes());
    let unprotected = unprotected_header();

    let to_be_signed = sig_structure(&protected, &payload);
    let signature = payment_key.sign(&to_be_signed);

    ProofEnvelope {
        protected,
        unprotected,
        payload,
        signature,
    }
}
