//! BIP39 助记词校验
//!
//! 只负责把助记词还原为熵，不做任何派生

use bip39::{Language, Mnemonic};
use zeroize::Zeroizing;

use crate::{error::AppError, utils::string_utils::mnemonic_preview};

/// 通过校验的熵（drop 时清零）
pub struct ValidEntropy(Zeroizing<Vec<u8>>);

impl ValidEntropy {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for ValidEntropy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ValidEntropy({} bytes)", self.0.len())
    }
}

/// 校验助记词并返回熵
///
/// 允许 12/15/18/21/24 个单词（英文词表），任何一项不满足即返回
/// `AppError::InvalidMnemonic`，错误中只保留前30个字符的预览
pub fn validate(phrase: &str) -> Result<ValidEntropy, AppError> {
    let mnemonic =
        Mnemonic::parse_in(Language::English, phrase).map_err(|e| AppError::InvalidMnemonic {
            preview: mnemonic_preview(phrase.trim()),
            reason: describe(&e),
        })?;

    Ok(ValidEntropy(Zeroizing::new(mnemonic.to_entropy())))
}

fn describe(err: &bip39::Error) -> String {
    match err {
        bip39::Error::BadWordCount(n) => format!("bad word count {}", n),
        bip39::Error::UnknownWord(idx) => format!("unknown word at position {}", idx + 1),
        bip39::Error::InvalidChecksum => "invalid checksum".to_string(),
        other => other.to_string(),
    }
}
