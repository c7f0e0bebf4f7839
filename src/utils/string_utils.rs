//! 字符串工具模块
//! 提供截断预览等字符串处理函数

/// 按字符截断，超长时追加 `…`（不会切断多字节字符）
pub fn preview(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}…", &s[..byte_idx]),
        None => s.to_string(),
    }
}

/// 助记词诊断预览：前30个字符
pub fn mnemonic_preview(phrase: &str) -> String {
    preview(phrase, 30)
}

/// 证明预览：十六进制前32个字符
pub fn proof_preview(proof_hex: &str) -> String {
    preview(proof_hex, 32)
}
