//! 助记词输入（CSV）
//!
//! - 第一行为表头
//! - 优先读取指定列（默认 `mnemonic`），该列缺失或为空时取记录的第一个字段
//! - 字段两端空白去除，空记录丢弃

use std::{fs::File, io::Read, path::Path};

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::error::{AppError, AppResult};

pub fn read_phrases<R: Read>(reader: R, column: &str) -> AppResult<Vec<String>> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let column_idx = csv_reader
        .headers()
        .map_err(|e| AppError::input(format!("failed to read CSV header: {}", e)))?
        .iter()
        .position(|h| h == column);

    let mut phrases = Vec::new();
    for (line, record) in csv_reader.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                // 单行格式错误只跳过该行
                tracing::warn!(record = line + 1, error = %e, "Skipping malformed CSV record");
                continue;
            }
        };

        if let Some(phrase) = pick_phrase(&record, column_idx) {
            phrases.push(phrase.to_string());
        }
    }

    Ok(phrases)
}

pub fn read_phrases_from_path<P: AsRef<Path>>(path: P, column: &str) -> AppResult<Vec<String>> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("CSV file not found: {} ({})", path.display(), e)))?;

    let phrases = read_phrases(file, column)?;
    tracing::info!(path = %path.display(), count = phrases.len(), "Loaded mnemonics");
    Ok(phrases)
}

fn pick_phrase(record: &StringRecord, column_idx: Option<usize>) -> Option<&str> {
    column_idx
        .and_then(|idx| record.get(idx))
        .filter(|s| !s.is_empty())
        .or_else(|| record.get(0))
        .filter(|s| !s.is_empty())
}
