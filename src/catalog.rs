//! 翻译目录（一个已加载的 PO 文件）

pub mod parser;
mod stats;

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use encoding_rs::{Encoding, UTF_8};
use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;

use crate::entry::{Entry, Translation, FUZZY_FLAG};
use crate::utils::CatalogError;

pub use parser::{escape, parse_catalog, parse_quoted, ParsedCatalog};
pub use stats::CatalogStats;

/// 已加载的翻译目录
#[derive(Debug, Clone)]
pub struct Catalog {
    /// 规范化后的绝对路径（Store 的键）
    pub path: PathBuf,
    /// 头部字段（保持文件中的顺序）
    pub headers: IndexMap<String, String>,
    /// 条目，顺序即磁盘顺序
    pub entries: Vec<Entry>,
    /// 加载时文件的修改时间
    pub last_modified: DateTime<Local>,
    /// 文件编码
    encoding: &'static Encoding,
}

/// 目录概要（工具调用返回值）
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSummary {
    pub path: PathBuf,
    pub headers: IndexMap<String, String>,
    pub entry_count: usize,
    pub encoding: String,
    pub last_modified: DateTime<Local>,
}

impl Catalog {
    /// 从 UTF-8 文本解析目录
    pub fn parse(path: PathBuf, text: &str) -> Result<Self, CatalogError> {
        let ParsedCatalog { headers, entries } = parse_catalog(&path, text)?;
        Ok(Catalog {
            path,
            headers,
            entries,
            last_modified: Local::now(),
            encoding: UTF_8,
        })
    }

    /// 从原始字节解析目录（自动识别编码）
    pub fn from_bytes(
        path: PathBuf,
        bytes: &[u8],
        last_modified: DateTime<Local>,
    ) -> Result<Self, CatalogError> {
        let (text, encoding) = decode_catalog_bytes(&path, bytes)?;
        let mut catalog = Self::parse(path, &text)?;
        catalog.encoding = encoding;
        catalog.last_modified = last_modified;
        Ok(catalog)
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// 目标语言（`Language` 头部）
    pub fn language(&self) -> Option<&str> {
        self.headers.get("Language").map(String::as_str)
    }

    /// 复数规则（`Plural-Forms` 头部）
    pub fn plural_forms(&self) -> Option<&str> {
        self.headers.get("Plural-Forms").map(String::as_str)
    }

    /// 按组合键查找未废弃的条目
    pub fn find_entry(&self, id: &str, context: Option<&str>) -> Option<&Entry> {
        self.entries
            .iter()
            .find(|entry| !entry.obsolete && entry.matches_key(id, context))
    }

    pub fn find_entry_mut(&mut self, id: &str, context: Option<&str>) -> Option<&mut Entry> {
        self.entries
            .iter_mut()
            .find(|entry| !entry.obsolete && entry.matches_key(id, context))
    }

    /// 未废弃的条目
    pub fn active_entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(|entry| !entry.obsolete)
    }

    /// 更新译文（仅修改内存）
    ///
    /// 调用方给出的形态（单数/复数）原样写入，并总是移除 fuzzy 标记。
    /// 返回修改前的译文；找不到条目时不修改任何内容。
    pub fn update_translation(
        &mut self,
        id: &str,
        context: Option<&str>,
        translation: Translation,
    ) -> Result<Translation, CatalogError> {
        let path = self.path.clone();
        let entry = self
            .find_entry_mut(id, context)
            .ok_or_else(|| CatalogError::TranslationNotFound {
                path,
                msgid: id.to_string(),
                msgctxt: context.map(str::to_string),
            })?;

        let previous = std::mem::replace(&mut entry.translation, translation);
        entry.flags.remove(FUZZY_FLAG);
        Ok(previous)
    }

    pub fn summary(&self) -> CatalogSummary {
        CatalogSummary {
            path: self.path.clone(),
            headers: self.headers.clone(),
            entry_count: self.entries.len(),
            encoding: self.encoding.name().to_string(),
            last_modified: self.last_modified,
        }
    }
}

/// 解码目录字节
///
/// 头部 `charset=` 声明了非 UTF-8 编码时按该编码解码，即使字节恰好是合法
/// UTF-8（纯 ASCII 的 Latin-1 目录）；其余情况要求合法 UTF-8，BOM 保留在文本中，
/// 由写入器原样写回。无法识别的声明（如 POT 模板中的 `CHARSET`）按 UTF-8 处理。
pub fn decode_catalog_bytes(
    path: &Path,
    bytes: &[u8],
) -> Result<(String, &'static Encoding), CatalogError> {
    let parse_error = |reason: String| CatalogError::ParseError {
        path: path.to_path_buf(),
        line: 0,
        reason,
    };

    let charset = declared_charset(bytes);
    let declared = charset
        .as_deref()
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .filter(|&encoding| encoding != UTF_8);

    let Some(encoding) = declared else {
        return match std::str::from_utf8(bytes) {
            Ok(text) => Ok((text.to_string(), UTF_8)),
            Err(_) => Err(parse_error(match charset {
                Some(label) if Encoding::for_label(label.as_bytes()).is_none() => {
                    format!("unsupported charset '{}'", label)
                }
                Some(_) => "file declares UTF-8 but is not valid UTF-8".to_string(),
                None => "file is not valid UTF-8 and declares no charset".to_string(),
            })),
        };
    };

    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        return Err(parse_error(format!("invalid {} byte sequence", encoding.name())));
    }

    Ok((text.into_owned(), encoding))
}

/// 从原始字节中找出第一处 `charset=` 声明
fn declared_charset(bytes: &[u8]) -> Option<String> {
    let sniffed = String::from_utf8_lossy(bytes);
    Regex::new(r"charset=([A-Za-z0-9_.:\-]+)")
        .ok()
        .and_then(|re| re.captures(&sniffed).map(|caps| caps[1].to_string()))
}

/// 按目录的原始编码重新编码文本
pub fn encode_catalog_text(
    path: &Path,
    text: String,
    encoding: &'static Encoding,
) -> Result<Vec<u8>, CatalogError> {
    if encoding == UTF_8 {
        return Ok(text.into_bytes());
    }

    let (bytes, _, had_errors) = encoding.encode(&text);
    if had_errors {
        return Err(CatalogError::persistence(
            path,
            format!("text cannot be represented in {}", encoding.name()),
        ));
    }
    Ok(bytes.into_owned())
}
