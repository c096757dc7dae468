//! 保留格式的目录写回
//!
//! 以磁盘上的原始文本为排版依据，逐行扫描，只替换内存中译文与磁盘不一致的
//! `msgstr` 块；注释、头部、空行、折行与条目顺序按字节原样保留。
//!
//! 扫描器只有两个状态：
//! - `SeekingEntry`：跟踪 `msgctxt` / `msgid`（含续行）以确定当前条目的组合键
//! - `InsideMsgstr`：收集一个 `msgstr` 块（`msgstr` 或连续的 `msgstr[n]` 及续行），
//!   块结束时决定原样输出还是替换
//!
//! 内存中已不再是 fuzzy 的条目，其 `#,` 标记行中的 `fuzzy` 也会被移除。

use std::collections::HashMap;
use std::ops::Range;
use std::path::Path;

use tracing::{debug, info};

use crate::catalog::parser::{escape, parse_quoted, split_keyword, Keyword};
use crate::catalog::{decode_catalog_bytes, encode_catalog_text, Catalog};
use crate::entry::{composite_key, Entry, Translation, FUZZY_FLAG};
use crate::io::{CatalogReader, CatalogWriter};
use crate::utils::CatalogError;

/// 写回结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    /// 新的文件文本
    pub text: String,
    /// 被替换的 msgstr 块数量
    pub patched_entries: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    SeekingEntry,
    InsideMsgstr { indexed: bool },
}

/// 续行字符串归属的键字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpenKey {
    None,
    Context,
    Id,
}

struct LinePatcher<'a> {
    targets: HashMap<String, &'a Entry>,
    state: ScanState,
    context: Option<String>,
    id: Option<String>,
    open: OpenKey,
    /// 当前条目的 msgstr 块已处理，下一个键行开始新条目
    block_done: bool,
    block: Vec<&'a str>,
    /// 当前条目所有 `#,` 标记行在 output 中的位置
    flags_lines: Vec<Range<usize>>,
    output: String,
    patched: usize,
}

impl<'a> LinePatcher<'a> {
    fn new(catalog: &'a Catalog, capacity: usize) -> Self {
        let targets = catalog
            .active_entries()
            .map(|entry| (entry.key(), entry))
            .collect();

        LinePatcher {
            targets,
            state: ScanState::SeekingEntry,
            context: None,
            id: None,
            open: OpenKey::None,
            block_done: false,
            block: Vec::new(),
            flags_lines: Vec::new(),
            output: String::with_capacity(capacity),
            patched: 0,
        }
    }

    fn feed(&mut self, line: &'a str, first_line: bool) {
        let content = if first_line {
            line.trim_start_matches('\u{feff}')
        } else {
            line
        }
        .trim();

        if let ScanState::InsideMsgstr { indexed } = self.state {
            let continues =
                content.starts_with('"') || (indexed && content.starts_with("msgstr["));
            if continues {
                self.block.push(line);
                return;
            }
            self.flush_block(indexed);
        }

        self.seek(line, content);
    }

    fn seek(&mut self, line: &'a str, content: &str) {
        if content.is_empty() {
            if self.block_done {
                self.reset_entry();
            }
            self.flags_lines.clear();
            self.open = OpenKey::None;
            self.output.push_str(line);
            return;
        }

        // 注释与 #~ 废弃条目不参与替换
        if content.starts_with('#') {
            self.open = OpenKey::None;
            if content.starts_with("#~") {
                self.flags_lines.clear();
            } else if content.starts_with("#,") {
                let start = self.output.len();
                self.output.push_str(line);
                self.flags_lines.push(start..self.output.len());
                return;
            }
            self.output.push_str(line);
            return;
        }

        if content.starts_with('"') {
            let field = match self.open {
                OpenKey::Context => self.context.as_mut(),
                OpenKey::Id => self.id.as_mut(),
                OpenKey::None => None,
            };
            if let Some(field) = field {
                match parse_quoted(content) {
                    Ok(value) => field.push_str(&value),
                    Err(_) => self.open = OpenKey::None,
                }
            }
            self.output.push_str(line);
            return;
        }

        match split_keyword(content) {
            Ok(Some((Keyword::Msgctxt, literal))) => {
                self.reset_entry();
                self.context = parse_quoted(literal).ok();
                self.open = OpenKey::Context;
            }
            Ok(Some((Keyword::Msgid, literal))) => {
                if self.block_done {
                    self.reset_entry();
                }
                self.id = parse_quoted(literal).ok();
                self.open = OpenKey::Id;
            }
            Ok(Some((Keyword::Msgstr, _))) => {
                self.state = ScanState::InsideMsgstr { indexed: false };
                self.block.push(line);
                return;
            }
            Ok(Some((Keyword::MsgstrIndexed(_), _))) => {
                self.state = ScanState::InsideMsgstr { indexed: true };
                self.block.push(line);
                return;
            }
            _ => self.open = OpenKey::None,
        }

        self.output.push_str(line);
    }

    fn reset_entry(&mut self) {
        self.context = None;
        self.id = None;
        self.block_done = false;
    }

    fn flush_block(&mut self, indexed: bool) {
        let block = std::mem::take(&mut self.block);
        let flags_lines = std::mem::take(&mut self.flags_lines);
        self.state = ScanState::SeekingEntry;
        self.block_done = true;
        self.open = OpenKey::None;

        let target = self
            .id
            .as_deref()
            .and_then(|id| self.targets.get(&composite_key(id, self.context.as_deref())))
            .copied();

        let Some(entry) = target else {
            block.iter().for_each(|line| self.output.push_str(line));
            return;
        };

        // 倒序处理，前面的区间不受替换影响
        let mut flags_patched = false;
        if !entry.is_fuzzy() {
            for range in flags_lines.into_iter().rev() {
                flags_patched |= self.drop_fuzzy_flag(range);
            }
        }

        let projected = project(&entry.translation, indexed);
        let unchanged = read_block(&block, indexed).as_ref() == Some(&projected);
        if unchanged {
            block.iter().for_each(|line| self.output.push_str(line));
        } else {
            debug!(msgid = %entry.id, msgctxt = ?entry.context, "替换 msgstr 块");
            self.emit(&block, &projected);
        }

        if flags_patched || !unchanged {
            self.patched += 1;
        }
    }

    /// 从已输出的 `#,` 行中移除 fuzzy；行内没有其他标记时删除整行
    fn drop_fuzzy_flag(&mut self, range: Range<usize>) -> bool {
        let line = self.output[range.clone()].to_string();
        let eol = line_ending(&line).unwrap_or("");
        let flags: Vec<&str> = line
            .trim()
            .trim_start_matches("#,")
            .split(',')
            .map(str::trim)
            .filter(|flag| !flag.is_empty())
            .collect();

        if !flags.contains(&FUZZY_FLAG) {
            return false;
        }

        let kept: Vec<&str> = flags.into_iter().filter(|&flag| flag != FUZZY_FLAG).collect();
        let replacement = if kept.is_empty() {
            String::new()
        } else {
            format!("#, {}{}", kept.join(", "), eol)
        };
        self.output.replace_range(range, &replacement);
        true
    }

    fn emit(&mut self, block: &[&str], projected: &Translation) {
        let first = block.first().copied().unwrap_or_default();
        let last = block.last().copied().unwrap_or_default();
        let eol = line_ending(first).unwrap_or("\n");
        let final_eol = line_ending(last).unwrap_or("");

        let lines = render(projected);
        let count = lines.len();
        for (index, rendered) in lines.into_iter().enumerate() {
            self.output.push_str(&rendered);
            self.output
                .push_str(if index + 1 == count { final_eol } else { eol });
        }
    }

    fn finish(mut self) -> PatchOutcome {
        if let ScanState::InsideMsgstr { indexed } = self.state {
            self.flush_block(indexed);
        }
        PatchOutcome {
            text: self.output,
            patched_entries: self.patched,
        }
    }
}

fn line_ending(line: &str) -> Option<&'static str> {
    if line.ends_with("\r\n") {
        Some("\r\n")
    } else if line.ends_with('\n') {
        Some("\n")
    } else {
        None
    }
}

/// 把内存中的译文投影到磁盘块的形态
///
/// - 块是 `msgstr[n]`：复数按序写出；单数写为 `msgstr[0]`
/// - 块是 `msgstr`：复数强制取第一项
fn project(translation: &Translation, indexed: bool) -> Translation {
    if !indexed {
        return Translation::Singular(translation.primary().to_string());
    }
    match translation {
        Translation::Plural(forms) if !forms.is_empty() => Translation::Plural(forms.clone()),
        Translation::Plural(_) => Translation::Plural(vec![String::new()]),
        Translation::Singular(text) => Translation::Plural(vec![text.clone()]),
    }
}

fn render(projected: &Translation) -> Vec<String> {
    match projected {
        Translation::Singular(text) => vec![format!("msgstr \"{}\"", escape(text))],
        Translation::Plural(forms) => forms
            .iter()
            .enumerate()
            .map(|(index, form)| format!("msgstr[{}] \"{}\"", index, escape(form)))
            .collect(),
    }
}

/// 读出磁盘块当前的值；无法解析时返回 `None`（按有变更处理）
fn read_block(block: &[&str], indexed: bool) -> Option<Translation> {
    let mut forms: Vec<String> = Vec::new();
    let mut current: Option<usize> = None;

    for line in block {
        let content = line.trim();
        if content.starts_with('"') {
            let slot = forms.get_mut(current?)?;
            slot.push_str(&parse_quoted(content).ok()?);
            continue;
        }

        let (index, literal) = match split_keyword(content).ok()?? {
            (Keyword::Msgstr, literal) => (0, literal),
            (Keyword::MsgstrIndexed(index), literal) => (index, literal),
            _ => return None,
        };
        if forms.len() <= index {
            forms.resize(index + 1, String::new());
        }
        forms[index] = parse_quoted(literal).ok()?;
        current = Some(index);
    }

    if indexed {
        Some(Translation::Plural(forms))
    } else {
        forms.into_iter().next().map(Translation::Singular)
    }
}

/// 把目录的内存状态投影到原始文本上
pub fn patch_catalog_text(original: &str, catalog: &Catalog) -> PatchOutcome {
    let mut patcher = LinePatcher::new(catalog, original.len());
    for (index, line) in original.split_inclusive('\n').enumerate() {
        patcher.feed(line, index == 0);
    }
    patcher.finish()
}

/// 待写入的内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedWrite {
    pub patched_entries: usize,
    /// 按原编码编码后的新内容；文本无变化时为 `None`
    pub bytes: Option<Vec<u8>>,
}

/// 读取磁盘原文并生成打补丁后的字节
///
/// 任何 IO 或编码错误都返回 `PersistenceError`，内存中的目录保持不变。
pub fn prepare_write(
    catalog: &Catalog,
    reader: &dyn CatalogReader,
) -> Result<PreparedWrite, CatalogError> {
    let path: &Path = &catalog.path;

    let raw = reader
        .read(path)
        .map_err(|e| CatalogError::persistence(path, format!("read failed: {}", e)))?;
    let (original, _) = decode_catalog_bytes(path, &raw.bytes)
        .map_err(|e| CatalogError::persistence(path, e))?;

    let PatchOutcome {
        text,
        patched_entries,
    } = patch_catalog_text(&original, catalog);

    if text == original {
        debug!(path = %path.display(), "内容无变化，跳过写入");
        return Ok(PreparedWrite {
            patched_entries,
            bytes: None,
        });
    }

    let bytes = encode_catalog_text(path, text, catalog.encoding())?;
    Ok(PreparedWrite {
        patched_entries,
        bytes: Some(bytes),
    })
}

/// 打补丁并写回原路径，返回是否实际写入
pub fn persist_catalog(
    catalog: &Catalog,
    reader: &dyn CatalogReader,
    writer: &dyn CatalogWriter,
) -> Result<bool, CatalogError> {
    let PreparedWrite {
        patched_entries,
        bytes,
    } = prepare_write(catalog, reader)?;

    let Some(bytes) = bytes else {
        return Ok(false);
    };

    write_bytes(writer, &catalog.path, &bytes)?;
    info!(path = %catalog.path.display(), patched_entries, "已写回目录");
    Ok(true)
}

pub(crate) fn write_bytes(
    writer: &dyn CatalogWriter,
    path: &Path,
    bytes: &[u8],
) -> Result<(), CatalogError> {
    writer
        .write(bytes, path)
        .map_err(|e| CatalogError::persistence(path, format!("write failed: {}", e)))
}
