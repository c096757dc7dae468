//! PO 文本语法解析
//!
//! 支持的结构：
//! - `msgctxt` / `msgid` / `msgid_plural` / `msgstr` / `msgstr[N]` 及续行字符串
//! - `#.` 提取注释、`#:` 源码引用、`#,` 标记、`#|` 上一版本 msgid、`# ` 译者注释
//! - `#~` 前缀的废弃条目
//!
//! msgid 为空且无上下文的首个条目视为头部，其 msgstr 按 `Key: value\n` 拆分。

use std::collections::HashSet;
use std::path::Path;

use indexmap::IndexMap;

use crate::entry::{Entry, Translation};
use crate::utils::CatalogError;

/// 解析结果（头部 + 有序条目）
#[derive(Debug, Clone, Default)]
pub struct ParsedCatalog {
    pub headers: IndexMap<String, String>,
    pub entries: Vec<Entry>,
}

/// 转义 PO 字符串字面量内容
///
/// 反斜杠必须最先处理，否则会把后面插入的 `\"` 再次转义。
pub fn escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\t', "\\t")
        .replace('\r', "\\r")
}

/// 解析一个带引号的字符串字面量（如 `"Hello \"world\""`），返回反转义后的内容
pub fn parse_quoted(literal: &str) -> Result<String, String> {
    let literal = literal.trim();
    let body = literal
        .strip_prefix('"')
        .ok_or_else(|| "expected quoted string".to_string())?;

    let mut result = String::with_capacity(body.len());
    let mut chars = body.chars();

    loop {
        match chars.next() {
            None => return Err("unterminated string".to_string()),
            Some('"') => break,
            Some('\\') => match chars.next() {
                None => return Err("unterminated string".to_string()),
                Some('n') => result.push('\n'),
                Some('t') => result.push('\t'),
                Some('r') => result.push('\r'),
                Some('a') => result.push('\u{7}'),
                Some('b') => result.push('\u{8}'),
                Some('f') => result.push('\u{c}'),
                Some('v') => result.push('\u{b}'),
                Some('\\') => result.push('\\'),
                Some('"') => result.push('"'),
                Some(other) => {
                    // 未知转义保持原样
                    result.push('\\');
                    result.push(other);
                }
            },
            Some(c) => result.push(c),
        }
    }

    if !chars.as_str().trim().is_empty() {
        return Err("unexpected characters after closing quote".to_string());
    }

    Ok(result)
}

/// 关键字行
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Keyword {
    Msgctxt,
    Msgid,
    MsgidPlural,
    Msgstr,
    MsgstrIndexed(usize),
}

/// 拆分关键字行，返回关键字与其后的字面量部分
///
/// 无法识别的行返回 `Ok(None)`；`msgstr[x]` 下标非法时返回错误。
pub(crate) fn split_keyword(line: &str) -> Result<Option<(Keyword, &str)>, String> {
    if let Some(rest) = line.strip_prefix("msgstr[") {
        let close = rest
            .find(']')
            .ok_or_else(|| "unterminated msgstr index".to_string())?;
        let index = rest[..close]
            .trim()
            .parse::<usize>()
            .map_err(|_| format!("invalid msgstr index '{}'", &rest[..close]))?;
        return Ok(Some((Keyword::MsgstrIndexed(index), &rest[close + 1..])));
    }

    let (word, rest) = match line.find(|c: char| c.is_whitespace()) {
        Some(pos) => (&line[..pos], &line[pos..]),
        None => (line, ""),
    };

    let keyword = match word {
        "msgctxt" => Keyword::Msgctxt,
        "msgid" => Keyword::Msgid,
        "msgid_plural" => Keyword::MsgidPlural,
        "msgstr" => Keyword::Msgstr,
        _ => return Ok(None),
    };

    Ok(Some((keyword, rest)))
}

/// 当前续行字符串要追加到的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpenField {
    None,
    Context,
    Id,
    PluralId,
    Str(usize),
}

/// 正在构建中的条目
#[derive(Debug, Default)]
struct EntryBuilder {
    entry: Entry,
    start_line: usize,
    has_id: bool,
    has_str: bool,
    indexed: bool,
    forms: Vec<String>,
}

impl EntryBuilder {
    fn is_blank(&self) -> bool {
        !self.has_id
            && self.entry.context.is_none()
            && self.entry.comments.is_empty()
            && self.entry.translator_comments.is_empty()
            && self.entry.flags.is_empty()
            && self.entry.references.is_empty()
            && self.entry.previous_id.is_none()
    }

    fn field_mut(&mut self, field: OpenField) -> Option<&mut String> {
        match field {
            OpenField::None => None,
            OpenField::Context => self.entry.context.as_mut(),
            OpenField::Id => Some(&mut self.entry.id),
            OpenField::PluralId => self.entry.plural_id.as_mut(),
            OpenField::Str(index) => self.forms.get_mut(index),
        }
    }
}

struct Parser<'a> {
    path: &'a Path,
    result: ParsedCatalog,
    seen_keys: HashSet<String>,
    header_seen: bool,
    current: EntryBuilder,
    open: OpenField,
    line_number: usize,
}

impl<'a> Parser<'a> {
    fn new(path: &'a Path) -> Self {
        Parser {
            path,
            result: ParsedCatalog::default(),
            seen_keys: HashSet::new(),
            header_seen: false,
            current: EntryBuilder::default(),
            open: OpenField::None,
            line_number: 0,
        }
    }

    fn error(&self, line: usize, reason: impl Into<String>) -> CatalogError {
        CatalogError::ParseError {
            path: self.path.to_path_buf(),
            line,
            reason: reason.into(),
        }
    }

    fn run(mut self, text: &str) -> Result<ParsedCatalog, CatalogError> {
        for (index, raw) in text.lines().enumerate() {
            self.line_number = index + 1;
            let raw = if index == 0 {
                raw.trim_start_matches('\u{feff}')
            } else {
                raw
            };
            self.process_line(raw.trim())?;
        }
        self.finish_entry()?;
        Ok(self.result)
    }

    fn process_line(&mut self, line: &str) -> Result<(), CatalogError> {
        if line.is_empty() {
            if self.current.has_str || self.current.has_id {
                self.finish_entry()?;
            }
            self.open = OpenField::None;
            return Ok(());
        }

        if let Some(rest) = line.strip_prefix("#~") {
            let rest = rest.trim_start();
            if rest.is_empty() || rest.starts_with('|') {
                return Ok(());
            }
            if self.current.has_str && !self.current.entry.obsolete && !rest.starts_with('"') {
                self.finish_entry()?;
            }
            self.process_statement(rest)?;
            self.current.entry.obsolete = true;
            return Ok(());
        }

        if let Some(rest) = line.strip_prefix('#') {
            if self.current.has_str {
                self.finish_entry()?;
            }
            self.open = OpenField::None;
            self.process_comment(rest);
            return Ok(());
        }

        self.process_statement(line)
    }

    fn process_comment(&mut self, rest: &str) {
        let entry = &mut self.current.entry;
        if let Some(content) = rest.strip_prefix(',') {
            for flag in content.split(',') {
                let flag = flag.trim();
                if !flag.is_empty() {
                    entry.flags.insert(flag);
                }
            }
        } else if let Some(content) = rest.strip_prefix(':') {
            entry
                .references
                .extend(content.split_whitespace().map(str::to_string));
        } else if let Some(content) = rest.strip_prefix('.') {
            entry.comments.push(content.trim().to_string());
        } else if let Some(content) = rest.strip_prefix('|') {
            let content = content.trim();
            if let Some(literal) = content.strip_prefix("msgid ") {
                if let Ok(value) = parse_quoted(literal) {
                    entry.previous_id = Some(value);
                }
            }
        } else {
            entry.translator_comments.push(rest.trim().to_string());
        }
    }

    fn process_statement(&mut self, line: &str) -> Result<(), CatalogError> {
        let line_number = self.line_number;

        if line.starts_with('"') {
            let value = parse_quoted(line).map_err(|reason| self.error(line_number, reason))?;
            let open = self.open;
            if let Some(field) = self.current.field_mut(open) {
                field.push_str(&value);
                return Ok(());
            }
            return Err(self.error(line_number, "string continuation without a keyword"));
        }

        let (keyword, literal) = match split_keyword(line) {
            Ok(Some(parts)) => parts,
            Ok(None) => return Err(self.error(line_number, format!("unrecognized line: {}", line))),
            Err(reason) => return Err(self.error(line_number, reason)),
        };
        let value = parse_quoted(literal).map_err(|reason| self.error(line_number, reason))?;

        match keyword {
            Keyword::Msgctxt => {
                if self.current.has_str {
                    self.finish_entry()?;
                } else if self.current.has_id {
                    return Err(self.error(line_number, "msgctxt after msgid"));
                }
                self.mark_start();
                self.current.entry.context = Some(value);
                self.open = OpenField::Context;
            }
            Keyword::Msgid => {
                if self.current.has_str {
                    self.finish_entry()?;
                } else if self.current.has_id {
                    return Err(self.error(line_number, "duplicate msgid without msgstr"));
                }
                self.mark_start();
                self.current.entry.id = value;
                self.current.has_id = true;
                self.open = OpenField::Id;
            }
            Keyword::MsgidPlural => {
                if !self.current.has_id || self.current.has_str {
                    return Err(self.error(line_number, "msgid_plural must follow msgid"));
                }
                self.current.entry.plural_id = Some(value);
                self.open = OpenField::PluralId;
            }
            Keyword::Msgstr => {
                if !self.current.has_id {
                    return Err(self.error(line_number, "msgstr without msgid"));
                }
                if self.current.has_str {
                    return Err(self.error(line_number, "duplicate msgstr"));
                }
                self.current.forms = vec![value];
                self.current.has_str = true;
                self.open = OpenField::Str(0);
            }
            Keyword::MsgstrIndexed(index) => {
                if !self.current.has_id {
                    return Err(self.error(line_number, "msgstr without msgid"));
                }
                if self.current.has_str && !self.current.indexed {
                    return Err(self.error(line_number, "mixed msgstr and msgstr[n]"));
                }
                let forms = &mut self.current.forms;
                if forms.len() <= index {
                    forms.resize(index + 1, String::new());
                }
                forms[index] = value;
                self.current.has_str = true;
                self.current.indexed = true;
                self.open = OpenField::Str(index);
            }
        }

        Ok(())
    }

    fn mark_start(&mut self) {
        if self.current.start_line == 0 {
            self.current.start_line = self.line_number;
        }
    }

    fn finish_entry(&mut self) -> Result<(), CatalogError> {
        let builder = std::mem::take(&mut self.current);
        self.open = OpenField::None;

        if builder.is_blank() {
            return Ok(());
        }
        if !builder.has_id {
            // 文件末尾孤立的注释
            if builder.entry.context.is_none() {
                return Ok(());
            }
            return Err(self.error(builder.start_line, "msgctxt without msgid"));
        }
        if !builder.has_str && !builder.entry.obsolete {
            return Err(self.error(builder.start_line, "msgid without msgstr"));
        }

        let EntryBuilder {
            mut entry,
            start_line,
            indexed,
            forms,
            ..
        } = builder;

        entry.translation = if indexed {
            Translation::Plural(forms)
        } else {
            Translation::Singular(forms.into_iter().next().unwrap_or_default())
        };

        if entry.id.is_empty() && entry.context.is_none() && !entry.obsolete && !self.header_seen {
            self.header_seen = true;
            self.result.headers = parse_headers(entry.translation.primary());
            return Ok(());
        }

        if !entry.obsolete && !self.seen_keys.insert(entry.key()) {
            return Err(self.error(
                start_line,
                format!("duplicate message definition for msgid \"{}\"", entry.id),
            ));
        }

        self.result.entries.push(entry);
        Ok(())
    }
}

/// 拆分头部 msgstr 为 `Key: value` 映射
pub fn parse_headers(header: &str) -> IndexMap<String, String> {
    header
        .split('\n')
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

/// 解析 PO 文本
///
/// `path` 仅用于错误信息。
pub fn parse_catalog(path: &Path, text: &str) -> Result<ParsedCatalog, CatalogError> {
    Parser::new(path).run(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<ParsedCatalog, CatalogError> {
        parse_catalog(Path::new("test.po"), text)
    }

    #[test]
    fn test_escape_order() {
        assert_eq!(escape(r#"a "b" \c"#), r#"a \"b\" \\c"#);
        assert_eq!(escape("line\nnext"), "line\\nnext");
        assert_eq!(escape(r#"\""#), r#"\\\""#);
    }

    #[test]
    fn test_parse_quoted() {
        assert_eq!(parse_quoted(r#""Hello \"World\"""#).unwrap(), "Hello \"World\"");
        assert_eq!(parse_quoted(r#""a\\b\n""#).unwrap(), "a\\b\n");
        assert!(parse_quoted("\"open").is_err());
        assert!(parse_quoted("bare").is_err());
        assert!(parse_quoted("\"x\" y").is_err());
    }

    #[test]
    fn test_split_keyword() {
        assert_eq!(
            split_keyword("msgstr[1] \"x\"").unwrap(),
            Some((Keyword::MsgstrIndexed(1), " \"x\""))
        );
        assert_eq!(
            split_keyword("msgid_plural \"x\"").unwrap(),
            Some((Keyword::MsgidPlural, " \"x\""))
        );
        assert_eq!(split_keyword("msgfoo \"x\"").unwrap(), None);
        assert!(split_keyword("msgstr[a] \"x\"").is_err());
    }

    #[test]
    fn test_multiline_strings_and_header() {
        let parsed = parse(
            "msgid \"\"\nmsgstr \"\"\n\"Language: fr\\n\"\n\"Plural-Forms: nplurals=2; plural=(n > 1);\\n\"\n\nmsgid \"\"\n\"Hello \"\n\"World\"\nmsgstr \"\"\n\"Bonjour \"\n\"le monde\"\n",
        )
        .unwrap();

        assert_eq!(parsed.headers.get("Language").map(String::as_str), Some("fr"));
        assert_eq!(
            parsed.headers.get("Plural-Forms").map(String::as_str),
            Some("nplurals=2; plural=(n > 1);")
        );
        assert_eq!(parsed.entries.len(), 1);
        assert_eq!(parsed.entries[0].id, "Hello World");
        assert_eq!(parsed.entries[0].translation.primary(), "Bonjour le monde");
    }

    #[test]
    fn test_entries_without_blank_separator() {
        let parsed = parse("msgid \"a\"\nmsgstr \"A\"\nmsgid \"b\"\nmsgstr \"B\"\n").unwrap();
        assert_eq!(parsed.entries.len(), 2);
        assert_eq!(parsed.entries[1].id, "b");
        assert_eq!(parsed.entries[1].translation.primary(), "B");
    }

    #[test]
    fn test_indexed_plural_gaps_are_filled() {
        let parsed =
            parse("msgid \"file\"\nmsgid_plural \"files\"\nmsgstr[1] \"fichiers\"\n").unwrap();
        assert_eq!(
            parsed.entries[0].translation,
            Translation::Plural(vec![String::new(), "fichiers".into()])
        );
    }

    #[test]
    fn test_missing_msgstr_is_error() {
        let err = parse("msgid \"a\"\n\nmsgid \"b\"\nmsgstr \"\"\n").unwrap_err();
        match err {
            CatalogError::ParseError { line, .. } => assert_eq!(line, 1),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unrecognized_line_is_error() {
        let err = parse("msgid \"a\"\nmsgstr \"\"\ngarbage\n").unwrap_err();
        match err {
            CatalogError::ParseError { line, reason, .. } => {
                assert_eq!(line, 3);
                assert!(reason.contains("garbage"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_key_is_error() {
        assert!(parse("msgid \"a\"\nmsgstr \"\"\n\nmsgid \"a\"\nmsgstr \"x\"\n").is_err());
        // 上下文不同则不冲突
        assert!(parse("msgid \"a\"\nmsgstr \"\"\n\nmsgctxt \"\"\nmsgid \"a\"\nmsgstr \"x\"\n").is_ok());
    }

    #[test]
    fn test_bom_is_ignored() {
        let parsed = parse("\u{feff}msgid \"a\"\nmsgstr \"b\"\n").unwrap();
        assert_eq!(parsed.entries[0].id, "a");
    }
}
