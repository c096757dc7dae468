use serde::{Deserialize, Serialize};

/// 组合键中 msgctxt 与 msgid 之间的分隔符（与 gettext 的 EOT 约定一致）
pub const CONTEXT_SEPARATOR: char = '\u{4}';

/// fuzzy 标记
pub const FUZZY_FLAG: &str = "fuzzy";

/// 生成条目的组合键
///
/// 有上下文时为 `msgctxt + EOT + msgid`，否则仅为 `msgid`。
/// 空上下文 `Some("")` 与无上下文 `None` 得到不同的键。
pub fn composite_key(id: &str, context: Option<&str>) -> String {
    match context {
        Some(ctx) => format!("{}{}{}", ctx, CONTEXT_SEPARATOR, id),
        None => id.to_string(),
    }
}

/// 译文：单数形式为一个字符串，复数形式为按复数类别索引的字符串序列
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Translation {
    Singular(String),
    Plural(Vec<String>),
}

impl Translation {
    /// 主译文字符串（复数形式取第一项）
    pub fn primary(&self) -> &str {
        match self {
            Translation::Singular(text) => text,
            Translation::Plural(forms) => forms.first().map(String::as_str).unwrap_or(""),
        }
    }

    pub fn is_plural(&self) -> bool {
        matches!(self, Translation::Plural(_))
    }
}

impl Default for Translation {
    fn default() -> Self {
        Translation::Singular(String::new())
    }
}

/// 标记集合
///
/// 集合语义（成员判断/增加/删除），同时保留首次出现的顺序以便展示。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlagSet(Vec<String>);

impl FlagSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn contains(&self, flag: &str) -> bool {
        self.0.iter().any(|f| f == flag)
    }

    /// 加入标记，已存在时返回 false
    pub fn insert(&mut self, flag: impl Into<String>) -> bool {
        let flag = flag.into();
        if self.contains(&flag) {
            return false;
        }
        self.0.push(flag);
        true
    }

    /// 删除标记，不存在时返回 false
    pub fn remove(&mut self, flag: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|f| f != flag);
        self.0.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for FlagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = FlagSet::new();
        for flag in iter {
            set.insert(flag);
        }
        set
    }
}

/// 条目状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Translated,
    Untranslated,
    Fuzzy,
    Obsolete,
}

/// 一个可翻译单元
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// 源字符串 (msgid)
    pub id: String,
    /// 上下文 (msgctxt)，`None` 与 `Some("")` 含义不同
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// 译文 (msgstr / msgstr[n])
    pub translation: Translation,
    /// 复数源字符串 (msgid_plural)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plural_id: Option<String>,
    /// 提取注释 (#.)
    pub comments: Vec<String>,
    /// 译者注释 (# )
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub translator_comments: Vec<String>,
    /// 标记 (#,)
    pub flags: FlagSet,
    /// 源码引用 (#: path:line)
    pub references: Vec<String>,
    /// 上一版本的 msgid (#| msgid)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_id: Option<String>,
    /// 已废弃条目 (#~)
    pub obsolete: bool,
}

impl Entry {
    /// 创建单数形式的条目
    pub fn new(id: impl Into<String>, translation: impl Into<String>) -> Self {
        Entry {
            id: id.into(),
            translation: Translation::Singular(translation.into()),
            ..Default::default()
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.flags.insert(flag);
        self
    }

    pub fn key(&self) -> String {
        composite_key(&self.id, self.context.as_deref())
    }

    /// 是否与给定组合键完全匹配（上下文精确比较）
    pub fn matches_key(&self, id: &str, context: Option<&str>) -> bool {
        self.id == id && self.context.as_deref() == context
    }

    pub fn is_fuzzy(&self) -> bool {
        self.flags.contains(FUZZY_FLAG)
    }

    /// 计算条目状态
    ///
    /// 废弃条目只属于 Obsolete；fuzzy 优先于已翻译/未翻译判定。
    pub fn status(&self) -> EntryStatus {
        if self.obsolete {
            EntryStatus::Obsolete
        } else if self.is_fuzzy() {
            EntryStatus::Fuzzy
        } else if !self.translation.primary().is_empty() {
            EntryStatus::Translated
        } else {
            EntryStatus::Untranslated
        }
    }
}
