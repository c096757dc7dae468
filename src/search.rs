//! 条目搜索
//!
//! 先按状态过滤（废弃条目总是排除），再对源文本/译文做模式匹配。
//! 结果按目录路径顺序、目录内条目顺序累积，`limit` 作用于最终结果。

use std::path::{Path, PathBuf};

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::entry::{Entry, EntryStatus};
use crate::store::CatalogStore;
use crate::utils::CatalogError;

/// 匹配目标
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchTarget {
    /// 只匹配源文本 (msgid)
    Source,
    /// 只匹配译文 (msgstr，复数取第一项)
    Translation,
    /// 两者任一
    #[default]
    #[serde(alias = "either")]
    Both,
}

impl MatchTarget {
    fn includes_source(self) -> bool {
        matches!(self, MatchTarget::Source | MatchTarget::Both)
    }

    fn includes_translation(self) -> bool {
        matches!(self, MatchTarget::Translation | MatchTarget::Both)
    }
}

/// 搜索条件
#[derive(Debug, Clone)]
pub struct SearchCriteria {
    pub query: String,
    pub target: MatchTarget,
    pub case_sensitive: bool,
    pub is_regex: bool,
    pub include_translated: bool,
    pub include_untranslated: bool,
    pub include_fuzzy: bool,
    pub limit: Option<usize>,
    /// 只搜索指定目录；`None` 表示所有已加载目录
    pub path: Option<PathBuf>,
}

impl SearchCriteria {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            target: MatchTarget::default(),
            case_sensitive: false,
            is_regex: false,
            include_translated: true,
            include_untranslated: true,
            include_fuzzy: true,
            limit: None,
            path: None,
        }
    }

    pub fn target(mut self, target: MatchTarget) -> Self {
        self.target = target;
        self
    }

    pub fn case_sensitive(mut self, value: bool) -> Self {
        self.case_sensitive = value;
        self
    }

    pub fn regex(mut self, value: bool) -> Self {
        self.is_regex = value;
        self
    }

    pub fn include_translated(mut self, value: bool) -> Self {
        self.include_translated = value;
        self
    }

    pub fn include_untranslated(mut self, value: bool) -> Self {
        self.include_untranslated = value;
        self
    }

    pub fn include_fuzzy(mut self, value: bool) -> Self {
        self.include_fuzzy = value;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn in_catalog(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// 编译查询模式；非正则查询先转义
    pub fn compile(&self) -> Result<Regex, CatalogError> {
        let pattern = if self.is_regex {
            self.query.clone()
        } else {
            regex::escape(&self.query)
        };

        RegexBuilder::new(&pattern)
            .case_insensitive(!self.case_sensitive)
            .build()
            .map_err(|e| CatalogError::InvalidPattern {
                pattern: self.query.clone(),
                reason: e.to_string(),
            })
    }

    fn accepts(&self, status: EntryStatus) -> bool {
        match status {
            EntryStatus::Obsolete => false,
            EntryStatus::Fuzzy => self.include_fuzzy,
            EntryStatus::Translated => self.include_translated,
            EntryStatus::Untranslated => self.include_untranslated,
        }
    }

    fn matches(&self, pattern: &Regex, entry: &Entry) -> bool {
        if self.target.includes_source() && pattern.is_match(&entry.id) {
            return true;
        }
        self.target.includes_translation() && pattern.is_match(entry.translation.primary())
    }
}

/// 搜索命中
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit<'a> {
    pub path: &'a Path,
    pub entry: &'a Entry,
}

impl CatalogStore {
    /// 搜索已加载的目录
    ///
    /// 模式非法时整个调用失败，不返回部分结果。
    pub fn search(&self, criteria: &SearchCriteria) -> Result<Vec<SearchHit<'_>>, CatalogError> {
        let pattern = criteria.compile()?;

        let catalogs: Vec<&Catalog> = match &criteria.path {
            Some(path) => vec![self.get(path)?],
            None => self.catalogs().collect(),
        };

        let limit = criteria.limit.unwrap_or(usize::MAX);
        let mut hits = Vec::new();
        for catalog in catalogs {
            for entry in &catalog.entries {
                if hits.len() >= limit {
                    return Ok(hits);
                }
                if !criteria.accepts(entry.status()) || !criteria.matches(&pattern, entry) {
                    continue;
                }
                hits.push(SearchHit {
                    path: &catalog.path,
                    entry,
                });
            }
        }

        Ok(hits)
    }
}
