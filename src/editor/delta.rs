/// 译文变更日志模块
///
/// 记录每一次成功的内存修改（修改前后的值与时间），
/// 用于查询哪些目录有未保存的修改；保存成功后清除对应目录的记录。

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::entry::Translation;

/// 译文变更日志
///
/// # 实现细节
/// - 所有变更按应用顺序存储在 changes 向量中
/// - 按目录清除，不影响其他目录的记录
#[derive(Debug, Clone, Default)]
pub struct TranslationDelta {
    changes: Vec<TranslationChange>,
}

/// 单个条目的变更
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationChange {
    /// 所属目录（规范化路径）
    pub path: PathBuf,
    pub msgid: String,
    pub msgctxt: Option<String>,
    /// 修改前的值
    pub old_value: Translation,
    /// 修改后的值
    pub new_value: Translation,
    /// 应用时间
    pub applied_at: DateTime<Local>,
}

impl TranslationDelta {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加一个变更
    pub fn add_change(&mut self, change: TranslationChange) {
        self.changes.push(change);
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// 按应用顺序遍历变更
    pub fn iter(&self) -> impl Iterator<Item = &TranslationChange> {
        self.changes.iter()
    }

    /// 有未保存修改的目录（按路径排序，去重）
    pub fn pending_paths(&self) -> Vec<PathBuf> {
        self.changes
            .iter()
            .map(|change| change.path.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// 获取特定目录的所有变更
    pub fn changes_for_path(&self, path: &Path) -> Vec<&TranslationChange> {
        self.changes
            .iter()
            .filter(|change| change.path == path)
            .collect()
    }

    /// 清除特定目录的变更，返回清除的数量
    pub fn clear_path(&mut self, path: &Path) -> usize {
        let before = self.changes.len();
        self.changes.retain(|change| change.path != path);
        before - self.changes.len()
    }

    pub fn clear(&mut self) {
        self.changes.clear();
    }

    /// 生成变更摘要
    pub fn summary(&self) -> String {
        format!(
            "未保存变更: {}, 涉及目录: {}",
            self.changes.len(),
            self.pending_paths().len()
        )
    }
}

fn shorten(text: &str) -> String {
    if text.chars().count() > 30 {
        format!("{}...", text.chars().take(30).collect::<String>())
    } else {
        text.to_string()
    }
}

impl std::fmt::Display for TranslationChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let file = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default();
        write!(f, "[{}] ", file)?;
        if let Some(ctx) = &self.msgctxt {
            write!(f, "{}|", ctx)?;
        }
        write!(
            f,
            "{}: \"{}\" -> \"{}\"",
            shorten(&self.msgid),
            shorten(self.old_value.primary()),
            shorten(self.new_value.primary())
        )
    }
}
