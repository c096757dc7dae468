use serde::Serialize;

use super::Catalog;
use crate::entry::{Entry, EntryStatus};

/// 目录统计信息
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    /// 全部条目数（含废弃条目）
    pub total: usize,
    pub translated: usize,
    pub untranslated: usize,
    pub fuzzy: usize,
    pub obsolete: usize,
}

impl CatalogStats {
    /// 单次遍历统计
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a Entry>) -> Self {
        entries.into_iter().fold(Self::default(), |mut stats, entry| {
            stats.record(entry.status());
            stats
        })
    }

    fn record(&mut self, status: EntryStatus) {
        self.total += 1;
        match status {
            EntryStatus::Translated => self.translated += 1,
            EntryStatus::Untranslated => self.untranslated += 1,
            EntryStatus::Fuzzy => self.fuzzy += 1,
            EntryStatus::Obsolete => self.obsolete += 1,
        }
    }

    /// 合并另一份统计
    pub fn merge(&mut self, other: &CatalogStats) {
        self.total += other.total;
        self.translated += other.translated;
        self.untranslated += other.untranslated;
        self.fuzzy += other.fuzzy;
        self.obsolete += other.obsolete;
    }

    /// 完成度（已翻译 / 未废弃条目）
    pub fn completion_percentage(&self) -> f64 {
        let active = self.total - self.obsolete;
        if active == 0 {
            return 0.0;
        }
        self.translated as f64 / active as f64 * 100.0
    }
}

impl std::fmt::Display for CatalogStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== 目录统计信息 ===")?;
        writeln!(f, "条目总数: {}", self.total)?;
        writeln!(f, "已翻译: {}", self.translated)?;
        writeln!(f, "未翻译: {}", self.untranslated)?;
        writeln!(f, "待审核(fuzzy): {}", self.fuzzy)?;
        writeln!(f, "已废弃: {}", self.obsolete)?;
        writeln!(f, "完成度: {:.1}%", self.completion_percentage())?;
        Ok(())
    }
}

impl Catalog {
    /// 获取统计信息
    pub fn stats(&self) -> CatalogStats {
        CatalogStats::from_entries(&self.entries)
    }
}
