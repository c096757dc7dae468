/// 目录编辑器模块
///
/// 提供有状态的目录编辑接口，支持单条/批量修改和显式保存。
/// 遵循"修改-保存分离"原则：`update_translation` 只修改内存，`save` 才写盘。

use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::delta::{TranslationChange, TranslationDelta};
use crate::catalog::Catalog;
use crate::config::EngineConfig;
use crate::entry::Translation;
use crate::hooks::{HookOutcome, MsgmergeHook, PostSaveHook};
use crate::io::{CatalogReader, CatalogWriter, DefaultCatalogReader, DefaultCatalogWriter};
use crate::store::CatalogStore;
use crate::utils::{create_backup, CatalogError};
use crate::writer::{prepare_write, write_bytes};

/// 一条更新请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    pub file_path: PathBuf,
    pub msgid: String,
    #[serde(default)]
    pub msgctxt: Option<String>,
    /// 单数为字符串，复数为字符串数组
    pub msgstr: Translation,
}

impl UpdateRequest {
    pub fn new(
        file_path: impl Into<PathBuf>,
        msgid: impl Into<String>,
        msgctxt: Option<&str>,
        msgstr: Translation,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            msgid: msgid.into(),
            msgctxt: msgctxt.map(str::to_string),
            msgstr,
        }
    }
}

/// 单条请求在批量更新中的最终结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub file_path: PathBuf,
    pub msgid: String,
    pub msgctxt: Option<String>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 保存报告
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveReport {
    pub path: PathBuf,
    /// 被替换的 msgstr 块数量
    pub patched_entries: usize,
    /// 是否实际写入了文件（内容无变化时不写）
    pub written: bool,
    pub backup: Option<PathBuf>,
    /// 保存后处理失败的说明（不影响保存结果）
    pub post_save_warning: Option<String>,
}

/// 批量更新报告
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    /// 与请求一一对应
    pub results: Vec<UpdateOutcome>,
    pub saves: Vec<SaveReport>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }
}

/// 目录编辑器 - 持有目录集合并管理修改状态
///
/// # 核心特性
/// - **修改-保存分离**: 修改只作用于内存，保存时按磁盘原文打补丁
/// - **可追踪**: 记录所有未保存的变更
/// - **可注入**: Reader/Writer/后处理器都可替换，便于测试
///
/// # 使用示例
///
/// ```rust,ignore
/// use po_catalog::{CatalogEditor, EngineConfig, Translation};
///
/// let mut editor = CatalogEditor::new(EngineConfig::default());
/// editor.load(Path::new("po/fr.po"))?;
///
/// editor.update_translation(Path::new("po/fr.po"), "Hello", None, Translation::Singular("Bonjour".into()))?;
/// println!("{}", editor.journal().summary());
///
/// let report = editor.save(Path::new("po/fr.po"))?;
/// println!("替换了 {} 处", report.patched_entries);
/// ```
pub struct CatalogEditor {
    store: CatalogStore,
    journal: TranslationDelta,
    reader: Box<dyn CatalogReader>,
    writer: Box<dyn CatalogWriter>,
    hook: Option<Box<dyn PostSaveHook>>,
    config: EngineConfig,
}

impl CatalogEditor {
    /// 创建使用文件系统 IO 的编辑器
    pub fn new(config: EngineConfig) -> Self {
        let hook: Option<Box<dyn PostSaveHook>> = if config.post_save.enabled {
            Some(Box::new(MsgmergeHook::from_config(&config.post_save)))
        } else {
            None
        };

        Self {
            store: CatalogStore::new(),
            journal: TranslationDelta::new(),
            reader: Box::new(DefaultCatalogReader),
            writer: Box::new(DefaultCatalogWriter),
            hook,
            config,
        }
    }

    /// 替换 IO 实现
    pub fn with_io(
        mut self,
        reader: Box<dyn CatalogReader>,
        writer: Box<dyn CatalogWriter>,
    ) -> Self {
        self.reader = reader;
        self.writer = writer;
        self
    }

    /// 替换保存后处理器（`None` 表示禁用）
    pub fn with_hook(mut self, hook: Option<Box<dyn PostSaveHook>>) -> Self {
        self.hook = hook;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    /// 获取变更日志的引用
    pub fn journal(&self) -> &TranslationDelta {
        &self.journal
    }

    /// 加载目录（替换同路径的已有目录及其未保存变更）
    pub fn load(&mut self, path: &Path) -> Result<&Catalog, CatalogError> {
        let catalog = self.store.load_with_reader(path, self.reader.as_ref())?;
        let dropped = self.journal.clear_path(&catalog.path);
        if dropped > 0 {
            warn!(path = %catalog.path.display(), dropped, "重新加载丢弃了未保存的修改");
        }
        Ok(catalog)
    }

    /// 检查是否有未保存的修改
    pub fn is_modified(&self) -> bool {
        !self.journal.is_empty()
    }

    pub fn pending_paths(&self) -> Vec<PathBuf> {
        self.journal.pending_paths()
    }

    /// 更新单条译文（仅修改内存状态）
    pub fn update_translation(
        &mut self,
        path: &Path,
        msgid: &str,
        msgctxt: Option<&str>,
        translation: Translation,
    ) -> Result<(), CatalogError> {
        self.apply(path, msgid, msgctxt, translation).map(|_| ())
    }

    /// 应用修改并记录到变更日志，返回目录的规范化路径
    fn apply(
        &mut self,
        path: &Path,
        msgid: &str,
        msgctxt: Option<&str>,
        translation: Translation,
    ) -> Result<PathBuf, CatalogError> {
        let catalog = self.store.get_mut(path)?;
        let new_value = translation.clone();
        let old_value = catalog.update_translation(msgid, msgctxt, translation)?;

        debug!(path = %catalog.path.display(), msgid, msgctxt = ?msgctxt, "已更新译文");
        self.journal.add_change(TranslationChange {
            path: catalog.path.clone(),
            msgid: msgid.to_string(),
            msgctxt: msgctxt.map(str::to_string),
            old_value,
            new_value,
            applied_at: Local::now(),
        });
        Ok(catalog.path.clone())
    }

    /// 批量更新并保存
    ///
    /// 先在内存中应用全部请求（互不影响），再对每个涉及的目录各保存一次。
    /// 某个目录保存失败时，该目录下的所有成功请求都改判为失败。
    pub fn update_translations(&mut self, requests: Vec<UpdateRequest>) -> BatchReport {
        let mut report = BatchReport::default();
        let mut owners: Vec<Option<PathBuf>> = Vec::with_capacity(requests.len());
        let mut touched: Vec<PathBuf> = Vec::new();

        for request in requests {
            let applied = self.apply(
                &request.file_path,
                &request.msgid,
                request.msgctxt.as_deref(),
                request.msgstr,
            );

            let (owner, error) = match applied {
                Ok(path) => {
                    if !touched.contains(&path) {
                        touched.push(path.clone());
                    }
                    (Some(path), None)
                }
                Err(e) => (None, Some(e.to_string())),
            };

            report.results.push(UpdateOutcome {
                file_path: request.file_path,
                msgid: request.msgid,
                msgctxt: request.msgctxt,
                success: error.is_none(),
                error,
            });
            owners.push(owner);
        }

        for path in touched {
            match self.save(&path) {
                Ok(save) => report.saves.push(save),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "批量更新保存失败");
                    let message = e.to_string();
                    for (outcome, owner) in report.results.iter_mut().zip(&owners) {
                        if owner.as_deref() == Some(path.as_path()) {
                            outcome.success = false;
                            outcome.error = Some(message.clone());
                        }
                    }
                }
            }
        }

        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "批量更新完成"
        );
        report
    }

    /// 保存目录到原路径（需要显式调用）
    ///
    /// 只替换有变化的 msgstr 块；失败时内存状态与变更日志保持不变，可重试。
    pub fn save(&mut self, path: &Path) -> Result<SaveReport, CatalogError> {
        let catalog = self.store.get(path)?;
        let prepared = prepare_write(catalog, self.reader.as_ref())?;

        let mut report = SaveReport {
            path: catalog.path.clone(),
            patched_entries: prepared.patched_entries,
            written: false,
            backup: None,
            post_save_warning: None,
        };

        if let Some(bytes) = prepared.bytes {
            if self.config.backup_before_save {
                report.backup = Some(create_backup(
                    &report.path,
                    self.reader.as_ref(),
                    self.writer.as_ref(),
                )?);
            }
            write_bytes(self.writer.as_ref(), &report.path, &bytes)?;
            report.written = true;
            info!(
                path = %report.path.display(),
                patched_entries = report.patched_entries,
                "已保存目录"
            );

            report.post_save_warning = self.run_post_save(&report.path);
        }

        self.journal.clear_path(&report.path);
        Ok(report)
    }

    /// 运行保存后处理；工具修改了文件时重新加载，保持内存与磁盘一致
    fn run_post_save(&mut self, path: &Path) -> Option<String> {
        let hook = self.hook.as_ref()?;

        match hook.after_save(path) {
            Ok(HookOutcome::Applied) => {
                match self.store.load_with_reader(path, self.reader.as_ref()) {
                    Ok(_) => None,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "后处理后重新加载失败");
                        Some(e.to_string())
                    }
                }
            }
            Ok(HookOutcome::Skipped(reason)) => {
                debug!(path = %path.display(), reason = %reason, "跳过保存后处理");
                None
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "保存后处理失败");
                Some(e.to_string())
            }
        }
    }

    /// 保存所有有未保存修改的目录
    pub fn save_all(&mut self) -> Vec<Result<SaveReport, CatalogError>> {
        self.pending_paths()
            .into_iter()
            .map(|path| self.save(&path))
            .collect()
    }
}
