/// 编辑器层模块
///
/// 该模块提供有状态的编辑接口，支持变更追踪和批量更新。
/// 遵循"修改-保存分离"原则，所有修改操作仅在内存中进行，需要显式调用保存。
///
/// # 架构设计
///
/// - **catalog_editor**: 目录编辑器，持有目录集合并负责写回
/// - **delta**: 变更日志，记录未保存的修改
///
/// # 使用示例
///
/// ```rust,ignore
/// use po_catalog::{CatalogEditor, EngineConfig, UpdateRequest, Translation};
///
/// let mut editor = CatalogEditor::new(EngineConfig::default());
/// editor.load(Path::new("po/fr.po"))?;
///
/// let report = editor.update_translations(vec![
///     UpdateRequest::new("po/fr.po", "Hello", None, Translation::Singular("Bonjour".into())),
/// ]);
/// println!("成功 {} 条，失败 {} 条", report.succeeded(), report.failed());
/// ```
pub mod catalog_editor;
pub mod delta;

// === 导出公共接口 ===
pub use catalog_editor::{BatchReport, CatalogEditor, SaveReport, UpdateOutcome, UpdateRequest};
pub use delta::{TranslationChange, TranslationDelta};
