pub mod catalog;
pub mod config;
pub mod editor;
pub mod entry;
pub mod hooks;
pub mod io;
pub mod search;
pub mod service;
pub mod store;
pub mod utils;
pub mod writer;

// 重新导出主要结构
pub use catalog::{Catalog, CatalogStats, CatalogSummary};
pub use config::EngineConfig;
pub use editor::{BatchReport, CatalogEditor, SaveReport, TranslationDelta, UpdateOutcome, UpdateRequest};
pub use entry::{Entry, EntryStatus, FlagSet, Translation};
pub use search::{MatchTarget, SearchCriteria, SearchHit};
pub use service::{CatalogService, ToolFailure};
pub use store::CatalogStore;
pub use utils::CatalogError;
pub use writer::patch_catalog_text;

// 常量定义
pub const SUPPORTED_EXTENSIONS: &[&str] = &["po", "pot"];
