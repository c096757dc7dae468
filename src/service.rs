//! 工具调用边界
//!
//! 每个操作接收一个扁平的 JSON 参数对象，返回 JSON 结果，
//! 或返回带错误分类的结构化失败 `{kind, message}`。

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::catalog::CatalogSummary;
use crate::editor::{CatalogEditor, UpdateRequest};
use crate::search::{MatchTarget, SearchCriteria};
use crate::utils::CatalogError;

/// 支持的工具名称
pub const TOOL_NAMES: &[&str] = &[
    "load_catalog",
    "list_catalogs",
    "search_entries",
    "get_stats",
    "update_translation",
    "batch_update_translations",
    "save_catalog",
];

/// 结构化失败
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolFailure {
    pub kind: String,
    pub message: String,
}

impl From<CatalogError> for ToolFailure {
    fn from(error: CatalogError) -> Self {
        ToolFailure {
            kind: error.kind().to_string(),
            message: error.to_string(),
        }
    }
}

impl std::fmt::Display for ToolFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct FilePathArgs {
    file_path: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct OptionalFilePathArgs {
    file_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct SearchArgs {
    query: String,
    #[serde(default)]
    target: MatchTarget,
    #[serde(default)]
    case_sensitive: bool,
    #[serde(default)]
    is_regex: bool,
    include_translated: Option<bool>,
    include_untranslated: Option<bool>,
    include_fuzzy: Option<bool>,
    limit: Option<usize>,
    file_path: Option<PathBuf>,
}

impl SearchArgs {
    fn into_criteria(self, default_limit: Option<usize>) -> SearchCriteria {
        let mut criteria = SearchCriteria::new(self.query)
            .target(self.target)
            .case_sensitive(self.case_sensitive)
            .regex(self.is_regex)
            .include_translated(self.include_translated.unwrap_or(true))
            .include_untranslated(self.include_untranslated.unwrap_or(true))
            .include_fuzzy(self.include_fuzzy.unwrap_or(true));
        criteria.limit = self.limit.or(default_limit);
        criteria.path = self.file_path;
        criteria
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BatchArgs {
    updates: Vec<UpdateRequest>,
}

fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, CatalogError> {
    let args = if args.is_null() { json!({}) } else { args };
    serde_json::from_value(args).map_err(|e| CatalogError::InvalidArguments(e.to_string()))
}

/// 目录服务 - 把命名工具调用分发到编辑器
pub struct CatalogService {
    editor: CatalogEditor,
}

impl CatalogService {
    pub fn new(editor: CatalogEditor) -> Self {
        Self { editor }
    }

    pub fn editor(&self) -> &CatalogEditor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut CatalogEditor {
        &mut self.editor
    }

    /// 调用一个工具
    pub fn call(&mut self, name: &str, args: Value) -> Result<Value, ToolFailure> {
        debug!(tool = name, "工具调用");
        self.dispatch(name, args).map_err(ToolFailure::from)
    }

    fn dispatch(&mut self, name: &str, args: Value) -> Result<Value, CatalogError> {
        match name {
            "load_catalog" => {
                let args: FilePathArgs = parse_args(args)?;
                let catalog = self.editor.load(&args.file_path)?;
                Ok(json!({
                    "catalog": catalog.summary(),
                    "stats": catalog.stats(),
                }))
            }
            "list_catalogs" => {
                let catalogs: Vec<CatalogSummary> = self
                    .editor
                    .store()
                    .catalogs()
                    .map(|catalog| catalog.summary())
                    .collect();
                Ok(json!({ "count": catalogs.len(), "catalogs": catalogs }))
            }
            "search_entries" => {
                let args: SearchArgs = parse_args(args)?;
                let criteria = args.into_criteria(self.editor.config().search_limit);
                let hits = self.editor.store().search(&criteria)?;
                Ok(json!({ "count": hits.len(), "results": hits }))
            }
            "get_stats" => {
                let args: OptionalFilePathArgs = parse_args(args)?;
                let stats = self.editor.store().stats(args.file_path.as_deref())?;
                let mut value = serde_json::to_value(stats)?;
                value["completionPercentage"] = json!(stats.completion_percentage());
                Ok(value)
            }
            "update_translation" => {
                let request: UpdateRequest = parse_args(args)?;
                self.editor.update_translation(
                    &request.file_path,
                    &request.msgid,
                    request.msgctxt.as_deref(),
                    request.msgstr,
                )?;
                let report = self.editor.save(&request.file_path)?;
                Ok(json!({ "success": true, "save": report }))
            }
            "batch_update_translations" => {
                let args: BatchArgs = parse_args(args)?;
                let report = self.editor.update_translations(args.updates);
                Ok(json!({
                    "succeeded": report.succeeded(),
                    "failed": report.failed(),
                    "results": report.results,
                    "saves": report.saves,
                }))
            }
            "save_catalog" => {
                let args: FilePathArgs = parse_args(args)?;
                let report = self.editor.save(&args.file_path)?;
                Ok(serde_json::to_value(report)?)
            }
            other => Err(CatalogError::InvalidArguments(format!(
                "unknown tool '{}', expected one of: {}",
                other,
                TOOL_NAMES.join(", ")
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use tempfile::TempDir;

    const FR_PO: &str = "msgid \"\"\n\
msgstr \"\"\n\
\"Language: fr\\n\"\n\
\n\
#: src/main.c:1\n\
msgid \"Hello World\"\n\
msgstr \"\"\n\
\n\
msgctxt \"menu\"\n\
msgid \"Open\"\n\
msgstr \"Ouvrir\"\n\
\n\
#, fuzzy\n\
msgid \"Goodbye\"\n\
msgstr \"Au revoir\"\n";

    fn create_test_service() -> (CatalogService, TempDir, String) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("fr.po");
        std::fs::write(&path, FR_PO).unwrap();

        let mut config = EngineConfig::default();
        config.search_limit = Some(10);
        let service = CatalogService::new(CatalogEditor::new(config));
        (service, temp_dir, path.to_string_lossy().into_owned())
    }

    #[test]
    fn test_load_and_list() {
        let (mut service, _dir, path) = create_test_service();

        let loaded = service.call("load_catalog", json!({ "filePath": path })).unwrap();
        assert_eq!(loaded["catalog"]["entryCount"], 3);
        assert_eq!(loaded["stats"]["fuzzy"], 1);

        let listed = service.call("list_catalogs", Value::Null).unwrap();
        assert_eq!(listed["count"], 1);
    }

    #[test]
    fn test_search_entries() {
        let (mut service, _dir, path) = create_test_service();
        service.call("load_catalog", json!({ "filePath": path })).unwrap();

        let found = service
            .call("search_entries", json!({ "query": "hello", "target": "source" }))
            .unwrap();
        assert_eq!(found["count"], 1);
        assert_eq!(found["results"][0]["entry"]["id"], "Hello World");

        let failure = service
            .call("search_entries", json!({ "query": "[", "isRegex": true }))
            .unwrap_err();
        assert_eq!(failure.kind, "InvalidPattern");
    }

    #[test]
    fn test_update_translation_persists() {
        let (mut service, _dir, path) = create_test_service();
        service.call("load_catalog", json!({ "filePath": path })).unwrap();

        let result = service
            .call(
                "update_translation",
                json!({ "filePath": path, "msgid": "Hello World", "msgstr": "Bonjour le monde" }),
            )
            .unwrap();
        assert_eq!(result["success"], true);
        assert_eq!(result["save"]["patchedEntries"], 1);

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            FR_PO.replacen(
                "msgid \"Hello World\"\nmsgstr \"\"",
                "msgid \"Hello World\"\nmsgstr \"Bonjour le monde\"",
                1
            )
        );
    }

    #[test]
    fn test_update_with_wrong_context_fails() {
        let (mut service, _dir, path) = create_test_service();
        service.call("load_catalog", json!({ "filePath": path })).unwrap();

        let failure = service
            .call(
                "update_translation",
                json!({ "filePath": path, "msgid": "Open", "msgstr": "Ouvrir" }),
            )
            .unwrap_err();
        assert_eq!(failure.kind, "TranslationNotFound");
        assert!(failure.message.contains("Open"));
    }

    #[test]
    fn test_batch_update() {
        let (mut service, _dir, path) = create_test_service();
        service.call("load_catalog", json!({ "filePath": path })).unwrap();

        let result = service
            .call(
                "batch_update_translations",
                json!({ "updates": [
                    { "filePath": path, "msgid": "Goodbye", "msgstr": "Salut" },
                    { "filePath": path, "msgid": "Open", "msgctxt": "menu", "msgstr": "Ouvrir…" },
                    { "filePath": path, "msgid": "Nope", "msgstr": "x" }
                ]}),
            )
            .unwrap();
        assert_eq!(result["succeeded"], 2);
        assert_eq!(result["failed"], 1);

        let stats = service.call("get_stats", json!({ "filePath": path })).unwrap();
        assert_eq!(stats["fuzzy"], 0);
        assert_eq!(stats["translated"], 2);
    }

    #[test]
    fn test_error_kinds() {
        let (mut service, _dir, _path) = create_test_service();

        assert_eq!(service.call("get_stats", json!({})).unwrap_err().kind, "NoCatalogsLoaded");
        assert_eq!(
            service
                .call("load_catalog", json!({ "filePath": "/nonexistent/xx.po" }))
                .unwrap_err()
                .kind,
            "NotFound"
        );
        assert_eq!(
            service
                .call("save_catalog", json!({ "filePath": "/nonexistent/xx.po" }))
                .unwrap_err()
                .kind,
            "NotLoaded"
        );
        assert_eq!(service.call("load_catalog", json!({})).unwrap_err().kind, "InvalidArguments");
        assert_eq!(service.call("compile_mo", json!({})).unwrap_err().kind, "InvalidArguments");
    }
}
