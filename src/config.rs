//! 引擎配置
//!
//! 从 JSON 文件加载，所有字段都有默认值，未知字段视为错误。

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::utils::CatalogError;

/// 默认的后处理程序
pub const DEFAULT_POST_SAVE_PROGRAM: &str = "msgmerge";

/// 引擎配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// 覆盖文件前先创建带时间戳的 `.bak` 备份
    pub backup_before_save: bool,
    /// 保存后的外部格式化步骤
    pub post_save: PostSaveConfig,
    /// 搜索请求未给出 limit 时使用的默认上限
    pub search_limit: Option<usize>,
}

/// 保存后处理配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PostSaveConfig {
    pub enabled: bool,
    pub program: String,
    /// 参考模板（.pot）；未设置时查找同目录下的 .pot 文件
    pub template: Option<PathBuf>,
}

impl Default for PostSaveConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            program: DEFAULT_POST_SAVE_PROGRAM.to_string(),
            template: None,
        }
    }
}

impl EngineConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CatalogError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, CatalogError> {
        serde_json::from_str(content).map_err(|e| CatalogError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_object() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.post_save.program, "msgmerge");
        assert!(!config.backup_before_save);
    }

    #[test]
    fn test_partial_config() {
        let config = EngineConfig::from_json(
            r#"{"backup_before_save": true, "post_save": {"enabled": true, "template": "po/app.pot"}, "search_limit": 20}"#,
        )
        .unwrap();

        assert!(config.backup_before_save);
        assert!(config.post_save.enabled);
        assert_eq!(config.post_save.program, "msgmerge");
        assert_eq!(config.post_save.template, Some(PathBuf::from("po/app.pot")));
        assert_eq!(config.search_limit, Some(20));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = EngineConfig::from_json(r#"{"backup": true}"#);
        assert!(matches!(result, Err(CatalogError::Config(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = EngineConfig::from_file(Path::new("/nonexistent/po_catalog.json"));
        assert!(matches!(result, Err(CatalogError::Config(_))));
    }
}
