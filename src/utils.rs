use thiserror::Error;
use std::path::{Component, Path, PathBuf};

use crate::io::{CatalogReader, CatalogWriter};

/// 自定义错误类型
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("File not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("Catalog not loaded: {}", .path.display())]
    NotLoaded { path: PathBuf },

    #[error("Failed to parse {} at line {line}: {reason}", .path.display())]
    ParseError {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Invalid search pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Translation not found in {}: msgid \"{msgid}\"{}", .path.display(), describe_context(.msgctxt))]
    TranslationNotFound {
        path: PathBuf,
        msgid: String,
        msgctxt: Option<String>,
    },

    #[error("Failed to persist {}: {reason}", .path.display())]
    PersistenceError { path: PathBuf, reason: String },

    #[error("No catalogs loaded")]
    NoCatalogsLoaded,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn describe_context(msgctxt: &Option<String>) -> String {
    match msgctxt {
        Some(ctx) => format!(" (msgctxt \"{}\")", ctx),
        None => String::new(),
    }
}

impl CatalogError {
    /// 错误分类名称（工具调用边界返回给调用方）
    pub fn kind(&self) -> &'static str {
        match self {
            CatalogError::NotFound { .. } => "NotFound",
            CatalogError::NotLoaded { .. } => "NotLoaded",
            CatalogError::ParseError { .. } => "ParseError",
            CatalogError::InvalidPattern { .. } => "InvalidPattern",
            CatalogError::TranslationNotFound { .. } => "TranslationNotFound",
            CatalogError::PersistenceError { .. } => "PersistenceError",
            CatalogError::NoCatalogsLoaded => "NoCatalogsLoaded",
            CatalogError::Config(_) => "ConfigError",
            CatalogError::InvalidArguments(_) | CatalogError::Json(_) => "InvalidArguments",
        }
    }

    pub(crate) fn persistence(path: &Path, reason: impl ToString) -> Self {
        CatalogError::PersistenceError {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

/// 规范化路径
///
/// 文件存在时解析为真实路径（处理 `..` 与符号链接）；
/// 不存在时退化为基于当前目录的绝对路径并按词法折叠 `.`/`..`。
/// 保证同一文件的不同写法得到同一个 Store 键。
pub fn canonical_path(path: &Path) -> PathBuf {
    if let Ok(resolved) = std::fs::canonicalize(path) {
        return resolved;
    }

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// 创建文件备份
///
/// 备份与原文件同目录，命名为 `<文件名>.<时间戳>.bak`，读写都经过注入的 IO。
pub fn create_backup(
    file_path: &Path,
    reader: &dyn CatalogReader,
    writer: &dyn CatalogWriter,
) -> Result<PathBuf, CatalogError> {
    let raw = reader.read(file_path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => CatalogError::NotFound {
            path: file_path.to_path_buf(),
        },
        _ => CatalogError::persistence(file_path, format!("backup read failed: {}", e)),
    })?;

    let timestamp = chrono::Local::now().format("%Y-%m-%d-%H-%M-%S");
    let mut file_name = file_path.file_name().unwrap_or_default().to_os_string();
    file_name.push(format!(".{}.bak", timestamp));
    let backup_path = file_path.with_file_name(file_name);

    writer
        .write(&raw.bytes, &backup_path)
        .map_err(|e| CatalogError::persistence(file_path, format!("backup failed: {}", e)))?;

    Ok(backup_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{DefaultCatalogReader, DefaultCatalogWriter};
    use tempfile::TempDir;

    #[test]
    fn test_canonical_path_collapses_dot_segments() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("fr.po");
        std::fs::write(&file, "").unwrap();

        let variant = temp_dir.path().join("sub").join("..").join(".").join("fr.po");
        std::fs::create_dir(temp_dir.path().join("sub")).unwrap();

        assert_eq!(canonical_path(&file), canonical_path(&variant));
    }

    #[test]
    fn test_canonical_path_missing_file_is_absolute() {
        let path = canonical_path(Path::new("does/not/../exist.po"));
        assert!(path.is_absolute());
        assert!(path.ends_with("does/exist.po"));
    }

    #[test]
    fn test_create_backup() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("de.po");
        std::fs::write(&file, "msgid \"a\"\nmsgstr \"b\"\n").unwrap();

        let backup = create_backup(&file, &DefaultCatalogReader, &DefaultCatalogWriter).unwrap();
        assert!(backup.exists());
        let name = backup.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("de.po.") && name.ends_with(".bak"));
        assert_eq!(
            std::fs::read_to_string(&backup).unwrap(),
            std::fs::read_to_string(&file).unwrap()
        );
    }

    #[test]
    fn test_create_backup_missing_file() {
        let result = create_backup(
            Path::new("/nonexistent/zz.po"),
            &DefaultCatalogReader,
            &DefaultCatalogWriter,
        );
        assert!(matches!(result, Err(CatalogError::NotFound { .. })));
    }

    #[test]
    fn test_error_messages_name_the_key() {
        let err = CatalogError::TranslationNotFound {
            path: PathBuf::from("/tmp/fr.po"),
            msgid: "Open".to_string(),
            msgctxt: Some("menu".to_string()),
        };
        let message = err.to_string();
        assert!(message.contains("\"Open\""));
        assert!(message.contains("msgctxt \"menu\""));
        assert_eq!(err.kind(), "TranslationNotFound");
    }
}
