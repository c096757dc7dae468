/// PO 文件 IO 实现
///
/// 提供基于文件系统的默认目录文件读写实现
use std::path::Path;

use chrono::{DateTime, Local};

use super::traits::{CatalogReader, CatalogWriter, RawCatalogData};

/// 默认的目录文件读取器（基于 std::fs）
#[derive(Debug, Clone, Default)]
pub struct DefaultCatalogReader;

impl CatalogReader for DefaultCatalogReader {
    fn read(&self, path: &Path) -> std::io::Result<RawCatalogData> {
        let bytes = std::fs::read(path)?;
        let modified = std::fs::metadata(path)
            .and_then(|meta| meta.modified())
            .map(DateTime::<Local>::from)
            .unwrap_or_else(|_| Local::now());
        Ok(RawCatalogData { bytes, modified })
    }
}

/// 默认的目录文件写入器（基于 std::fs）
#[derive(Debug, Clone, Default)]
pub struct DefaultCatalogWriter;

impl CatalogWriter for DefaultCatalogWriter {
    fn write(&self, bytes: &[u8], path: &Path) -> std::io::Result<()> {
        // 确保父目录存在
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_catalog_reader() {
        let temp_dir = TempDir::new().unwrap();
        let test_file = temp_dir.path().join("fr.po");

        let test_data = b"msgid \"a\"\nmsgstr \"b\"\n";
        std::fs::write(&test_file, test_data).unwrap();

        let reader = DefaultCatalogReader;
        let result = reader.read(&test_file).unwrap();

        assert_eq!(result.bytes, test_data);
    }

    #[test]
    fn test_reader_missing_file() {
        let reader = DefaultCatalogReader;
        let err = reader.read(Path::new("/nonexistent/fr.po")).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn test_writer_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let test_file = temp_dir.path().join("locale").join("fr").join("messages.po");

        let writer = DefaultCatalogWriter;
        writer.write(b"msgid \"\"\nmsgstr \"\"\n", &test_file).unwrap();

        assert_eq!(
            std::fs::read(&test_file).unwrap(),
            b"msgid \"\"\nmsgstr \"\"\n"
        );
    }
}
