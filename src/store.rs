use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::catalog::{Catalog, CatalogStats};
use crate::io::{CatalogReader, DefaultCatalogReader};
use crate::utils::{canonical_path, CatalogError};

/// 目录集合管理器
///
/// 独占持有所有已加载的 Catalog，键为规范化后的绝对路径，
/// 因此相对路径、`..`、符号链接等写法都指向同一条记录。
#[derive(Debug, Default)]
pub struct CatalogStore {
    catalogs: HashMap<PathBuf, Catalog>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 加载目录文件，替换同一路径上已有的目录
    pub fn load(&mut self, path: &Path) -> Result<&Catalog, CatalogError> {
        self.load_with_reader(path, &DefaultCatalogReader)
    }

    /// 使用自定义 Reader 加载目录文件
    ///
    /// 失败时不会注册任何（部分）目录，原有同路径目录保持不变。
    pub fn load_with_reader(
        &mut self,
        path: &Path,
        reader: &dyn CatalogReader,
    ) -> Result<&Catalog, CatalogError> {
        let key = canonical_path(path);

        let raw = reader.read(&key).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => CatalogError::NotFound { path: key.clone() },
            _ => CatalogError::ParseError {
                path: key.clone(),
                line: 0,
                reason: format!("unreadable: {}", e),
            },
        })?;

        let catalog = Catalog::from_bytes(key.clone(), &raw.bytes, raw.modified)?;
        info!(
            path = %key.display(),
            entries = catalog.entries.len(),
            encoding = catalog.encoding().name(),
            "已加载目录"
        );

        if self.catalogs.insert(key.clone(), catalog).is_some() {
            debug!(path = %key.display(), "替换了已加载的目录");
        }

        self.get(&key)
    }

    /// 获取已加载的目录
    pub fn get(&self, path: &Path) -> Result<&Catalog, CatalogError> {
        let key = canonical_path(path);
        self.catalogs
            .get(&key)
            .ok_or(CatalogError::NotLoaded { path: key })
    }

    /// 获取已加载的目录（可变引用）
    pub fn get_mut(&mut self, path: &Path) -> Result<&mut Catalog, CatalogError> {
        let key = canonical_path(path);
        match self.catalogs.get_mut(&key) {
            Some(catalog) => Ok(catalog),
            None => Err(CatalogError::NotLoaded { path: key }),
        }
    }

    pub fn is_loaded(&self, path: &Path) -> bool {
        self.catalogs.contains_key(&canonical_path(path))
    }

    /// 所有已加载目录的路径（按路径排序）
    pub fn loaded_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.catalogs.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// 按路径顺序遍历所有目录
    pub fn catalogs(&self) -> impl Iterator<Item = &Catalog> {
        let mut catalogs: Vec<&Catalog> = self.catalogs.values().collect();
        catalogs.sort_by(|a, b| a.path.cmp(&b.path));
        catalogs.into_iter()
    }

    pub fn len(&self) -> usize {
        self.catalogs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalogs.is_empty()
    }

    /// 统计单个目录，或在 `path` 为 `None` 时统计所有目录
    pub fn stats(&self, path: Option<&Path>) -> Result<CatalogStats, CatalogError> {
        match path {
            Some(path) => Ok(self.get(path)?.stats()),
            None => {
                if self.is_empty() {
                    return Err(CatalogError::NoCatalogsLoaded);
                }
                let mut total = CatalogStats::default();
                for catalog in self.catalogs.values() {
                    total.merge(&catalog.stats());
                }
                Ok(total)
            }
        }
    }

    /// 直接注册一个已构建好的目录（键取自 `catalog.path` 的规范化形式）
    pub fn insert(&mut self, mut catalog: Catalog) {
        catalog.path = canonical_path(&catalog.path);
        self.catalogs.insert(catalog.path.clone(), catalog);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_po(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_and_lookup_with_path_variants() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join("nested")).unwrap();
        let path = write_po(temp_dir.path(), "fr.po", "msgid \"a\"\nmsgstr \"b\"\n");

        let mut store = CatalogStore::new();
        store.load(&path).unwrap();

        let variant = temp_dir.path().join("nested").join("..").join("fr.po");
        assert!(store.is_loaded(&variant));
        store.load(&variant).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&variant).unwrap().entries.len(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let mut store = CatalogStore::new();
        let result = store.load(Path::new("/nonexistent/fr.po"));
        assert!(matches!(result, Err(CatalogError::NotFound { .. })));
        assert!(store.is_empty());
    }

    #[test]
    fn test_failed_reload_keeps_previous_catalog() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_po(temp_dir.path(), "de.po", "msgid \"a\"\nmsgstr \"b\"\n");

        let mut store = CatalogStore::new();
        store.load(&path).unwrap();

        std::fs::write(&path, "msgid \"a\"\nthis is not po\n").unwrap();
        let result = store.load(&path);
        assert!(matches!(result, Err(CatalogError::ParseError { .. })));
        assert_eq!(store.get(&path).unwrap().entries[0].translation.primary(), "b");
    }

    #[test]
    fn test_get_not_loaded() {
        let store = CatalogStore::new();
        assert!(matches!(
            store.get(Path::new("/tmp/none.po")),
            Err(CatalogError::NotLoaded { .. })
        ));
    }

    #[test]
    fn test_stats_scopes() {
        let temp_dir = TempDir::new().unwrap();
        let fr = write_po(temp_dir.path(), "fr.po", "msgid \"a\"\nmsgstr \"b\"\n");
        let de = write_po(
            temp_dir.path(),
            "de.po",
            "msgid \"a\"\nmsgstr \"\"\n\n#~ msgid \"old\"\n#~ msgstr \"alt\"\n",
        );

        let mut store = CatalogStore::new();
        assert!(matches!(store.stats(None), Err(CatalogError::NoCatalogsLoaded)));

        store.load(&fr).unwrap();
        store.load(&de).unwrap();

        let all = store.stats(None).unwrap();
        assert_eq!(all.total, 3);
        assert_eq!(all.translated, 1);
        assert_eq!(all.untranslated, 1);
        assert_eq!(all.obsolete, 1);

        let only_de = store.stats(Some(&de)).unwrap();
        assert_eq!(only_de.total, 2);

        assert!(matches!(
            store.stats(Some(&temp_dir.path().join("xx.po"))),
            Err(CatalogError::NotLoaded { .. })
        ));
    }

    #[test]
    fn test_loaded_paths_sorted() {
        let temp_dir = TempDir::new().unwrap();
        let b = write_po(temp_dir.path(), "b.po", "");
        let a = write_po(temp_dir.path(), "a.po", "");

        let mut store = CatalogStore::new();
        store.load(&b).unwrap();
        store.load(&a).unwrap();

        let paths = store.loaded_paths();
        assert_eq!(paths, vec![canonical_path(&a), canonical_path(&b)]);
    }
}
