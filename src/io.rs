/// IO 抽象层模块
///
/// 该模块提供了目录文件读写的抽象接口，遵循依赖倒置原则。
/// 支持依赖注入、测试 mock 和替换 IO 实现（如内存 IO）。
///
/// # 架构设计
///
/// - **traits**: 定义 Reader/Writer trait 接口
/// - **po_io**: 基于文件系统的默认实现
///
/// # 使用示例
///
/// ```rust,ignore
/// use po_catalog::io::{CatalogReader, DefaultCatalogReader};
///
/// let reader = DefaultCatalogReader;
/// let data = reader.read(Path::new("fr.po"))?;
/// ```
pub mod traits;
pub mod po_io;

// === 导出 trait 定义 ===
pub use traits::{CatalogReader, CatalogWriter, RawCatalogData};

// === 导出默认实现 ===
pub use po_io::{DefaultCatalogReader, DefaultCatalogWriter};
