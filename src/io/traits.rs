/// IO 抽象层 - trait 定义
///
/// 该模块定义了目录文件读写的抽象接口，支持依赖注入和测试 mock。
/// 只负责字节的搬运，不负责解析或编码转换。

use std::path::Path;

use chrono::{DateTime, Local};

/// 目录文件原始数据
#[derive(Debug, Clone)]
pub struct RawCatalogData {
    /// 文件的原始字节数据
    pub bytes: Vec<u8>,
    /// 文件修改时间（无法获取时为读取时刻）
    pub modified: DateTime<Local>,
}

/// 目录文件读取 trait
///
/// # 职责
/// - 从存储读取 PO 文件的原始字节数据
/// - 不负责解析，仅负责 IO
pub trait CatalogReader {
    /// 读取目录文件的原始数据
    fn read(&self, path: &Path) -> std::io::Result<RawCatalogData>;
}

/// 目录文件写入 trait
///
/// # 职责
/// - 将序列化后的字节写入存储
/// - 不负责序列化，仅负责 IO
pub trait CatalogWriter {
    /// 写入目录文件数据
    fn write(&self, bytes: &[u8], path: &Path) -> std::io::Result<()>;
}
