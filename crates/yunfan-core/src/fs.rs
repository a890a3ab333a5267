//! 文件系统基础访问（主目录解析与全量文本读取）。
//!
//! 目的：
//! - 将裸文件系统访问收敛到一处，上层模块不直接 open/read
//! - 失败以 [`FsError`] 类型化返回，调用方可按失败种类分别处理
//!   （不存在 / 编码错误 / 其他 IO 错误 / 环境配置缺失）
//!
//! 作者：云帆开发者平台项目组（自动生成）
//! 创建时间：2026-08-24
//! 修改时间：2026-08-24

use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// 文件系统访问错误类型。
///
/// 用途：
/// - 上层（状态加载、命令行工具）依赖变体区分“文件不存在”与其他失败，
///   例如首次使用时状态文件不存在属于正常情况。
#[derive(Debug, Error)]
pub enum FsError {
    #[error("文件不存在: {path}")]
    NotFound { path: PathBuf },
    #[error("文件不是合法 UTF-8 文本: {path}")]
    Encoding { path: PathBuf },
    #[error("读取文件失败: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 运行环境缺少必要配置（例如无法确定用户主目录）。
    #[error("环境配置缺失: {0}")]
    Configuration(String),
}

/// 获取当前用户主目录。
///
/// 返回值：
/// - 成功：环境变量 `HOME`（Windows 下回退 `USERPROFILE`）指向的目录
///
/// 异常处理：
/// - 两个环境变量均不存在或为空时，返回 [`FsError::Configuration`]。
pub fn user_home_dir() -> Result<PathBuf, FsError> {
    for key in ["HOME", "USERPROFILE"] {
        if let Ok(value) = std::env::var(key) {
            if !value.trim().is_empty() {
                return Ok(PathBuf::from(value));
            }
        }
    }
    Err(FsError::Configuration(
        "无法确定用户主目录（HOME / USERPROFILE 均不可用）".to_string(),
    ))
}

/// 将文件完整读取为 UTF-8 文本。
///
/// 参数：
/// - `path`：目标文件路径
///
/// 返回值：
/// - 成功：文件全部内容（UTF-8 解码后的文本）
///
/// 异常处理：
/// - 路径不存在：[`FsError::NotFound`]
/// - 内容不是合法 UTF-8：[`FsError::Encoding`]
/// - 其他读取失败（权限、设备错误等）：[`FsError::Io`]
///
/// 说明：
/// - 文件句柄作用域限定在本次调用内，任何返回路径（含错误）都会关闭句柄
/// - `read_to_end` 内部循环读取直至 EOF，单次 read 返回不足不会截断内容
pub fn file_contents(path: &Path) -> Result<String, FsError> {
    let mut file = std::fs::File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            FsError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            FsError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;

    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| FsError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    String::from_utf8(bytes).map_err(|_| FsError::Encoding {
        path: path.to_path_buf(),
    })
}
