//! 统一路径与目录约定（用户主目录下的点目录）。
//!
//! 目标：
//! - 将状态文件落盘路径集中管理，避免散落在各模块中
//! - 命令行工具与各端共用同一份约定，便于排障
//!
//! 作者：云帆开发者平台项目组（自动生成）
//! 创建时间：2026-08-24
//! 修改时间：2026-08-24

use std::path::{Path, PathBuf};

use crate::fs::{self, FsError};

/// 用户主目录下的状态目录名。
///
/// 示例（默认）：
/// - `~/.yunfan`
pub const STATE_DIR_NAME: &str = ".yunfan";

/// 状态文件名。
pub const STATE_FILE_NAME: &str = "yunfan.json";

/// 默认状态目录。
///
/// 返回值：
/// - `~/.yunfan`
///
/// 异常处理：
/// - 主目录不可确定时返回错误（见 [`fs::user_home_dir`]）。
pub fn default_state_dir() -> Result<PathBuf, FsError> {
    Ok(fs::user_home_dir()?.join(STATE_DIR_NAME))
}

/// 默认状态文件路径。
///
/// 返回值：
/// - `~/.yunfan/yunfan.json`
pub fn default_state_file() -> Result<PathBuf, FsError> {
    Ok(default_state_dir()?.join(STATE_FILE_NAME))
}

/// 确保目录存在（不存在则递归创建）。
///
/// 异常处理：
/// - 目录创建失败（权限、路径非法等）返回 [`FsError::Io`]。
pub fn ensure_dir(path: &Path) -> Result<(), FsError> {
    std::fs::create_dir_all(path).map_err(|e| FsError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}
