//! 云帆开发者平台核心库（本地账户状态）。
//!
//! 功能：
//! - 提供基础文件系统访问（用户主目录解析、全量 UTF-8 文本读取）
//! - 定义本地状态文件的路径约定（`~/.yunfan/yunfan.json`）
//! - 定义账户状态文档模型与 [`state::AccountState`] 存取接口
//!   （当前组织、邮箱、用户令牌、各服务凭证令牌）
//!
//! 作者：云帆开发者平台项目组（自动生成）
//! 创建时间：2026-08-24
//! 修改时间：2026-08-24

pub mod fs;
pub mod paths;
pub mod state;
