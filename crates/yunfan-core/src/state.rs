//! 本地账户状态（yunfan.json）的加载、查询与落盘。
//!
//! 文档结构（JSON）：
//! - 顶层 `orgID` 指向当前组织
//! - `orgs` 以组织 ID 为键，每个组织下有 `email`、`user_token` 与
//!   `service_tokens`（服务名 → 凭证令牌）
//! - 未识别的键通过 `flatten` 原样保留，保证向前兼容
//!
//! 生命周期：
//! - [`AccountState`] 构造后为“未加载”状态，查询接口此时返回
//!   [`StateError::NotLoaded`]；`load` 成功后整体替换文档，再次调用会重新
//!   读盘（不做缓存）；加载失败会清空已有文档，避免读到过期数据
//!
//! 作者：云帆开发者平台项目组（自动生成）
//! 创建时间：2026-08-24
//! 修改时间：2026-08-24

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::fs::{self, FsError};
use crate::paths;

/// 状态存取错误类型。
///
/// 用途：
/// - 所有失败都返回给直接调用方，不走全局通道，也不自动重试；
///   调用方可按变体决定重新登录、回退默认值或直接报错退出。
#[derive(Debug, Error)]
pub enum StateError {
    /// 尚未成功加载任何状态文档。
    #[error("状态文件尚未加载")]
    NotLoaded,
    /// 加载后的文档缺少约定字段。
    #[error("状态文档缺少字段: {0}")]
    MissingField(String),
    /// 当前组织下没有该服务的凭证令牌。
    #[error("当前组织下没有服务: {0}")]
    UnknownService(String),
    /// 状态文件内容不是合法 JSON（或结构不符）。
    #[error("解析状态文件失败: {path}: 第 {line} 行第 {column} 列: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },
    /// 写入状态文件失败。
    #[error("写入状态文件失败: {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 删除状态文件失败。
    #[error("删除状态文件失败: {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 底层文件系统/环境错误（不存在、编码、IO、主目录缺失）。
    #[error(transparent)]
    Fs(#[from] FsError),
}

/// 账户状态文档根对象（对应 `yunfan.json`）。
///
/// 说明：
/// - `org_id` 序列化为 `orgID`（与既有状态文件的键名保持一致）
/// - `orgs` 使用 `BTreeMap`，序列化时键有序，落盘结果可复现
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateDocument {
    #[serde(rename = "orgID", default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub orgs: BTreeMap<String, OrgRecord>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// 单个组织下的账户记录。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrgRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// 账户邮箱。
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// 用户级令牌（登录流程写入，此处只存储不解释）。
    pub user_token: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    /// 服务名 → 服务凭证令牌。
    pub service_tokens: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// 本地账户状态存取器。
///
/// 字段说明：
/// - `state_path`：绑定的状态文件路径（构造时确定，之后不变）
/// - `document`：最近一次成功加载/写入的文档；`None` 表示未加载
/// - `dirty`：内存文档是否有未落盘修改
///
/// 并发约定：
/// - 同步阻塞 IO，内部不加锁；跨线程使用时由调用方自行串行化。
#[derive(Debug)]
pub struct AccountState {
    state_path: PathBuf,
    document: Option<StateDocument>,
    dirty: bool,
}

impl AccountState {
    /// 创建绑定默认路径（`~/.yunfan/yunfan.json`）的空存取器。
    ///
    /// 异常处理：
    /// - 主目录不可确定时返回 [`FsError::Configuration`]（经 [`StateError::Fs`]）。
    pub fn new() -> Result<Self, StateError> {
        Ok(Self::with_path(paths::default_state_file()?))
    }

    /// 创建绑定指定路径的空存取器（测试与路径覆盖场景）。
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            state_path: path.into(),
            document: None,
            dirty: false,
        }
    }

    /// 绑定的状态文件路径。
    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    /// 是否已成功加载文档。
    pub fn is_loaded(&self) -> bool {
        self.document.is_some()
    }

    /// 内存文档是否有未落盘修改。
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// 从绑定路径读取并解析状态文档（整体替换）。
    ///
    /// 异常处理：
    /// - 读取失败（不存在/编码/IO）：[`StateError::Fs`]
    /// - JSON 解析失败：[`StateError::Parse`]（带行列位置）
    /// - 任何失败都会先清空已有文档，之后查询接口返回 [`StateError::NotLoaded`]
    pub fn load(&mut self) -> Result<(), StateError> {
        self.document = None;
        self.dirty = false;

        let text = fs::file_contents(&self.state_path)?;
        let document: StateDocument =
            serde_json::from_str(&text).map_err(|e| StateError::Parse {
                path: self.state_path.clone(),
                line: e.line(),
                column: e.column(),
                message: e.to_string(),
            })?;

        self.document = Some(document);
        Ok(())
    }

    /// 同 [`AccountState::load`]，但“文件不存在”视为空文档（首次使用场景）。
    ///
    /// 异常处理：
    /// - 仅 [`FsError::NotFound`] 被吸收为一份空文档；其余失败照常返回。
    pub fn load_or_default(&mut self) -> Result<(), StateError> {
        match self.load() {
            Err(StateError::Fs(FsError::NotFound { .. })) => {
                debug!("状态文件不存在，使用空文档: {}", self.state_path.display());
                self.document = Some(StateDocument::default());
                self.dirty = false;
                Ok(())
            }
            other => other,
        }
    }

    fn document(&self) -> Result<&StateDocument, StateError> {
        self.document.as_ref().ok_or(StateError::NotLoaded)
    }

    /// 当前组织 ID（顶层 `orgID`）。
    ///
    /// 异常处理：
    /// - 未加载：[`StateError::NotLoaded`]
    /// - 已加载但缺少 `orgID`：[`StateError::MissingField`]
    pub fn current_org_id(&self) -> Result<&str, StateError> {
        self.document()?
            .org_id
            .as_deref()
            .ok_or_else(|| StateError::MissingField("orgID".to_string()))
    }

    /// 当前组织的账户记录（`orgs[orgID]`）。
    ///
    /// 异常处理：
    /// - 缺少 `orgID` / `orgs` / 对应条目时，分别返回带字段路径的
    ///   [`StateError::MissingField`]。
    pub fn current_org(&self) -> Result<&OrgRecord, StateError> {
        let document = self.document()?;
        let org_id = document
            .org_id
            .as_deref()
            .ok_or_else(|| StateError::MissingField("orgID".to_string()))?;
        if document.orgs.is_empty() {
            return Err(StateError::MissingField("orgs".to_string()));
        }
        document
            .orgs
            .get(org_id)
            .ok_or_else(|| StateError::MissingField(format!("orgs.{org_id}")))
    }

    /// 当前组织的账户邮箱。
    pub fn current_email(&self) -> Result<&str, StateError> {
        self.current_org()?
            .email
            .as_deref()
            .ok_or_else(|| StateError::MissingField("email".to_string()))
    }

    /// 当前组织的用户级令牌。
    pub fn current_user_token(&self) -> Result<&str, StateError> {
        self.current_org()?
            .user_token
            .as_deref()
            .ok_or_else(|| StateError::MissingField("user_token".to_string()))
    }

    /// 当前组织下指定服务的凭证令牌。
    ///
    /// 异常处理：
    /// - 服务不存在：[`StateError::UnknownService`]
    pub fn current_service_token(&self, service: &str) -> Result<&str, StateError> {
        self.current_org()?
            .service_tokens
            .get(service)
            .map(String::as_str)
            .ok_or_else(|| StateError::UnknownService(service.to_string()))
    }

    /// 当前组织下全部服务名（有序）。
    pub fn current_services(&self) -> Result<Vec<&str>, StateError> {
        Ok(self
            .current_org()?
            .service_tokens
            .keys()
            .map(String::as_str)
            .collect())
    }

    /// 写入/替换一个组织记录，并将其设为当前组织。
    ///
    /// 说明：
    /// - 文档不存在时会先建一份空文档（登录流程首次写入场景）
    /// - 仅修改内存文档并置脏标记，落盘需显式调用 [`AccountState::save`]
    pub fn set_current_org(&mut self, org_id: impl Into<String>, record: OrgRecord) {
        let document = self.document.get_or_insert_with(StateDocument::default);
        let org_id = org_id.into();
        document.orgs.insert(org_id.clone(), record);
        document.org_id = Some(org_id);
        self.dirty = true;
    }

    /// 在当前组织下写入/替换一个服务凭证令牌。
    ///
    /// 异常处理：
    /// - 文档没有 `orgID` 时返回 [`StateError::MissingField`]（令牌必须挂在
    ///   某个组织下，不允许悬空写入）。
    pub fn set_service_token(
        &mut self,
        service: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<(), StateError> {
        let document = self.document.get_or_insert_with(StateDocument::default);
        let org_id = document
            .org_id
            .clone()
            .ok_or_else(|| StateError::MissingField("orgID".to_string()))?;
        let org = document.orgs.entry(org_id).or_default();
        org.service_tokens.insert(service.into(), token.into());
        self.dirty = true;
        Ok(())
    }

    /// 当前文档的规范 JSON 文本（键有序、4 空格缩进）。
    ///
    /// 异常处理：
    /// - 未加载：[`StateError::NotLoaded`]
    pub fn to_json(&self) -> Result<String, StateError> {
        Ok(pretty_json(self.document()?))
    }

    /// 将内存文档落盘（必要时先创建状态目录），成功后清除脏标记。
    ///
    /// 异常处理：
    /// - 未加载（也未写入过任何内容）：[`StateError::NotLoaded`]
    /// - 目录创建失败：[`StateError::Fs`]
    /// - 文件写入失败：[`StateError::Write`]
    pub fn save(&mut self) -> Result<(), StateError> {
        let text = pretty_json(self.document()?);
        if let Some(dir) = self.state_path.parent() {
            paths::ensure_dir(dir)?;
        }
        std::fs::write(&self.state_path, text).map_err(|e| StateError::Write {
            path: self.state_path.clone(),
            source: e,
        })?;
        self.dirty = false;
        debug!("状态已落盘: {}", self.state_path.display());
        Ok(())
    }

    /// 删除状态文件并清空内存文档（慎用）。
    ///
    /// 说明：
    /// - 文件本就不存在不算失败
    /// - 之后查询接口返回 [`StateError::NotLoaded`]，直到下一次成功加载
    pub fn smite(&mut self) -> Result<(), StateError> {
        match std::fs::remove_file(&self.state_path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(StateError::Remove {
                    path: self.state_path.clone(),
                    source: e,
                })
            }
        }
        self.document = None;
        self.dirty = true;
        Ok(())
    }
}

/// 以键有序、4 空格缩进的形式序列化文档。
///
/// 说明：
/// - 键序由 `BTreeMap` 保证，此处只控制缩进；落盘结果逐字节可复现，
///   round-trip 测试与人工 diff 都依赖这一点
/// - 文档模型序列化为 JSON 不会失败（无非字符串键、无不可序列化类型），
///   因此断言而非传播（同 `serde_json::to_string` 的内部约定）
fn pretty_json(document: &StateDocument) -> String {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    document.serialize(&mut ser).expect("document serialize");
    String::from_utf8(buf).expect("json is utf-8")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// 验证嵌套文档结构的 JSON 反序列化是否正确。
    fn state_document_serde_nested() {
        let json = r#"
        {
            "orgID": "org-42",
            "orgs": {
                "org-42": {
                    "email": "a@b.com",
                    "user_token": "ut-1",
                    "service_tokens": { "animated": "tok-123" }
                }
            }
        }"#;
        let document: StateDocument = serde_json::from_str(json).unwrap();
        assert_eq!(document.org_id.as_deref(), Some("org-42"));
        let org = document.orgs.get("org-42").unwrap();
        assert_eq!(org.email.as_deref(), Some("a@b.com"));
        assert_eq!(org.user_token.as_deref(), Some("ut-1"));
        assert_eq!(
            org.service_tokens.get("animated").map(String::as_str),
            Some("tok-123")
        );
    }

    #[test]
    /// 验证未识别键经 flatten 保留并原样序列化回去。
    fn state_document_serde_preserves_unknown_keys() {
        let json = r#"{ "orgID": "o", "beta_flags": { "x": true } }"#;
        let document: StateDocument = serde_json::from_str(json).unwrap();
        assert!(document.extra.contains_key("beta_flags"));

        let out = pretty_json(&document);
        let back: StateDocument = serde_json::from_str(&out).unwrap();
        assert_eq!(back.extra.get("beta_flags"), document.extra.get("beta_flags"));
    }

    #[test]
    /// 验证规范序列化使用 4 空格缩进且键有序。
    fn pretty_json_is_canonical() {
        let mut orgs = BTreeMap::new();
        orgs.insert(
            "o1".to_string(),
            OrgRecord {
                email: Some("a@b.com".to_string()),
                ..Default::default()
            },
        );
        let document = StateDocument {
            org_id: Some("o1".to_string()),
            orgs,
            extra: BTreeMap::new(),
        };
        let out = pretty_json(&document);
        assert!(out.contains("\n    \"orgID\""), "out: {out}");
        // orgID 在 orgs 之前（字典序）
        assert!(out.find("orgID").unwrap() < out.find("orgs").unwrap());
    }

    #[test]
    /// 未加载时全部查询接口返回 NotLoaded。
    fn accessors_before_load_fail_with_not_loaded() {
        let state = AccountState::with_path("/nonexistent/yunfan.json");
        assert!(matches!(state.current_org_id(), Err(StateError::NotLoaded)));
        assert!(matches!(state.current_email(), Err(StateError::NotLoaded)));
        assert!(matches!(
            state.current_service_token("animated"),
            Err(StateError::NotLoaded)
        ));
        assert!(matches!(state.to_json(), Err(StateError::NotLoaded)));
    }

    #[test]
    /// set_service_token 在没有当前组织时拒绝写入。
    fn set_service_token_requires_current_org() {
        let mut state = AccountState::with_path("/nonexistent/yunfan.json");
        let err = state.set_service_token("svc", "tok").unwrap_err();
        assert!(matches!(err, StateError::MissingField(f) if f == "orgID"));
    }
}
