//! 本地账户状态巡检工具（statectl）。
//!
//! 职责：
//! - 读取 `~/.yunfan/yunfan.json` 并展示当前组织/邮箱/服务列表
//! - 按服务名输出凭证令牌（供脚本管道使用，stdout 仅输出令牌本身）
//! - 输出状态文件路径、导出规范 JSON、删除状态文件（需显式确认）
//!
//! 约定：
//! - 本工具只调用核心库接口并打印结果，不自行解释状态文件格式
//! - 所有失败以非零退出码结束，错误信息走 stderr
//!
//! 作者：云帆开发者平台项目组（自动生成）
//! 创建时间：2026-08-24
//! 修改时间：2026-08-24

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use yunfan_core::state::AccountState;

/// 命令行参数。
///
/// 说明：
/// - `--state` 指定状态文件路径（默认 `~/.yunfan/yunfan.json`），
///   主要用于测试与多账户场景
#[derive(Debug, Parser)]
#[command(name = "yunfan-statectl", version)]
struct Cli {
    #[arg(long)]
    state: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// statectl 支持的子命令。
#[derive(Debug, Subcommand)]
enum Commands {
    /// 显示当前组织、邮箱与服务列表。
    Show,
    /// 输出指定服务的凭证令牌（仅令牌本身）。
    Token { service: String },
    /// 输出状态文件路径（不读取文件内容）。
    Path,
    /// 导出规范 JSON（键有序、4 空格缩进）。
    Dump,
    /// 删除状态文件（需 --yes 确认）。
    Smite {
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
}

/// 程序入口：解析参数并分发子命令。
///
/// 异常处理：
/// - 任意子命令执行失败会返回 `Err`，错误链打印到 stderr，退出码非零。
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("info".parse().unwrap()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut state = open_state(&cli)?;
    match cli.command {
        Commands::Show => show(&mut state),
        Commands::Token { service } => token(&mut state, &service),
        Commands::Path => {
            println!("{}", state.state_path().display());
            Ok(())
        }
        Commands::Dump => dump(&mut state),
        Commands::Smite { yes } => smite(&mut state, yes),
    }
}

/// 构造状态存取器（默认路径或 `--state` 覆盖路径）。
///
/// 异常处理：
/// - 默认路径依赖用户主目录，主目录不可确定时返回错误。
fn open_state(cli: &Cli) -> Result<AccountState> {
    Ok(match &cli.state {
        Some(path) => AccountState::with_path(path),
        None => AccountState::new().context("解析默认状态文件路径失败")?,
    })
}

/// 加载并展示当前组织、邮箱与服务列表。
fn show(state: &mut AccountState) -> Result<()> {
    state
        .load()
        .with_context(|| format!("加载状态文件失败: {}", state.state_path().display()))?;

    println!("orgID: {}", state.current_org_id()?);
    println!("email: {}", state.current_email()?);
    for service in state.current_services()? {
        println!("service: {service}");
    }
    Ok(())
}

/// 输出指定服务的凭证令牌。
///
/// 说明：
/// - stdout 仅输出令牌本身，便于脚本 `$(statectl token xxx)` 使用。
fn token(state: &mut AccountState, service: &str) -> Result<()> {
    state
        .load()
        .with_context(|| format!("加载状态文件失败: {}", state.state_path().display()))?;
    println!("{}", state.current_service_token(service)?);
    Ok(())
}

/// 导出规范 JSON 文本。
fn dump(state: &mut AccountState) -> Result<()> {
    state
        .load()
        .with_context(|| format!("加载状态文件失败: {}", state.state_path().display()))?;
    println!("{}", state.to_json()?);
    Ok(())
}

/// 删除状态文件（需要 `--yes` 显式确认）。
///
/// 异常处理：
/// - 未带 `--yes` 时拒绝执行并返回错误（避免误删账户状态）。
fn smite(state: &mut AccountState, yes: bool) -> Result<()> {
    if !yes {
        return Err(anyhow!(
            "删除状态文件是不可恢复操作，请追加 --yes 确认: {}",
            state.state_path().display()
        ));
    }
    state.smite()?;
    info!("状态文件已删除: {}", state.state_path().display());
    Ok(())
}
