//! 意图的执行：刷新列表、升级、卸载、版本检查

use super::state::{App, AppEvent, StatusKind};
use crate::error::CheckError;
use crate::orchestrator::{self, ActionKind, ActionOutcome};
use crate::package_manager::{list_pending_upgrades, PackageTool, UpgradeListing};
use crate::update_check::{ReleaseClient, VersionCheckResult};
use std::io::Write;
use std::sync::Arc;
use tokio::sync::mpsc;

/// 在后台线程获取可升级列表，完成后发送 UpgradesLoaded
pub fn spawn_refresh(tool: Arc<dyn PackageTool>, tx: &mpsc::Sender<AppEvent>) {
    let tx_clone = tx.clone();
    tokio::spawn(async move {
        let listing = tokio::task::spawn_blocking(move || list_pending_upgrades(tool.as_ref()))
            .await
            .unwrap_or_else(|e| {
                log::error!("列表任务异常退出: {e}");
                UpgradeListing {
                    records: Vec::new(),
                    diagnostic: Some(format!("Listing task failed: {e}")),
                }
            });
        let _ = tx_clone.send(AppEvent::UpgradesLoaded(listing)).await;
    });
}

/// 异步版本检查，完成后发送 VersionChecked
pub fn spawn_version_check(
    client: Arc<ReleaseClient>,
    current_version: String,
    endpoint: Option<String>,
    tx: &mpsc::Sender<AppEvent>,
) {
    let tx_clone = tx.clone();
    tokio::spawn(async move {
        let result = match endpoint {
            Some(url) => client.check_app_version(&current_version, &url).await,
            None => VersionCheckResult::failed(CheckError::NoEndpoint.to_string()),
        };
        let _ = tx_clone.send(AppEvent::VersionChecked(result)).await;
    });
}

/// 执行单个升级 / 卸载，更新状态栏。返回是否需要刷新列表
///
/// 调用前需已通过 `App::begin_action` 进入 InFlight。
pub fn run_single(app: &mut App, tool: &dyn PackageTool, kind: ActionKind, id: &str) -> bool {
    let outcome = match kind {
        ActionKind::Upgrade => orchestrator::upgrade_one(tool, id),
        ActionKind::Uninstall => orchestrator::uninstall_one(tool, id),
    };

    let status_kind = match &outcome {
        ActionOutcome::Succeeded => StatusKind::Success,
        ActionOutcome::Failed { .. } => StatusKind::Warning,
        ActionOutcome::ToolNotFound { .. } => StatusKind::Error,
    };
    app.finish_action(status_kind, outcome.describe(kind, id));
    outcome.needs_refresh()
}

/// 按当前快照顺序升级全部，进度逐行写到 `out`。返回是否需要刷新列表
///
/// 调用前需已通过 `App::begin_batch` 进入 InFlight。
pub fn run_batch<W: Write>(app: &mut App, tool: &dyn PackageTool, out: &mut W) -> bool {
    let snapshot = app.records.clone();
    let _ = writeln!(
        out,
        "Attempting to UPGRADE ALL {} packages. This may take a while and could involve multiple interactive prompts.",
        snapshot.len()
    );

    let batch = orchestrator::upgrade_all(tool, &snapshot, |progress| {
        let _ = writeln!(out, "{}", progress.describe());
        let _ = out.flush();
    });

    let summary = batch.summary();
    let _ = writeln!(out, "{summary}");

    let kind = if batch.aborted.is_some() {
        StatusKind::Error
    } else if batch.failure_count > 0 {
        StatusKind::Warning
    } else {
        StatusKind::Success
    };
    app.finish_action(kind, summary);
    batch.needs_refresh()
}
