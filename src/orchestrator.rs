//! 升级 / 卸载动作的执行与结果汇总
//!
//! 所有动作都是串行的：winget 和它拉起的安装程序共享同一份安装状态，
//! 并发调用会互相冲突。

use crate::error::ToolError;
use crate::package_manager::{PackageTool, UpgradeRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Upgrade,
    Uninstall,
}

impl ActionKind {
    fn past_tense(self) -> &'static str {
        match self {
            ActionKind::Upgrade => "upgraded",
            ActionKind::Uninstall => "uninstalled",
        }
    }

    fn infinitive(self) -> &'static str {
        match self {
            ActionKind::Upgrade => "upgrade",
            ActionKind::Uninstall => "uninstall",
        }
    }
}

/// 单个动作的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Succeeded,
    /// 非零退出码，不重试
    Failed { code: Option<i32>, detail: String },
    /// 找不到可执行文件：本次操作失败，但进程继续运行
    ToolNotFound { program: String },
}

impl ActionOutcome {
    /// 成功或普通失败后都需要刷新列表（失败也可能改变了状态，比如升级了一半）
    pub fn needs_refresh(&self) -> bool {
        !matches!(self, ActionOutcome::ToolNotFound { .. })
    }

    /// 面向用户的状态文本
    pub fn describe(&self, kind: ActionKind, id: &str) -> String {
        match self {
            ActionOutcome::Succeeded => format!("SUCCESS: {id} {}.", kind.past_tense()),
            ActionOutcome::Failed { detail, .. } => {
                let detail = if detail.trim().is_empty() {
                    "Check terminal for details."
                } else {
                    detail.trim()
                };
                format!("FAILURE: {id} failed to {}. {detail}", kind.infinitive())
            }
            ActionOutcome::ToolNotFound { program } => {
                format!("FATAL ERROR: '{program}' command not found.")
            }
        }
    }
}

impl From<Result<(), ToolError>> for ActionOutcome {
    fn from(result: Result<(), ToolError>) -> Self {
        match result {
            Ok(()) => ActionOutcome::Succeeded,
            Err(ToolError::NotFound { program }) => ActionOutcome::ToolNotFound { program },
            Err(ToolError::ExecutionFailed { code, stderr, .. }) => ActionOutcome::Failed {
                code,
                detail: stderr,
            },
            Err(ToolError::Io(e)) => ActionOutcome::Failed {
                code: None,
                detail: e.to_string(),
            },
        }
    }
}

/// 批量升级的汇总
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub success_count: usize,
    pub failure_count: usize,
    /// 中途遇到 ToolNotFound 时为 Some，剩余条目不再尝试
    pub aborted: Option<String>,
}

impl BatchOutcome {
    pub fn needs_refresh(&self) -> bool {
        self.aborted.is_none()
    }

    pub fn summary(&self) -> String {
        match &self.aborted {
            Some(program) => format!(
                "FATAL ERROR: '{program}' command not found. Aborting. Successful updates: {} / Failed updates: {}",
                self.success_count, self.failure_count
            ),
            None => format!(
                "UPGRADE ALL COMPLETE! Successful updates: {} / Failed updates: {}",
                self.success_count, self.failure_count
            ),
        }
    }
}

/// 批量升级过程中每一步的通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchProgress<'a> {
    Started {
        index: usize,
        total: usize,
        id: &'a str,
    },
    Finished {
        index: usize,
        total: usize,
        id: &'a str,
        outcome: &'a ActionOutcome,
    },
}

impl BatchProgress<'_> {
    pub fn describe(&self) -> String {
        match self {
            BatchProgress::Started { index, total, id } => {
                format!("({}/{total}) Upgrading: {id}...", index + 1)
            }
            BatchProgress::Finished {
                index,
                total,
                id,
                outcome,
            } => match outcome {
                ActionOutcome::Succeeded => format!("({}/{total}) SUCCESS: {id} upgraded.", index + 1),
                ActionOutcome::Failed { .. } => {
                    format!("({}/{total}) FAILURE: {id} failed to upgrade. Skipping.", index + 1)
                }
                ActionOutcome::ToolNotFound { program } => {
                    format!("FATAL ERROR: '{program}' command not found. Aborting.")
                }
            },
        }
    }
}

pub fn upgrade_one(tool: &dyn PackageTool, id: &str) -> ActionOutcome {
    log::info!("升级 {id}");
    let outcome = ActionOutcome::from(tool.upgrade(id));
    log_outcome(ActionKind::Upgrade, id, &outcome);
    outcome
}

pub fn uninstall_one(tool: &dyn PackageTool, id: &str) -> ActionOutcome {
    log::info!("卸载 {id}");
    let outcome = ActionOutcome::from(tool.uninstall(id));
    log_outcome(ActionKind::Uninstall, id, &outcome);
    outcome
}

/// 按快照顺序逐个升级
///
/// 普通失败计数后继续；ToolNotFound 立即中止剩余条目。
/// 列表刷新由调用方在结束后做一次，而不是每个条目一次。
pub fn upgrade_all<F>(tool: &dyn PackageTool, snapshot: &[UpgradeRecord], mut on_progress: F) -> BatchOutcome
where
    F: FnMut(BatchProgress<'_>),
{
    let total = snapshot.len();
    let mut batch = BatchOutcome::default();

    for (index, record) in snapshot.iter().enumerate() {
        let id = record.id.as_str();
        on_progress(BatchProgress::Started { index, total, id });

        let outcome = upgrade_one(tool, id);
        on_progress(BatchProgress::Finished {
            index,
            total,
            id,
            outcome: &outcome,
        });

        match outcome {
            ActionOutcome::Succeeded => batch.success_count += 1,
            ActionOutcome::Failed { .. } => batch.failure_count += 1,
            ActionOutcome::ToolNotFound { program } => {
                log::error!("未找到 {program}，中止批量升级 ({}/{total})", index + 1);
                batch.aborted = Some(program);
                break;
            }
        }
    }

    log::info!(
        "批量升级结束: 成功 {} / 失败 {}",
        batch.success_count,
        batch.failure_count
    );
    batch
}

fn log_outcome(kind: ActionKind, id: &str, outcome: &ActionOutcome) {
    match outcome {
        ActionOutcome::Succeeded => log::info!("{} {id} 成功", kind.infinitive()),
        ActionOutcome::Failed { code, detail } => {
            log::warn!("{} {id} 失败 (exit={code:?}): {}", kind.infinitive(), detail.trim())
        }
        ActionOutcome::ToolNotFound { program } => log::error!("未找到 {program}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package_manager::testing::{failed, not_found, Call, ScriptedTool};

    fn record(id: &str) -> UpgradeRecord {
        UpgradeRecord {
            name: id.to_string(),
            id: id.to_string(),
            current_version: "1.0".to_string(),
            available_version: "2.0".to_string(),
            source_repository: "winget".to_string(),
        }
    }

    #[test]
    fn upgrade_one_maps_exit_status() {
        let tool = ScriptedTool::with_actions(vec![Ok(()), Err(failed(1)), Err(not_found())]);

        assert_eq!(upgrade_one(&tool, "A"), ActionOutcome::Succeeded);
        assert!(matches!(upgrade_one(&tool, "B"), ActionOutcome::Failed { code: Some(1), .. }));
        assert_eq!(
            upgrade_one(&tool, "C"),
            ActionOutcome::ToolNotFound {
                program: "winget".to_string()
            }
        );
        assert_eq!(
            tool.calls(),
            vec![
                Call::Upgrade("A".to_string()),
                Call::Upgrade("B".to_string()),
                Call::Upgrade("C".to_string()),
            ]
        );
    }

    #[test]
    fn uninstall_one_uses_uninstall_command() {
        let tool = ScriptedTool::with_actions(vec![Ok(())]);
        assert_eq!(uninstall_one(&tool, "Git.Git"), ActionOutcome::Succeeded);
        assert_eq!(tool.calls(), vec![Call::Uninstall("Git.Git".to_string())]);
    }

    #[test]
    fn upgrade_all_counts_failures_and_continues() {
        let tool = ScriptedTool::with_actions(vec![Ok(()), Err(failed(2)), Ok(())]);
        let snapshot = vec![record("A"), record("B"), record("C")];

        let mut lines = Vec::new();
        let batch = upgrade_all(&tool, &snapshot, |p| lines.push(p.describe()));

        assert_eq!(batch.success_count, 2);
        assert_eq!(batch.failure_count, 1);
        assert!(batch.aborted.is_none());
        assert!(batch.needs_refresh());
        assert_eq!(
            tool.calls(),
            vec![
                Call::Upgrade("A".to_string()),
                Call::Upgrade("B".to_string()),
                Call::Upgrade("C".to_string()),
            ]
        );
        assert_eq!(lines[0], "(1/3) Upgrading: A...");
        assert_eq!(lines[3], "(2/3) FAILURE: B failed to upgrade. Skipping.");
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn upgrade_all_aborts_on_missing_tool() {
        let tool = ScriptedTool::with_actions(vec![Ok(()), Err(not_found()), Ok(())]);
        let snapshot = vec![record("A"), record("B"), record("C")];

        let batch = upgrade_all(&tool, &snapshot, |_| {});

        assert_eq!(batch.success_count, 1);
        assert_eq!(batch.failure_count, 0);
        assert_eq!(batch.aborted.as_deref(), Some("winget"));
        assert!(!batch.needs_refresh());
        assert_eq!(
            tool.calls(),
            vec![Call::Upgrade("A".to_string()), Call::Upgrade("B".to_string())]
        );
    }

    #[test]
    fn upgrade_all_on_empty_snapshot_does_nothing() {
        let tool = ScriptedTool::default();
        let batch = upgrade_all(&tool, &[], |_| {});
        assert_eq!(batch, BatchOutcome::default());
        assert!(tool.calls().is_empty());
    }

    #[test]
    fn outcome_descriptions() {
        assert_eq!(
            ActionOutcome::Succeeded.describe(ActionKind::Upgrade, "Git.Git"),
            "SUCCESS: Git.Git upgraded."
        );
        let failed = ActionOutcome::Failed {
            code: Some(1),
            detail: "access denied\n".to_string(),
        };
        assert_eq!(
            failed.describe(ActionKind::Uninstall, "Git.Git"),
            "FAILURE: Git.Git failed to uninstall. access denied"
        );
        let missing = ActionOutcome::ToolNotFound {
            program: "winget".to_string(),
        };
        assert!(!missing.needs_refresh());
        assert_eq!(
            missing.describe(ActionKind::Upgrade, "x"),
            "FATAL ERROR: 'winget' command not found."
        );
    }
}
