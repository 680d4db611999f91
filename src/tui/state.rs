use crate::config::Config;
use crate::orchestrator::ActionKind;
use crate::package_manager::{UpgradeListing, UpgradeRecord};
use crate::update_check::{CheckSchedule, VersionCheckResult};
use chrono::{DateTime, Local};

// ========== 枚举 ==========

/// UI 发出的意图，由主循环逐个处理
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Refresh,
    Upgrade(String),
    UpgradeAll,
    Uninstall(String),
    CheckVersion,
    SelectPrev,
    SelectNext,
    SelectFirst,
    SelectLast,
    Quit,
}

/// 包管理器操作所处阶段。同一时刻只允许一个包管理器操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackagePhase {
    Idle,
    /// 正在获取可升级列表
    Loading,
    InFlight(ActionKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Progress,
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusLine {
    pub fn new(kind: StatusKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

// ========== 事件 ==========

/// 后台任务回传给主循环的事件
#[derive(Debug)]
pub enum AppEvent {
    UpgradesLoaded(UpgradeListing),
    VersionChecked(VersionCheckResult),
}

// ========== App ==========

pub struct App {
    pub config: Config,
    /// 当前快照，每次刷新整体替换
    pub records: Vec<UpgradeRecord>,
    /// 选中项以 id 引用，刷新后重新校验
    pub selected_id: Option<String>,
    pub phase: PackagePhase,
    pub status: Option<StatusLine>,
    pub loaded_once: bool,
    pub version: Option<VersionCheckResult>,
    pub version_checked_at: Option<DateTime<Local>>,
    pub schedule: CheckSchedule,
    pub should_quit: bool,
}

impl App {
    pub fn new(config: Config) -> Self {
        let schedule = CheckSchedule::new(config.settings.auto_refresh_interval);
        Self {
            config,
            records: Vec::new(),
            selected_id: None,
            phase: PackagePhase::Idle,
            status: None,
            loaded_once: false,
            version: None,
            version_checked_at: None,
            schedule,
            should_quit: false,
        }
    }

    pub fn set_status(&mut self, kind: StatusKind, text: impl Into<String>) {
        self.status = Some(StatusLine::new(kind, text));
    }

    pub fn is_idle(&self) -> bool {
        self.phase == PackagePhase::Idle
    }

    // ===== 快照与选中 =====

    pub fn selected_index(&self) -> Option<usize> {
        let id = self.selected_id.as_deref()?;
        self.records.iter().position(|r| r.id == id)
    }

    pub fn selected(&self) -> Option<&UpgradeRecord> {
        self.selected_index().map(|i| &self.records[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.iter().any(|r| r.id == id)
    }

    /// 用新的列表替换快照
    ///
    /// 之前选中的 id 仍在列表中则保留，否则选中第一项。
    pub fn replace_snapshot(&mut self, listing: UpgradeListing) {
        self.records = listing.records;
        self.loaded_once = true;
        self.phase = PackagePhase::Idle;

        let keep = self
            .selected_id
            .as_deref()
            .is_some_and(|id| self.records.iter().any(|r| r.id == id));
        if !keep {
            self.selected_id = self.records.first().map(|r| r.id.clone());
        }

        if let Some(diagnostic) = listing.diagnostic {
            self.set_status(StatusKind::Error, diagnostic);
        } else if self.status.as_ref().is_some_and(|s| s.kind == StatusKind::Progress) {
            self.status = None;
        }
    }

    fn select_at(&mut self, index: usize) {
        if let Some(record) = self.records.get(index) {
            self.selected_id = Some(record.id.clone());
        }
    }

    pub fn select_prev(&mut self) {
        match self.selected_index() {
            Some(i) => self.select_at(i.saturating_sub(1)),
            None => self.select_at(0),
        }
    }

    pub fn select_next(&mut self) {
        match self.selected_index() {
            Some(i) if i + 1 < self.records.len() => self.select_at(i + 1),
            Some(_) => {}
            None => self.select_at(0),
        }
    }

    pub fn select_first(&mut self) {
        self.select_at(0);
    }

    pub fn select_last(&mut self) {
        self.select_at(self.records.len().saturating_sub(1));
    }

    // ===== 包管理器操作的阶段切换 =====

    fn reject_busy(&mut self) -> bool {
        if self.is_idle() {
            return false;
        }
        let what = match &self.phase {
            PackagePhase::Loading => "the package list is still loading",
            PackagePhase::InFlight(ActionKind::Upgrade) => "an upgrade is in progress",
            PackagePhase::InFlight(ActionKind::Uninstall) => "an uninstall is in progress",
            PackagePhase::Idle => "",
        };
        self.set_status(StatusKind::Warning, format!("Busy: {what}."));
        true
    }

    /// 开始刷新；已有包管理器操作在进行时拒绝
    pub fn begin_refresh(&mut self, announce: bool) -> bool {
        if self.reject_busy() {
            return false;
        }
        self.phase = PackagePhase::Loading;
        if announce {
            self.set_status(StatusKind::Progress, "Checking for available upgrades...");
        }
        true
    }

    /// 开始单个动作，校验 id 仍在当前快照中
    pub fn begin_action(&mut self, kind: ActionKind, id: &str) -> bool {
        if self.reject_busy() {
            return false;
        }
        if !self.contains(id) {
            self.set_status(
                StatusKind::Warning,
                format!("{id} is no longer in the upgrade list. Refresh and try again."),
            );
            return false;
        }
        self.phase = PackagePhase::InFlight(kind);
        true
    }

    pub fn begin_batch(&mut self) -> bool {
        if self.reject_busy() {
            return false;
        }
        if self.records.is_empty() {
            self.set_status(StatusKind::Warning, "No packages to update.");
            return false;
        }
        self.phase = PackagePhase::InFlight(ActionKind::Upgrade);
        true
    }

    pub fn finish_action(&mut self, kind: StatusKind, text: String) {
        self.phase = PackagePhase::Idle;
        self.set_status(kind, text);
    }

    // ===== 版本检查 =====

    /// 手动触发或定时触发。返回 true 表示应当启动一次检查
    pub fn begin_version_check(&mut self, now: std::time::Instant, manual: bool) -> bool {
        if !manual && !self.schedule.periodic_due(now) {
            return false;
        }
        self.schedule.try_begin(now)
    }

    pub fn finish_version_check(&mut self, result: VersionCheckResult) {
        self.schedule.finish();
        self.version = Some(result);
        self.version_checked_at = Some(Local::now());
    }
}
