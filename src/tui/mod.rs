mod actions;
mod layout;
mod packages;
pub mod state;
mod theme;

use crate::config::Config;
use crate::orchestrator::ActionKind;
use crate::package_manager::{PackageTool, Winget};
use crate::update_check::ReleaseClient;
use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use state::{App, AppEvent, Intent, StatusKind};
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

type Term = Terminal<CrosstermBackend<io::Stdout>>;

/// 主循环依赖的外部协作者
struct Services {
    tool: Arc<dyn PackageTool>,
    client: Arc<ReleaseClient>,
    tx: mpsc::Sender<AppEvent>,
}

pub async fn run(config: Config) -> Result<()> {
    // 终端初始化
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (tx, mut rx) = mpsc::channel(32);
    let services = Services {
        tool: Arc::new(Winget::new(config.settings.winget_command.clone())),
        client: Arc::new(ReleaseClient::new(&config.user_agent())),
        tx,
    };
    let mut app = App::new(config);

    // 启动：加载列表，按配置决定是否立即检查新版本
    if app.begin_refresh(true) {
        actions::spawn_refresh(Arc::clone(&services.tool), &services.tx);
    }
    if app.config.settings.check_updates_on_startup {
        start_version_check(&mut app, &services, true);
    } else {
        app.schedule.restart_timer(Instant::now());
    }

    let result = event_loop(&mut terminal, &mut app, &services, &mut rx);

    // 恢复终端
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn event_loop(
    terminal: &mut Term,
    app: &mut App,
    services: &Services,
    rx: &mut mpsc::Receiver<AppEvent>,
) -> Result<()> {
    loop {
        // 定时版本检查（未到间隔时什么也不做）
        start_version_check(app, services, false);

        terminal.draw(|f| packages::render_packages(f, app))?;

        // 处理按键
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                // Windows 上按下和松开各有一个事件
                if key.kind == KeyEventKind::Press {
                    if let Some(intent) = packages::handle_key(key, app) {
                        dispatch(intent, terminal, app, services)?;
                    }
                }
            }
        }

        // 处理异步事件
        while let Ok(event) = rx.try_recv() {
            match event {
                AppEvent::UpgradesLoaded(listing) => app.replace_snapshot(listing),
                AppEvent::VersionChecked(result) => app.finish_version_check(result),
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn dispatch(intent: Intent, terminal: &mut Term, app: &mut App, services: &Services) -> Result<()> {
    match intent {
        Intent::Quit => app.should_quit = true,
        Intent::SelectPrev => app.select_prev(),
        Intent::SelectNext => app.select_next(),
        Intent::SelectFirst => app.select_first(),
        Intent::SelectLast => app.select_last(),
        Intent::Refresh => {
            if app.begin_refresh(true) {
                actions::spawn_refresh(Arc::clone(&services.tool), &services.tx);
            }
            start_version_check(app, services, true);
        }
        Intent::CheckVersion => {
            if !start_version_check(app, services, true) {
                app.set_status(StatusKind::Info, "An update check is already running.");
            }
        }
        Intent::Upgrade(id) => run_single_action(terminal, app, services, ActionKind::Upgrade, &id)?,
        Intent::Uninstall(id) => run_single_action(terminal, app, services, ActionKind::Uninstall, &id)?,
        Intent::UpgradeAll => {
            if app.begin_batch() {
                let tool = Arc::clone(&services.tool);
                let needs_refresh = with_suspended_terminal(terminal, || {
                    let mut stdout = io::stdout();
                    actions::run_batch(app, tool.as_ref(), &mut stdout)
                })?;
                refresh_after_action(app, services, needs_refresh);
            }
        }
    }
    Ok(())
}

fn run_single_action(
    terminal: &mut Term,
    app: &mut App,
    services: &Services,
    kind: ActionKind,
    id: &str,
) -> Result<()> {
    if !app.begin_action(kind, id) {
        return Ok(());
    }
    let tool = Arc::clone(&services.tool);
    let needs_refresh = with_suspended_terminal(terminal, || {
        match kind {
            ActionKind::Upgrade => println!("Upgrading: {id}..."),
            ActionKind::Uninstall => println!(
                "Attempting UNINSTALL for: {id}...\nA separate uninstaller window or UAC prompt may appear. Follow the steps there."
            ),
        }
        actions::run_single(app, tool.as_ref(), kind, id)
    })?;
    refresh_after_action(app, services, needs_refresh);
    Ok(())
}

fn refresh_after_action(app: &mut App, services: &Services, needs_refresh: bool) {
    if needs_refresh && app.begin_refresh(false) {
        actions::spawn_refresh(Arc::clone(&services.tool), &services.tx);
    }
}

/// 启动一次版本检查；manual 为 false 时只在定时间隔到达后触发。返回是否真的启动了
fn start_version_check(app: &mut App, services: &Services, manual: bool) -> bool {
    if !app.begin_version_check(Instant::now(), manual) {
        return false;
    }
    actions::spawn_version_check(
        Arc::clone(&services.client),
        app.config.app.version.clone(),
        app.config.api_url(),
        &services.tx,
    );
    true
}

/// 临时退出 TUI 执行交互式命令，结束后恢复 TUI
///
/// winget 的提示、UAC 和安装程序窗口需要直接面对用户，所以运行期间交还终端。
fn with_suspended_terminal<T>(terminal: &mut Term, f: impl FnOnce() -> T) -> Result<T> {
    // 退出 TUI
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    let value = tokio::task::block_in_place(f);

    println!();
    println!("Returning to the package list...");
    std::thread::sleep(Duration::from_millis(500));

    // 恢复 TUI
    enable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        EnterAlternateScreen,
        EnableMouseCapture
    )?;
    terminal.hide_cursor()?;
    terminal.clear()?;

    Ok(value)
}
