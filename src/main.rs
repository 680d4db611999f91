mod config;
mod error;
mod orchestrator;
mod package_manager;
mod tui;
mod update_check;

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config_path = config::Config::default_path();
    let config = config::Config::load_from(&config_path)?;

    // TUI 占用终端，日志一律写到文件
    let log_path = config.log_path(&config_path);
    if let Some(dir) = log_path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("无法创建日志目录: {}", dir.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("无法打开日志文件: {}", log_path.display()))?;
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();

    log::info!("{} v{} 启动", config.app.name, config.app.version);

    tui::run(config).await?;

    Ok(())
}
