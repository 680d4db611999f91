//! 包管理器模块：对 winget 的封装

pub mod parser;
pub mod types;

// 重新导出常用类型和函数
pub use types::{CapturedOutput, UpgradeListing, UpgradeRecord};

use crate::error::ToolError;
use parser::parse_upgrade_table;

/// 与外部包管理器进程之间的接口
///
/// 所有调用都是同步阻塞的：包管理器和它拉起的安装程序不能并发运行。
pub trait PackageTool: Send + Sync {
    /// 可执行文件名，用于状态提示
    fn program(&self) -> &str;

    /// 列出可升级的包，返回捕获的 stdout
    fn list_upgrades(&self) -> Result<CapturedOutput, ToolError>;

    /// 升级单个包。安装程序自己的交互界面会直接出现在用户面前
    fn upgrade(&self, id: &str) -> Result<(), ToolError>;

    /// 卸载单个包，允许交互确认
    fn uninstall(&self, id: &str) -> Result<(), ToolError>;
}

#[derive(Debug, Clone)]
pub struct Winget {
    pub command: String,
}

impl Default for Winget {
    fn default() -> Self {
        Self::new("winget")
    }
}

impl Winget {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn list_args() -> Vec<String> {
        vec!["upgrade".to_string(), "--accept-source-agreements".to_string()]
    }

    pub fn upgrade_args(id: &str) -> Vec<String> {
        vec![
            "upgrade".to_string(),
            "--id".to_string(),
            id.to_string(),
            "--interactive".to_string(),
            "--accept-package-agreements".to_string(),
        ]
    }

    pub fn uninstall_args(id: &str) -> Vec<String> {
        vec![
            "uninstall".to_string(),
            "--id".to_string(),
            id.to_string(),
            "--interactive".to_string(),
        ]
    }

    /// 捕获输出执行命令；非零退出码转换为 ExecutionFailed
    fn run_captured(&self, args: &[String]) -> Result<CapturedOutput, ToolError> {
        log::debug!("执行: {} {}", self.command, args.join(" "));
        let output = duct::cmd(&self.command, args)
            .stdout_capture()
            .stderr_capture()
            .unchecked()
            .run()
            .map_err(|e| ToolError::from_spawn(&self.command, e))?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            return Err(ToolError::ExecutionFailed {
                program: self.command.clone(),
                code: output.status.code(),
                stderr,
            });
        }

        Ok(CapturedOutput { stdout, stderr })
    }

    /// 继承终端执行命令，让 winget 的提示和安装程序界面直接面向用户
    fn run_interactive(&self, args: &[String]) -> Result<(), ToolError> {
        log::debug!("交互执行: {} {}", self.command, args.join(" "));
        let output = duct::cmd(&self.command, args)
            .unchecked()
            .run()
            .map_err(|e| ToolError::from_spawn(&self.command, e))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(ToolError::ExecutionFailed {
                program: self.command.clone(),
                code: output.status.code(),
                stderr: String::new(),
            })
        }
    }
}

impl PackageTool for Winget {
    fn program(&self) -> &str {
        &self.command
    }

    fn list_upgrades(&self) -> Result<CapturedOutput, ToolError> {
        self.run_captured(&Self::list_args())
    }

    fn upgrade(&self, id: &str) -> Result<(), ToolError> {
        self.run_interactive(&Self::upgrade_args(id))
    }

    fn uninstall(&self, id: &str) -> Result<(), ToolError> {
        self.run_interactive(&Self::uninstall_args(id))
    }
}

/// 获取待升级的包列表
///
/// 从不返回错误：找不到命令、执行失败或输出无法识别时返回空列表，
/// 前两种情况在 `diagnostic` 中附带说明。
pub fn list_pending_upgrades(tool: &dyn PackageTool) -> UpgradeListing {
    match tool.list_upgrades() {
        Ok(output) => {
            if !output.stderr.trim().is_empty() {
                log::debug!("{} stderr: {}", tool.program(), output.stderr.trim());
            }
            let records = parse_upgrade_table(&output.stdout);
            log::info!("找到 {} 个可升级的包", records.len());
            UpgradeListing {
                records,
                diagnostic: None,
            }
        }
        Err(ToolError::NotFound { program }) => {
            log::error!("未找到 {program}");
            UpgradeListing {
                records: Vec::new(),
                diagnostic: Some(format!(
                    "FATAL ERROR: '{program}' command not found. Ensure Windows Package Manager is installed and in your PATH."
                )),
            }
        }
        Err(ToolError::ExecutionFailed {
            program,
            code,
            stderr,
        }) => {
            log::warn!("{program} 列表命令失败 (exit={code:?}): {}", stderr.trim());
            let detail = if stderr.trim().is_empty() {
                format!("exit code {}", code.map_or_else(|| "?".to_string(), |c| c.to_string()))
            } else {
                stderr.trim().to_string()
            };
            UpgradeListing {
                records: Vec::new(),
                diagnostic: Some(format!("Error executing {program}: {detail}")),
            }
        }
        Err(e) => {
            log::error!("列表命令执行出错: {e}");
            UpgradeListing {
                records: Vec::new(),
                diagnostic: Some(format!("Error executing {}: {e}", tool.program())),
            }
        }
    }
}
