use thiserror::Error;

/// 调用外部包管理器时可能出现的错误
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("'{program}' command not found")]
    NotFound { program: String },

    #[error("'{program}' exited with {}", exit_label(.code))]
    ExecutionFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ToolError {
    /// 把 spawn 阶段的 io::Error 归类：找不到可执行文件单独成类
    pub fn from_spawn(program: &str, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            ToolError::NotFound {
                program: program.to_string(),
            }
        } else {
            ToolError::Io(err)
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {c}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

/// 版本号解析错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("Invalid version string: {0:?}")]
    Malformed(String),
}

/// 远程版本检查失败的原因（只在 update_check 内部流转）
#[derive(Error, Debug)]
pub enum CheckError {
    #[error("Could not reach release API. Status: {status}")]
    Http { status: u16 },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error(transparent)]
    Version(#[from] VersionError),

    #[error("No release endpoint configured")]
    NoEndpoint,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_not_found_is_classified() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert!(matches!(
            ToolError::from_spawn("winget", err),
            ToolError::NotFound { ref program } if program == "winget"
        ));

        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(matches!(ToolError::from_spawn("winget", err), ToolError::Io(_)));
    }

    #[test]
    fn execution_failed_message_includes_code() {
        let err = ToolError::ExecutionFailed {
            program: "winget".to_string(),
            code: Some(3),
            stderr: String::new(),
        };
        assert_eq!(err.to_string(), "'winget' exited with exit code 3");
    }
}
