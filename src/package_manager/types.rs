//! 包管理器相关数据类型定义

/// `winget upgrade` 列表中的一行：一个有可用更新的已安装包
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeRecord {
    /// 显示名称，可能包含空格
    pub name: String,
    /// 包管理器的唯一标识，不含空白，后续命令以它为键
    pub id: String,
    pub current_version: String,
    pub available_version: String,
    /// 来源仓库标签（如 winget / msstore）
    pub source_repository: String,
}

/// 一次列表刷新的结果
///
/// 列表获取从不报错：失败时 `records` 为空，`diagnostic` 携带给用户看的说明。
#[derive(Debug, Clone, Default)]
pub struct UpgradeListing {
    pub records: Vec<UpgradeRecord>,
    pub diagnostic: Option<String>,
}

/// 捕获的命令输出
#[derive(Debug, Clone)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
}
