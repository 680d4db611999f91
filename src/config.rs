use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const GITHUB_API_BASE: &str = "https://api.github.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub name: String,
    pub version: String,
    /// `owner/repo`，用于拼出 releases/latest 地址
    pub github_repo: Option<String>,
    /// 显式指定的 release 元数据地址，优先于 github_repo
    pub release_url: Option<String>,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: "Terminal Package Store".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            github_repo: None,
            release_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsSection {
    pub check_updates_on_startup: bool,
    /// 定时版本检查间隔（秒），0 表示关闭
    pub auto_refresh_interval: u64,
    pub winget_command: String,
    /// 日志输出文件；不设置时写到配置文件旁的 termstore.log
    pub log_file: Option<PathBuf>,
}

impl Default for SettingsSection {
    fn default() -> Self {
        Self {
            check_updates_on_startup: true,
            auto_refresh_interval: 3600,
            winget_command: "winget".to_string(),
            log_file: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub app: AppSection,
    pub settings: SettingsSection,
}

impl Config {
    /// 配置文件路径：$TERMSTORE_CONFIG 优先，否则 ~/.config/termstore/config.toml
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var("TERMSTORE_CONFIG") {
            return PathBuf::from(path);
        }
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".config/termstore/config.toml")
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("配置文件不存在，使用默认配置: {}", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("invalid TOML in {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.app.name.trim().is_empty() {
            bail!("missing required field 'app.name' in config");
        }
        if self.app.version.trim().is_empty() {
            bail!("missing required field 'app.version' in config");
        }
        if self.settings.winget_command.trim().is_empty() {
            bail!("'settings.winget_command' must not be empty");
        }
        Ok(())
    }

    /// release 元数据地址；两者都没配置时返回 None，版本检查随之报告失败
    pub fn api_url(&self) -> Option<String> {
        if let Some(url) = self.app.release_url.as_ref().filter(|u| !u.trim().is_empty()) {
            return Some(url.clone());
        }
        self.app
            .github_repo
            .as_ref()
            .map(|repo| repo.trim().trim_matches('/'))
            .filter(|repo| !repo.is_empty())
            .map(|repo| format!("{GITHUB_API_BASE}/repos/{repo}/releases/latest"))
    }

    /// 日志文件路径。TUI 占用终端，日志不能写到 stderr
    pub fn log_path(&self, config_path: &Path) -> PathBuf {
        self.settings
            .log_file
            .clone()
            .unwrap_or_else(|| config_path.with_file_name("termstore.log"))
    }

    pub fn user_agent(&self) -> String {
        format!("{}/{}", self.app.name.replace(' ', "-"), self.app.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.app.name, "Terminal Package Store");
        assert!(config.settings.check_updates_on_startup);
        assert_eq!(config.settings.auto_refresh_interval, 3600);
        assert!(config.api_url().is_none());
    }

    #[test]
    fn loads_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[app]
name = "Store"
version = "1.2.0"
github_repo = "owner/store"

[settings]
auto_refresh_interval = 600
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.app.version, "1.2.0");
        assert_eq!(config.settings.auto_refresh_interval, 600);
        assert_eq!(config.settings.winget_command, "winget");
        assert_eq!(
            config.api_url().as_deref(),
            Some("https://api.github.com/repos/owner/store/releases/latest")
        );
    }

    #[test]
    fn release_url_overrides_repo() {
        let mut config = Config::default();
        config.app.github_repo = Some("owner/store".to_string());
        config.app.release_url = Some("http://localhost:8080/latest".to_string());
        assert_eq!(config.api_url().as_deref(), Some("http://localhost:8080/latest"));
    }

    #[test]
    fn rejects_empty_required_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[app]\nname = \"\"\n").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("app.name"));
    }

    #[test]
    fn log_file_defaults_next_to_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        assert_eq!(config.log_path(&path), dir.path().join("termstore.log"));

        config.settings.log_file = Some(dir.path().join("custom.log"));
        assert_eq!(config.log_path(&path), dir.path().join("custom.log"));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[app]\nname = \"Store\"\nauthor = \"Someone\"\n").unwrap();
        assert_eq!(Config::load_from(&path).unwrap().app.name, "Store");
    }

    #[test]
    fn rejects_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[app\nname = ").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
