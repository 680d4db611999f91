//! 应用自身的版本检查：请求 release 元数据，比较版本号

use crate::error::{CheckError, VersionError};
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct LatestRelease {
    #[serde(default)]
    tag_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionStatus {
    UpdateAvailable,
    UpToDate,
    CheckFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionCheckResult {
    pub status: VersionStatus,
    pub latest_version: Option<String>,
    /// 仅在 CheckFailed 时有值
    pub message: Option<String>,
}

impl VersionCheckResult {
    fn compared(status: VersionStatus, latest: String) -> Self {
        Self {
            status,
            latest_version: Some(latest),
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: VersionStatus::CheckFailed,
            latest_version: None,
            message: Some(message.into()),
        }
    }
}

/// 把 `"1.2.0"` 解析为 `[1, 2, 0]`，任何非数字段都视为格式错误
pub fn parse_version_tuple(version: &str) -> Result<Vec<u64>, VersionError> {
    let trimmed = version.trim();
    if trimmed.is_empty() {
        return Err(VersionError::Malformed(version.to_string()));
    }
    trimmed
        .split('.')
        .map(|part| {
            part.parse::<u64>()
                .map_err(|_| VersionError::Malformed(version.to_string()))
        })
        .collect()
}

/// 去掉 tag 前面的 `v`
pub fn strip_tag_prefix(tag: &str) -> &str {
    let tag = tag.trim();
    tag.strip_prefix('v').unwrap_or(tag)
}

/// 按元组字典序比较，远程更大即有更新
pub fn compare_versions(current: &str, latest: &str) -> Result<VersionStatus, VersionError> {
    let current = parse_version_tuple(strip_tag_prefix(current))?;
    let latest = parse_version_tuple(latest)?;
    Ok(if latest > current {
        VersionStatus::UpdateAvailable
    } else {
        VersionStatus::UpToDate
    })
}

pub struct ReleaseClient {
    client: Client,
}

impl ReleaseClient {
    pub fn new(user_agent: &str) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(user_agent.to_string())
            .build()
            .unwrap_or_else(|e| {
                log::warn!("构建 HTTP 客户端失败，使用默认配置: {e}");
                Client::new()
            });
        Self { client }
    }

    async fn fetch_latest_tag(&self, endpoint_url: &str) -> Result<String, CheckError> {
        let response = self
            .client
            .get(endpoint_url)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CheckError::Http {
                status: response.status().as_u16(),
            });
        }

        let release: LatestRelease = response.json().await?;
        Ok(release.tag_name.unwrap_or_else(|| "0.0.0".to_string()))
    }

    async fn try_check(&self, current_version: &str, endpoint_url: &str) -> Result<VersionCheckResult, CheckError> {
        let tag = self.fetch_latest_tag(endpoint_url).await?;
        let latest = strip_tag_prefix(&tag).to_string();
        let status = compare_versions(current_version, &latest)?;
        Ok(VersionCheckResult::compared(status, latest))
    }

    /// 检查是否有新版本。任何错误都转成 CheckFailed，不会向外传播
    pub async fn check_app_version(&self, current_version: &str, endpoint_url: &str) -> VersionCheckResult {
        log::debug!("检查版本: {endpoint_url}");
        match self.try_check(current_version, endpoint_url).await {
            Ok(result) => {
                log::info!(
                    "版本检查完成: 当前 {current_version}, 最新 {:?} ({:?})",
                    result.latest_version,
                    result.status
                );
                result
            }
            Err(e) => {
                log::warn!("版本检查失败: {e}");
                VersionCheckResult::failed(e.to_string())
            }
        }
    }
}

/// 版本检查的调度：单飞 + 定时去抖
///
/// 同一时刻最多一个检查在进行；定时触发时如果距上次开始不足间隔则跳过。
#[derive(Debug, Clone)]
pub struct CheckSchedule {
    interval: Option<Duration>,
    last_started: Option<Instant>,
    in_flight: bool,
}

impl CheckSchedule {
    /// interval 为 0 表示关闭定时检查
    pub fn new(interval_secs: u64) -> Self {
        Self {
            interval: (interval_secs > 0).then(|| Duration::from_secs(interval_secs)),
            last_started: None,
            in_flight: false,
        }
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// 定时器是否应该触发一次检查
    pub fn periodic_due(&self, now: Instant) -> bool {
        let Some(interval) = self.interval else {
            return false;
        };
        if self.in_flight {
            return false;
        }
        match self.last_started {
            Some(last) => now.saturating_duration_since(last) >= interval,
            None => true,
        }
    }

    /// 尝试开始一次检查；已有检查在进行时返回 false
    pub fn try_begin(&mut self, now: Instant) -> bool {
        if self.in_flight {
            return false;
        }
        self.in_flight = true;
        self.last_started = Some(now);
        true
    }

    pub fn finish(&mut self) {
        self.in_flight = false;
    }

    /// 不检查，只把定时器从 now 开始重新计时（启动时不检查的情况）
    pub fn restart_timer(&mut self, now: Instant) {
        self.last_started = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn serve(body: ResponseTemplate) -> (MockServer, String) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/owner/app/releases/latest"))
            .respond_with(body)
            .mount(&server)
            .await;
        let url = format!("{}/repos/owner/app/releases/latest", server.uri());
        (server, url)
    }

    async fn check_app_version(current_version: &str, endpoint_url: &str) -> VersionCheckResult {
        ReleaseClient::new("termstore-test/0")
            .check_app_version(current_version, endpoint_url)
            .await
    }

    #[test]
    fn version_tuples() {
        assert_eq!(parse_version_tuple("1.2.0").unwrap(), vec![1, 2, 0]);
        assert!(parse_version_tuple("1.x.0").is_err());
        assert!(parse_version_tuple("").is_err());
        assert!(parse_version_tuple("1..2").is_err());
    }

    #[test]
    fn only_lowercase_v_prefix_is_stripped() {
        assert_eq!(strip_tag_prefix("v1.0"), "1.0");
        assert_eq!(strip_tag_prefix("V1.0"), "V1.0");
        assert!(compare_versions("1.0", strip_tag_prefix("V1.0")).is_err());
    }

    #[test]
    fn tuple_comparison_is_lexicographic() {
        assert_eq!(compare_versions("1.2.0", "1.10.0").unwrap(), VersionStatus::UpdateAvailable);
        assert_eq!(compare_versions("1.2", "1.2.0").unwrap(), VersionStatus::UpdateAvailable);
        assert_eq!(compare_versions("2.0.0", "1.9.9").unwrap(), VersionStatus::UpToDate);
        assert_eq!(compare_versions("v2.0.0", "2.0.0").unwrap(), VersionStatus::UpToDate);
    }

    #[tokio::test]
    async fn newer_release_is_update_available() {
        let (_server, url) =
            serve(ResponseTemplate::new(200).set_body_json(json!({ "tag_name": "v1.3.0" }))).await;

        let result = check_app_version("1.2.0", &url).await;
        assert_eq!(result.status, VersionStatus::UpdateAvailable);
        assert_eq!(result.latest_version.as_deref(), Some("1.3.0"));
        assert!(result.message.is_none());
    }

    #[tokio::test]
    async fn same_release_is_up_to_date() {
        let (_server, url) =
            serve(ResponseTemplate::new(200).set_body_json(json!({ "tag_name": "v2.0.0" }))).await;

        let result = check_app_version("2.0.0", &url).await;
        assert_eq!(result.status, VersionStatus::UpToDate);
        assert_eq!(result.latest_version.as_deref(), Some("2.0.0"));
    }

    #[tokio::test]
    async fn malformed_tag_fails() {
        let (_server, url) =
            serve(ResponseTemplate::new(200).set_body_json(json!({ "tag_name": "v1.x" }))).await;

        let result = check_app_version("1.0.0", &url).await;
        assert_eq!(result.status, VersionStatus::CheckFailed);
        assert!(result.message.unwrap().contains("Invalid version string"));
    }

    #[tokio::test]
    async fn missing_tag_defaults_to_zero() {
        let (_server, url) =
            serve(ResponseTemplate::new(200).set_body_json(json!({ "name": "nightly" }))).await;

        let result = check_app_version("0.1.0", &url).await;
        assert_eq!(result.status, VersionStatus::UpToDate);
        assert_eq!(result.latest_version.as_deref(), Some("0.0.0"));
    }

    #[tokio::test]
    async fn http_error_status_fails() {
        let (_server, url) = serve(ResponseTemplate::new(404)).await;

        let result = check_app_version("1.0.0", &url).await;
        assert_eq!(result.status, VersionStatus::CheckFailed);
        assert_eq!(
            result.message.as_deref(),
            Some("Could not reach release API. Status: 404")
        );
    }

    #[tokio::test]
    async fn unreachable_endpoint_fails() {
        // 端口 9 (discard) 上通常没有 HTTP 服务
        let result = check_app_version("1.0.0", "http://127.0.0.1:9/releases/latest").await;
        assert_eq!(result.status, VersionStatus::CheckFailed);
        assert!(result.message.unwrap().starts_with("Network error"));
    }

    #[test]
    fn schedule_is_single_flight() {
        let now = Instant::now();
        let mut schedule = CheckSchedule::new(60);
        assert!(schedule.periodic_due(now));
        assert!(schedule.try_begin(now));
        assert!(!schedule.try_begin(now));
        assert!(!schedule.periodic_due(now + Duration::from_secs(120)));
        schedule.finish();
        assert!(schedule.try_begin(now + Duration::from_secs(1)));
    }

    #[test]
    fn schedule_debounces_periodic_checks() {
        let start = Instant::now();
        let mut schedule = CheckSchedule::new(60);
        assert!(schedule.try_begin(start));
        schedule.finish();

        assert!(!schedule.periodic_due(start + Duration::from_secs(30)));
        assert!(schedule.periodic_due(start + Duration::from_secs(60)));
    }

    #[test]
    fn restarted_timer_delays_first_periodic_check() {
        let start = Instant::now();
        let mut schedule = CheckSchedule::new(60);
        schedule.restart_timer(start);
        assert!(!schedule.periodic_due(start + Duration::from_secs(59)));
        assert!(schedule.periodic_due(start + Duration::from_secs(60)));
    }

    #[test]
    fn zero_interval_disables_periodic_checks() {
        let schedule = CheckSchedule::new(0);
        assert!(!schedule.periodic_due(Instant::now()));
    }
}
