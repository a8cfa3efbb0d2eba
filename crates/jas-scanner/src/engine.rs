//! 분석 엔진 프로세스 계약
//!
//! [`AnalyzerEngine`] trait은 외부 분석 엔진 실행을 추상화합니다. 세션은 엔진 핸들을
//! 생성자로 주입받으므로 테스트는 실제 프로세스 없이 결과 파일만 써 주는 구현을 사용합니다.
//!
//! # 프로세스 계약
//!
//! ```text
//! <engine> <subcommand> <config.yaml> [multi-scan-id]
//! ```
//!
//! - 작업 디렉토리: 엔진 실행 파일이 있는 디렉토리
//! - 환경 변수: `JF_USER`, `JF_PASS`, `JF_TOKEN`, `JF_PLATFORM_URL`, `AM_LOG_DIRECTORY`
//! - 예약 종료 코드: 31 (권한 없음), 13 (지원하지 않는 명령), 55 (지원하지 않는 OS)

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::{EngineCredentials, JasScannerConfig};
use crate::error::JasError;
use crate::types::JasScanType;

/// 권한 없음 종료 코드
pub const EXIT_NOT_ENTITLED: i32 = 31;
/// 지원하지 않는 명령 종료 코드
pub const EXIT_UNSUPPORTED_COMMAND: i32 = 13;
/// 지원하지 않는 OS 종료 코드
pub const EXIT_UNSUPPORTED_OS: i32 = 55;

/// 엔진 1회 실행 요청
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineInvocation {
    pub scan_type: JasScanType,
    pub config_path: PathBuf,
    pub multi_scan_id: Option<String>,
}

/// 종료 코드 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecStatus {
    Success,
    NotEntitled,
    UnsupportedCommand,
    UnsupportedOs,
    Failed(i32),
}

impl ExecStatus {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Success,
            EXIT_NOT_ENTITLED => Self::NotEntitled,
            EXIT_UNSUPPORTED_COMMAND => Self::UnsupportedCommand,
            EXIT_UNSUPPORTED_OS => Self::UnsupportedOs,
            other => Self::Failed(other),
        }
    }

    /// 결과 없이 해당 스캐너 종류를 건너뛰는 종료인지 확인합니다.
    pub fn is_soft_skip(&self) -> bool {
        matches!(
            self,
            Self::NotEntitled | Self::UnsupportedCommand | Self::UnsupportedOs
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NotEntitled => "not_entitled",
            Self::UnsupportedCommand => "unsupported_command",
            Self::UnsupportedOs => "unsupported_os",
            Self::Failed(_) => "failed",
        }
    }
}

/// 분석 엔진 추상화
///
/// 구현체는 요청된 설정 파일을 읽고 설정의 `output` 경로에 SARIF를 쓴 뒤
/// 프로세스 종료 코드를 반환해야 합니다.
///
/// # Errors
///
/// - `JasError::EngineLaunch`: 실행 파일을 시작할 수 없음 (이후 모듈 처리 중단)
/// - `JasError::EngineExecution`: 제한 시간 초과 또는 시그널로 종료
pub trait AnalyzerEngine: Send + Sync + 'static {
    fn execute(
        &self,
        invocation: &EngineInvocation,
    ) -> impl Future<Output = Result<i32, JasError>> + Send;
}

/// 외부 분석 엔진 프로세스 실행기
#[derive(Debug, Clone)]
pub struct AnalyzerManager {
    path: PathBuf,
    credentials: EngineCredentials,
    log_dir: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl AnalyzerManager {
    pub fn new(config: &JasScannerConfig) -> Self {
        Self {
            path: PathBuf::from(&config.analyzer_manager_path),
            credentials: config.credentials.clone(),
            log_dir: config.log_dir(),
            timeout: config.timeout(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 실행할 명령을 구성합니다.
    fn command(&self, invocation: &EngineInvocation) -> Command {
        let mut cmd = Command::new(&self.path);
        cmd.arg(invocation.scan_type.command())
            .arg(&invocation.config_path);
        if let Some(id) = &invocation.multi_scan_id {
            cmd.arg(id);
        }

        if let Some(dir) = self.path.parent().filter(|_| self.path.is_absolute()) {
            cmd.current_dir(dir);
        }

        for (key, value) in self.environment() {
            cmd.env(key, value);
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// 자식 프로세스에만 설정되는 환경 변수 (빈 값은 제외)
    fn environment(&self) -> Vec<(&'static str, String)> {
        let log_dir = self
            .log_dir
            .as_ref()
            .map(|d| d.display().to_string())
            .unwrap_or_default();
        [
            ("JF_USER", self.credentials.user.clone()),
            ("JF_PASS", self.credentials.password.clone()),
            ("JF_TOKEN", self.credentials.access_token.clone()),
            ("JF_PLATFORM_URL", self.credentials.url.clone()),
            ("AM_LOG_DIRECTORY", log_dir),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .collect()
    }
}

impl AnalyzerEngine for AnalyzerManager {
    async fn execute(&self, invocation: &EngineInvocation) -> Result<i32, JasError> {
        let scan_type = invocation.scan_type;
        debug!(
            engine = %self.path.display(),
            command = scan_type.command(),
            config = %invocation.config_path.display(),
            "launching analyzer engine"
        );

        let child = self
            .command(invocation)
            .spawn()
            .map_err(|e| JasError::EngineLaunch {
                scan_type,
                path: self.path.display().to_string(),
                source: e,
            })?;

        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(%scan_type, timeout_secs = limit.as_secs(), "analyzer engine timed out");
                    return Err(JasError::EngineExecution {
                        scan_type,
                        exit_code: None,
                        reason: format!("timed out after {}s", limit.as_secs()),
                    });
                }
            },
            None => child.wait_with_output().await,
        }
        .map_err(|e| JasError::EngineExecution {
            scan_type,
            exit_code: None,
            reason: e.to_string(),
        })?;

        let code = output.status.code().ok_or_else(|| JasError::EngineExecution {
            scan_type,
            exit_code: None,
            reason: "terminated by signal".to_owned(),
        })?;

        if code != 0 {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!(%scan_type, code, stderr = %stderr.trim(), "analyzer engine exited with non-zero code");
        }
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::ffi::OsStr;

    fn manager(path: &str) -> AnalyzerManager {
        let config = JasScannerConfig {
            analyzer_manager_path: path.to_owned(),
            log_dir: "/var/log/am".to_owned(),
            credentials: EngineCredentials {
                url: "https://scan.example.com".to_owned(),
                user: "ci".to_owned(),
                access_token: "token".to_owned(),
                ..EngineCredentials::default()
            },
            ..JasScannerConfig::default()
        };
        AnalyzerManager::new(&config)
    }

    fn invocation(scan_type: JasScanType) -> EngineInvocation {
        EngineInvocation {
            scan_type,
            config_path: PathBuf::from("/tmp/session/config.yaml"),
            multi_scan_id: Some("msi-7".to_owned()),
        }
    }

    #[test]
    fn exit_codes_are_classified() {
        assert_eq!(ExecStatus::from_code(0), ExecStatus::Success);
        assert_eq!(ExecStatus::from_code(31), ExecStatus::NotEntitled);
        assert_eq!(ExecStatus::from_code(13), ExecStatus::UnsupportedCommand);
        assert_eq!(ExecStatus::from_code(55), ExecStatus::UnsupportedOs);
        assert_eq!(ExecStatus::from_code(1), ExecStatus::Failed(1));
        assert!(ExecStatus::from_code(31).is_soft_skip());
        assert!(!ExecStatus::from_code(2).is_soft_skip());
    }

    #[test]
    fn command_arguments_and_working_dir() {
        let am = manager("/opt/am/analyzerManager");
        let cmd = am.command(&invocation(JasScanType::Sast));
        let std_cmd = cmd.as_std();
        let args: Vec<&OsStr> = std_cmd.get_args().collect();
        assert_eq!(
            args,
            vec![
                OsStr::new("zd"),
                OsStr::new("/tmp/session/config.yaml"),
                OsStr::new("msi-7"),
            ]
        );
        assert_eq!(std_cmd.get_current_dir(), Some(Path::new("/opt/am")));
    }

    #[test]
    fn environment_skips_empty_values() {
        let env = manager("/opt/am/analyzerManager").environment();
        let keys: Vec<&str> = env.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["JF_USER", "JF_TOKEN", "JF_PLATFORM_URL", "AM_LOG_DIRECTORY"]);
    }

    #[tokio::test]
    async fn missing_executable_is_launch_error() {
        let am = manager("/nonexistent/analyzerManager");
        let err = am.execute(&invocation(JasScanType::Secrets)).await.unwrap_err();
        assert!(matches!(
            err,
            JasError::EngineLaunch { scan_type: JasScanType::Secrets, .. }
        ));
        assert!(err.to_string().starts_with("Secrets scan failed to launch"));
        assert!(err.is_fatal());
    }

    #[cfg(unix)]
    fn script(dir: &Path, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("analyzerManager");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.display().to_string()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn reserved_exit_code_is_returned() {
        let dir = tempfile::tempdir().unwrap();
        let am = manager(&script(dir.path(), "exit 31"));
        let code = am.execute(&invocation(JasScanType::Iac)).await.unwrap();
        assert_eq!(ExecStatus::from_code(code), ExecStatus::NotEntitled);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn deadline_expiry_is_execution_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut am = manager(&script(dir.path(), "sleep 5"));
        am.timeout = Some(Duration::from_millis(200));
        let err = am.execute(&invocation(JasScanType::Iac)).await.unwrap_err();
        assert!(matches!(
            err,
            JasError::EngineExecution { exit_code: None, .. }
        ));
    }
}
