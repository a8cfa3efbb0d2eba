//! JAS 스캐너 설정
//!
//! [`JasScannerConfig`]는 core의 [`JasConfig`](depaudit_core::config::JasConfig)와
//! [`ServerConfig`](depaudit_core::config::ServerConfig)를 합쳐 세션 실행에 필요한 값을 제공합니다.
//!
//! # 사용 예시
//! ```ignore
//! use depaudit_core::config::DepauditConfig;
//! use depaudit_jas::config::JasScannerConfig;
//!
//! let core_config = DepauditConfig::default();
//! let config = JasScannerConfig::from_core(&core_config.jas, &core_config.server);
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use depaudit_core::config::{JasConfig, ServerConfig};

use crate::error::JasError;

/// 엔진 실행 제한 시간 상한 (초)
const MAX_TIMEOUT_SECS: u64 = 86_400;

/// 엔진 프로세스에 전달할 접속 정보
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineCredentials {
    pub url: String,
    pub user: String,
    pub password: String,
    pub access_token: String,
}

impl From<&ServerConfig> for EngineCredentials {
    fn from(server: &ServerConfig) -> Self {
        Self {
            url: server.url.clone(),
            user: server.user.clone(),
            password: server.password.clone(),
            access_token: server.access_token.clone(),
        }
    }
}

/// JAS 스캐너 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JasScannerConfig {
    /// 분석 엔진 실행 파일 경로
    pub analyzer_manager_path: String,
    /// 엔진 로그 디렉토리 (비어 있으면 전달하지 않음)
    pub log_dir: String,
    /// 엔진 1회 실행 제한 시간 (초, 0 = 무제한)
    pub timeout_secs: u64,
    /// 앱 설정 파일이 없을 때 모듈로 사용할 작업 디렉토리
    pub working_dirs: Vec<String>,
    /// 모듈 정의 YAML 경로
    pub apps_config: String,
    /// 전체 의존성 대상 적용 가능성 스캔
    pub third_party_applicability: bool,
    /// 여러 스캔을 하나로 묶는 ID (엔진의 추가 위치 인자)
    pub multi_scan_id: Option<String>,
    /// 접속 정보
    pub credentials: EngineCredentials,
}

impl Default for JasScannerConfig {
    fn default() -> Self {
        Self {
            analyzer_manager_path: String::new(),
            log_dir: String::new(),
            timeout_secs: 0,
            working_dirs: vec![".".to_owned()],
            apps_config: ".depaudit/apps-config.yml".to_owned(),
            third_party_applicability: false,
            multi_scan_id: None,
            credentials: EngineCredentials::default(),
        }
    }
}

impl JasScannerConfig {
    /// core 설정에서 스캐너 설정을 생성합니다.
    pub fn from_core(jas: &JasConfig, server: &ServerConfig) -> Self {
        Self {
            analyzer_manager_path: jas.analyzer_manager_path.clone(),
            log_dir: jas.log_dir.clone(),
            timeout_secs: jas.timeout_secs,
            working_dirs: jas.working_dirs.clone(),
            apps_config: jas.apps_config.clone(),
            third_party_applicability: jas.third_party_applicability,
            multi_scan_id: None,
            credentials: EngineCredentials::from(server),
        }
    }

    /// 제한 시간 (0이면 None)
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// 로그 디렉토리 (비어 있으면 None)
    pub fn log_dir(&self) -> Option<PathBuf> {
        (!self.log_dir.is_empty()).then(|| PathBuf::from(&self.log_dir))
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), JasError> {
        if self.analyzer_manager_path.is_empty() {
            return Err(JasError::Config {
                field: "analyzer_manager_path".to_owned(),
                reason: "analyzer engine path must be set".to_owned(),
            });
        }

        if self.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(JasError::Config {
                field: "timeout_secs".to_owned(),
                reason: format!("must be 0-{MAX_TIMEOUT_SECS}"),
            });
        }

        if self.working_dirs.iter().any(|d| d.trim().is_empty()) {
            return Err(JasError::Config {
                field: "working_dirs".to_owned(),
                reason: "working directories must not be empty".to_owned(),
            });
        }

        if !self.credentials.password.is_empty() && !self.credentials.access_token.is_empty() {
            return Err(JasError::Config {
                field: "credentials".to_owned(),
                reason: "password and access_token are mutually exclusive".to_owned(),
            });
        }

        Ok(())
    }
}

/// JAS 스캐너 설정 빌더
#[derive(Default)]
pub struct JasScannerConfigBuilder {
    config: JasScannerConfig,
}

impl JasScannerConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn analyzer_manager_path(mut self, path: impl Into<String>) -> Self {
        self.config.analyzer_manager_path = path.into();
        self
    }

    pub fn log_dir(mut self, dir: impl Into<String>) -> Self {
        self.config.log_dir = dir.into();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    pub fn working_dirs(mut self, dirs: Vec<String>) -> Self {
        self.config.working_dirs = dirs;
        self
    }

    pub fn apps_config(mut self, path: impl Into<String>) -> Self {
        self.config.apps_config = path.into();
        self
    }

    pub fn third_party_applicability(mut self, enabled: bool) -> Self {
        self.config.third_party_applicability = enabled;
        self
    }

    pub fn multi_scan_id(mut self, id: impl Into<String>) -> Self {
        self.config.multi_scan_id = Some(id.into());
        self
    }

    pub fn credentials(mut self, credentials: EngineCredentials) -> Self {
        self.config.credentials = credentials;
        self
    }

    /// 설정을 검증하고 반환합니다.
    pub fn build(self) -> Result<JasScannerConfig, JasError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_requires_engine_path() {
        let err = JasScannerConfig::default().validate().unwrap_err();
        assert!(err.to_string().contains("analyzer_manager_path"));
    }

    #[test]
    fn from_core_copies_values() {
        let jas = JasConfig {
            analyzer_manager_path: "/opt/am/analyzerManager".to_owned(),
            timeout_secs: 120,
            third_party_applicability: true,
            ..JasConfig::default()
        };
        let server = ServerConfig {
            url: "https://scan.example.com".to_owned(),
            user: "ci".to_owned(),
            ..ServerConfig::default()
        };
        let config = JasScannerConfig::from_core(&jas, &server);
        assert_eq!(config.analyzer_manager_path, "/opt/am/analyzerManager");
        assert_eq!(config.timeout(), Some(Duration::from_secs(120)));
        assert!(config.third_party_applicability);
        assert_eq!(config.credentials.user, "ci");
        config.validate().unwrap();
    }

    #[test]
    fn zero_timeout_means_unbounded() {
        let config = JasScannerConfig::default();
        assert!(config.timeout().is_none());
        assert!(config.log_dir().is_none());
    }

    #[test]
    fn builder_rejects_excessive_timeout() {
        let result = JasScannerConfigBuilder::new()
            .analyzer_manager_path("/opt/am/analyzerManager")
            .timeout_secs(MAX_TIMEOUT_SECS + 1)
            .build();
        assert!(matches!(result, Err(JasError::Config { ref field, .. }) if field == "timeout_secs"));
    }

    #[test]
    fn builder_rejects_password_with_token() {
        let result = JasScannerConfigBuilder::new()
            .analyzer_manager_path("/opt/am/analyzerManager")
            .credentials(EngineCredentials {
                password: "secret".to_owned(),
                access_token: "token".to_owned(),
                ..EngineCredentials::default()
            })
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn builder_all_setters() {
        let config = JasScannerConfigBuilder::new()
            .analyzer_manager_path("/opt/am/analyzerManager")
            .log_dir("/var/log/am")
            .timeout_secs(30)
            .working_dirs(vec!["api".to_owned(), "web".to_owned()])
            .apps_config("apps.yml")
            .third_party_applicability(true)
            .multi_scan_id("msi-1")
            .build()
            .unwrap();
        assert_eq!(config.working_dirs.len(), 2);
        assert_eq!(config.log_dir(), Some(PathBuf::from("/var/log/am")));
        assert_eq!(config.multi_scan_id.as_deref(), Some("msi-1"));
    }
}
