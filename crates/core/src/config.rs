//! 설정 관리: depaudit.toml 파싱 및 런타임 설정
//!
//! [`DepauditConfig`]는 모든 크레이트의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`DEPAUDIT_JAS_TIMEOUT_SECS=600` 형식)
//! 3. 설정 파일 (`depaudit.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), depaudit_core::error::DepauditError> {
//! use depaudit_core::config::DepauditConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = DepauditConfig::load("depaudit.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = DepauditConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, DepauditError};

/// 분석 엔진 타임아웃 상한 (초)
const MAX_ENGINE_TIMEOUT_SECS: u64 = 86_400;

/// 바이너리 스캔 워커 수 상한
const MAX_SCAN_THREADS: usize = 256;

/// depaudit 통합 설정
///
/// `depaudit.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DepauditConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 플랫폼 접속 정보
    #[serde(default)]
    pub server: ServerConfig,
    /// JAS 스캐너 설정
    #[serde(default)]
    pub jas: JasConfig,
    /// 바이너리 스캔 설정
    #[serde(default)]
    pub binary_scan: BinaryScanConfig,
}

impl DepauditConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, DepauditError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, DepauditError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DepauditError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                DepauditError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, DepauditError> {
        toml::from_str(toml_str).map_err(|e| {
            DepauditError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `DEPAUDIT_{SECTION}_{FIELD}`
    /// 예: `DEPAUDIT_BINARY_SCAN_THREADS=8`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "DEPAUDIT_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "DEPAUDIT_GENERAL_LOG_FORMAT");

        // Server
        override_string(&mut self.server.url, "DEPAUDIT_SERVER_URL");
        override_string(&mut self.server.user, "DEPAUDIT_SERVER_USER");
        override_string(&mut self.server.password, "DEPAUDIT_SERVER_PASSWORD");
        override_string(
            &mut self.server.access_token,
            "DEPAUDIT_SERVER_ACCESS_TOKEN",
        );

        // JAS
        override_bool(&mut self.jas.enabled, "DEPAUDIT_JAS_ENABLED");
        override_string(
            &mut self.jas.analyzer_manager_path,
            "DEPAUDIT_JAS_ANALYZER_MANAGER_PATH",
        );
        override_string(&mut self.jas.log_dir, "DEPAUDIT_JAS_LOG_DIR");
        override_u64(&mut self.jas.timeout_secs, "DEPAUDIT_JAS_TIMEOUT_SECS");
        override_csv(&mut self.jas.working_dirs, "DEPAUDIT_JAS_WORKING_DIRS");
        override_string(&mut self.jas.apps_config, "DEPAUDIT_JAS_APPS_CONFIG");
        override_bool(
            &mut self.jas.third_party_applicability,
            "DEPAUDIT_JAS_THIRD_PARTY_APPLICABILITY",
        );

        // Binary scan
        override_string(
            &mut self.binary_scan.indexer_path,
            "DEPAUDIT_BINARY_SCAN_INDEXER_PATH",
        );
        override_usize(&mut self.binary_scan.threads, "DEPAUDIT_BINARY_SCAN_THREADS");
        override_bool(
            &mut self.binary_scan.recursive,
            "DEPAUDIT_BINARY_SCAN_RECURSIVE",
        );
        override_csv(
            &mut self.binary_scan.exclusions,
            "DEPAUDIT_BINARY_SCAN_EXCLUSIONS",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), DepauditError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if !self.server.access_token.is_empty() && !self.server.password.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "server.access_token".to_owned(),
                reason: "set either password or access_token, not both".to_owned(),
            }
            .into());
        }

        if self.jas.timeout_secs > MAX_ENGINE_TIMEOUT_SECS {
            return Err(ConfigError::InvalidValue {
                field: "jas.timeout_secs".to_owned(),
                reason: format!("must be 0 (no deadline) or at most {MAX_ENGINE_TIMEOUT_SECS}"),
            }
            .into());
        }

        if self.jas.working_dirs.iter().any(|d| d.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "jas.working_dirs".to_owned(),
                reason: "working directory must not be empty".to_owned(),
            }
            .into());
        }

        if self.binary_scan.threads > MAX_SCAN_THREADS {
            return Err(ConfigError::InvalidValue {
                field: "binary_scan.threads".to_owned(),
                reason: format!("must be at most {MAX_SCAN_THREADS}"),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 플랫폼 접속 정보
///
/// 분석 엔진 실행 시 환경변수로 전달됩니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 플랫폼 URL
    pub url: String,
    /// 사용자명
    pub user: String,
    /// 비밀번호
    pub password: String,
    /// 액세스 토큰
    pub access_token: String,
}

/// JAS 스캐너 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JasConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 분석 엔진 실행 파일 경로
    pub analyzer_manager_path: String,
    /// 분석 엔진 로그 디렉토리 (비어 있으면 전달하지 않음)
    pub log_dir: String,
    /// 엔진 1회 실행 제한 시간 (초). 0이면 제한 없음
    pub timeout_secs: u64,
    /// 스캔 대상 작업 디렉토리
    pub working_dirs: Vec<String>,
    /// 모듈 정의 YAML 파일 경로 (없으면 working_dirs 사용)
    pub apps_config: String,
    /// 모든 의존성 대상 applicability 스캔 여부
    pub third_party_applicability: bool,
}

impl Default for JasConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            analyzer_manager_path: String::new(),
            log_dir: String::new(),
            timeout_secs: 0,
            working_dirs: vec![".".to_owned()],
            apps_config: ".depaudit/apps-config.yml".to_owned(),
            third_party_applicability: false,
        }
    }
}

/// 바이너리 스캔 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BinaryScanConfig {
    /// 인덱서 실행 파일 경로
    pub indexer_path: String,
    /// 스테이지별 워커 수
    pub threads: usize,
    /// 하위 디렉토리 재귀 탐색 여부
    pub recursive: bool,
    /// 제외 패턴
    pub exclusions: Vec<String>,
}

impl Default for BinaryScanConfig {
    fn default() -> Self {
        Self {
            indexer_path: String::new(),
            threads: 3,
            recursive: true,
            exclusions: Vec::new(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val.split(',').map(|s| s.trim().to_owned()).collect();
    }
}
