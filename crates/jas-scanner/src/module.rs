//! 스캔 모듈 정의
//!
//! 모듈은 스캔 대상 디렉토리 하나와 그에 딸린 제외 규칙입니다. 세션 시작 전에 한 번 만들어지며
//! 세션 동안 바뀌지 않습니다.
//!
//! 모듈은 앱 설정 YAML 파일에서 읽거나, 파일이 없으면 작업 디렉토리마다 하나씩 만듭니다.
//!
//! ```yaml
//! version: "1.0"
//! modules:
//!   - name: storefront
//!     source_root: services/storefront
//!     exclude_patterns: ["**/dist/**"]
//!     exclude_scanners: [iac]
//!     scanners:
//!       secrets:
//!         working_dirs: [config]
//!       sast:
//!         language: javascript
//!         excluded_rules: [js-insecure-random]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::JasError;
use crate::types::JasScanType;

/// 모듈·스캐너 모두 제외 패턴이 없을 때 적용되는 기본값
pub const DEFAULT_EXCLUDE_PATTERNS: [&str; 5] = [
    "**/.git/**",
    "**/*test*/**",
    VIRTUAL_ENV_PATTERN,
    NODE_MODULES_PATTERN,
    "**/target/**",
];

/// node_modules 제외 패턴
pub const NODE_MODULES_PATTERN: &str = "**/*node_modules*/**";

/// 가상환경 제외 패턴
pub const VIRTUAL_ENV_PATTERN: &str = "**/*venv*/**";

/// 스캐너별 재정의
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerSettings {
    /// 모듈 루트 기준 하위 디렉토리 (비어 있으면 루트 전체)
    pub working_dirs: Vec<String>,
    /// 모듈 패턴에 추가되는 제외 패턴
    pub exclude_patterns: Vec<String>,
}

/// SAST 스캐너 재정의
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SastSettings {
    #[serde(flatten)]
    pub common: ScannerSettings,
    pub language: Option<String>,
    pub excluded_rules: Vec<String>,
}

/// 모듈별 스캐너 재정의 묶음
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerOverrides {
    pub secrets: Option<ScannerSettings>,
    pub iac: Option<ScannerSettings>,
    pub sast: Option<SastSettings>,
}

/// 스캔 모듈
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Module {
    pub name: Option<String>,
    /// 모듈 루트 (절대 경로로 해석됨)
    pub source_root: PathBuf,
    pub exclude_patterns: Vec<String>,
    /// 건너뛸 스캐너 키 (`applicability`, `secrets`, `iac`, `sast`)
    pub exclude_scanners: Vec<String>,
    pub scanners: ScannerOverrides,
}

impl Module {
    /// 루트 디렉토리만 지정된 모듈을 만듭니다.
    pub fn new(source_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            ..Self::default()
        }
    }

    /// 로그에 쓸 모듈 이름 (이름이 없으면 루트 경로)
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.source_root.display().to_string())
    }

    /// 이 모듈에서 해당 스캐너를 건너뛰어야 하는지 확인합니다.
    pub fn should_skip(&self, scan_type: JasScanType) -> bool {
        self.exclude_scanners
            .iter()
            .any(|s| JasScanType::from_str_loose(s) == Some(scan_type))
    }

    /// 스캐너별 공통 재정의 (적용 가능성 스캐너는 재정의가 없음)
    pub fn scanner_settings(&self, scan_type: JasScanType) -> Option<&ScannerSettings> {
        match scan_type {
            JasScanType::Applicability => None,
            JasScanType::Secrets => self.scanners.secrets.as_ref(),
            JasScanType::Iac => self.scanners.iac.as_ref(),
            JasScanType::Sast => self.scanners.sast.as_ref().map(|s| &s.common),
        }
    }

    /// 엔진에 넘길 스캔 루트 목록
    pub fn source_roots(&self, scan_type: JasScanType) -> Vec<PathBuf> {
        match self.scanner_settings(scan_type) {
            Some(settings) if !settings.working_dirs.is_empty() => settings
                .working_dirs
                .iter()
                .map(|dir| self.source_root.join(dir))
                .collect(),
            _ => vec![self.source_root.clone()],
        }
    }

    /// 모듈 패턴과 스캐너 패턴을 합친 제외 목록 (둘 다 없으면 기본값)
    pub fn exclude_patterns(&self, scan_type: JasScanType) -> Vec<String> {
        let mut patterns = self.exclude_patterns.clone();
        if let Some(settings) = self.scanner_settings(scan_type) {
            patterns.extend(settings.exclude_patterns.iter().cloned());
        }
        if patterns.is_empty() {
            return DEFAULT_EXCLUDE_PATTERNS.iter().map(|p| (*p).to_owned()).collect();
        }
        patterns
    }

    /// 상대 루트를 `base` 기준 절대 경로로 바꿉니다.
    fn resolve_root(mut self, base: &Path) -> Self {
        self.source_root = base.join(&self.source_root);
        self
    }
}

/// 앱 설정 파일
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppsConfig {
    pub version: Option<String>,
    pub modules: Vec<Module>,
}

impl AppsConfig {
    /// 파일이 있으면 읽고, 없으면 `None`을 반환합니다.
    ///
    /// # Errors
    ///
    /// - `JasError::Io`: 파일을 읽을 수 없음
    /// - `JasError::Config`: YAML 형식 오류
    pub async fn load_if_exists(path: impl AsRef<Path>) -> Result<Option<Self>, JasError> {
        let path = path.as_ref();
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(JasError::Io {
                    path: path.display().to_string(),
                    source: e,
                });
            }
        };
        Self::parse(&content).map(Some)
    }

    /// YAML 문자열을 파싱합니다.
    pub fn parse(content: &str) -> Result<Self, JasError> {
        let config: Self = serde_yaml::from_str(content).map_err(|e| JasError::Config {
            field: "apps_config".to_owned(),
            reason: e.to_string(),
        })?;
        if config.modules.is_empty() {
            return Err(JasError::Config {
                field: "apps_config".to_owned(),
                reason: "at least one module must be defined".to_owned(),
            });
        }
        Ok(config)
    }
}

/// 작업 디렉토리마다 모듈 하나를 만듭니다. 비어 있으면 `base` 자체가 모듈입니다.
pub fn modules_from_working_dirs(working_dirs: &[String], base: &Path) -> Vec<Module> {
    if working_dirs.is_empty() {
        return vec![Module::new(base)];
    }
    working_dirs
        .iter()
        .map(|dir| Module::new(dir.as_str()).resolve_root(base))
        .collect()
}

/// 앱 설정 파일 또는 작업 디렉토리로부터 모듈 목록을 만듭니다.
///
/// 상대 경로는 `base` 기준으로 해석합니다.
pub async fn load_modules(
    apps_config: impl AsRef<Path>,
    working_dirs: &[String],
    base: &Path,
) -> Result<Vec<Module>, JasError> {
    let apps_path = base.join(apps_config.as_ref());
    match AppsConfig::load_if_exists(&apps_path).await? {
        Some(config) => {
            info!(
                path = %apps_path.display(),
                modules = config.modules.len(),
                "modules loaded from apps config"
            );
            Ok(config
                .modules
                .into_iter()
                .map(|m| m.resolve_root(base))
                .collect())
        }
        None => {
            debug!(path = %apps_path.display(), "no apps config, using working directories");
            Ok(modules_from_working_dirs(working_dirs, base))
        }
    }
}
