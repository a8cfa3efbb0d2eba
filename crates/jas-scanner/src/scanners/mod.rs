//! 스캐너 구현
//!
//! 네 스캐너는 [`ModuleScanner`] 하나의 계약을 공유합니다. 세션 드라이버는 스캐너 종류를
//! 모른 채 `configure → 엔진 실행 → ingest` 순서만 반복합니다.
//!
//! - [`ApplicabilityScanner`]: CVE 적용 가능성
//! - [`SecretsScanner`]: 하드코딩된 비밀 값 (스니펫 마스킹)
//! - [`IacScanner`]: IaC 설정 오류
//! - [`SastScanner`]: 정적 분석 (동일 위치 결과 병합)

mod applicability;
mod iac;
mod sast;
mod secrets;

pub use applicability::{APPLICABILITY_RULE_PREFIX, ApplicabilityScanner};
pub use iac::IacScanner;
pub use sast::SastScanner;
pub use secrets::{SecretsScanner, hide_secret};

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::module::Module;
use crate::sarif::SarifRun;
use crate::types::{JasScanType, SourceFinding};

/// 스캐너 공통 계약
pub trait ModuleScanner {
    fn scan_type(&self) -> JasScanType;

    /// 모듈 하나에 대한 엔진 설정을 만듭니다. `output`은 엔진이 SARIF를 쓸 경로입니다.
    fn configure(&self, module: &Module, output: &Path) -> ScanConfig;

    /// 모듈 하나의 SARIF 실행 결과를 누적합니다. 새로 추가된 항목 수를 반환합니다.
    fn ingest(&mut self, module: &Module, runs: Vec<SarifRun>) -> usize;
}

/// 엔진 설정 파일 최상위
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfigFile {
    pub scans: Vec<ScanConfig>,
}

/// 스캔 한 건의 엔진 설정
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ScanConfig {
    pub roots: Vec<String>,
    pub output: String,
    #[serde(rename = "type")]
    pub scan_type: String,
    #[serde(default)]
    pub skipped_folders: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grep_disable: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cve_whitelist: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indirect_cve_whitelist: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_rules: Vec<String>,
}

impl ScanConfig {
    /// 모듈의 루트와 제외 패턴으로 공통 필드를 채웁니다.
    pub fn for_module(scan_type: JasScanType, module: &Module, output: &Path) -> Self {
        Self {
            roots: module
                .source_roots(scan_type)
                .iter()
                .map(|root| root.display().to_string())
                .collect(),
            output: output.display().to_string(),
            scan_type: scan_type.config_type().to_owned(),
            skipped_folders: module.exclude_patterns(scan_type),
            ..Self::default()
        }
    }

    /// 설정 파일 하나로 감쌉니다.
    pub fn into_file(self) -> ScanConfigFile {
        ScanConfigFile { scans: vec![self] }
    }
}

/// 시크릿/IaC/SAST 공통 변환: 결과 하나를 발견 항목 하나로 바꿉니다.
pub(crate) fn source_findings(
    scan_type: JasScanType,
    module: &Module,
    runs: Vec<SarifRun>,
) -> Vec<SourceFinding> {
    let root = module.source_root.display().to_string();
    runs.into_iter()
        .flat_map(|run| run.results)
        .map(|result| SourceFinding {
            scan_type,
            severity: result.severity(),
            rule_id: result.rule_id().to_owned(),
            message: result.message_text().to_owned(),
            location: result.primary_location(&root),
            code_flows: result.code_flows(&root),
        })
        .collect()
}
