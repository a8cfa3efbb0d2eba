//! SARIF 결과 파일 수집
//!
//! 분석 엔진이 쓴 SARIF 파일에서 필요한 필드만 읽습니다.
//! 억제(suppression) 항목이 하나라도 있는 결과는 읽는 시점에 제거됩니다.
//!
//! 사용하는 필드: `ruleId`, `level`, `kind`, `message.text`,
//! `locations[0].physicalLocation.{artifactLocation.uri, region.{startLine, startColumn, snippet.text}}`,
//! `suppressions`, `codeFlows`

use std::path::Path;

use serde::{Deserialize, Serialize};

use depaudit_core::types::Severity;

use crate::error::JasError;
use crate::types::{CodeFlow, FindingLocation, JasScanType};

/// SARIF 최상위 객체
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifLog {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub runs: Vec<SarifRun>,
}

/// 분석 실행 하나
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifRun {
    #[serde(default)]
    pub results: Vec<SarifResult>,
}

/// 발견 항목
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifResult {
    #[serde(default)]
    pub rule_id: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    /// 적용 가능성 스캐너의 판정 (`pass`이면 적용 불가)
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub message: SarifMessage,
    #[serde(default)]
    pub locations: Vec<SarifLocation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub code_flows: Vec<SarifCodeFlow>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suppressions: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SarifMessage {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifLocation {
    #[serde(default)]
    pub physical_location: Option<SarifPhysicalLocation>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifPhysicalLocation {
    #[serde(default)]
    pub artifact_location: SarifArtifactLocation,
    #[serde(default)]
    pub region: Option<SarifRegion>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SarifArtifactLocation {
    #[serde(default)]
    pub uri: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifRegion {
    #[serde(default)]
    pub start_line: Option<usize>,
    #[serde(default)]
    pub start_column: Option<usize>,
    #[serde(default)]
    pub snippet: Option<SarifSnippet>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SarifSnippet {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifCodeFlow {
    #[serde(default)]
    pub thread_flows: Vec<SarifThreadFlow>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SarifThreadFlow {
    #[serde(default)]
    pub locations: Vec<SarifThreadFlowLocation>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SarifThreadFlowLocation {
    #[serde(default)]
    pub location: SarifLocation,
}

impl SarifResult {
    pub fn rule_id(&self) -> &str {
        self.rule_id.as_deref().unwrap_or_default()
    }

    pub fn message_text(&self) -> &str {
        self.message.text.as_deref().unwrap_or_default()
    }

    pub fn is_suppressed(&self) -> bool {
        !self.suppressions.is_empty()
    }

    pub fn severity(&self) -> Severity {
        level_to_severity(self.level.as_deref().unwrap_or_default())
    }

    /// 첫 번째 위치 (없으면 기본값)
    pub fn primary_location(&self, source_root: &str) -> FindingLocation {
        self.locations
            .first()
            .map(|l| l.to_finding_location(source_root))
            .unwrap_or_default()
    }

    /// 물리 위치가 있는 모든 위치
    pub fn all_locations(&self, source_root: &str) -> Vec<FindingLocation> {
        self.locations
            .iter()
            .filter(|l| l.physical_location.is_some())
            .map(|l| l.to_finding_location(source_root))
            .collect()
    }

    /// 코드 흐름을 위치 목록으로 변환합니다. 스레드 흐름 하나가 코드 흐름 하나가 됩니다.
    pub fn code_flows(&self, source_root: &str) -> Vec<CodeFlow> {
        self.code_flows
            .iter()
            .flat_map(|flow| flow.thread_flows.iter())
            .map(|thread| {
                thread
                    .locations
                    .iter()
                    .map(|l| l.location.to_finding_location(source_root))
                    .collect()
            })
            .collect()
    }
}

impl SarifLocation {
    fn to_finding_location(&self, source_root: &str) -> FindingLocation {
        let Some(physical) = &self.physical_location else {
            return FindingLocation::default();
        };
        let region = physical.region.clone().unwrap_or_default();
        FindingLocation {
            file: relative_path(&physical.artifact_location.uri, source_root),
            start_line: region.start_line.unwrap_or_default(),
            start_column: region.start_column.unwrap_or_default(),
            snippet: region
                .snippet
                .and_then(|s| s.text)
                .unwrap_or_default(),
        }
    }
}

/// SARIF `level`을 심각도로 바꿉니다.
pub fn level_to_severity(level: &str) -> Severity {
    match level.to_lowercase().as_str() {
        "error" => Severity::High,
        "note" => Severity::Low,
        "none" => Severity::Unknown,
        _ => Severity::Medium,
    }
}

/// 파일 URI를 모듈 루트 기준 상대 경로로 줄입니다.
pub fn relative_path(uri: &str, source_root: &str) -> String {
    let path = uri
        .strip_prefix("file:///private")
        .or_else(|| uri.strip_prefix("file://"))
        .unwrap_or(uri);
    let path = match Path::new(path).strip_prefix(source_root) {
        Ok(relative) if !source_root.is_empty() => relative.to_string_lossy().into_owned(),
        _ => path.to_owned(),
    };
    path.trim_start_matches(['/', '\\']).to_owned()
}

/// SARIF 파일을 읽어 실행 목록을 반환합니다.
///
/// 실행이 없는 파일은 빈 목록입니다. 억제된 결과는 제거됩니다.
///
/// # Errors
///
/// 파일이 없거나 읽을 수 없거나 JSON 형식이 아니면 `JasError::Parse`를 반환합니다.
pub async fn read_runs(path: &Path, scan_type: JasScanType) -> Result<Vec<SarifRun>, JasError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| JasError::Parse {
            scan_type,
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
    parse_runs(&content).map_err(|reason| JasError::Parse {
        scan_type,
        path: path.display().to_string(),
        reason,
    })
}

/// SARIF 문자열을 파싱하고 억제된 결과를 제거합니다.
pub fn parse_runs(content: &str) -> Result<Vec<SarifRun>, String> {
    let log: SarifLog = serde_json::from_str(content).map_err(|e| e.to_string())?;
    Ok(log
        .runs
        .into_iter()
        .map(|mut run| {
            run.results.retain(|r| !r.is_suppressed());
            run
        })
        .collect())
}
