//! JAS 도메인 타입
//!
//! 스캐너 종류, 적용 가능성 상태, 소스 코드 발견 항목을 정의합니다.

use std::fmt;

use serde::{Deserialize, Serialize};

use depaudit_core::types::Severity;

/// JAS 스캐너 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JasScanType {
    Applicability,
    Secrets,
    Iac,
    Sast,
}

impl JasScanType {
    /// 실행 순서대로 정렬된 전체 목록
    pub const ALL: [JasScanType; 4] = [
        JasScanType::Applicability,
        JasScanType::Secrets,
        JasScanType::Iac,
        JasScanType::Sast,
    ];

    /// 분석 엔진 서브커맨드
    pub fn command(&self) -> &'static str {
        match self {
            Self::Applicability => "ca",
            Self::Secrets => "sec",
            Self::Iac => "iac",
            Self::Sast => "zd",
        }
    }

    /// 엔진 설정 파일의 `type` 값
    pub fn config_type(&self) -> &'static str {
        match self {
            Self::Applicability => "analyze-applicability",
            Self::Secrets => "secrets-scan",
            Self::Iac => "iac-scan-modules",
            Self::Sast => "sast",
        }
    }

    /// 모듈의 `exclude_scanners`와 메트릭 레이블에 쓰이는 소문자 이름
    pub fn key(&self) -> &'static str {
        match self {
            Self::Applicability => "applicability",
            Self::Secrets => "secrets",
            Self::Iac => "iac",
            Self::Sast => "sast",
        }
    }

    /// 문자열에서 스캐너 종류를 파싱합니다 (대소문자 구분 없음).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "applicability" | "contextual_analysis" | "ca" => Some(Self::Applicability),
            "secrets" | "secret" | "sec" => Some(Self::Secrets),
            "iac" => Some(Self::Iac),
            "sast" | "zd" => Some(Self::Sast),
            _ => None,
        }
    }
}

impl fmt::Display for JasScanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Applicability => "Applicability",
            Self::Secrets => "Secrets",
            Self::Iac => "IaC",
            Self::Sast => "Sast",
        };
        f.write_str(name)
    }
}

/// CVE 적용 가능성 상태
///
/// 여러 모듈의 결과를 합칠 때 `Applicable > NotApplicable > Undetermined` 순으로 우선합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ApplicabilityStatus {
    #[serde(rename = "Undetermined")]
    Undetermined,
    #[serde(rename = "Not Applicable")]
    NotApplicable,
    #[serde(rename = "Applicable")]
    Applicable,
}

impl ApplicabilityStatus {
    /// 두 상태 중 우선순위가 높은 쪽을 반환합니다.
    pub fn merge(self, other: Self) -> Self {
        self.max(other)
    }
}

impl fmt::Display for ApplicabilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Applicable => "Applicable",
            Self::NotApplicable => "Not Applicable",
            Self::Undetermined => "Undetermined",
        };
        f.write_str(name)
    }
}

/// 소스 파일 내 위치
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FindingLocation {
    /// 모듈 루트 기준 상대 경로
    pub file: String,
    pub start_line: usize,
    pub start_column: usize,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub snippet: String,
}

impl FindingLocation {
    /// `line:column` 형식 문자열
    pub fn line_column(&self) -> String {
        format!("{}:{}", self.start_line, self.start_column)
    }
}

/// 코드 흐름: 소스에서 싱크까지의 순서 있는 위치 목록
pub type CodeFlow = Vec<FindingLocation>;

/// 시크릿/IaC/SAST 발견 항목
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFinding {
    pub scan_type: JasScanType,
    pub severity: Severity,
    pub rule_id: String,
    pub message: String,
    pub location: FindingLocation,
    /// SAST 전용
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub code_flows: Vec<CodeFlow>,
}

/// CVE 하나의 적용 가능성 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CveApplicability {
    pub cve: String,
    pub status: ApplicabilityStatus,
    /// 적용 가능 판정 근거 위치
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<FindingLocation>,
}
