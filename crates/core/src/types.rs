//! 도메인 타입: 시스템 전역에서 사용되는 공통 타입
//!
//! 심각도, 패키지 기술(생태계) 등 모든 크레이트가 공유하는 값 타입을 정의합니다.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 심각도 레벨
///
/// `Ord` 구현으로 심각도 비교가 가능합니다 (`Unknown < Low < Medium < High < Critical`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Severity {
    /// 판정 불가
    #[default]
    Unknown,
    /// 낮은 심각도
    Low,
    /// 중간 심각도
    Medium,
    /// 높은 심각도
    High,
    /// 치명적
    Critical,
}

impl Severity {
    /// 문자열에서 심각도를 파싱합니다.
    ///
    /// 대소문자를 구분하지 않습니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "unknown" | "none" => Some(Self::Unknown),
            "low" => Some(Self::Low),
            "medium" | "med" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" | "crit" => Some(Self::Critical),
            _ => None,
        }
    }

    /// 심각도별 대표 점수를 반환합니다 (CVSS 구간 상한).
    pub fn score(&self) -> f32 {
        match self {
            Self::Unknown => 0.0,
            Self::Low => 3.9,
            Self::Medium => 6.9,
            Self::High => 8.9,
            Self::Critical => 10.0,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "Unknown"),
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
            Self::Critical => write!(f, "Critical"),
        }
    }
}

/// 패키지 기술 (빌드 도구 / 패키지 관리자)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Technology {
    Maven,
    Gradle,
    Npm,
    Yarn,
    Go,
    Pip,
    Pipenv,
    Poetry,
    Nuget,
    Dotnet,
}

impl Technology {
    /// 컴포넌트 ID에 붙는 패키지 타입 접두사를 반환합니다.
    ///
    /// 예: Npm -> "npm://", Maven -> "gav://"
    pub fn package_type_prefix(&self) -> &'static str {
        match self {
            Self::Maven | Self::Gradle => "gav://",
            Self::Npm | Self::Yarn => "npm://",
            Self::Go => "go://",
            Self::Pip | Self::Pipenv | Self::Poetry => "pypi://",
            Self::Nuget | Self::Dotnet => "nuget://",
        }
    }

    /// 문자열에서 기술을 파싱합니다 (대소문자 구분 없음).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "maven" | "mvn" => Some(Self::Maven),
            "gradle" => Some(Self::Gradle),
            "npm" => Some(Self::Npm),
            "yarn" => Some(Self::Yarn),
            "go" | "golang" => Some(Self::Go),
            "pip" => Some(Self::Pip),
            "pipenv" => Some(Self::Pipenv),
            "poetry" => Some(Self::Poetry),
            "nuget" => Some(Self::Nuget),
            "dotnet" | ".net" => Some(Self::Dotnet),
            _ => None,
        }
    }
}

impl fmt::Display for Technology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Maven => "maven",
            Self::Gradle => "gradle",
            Self::Npm => "npm",
            Self::Yarn => "yarn",
            Self::Go => "go",
            Self::Pip => "pip",
            Self::Pipenv => "pipenv",
            Self::Poetry => "poetry",
            Self::Nuget => "nuget",
            Self::Dotnet => "dotnet",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ordering() {
        assert!(Severity::Unknown < Severity::Low);
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn severity_default_is_unknown() {
        assert_eq!(Severity::default(), Severity::Unknown);
    }

    #[test]
    fn severity_from_str_loose() {
        assert_eq!(Severity::from_str_loose("HIGH"), Some(Severity::High));
        assert_eq!(Severity::from_str_loose("med"), Some(Severity::Medium));
        assert_eq!(Severity::from_str_loose("none"), Some(Severity::Unknown));
        assert_eq!(Severity::from_str_loose("urgent"), None);
    }

    #[test]
    fn severity_scores_follow_ordering() {
        assert_eq!(Severity::Low.score(), 3.9);
        assert_eq!(Severity::Medium.score(), 6.9);
        assert_eq!(Severity::High.score(), 8.9);
        assert_eq!(Severity::Critical.score(), 10.0);
    }

    #[test]
    fn technology_prefixes() {
        assert_eq!(Technology::Npm.package_type_prefix(), "npm://");
        assert_eq!(Technology::Yarn.package_type_prefix(), "npm://");
        assert_eq!(Technology::Gradle.package_type_prefix(), "gav://");
        assert_eq!(Technology::Poetry.package_type_prefix(), "pypi://");
    }

    #[test]
    fn technology_from_str_loose_and_display() {
        for tech in [Technology::Maven, Technology::Go, Technology::Nuget] {
            assert_eq!(Technology::from_str_loose(&tech.to_string()), Some(tech));
        }
        assert_eq!(Technology::from_str_loose("mvn"), Some(Technology::Maven));
        assert_eq!(Technology::from_str_loose("cargo"), None);
    }

    #[test]
    fn technology_serializes_lowercase() {
        let json = serde_json::to_string(&Technology::Pipenv).unwrap();
        assert_eq!(json, "\"pipenv\"");
    }
}
