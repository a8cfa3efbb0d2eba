//! 스캔 서비스 응답 모델
//!
//! 취약점/정책 위반/라이선스 항목은 모두 `component-id -> Component` 맵을 가지며,
//! 각 [`Component`]의 `impact_paths`는 서비스가 비워서 보내고 로컬에서 채워집니다.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::types::Severity;

/// 영향 경로: 루트부터 해당 컴포넌트까지의 컴포넌트 ID 목록
pub type ImpactPath = Vec<String>;

/// 취약 컴포넌트 상세
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// 수정된 버전 목록
    #[serde(default)]
    pub fixed_versions: Vec<String>,
    /// CPE 식별자
    #[serde(default)]
    pub cpes: Vec<String>,
    /// 영향 경로 (추가만 가능)
    #[serde(default)]
    pub impact_paths: Vec<ImpactPath>,
}

/// CVE 정보
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cve {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cvss_v3_score: Option<String>,
}

/// 취약점 항목
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vulnerability {
    pub issue_id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub cves: Vec<Cve>,
    #[serde(default)]
    pub components: BTreeMap<String, Component>,
}

/// 정책 위반 항목
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub issue_id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub severity: Severity,
    /// 위반 종류 (security, license, operational_risk)
    #[serde(default)]
    pub violation_type: String,
    #[serde(default)]
    pub cves: Vec<Cve>,
    #[serde(default)]
    pub components: BTreeMap<String, Component>,
}

/// 라이선스 항목
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct License {
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub components: BTreeMap<String, Component>,
}

/// 스캔 서비스 응답
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanResponse {
    pub scan_id: String,
    #[serde(default)]
    pub vulnerabilities: Vec<Vulnerability>,
    #[serde(default)]
    pub violations: Vec<Violation>,
    #[serde(default)]
    pub licenses: Vec<License>,
}

impl ScanResponse {
    /// 응답에 등장하는 모든 컴포넌트 ID를 반환합니다.
    pub fn component_ids(&self) -> BTreeSet<String> {
        let vulns = self.vulnerabilities.iter().flat_map(|v| v.components.keys());
        let violations = self.violations.iter().flat_map(|v| v.components.keys());
        let licenses = self.licenses.iter().flat_map(|l| l.components.keys());
        vulns.chain(violations).chain(licenses).cloned().collect()
    }

    /// 모든 항목의 컴포넌트를 가변으로 순회합니다.
    pub fn components_mut(&mut self) -> impl Iterator<Item = (&String, &mut Component)> {
        let vulns = self
            .vulnerabilities
            .iter_mut()
            .flat_map(|v| v.components.iter_mut());
        let violations = self
            .violations
            .iter_mut()
            .flat_map(|v| v.components.iter_mut());
        let licenses = self
            .licenses
            .iter_mut()
            .flat_map(|l| l.components.iter_mut());
        vulns.chain(violations).chain(licenses)
    }

    /// 발견 항목이 하나도 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.vulnerabilities.is_empty() && self.violations.is_empty() && self.licenses.is_empty()
    }
}

/// 적용 가능성 스캔에 넘길 CVE 목록
///
/// 직접 의존성에서 유래한 CVE는 `direct`, 나머지는 `indirect`에 들어갑니다.
/// 한 CVE가 양쪽 조건을 모두 만족하면 `direct`에만 남습니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CveWhitelist {
    pub direct: BTreeSet<String>,
    pub indirect: BTreeSet<String>,
}

impl CveWhitelist {
    /// 스캔 응답들의 취약점/정책 위반에서 CVE를 분류합니다.
    ///
    /// `direct_ids`에 속한 컴포넌트를 하나라도 가진 항목의 CVE는 직접 CVE입니다.
    pub fn from_responses(responses: &[ScanResponse], direct_ids: &BTreeSet<String>) -> Self {
        let mut whitelist = Self::default();
        for response in responses {
            let vulns = response
                .vulnerabilities
                .iter()
                .map(|v| (&v.cves, &v.components));
            let violations = response
                .violations
                .iter()
                .map(|v| (&v.cves, &v.components));
            for (cves, components) in vulns.chain(violations) {
                let is_direct = components.keys().any(|id| direct_ids.contains(id));
                for cve in cves.iter().filter(|c| !c.id.is_empty()) {
                    if is_direct {
                        whitelist.direct.insert(cve.id.clone());
                    } else {
                        whitelist.indirect.insert(cve.id.clone());
                    }
                }
            }
        }
        let direct = &whitelist.direct;
        whitelist.indirect.retain(|id| !direct.contains(id));
        whitelist
    }

    /// 두 목록이 모두 비었는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.direct.is_empty() && self.indirect.is_empty()
    }

    /// 중복 없는 전체 CVE 수
    pub fn len(&self) -> usize {
        self.direct.len() + self.indirect.len()
    }

    pub fn contains(&self, cve: &str) -> bool {
        self.direct.contains(cve) || self.indirect.contains(cve)
    }

    /// 직접/간접 CVE를 모두 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.direct.iter().chain(self.indirect.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component_map(ids: &[&str]) -> BTreeMap<String, Component> {
        ids.iter()
            .map(|id| ((*id).to_owned(), Component::default()))
            .collect()
    }

    #[test]
    fn component_ids_cover_all_sections() {
        let response = ScanResponse {
            scan_id: "scan-1".to_owned(),
            vulnerabilities: vec![Vulnerability {
                issue_id: "XRAY-1".to_owned(),
                components: component_map(&["npm://a:1"]),
                ..Default::default()
            }],
            violations: vec![Violation {
                issue_id: "XRAY-2".to_owned(),
                components: component_map(&["npm://b:1", "npm://a:1"]),
                ..Default::default()
            }],
            licenses: vec![License {
                key: "MIT".to_owned(),
                components: component_map(&["npm://c:1"]),
                ..Default::default()
            }],
        };
        let ids: Vec<_> = response.component_ids().into_iter().collect();
        assert_eq!(ids, vec!["npm://a:1", "npm://b:1", "npm://c:1"]);
        assert!(!response.is_empty());
    }

    #[test]
    fn components_mut_visits_every_entry() {
        let mut response = ScanResponse {
            vulnerabilities: vec![Vulnerability {
                components: component_map(&["x", "y"]),
                ..Default::default()
            }],
            licenses: vec![License {
                components: component_map(&["z"]),
                ..Default::default()
            }],
            ..Default::default()
        };
        for (_, component) in response.components_mut() {
            component.fixed_versions.push("2.0.0".to_owned());
        }
        assert!(response.vulnerabilities[0]
            .components
            .values()
            .all(|c| c.fixed_versions == vec!["2.0.0"]));
        assert_eq!(response.licenses[0].components["z"].fixed_versions.len(), 1);
    }

    #[test]
    fn deserializes_with_missing_sections() {
        let response: ScanResponse = serde_json::from_str(r#"{"scan_id":"abc"}"#).unwrap();
        assert_eq!(response.scan_id, "abc");
        assert!(response.is_empty());
    }

    fn vuln(cve: &str, components: &[&str]) -> Vulnerability {
        Vulnerability {
            issue_id: format!("XRAY-{cve}"),
            cves: vec![Cve {
                id: cve.to_owned(),
                cvss_v3_score: None,
            }],
            components: component_map(components),
            ..Default::default()
        }
    }

    #[test]
    fn whitelist_splits_direct_and_indirect() {
        let response = ScanResponse {
            vulnerabilities: vec![
                vuln("CVE-2021-1", &["npm://direct:1"]),
                vuln("CVE-2021-2", &["npm://deep:1"]),
            ],
            ..Default::default()
        };
        let direct_ids = BTreeSet::from(["npm://direct:1".to_owned()]);
        let whitelist = CveWhitelist::from_responses(&[response], &direct_ids);
        assert!(whitelist.direct.contains("CVE-2021-1"));
        assert!(whitelist.indirect.contains("CVE-2021-2"));
        assert_eq!(whitelist.len(), 2);
    }

    #[test]
    fn whitelist_prefers_direct_when_cve_seen_in_both() {
        let response = ScanResponse {
            vulnerabilities: vec![vuln("CVE-2022-9", &["npm://deep:1"])],
            violations: vec![Violation {
                cves: vec![Cve {
                    id: "CVE-2022-9".to_owned(),
                    cvss_v3_score: None,
                }],
                components: component_map(&["npm://direct:1"]),
                ..Default::default()
            }],
            ..Default::default()
        };
        let direct_ids = BTreeSet::from(["npm://direct:1".to_owned()]);
        let whitelist = CveWhitelist::from_responses(&[response], &direct_ids);
        assert_eq!(whitelist.direct.len(), 1);
        assert!(whitelist.indirect.is_empty());
    }

    #[test]
    fn whitelist_from_no_responses_is_empty() {
        let whitelist = CveWhitelist::from_responses(&[], &BTreeSet::new());
        assert!(whitelist.is_empty());
        assert_eq!(whitelist.iter().count(), 0);
    }
}
