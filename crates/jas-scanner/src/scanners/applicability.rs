//! CVE 적용 가능성 스캐너

use std::collections::BTreeMap;
use std::path::Path;

use depaudit_core::response::CveWhitelist;

use super::{ModuleScanner, ScanConfig};
use crate::module::{Module, NODE_MODULES_PATTERN, VIRTUAL_ENV_PATTERN};
use crate::sarif::SarifRun;
use crate::types::{ApplicabilityStatus, CveApplicability, FindingLocation, JasScanType};

/// 결과 rule id 앞에 붙는 접두어 (`applic_CVE-2021-23337`)
pub const APPLICABILITY_RULE_PREFIX: &str = "applic_";

/// `kind`가 이 값이면 적용 불가
const NOT_APPLICABLE_KIND: &str = "pass";

/// 적용 가능성 스캐너
///
/// 엔진이 한 번이라도 결과를 냈다면 화이트리스트의 모든 CVE가 결과에 포함됩니다.
/// 엔진이 언급하지 않은 CVE는 `Undetermined`입니다.
#[derive(Debug, Clone, Default)]
pub struct ApplicabilityScanner {
    whitelist: CveWhitelist,
    third_party: bool,
    statuses: BTreeMap<String, (ApplicabilityStatus, Vec<FindingLocation>)>,
    scanned: bool,
}

impl ApplicabilityScanner {
    pub fn new(whitelist: CveWhitelist) -> Self {
        Self {
            whitelist,
            ..Self::default()
        }
    }

    /// 전체 의존성 대상 스캔: 패키지 디렉토리를 제외하지 않습니다.
    pub fn third_party(mut self, enabled: bool) -> Self {
        self.third_party = enabled;
        self
    }

    pub fn whitelist(&self) -> &CveWhitelist {
        &self.whitelist
    }

    /// CVE별 최종 상태
    ///
    /// 화이트리스트 순서(직접, 간접)를 따른 뒤 화이트리스트 밖 CVE를 id 순으로 붙입니다.
    /// 한 모듈도 수집되지 않았다면 비어 있습니다.
    pub fn results(&self) -> Vec<CveApplicability> {
        if !self.scanned {
            return Vec::new();
        }
        let mut results: Vec<CveApplicability> = self
            .whitelist
            .iter()
            .map(|cve| self.entry(cve))
            .collect();
        for cve in self.statuses.keys() {
            if !self.whitelist.contains(cve) {
                results.push(self.entry(cve));
            }
        }
        results
    }

    fn entry(&self, cve: &str) -> CveApplicability {
        let (status, evidence) = self
            .statuses
            .get(cve)
            .cloned()
            .unwrap_or((ApplicabilityStatus::Undetermined, Vec::new()));
        CveApplicability {
            cve: cve.to_owned(),
            status,
            evidence,
        }
    }
}

impl ModuleScanner for ApplicabilityScanner {
    fn scan_type(&self) -> JasScanType {
        JasScanType::Applicability
    }

    fn configure(&self, module: &Module, output: &Path) -> ScanConfig {
        let mut config = ScanConfig::for_module(JasScanType::Applicability, module, output);
        if self.third_party {
            config
                .skipped_folders
                .retain(|p| p != NODE_MODULES_PATTERN && p != VIRTUAL_ENV_PATTERN);
        }
        config.grep_disable = Some(false);
        config.cve_whitelist = self.whitelist.direct.iter().cloned().collect();
        config.indirect_cve_whitelist = self.whitelist.indirect.iter().cloned().collect();
        config
    }

    fn ingest(&mut self, module: &Module, runs: Vec<SarifRun>) -> usize {
        self.scanned = true;
        let root = module.source_root.display().to_string();
        let mut count = 0;
        for result in runs.into_iter().flat_map(|run| run.results) {
            let rule_id = result.rule_id();
            let cve = rule_id
                .strip_prefix(APPLICABILITY_RULE_PREFIX)
                .unwrap_or(rule_id)
                .to_owned();
            if cve.is_empty() {
                continue;
            }
            let status = if result.kind.as_deref() == Some(NOT_APPLICABLE_KIND) {
                ApplicabilityStatus::NotApplicable
            } else {
                ApplicabilityStatus::Applicable
            };

            let entry = self
                .statuses
                .entry(cve)
                .or_insert((ApplicabilityStatus::Undetermined, Vec::new()));
            entry.0 = entry.0.merge(status);
            if status == ApplicabilityStatus::Applicable {
                entry.1.extend(result.all_locations(&root));
            }
            count += 1;
        }
        count
    }
}
