//! SAST 스캐너
//!
//! 엔진은 같은 지점의 같은 문제를 호출 경로마다 따로 보고합니다.
//! `(파일, line:column, 메시지)`가 같은 결과는 하나로 합치고 코드 흐름만 누적합니다.

use std::collections::HashMap;
use std::path::Path;

use super::{ModuleScanner, ScanConfig, source_findings};
use crate::module::Module;
use crate::sarif::SarifRun;
use crate::types::{JasScanType, SourceFinding};

type FindingKey = (String, String, String);

fn finding_key(finding: &SourceFinding) -> FindingKey {
    (
        finding.location.file.clone(),
        finding.location.line_column(),
        finding.message.clone(),
    )
}

/// SAST 스캐너
#[derive(Debug, Clone, Default)]
pub struct SastScanner {
    findings: Vec<SourceFinding>,
}

impl SastScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn findings(&self) -> &[SourceFinding] {
        &self.findings
    }

    pub fn into_findings(self) -> Vec<SourceFinding> {
        self.findings
    }
}

impl ModuleScanner for SastScanner {
    fn scan_type(&self) -> JasScanType {
        JasScanType::Sast
    }

    fn configure(&self, module: &Module, output: &Path) -> ScanConfig {
        let mut config = ScanConfig::for_module(JasScanType::Sast, module, output);
        if let Some(sast) = &module.scanners.sast {
            config.language = sast.language.clone();
            config.excluded_rules = sast.excluded_rules.clone();
        }
        config
    }

    /// 모듈 안에서만 병합합니다. 다른 모듈의 같은 상대 경로는 별개 항목입니다.
    fn ingest(&mut self, module: &Module, runs: Vec<SarifRun>) -> usize {
        let mut grouped: Vec<SourceFinding> = Vec::new();
        let mut index: HashMap<FindingKey, usize> = HashMap::new();

        for finding in source_findings(JasScanType::Sast, module, runs) {
            match index.get(&finding_key(&finding)) {
                Some(&at) => {
                    let existing = &mut grouped[at];
                    for flow in finding.code_flows {
                        if !existing.code_flows.contains(&flow) {
                            existing.code_flows.push(flow);
                        }
                    }
                }
                None => {
                    index.insert(finding_key(&finding), grouped.len());
                    grouped.push(finding);
                }
            }
        }

        let count = grouped.len();
        self.findings.extend(grouped);
        count
    }
}
