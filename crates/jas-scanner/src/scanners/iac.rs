//! IaC 스캐너

use std::path::Path;

use super::{ModuleScanner, ScanConfig, source_findings};
use crate::module::Module;
use crate::sarif::SarifRun;
use crate::types::{JasScanType, SourceFinding};

/// IaC 스캐너. 경로를 모듈 루트 기준으로 바꾸는 것 외에 후처리가 없습니다.
#[derive(Debug, Clone, Default)]
pub struct IacScanner {
    findings: Vec<SourceFinding>,
}

impl IacScanner {
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

impl ModuleScanner for IacScanner {
    fn scan_type(&self) -> JasScanType {
        JasScanType::Iac
    }

    fn configure(&self, module: &Module, output: &Path) -> ScanConfig {
        ScanConfig::for_module(JasScanType::Iac, module, output)
    }

    fn ingest(&mut self, module: &Module, runs: Vec<SarifRun>) -> usize {
        let findings = source_findings(JasScanType::Iac, module, runs);
        let count = findings.len();
        self.findings.extend(findings);
        count
    }
}
