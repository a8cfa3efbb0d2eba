//! 다중 스캐너 실행
//!
//! 한 세션 안에서 적용 가능성, 시크릿, IaC, SAST 순으로 스캐너를 실행하고
//! 결과를 [`ExtendedScanResults`]로 모읍니다. 한 스캐너의 실패는 다른 스캐너를 막지 않습니다.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use depaudit_core::response::CveWhitelist;

use crate::engine::AnalyzerEngine;
use crate::error::JasError;
use crate::scanners::{ApplicabilityScanner, IacScanner, SastScanner, SecretsScanner};
use crate::session::JasSession;
use crate::types::{CveApplicability, JasScanType, SourceFinding};

/// 스캐너 종류별 결과
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtendedScanResults {
    pub applicability: Vec<CveApplicability>,
    pub secrets: Vec<SourceFinding>,
    pub iac: Vec<SourceFinding>,
    pub sast: Vec<SourceFinding>,
}

impl ExtendedScanResults {
    pub fn is_empty(&self) -> bool {
        self.applicability.is_empty()
            && self.secrets.is_empty()
            && self.iac.is_empty()
            && self.sast.is_empty()
    }

    /// 시크릿/IaC/SAST 발견 항목 총 수
    pub fn finding_count(&self) -> usize {
        self.secrets.len() + self.iac.len() + self.sast.len()
    }
}

/// 실행 옵션
#[derive(Debug, Clone)]
pub struct JasRunOptions {
    /// 적용 가능성 스캔 대상 CVE (비어 있으면 적용 가능성 스캔 생략)
    pub whitelist: CveWhitelist,
    pub third_party_applicability: bool,
    /// 실행할 스캐너 종류
    pub scan_types: Vec<JasScanType>,
}

impl Default for JasRunOptions {
    fn default() -> Self {
        Self {
            whitelist: CveWhitelist::default(),
            third_party_applicability: false,
            scan_types: JasScanType::ALL.to_vec(),
        }
    }
}

impl JasRunOptions {
    fn enabled(&self, scan_type: JasScanType) -> bool {
        self.scan_types.contains(&scan_type)
    }
}

/// 부분 결과와 합쳐진 에러
#[derive(Debug, Default)]
pub struct JasOutcome {
    pub results: ExtendedScanResults,
    pub error: Option<JasError>,
}

impl JasOutcome {
    /// 에러가 있으면 결과를 버리고 에러를 반환합니다.
    pub fn into_result(self) -> Result<ExtendedScanResults, JasError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.results),
        }
    }
}

/// 세션의 모든 모듈에 대해 선택된 스캐너를 순서대로 실행합니다.
pub async fn run_jas_scanners<E: AnalyzerEngine>(
    session: &JasSession<E>,
    options: &JasRunOptions,
) -> JasOutcome {
    let mut results = ExtendedScanResults::default();
    let mut errors = Vec::new();

    if options.enabled(JasScanType::Applicability) {
        if options.whitelist.is_empty() {
            debug!("no CVEs to check, applicability scan skipped");
        } else {
            let mut scanner = ApplicabilityScanner::new(options.whitelist.clone())
                .third_party(options.third_party_applicability);
            errors.extend(session.run(&mut scanner).await.err());
            results.applicability = scanner.results();
        }
    }

    if options.enabled(JasScanType::Secrets) {
        let mut scanner = SecretsScanner::new();
        errors.extend(session.run(&mut scanner).await.err());
        results.secrets = scanner.into_findings();
    }

    if options.enabled(JasScanType::Iac) {
        let mut scanner = IacScanner::new();
        errors.extend(session.run(&mut scanner).await.err());
        results.iac = scanner.into_findings();
    }

    if options.enabled(JasScanType::Sast) {
        let mut scanner = SastScanner::new();
        errors.extend(session.run(&mut scanner).await.err());
        results.sast = scanner.into_findings();
    }

    info!(
        session_id = session.session_id(),
        applicability = results.applicability.len(),
        secrets = results.secrets.len(),
        iac = results.iac.len(),
        sast = results.sast.len(),
        failed = errors.len(),
        "jas scanners finished"
    );

    JasOutcome {
        results,
        error: JasError::join(errors),
    }
}
