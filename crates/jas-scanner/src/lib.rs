//! depaudit JAS 스캐너 프레임워크
//!
//! 외부 분석 엔진으로 소스 코드를 검사하는 네 스캐너(적용 가능성, 시크릿, IaC, SAST)와
//! 이들을 모듈 단위로 실행하는 세션 드라이버를 제공합니다.
//!
//! # 모듈 구성
//!
//! - [`config`]: 스캐너 설정 (`JasScannerConfig`)
//! - [`error`]: 도메인 에러 (`JasError`)
//! - [`module`]: 스캔 모듈과 앱 설정 파일
//! - [`engine`]: 분석 엔진 프로세스 계약 (`AnalyzerEngine`, `AnalyzerManager`)
//! - [`sarif`]: SARIF 결과 수집
//! - [`scanners`]: 스캐너 구현 (`ModuleScanner`)
//! - [`session`]: 세션 드라이버 (`JasSession`)
//! - [`runner`]: 다중 스캐너 실행 (`run_jas_scanners`)
//!
//! # 실행 흐름
//!
//! ```text
//! JasSession::run(scanner)
//!   for module in modules:
//!     configure -> config.yaml -> AnalyzerEngine::execute -> results.sarif -> ingest
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod module;
pub mod runner;
pub mod sarif;
pub mod scanners;
pub mod session;
pub mod types;

// --- 주요 타입 re-export ---

pub use config::{EngineCredentials, JasScannerConfig, JasScannerConfigBuilder};
pub use engine::{AnalyzerEngine, AnalyzerManager, EngineInvocation, ExecStatus};
pub use error::JasError;
pub use module::{AppsConfig, Module, load_modules};
pub use runner::{ExtendedScanResults, JasOutcome, JasRunOptions, run_jas_scanners};
pub use scanners::{
    ApplicabilityScanner, IacScanner, ModuleScanner, SastScanner, ScanConfig, SecretsScanner,
    hide_secret,
};
pub use session::{JasSession, JasSessionBuilder};
pub use types::{ApplicabilityStatus, CveApplicability, FindingLocation, JasScanType, SourceFinding};
