//! depaudit 바이너리 스캔
//!
//! 파일 시스템에서 바이너리를 찾아 외부 인덱서로 의존성 그래프를 만들고,
//! 그래프를 스캔 서비스에 제출합니다. 인덱싱과 스캔은 각각 크기가 정해진 워커 풀에서
//! 동시에 진행됩니다.
//!
//! # 모듈 구성
//!
//! - [`config`]: 파이프라인 설정 (`PipelineConfig`)
//! - [`error`]: 도메인 에러 (`BinaryScanError`)
//! - [`spec`]: 파일 스펙과 탐색 (`FileSpec`)
//! - [`indexer`]: 인덱서 프로세스 계약 (`Indexer`, `IndexerApp`)
//! - [`pipeline`]: 2단계 동시 스캔 파이프라인 (`ScanPipeline`)

pub mod config;
pub mod error;
pub mod indexer;
pub mod pipeline;
pub mod spec;

// --- 주요 타입 re-export ---

pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use error::BinaryScanError;
pub use indexer::{Indexer, IndexerApp};
pub use pipeline::{PipelineOutcome, ScanPipeline};
pub use spec::{FileSpec, repo_path_from_target};
