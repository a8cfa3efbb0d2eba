#![doc = include_str!("../README.md")]

pub mod config;
pub mod error;
pub mod graph;
pub mod metrics;
pub mod response;
pub mod service;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, DepauditError, ServiceError};

// 설정
pub use config::DepauditConfig;

// 그래프
pub use graph::{FLAT_ROOT_ID, GraphNode};

// 스캔 응답
pub use response::{Component, Cve, CveWhitelist, ImpactPath, License, ScanResponse, Violation, Vulnerability};

// 스캔 서비스 trait
pub use service::{GraphScanRequest, GraphScanService};

// 도메인 타입
pub use types::{Severity, Technology};
