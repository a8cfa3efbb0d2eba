//! depaudit 의존성 그래프 엔진
//!
//! 생태계 어댑터가 만든 원시 간선을 의존성 트리로 바꾸고, 스캔 서비스에 보낼
//! 평탄화 그래프와 영향 경로를 만듭니다.
//!
//! # 모듈 구성
//!
//! - [`error`]: 도메인 에러 (`ScaError`)
//! - [`builder`]: 순환 안전, 반복 한도가 있는 트리 빌더 (`TreeBuilder`)
//! - [`forest`]: 모듈별 트리 묶음과 평탄화 그래프 (`DependencyForest`)
//! - [`impact`]: 영향 경로 재구성 (`build_impact_paths`)
//! - [`source`]: 생태계 어댑터 경계 (`DependencySource`, `JsonEdgeSource`)
//! - [`sca`]: 기술별 스캔 실행기 (`ScaRunner`)
//!
//! # 데이터 흐름
//!
//! ```text
//! raw edges --> TreeBuilder --> DependencyForest --+--> flattened() --> GraphScanService
//!                                                  |                          |
//!                                                  +--> trees() --> build_impact_paths
//! ```

pub mod builder;
pub mod error;
pub mod forest;
pub mod impact;
pub mod sca;
pub mod source;

// --- 주요 타입 re-export ---

pub use builder::{DEFAULT_MAX_APPEARANCES, DependencyEdges, TreeBuilder, build_dependency_tree};
pub use error::ScaError;
pub use forest::{DependencyForest, direct_dependencies, flatten_unique_ids};
pub use impact::{attach_impact_paths, build_impact_paths};
pub use sca::{ScaOutcome, ScaRunner, TechnologyScan};
pub use source::{DependencySource, JsonEdgeSource, RawDependencyGraph};
