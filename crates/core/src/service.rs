//! 스캔 서비스 trait: 원격 취약점 데이터베이스와의 경계
//!
//! 요청 그래프를 제출하고 결과를 받아오는 프로토콜(제출, 스캔 ID 수신, 폴링)은
//! 구현체가 담당합니다. SCA 러너와 바이너리 스캔 파이프라인은 이 trait에만 의존합니다.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::graph::GraphNode;
use crate::response::ScanResponse;
use crate::types::Technology;

/// 그래프 스캔 요청
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphScanRequest {
    /// 제출할 그래프 (평탄화된 ID 집합 또는 인덱싱된 바이너리 그래프)
    pub graph: GraphNode,
    /// 요청을 만든 기술 (바이너리 스캔은 None)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technology: Option<Technology>,
    /// 정책 평가에 사용할 프로젝트 키
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_key: Option<String>,
    /// 바이너리 스캔 대상이 올라갈 저장소 경로
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_path: Option<String>,
}

impl GraphScanRequest {
    pub fn new(graph: GraphNode) -> Self {
        Self {
            graph,
            technology: None,
            project_key: None,
            repo_path: None,
        }
    }

    pub fn with_technology(mut self, technology: Technology) -> Self {
        self.technology = Some(technology);
        self
    }

    pub fn with_repo_path(mut self, repo_path: impl Into<String>) -> Self {
        self.repo_path = Some(repo_path.into());
        self
    }
}

/// 그래프 스캔 서비스
///
/// 구현체는 요청 제출부터 결과 수신까지 완료한 뒤 반환해야 합니다.
pub trait GraphScanService: Send + Sync + 'static {
    /// 그래프를 제출하고 스캔 결과를 반환합니다.
    ///
    /// # Errors
    ///
    /// - `ServiceError::Request`: 전송 실패
    /// - `ServiceError::Rejected`: 서비스가 요청을 거부함
    /// - `ServiceError::Timeout`: 결과 대기 시간 초과
    fn scan_graph(
        &self,
        request: GraphScanRequest,
    ) -> impl Future<Output = Result<ScanResponse, ServiceError>> + Send;
}
