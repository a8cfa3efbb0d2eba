//! SCA 에러 타입
//!
//! [`ScaError`]는 의존성 수집, 그래프 제출, 파일 입출력 과정의 에러를 나타냅니다.
//! 여러 기술(생태계)을 독립적으로 처리할 때 발생한 에러는 [`ScaError::Joined`]로
//! 모아서 반환하며, 앞선 에러가 뒤의 에러에 가려지지 않습니다.

use depaudit_core::error::{DepauditError, ServiceError};
use depaudit_core::types::Technology;

/// SCA 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum ScaError {
    /// 생태계 어댑터가 의존성 그래프를 만들지 못함
    #[error("failed to collect {technology} dependencies: {reason}")]
    Source {
        /// 대상 기술
        technology: Technology,
        /// 실패 사유
        reason: String,
    },

    /// 스캔 서비스 호출 실패
    #[error("{technology} graph scan failed: {source}")]
    Service {
        /// 대상 기술
        technology: Technology,
        /// 원본 서비스 에러
        source: ServiceError,
    },

    /// 입력 파일 파싱 실패
    #[error("failed to parse dependency graph file {path}: {reason}")]
    Parse {
        /// 파일 경로
        path: String,
        /// 파싱 실패 사유
        reason: String,
    },

    /// 파일 I/O 에러
    #[error("io error: {path}: {source}")]
    Io {
        /// 관련 파일 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },

    /// 여러 에러의 묶음
    #[error("{}", join_messages(.0))]
    Joined(Vec<ScaError>),
}

impl ScaError {
    /// 에러 목록을 하나로 합칩니다.
    ///
    /// 비어 있으면 `None`, 하나면 그 에러, 둘 이상이면 `Joined`를 반환합니다.
    pub fn join(mut errors: Vec<ScaError>) -> Option<ScaError> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(ScaError::Joined(errors)),
        }
    }
}

fn join_messages(errors: &[ScaError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

impl From<ScaError> for DepauditError {
    fn from(err: ScaError) -> Self {
        match err {
            ScaError::Service { source, .. } => DepauditError::Service(source),
            other => DepauditError::Graph(other.to_string()),
        }
    }
}
