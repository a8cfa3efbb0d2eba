//! 바이너리 스캔 에러 타입
//!
//! 파이프라인은 에러가 나도 멈추지 않습니다. 파일 하나의 인덱싱 실패나 그래프 하나의
//! 스캔 실패는 [`BinaryScanError`]로 기록되고, 나머지 파일은 계속 처리됩니다.

use depaudit_core::error::{ConfigError, DepauditError, ServiceError};

/// 바이너리 스캔 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum BinaryScanError {
    /// 설정 값 오류
    #[error("config error: {field}: {reason}")]
    Config { field: String, reason: String },

    /// 파일 패턴 형식 오류
    #[error("invalid file pattern '{pattern}': {reason}")]
    Pattern { pattern: String, reason: String },

    /// 디렉토리 탐색 실패
    #[error("failed to walk {path}: {reason}")]
    Walk { path: String, reason: String },

    /// 인덱서 실행 파일을 시작하지 못함
    #[error("failed to launch indexer {path}: {source}")]
    IndexerLaunch {
        path: String,
        source: std::io::Error,
    },

    /// 인덱서가 실패 코드로 종료
    #[error("indexer failed indexing {file} (exit code {exit_code:?}): {stderr}")]
    Indexer {
        file: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// 인덱서 출력이 그래프 형식이 아님
    #[error("invalid indexer output for {file}: {reason}")]
    IndexerOutput { file: String, reason: String },

    /// 스캔 서비스 호출 실패
    #[error("scanning {component} failed: {source}")]
    Service {
        component: String,
        source: ServiceError,
    },

    /// 작업 태스크가 비정상 종료
    #[error("pipeline task failed: {0}")]
    Task(String),

    /// 기타 파일 I/O 에러
    #[error("io error: {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

impl From<BinaryScanError> for DepauditError {
    fn from(err: BinaryScanError) -> Self {
        match err {
            BinaryScanError::Config { field, reason } => {
                DepauditError::Config(ConfigError::InvalidValue { field, reason })
            }
            BinaryScanError::Service { source, .. } => DepauditError::Service(source),
            other => DepauditError::BinaryScan(other.to_string()),
        }
    }
}
