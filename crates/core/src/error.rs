//! 에러 타입: 도메인별 에러 정의

/// depaudit 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum DepauditError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 스캔 서비스 에러
    #[error("service error: {0}")]
    Service(#[from] ServiceError),

    /// 의존성 그래프 / SCA 에러
    #[error("sca error: {0}")]
    Graph(String),

    /// JAS 스캐너 에러
    #[error("jas error: {0}")]
    Jas(String),

    /// 바이너리 스캔 파이프라인 에러
    #[error("binary scan error: {0}")]
    BinaryScan(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 스캔 서비스 호출 에러
#[derive(Debug, Clone, thiserror::Error)]
pub enum ServiceError {
    /// 요청 전송 실패
    #[error("request failed: {0}")]
    Request(String),

    /// 서비스가 요청을 거부함
    #[error("scan rejected (status {status}): {reason}")]
    Rejected { status: u16, reason: String },

    /// 결과 조회 시간 초과
    #[error("timed out waiting for scan results of '{scan_id}'")]
    Timeout { scan_id: String },
}
