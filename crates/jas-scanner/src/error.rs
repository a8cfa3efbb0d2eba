//! JAS 스캐너 에러 타입
//!
//! [`JasError`]는 설정 파일 작성, 분석 엔진 실행, SARIF 파싱, 임시 파일 정리 과정의
//! 에러를 나타냅니다. 모듈 단위 에러는 세션 드라이버가 [`JasError::Joined`]로 모으며,
//! 정리(cleanup) 에러는 앞선 에러를 덮지 않고 함께 보고됩니다.

use depaudit_core::error::{ConfigError, DepauditError};

use crate::types::JasScanType;

/// JAS 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum JasError {
    /// 스캐너 설정 값 오류
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 엔진 설정 파일 직렬화/작성 실패 (해당 모듈 패스만 실패)
    #[error("failed to write {scan_type} scanner config {path}: {reason}")]
    ConfigWrite {
        scan_type: JasScanType,
        path: String,
        reason: String,
    },

    /// 엔진 실행 파일을 시작하지 못함 (복구 불가)
    #[error("{scan_type} scan failed to launch analyzer engine {path}: {source}")]
    EngineLaunch {
        scan_type: JasScanType,
        path: String,
        source: std::io::Error,
    },

    /// 엔진이 실패 코드로 종료했거나 제한 시간을 넘김
    #[error("failed to run {scan_type} scan. {reason}")]
    EngineExecution {
        scan_type: JasScanType,
        /// 종료 코드 (시간 초과 시 None)
        exit_code: Option<i32>,
        reason: String,
    },

    /// SARIF 결과 파일 누락 또는 형식 오류
    #[error("failed to parse {scan_type} results {path}: {reason}")]
    Parse {
        scan_type: JasScanType,
        path: String,
        reason: String,
    },

    /// 임시 파일 삭제 실패
    #[error("failed to clean up {path}: {source}")]
    Cleanup {
        path: String,
        source: std::io::Error,
    },

    /// 기타 파일 I/O 에러
    #[error("io error: {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// 여러 에러의 묶음
    #[error("{}", join_messages(.0))]
    Joined(Vec<JasError>),
}

impl JasError {
    /// 엔진이 지정 종료 코드로 실패했을 때의 에러를 만듭니다.
    pub fn exit_code(scan_type: JasScanType, code: i32) -> Self {
        Self::EngineExecution {
            scan_type,
            exit_code: Some(code),
            reason: format!("Exit code received: {code}"),
        }
    }

    /// 이후 모듈 처리를 중단해야 하는 에러인지 확인합니다.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::EngineLaunch { .. } => true,
            Self::Joined(errors) => errors.iter().any(JasError::is_fatal),
            _ => false,
        }
    }

    /// 에러 목록을 하나로 합칩니다.
    ///
    /// 중첩된 `Joined`는 펼쳐서 한 단계로 만듭니다.
    pub fn join(errors: impl IntoIterator<Item = JasError>) -> Option<JasError> {
        let mut flat = Vec::new();
        for err in errors {
            match err {
                Self::Joined(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => None,
            1 => flat.pop(),
            _ => Some(Self::Joined(flat)),
        }
    }

    /// 묶음에 포함된 개별 에러 수
    pub fn error_count(&self) -> usize {
        match self {
            Self::Joined(errors) => errors.len(),
            _ => 1,
        }
    }
}

fn join_messages(errors: &[JasError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

impl From<JasError> for DepauditError {
    fn from(err: JasError) -> Self {
        match err {
            JasError::Config { field, reason } => {
                DepauditError::Config(ConfigError::InvalidValue { field, reason })
            }
            other => DepauditError::Jas(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cleanup_error() -> JasError {
        JasError::Cleanup {
            path: "/tmp/config.yaml".to_owned(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        }
    }

    #[test]
    fn exit_code_message_names_scan_type() {
        let err = JasError::exit_code(JasScanType::Secrets, 1);
        assert_eq!(
            err.to_string(),
            "failed to run Secrets scan. Exit code received: 1"
        );
    }

    #[test]
    fn launch_failure_is_fatal() {
        let err = JasError::EngineLaunch {
            scan_type: JasScanType::Iac,
            path: "/opt/am/analyzerManager".to_owned(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(
            err.to_string(),
            "IaC scan failed to launch analyzer engine /opt/am/analyzerManager: missing"
        );
        assert!(err.is_fatal());
        assert!(!cleanup_error().is_fatal());
    }

    #[test]
    fn join_flattens_and_keeps_order() {
        let first = JasError::exit_code(JasScanType::Iac, 2);
        let nested = JasError::join(vec![cleanup_error(), JasError::exit_code(JasScanType::Sast, 3)]);
        let joined = JasError::join(std::iter::once(first).chain(nested)).unwrap();
        assert_eq!(joined.error_count(), 3);
        let msg = joined.to_string();
        let iac = msg.find("IaC").unwrap();
        let cleanup = msg.find("clean up").unwrap();
        assert!(iac < cleanup);
    }

    #[test]
    fn join_of_nothing_is_none() {
        assert!(JasError::join(Vec::new()).is_none());
    }

    #[test]
    fn config_error_maps_to_core_config() {
        let err: DepauditError = JasError::Config {
            field: "timeout_secs".to_owned(),
            reason: "too large".to_owned(),
        }
        .into();
        assert!(matches!(err, DepauditError::Config(_)));
    }
}
