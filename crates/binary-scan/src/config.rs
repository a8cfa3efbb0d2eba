//! 바이너리 스캔 파이프라인 설정
//!
//! [`PipelineConfig`]는 core의 [`BinaryScanConfig`](depaudit_core::config::BinaryScanConfig)에서
//! 만들거나 [`PipelineConfigBuilder`]로 직접 구성합니다.

use serde::{Deserialize, Serialize};

use depaudit_core::config::BinaryScanConfig;

use crate::error::BinaryScanError;

/// 스테이지별 워커 수 상한
const MAX_THREADS: usize = 256;

/// 기본 채널 용량
const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// 파이프라인 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// 인덱서 실행 파일 경로
    pub indexer_path: String,
    /// 스테이지별 워커 수 (1 미만은 1로 올림)
    pub threads: usize,
    /// 하위 디렉토리 재귀 탐색
    pub recursive: bool,
    /// 모든 파일 스펙에 공통 적용되는 제외 패턴
    pub exclusions: Vec<String>,
    /// 스테이지 사이 채널 용량
    pub channel_capacity: usize,
    /// 스캔 서비스 요청에 넣을 프로젝트 키
    pub project_key: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            indexer_path: String::new(),
            threads: 3,
            recursive: true,
            exclusions: Vec::new(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            project_key: None,
        }
    }
}

impl PipelineConfig {
    pub fn from_core(core: &BinaryScanConfig) -> Self {
        Self {
            indexer_path: core.indexer_path.clone(),
            threads: core.threads,
            recursive: core.recursive,
            exclusions: core.exclusions.clone(),
            ..Self::default()
        }
    }

    /// 실제로 띄울 워커 수
    pub fn worker_count(&self) -> usize {
        self.threads.max(1)
    }

    pub fn validate(&self) -> Result<(), BinaryScanError> {
        if self.threads > MAX_THREADS {
            return Err(BinaryScanError::Config {
                field: "threads".to_owned(),
                reason: format!("must be at most {MAX_THREADS}"),
            });
        }
        if self.channel_capacity == 0 {
            return Err(BinaryScanError::Config {
                field: "channel_capacity".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }
        if let Some(bad) = self
            .exclusions
            .iter()
            .find(|p| glob::Pattern::new(p).is_err())
        {
            return Err(BinaryScanError::Config {
                field: "exclusions".to_owned(),
                reason: format!("invalid pattern '{bad}'"),
            });
        }
        Ok(())
    }
}

/// 파이프라인 설정 빌더
#[derive(Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn indexer_path(mut self, path: impl Into<String>) -> Self {
        self.config.indexer_path = path.into();
        self
    }

    pub fn threads(mut self, threads: usize) -> Self {
        self.config.threads = threads;
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.config.recursive = recursive;
        self
    }

    pub fn exclusions(mut self, exclusions: Vec<String>) -> Self {
        self.config.exclusions = exclusions;
        self
    }

    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.config.channel_capacity = capacity;
        self
    }

    pub fn project_key(mut self, key: impl Into<String>) -> Self {
        self.config.project_key = Some(key.into());
        self
    }

    pub fn build(self) -> Result<PipelineConfig, BinaryScanError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_threads_runs_one_worker() {
        let config = PipelineConfigBuilder::new().threads(0).build().unwrap();
        assert_eq!(config.worker_count(), 1);
    }

    #[test]
    fn from_core_copies_values() {
        let core = BinaryScanConfig {
            indexer_path: "/opt/indexer".to_owned(),
            threads: 8,
            recursive: false,
            exclusions: vec!["*.tmp".to_owned()],
        };
        let config = PipelineConfig::from_core(&core);
        assert_eq!(config.worker_count(), 8);
        assert!(!config.recursive);
        assert_eq!(config.channel_capacity, DEFAULT_CHANNEL_CAPACITY);
        config.validate().unwrap();
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(PipelineConfigBuilder::new().threads(MAX_THREADS + 1).build().is_err());
        assert!(PipelineConfigBuilder::new().channel_capacity(0).build().is_err());
        let err = PipelineConfigBuilder::new()
            .exclusions(vec!["[unclosed".to_owned()])
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("[unclosed"));
    }
}
