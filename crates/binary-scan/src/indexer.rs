//! 인덱서 프로세스 계약
//!
//! 인덱서는 바이너리 파일 하나를 읽어 의존성 그래프를 stdout에 JSON으로 씁니다.
//!
//! ```text
//! <indexer> graph <file> --temp-dir <dir>
//! ```
//!
//! 종료 코드 3은 지원하지 않는 파일 형식입니다. 에러가 아니라 결과 없음으로 처리합니다.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use depaudit_core::graph::GraphNode;

use crate::config::PipelineConfig;
use crate::error::BinaryScanError;

/// 인덱싱 서브커맨드
const INDEXING_COMMAND: &str = "graph";

/// 지원하지 않는 파일 종료 코드
pub const EXIT_FILE_NOT_SUPPORTED: i32 = 3;

/// 파일 인덱서 추상화
pub trait Indexer: Send + Sync + 'static {
    /// 파일 하나를 인덱싱합니다. 지원하지 않는 파일이면 `Ok(None)`입니다.
    fn index(
        &self,
        file: &Path,
    ) -> impl Future<Output = Result<Option<GraphNode>, BinaryScanError>> + Send;
}

/// 외부 인덱서 실행 파일
#[derive(Debug, Clone)]
pub struct IndexerApp {
    path: PathBuf,
    temp_dir: PathBuf,
}

impl IndexerApp {
    /// `temp_dir`은 인덱서가 압축 해제 등에 쓰는 작업 디렉토리입니다.
    pub fn new(path: impl Into<PathBuf>, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            temp_dir: temp_dir.into(),
        }
    }

    /// 파이프라인 설정의 `indexer_path`로 만듭니다.
    pub fn from_config(
        config: &PipelineConfig,
        temp_dir: impl Into<PathBuf>,
    ) -> Result<Self, BinaryScanError> {
        if config.indexer_path.trim().is_empty() {
            return Err(BinaryScanError::Config {
                field: "indexer_path".to_owned(),
                reason: "must be set to run the indexer".to_owned(),
            });
        }
        Ok(Self::new(&config.indexer_path, temp_dir))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn command(&self, file: &Path) -> Command {
        let mut cmd = Command::new(&self.path);
        cmd.arg(INDEXING_COMMAND)
            .arg(file)
            .arg("--temp-dir")
            .arg(&self.temp_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

impl Indexer for IndexerApp {
    async fn index(&self, file: &Path) -> Result<Option<GraphNode>, BinaryScanError> {
        let output = self
            .command(file)
            .output()
            .await
            .map_err(|e| BinaryScanError::IndexerLaunch {
                path: self.path.display().to_string(),
                source: e,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
        match output.status.code() {
            Some(0) => {}
            Some(EXIT_FILE_NOT_SUPPORTED) => {
                debug!(file = %file.display(), "file is not supported by the indexer");
                return Ok(None);
            }
            code => {
                return Err(BinaryScanError::Indexer {
                    file: file.display().to_string(),
                    exit_code: code,
                    stderr,
                });
            }
        }

        if !stderr.is_empty() {
            debug!(file = %file.display(), indexer_log = %stderr, "indexer output");
        }
        parse_graph(file, &output.stdout).map(Some)
    }
}

/// 인덱서 stdout을 그래프로 파싱합니다.
pub fn parse_graph(file: &Path, stdout: &[u8]) -> Result<GraphNode, BinaryScanError> {
    serde_json::from_slice(stdout).map_err(|e| BinaryScanError::IndexerOutput {
        file: file.display().to_string(),
        reason: e.to_string(),
    })
}
