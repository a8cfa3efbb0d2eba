//! 2단계 동시 스캔 파이프라인
//!
//! ```text
//! FileSpec walk --(files)--> [indexer worker x T] --(graphs)--> [scan worker x T]
//!   (blocking)     bounded                          bounded          |
//!                                                                    v
//!                                                      per-worker results
//! ```
//!
//! - 파일 탐색이 끝나면 파일 채널의 송신 측이 닫힙니다.
//! - 인덱서 워커는 파일 채널이 비고 닫히면 종료하며, 이때 그래프 채널 송신 측도 함께 사라집니다.
//! - 스캔 워커는 그래프 채널이 비고 닫혀야 종료합니다. 즉 인덱싱이 끝나고 제출된 그래프를
//!   모두 처리한 뒤에만 끝납니다.
//! - 워커마다 자기 결과/에러 목록을 소유하고, 두 풀이 모두 끝난 뒤 워커 순서대로 이어 붙입니다.

use std::path::PathBuf;
use std::sync::Arc;

use metrics::counter;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use depaudit_core::graph::GraphNode;
use depaudit_core::metrics::{
    BINSCAN_FILES_INDEXED_TOTAL, BINSCAN_GRAPHS_SCANNED_TOTAL, LABEL_RESULT,
};
use depaudit_core::response::ScanResponse;
use depaudit_core::service::{GraphScanRequest, GraphScanService};

use crate::config::PipelineConfig;
use crate::error::BinaryScanError;
use crate::indexer::{Indexer, IndexerApp};
use crate::spec::FileSpec;

/// 인덱싱 대기 파일
#[derive(Debug)]
struct IndexTask {
    path: PathBuf,
    repo_path: Option<String>,
}

/// 스캔 대기 그래프
#[derive(Debug)]
struct ScanTask {
    graph: GraphNode,
    repo_path: Option<String>,
}

/// 워커 하나의 결과
#[derive(Debug, Default)]
struct WorkerSlot {
    results: Vec<ScanResponse>,
    errors: Vec<BinaryScanError>,
}

/// 파이프라인 실행 결과
#[derive(Debug, Default)]
pub struct PipelineOutcome {
    /// 스캔 응답 (순서는 보장하지 않음)
    pub results: Vec<ScanResponse>,
    /// 탐색/인덱싱/스캔 에러
    pub errors: Vec<BinaryScanError>,
}

impl PipelineOutcome {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    fn absorb(&mut self, slot: WorkerSlot) {
        self.results.extend(slot.results);
        self.errors.extend(slot.errors);
    }
}

/// 바이너리 스캔 파이프라인
pub struct ScanPipeline<I: Indexer, S: GraphScanService> {
    indexer: Arc<I>,
    service: Arc<S>,
    config: PipelineConfig,
}

impl<S: GraphScanService> ScanPipeline<IndexerApp, S> {
    /// 설정의 `indexer_path`로 외부 인덱서를 띄우는 파이프라인을 만듭니다.
    ///
    /// # Errors
    ///
    /// 설정 검증에 실패하거나 `indexer_path`가 비어 있으면 `BinaryScanError::Config`를 반환합니다.
    pub fn with_indexer_app(
        service: Arc<S>,
        config: PipelineConfig,
        temp_dir: impl Into<PathBuf>,
    ) -> Result<Self, BinaryScanError> {
        config.validate()?;
        let indexer = IndexerApp::from_config(&config, temp_dir)?;
        Ok(Self::new(Arc::new(indexer), service, config))
    }
}

impl<I: Indexer, S: GraphScanService> ScanPipeline<I, S> {
    pub fn new(indexer: Arc<I>, service: Arc<S>, config: PipelineConfig) -> Self {
        Self {
            indexer,
            service,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// 모든 파일 스펙을 탐색, 인덱싱, 스캔합니다.
    ///
    /// 에러가 있어도 끝까지 진행하며 결과와 에러를 함께 반환합니다.
    pub async fn run(&self, specs: Vec<FileSpec>) -> PipelineOutcome {
        let workers = self.config.worker_count();
        let capacity = self.config.channel_capacity;
        let (file_tx, file_rx) = mpsc::channel::<IndexTask>(capacity);
        let (graph_tx, graph_rx) = mpsc::channel::<ScanTask>(capacity);
        let file_rx = Arc::new(Mutex::new(file_rx));
        let graph_rx = Arc::new(Mutex::new(graph_rx));

        info!(workers, specs = specs.len(), "binary scan pipeline starting");

        let specs = specs
            .into_iter()
            .map(|spec| spec.with_default_recursive(self.config.recursive))
            .collect();

        let producer = spawn_producer(specs, self.config.exclusions.clone(), file_tx);

        let indexers: Vec<JoinHandle<WorkerSlot>> = (0..workers)
            .map(|worker_id| {
                tokio::spawn(index_worker(
                    worker_id,
                    Arc::clone(&self.indexer),
                    Arc::clone(&file_rx),
                    graph_tx.clone(),
                ))
            })
            .collect();
        // 인덱서 워커의 복제본만 남아야 스캔 워커가 종료를 감지합니다.
        drop(graph_tx);

        let scanners: Vec<JoinHandle<WorkerSlot>> = (0..workers)
            .map(|worker_id| {
                tokio::spawn(scan_worker(
                    worker_id,
                    Arc::clone(&self.service),
                    Arc::clone(&graph_rx),
                    self.config.project_key.clone(),
                ))
            })
            .collect();

        let mut outcome = PipelineOutcome::default();
        match producer.await {
            Ok(errors) => outcome.errors.extend(errors),
            Err(e) => outcome.errors.push(BinaryScanError::Task(e.to_string())),
        }
        for handle in indexers.into_iter().chain(scanners) {
            match handle.await {
                Ok(slot) => outcome.absorb(slot),
                Err(e) => outcome.errors.push(BinaryScanError::Task(e.to_string())),
            }
        }

        info!(
            results = outcome.results.len(),
            errors = outcome.errors.len(),
            "binary scan pipeline finished"
        );
        outcome
    }
}

/// 파일 탐색은 블로킹 스레드에서 수행합니다.
fn spawn_producer(
    specs: Vec<FileSpec>,
    exclusions: Vec<String>,
    file_tx: mpsc::Sender<IndexTask>,
) -> JoinHandle<Vec<BinaryScanError>> {
    tokio::task::spawn_blocking(move || {
        let mut errors = Vec::new();
        for spec in &specs {
            let repo_path = spec.repo_path();
            let walked = spec.walk(&exclusions, |path| {
                let task = IndexTask {
                    path,
                    repo_path: repo_path.clone(),
                };
                file_tx.blocking_send(task).is_ok()
            });
            match walked {
                Ok(walk_errors) => errors.extend(walk_errors),
                Err(err) => {
                    warn!(pattern = %spec.pattern, error = %err, "skipping file spec");
                    errors.push(err);
                }
            }
        }
        debug!("file walk finished");
        errors
    })
}

async fn index_worker<I: Indexer>(
    worker_id: usize,
    indexer: Arc<I>,
    file_rx: Arc<Mutex<mpsc::Receiver<IndexTask>>>,
    graph_tx: mpsc::Sender<ScanTask>,
) -> WorkerSlot {
    let mut slot = WorkerSlot::default();
    loop {
        let task = { file_rx.lock().await.recv().await };
        let Some(task) = task else { break };

        debug!(worker_id, file = %task.path.display(), "indexing file");
        match indexer.index(&task.path).await {
            Ok(Some(graph)) if !graph.id().is_empty() => {
                counter!(BINSCAN_FILES_INDEXED_TOTAL, LABEL_RESULT => "indexed").increment(1);
                let next = ScanTask {
                    graph,
                    repo_path: task.repo_path,
                };
                if graph_tx.send(next).await.is_err() {
                    break;
                }
            }
            Ok(_) => {
                counter!(BINSCAN_FILES_INDEXED_TOTAL, LABEL_RESULT => "unsupported").increment(1);
                debug!(worker_id, file = %task.path.display(), "no graph, not submitted");
            }
            Err(err) => {
                counter!(BINSCAN_FILES_INDEXED_TOTAL, LABEL_RESULT => "failure").increment(1);
                warn!(worker_id, file = %task.path.display(), error = %err, "indexing failed");
                slot.errors.push(err);
            }
        }
    }
    slot
}

async fn scan_worker<S: GraphScanService>(
    worker_id: usize,
    service: Arc<S>,
    graph_rx: Arc<Mutex<mpsc::Receiver<ScanTask>>>,
    project_key: Option<String>,
) -> WorkerSlot {
    let mut slot = WorkerSlot::default();
    loop {
        let task = { graph_rx.lock().await.recv().await };
        let Some(task) = task else { break };

        let component = task.graph.id().to_owned();
        let mut request = GraphScanRequest::new(task.graph);
        request.project_key = project_key.clone();
        if let Some(repo_path) = task.repo_path {
            request = request.with_repo_path(repo_path);
        }

        match service.scan_graph(request).await {
            Ok(response) => {
                counter!(BINSCAN_GRAPHS_SCANNED_TOTAL, LABEL_RESULT => "success").increment(1);
                debug!(worker_id, component = %component, "graph scanned");
                slot.results.push(response);
            }
            Err(source) => {
                counter!(BINSCAN_GRAPHS_SCANNED_TOTAL, LABEL_RESULT => "failure").increment(1);
                warn!(worker_id, component = %component, error = %source, "graph scan failed");
                slot.errors.push(BinaryScanError::Service { component, source });
            }
        }
    }
    slot
}
