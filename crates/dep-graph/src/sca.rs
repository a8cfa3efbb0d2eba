//! SCA 러너
//!
//! 기술별로 모듈 트리를 만들고, 평탄화 그래프 하나를 스캔 서비스에 제출한 뒤
//! 전체 포레스트로 응답의 영향 경로를 채웁니다.
//!
//! # 흐름
//!
//! ```text
//! DependencySource* --collect--> RawDependencyGraph* --TreeBuilder--> DependencyForest
//!                                                                        |
//!                                              flattened() --> GraphScanService
//!                                                                        |
//!                                            attach_impact_paths <-- ScanResponse
//! ```
//!
//! 한 기술의 실패는 에러 목록에 쌓이고 나머지 기술은 계속 처리됩니다.

use std::collections::BTreeSet;
use std::sync::Arc;

use metrics::counter;
use tracing::{debug, info, warn};

use depaudit_core::metrics::{GRAPH_NODES_BUILT_TOTAL, LABEL_TECHNOLOGY};
use depaudit_core::response::{CveWhitelist, ScanResponse};
use depaudit_core::service::{GraphScanRequest, GraphScanService};
use depaudit_core::types::Technology;

use crate::builder::TreeBuilder;
use crate::error::ScaError;
use crate::forest::DependencyForest;
use crate::impact::attach_impact_paths;
use crate::source::DependencySource;

/// 기술 하나의 스캔 결과
#[derive(Debug, Clone)]
pub struct TechnologyScan {
    pub technology: Technology,
    /// 영향 경로 계산에 사용한 전체 포레스트
    pub forest: DependencyForest,
    /// 영향 경로가 채워진 응답
    pub response: ScanResponse,
}

/// SCA 실행 결과 (부분 결과와 합쳐진 에러)
#[derive(Debug, Default)]
pub struct ScaOutcome {
    pub scans: Vec<TechnologyScan>,
    pub error: Option<ScaError>,
}

impl ScaOutcome {
    /// 성공한 모든 스캔의 응답
    pub fn responses(&self) -> Vec<ScanResponse> {
        self.scans.iter().map(|s| s.response.clone()).collect()
    }

    /// 적용 가능성 스캔에 넘길 CVE 목록을 만듭니다.
    ///
    /// `all_dependencies`가 참이면 모든 고유 ID를 직접 의존성으로 취급합니다.
    pub fn cve_whitelist(&self, all_dependencies: bool) -> CveWhitelist {
        let direct_ids: BTreeSet<String> = self
            .scans
            .iter()
            .flat_map(|scan| {
                if all_dependencies {
                    scan.forest.unique_ids().clone()
                } else {
                    scan.forest.direct_dependencies()
                }
            })
            .collect();
        CveWhitelist::from_responses(&self.responses(), &direct_ids)
    }

    /// 에러를 분리해 `Result`로 변환합니다. 부분 결과는 버려집니다.
    pub fn into_result(self) -> Result<Vec<TechnologyScan>, ScaError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.scans),
        }
    }
}

/// 기술별 SCA 스캔 실행기
pub struct ScaRunner<S: GraphScanService> {
    service: Arc<S>,
    builder: TreeBuilder,
    project_key: Option<String>,
}

impl<S: GraphScanService> ScaRunner<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self {
            service,
            builder: TreeBuilder::new(),
            project_key: None,
        }
    }

    pub fn with_builder(mut self, builder: TreeBuilder) -> Self {
        self.builder = builder;
        self
    }

    pub fn with_project_key(mut self, project_key: impl Into<String>) -> Self {
        self.project_key = Some(project_key.into());
        self
    }

    /// 모든 어댑터를 기술별로 묶어 스캔합니다.
    pub async fn run(&self, sources: &[Box<dyn DependencySource>]) -> ScaOutcome {
        let mut outcome = ScaOutcome::default();
        let mut errors = Vec::new();

        for (technology, group) in group_by_technology(sources) {
            let forest = match self.build_forest(technology, &group) {
                Ok(forest) => forest,
                Err(e) => {
                    warn!(%technology, error = %e, "dependency collection failed");
                    errors.push(e);
                    continue;
                }
            };
            if forest.is_empty() {
                debug!(%technology, "no modules collected, skipping scan");
                continue;
            }

            match self.scan_forest(technology, forest).await {
                Ok(scan) => outcome.scans.push(scan),
                Err(e) => {
                    warn!(%technology, error = %e, "graph scan failed");
                    errors.push(e);
                }
            }
        }

        outcome.error = ScaError::join(errors);
        outcome
    }

    fn build_forest(
        &self,
        technology: Technology,
        sources: &[&dyn DependencySource],
    ) -> Result<DependencyForest, ScaError> {
        let mut forest = DependencyForest::new();
        for source in sources {
            for raw in source.collect()? {
                let (tree, unique_ids) = raw.build(&self.builder);
                debug!(
                    %technology,
                    root = %raw.root_id,
                    nodes = tree.node_count(),
                    unique = unique_ids.len(),
                    "module tree built"
                );
                forest.push(tree, unique_ids);
            }
        }
        counter!(GRAPH_NODES_BUILT_TOTAL, LABEL_TECHNOLOGY => technology.to_string())
            .increment(forest.node_count() as u64);
        Ok(forest)
    }

    async fn scan_forest(
        &self,
        technology: Technology,
        forest: DependencyForest,
    ) -> Result<TechnologyScan, ScaError> {
        let mut request = GraphScanRequest::new(forest.flattened()).with_technology(technology);
        request.project_key = self.project_key.clone();

        let mut response = self
            .service
            .scan_graph(request)
            .await
            .map_err(|source| ScaError::Service { technology, source })?;
        attach_impact_paths(&mut response, forest.trees());

        info!(
            %technology,
            scan_id = %response.scan_id,
            unique_ids = forest.unique_ids().len(),
            vulnerabilities = response.vulnerabilities.len(),
            violations = response.violations.len(),
            "technology scan completed"
        );
        Ok(TechnologyScan {
            technology,
            forest,
            response,
        })
    }
}

/// 처음 등장한 순서를 유지하며 기술별로 묶습니다.
fn group_by_technology(
    sources: &[Box<dyn DependencySource>],
) -> Vec<(Technology, Vec<&dyn DependencySource>)> {
    let mut groups: Vec<(Technology, Vec<&dyn DependencySource>)> = Vec::new();
    for source in sources {
        let technology = source.technology();
        match groups.iter_mut().find(|(t, _)| *t == technology) {
            Some((_, group)) => group.push(source.as_ref()),
            None => groups.push((technology, vec![source.as_ref()])),
        }
    }
    groups
}
