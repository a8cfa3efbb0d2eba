//! 생태계 어댑터 경계
//!
//! 각 패키지 관리자 어댑터는 모듈마다 [`RawDependencyGraph`]를 만들어 [`DependencySource`]로
//! 노출합니다. 빌더는 어댑터가 어떤 도구를 실행했는지 알지 못합니다.
//!
//! 파일 기반 어댑터 [`JsonEdgeSource`]는 아래 형식의 JSON을 읽습니다.
//!
//! ```json
//! {
//!   "technology": "npm",
//!   "modules": [
//!     {
//!       "root_id": "npm://app:1.0.0",
//!       "edges": { "npm://app:1.0.0": ["npm://left-pad:1.3.0"] },
//!       "known_ids": ["npm://app:1.0.0", "npm://left-pad:1.3.0"]
//!     }
//!   ]
//! }
//! ```

use std::borrow::Cow;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use depaudit_core::graph::GraphNode;
use depaudit_core::types::Technology;

use crate::builder::{DependencyEdges, TreeBuilder};
use crate::error::ScaError;

/// 어댑터가 만든 모듈 하나의 원시 그래프
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDependencyGraph {
    /// 모듈 루트 ID
    pub root_id: String,
    /// 부모 ID -> 순서 있는 자식 ID 목록
    #[serde(default)]
    pub edges: DependencyEdges,
    /// 의존성 해석기가 인정한 ID 집합 (없으면 필터링하지 않음)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known_ids: Option<HashSet<String>>,
}

impl RawDependencyGraph {
    pub fn new(root_id: impl Into<String>, edges: DependencyEdges) -> Self {
        Self {
            root_id: root_id.into(),
            edges,
            known_ids: None,
        }
    }

    pub fn with_known_ids(mut self, known_ids: HashSet<String>) -> Self {
        self.known_ids = Some(known_ids);
        self
    }

    /// 알려진 ID 집합에 없는 자식을 제거한 간선 맵을 반환합니다.
    ///
    /// 루트 ID는 집합에 없어도 유지됩니다.
    pub fn effective_edges(&self) -> Cow<'_, DependencyEdges> {
        let Some(known) = &self.known_ids else {
            return Cow::Borrowed(&self.edges);
        };
        let filtered = self
            .edges
            .iter()
            .map(|(parent, children)| {
                let kept: Vec<String> = children
                    .iter()
                    .filter(|child| known.contains(*child) || **child == self.root_id)
                    .cloned()
                    .collect();
                if kept.len() != children.len() {
                    debug!(
                        parent = %parent,
                        dropped = children.len() - kept.len(),
                        "edges to unresolved ids dropped"
                    );
                }
                (parent.clone(), kept)
            })
            .collect();
        Cow::Owned(filtered)
    }

    /// 트리와 고유 ID 집합을 생성합니다.
    pub fn build(&self, builder: &TreeBuilder) -> (GraphNode, BTreeSet<String>) {
        builder.build(&self.root_id, &self.effective_edges())
    }
}

/// 생태계 어댑터
pub trait DependencySource: Send + Sync {
    /// 어댑터가 다루는 기술
    fn technology(&self) -> Technology;

    /// 모듈별 원시 그래프를 수집합니다.
    ///
    /// # Errors
    ///
    /// 외부 도구 실행이나 출력 해석에 실패하면 `ScaError`를 반환합니다.
    fn collect(&self) -> Result<Vec<RawDependencyGraph>, ScaError>;
}

#[derive(Debug, Deserialize)]
struct EdgeFile {
    technology: Technology,
    #[serde(default)]
    modules: Vec<RawDependencyGraph>,
}

/// JSON 파일에서 원시 그래프를 읽는 어댑터
#[derive(Debug, Clone)]
pub struct JsonEdgeSource {
    path: PathBuf,
    technology: Technology,
    modules: Vec<RawDependencyGraph>,
}

impl JsonEdgeSource {
    /// 파일을 읽고 파싱합니다.
    ///
    /// # Errors
    ///
    /// - `ScaError::Io`: 파일을 읽을 수 없음
    /// - `ScaError::Parse`: JSON 형식 오류 또는 모듈 루트 ID 누락
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScaError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ScaError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::parse(path, &content)
    }

    /// 이미 읽은 내용을 파싱합니다. `path`는 에러 메시지에만 사용됩니다.
    pub fn parse(path: impl AsRef<Path>, content: &str) -> Result<Self, ScaError> {
        let path = path.as_ref();
        let file: EdgeFile = serde_json::from_str(content).map_err(|e| ScaError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        if let Some(index) = file.modules.iter().position(|m| m.root_id.is_empty()) {
            return Err(ScaError::Parse {
                path: path.display().to_string(),
                reason: format!("module {index} has an empty root_id"),
            });
        }
        Ok(Self {
            path: path.to_path_buf(),
            technology: file.technology,
            modules: file.modules,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn modules(&self) -> &[RawDependencyGraph] {
        &self.modules
    }
}

impl DependencySource for JsonEdgeSource {
    fn technology(&self) -> Technology {
        self.technology
    }

    fn collect(&self) -> Result<Vec<RawDependencyGraph>, ScaError> {
        Ok(self.modules.clone())
    }
}
