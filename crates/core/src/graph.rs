//! 의존성 그래프 노드
//!
//! [`GraphNode`]는 의존성 하나(또는 바이너리 스캔 대상 하나)를 나타냅니다.
//! 생태계 어댑터, 그래프 빌더, 바이너리 인덱서 출력, 스캔 요청이 모두 이 타입을 공유합니다.
//!
//! 노드는 생성 시점에 자식까지 모두 확정되며 이후에는 읽기 전용입니다.
//! 부모 포인터는 두지 않습니다. 순환 검사는 빌더가 조상 ID 목록으로 수행합니다.

use serde::{Deserialize, Serialize};

/// 평탄화된 요청 그래프의 루트 ID
pub const FLAT_ROOT_ID: &str = "root";

/// 의존성 그래프 노드
///
/// 직렬화 형식은 인덱서 stdout 및 스캔 서비스 요청과 동일합니다
/// (`component_id`, `sha256`, `path`, `nodes`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    #[serde(rename = "component_id", default)]
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    nodes: Vec<GraphNode>,
}

impl GraphNode {
    /// 자식이 없는 노드를 생성합니다.
    pub fn leaf(id: impl Into<String>) -> Self {
        Self::new(id, Vec::new())
    }

    /// 자식 목록과 함께 노드를 생성합니다.
    pub fn new(id: impl Into<String>, nodes: Vec<GraphNode>) -> Self {
        Self {
            id: id.into(),
            sha256: None,
            path: None,
            nodes,
        }
    }

    /// 바이너리 스캔 대상의 파일 경로를 설정합니다.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// 바이너리 스캔 대상의 SHA-256 체크섬을 설정합니다.
    pub fn with_sha256(mut self, sha256: impl Into<String>) -> Self {
        self.sha256 = Some(sha256.into());
        self
    }

    /// 컴포넌트 ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// 자식 노드 (순서 유지)
    pub fn children(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn sha256(&self) -> Option<&str> {
        self.sha256.as_deref()
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// 자식이 없는지 확인합니다.
    pub fn is_leaf(&self) -> bool {
        self.nodes.is_empty()
    }

    /// 자신을 포함한 전체 노드 수를 반환합니다.
    pub fn node_count(&self) -> usize {
        1 + self.nodes.iter().map(GraphNode::node_count).sum::<usize>()
    }

    /// 트리 깊이를 반환합니다 (잎 노드 하나는 1).
    pub fn depth(&self) -> usize {
        1 + self.nodes.iter().map(GraphNode::depth).max().unwrap_or(0)
    }

    /// 전위 순회로 모든 노드를 방문합니다.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a GraphNode)) {
        visit(self);
        for child in &self.nodes {
            child.walk(visit);
        }
    }
}
