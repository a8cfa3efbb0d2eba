//! 의존성 트리 빌더
//!
//! 원시 간선 맵(`parent-id -> [child-id]`)과 루트 ID로부터 [`GraphNode`] 트리를 만듭니다.
//!
//! # 규칙
//!
//! - 깊이 우선으로 확장하며 자식 순서는 간선 맵의 순서를 따릅니다.
//! - 자식 ID가 현재 경로의 조상(자기 자신 포함)과 같으면 순환이므로 연결하지 않습니다.
//! - 한 ID가 빌드 전체에서 `max_appearances`번 생성되면 이후 등장은 건너뜁니다
//!   (다이아몬드 의존성의 반복 확장 방지).
//! - 방문한 모든 ID는 고유 ID 집합에 정확히 한 번 들어갑니다.
//! - 간선 맵에 키가 없는 자식 ID는 자식 없는 잎 노드가 됩니다.
//!
//! # 사용 예시
//!
//! ```
//! use std::collections::HashMap;
//! use depaudit_graph::builder::build_dependency_tree;
//!
//! let mut edges = HashMap::new();
//! edges.insert("npm://app:1.0.0".to_owned(), vec!["npm://left-pad:1.3.0".to_owned()]);
//!
//! let (tree, unique_ids) = build_dependency_tree("npm://app:1.0.0", &edges);
//! assert_eq!(tree.node_count(), 2);
//! assert_eq!(unique_ids.len(), 2);
//! ```

use std::collections::{BTreeSet, HashMap};

use tracing::trace;

use depaudit_core::graph::GraphNode;

/// 한 ID를 트리에 생성할 수 있는 최대 횟수 기본값
pub const DEFAULT_MAX_APPEARANCES: usize = 10;

/// 원시 간선 맵: 부모 ID -> 순서 있는 자식 ID 목록
pub type DependencyEdges = HashMap<String, Vec<String>>;

/// 기본 반복 한도로 트리를 만듭니다.
///
/// 반환값은 `(트리, 고유 ID 집합)`입니다.
pub fn build_dependency_tree(
    root_id: &str,
    edges: &DependencyEdges,
) -> (GraphNode, BTreeSet<String>) {
    TreeBuilder::new().build(root_id, edges)
}

/// 의존성 트리 빌더
#[derive(Debug, Clone, Copy)]
pub struct TreeBuilder {
    max_appearances: usize,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            max_appearances: DEFAULT_MAX_APPEARANCES,
        }
    }

    /// 반복 한도를 지정합니다. 0은 1로 취급합니다.
    pub fn max_appearances(mut self, max: usize) -> Self {
        self.max_appearances = max.max(1);
        self
    }

    /// 트리와 고유 ID 집합을 생성합니다.
    pub fn build(&self, root_id: &str, edges: &DependencyEdges) -> (GraphNode, BTreeSet<String>) {
        let mut expansion = Expansion {
            edges,
            max_appearances: self.max_appearances,
            appearances: HashMap::new(),
            ancestors: Vec::new(),
        };
        let tree = expansion.expand(root_id);
        let unique_ids = expansion.appearances.into_keys().map(str::to_owned).collect();
        (tree, unique_ids)
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 단일 빌드의 진행 상태
struct Expansion<'a> {
    edges: &'a DependencyEdges,
    max_appearances: usize,
    /// ID별 생성 횟수
    appearances: HashMap<&'a str, usize>,
    /// 루트부터 현재 노드까지의 ID
    ancestors: Vec<&'a str>,
}

impl<'a> Expansion<'a> {
    fn expand(&mut self, id: &'a str) -> GraphNode {
        *self.appearances.entry(id).or_insert(0) += 1;

        let Some(children) = self.edges.get(id) else {
            return GraphNode::leaf(id);
        };

        self.ancestors.push(id);
        let mut nodes = Vec::with_capacity(children.len());
        for child in children {
            let child = child.as_str();
            if self.ancestors.contains(&child) {
                trace!(parent = id, child, "cyclic dependency pruned");
                continue;
            }
            let seen = self.appearances.get(child).copied().unwrap_or(0);
            if seen >= self.max_appearances {
                trace!(child, seen, "repetition bound reached, not expanding");
                continue;
            }
            nodes.push(self.expand(child));
        }
        self.ancestors.pop();

        GraphNode::new(id, nodes)
    }
}
