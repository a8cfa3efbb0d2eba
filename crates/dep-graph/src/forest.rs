//! 의존성 포레스트
//!
//! 한 프로젝트의 모듈별 전체 트리와 고유 ID 합집합을 함께 보관합니다.
//! 전체 트리는 영향 경로 재구성에, 평탄화 그래프는 스캔 서비스 제출에 사용합니다.

use std::collections::BTreeSet;

use depaudit_core::graph::{FLAT_ROOT_ID, GraphNode};

/// 모듈별 전체 트리와 고유 ID 집합
#[derive(Debug, Clone, Default)]
pub struct DependencyForest {
    trees: Vec<GraphNode>,
    unique_ids: BTreeSet<String>,
}

impl DependencyForest {
    pub fn new() -> Self {
        Self::default()
    }

    /// 모듈 트리를 추가하고 고유 ID를 합칩니다.
    pub fn push(&mut self, tree: GraphNode, unique_ids: BTreeSet<String>) {
        self.trees.push(tree);
        self.unique_ids.extend(unique_ids);
    }

    /// 다른 포레스트를 뒤에 이어 붙입니다.
    pub fn extend(&mut self, other: DependencyForest) {
        self.trees.extend(other.trees);
        self.unique_ids.extend(other.unique_ids);
    }

    pub fn trees(&self) -> &[GraphNode] {
        &self.trees
    }

    pub fn unique_ids(&self) -> &BTreeSet<String> {
        &self.unique_ids
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// 전체 트리의 노드 수 합계
    pub fn node_count(&self) -> usize {
        self.trees.iter().map(GraphNode::node_count).sum()
    }

    /// 스캔 서비스에 제출할 평탄화 그래프를 만듭니다.
    pub fn flattened(&self) -> GraphNode {
        flatten_unique_ids(&self.unique_ids)
    }

    /// 각 루트의 1단계 자식 ID (직접 의존성)
    pub fn direct_dependencies(&self) -> BTreeSet<String> {
        direct_dependencies(&self.trees)
    }
}

/// `root` 센티널 아래에 고유 ID당 잎 노드 하나를 둔 그래프를 만듭니다.
///
/// 자식은 ID 순으로 정렬되며 더 이상 중첩되지 않습니다.
pub fn flatten_unique_ids<'a>(ids: impl IntoIterator<Item = &'a String>) -> GraphNode {
    let ids: BTreeSet<&String> = ids.into_iter().collect();
    GraphNode::new(
        FLAT_ROOT_ID,
        ids.into_iter().map(|id| GraphNode::leaf(id.as_str())).collect(),
    )
}

/// 포레스트 각 루트의 1단계 자식 ID를 모읍니다.
pub fn direct_dependencies(trees: &[GraphNode]) -> BTreeSet<String> {
    trees
        .iter()
        .flat_map(GraphNode::children)
        .map(|child| child.id().to_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| (*v).to_owned()).collect()
    }

    #[test]
    fn flattened_graph_is_one_level_and_sorted() {
        let mut forest = DependencyForest::new();
        forest.push(
            GraphNode::new("mod-a", vec![GraphNode::leaf("z")]),
            ids(&["mod-a", "z"]),
        );
        forest.push(
            GraphNode::new("mod-b", vec![GraphNode::leaf("c")]),
            ids(&["mod-b", "c", "z"]),
        );

        let flat = forest.flattened();
        assert_eq!(flat.id(), FLAT_ROOT_ID);
        assert_eq!(flat.depth(), 2);
        let children: Vec<_> = flat.children().iter().map(GraphNode::id).collect();
        assert_eq!(children, vec!["c", "mod-a", "mod-b", "z"]);
    }

    #[test]
    fn empty_forest_flattens_to_bare_root() {
        let forest = DependencyForest::new();
        assert!(forest.is_empty());
        assert!(forest.flattened().is_leaf());
    }

    #[test]
    fn direct_dependencies_are_first_level_children_only() {
        let tree = GraphNode::new(
            "app",
            vec![
                GraphNode::new("lib-a", vec![GraphNode::leaf("deep")]),
                GraphNode::leaf("lib-b"),
            ],
        );
        let direct = direct_dependencies(&[tree]);
        assert_eq!(direct, ids(&["lib-a", "lib-b"]));
    }

    #[test]
    fn extend_merges_trees_and_ids() {
        let mut left = DependencyForest::new();
        left.push(GraphNode::leaf("a"), ids(&["a"]));
        let mut right = DependencyForest::new();
        right.push(GraphNode::new("b", vec![GraphNode::leaf("a")]), ids(&["a", "b"]));

        left.extend(right);
        assert_eq!(left.trees().len(), 2);
        assert_eq!(left.unique_ids().len(), 2);
        assert_eq!(left.node_count(), 3);
    }
}
