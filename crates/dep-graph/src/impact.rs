//! 영향 경로 재구성
//!
//! 전체(비평탄화) 포레스트를 깊이 우선으로 순회하며, 대상 컴포넌트에 도달한
//! 모든 가지마다 루트부터 그 컴포넌트까지의 ID 경로를 하나씩 기록합니다.
//! 같은 컴포넌트가 여러 가지로 도달 가능하면 가지 수만큼 경로가 생깁니다.

use std::collections::{BTreeSet, HashMap};

use depaudit_core::graph::GraphNode;
use depaudit_core::response::{ImpactPath, ScanResponse};

/// 대상 컴포넌트별 영향 경로를 계산합니다.
///
/// 모든 대상 ID는 결과에 키로 존재하며, 도달하지 못한 대상은 빈 목록을 가집니다.
pub fn build_impact_paths(
    forest: &[GraphNode],
    targets: &BTreeSet<String>,
) -> HashMap<String, Vec<ImpactPath>> {
    let mut paths: HashMap<String, Vec<ImpactPath>> = targets
        .iter()
        .map(|target| (target.clone(), Vec::new()))
        .collect();
    if targets.is_empty() {
        return paths;
    }

    let mut current = Vec::new();
    for root in forest {
        collect_paths(root, &mut current, &mut paths);
    }
    paths
}

fn collect_paths(
    node: &GraphNode,
    current: &mut Vec<String>,
    paths: &mut HashMap<String, Vec<ImpactPath>>,
) {
    current.push(node.id().to_owned());
    if let Some(found) = paths.get_mut(node.id()) {
        found.push(current.clone());
    }
    for child in node.children() {
        collect_paths(child, current, paths);
    }
    current.pop();
}

/// 응답의 모든 컴포넌트에 영향 경로를 덧붙입니다.
///
/// 기존 경로는 유지되고 새 경로만 뒤에 추가됩니다.
pub fn attach_impact_paths(response: &mut ScanResponse, forest: &[GraphNode]) {
    let targets = response.component_ids();
    let paths = build_impact_paths(forest, &targets);
    for (id, component) in response.components_mut() {
        if let Some(found) = paths.get(id) {
            component.impact_paths.extend(found.iter().cloned());
        }
    }
}
