//! `depaudit graph` command handler

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

use serde::Serialize;
use tracing::info;

use depaudit_core::response::ImpactPath;
use depaudit_core::types::Technology;
use depaudit_graph::{
    DependencyForest, DependencySource, JsonEdgeSource, TreeBuilder, build_impact_paths,
};

use crate::cli::GraphArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `graph` command.
pub fn execute(args: GraphArgs, writer: &OutputWriter) -> Result<(), CliError> {
    let source = JsonEdgeSource::load(&args.edges)?;
    let report = build_graph_report(&source, args.max_appearances, &args.targets);

    info!(
        path = %args.edges.display(),
        technology = %report.technology,
        modules = report.modules.len(),
        unique_ids = report.flattened.len(),
        "dependency graph built"
    );

    writer.render(&report)?;
    Ok(())
}

/// Build every module tree of `source` and resolve impact paths for `targets`.
pub fn build_graph_report(
    source: &JsonEdgeSource,
    max_appearances: usize,
    targets: &[String],
) -> GraphReport {
    let builder = TreeBuilder::new().max_appearances(max_appearances);
    let mut forest = DependencyForest::new();
    let mut modules = Vec::with_capacity(source.modules().len());

    for raw in source.modules() {
        let (tree, unique_ids) = raw.build(&builder);
        modules.push(ModuleSummary {
            root_id: raw.root_id.clone(),
            nodes: tree.node_count(),
            depth: tree.depth(),
            unique_ids: unique_ids.len(),
        });
        forest.push(tree, unique_ids);
    }

    let flattened = forest
        .flattened()
        .children()
        .iter()
        .map(|node| node.id().to_owned())
        .collect();

    let targets: BTreeSet<String> = targets.iter().cloned().collect();
    let impact_paths = build_impact_paths(forest.trees(), &targets)
        .into_iter()
        .collect();

    GraphReport {
        source: source.path().display().to_string(),
        technology: source.technology(),
        modules,
        flattened,
        direct_dependencies: forest.direct_dependencies(),
        impact_paths,
    }
}

#[derive(Debug, Serialize)]
pub struct ModuleSummary {
    pub root_id: String,
    pub nodes: usize,
    pub depth: usize,
    pub unique_ids: usize,
}

/// Output of `depaudit graph`.
#[derive(Debug, Serialize)]
pub struct GraphReport {
    pub source: String,
    pub technology: Technology,
    pub modules: Vec<ModuleSummary>,
    /// Unique ids of the flattened request graph, sorted.
    pub flattened: Vec<String>,
    pub direct_dependencies: BTreeSet<String>,
    pub impact_paths: BTreeMap<String, Vec<ImpactPath>>,
}

impl Render for GraphReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Dependency Graph: {} ({})", self.source.bold(), self.technology)?;
        writeln!(w)?;
        writeln!(w, "{:<50} {:>7} {:>6} {:>7}", "Module", "Nodes", "Depth", "Unique")?;
        writeln!(w, "{}", "-".repeat(73))?;
        for module in &self.modules {
            writeln!(
                w,
                "{:<50} {:>7} {:>6} {:>7}",
                module.root_id, module.nodes, module.depth, module.unique_ids
            )?;
        }

        writeln!(w)?;
        writeln!(
            w,
            "Unique components: {} ({} direct)",
            self.flattened.len().to_string().bold(),
            self.direct_dependencies.len()
        )?;
        for id in &self.flattened {
            let marker = if self.direct_dependencies.contains(id) {
                "*"
            } else {
                " "
            };
            writeln!(w, "  {marker} {id}")?;
        }

        for (target, paths) in &self.impact_paths {
            writeln!(w)?;
            writeln!(w, "Impact paths for {}:", target.bold())?;
            if paths.is_empty() {
                writeln!(w, "  {}", "not reachable from any module".yellow())?;
            }
            for path in paths {
                writeln!(w, "  {}", path.join(" -> "))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EDGES: &str = r#"{
        "technology": "npm",
        "modules": [
            {
                "root_id": "npm://storefront:1.0.0",
                "edges": {
                    "npm://storefront:1.0.0": ["npm://express:4.17.1", "npm://lodash:4.17.20"],
                    "npm://express:4.17.1": ["npm://qs:6.7.0", "npm://debug:2.6.9"],
                    "npm://qs:6.7.0": ["npm://side-channel:1.0.4"],
                    "npm://debug:2.6.9": ["npm://ms:2.0.0"]
                }
            },
            {
                "root_id": "npm://admin:0.3.0",
                "edges": {
                    "npm://admin:0.3.0": ["npm://express:4.17.1"],
                    "npm://express:4.17.1": ["npm://qs:6.7.0"]
                }
            }
        ]
    }"#;

    fn report(targets: &[&str]) -> GraphReport {
        let source = JsonEdgeSource::parse("edges.json", EDGES).expect("valid edge file");
        let targets: Vec<String> = targets.iter().map(|t| (*t).to_owned()).collect();
        build_graph_report(&source, depaudit_graph::DEFAULT_MAX_APPEARANCES, &targets)
    }

    #[test]
    fn test_module_summaries() {
        let report = report(&[]);
        assert_eq!(report.technology, Technology::Npm);
        assert_eq!(report.modules.len(), 2);
        assert_eq!(report.modules[0].root_id, "npm://storefront:1.0.0");
        assert_eq!(report.modules[0].nodes, 7);
        assert_eq!(report.modules[0].unique_ids, 7);
        assert_eq!(report.modules[1].nodes, 3);
    }

    #[test]
    fn test_flattened_ids_are_unique_and_sorted() {
        let report = report(&[]);
        assert_eq!(report.flattened.len(), 8);
        let mut sorted = report.flattened.clone();
        sorted.sort();
        assert_eq!(report.flattened, sorted);
        assert!(report.direct_dependencies.contains("npm://lodash:4.17.20"));
        assert!(!report.direct_dependencies.contains("npm://qs:6.7.0"));
    }

    #[test]
    fn test_impact_paths_cover_every_module() {
        let report = report(&["npm://qs:6.7.0", "npm://left-pad:1.3.0"]);
        let qs = &report.impact_paths["npm://qs:6.7.0"];
        assert_eq!(qs.len(), 2);
        assert_eq!(
            qs[0],
            vec!["npm://storefront:1.0.0", "npm://express:4.17.1", "npm://qs:6.7.0"]
        );
        assert_eq!(qs[1][0], "npm://admin:0.3.0");
        assert!(report.impact_paths["npm://left-pad:1.3.0"].is_empty());
    }

    #[test]
    fn test_text_rendering() {
        colored::control::set_override(false);
        let report = report(&["npm://ms:2.0.0", "npm://left-pad:1.3.0"]);
        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("render");
        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains("Unique components: 8 (2 direct)"));
        assert!(output.contains(
            "npm://storefront:1.0.0 -> npm://express:4.17.1 -> npm://debug:2.6.9 -> npm://ms:2.0.0"
        ));
        assert!(output.contains("not reachable from any module"));
    }
}
