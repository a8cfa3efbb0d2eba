//! `depaudit jas` command handler

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use depaudit_core::config::DepauditConfig;
use depaudit_core::response::CveWhitelist;
use depaudit_jas::{
    AnalyzerManager, ApplicabilityStatus, ExtendedScanResults, JasRunOptions, JasScanType,
    JasScannerConfig, JasSession, SourceFinding, load_modules, run_jas_scanners,
};

use crate::cli::JasArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `jas` command.
///
/// Findings collected before a scanner failed are rendered first; the failure
/// is then returned as `CliError::Scan`.
pub async fn execute(
    args: JasArgs,
    config: &DepauditConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    if !config.jas.enabled {
        return Err(CliError::Config(
            "jas scanning is disabled (jas.enabled = false)".to_owned(),
        ));
    }

    let scanner_config = scanner_config(&args, config)?;
    let options = run_options(&args, &scanner_config)?;

    let base = std::env::current_dir()?;
    let modules = load_modules(&scanner_config.apps_config, &scanner_config.working_dirs, &base).await?;
    info!(
        modules = modules.len(),
        scanners = ?options.scan_types,
        engine = %scanner_config.analyzer_manager_path,
        "starting jas scan"
    );

    let engine = Arc::new(AnalyzerManager::new(&scanner_config));
    let session = JasSession::builder(engine)
        .modules(modules)
        .multi_scan_id(scanner_config.multi_scan_id.clone())
        .build()?;
    let session_id = session.session_id().to_owned();

    let outcome = run_jas_scanners(&session, &options).await;
    if let Err(e) = session.close() {
        warn!(error = %e, "failed to remove jas session directory");
    }

    let report = JasReport::new(session_id, &base, outcome.results);
    writer.render(&report)?;

    match outcome.error {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

/// Merge file configuration with command line overrides and validate.
fn scanner_config(args: &JasArgs, config: &DepauditConfig) -> Result<JasScannerConfig, CliError> {
    let mut scanner_config = JasScannerConfig::from_core(&config.jas, &config.server);
    if !args.working_dirs.is_empty() {
        scanner_config.working_dirs = args.working_dirs.clone();
    }
    if let Some(path) = &args.analyzer_manager {
        scanner_config.analyzer_manager_path = path.clone();
    }
    if let Some(secs) = args.timeout_secs {
        scanner_config.timeout_secs = secs;
    }
    if args.third_party {
        scanner_config.third_party_applicability = true;
    }
    scanner_config.multi_scan_id = args.multi_scan_id.clone();
    scanner_config.validate()?;
    Ok(scanner_config)
}

fn run_options(args: &JasArgs, scanner_config: &JasScannerConfig) -> Result<JasRunOptions, CliError> {
    let scan_types = parse_scan_types(&args.scanners)?;
    Ok(JasRunOptions {
        whitelist: CveWhitelist {
            direct: args.cves.iter().cloned().collect(),
            indirect: args.indirect_cves.iter().cloned().collect(),
        },
        third_party_applicability: scanner_config.third_party_applicability,
        scan_types,
    })
}

/// Parse `--scanner` values. No values selects every scanner.
fn parse_scan_types(values: &[String]) -> Result<Vec<JasScanType>, CliError> {
    if values.is_empty() {
        return Ok(JasScanType::ALL.to_vec());
    }
    let mut scan_types = Vec::with_capacity(values.len());
    for value in values {
        let scan_type = JasScanType::from_str_loose(value).ok_or_else(|| {
            CliError::Command(format!(
                "unknown scanner: {value} (expected: applicability, secrets, iac, sast)"
            ))
        })?;
        if !scan_types.contains(&scan_type) {
            scan_types.push(scan_type);
        }
    }
    Ok(scan_types)
}

/// Output of `depaudit jas`.
#[derive(Debug, Serialize)]
pub struct JasReport {
    pub session_id: String,
    pub working_dir: String,
    pub summary: JasSummary,
    pub results: ExtendedScanResults,
}

#[derive(Debug, Default, Serialize)]
pub struct JasSummary {
    pub applicable_cves: usize,
    pub secrets: usize,
    pub iac: usize,
    pub sast: usize,
}

impl JasReport {
    pub fn new(session_id: String, working_dir: &Path, results: ExtendedScanResults) -> Self {
        let summary = JasSummary {
            applicable_cves: results
                .applicability
                .iter()
                .filter(|r| r.status == ApplicabilityStatus::Applicable)
                .count(),
            secrets: results.secrets.len(),
            iac: results.iac.len(),
            sast: results.sast.len(),
        };
        Self {
            session_id,
            working_dir: working_dir.display().to_string(),
            summary,
            results,
        }
    }
}

impl Render for JasReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "JAS Scan: {}", self.working_dir.bold())?;
        writeln!(w, "  Session: {}", self.session_id)?;
        writeln!(w)?;

        if !self.results.applicability.is_empty() {
            writeln!(w, "{}", "Applicability".bold())?;
            writeln!(w, "  {:<20} {:<16} {}", "CVE", "Status", "Evidence")?;
            for entry in &self.results.applicability {
                let status = match entry.status {
                    ApplicabilityStatus::Applicable => entry.status.to_string().red().bold(),
                    ApplicabilityStatus::NotApplicable => entry.status.to_string().green(),
                    ApplicabilityStatus::Undetermined => entry.status.to_string().yellow(),
                };
                let evidence = entry
                    .evidence
                    .first()
                    .map(|loc| format!("{}:{}", loc.file, loc.line_column()))
                    .unwrap_or_default();
                writeln!(w, "  {:<20} {:<16} {}", entry.cve, status, evidence)?;
            }
            writeln!(w)?;
        }

        render_findings(w, "Secrets", &self.results.secrets)?;
        render_findings(w, "IaC", &self.results.iac)?;
        render_findings(w, "SAST", &self.results.sast)?;

        writeln!(
            w,
            "Summary: {} applicable CVEs, {} secrets, {} IaC, {} SAST findings",
            self.summary.applicable_cves, self.summary.secrets, self.summary.iac, self.summary.sast
        )
    }
}

fn render_findings(w: &mut dyn Write, title: &str, findings: &[SourceFinding]) -> std::io::Result<()> {
    use colored::Colorize;

    if findings.is_empty() {
        return Ok(());
    }
    writeln!(w, "{} ({})", title.bold(), findings.len())?;
    for finding in findings {
        writeln!(
            w,
            "  [{:<8}] {}:{}  {}",
            finding.severity.to_string(),
            finding.location.file,
            finding.location.line_column(),
            finding.message
        )?;
        if !finding.location.snippet.is_empty() {
            writeln!(w, "             {}", finding.location.snippet.dimmed())?;
        }
        for (index, flow) in finding.code_flows.iter().enumerate() {
            let steps: Vec<String> = flow
                .iter()
                .map(|loc| format!("{}:{}", loc.file, loc.line_column()))
                .collect();
            writeln!(w, "             flow {}: {}", index + 1, steps.join(" -> "))?;
        }
    }
    writeln!(w)
}

#[cfg(test)]
mod tests {
    use super::*;

    use depaudit_core::types::Severity;
    use depaudit_jas::{CveApplicability, FindingLocation};

    fn args() -> JasArgs {
        JasArgs {
            working_dirs: Vec::new(),
            cves: Vec::new(),
            indirect_cves: Vec::new(),
            scanners: Vec::new(),
            third_party: false,
            analyzer_manager: Some("/opt/analyzer/analyzerManager".to_owned()),
            timeout_secs: None,
            multi_scan_id: None,
        }
    }

    fn location(file: &str, line: usize, snippet: &str) -> FindingLocation {
        FindingLocation {
            file: file.to_owned(),
            start_line: line,
            start_column: 5,
            snippet: snippet.to_owned(),
        }
    }

    #[test]
    fn test_parse_scan_types_defaults_to_all() {
        assert_eq!(parse_scan_types(&[]).unwrap(), JasScanType::ALL.to_vec());
    }

    #[test]
    fn test_parse_scan_types_dedups_and_keeps_order() {
        let values = vec!["SAST".to_owned(), "secrets".to_owned(), "zd".to_owned()];
        assert_eq!(
            parse_scan_types(&values).unwrap(),
            vec![JasScanType::Sast, JasScanType::Secrets]
        );
    }

    #[test]
    fn test_parse_scan_types_rejects_unknown() {
        let err = parse_scan_types(&["dast".to_owned()]).unwrap_err();
        assert!(err.to_string().contains("dast"));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_scanner_config_applies_overrides() {
        let mut config = DepauditConfig::default();
        config.jas.timeout_secs = 30;
        let mut args = args();
        args.working_dirs = vec!["services/api".to_owned()];
        args.timeout_secs = Some(600);
        args.third_party = true;
        args.multi_scan_id = Some("msi-7".to_owned());

        let scanner_config = scanner_config(&args, &config).unwrap();
        assert_eq!(scanner_config.working_dirs, vec!["services/api"]);
        assert_eq!(scanner_config.timeout_secs, 600);
        assert!(scanner_config.third_party_applicability);
        assert_eq!(scanner_config.multi_scan_id.as_deref(), Some("msi-7"));
    }

    #[test]
    fn test_missing_engine_path_is_config_error() {
        let mut args = args();
        args.analyzer_manager = None;
        let err = scanner_config(&args, &DepauditConfig::default()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_run_options_build_whitelist() {
        let mut args = args();
        args.cves = vec!["CVE-2021-23337".to_owned()];
        args.indirect_cves = vec!["CVE-2022-0155".to_owned()];
        let scanner_config = scanner_config(&args, &DepauditConfig::default()).unwrap();
        let options = run_options(&args, &scanner_config).unwrap();
        assert!(options.whitelist.direct.contains("CVE-2021-23337"));
        assert!(options.whitelist.indirect.contains("CVE-2022-0155"));
        assert_eq!(options.scan_types.len(), 4);
    }

    #[test]
    fn test_report_summary_and_rendering() {
        colored::control::set_override(false);
        let results = ExtendedScanResults {
            applicability: vec![
                CveApplicability {
                    cve: "CVE-2021-23337".to_owned(),
                    status: ApplicabilityStatus::Applicable,
                    evidence: vec![location("src/cart.js", 17, "_.template(input)")],
                },
                CveApplicability {
                    cve: "CVE-2022-0155".to_owned(),
                    status: ApplicabilityStatus::NotApplicable,
                    evidence: Vec::new(),
                },
            ],
            secrets: vec![SourceFinding {
                scan_type: JasScanType::Secrets,
                severity: Severity::Medium,
                rule_id: "REQ.SECRET.KEYS".to_owned(),
                message: "Secret keys were found".to_owned(),
                location: location("config/keys.js", 3, "347************"),
                code_flows: Vec::new(),
            }],
            iac: Vec::new(),
            sast: vec![SourceFinding {
                scan_type: JasScanType::Sast,
                severity: Severity::High,
                rule_id: "js-sql-injection".to_owned(),
                message: "SQL injection".to_owned(),
                location: location("src/db.js", 41, "db.query(q)"),
                code_flows: vec![vec![
                    location("src/routes.js", 8, "req.query.id"),
                    location("src/db.js", 41, "db.query(q)"),
                ]],
            }],
        };

        let report = JasReport::new("session-1".to_owned(), Path::new("/work/app"), results);
        assert_eq!(report.summary.applicable_cves, 1);
        assert_eq!(report.summary.secrets, 1);
        assert_eq!(report.summary.sast, 1);

        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("render");
        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains("CVE-2021-23337"));
        assert!(output.contains("src/cart.js:17:5"));
        assert!(output.contains("347************"));
        assert!(output.contains("flow 1: src/routes.js:8:5 -> src/db.js:41:5"));
        assert!(!output.contains("IaC ("));
        assert!(output.contains("Summary: 1 applicable CVEs, 1 secrets, 0 IaC, 1 SAST findings"));
    }

    #[test]
    fn test_report_json_shape() {
        let report = JasReport::new(
            "session-2".to_owned(),
            Path::new("/work/app"),
            ExtendedScanResults::default(),
        );
        let value = serde_json::to_value(&report).expect("serialize");
        assert_eq!(value["session_id"], "session-2");
        assert_eq!(value["summary"]["secrets"], 0);
        assert!(value["results"]["sast"].as_array().expect("array").is_empty());
    }
}
