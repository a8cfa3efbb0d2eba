//! JAS 세션 드라이버
//!
//! [`JasSession`]은 임시 디렉토리 하나와 그 안의 설정/결과 파일 한 쌍을 소유합니다.
//! 모듈은 순서대로 하나씩 처리하며 파일 쌍은 모듈마다 재사용됩니다.
//!
//! # 모듈 단위 처리 단계
//!
//! ```text
//! Idle -> ConfigWritten -> EngineExecuted -> ResultsParsed -> Aggregated
//!   \__________________________\_______________\______________-> Failed
//! ```
//!
//! 단계가 끝나면 성공 여부와 관계없이 설정/결과 파일을 지웁니다.
//!
//! # 에러 정책
//!
//! - 권한 없음 / 지원하지 않는 명령 / 지원하지 않는 OS 종료: 해당 스캐너 종류를 조용히 종료
//! - 엔진 실행 실패: 이후 모듈 처리 중단
//! - 그 외: 에러를 모으고 다음 모듈 진행
//! - 파일 정리 실패: 앞선 에러와 함께 보고

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use tempfile::TempDir;
use tracing::{debug, info, warn};

use depaudit_core::metrics::{
    JAS_ENGINE_DURATION_SECONDS, JAS_FINDINGS_TOTAL, JAS_SCANS_TOTAL, LABEL_RESULT,
    LABEL_SCAN_TYPE,
};

use crate::engine::{AnalyzerEngine, EngineInvocation, ExecStatus};
use crate::error::JasError;
use crate::module::Module;
use crate::sarif::read_runs;
use crate::scanners::{ModuleScanner, ScanConfigFile};
use crate::types::JasScanType;

/// 세션 임시 디렉토리 접두어
const TEMP_DIR_PREFIX: &str = "depaudit-jas-";
const CONFIG_FILE_NAME: &str = "config.yaml";
const RESULTS_FILE_NAME: &str = "results.sarif";

/// 모듈 하나의 처리 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanPhase {
    Idle,
    ConfigWritten,
    EngineExecuted,
    ResultsParsed,
    Aggregated,
    Failed,
}

impl ScanPhase {
    fn state_name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ConfigWritten => "config_written",
            Self::EngineExecuted => "engine_executed",
            Self::ResultsParsed => "results_parsed",
            Self::Aggregated => "aggregated",
            Self::Failed => "failed",
        }
    }
}

/// 단계 전이를 기록합니다.
struct PhaseTracker<'a> {
    scan_type: JasScanType,
    module: &'a str,
    phase: ScanPhase,
}

impl<'a> PhaseTracker<'a> {
    fn new(scan_type: JasScanType, module: &'a str) -> Self {
        Self {
            scan_type,
            module,
            phase: ScanPhase::Idle,
        }
    }

    fn advance(&mut self, next: ScanPhase) {
        debug!(
            scan_type = %self.scan_type,
            module = self.module,
            from = self.phase.state_name(),
            to = next.state_name(),
            "scan phase transition"
        );
        self.phase = next;
    }

    fn fail(&mut self, err: &JasError) {
        warn!(
            scan_type = %self.scan_type,
            module = self.module,
            phase = self.phase.state_name(),
            error = %err,
            "module scan failed"
        );
        self.phase = ScanPhase::Failed;
    }
}

/// 모듈 하나의 처리 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModulePass {
    Ingested(usize),
    Skipped(ExecStatus),
}

/// JAS 세션
///
/// 엔진 핸들은 생성자로 주입되며 세션마다 독립적입니다.
pub struct JasSession<E: AnalyzerEngine> {
    engine: Arc<E>,
    modules: Vec<Module>,
    temp_dir: TempDir,
    config_path: PathBuf,
    results_path: PathBuf,
    multi_scan_id: Option<String>,
    session_id: String,
}

impl<E: AnalyzerEngine> JasSession<E> {
    pub fn builder(engine: Arc<E>) -> JasSessionBuilder<E> {
        JasSessionBuilder {
            engine,
            modules: Vec::new(),
            multi_scan_id: None,
            temp_root: None,
        }
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn results_path(&self) -> &Path {
        &self.results_path
    }

    /// 모든 모듈에 대해 스캐너 하나를 실행합니다.
    ///
    /// 실패한 모듈이 있어도 앞서 수집된 결과는 `scanner`에 남습니다.
    ///
    /// # Errors
    ///
    /// 모듈별 에러를 [`JasError::join`]으로 합쳐 반환합니다.
    pub async fn run<S: ModuleScanner>(&self, scanner: &mut S) -> Result<(), JasError> {
        let scan_type = scanner.scan_type();
        let mut errors = Vec::new();

        for module in &self.modules {
            if module.should_skip(scan_type) {
                debug!(%scan_type, module = %module.display_name(), "scanner excluded for module");
                continue;
            }

            match self.run_module(scanner, module).await {
                Ok(ModulePass::Ingested(count)) => {
                    counter!(JAS_SCANS_TOTAL, LABEL_SCAN_TYPE => scan_type.key(), LABEL_RESULT => "success")
                        .increment(1);
                    counter!(JAS_FINDINGS_TOTAL, LABEL_SCAN_TYPE => scan_type.key())
                        .increment(count as u64);
                }
                Ok(ModulePass::Skipped(status)) => {
                    counter!(JAS_SCANS_TOTAL, LABEL_SCAN_TYPE => scan_type.key(), LABEL_RESULT => "skipped")
                        .increment(1);
                    info!(%scan_type, reason = status.as_str(), "scanner skipped for this session");
                    break;
                }
                Err(err) => {
                    counter!(JAS_SCANS_TOTAL, LABEL_SCAN_TYPE => scan_type.key(), LABEL_RESULT => "failure")
                        .increment(1);
                    let fatal = err.is_fatal();
                    errors.push(err);
                    if fatal {
                        warn!(%scan_type, "stopping scanner after unrecoverable error");
                        break;
                    }
                }
            }
        }

        match JasError::join(errors) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// 모듈 하나를 처리하고 임시 파일을 정리합니다.
    async fn run_module<S: ModuleScanner>(
        &self,
        scanner: &mut S,
        module: &Module,
    ) -> Result<ModulePass, JasError> {
        let name = module.display_name();
        let mut tracker = PhaseTracker::new(scanner.scan_type(), &name);

        let result = self.execute_phases(scanner, module, &mut tracker).await;
        if let Err(err) = &result {
            tracker.fail(err);
        }

        let cleanup = self.remove_process_files().await;
        match (result, cleanup) {
            (result, None) => result,
            (Ok(_), Some(cleanup)) => Err(cleanup),
            (Err(err), Some(cleanup)) => Err(JasError::Joined(vec![err, cleanup])),
        }
    }

    async fn execute_phases<S: ModuleScanner>(
        &self,
        scanner: &mut S,
        module: &Module,
        tracker: &mut PhaseTracker<'_>,
    ) -> Result<ModulePass, JasError> {
        let scan_type = scanner.scan_type();

        let config = scanner.configure(module, &self.results_path);
        self.write_config(scan_type, &config.into_file()).await?;
        tracker.advance(ScanPhase::ConfigWritten);

        let invocation = EngineInvocation {
            scan_type,
            config_path: self.config_path.clone(),
            multi_scan_id: self.multi_scan_id.clone(),
        };
        let started = Instant::now();
        let code = self.engine.execute(&invocation).await?;
        histogram!(JAS_ENGINE_DURATION_SECONDS, LABEL_SCAN_TYPE => scan_type.key())
            .record(started.elapsed().as_secs_f64());
        tracker.advance(ScanPhase::EngineExecuted);

        match ExecStatus::from_code(code) {
            ExecStatus::Success => {}
            ExecStatus::Failed(code) => return Err(JasError::exit_code(scan_type, code)),
            skip => return Ok(ModulePass::Skipped(skip)),
        }

        let runs = read_runs(&self.results_path, scan_type).await?;
        tracker.advance(ScanPhase::ResultsParsed);

        let count = scanner.ingest(module, runs);
        tracker.advance(ScanPhase::Aggregated);
        Ok(ModulePass::Ingested(count))
    }

    async fn write_config(
        &self,
        scan_type: JasScanType,
        file: &ScanConfigFile,
    ) -> Result<(), JasError> {
        let config_write = |reason: String| JasError::ConfigWrite {
            scan_type,
            path: self.config_path.display().to_string(),
            reason,
        };
        let yaml = serde_yaml::to_string(file).map_err(|e| config_write(e.to_string()))?;
        tokio::fs::write(&self.config_path, yaml)
            .await
            .map_err(|e| config_write(e.to_string()))
    }

    /// 설정/결과 파일을 지웁니다. 이미 없는 파일은 무시합니다.
    async fn remove_process_files(&self) -> Option<JasError> {
        let mut errors = Vec::new();
        for path in [&self.config_path, &self.results_path] {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => errors.push(JasError::Cleanup {
                    path: path.display().to_string(),
                    source: e,
                }),
            }
        }
        JasError::join(errors)
    }

    /// 임시 디렉토리를 삭제하고 세션을 닫습니다.
    pub fn close(self) -> Result<(), JasError> {
        let path = self.temp_dir.path().display().to_string();
        self.temp_dir
            .close()
            .map_err(|e| JasError::Cleanup { path, source: e })
    }
}

/// [`JasSession`] 빌더
pub struct JasSessionBuilder<E: AnalyzerEngine> {
    engine: Arc<E>,
    modules: Vec<Module>,
    multi_scan_id: Option<String>,
    temp_root: Option<PathBuf>,
}

impl<E: AnalyzerEngine> JasSessionBuilder<E> {
    pub fn modules(mut self, modules: Vec<Module>) -> Self {
        self.modules = modules;
        self
    }

    pub fn multi_scan_id(mut self, id: Option<String>) -> Self {
        self.multi_scan_id = id;
        self
    }

    /// 임시 디렉토리를 만들 상위 디렉토리 (기본값: 시스템 임시 디렉토리)
    pub fn temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(root.into());
        self
    }

    /// 임시 디렉토리를 만들고 세션을 생성합니다.
    ///
    /// # Errors
    ///
    /// - `JasError::Config`: 모듈이 없음
    /// - `JasError::Io`: 임시 디렉토리 생성 실패
    pub fn build(self) -> Result<JasSession<E>, JasError> {
        if self.modules.is_empty() {
            return Err(JasError::Config {
                field: "modules".to_owned(),
                reason: "at least one module is required".to_owned(),
            });
        }

        let mut builder = tempfile::Builder::new();
        builder.prefix(TEMP_DIR_PREFIX);
        let temp_dir = match &self.temp_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(|e| JasError::Io {
            path: self
                .temp_root
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| std::env::temp_dir().display().to_string()),
            source: e,
        })?;

        let session_id = uuid::Uuid::new_v4().to_string();
        info!(
            session_id = %session_id,
            modules = self.modules.len(),
            temp_dir = %temp_dir.path().display(),
            "jas session created"
        );

        Ok(JasSession {
            engine: self.engine,
            modules: self.modules,
            config_path: temp_dir.path().join(CONFIG_FILE_NAME),
            results_path: temp_dir.path().join(RESULTS_FILE_NAME),
            temp_dir,
            multi_scan_id: self.multi_scan_id,
            session_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    use crate::scanners::IacScanner;

    /// 호출된 설정을 기록하고 지정된 SARIF와 종료 코드를 돌려주는 엔진
    #[derive(Default)]
    struct ScriptedEngine {
        sarif: String,
        exit_codes: Vec<i32>,
        calls: Mutex<Vec<ScanConfigFile>>,
        launch_fails: bool,
        /// 결과 파일 대신 같은 경로에 디렉토리를 만듭니다.
        results_as_dir: bool,
    }

    impl AnalyzerEngine for ScriptedEngine {
        async fn execute(&self, invocation: &EngineInvocation) -> Result<i32, JasError> {
            if self.launch_fails {
                return Err(JasError::EngineLaunch {
                    scan_type: invocation.scan_type,
                    path: "/missing/analyzerManager".to_owned(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
                });
            }
            let content = std::fs::read_to_string(&invocation.config_path).unwrap();
            let file: ScanConfigFile = serde_yaml::from_str(&content).unwrap();
            let output = file.scans[0].output.clone();
            let call = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(file);
                calls.len() - 1
            };
            let code = self.exit_codes.get(call).copied().unwrap_or(0);
            if self.results_as_dir {
                std::fs::create_dir_all(output).unwrap();
            } else if code == 0 {
                std::fs::write(output, &self.sarif).unwrap();
            }
            Ok(code)
        }
    }

    const ONE_RESULT: &str = r#"{"runs":[{"results":[{"ruleId":"aws_s3","message":{"text":"public"},
        "locations":[{"physicalLocation":{"artifactLocation":{"uri":"file:///repo/main.tf"},"region":{"startLine":1,"startColumn":1}}}]}]}]}"#;

    fn session(engine: ScriptedEngine, modules: Vec<Module>) -> JasSession<ScriptedEngine> {
        JasSession::builder(Arc::new(engine))
            .modules(modules)
            .build()
            .unwrap()
    }

    #[test]
    fn builder_requires_modules() {
        let result = JasSession::builder(Arc::new(ScriptedEngine::default())).build();
        assert!(matches!(result, Err(JasError::Config { .. })));
    }

    #[tokio::test]
    async fn every_module_is_scanned_and_files_removed() {
        let engine = ScriptedEngine {
            sarif: ONE_RESULT.to_owned(),
            ..ScriptedEngine::default()
        };
        let session = session(engine, vec![Module::new("/repo"), Module::new("/repo/b")]);
        let mut scanner = IacScanner::new();
        session.run(&mut scanner).await.unwrap();

        assert_eq!(scanner.findings().len(), 2);
        assert!(!session.config_path().exists());
        assert!(!session.results_path().exists());
        assert_eq!(session.engine.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn excluded_module_is_not_configured() {
        let engine = ScriptedEngine {
            sarif: ONE_RESULT.to_owned(),
            ..ScriptedEngine::default()
        };
        let mut excluded = Module::new("/repo/skip");
        excluded.exclude_scanners = vec!["iac".to_owned()];
        let session = session(engine, vec![excluded, Module::new("/repo")]);
        let mut scanner = IacScanner::new();
        session.run(&mut scanner).await.unwrap();

        let calls = session.engine.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].scans[0].roots, vec!["/repo"]);
    }

    #[tokio::test]
    async fn failing_module_does_not_stop_the_next() {
        let engine = ScriptedEngine {
            sarif: ONE_RESULT.to_owned(),
            exit_codes: vec![1, 0],
            ..ScriptedEngine::default()
        };
        let session = session(engine, vec![Module::new("/repo/a"), Module::new("/repo/b")]);
        let mut scanner = IacScanner::new();
        let err = session.run(&mut scanner).await.unwrap_err();

        assert_eq!(err.to_string(), "failed to run IaC scan. Exit code received: 1");
        assert_eq!(scanner.findings().len(), 1);
    }

    #[tokio::test]
    async fn not_entitled_is_a_silent_skip() {
        let engine = ScriptedEngine {
            sarif: ONE_RESULT.to_owned(),
            exit_codes: vec![31, 0],
            ..ScriptedEngine::default()
        };
        let session = session(engine, vec![Module::new("/repo/a"), Module::new("/repo/b")]);
        let mut scanner = IacScanner::new();
        session.run(&mut scanner).await.unwrap();

        assert!(scanner.findings().is_empty());
        assert_eq!(session.engine.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn launch_failure_stops_remaining_modules() {
        let engine = ScriptedEngine {
            launch_fails: true,
            ..ScriptedEngine::default()
        };
        let session = session(engine, vec![Module::new("/repo/a"), Module::new("/repo/b")]);
        let err = session.run(&mut IacScanner::new()).await.unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(err.error_count(), 1);
    }

    #[tokio::test]
    async fn malformed_results_file_is_parse_error() {
        let session = session(ScriptedEngine::default(), vec![Module::new("/repo")]);
        let err = session.run(&mut IacScanner::new()).await.unwrap_err();
        assert!(matches!(err, JasError::Parse { scan_type: JasScanType::Iac, .. }));
    }

    #[tokio::test]
    async fn cleanup_failure_is_joined_with_module_error() {
        let engine = ScriptedEngine {
            results_as_dir: true,
            ..ScriptedEngine::default()
        };
        let session = session(engine, vec![Module::new("/repo")]);
        let err = session.run(&mut IacScanner::new()).await.unwrap_err();

        assert_eq!(err.error_count(), 2);
        let JasError::Joined(errors) = &err else {
            panic!("expected joined error, got {err}");
        };
        assert!(matches!(errors[0], JasError::Parse { scan_type: JasScanType::Iac, .. }));
        assert!(matches!(errors[1], JasError::Cleanup { .. }));
        let msg = err.to_string();
        assert!(msg.contains("failed to parse IaC results"));
        assert!(msg.contains("failed to clean up"));
        assert!(!session.config_path().exists());
    }

    #[tokio::test]
    async fn close_removes_temp_dir() {
        let root = tempfile::tempdir().unwrap();
        let session = JasSession::builder(Arc::new(ScriptedEngine::default()))
            .modules(vec![Module::new("/repo")])
            .temp_root(root.path())
            .build()
            .unwrap();
        let dir = session.temp_dir().to_path_buf();
        assert!(dir.starts_with(root.path()));
        assert!(dir.exists());
        session.close().unwrap();
        assert!(!dir.exists());
    }
}
