//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 크레이트는 이 상수를 사용하여 `metrics::counter!()`, `metrics::histogram!()`
//! 매크로를 호출합니다. 레코더(exporter) 설치는 바이너리의 몫입니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `depaudit_`
//! - 모듈명: `graph_`, `jas_`, `binscan_`
//! - 접미어: `_total` (counter), `_seconds` (histogram)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(depaudit_core::metrics::JAS_SCANS_TOTAL, "scan_type" => "secrets").increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 스캐너 종류 레이블 키 (applicability, secrets, iac, sast)
pub const LABEL_SCAN_TYPE: &str = "scan_type";

/// 결과 레이블 키 (success, skipped, failure)
pub const LABEL_RESULT: &str = "result";

/// 기술 레이블 키 (npm, maven, ...)
pub const LABEL_TECHNOLOGY: &str = "technology";

// ─── Dependency Graph 메트릭 ───────────────────────────────────────

/// Graph: 생성된 트리 노드 수 (counter, label: technology)
pub const GRAPH_NODES_BUILT_TOTAL: &str = "depaudit_graph_nodes_built_total";

// ─── JAS 메트릭 ────────────────────────────────────────────────────

/// JAS: 모듈 단위 스캔 실행 수 (counter, label: scan_type, result)
pub const JAS_SCANS_TOTAL: &str = "depaudit_jas_scans_total";

/// JAS: 수집된 발견 항목 수 (counter, label: scan_type)
pub const JAS_FINDINGS_TOTAL: &str = "depaudit_jas_findings_total";

/// JAS: 분석 엔진 실행 시간 (histogram, 초, label: scan_type)
pub const JAS_ENGINE_DURATION_SECONDS: &str = "depaudit_jas_engine_duration_seconds";

// ─── Binary Scan 메트릭 ────────────────────────────────────────────

/// Binary scan: 인덱싱된 파일 수 (counter, label: result)
pub const BINSCAN_FILES_INDEXED_TOTAL: &str = "depaudit_binscan_files_indexed_total";

/// Binary scan: 스캔 서비스에 제출된 그래프 수 (counter, label: result)
pub const BINSCAN_GRAPHS_SCANNED_TOTAL: &str = "depaudit_binscan_graphs_scanned_total";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(
        GRAPH_NODES_BUILT_TOTAL,
        "Total number of dependency tree nodes built"
    );

    describe_counter!(
        JAS_SCANS_TOTAL,
        "Total number of module scans run by the analysis engine"
    );
    describe_counter!(
        JAS_FINDINGS_TOTAL,
        "Total number of findings ingested from SARIF output"
    );
    describe_histogram!(
        JAS_ENGINE_DURATION_SECONDS,
        "Analysis engine execution time in seconds"
    );

    describe_counter!(
        BINSCAN_FILES_INDEXED_TOTAL,
        "Total number of files passed to the indexer"
    );
    describe_counter!(
        BINSCAN_GRAPHS_SCANNED_TOTAL,
        "Total number of indexed graphs submitted to the scanning service"
    );
}
