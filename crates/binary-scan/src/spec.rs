//! 파일 스펙과 파일 시스템 탐색
//!
//! [`FileSpec`]의 패턴에서 와일드카드가 나오기 전까지의 경로를 탐색 루트로 삼고,
//! 루트 아래 파일 중 패턴과 일치하고 제외 패턴과 일치하지 않는 파일을 찾습니다.
//!
//! | 패턴 | 루트 | 결과 |
//! |------|------|------|
//! | `/srv/app.jar` | `/srv/app.jar` | 파일 하나 |
//! | `/srv/libs/*.jar` | `/srv/libs` | 일치하는 파일 |
//! | `/srv/libs` (디렉토리) | `/srv/libs` | 디렉토리 아래 모든 파일 |

use std::path::{Component, Path, PathBuf};

use glob::Pattern;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::BinaryScanError;

const GLOB_META: [char; 3] = ['*', '?', '['];

/// 스캔할 파일 묶음 하나
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSpec {
    pub pattern: String,
    /// 업로드 대상 경로 (`repo/path/`), 저장소 경로 계산에 사용
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub exclusions: Vec<String>,
    /// 지정하지 않으면 파이프라인 설정의 `recursive`를 따릅니다 (그것도 없으면 재귀)
    #[serde(default)]
    pub recursive: Option<bool>,
}

impl FileSpec {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            target: None,
            exclusions: Vec::new(),
            recursive: None,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_exclusions(mut self, exclusions: Vec<String>) -> Self {
        self.exclusions = exclusions;
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = Some(recursive);
        self
    }

    /// `recursive`가 비어 있을 때만 `default`로 채웁니다.
    pub fn with_default_recursive(mut self, default: bool) -> Self {
        self.recursive.get_or_insert(default);
        self
    }

    pub fn is_recursive(&self) -> bool {
        self.recursive.unwrap_or(true)
    }

    /// 대상 경로의 마지막 `/`까지 (없으면 None)
    pub fn repo_path(&self) -> Option<String> {
        self.target.as_deref().and_then(repo_path_from_target)
    }

    /// 와일드카드 이전까지의 경로
    pub fn root_path(&self) -> PathBuf {
        let mut root = PathBuf::new();
        for component in Path::new(&self.pattern).components() {
            let is_glob = match component {
                Component::Normal(part) => part.to_string_lossy().contains(GLOB_META),
                _ => false,
            };
            if is_glob {
                break;
            }
            root.push(component);
        }
        if root.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            root
        }
    }

    fn has_wildcard(&self) -> bool {
        self.pattern.contains(GLOB_META)
    }

    /// 패턴과 일치하는 파일을 찾아 `visit`에 넘깁니다.
    ///
    /// `visit`이 `false`를 반환하면 탐색을 멈춥니다 (수신 측이 닫힌 경우).
    /// 개별 항목의 탐색 에러는 모아서 반환하고 나머지 탐색은 계속합니다.
    ///
    /// # Errors
    ///
    /// 패턴 또는 제외 패턴이 잘못되었으면 탐색 전에 `BinaryScanError::Pattern`을 반환합니다.
    pub fn walk(
        &self,
        extra_exclusions: &[String],
        mut visit: impl FnMut(PathBuf) -> bool,
    ) -> Result<Vec<BinaryScanError>, BinaryScanError> {
        let root = self.root_path();
        let exclusions = compile_patterns(self.exclusions.iter().chain(extra_exclusions))?;

        if root.is_file() {
            if !is_excluded(&root, &exclusions) {
                visit(root);
            }
            return Ok(Vec::new());
        }

        let matcher = if self.has_wildcard() {
            Some(compile_pattern(&self.pattern)?)
        } else {
            None
        };

        let mut walker = WalkDir::new(&root).follow_links(false);
        if !self.is_recursive() {
            walker = walker.max_depth(1);
        }

        let mut errors = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    errors.push(BinaryScanError::Walk {
                        path: e
                            .path()
                            .map(|p| p.display().to_string())
                            .unwrap_or_else(|| root.display().to_string()),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.into_path();
            let matched = matcher.as_ref().is_none_or(|m| m.matches_path(&path));
            if matched && !is_excluded(&path, &exclusions) && !visit(path) {
                break;
            }
        }
        Ok(errors)
    }

    /// 일치하는 모든 파일 목록
    pub fn collect_files(&self, extra_exclusions: &[String]) -> Result<Vec<PathBuf>, BinaryScanError> {
        let mut files = Vec::new();
        let errors = self.walk(extra_exclusions, |path| {
            files.push(path);
            true
        })?;
        match errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(files),
        }
    }
}

/// 대상 경로에서 저장소 경로를 계산합니다.
///
/// `libs-release/org/app.jar` -> `libs-release/org/`
pub fn repo_path_from_target(target: &str) -> Option<String> {
    target.rfind('/').map(|idx| target[..=idx].to_owned())
}

fn compile_pattern(pattern: &str) -> Result<Pattern, BinaryScanError> {
    Pattern::new(pattern).map_err(|e| BinaryScanError::Pattern {
        pattern: pattern.to_owned(),
        reason: e.to_string(),
    })
}

fn compile_patterns<'a>(
    patterns: impl IntoIterator<Item = &'a String>,
) -> Result<Vec<Pattern>, BinaryScanError> {
    patterns.into_iter().map(|p| compile_pattern(p)).collect()
}

fn is_excluded(path: &Path, exclusions: &[Pattern]) -> bool {
    exclusions.iter().any(|p| p.matches_path(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("libs/nested")).unwrap();
        std::fs::write(root.join("libs/app.jar"), b"jar").unwrap();
        std::fs::write(root.join("libs/readme.txt"), b"txt").unwrap();
        std::fs::write(root.join("libs/nested/dep.jar"), b"jar").unwrap();
        std::fs::write(root.join("libs/nested/dep-tests.jar"), b"jar").unwrap();
        dir
    }

    fn names(mut files: Vec<PathBuf>) -> Vec<String> {
        files.sort();
        files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn root_path_stops_at_wildcard() {
        assert_eq!(FileSpec::new("/srv/libs/*.jar").root_path(), PathBuf::from("/srv/libs"));
        assert_eq!(FileSpec::new("/srv/**/app?.jar").root_path(), PathBuf::from("/srv"));
        assert_eq!(FileSpec::new("*.jar").root_path(), PathBuf::from("."));
        assert_eq!(FileSpec::new("/srv/app.jar").root_path(), PathBuf::from("/srv/app.jar"));
    }

    #[test]
    fn repo_path_keeps_trailing_slash() {
        assert_eq!(repo_path_from_target("libs-release/org/app.jar").as_deref(), Some("libs-release/org/"));
        assert_eq!(repo_path_from_target("libs-release/").as_deref(), Some("libs-release/"));
        assert_eq!(repo_path_from_target("libs-release"), None);
        assert!(FileSpec::new("*.jar").repo_path().is_none());
    }

    #[test]
    fn recursive_pattern_matches_nested_files() {
        let dir = tree();
        let pattern = format!("{}/libs/*.jar", dir.path().display());
        let files = FileSpec::new(pattern).collect_files(&[]).unwrap();
        assert_eq!(names(files), vec!["app.jar", "dep-tests.jar", "dep.jar"]);
    }

    #[test]
    fn non_recursive_stays_in_root() {
        let dir = tree();
        let pattern = format!("{}/libs/*.jar", dir.path().display());
        let files = FileSpec::new(pattern).recursive(false).collect_files(&[]).unwrap();
        assert_eq!(names(files), vec!["app.jar"]);
    }

    #[test]
    fn default_recursive_fills_only_unset_specs() {
        assert!(FileSpec::new("*.jar").is_recursive());
        assert!(!FileSpec::new("*.jar").with_default_recursive(false).is_recursive());
        assert!(FileSpec::new("*.jar").recursive(true).with_default_recursive(false).is_recursive());
    }

    #[test]
    fn exclusions_from_spec_and_config_apply() {
        let dir = tree();
        let pattern = format!("{}/libs/*.jar", dir.path().display());
        let files = FileSpec::new(pattern)
            .with_exclusions(vec!["*-tests.jar".to_owned()])
            .collect_files(&["*/app.jar".to_owned()])
            .unwrap();
        assert_eq!(names(files), vec!["dep.jar"]);
    }

    #[test]
    fn directory_without_wildcard_yields_all_files() {
        let dir = tree();
        let files = FileSpec::new(dir.path().join("libs").display().to_string())
            .collect_files(&[])
            .unwrap();
        assert_eq!(files.len(), 4);
    }

    #[test]
    fn single_file_pattern() {
        let dir = tree();
        let files = FileSpec::new(dir.path().join("libs/app.jar").display().to_string())
            .collect_files(&[])
            .unwrap();
        assert_eq!(names(files), vec!["app.jar"]);
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let err = FileSpec::new("/srv/[oops").collect_files(&[]).unwrap_err();
        assert!(matches!(err, BinaryScanError::Pattern { .. }));
    }

    #[test]
    fn visitor_can_stop_the_walk() {
        let dir = tree();
        let mut seen = 0;
        FileSpec::new(dir.path().display().to_string())
            .walk(&[], |_| {
                seen += 1;
                false
            })
            .unwrap();
        assert_eq!(seen, 1);
    }
}
