//! Tool Loader - turns manifest files on disk into tool descriptors.
//!
//! Each configured path is either a manifest file or a directory of them.
//! Every file is imported on its own: a broken manifest produces a
//! [`LoadError`] for that file and the loader moves on to the next one.

mod command;
mod manifest;
mod scope;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use super::descriptor::{Signature, ToolDescriptor, ToolOrigin};
use super::error::LoadError;

pub use command::CommandTool;
pub use manifest::{ToolDef, ToolManifest};
pub use scope::{ImportScope, SearchPath};

/// File extension of tool manifests.
pub const MANIFEST_EXTENSION: &str = "json";

/// Result of a loader pass: descriptors that loaded and per-unit failures.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub tools: Vec<ToolDescriptor>,
    pub errors: Vec<LoadError>,
}

/// Discovers and imports tool manifests.
#[derive(Debug, Default)]
pub struct ToolLoader {
    search_path: SearchPath,
}

impl ToolLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every unit reachable from the given paths.
    pub fn load_paths<P: AsRef<Path>>(&mut self, paths: &[P]) -> LoadReport {
        let mut report = LoadReport::default();

        for path in paths {
            let units = match discover(path.as_ref()) {
                Ok(units) => units,
                Err(e) => {
                    warn!("{}", e);
                    report.errors.push(e);
                    continue;
                }
            };

            for unit in units {
                match self.load_unit(&unit) {
                    Ok(tool) => report.tools.push(tool),
                    Err(e) => {
                        warn!("Skipping tool unit: {}", e);
                        report.errors.push(e);
                    }
                }
            }
        }

        report
    }

    /// Import a single manifest and extract its one tool.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn load_unit(&mut self, path: &Path) -> Result<ToolDescriptor, LoadError> {
        let path = absolute(path);
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let source =
            fs::read_to_string(&path).map_err(|e| LoadError::import(&path, e.to_string()))?;
        let manifest: ToolManifest =
            serde_json::from_str(&source).map_err(|e| LoadError::import(&path, e.to_string()))?;

        if manifest.tools.len() > 1 {
            return Err(LoadError::AmbiguousTool {
                names: manifest.tool_names(),
                path,
            });
        }
        let Some(def) = manifest.tools.into_iter().next() else {
            return Err(LoadError::NoToolFound { path });
        };

        let scope = self.search_path.scope(&dir);
        let tool = build_descriptor(def, &path, &scope)?;
        drop(scope);

        debug!("Loaded tool '{}' from {}", tool.name(), path.display());
        Ok(tool)
    }
}

/// Build a descriptor for a single declared tool while its directory is in scope.
fn build_descriptor(
    def: ToolDef,
    path: &Path,
    scope: &ImportScope<'_>,
) -> Result<ToolDescriptor, LoadError> {
    let mut command = def.command.into_iter();
    let Some(program) = command.next() else {
        return Err(LoadError::import(
            path,
            format!("tool '{}' has an empty command", def.name),
        ));
    };

    let program = match scope.resolve_program(&program) {
        Ok(Some(resolved)) => resolved,
        Ok(None) => PathBuf::from(program),
        Err(reason) => {
            return Err(LoadError::import(
                path,
                format!("missing dependency: {reason}"),
            ));
        }
    };

    let handler = CommandTool::new(
        program,
        command.collect(),
        scope.dir().to_path_buf(),
        def.env,
    );
    let mut tool = ToolDescriptor::new(
        def.name,
        Signature::new(def.parameters),
        ToolOrigin::Manifest(path.to_path_buf()),
        handler,
    );
    if let Some(description) = def.description {
        tool = tool.with_description(description);
    }
    Ok(tool)
}

/// Expand a configured path into the manifest files it names.
///
/// Directories are scanned non-recursively, skipping hidden files and files
/// whose name starts with an underscore (`__init__.json`, `_shared.json`).
fn discover(path: &Path) -> Result<Vec<PathBuf>, LoadError> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(LoadError::import(path, "not a file or directory"));
    }

    info!("Searching for tools in directory: {}", path.display());
    let entries = fs::read_dir(path).map_err(|e| LoadError::import(path, e.to_string()))?;

    let mut units: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_manifest_name(p))
        .collect();
    units.sort();
    Ok(units)
}

fn is_manifest_name(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    !name.starts_with('_')
        && !name.starts_with('.')
        && path.extension().and_then(|e| e.to_str()) == Some(MANIFEST_EXTENSION)
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_manifest(dir: &Path, file: &str, tools: serde_json::Value) {
        fs::write(dir.join(file), json!({ "tools": tools }).to_string()).unwrap();
    }

    fn tool_def(name: &str) -> serde_json::Value {
        json!({
            "name": name,
            "parameters": [{"name": "text", "type": "string"}],
            "command": ["cat"]
        })
    }

    fn names(report: &LoadReport) -> Vec<&str> {
        report.tools.iter().map(|t| t.name()).collect()
    }

    #[test]
    fn test_one_tool_per_file() {
        let dir = TempDir::new().unwrap();
        write_manifest(dir.path(), "weather.json", json!([tool_def("fetch_weather")]));
        write_manifest(dir.path(), "search.json", json!([tool_def("web_search")]));

        let report = ToolLoader::new().load_paths(&[dir.path()]);
        assert!(report.errors.is_empty(), "{:?}", report.errors);
        assert_eq!(names(&report), vec!["web_search", "fetch_weather"]);
    }

    #[test]
    fn test_bad_units_do_not_block_siblings() {
        let dir = TempDir::new().unwrap();
        write_manifest(dir.path(), "a_empty.json", json!([]));
        write_manifest(
            dir.path(),
            "b_two.json",
            json!([tool_def("first"), tool_def("second")]),
        );
        fs::write(dir.path().join("c_broken.json"), "{ not json").unwrap();
        write_manifest(dir.path(), "d_good.json", json!([tool_def("good")]));

        let report = ToolLoader::new().load_paths(&[dir.path()]);
        assert_eq!(names(&report), vec!["good"]);

        let kinds: Vec<_> = report.errors.iter().map(LoadError::kind).collect();
        assert_eq!(kinds, vec!["NoToolFound", "AmbiguousTool", "ImportFailure"]);
        match &report.errors[1] {
            LoadError::AmbiguousTool { names, .. } => assert_eq!(names, &["first", "second"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_skips_underscore_hidden_and_foreign_files() {
        let dir = TempDir::new().unwrap();
        write_manifest(dir.path(), "__init__.json", json!([tool_def("init")]));
        write_manifest(dir.path(), "_shared.json", json!([tool_def("shared")]));
        write_manifest(dir.path(), ".hidden.json", json!([tool_def("hidden")]));
        fs::write(dir.path().join("run.sh"), "#!/bin/sh\n").unwrap();
        write_manifest(dir.path(), "real.json", json!([tool_def("real")]));

        let report = ToolLoader::new().load_paths(&[dir.path()]);
        assert_eq!(names(&report), vec!["real"]);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_direct_file_and_missing_path() {
        let dir = TempDir::new().unwrap();
        write_manifest(dir.path(), "_direct.json", json!([tool_def("direct")]));

        let direct = dir.path().join("_direct.json");
        let missing = dir.path().join("nope");
        let report = ToolLoader::new().load_paths(&[direct, missing]);

        assert_eq!(names(&report), vec!["direct"]);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].kind(), "ImportFailure");
    }

    #[test]
    fn test_local_program_resolution() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("run.sh"), "#!/bin/sh\ncat\n").unwrap();
        write_manifest(
            dir.path(),
            "local.json",
            json!([{"name": "local", "command": ["./run.sh"]}]),
        );
        write_manifest(
            dir.path(),
            "missing.json",
            json!([{"name": "missing", "command": ["./not-here.sh"]}]),
        );

        let mut loader = ToolLoader::new();
        let report = loader.load_paths(&[dir.path()]);
        assert_eq!(names(&report), vec!["local"]);
        match &report.errors[0] {
            LoadError::ImportFailure { reason, .. } => {
                assert!(reason.contains("missing dependency"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(loader.search_path.dirs().is_empty());
    }

    #[test]
    fn test_descriptor_fields() {
        let dir = TempDir::new().unwrap();
        write_manifest(
            dir.path(),
            "described.json",
            json!([{
                "name": "described",
                "description": "Does things",
                "parameters": [{"name": "n", "type": "integer", "required": false}],
                "command": ["true"]
            }]),
        );

        let tool = ToolLoader::new()
            .load_unit(&dir.path().join("described.json"))
            .unwrap();
        assert_eq!(tool.description(), Some("Does things"));
        assert_eq!(tool.signature().params().len(), 1);
        assert!(matches!(tool.origin(), ToolOrigin::Manifest(p) if p.ends_with("described.json")));
    }

    #[test]
    fn test_empty_command_is_import_failure() {
        let dir = TempDir::new().unwrap();
        write_manifest(dir.path(), "empty.json", json!([{"name": "x", "command": []}]));
        let err = ToolLoader::new()
            .load_unit(&dir.path().join("empty.json"))
            .unwrap_err();
        assert_eq!(err.kind(), "ImportFailure");
    }
}
