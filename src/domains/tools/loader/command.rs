//! Command-backed tool handler.
//!
//! The program is spawned once per call with its working directory set to the
//! manifest directory. Arguments go in as a JSON object on stdin; stdout is
//! the result. A non-zero exit status is a tool failure whose message is the
//! program's stderr.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;

use anyhow::{Context, bail};
use async_trait::async_trait;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::domains::tools::descriptor::{Arguments, ToolHandler};

/// Runs an external program for each invocation.
#[derive(Debug, Clone)]
pub struct CommandTool {
    program: PathBuf,
    args: Vec<String>,
    working_dir: PathBuf,
    env: BTreeMap<String, String>,
}

impl CommandTool {
    pub fn new(
        program: PathBuf,
        args: Vec<String>,
        working_dir: PathBuf,
        env: BTreeMap<String, String>,
    ) -> Self {
        Self {
            program,
            args,
            working_dir,
            env,
        }
    }

    /// `PATH` for the child: the manifest directory first, then the inherited value.
    fn child_path(&self) -> Option<OsString> {
        let inherited = std::env::var_os("PATH").unwrap_or_default();
        let dirs =
            std::iter::once(self.working_dir.clone()).chain(std::env::split_paths(&inherited));
        std::env::join_paths(dirs).ok()
    }
}

#[async_trait]
impl ToolHandler for CommandTool {
    async fn call(&self, arguments: Arguments) -> anyhow::Result<Value> {
        let input = serde_json::to_vec(&Value::Object(arguments))?;

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .current_dir(&self.working_dir)
            .envs(&self.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(path) = self.child_path() {
            command.env("PATH", path);
        }

        let mut child = command
            .spawn()
            .with_context(|| format!("failed to start {}", self.program.display()))?;

        // Output is collected while the arguments are written, so a program that
        // echoes as it reads cannot fill its stdout pipe and stall both sides.
        let stdin = child.stdin.take();
        let write_input = async move {
            if let Some(mut stdin) = stdin {
                // The program may exit without reading its input.
                if let Err(e) = stdin.write_all(&input).await {
                    debug!("Could not write arguments to {}: {}", self.program.display(), e);
                }
            }
        };

        let ((), output) = tokio::join!(write_input, child.wait_with_output());
        let output =
            output.with_context(|| format!("failed to wait for {}", self.program.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            if stderr.is_empty() {
                bail!("{} exited with {}", self.program.display(), output.status);
            }
            bail!("{}", stderr);
        }

        Ok(parse_output(&output.stdout))
    }
}

/// Interpret program output: JSON if it parses, a string otherwise, `null` if empty.
fn parse_output(stdout: &[u8]) -> Value {
    let text = String::from_utf8_lossy(stdout);
    let text = text.trim();
    if text.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_parse_output() {
        assert_eq!(parse_output(b""), Value::Null);
        assert_eq!(parse_output(b"  {\"a\": 1}\n"), json!({"a": 1}));
        assert_eq!(parse_output(b"plain text\n"), json!("plain text"));
    }

    #[cfg(unix)]
    fn shell(script: &str, dir: &TempDir) -> CommandTool {
        CommandTool::new(
            PathBuf::from("sh"),
            vec!["-c".to_string(), script.to_string()],
            dir.path().to_path_buf(),
            BTreeMap::from([("GREETING".to_string(), "hi".to_string())]),
        )
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_arguments_arrive_on_stdin() {
        let dir = TempDir::new().unwrap();
        let tool = shell("cat", &dir);
        let mut args = Arguments::new();
        args.insert("city".to_string(), json!("Oslo"));

        let result = tool.call(args).await.unwrap();
        assert_eq!(result, json!({"city": "Oslo"}));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_large_arguments_through_filter() {
        let dir = TempDir::new().unwrap();
        let tool = shell("cat", &dir);
        let blob = "x".repeat(2 * 1024 * 1024);
        let mut args = Arguments::new();
        args.insert("blob".to_string(), json!(blob));

        let result = tokio::time::timeout(Duration::from_secs(30), tool.call(args))
            .await
            .expect("command stalled on a large argument")
            .unwrap();
        assert_eq!(result["blob"].as_str().map(str::len), Some(blob.len()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_env_and_working_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "found").unwrap();
        let tool = shell("printf '%s %s' \"$GREETING\" \"$(cat marker.txt)\"", &dir);

        let result = tool.call(Arguments::new()).await.unwrap();
        assert_eq!(result, json!("hi found"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failure_reports_stderr() {
        let dir = TempDir::new().unwrap();
        let tool = shell("echo 'city not found' >&2; exit 3", &dir);

        let err = tool.call(Arguments::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "city not found");
    }

    #[tokio::test]
    async fn test_missing_program() {
        let dir = TempDir::new().unwrap();
        let tool = CommandTool::new(
            dir.path().join("does-not-exist"),
            Vec::new(),
            dir.path().to_path_buf(),
            BTreeMap::new(),
        );
        let err = tool.call(Arguments::new()).await.unwrap_err();
        assert!(err.to_string().contains("failed to start"));
    }
}
