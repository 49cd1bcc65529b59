//! Claude CLI adapter: one `claude -p` subprocess per prompt.

use std::{io, process::Stdio};

use async_trait::async_trait;
use tcc_core::model::{
    client::{finalize_stdout, stderr_excerpt, Assistant, ClaudeCliPromptAdapter, CliInvocation},
    types::{ClaudeCliConfig, ExecError},
};
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    process::Command,
    task::JoinHandle,
};
use tracing::{info, warn};

#[derive(Clone, Debug)]
pub struct ClaudeCliExecutor {
    cfg: ClaudeCliConfig,
}

impl ClaudeCliExecutor {
    pub fn new(cfg: ClaudeCliConfig) -> Self {
        Self { cfg }
    }
}

#[async_trait]
impl Assistant for ClaudeCliExecutor {
    async fn execute(&self, prompt: &str) -> Result<String, ExecError> {
        let adapter = ClaudeCliPromptAdapter {
            cfg: self.cfg.clone(),
        };
        let inv = adapter.build_invocation(prompt);
        info!(
            prompt_len = prompt.chars().count(),
            timeout_secs = self.cfg.timeout.as_secs(),
            "running claude"
        );

        let mut child = command(&inv)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => ExecError::BinaryNotFound(self.cfg.claude_bin.clone()),
                _ => ExecError::Unexpected(format!("failed to spawn claude: {e}")),
            })?;

        // Drain both pipes concurrently so a chatty process can't block on a full pipe.
        let mut stdout = spawn_reader(child.stdout.take());
        let mut stderr = spawn_reader(child.stderr.take());

        // The deadline covers the pipes too: a descendant that inherited them
        // keeps them open after the direct child exits.
        let run = async {
            let status = child
                .wait()
                .await
                .map_err(|e| ExecError::Unexpected(format!("failed to wait for claude: {e}")))?;
            let out = join_reader(&mut stdout).await?;
            let err = join_reader(&mut stderr).await?;
            Ok::<_, ExecError>((status, out, err))
        };

        let outcome = tokio::time::timeout(self.cfg.timeout, run).await;
        let (status, stdout, stderr) = match outcome {
            Ok(Ok(done)) => done,
            Ok(Err(e)) => {
                stdout.abort();
                stderr.abort();
                return Err(e);
            }
            Err(_) => {
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "failed to kill timed out claude process");
                }
                stdout.abort();
                stderr.abort();
                return Err(ExecError::Timeout(self.cfg.timeout));
            }
        };

        if !status.success() {
            return Err(ExecError::NonZeroExit {
                code: status.code(),
                stderr: stderr_excerpt(&stderr),
            });
        }

        let out = finalize_stdout(&stdout, self.cfg.max_output_chars);
        info!(output_len = out.chars().count(), "claude finished");
        Ok(out)
    }
}

#[cfg(not(windows))]
fn command(inv: &CliInvocation) -> Command {
    let mut cmd = Command::new(&inv.program);
    cmd.args(&inv.args);
    cmd
}

/// Windows installs `claude` as a `.cmd` shim, which needs the shell.
#[cfg(windows)]
fn command(inv: &CliInvocation) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(&inv.program).args(&inv.args);
    cmd
}

fn spawn_reader<R>(pipe: Option<R>) -> JoinHandle<io::Result<Vec<u8>>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buf).await?;
        }
        Ok(buf)
    })
}

async fn join_reader(handle: &mut JoinHandle<io::Result<Vec<u8>>>) -> Result<String, ExecError> {
    match handle.await {
        Ok(Ok(bytes)) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        Ok(Err(e)) => Err(ExecError::Unexpected(format!("failed to read claude output: {e}"))),
        Err(e) => Err(ExecError::Unexpected(format!("claude reader task failed: {e}"))),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::{
        path::PathBuf,
        time::{Duration, Instant},
    };
    use tcc_core::model::client::TRUNCATION_MARKER;

    /// `/bin/sh -p <script>` runs the script, so the "prompt" is a script path.
    fn shell(timeout: Duration, max_output_chars: usize) -> ClaudeCliExecutor {
        ClaudeCliExecutor::new(ClaudeCliConfig {
            claude_bin: PathBuf::from("/bin/sh"),
            timeout,
            max_output_chars,
            ..ClaudeCliConfig::default()
        })
    }

    fn script(name: &str, body: &str) -> String {
        let path = std::env::temp_dir().join(format!("tcc-cli-{name}-{}.sh", std::process::id()));
        std::fs::write(&path, body).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn returns_trimmed_stdout() {
        let s = script("ok", "printf '  hello from claude \\n\\n'\n");
        let out = shell(Duration::from_secs(10), 1000).execute(&s).await.unwrap();
        assert_eq!(out, "hello from claude");
    }

    #[tokio::test]
    async fn truncates_long_output() {
        let s = script("long", "i=0; while [ $i -lt 50 ]; do printf 'abcdefghij'; i=$((i+1)); done\n");
        let out = shell(Duration::from_secs(10), 100).execute(&s).await.unwrap();
        assert_eq!(out, format!("{}{}", "abcdefghij".repeat(10), TRUNCATION_MARKER));
    }

    #[tokio::test]
    async fn non_zero_exit_carries_stderr() {
        let s = script("fail", "echo boom >&2\nexit 3\n");
        let err = shell(Duration::from_secs(10), 1000).execute(&s).await.unwrap_err();
        assert_eq!(
            err,
            ExecError::NonZeroExit {
                code: Some(3),
                stderr: "boom".to_string()
            }
        );
    }

    #[tokio::test]
    async fn silent_failure_reports_no_stderr() {
        let s = script("silent", "exit 1\n");
        let err = shell(Duration::from_secs(10), 1000).execute(&s).await.unwrap_err();
        assert_eq!(err.to_string(), "claude exited with code 1: (no stderr)");
    }

    #[tokio::test]
    async fn timeout_kills_process() {
        let s = script("slow", "exec sleep 5\n");
        let started = Instant::now();
        let err = shell(Duration::from_millis(200), 1000)
            .execute(&s)
            .await
            .unwrap_err();
        assert_eq!(err, ExecError::Timeout(Duration::from_millis(200)));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn timeout_covers_pipes_held_by_descendants() {
        // The shell exits at once but the backgrounded sleep keeps stdout open.
        let s = script("bg", "sleep 4 &\necho hi\n");
        let started = Instant::now();
        let err = shell(Duration::from_millis(300), 1000)
            .execute(&s)
            .await
            .unwrap_err();
        assert_eq!(err, ExecError::Timeout(Duration::from_millis(300)));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn missing_binary_is_reported() {
        let exec = ClaudeCliExecutor::new(ClaudeCliConfig {
            claude_bin: PathBuf::from("/nonexistent/claude"),
            ..ClaudeCliConfig::default()
        });
        let err = exec.execute("hi").await.unwrap_err();
        assert_eq!(
            err,
            ExecError::BinaryNotFound(PathBuf::from("/nonexistent/claude"))
        );
    }
}
