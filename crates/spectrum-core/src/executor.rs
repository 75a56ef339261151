use std::process::Stdio;

/// Abstraction over external CLI execution (`aws`, `docker`, `git`) for testability.
///
/// Production code uses [`RealExecutor`], tests use mockall-generated mocks.
/// `env` entries are added on top of the inherited process environment.
#[allow(async_fn_in_trait)]
pub trait CommandExecutor: Send + Sync {
    /// Run a command and capture stdout.
    async fn exec(
        &self,
        program: &str,
        args: &[String],
        env: &[(String, String)],
    ) -> Result<String, CommandError>;

    /// Run a command, streaming its output to the terminal.
    async fn exec_streaming(
        &self,
        program: &str,
        args: &[String],
        env: &[(String, String)],
    ) -> Result<(), CommandError>;

    /// Run a command with data piped to stdin.
    async fn exec_with_stdin(
        &self,
        program: &str,
        args: &[String],
        env: &[(String, String)],
        stdin_data: &[u8],
    ) -> Result<String, CommandError>;
}

impl<T: CommandExecutor + ?Sized> CommandExecutor for &T {
    async fn exec(
        &self,
        program: &str,
        args: &[String],
        env: &[(String, String)],
    ) -> Result<String, CommandError> {
        (**self).exec(program, args, env).await
    }

    async fn exec_streaming(
        &self,
        program: &str,
        args: &[String],
        env: &[(String, String)],
    ) -> Result<(), CommandError> {
        (**self).exec_streaming(program, args, env).await
    }

    async fn exec_with_stdin(
        &self,
        program: &str,
        args: &[String],
        env: &[(String, String)],
        stdin_data: &[u8],
    ) -> Result<String, CommandError> {
        (**self).exec_with_stdin(program, args, env, stdin_data).await
    }
}

/// Real process executor backed by `tokio::process`.
pub struct RealExecutor;

impl RealExecutor {
    fn command(program: &str, args: &[String], env: &[(String, String)]) -> tokio::process::Command {
        tracing::debug!(program, ?args, "exec");
        let mut cmd = tokio::process::Command::new(program);
        cmd.args(args)
            .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        cmd
    }
}

impl CommandExecutor for RealExecutor {
    async fn exec(
        &self,
        program: &str,
        args: &[String],
        env: &[(String, String)],
    ) -> Result<String, CommandError> {
        let output = Self::command(program, args, env)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| CommandError::NotFound {
                program: program.to_owned(),
                source: e,
            })?;

        if output.status.success() {
            String::from_utf8(output.stdout).map_err(|e| CommandError::InvalidUtf8 {
                program: program.to_owned(),
                source: e,
            })
        } else {
            Err(CommandError::Failed {
                program: program.to_owned(),
                args: args.to_vec(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            })
        }
    }

    async fn exec_streaming(
        &self,
        program: &str,
        args: &[String],
        env: &[(String, String)],
    ) -> Result<(), CommandError> {
        let status = Self::command(program, args, env)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| CommandError::NotFound {
                program: program.to_owned(),
                source: e,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(CommandError::Failed {
                program: program.to_owned(),
                args: args.to_vec(),
                stderr: format!("exit code: {status}"),
            })
        }
    }

    async fn exec_with_stdin(
        &self,
        program: &str,
        args: &[String],
        env: &[(String, String)],
        stdin_data: &[u8],
    ) -> Result<String, CommandError> {
        use tokio::io::AsyncWriteExt;

        let mut child = Self::command(program, args, env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CommandError::NotFound {
                program: program.to_owned(),
                source: e,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(stdin_data)
                .await
                .map_err(|e| CommandError::StdinWrite {
                    program: program.to_owned(),
                    source: e,
                })?;
            stdin
                .shutdown()
                .await
                .map_err(|e| CommandError::StdinWrite {
                    program: program.to_owned(),
                    source: e,
                })?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| CommandError::NotFound {
                program: program.to_owned(),
                source: e,
            })?;

        if output.status.success() {
            String::from_utf8(output.stdout).map_err(|e| CommandError::InvalidUtf8 {
                program: program.to_owned(),
                source: e,
            })
        } else {
            Err(CommandError::Failed {
                program: program.to_owned(),
                args: args.to_vec(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            })
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("`{program}` could not be started — is it installed and on PATH?")]
    NotFound {
        program: String,
        source: std::io::Error,
    },

    #[error("{program} command failed: {args:?}\n{stderr}")]
    Failed {
        program: String,
        args: Vec<String>,
        stderr: String,
    },

    #[error("{program} output was not valid UTF-8")]
    InvalidUtf8 {
        program: String,
        source: std::string::FromUtf8Error,
    },

    #[error("failed to write to {program} stdin")]
    StdinWrite {
        program: String,
        source: std::io::Error,
    },
}

impl CommandError {
    /// Captured stderr of a command that ran and exited non-zero.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::Failed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

/// Convert a fixed list of string slices into owned CLI arguments.
pub fn args<const N: usize>(a: [&str; N]) -> Vec<String> {
    a.iter().map(|s| (*s).to_owned()).collect()
}
