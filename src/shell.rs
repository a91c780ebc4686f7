//! Prompt-driven shell sessions
//!
//! A convenience layer over [`Session`] for driving an interactive shell:
//! rewrite the prompt to something unambiguous, run commands one at a
//! time, and collect each command's output and exit code.

use crate::pattern::Pattern;
use crate::result::{Error, MatchResult};
use crate::session::Session;
use std::time::{Duration, Instant};

const DEFAULT_PROGRAM: &str = "/bin/bash";
const DEFAULT_PROMPT: &str = r"[#$] ";
const DEFAULT_NEW_PROMPT: &str = "shell# ";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Output of one shell command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Everything the command printed, trimmed, with carriage returns
    /// removed.
    pub output: String,
    /// The command's exit code, when the shell supports querying it.
    pub exit_code: Option<i32>,
}

/// Configures and opens a [`Shell`].
///
/// Defaults target bash: `/bin/bash --noediting`, prompt `[#$] `, prompt
/// rewritten to `shell# ` via `export PS1`, exit codes via `echo $?`.
#[derive(Debug, Clone)]
pub struct ShellBuilder {
    program: String,
    args: Vec<String>,
    prompt: String,
    new_prompt: Option<String>,
    change_prompt: String,
    exit_command: Option<String>,
    timeout: Duration,
}

impl Default for ShellBuilder {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            args: vec!["--noediting".to_string()],
            prompt: DEFAULT_PROMPT.to_string(),
            new_prompt: Some(DEFAULT_NEW_PROMPT.to_string()),
            change_prompt: "export PS1=\"{}\"".to_string(),
            exit_command: Some("echo $?".to_string()),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ShellBuilder {
    /// The shell to launch and its arguments.
    pub fn command<I, S>(mut self, program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.program = program.into();
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Regex matching the shell's initial prompt.
    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Prompt to install on open (matched literally afterwards), or `None`
    /// to keep the shell's own prompt.
    pub fn new_prompt(mut self, prompt: Option<String>) -> Self {
        self.new_prompt = prompt;
        self
    }

    /// Command template used to install the new prompt; `{}` is replaced
    /// with the prompt text.
    pub fn change_prompt(mut self, template: impl Into<String>) -> Self {
        self.change_prompt = template.into();
        self
    }

    /// Command printing the last exit code, or `None` if the shell has no
    /// such facility (exit codes then come back as `None`).
    pub fn exit_command(mut self, command: Option<String>) -> Self {
        self.exit_command = command;
        self
    }

    /// Per-step timeout: prompt waits and time-to-next-output-line.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Launch the shell and synchronize on its prompt.
    pub async fn spawn(self) -> Result<Shell, Error> {
        let session = Session::builder()
            .timeout(self.timeout)
            .line_separator("\r")
            .args(self.args.clone())
            .spawn(self.program.clone())?;

        let mut prompt = Pattern::regex(&self.prompt)?;

        if let Some(new_prompt) = &self.new_prompt {
            session.expect(prompt).await?;

            let command = self.change_prompt.replace("{}", new_prompt);
            session.send_line(&command).await?;
            // swallow the echo of the export itself, which contains the
            // new prompt text
            session.expect(Pattern::exact(command)).await?;
            session.expect(Pattern::exact("\n")).await?;

            prompt = Pattern::exact(new_prompt.clone());
        }

        Ok(Shell {
            session,
            prompt,
            exit_command: self.exit_command,
            timeout: self.timeout,
        })
    }
}

/// An interactive shell driven through the expect/send contract.
///
/// # Examples
///
/// ```no_run
/// use uexpect::Shell;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let shell = Shell::builder().spawn().await?;
///
/// let result = shell.run("uname -s").await?;
/// assert_eq!(result.exit_code, Some(0));
/// println!("{}", result.output);
///
/// shell.close().await;
/// # Ok(())
/// # }
/// ```
pub struct Shell {
    session: Session,
    prompt: Pattern,
    exit_command: Option<String>,
    timeout: Duration,
}

impl Shell {
    /// Builder with bash defaults.
    pub fn builder() -> ShellBuilder {
        ShellBuilder::default()
    }

    /// Run one command and collect its output and exit code.
    pub async fn run(&self, command: &str) -> Result<CommandOutput, Error> {
        self.run_with(command, self.timeout, None).await
    }

    /// [`run`](Self::run) with an explicit per-line timeout and an
    /// optional bound on the whole command.
    pub async fn run_with(
        &self,
        command: &str,
        timeout: Duration,
        total: Option<Duration>,
    ) -> Result<CommandOutput, Error> {
        self.await_prompt(timeout).await?;

        // send and swallow the echo so it is not mistaken for output
        self.session.send(command.as_bytes()).await?;
        self.session
            .expect_with_timeout(Pattern::exact(command.to_string()), Some(timeout))
            .await?;
        self.session.send(b"\r").await?;
        self.session
            .expect_with_timeout(Pattern::exact("\n"), Some(timeout))
            .await?;

        let started = Instant::now();
        let mut output = String::new();

        // collect line by line until the prompt returns; `timeout` bounds
        // each line, `total` bounds the whole command
        loop {
            if let Some(total) = total {
                if started.elapsed() >= total {
                    return Err(Error::Timeout {
                        duration: total,
                        before: output,
                    });
                }
            }

            let result = self
                .session
                .expect_any_with_timeout(
                    &[self.prompt.clone(), Pattern::exact("\n")],
                    Some(timeout),
                )
                .await?;

            output.push_str(&result.before);
            if result.pattern_index == 0 {
                break;
            }
            output.push_str(&result.matched);
        }

        let output = output.trim_end().replace('\r', "");
        let exit_code = self.query_exit_code().await?;

        // refresh the prompt for the next command
        self.session.send(b"\r").await?;
        self.session.expect(Pattern::exact("\n")).await?;

        Ok(CommandOutput { output, exit_code })
    }

    /// Direct access to the underlying session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Close the underlying session.
    pub async fn close(self) {
        self.session.close().await;
    }

    /// Wait for the prompt, then drain any stale prompts queued by
    /// earlier blank lines.
    async fn await_prompt(&self, timeout: Duration) -> Result<(), Error> {
        self.session
            .expect_with_timeout(self.prompt.clone(), Some(timeout))
            .await?;

        let drain = [self.prompt.clone(), Pattern::Timeout];
        loop {
            let result: MatchResult = self
                .session
                .expect_any_with_timeout(&drain, Some(Duration::from_millis(1)))
                .await?;
            if result.pattern_index == 1 {
                return Ok(());
            }
        }
    }

    async fn query_exit_code(&self) -> Result<Option<i32>, Error> {
        let Some(command) = &self.exit_command else {
            return Ok(None);
        };

        self.session.send(command.as_bytes()).await?;
        self.session
            .expect(Pattern::exact(command.clone()))
            .await?;
        self.session.send(b"\r").await?;
        self.session.expect(Pattern::exact("\n")).await?;

        let result = self.session.expect(self.prompt.clone()).await?;
        Ok(result.before.trim().replace('\r', "").parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_target_bash() {
        let builder = ShellBuilder::default();
        assert_eq!(builder.program, "/bin/bash");
        assert_eq!(builder.args, vec!["--noediting".to_string()]);
        assert!(builder.exit_command.is_some());
    }

    #[test]
    fn change_prompt_template_substitutes() {
        let builder = ShellBuilder::default();
        let command = builder.change_prompt.replace("{}", "shell# ");
        assert_eq!(command, "export PS1=\"shell# \"");
    }
}
