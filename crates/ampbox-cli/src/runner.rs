//! Remote session runner.
//!
//! Drives the session client for `run`, `resume` and `list`, prints progress
//! for the user, and maps failures onto exit codes. User-facing output uses
//! writeln! (this is a CLI binary, not debug output).

use std::future::Future;
use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;

use tracing::{debug, info, warn};

use ampbox_client::{ClientError, CreateSessionRequest, SessionClient};

use crate::render::{Flow, render_event};
use crate::session_fmt::write_session_table;

/// Command shown in the resume hint after a pause.
pub const RESUME_COMMAND: &str = "ampbox resume";

/// How a command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The command ran to completion.
    Finished,
    /// The user interrupted a live session; it can be resumed later.
    Paused,
    /// The service or client reported an error.
    Failed,
}

impl Outcome {
    pub fn exit_code(self) -> ExitCode {
        match self {
            Self::Finished | Self::Paused => ExitCode::SUCCESS,
            Self::Failed => ExitCode::FAILURE,
        }
    }
}

/// Output sinks for user-facing messages.
#[derive(Debug)]
pub struct Console<O, E> {
    pub out: O,
    pub err: E,
}

impl Console<io::Stdout, io::Stderr> {
    pub fn stdio() -> Self {
        Self {
            out: io::stdout(),
            err: io::stderr(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Runs commands against a [`SessionClient`].
#[derive(Debug)]
pub struct Runner<C> {
    client: C,
}

impl<C: SessionClient> Runner<C> {
    pub const fn new(client: C) -> Self {
        Self { client }
    }

    /// Create a session for `prompt` and stream its events.
    ///
    /// `interrupt` resolving pauses the command (Ctrl-C in the binary).
    pub async fn run<O: Write, E: Write>(
        &self,
        console: &mut Console<O, E>,
        prompt: &str,
        bundle: &str,
        codebase_path: &Path,
        interrupt: impl Future<Output = ()>,
    ) -> io::Result<Outcome> {
        writeln!(console.out, "🚀 Creating remote session on Ampbox...\n")?;

        let mut session_id: Option<String> = None;
        let result = {
            let work =
                self.create_and_stream(console, prompt, bundle, codebase_path, &mut session_id);
            tokio::select! {
                biased;
                r = work => Some(r),
                () = interrupt => None,
            }
        };

        match result {
            Some(Ok(())) => Ok(Outcome::Finished),
            Some(Err(RunError::Io(e))) => Err(e),
            Some(Err(RunError::Client(e))) if e.is_authentication() => {
                warn!("Authentication failed");
                writeln!(console.err, "✗ Authentication failed. Check your API key.")?;
                Ok(Outcome::Failed)
            }
            Some(Err(RunError::Client(e))) => {
                warn!(error = %e, "Remote session failed");
                writeln!(console.err, "✗ Ampbox error: {e}")?;
                Ok(Outcome::Failed)
            }
            None => {
                write_paused(&mut console.out, session_id.as_deref())?;
                Ok(Outcome::Paused)
            }
        }
    }

    /// Resume a paused session and stream its events.
    pub async fn resume<O: Write, E: Write>(
        &self,
        console: &mut Console<O, E>,
        session_id: &str,
        interrupt: impl Future<Output = ()>,
    ) -> io::Result<Outcome> {
        writeln!(console.out, "🔄 Resuming session {session_id}...\n")?;

        let result = {
            let work = self.resume_and_stream(console, session_id);
            tokio::select! {
                biased;
                r = work => Some(r),
                () = interrupt => None,
            }
        };

        match result {
            Some(Ok(())) => Ok(Outcome::Finished),
            Some(Err(RunError::Io(e))) => Err(e),
            Some(Err(RunError::Client(e))) if e.is_not_found() => {
                writeln!(console.err, "✗ Session not found: {session_id}")?;
                Ok(Outcome::Failed)
            }
            Some(Err(RunError::Client(e))) => {
                warn!(error = %e, session_id, "Resume failed");
                writeln!(console.err, "✗ Error: {e}")?;
                Ok(Outcome::Failed)
            }
            None => {
                write_paused(&mut console.out, Some(session_id))?;
                Ok(Outcome::Paused)
            }
        }
    }

    /// Print the caller's sessions as a table.
    pub async fn list<O: Write, E: Write>(
        &self,
        console: &mut Console<O, E>,
    ) -> io::Result<Outcome> {
        match self.client.list_sessions().await {
            Ok(sessions) if sessions.is_empty() => {
                writeln!(console.out, "No sessions found.")?;
                Ok(Outcome::Finished)
            }
            Ok(sessions) => {
                write_session_table(&mut console.out, &sessions)?;
                Ok(Outcome::Finished)
            }
            Err(e) => {
                writeln!(console.err, "✗ Error: {e}")?;
                Ok(Outcome::Failed)
            }
        }
    }

    async fn create_and_stream<O: Write, E: Write>(
        &self,
        console: &mut Console<O, E>,
        prompt: &str,
        bundle: &str,
        codebase_path: &Path,
        session_id: &mut Option<String>,
    ) -> Result<(), RunError> {
        let session = self
            .client
            .create_session(CreateSessionRequest {
                prompt: prompt.to_string(),
                bundle: bundle.to_string(),
                codebase_path: codebase_path.to_string_lossy().into_owned(),
            })
            .await?;
        *session_id = Some(session.id.clone());

        writeln!(console.out, "✓ Session created: {}", session.id)?;
        writeln!(console.out, "✓ Bundle: {}", session.bundle)?;
        writeln!(console.out, "✓ Status: {}\n", session.status)?;

        writeln!(console.out, "Streaming events...\n")?;
        self.stream(&mut console.out, &session.id).await
    }

    async fn resume_and_stream<O: Write, E: Write>(
        &self,
        console: &mut Console<O, E>,
        session_id: &str,
    ) -> Result<(), RunError> {
        let session = self.client.resume_session(session_id).await?;

        writeln!(console.out, "✓ Session resumed: {}", session.id)?;
        writeln!(console.out, "✓ Status: {}\n", session.status)?;

        writeln!(console.out, "Streaming events...\n")?;
        self.stream(&mut console.out, &session.id).await
    }

    async fn stream(&self, out: &mut impl Write, session_id: &str) -> Result<(), RunError> {
        let mut events = self.client.stream_events(session_id).await?;
        info!(session_id, "Streaming events");
        while let Some(event) = events.next().await {
            if render_event(out, &event?)? == Flow::Stop {
                return Ok(());
            }
        }
        debug!(session_id, "Event stream closed without a terminal event");
        Ok(())
    }
}

fn write_paused(out: &mut impl Write, session_id: Option<&str>) -> io::Result<()> {
    writeln!(out, "\n\n⏸️  Session paused.")?;
    if let Some(id) = session_id {
        writeln!(out, "Resume with: {RESUME_COMMAND} {id}")?;
    }
    out.flush()
}

/// Resolves when the user presses Ctrl-C.
///
/// Never resolves if the signal handler cannot be installed.
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
