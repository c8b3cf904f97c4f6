//! Terminal rendering of session events.

use std::io::{self, Write};

use tracing::debug;

use ampbox_client::{EventKind, SessionEvent};

/// Whether streaming should continue after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Write one event in human-readable form and flush.
///
/// Text blocks are written without a trailing newline so that streamed
/// content reads as continuous prose.
pub fn render_event(w: &mut impl Write, event: &SessionEvent) -> io::Result<Flow> {
    let kind = event.kind();
    let flow = if kind.is_terminal() {
        Flow::Stop
    } else {
        Flow::Continue
    };
    match kind {
        EventKind::Ready => writeln!(w, "✓ Session initialized")?,
        EventKind::PromptSubmit { prompt } => {
            writeln!(w, "\n[New Turn]")?;
            writeln!(w, "You: {prompt}")?;
        }
        EventKind::Text { text } => {
            if !text.is_empty() {
                write!(w, "{text}")?;
            }
        }
        EventKind::ToolCall { tool_name } => writeln!(w, "\n🔧 Using tool: {tool_name}")?,
        EventKind::ToolResult {
            tool_name,
            success,
            error,
        } => {
            if success {
                writeln!(w, "✓ {tool_name} completed")?;
            } else {
                writeln!(w, "✗ {tool_name} failed: {error}")?;
            }
        }
        EventKind::Completed => writeln!(w, "\n\n✓ Session completed")?,
        EventKind::Failed { error } => writeln!(w, "\n\n✗ Session failed: {error}")?,
        EventKind::Other(event_type) => debug!(event_type, "Ignoring event"),
    }
    w.flush()?;
    Ok(flow)
}
