//! Session listing output.

use std::io::{self, Write};

use ampbox_client::Session;

const RULE_WIDTH: usize = 85;

pub fn write_session_table(w: &mut impl Write, sessions: &[Session]) -> io::Result<()> {
    writeln!(
        w,
        "{:<25} {:<15} {:<25} {:<15}",
        "ID", "Status", "Bundle", "Created"
    )?;
    writeln!(w, "{}", "-".repeat(RULE_WIDTH))?;
    for s in sessions {
        writeln!(
            w,
            "{:<25} {:<15} {:<25} {:<15}",
            s.id,
            s.status.as_str(),
            s.bundle,
            s.created_at.format("%Y-%m-%d %H:%M").to_string(),
        )?;
    }
    Ok(())
}
