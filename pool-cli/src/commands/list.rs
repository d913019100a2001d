//! List mirrored conversations.

use anyhow::Result;
use std::path::Path;

use super::open_session;

pub async fn run(data_dir: &Path, platform: Option<&str>, limit: u32, offset: u32) -> Result<()> {
    let session = open_session(data_dir).await?;
    let mirror = session.mirror();
    let guard = mirror.lock().unwrap();

    let rows = guard.list_conversations(platform, limit, offset)?;
    if rows.is_empty() {
        println!("No conversations. Run 'chatpool sync' first.");
        return Ok(());
    }

    for row in rows {
        println!(
            "{}  [{}] {} ({} messages, {})",
            row.id, row.platform, row.title, row.message_count, row.created_at
        );
    }
    Ok(())
}
