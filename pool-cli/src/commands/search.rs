//! Search mirrored messages.

use anyhow::Result;
use std::path::Path;

use super::open_session;

pub async fn run(data_dir: &Path, query: &str) -> Result<()> {
    let session = open_session(data_dir).await?;
    let mirror = session.mirror();
    let guard = mirror.lock().unwrap();

    let hits = guard.search_messages(query)?;
    if hits.is_empty() {
        println!("No matches.");
        return Ok(());
    }

    for hit in hits {
        let snippet = hit.snippet.replace("<mark>", "\x1b[1m").replace("</mark>", "\x1b[0m");
        println!("{}  [{}] {}", hit.conversation_id, hit.platform, hit.title);
        println!("    ({}) {}", hit.role, snippet);
    }
    Ok(())
}
