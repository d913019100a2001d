//! Pull new conversations into the local mirror.

use anyhow::Result;
use std::path::Path;

use super::open_session;

pub async fn run(data_dir: &Path) -> Result<()> {
    let session = open_session(data_dir).await?;
    let engine = session.engine();

    let imported = engine
        .sync_with_progress(|p| {
            println!(
                "  fetched {}, decrypted {}, failed {}{}",
                p.fetched,
                p.decrypted,
                p.failed,
                if p.done { " - done" } else { "" }
            );
        })
        .await?;

    println!("Imported {imported} new conversation(s).");
    Ok(())
}
