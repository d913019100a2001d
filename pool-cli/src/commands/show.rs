//! Show one conversation.

use anyhow::{bail, Result};
use std::path::Path;

use super::open_session;

pub async fn run(data_dir: &Path, id: &str) -> Result<()> {
    let session = open_session(data_dir).await?;
    let mirror = session.mirror();
    let guard = mirror.lock().unwrap();

    let Some(detail) = guard.get_conversation(id)? else {
        bail!("no conversation with id {id} (not synced yet?)");
    };

    println!("{} [{}]", detail.summary.title, detail.summary.platform);
    if let Some(model) = &detail.summary.model {
        println!("model: {model}");
    }
    println!("source: {}", detail.summary.source_url);
    println!();

    for message in &detail.messages {
        println!("[{}] {}", message.role, message.content);
        println!();
    }
    Ok(())
}
