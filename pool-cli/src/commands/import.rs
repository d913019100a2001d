//! Encrypt and upload exported conversation files.

use anyhow::{bail, Context, Result};
use pool_types::{Conversation, ImportOutcome};
use std::path::{Path, PathBuf};

use super::open_session;

pub async fn run(data_dir: &Path, files: &[PathBuf]) -> Result<()> {
    if files.is_empty() {
        bail!("no files given");
    }
    let session = open_session(data_dir).await?;

    let mut created = 0u64;
    let mut deduplicated = 0u64;
    for file in files {
        let contents = tokio::fs::read_to_string(file)
            .await
            .with_context(|| format!("reading {}", file.display()))?;
        let conversation: Conversation = serde_json::from_str(&contents)
            .with_context(|| format!("{} is not an exported conversation", file.display()))?;

        match session.import_conversation(&conversation).await? {
            ImportOutcome::Created(_) => {
                created += 1;
                println!("uploaded {}", conversation.external_id);
            }
            ImportOutcome::Deduplicated => {
                deduplicated += 1;
                println!("already pooled {}", conversation.external_id);
            }
        }
    }

    println!("Done: {created} uploaded, {deduplicated} already present.");
    Ok(())
}
