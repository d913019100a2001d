//! Write a backup of the local mirror.

use anyhow::{Context, Result};
use std::path::Path;

use super::open_session;

pub async fn run(data_dir: &Path, path: &Path) -> Result<()> {
    let session = open_session(data_dir).await?;
    let bytes = session.export_backup()?;
    tokio::fs::write(path, &bytes)
        .await
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
