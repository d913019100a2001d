//! Create a new organization.

use anyhow::{bail, Context, Result};
use pool_client::{FsSnapshotStore, HttpRemote, Session, SnapshotStore};
use std::path::Path;
use std::sync::Arc;

use crate::config::CliConfig;

pub async fn run(data_dir: &Path, server: &str, name: &str, slug: &str) -> Result<()> {
    let password = rpassword::prompt_password("Choose an organization password: ")
        .context("failed to read password")?;
    let confirm = rpassword::prompt_password("Repeat password: ")
        .context("failed to read password")?;
    if password != confirm {
        bail!("passwords do not match");
    }

    let remote = Arc::new(HttpRemote::new(server)?);
    let snapshots: Arc<dyn SnapshotStore> =
        Arc::new(FsSnapshotStore::new(data_dir.join(slug))?);

    let (_session, org) = Session::signup(remote, snapshots, name, slug, &password)
        .await
        .context("signup failed")?;

    CliConfig {
        server_url: server.to_string(),
        org_slug: org.slug.clone(),
    }
    .save(data_dir)
    .await?;

    println!("Created organization '{}' ({})", org.name, org.slug);
    println!("Share the slug and password with your team. The password cannot be recovered.");
    Ok(())
}
