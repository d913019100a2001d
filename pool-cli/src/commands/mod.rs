//! CLI subcommands.

pub mod export;
pub mod import;
pub mod list;
pub mod search;
pub mod show;
pub mod signup;
pub mod sync;

use anyhow::{Context, Result};
use pool_client::{FsSnapshotStore, HttpRemote, Session, SnapshotStore};
use std::path::Path;
use std::sync::Arc;

use crate::config::CliConfig;

/// Open a session for the configured organization, prompting for the
/// password.
pub(crate) async fn open_session(data_dir: &Path) -> Result<Session> {
    let config = CliConfig::load(data_dir).await?;
    let password = rpassword::prompt_password("Organization password: ")
        .context("failed to read password")?;

    let remote = Arc::new(HttpRemote::new(&config.server_url)?);
    let snapshots: Arc<dyn SnapshotStore> =
        Arc::new(FsSnapshotStore::new(data_dir.join(&config.org_slug))?);

    Session::login(remote, snapshots, &config.org_slug, &password)
        .await
        .context("login failed")
}
