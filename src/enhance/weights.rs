use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::info;

use crate::enhance::registry::ModelSpec;

/// Resolve the weight file for a model, downloading it into the cache
/// directory on first use. The download goes through a temp file and a
/// rename, so an interrupted transfer never leaves a partial file behind.
pub async fn ensure(spec: &ModelSpec, dir: &Path) -> anyhow::Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("create weights dir {}", dir.display()))?;

    let path = dir.join(format!("{}.pth", spec.name));
    if tokio::fs::try_exists(&path).await? {
        return Ok(path);
    }

    info!(model = spec.name, url = spec.url, "downloading model weights");
    let resp = reqwest::get(spec.url)
        .await
        .with_context(|| format!("request weights for {}", spec.name))?;
    anyhow::ensure!(
        resp.status().is_success(),
        "weight download for {} failed with status {}",
        spec.name,
        resp.status()
    );
    let body = resp.bytes().await.context("read weight download body")?;
    anyhow::ensure!(!body.is_empty(), "weight download for {} was empty", spec.name);

    let tmp = dir.join(format!("{}.pth.partial", spec.name));
    tokio::fs::write(&tmp, &body)
        .await
        .with_context(|| format!("write {}", tmp.display()))?;
    tokio::fs::rename(&tmp, &path)
        .await
        .with_context(|| format!("rename into {}", path.display()))?;

    info!(model = spec.name, path = %path.display(), bytes = body.len(), "model weights cached");
    Ok(path)
}
