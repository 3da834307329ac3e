//! Fetching and opening checkpoint files.

use std::path::{Path, PathBuf};

use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use futures_util::StreamExt;
use gist_core::{Error, Result};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use url::Url;

/// Key prefix left by checkpoints saved from a module wrapping the model.
const WRAPPED_PREFIX: &str = "t5";
const WRAPPED_PROBE: &str = "t5.shared.weight";

/// Download `url` to `path` unless the file is already there.
/// Returns whether a download happened.
pub async fn ensure_weights(path: &Path, url: Option<&Url>) -> Result<bool> {
    if path.exists() {
        debug!("Weights already present at {:?}", path);
        return Ok(false);
    }
    let Some(url) = url else {
        return Ok(false);
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    info!("Downloading model weights from {} to {:?}...", url, path);
    let partial = partial_path(path);
    match download(url, &partial).await {
        Ok(bytes) => {
            tokio::fs::rename(&partial, path).await?;
            info!("Download complete ({} bytes).", bytes);
            Ok(true)
        }
        Err(e) => {
            let _ = tokio::fs::remove_file(&partial).await;
            Err(e)
        }
    }
}

async fn download(url: &Url, dest: &Path) -> Result<u64> {
    let response = reqwest::get(url.clone()).await?.error_for_status()?;
    let mut file = tokio::fs::File::create(dest).await?;
    let mut stream = response.bytes_stream();
    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Open a checkpoint as a var builder rooted at the model's own keys.
/// `.safetensors` files are memory-mapped, anything else is read as a
/// PyTorch pickle.
pub fn open_checkpoint(path: &Path, dtype: DType, device: &Device) -> Result<VarBuilder<'static>> {
    let is_safetensors = path
        .extension()
        .map(|ext| ext == "safetensors")
        .unwrap_or(false);

    let vb = if is_safetensors {
        // SAFETY: the file is not modified while the model is alive.
        unsafe { VarBuilder::from_mmaped_safetensors(&[path.to_path_buf()], dtype, device) }
    } else {
        VarBuilder::from_pth(path, dtype, device)
    }
    .map_err(|e| Error::Weights(format!("{}: {}", path.display(), e)))?;

    if vb.contains_tensor(WRAPPED_PROBE) {
        debug!("Checkpoint {:?} uses the '{}.' key prefix", path, WRAPPED_PREFIX);
        Ok(vb.pp(WRAPPED_PREFIX))
    } else {
        Ok(vb)
    }
}
