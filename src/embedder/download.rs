/// Model file auto-download from HuggingFace.
///
/// Downloads the ONNX export and tokenizer files of a sentence-transformers
/// repository if they don't already exist locally.
use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

/// Files required for the embedder, as (local name, path inside the repo).
const MODEL_FILES: &[(&str, &str)] = &[
    ("model.onnx", "onnx/model.onnx"),
    ("tokenizer.json", "tokenizer.json"),
    ("config.json", "config.json"),
    ("special_tokens_map.json", "special_tokens_map.json"),
    ("tokenizer_config.json", "tokenizer_config.json"),
];

/// Resolve URL of a file in a HuggingFace model repository.
#[must_use]
pub fn file_url(repo: &str, url_path: &str) -> String {
    format!("https://huggingface.co/{repo}/resolve/main/{url_path}")
}

/// Check whether all required model files exist in `model_dir`.
#[must_use]
pub fn all_files_present(model_dir: &Path) -> bool {
    MODEL_FILES
        .iter()
        .all(|(name, _)| model_dir.join(name).exists())
}

/// Download model files from `repo` if any are missing.
///
/// Creates the model directory if it doesn't exist.
/// Skips individual files that are already present.
pub fn download_model_files(model_dir: &Path, repo: &str) -> Result<()> {
    info!("Checking model files in {}", model_dir.display());

    fs::create_dir_all(model_dir)
        .with_context(|| format!("failed to create models directory: {}", model_dir.display()))?;

    if all_files_present(model_dir) {
        info!("All model files found, skipping download");
        return Ok(());
    }

    info!("Downloading model files from HuggingFace ({repo}), this is a one-time download");

    for &(filename, url_path) in MODEL_FILES {
        let dest = model_dir.join(filename);

        if dest.exists() {
            info!("File already exists: {filename}");
            continue;
        }

        let url = file_url(repo, url_path);
        info!("Downloading {filename}...");
        download_file(&dest, &url).with_context(|| format!("failed to download {filename}"))?;
        info!("Downloaded {filename}");
    }

    info!("Model download complete");
    Ok(())
}

/// Download a single file with a progress bar.
///
/// The body is streamed to a `.part` file that is renamed on success, so an
/// interrupted download never leaves a truncated file under the final name.
fn download_file(dest: &Path, url: &str) -> Result<()> {
    let mut resp =
        reqwest::blocking::get(url).with_context(|| format!("HTTP request failed: {url}"))?;

    if !resp.status().is_success() {
        anyhow::bail!("bad status: {} for {url}", resp.status());
    }

    let total = resp.content_length().unwrap_or(0);

    let pb = if total > 0 {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  {bar:40.cyan/blue} {percent}% ({bytes}/{total_bytes}) {msg}")?
                .progress_chars("█▓░"),
        );
        pb
    } else {
        ProgressBar::new_spinner()
    };

    save_stream(&mut resp, dest, &pb)?;
    pb.finish_and_clear();

    Ok(())
}

/// Stream `reader` into `dest` through a `.part` file.
///
/// The partial file is removed if writing or renaming fails.
fn save_stream(reader: &mut impl Read, dest: &Path, pb: &ProgressBar) -> Result<()> {
    let partial = dest.with_extension("part");

    let result = write_partial(reader, &partial, pb).and_then(|()| {
        fs::rename(&partial, dest)
            .with_context(|| format!("failed to move {} into place", partial.display()))
    });

    if result.is_err() && partial.exists() {
        if let Err(e) = fs::remove_file(&partial) {
            warn!("failed to remove {}: {e}", partial.display());
        }
    }

    result
}

fn write_partial(reader: &mut impl Read, partial: &Path, pb: &ProgressBar) -> Result<()> {
    let file = fs::File::create(partial)
        .with_context(|| format!("failed to create file: {}", partial.display()))?;

    let mut writer = pb.wrap_write(file);
    io::copy(reader, &mut writer).context("failed to write file")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_all_files_present_empty_dir() {
        let dir = tempdir().unwrap();
        assert!(!all_files_present(dir.path()));
    }

    #[test]
    fn test_all_files_present_complete() {
        let dir = tempdir().unwrap();

        for &(name, _) in MODEL_FILES {
            fs::write(dir.path().join(name), "dummy").unwrap();
        }

        assert!(all_files_present(dir.path()));
    }

    #[test]
    fn test_all_files_present_partial() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("tokenizer.json"), "dummy").unwrap();

        assert!(!all_files_present(dir.path()));
    }

    #[test]
    fn test_download_skips_when_complete() {
        let dir = tempdir().unwrap();
        for &(name, _) in MODEL_FILES {
            fs::write(dir.path().join(name), "dummy").unwrap();
        }

        // No network access happens when every file is already there
        download_model_files(dir.path(), "sentence-transformers/all-MiniLM-L6-v2").unwrap();
        let content = fs::read_to_string(dir.path().join("model.onnx")).unwrap();
        assert_eq!(content, "dummy");
    }

    /// Reader that yields some bytes and then fails, like a dropped connection.
    struct BrokenReader {
        sent: bool,
    }

    impl Read for BrokenReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.sent {
                return Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
            }
            self.sent = true;
            let n = buf.len().min(4);
            buf[..n].copy_from_slice(&b"onnx"[..n]);
            Ok(n)
        }
    }

    #[test]
    fn test_save_stream_writes_file() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("model.onnx");
        let mut reader: &[u8] = b"weights";

        save_stream(&mut reader, &dest, &ProgressBar::hidden()).unwrap();

        assert_eq!(fs::read(&dest).unwrap(), b"weights");
        assert!(!dir.path().join("model.part").exists());
    }

    #[test]
    fn test_save_stream_removes_partial_on_error() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("model.onnx");
        let mut reader = BrokenReader { sent: false };

        let result = save_stream(&mut reader, &dest, &ProgressBar::hidden());

        assert!(result.is_err());
        assert!(!dest.exists());
        assert!(!dir.path().join("model.part").exists());
    }

    #[test]
    fn test_file_url() {
        assert_eq!(
            file_url("sentence-transformers/all-MiniLM-L6-v2", "onnx/model.onnx"),
            "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main/onnx/model.onnx"
        );
    }
}
