//! Sequential multipart upload of local files to the server's download folder.

use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::{Context, Result};
use futures::stream;
use reqwest::{
    multipart::{Form, Part},
    Body,
};
use tokio::{fs::File, io::AsyncReadExt};
use tracing::{error, info};

use crate::dispatch::{DispatchClient, ENDPOINT_UPLOAD_FILE};

pub const UPLOAD_CHUNK_SIZE: usize = 8192;
pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(300);

const FALLBACK_FILE_NAME: &str = "shared_file";

/// Receives status lines and per-file progress while an upload runs.
pub trait UploadObserver: Send + Sync {
    fn status(&self, message: &str);
    /// Fraction of the current file sent, from `0.0` to `1.0`.
    fn progress(&self, fraction: f32);
}

impl UploadObserver for () {
    fn status(&self, _message: &str) {}
    fn progress(&self, _fraction: f32) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadSummary {
    pub sent: usize,
    pub total: usize,
}

impl UploadSummary {
    pub fn all_sent(&self) -> bool {
        self.sent == self.total
    }
}

impl DispatchClient {
    /// Uploads `paths` one after another. A failed file is logged and
    /// skipped; the rest are still attempted.
    pub async fn upload_files(
        &self,
        paths: &[PathBuf],
        observer: Arc<dyn UploadObserver>,
    ) -> UploadSummary {
        let total = paths.len();
        let mut sent = 0;
        for (index, path) in paths.iter().enumerate() {
            observer.status(&format!("Sending file {} of {total}...", index + 1));
            match self.upload_file(path, observer.clone()).await {
                Ok(()) => sent += 1,
                Err(error) => {
                    error!(path = %path.display(), error = %format!("{error:#}"), "file upload failed");
                }
            }
        }

        observer.status(&format!("Sent {sent}/{total} files successfully!"));
        info!(sent, total, "upload finished");
        UploadSummary { sent, total }
    }

    /// Streams the file from disk in [`UPLOAD_CHUNK_SIZE`] reads, reporting
    /// progress after each chunk leaves.
    pub async fn upload_file(&self, path: &Path, observer: Arc<dyn UploadObserver>) -> Result<()> {
        let file = File::open(path)
            .await
            .with_context(|| format!("failed to open {}", path.display()))?;
        let length = file
            .metadata()
            .await
            .with_context(|| format!("failed to stat {}", path.display()))?
            .len();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(FALLBACK_FILE_NAME)
            .to_string();
        let mime = mime_guess::from_path(path).first_or_octet_stream();

        observer.progress(0.0);
        let body = stream::unfold(Some((file, 0u64)), move |state| {
            let observer = observer.clone();
            async move {
                let (mut file, sent) = state?;
                let mut chunk = vec![0u8; UPLOAD_CHUNK_SIZE];
                match read_chunk(&mut file, &mut chunk).await {
                    Ok(0) => None,
                    Ok(read) => {
                        chunk.truncate(read);
                        let sent = sent + read as u64;
                        if length > 0 {
                            observer.progress(sent as f32 / length as f32);
                        }
                        Some((Ok(chunk), Some((file, sent))))
                    }
                    Err(error) => Some((Err(error), None)),
                }
            }
        });

        let part = Part::stream_with_length(Body::wrap_stream(body), length)
            .file_name(file_name.clone())
            .mime_str(mime.as_ref())?;
        let form = Form::new().part("file", part);

        self.http
            .post(format!("{}{ENDPOINT_UPLOAD_FILE}", self.base_url))
            .timeout(UPLOAD_TIMEOUT)
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("failed to send {file_name}"))?
            .error_for_status()
            .with_context(|| format!("server rejected {file_name}"))?;

        info!(file_name, bytes = length, "file uploaded");
        Ok(())
    }
}

/// Fills `buffer` unless the file ends first; returns the bytes read.
async fn read_chunk(file: &mut File, buffer: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        let read = file.read(&mut buffer[filled..]).await?;
        if read == 0 {
            break;
        }
        filled += read;
    }
    Ok(filled)
}

#[cfg(test)]
#[path = "tests/upload_tests.rs"]
mod tests;
