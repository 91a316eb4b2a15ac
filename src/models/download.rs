use std::{
    fs::{self, File},
    io::{self, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use reqwest::{blocking::Client, Url};

use crate::core::error::LoadError;

const CHUNK_SIZE: usize = 32 * 1024;

/// Network side of a load: streams the body of `url` into `sink`.
///
/// `progress` receives the running byte count and the advertised length, if any.
/// Returns the number of bytes written.
pub trait Fetcher: Send + Sync {
    fn fetch(
        &self,
        url: &Url,
        sink: &mut dyn Write,
        progress: &mut dyn FnMut(u64, Option<u64>),
    ) -> Result<u64>;
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder().build().context("create http client")?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(
        &self,
        url: &Url,
        sink: &mut dyn Write,
        progress: &mut dyn FnMut(u64, Option<u64>),
    ) -> Result<u64> {
        let mut response = self
            .client
            .get(url.clone())
            .send()
            .with_context(|| format!("request {url}"))?
            .error_for_status()
            .with_context(|| format!("download {url}"))?;

        let total = response.content_length();
        let mut downloaded = 0u64;
        let mut buffer = vec![0u8; CHUNK_SIZE];
        loop {
            let read = response.read(&mut buffer).context("read download chunk")?;
            if read == 0 {
                break;
            }
            sink.write_all(&buffer[..read])
                .context("write download chunk")?;
            downloaded += read as u64;
            progress(downloaded, total);
        }
        Ok(downloaded)
    }
}

#[derive(Debug)]
pub struct DownloadOutcome {
    pub final_path: PathBuf,
    pub bytes_downloaded: u64,
}

/// `.<file>.partial` next to `destination`. Cache entries never start with a
/// dot, so a leftover staging file is never mistaken for one.
#[must_use]
pub fn staging_path(destination: &Path) -> PathBuf {
    let mut name = std::ffi::OsString::from(".");
    if let Some(file_name) = destination.file_name() {
        name.push(file_name);
    }
    name.push(".partial");
    destination.with_file_name(name)
}

/// Downloads into a staging file next to `destination`, then renames it into
/// place. On failure the staging file is removed and `destination` is untouched.
pub fn download_to_path<F>(
    fetcher: &dyn Fetcher,
    url: &Url,
    destination: &Path,
    mut progress: F,
) -> Result<DownloadOutcome, LoadError>
where
    F: FnMut(u64, Option<u64>),
{
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|error| LoadError::storage(parent, error))?;
    }

    let staging = staging_path(destination);
    match stage(fetcher, url, &staging, &mut progress) {
        Ok(bytes_downloaded) => {
            fs::rename(&staging, destination).map_err(|error| {
                let _ = fs::remove_file(&staging);
                LoadError::storage(destination, error)
            })?;
            Ok(DownloadOutcome {
                final_path: destination.to_path_buf(),
                bytes_downloaded,
            })
        }
        Err(error) => {
            let _ = fs::remove_file(&staging);
            Err(error)
        }
    }
}

fn stage<F>(
    fetcher: &dyn Fetcher,
    url: &Url,
    staging: &Path,
    progress: &mut F,
) -> Result<u64, LoadError>
where
    F: FnMut(u64, Option<u64>),
{
    let file = File::create(staging).map_err(|error| LoadError::storage(staging, error))?;
    let mut writer = StagingWriter {
        inner: BufWriter::new(file),
        write_error: None,
    };

    let mut report = |done: u64, total: Option<u64>| progress(done, total);
    let downloaded = match fetcher.fetch(url, &mut writer, &mut report) {
        Ok(downloaded) => downloaded,
        // Local write failures surface as storage errors; everything else is transport.
        Err(error) => {
            return Err(match writer.write_error.take() {
                Some(io_error) => LoadError::storage(staging, io_error),
                None => LoadError::Transport {
                    url: url.to_string(),
                    message: format!("{error:#}"),
                },
            })
        }
    };

    let file = writer
        .inner
        .into_inner()
        .map_err(|error| LoadError::storage(staging, error.into_error()))?;
    file.sync_all()
        .map_err(|error| LoadError::storage(staging, error))?;
    Ok(downloaded)
}

/// Remembers the first local write failure so it is not mistaken for a network error.
struct StagingWriter {
    inner: BufWriter<File>,
    write_error: Option<io::Error>,
}

impl StagingWriter {
    fn record(&mut self, error: io::Error) -> io::Error {
        if self.write_error.is_none() {
            self.write_error = Some(io::Error::new(error.kind(), error.to_string()));
        }
        error
    }
}

impl Write for StagingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf).map_err(|error| self.record(error))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush().map_err(|error| self.record(error))
    }
}
