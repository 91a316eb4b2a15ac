mod cache;
mod download;
mod service;

pub use cache::{cache_file_name, parse_url, CacheKeyStrategy, CachedFile, ModelCache};
pub use download::{download_to_path, staging_path, DownloadOutcome, Fetcher, HttpFetcher};
pub use service::{LoadResult, LoadService, LoadTicket};
