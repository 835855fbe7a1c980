//! Dataset Acquisition Module
//! Ensures the raw Covid19Casos CSV exists locally, downloading and
//! extracting the upstream archive when it does not.

use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

use crate::data::DataPaths;

/// Upstream archive published by the Argentine Ministry of Health.
pub const DATASET_URL: &str =
    "https://sisa.msal.gov.ar/datos/descargas/covid-19/files/Covid19Casos.zip";

/// Streaming chunk size for the download.
const CHUNK_SIZE: usize = 1024;

#[derive(Error, Debug)]
pub enum AcquireError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Download failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to extract archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("Response has no content-length header; refusing to download blind")]
    MissingContentLength,
    #[error("Archive extracted but {0} is still missing")]
    DatasetMissingFromArchive(PathBuf),
}

/// Make sure the raw case-level CSV is present on disk, returning its path.
///
/// Order of preference: an existing CSV is used as-is (no freshness check,
/// no network access); an existing archive is extracted in place; otherwise
/// the archive is downloaded from [`DATASET_URL`] and then extracted.
///
/// A failed download leaves a partial archive behind; re-running acquisition
/// after deleting it is the recovery path.
pub fn ensure_raw_dataset(paths: &DataPaths) -> Result<PathBuf, AcquireError> {
    // The derived-artifact directory is created up front so aggregation can
    // always write into it.
    fs::create_dir_all(paths.summary_dir())?;

    let raw_csv = paths.raw_csv();
    if raw_csv.is_file() {
        info!("raw dataset present at {}", raw_csv.display());
        return Ok(raw_csv);
    }

    let archive = paths.archive();
    if !archive.is_file() {
        download_archive(&archive)?;
    }

    info!("extracting {}", archive.display());
    let mut zip = zip::ZipArchive::new(File::open(&archive)?)?;
    zip.extract(paths.work_dir())?;

    if !raw_csv.is_file() {
        return Err(AcquireError::DatasetMissingFromArchive(raw_csv));
    }
    Ok(raw_csv)
}

/// Stream the upstream archive to `dest` in fixed-size chunks, reporting
/// cumulative bytes written.
fn download_archive(dest: &std::path::Path) -> Result<(), AcquireError> {
    info!("downloading {}", DATASET_URL);

    let client = reqwest::blocking::Client::new();
    let mut response = client.get(DATASET_URL).send()?.error_for_status()?;

    let total_size = response
        .content_length()
        .ok_or(AcquireError::MissingContentLength)?;

    let pb = ProgressBar::new(total_size);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
            )
            .unwrap()
            .progress_chars("#>-"),
    );

    let mut file = File::create(dest)?;
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = response.read(&mut buf)?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n])?;
        pb.inc(n as u64);
    }
    pb.finish_with_message("download complete");

    info!("saved archive to {}", dest.display());
    Ok(())
}
