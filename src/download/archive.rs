//! Branch archive downloads over HTTP.

use anyhow::{Context, Result, bail};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use ureq::Agent;

/// Stream `url` into `dest`, returning the number of bytes written.
///
/// The body is written to a `.part` sibling first and renamed into place once
/// complete, so an interrupted download never leaves a truncated archive under
/// the final name.
pub(super) fn download(agent: &Agent, user_agent: &str, url: &str, dest: &Path) -> Result<u64> {
    let response = agent
        .get(url)
        .header("User-Agent", user_agent)
        .call()
        .with_context(|| format!("Failed to request {url}"))?;

    let status = response.status().as_u16();
    if status != 200 {
        bail!("Archive request to {url} returned HTTP {status}");
    }

    let partial = partial_path(dest);
    let written = match write_body(response.into_body().into_reader(), &partial) {
        Ok(written) => written,
        Err(e) => {
            let _ = fs::remove_file(&partial);
            return Err(e.context(format!("Failed to download {url}")));
        }
    };

    fs::rename(&partial, dest)
        .with_context(|| format!("Failed to move archive into {}", dest.display()))?;
    debug!(url, dest = %dest.display(), bytes = written, "Archive saved");
    Ok(written)
}

fn write_body(mut body: impl io::Read, path: &Path) -> Result<u64> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    let written = io::copy(&mut body, &mut writer)?;
    writer.flush()?;
    Ok(written)
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}
