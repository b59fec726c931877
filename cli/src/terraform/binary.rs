//! Terraform binary provisioning — download, verify, cache, reuse.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

use crate::domain::ProvisionError;
use crate::output::progress;

/// Pinned Terraform release managed by this tool.
pub const TERRAFORM_VERSION: &str = "1.8.0";

const BINARY_NAME: &str = if cfg!(windows) { "terraform.exe" } else { "terraform" };

const RELEASES_BASE_URL: &str = "https://releases.hashicorp.com/terraform";

/// Resolves, downloads, and caches the Terraform executable for the host
/// platform.
pub struct TerraformBinary {
    version: String,
    cache_dir: PathBuf,
}

impl TerraformBinary {
    /// Binary manager rooted at the OS application cache directory —
    /// `~/.cache/groundwork` on Linux, `~/Library/Caches/groundwork` on
    /// macOS, `%LOCALAPPDATA%\groundwork` on Windows.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory cannot be determined.
    pub fn new() -> Result<Self> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("cannot determine cache directory"))?
            .join("groundwork");
        Ok(Self::with_cache_dir(cache_dir))
    }

    /// Binary manager rooted at an explicit cache directory (used in tests).
    #[must_use]
    pub fn with_cache_dir(cache_dir: PathBuf) -> Self {
        Self {
            version: TERRAFORM_VERSION.to_string(),
            cache_dir,
        }
    }

    /// Expected path of the terraform executable.
    #[must_use]
    pub fn binary_path(&self) -> PathBuf {
        self.cache_dir.join(BINARY_NAME)
    }

    /// Path to the executable, downloading the release on a cache miss.
    ///
    /// A cached binary is trusted by filename alone; integrity is verified
    /// once, at download time, against the vendor checksum manifest.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::UnsupportedPlatform`] for an unknown
    /// OS/architecture pair, [`ProvisionError::Download`] on network failure
    /// (partial archive deleted, retryable), and
    /// [`ProvisionError::CorruptArchive`] on checksum or extraction failure.
    pub fn ensure(&self, show_progress: bool) -> Result<PathBuf> {
        let path = self.binary_path();
        if path.is_file() {
            return Ok(path);
        }

        fs::create_dir_all(&self.cache_dir)
            .with_context(|| format!("creating cache directory {}", self.cache_dir.display()))?;

        let archive =
            release_archive_name(std::env::consts::OS, std::env::consts::ARCH, &self.version)?;
        let url = format!("{RELEASES_BASE_URL}/{}/{archive}", self.version);
        let archive_path = self.cache_dir.join(&archive);

        self.download(&url, &archive_path, show_progress)?;
        self.verify_archive(&archive_path, &archive)?;
        self.extract(&archive_path)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
                .with_context(|| format!("setting permissions on {}", path.display()))?;
        }

        Ok(path)
    }

    /// Stream the release archive to disk. A partial file never survives a
    /// failed download.
    fn download(&self, url: &str, dest: &Path, show_progress: bool) -> Result<(), ProvisionError> {
        let download_err = |reason: String| ProvisionError::Download {
            version: self.version.clone(),
            reason,
        };

        let response = ureq::get(url).call().map_err(|e| download_err(e.to_string()))?;
        let total: Option<u64> = response
            .header("content-length")
            .and_then(|v| v.parse().ok());

        let bar = match (show_progress, total) {
            (true, Some(total)) => Some(progress::bar(
                total,
                &format!("Downloading terraform v{}", self.version),
            )),
            _ => None,
        };

        let result = stream_to_file(response.into_reader(), dest, bar.as_ref());
        match result {
            Ok(()) => {
                if let Some(bar) = &bar {
                    progress::finish_success(bar, &format!("terraform v{} downloaded", self.version));
                }
                Ok(())
            }
            Err(e) => {
                if let Some(bar) = &bar {
                    progress::finish_error(bar, "download failed");
                }
                let _ = fs::remove_file(dest);
                Err(download_err(e.to_string()))
            }
        }
    }

    /// Check the archive digest against the vendor's `SHA256SUMS` manifest.
    fn verify_archive(&self, archive_path: &Path, archive_name: &str) -> Result<(), ProvisionError> {
        let manifest_url = format!(
            "{RELEASES_BASE_URL}/{v}/terraform_{v}_SHA256SUMS",
            v = self.version
        );
        let manifest_err = |reason: String| {
            let _ = fs::remove_file(archive_path);
            ProvisionError::Download {
                version: self.version.clone(),
                reason: format!("fetching checksum manifest: {reason}"),
            }
        };
        let manifest = ureq::get(&manifest_url)
            .call()
            .map_err(|e| manifest_err(e.to_string()))?
            .into_string()
            .map_err(|e| manifest_err(e.to_string()))?;

        let corrupt = |reason: String| {
            let _ = fs::remove_file(archive_path);
            ProvisionError::CorruptArchive { reason }
        };

        let expected = find_checksum(&manifest, archive_name)
            .ok_or_else(|| corrupt(format!("no checksum entry for {archive_name}")))?;
        let actual = sha256_file(archive_path).map_err(|e| corrupt(e.to_string()))?;
        if actual != expected {
            return Err(corrupt(format!(
                "checksum mismatch: expected {expected}, got {actual}"
            )));
        }
        Ok(())
    }

    /// Unpack the archive into the cache directory and remove it.
    fn extract(&self, archive_path: &Path) -> Result<(), ProvisionError> {
        let corrupt = |reason: String| {
            let _ = fs::remove_file(archive_path);
            ProvisionError::CorruptArchive { reason }
        };

        let file = fs::File::open(archive_path).map_err(|e| corrupt(e.to_string()))?;
        let mut archive = zip::ZipArchive::new(file).map_err(|e| corrupt(e.to_string()))?;
        archive
            .extract(&self.cache_dir)
            .map_err(|e| corrupt(e.to_string()))?;
        let _ = fs::remove_file(archive_path);

        if !self.binary_path().is_file() {
            return Err(ProvisionError::CorruptArchive {
                reason: format!("archive did not contain {BINARY_NAME}"),
            });
        }
        Ok(())
    }
}

/// Map (OS, CPU architecture) to the vendor release archive name.
pub(crate) fn release_archive_name(
    os: &str,
    arch: &str,
    version: &str,
) -> Result<String, ProvisionError> {
    let (os_part, arch_part) = match (os, arch) {
        ("linux", "x86_64") => ("linux", "amd64"),
        ("linux", "aarch64") => ("linux", "arm64"),
        ("macos", "x86_64") => ("darwin", "amd64"),
        ("macos", "aarch64") => ("darwin", "arm64"),
        ("windows", "x86_64") => ("windows", "amd64"),
        _ => {
            return Err(ProvisionError::UnsupportedPlatform {
                os: os.to_string(),
                arch: arch.to_string(),
            });
        }
    };
    Ok(format!("terraform_{version}_{os_part}_{arch_part}.zip"))
}

/// Find the hex digest for `archive_name` in a `SHA256SUMS` manifest.
pub(crate) fn find_checksum(manifest: &str, archive_name: &str) -> Option<String> {
    manifest.lines().find_map(|line| {
        let mut parts = line.split_whitespace();
        let digest = parts.next()?;
        let name = parts.next()?;
        (name == archive_name).then(|| digest.to_string())
    })
}

fn stream_to_file(
    mut reader: impl Read,
    dest: &Path,
    bar: Option<&indicatif::ProgressBar>,
) -> std::io::Result<()> {
    let mut file = fs::File::create(dest)?;
    let mut buf = vec![0u8; 65536];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        std::io::Write::write_all(&mut file, &buf[..n])?;
        if let Some(bar) = bar {
            bar.inc(n as u64);
        }
    }
    Ok(())
}

/// Compute the SHA256 hex digest of a file, reading in 64 KB chunks.
fn sha256_file(path: &Path) -> Result<String> {
    let mut file =
        fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 65536];
    loop {
        let n = file.read(&mut buf).context("reading file")?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex_encode(&hasher.finalize()))
}

/// Lowercase hex encoding of a byte slice.
fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
