//! # pdfium-provision
//!
//! Find a usable [PDFium](https://pdfium.googlesource.com/pdfium/) shared
//! library for `pdfium-render`, fetching it on demand, and bind to it.
//!
//! ## Resolution order
//!
//! [`Provisioner::provision`] walks these sources and stops at the first hit:
//!
//! 1. **Override** — `PDFIUM_LIB_PATH` (or [`Provisioner::with_library`])
//!    names an existing library file.
//! 2. **Cache** — `{cache_root}/pdfium-{VERSION}/{lib_name}` already exists.
//! 3. **System** — the platform loader can find the library by its default
//!    name (`libpdfium.so`, `libpdfium.dylib`, `pdfium.dll`).
//! 4. **Download** — the platform archive from
//!    [bblanchon/pdfium-binaries](https://github.com/bblanchon/pdfium-binaries)
//!    is fetched and the library extracted into the cache. Skipped when
//!    offline mode is on (`PDFIUM_PROVISION_OFFLINE=1`).
//!
//! ```rust,no_run
//! use pdfium_provision::Provisioner;
//!
//! let provisioner = Provisioner::from_env();
//! let (pdfium, source) = provisioner.bind(None).expect("PDFium unavailable");
//! eprintln!("using PDFium from {source}");
//! # drop(pdfium);
//! ```

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use pdfium_render::prelude::Pdfium;
use thiserror::Error;
use tracing::{debug, info, warn};

/// pdfium-binaries release tag used for downloads.
pub const PDFIUM_VERSION: &str = "7690";

const RELEASE_BASE_URL: &str = "https://github.com/bblanchon/pdfium-binaries/releases/download";

/// Progress sink for the download step: `(bytes_so_far, total_if_known)`.
pub type DownloadProgress<'a> = &'a dyn Fn(u64, Option<u64>);

/// Errors raised while locating or binding PDFium.
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("No PDFium build is published for {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("Cannot prepare cache directory '{path}': {source}")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("PDFium download failed: {0}")]
    Download(String),

    #[error("PDFium archive extraction failed: {0}")]
    Extract(String),

    /// Nothing local was found and downloading is disabled.
    #[error(
        "PDFium library not found and offline mode is enabled.\n\
         Set PDFIUM_LIB_PATH=/path/to/libpdfium or unset PDFIUM_PROVISION_OFFLINE."
    )]
    NotFound,

    #[error("Failed to bind PDFium from {source_desc}: {reason}")]
    Bind { source_desc: String, reason: String },
}

/// Where the bound library came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibrarySource {
    Override(PathBuf),
    Cached(PathBuf),
    System,
    Downloaded(PathBuf),
}

impl LibrarySource {
    /// Path on disk, `None` for a loader-resolved system library.
    pub fn path(&self) -> Option<&Path> {
        match self {
            LibrarySource::Override(p) | LibrarySource::Cached(p) | LibrarySource::Downloaded(p) => {
                Some(p)
            }
            LibrarySource::System => None,
        }
    }
}

impl fmt::Display for LibrarySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LibrarySource::Override(p) => write!(f, "override '{}'", p.display()),
            LibrarySource::Cached(p) => write!(f, "cache '{}'", p.display()),
            LibrarySource::System => f.write_str("system library path"),
            LibrarySource::Downloaded(p) => write!(f, "fresh download '{}'", p.display()),
        }
    }
}

/// Release asset for one OS/arch pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformAsset {
    pub os: &'static str,
    pub arch: &'static str,
    /// File name of the `.tgz` in the GitHub release.
    pub archive: &'static str,
    /// Member path of the library inside the archive.
    pub member: &'static str,
    /// File name written to the cache.
    pub lib_name: &'static str,
}

const PLATFORM_ASSETS: &[PlatformAsset] = &[
    PlatformAsset {
        os: "macos",
        arch: "aarch64",
        archive: "pdfium-mac-arm64.tgz",
        member: "lib/libpdfium.dylib",
        lib_name: "libpdfium.dylib",
    },
    PlatformAsset {
        os: "macos",
        arch: "x86_64",
        archive: "pdfium-mac-x64.tgz",
        member: "lib/libpdfium.dylib",
        lib_name: "libpdfium.dylib",
    },
    PlatformAsset {
        os: "linux",
        arch: "x86_64",
        archive: "pdfium-linux-x64.tgz",
        member: "lib/libpdfium.so",
        lib_name: "libpdfium.so",
    },
    PlatformAsset {
        os: "linux",
        arch: "aarch64",
        archive: "pdfium-linux-arm64.tgz",
        member: "lib/libpdfium.so",
        lib_name: "libpdfium.so",
    },
    PlatformAsset {
        os: "windows",
        arch: "x86_64",
        archive: "pdfium-win-x64.tgz",
        member: "bin/pdfium.dll",
        lib_name: "pdfium.dll",
    },
    PlatformAsset {
        os: "windows",
        arch: "aarch64",
        archive: "pdfium-win-arm64.tgz",
        member: "bin/pdfium.dll",
        lib_name: "pdfium.dll",
    },
    PlatformAsset {
        os: "windows",
        arch: "x86",
        archive: "pdfium-win-x86.tgz",
        member: "bin/pdfium.dll",
        lib_name: "pdfium.dll",
    },
];

/// Look up the release asset for an OS/arch pair (as in `std::env::consts`).
pub fn platform_asset(os: &str, arch: &str) -> Result<PlatformAsset, ProvisionError> {
    PLATFORM_ASSETS
        .iter()
        .copied()
        .find(|a| a.os == os && a.arch == arch)
        .ok_or_else(|| ProvisionError::UnsupportedPlatform {
            os: os.to_string(),
            arch: arch.to_string(),
        })
}

/// Release asset for the running platform.
pub fn current_platform() -> Result<PlatformAsset, ProvisionError> {
    platform_asset(std::env::consts::OS, std::env::consts::ARCH)
}

/// Resolves and binds PDFium.
#[derive(Debug, Clone)]
pub struct Provisioner {
    library_override: Option<PathBuf>,
    cache_root: PathBuf,
    offline: bool,
    try_system: bool,
}

impl Default for Provisioner {
    fn default() -> Self {
        Self {
            library_override: None,
            cache_root: default_cache_root(),
            offline: false,
            try_system: true,
        }
    }
}

impl Provisioner {
    /// Build from `PDFIUM_LIB_PATH`, `PDFIUM_PROVISION_CACHE_DIR` and
    /// `PDFIUM_PROVISION_OFFLINE`.
    pub fn from_env() -> Self {
        let mut p = Self::default();
        if let Some(lib) = non_empty_env("PDFIUM_LIB_PATH") {
            p.library_override = Some(PathBuf::from(lib));
        }
        if let Some(dir) = non_empty_env("PDFIUM_PROVISION_CACHE_DIR") {
            p.cache_root = PathBuf::from(dir);
        }
        if let Some(flag) = non_empty_env("PDFIUM_PROVISION_OFFLINE") {
            p.offline = !matches!(flag.to_ascii_lowercase().as_str(), "0" | "false" | "no");
        }
        p
    }

    pub fn with_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_override = Some(path.into());
        self
    }

    pub fn with_cache_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_root = dir.into();
        self
    }

    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Skip the loader search step (useful when a pinned build is required).
    pub fn try_system(mut self, yes: bool) -> Self {
        self.try_system = yes;
        self
    }

    /// Versioned directory holding the cached library.
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_root.join(format!("pdfium-{PDFIUM_VERSION}"))
    }

    /// Library path in the cache for `asset` (may not exist yet).
    pub fn cached_library(&self, asset: &PlatformAsset) -> PathBuf {
        self.cache_dir().join(asset.lib_name)
    }

    /// Local source without touching the network or loading anything.
    pub fn locate(&self) -> Option<LibrarySource> {
        if let Some(ref p) = self.library_override {
            if p.is_file() {
                return Some(LibrarySource::Override(p.clone()));
            }
            warn!("PDFIUM_LIB_PATH '{}' does not exist; ignoring", p.display());
        }
        let asset = current_platform().ok()?;
        let cached = self.cached_library(&asset);
        cached.is_file().then_some(LibrarySource::Cached(cached))
    }

    /// Resolve a library file, downloading it when nothing local exists.
    ///
    /// Never returns [`LibrarySource::System`]; loader lookup happens in
    /// [`Provisioner::bind`].
    pub fn provision(
        &self,
        on_progress: Option<DownloadProgress<'_>>,
    ) -> Result<LibrarySource, ProvisionError> {
        if let Some(found) = self.locate() {
            return Ok(found);
        }
        if self.offline {
            return Err(ProvisionError::NotFound);
        }

        let asset = current_platform()?;
        let dir = self.cache_dir();
        std::fs::create_dir_all(&dir).map_err(|source| ProvisionError::CacheDir {
            path: dir.clone(),
            source,
        })?;

        let url = format!("{RELEASE_BASE_URL}/chromium%2F{PDFIUM_VERSION}/{}", asset.archive);
        info!("Downloading PDFium {} from {}", PDFIUM_VERSION, url);
        let archive = fetch(&url, on_progress)?;

        let dest = self.cached_library(&asset);
        unpack_member(&archive, asset.member, &dest)?;
        info!("PDFium cached at {}", dest.display());
        Ok(LibrarySource::Downloaded(dest))
    }

    /// Bind `pdfium-render` to the first working source.
    pub fn bind(
        &self,
        on_progress: Option<DownloadProgress<'_>>,
    ) -> Result<(Pdfium, LibrarySource), ProvisionError> {
        if let Some(found) = self.locate() {
            return bind_source(found);
        }

        if self.try_system {
            match Pdfium::bind_to_system_library() {
                Ok(bindings) => {
                    debug!("Bound PDFium from the system library path");
                    return Ok((Pdfium::new(bindings), LibrarySource::System));
                }
                Err(e) => debug!("No system PDFium: {e}"),
            }
        }

        bind_source(self.provision(on_progress)?)
    }
}

fn bind_source(source: LibrarySource) -> Result<(Pdfium, LibrarySource), ProvisionError> {
    let path = match source.path() {
        Some(p) => p.to_path_buf(),
        None => {
            return Err(ProvisionError::Bind {
                source_desc: source.to_string(),
                reason: "no library path".into(),
            })
        }
    };
    let bindings = Pdfium::bind_to_library(&path).map_err(|e| ProvisionError::Bind {
        source_desc: source.to_string(),
        reason: e.to_string(),
    })?;
    debug!("Bound PDFium from {source}");
    Ok((Pdfium::new(bindings), source))
}

fn default_cache_root() -> PathBuf {
    dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(std::env::temp_dir)
        .join("pdfstitch")
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn fetch(url: &str, on_progress: Option<DownloadProgress<'_>>) -> Result<Vec<u8>, ProvisionError> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("pdfium-provision/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| ProvisionError::Download(e.to_string()))?;

    let mut response = client
        .get(url)
        .send()
        .map_err(|e| ProvisionError::Download(format!("GET {url}: {e}")))?;

    if !response.status().is_success() {
        return Err(ProvisionError::Download(format!(
            "HTTP {} for {url}",
            response.status()
        )));
    }

    let total = response.content_length();
    let mut body = Vec::with_capacity(total.unwrap_or(0) as usize);
    let mut chunk = [0u8; 64 * 1024];
    loop {
        let n = match response.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ProvisionError::Download(format!("read: {e}"))),
        };
        body.extend_from_slice(&chunk[..n]);
        if let Some(cb) = on_progress {
            cb(body.len() as u64, total);
        }
    }
    Ok(body)
}

/// Copy one member of a `.tgz` archive to `dest`.
fn unpack_member(archive: &[u8], member: &str, dest: &Path) -> Result<(), ProvisionError> {
    let mut tar = tar::Archive::new(flate2::read::GzDecoder::new(archive));
    let entries = tar
        .entries()
        .map_err(|e| ProvisionError::Extract(e.to_string()))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| ProvisionError::Extract(e.to_string()))?;
        let is_member = entry
            .path()
            .map(|p| p.as_os_str() == std::ffi::OsStr::new(member))
            .map_err(|e| ProvisionError::Extract(e.to_string()))?;
        if is_member {
            entry
                .unpack(dest)
                .map_err(|e| ProvisionError::Extract(format!("{member}: {e}")))?;
            return Ok(());
        }
    }

    Err(ProvisionError::Extract(format!("'{member}' missing from archive")))
}
