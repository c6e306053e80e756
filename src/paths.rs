//! Where Depository keeps its files.
//!
//! The config file lives under the platform config root, persisted settings
//! under the local data root. Both fall back to the working directory when
//! neither the platform variables nor `HOME` are set.

use std::ffi::OsString;
use std::path::PathBuf;

/// Directory name used under the platform config and data roots.
pub const APP_DIR: &str = "depository";

/// Platform directory a file is stored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Root {
    Config,
    Data,
}

impl Root {
    /// Environment variables consulted in order before falling back to home.
    #[cfg(windows)]
    const fn overrides(self) -> &'static [&'static str] {
        match self {
            Self::Config => &["APPDATA"],
            Self::Data => &["LOCALAPPDATA", "APPDATA"],
        }
    }

    #[cfg(not(windows))]
    const fn overrides(self) -> &'static [&'static str] {
        match self {
            Self::Config => &["XDG_CONFIG_HOME"],
            Self::Data => &["XDG_DATA_HOME"],
        }
    }

    /// Location of this root relative to the home directory.
    #[cfg(target_os = "macos")]
    const fn under_home(self) -> &'static [&'static str] {
        match self {
            Self::Config | Self::Data => &["Library", "Application Support"],
        }
    }

    #[cfg(not(target_os = "macos"))]
    const fn under_home(self) -> &'static [&'static str] {
        match self {
            Self::Config => &[".config"],
            Self::Data => &[".local", "share"],
        }
    }

    fn resolve(self, var_os: &mut impl FnMut(&'static str) -> Option<OsString>) -> Option<PathBuf> {
        if let Some(dir) = self.overrides().iter().find_map(|&key| var_os(key)) {
            return Some(PathBuf::from(dir));
        }
        let mut home = PathBuf::from(home_from(var_os)?);
        home.extend(self.under_home());
        Some(home)
    }
}

#[cfg(windows)]
fn home_from(var_os: &mut impl FnMut(&'static str) -> Option<OsString>) -> Option<OsString> {
    var_os("USERPROFILE").or_else(|| var_os("HOME"))
}

#[cfg(not(windows))]
fn home_from(var_os: &mut impl FnMut(&'static str) -> Option<OsString>) -> Option<OsString> {
    var_os("HOME")
}

fn app_file(root: Root, name: &str) -> PathBuf {
    let mut var_os = |key: &'static str| std::env::var_os(key);
    root.resolve(&mut var_os)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(name)
}

/// Default location of `config.json`.
#[must_use]
pub fn config_file() -> PathBuf {
    app_file(Root::Config, "config.json")
}

/// Location of the persisted update settings.
#[must_use]
pub fn settings_file() -> PathBuf {
    app_file(Root::Data, "settings.json")
}

/// Path to the debug log file, in the OS temp directory.
#[must_use]
pub fn log_path() -> PathBuf {
    std::env::temp_dir().join("depository.log")
}
