//! Locations of files read and written by Kitshop.

#![allow(missing_docs)]

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use directories::ProjectDirs;
use eyre::{OptionExt, Result};

#[macro_use]
extern crate lazy_static;

/// Whether this is an official build of the software (as opposed to a local
/// build).
pub const IS_OFFICIAL_BUILD: bool = std::option_env!("KITSHOP_OFFICIAL_BUILD").is_some();

/// Environment variable that overrides the data directory entirely.
pub const DATA_DIR_ENV_VAR: &str = "KITSHOP_DATA_DIR";

const PREFS_FILE_NAME: &str = "kitshop-prefs";
const PREFS_FILE_EXTENSION: &str = "yaml";

const STORAGE_DIR_NAME: &str = "storage";
const STORAGE_FILE_EXTENSION: &str = "json";

lazy_static! {
    static ref PATHS: Option<AppPaths> = app_paths();
}

fn get() -> Result<&'static AppPaths> {
    PATHS.as_ref().ok_or_eyre("no paths")
}

/// Returns the user preferences file.
pub fn prefs_file() -> Result<&'static Path> {
    Ok(&get()?.prefs_file)
}
/// Returns the directory holding key-value storage files (such as the cart).
pub fn storage_dir() -> Result<&'static Path> {
    Ok(&get()?.storage_dir)
}
/// Returns the file backing the storage entry with the given key.
pub fn storage_file(key: &str) -> Result<PathBuf> {
    Ok(storage_file_in(storage_dir()?, key))
}
/// Returns the file backing the storage entry with the given key, inside
/// `dir`.
pub fn storage_file_in(dir: &Path, key: &str) -> PathBuf {
    let filename = key
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => c,
            _ => '_',
        })
        .collect::<String>();
    dir.join(format!("{filename}.{STORAGE_FILE_EXTENSION}"))
}

/// Renames a file to create a backup. Emits a log message indicating success or
/// failure.
pub fn move_to_backup_file(original: &Path) {
    let now = time::OffsetDateTime::now_local().unwrap_or_else(|_| time::OffsetDateTime::now_utc());
    let backup_path = backup_path(original, now);

    match std::fs::rename(original, &backup_path) {
        Ok(()) => {
            log::info!(
                "backup of {} stored at {}",
                original.display(),
                backup_path.display(),
            );
        }
        Err(e) => {
            if original.is_file() {
                log::error!("error backing up {}: {e}", original.display());
            }
        }
    }
}
fn backup_path(original: &Path, now: time::OffsetDateTime) -> PathBuf {
    let mut ret = original.to_owned();

    let stem = match ret.file_stem() {
        Some(stem) => stem.to_string_lossy().into_owned(),
        None => "unknown".to_string(),
    };
    let extension = match ret.extension() {
        Some(extension) => extension.to_string_lossy().into_owned(),
        None => "txt".to_string(),
    };

    ret.pop();

    ret.push(format!(
        "{stem}_{:04}-{:02}-{:02}_{:02}-{:02}-{:02}_bak.{extension}",
        now.year(),
        now.month() as u8,
        now.day(),
        now.hour(),
        now.minute(),
        now.second(),
    ));

    ret
}

/// Paths to external files read by Kitshop.
struct AppPaths {
    /// Path to the user preferences file.
    pub prefs_file: PathBuf,
    /// Path to the directory of key-value storage files.
    pub storage_dir: PathBuf,
}
impl AppPaths {
    fn in_dir(dir: PathBuf) -> Self {
        AppPaths {
            prefs_file: dir.join(format!("{PREFS_FILE_NAME}.{PREFS_FILE_EXTENSION}")),
            storage_dir: dir.join(STORAGE_DIR_NAME),
        }
    }
}

/// Returns the app paths.
///
/// - If [`DATA_DIR_ENV_VAR`] is set, uses that directory.
/// - For dev builds, uses the workspace directory.
/// - For official release builds in portable mode (the default on Windows &
///   Linux), uses the directory of the current executable.
/// - For official release builds in nonportable mode (the default on macOS),
///   uses the system directories.
///
/// If the preferred behavior (portable vs. nonportable) fails, then this
/// function falls back on the other.
fn app_paths() -> Option<AppPaths> {
    if let Some(dir) = env::var_os(DATA_DIR_ENV_VAR) {
        log::info!("Using paths from {DATA_DIR_ENV_VAR}");
        return Some(AppPaths::in_dir(PathBuf::from(dir)));
    }
    match is_nonportable() {
        true => nonportable_paths().or_else(portable_paths),
        false => portable_paths().or_else(nonportable_paths),
    }
}

fn nonportable_paths() -> Option<AppPaths> {
    match ProjectDirs::from("", "", "Kitshop") {
        Some(dirs) => {
            log::info!("Using nonportable paths");
            Some(AppPaths {
                prefs_file: dirs
                    .config_dir()
                    .join(format!("{PREFS_FILE_NAME}.{PREFS_FILE_EXTENSION}")),
                storage_dir: dirs.data_dir().join(STORAGE_DIR_NAME),
            })
        }
        None => {
            log::error!("Error getting nonportable directories");
            None
        }
    }
}

fn portable_paths() -> Option<AppPaths> {
    match portable_dir() {
        Some(dir) => {
            log::info!("Using portable paths");
            Some(AppPaths::in_dir(dir))
        }
        None => {
            log::error!("Error getting portable directory");
            None
        }
    }
}

fn portable_dir() -> Option<PathBuf> {
    if crate::IS_OFFICIAL_BUILD {
        // `/kitshop.exe`
        let exe_path = env::current_exe().ok()?.canonicalize().ok()?;
        Some(exe_path.parent()?.to_path_buf())
    } else {
        // `/crates/kitpaths/` -> `/`
        Some(
            PathBuf::from_str(env!("CARGO_MANIFEST_DIR"))
                .ok()?
                .parent()?
                .parent()?
                .to_path_buf(),
        )
    }
}

fn is_nonportable() -> bool {
    if crate::IS_OFFICIAL_BUILD && cfg!(target_os = "macos") {
        // macOS app packages can't store files next to the executable.
        true
    } else if let Some(mut p) = portable_dir() {
        // Otherwise, check whether the `nonportable` file exists in the same
        // directory as the executable.
        p.push("nonportable");
        p.exists()
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_path_keeps_stem_and_extension() {
        let now = time::Date::from_calendar_date(2024, time::Month::March, 5)
            .unwrap()
            .with_hms(7, 8, 9)
            .unwrap()
            .assume_utc();
        let path = backup_path(Path::new("/data/storage/cart-storage.json"), now);
        assert_eq!(
            path,
            PathBuf::from("/data/storage/cart-storage_2024-03-05_07-08-09_bak.json"),
        );
    }

    #[test]
    fn test_paths_in_data_dir() {
        let paths = AppPaths::in_dir(PathBuf::from("/data"));
        assert_eq!(paths.prefs_file, PathBuf::from("/data/kitshop-prefs.yaml"));
        assert_eq!(paths.storage_dir, PathBuf::from("/data/storage"));
    }

    #[test]
    fn test_storage_file_sanitizes_key() {
        let dir = Path::new("/data");
        assert_eq!(
            storage_file_in(dir, "cart-storage"),
            PathBuf::from("/data/cart-storage.json"),
        );
        assert_eq!(
            storage_file_in(dir, "../evil key"),
            PathBuf::from("/data/___evil_key.json"),
        );
    }

    #[test]
    fn test_move_to_backup_file() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join("prefs.yaml");
        std::fs::write(&original, "x: 1").unwrap();
        move_to_backup_file(&original);
        assert!(!original.exists());
        let backups = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(backups, 1);
    }
}
