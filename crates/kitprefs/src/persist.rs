//! Reading and writing the preferences file.

use std::path::{Path, PathBuf};

use eyre::{Result, WrapErr};
use serde::Serialize;

/// Location of a YAML preferences file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefsFile {
    path: PathBuf,
}
impl PrefsFile {
    /// Constructs a handle to the preferences file at `path`. The file does
    /// not need to exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
    /// Returns the user's preferences file.
    pub fn user() -> Result<Self> {
        Ok(Self::new(kitpaths::prefs_file()?))
    }

    /// Returns the path to the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns a config source that reads the file, or nothing if it is
    /// missing.
    pub(crate) fn config_source(&self) -> impl config::Source + Send + Sync + 'static {
        config::File::new(&self.path.to_string_lossy(), crate::PREFS_FILE_FORMAT).required(false)
    }

    /// Writes `data` as YAML.
    ///
    /// The data is written to a sibling file first and then moved into place,
    /// so an interrupted write never leaves a truncated preferences file.
    pub fn write(&self, data: &impl Serialize) -> Result<()> {
        let yaml = serde_norway::to_string(data).wrap_err("error serializing preferences")?;
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)
                .wrap_err_with(|| format!("error creating {}", dir.display()))?;
        }
        let tmp_path = self.path.with_extension("yaml.tmp");
        std::fs::write(&tmp_path, yaml)
            .wrap_err_with(|| format!("error writing {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, &self.path)
            .wrap_err_with(|| format!("error replacing {}", self.path.display()))?;
        log::info!("saved preferences to {}", self.path.display());
        Ok(())
    }

    /// Moves the file aside so that it is not overwritten by the defaults.
    pub fn backup(&self) {
        kitpaths::move_to_backup_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let file = PrefsFile::new(dir.path().join("nested").join("prefs.yaml"));
        let data = std::collections::BTreeMap::from([("version", "v1")]);
        file.write(&data).unwrap();
        assert_eq!(std::fs::read_to_string(file.path()).unwrap(), "version: v1\n");
        // no temporary file is left behind
        assert_eq!(std::fs::read_dir(file.path().parent().unwrap()).unwrap().count(), 1);
    }
}
