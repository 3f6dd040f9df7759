//! User preferences.

#![allow(missing_docs)] // field names are self-explanatory

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate strum;

mod animation;
pub mod persist;
mod schema;
mod store;
mod viewport;

pub use animation::*;
pub use store::*;
pub use viewport::*;

const PREFS_FILE_FORMAT: config::FileFormat = config::FileFormat::Yaml;
const DEFAULT_PREFS_STR: &str = include_str!("default.yaml");

lazy_static! {
    static ref DEFAULT_PREFS_RAW: schema::current::Preferences =
        serde_norway::from_str(DEFAULT_PREFS_STR).expect("error loading default preferences");
    pub static ref DEFAULT_PREFS: Preferences = Preferences::from_serde(DEFAULT_PREFS_RAW.clone());
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Preferences {
    pub needs_save: bool,

    pub animation: AnimationPreferences,
    pub viewport: ViewportPreferences,
    pub store: StorePreferences,
}
impl Preferences {
    fn to_serde(&self) -> schema::current::Preferences {
        let Self {
            needs_save: _,
            animation,
            viewport,
            store,
        } = self;

        schema::current::Preferences {
            animation: animation.clone(),
            viewport: viewport.clone(),
            store: store.clone(),
        }
    }
    fn from_serde(value: schema::current::Preferences) -> Self {
        let schema::current::Preferences {
            animation,
            viewport,
            store,
        } = value;

        Self {
            needs_save: false,
            animation,
            viewport,
            store,
        }
    }

    /// Loads preferences from the user's preferences file layered on top of
    /// the defaults. If loading fails, then the existing preferences file is
    /// backed up (if possible) and `backup` (or else the default preferences)
    /// is returned.
    pub fn load(backup: Option<Self>) -> Self {
        match persist::PrefsFile::user() {
            Ok(file) => Self::load_from_file(&file, backup),
            Err(e) => {
                log::warn!("Error locating user preferences: {e}");
                backup.unwrap_or_else(|| DEFAULT_PREFS.clone())
            }
        }
    }

    /// Loads preferences from `file` layered on top of the defaults. A missing
    /// file yields the defaults. If the file cannot be loaded, then it is
    /// backed up and `backup` (or else the default preferences) is returned.
    pub fn load_from_file(file: &persist::PrefsFile, backup: Option<Self>) -> Self {
        Self::load_from_sources(Some(file.config_source())).unwrap_or_else(|e| {
            log::warn!("Error loading preferences from {}: {e}", file.path().display());
            file.backup();
            backup.unwrap_or_else(|| DEFAULT_PREFS.clone())
        })
    }

    /// Loads preferences from a YAML string layered on top of the defaults.
    pub fn load_from_str(yaml: &str) -> eyre::Result<Self> {
        Self::load_from_sources(Some(config::File::from_str(yaml, PREFS_FILE_FORMAT)))
    }

    fn load_from_sources(
        user_source: Option<impl config::Source + Send + Sync + 'static>,
    ) -> eyre::Result<Self> {
        lazy_static::initialize(&DEFAULT_PREFS);

        let mut config = config::Config::builder()
            .set_default("version", schema::CURRENT_VERSION)?
            .add_source(config::File::from_str(DEFAULT_PREFS_STR, PREFS_FILE_FORMAT));
        if let Some(source) = user_source {
            config = config.add_source(source);
        }

        let value = config
            .build()?
            .try_deserialize::<schema::AnyVersion>()?
            .into_current();
        Ok(Self::from_serde(value))
    }

    /// Saves the preferences to `file`, tagged with the current schema
    /// version.
    pub fn save_to(&mut self, file: &persist::PrefsFile) -> eyre::Result<()> {
        file.write(&schema::AnyVersion::V1(Box::new(self.to_serde())))?;
        self.needs_save = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use kitstore::Currency;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_prefs_match_rust_defaults() {
        let defaults = &*DEFAULT_PREFS;
        assert_eq!(defaults.animation, AnimationPreferences::default());
        assert_eq!(defaults.viewport, ViewportPreferences::default());
        assert_eq!(defaults.store.currency, Currency::Usd);
    }

    #[test]
    fn test_user_prefs_override_defaults() {
        let yaml = "animation:\n  piece_entry_duration: 1.5\nstore:\n  currency: eur\n";
        let prefs = Preferences::load_from_str(yaml).unwrap();
        assert_eq!(prefs.animation.piece_entry_duration, 1.5);
        // unspecified fields keep their defaults
        assert_eq!(
            prefs.animation.piece_entry_interpolation,
            InterpolateFn::EaseOutCubic,
        );
        assert_eq!(prefs.viewport.mobile_breakpoint, 768.0);
        assert_eq!(prefs.store.currency, Currency::Eur);
    }

    #[test]
    fn test_unknown_version_is_rejected() {
        Preferences::load_from_str("version: v99").expect_err("unknown schema version");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let file = persist::PrefsFile::new(dir.path().join("kitshop-prefs.yaml"));

        let mut prefs = Preferences::load_from_file(&file, None);
        assert_eq!(prefs, *DEFAULT_PREFS);

        prefs.store.currency = Currency::Gbp;
        prefs.animation.piece_entry_interpolation = InterpolateFn::Bounce;
        prefs.needs_save = true;
        prefs.save_to(&file).unwrap();
        assert!(!prefs.needs_save);

        let yaml = std::fs::read_to_string(file.path()).unwrap();
        assert!(yaml.starts_with("version: v1\n"), "{yaml}");
        assert!(yaml.contains("currency: gbp"), "{yaml}");
        assert_eq!(Preferences::load_from_file(&file, None), prefs);
    }

    #[test]
    fn test_corrupt_prefs_file_is_backed_up() {
        let dir = tempfile::tempdir().unwrap();
        let file = persist::PrefsFile::new(dir.path().join("kitshop-prefs.yaml"));
        std::fs::write(file.path(), "version: v99\n").unwrap();

        let fallback = Preferences {
            store: StorePreferences {
                currency: Currency::Eur,
            },
            ..Default::default()
        };
        let prefs = Preferences::load_from_file(&file, Some(fallback.clone()));
        assert_eq!(prefs, fallback);
        assert!(!file.path().exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_device_class() {
        let viewport = ViewportPreferences::default();
        assert_eq!(viewport.device_class(375.0), DeviceClass::Mobile);
        assert_eq!(viewport.device_class(768.0), DeviceClass::Desktop);
        assert_eq!(viewport.device_class(1920.0), DeviceClass::Desktop);
    }
}
