use crate::walk::DEFAULT_MAX_DEPTH;
use config::{Config, File, FileFormat};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

const SECTION: &str = "Settings";
const EMAIL_MAX_AGE_DAYS: &str = "EmailMaxAgeDays";
const DELETE_OLD_EMAILS: &str = "deleteOldEmails";
const RETENTION_MAX_AGE_DAYS: &str = "RetentionMaxAgeDays";
const MAX_FOLDER_DEPTH: &str = "MaxFolderDepth";

/// The only value of `deleteOldEmails` which enables the sweep.
const ENABLED: &str = "True";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error("missing [Settings] section")]
    MissingSection,

    #[error("missing {0} setting")]
    Missing(&'static str),

    #[error("invalid {key} setting {value:?}: expected a positive whole number")]
    Invalid { key: &'static str, value: String },
}

/// Settings of a run, read once from `settings.ini`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Messages sent longer ago than this are not exported.
    pub email_max_age_days: u32,
    /// Whether old exported files get deleted.
    pub delete_old_emails: bool,
    /// Exported files older than this are deleted. Defaults to
    /// `email_max_age_days`.
    pub retention_max_age_days: u32,
    pub max_folder_depth: usize,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let config = Config::builder()
            .add_source(File::from(path).format(FileFormat::Ini))
            .build()?;
        Self::from_config(config)
    }

    pub fn parse(ini: &str) -> Result<Self, SettingsError> {
        let config = Config::builder()
            .add_source(File::from_str(ini, FileFormat::Ini))
            .build()?;
        Self::from_config(config)
    }

    fn from_config(config: Config) -> Result<Self, SettingsError> {
        let sections: HashMap<String, HashMap<String, String>> = config.try_deserialize()?;
        let section = sections
            .into_iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(SECTION))
            .map(|(_, section)| section)
            .ok_or(SettingsError::MissingSection)?;
        let get = |key: &'static str| {
            section
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(key))
                .map(|(_, value)| value.trim())
        };
        let positive = |key: &'static str, value: &str| {
            value
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| SettingsError::Invalid {
                    key,
                    value: value.to_string(),
                })
        };

        let email_max_age_days = get(EMAIL_MAX_AGE_DAYS)
            .ok_or(SettingsError::Missing(EMAIL_MAX_AGE_DAYS))
            .and_then(|value| positive(EMAIL_MAX_AGE_DAYS, value))?;
        let delete_old_emails = get(DELETE_OLD_EMAILS)
            .ok_or(SettingsError::Missing(DELETE_OLD_EMAILS))?
            == ENABLED;
        let retention_max_age_days = match get(RETENTION_MAX_AGE_DAYS) {
            Some(value) => positive(RETENTION_MAX_AGE_DAYS, value)?,
            None => email_max_age_days,
        };
        let max_folder_depth = match get(MAX_FOLDER_DEPTH) {
            Some(value) => positive(MAX_FOLDER_DEPTH, value)? as usize,
            None => DEFAULT_MAX_DEPTH,
        };

        Ok(Settings {
            email_max_age_days,
            delete_old_emails,
            retention_max_age_days,
            max_folder_depth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let settings = Settings::parse("[Settings]\nEmailMaxAgeDays = 30\ndeleteOldEmails = True\n").unwrap();
        assert_eq!(
            settings,
            Settings {
                email_max_age_days: 30,
                delete_old_emails: true,
                retention_max_age_days: 30,
                max_folder_depth: 4,
            }
        );
    }

    #[test]
    fn test_parse_optional_keys() {
        let settings = Settings::parse(
            "[Settings]\nEmailMaxAgeDays=30\ndeleteOldEmails=False\nRetentionMaxAgeDays=365\nMaxFolderDepth=6\n",
        )
        .unwrap();
        assert!(!settings.delete_old_emails);
        assert_eq!(settings.retention_max_age_days, 365);
        assert_eq!(settings.max_folder_depth, 6);
    }

    #[test]
    fn test_delete_flag_needs_exact_value() {
        for value in ["true", "TRUE", "yes", "1", ""].iter() {
            let ini = format!("[Settings]\nEmailMaxAgeDays=5\ndeleteOldEmails={}\n", value);
            assert!(!Settings::parse(&ini).unwrap().delete_old_emails, "{:?}", value);
        }
    }

    #[test]
    fn test_invalid() {
        assert!(matches!(
            Settings::parse("[Other]\nEmailMaxAgeDays=5\n"),
            Err(SettingsError::MissingSection)
        ));
        assert!(matches!(
            Settings::parse("[Settings]\ndeleteOldEmails=True\n"),
            Err(SettingsError::Missing(EMAIL_MAX_AGE_DAYS))
        ));
        assert!(matches!(
            Settings::parse("[Settings]\nEmailMaxAgeDays=5\n"),
            Err(SettingsError::Missing(DELETE_OLD_EMAILS))
        ));
        for value in ["five", "-5", "0", "2.5"].iter() {
            let ini = format!("[Settings]\nEmailMaxAgeDays={}\ndeleteOldEmails=True\n", value);
            assert!(
                matches!(Settings::parse(&ini), Err(SettingsError::Invalid { .. })),
                "{:?}",
                value
            );
        }
    }

    #[test]
    fn test_load_missing_file() {
        let path = Path::new("/nonexistent/settings.ini");
        assert!(matches!(Settings::load(path), Err(SettingsError::Config(_))));
    }
}
