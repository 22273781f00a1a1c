//! Run configuration (TOML).
//!
//! Loaded once at process start and passed explicitly to whoever needs it.
//! Every field has a default so a partial file only overrides what it names.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::mapping::NameMapper;
use crate::time::{Day, SlotWindow, FIRST_HOUR, LAST_HOUR};
use crate::ConfigError;

/// Static configuration of a run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Only rows whose building equals this value (exactly) are kept
    pub target_building: String,
    /// Days to display, in column order
    pub days: Vec<Day>,
    /// First displayed hour (inclusive)
    pub first_hour: u8,
    /// End of the last displayed hour (exclusive)
    pub last_hour: u8,
    /// Merge per-hour rows of the same class into one session
    pub coalesce_sessions: bool,
    /// Room name in the report → lab name in the output
    pub labs: NameMapper,
    /// Entries layered on top of `labs` when the file is loaded, so a file
    /// can add rooms without restating the default table
    #[serde(skip_serializing_if = "NameMapper::is_empty")]
    pub extra_labs: NameMapper,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_building: "TECHNE".into(),
            days: Day::ALL.to_vec(),
            first_hour: FIRST_HOUR,
            last_hour: LAST_HOUR,
            coalesce_sessions: true,
            labs: NameMapper::from_pairs([
                ("LABORATORIO GEIO CAP(25)", "GEIO (321) TECHNE"),
                (
                    "SALA DE SOFTWARE DE TECNOLOGIA E INGENIERIA DE PRODUCCION A CAP(17)",
                    "Sala de Software A - 16 EST - 416- TECHNE",
                ),
                (
                    "SALA DE SOFTWARE DE TECNOLOGIA E NGENIERIA DE PRODUCCION B CAP(25)",
                    "Sala de Software B - 24 EST - 417 TECHNE",
                ),
                ("LABORATORIO HAS CAP(22)", "HAS-200 (317) TECHNE"),
                ("LABORATORIO FMS CAP(18)", "FMS-200 (320) TECHNE"),
                (
                    "LABORATORIO DE PROCESOS DE TRANSFORMACIÓN MECÁNICA",
                    "LABORATORIO DE PROCESOS DE TRANSFORMACIÓN BLOQUE 1-102",
                ),
            ]),
            extra_labs: NameMapper::new(),
        }
    }
}

impl Config {
    /// Read and validate a TOML configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate TOML text.
    ///
    /// `extra_labs` is merged into `labs` here; the returned config always
    /// has an empty `extra_labs`.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(input)?;
        let extra = std::mem::take(&mut config.extra_labs);
        config.labs.extend(extra);
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check invariants the rest of the pipeline relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_building.trim().is_empty() {
            return Err(ConfigError::Invalid("target_building must not be empty".into()));
        }

        if self.days.is_empty() {
            return Err(ConfigError::Invalid("days must list at least one day".into()));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.days.iter().find(|d| !seen.insert(**d)) {
            return Err(ConfigError::Invalid(format!("day {dup} is listed twice")));
        }

        if self.window().is_none() {
            return Err(ConfigError::Invalid(format!(
                "hours must satisfy {FIRST_HOUR} <= first_hour < last_hour <= {LAST_HOUR} (got {}..{})",
                self.first_hour, self.last_hour
            )));
        }

        if let Some((raw, _)) = self
            .labs
            .iter()
            .find(|(raw, canonical)| raw.is_empty() || canonical.trim().is_empty())
        {
            return Err(ConfigError::Invalid(format!(
                "lab mapping entry {raw:?} has an empty name"
            )));
        }

        Ok(())
    }

    /// Displayed slot window, `None` if the hours are out of range
    pub fn window(&self) -> Option<SlotWindow> {
        SlotWindow::from_hours(self.first_hour, self.last_hour)
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.target_building, "TECHNE");
        assert_eq!(config.days.len(), 6);
        assert_eq!(config.labs.len(), 6);
        assert_eq!(config.window(), Some(SlotWindow::default()));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            target_building = "BLOQUE 1"
            days = ["monday", "wednesday"]

            [labs]
            "SALA 101" = "Sala 101"
            "#,
        )
        .unwrap();

        assert_eq!(config.target_building, "BLOQUE 1");
        assert_eq!(config.days, vec![Day::Monday, Day::Wednesday]);
        assert_eq!(config.first_hour, 6);
        assert!(config.coalesce_sessions);
        assert_eq!(config.labs.translate("SALA 101"), Some("Sala 101"));
        assert_eq!(config.labs.len(), 1);
    }

    #[test]
    fn extra_labs_extend_the_default_table() {
        let config = Config::from_toml_str(
            r#"
            [extra_labs]
            "SALA 101" = "Sala 101 TECHNE"
            "LABORATORIO GEIO CAP(25)" = "GEIO (321) BLOQUE NUEVO"
            "#,
        )
        .unwrap();

        assert_eq!(config.labs.len(), 7);
        assert_eq!(config.labs.translate("SALA 101"), Some("Sala 101 TECHNE"));
        assert_eq!(
            config.labs.translate("LABORATORIO GEIO CAP(25)"),
            Some("GEIO (321) BLOQUE NUEVO")
        );
        assert_eq!(config.labs.translate("LABORATORIO FMS CAP(18)"), Some("FMS-200 (320) TECHNE"));
        assert!(config.extra_labs.is_empty());
    }

    #[test]
    fn extra_labs_layer_over_a_replaced_table() {
        let config = Config::from_toml_str(
            r#"
            [labs]
            "SALA 101" = "Sala 101"

            [extra_labs]
            "SALA 102" = "Sala 102"
            "#,
        )
        .unwrap();
        assert_eq!(config.labs.canonical_names(), vec!["Sala 101", "Sala 102"]);
    }

    #[test]
    fn empty_extra_lab_name_is_rejected() {
        let err = Config::from_toml_str(
            r#"
            [extra_labs]
            "SALA 101" = " "
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn roundtrip_through_toml() {
        let config = Config::default();
        let text = config.to_toml_string().unwrap();
        assert_eq!(Config::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn rejects_bad_hours() {
        let err = Config::from_toml_str("first_hour = 10\nlast_hour = 8").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        let err = Config::from_toml_str("last_hour = 23").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_duplicate_days() {
        let err = Config::from_toml_str(r#"days = ["monday", "monday"]"#).unwrap_err();
        assert!(err.to_string().contains("listed twice"));
    }

    #[test]
    fn rejects_unknown_keys_and_days() {
        assert!(matches!(
            Config::from_toml_str("building = \"X\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            Config::from_toml_str(r#"days = ["sunday"]"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labsched.toml");
        std::fs::write(&path, "target_building = \"TECHNE\"\ncoalesce_sessions = false\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert!(!config.coalesce_sessions);

        let missing = Config::load(&dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}
