//! World generation options
//!
//! Tunables for name validation, depth scaling and interior extents. Read
//! from JSON or from an rc-style file:
//!
//! ```text
//! # comments start with a hash
//! OPTIONS=max_name_len:40,max_treasure_chests=2
//! BOUNDS=tower:-1,1,-1,1,0,6
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::OptionsError;
use crate::world::{Category, SubGridBounds, get_subgrid_bounds};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldOptions {
    pub min_name_len: usize,
    pub max_name_len: usize,
    pub max_treasure_chests: usize,
    pub tower_treasure_chance: u32,
    pub lock_difficulty_base: u32,
    pub lock_difficulty_step: u32,
    pub lock_difficulty_cap: u32,
    pub secret_threshold_base: u32,
    pub secret_threshold_step: u32,
    /// Interior extents keyed by lowercase category name.
    pub bounds_overrides: BTreeMap<String, SubGridBounds>,
}

impl Default for WorldOptions {
    fn default() -> Self {
        Self {
            min_name_len: MIN_NAME_LEN,
            max_name_len: MAX_NAME_LEN,
            max_treasure_chests: MAX_TREASURE_CHESTS,
            tower_treasure_chance: TOWER_TREASURE_CHANCE,
            lock_difficulty_base: LOCK_DIFFICULTY_BASE,
            lock_difficulty_step: LOCK_DIFFICULTY_STEP,
            lock_difficulty_cap: LOCK_DIFFICULTY_CAP,
            secret_threshold_base: SECRET_THRESHOLD_BASE,
            secret_threshold_step: SECRET_THRESHOLD_STEP,
            bounds_overrides: BTreeMap::new(),
        }
    }
}

impl WorldOptions {
    /// Load options from a file. `.json` files are read as JSON, anything
    /// else as rc-style lines.
    pub fn load_from_file(path: &Path) -> Result<Self, OptionsError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| OptionsError::Io(e.to_string()))?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json(&contents)
        } else {
            Self::parse_config(&contents)
        }
    }

    pub fn from_json(contents: &str) -> Result<Self, OptionsError> {
        serde_json::from_str(contents)
            .map_err(|e| OptionsError::InvalidValue("json".to_string(), e.to_string()))
    }

    /// Parse rc-style options. Unrecognised line prefixes are ignored.
    pub fn parse_config(contents: &str) -> Result<Self, OptionsError> {
        let mut options = Self::default();

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(opts) = line.strip_prefix("OPTIONS=") {
                for opt in opts.split(',') {
                    options.parse_option(opt.trim())?;
                }
            } else if let Some(entry) = line.strip_prefix("BOUNDS=") {
                options.parse_bounds(entry)?;
            }
        }

        Ok(options)
    }

    fn parse_option(&mut self, opt: &str) -> Result<(), OptionsError> {
        if opt.is_empty() {
            return Ok(());
        }
        let (name, value) = match opt.split_once(':').or_else(|| opt.split_once('=')) {
            Some((name, value)) => (name.trim(), Some(value.trim())),
            None => (opt, None),
        };
        self.set_option(name, value)
    }

    fn set_option(&mut self, name: &str, value: Option<&str>) -> Result<(), OptionsError> {
        let value = value
            .filter(|v| !v.is_empty())
            .ok_or_else(|| OptionsError::MissingValue(name.to_string()))?;

        match name {
            "min_name_len" => self.min_name_len = parse_number(name, value)?,
            "max_name_len" => self.max_name_len = parse_number(name, value)?,
            "max_treasure_chests" | "max_chests" => {
                self.max_treasure_chests = parse_number(name, value)?
            }
            "tower_treasure_chance" => {
                let chance: u32 = parse_number(name, value)?;
                if chance > 100 {
                    return Err(OptionsError::InvalidValue(
                        name.to_string(),
                        value.to_string(),
                    ));
                }
                self.tower_treasure_chance = chance;
            }
            "lock_difficulty_base" => self.lock_difficulty_base = parse_number(name, value)?,
            "lock_difficulty_step" => self.lock_difficulty_step = parse_number(name, value)?,
            "lock_difficulty_cap" => self.lock_difficulty_cap = parse_number(name, value)?,
            "secret_threshold_base" => self.secret_threshold_base = parse_number(name, value)?,
            "secret_threshold_step" => self.secret_threshold_step = parse_number(name, value)?,
            _ => return Err(OptionsError::UnknownOption(name.to_string())),
        }
        if self.min_name_len > self.max_name_len {
            return Err(OptionsError::InvalidValue(
                name.to_string(),
                value.to_string(),
            ));
        }
        Ok(())
    }

    /// `category:min_x,max_x,min_y,max_y[,min_z,max_z]`
    fn parse_bounds(&mut self, entry: &str) -> Result<(), OptionsError> {
        let (category, values) = entry
            .split_once(':')
            .ok_or_else(|| OptionsError::MissingValue(entry.trim().to_string()))?;
        let category = Category::parse(category);
        let invalid = || OptionsError::InvalidValue(category.to_string(), values.to_string());

        let raw = values
            .split(',')
            .map(|v| v.trim().parse::<i32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| invalid())?;
        let bounds = SubGridBounds::try_from(raw).map_err(|_| invalid())?;
        self.bounds_overrides.insert(category.to_string(), bounds);
        Ok(())
    }

    /// Interior extents for `category`: an override if one is configured,
    /// else the built-in table.
    pub fn subgrid_bounds(&self, category: &Category) -> SubGridBounds {
        self.bounds_overrides
            .get(category.as_str())
            .copied()
            .unwrap_or_else(|| get_subgrid_bounds(category))
    }

    /// Convert options to rc-style text that `parse_config` reads back.
    pub fn to_config_string(&self) -> String {
        let mut lines = vec![
            "# delve world options".to_string(),
            format!(
                "OPTIONS=min_name_len:{},max_name_len:{}",
                self.min_name_len, self.max_name_len
            ),
            format!(
                "OPTIONS=max_treasure_chests:{},tower_treasure_chance:{}",
                self.max_treasure_chests, self.tower_treasure_chance
            ),
            format!(
                "OPTIONS=lock_difficulty_base:{},lock_difficulty_step:{},lock_difficulty_cap:{}",
                self.lock_difficulty_base, self.lock_difficulty_step, self.lock_difficulty_cap
            ),
            format!(
                "OPTIONS=secret_threshold_base:{},secret_threshold_step:{}",
                self.secret_threshold_base, self.secret_threshold_step
            ),
        ];
        for (category, bounds) in &self.bounds_overrides {
            let values: Vec<String> = bounds.as_array().iter().map(i32::to_string).collect();
            lines.push(format!("BOUNDS={}:{}", category, values.join(",")));
        }
        lines.join("\n")
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, OptionsError> {
    value
        .parse()
        .map_err(|_| OptionsError::InvalidValue(name.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = WorldOptions::default();
        assert_eq!(opts.min_name_len, 2);
        assert_eq!(opts.max_name_len, 50);
        assert_eq!(opts.max_treasure_chests, 3);
        assert_eq!(opts.tower_treasure_chance, 30);
    }

    #[test]
    fn test_parse_value_options() {
        let config = "# tuned\nOPTIONS=max_name_len:40, max_chests=2\n\nOPTIONS=lock_difficulty_cap:20";
        let opts = WorldOptions::parse_config(config).unwrap();
        assert_eq!(opts.max_name_len, 40);
        assert_eq!(opts.max_treasure_chests, 2);
        assert_eq!(opts.lock_difficulty_cap, 20);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            WorldOptions::parse_config("OPTIONS=colour:1"),
            Err(OptionsError::UnknownOption("colour".to_string()))
        );
        assert!(matches!(
            WorldOptions::parse_config("OPTIONS=max_name_len:lots"),
            Err(OptionsError::InvalidValue(..))
        ));
        assert!(matches!(
            WorldOptions::parse_config("OPTIONS=max_name_len"),
            Err(OptionsError::MissingValue(_))
        ));
        assert!(matches!(
            WorldOptions::parse_config("OPTIONS=tower_treasure_chance:150"),
            Err(OptionsError::InvalidValue(..))
        ));
        assert!(matches!(
            WorldOptions::parse_config("OPTIONS=min_name_len:60"),
            Err(OptionsError::InvalidValue(..))
        ));
    }

    #[test]
    fn test_bounds_override() {
        let config = "BOUNDS=Tower:-1,1,-1,1,0,6\nBOUNDS=hamlet:-1,1,-1,1";
        let opts = WorldOptions::parse_config(config).unwrap();
        assert_eq!(opts.subgrid_bounds(&Category::Tower).max_z, 6);
        assert_eq!(
            opts.subgrid_bounds(&Category::parse("hamlet")),
            SubGridBounds::flat(-1, 1, -1, 1)
        );
        assert_eq!(
            opts.subgrid_bounds(&Category::Dungeon),
            get_subgrid_bounds(&Category::Dungeon)
        );
        assert!(WorldOptions::parse_config("BOUNDS=tower:1,0,0,0").is_err());
        assert!(WorldOptions::parse_config("BOUNDS=tower:1,2,3").is_err());
    }

    #[test]
    fn test_config_string_reads_back() {
        let mut opts = WorldOptions::default();
        opts.secret_threshold_step = 3;
        opts.bounds_overrides
            .insert("cave".to_string(), SubGridBounds::new(-5, 5, -5, 5, -3, 0));
        let parsed = WorldOptions::parse_config(&opts.to_config_string()).unwrap();
        assert_eq!(parsed, opts);
    }

    #[test]
    fn test_json_partial() {
        let opts = WorldOptions::from_json(r#"{"max_treasure_chests": 5}"#).unwrap();
        assert_eq!(opts.max_treasure_chests, 5);
        assert_eq!(opts.max_name_len, 50);
        assert!(WorldOptions::from_json("{").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let rc = dir.path().join("delverc");
        std::fs::write(&rc, "OPTIONS=max_chests:1").unwrap();
        assert_eq!(WorldOptions::load_from_file(&rc).unwrap().max_treasure_chests, 1);

        let json = dir.path().join("options.json");
        std::fs::write(&json, r#"{"lock_difficulty_step": 4}"#).unwrap();
        assert_eq!(WorldOptions::load_from_file(&json).unwrap().lock_difficulty_step, 4);

        assert!(matches!(
            WorldOptions::load_from_file(&dir.path().join("missing")),
            Err(OptionsError::Io(_))
        ));
    }
}
