use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::*;
use crate::error::ConfigError;

/// Coherent noise family used by the mangler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NoiseKind {
    /// Lumpy value noise. Solid blobs at high frequency.
    #[default]
    Value,
    /// Smoother; wants a much higher frequency to look similar.
    Perlin,
    OpenSimplex,
    SuperSimplex,
    Simplex,
    Worley,
}

impl NoiseKind {
    /// Map a numeric noise code (as typed into a debug field) to a kind.
    /// Unknown codes resolve to code 0.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => NoiseKind::SuperSimplex,
            2 => NoiseKind::Worley,
            3 => NoiseKind::Perlin,
            4 | 5 => NoiseKind::Value,
            6 => NoiseKind::Simplex,
            _ => NoiseKind::OpenSimplex,
        }
    }

    fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "value" => NoiseKind::Value,
            "perlin" => NoiseKind::Perlin,
            "opensimplex" => NoiseKind::OpenSimplex,
            "supersimplex" => NoiseKind::SuperSimplex,
            "simplex" => NoiseKind::Simplex,
            "worley" => NoiseKind::Worley,
            _ => NoiseKind::from_code(trimmed.parse().unwrap_or(0)),
        }
    }
}

/// What sits above chunk 0 when the window is first filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SurfaceKind {
    /// Open sky: the top of chunk 0 is smoothed against air.
    #[default]
    Open,
    /// Solid cap: the top of chunk 0 is smoothed against rock.
    Closed,
}

/// Generation parameters shared by the mole, mangler, muncher and stream.
///
/// Passed by value into the stream and scheduler at construction and on every
/// reset. Every field has a default, so partial RON documents are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaveConfig {
    /// World seed. 0 derives a fresh seed from the clock on reset.
    pub seed: u64,
    pub chunk_width: usize,
    pub chunk_height: usize,
    /// Rows borrowed from the previous and next chunk while smoothing.
    pub chunk_pad: usize,
    pub air_threshold: f32,
    pub side_margin: usize,
    pub side_margin_fade: f32,
    pub mole_start_count: usize,
    pub max_moles: usize,
    pub mole_spawn_chance: f32,
    pub mole_merge_chance: f32,
    /// Non-positive disables carving entirely.
    pub mole_hole_width: i32,
    pub mole_hole_falloff: f32,
    pub mole_previous_dir_mult: f32,
    /// Normal-distributed direction samples when true, uniform in [-1, 1] otherwise.
    pub mole_use_normal_dist: bool,
    pub mole_normal_sigma: f32,
    pub mole_step_budget: u32,
    pub noise_kind: NoiseKind,
    pub noise_frequency: f64,
    pub noise_strength: f32,
    pub muncher_iterations: u32,
    pub muncher_air_neighbours: u32,
    pub muncher_rock_neighbours: u32,
    pub surface: SurfaceKind,
}

impl Default for CaveConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            chunk_width: DEFAULT_CHUNK_WIDTH,
            chunk_height: DEFAULT_CHUNK_HEIGHT,
            chunk_pad: DEFAULT_CHUNK_PAD,
            air_threshold: DEFAULT_AIR_THRESHOLD,
            side_margin: DEFAULT_SIDE_MARGIN,
            side_margin_fade: DEFAULT_SIDE_MARGIN_FADE,
            mole_start_count: DEFAULT_MOLE_START_COUNT,
            max_moles: DEFAULT_MAX_MOLES,
            mole_spawn_chance: DEFAULT_MOLE_SPAWN_CHANCE,
            mole_merge_chance: DEFAULT_MOLE_MERGE_CHANCE,
            mole_hole_width: DEFAULT_MOLE_HOLE_WIDTH,
            mole_hole_falloff: DEFAULT_MOLE_HOLE_FALLOFF,
            mole_previous_dir_mult: DEFAULT_MOLE_PREVIOUS_DIR_MULT,
            mole_use_normal_dist: true,
            mole_normal_sigma: DEFAULT_MOLE_NORMAL_SIGMA,
            mole_step_budget: DEFAULT_MOLE_STEP_BUDGET,
            noise_kind: NoiseKind::Value,
            noise_frequency: DEFAULT_NOISE_FREQUENCY,
            noise_strength: DEFAULT_NOISE_STRENGTH,
            muncher_iterations: DEFAULT_MUNCHER_ITERATIONS,
            muncher_air_neighbours: DEFAULT_MUNCHER_AIR_NEIGHBOURS,
            muncher_rock_neighbours: DEFAULT_MUNCHER_ROCK_NEIGHBOURS,
            surface: SurfaceKind::Open,
        }
    }
}

/// A value `sanitize` had to correct. Logged, never fatal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigIssue {
    #[error("{field} is 0, using default {fallback}")]
    ZeroDimension { field: &'static str, fallback: usize },

    #[error("chunk_pad {pad} exceeds chunk_height {height}, clamped")]
    PadExceedsHeight { pad: usize, height: usize },

    #[error("{field} {value} outside [0, 1], clamped to {clamped}")]
    ProbabilityOutOfRange {
        field: &'static str,
        value: f32,
        clamped: f32,
    },

    #[error("side_margin {margin} wider than half the chunk, clamped to {max}")]
    SideMarginTooWide { margin: usize, max: usize },

    #[error("{field} is not finite, using default {fallback}")]
    NonFinite { field: &'static str, fallback: f64 },

    #[error("{field} {value} is negative, clamped to 0")]
    Negative { field: &'static str, value: f64 },
}

impl CaveConfig {
    /// Rows in the padded smoothing window.
    pub fn padded_height(&self) -> usize {
        self.chunk_height + 2 * self.chunk_pad
    }

    /// Correct values that would break generation. Returns the corrected
    /// config and one issue per correction.
    pub fn sanitize(mut self) -> (Self, Vec<ConfigIssue>) {
        let mut issues = Vec::new();

        for (field, value, fallback) in [
            ("chunk_width", &mut self.chunk_width, DEFAULT_CHUNK_WIDTH),
            ("chunk_height", &mut self.chunk_height, DEFAULT_CHUNK_HEIGHT),
        ] {
            if *value == 0 {
                *value = fallback;
                issues.push(ConfigIssue::ZeroDimension { field, fallback });
            }
        }

        if self.chunk_pad > self.chunk_height {
            issues.push(ConfigIssue::PadExceedsHeight {
                pad: self.chunk_pad,
                height: self.chunk_height,
            });
            self.chunk_pad = self.chunk_height;
        }

        let max_margin = self.chunk_width / 2;
        if self.side_margin > max_margin {
            issues.push(ConfigIssue::SideMarginTooWide {
                margin: self.side_margin,
                max: max_margin,
            });
            self.side_margin = max_margin;
        }

        for (field, value) in [
            ("mole_spawn_chance", &mut self.mole_spawn_chance),
            ("mole_merge_chance", &mut self.mole_merge_chance),
        ] {
            let clamped = if value.is_finite() {
                value.clamp(0.0, 1.0)
            } else {
                0.0
            };
            if clamped != *value {
                issues.push(ConfigIssue::ProbabilityOutOfRange {
                    field,
                    value: *value,
                    clamped,
                });
                *value = clamped;
            }
        }

        for (field, value, fallback) in [
            ("air_threshold", &mut self.air_threshold, DEFAULT_AIR_THRESHOLD),
            (
                "side_margin_fade",
                &mut self.side_margin_fade,
                DEFAULT_SIDE_MARGIN_FADE,
            ),
            (
                "mole_hole_falloff",
                &mut self.mole_hole_falloff,
                DEFAULT_MOLE_HOLE_FALLOFF,
            ),
            (
                "mole_previous_dir_mult",
                &mut self.mole_previous_dir_mult,
                DEFAULT_MOLE_PREVIOUS_DIR_MULT,
            ),
            (
                "mole_normal_sigma",
                &mut self.mole_normal_sigma,
                DEFAULT_MOLE_NORMAL_SIGMA,
            ),
            ("noise_strength", &mut self.noise_strength, DEFAULT_NOISE_STRENGTH),
        ] {
            if !value.is_finite() {
                *value = fallback;
                issues.push(ConfigIssue::NonFinite {
                    field,
                    fallback: fallback as f64,
                });
            }
        }

        if !self.noise_frequency.is_finite() {
            self.noise_frequency = DEFAULT_NOISE_FREQUENCY;
            issues.push(ConfigIssue::NonFinite {
                field: "noise_frequency",
                fallback: DEFAULT_NOISE_FREQUENCY,
            });
        }

        if self.side_margin_fade < 0.0 {
            issues.push(ConfigIssue::Negative {
                field: "side_margin_fade",
                value: self.side_margin_fade as f64,
            });
            self.side_margin_fade = 0.0;
        }

        if self.mole_normal_sigma < 0.0 {
            issues.push(ConfigIssue::Negative {
                field: "mole_normal_sigma",
                value: self.mole_normal_sigma as f64,
            });
            self.mole_normal_sigma = 0.0;
        }

        for issue in &issues {
            log::warn!("Cave config: {issue}");
        }

        (self, issues)
    }

    /// Set one field from free text, the way the debug panel edits values.
    ///
    /// Unparseable numbers become 0 and unparseable booleans become false.
    /// Only an unknown key is an error.
    pub fn apply_override(&mut self, key: &str, text: &str) -> Result<(), ConfigError> {
        let text = text.trim();
        match key {
            "seed" => self.seed = parse_or_zero(text),
            "chunk_width" => self.chunk_width = parse_or_zero(text),
            "chunk_height" => self.chunk_height = parse_or_zero(text),
            "chunk_pad" => self.chunk_pad = parse_or_zero(text),
            "air_threshold" => self.air_threshold = parse_or_zero(text),
            "side_margin" => self.side_margin = parse_or_zero(text),
            "side_margin_fade" => self.side_margin_fade = parse_or_zero(text),
            "mole_start_count" => self.mole_start_count = parse_or_zero(text),
            "max_moles" => self.max_moles = parse_or_zero(text),
            "mole_spawn_chance" => self.mole_spawn_chance = parse_or_zero(text),
            "mole_merge_chance" => self.mole_merge_chance = parse_or_zero(text),
            "mole_hole_width" => self.mole_hole_width = parse_or_zero(text),
            "mole_hole_falloff" => self.mole_hole_falloff = parse_or_zero(text),
            "mole_previous_dir_mult" => self.mole_previous_dir_mult = parse_or_zero(text),
            "mole_use_normal_dist" => self.mole_use_normal_dist = parse_bool(text),
            "mole_normal_sigma" => self.mole_normal_sigma = parse_or_zero(text),
            "mole_step_budget" => self.mole_step_budget = parse_or_zero(text),
            "noise_kind" => self.noise_kind = NoiseKind::from_text(text),
            "noise_frequency" => self.noise_frequency = parse_or_zero(text),
            "noise_strength" => self.noise_strength = parse_or_zero(text),
            "muncher_iterations" => self.muncher_iterations = parse_or_zero(text),
            "muncher_air_neighbours" => self.muncher_air_neighbours = parse_or_zero(text),
            "muncher_rock_neighbours" => self.muncher_rock_neighbours = parse_or_zero(text),
            "surface" => {
                self.surface = if text.eq_ignore_ascii_case("closed") {
                    SurfaceKind::Closed
                } else {
                    SurfaceKind::Open
                }
            }
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        Ok(())
    }

    /// Apply a `key=value` pair, as passed on the command line.
    pub fn apply_assignment(&mut self, assignment: &str) -> Result<(), ConfigError> {
        let (key, value) = assignment.split_once('=').unwrap_or((assignment, ""));
        self.apply_override(key.trim(), value)
    }
}

fn parse_or_zero<T: std::str::FromStr + Default>(text: &str) -> T {
    text.parse().unwrap_or_default()
}

fn parse_bool(text: &str) -> bool {
    match text.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => true,
        _ => false,
    }
}

/// Parse a cave config from a RON string. Missing fields take defaults.
pub fn load_config_from_str(ron_str: &str) -> Result<CaveConfig, ConfigError> {
    let options = ron::Options::default();
    options
        .from_str(ron_str)
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Read and parse a cave config RON file.
pub fn load_config_file(path: &Path) -> Result<CaveConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_config_from_str(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_partial_config() {
        let ron = r#"(
            seed: 12345,
            mole_hole_width: 2,
            noise_kind: Perlin,
        )"#;
        let config = load_config_from_str(ron).expect("valid RON");
        assert_eq!(config.seed, 12345);
        assert_eq!(config.mole_hole_width, 2);
        assert_eq!(config.noise_kind, NoiseKind::Perlin);
        // Untouched fields keep their defaults
        assert_eq!(config.chunk_width, DEFAULT_CHUNK_WIDTH);
        assert_eq!(config.muncher_iterations, DEFAULT_MUNCHER_ITERATIONS);
    }

    #[test]
    fn test_load_bundled_default_config() {
        let ron = include_str!("../../../data/default_cave.ron");
        let config = load_config_from_str(ron).expect("bundled config parses");
        assert_eq!(config, CaveConfig::default());
    }

    #[test]
    fn test_load_invalid_ron() {
        let result = load_config_from_str("(seed: \"not a number\")");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config_file(Path::new("/nonexistent/cave.ron"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_override_malformed_number_is_zero() {
        let mut config = CaveConfig::default();
        config
            .apply_override("mole_spawn_chance", "lots")
            .expect("known key");
        assert_eq!(config.mole_spawn_chance, 0.0);
        config.apply_override("mole_hole_width", "-2").expect("known key");
        assert_eq!(config.mole_hole_width, -2);
        config.apply_override("chunk_pad", "-2").expect("known key");
        assert_eq!(config.chunk_pad, 0);
    }

    #[test]
    fn test_override_unknown_key() {
        let mut config = CaveConfig::default();
        let result = config.apply_override("mole_colour", "brown");
        assert!(matches!(result, Err(ConfigError::UnknownKey(k)) if k == "mole_colour"));
    }

    #[test]
    fn test_apply_assignment() {
        let mut config = CaveConfig::default();
        config.apply_assignment("seed=77").expect("known key");
        config.apply_assignment("surface = closed").expect("known key");
        config.apply_assignment("mole_use_normal_dist=false").expect("known key");
        assert_eq!(config.seed, 77);
        assert_eq!(config.surface, SurfaceKind::Closed);
        assert!(!config.mole_use_normal_dist);
    }

    #[test]
    fn test_noise_kind_codes() {
        assert_eq!(NoiseKind::from_code(5), NoiseKind::Value);
        assert_eq!(NoiseKind::from_code(3), NoiseKind::Perlin);
        assert_eq!(NoiseKind::from_code(99), NoiseKind::OpenSimplex);
        assert_eq!(NoiseKind::from_text("perlin"), NoiseKind::Perlin);
        assert_eq!(NoiseKind::from_text("5"), NoiseKind::Value);
        assert_eq!(NoiseKind::from_text("garbage"), NoiseKind::OpenSimplex);
    }

    #[test]
    fn test_sanitize_default_is_clean() {
        let (config, issues) = CaveConfig::default().sanitize();
        assert!(issues.is_empty(), "unexpected issues: {issues:?}");
        assert_eq!(config, CaveConfig::default());
    }

    #[test]
    fn test_sanitize_corrects_bad_values() {
        let config = CaveConfig {
            chunk_width: 0,
            chunk_pad: 100,
            side_margin: 40,
            mole_spawn_chance: 1.5,
            mole_merge_chance: -0.5,
            noise_frequency: f64::NAN,
            ..CaveConfig::default()
        };
        let (fixed, issues) = config.sanitize();
        assert_eq!(fixed.chunk_width, DEFAULT_CHUNK_WIDTH);
        assert_eq!(fixed.chunk_pad, fixed.chunk_height);
        assert_eq!(fixed.side_margin, DEFAULT_CHUNK_WIDTH / 2);
        assert_eq!(fixed.mole_spawn_chance, 1.0);
        assert_eq!(fixed.mole_merge_chance, 0.0);
        assert_eq!(fixed.noise_frequency, DEFAULT_NOISE_FREQUENCY);
        assert_eq!(issues.len(), 6);
    }

    #[test]
    fn test_sanitize_keeps_non_positive_hole_width() {
        let config = CaveConfig {
            mole_hole_width: 0,
            ..CaveConfig::default()
        };
        let (fixed, issues) = config.sanitize();
        assert_eq!(fixed.mole_hole_width, 0);
        assert!(issues.is_empty());
    }

    #[test]
    fn test_padded_height() {
        let config = CaveConfig::default();
        assert_eq!(
            config.padded_height(),
            DEFAULT_CHUNK_HEIGHT + 2 * DEFAULT_CHUNK_PAD
        );
    }
}
