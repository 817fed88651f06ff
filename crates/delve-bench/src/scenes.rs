use delve_core::config::{CaveConfig, NoiseKind};

/// Configuration for a single benchmark scene.
#[derive(Debug, Clone)]
pub struct SceneConfig {
    pub name: &'static str,
    pub config: CaveConfig,
}

/// The standard suite, all derived from `base` so command-line overrides
/// apply to every scene.
pub fn standard_scenes(base: &CaveConfig) -> Vec<SceneConfig> {
    vec![
        SceneConfig {
            name: "default",
            config: base.clone(),
        },
        // Uniform headings with strong persistence wander much more.
        SceneConfig {
            name: "snaky-uniform",
            config: CaveConfig {
                mole_use_normal_dist: false,
                mole_previous_dir_mult: 0.9,
                ..base.clone()
            },
        },
        SceneConfig {
            name: "perlin",
            config: CaveConfig {
                noise_kind: NoiseKind::Perlin,
                noise_frequency: 0.35,
                ..base.clone()
            },
        },
        // Narrow holes and extra smoothing passes; the most expensive scene.
        SceneConfig {
            name: "tight-tunnels",
            config: CaveConfig {
                mole_hole_width: 2,
                max_moles: 12,
                mole_spawn_chance: 0.03,
                muncher_iterations: 8,
                ..base.clone()
            },
        },
    ]
}
