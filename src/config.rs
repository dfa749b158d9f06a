use crate::neat::NeatConfig;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Run configuration. Defaults reproduce the classic tuning; a `config.json`
/// next to the binary overrides it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub physics: PhysicsConfig,
    pub pipes: PipeConfig,
    pub evolution: EvolutionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    /// Simulation ticks (and rendered frames) per second.
    pub tick_rate: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Downward displacement per tick.
    pub gravity: f32,
    /// Instantaneous upward displacement when the controller flaps.
    pub jump_impulse: f32,
    /// A bird whose vertical midpoint reaches this line is dead.
    pub floor_y: f32,
    pub bird_width: f32,
    pub bird_height: f32,
    /// Fitness gained per tick survived.
    pub reward_per_tick: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipeConfig {
    /// Horizontal center of a freshly spawned pair.
    pub spawn_x: f32,
    pub width: f32,
    /// Leftward displacement per tick.
    pub speed: f32,
    /// Bottom-pipe heights a new pair is drawn from.
    pub heights: Vec<f32>,
    /// Vertical opening between the pair.
    pub gap: f32,
    /// Ticks between spawns (48 at 60 ticks/s = 800 ms).
    pub spawn_interval: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub population_size: usize,
    pub generation_cap: u32,
    /// Training stops once the best fitness passes this.
    pub fitness_threshold: f32,
    pub neat: NeatConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            physics: PhysicsConfig::default(),
            pipes: PipeConfig::default(),
            evolution: EvolutionConfig::default(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 500,
            height: 750,
            tick_rate: 60,
        }
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 5.0,
            jump_impulse: 60.0,
            floor_y: 640.0,
            bird_width: 45.0,
            bird_height: 32.0,
            reward_per_tick: 0.1,
        }
    }
}

impl Default for PipeConfig {
    fn default() -> Self {
        Self {
            spawn_x: 700.0,
            width: 100.0,
            speed: 5.0,
            heights: vec![150.0, 200.0, 250.0, 300.0, 350.0],
            gap: 200.0,
            spawn_interval: 48,
        }
    }
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            generation_cap: 500,
            fitness_threshold: 1000.0,
            neat: NeatConfig::default(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {:?}", path))?;
        let config: Config =
            serde_json::from_str(&raw).with_context(|| format!("parsing config {:?}", path))?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), raw)
            .with_context(|| format!("writing config {:?}", path.as_ref()))?;
        Ok(())
    }
}
