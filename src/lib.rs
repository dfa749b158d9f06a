//! Flappy Bird agents trained by NEAT-style neuro-evolution. The library is
//! fully headless; the binary adds a pixels/winit front end on top.

pub mod bird;
pub mod config;
pub mod draw;
pub mod neat;
pub mod pipe;
pub mod rect;
pub mod trainer;
pub mod world;

pub use bird::Bird;
pub use config::Config;
pub use pipe::{Orientation, Pipe};
pub use rect::Rect;
pub use trainer::Trainer;
pub use world::{Controller, TickOutcome, World};
