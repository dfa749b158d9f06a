use crate::config::Config;
use crate::pipe::Pipe;
use crate::rect::Rect;

/// Distance reported to the controller when no pipe pair is ahead. Also the
/// starting minimum for nearest-pair scanning, so pipes further ahead than
/// this are never selected.
pub const SENSOR_SENTINEL: f32 = 1000.0;

#[derive(Clone, Debug)]
pub struct Bird {
    pub rect: Rect,
    pub fitness: f32,
    pub alive: bool,
}

impl Bird {
    /// Fresh bird at the window center with zero fitness.
    pub fn new(config: &Config) -> Self {
        Self {
            rect: Rect::centered(
                config.window.width as f32 / 2.0,
                config.window.height as f32 / 2.0,
                config.physics.bird_width,
                config.physics.bird_height,
            ),
            fitness: 0.0,
            alive: true,
        }
    }

    pub fn apply_gravity(&mut self, gravity: f32) {
        self.rect.y += gravity;
    }

    pub fn jump(&mut self, impulse: f32) {
        self.rect.y -= impulse;
    }

    /// True iff the bird overlaps any pipe, or its vertical midpoint has
    /// reached the floor line or left through the top edge. Pure.
    pub fn collides_with(&self, pipes: &[Pipe], floor_y: f32) -> bool {
        if pipes.iter().any(|p| self.rect.overlaps(&p.rect)) {
            return true;
        }
        self.rect.center_y() >= floor_y || self.rect.center_y() < 0.0
    }

    /// Closest still-unpassed pair, as (top, bottom). Distance is measured
    /// from the pipe's trailing edge to the bird's leading edge; pipes behind
    /// the bird are skipped. A strictly smaller distance claims the bottom
    /// slot; only an exactly equal distance promotes a pipe into the top
    /// slot. Pairs spawn at identical x, which is what makes the equality
    /// match its partner; do not loosen it.
    pub fn nearest_pipe_pair<'a>(&self, pipes: &'a [Pipe]) -> (Option<&'a Pipe>, Option<&'a Pipe>) {
        let mut top = None;
        let mut bottom = None;
        let mut min_distance = SENSOR_SENTINEL;
        for pipe in pipes {
            let distance = pipe.rect.right() - self.rect.left();
            if distance < 0.0 {
                continue;
            }
            if distance < min_distance {
                min_distance = distance;
                bottom = Some(pipe);
            } else if distance == min_distance {
                top = Some(pipe);
            }
        }
        (top, bottom)
    }

    /// The fixed-size controller input: horizontal distance to the pair's
    /// trailing edge, clearance to the top pipe's lower lip, clearance to the
    /// bottom pipe's upper lip.
    pub fn sense_distances(&self, top: &Pipe, bottom: &Pipe) -> [f32; 3] {
        [
            top.rect.right() - self.rect.left(),
            self.rect.top() - top.rect.bottom(),
            bottom.rect.top() - self.rect.bottom(),
        ]
    }
}
