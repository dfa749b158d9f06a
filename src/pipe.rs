use crate::config::Config;
use crate::rect::Rect;

/// Which way the pipe points into the playfield: `Upward` grows from the
/// bottom edge, `Downward` hangs from the top edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    Upward,
    Downward,
}

#[derive(Clone, Debug)]
pub struct Pipe {
    pub rect: Rect,
    pub orientation: Orientation,
}

impl Pipe {
    /// A pipe of the given body height at the spawn column. Upward pipes span
    /// `[window_h - height, window_h]`, downward pipes span `[0, height]`.
    pub fn new(height: f32, orientation: Orientation, config: &Config) -> Self {
        let w = config.pipes.width;
        let x = config.pipes.spawn_x - w / 2.0;
        let rect = match orientation {
            Orientation::Upward => {
                Rect::new(x, config.window.height as f32 - height, w, height)
            }
            Orientation::Downward => Rect::new(x, 0.0, w, height),
        };
        Self { rect, orientation }
    }

    pub fn advance(&mut self, speed: f32) {
        self.rect.x -= speed;
    }

    /// True once the trailing edge has scrolled past the left boundary.
    pub fn is_offscreen(&self) -> bool {
        self.rect.right() < 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_geometry_leaves_exact_gap() {
        let config = Config::default();
        let bottom = Pipe::new(300.0, Orientation::Upward, &config);
        let top = Pipe::new(
            config.window.height as f32 - 300.0 - config.pipes.gap,
            Orientation::Downward,
            &config,
        );
        assert_eq!(bottom.rect.top(), 450.0);
        assert_eq!(top.rect.top(), 0.0);
        assert_eq!(top.rect.bottom(), 250.0);
        assert_eq!(bottom.rect.top() - top.rect.bottom(), config.pipes.gap);
        assert_eq!(bottom.rect.center_x(), top.rect.center_x());
    }

    #[test]
    fn advances_left_and_retires_past_edge() {
        let config = Config::default();
        let mut pipe = Pipe::new(200.0, Orientation::Upward, &config);
        let start = pipe.rect.x;
        pipe.advance(config.pipes.speed);
        assert_eq!(pipe.rect.x, start - 5.0);
        assert!(!pipe.is_offscreen());
        pipe.rect.x = -pipe.rect.w - 1.0;
        assert!(pipe.is_offscreen());
    }
}
