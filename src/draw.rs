//! Software rendering onto the pixels framebuffer: alpha-blended rects, a
//! 5x7 bitmap font, a fitness history chart, and the playfield scene.

use crate::config::Config;
use crate::trainer::Trainer;

pub type Color = (u8, u8, u8, u8);

pub const HUD_TEXT: Color = (230, 240, 255, 255);
const SKY_TOP: Color = (96, 170, 230, 255);
const SKY_BOTTOM: Color = (150, 205, 245, 255);
const GROUND: Color = (200, 170, 100, 255);
const PIPE_BODY: Color = (60, 170, 70, 255);
const PIPE_EDGE: Color = (30, 110, 40, 200);
const BIRD_BODY: Color = (250, 210, 60, 80);
const BIRD_EDGE: Color = (160, 120, 20, 120);
const CHART_BAR: Color = (120, 180, 255, 160);
const CHART_FRAME: Color = (200, 200, 200, 120);

/// A borrowed RGBA frame with its dimensions; all drawing clips to it.
pub struct Canvas<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
}

impl<'a> Canvas<'a> {
    pub fn new(frame: &'a mut [u8], width: u32, height: u32) -> Self {
        Self {
            frame,
            width,
            height,
        }
    }

    pub fn clear(&mut self, (r, g, b, a): Color) {
        for px in self.frame.chunks_exact_mut(4) {
            px[0] = r;
            px[1] = g;
            px[2] = b;
            px[3] = a;
        }
    }

    pub fn blend_pixel(&mut self, x: u32, y: u32, (r, g, b, a): Color) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = ((y * self.width + x) * 4) as usize;
        if idx + 3 >= self.frame.len() {
            return;
        }
        let ar = a as u16;
        let iar = (255 - a) as u16;
        let dr = self.frame[idx] as u16;
        let dg = self.frame[idx + 1] as u16;
        let db = self.frame[idx + 2] as u16;
        self.frame[idx] = (((r as u16) * ar + dr * iar) / 255) as u8;
        self.frame[idx + 1] = (((g as u16) * ar + dg * iar) / 255) as u8;
        self.frame[idx + 2] = (((b as u16) * ar + db * iar) / 255) as u8;
        self.frame[idx + 3] = 255;
    }

    pub fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, col: Color) {
        let x2 = (x + w).min(self.width);
        let y2 = (y + h).min(self.height);
        for py in y..y2 {
            for px in x..x2 {
                self.blend_pixel(px, py, col);
            }
        }
    }

    pub fn stroke_rect(&mut self, x: u32, y: u32, w: u32, h: u32, col: Color) {
        if w == 0 || h == 0 {
            return;
        }
        let x2 = (x + w - 1).min(self.width - 1);
        let y2 = (y + h - 1).min(self.height - 1);
        for px in x..=x2 {
            self.blend_pixel(px, y, col);
            self.blend_pixel(px, y2, col);
        }
        for py in y..=y2 {
            self.blend_pixel(x, py, col);
            self.blend_pixel(x2, py, col);
        }
    }

    pub fn draw_char(&mut self, ch: char, x: u32, y: u32, scale: u32, col: Color) -> u32 {
        if let Some(rows) = glyph_5x7(ch) {
            for (ry, row) in rows.iter().enumerate() {
                for rx in 0..5 {
                    if (row >> (4 - rx)) & 1 == 1 {
                        for sy in 0..scale {
                            for sx in 0..scale {
                                self.blend_pixel(
                                    x + rx as u32 * scale + sx,
                                    y + ry as u32 * scale + sy,
                                    col,
                                );
                            }
                        }
                    }
                }
            }
        }
        5 * scale + scale
    }

    pub fn draw_text(&mut self, text: &str, x: u32, y: u32, scale: u32, col: Color) {
        let mut cx = x;
        for ch in text.chars() {
            cx += self.draw_char(ch, cx, y, scale, col);
        }
    }

    /// Bar chart of the most recent history values, autoscaled to the max.
    pub fn draw_chart(&mut self, x: u32, y: u32, w: u32, h: u32, data: &[f32]) {
        self.stroke_rect(x, y, w, h, CHART_FRAME);
        if data.is_empty() {
            return;
        }
        let max_val = data.iter().fold(0.0f32, |m, &v| m.max(v));
        if max_val <= 0.0 {
            return;
        }
        let bars = data.len().min(w as usize / 6);
        let bar_w = (w / bars as u32).max(2);
        for i in 0..bars {
            let v = data[data.len() - bars + i];
            let bh = ((v / max_val) * (h - 2) as f32) as u32;
            let bx = x + 1 + i as u32 * bar_w;
            let by = y + h - 1 - bh;
            self.fill_rect(bx, by, bar_w.saturating_sub(1), bh, CHART_BAR);
        }
    }
}

/// Full scene for one frame: backdrop, pipes, every live bird, then the HUD.
pub fn draw_scene(canvas: &mut Canvas, trainer: &Trainer, config: &Config) {
    let width = config.window.width;
    let height = config.window.height;
    let floor = config.physics.floor_y as u32;

    // Sky gradient down to the floor line, ground below it.
    for y in 0..floor.min(height) {
        let t = y as f32 / floor as f32;
        let lerp = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t) as u8;
        let col = (
            lerp(SKY_TOP.0, SKY_BOTTOM.0),
            lerp(SKY_TOP.1, SKY_BOTTOM.1),
            lerp(SKY_TOP.2, SKY_BOTTOM.2),
            255,
        );
        canvas.fill_rect(0, y, width, 1, col);
    }
    canvas.fill_rect(0, floor, width, height.saturating_sub(floor), GROUND);

    for pipe in &trainer.world.pipes {
        let (x, y) = clip_to_screen(pipe.rect.x, pipe.rect.y);
        let w = pipe.rect.w as u32;
        let h = pipe.rect.h as u32;
        canvas.fill_rect(x, y, w, h, PIPE_BODY);
        canvas.stroke_rect(x, y, w, h, PIPE_EDGE);
    }

    // Translucent birds so overlapping population members stay readable.
    for bird in trainer.world.birds.iter().filter(|b| b.alive) {
        let (x, y) = clip_to_screen(bird.rect.x, bird.rect.y);
        let w = bird.rect.w as u32;
        let h = bird.rect.h as u32;
        canvas.fill_rect(x, y, w, h, BIRD_BODY);
        canvas.stroke_rect(x, y, w, h, BIRD_EDGE);
    }

    draw_hud(canvas, trainer, config);
}

fn draw_hud(canvas: &mut Canvas, trainer: &Trainer, config: &Config) {
    let alive = trainer.alive();
    let total = trainer.world.birds.len();
    canvas.draw_text(&format!("GEN {}", trainer.generation()), 8, 8, 2, HUD_TEXT);
    canvas.draw_text(&format!("ALIVE {}/{}", alive, total), 8, 26, 2, HUD_TEXT);
    canvas.draw_text(
        &format!("SCORE {:.1}", trainer.max_fitness()),
        8,
        44,
        2,
        HUD_TEXT,
    );
    canvas.draw_text(
        &format!("BEST {:.1}", trainer.best_fitness),
        8,
        62,
        2,
        HUD_TEXT,
    );
    if !trainer.history.is_empty() {
        let chart_w = 160;
        canvas.draw_chart(
            config.window.width.saturating_sub(chart_w + 8),
            8,
            chart_w,
            48,
            &trainer.history,
        );
    }
}

fn clip_to_screen(x: f32, y: f32) -> (u32, u32) {
    (x.max(0.0) as u32, y.max(0.0) as u32)
}

fn glyph_5x7(ch: char) -> Option<[u8; 7]> {
    let c = ch.to_ascii_uppercase();
    Some(match c {
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'B' => [0b11110, 0b10001, 0b11110, 0b10001, 0b10001, 0b10001, 0b11110],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11100, 0b10010, 0b10001, 0b10001, 0b10001, 0b10010, 0b11100],
        'E' => [0b11111, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000, 0b11111],
        'F' => [0b11111, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000, 0b10000],
        'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01110],
        'H' => [0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001, 0b10001],
        'I' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b11111],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'N' => [0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'V' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        'X' => [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001],
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11110, 0b00001, 0b00001, 0b01110, 0b00001, 0b00001, 0b11110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        ':' => [0b00000, 0b00100, 0b00000, 0b00000, 0b00100, 0b00000, 0b00000],
        '+' => [0b00000, 0b00100, 0b00100, 0b11111, 0b00100, 0b00100, 0b00000],
        '-' => [0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000],
        '/' => [0b00001, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b10000],
        '.' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b01100],
        ' ' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000],
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blending_clips_outside_the_frame() {
        let mut frame = vec![0u8; 4 * 4 * 4];
        let mut canvas = Canvas::new(&mut frame, 4, 4);
        canvas.blend_pixel(10, 10, (255, 255, 255, 255));
        assert!(frame.iter().all(|&b| b == 0));
    }

    #[test]
    fn opaque_fill_overwrites_pixels() {
        let mut frame = vec![0u8; 4 * 4 * 4];
        let mut canvas = Canvas::new(&mut frame, 4, 4);
        canvas.fill_rect(1, 1, 2, 2, (200, 100, 50, 255));
        let idx = (1 * 4 + 1) * 4;
        assert_eq!(&frame[idx..idx + 4], &[200, 100, 50, 255]);
        assert_eq!(&frame[0..4], &[0, 0, 0, 0]);
    }

    #[test]
    fn glyphs_cover_the_hud_charset() {
        for ch in "GENALIVSCORBTPUD0123456789/.:+- X".chars() {
            assert!(glyph_5x7(ch).is_some(), "missing glyph for {ch:?}");
        }
        assert!(glyph_5x7('?').is_none());
    }
}
