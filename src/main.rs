use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Context;
use pixels::{Pixels, SurfaceTexture};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use winit::dpi::LogicalSize;
use winit::event::{Event, VirtualKeyCode};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;
use winit_input_helper::WinitInputHelper;

use flappy_neat::draw::{draw_scene, Canvas, HUD_TEXT};
use flappy_neat::world::TickOutcome;
use flappy_neat::{Config, Trainer};

const CONFIG_PATH: &str = "config.json";

fn load_config() -> anyhow::Result<Config> {
    if Path::new(CONFIG_PATH).exists() {
        let config = Config::from_file(CONFIG_PATH)?;
        log::info!("loaded config from {CONFIG_PATH}");
        Ok(config)
    } else {
        log::info!("no {CONFIG_PATH} found, using defaults");
        Ok(Config::default())
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = load_config()?;
    let width = config.window.width;
    let height = config.window.height;

    let event_loop = EventLoop::new();
    let mut input = WinitInputHelper::new();

    let window = WindowBuilder::new()
        .with_title("FLAPPY NEAT")
        .with_inner_size(LogicalSize::new(width, height))
        .with_resizable(false)
        .build(&event_loop)
        .context("creating window")?;

    let mut pixels = {
        let window_size = window.inner_size();
        let surface_texture = SurfaceTexture::new(window_size.width, window_size.height, &window);
        Pixels::new(width, height, surface_texture).context("creating framebuffer")?
    };

    let mut rng = SmallRng::from_entropy();
    let mut trainer = Trainer::new(config.clone(), &mut rng);
    log::info!(
        "training {} birds, cap {} generations",
        config.evolution.population_size,
        config.evolution.generation_cap
    );

    let tick_duration = Duration::from_secs(1) / config.window.tick_rate;
    let mut last_update = Instant::now();
    let mut paused = false;
    // Fast-forward: simulation ticks processed per rendered frame.
    let mut ticks_per_frame: u32 = 1;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        if let Event::RedrawRequested(_) = event {
            let mut canvas = Canvas::new(pixels.frame_mut(), width, height);
            draw_scene(&mut canvas, &trainer, &config);
            if paused {
                canvas.draw_text("PAUSED", 8, height - 24, 2, HUD_TEXT);
            }
            if ticks_per_frame > 1 {
                canvas.draw_text(
                    &format!("X{ticks_per_frame}"),
                    8,
                    height - 44,
                    2,
                    HUD_TEXT,
                );
            }
            if pixels.render().is_err() {
                *control_flow = ControlFlow::Exit;
            }
        }

        if input.update(&event) {
            if input.key_pressed(VirtualKeyCode::Escape)
                || input.close_requested()
                || input.destroyed()
            {
                *control_flow = ControlFlow::Exit;
                return;
            }
            if input.key_pressed(VirtualKeyCode::P) {
                paused = !paused;
            }
            if input.key_pressed(VirtualKeyCode::NumpadAdd)
                || input.key_pressed(VirtualKeyCode::Equals)
            {
                ticks_per_frame = ticks_per_frame.saturating_mul(2).min(1024);
            }
            if input.key_pressed(VirtualKeyCode::NumpadSubtract)
                || input.key_pressed(VirtualKeyCode::Minus)
            {
                ticks_per_frame = (ticks_per_frame / 2).max(1);
            }

            if !paused && last_update.elapsed() >= tick_duration {
                last_update = Instant::now();
                for _ in 0..ticks_per_frame {
                    if trainer.tick(&mut rng) == TickOutcome::AllDead {
                        log::info!(
                            "generation {} over: best {:.1}, {} species",
                            trainer.generation(),
                            trainer.population.best().fitness,
                            trainer.population.species_count().max(1)
                        );
                        trainer.next_generation(&mut rng);
                        if trainer.finished() {
                            log::info!(
                                "training finished: best fitness {:.1} after {} generations",
                                trainer.best_fitness,
                                trainer.history.len()
                            );
                            *control_flow = ControlFlow::Exit;
                            return;
                        }
                        break;
                    }
                }
            }

            window.request_redraw();
        }
    });
}
