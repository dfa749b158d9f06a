//! Headless end-to-end runs of the public API: the training loop is driven
//! exactly as the binary drives it, minus the window.

use flappy_neat::world::{Controller, TickOutcome};
use flappy_neat::{Config, Trainer, World};
use rand::rngs::SmallRng;
use rand::SeedableRng;

struct Glide;

impl Controller for Glide {
    fn evaluate(&self, _senses: [f32; 3]) -> Vec<f32> {
        vec![0.0, 1.0]
    }
}

/// Flaps whenever the bottom clearance drops below a margin; enough to clear
/// the first few pipes and exercise the jump path.
struct Hover;

impl Controller for Hover {
    fn evaluate(&self, senses: [f32; 3]) -> Vec<f32> {
        if senses[2] < 80.0 {
            vec![1.0, 0.0]
        } else {
            vec![0.0, 1.0]
        }
    }
}

#[test]
fn gliding_population_falls_to_the_floor_together() {
    let config = Config::default();
    let mut rng = SmallRng::seed_from_u64(1);
    let mut world = World::new(5, &config);
    let controllers: Vec<Box<dyn Controller>> =
        (0..5).map(|_| Box::new(Glide) as Box<dyn Controller>).collect();

    let start_y = world.birds[0].rect.center_y();
    let expected = ((config.physics.floor_y - start_y) / config.physics.gravity).ceil() as u32;
    let mut ticks = 0;
    while world.tick(&controllers, &mut rng, &config) != TickOutcome::AllDead {
        ticks += 1;
        assert!(ticks <= expected, "outlived the free-fall bound");
    }
    // Identical controllers and shared pipes: everyone dies on the same tick.
    assert_eq!(ticks + 1, expected);
    assert!(world.birds.iter().all(|b| !b.alive));
}

#[test]
fn hovering_bird_outlives_the_first_pipe_pair() {
    let config = Config::default();
    let mut rng = SmallRng::seed_from_u64(2);
    let mut world = World::new(2, &config);
    let controllers: Vec<Box<dyn Controller>> =
        vec![Box::new(Hover), Box::new(Glide)];

    let glide_limit = ((config.physics.floor_y - world.birds[0].rect.center_y())
        / config.physics.gravity)
        .ceil() as u32;
    for _ in 0..glide_limit + 10 {
        if world.tick(&controllers, &mut rng, &config) == TickOutcome::AllDead {
            break;
        }
    }
    assert!(!world.birds[1].alive, "glider should be down");
    assert!(
        world.birds[0].fitness > world.birds[1].fitness,
        "hovering must outscore gliding"
    );
}

#[test]
fn training_runs_several_generations_headless() {
    let mut config = Config::default();
    config.evolution.population_size = 15;
    config.evolution.generation_cap = 4;
    let mut rng = SmallRng::seed_from_u64(3);
    let mut trainer = Trainer::new(config, &mut rng);

    while !trainer.finished() {
        let mut guard = 0u32;
        while trainer.tick(&mut rng) != TickOutcome::AllDead {
            guard += 1;
            assert!(guard < 2_000_000, "generation did not terminate");
        }
        trainer.next_generation(&mut rng);
    }

    assert_eq!(trainer.history.len(), 4);
    assert_eq!(trainer.population.genomes.len(), 15);
    // Survival reward means every generation records a positive best.
    assert!(trainer.history.iter().all(|&best| best > 0.0));
}

#[test]
fn config_overrides_flow_into_the_simulation() {
    let mut config = Config::default();
    config.evolution.population_size = 7;
    config.physics.gravity = 10.0;
    let mut rng = SmallRng::seed_from_u64(4);
    let mut trainer = Trainer::new(config.clone(), &mut rng);

    assert_eq!(trainer.world.birds.len(), 7);
    let before = trainer.world.birds[0].rect.y;
    trainer.tick(&mut rng);
    let after = trainer.world.birds[0].rect.y;
    // Heavier gravity moves every non-flapping bird down 10 per tick; a
    // flapping bird ends up higher instead.
    assert!((after - before - config.physics.gravity).abs() < 1e-6
        || before - after > 0.0);
}
