use crate::bird::{Bird, SENSOR_SENTINEL};
use crate::config::Config;
use crate::pipe::{Orientation, Pipe};
use rand::seq::SliceRandom;
use rand::Rng;

/// A controller maps the 3-element sensor vector to raw action scores. The
/// simulation never sees a concrete network type, only this capability.
pub trait Controller {
    fn evaluate(&self, senses: [f32; 3]) -> Vec<f32>;
}

/// Output index a controller must maximize to flap.
pub const ACTION_JUMP: usize = 0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TickOutcome {
    Running { alive: usize, max_fitness: f32 },
    AllDead,
}

/// One generation's playfield: the shared pipe stream plus one bird per
/// controller, paired by index.
pub struct World {
    pub pipes: Vec<Pipe>,
    pub birds: Vec<Bird>,
    spawn_countdown: u32,
}

impl World {
    pub fn new(population: usize, config: &Config) -> Self {
        Self {
            pipes: Vec::new(),
            birds: (0..population).map(|_| Bird::new(config)).collect(),
            spawn_countdown: config.pipes.spawn_interval,
        }
    }

    /// Push one upward/downward pair at the spawn column. The bottom height
    /// is drawn from the configured presets; the top pipe fills the rest of
    /// the window minus the gap. Both share the same x, which the nearest-
    /// pair tie-break depends on.
    pub fn spawn_pair<R: Rng>(&mut self, rng: &mut R, config: &Config) {
        let bottom_height = config
            .pipes
            .heights
            .choose(rng)
            .copied()
            .unwrap_or((config.window.height as f32 - config.pipes.gap) / 2.0);
        let top_height = config.window.height as f32 - bottom_height - config.pipes.gap;
        self.pipes
            .push(Pipe::new(bottom_height, Orientation::Upward, config));
        self.pipes
            .push(Pipe::new(top_height, Orientation::Downward, config));
    }

    /// One simulation tick. Dead birds are skipped entirely; the outcome is
    /// `AllDead` exactly when no bird remains alive, at which point the
    /// caller must stop without rendering.
    pub fn tick<R: Rng>(
        &mut self,
        controllers: &[Box<dyn Controller>],
        rng: &mut R,
        config: &Config,
    ) -> TickOutcome {
        debug_assert_eq!(self.birds.len(), controllers.len());

        // Recurring spawn timer, polled once per tick.
        self.spawn_countdown = self.spawn_countdown.saturating_sub(1);
        if self.spawn_countdown == 0 {
            self.spawn_pair(rng, config);
            self.spawn_countdown = config.pipes.spawn_interval;
        }

        for pipe in &mut self.pipes {
            pipe.advance(config.pipes.speed);
        }
        self.pipes.retain(|p| !p.is_offscreen());

        let mut alive = 0;
        let mut max_fitness: f32 = 0.0;
        for (bird, controller) in self.birds.iter_mut().zip(controllers) {
            if !bird.alive {
                continue;
            }
            bird.apply_gravity(config.physics.gravity);
            bird.fitness += config.physics.reward_per_tick;
            max_fitness = max_fitness.max(bird.fitness);
            if bird.collides_with(&self.pipes, config.physics.floor_y) {
                bird.alive = false;
            } else {
                alive += 1;
            }
            let (top, bottom) = bird.nearest_pipe_pair(&self.pipes);
            let senses = match (top, bottom) {
                (Some(top), Some(bottom)) => bird.sense_distances(top, bottom),
                _ => [SENSOR_SENTINEL; 3],
            };
            let outputs = controller.evaluate(senses);
            if argmax_first(&outputs) == ACTION_JUMP {
                bird.jump(config.physics.jump_impulse);
            }
        }

        if alive == 0 {
            TickOutcome::AllDead
        } else {
            TickOutcome::Running { alive, max_fitness }
        }
    }
}

/// Index of the strictly largest value; the first index wins exact ties.
pub fn argmax_first(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Fixed-score controller for driving the step loop in tests.
    struct Scripted(Vec<f32>);

    impl Controller for Scripted {
        fn evaluate(&self, _senses: [f32; 3]) -> Vec<f32> {
            self.0.clone()
        }
    }

    /// Glides while logging every sense vector it is handed.
    struct Recorder(Rc<RefCell<Vec<[f32; 3]>>>);

    impl Controller for Recorder {
        fn evaluate(&self, senses: [f32; 3]) -> Vec<f32> {
            self.0.borrow_mut().push(senses);
            vec![0.0, 1.0]
        }
    }

    fn never_jump() -> Box<dyn Controller> {
        Box::new(Scripted(vec![0.0, 1.0]))
    }

    fn no_spawn_config() -> Config {
        let mut config = Config::default();
        // Countdown never reaches zero within any test horizon.
        config.pipes.spawn_interval = u32::MAX;
        config
    }

    #[test]
    fn argmax_first_index_wins_ties() {
        assert_eq!(argmax_first(&[0.5, 0.5]), 0);
        assert_eq!(argmax_first(&[0.1, 0.9]), 1);
        assert_eq!(argmax_first(&[0.9, 0.1]), 0);
        assert_eq!(argmax_first(&[0.2]), 0);
    }

    #[test]
    fn free_fall_dies_after_expected_ticks() {
        let config = no_spawn_config();
        let mut rng = SmallRng::seed_from_u64(7);
        let mut world = World::new(1, &config);
        let controllers = vec![never_jump()];
        let start_y = world.birds[0].rect.center_y();
        let expected =
            ((config.physics.floor_y - start_y) / config.physics.gravity).ceil() as u32;

        let mut ticks = 0;
        loop {
            ticks += 1;
            let outcome = world.tick(&controllers, &mut rng, &config);
            if outcome == TickOutcome::AllDead {
                break;
            }
            assert!(ticks < 10_000, "bird never hit the floor");
        }
        assert_eq!(ticks, expected);
        assert!(world.pipes.is_empty());
    }

    #[test]
    fn fitness_accrues_per_tick_then_freezes() {
        let config = no_spawn_config();
        let mut rng = SmallRng::seed_from_u64(7);
        let mut world = World::new(1, &config);
        let controllers = vec![never_jump()];

        world.tick(&controllers, &mut rng, &config);
        let after_one = world.birds[0].fitness;
        assert!((after_one - config.physics.reward_per_tick).abs() < 1e-6);

        world.tick(&controllers, &mut rng, &config);
        let after_two = world.birds[0].fitness;
        assert!((after_two - 2.0 * config.physics.reward_per_tick).abs() < 1e-6);

        // Run the bird into the floor, then confirm the score stays put.
        while world.tick(&controllers, &mut rng, &config) != TickOutcome::AllDead {}
        let frozen = world.birds[0].fitness;
        world.birds.push(Bird::new(&config));
        let controllers = vec![never_jump(), never_jump()];
        world.tick(&controllers, &mut rng, &config);
        assert_eq!(world.birds[0].fitness, frozen);
    }

    #[test]
    fn generation_ends_only_when_every_bird_is_dead() {
        let config = no_spawn_config();
        let mut rng = SmallRng::seed_from_u64(7);
        let mut world = World::new(2, &config);
        world.birds[0].alive = false;
        let controllers = vec![never_jump(), never_jump()];
        match world.tick(&controllers, &mut rng, &config) {
            TickOutcome::Running { alive, .. } => assert_eq!(alive, 1),
            TickOutcome::AllDead => panic!("generation ended with a live bird"),
        }
        world.birds[1].alive = false;
        assert_eq!(
            world.tick(&controllers, &mut rng, &config),
            TickOutcome::AllDead
        );
    }

    #[test]
    fn sentinel_senses_reach_the_controller_without_a_pair_ahead() {
        let config = no_spawn_config();
        let mut rng = SmallRng::seed_from_u64(7);
        let mut world = World::new(1, &config);
        let log = Rc::new(RefCell::new(Vec::new()));
        let controllers: Vec<Box<dyn Controller>> =
            vec![Box::new(Recorder(Rc::clone(&log)))];

        // No pipes at all.
        world.tick(&controllers, &mut rng, &config);
        assert_eq!(log.borrow().as_slice(), &[[SENSOR_SENTINEL; 3]]);

        // A pipe already passed (right edge behind the bird, still on screen).
        let mut behind = Pipe::new(250.0, Orientation::Upward, &config);
        behind.rect.x = world.birds[0].rect.left() - behind.rect.w - 10.0;
        world.pipes.push(behind);
        world.tick(&controllers, &mut rng, &config);
        assert_eq!(log.borrow().len(), 2);
        assert_eq!(log.borrow()[1], [1000.0; 3]);
    }

    #[test]
    fn empty_height_presets_fall_back_to_a_centered_pair() {
        let mut config = Config::default();
        config.pipes.heights.clear();
        let mut rng = SmallRng::seed_from_u64(7);
        let mut world = World::new(1, &config);
        world.spawn_pair(&mut rng, &config);
        assert_eq!(world.pipes.len(), 2);
        let gap = world.pipes[0].rect.top() - world.pipes[1].rect.bottom();
        assert_eq!(gap, config.pipes.gap);
    }

    #[test]
    fn spawned_pair_is_returned_complete() {
        let mut config = Config::default();
        config.pipes.spawn_interval = 1;
        let mut rng = SmallRng::seed_from_u64(7);
        let mut world = World::new(1, &config);
        world.spawn_pair(&mut rng, &config);
        assert_eq!(world.pipes.len(), 2);
        assert_eq!(world.pipes[0].rect.x, world.pipes[1].rect.x);

        let mut probe = Bird::new(&config);
        probe.rect.x = 0.0;
        let (top, bottom) = probe.nearest_pipe_pair(&world.pipes);
        assert!(top.is_some(), "pair came back incomplete");
        assert!(bottom.is_some());
        assert_eq!(bottom.unwrap().orientation, Orientation::Upward);
        assert_eq!(top.unwrap().orientation, Orientation::Downward);
    }

    #[test]
    fn timer_spawns_pairs_and_retires_offscreen_pipes() {
        let mut config = Config::default();
        config.pipes.spawn_interval = 10;
        let mut rng = SmallRng::seed_from_u64(7);
        let mut world = World::new(1, &config);
        let controllers = vec![Box::new(Scripted(vec![1.0, 0.0])) as Box<dyn Controller>];

        for _ in 0..10 {
            world.tick(&controllers, &mut rng, &config);
        }
        assert_eq!(world.pipes.len(), 2);
        for _ in 0..10 {
            world.tick(&controllers, &mut rng, &config);
        }
        assert_eq!(world.pipes.len(), 4);

        // March everything off the left edge.
        let ticks_to_exit = ((config.pipes.spawn_x + config.pipes.width)
            / config.pipes.speed) as u32
            + 1;
        config.pipes.spawn_interval = u32::MAX;
        for _ in 0..ticks_to_exit {
            world.tick(&controllers, &mut rng, &config);
        }
        assert!(world.pipes.is_empty());
    }
}
