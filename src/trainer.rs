use crate::config::Config;
use crate::neat::{Network, Population};
use crate::world::{Controller, TickOutcome, World};
use rand::Rng;

/// Sensor vector width fed to every controller.
pub const SENSOR_COUNT: usize = 3;
/// Raw action scores a controller produces: jump and glide.
pub const ACTION_COUNT: usize = 2;

impl Controller for Network {
    fn evaluate(&self, senses: [f32; 3]) -> Vec<f32> {
        self.activate(&senses)
    }
}

/// Drives one generation at a time: builds a world and a phenotype per
/// genome, steps the simulation, mirrors bird fitness back onto the
/// genomes, and evolves when the last bird dies.
pub struct Trainer {
    pub config: Config,
    pub population: Population,
    pub world: World,
    controllers: Vec<Box<dyn Controller>>,
    pub best_fitness: f32,
    /// Best fitness per finished generation, for the on-screen chart.
    pub history: Vec<f32>,
}

impl Trainer {
    pub fn new<R: Rng>(config: Config, rng: &mut R) -> Self {
        let population = Population::new(
            config.evolution.population_size,
            SENSOR_COUNT,
            ACTION_COUNT,
            config.evolution.neat.clone(),
            rng,
        );
        let mut trainer = Self {
            world: World::new(0, &config),
            controllers: Vec::new(),
            population,
            config,
            best_fitness: 0.0,
            history: Vec::new(),
        };
        trainer.begin_generation();
        trainer
    }

    /// 1-based generation counter for display and the run cap.
    pub fn generation(&self) -> u32 {
        self.population.generation + 1
    }

    /// Fresh world and one phenotype per genome, paired by index.
    fn begin_generation(&mut self) {
        self.population.reset_fitness();
        self.controllers = self
            .population
            .genomes
            .iter()
            .map(|genome| {
                Box::new(Network::from_genome(genome, SENSOR_COUNT, ACTION_COUNT))
                    as Box<dyn Controller>
            })
            .collect();
        self.world = World::new(self.population.genomes.len(), &self.config);
    }

    /// One simulation tick. Genome fitness tracks bird fitness every tick so
    /// that `evolve` always sees the final scores, even for birds that died
    /// mid-generation.
    pub fn tick<R: Rng>(&mut self, rng: &mut R) -> TickOutcome {
        let outcome = self.world.tick(&self.controllers, rng, &self.config);
        for (genome, bird) in self.population.genomes.iter_mut().zip(&self.world.birds) {
            genome.fitness = bird.fitness;
        }
        if let TickOutcome::Running { max_fitness, .. } = outcome {
            self.best_fitness = self.best_fitness.max(max_fitness);
        }
        outcome
    }

    pub fn alive(&self) -> usize {
        self.world.birds.iter().filter(|b| b.alive).count()
    }

    /// Highest fitness reached so far within the current generation.
    pub fn max_fitness(&self) -> f32 {
        self.world
            .birds
            .iter()
            .map(|b| b.fitness)
            .fold(0.0, f32::max)
    }

    /// True once the run cap or the fitness threshold is reached.
    pub fn finished(&self) -> bool {
        self.generation() > self.config.evolution.generation_cap
            || self.best_fitness >= self.config.evolution.fitness_threshold
    }

    /// Close out the finished generation and breed the next one.
    pub fn next_generation<R: Rng>(&mut self, rng: &mut R) {
        let generation_best = self.population.best().fitness;
        self.history.push(generation_best);
        self.best_fitness = self.best_fitness.max(generation_best);
        self.population.evolve(rng);
        self.begin_generation();
    }
}
