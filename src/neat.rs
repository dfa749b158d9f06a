//! Minimal NEAT: genomes of innovation-numbered connection genes, structural
//! and weight mutation, innovation-aligned crossover, and speciation with
//! fitness sharing. Phenotypes are feed-forward networks evaluated in
//! topological order.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};

pub type Innovation = u32;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NeatConfig {
    /// Chance per gene of touching its weight at all.
    pub weight_mutate_rate: f32,
    /// Within a weight mutation: perturb (else replace outright).
    pub weight_perturb_rate: f32,
    /// Half-width of the uniform perturbation.
    pub weight_perturb_power: f32,
    pub add_connection_rate: f32,
    pub add_node_rate: f32,
    /// Chance a gene disabled in either parent stays disabled in the child.
    pub inherit_disable_rate: f32,
    /// Compatibility coefficients: excess, disjoint, mean weight difference.
    pub compat_excess: f32,
    pub compat_disjoint: f32,
    pub compat_weight: f32,
    pub compat_threshold: f32,
    /// Top fraction of each species allowed to reproduce.
    pub survival_fraction: f32,
    /// Generations a species may go without improving before it is culled.
    pub stagnation_threshold: u32,
}

impl Default for NeatConfig {
    fn default() -> Self {
        Self {
            weight_mutate_rate: 0.8,
            weight_perturb_rate: 0.9,
            weight_perturb_power: 0.5,
            add_connection_rate: 0.05,
            add_node_rate: 0.03,
            inherit_disable_rate: 0.75,
            compat_excess: 1.0,
            compat_disjoint: 1.0,
            compat_weight: 0.4,
            compat_threshold: 3.0,
            survival_fraction: 0.2,
            stagnation_threshold: 15,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Gene {
    pub innovation: Innovation,
    pub from: usize,
    pub to: usize,
    pub weight: f32,
    pub enabled: bool,
}

/// Node indexing convention: inputs, then outputs, then the bias node, then
/// hidden nodes in creation order.
#[derive(Clone, Debug)]
pub struct Genome {
    pub genes: BTreeMap<Innovation, Gene>,
    pub num_nodes: usize,
    pub fitness: f32,
}

/// Process-wide innovation bookkeeping: the same (from, to) pair always maps
/// to the same innovation number, so crossover can align genes by history.
pub struct InnovationTable {
    existing: HashMap<(usize, usize), Innovation>,
    next: Innovation,
}

impl InnovationTable {
    pub fn new() -> Self {
        Self {
            existing: HashMap::new(),
            next: 0,
        }
    }

    pub fn innovation_for(&mut self, from: usize, to: usize) -> Innovation {
        if let Some(&n) = self.existing.get(&(from, to)) {
            return n;
        }
        let n = self.next;
        self.next += 1;
        self.existing.insert((from, to), n);
        n
    }
}

impl Genome {
    /// Initial topology: every input plus the bias wired straight to every
    /// output with a random weight. No hidden nodes.
    pub fn initial<R: Rng>(
        inputs: usize,
        outputs: usize,
        table: &mut InnovationTable,
        rng: &mut R,
    ) -> Self {
        let bias = inputs + outputs;
        let mut genome = Self {
            genes: BTreeMap::new(),
            num_nodes: inputs + outputs + 1,
            fitness: 0.0,
        };
        for from in (0..inputs).chain(std::iter::once(bias)) {
            for to in inputs..inputs + outputs {
                genome.push_gene(Gene {
                    innovation: table.innovation_for(from, to),
                    from,
                    to,
                    weight: rng.gen_range(-1.0..1.0),
                    enabled: true,
                });
            }
        }
        genome
    }

    fn push_gene(&mut self, gene: Gene) {
        self.num_nodes = self.num_nodes.max(gene.from + 1).max(gene.to + 1);
        self.genes.insert(gene.innovation, gene);
    }

    pub fn has_connection(&self, from: usize, to: usize) -> bool {
        self.genes.values().any(|g| g.from == from && g.to == to)
    }

    /// Would adding from -> to close a loop, i.e. is `from` already
    /// reachable from `to`?
    pub fn creates_cycle(&self, from: usize, to: usize) -> bool {
        if from == to {
            return true;
        }
        let mut visited = vec![to];
        let mut queue = VecDeque::from([to]);
        while let Some(node) = queue.pop_front() {
            for gene in self.genes.values().filter(|g| g.from == node) {
                if gene.to == from {
                    return true;
                }
                if !visited.contains(&gene.to) {
                    visited.push(gene.to);
                    queue.push_back(gene.to);
                }
            }
        }
        false
    }
}

pub fn sigmoid(z: f32) -> f32 {
    1.0 / (1.0 + (-z).exp())
}

/// Compatibility distance between two genomes:
/// c1·E/N + c2·D/N + c3·mean(|Δweight|) over matching genes.
pub fn compatibility_distance(a: &Genome, b: &Genome, config: &NeatConfig) -> f32 {
    let max_a = a.genes.keys().next_back().copied().unwrap_or(0);
    let max_b = b.genes.keys().next_back().copied().unwrap_or(0);
    let horizon = max_a.min(max_b);

    let mut matching = 0u32;
    let mut weight_diff = 0.0f32;
    let mut disjoint = 0u32;
    let mut excess = 0u32;

    for (innovation, gene) in &a.genes {
        match b.genes.get(innovation) {
            Some(other) => {
                matching += 1;
                weight_diff += (gene.weight - other.weight).abs();
            }
            None if *innovation > horizon => excess += 1,
            None => disjoint += 1,
        }
    }
    for innovation in b.genes.keys() {
        if !a.genes.contains_key(innovation) {
            if *innovation > horizon {
                excess += 1;
            } else {
                disjoint += 1;
            }
        }
    }

    let n = a.genes.len().max(b.genes.len()).max(1) as f32;
    let avg_weight_diff = if matching > 0 {
        weight_diff / matching as f32
    } else {
        0.0
    };
    (config.compat_excess * excess as f32 + config.compat_disjoint * disjoint as f32) / n
        + config.compat_weight * avg_weight_diff
}

/// Offspring of `fitter` and `other`. Matching genes come from a random
/// parent, disjoint and excess genes from the fitter one; a gene disabled in
/// either parent is re-disabled with the configured probability.
pub fn crossover<R: Rng>(
    fitter: &Genome,
    other: &Genome,
    config: &NeatConfig,
    rng: &mut R,
) -> Genome {
    let mut child = Genome {
        genes: BTreeMap::new(),
        num_nodes: 0,
        fitness: 0.0,
    };
    for (innovation, gene) in &fitter.genes {
        let mut inherited = match other.genes.get(innovation) {
            Some(match_gene) => {
                let pick = if rng.gen_bool(0.5) { gene } else { match_gene };
                let mut inherited = *pick;
                if !gene.enabled || !match_gene.enabled {
                    inherited.enabled = !rng.gen_bool(config.inherit_disable_rate as f64);
                }
                inherited
            }
            None => *gene,
        };
        inherited.innovation = *innovation;
        child.push_gene(inherited);
    }
    child.num_nodes = child.num_nodes.max(fitter.num_nodes);
    child
}

/// All mutation kinds in one pass: weight perturb/replace per gene, then
/// possibly one structural mutation of each kind.
pub fn mutate<R: Rng>(
    genome: &mut Genome,
    inputs: usize,
    outputs: usize,
    config: &NeatConfig,
    table: &mut InnovationTable,
    rng: &mut R,
) {
    for gene in genome.genes.values_mut() {
        if rng.gen_bool(config.weight_mutate_rate as f64) {
            if rng.gen_bool(config.weight_perturb_rate as f64) {
                gene.weight +=
                    rng.gen_range(-config.weight_perturb_power..config.weight_perturb_power);
            } else {
                gene.weight = rng.gen_range(-1.0..1.0);
            }
        }
    }
    if rng.gen_bool(config.add_connection_rate as f64) {
        add_connection_mutation(genome, inputs, outputs, table, rng);
    }
    if rng.gen_bool(config.add_node_rate as f64) {
        add_node_mutation(genome, table, rng);
    }
}

/// New random feed-forward connection. Sources exclude output nodes, targets
/// exclude inputs and the bias; duplicates and cycles are rejected.
fn add_connection_mutation<R: Rng>(
    genome: &mut Genome,
    inputs: usize,
    outputs: usize,
    table: &mut InnovationTable,
    rng: &mut R,
) {
    let bias = inputs + outputs;
    let is_output = |n: usize| n >= inputs && n < inputs + outputs;
    for _ in 0..20 {
        let from = rng.gen_range(0..genome.num_nodes);
        let to = rng.gen_range(0..genome.num_nodes);
        if is_output(from) || to < inputs || to == bias || from == to {
            continue;
        }
        if genome.has_connection(from, to) || genome.creates_cycle(from, to) {
            continue;
        }
        let gene = Gene {
            innovation: table.innovation_for(from, to),
            from,
            to,
            weight: rng.gen_range(-1.0..1.0),
            enabled: true,
        };
        genome.push_gene(gene);
        return;
    }
}

/// Split a random enabled gene: disable it, route through a fresh node with
/// a 1.0 lead-in and the old weight on the way out.
fn add_node_mutation<R: Rng>(genome: &mut Genome, table: &mut InnovationTable, rng: &mut R) {
    let enabled: Vec<Innovation> = genome
        .genes
        .values()
        .filter(|g| g.enabled)
        .map(|g| g.innovation)
        .collect();
    let Some(&picked) = enabled.choose(rng) else {
        return;
    };
    let old = {
        let gene = genome.genes.get_mut(&picked).expect("picked gene exists");
        gene.enabled = false;
        *gene
    };
    let node = genome.num_nodes;
    genome.push_gene(Gene {
        innovation: table.innovation_for(old.from, node),
        from: old.from,
        to: node,
        weight: 1.0,
        enabled: true,
    });
    genome.push_gene(Gene {
        innovation: table.innovation_for(node, old.to),
        from: node,
        to: old.to,
        weight: old.weight,
        enabled: true,
    });
}

struct Species {
    representative: Genome,
    members: Vec<usize>,
    best_fitness: f32,
    last_improved: u32,
}

/// The evolving population. Fitness is written onto `genomes` by the caller
/// between `reset_fitness` and `evolve`.
pub struct Population {
    pub genomes: Vec<Genome>,
    pub generation: u32,
    inputs: usize,
    outputs: usize,
    size: usize,
    config: NeatConfig,
    table: InnovationTable,
    species: Vec<Species>,
}

impl Population {
    pub fn new<R: Rng>(
        size: usize,
        inputs: usize,
        outputs: usize,
        config: NeatConfig,
        rng: &mut R,
    ) -> Self {
        let mut table = InnovationTable::new();
        let genomes = (0..size)
            .map(|_| Genome::initial(inputs, outputs, &mut table, rng))
            .collect();
        Self {
            genomes,
            generation: 0,
            inputs,
            outputs,
            size,
            config,
            table,
            species: Vec::new(),
        }
    }

    pub fn inputs(&self) -> usize {
        self.inputs
    }

    pub fn outputs(&self) -> usize {
        self.outputs
    }

    pub fn species_count(&self) -> usize {
        self.species.len()
    }

    pub fn reset_fitness(&mut self) {
        for genome in &mut self.genomes {
            genome.fitness = 0.0;
        }
    }

    pub fn best(&self) -> &Genome {
        self.genomes
            .iter()
            .max_by(|a, b| a.fitness.total_cmp(&b.fitness))
            .expect("population is never empty")
    }

    /// Assign every genome to the first species whose representative is
    /// within the compatibility threshold, founding new species as needed.
    fn speciate(&mut self) {
        for species in &mut self.species {
            species.members.clear();
        }
        for (idx, genome) in self.genomes.iter().enumerate() {
            let found = self.species.iter_mut().find(|s| {
                compatibility_distance(genome, &s.representative, &self.config)
                    < self.config.compat_threshold
            });
            match found {
                Some(species) => species.members.push(idx),
                None => self.species.push(Species {
                    representative: genome.clone(),
                    members: vec![idx],
                    best_fitness: f32::NEG_INFINITY,
                    last_improved: self.generation,
                }),
            }
        }
        self.species.retain(|s| !s.members.is_empty());
        for species in &mut self.species {
            species.representative = self.genomes[species.members[0]].clone();
        }
    }

    /// Produce the next generation from the current fitness values:
    /// speciate, cull stagnant species (always sparing the one holding the
    /// best genome), share fitness to allocate offspring, then reproduce
    /// with per-species elitism, crossover, and mutation.
    pub fn evolve<R: Rng>(&mut self, rng: &mut R) {
        self.generation += 1;
        self.speciate();

        let best_idx = {
            let mut best = 0;
            for (i, g) in self.genomes.iter().enumerate() {
                if g.fitness > self.genomes[best].fitness {
                    best = i;
                }
            }
            best
        };
        let generation = self.generation;
        let stagnation = self.config.stagnation_threshold;
        for species in &mut self.species {
            let species_best = species
                .members
                .iter()
                .map(|&i| self.genomes[i].fitness)
                .fold(f32::NEG_INFINITY, f32::max);
            if species_best > species.best_fitness {
                species.best_fitness = species_best;
                species.last_improved = generation;
            }
        }
        self.species.retain(|s| {
            s.members.contains(&best_idx)
                || generation.saturating_sub(s.last_improved) <= stagnation
        });

        // Explicit fitness sharing: offspring proportional to mean fitness.
        let scores: Vec<f32> = self
            .species
            .iter()
            .map(|s| {
                s.members.iter().map(|&i| self.genomes[i].fitness).sum::<f32>()
                    / s.members.len() as f32
            })
            .collect();
        let total: f32 = scores.iter().sum();
        let mut counts: Vec<usize> = if total > 0.0 {
            scores
                .iter()
                .map(|s| ((s / total) * self.size as f32).floor() as usize)
                .collect()
        } else {
            vec![self.size / self.species.len().max(1); self.species.len()]
        };
        let mut assigned: usize = counts.iter().sum();
        let mut i = 0;
        while assigned < self.size && !counts.is_empty() {
            let idx = i % counts.len();
            counts[idx] += 1;
            assigned += 1;
            i += 1;
        }

        let mut next: Vec<Genome> = Vec::with_capacity(self.size);
        for (species, count) in self.species.iter().zip(&counts) {
            if *count == 0 {
                continue;
            }
            let mut ranked: Vec<usize> = species.members.clone();
            ranked.sort_by(|&a, &b| {
                self.genomes[b].fitness.total_cmp(&self.genomes[a].fitness)
            });
            // Champion survives unchanged.
            next.push(self.genomes[ranked[0]].clone());

            let cutoff = ((self.config.survival_fraction * ranked.len() as f32).ceil()
                as usize)
                .clamp(1, ranked.len());
            let parents = &ranked[..cutoff];
            for _ in 1..*count {
                let &p1 = parents.choose(rng).expect("non-empty parent pool");
                let &p2 = parents.choose(rng).expect("non-empty parent pool");
                let (fitter, other) = if self.genomes[p1].fitness >= self.genomes[p2].fitness
                {
                    (&self.genomes[p1], &self.genomes[p2])
                } else {
                    (&self.genomes[p2], &self.genomes[p1])
                };
                let mut child = crossover(fitter, other, &self.config, rng);
                mutate(
                    &mut child,
                    self.inputs,
                    self.outputs,
                    &self.config,
                    &mut self.table,
                    rng,
                );
                next.push(child);
            }
        }
        // Rounding can land slightly off the target size.
        next.truncate(self.size);
        while next.len() < self.size {
            let mut clone = self.genomes[best_idx].clone();
            mutate(
                &mut clone,
                self.inputs,
                self.outputs,
                &self.config,
                &mut self.table,
                rng,
            );
            next.push(clone);
        }
        self.genomes = next;
    }
}

/// Feed-forward phenotype: enabled genes only, nodes evaluated in
/// topological order, sigmoid activations scaled as in classic NEAT.
pub struct Network {
    inputs: usize,
    outputs: usize,
    num_nodes: usize,
    order: Vec<usize>,
    incoming: Vec<Vec<(usize, f32)>>,
}

impl Network {
    pub const ACTIVATION_SCALE: f32 = 4.9;

    pub fn from_genome(genome: &Genome, inputs: usize, outputs: usize) -> Self {
        let num_nodes = genome.num_nodes;
        let bias = inputs + outputs;
        let mut incoming: Vec<Vec<(usize, f32)>> = vec![Vec::new(); num_nodes];
        let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); num_nodes];
        let mut in_degree = vec![0usize; num_nodes];
        for gene in genome.genes.values().filter(|g| g.enabled) {
            incoming[gene.to].push((gene.from, gene.weight));
            outgoing[gene.from].push(gene.to);
            in_degree[gene.to] += 1;
        }

        let mut queue: VecDeque<usize> = (0..num_nodes).filter(|&n| in_degree[n] == 0).collect();
        let mut order = Vec::with_capacity(num_nodes);
        let mut seen = vec![false; num_nodes];
        while let Some(node) = queue.pop_front() {
            seen[node] = true;
            if node >= inputs && node != bias {
                order.push(node);
            }
            for &to in &outgoing[node] {
                in_degree[to] -= 1;
                if in_degree[to] == 0 {
                    queue.push_back(to);
                }
            }
        }
        // Genomes are built acyclic; any leftover nodes are evaluated last
        // in index order so activation still terminates.
        for node in 0..num_nodes {
            if !seen[node] && node >= inputs && node != bias {
                order.push(node);
            }
        }

        Self {
            inputs,
            outputs,
            num_nodes,
            order,
            incoming,
        }
    }

    pub fn activate(&self, input: &[f32]) -> Vec<f32> {
        debug_assert_eq!(input.len(), self.inputs);
        let mut values = vec![0.0f32; self.num_nodes];
        values[..self.inputs].copy_from_slice(input);
        values[self.inputs + self.outputs] = 1.0;
        for &node in &self.order {
            let sum: f32 = self.incoming[node]
                .iter()
                .map(|&(from, weight)| values[from] * weight)
                .sum();
            values[node] = sigmoid(Self::ACTIVATION_SCALE * sum);
        }
        values[self.inputs..self.inputs + self.outputs].to_vec()
    }
}
