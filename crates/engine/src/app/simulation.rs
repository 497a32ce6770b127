use std::f32::consts::TAU;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::SmallRng;
use rand::Rng;
use tracing::{debug, info};

use super::collision::resolve_overlaps_for;
use super::{EntityId, SimConfig, SimEntity, SpriteHandle, Vec2};
use crate::content::{CharacterRecord, Roster};

/// Owns every entity and the random source, and advances them one step at
/// a time: each entity runs its pre-collision update, resolves overlaps
/// against everyone else, then advances its animation.
pub struct Simulation {
    config: SimConfig,
    rng: SmallRng,
    entities: Vec<SimEntity>,
    next_entity_id: u64,
    tick: u64,
}

impl Simulation {
    pub fn new(config: SimConfig, rng: SmallRng) -> Self {
        Self {
            config,
            rng,
            entities: Vec::new(),
            next_entity_id: 0,
            tick: 0,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn entities(&self) -> &[SimEntity] {
        &self.entities
    }

    pub fn entity(&self, id: EntityId) -> Option<&SimEntity> {
        self.entities.iter().find(|entity| entity.id() == id)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn talking_count(&self) -> usize {
        self.entities.iter().filter(|entity| entity.is_talking()).count()
    }

    /// Adds one entity at a random position with a random heading at the
    /// configured speed.
    pub fn spawn(&mut self, character: Arc<CharacterRecord>, sprite: SpriteHandle) -> EntityId {
        let world = self.config.world;
        let position = Vec2::new(
            self.rng.random::<f32>() * world.width,
            self.rng.random::<f32>() * world.height,
        );
        let heading = self.rng.random_range(0.0..TAU);
        let velocity = Vec2::from_angle(heading, self.config.speed);
        self.spawn_at(character, sprite, position, velocity)
    }

    pub fn spawn_at(
        &mut self,
        character: Arc<CharacterRecord>,
        sprite: SpriteHandle,
        position: Vec2,
        velocity: Vec2,
    ) -> EntityId {
        let id = EntityId(self.next_entity_id);
        self.next_entity_id += 1;
        self.entities
            .push(SimEntity::new(id, character, sprite, position, velocity));
        id
    }

    /// Spawns `character_count` distinct characters picked at random from
    /// `roster`. `sprite_for` supplies the walk sheet handle per character.
    pub fn populate(
        &mut self,
        roster: &Roster,
        mut sprite_for: impl FnMut(&CharacterRecord) -> SpriteHandle,
    ) -> usize {
        let picked = roster.select_random(self.config.character_count, &mut self.rng);
        for character in picked {
            let sprite = sprite_for(&character);
            self.spawn(character, sprite);
        }
        info!(
            entity_count = self.entities.len(),
            roster_size = roster.len(),
            "simulation_spawned"
        );
        self.entities.len()
    }

    pub fn step(&mut self, dt: Duration) {
        let min_distance = self.config.hitbox_radius * 2.0;
        for index in 0..self.entities.len() {
            self.entities[index].begin_step(dt, &self.config, &mut self.rng);
            if self.config.resolve_collisions {
                resolve_overlaps_for(
                    index,
                    &mut self.entities,
                    min_distance,
                    self.config.collision_response,
                );
            }
            self.entities[index].finish_step(self.config.animation_speed);
        }
        self.tick += 1;
    }

    /// Forwards `question` to every entity. Blank questions are ignored.
    /// Returns how many entities were asked.
    pub fn ask_all(&mut self, question: &str) -> usize {
        let question = question.trim();
        if question.is_empty() {
            return 0;
        }
        let speech = &self.config.speech;
        for entity in &mut self.entities {
            if speech.stagger_replies {
                entity.ask_staggered(question, speech, &mut self.rng);
            } else {
                entity.ask(question, speech, &mut self.rng);
            }
        }
        info!(
            question_chars = question.chars().count(),
            villagers = self.entities.len(),
            staggered = speech.stagger_replies,
            "question_asked"
        );
        self.entities.len()
    }

    /// Cancels every pending reply and drops all entities.
    pub fn clear(&mut self) {
        let cancelled = self
            .entities
            .iter_mut()
            .map(SimEntity::cleanup)
            .filter(|cancelled| *cancelled)
            .count();
        debug!(
            entities = self.entities.len(),
            cancelled_replies = cancelled,
            "simulation_cleared"
        );
        self.entities.clear();
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        self.clear();
    }
}
