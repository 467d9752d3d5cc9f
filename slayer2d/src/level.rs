//! A running level: owns every entity group, steps them in a fixed order
//! and applies what they asked for afterwards.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam_channel::Receiver;

use crate::animation::AnimationClip;
use crate::assets::{AssetProvider, SoundId};
use crate::camera::CameraRig;
use crate::commands::{Command, CommandBuffer};
use crate::config::{LevelConfig, SimConfig};
use crate::effects::{BulletLine, Effect, FlameSmoke, Particle};
use crate::enemy::{Enemy, Species};
use crate::engine::{Clock, TickContext};
use crate::events::{EventBus, EventSender, GameEvent};
use crate::flow::LevelSelector;
use crate::input::{Action, InputState};
use crate::math::{Rect, Vec2};
use crate::player::Player;
use crate::projectile::{Projectile, ProjectileKind, ProjectileSpawn};
use crate::render::{compose, Drawable, Frame};
use crate::world::{EntityAllocator, EntityId, Group};

/// Length of the iris-in at the start and the iris-out after a win.
pub const TRANSITION_TIME: f32 = 1.5;
/// How long the loss screen stays up before restarting.
pub const LOSS_SCREEN_TIME: f32 = TRANSITION_TIME + 4.0;
/// Pause between the last kill and the transition out.
pub const VICTORY_HOLD: f32 = 5.0;

const DEATH_SOUND: &str = "sound/death.wav";
const VICTORY_SOUND: &str = "sound/victory.wav";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Playing,
    Lost,
    Won,
}

/// Timers driving the level's intro, loss screen and victory.
#[derive(Clone, Debug)]
struct FlowTimers {
    outcome: Outcome,
    transition_in: f32,
    loss_remaining: f32,
    loss_transition: f32,
    victory_remaining: f32,
    transition_out: f32,
}

impl FlowTimers {
    fn new() -> Self {
        Self {
            outcome: Outcome::Playing,
            transition_in: TRANSITION_TIME,
            loss_remaining: LOSS_SCREEN_TIME,
            loss_transition: TRANSITION_TIME,
            victory_remaining: VICTORY_HOLD,
            transition_out: TRANSITION_TIME,
        }
    }
}

pub struct Level {
    name: String,
    obstacles: Vec<Rect>,
    assets: Box<dyn AssetProvider>,
    ids: EntityAllocator,
    player: Player,
    enemies: Group<Enemy>,
    projectiles: Group<Projectile>,
    effects: Group<Effect>,
    camera: CameraRig,
    rng: fastrand::Rng,
    commands: CommandBuffer,
    bus: EventBus,
    sender: EventSender,
    clock: Clock,
    elapsed: f32,
    mouse_world: Vec2,
    flow: FlowTimers,
    pending: Option<LevelSelector>,
    blood_clip: Arc<AnimationClip>,
    flame_clip: Arc<AnimationClip>,
    death_sound: SoundId,
    victory_sound: SoundId,
}

impl Level {
    pub fn new(config: SimConfig, level: LevelConfig, mut assets: Box<dyn AssetProvider>) -> Result<Self> {
        let mut rng = fastrand::Rng::with_seed(config.seed);
        let mut ids = EntityAllocator::new();

        let mut player = Player::new(level.player_spawn, &level.loadout, assets.as_mut())
            .with_context(|| format!("creating player for level `{}`", level.name))?;
        if let Some(health) = level.player_health {
            player = player.with_health(health);
        }

        let mut enemies = Group::new();
        for (index, spawn) in level.enemies.iter().enumerate() {
            let id = ids.allocate();
            let enemy = Enemy::spawn(id, spawn.species, spawn.position, assets.as_mut(), &mut rng)
                .with_context(|| format!("spawning enemy {index} of level `{}`", level.name))?;
            enemies.insert(id, enemy);
        }

        let blood_clip = assets.animation("particle/blood").context("loading blood particle")?;
        let flame_clip = assets.animation("particle/flame").context("loading flame particle")?;
        let death_sound = assets.sound(DEATH_SOUND);
        let victory_sound = assets.sound(VICTORY_SOUND);

        let camera = CameraRig::new(config.screen_size()).with_focus(player.body.rect.center());
        let bus = EventBus::new();
        let sender = bus.sender();

        log::info!(
            "level `{}` started with {} enemies and {} obstacles",
            level.name,
            enemies.len(),
            level.obstacles.len()
        );
        Ok(Self {
            name: level.name,
            obstacles: level.obstacles,
            assets,
            ids,
            player,
            enemies,
            projectiles: Group::new(),
            effects: Group::new(),
            mouse_world: camera.offset(),
            camera,
            rng,
            commands: CommandBuffer::new(),
            bus,
            sender,
            clock: Clock::new(config.fixed_step),
            elapsed: 0.0,
            flow: FlowTimers::new(),
            pending: None,
            blood_clip,
            flame_clip,
            death_sound,
            victory_sound,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn obstacles(&self) -> &[Rect] {
        &self.obstacles
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    pub fn enemies(&self) -> &Group<Enemy> {
        &self.enemies
    }

    pub fn enemies_mut(&mut self) -> &mut Group<Enemy> {
        &mut self.enemies
    }

    pub fn projectiles(&self) -> &Group<Projectile> {
        &self.projectiles
    }

    pub fn effects(&self) -> &Group<Effect> {
        &self.effects
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    /// Cursor position in world space as of the last tick.
    pub fn mouse_world(&self) -> Vec2 {
        self.mouse_world
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn outcome(&self) -> Outcome {
        self.flow.outcome
    }

    /// World entities stop updating once the player has lost.
    pub fn is_ended(&self) -> bool {
        self.flow.outcome == Outcome::Lost
    }

    /// Transition already requested from the host, if any.
    pub fn pending_transition(&self) -> Option<LevelSelector> {
        self.pending
    }

    /// 0 when the level opens, 1 once the intro is over.
    pub fn transition_in_ratio(&self) -> f32 {
        1.0 - self.flow.transition_in / TRANSITION_TIME
    }

    /// How far the loss overlay has closed in, 0..=1.
    pub fn loss_ratio(&self) -> Option<f32> {
        (self.flow.outcome == Outcome::Lost)
            .then(|| 1.0 - self.flow.loss_transition / TRANSITION_TIME)
    }

    /// 1 while the victory hold lasts, falling to 0 as the level closes.
    pub fn transition_out_ratio(&self) -> Option<f32> {
        (self.flow.outcome == Outcome::Won).then(|| self.flow.transition_out / TRANSITION_TIME)
    }

    /// Every event published since the last drain.
    pub fn drain_events(&self) -> Vec<GameEvent> {
        self.bus.drain()
    }

    pub fn event_receiver(&self) -> Receiver<GameEvent> {
        self.bus.receiver()
    }

    /// Step by one frame. With a fixed step configured the frame time is
    /// accumulated and consumed in fixed slices.
    pub fn advance(&mut self, input: &InputState, frame: Duration) {
        self.clock.update_time(frame);
        match self.clock.fixed_delta_time() {
            Some(step) => {
                while self.clock.should_run_fixed_update() {
                    self.tick(input, step.as_secs_f32());
                }
            }
            None => self.tick(input, self.clock.delta_time().as_secs_f32()),
        }
    }

    /// One simulation step of `dt` seconds.
    pub fn tick(&mut self, input: &InputState, dt: f32) {
        self.elapsed += dt;
        self.mouse_world = self.camera.screen_to_world(input.mouse_position());

        if !self.is_ended() {
            self.update_entities(input, dt);
        }
        self.commit();
        self.update_flow(input, dt);

        self.camera.apply_scroll(input.scroll());
        let aiming = self.player.controls().action_down(input, Action::Aim);
        self.camera.step(
            self.player.body.rect.center(),
            self.mouse_world,
            aiming,
            dt,
            &mut self.rng,
        );
    }

    fn update_entities(&mut self, input: &InputState, dt: f32) {
        let mut ctx = TickContext {
            dt,
            elapsed: self.elapsed,
            input,
            mouse_world: self.mouse_world,
            rng: &mut self.rng,
            commands: &mut self.commands,
            events: &self.sender,
        };

        for projectile in self.projectiles.values_mut() {
            projectile.update(&self.obstacles, &mut self.enemies, &mut ctx);
        }
        for effect in self.effects.values_mut() {
            effect.update(&self.projectiles, &self.obstacles, &mut self.enemies, &mut ctx);
        }
        for enemy in self.enemies.values_mut() {
            enemy.update(&mut self.player, &self.obstacles, &mut ctx);
        }
        self.player.update(&self.obstacles, &mut ctx);
    }

    /// Apply queued commands in order, then drop everything destroyed this
    /// tick.
    fn commit(&mut self) {
        for command in self.commands.drain() {
            match command {
                Command::SpawnProjectile(spawn) => {
                    self.spawn_projectile(spawn);
                }
                Command::SpawnBlood(position) => {
                    self.spawn_blood(position);
                }
                Command::SpawnFlameParticle { position, damage } => {
                    self.spawn_flame_particle(position, damage);
                }
                Command::SpawnExplosion {
                    center,
                    clip,
                    zindex,
                } => {
                    self.spawn_effect(Effect::Particle(Particle::explosion(clip, center, zindex)));
                }
                Command::SpawnEnemy { species, position } => {
                    if let Err(err) = self.spawn_enemy(species, position) {
                        log::warn!("dropping {species:?} spawn: {err:#}");
                    }
                }
                Command::ShakeCamera(magnitude) => self.camera.shake(magnitude),
                Command::PlayerDied => self.notify_player_death(),
            }
        }

        let removed =
            self.enemies.sweep().len() + self.projectiles.sweep().len() + self.effects.sweep().len();
        if removed > 0 {
            log::trace!("swept {removed} entities");
        }
    }

    fn update_flow(&mut self, input: &InputState, dt: f32) {
        self.flow.transition_in = (self.flow.transition_in - dt).max(0.0);

        match self.flow.outcome {
            Outcome::Lost => {
                if self.flow.loss_remaining <= 0.0 {
                    self.request(LevelSelector::Restart);
                } else {
                    self.flow.loss_remaining -= dt;
                    self.flow.loss_transition = (self.flow.loss_transition - dt).max(0.0);
                }
            }
            Outcome::Won => {
                if self.flow.victory_remaining <= 0.0 {
                    if self.flow.transition_out <= 0.0 {
                        self.request(LevelSelector::Next);
                    }
                    self.flow.transition_out = (self.flow.transition_out - dt).max(0.0);
                } else {
                    self.flow.victory_remaining -= dt;
                }
            }
            Outcome::Playing => {}
        }

        if self.player.controls().action_down(input, Action::Leave) {
            self.request(LevelSelector::Menu);
        }

        if self.check_win() {
            self.victory();
        }
    }

    /// True when no enemy is left standing. An empty level counts as won.
    pub fn check_win(&self) -> bool {
        self.enemies.values().all(Enemy::is_dead)
    }

    fn victory(&mut self) {
        if self.flow.outcome != Outcome::Playing {
            return;
        }
        self.flow.outcome = Outcome::Won;
        log::info!("level `{}` won after {:.1}s", self.name, self.elapsed);
        self.sender.send(GameEvent::Victory);
        self.sender.play(&self.victory_sound);
    }

    /// The player ran out of health: show the loss screen, then restart.
    pub fn notify_player_death(&mut self) {
        if self.flow.outcome != Outcome::Playing {
            return;
        }
        self.flow.outcome = Outcome::Lost;
        log::info!("level `{}` lost after {:.1}s", self.name, self.elapsed);
        self.sender.send(GameEvent::PlayerDied);
        self.sender.play(&self.death_sound);
    }

    /// Ask the host to switch levels.
    pub fn go_to_level(&mut self, selector: LevelSelector) {
        log::info!("level `{}` requests {selector:?}", self.name);
        self.pending = Some(selector);
        self.sender.send(GameEvent::GoToLevel(selector));
    }

    /// Like [`Level::go_to_level`], but only the first request of a level
    /// gets through.
    fn request(&mut self, selector: LevelSelector) {
        if self.pending.is_none() {
            self.go_to_level(selector);
        }
    }

    pub fn spawn_projectile(&mut self, spawn: ProjectileSpawn) -> EntityId {
        let id = self.ids.allocate();
        match spawn.kind {
            ProjectileKind::Bullet => {
                self.spawn_effect(Effect::Line(BulletLine::new(id, &spawn)));
            }
            ProjectileKind::Flame => {
                if let Some(smoke) = FlameSmoke::new(&spawn) {
                    self.spawn_effect(Effect::Smoke(smoke));
                }
            }
            ProjectileKind::Missile => {}
        }
        self.projectiles.insert(id, Projectile::new(spawn));
        id
    }

    pub fn spawn_blood(&mut self, position: Vec2) -> EntityId {
        let clip = Arc::clone(&self.blood_clip);
        self.spawn_effect(Effect::Particle(Particle::blood(clip, position)))
    }

    pub fn spawn_flame_particle(&mut self, position: Vec2, damage: f32) -> EntityId {
        let clip = Arc::clone(&self.flame_clip);
        self.spawn_effect(Effect::Particle(Particle::flame(clip, position, damage)))
    }

    fn spawn_effect(&mut self, effect: Effect) -> EntityId {
        let id = self.ids.allocate();
        self.effects.insert(id, effect);
        id
    }

    /// Add an enemy with its sprite's top-left at `position`.
    pub fn spawn_enemy(&mut self, species: Species, position: Vec2) -> Result<EntityId> {
        let id = self.ids.allocate();
        let enemy = Enemy::spawn(id, species, position, self.assets.as_mut(), &mut self.rng)?;
        self.enemies.insert(id, enemy);
        Ok(id)
    }

    /// The frame as the camera sees it right now.
    pub fn compose(&self) -> Frame {
        let mut drawables: Vec<&dyn Drawable> = Vec::with_capacity(
            1 + self.enemies.len() + self.projectiles.len() + self.effects.len(),
        );
        drawables.push(&self.player);
        if let Some(weapon) = self.player.inventory().active_weapon() {
            drawables.push(weapon);
        }
        drawables.extend(self.enemies.values().map(|enemy| enemy as &dyn Drawable));
        drawables.extend(self.projectiles.values().map(|p| p as &dyn Drawable));
        drawables.extend(self.effects.values().map(|effect| effect as &dyn Drawable));
        compose(&self.camera, drawables)
    }
}
