//! Outgoing notifications for the host (sound, level flow, deaths).

use crossbeam_channel::{Receiver, Sender};

use crate::assets::{Playlist, SoundId};
use crate::enemy::Species;
use crate::flow::LevelSelector;
use crate::world::EntityId;

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    PlaySound(SoundId),
    EnemyDied { id: EntityId, species: Species },
    PlayerDied,
    Victory,
    GoToLevel(LevelSelector),
}

/// Channel the level publishes [`GameEvent`]s on. The host drains it
/// once per frame.
pub struct EventBus {
    sender: Sender<GameEvent>,
    receiver: Receiver<GameEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self { sender, receiver }
    }

    pub fn sender(&self) -> EventSender {
        EventSender(self.sender.clone())
    }

    /// A receiving end hosts can keep on their own thread.
    pub fn receiver(&self) -> Receiver<GameEvent> {
        self.receiver.clone()
    }

    /// Take every pending event.
    pub fn drain(&self) -> Vec<GameEvent> {
        self.receiver.try_iter().collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloneable sending half handed to entities through the tick context.
#[derive(Clone, Debug)]
pub struct EventSender(Sender<GameEvent>);

impl EventSender {
    pub fn send(&self, event: GameEvent) {
        // The bus owns a receiver for as long as any sender exists.
        let _ = self.0.send(event);
    }

    pub fn play(&self, sound: &SoundId) {
        self.send(GameEvent::PlaySound(sound.clone()));
    }

    pub fn play_any(&self, playlist: &Playlist, rng: &mut fastrand::Rng) {
        if let Some(sound) = playlist.pick(rng) {
            self.send(GameEvent::PlaySound(sound));
        }
    }
}
