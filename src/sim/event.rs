/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound and messages; they
/// never feed back into the simulation.

use crate::domain::entity::PowerUpKind;

#[derive(Clone, Copy, Debug)]
#[allow(dead_code)]
pub enum GameEvent {
    /// A trail cell was deposited.
    TrailDrawn { x: i32, y: i32 },
    /// A closed cut was resolved. `cells` counts everything newly
    /// claimed (trail + enclosed regions); `points` is the score delta.
    AreaClaimed { cells: usize, points: u32 },
    PowerUpSpawned { x: i32, y: i32, kind: PowerUpKind },
    PowerUpCollected { kind: PowerUpKind },
    PlayerKilled,
    /// Owned fraction reached the win threshold.
    LevelWon,
    /// The level timer expired.
    TimeUp,
    /// Lives hit zero.
    GameOver,
}
