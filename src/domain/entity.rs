/// Entities: Player, Enemy (Minion / Boss), PowerUp.
///
/// Positions are continuous (f32, grid units) so per-tick speeds below
/// one cell work; the occupied cell is the floor of the position.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Dir {
    Up,
    Down,
    Left,
    Right,
}

impl Dir {
    /// Unit delta in grid units. Y grows downward.
    pub fn delta(self) -> (f32, f32) {
        match self {
            Dir::Up => (0.0, -1.0),
            Dir::Down => (0.0, 1.0),
            Dir::Left => (-1.0, 0.0),
            Dir::Right => (1.0, 0.0),
        }
    }
}

/// Frame input: movement is continuous (held key, one direction per
/// tick), the cut toggle is edge-triggered and independent of movement.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    pub movement: Option<Dir>,
    pub toggle_cut: bool,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub x: f32,
    pub y: f32,
    pub dir: Dir,
    pub cutting: bool,
}

impl Player {
    pub fn new(x: f32, y: f32) -> Self {
        Player {
            x,
            y,
            dir: Dir::Right,
            cutting: false,
        }
    }

    pub fn cell(&self) -> (i32, i32) {
        (self.x.floor() as i32, self.y.floor() as i32)
    }

    /// Back to the spawn cell with cutting mode off. Used on death.
    pub fn respawn(&mut self, spawn: (f32, f32)) {
        self.x = spawn.0;
        self.y = spawn.1;
        self.cutting = false;
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EnemyKind {
    /// Roaming hazard. Count scales with the level index.
    Minion,
    /// Exactly one per level; its cell seeds the capture flood fill.
    Boss,
}

#[derive(Clone, Debug)]
pub struct Enemy {
    pub kind: EnemyKind,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// Collision radius in grid units.
    pub radius: f32,
}

pub const MINION_RADIUS: f32 = 0.7;
pub const BOSS_RADIUS: f32 = 1.2;

impl Enemy {
    pub fn minion(x: f32, y: f32, vx: f32, vy: f32) -> Self {
        Enemy {
            kind: EnemyKind::Minion,
            x,
            y,
            vx,
            vy,
            radius: MINION_RADIUS,
        }
    }

    pub fn boss(x: f32, y: f32, vx: f32, vy: f32) -> Self {
        Enemy {
            kind: EnemyKind::Boss,
            x,
            y,
            vx,
            vy,
            radius: BOSS_RADIUS,
        }
    }

    pub fn cell(&self) -> (i32, i32) {
        (self.x.floor() as i32, self.y.floor() as i32)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PowerUpKind {
    /// Enemies stop moving (and colliding) for a few seconds.
    Freeze,
    /// Player is immune to death checks for a few seconds.
    Invincible,
    /// +1 life, immediately.
    ExtraLife,
    /// +30s on the level timer, immediately.
    TimeBonus,
}

/// A power-up sits on a Void cell until a capture claims that cell,
/// which applies its effect and removes it. At most three are live.
#[derive(Clone, Copy, Debug)]
pub struct PowerUp {
    pub x: i32,
    pub y: i32,
    pub kind: PowerUpKind,
}
