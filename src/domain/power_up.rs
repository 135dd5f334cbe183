// Power-up kinds and the deduplicated set a player holds.

use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerUpKind {
    ClearLines,
    SlowOpponent,
    AddGarbage,
    Shield,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 4] = [
        PowerUpKind::ClearLines,
        PowerUpKind::SlowOpponent,
        PowerUpKind::AddGarbage,
        PowerUpKind::Shield,
    ];

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

/// Held power-ups; never contains the same kind twice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PowerUpSet {
    held: Vec<PowerUpKind>,
}

impl PowerUpSet {
    /// Adds `kind` unless already held. Returns true if the set grew.
    pub fn grant(&mut self, kind: PowerUpKind) -> bool {
        if self.held.contains(&kind) {
            return false;
        }
        self.held.push(kind);
        true
    }

    /// Removes `kind`. Returns false if it was not held.
    pub fn take(&mut self, kind: PowerUpKind) -> bool {
        let before = self.held.len();
        self.held.retain(|held| *held != kind);
        self.held.len() != before
    }

    pub fn contains(&self, kind: PowerUpKind) -> bool {
        self.held.contains(&kind)
    }

    pub fn len(&self) -> usize {
        self.held.len()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = PowerUpKind> + '_ {
        self.held.iter().copied()
    }
}
