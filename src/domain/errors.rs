// Domain-level errors for room, action and leaderboard workflows.

/// Reasons an inbound player action was not applied. Never reported to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    UnknownPlayer,
    UnknownRoom,
    NotInRoom,
    RoomNotPlaying,
    NoActiveGame,
    IllegalPlacement,
    PowerUpNotHeld,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomError {
    Full,
    NotFound,
    /// The room already left `Waiting`.
    NotAccepting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaderboardError {
    InvalidName,
    InvalidScore,
    StorageFailure,
}
