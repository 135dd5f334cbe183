// Match orchestration: routes player commands to rooms, applies board transitions,
// resolves cross-player effects and decides what to broadcast.

use crate::domain::errors::{ActionError, RoomError};
use crate::domain::game::Lock;
use crate::domain::room::JoinOutcome;
use crate::domain::{
    Direction, GameSnapshot, GameState, PlayerId, PlayerSession, PowerUpKind, Room, RoomId,
    RoomSettings, RoomStatus,
};
use crate::use_cases::registry::{Registry, SharedRoom, SharedSession, lock_session};
use crate::use_cases::scheduler::{TaskKey, TaskScheduler};
use crate::use_cases::types::{
    Command, Notifier, PieceAction, PlayerSummary, RoomSnapshot, ServerEvent,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const POWER_UP_CLEARED_ROWS: usize = 2;
const POWER_UP_GARBAGE_ROWS: usize = 3;

/// Shared configuration for match simulation.
#[derive(Debug, Clone)]
pub struct MatchSettings {
    /// How long a slow_opponent effect lasts.
    pub slow_duration: Duration,
    /// Gravity tick period; `None` leaves descent entirely to player input.
    pub gravity_tick: Option<Duration>,
}

#[derive(Clone)]
pub struct MatchOrchestrator {
    registry: Arc<Registry>,
    notifier: Arc<dyn Notifier>,
    scheduler: Arc<TaskScheduler>,
    settings: MatchSettings,
}

impl MatchOrchestrator {
    pub fn new(registry: Arc<Registry>, notifier: Arc<dyn Notifier>, settings: MatchSettings) -> Self {
        Self {
            registry,
            notifier,
            scheduler: Arc::new(TaskScheduler::new()),
            settings,
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn scheduler(&self) -> &Arc<TaskScheduler> {
        &self.scheduler
    }

    /// Creates the session for a newly joined connection.
    pub fn register_player(&self, player_id: PlayerId, display_name: String) {
        self.registry
            .insert_player(PlayerSession::new(player_id, display_name.clone()));
        info!(player_id, %display_name, "player registered");
        self.notifier.notify(
            &[player_id],
            &ServerEvent::Registered {
                player_id,
                display_name,
            },
        );
    }

    /// Entry point for inbound commands. Failures are logged and dropped.
    pub async fn handle(&self, player_id: PlayerId, command: Command) {
        match command {
            Command::CreateRoom { room_id, settings } => {
                self.create_room(player_id, room_id, settings);
            }
            Command::JoinRoom { room_id } => {
                let _ = self.join_room(player_id, &room_id).await;
            }
            Command::LeaveRoom => self.leave_room(player_id).await,
            Command::SetReady { ready } => self.set_ready(player_id, ready).await,
            Command::Act { room_id, action } => {
                if !self.is_bound_to(player_id, &room_id) {
                    debug!(player_id, %room_id, "action for foreign room ignored");
                    return;
                }
                match action {
                    PieceAction::Move(direction) => {
                        self.apply_move(player_id, direction).await;
                    }
                    PieceAction::Rotate => {
                        self.apply_rotate(player_id).await;
                    }
                    PieceAction::SoftDrop => {
                        self.apply_soft_drop(player_id).await;
                    }
                    PieceAction::HardDrop => {
                        self.apply_hard_drop(player_id).await;
                    }
                }
            }
            Command::UsePowerUp {
                room_id,
                kind,
                target,
            } => {
                if !self.is_bound_to(player_id, &room_id) {
                    debug!(player_id, %room_id, "power-up for foreign room ignored");
                    return;
                }
                self.apply_power_up(player_id, kind, target).await;
            }
        }
    }

    fn is_bound_to(&self, player_id: PlayerId, room_id: &str) -> bool {
        self.registry
            .player(player_id)
            .is_some_and(|session| lock_session(&session).room_id.as_deref() == Some(room_id))
    }

    pub fn create_room(
        &self,
        player_id: PlayerId,
        room_id: RoomId,
        settings: RoomSettings,
    ) -> Option<RoomId> {
        let Some(shared) = self.registry.insert_room(Room::new(room_id.clone(), settings)) else {
            warn!(player_id, %room_id, "room id collision; create ignored");
            return None;
        };
        // Fresh room, nobody else can hold the lock yet.
        let snapshot = match shared.try_lock() {
            Ok(room) => self.room_snapshot(&room),
            Err(_) => return None,
        };
        info!(player_id, %room_id, "room created");
        self.notifier
            .notify(&[player_id], &ServerEvent::RoomCreated { room: snapshot });
        Some(room_id)
    }

    /// Seats the player. The failure event goes to the requester only.
    pub async fn join_room(
        &self,
        player_id: PlayerId,
        room_id: &str,
    ) -> Result<JoinOutcome, RoomError> {
        let Some(session) = self.registry.player(player_id) else {
            debug!(player_id, "join from unregistered player ignored");
            return Err(RoomError::NotFound);
        };
        let current = lock_session(&session).room_id.clone();
        if current.as_deref().is_some_and(|id| id != room_id) {
            self.depart(player_id, &session).await;
        }

        let Some(shared) = self.registry.room(room_id) else {
            self.notifier.notify(
                &[player_id],
                &ServerEvent::RoomNotFound {
                    room_id: room_id.to_string(),
                },
            );
            return Err(RoomError::NotFound);
        };
        let mut room = shared.lock().await;
        if room.is_member(player_id) {
            self.notifier.notify(
                &[player_id],
                &ServerEvent::RoomJoined {
                    room: self.room_snapshot(&room),
                },
            );
            return Ok(JoinOutcome::Joined);
        }

        let outcome = match room.add_member(player_id) {
            Ok(outcome) => outcome,
            Err(err) => {
                debug!(player_id, room_id, error = ?err, "join refused");
                self.notifier.notify(
                    &[player_id],
                    &ServerEvent::RoomFull {
                        room_id: room_id.to_string(),
                    },
                );
                return Err(err);
            }
        };

        let display_name = {
            let mut session = lock_session(&session);
            session.room_id = Some(room.id.clone());
            session.display_name.clone()
        };
        info!(player_id, room_id, "player joined room");

        self.notifier.notify(
            &[player_id],
            &ServerEvent::RoomJoined {
                room: self.room_snapshot(&room),
            },
        );
        let others: Vec<PlayerId> = room
            .members()
            .iter()
            .copied()
            .filter(|id| *id != player_id)
            .collect();
        self.notifier.notify(
            &others,
            &ServerEvent::PlayerJoinedRoom {
                room_id: room.id.clone(),
                player_id,
                display_name,
            },
        );

        if outcome == JoinOutcome::Started {
            self.start_match(&room);
        }
        Ok(outcome)
    }

    fn start_match(&self, room: &Room) {
        for player_id in room.members() {
            if let Some(session) = self.registry.player(*player_id) {
                lock_session(&session).game = Some(GameState::new(&mut rand::thread_rng()));
            }
        }
        info!(room_id = %room.id, players = room.members().len(), "match started");
        self.notifier.notify(
            room.members(),
            &ServerEvent::GameStarted {
                room: self.room_snapshot(room),
            },
        );
        self.broadcast_updates(room, room.members());

        if let Some(tick) = self.settings.gravity_tick {
            self.spawn_gravity(room.id.clone(), tick);
        }
    }

    pub async fn leave_room(&self, player_id: PlayerId) {
        if let Some(session) = self.registry.player(player_id) {
            self.depart(player_id, &session).await;
        }
    }

    /// Drops the session and releases its room slot as if the player topped out.
    pub async fn disconnect(&self, player_id: PlayerId) {
        let Some(session) = self.registry.remove_player(player_id) else {
            return;
        };
        self.depart(player_id, &session).await;
        info!(player_id, "player disconnected");
    }

    async fn depart(&self, player_id: PlayerId, session: &SharedSession) {
        let (room_id, display_name) = {
            let session = lock_session(session);
            (session.room_id.clone(), session.display_name.clone())
        };
        let Some(room_id) = room_id else {
            return;
        };
        let Some(shared) = self.registry.room(&room_id) else {
            lock_session(session).leave_room();
            return;
        };
        let mut room = shared.lock().await;
        let forfeits = room.is_member(player_id)
            && room.status() == RoomStatus::Playing
            && room.mode.is_elimination();
        {
            let mut session = lock_session(session);
            // Leaving a live elimination match counts as topping out.
            if forfeits && session.is_alive() {
                session.losses += 1;
            }
            session.leave_room();
        }
        if !room.remove_member(player_id) {
            return;
        }

        let mut recipients = room.members().to_vec();
        recipients.push(player_id);
        self.notifier.notify(
            &recipients,
            &ServerEvent::PlayerLeft {
                player_id,
                display_name,
            },
        );

        if room.is_empty() {
            self.registry.remove_room(&room_id);
            self.scheduler.cancel_room(&room_id);
            info!(%room_id, "room removed");
            return;
        }
        self.check_winner(&mut room);
    }

    pub async fn set_ready(&self, player_id: PlayerId, ready: bool) {
        let Ok((shared, session)) = self.resolve(player_id) else {
            return;
        };
        let room = shared.lock().await;
        if !room.is_member(player_id) {
            return;
        }
        lock_session(&session).ready = ready;
        self.notifier
            .notify(room.members(), &ServerEvent::ReadyChanged { player_id, ready });
    }

    pub async fn apply_move(&self, player_id: PlayerId, direction: Direction) -> bool {
        self.apply_piece_action(player_id, PieceAction::Move(direction))
            .await
    }

    pub async fn apply_rotate(&self, player_id: PlayerId) -> bool {
        self.apply_piece_action(player_id, PieceAction::Rotate).await
    }

    /// Moves down one row, or locks the piece if it is already resting.
    pub async fn apply_soft_drop(&self, player_id: PlayerId) -> bool {
        self.apply_piece_action(player_id, PieceAction::SoftDrop)
            .await
    }

    pub async fn apply_hard_drop(&self, player_id: PlayerId) -> bool {
        self.apply_piece_action(player_id, PieceAction::HardDrop)
            .await
    }

    async fn apply_piece_action(&self, player_id: PlayerId, action: PieceAction) -> bool {
        match self.try_piece_action(player_id, action).await {
            Ok(()) => true,
            Err(err) => {
                debug!(player_id, ?action, error = ?err, "action rejected");
                false
            }
        }
    }

    async fn try_piece_action(
        &self,
        player_id: PlayerId,
        action: PieceAction,
    ) -> Result<(), ActionError> {
        let (shared, session) = self.resolve(player_id)?;
        let mut room = shared.lock().await;
        ensure_playing(&room, player_id)?;

        let lock = {
            let mut session = lock_session(&session);
            let game = active_game(&mut session)?;
            match action {
                PieceAction::Move(direction) => {
                    if !game.try_move(direction) {
                        return Err(ActionError::IllegalPlacement);
                    }
                    None
                }
                PieceAction::Rotate => {
                    if !game.try_rotate() {
                        return Err(ActionError::IllegalPlacement);
                    }
                    None
                }
                PieceAction::SoftDrop => {
                    if game.soft_drop() {
                        None
                    } else {
                        Some(game.lock_piece())
                    }
                }
                PieceAction::HardDrop => Some(game.hard_drop()),
            }
        };

        match lock {
            Some(lock) => self.settle(&mut room, player_id, &session, lock),
            None => self.broadcast_updates(&room, &[player_id]),
        }
        Ok(())
    }

    /// Post-lock resolution: garbage, power-up award, next piece, top-out check, then
    /// one update per affected player.
    fn settle(&self, room: &mut Room, player_id: PlayerId, session: &SharedSession, lock: Lock) {
        let mut affected = vec![player_id];

        if room.mode.sends_garbage() && lock.lines_cleared > 1 {
            let rows = (lock.lines_cleared - 1) as usize;
            for opponent in room.members().iter().copied().filter(|id| *id != player_id) {
                let Some(opponent_session) = self.registry.player(opponent) else {
                    continue;
                };
                let mut opponent_session = lock_session(&opponent_session);
                if let Some(game) = opponent_session.game.as_mut().filter(|g| g.alive) {
                    game.board.inject_garbage(rows, &mut rand::thread_rng());
                    affected.push(opponent);
                }
            }
            debug!(player_id, room_id = %room.id, rows, "garbage sent");
        }

        let still_alive = {
            let mut session = lock_session(session);
            let Some(game) = session.game.as_mut() else {
                return;
            };
            let mut rng = rand::thread_rng();
            if lock.lines_cleared >= 2 {
                if let Some(kind) = game.award_power_up(&mut rng) {
                    debug!(player_id, ?kind, "power-up awarded");
                }
            }
            game.spawn_next(&mut rng)
        };

        self.broadcast_updates(room, &affected);

        if !still_alive {
            info!(player_id, room_id = %room.id, "player topped out");
            self.check_winner(room);
        }
    }

    /// Ends an elimination match when at most one member is alive. One-shot per room.
    fn check_winner(&self, room: &mut Room) {
        let alive: Vec<PlayerId> = room
            .members()
            .iter()
            .copied()
            .filter(|id| {
                self.registry
                    .player(*id)
                    .is_some_and(|session| lock_session(&session).is_alive())
            })
            .collect();
        let Some(over) = room.conclude(&alive) else {
            return;
        };

        for member in room.members() {
            let Some(session) = self.registry.player(*member) else {
                continue;
            };
            let mut session = lock_session(&session);
            if over.winner == Some(*member) {
                session.wins += 1;
            } else {
                session.losses += 1;
            }
        }
        self.scheduler.cancel_room(&room.id);
        info!(room_id = %room.id, winner = ?over.winner, "match over");
        self.notifier.notify(
            room.members(),
            &ServerEvent::GameOver {
                room_id: room.id.clone(),
                winner: over.winner,
            },
        );
    }

    /// Spends a held power-up. Not holding it is a silent no-op.
    pub async fn apply_power_up(
        &self,
        player_id: PlayerId,
        kind: PowerUpKind,
        target: Option<PlayerId>,
    ) -> bool {
        match self.try_power_up(player_id, kind, target).await {
            Ok(()) => true,
            Err(err) => {
                debug!(player_id, ?kind, error = ?err, "power-up rejected");
                false
            }
        }
    }

    async fn try_power_up(
        &self,
        player_id: PlayerId,
        kind: PowerUpKind,
        target: Option<PlayerId>,
    ) -> Result<(), ActionError> {
        let (shared, session) = self.resolve(player_id)?;
        let room = shared.lock().await;
        ensure_playing(&room, player_id)?;

        {
            let mut session = lock_session(&session);
            let game = active_game(&mut session)?;
            if !game.power_ups.take(kind) {
                return Err(ActionError::PowerUpNotHeld);
            }
            match kind {
                PowerUpKind::ClearLines => game.board.clear_bottom_rows(POWER_UP_CLEARED_ROWS),
                PowerUpKind::Shield => game.shields += 1,
                PowerUpKind::SlowOpponent | PowerUpKind::AddGarbage => {}
            }
        }

        let mut affected = vec![player_id];
        let target_hit = match kind {
            PowerUpKind::SlowOpponent | PowerUpKind::AddGarbage => target
                .filter(|id| room.is_member(*id))
                .filter(|id| self.hit_target(*id, kind)),
            PowerUpKind::ClearLines | PowerUpKind::Shield => None,
        };
        if let Some(target_id) = target_hit {
            if target_id != player_id {
                affected.push(target_id);
            }
            if kind == PowerUpKind::SlowOpponent {
                self.schedule_slow_expiry(room.id.clone(), target_id);
            }
        }

        self.notifier.notify(
            room.members(),
            &ServerEvent::PowerUpUsed {
                player_id,
                kind,
                target,
            },
        );
        self.broadcast_updates(&room, &affected);
        Ok(())
    }

    fn hit_target(&self, target_id: PlayerId, kind: PowerUpKind) -> bool {
        let Some(session) = self.registry.player(target_id) else {
            return false;
        };
        let mut session = lock_session(&session);
        let Some(game) = session.game.as_mut() else {
            return false;
        };
        match kind {
            PowerUpKind::SlowOpponent => game.slowed = true,
            PowerUpKind::AddGarbage => game
                .board
                .inject_garbage(POWER_UP_GARBAGE_ROWS, &mut rand::thread_rng()),
            PowerUpKind::ClearLines | PowerUpKind::Shield => return false,
        }
        true
    }

    fn schedule_slow_expiry(&self, room_id: RoomId, player_id: PlayerId) {
        let key = TaskKey::Effect {
            room_id: room_id.clone(),
            player_id,
            kind: PowerUpKind::SlowOpponent,
        };
        let delay = self.settings.slow_duration;
        let this = self.clone();
        self.scheduler.schedule(key, async move {
            tokio::time::sleep(delay).await;
            this.expire_slow(&room_id, player_id).await;
        });
    }

    async fn expire_slow(&self, room_id: &str, player_id: PlayerId) {
        let Some(shared) = self.registry.room(room_id) else {
            return;
        };
        let room = shared.lock().await;
        if !room.is_member(player_id) {
            return;
        }
        let Some(session) = self.registry.player(player_id) else {
            return;
        };
        let cleared = {
            let mut session = lock_session(&session);
            match session.game.as_mut() {
                Some(game) if game.slowed => {
                    game.slowed = false;
                    true
                }
                _ => false,
            }
        };
        if cleared {
            debug!(player_id, room_id, "slow effect expired");
            self.broadcast_updates(&room, &[player_id]);
        }
    }

    fn spawn_gravity(&self, room_id: RoomId, tick: Duration) {
        let key = TaskKey::Gravity {
            room_id: room_id.clone(),
        };
        let this = self.clone();
        self.scheduler.schedule(key, async move {
            let mut interval = tokio::time::interval(tick);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                if !this.tick_room(&room_id, tick).await {
                    break;
                }
            }
            debug!(%room_id, "gravity ticker stopped");
        });
    }

    /// Advances gravity for every alive member. Returns false once the room is gone, no
    /// longer playing, or has nobody left alive.
    pub async fn tick_room(&self, room_id: &str, elapsed: Duration) -> bool {
        let Some(shared) = self.registry.room(room_id) else {
            return false;
        };
        let mut room = shared.lock().await;
        let members = room.members().to_vec();
        for player_id in members {
            if room.status() != RoomStatus::Playing {
                break;
            }
            let Some(session) = self.registry.player(player_id) else {
                continue;
            };
            let landed = {
                let mut session = lock_session(&session);
                let Some(game) = session.game.as_mut().filter(|g| g.alive) else {
                    continue;
                };
                if !game.advance_fall(elapsed) {
                    continue;
                }
                if game.step_down() {
                    None
                } else {
                    Some(game.lock_piece())
                }
            };
            match landed {
                Some(lock) => self.settle(&mut room, player_id, &session, lock),
                None => self.broadcast_updates(&room, &[player_id]),
            }
        }
        room.status() == RoomStatus::Playing
            && room.members().iter().any(|id| {
                self.registry
                    .player(*id)
                    .is_some_and(|session| lock_session(&session).is_alive())
            })
    }

    /// Snapshots of all public rooms, ordered by id.
    pub async fn public_rooms(&self) -> Vec<RoomSnapshot> {
        let mut snapshots = Vec::new();
        for shared in self.registry.rooms() {
            let room = shared.lock().await;
            if room.is_public() {
                snapshots.push(self.room_snapshot(&room));
            }
        }
        snapshots.sort_by(|a, b| a.id.cmp(&b.id));
        snapshots
    }

    fn resolve(&self, player_id: PlayerId) -> Result<(SharedRoom, SharedSession), ActionError> {
        let session = self
            .registry
            .player(player_id)
            .ok_or(ActionError::UnknownPlayer)?;
        let room_id = lock_session(&session)
            .room_id
            .clone()
            .ok_or(ActionError::NotInRoom)?;
        let room = self
            .registry
            .room(&room_id)
            .ok_or(ActionError::UnknownRoom)?;
        Ok((room, session))
    }

    fn room_snapshot(&self, room: &Room) -> RoomSnapshot {
        let players = room
            .members()
            .iter()
            .filter_map(|id| self.registry.player(*id))
            .map(|session| {
                let session = lock_session(&session);
                PlayerSummary {
                    id: session.id,
                    display_name: session.display_name.clone(),
                    ready: session.ready,
                    wins: session.wins,
                    losses: session.losses,
                }
            })
            .collect();
        RoomSnapshot {
            id: room.id.clone(),
            name: room.name.clone(),
            capacity: room.capacity,
            visibility: room.visibility,
            mode: room.mode,
            status: room.status(),
            players,
        }
    }

    /// One `GameUpdate` per listed player, sent to the whole room.
    fn broadcast_updates(&self, room: &Room, players: &[PlayerId]) {
        for player_id in players {
            let Some(session) = self.registry.player(*player_id) else {
                continue;
            };
            let snapshot = match lock_session(&session).game.as_ref() {
                Some(game) => GameSnapshot::from(game),
                None => continue,
            };
            self.notifier.notify(
                room.members(),
                &ServerEvent::GameUpdate {
                    player_id: *player_id,
                    state: snapshot,
                },
            );
        }
    }
}

fn ensure_playing(room: &Room, player_id: PlayerId) -> Result<(), ActionError> {
    if !room.is_member(player_id) {
        return Err(ActionError::NotInRoom);
    }
    if room.status() != RoomStatus::Playing {
        return Err(ActionError::RoomNotPlaying);
    }
    Ok(())
}

fn active_game(session: &mut PlayerSession) -> Result<&mut GameState, ActionError> {
    session
        .game
        .as_mut()
        .filter(|game| game.alive)
        .ok_or(ActionError::NoActiveGame)
}
