//! The serialization domain.
//!
//! One actor task owns the [`Application`] (and the stats store) outright;
//! every mutation of game state happens by sending a command into its queue
//! and awaiting the reply. Commands are processed strictly one at a time in
//! FIFO order, so transport handlers running on any number of worker threads
//! can never interleave inside a tick. The auto ticker posts into the same
//! queue.

use tokio::sync::{mpsc, oneshot};

use doghouse_model::map::{Map, MapId};

use crate::app::{Application, GameStateView, JoinInfo, MoveCommand, PlayerListView, MAX_RECORDS_LIMIT};
use crate::registry::{RetiredPlayer, Token};
use crate::stats::{LeaderboardRow, PlayerStatsStore};
use crate::ticker;
use crate::AppError;

// Enough for a burst of transport handlers without unbounded growth.
const COMMAND_QUEUE_DEPTH: usize = 256;

enum Command {
    Join {
        map_id: MapId,
        user_name: String,
        reply: oneshot::Sender<Result<JoinInfo, AppError>>,
    },
    Maps {
        reply: oneshot::Sender<Vec<Map>>,
    },
    Players {
        token: Token,
        reply: oneshot::Sender<Result<PlayerListView, AppError>>,
    },
    State {
        token: Token,
        reply: oneshot::Sender<Result<GameStateView, AppError>>,
    },
    Move {
        token: Token,
        command: MoveCommand,
        reply: oneshot::Sender<Result<(), AppError>>,
    },
    ManualTick {
        delta_ms: u64,
        reply: oneshot::Sender<Result<(), AppError>>,
    },
    AutoTick {
        delta_ms: u64,
    },
    Leaderboard {
        offset: u64,
        limit: u64,
        reply: oneshot::Sender<Result<Vec<LeaderboardRow>, AppError>>,
    },
    Save {
        reply: oneshot::Sender<Result<(), AppError>>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Cloneable front door to the serialization domain.
#[derive(Clone)]
pub struct GameHandle {
    tx: mpsc::Sender<Command>,
}

impl GameHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, AppError> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(build(reply)).await.map_err(|_| AppError::Stopped)?;
        rx.await.map_err(|_| AppError::Stopped)
    }

    pub async fn join(&self, map_id: MapId, user_name: String) -> Result<JoinInfo, AppError> {
        self.request(|reply| Command::Join { map_id, user_name, reply }).await?
    }

    pub async fn maps(&self) -> Result<Vec<Map>, AppError> {
        self.request(|reply| Command::Maps { reply }).await
    }

    pub async fn players(&self, token: Token) -> Result<PlayerListView, AppError> {
        self.request(|reply| Command::Players { token, reply }).await?
    }

    pub async fn state(&self, token: Token) -> Result<GameStateView, AppError> {
        self.request(|reply| Command::State { token, reply }).await?
    }

    pub async fn move_player(&self, token: Token, command: MoveCommand) -> Result<(), AppError> {
        self.request(|reply| Command::Move { token, command, reply }).await?
    }

    /// Transport-requested tick; refused while the auto ticker runs.
    pub async fn manual_tick(&self, delta_ms: u64) -> Result<(), AppError> {
        self.request(|reply| Command::ManualTick { delta_ms, reply }).await?
    }

    /// Ticker-only entry point: no reply, errors are handled in the domain.
    pub async fn auto_tick(&self, delta_ms: u64) -> Result<(), AppError> {
        self.tx
            .send(Command::AutoTick { delta_ms })
            .await
            .map_err(|_| AppError::Stopped)
    }

    /// Leaderboard page. `limit` 0 means the cap; past the cap is refused.
    pub async fn leaderboard(&self, offset: u64, limit: u64) -> Result<Vec<LeaderboardRow>, AppError> {
        self.request(|reply| Command::Leaderboard { offset, limit, reply }).await?
    }

    pub async fn save(&self) -> Result<(), AppError> {
        self.request(|reply| Command::Save { reply }).await?
    }

    /// Stop the domain after one final snapshot. Idempotent from the caller's
    /// point of view: a second call finds the domain gone and returns.
    pub async fn shutdown(&self) {
        let _ = self.request(|reply| Command::Shutdown { reply }).await;
    }
}

// ---------------------------------------------------------------------------
// Domain task
// ---------------------------------------------------------------------------

/// Spawn the serialization domain around `app`. With a tick period the auto
/// ticker is started as well and manual ticks are refused from then on.
pub fn spawn(
    mut app: Application,
    store: Option<PlayerStatsStore>,
    auto_tick_period_ms: Option<u64>,
) -> GameHandle {
    let (tx, mut rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
    let handle = GameHandle { tx };

    if let Some(period_ms) = auto_tick_period_ms {
        app.set_auto_ticking(true);
        let _ = ticker::spawn(period_ms, handle.clone());
        tracing::info!(period_ms, "auto ticker enabled");
    }

    tokio::spawn(async move {
        while let Some(command) = rx.recv().await {
            match command {
                Command::Join { map_id, user_name, reply } => {
                    let _ = reply.send(app.join_game(&map_id, &user_name));
                }
                Command::Maps { reply } => {
                    let _ = reply.send(app.maps().to_vec());
                }
                Command::Players { token, reply } => {
                    let _ = reply.send(app.players_visible_to(&token));
                }
                Command::State { token, reply } => {
                    let _ = reply.send(app.game_state(&token));
                }
                Command::Move { token, command, reply } => {
                    let _ = reply.send(app.move_player(&token, command));
                }
                Command::ManualTick { delta_ms, reply } => {
                    match app.manual_tick(delta_ms) {
                        Ok(retired) => {
                            persist_retired(store.as_ref(), &retired).await;
                            let _ = reply.send(Ok(()));
                        }
                        Err(e) => {
                            let _ = reply.send(Err(e));
                        }
                    }
                }
                Command::AutoTick { delta_ms } => {
                    let retired = app.tick(delta_ms);
                    persist_retired(store.as_ref(), &retired).await;
                }
                Command::Leaderboard { offset, limit, reply } => {
                    let _ = reply.send(leaderboard(store.as_ref(), offset, limit).await);
                }
                Command::Save { reply } => {
                    let _ = reply.send(app.save_state());
                }
                Command::Shutdown { reply } => {
                    if let Err(e) = app.save_state() {
                        tracing::error!(error = %e, "final save failed");
                    }
                    let _ = reply.send(());
                    break;
                }
            }
        }
        tracing::info!("serialization domain stopped");
    });

    handle
}

/// Retirement drainage: one unit of work per batch; failures are logged and
/// swallowed so the simulation keeps ticking.
async fn persist_retired(store: Option<&PlayerStatsStore>, retired: &[RetiredPlayer]) {
    if retired.is_empty() {
        return;
    }
    match store {
        Some(store) => {
            if let Err(e) = store.save_retired(retired).await {
                tracing::error!(error = %e, count = retired.len(), "failed to persist retired players");
            }
        }
        None => {
            tracing::warn!(count = retired.len(), "no stats store, dropping retirement records");
        }
    }
}

async fn leaderboard(
    store: Option<&PlayerStatsStore>,
    offset: u64,
    limit: u64,
) -> Result<Vec<LeaderboardRow>, AppError> {
    let limit = match limit {
        0 => MAX_RECORDS_LIMIT,
        l if l > MAX_RECORDS_LIMIT => {
            return Err(AppError::InvalidArgument {
                reason: format!("maxItems must not exceed {MAX_RECORDS_LIMIT}"),
            })
        }
        l => l,
    };
    let store = store.ok_or_else(|| AppError::Internal {
        reason: "stats store is not configured".into(),
    })?;
    Ok(store.list_top(offset, limit).await?)
}
