//! Player registry: bearer tokens and the indices behind them.
//!
//! The registry never holds references into the game tree. A token resolves
//! to a `(map id, dog id)` pair and lookups go back through the game, which
//! keeps ownership a straight line: game owns sessions, sessions own dogs,
//! the registry owns nothing but ids.

use std::collections::HashMap;
use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use doghouse_model::dog::Dog;
use doghouse_model::map::{Map, MapId};
use doghouse_model::session::Session;

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// Bearer credential of one live player: 128 bits of OS entropy rendered as
/// 32 lowercase hex characters. A nominal wrapper so a token can never be
/// mixed up with an ordinary string at a call site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    /// Draw a fresh token from OS entropy.
    pub fn random() -> Self {
        let hi = OsRng.next_u64();
        let lo = OsRng.next_u64();
        Self(format!("{hi:016x}{lo:016x}"))
    }

    /// Accept a client-supplied string as a token if it has the right shape:
    /// exactly 32 lowercase hex characters.
    pub fn parse(raw: &str) -> Option<Self> {
        let well_formed =
            raw.len() == 32 && raw.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        well_formed.then(|| Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Where a token's player lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRef {
    pub map_id: MapId,
    pub dog_id: u64,
}

/// Final stats of a player drained at retirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetiredPlayer {
    pub dog_id: u64,
    pub name: String,
    pub score: u64,
    pub play_time_ms: u64,
}

/// Token and name indices over live players.
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    token_to_player: HashMap<Token, PlayerRef>,
    by_map_and_name: HashMap<(MapId, String), Token>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `user_name` on the session, creating and spawning a dog.
    ///
    /// Joining with a `(map, name)` pair that is already live returns the
    /// existing token and dog untouched. Otherwise a token is generated (or
    /// `token_override` reused verbatim, as snapshot restore does) and the
    /// new dog is placed at a spawn point.
    pub fn join(
        &mut self,
        map: &Map,
        session: &mut Session,
        user_name: &str,
        randomize_spawn: bool,
        token_override: Option<Token>,
    ) -> (Token, u64) {
        let key = (map.id().clone(), user_name.to_owned());
        if let Some(token) = self.by_map_and_name.get(&key) {
            let dog_id = self.token_to_player[token].dog_id;
            return (token.clone(), dog_id);
        }

        let dog = Dog::new(user_name, map.bag_capacity());
        let dog_id = session.spawn_dog(map, dog, randomize_spawn);

        let token = token_override.unwrap_or_else(|| loop {
            let candidate = Token::random();
            // 128 bits make a collision all but impossible; regenerate anyway.
            if !self.token_to_player.contains_key(&candidate) {
                break candidate;
            }
        });
        self.token_to_player
            .insert(token.clone(), PlayerRef { map_id: map.id().clone(), dog_id });
        self.by_map_and_name.insert(key, token.clone());
        tracing::info!(map = %map.id(), name = user_name, dog = dog_id, "player joined");
        (token, dog_id)
    }

    pub fn find(&self, token: &Token) -> Option<&PlayerRef> {
        self.token_to_player.get(token)
    }

    pub fn token_for(&self, map_id: &MapId, user_name: &str) -> Option<&Token> {
        self.by_map_and_name.get(&(map_id.clone(), user_name.to_owned()))
    }

    /// All live registrations, in no particular order.
    pub fn players(&self) -> impl Iterator<Item = (&Token, &PlayerRef)> {
        self.token_to_player.iter()
    }

    pub fn player_count(&self) -> usize {
        self.token_to_player.len()
    }

    /// Point a token at a different dog id; used when snapshot restore
    /// rewrites a freshly joined dog with its recorded identity.
    pub fn rebind_dog_id(&mut self, token: &Token, dog_id: u64) {
        if let Some(player) = self.token_to_player.get_mut(token) {
            player.dog_id = dog_id;
        }
    }

    /// Remove every retired dog of `session` from the session and from all
    /// indices, returning their final stats. Scores and play time reflect the
    /// tick that flagged them.
    pub fn remove_retired(&mut self, session: &mut Session) -> Vec<RetiredPlayer> {
        let retired_ids: Vec<u64> =
            session.dogs().filter(|d| d.is_retired()).map(|d| d.id()).collect();

        let mut drained = Vec::with_capacity(retired_ids.len());
        for dog_id in retired_ids {
            let Some(dog) = session.remove_dog(dog_id) else {
                continue;
            };
            let key = (session.map_id().clone(), dog.name().to_owned());
            if let Some(token) = self.by_map_and_name.remove(&key) {
                self.token_to_player.remove(&token);
            }
            tracing::info!(
                map = %session.map_id(),
                dog = dog_id,
                name = dog.name(),
                score = dog.score(),
                "player retired"
            );
            drained.push(RetiredPlayer {
                dog_id,
                name: dog.name().to_owned(),
                score: dog.score(),
                play_time_ms: dog.game_time_ms(),
            });
        }
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_tokens_are_well_formed_and_distinct() {
        let a = Token::random();
        let b = Token::random();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
        assert!(Token::parse(a.as_str()).is_some());
    }

    #[test]
    fn parse_rejects_wrong_shapes() {
        assert!(Token::parse("").is_none());
        assert!(Token::parse("short").is_none());
        assert!(Token::parse(&"g".repeat(32)).is_none());
        assert!(Token::parse(&"A".repeat(32)).is_none());
        assert!(Token::parse(&"0".repeat(33)).is_none());
        assert!(Token::parse(&"0123456789abcdef".repeat(2)).is_some());
    }
}
