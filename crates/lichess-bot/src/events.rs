//! Lichess Bot API event models (ndjson lines of the event and game streams).

use serde::Deserialize;

/// An event of the account-wide incoming event stream.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum IncomingEvent {
    Challenge { challenge: ChallengeInfo },
    GameStart { game: GameInfo },
    GameFinish { game: GameInfo },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChallengeInfo {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GameInfo {
    pub id: String,
}

/// An event of a single game's state stream.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GameEvent {
    /// First event of the stream: players, start position and current state.
    GameFull(GameFull),
    GameState(GameState),
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameFull {
    pub id: String,
    pub white: Player,
    pub black: Player,
    /// `startpos` or a FEN.
    #[serde(default = "startpos")]
    pub initial_fen: String,
    pub state: GameState,
}

/// Lichess AI opponents carry no account id.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Player {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GameState {
    /// Space-delimited UCI moves of the whole game so far.
    #[serde(default)]
    pub moves: String,
    pub status: GameStatus,
    #[serde(default)]
    pub winner: Option<String>,
}

impl GameState {
    pub fn move_list(&self) -> Vec<&str> {
        self.moves.split_whitespace().collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameStatus {
    Created,
    Started,
    Aborted,
    Mate,
    Resign,
    Stalemate,
    Timeout,
    Draw,
    Outoftime,
    Cheat,
    NoStart,
    UnknownFinish,
    VariantEnd,
    #[serde(other)]
    Unknown,
}

impl GameStatus {
    pub fn is_in_progress(self) -> bool {
        matches!(self, GameStatus::Created | GameStatus::Started)
    }
}

fn startpos() -> String {
    "startpos".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_challenge_and_game_start() {
        let challenge: IncomingEvent = serde_json::from_str(
            r#"{"type":"challenge","challenge":{"id":"7pGLxJ4F","status":"created","rated":true}}"#,
        )
        .unwrap();
        assert_eq!(
            challenge,
            IncomingEvent::Challenge {
                challenge: ChallengeInfo { id: "7pGLxJ4F".into() }
            }
        );

        let start: IncomingEvent = serde_json::from_str(
            r#"{"type":"gameStart","game":{"id":"1lsvP62l","gameId":"1lsvP62l","color":"white"}}"#,
        )
        .unwrap();
        assert_eq!(
            start,
            IncomingEvent::GameStart {
                game: GameInfo { id: "1lsvP62l".into() }
            }
        );

        let other: IncomingEvent =
            serde_json::from_str(r#"{"type":"challengeDeclined","challenge":{"id":"x"}}"#).unwrap();
        assert_eq!(other, IncomingEvent::Other);
    }

    #[test]
    fn test_parse_game_full() {
        let line = r#"{"type":"gameFull","id":"5IrD6Gzz","rated":false,
            "white":{"id":"somebot","name":"SomeBot","title":"BOT"},
            "black":{"aiLevel":3},
            "initialFen":"startpos",
            "state":{"type":"gameState","moves":"e2e4 c7c5","wtime":900000,"btime":900000,"status":"started"}}"#;
        let event: GameEvent = serde_json::from_str(line).unwrap();
        let GameEvent::GameFull(full) = event else {
            panic!("expected gameFull");
        };
        assert_eq!(full.white.id.as_deref(), Some("somebot"));
        assert_eq!(full.black.id, None);
        assert_eq!(full.initial_fen, "startpos");
        assert_eq!(full.state.move_list(), vec!["e2e4", "c7c5"]);
        assert!(full.state.status.is_in_progress());
    }

    #[test]
    fn test_parse_terminal_state_and_chat() {
        let state: GameEvent = serde_json::from_str(
            r#"{"type":"gameState","moves":"f2f3 e7e5 g2g4 d8h4","status":"mate","winner":"black"}"#,
        )
        .unwrap();
        let GameEvent::GameState(state) = state else {
            panic!("expected gameState");
        };
        assert_eq!(state.status, GameStatus::Mate);
        assert!(!state.status.is_in_progress());
        assert_eq!(state.winner.as_deref(), Some("black"));

        let chat: GameEvent = serde_json::from_str(
            r#"{"type":"chatLine","room":"player","username":"x","text":"gg"}"#,
        )
        .unwrap();
        assert_eq!(chat, GameEvent::Other);
    }

    #[test]
    fn test_unknown_status_is_terminal() {
        let state: GameState =
            serde_json::from_str(r#"{"moves":"","status":"insufficientMaterialClaim"}"#).unwrap();
        assert_eq!(state.status, GameStatus::Unknown);
        assert!(!state.status.is_in_progress());
    }
}
