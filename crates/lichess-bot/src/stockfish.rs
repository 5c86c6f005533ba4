//! Stockfish engine wrapper using UCI protocol (async I/O)

use chess_core::GamePosition;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use tracing::debug;

use crate::error::BotError;

/// Engine reply to a `go` command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineMove {
    /// Best move in UCI notation
    pub best_move: String,
    /// Centipawn score (side to move)
    pub cp: Option<i32>,
    /// Mate in N moves (positive = side to move mates)
    pub mate: Option<i32>,
}

/// Stockfish engine instance
pub struct StockfishEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl StockfishEngine {
    /// Spawn a new Stockfish process, initialize UCI and set its skill level
    pub async fn new(path: &str, skill_level: u8) -> Result<Self, BotError> {
        let mut process = Command::new(path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| BotError::Stockfish(format!("Failed to spawn Stockfish: {e}")))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| BotError::Stockfish("Stockfish stdin unavailable".into()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| BotError::Stockfish("Stockfish stdout unavailable".into()))?;

        let mut engine = Self {
            process,
            stdin,
            stdout: BufReader::new(stdout),
        };

        engine.send("uci").await?;
        engine.wait_for("uciok").await?;

        engine.send("setoption name Threads value 1").await?;
        engine
            .send(&format!("setoption name Skill Level value {skill_level}"))
            .await?;
        engine.send("isready").await?;
        engine.wait_for("readyok").await?;

        Ok(engine)
    }

    /// Send a command to Stockfish
    async fn send(&mut self, cmd: &str) -> Result<(), BotError> {
        debug!(cmd, "SF <");
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| BotError::Stockfish(format!("Failed to write to Stockfish: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| BotError::Stockfish(format!("Failed to flush stdin: {e}")))?;
        Ok(())
    }

    async fn read_line(&mut self, line: &mut String) -> Result<(), BotError> {
        line.clear();
        let read = self
            .stdout
            .read_line(line)
            .await
            .map_err(|e| BotError::Stockfish(format!("Failed to read from Stockfish: {e}")))?;
        if read == 0 {
            return Err(BotError::Stockfish("Stockfish exited unexpectedly".into()));
        }
        Ok(())
    }

    /// Wait for a specific response line
    async fn wait_for(&mut self, expected: &str) -> Result<(), BotError> {
        let mut line = String::new();
        loop {
            self.read_line(&mut line).await?;
            let trimmed = line.trim();
            debug!(line = trimmed, "SF >");
            if trimmed == expected {
                return Ok(());
            }
        }
    }

    /// Search the game's current position for `movetime_ms` milliseconds
    pub async fn best_move(
        &mut self,
        position: &GamePosition,
        movetime_ms: u64,
    ) -> Result<EngineMove, BotError> {
        self.send(&position_command(position)).await?;
        self.send(&format!("go movetime {movetime_ms}")).await?;

        let mut cp = None;
        let mut mate = None;
        let mut line = String::new();
        loop {
            self.read_line(&mut line).await?;
            let trimmed = line.trim();

            if trimmed.starts_with("info") && trimmed.contains(" pv ") {
                if let Some(score) = parse_cp(trimmed) {
                    cp = Some(score);
                    mate = None;
                }
                if let Some(score) = parse_mate(trimmed) {
                    mate = Some(score);
                    cp = None;
                }
            } else if trimmed.starts_with("bestmove") {
                let best_move = parse_bestmove(trimmed).ok_or_else(|| {
                    BotError::Stockfish(format!("No move in engine reply '{trimmed}'"))
                })?;
                return Ok(EngineMove {
                    best_move,
                    cp,
                    mate,
                });
            }
        }
    }

    /// Send quit command and wait for process to exit
    pub async fn quit(&mut self) {
        let _ = self.send("quit").await;
        let _ = self.process.wait().await;
    }
}

/// UCI `position` command replaying the moves of record, so the engine sees
/// the same repetition history as the game.
fn position_command(position: &GamePosition) -> String {
    let mut cmd = match position.initial_fen() {
        Some(fen) => format!("position fen {fen}"),
        None => "position startpos".to_string(),
    };
    let moves = position.moves_of_record();
    if !moves.is_empty() {
        cmd.push_str(" moves ");
        cmd.push_str(&moves.join(" "));
    }
    cmd
}

/// Parse centipawn score from info line
fn parse_cp(line: &str) -> Option<i32> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == "cp" && i + 1 < parts.len() {
            return parts[i + 1].parse().ok();
        }
    }
    None
}

/// Parse mate score from info line
fn parse_mate(line: &str) -> Option<i32> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == "mate" && i + 1 < parts.len() {
            return parts[i + 1].parse().ok();
        }
    }
    None
}

/// `bestmove (none)` is what Stockfish answers in a finished position.
fn parse_bestmove(line: &str) -> Option<String> {
    match line.split_whitespace().nth(1) {
        Some("(none)") | None => None,
        Some(mv) => Some(mv.to_string()),
    }
}
