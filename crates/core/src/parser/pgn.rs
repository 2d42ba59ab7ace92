//! PGN file parsing functionality

use pgn_reader::{RawTag, SanPlus, Skip, Visitor};
use shakmaty::{Chess, Position};
use std::fs;
use std::io::Cursor;
use std::ops::ControlFlow;
use std::path::Path;

use crate::error::{Error, Result};
use crate::notation::move_to_uci;
use crate::position::load_fen;

/// Represents a parsed chess game
#[derive(Debug, Clone)]
pub struct PgnGame {
    pub event: Option<String>,
    pub white: Option<String>,
    pub black: Option<String>,
    pub result: Option<String>,
    /// Start position from the `[FEN]` tag, if the game did not begin from
    /// the standard setup.
    pub start_fen: Option<String>,
    pub moves: Vec<String>,
    /// Last move played, in UCI.
    pub last_move: Option<String>,
    pub final_position: Chess,
}

impl PgnGame {
    pub fn move_count(&self) -> usize {
        self.moves.len()
    }

    pub fn summary(&self) -> String {
        let white = self.white.as_deref().unwrap_or("Unknown");
        let black = self.black.as_deref().unwrap_or("Unknown");
        let result = self.result.as_deref().unwrap_or("*");
        format!("{} vs {} - {}", white, black, result)
    }
}

#[derive(Default)]
struct GameTags {
    event: Option<String>,
    white: Option<String>,
    black: Option<String>,
    result: Option<String>,
    fen: Option<String>,
}

struct GameMoves {
    tags: GameTags,
    moves: Vec<String>,
    last_move: Option<String>,
    current_position: Chess,
    failure: Option<String>,
}

struct GameParser;

impl Visitor for GameParser {
    type Tags = GameTags;
    type Movetext = GameMoves;
    type Output = Option<PgnGame>;

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, Self::Tags> {
        ControlFlow::Continue(GameTags::default())
    }

    fn tag(
        &mut self,
        tags: &mut Self::Tags,
        name: &[u8],
        value: RawTag<'_>,
    ) -> ControlFlow<Self::Output> {
        let name_str = String::from_utf8_lossy(name);
        let value_str = value.decode_utf8_lossy().to_string();

        match name_str.as_ref() {
            "Event" => tags.event = Some(value_str),
            "White" => tags.white = Some(value_str),
            "Black" => tags.black = Some(value_str),
            "Result" => tags.result = Some(value_str),
            "FEN" => tags.fen = Some(value_str),
            _ => {}
        }

        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, tags: Self::Tags) -> ControlFlow<Self::Output, Self::Movetext> {
        let (current_position, failure) = match tags.fen.as_deref() {
            Some(fen) => match load_fen(fen) {
                Ok(pos) => (pos, None),
                Err(e) => (Chess::default(), Some(e.to_string())),
            },
            None => (Chess::default(), None),
        };

        ControlFlow::Continue(GameMoves {
            tags,
            moves: Vec::new(),
            last_move: None,
            current_position,
            failure,
        })
    }

    fn san(&mut self, movetext: &mut Self::Movetext, san: SanPlus) -> ControlFlow<Self::Output> {
        if movetext.failure.is_some() {
            return ControlFlow::Continue(());
        }

        movetext.moves.push(san.san.to_string());

        match san.san.to_move(&movetext.current_position) {
            Ok(m) => {
                let uci = move_to_uci(&m);
                match movetext.current_position.clone().play(m) {
                    Ok(new_pos) => {
                        movetext.current_position = new_pos;
                        movetext.last_move = Some(uci);
                    }
                    Err(e) => movetext.failure = Some(format!("{}: {}", san, e)),
                }
            }
            Err(e) => movetext.failure = Some(format!("{}: {}", san, e)),
        }

        ControlFlow::Continue(())
    }

    fn begin_variation(
        &mut self,
        _movetext: &mut Self::Movetext,
    ) -> ControlFlow<Self::Output, Skip> {
        ControlFlow::Continue(Skip(true))
    }

    fn end_game(&mut self, movetext: Self::Movetext) -> Self::Output {
        if let Some(reason) = movetext.failure {
            tracing::warn!(
                white = movetext.tags.white.as_deref().unwrap_or("?"),
                black = movetext.tags.black.as_deref().unwrap_or("?"),
                reason = %reason,
                "skipping unplayable game"
            );
            return None;
        }

        Some(PgnGame {
            event: movetext.tags.event,
            white: movetext.tags.white,
            black: movetext.tags.black,
            result: movetext.tags.result,
            start_fen: movetext.tags.fen,
            moves: movetext.moves,
            last_move: movetext.last_move,
            final_position: movetext.current_position,
        })
    }
}

pub fn parse_pgn_file<P: AsRef<Path>>(path: P) -> Result<Vec<PgnGame>> {
    let contents = fs::read_to_string(path)?;
    parse_pgn_string(&contents)
}

/// Parse every game in `pgn`. Games whose moves cannot be replayed are
/// skipped; an input with no playable game at all is an error.
pub fn parse_pgn_string(pgn: &str) -> Result<Vec<PgnGame>> {
    let mut parser = GameParser;
    let mut games: Vec<PgnGame> = Vec::new();

    let cursor = Cursor::new(pgn.as_bytes());
    let mut reader = pgn_reader::Reader::new(cursor);

    loop {
        match reader.read_game(&mut parser) {
            Ok(Some(maybe_game)) => {
                if let Some(game) = maybe_game {
                    games.push(game);
                }
            }
            Ok(None) => break,
            Err(e) => return Err(Error::Pgn(e.to_string())),
        }
    }

    if games.is_empty() {
        Err(Error::Pgn("no playable games found".to_string()))
    } else {
        tracing::debug!(games = games.len(), "parsed PGN");
        Ok(games)
    }
}
