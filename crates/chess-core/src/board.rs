//! Board state machine: the only place a position is interpreted or changed.
//!
//! A [`Game`] is a position plus the keys of every position that led to it,
//! which is what threefold repetition needs. Games are values: [`Game::apply`]
//! returns a new game and never touches `self`.

use std::fmt;
use std::str::FromStr;

use shakmaty::fen::Fen;
use shakmaty::san::{San, SanPlus};
use shakmaty::zobrist::{Zobrist64, ZobristHash};
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, File, Move, Position, Role, Square};

use crate::error::BoardError;
use crate::side::Side;

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A move as a client names it: origin, destination, optional promotion.
/// Castling is written as the king's two-square step (`e1g1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoardMove {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Role>,
}

impl BoardMove {
    /// Build a move from wire fields such as `("e7", "e8", Some("q"))`.
    pub fn parse(from: &str, to: &str, promotion: Option<&str>) -> Result<Self, BoardError> {
        let from_sq = from
            .trim()
            .parse::<Square>()
            .map_err(|_| BoardError::InvalidSquare(from.to_string()))?;
        let to_sq = to
            .trim()
            .parse::<Square>()
            .map_err(|_| BoardError::InvalidSquare(to.to_string()))?;
        let promotion = match promotion.map(str::trim).filter(|p| !p.is_empty()) {
            Some(p) => Some(parse_promotion(p)?),
            None => None,
        };
        Ok(Self {
            from: from_sq,
            to: to_sq,
            promotion,
        })
    }

    /// The client-facing form of a rules-engine move. `None` only for drops,
    /// which standard chess never produces.
    pub fn from_move(mv: &Move) -> Option<Self> {
        match *mv {
            Move::Normal {
                from, to, promotion, ..
            } => Some(Self { from, to, promotion }),
            Move::EnPassant { from, to } => Some(Self {
                from,
                to,
                promotion: None,
            }),
            Move::Castle { king, rook } => {
                let file = if rook.file() > king.file() { File::G } else { File::C };
                Some(Self {
                    from: king,
                    to: Square::from_coords(file, king.rank()),
                    promotion: None,
                })
            }
            Move::Put { .. } => None,
        }
    }
}

fn parse_promotion(p: &str) -> Result<Role, BoardError> {
    let role = p
        .chars()
        .next()
        .map(|c| c.to_ascii_lowercase())
        .and_then(Role::from_char);
    match role {
        Some(r @ (Role::Knight | Role::Bishop | Role::Rook | Role::Queen)) => Ok(r),
        _ => Err(BoardError::InvalidPromotion(p.to_string())),
    }
}

impl fmt::Display for BoardMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(role) = self.promotion {
            write!(f, "{}", role.char())?;
        }
        Ok(())
    }
}

impl FromStr for BoardMove {
    type Err = BoardError;

    /// Parse long algebraic notation: `e2e4`, `e7e8q`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if !s.is_ascii() || !(s.len() == 4 || s.len() == 5) {
            return Err(BoardError::IllegalMove(s.to_string()));
        }
        let promotion = if s.len() == 5 { Some(&s[4..5]) } else { None };
        Self::parse(&s[0..2], &s[2..4], promotion)
    }
}

/// A move after it has been played, with everything the ledger records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayedMove {
    pub mv: BoardMove,
    /// SAN including the `+`/`#` suffix.
    pub san: String,
    pub piece: Role,
    pub captured: Option<Role>,
    pub color: Color,
}

impl PlayedMove {
    pub fn from_square(&self) -> String {
        self.mv.from.to_string()
    }

    pub fn to_square(&self) -> String {
        self.mv.to.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawReason {
    InsufficientMaterial,
    FiftyMoveRule,
    Repetition,
}

impl DrawReason {
    pub fn as_str(self) -> &'static str {
        match self {
            DrawReason::InsufficientMaterial => "insufficient_material",
            DrawReason::FiftyMoveRule => "fifty_move_rule",
            DrawReason::Repetition => "threefold_repetition",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalStatus {
    Ongoing,
    Checkmate { winner: Color },
    Stalemate,
    Draw(DrawReason),
}

impl TerminalStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TerminalStatus::Ongoing)
    }
}

/// Position identity for repetition: placement, side to move, castling
/// rights and a capturable en-passant square. Move counters are excluded.
pub(crate) fn position_key(pos: &Chess) -> Zobrist64 {
    pos.zobrist_hash(EnPassantMode::Legal)
}

/// Draw conditions other than stalemate. `history` ends with the key of
/// `pos` itself.
pub(crate) fn draw_reason(pos: &Chess, history: &[Zobrist64]) -> Option<DrawReason> {
    if pos.is_insufficient_material() {
        return Some(DrawReason::InsufficientMaterial);
    }
    if pos.halfmoves() >= 100 {
        return Some(DrawReason::FiftyMoveRule);
    }
    if is_threefold(pos, history) {
        return Some(DrawReason::Repetition);
    }
    None
}

fn is_threefold(pos: &Chess, history: &[Zobrist64]) -> bool {
    // Positions before the last capture or pawn move cannot recur.
    if pos.halfmoves() < 4 {
        return false;
    }
    let Some(current) = history.last() else {
        return false;
    };
    let window = (pos.halfmoves() as usize + 1).min(history.len());
    history[history.len() - window..]
        .iter()
        .filter(|key| *key == current)
        .count()
        >= 3
}

#[derive(Debug, Clone)]
pub struct Game {
    position: Chess,
    history: Vec<Zobrist64>,
}

impl Default for Game {
    fn default() -> Self {
        Self::from_position(Chess::default())
    }
}

impl Game {
    pub fn new() -> Self {
        Self::default()
    }

    fn from_position(position: Chess) -> Self {
        let history = vec![position_key(&position)];
        Self { position, history }
    }

    /// Start from an arbitrary FEN with no prior history.
    pub fn from_fen(fen: &str) -> Result<Self, BoardError> {
        let parsed: Fen = fen
            .trim()
            .parse()
            .map_err(|e| BoardError::InvalidFen(format!("{fen}: {e}")))?;
        let position: Chess = parsed
            .into_position(CastlingMode::Standard)
            .map_err(|e| BoardError::InvalidFen(format!("{fen}: {e}")))?;
        Ok(Self::from_position(position))
    }

    /// Rebuild a game, with its repetition history, from a start FEN and
    /// the SAN moves played since.
    pub fn replay<S: AsRef<str>>(start_fen: &str, sans: &[S]) -> Result<Self, BoardError> {
        let mut game = Self::from_fen(start_fen)?;
        for (ply, san) in sans.iter().enumerate() {
            let san = san.as_ref();
            let invalid = || BoardError::InvalidHistory {
                ply: ply + 1,
                san: san.to_string(),
            };
            let parsed: SanPlus = san.parse().map_err(|_| invalid())?;
            let mv = parsed.san.to_move(&game.position).map_err(|_| invalid())?;
            game = game.play_legal(mv).0;
        }
        Ok(game)
    }

    pub fn position(&self) -> &Chess {
        &self.position
    }

    pub(crate) fn history(&self) -> &[Zobrist64] {
        &self.history
    }

    pub fn turn(&self) -> Color {
        self.position.turn()
    }

    pub fn side_to_move(&self) -> Side {
        Side::from_color(self.position.turn())
    }

    pub fn is_check(&self) -> bool {
        self.position.is_check()
    }

    pub fn fen(&self) -> String {
        Fen::from_position(&self.position, EnPassantMode::Legal).to_string()
    }

    /// Every rule-legal move for the side to move.
    pub fn legal_moves(&self) -> Vec<BoardMove> {
        self.position
            .legal_moves()
            .iter()
            .filter_map(BoardMove::from_move)
            .collect()
    }

    pub fn is_legal(&self, mv: &BoardMove) -> bool {
        self.find_legal(mv).is_some()
    }

    /// A promotion piece sent with a move that does not promote is ignored;
    /// a move that does promote must name its piece.
    fn find_legal(&self, mv: &BoardMove) -> Option<Move> {
        self.position
            .legal_moves()
            .iter()
            .find(|m| {
                BoardMove::from_move(m).is_some_and(|legal| {
                    legal.from == mv.from
                        && legal.to == mv.to
                        && (legal.promotion.is_none() || legal.promotion == mv.promotion)
                })
            })
            .cloned()
    }

    /// Play `mv` if it is legal here. `self` is left untouched either way.
    pub fn apply(&self, mv: &BoardMove) -> Result<(Game, PlayedMove), BoardError> {
        let legal = self
            .find_legal(mv)
            .ok_or_else(|| BoardError::IllegalMove(mv.to_string()))?;
        Ok(self.play_legal(legal))
    }

    /// Play a move taken from this position's own legal move list.
    pub(crate) fn play_legal(&self, mv: Move) -> (Game, PlayedMove) {
        let color = self.position.turn();
        let san = San::from_move(&self.position, mv.clone()).to_string();
        let board_move = BoardMove::from_move(&mv).unwrap_or(BoardMove {
            from: mv.to(),
            to: mv.to(),
            promotion: None,
        });
        let piece = mv.role();
        let captured = mv.capture();

        let mut position = self.position.clone();
        position.play_unchecked(mv);

        let suffix = if position.is_checkmate() {
            "#"
        } else if position.is_check() {
            "+"
        } else {
            ""
        };

        let mut history = self.history.clone();
        history.push(position_key(&position));

        let played = PlayedMove {
            mv: board_move,
            san: format!("{san}{suffix}"),
            piece,
            captured,
            color,
        };
        (Game { position, history }, played)
    }

    pub fn terminal_status(&self) -> TerminalStatus {
        if self.position.legal_moves().is_empty() {
            return if self.position.is_check() {
                TerminalStatus::Checkmate {
                    winner: self.position.turn().other(),
                }
            } else {
                TerminalStatus::Stalemate
            };
        }
        match draw_reason(&self.position, &self.history) {
            Some(reason) => TerminalStatus::Draw(reason),
            None => TerminalStatus::Ongoing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MATE_IN_ONE: &str = "rnbqkbnr/ppppp2p/5p2/6p1/3PP3/8/PPP2PPP/RNBQKBNR w KQkq - 0 3";

    fn mv(s: &str) -> BoardMove {
        s.parse().unwrap()
    }

    fn play_all(game: &Game, moves: &[&str]) -> Game {
        moves
            .iter()
            .fold(game.clone(), |g, m| g.apply(&mv(m)).unwrap().0)
    }

    #[test]
    fn test_starting_position_has_twenty_moves() {
        let game = Game::new();
        assert_eq!(game.fen(), STARTING_FEN);
        assert_eq!(game.legal_moves().len(), 20);
        assert_eq!(game.terminal_status(), TerminalStatus::Ongoing);
    }

    #[test]
    fn test_every_legal_move_applies_and_flips_turn() {
        for fen in [
            STARTING_FEN,
            MATE_IN_ONE,
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2",
        ] {
            let game = Game::from_fen(fen).unwrap();
            for m in game.legal_moves() {
                let (next, played) = game.apply(&m).unwrap();
                assert_eq!(next.turn(), game.turn().other(), "{fen} {m}");
                assert_eq!(played.mv, m);
                assert_eq!(played.color, game.turn());
            }
        }
    }

    #[test]
    fn test_illegal_move_leaves_game_unchanged() {
        let game = Game::new();
        let before = game.fen();

        // Black piece on white's turn
        let err = game.apply(&mv("e7e5")).unwrap_err();
        assert!(matches!(err, BoardError::IllegalMove(_)));
        // Impossible geometry
        assert!(game.apply(&mv("e2e5")).is_err());
        // Empty square
        assert!(game.apply(&mv("e4e5")).is_err());

        assert_eq!(game.fen(), before);
    }

    #[test]
    fn test_moves_outside_legal_set_are_rejected() {
        let game = Game::from_fen(MATE_IN_ONE).unwrap();
        let legal = game.legal_moves();
        for from in (0..64).map(Square::new) {
            for to in (0..64).map(Square::new) {
                let candidate = BoardMove { from, to, promotion: None };
                if !legal.contains(&candidate) {
                    assert!(game.apply(&candidate).is_err(), "{candidate} accepted");
                }
            }
        }
    }

    #[test]
    fn test_castling_uses_king_destination() {
        let game = Game::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        assert!(game.is_legal(&mv("e1g1")));
        assert!(game.is_legal(&mv("e1c1")));

        let (next, played) = game.apply(&mv("e1g1")).unwrap();
        assert_eq!(played.san, "O-O");
        assert_eq!(played.piece, Role::King);
        assert!(next.fen().starts_with("r3k2r/8/8/8/8/8/8/R4RK1 b kq"));
    }

    #[test]
    fn test_en_passant_capture() {
        let game = Game::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2").unwrap();
        let (next, played) = game.apply(&mv("e5d6")).unwrap();
        assert_eq!(played.captured, Some(Role::Pawn));
        assert_eq!(played.san, "exd6");
        assert!(next.fen().starts_with("4k3/8/3P4/8/8/8/8/4K3 b"));
    }

    #[test]
    fn test_promotion_requires_piece() {
        let game = Game::from_fen("8/4P3/8/8/8/8/k7/4K3 w - - 0 1").unwrap();
        assert!(game.apply(&mv("e7e8")).is_err());

        let (next, played) = game.apply(&mv("e7e8q")).unwrap();
        assert!(played.san.starts_with("e8=Q"));
        assert!(next.fen().starts_with("4Q3/"));

        let (_, under) = game.apply(&mv("e7e8n")).unwrap();
        assert!(under.san.starts_with("e8=N"));
    }

    #[test]
    fn test_stray_promotion_piece_is_ignored() {
        let game = Game::new();
        let with_piece = BoardMove::parse("e2", "e4", Some("q")).unwrap();
        let (next, played) = game.apply(&with_piece).unwrap();
        assert_eq!(played.san, "e4");
        assert_eq!(played.mv, mv("e2e4"));
        assert_eq!(next.fen(), game.apply(&mv("e2e4")).unwrap().0.fen());

        // Castling with a piece attached still castles.
        let castle = Game::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let (_, played) = castle.apply(&mv("e1g1q")).unwrap();
        assert_eq!(played.san, "O-O");
    }

    #[test]
    fn test_parse_board_move() {
        let m = BoardMove::parse("e7", "e8", Some("Q")).unwrap();
        assert_eq!(m.to_string(), "e7e8q");
        assert!(matches!(
            BoardMove::parse("e9", "e8", None),
            Err(BoardError::InvalidSquare(_))
        ));
        assert!(matches!(
            BoardMove::parse("e7", "e8", Some("k")),
            Err(BoardError::InvalidPromotion(_))
        ));
        assert_eq!(BoardMove::parse("e2", "e4", Some("")).unwrap(), mv("e2e4"));
    }

    #[test]
    fn test_checkmate_credits_mover() {
        let game = Game::from_fen(MATE_IN_ONE).unwrap();
        let (mated, played) = game.apply(&mv("d1h5")).unwrap();
        assert_eq!(played.san, "Qh5#");
        assert_eq!(
            mated.terminal_status(),
            TerminalStatus::Checkmate { winner: Color::White }
        );
    }

    #[test]
    fn test_fools_mate_from_start() {
        let game = play_all(&Game::new(), &["f2f3", "e7e5", "g2g4", "d8h4"]);
        assert_eq!(
            game.terminal_status(),
            TerminalStatus::Checkmate { winner: Color::Black }
        );
    }

    #[test]
    fn test_stalemate() {
        let game = Game::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert!(!game.is_check());
        assert_eq!(game.terminal_status(), TerminalStatus::Stalemate);
    }

    #[test]
    fn test_insufficient_material() {
        let game = Game::from_fen("8/8/8/4k3/8/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(
            game.terminal_status(),
            TerminalStatus::Draw(DrawReason::InsufficientMaterial)
        );
        let knight = Game::from_fen("8/8/8/4k3/8/8/8/3NK3 w - - 0 1").unwrap();
        assert!(knight.terminal_status().is_terminal());
    }

    #[test]
    fn test_fifty_move_rule() {
        let game = Game::from_fen("8/8/8/4k3/8/8/R7/4K3 w - - 100 80").unwrap();
        assert_eq!(
            game.terminal_status(),
            TerminalStatus::Draw(DrawReason::FiftyMoveRule)
        );
        let fresh = Game::from_fen("8/8/8/4k3/8/8/R7/4K3 w - - 99 80").unwrap();
        assert_eq!(fresh.terminal_status(), TerminalStatus::Ongoing);
    }

    #[test]
    fn test_threefold_repetition() {
        let shuffle = ["g1f3", "g8f6", "f3g1", "f6g8"];
        let twice = play_all(&Game::new(), &shuffle);
        assert_eq!(twice.terminal_status(), TerminalStatus::Ongoing);

        let thrice = play_all(&twice, &shuffle);
        assert_eq!(
            thrice.terminal_status(),
            TerminalStatus::Draw(DrawReason::Repetition)
        );
    }

    #[test]
    fn test_position_key_ignores_move_counters() {
        let early = Game::from_fen("4k3/8/8/8/8/8/8/R3K3 w Q - 0 1").unwrap();
        let late = Game::from_fen("4k3/8/8/8/8/8/8/R3K3 w Q - 37 60").unwrap();
        assert_eq!(position_key(early.position()), position_key(late.position()));

        let no_castling = Game::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
        assert_ne!(position_key(early.position()), position_key(no_castling.position()));

        let black_to_move = Game::from_fen("4k3/8/8/8/8/8/8/R3K3 b Q - 0 1").unwrap();
        assert_ne!(position_key(early.position()), position_key(black_to_move.position()));
    }

    #[test]
    fn test_replay_restores_repetition_history() {
        let sans = ["Nf3", "Nf6", "Ng1", "Ng8", "Nf3", "Nf6", "Ng1", "Ng8"];
        let game = Game::replay(STARTING_FEN, &sans).unwrap();
        assert_eq!(game.fen(), STARTING_FEN.replace(" 0 1", " 8 5"));
        assert_eq!(
            game.terminal_status(),
            TerminalStatus::Draw(DrawReason::Repetition)
        );
    }

    #[test]
    fn test_replay_accepts_check_suffixes() {
        let game = Game::replay(MATE_IN_ONE, &["Qh5#"]).unwrap();
        assert!(matches!(
            game.terminal_status(),
            TerminalStatus::Checkmate { .. }
        ));

        let err = Game::replay(STARTING_FEN, &["e4", "e4"]).unwrap_err();
        assert_eq!(
            err,
            BoardError::InvalidHistory {
                ply: 2,
                san: "e4".into()
            }
        );
    }

    #[test]
    fn test_invalid_fen() {
        assert!(matches!(
            Game::from_fen("not a fen"),
            Err(BoardError::InvalidFen(_))
        ));
    }
}
