//! PGN rendering for a game's move history.

use crate::board::STARTING_FEN;
use crate::side::GameResult;

/// Render SAN moves as PGN.
///
/// Games from the standard start produce bare movetext (`1. e4 e5 2. Nf3`).
/// Games from any other position get `SetUp`/`FEN` headers and number from
/// that position's full-move counter, black-first when black starts. A
/// finished game ends with its result token.
pub fn render<S: AsRef<str>>(start_fen: &str, sans: &[S], result: GameResult) -> String {
    let mut out = String::new();

    let start_fen = start_fen.trim();
    let fields: Vec<&str> = start_fen.split_whitespace().collect();
    let black_first = fields.get(1) == Some(&"b");
    let mut move_number: u32 = fields
        .get(5)
        .and_then(|n| n.parse().ok())
        .filter(|n| *n > 0)
        .unwrap_or(1);

    if start_fen != STARTING_FEN {
        out.push_str("[SetUp \"1\"]\n");
        out.push_str(&format!("[FEN \"{start_fen}\"]\n\n"));
    }

    let mut movetext: Vec<String> = Vec::with_capacity(sans.len() + 1);
    for (i, san) in sans.iter().enumerate() {
        let san = san.as_ref();
        let white_to_move = (i % 2 == 0) != black_first;
        if white_to_move {
            movetext.push(format!("{move_number}. {san}"));
        } else {
            if i == 0 {
                movetext.push(format!("{move_number}... {san}"));
            } else {
                movetext.push(san.to_string());
            }
            move_number += 1;
        }
    }

    if result != GameResult::Active {
        movetext.push(result.pgn_token().to_string());
    }

    out.push_str(&movetext.join(" "));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_standard_start() {
        let sans = ["e4", "e5", "Nf3"];
        assert_eq!(
            render(STARTING_FEN, &sans, GameResult::Active),
            "1. e4 e5 2. Nf3"
        );
    }

    #[test]
    fn test_render_empty_history() {
        let sans: [&str; 0] = [];
        assert_eq!(render(STARTING_FEN, &sans, GameResult::Active), "");
    }

    #[test]
    fn test_render_finished_game() {
        let sans = ["f3", "e5", "g4", "Qh4#"];
        assert_eq!(
            render(STARTING_FEN, &sans, GameResult::Loss),
            "1. f3 e5 2. g4 Qh4# 0-1"
        );
    }

    #[test]
    fn test_render_custom_start_with_headers() {
        let fen = "rnbqkbnr/ppppp2p/5p2/6p1/3PP3/8/PPP2PPP/RNBQKBNR w KQkq - 0 3";
        let pgn = render(fen, &["Qh5#"], GameResult::Win);
        assert_eq!(
            pgn,
            format!("[SetUp \"1\"]\n[FEN \"{fen}\"]\n\n3. Qh5# 1-0")
        );
    }

    #[test]
    fn test_render_black_first() {
        let fen = "4k3/8/8/8/8/8/4P3/4K3 b - - 0 12";
        let pgn = render(fen, &["Kd7", "e4", "Kc6"], GameResult::Active);
        assert!(pgn.ends_with("12... Kd7 13. e4 Kc6"), "{pgn}");
    }
}
