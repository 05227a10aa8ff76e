//! Integration tests for the game rules.
//!
//! Positions are built with [`place`], which drops cubes on an empty board,
//! or parsed from the text format the agent protocol uses.

use ewn_rust::board::{Board, Cube, Direction, ParseBoardError, Ply};
use ewn_rust::constants::MAX_ROLLOUT_PLIES;
use ewn_rust::game::{Color, GameState};
use ewn_rust::playout::play_random_till_end;

// =============================================================================
// Helper functions for setting up test positions
// =============================================================================

/// Place cubes on an empty board. Each entry is `(color, num, row, col)`.
fn place(next_turn: Color, cubes: &[(Color, u8, usize, usize)]) -> Board {
    let mut board = Board::empty(next_turn);
    for &(color, num, r, c) in cubes {
        board.set(r, c, Some(Cube::new(color, num)));
    }
    board
}

use Color::{Blue, Red};

// =============================================================================
// Standard opening
// =============================================================================

#[test]
fn test_standard_layout() {
    let board = Board::standard();
    assert_eq!(board.next_turn(), Red);
    assert_eq!(board.cube_count(Red), 6);
    assert_eq!(board.cube_count(Blue), 6);

    assert_eq!(board.get(0, 0), Some(Cube::new(Red, 0)));
    assert_eq!(board.get(2, 0), Some(Cube::new(Red, 5)));
    assert_eq!(board.get(5, 6), Some(Cube::new(Blue, 0)));
    assert_eq!(board.get(3, 6), Some(Cube::new(Blue, 5)));
    assert_eq!(board.get(2, 3), None);
    assert!(!board.is_completed());
}

#[test]
fn test_standard_legal_plies() {
    let plies = Board::standard().legal_plies();
    assert_eq!(plies.len(), 11);
    assert_eq!(plies[0], Ply::step(0, 1, 1, Direction::Diagonal));
    assert_eq!(plies[1], Ply::step(0, 2, 2, Direction::Horizontal));
    assert_eq!(plies[10], Ply::step(2, 0, 5, Direction::Diagonal));

    // The corner cube is boxed in by its own side.
    assert!(!plies.iter().any(|p| matches!(p, Ply::Step { row: 0, col: 0, .. })));
}

#[test]
fn test_blue_moves_toward_upper_left() {
    let mut board = Board::standard();
    board.set_next_turn(Blue);
    let plies = board.legal_plies();
    assert_eq!(plies.len(), 11);
    assert!(plies.contains(&Ply::step(5, 5, 1, Direction::Diagonal)));
    assert!(plies.contains(&Ply::step(5, 4, 2, Direction::Horizontal)));
}

#[test]
fn test_standard_total_distance() {
    let board = Board::standard();
    assert_eq!(board.total_distance(), 116);

    let next = board.apply(&board.legal_plies()[0]);
    assert_eq!(next.total_distance(), 114);
    assert_eq!(next.distance_remaining(), next.total_distance());
}

// =============================================================================
// Moves and captures
// =============================================================================

#[test]
fn test_step_moves_cube_and_flips_turn() {
    let board = Board::standard();
    let next = board.apply(&Ply::step(0, 2, 2, Direction::Vertical));
    assert_eq!(next.get(0, 2), None);
    assert_eq!(next.get(1, 2), Some(Cube::new(Red, 2)));
    assert_eq!(next.next_turn(), Blue);
    // The original is untouched.
    assert_eq!(board, Board::standard());
}

#[test]
fn test_capture_enemy_cube() {
    let board = place(
        Red,
        &[(Red, 2, 2, 2), (Blue, 4, 2, 3), (Blue, 1, 4, 4)],
    );
    let ply = Ply::step(2, 2, 2, Direction::Horizontal);
    assert!(board.legal_plies().contains(&ply));

    let next = board.apply(&ply);
    assert_eq!(next.get(2, 3), Some(Cube::new(Red, 2)));
    assert_eq!(next.cube_count(Blue), 1);
    assert!(!next.is_completed());
}

#[test]
fn test_cannot_land_on_own_cube() {
    let board = place(Red, &[(Red, 0, 2, 2), (Red, 1, 2, 3), (Blue, 0, 5, 0)]);
    let plies = board.legal_plies();
    assert!(!plies.contains(&Ply::step(2, 2, 0, Direction::Horizontal)));
    assert!(plies.contains(&Ply::step(2, 2, 0, Direction::Vertical)));
    assert!(plies.contains(&Ply::step(2, 2, 0, Direction::Diagonal)));
}

#[test]
fn test_edge_cube_only_steps_along_edge() {
    let board = place(Red, &[(Red, 3, 5, 3), (Blue, 0, 0, 3)]);
    assert_eq!(
        board.legal_plies(),
        vec![Ply::step(5, 3, 3, Direction::Horizontal)]
    );
}

#[test]
fn test_stuck_side_passes() {
    let board = place(Red, &[(Red, 0, 5, 6), (Blue, 1, 3, 3)]);
    assert!(!board.is_completed());
    assert_eq!(board.legal_plies(), vec![Ply::Pass]);

    let next = board.apply(&Ply::Pass);
    assert_eq!(next.next_turn(), Blue);
    assert_eq!(next.get(5, 6), board.get(5, 6));
    assert_eq!(next.get(3, 3), board.get(3, 3));
}

// =============================================================================
// End of game
// =============================================================================

#[test]
fn test_corners_smaller_number_wins() {
    let blue_wins = place(Red, &[(Blue, 1, 0, 0), (Red, 3, 5, 6)]);
    assert!(blue_wins.is_completed());
    assert_eq!(blue_wins.winner(), Some(Blue));
    assert!(blue_wins.legal_plies().is_empty());

    let red_wins = place(Red, &[(Blue, 4, 0, 0), (Red, 2, 5, 6), (Red, 0, 2, 2)]);
    assert!(red_wins.is_completed());
    assert_eq!(red_wins.winner(), Some(Red));
}

#[test]
fn test_corners_equal_numbers_draw() {
    let board = place(Blue, &[(Blue, 3, 0, 0), (Red, 3, 5, 6)]);
    assert!(board.is_completed());
    assert_eq!(board.winner(), None);
    assert_eq!(GameState::winner(&board), None);
}

#[test]
fn test_one_corner_is_not_the_end() {
    let board = place(Red, &[(Blue, 1, 0, 0), (Red, 3, 4, 6)]);
    assert!(!board.is_completed());

    // A cube of the wrong side on a goal does not count.
    let wrong_side = place(Red, &[(Red, 1, 0, 0), (Red, 3, 5, 6), (Blue, 0, 3, 3)]);
    assert!(!wrong_side.is_completed());
}

#[test]
fn test_wiping_out_a_side_wins() {
    let board = place(Red, &[(Red, 5, 3, 3), (Blue, 0, 4, 4)]);
    let next = board.apply(&Ply::step(3, 3, 5, Direction::Diagonal));
    assert_eq!(next.cube_count(Blue), 0);
    assert!(next.is_completed());
    assert!(next.is_terminal());
    assert_eq!(next.winner(), Some(Red));
}

// =============================================================================
// Text formats
// =============================================================================

#[test]
fn test_board_display_roundtrip() {
    let board = Board::standard().apply(&Ply::step(1, 1, 4, Direction::Diagonal));
    let text = format!("{board} {}", board.next_turn());
    let parsed: Board = text.parse().unwrap();
    assert_eq!(parsed, board);

    // Without a trailing color, Red is to move.
    let parsed: Board = board.to_string().parse().unwrap();
    assert_eq!(parsed.next_turn(), Red);
}

#[test]
fn test_board_display_tokens() {
    let text = Board::standard().to_string();
    let first_line = text.lines().next().unwrap();
    assert_eq!(first_line, "  R0  R1  R2  __  __  __  __");
}

#[test]
fn test_board_parse_errors() {
    assert_eq!(
        "R0 B0".parse::<Board>(),
        Err(ParseBoardError::TokenCount {
            expected: 42,
            got: 2
        })
    );

    let mut tokens = vec!["__"; 42];
    tokens[5] = "X1";
    assert_eq!(
        tokens.join(" ").parse::<Board>(),
        Err(ParseBoardError::Cell("X1".to_string()))
    );

    tokens[5] = "R6";
    assert!(tokens.join(" ").parse::<Board>().is_err());

    tokens[5] = "R1";
    tokens.push("green");
    assert!(matches!(
        tokens.join(" ").parse::<Board>(),
        Err(ParseBoardError::Color(_))
    ));
}

#[test]
fn test_ply_parse() {
    assert_eq!(
        "0 1 1 d".parse::<Ply>(),
        Ok(Ply::step(0, 1, 1, Direction::Diagonal))
    );
    assert_eq!("2 0 5 Horizontal".parse::<Ply>(), Ok(Ply::step(2, 0, 5, Direction::Horizontal)));
    assert_eq!("PASS".parse::<Ply>(), Ok(Ply::Pass));

    assert!("6 0 0 h".parse::<Ply>().is_err());
    assert!("0 7 0 h".parse::<Ply>().is_err());
    assert!("0 0 0 x".parse::<Ply>().is_err());
    assert!("0 0 h".parse::<Ply>().is_err());

    let ply = Ply::step(3, 4, 2, Direction::Vertical);
    assert_eq!(ply.to_string(), "3 4 2 v");
    assert_eq!(ply.to_string().parse::<Ply>(), Ok(ply));
}

#[test]
fn test_color_parse() {
    assert_eq!("red".parse::<Color>(), Ok(Red));
    assert_eq!("B".parse::<Color>(), Ok(Blue));
    assert!("white".parse::<Color>().is_err());
}

// =============================================================================
// Symmetry
// =============================================================================

#[test]
fn test_flipped_standard_is_standard() {
    assert_eq!(Board::standard().flipped(), Board::standard());

    let mut blue_to_move = Board::standard();
    blue_to_move.set_next_turn(Blue);
    assert_eq!(blue_to_move.flipped().next_turn(), Blue);
}

#[test]
fn test_flipped_is_an_involution_and_mirrors_moves() {
    let board = Board::standard()
        .apply(&Ply::step(0, 2, 2, Direction::Diagonal))
        .apply(&Ply::step(4, 6, 3, Direction::Diagonal));
    assert_eq!(board.flipped().flipped(), board);
    assert_eq!(board.flipped().total_distance(), board.total_distance());
    assert_eq!(board.flipped().next_turn(), board.next_turn());

    // With the turn handed over too, the mirrored side has as many moves.
    let mut mirrored = board.flipped();
    mirrored.set_next_turn(board.next_turn().opponent());
    assert_eq!(mirrored.legal_plies().len(), board.legal_plies().len());
}

// =============================================================================
// Random playouts
// =============================================================================

#[test]
fn test_random_playout_reaches_the_end() {
    let start = Board::standard();
    for seed in 0..20 {
        let mut rng = fastrand::Rng::with_seed(seed);
        let rollout = play_random_till_end(&start, &mut rng);
        assert!(rollout.plies.len() < MAX_ROLLOUT_PLIES);

        let mut board = start;
        for (color, ply) in &rollout.plies {
            assert_eq!(*color, board.next_turn());
            assert!(board.legal_plies().contains(ply));
            board.apply_ply(ply);
        }
        assert!(board.is_completed());
        assert_eq!(board.winner(), rollout.winner);
    }
}

#[test]
fn test_random_playout_is_reproducible() {
    let start = Board::standard();
    let a = start.random_rollout(&mut fastrand::Rng::with_seed(7));
    let b = start.random_rollout(&mut fastrand::Rng::with_seed(7));
    assert_eq!(a, b);
}
