use std::{
    collections::BTreeMap,
    time::{Duration, SystemTime},
};

use crate::{
    dao::models::{ClueEntity, ContactEntity, DefenceEntity, GameEntity},
    dto::stats::GameStats,
    state::{
        clue::{ClueRegistry, ClueState},
        game::GameSession,
    },
};

/// Outcome of one clue as far as the stats care.
#[derive(Debug, Clone, Copy)]
pub struct ClueTally<'a> {
    /// Who solved it, if anyone.
    pub solver: Option<&'a str>,
    /// Still on the board.
    pub open: bool,
}

/// Fold clue outcomes into [`GameStats`].
pub fn tally<'a>(
    clues: impl IntoIterator<Item = ClueTally<'a>>,
    contacts: usize,
    letters: usize,
    duration: Option<Duration>,
) -> GameStats {
    let mut stats = GameStats {
        contacts,
        letters,
        duration_secs: duration.map(|d| d.as_secs()),
        ..GameStats::default()
    };
    let mut solvers: BTreeMap<&str, usize> = BTreeMap::new();

    for clue in clues {
        stats.clues_set += 1;
        match clue.solver {
            Some(solver) => {
                stats.solved += 1;
                *solvers.entry(solver).or_default() += 1;
            }
            None if !clue.open => stats.died += 1,
            None => {}
        }
    }

    for (solver, count) in solvers {
        if count > stats.top_solves {
            stats.top_solves = count;
            stats.top_solver = Some(solver.to_string());
        }
    }
    stats
}

/// Stats of the game being played right now.
pub fn live(session: &GameSession, clues: &ClueRegistry, now: SystemTime) -> GameStats {
    let tallies = clues.history().iter().chain(clues.iter()).map(|clue| ClueTally {
        solver: clue.solver.as_deref(),
        open: !matches!(clue.state(), ClueState::Solved | ClueState::Dead),
    });
    let duration = session
        .started_at
        .and_then(|started| now.duration_since(started).ok());

    tally(
        tallies,
        session.contacts_made,
        session.defending_text.chars().count(),
        duration,
    )
}

/// Stats of an archived game.
pub fn archived(
    game: &GameEntity,
    defences: &[DefenceEntity],
    clues: &[ClueEntity],
    contacts: &[ContactEntity],
) -> GameStats {
    let tallies = clues.iter().map(|clue| ClueTally {
        solver: clue.solver.as_deref(),
        open: clue.is_open(),
    });
    let letters = defences
        .iter()
        .max_by_key(|defence| defence.started_at)
        .map(|defence| defence.text.chars().count())
        .unwrap_or_default();
    let duration = game
        .ended_at
        .and_then(|ended| ended.duration_since(game.started_at).ok());

    tally(tallies, contacts.len(), letters, duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solved(by: &str) -> ClueTally<'_> {
        ClueTally {
            solver: Some(by),
            open: false,
        }
    }

    const DEAD: ClueTally<'static> = ClueTally {
        solver: None,
        open: false,
    };
    const OPEN: ClueTally<'static> = ClueTally {
        solver: None,
        open: true,
    };

    #[test]
    fn open_clues_count_as_set_only() {
        let stats = tally([solved("bob"), DEAD, OPEN], 3, 2, None);
        assert_eq!(stats.clues_set, 3);
        assert_eq!(stats.solved, 1);
        assert_eq!(stats.died, 1);
        assert_eq!(stats.contacts, 3);
        assert_eq!(stats.letters, 2);
    }

    #[test]
    fn top_solver_ties_go_to_the_first_name() {
        let stats = tally(
            [solved("zoe"), solved("bob"), solved("zoe"), solved("bob")],
            0,
            0,
            Some(Duration::from_secs(300)),
        );
        assert_eq!(stats.top_solver.as_deref(), Some("bob"));
        assert_eq!(stats.top_solves, 2);
        assert_eq!(stats.duration_secs, Some(300));
    }
}
