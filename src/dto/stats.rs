use serde::Serialize;
use utoipa::ToSchema;

/// Summary of a game, live or archived.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct GameStats {
    /// Clues posted.
    pub clues_set: usize,
    /// Clues guessed correctly.
    pub solved: usize,
    /// Clues killed, abandoned, or left standing at the end.
    pub died: usize,
    /// Contacts made.
    pub contacts: usize,
    /// Letters of the word revealed by the defender.
    pub letters: usize,
    /// Game length in seconds, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u64>,
    /// Player who solved the most clues.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_solver: Option<String>,
    /// Clues solved by the top solver.
    pub top_solves: usize,
}

impl GameStats {
    /// One-line summary posted to the room.
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{} clues were set: {} solved, {} died.  {} contacts were made and {} letters were revealed",
            self.clues_set, self.solved, self.died, self.contacts, self.letters
        );
        if let Some(secs) = self.duration_secs {
            line.push_str(&format!(" in {} minutes", secs.div_ceil(60)));
        }
        line.push('.');
        if let Some(solver) = &self.top_solver {
            line.push_str(&format!(
                "  Top solver: {solver} ({} clues).",
                self.top_solves
            ));
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_mentions_top_solver_when_known() {
        let stats = GameStats {
            clues_set: 4,
            solved: 2,
            died: 2,
            contacts: 5,
            letters: 3,
            duration_secs: Some(61),
            top_solver: Some("bob".into()),
            top_solves: 2,
        };
        assert_eq!(
            stats.summary(),
            "4 clues were set: 2 solved, 2 died.  5 contacts were made and 3 letters were revealed in 2 minutes.  Top solver: bob (2 clues)."
        );
        assert!(!GameStats::default().summary().contains("Top solver"));
    }
}
