//! Reminders for clue setters who leave the room waiting.

use std::time::{Duration, Instant};

use indexmap::IndexMap;

use crate::state::clue::{ClueRegistry, ClueState};

/// Nag setters whose clues stayed in the Schroedinger state past `timeout`.
///
/// Each clue is mentioned once per Schroedinger episode; clues of the same setter share a line.
pub fn schroedinger_reminders(
    clues: &mut ClueRegistry,
    timeout: Duration,
    defender: &str,
    now: Instant,
) -> Vec<String> {
    let mut by_setter: IndexMap<String, Vec<String>> = IndexMap::new();
    for clue in clues.iter_mut() {
        if clue.state() == ClueState::Schroedinger
            && !clue.warned
            && now.saturating_duration_since(clue.state_since()) > timeout
        {
            clue.warned = true;
            by_setter
                .entry(clue.setter.mention())
                .or_default()
                .push(clue.number.clone());
        }
    }

    let minutes = timeout.as_secs_f64() / 60.0;
    by_setter
        .into_iter()
        .map(|(setter, numbers)| {
            format!(
                "@{setter}, it's been more than {minutes} minutes since {defender} provided a new letter, and you still haven't indicated whether {} alive or dead.",
                describe_clues(&numbers)
            )
        })
        .collect()
}

/// Nag setters who have not answered a guess within `timeout`.
pub fn guess_reminders(clues: &mut ClueRegistry, timeout: Duration, now: Instant) -> Vec<String> {
    let mut reminders = Vec::new();
    for clue in clues.iter_mut() {
        let setter = clue.setter.mention();
        let number = clue.number.clone();
        if let Some(guess) = clue.guess_mut()
            && !guess.warned
            && now.saturating_duration_since(guess.since) > timeout
        {
            guess.warned = true;
            reminders.push(format!(
                "@{setter}, {} guessed *{}* for clue #{number}.  Please confirm or deny the guess.",
                guess.guesser, guess.text
            ));
        }
    }
    reminders
}

fn describe_clues(numbers: &[String]) -> String {
    match numbers {
        [single] => format!("clue #{single} is"),
        [init @ .., last] => {
            let head = init
                .iter()
                .map(|n| format!("#{n}"))
                .collect::<Vec<_>>()
                .join(", ");
            format!("clues {head} and #{last} are")
        }
        [] => String::new(),
    }
}
