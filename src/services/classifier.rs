//! Turns one chat line into exactly one game intent.
//!
//! Several patterns overlap (the guess pattern accepts almost anything that starts with a
//! clue number), so [`RULES`] is evaluated top to bottom and the first match wins. The order
//! is part of the game rules: a setter's `3: no` must be read as a denial before it can be
//! read as a guess of "NO".

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// A clue number: digits, an optional decimal sub-index, optional apostrophes.
const CLUE_NUMBER: &str = r"\d+(?:\.\d+)?'*";
/// A keyword must end the line or be followed by a separator, so `3: north` is not `3: n`.
const KEYWORD_TAIL: &str = r"(?:[\s,.!;:]+.*)?";
/// Contacts and passes may carry a remark after the last number, but `c3po` is not `c 3`.
const TRAILING_REMARK: &str = r"(?:\W.*)?$";

// ── Regex patterns ──────────────────────────────────────────────────────

static RE_DENY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?is)^\s*({n})[:).]?\s*((?:n|no|nope|x|(?:.+\s+is\s+)?wrong|(?:.+\s+is\s+)?(?:inc|<b>inc</b>|<b>in</b>c)orrect|(?:.+\s+is\s+)?(?:not|<b>not</b>)\s+(?:correct|right)){tail})$",
        n = CLUE_NUMBER,
        tail = KEYWORD_TAIL
    ))
    .unwrap()
});

static RE_CONFIRM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?is)^\s*({n})[:).]?\s*((?:y|ok|yes|yep|(?:.+\s+is\s+)?(?:c|<b>c</b>)orrect|right|\x{{2713}}+|\x{{2714}}+){tail})$",
        n = CLUE_NUMBER,
        tail = KEYWORD_TAIL
    ))
    .unwrap()
});

static RE_DIES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?is)^\s*({n})[:).]?\s*((?:dies|(?:is\s+)?dead|done){tail})$",
        n = CLUE_NUMBER,
        tail = KEYWORD_TAIL
    ))
    .unwrap()
});

static RE_LIVES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?is)^\s*({n})[:).]?\s*((?:lives|(?:is\s+)?(?:still\s*)?alive|(?:stays|remains)(?:\s+alive)?|continues|survives){tail})$",
        n = CLUE_NUMBER,
        tail = KEYWORD_TAIL
    ))
    .unwrap()
});

static RE_NEW_CLUES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?is)^\s*({n}(?:\s*,\s*{n})*)[:).]?\s*<b>(.*)</b>.*$",
        n = CLUE_NUMBER
    ))
    .unwrap()
});

static RE_WAS_DEFENDING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^.*\bwas\s+defending:?\s*(?:<b>)?\s*([a-z][a-z ]*?)\s*(?:</b>)?[\s.!]*$")
        .unwrap()
});

static RE_DH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*DH:?\s*(?:<b>)?\s*([a-z][a-z ]*?)\s*(?:</b>)?[\s.!]*$").unwrap()
});

static RE_WORD_CHECKED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:<b>)?\s*([a-z][a-z ]*?)\s*(?:</b>)?\s*[\x{2713}\x{2714}]+\s*$")
        .unwrap()
});

static RE_DEFENDING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^\s*.*defending:?\s*<b>([a-z ]+)</b>\s*$").unwrap()
});

static RE_GUESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?is)^\s*({n})(?:[:).]\s*|\s+)(?:(?:is|it's(?:\s+not)?)\s+)?([^?]+)$",
        n = CLUE_NUMBER
    ))
    .unwrap()
});

static RE_CONTACT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?is)^\s*(?:contact|c)\s*({n}(?:\s*,\s*{n})*){rest}",
        n = CLUE_NUMBER,
        rest = TRAILING_REMARK
    ))
    .unwrap()
});

static RE_UNCONTACT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?is)^\s*(?:uncontact|uc|u)\s*({n}(?:\s*,\s*{n})*){rest}",
        n = CLUE_NUMBER,
        rest = TRAILING_REMARK
    ))
    .unwrap()
});

static RE_PASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?is)^\s*(?:i\s+)?(?:am\s+)?pass(?:ing)?(?:\s+on)?\s*({n}){rest}",
        n = CLUE_NUMBER,
        rest = TRAILING_REMARK
    ))
    .unwrap()
});

static RE_WAVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^\s*(?:\\[o0]|[o0]/|<code>\s*(?:\\[o0]|[o0]/)\s*</code>)(?:\s.*)?$").unwrap()
});

/// Game action recognised in a chat line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// `3: no`
    DenyGuess {
        /// Clue number.
        number: String,
        /// Keyword and everything after it.
        text: String,
    },
    /// `3: yes`
    ConfirmGuess {
        /// Clue number.
        number: String,
        /// Keyword and everything after it.
        text: String,
    },
    /// `3 dies`
    ClueDies {
        /// Clue number.
        number: String,
        /// Keyword and everything after it.
        text: String,
    },
    /// `3 lives`
    ClueLives {
        /// Clue number.
        number: String,
        /// Keyword and everything after it.
        text: String,
    },
    /// `3, 4: **clue text**`
    NewClues {
        /// Every number sharing the clue text.
        numbers: Vec<String>,
        /// Text inside the bold markup.
        text: String,
    },
    /// `dana was defending **ROCKET**`, `DH: ROCKET`, `ROCKET ✓`
    GameOver {
        /// Revealed word, normalised.
        word: String,
    },
    /// `I'm defending: **RO**`
    Defending {
        /// Revealed prefix, normalised.
        text: String,
    },
    /// `3: rocket`
    Guess {
        /// Clue number.
        number: String,
        /// Guessed word as typed.
        text: String,
    },
    /// `c 3, 4`
    Contact {
        /// Clue numbers.
        numbers: Vec<String>,
    },
    /// `uc 3`
    Uncontact {
        /// Clue numbers.
        numbers: Vec<String>,
    },
    /// `passing on 3`
    Pass {
        /// Clue number.
        number: String,
    },
    /// A recognised bot command.
    Command(Command),
    /// `o/`
    Wave,
    /// Prefixed text that names no known command.
    UnknownCommand(String),
    /// Ordinary chatter.
    Unrecognized,
}

/// Bot command with its raw arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `!clues`
    Clues,
    /// `!unstarred`
    Unstarred,
    /// `!contacts [n]`
    Contacts(Option<String>),
    /// `!shutup [minutes]`
    Shutup(Option<String>),
    /// `!speak`
    Speak,
    /// `!verbose [on|off]`
    Verbose(Option<String>),
    /// `!resume <gameId>`
    Resume(Option<String>),
    /// `!unpass`
    Unpass,
    /// `!kill <n>`
    Kill(Option<String>),
    /// `!uncontact <n>`
    Uncontact(Option<String>),
    /// `!end`, `!reset`
    End,
    /// `!ping`
    Ping,
    /// `!whitelist [[+|-]id]`
    Whitelist(Option<String>),
    /// `!pinglist [[+|-]name]`
    Pinglist(Option<String>),
    /// `!help`
    Help,
    /// `!stats <gameId>`
    Stats(Option<String>),
    /// `!shutdown`
    Shutdown,
}

/// Who may issue a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Access {
    /// Everyone in the room.
    Anyone,
    /// Super users and whitelisted users.
    Trusted,
    /// The bot itself and room moderators.
    Super,
}

impl Command {
    fn parse(name: &str, args: Option<String>) -> Option<Self> {
        let command = match name {
            "clues" => Command::Clues,
            "unstarred" => Command::Unstarred,
            "contacts" => Command::Contacts(args),
            "shutup" => Command::Shutup(args),
            "speak" => Command::Speak,
            "verbose" => Command::Verbose(args),
            "resume" => Command::Resume(args),
            "unpass" => Command::Unpass,
            "kill" => Command::Kill(args),
            "uncontact" => Command::Uncontact(args),
            "end" | "reset" => Command::End,
            "ping" => Command::Ping,
            "whitelist" => Command::Whitelist(args),
            "pinglist" => Command::Pinglist(args),
            "help" => Command::Help,
            "stats" => Command::Stats(args),
            "shutdown" => Command::Shutdown,
            _ => return None,
        };
        Some(command)
    }

    /// Minimum access level needed to run the command.
    pub fn access(&self) -> Access {
        match self {
            Command::Help => Access::Anyone,
            Command::Ping | Command::Whitelist(_) | Command::Shutdown => Access::Super,
            _ => Access::Trusted,
        }
    }
}

type Rule = fn(&str) -> Option<Intent>;

/// Game intents in priority order; commands, waves and chatter are checked afterwards.
const RULES: [(&str, Rule); 11] = [
    ("deny_guess", deny_guess),
    ("confirm_guess", confirm_guess),
    ("clue_dies", clue_dies),
    ("clue_lives", clue_lives),
    ("new_clues", new_clues),
    ("game_over", game_over),
    ("defending", defending),
    ("guess", guess),
    ("contact", contact),
    ("uncontact", uncontact),
    ("pass", pass),
];

/// Stateless classifier configured with the command prefix.
#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    prefix: char,
}

impl Classifier {
    pub fn new(prefix: char) -> Self {
        Self { prefix }
    }

    /// Classify one decoded chat line.
    pub fn classify(&self, text: &str) -> Intent {
        for (name, rule) in RULES {
            if let Some(intent) = rule(text) {
                tracing::trace!(rule = name, "classified chat line");
                return intent;
            }
        }

        if let Some(body) = text.trim_start().strip_prefix(self.prefix) {
            let body = body.trim();
            let (name, args) = match body.split_once(char::is_whitespace) {
                Some((name, rest)) => (name, Some(rest.trim().to_string())),
                None => (body, None),
            };
            let name = name.to_lowercase();
            return match Command::parse(&name, args.filter(|rest| !rest.is_empty())) {
                Some(command) => Intent::Command(command),
                None => Intent::UnknownCommand(name),
            };
        }

        if RE_WAVE.is_match(text) {
            return Intent::Wave;
        }

        Intent::Unrecognized
    }
}

fn group(captures: &Captures<'_>, index: usize) -> String {
    captures
        .get(index)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

fn numbers(list: &str) -> Vec<String> {
    list.split(',')
        .map(|number| number.trim().to_string())
        .filter(|number| !number.is_empty())
        .collect()
}

fn numbered(re: &Regex, text: &str) -> Option<(String, String)> {
    let captures = re.captures(text)?;
    Some((group(&captures, 1), group(&captures, 2)))
}

fn deny_guess(text: &str) -> Option<Intent> {
    numbered(&RE_DENY, text).map(|(number, text)| Intent::DenyGuess { number, text })
}

fn confirm_guess(text: &str) -> Option<Intent> {
    numbered(&RE_CONFIRM, text).map(|(number, text)| Intent::ConfirmGuess { number, text })
}

fn clue_dies(text: &str) -> Option<Intent> {
    numbered(&RE_DIES, text).map(|(number, text)| Intent::ClueDies { number, text })
}

fn clue_lives(text: &str) -> Option<Intent> {
    numbered(&RE_LIVES, text).map(|(number, text)| Intent::ClueLives { number, text })
}

fn new_clues(text: &str) -> Option<Intent> {
    let captures = RE_NEW_CLUES.captures(text)?;
    Some(Intent::NewClues {
        numbers: numbers(&group(&captures, 1)),
        text: group(&captures, 2),
    })
}

fn game_over(text: &str) -> Option<Intent> {
    [&RE_WAS_DEFENDING, &RE_DH, &RE_WORD_CHECKED]
        .into_iter()
        .find_map(|re| re.captures(text))
        .map(|captures| Intent::GameOver {
            word: crate::state::game::normalize_word(&group(&captures, 1)),
        })
}

fn defending(text: &str) -> Option<Intent> {
    let captures = RE_DEFENDING.captures(text)?;
    Some(Intent::Defending {
        text: crate::state::game::normalize_word(&group(&captures, 1)),
    })
}

fn guess(text: &str) -> Option<Intent> {
    let (number, text) = numbered(&RE_GUESS, text)?;
    (!text.is_empty()).then_some(Intent::Guess { number, text })
}

fn contact(text: &str) -> Option<Intent> {
    let captures = RE_CONTACT.captures(text)?;
    Some(Intent::Contact {
        numbers: numbers(&group(&captures, 1)),
    })
}

fn uncontact(text: &str) -> Option<Intent> {
    let captures = RE_UNCONTACT.captures(text)?;
    Some(Intent::Uncontact {
        numbers: numbers(&group(&captures, 1)),
    })
}

fn pass(text: &str) -> Option<Intent> {
    let captures = RE_PASS.captures(text)?;
    Some(Intent::Pass {
        number: group(&captures, 1),
    })
}
