//! `!` commands: listings, moderation, rosters, and archive lookups.

use std::time::Duration;

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    error::{GameError, GameResult},
    services::{
        classifier::{Access, Command},
        referee::{Effect, Record, Referee, RosterKind},
    },
    state::{clue::ClueState, game::ChatUser, state_machine::GamePhase},
};

const VERBOSE_OFF: &str = "Ok. After this, I'll only speak if you really need to know something. You can make me more chatty with **`!verbose on`**. Or you can silence me entirely with **`!shutup`**.";
const VERBOSE_ON: &str = "Ok. I love talking!  We can talk about all sorts of things!  I love Contact.  Do you?  Do you like defending or attacking better?  I'm never sure which one I like the most, but being a bot, I'll probably never get a chance to do either.  So sad. In verbose mode, I'll make sure to inform you whenever you're out of line, keep you abreast of game developments, and maybe throw in a few witticisms here and there just for fun. I love to talk! (**`!verbose off`** turns off verbose mode.)";
const LONG_LIST: usize = 500;

impl Referee {
    /// Run a recognised command after checking the caller's access.
    pub(crate) fn run_command(&mut self, user: &ChatUser, command: Command) -> GameResult {
        let access = self.access_of(user);
        if access < command.access() {
            return Err(refusal(access));
        }
        debug!(?command, user = %user.name, "running command");

        match command {
            Command::Clues => self.display_clues(false),
            Command::Unstarred => self.display_clues(true),
            Command::Contacts(number) => return self.display_contacts(number.as_deref()),
            Command::Shutup(minutes) => self.mute(minutes.as_deref()),
            Command::Speak => {
                self.gate.unmute();
                self.say("Your wish is my command.  What can I do for you?");
            }
            Command::Verbose(setting) => return self.set_verbosity(setting.as_deref()),
            Command::Resume(game) => {
                let id = parse_game_id(game.as_deref(), "resume")?;
                if self.machine.phase() != GamePhase::Idle {
                    return Err(GameError::conflict(
                        "A game is already in progress.  Use **`!end`** before resuming another.",
                    ));
                }
                self.push(Effect::Resume(id));
            }
            Command::Unpass => return self.reverse_pass(),
            Command::Kill(number) => {
                let number = number.ok_or_else(|| GameError::invalid("Syntax: **`!kill <clueNum>`**"))?;
                return self.kill_clue(&number, "", user, true);
            }
            Command::Uncontact(number) => {
                let number = number
                    .filter(|arg| !arg.contains(char::is_whitespace))
                    .ok_or_else(|| GameError::invalid("Syntax: **`!uncontact <clueNum>`**"))?;
                self.remove_contacts(user, &[number], true);
            }
            Command::End => {
                if !self.machine.phase().is_active() {
                    return Err(GameError::conflict("There is no game in progress.").chatty());
                }
                return self.end_game(None);
            }
            Command::Ping => {
                if self.ping_cooldown.try_fire(self.now) {
                    self.send_pings();
                } else {
                    debug!("ping cooldown active");
                }
            }
            Command::Whitelist(arg) => return self.modify_roster(RosterKind::Whitelist, arg.as_deref()),
            Command::Pinglist(arg) => return self.modify_roster(RosterKind::Pinglist, arg.as_deref()),
            Command::Help => self.help(),
            Command::Stats(game) => {
                let id = parse_game_id(game.as_deref(), "stats")?;
                self.push(Effect::Stats(id));
            }
            Command::Shutdown => {
                info!(user = %user.name, "shutdown requested");
                self.say("Shutting down.  Goodbye!");
                self.push(Effect::Shutdown);
            }
        }
        Ok(())
    }

    /// Prefixed text that names no command.
    pub(crate) fn unknown_command(&mut self, user: &ChatUser, name: &str) -> GameResult {
        debug!(command = name, "unknown command");
        Err(refusal(self.access_of(user)))
    }

    fn display_clues(&mut self, only_unstarred: bool) {
        let lines: Vec<String> = self
            .clues
            .iter()
            .filter(|clue| {
                !only_unstarred
                    || clue
                        .message
                        .is_none_or(|message| self.stars.get(&message).copied().unwrap_or(0) == 0)
            })
            .map(|clue| {
                let mut line = format!("{}: {} (by {})", clue.number, clue.text, clue.setter.name);
                if let Some(guess) = clue.guess() {
                    line.push_str(&format!(
                        " (waiting for confirmation of guess {} by {})",
                        guess.text, guess.guesser
                    ));
                }
                if !clue.contacts.is_empty() {
                    line.push_str(&format!(" (contacted by {})", join_names(clue.contacts.values())));
                }
                match clue.state() {
                    ClueState::Schroedinger => line.push_str(" (status uncertain)"),
                    ClueState::Passed => line.push_str(" (passed)"),
                    _ => {}
                }
                line
            })
            .collect();

        if !lines.is_empty() {
            self.say_long(lines.join("\n"));
        } else if only_unstarred {
            self.say("There are no active unstarred clues.  (Good work!)");
        } else {
            self.say("There are no active clues.");
        }
    }

    fn display_contacts(&mut self, number: Option<&str>) -> GameResult {
        if let Some(number) = number {
            if number.replace('\'', "").parse::<f64>().is_err() {
                return Err(GameError::invalid(
                    "Syntax of the **`!contacts`** command:  **`!contacts <optional clue number>`**",
                ));
            }
            let Some(clue) = self.clues.get(number) else {
                return Err(GameError::not_found(format!(
                    "There is no active clue with the number {number}"
                )));
            };
            let reply = if clue.contacts.is_empty() {
                format!("There are no current contacts for clue number {number}")
            } else {
                format!(
                    "Clue #{number} is currently contacted by: {}",
                    join_names(clue.contacts.values())
                )
            };
            self.say(reply);
            return Ok(());
        }

        let output: String = self
            .clues
            .iter()
            .filter(|clue| !clue.contacts.is_empty())
            .map(|clue| format!("  #{} by {}\n", clue.number, join_names(clue.contacts.values())))
            .collect();

        if !output.is_empty() {
            self.say(format!("The following clues are currently contacted:\n{output}"));
            return Ok(());
        }

        let snark = if self.clues.is_empty() {
            ", which makes sense, since there are *no active clues*"
        } else {
            ""
        };
        self.say(format!(
            "There are currently **no** contacted clues{snark}!  C'mon, people!  Pick it up!"
        ));
        if self.clues.len() > self.rules.max_clues {
            self.say("Maybe stop trying to come up with *more clues*, and try to solve some of the existing ones instead?");
        }
        Ok(())
    }

    fn mute(&mut self, minutes: Option<&str>) {
        let default = self.rules.default_mute;
        let length = match minutes {
            None => default,
            Some(arg) => match arg
                .parse::<f64>()
                .ok()
                .and_then(|minutes| Duration::try_from_secs_f64(minutes * 60.0).ok())
            {
                Some(length) => length,
                None => {
                    self.say(format!(
                        "You must specify a number of minutes, or just use **`!shutup`** on its own to default to {} minutes.",
                        minutes_of(default)
                    ));
                    default
                }
            },
        };

        self.say(format!(
            "Ok, I won't say anything else for {} minutes, unless you tell me to **`!speak`**.  I will continue to star/unstar clues as I'm able, and I'll still keep track of the game.",
            minutes_of(length)
        ));
        self.gate.mute(length, self.now);
        info!(secs = length.as_secs_f64(), "muted");
    }

    fn set_verbosity(&mut self, setting: Option<&str>) -> GameResult {
        match setting {
            Some("0" | "off") => {
                self.verbose = false;
                self.say(VERBOSE_OFF);
            }
            Some("1" | "on") => {
                self.verbose = true;
                self.say(VERBOSE_ON);
            }
            None => {
                let (current, other) = if self.verbose { ("on", "off") } else { ("off", "on") };
                self.say(format!(
                    "Verbose mode is currently {current}. You can turn it {other} with **`!verbose {other}`**."
                ));
            }
            Some(_) => return Err(GameError::invalid("Usage: **`!verbose [on|off]`**.")),
        }
        info!(verbose = self.verbose, "verbosity");
        Ok(())
    }

    fn modify_roster(&mut self, kind: RosterKind, arg: Option<&str>) -> GameResult {
        let Some(arg) = arg else {
            self.show_roster(kind);
            return Ok(());
        };

        let (adding, member) = match arg.strip_prefix('-') {
            Some(member) => (false, member.trim()),
            None => (true, arg.strip_prefix('+').unwrap_or(arg).trim()),
        };
        let name = kind.as_str();

        let changed = match kind {
            RosterKind::Whitelist => {
                let id: u64 = member.parse().map_err(|_| {
                    GameError::invalid(format!("The {name} takes numeric user ids; `{member}` is not one."))
                })?;
                if adding {
                    self.whitelist.insert(id)
                } else {
                    self.whitelist.shift_remove(&id)
                }
            }
            RosterKind::Pinglist => {
                let member = member.trim_start_matches('@').to_string();
                if adding {
                    self.pinglist.insert(member)
                } else {
                    self.pinglist.shift_remove(&member)
                }
            }
        };

        match (adding, changed) {
            (true, _) => self.say(format!("Adding {member} to the {name}.")),
            (false, true) => self.say(format!("Removing {member} from the {name}.")),
            (false, false) => {
                return Err(GameError::conflict(format!("{member} is not on the {name}.")));
            }
        }

        if changed {
            info!(roster = name, member, adding, "roster changed");
            let roster = self.roster(kind);
            self.persist(Record::Roster(roster));
        }
        Ok(())
    }

    fn show_roster(&mut self, kind: RosterKind) {
        if !self.list_cooldown.try_fire(self.now) {
            debug!(roster = kind.as_str(), "list cooldown active");
            return;
        }

        let members = self.roster(kind).members;
        if members.is_empty() {
            self.say(format!("The {} is empty.", kind.as_str()));
            return;
        }
        let list = members.join(", ");
        let long = list.chars().count() > LONG_LIST;
        self.say_long(list);
        if long {
            self.say("That list is getting kind of long.  You might want to consider pruning those who are no longer active...");
        }
    }

    fn help(&mut self) {
        let name = self
            .bot
            .as_ref()
            .map(|bot| bot.name.clone())
            .unwrap_or_else(|| "the Contact referee".to_string());
        let prefix = self.rules.command_prefix;
        self.say_long(format!(
            "    Hello! I'm {name}, a bot to help with the game of Contact.
    I will try to keep track of the game state and keep the game moving. If you're on my whitelist, you can use the following commands to communicate with me (some are mod-only):
     {prefix}clues                    - list all active clues
     {prefix}unstarred                - list active clues that lost their star
     {prefix}contacts [clueNum]       - list contacts for a specific clue or all clues
     {prefix}unpass                   - undo a \"pass\" if you made a mistake
     {prefix}kill clueNum             - remove a clue from the list of active clues. This will kill anyone's clue, not just your own.
     {prefix}uncontact clueNum        - remove all contacts for clue \"clueNum\"
     {prefix}end                      - end the current game
     {prefix}resume gameId            - pick up an archived game where it was left
     {prefix}stats gameId             - show the stats of an archived game
     {prefix}shutup [minutes]         - silence me completely for the specified amount of time (defaults to {} min)
     {prefix}speak                    - undo a {prefix}shutup command
     {prefix}verbose [on|off]         - in verbose mode, I'll comment more on game events. No parameter lists the current state
     {prefix}whitelist [[+|-]userNum] - add/remove a user from the whitelist, or list users on the whitelist
     {prefix}pinglist [[+|-]userName] - add/remove a user from the pinglist, or list users on the pinglist
     {prefix}ping                     - ping all users on the pinglist to indicate that you want to start a game
     {prefix}shutdown                 - shut me down permanently. I will need to be restarted by the bot owner",
            minutes_of(self.rules.default_mute)
        ));
    }
}

fn refusal(access: Access) -> GameError {
    let message = if access == Access::Anyone {
        "I'm sorry, I've been told not to listen to you. Try asking a mod to add you to the whitelist."
    } else {
        "I don't recognize that command, or you don't have sufficient permission.  Type `!help` for a list of valid commands."
    };
    GameError::forbidden(message).chatty()
}

fn parse_game_id(arg: Option<&str>, command: &str) -> GameResult<Uuid> {
    arg.and_then(|arg| Uuid::parse_str(arg).ok())
        .ok_or_else(|| GameError::invalid(format!("Syntax: **`!{command} <gameId>`**")))
}

fn join_names<'a>(names: impl Iterator<Item = &'a String>) -> String {
    names.map(String::as_str).collect::<Vec<_>>().join(", ")
}

fn minutes_of(length: Duration) -> f64 {
    length.as_secs_f64() / 60.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_ids_must_be_uuids() {
        assert!(parse_game_id(Some("nope"), "resume").is_err());
        assert!(parse_game_id(None, "stats").is_err());
        let id = Uuid::new_v4();
        assert_eq!(parse_game_id(Some(&id.to_string()), "resume"), Ok(id));
    }

    #[test]
    fn untrusted_users_get_the_whitelist_hint() {
        assert!(refusal(Access::Anyone).to_string().contains("whitelist"));
        assert!(refusal(Access::Trusted).to_string().contains("`!help`"));
        assert!(refusal(Access::Anyone).is_chatty());
    }
}
