//! Detect a running vanilla launcher or game.
//!
//! Best effort: the launcher rewrites `launcher_profiles.json` when it exits,
//! so front-ends warn when it is running. Nothing here blocks an install.

use once_cell::sync::Lazy;
use regex::Regex;
use sysinfo::{ProcessRefreshKind, RefreshKind, System, UpdateKind};

/// Absolute path of the Linux launcher binary. A relative launch won't match.
static LAUNCHER_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^/opt/minecraft-launcher/minecraft-launcher").ok());

/// Argument the launcher always passes to the game
static GAME_LAUNCH_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"-Dminecraft\.launcher\.brand=minecraft-launcher").ok());

/// Main classes of vanilla, modlauncher (Forge 1.13+) and launchwrapper (older Forge)
static GAME_CLASS_RE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"net\.minecraft\.client\.main\.Main|cpw\.mods\.modlauncher\.Launcher|net\.minecraft\.launchwrapper\.Launch",
    )
    .ok()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum McProcessRunning {
    None,
    Launcher,
    Game,
    LauncherAndGame,
}

impl McProcessRunning {
    fn from_flags(launcher: bool, game: bool) -> Self {
        match (launcher, game) {
            (true, true) => Self::LauncherAndGame,
            (true, false) => Self::Launcher,
            (false, true) => Self::Game,
            (false, false) => Self::None,
        }
    }

    pub fn is_running(self) -> bool {
        self != Self::None
    }
}

fn matches(re: &Lazy<Option<Regex>>, text: &str) -> bool {
    re.as_ref().is_some_and(|re| re.is_match(text))
}

pub fn is_launcher_command(command_line: &str) -> bool {
    matches(&LAUNCHER_RE, command_line)
}

pub fn is_game_command(command_line: &str) -> bool {
    matches(&GAME_LAUNCH_RE, command_line) && matches(&GAME_CLASS_RE, command_line)
}

/// Classify a set of command lines (arguments joined by spaces).
pub fn classify_commands<I, S>(command_lines: I) -> McProcessRunning
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut launcher = false;
    let mut game = false;
    for line in command_lines {
        let line = line.as_ref();
        launcher = launcher || is_launcher_command(line);
        game = game || is_game_command(line);
        if launcher && game {
            break;
        }
    }
    McProcessRunning::from_flags(launcher, game)
}

/// Scan the process table. Processes without a command line are ignored.
pub fn detect_running_minecraft() -> McProcessRunning {
    let sys = System::new_with_specifics(
        RefreshKind::nothing()
            .with_processes(ProcessRefreshKind::nothing().with_cmd(UpdateKind::Always)),
    );
    let command_lines = sys.processes().values().filter_map(|process| {
        let args: Vec<String> = process
            .cmd()
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        (!args.is_empty()).then(|| args.join(" "))
    });
    classify_commands(command_lines)
}
