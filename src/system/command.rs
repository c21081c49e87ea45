//! Serial command grammar.
//!
//! Lines typed on the device's serial console are matched against a fixed,
//! ordered table of rules. The first rule whose pattern matches decides the
//! command; matching is case-sensitive and, except for chat lines, looks for
//! the pattern anywhere in the line.
//!
//! | Pattern            | Command                              |
//! |--------------------|--------------------------------------|
//! | `/v ok`            | [`Choice::Ok`]                       |
//! | `/v neka`          | [`Choice::Neka`]                     |
//! | `/v lyckas`        | [`Choice::Lyckas`]                   |
//! | `/v sabotage`      | [`Choice::Sabotage`]                 |
//! | `/v starta`        | [`Choice::Starta`]                   |
//! | starts with `:`    | [`Command::Chat`] with the remainder |
//! | `/r reg`           | [`Request::Register`]                |
//! | `/r csr`           | [`Request::Certificate`]             |
//! | `/r start`         | [`Request::StartGame`]               |
//!
//! ```rust
//! use stationlink::system::command::{classify, Choice, Command};
//!
//! assert_eq!(classify("please /v ok now"), Command::Choice(Choice::Ok));
//! assert_eq!(classify(":hello"), Command::Chat("hello"));
//! assert_eq!(classify("garbage"), Command::Unrecognized);
//! ```

use crate::signal::Bit;

/// A vote published to the player's uplink topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    /// Accept.
    Ok,
    /// Refuse.
    Neka,
    /// Mission succeeded.
    Lyckas,
    /// Sabotage the mission.
    Sabotage,
    /// Start the game.
    Starta,
}

impl Choice {
    /// Value carried in the `val` field of the published message.
    pub const fn as_str(self) -> &'static str {
        match self {
            Choice::Ok => "ok",
            Choice::Neka => "neka",
            Choice::Lyckas => "lyckas",
            Choice::Sabotage => "sabotage",
            Choice::Starta => "starta",
        }
    }
}

/// A local trigger for another subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Register the player with the game server.
    Register,
    /// Send a certificate signing request.
    Certificate,
    /// Start the game.
    StartGame,
}

impl Request {
    /// Readiness bit raised for this request.
    pub const fn bit(self) -> Bit {
        match self {
            Request::Register => Bit::RegistrationRequested,
            Request::Certificate => Bit::CertificateRequested,
            Request::StartGame => Bit::GameStartRequested,
        }
    }

    /// Name used in diagnostics.
    pub const fn as_str(self) -> &'static str {
        match self {
            Request::Register => "register",
            Request::Certificate => "certificate",
            Request::StartGame => "start_game",
        }
    }
}

/// Classification of one received line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// Publish a vote.
    Choice(Choice),
    /// Publish a chat message; holds the text after the leading `:`.
    Chat(&'a str),
    /// Raise a readiness bit.
    Request(Request),
    /// Nothing matched.
    Unrecognized,
}

/// How a rule recognises its line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// The literal appears anywhere in the line.
    Contains(&'static str),
    /// The line begins with the character.
    StartsWith(char),
}

impl Pattern {
    /// Test the pattern against a line.
    pub fn matches(&self, line: &str) -> bool {
        match *self {
            Pattern::Contains(literal) => line.contains(literal),
            Pattern::StartsWith(c) => line.starts_with(c),
        }
    }
}

/// What a matching rule produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// A vote.
    Choice(Choice),
    /// A chat line.
    Chat,
    /// A local request.
    Request(Request),
}

/// One row of the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    /// Matcher for the line.
    pub pattern: Pattern,
    /// Command produced on match.
    pub kind: Kind,
}

/// The command grammar, in priority order.
pub const GRAMMAR: &[Rule] = &[
    Rule { pattern: Pattern::Contains("/v ok"), kind: Kind::Choice(Choice::Ok) },
    Rule { pattern: Pattern::Contains("/v neka"), kind: Kind::Choice(Choice::Neka) },
    Rule { pattern: Pattern::Contains("/v lyckas"), kind: Kind::Choice(Choice::Lyckas) },
    Rule { pattern: Pattern::Contains("/v sabotage"), kind: Kind::Choice(Choice::Sabotage) },
    Rule { pattern: Pattern::Contains("/v starta"), kind: Kind::Choice(Choice::Starta) },
    Rule { pattern: Pattern::StartsWith(':'), kind: Kind::Chat },
    Rule { pattern: Pattern::Contains("/r reg"), kind: Kind::Request(Request::Register) },
    Rule { pattern: Pattern::Contains("/r csr"), kind: Kind::Request(Request::Certificate) },
    Rule { pattern: Pattern::Contains("/r start"), kind: Kind::Request(Request::StartGame) },
];

/// Classify a line against [`GRAMMAR`].
pub fn classify(line: &str) -> Command<'_> {
    classify_with(GRAMMAR, line)
}

/// Classify a line against an arbitrary rule table.
pub fn classify_with<'a>(rules: &[Rule], line: &'a str) -> Command<'a> {
    for rule in rules {
        if !rule.pattern.matches(line) {
            continue;
        }
        return match rule.kind {
            Kind::Choice(choice) => Command::Choice(choice),
            Kind::Chat => Command::Chat(line.get(1..).unwrap_or("")),
            Kind::Request(request) => Command::Request(request),
        };
    }
    Command::Unrecognized
}
