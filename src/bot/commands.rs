//! Slash commands understood by the bot.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Profile,
    Admin,
    /// Raw id tokens; each is validated separately.
    Enroll(Vec<String>),
    Who(i64),
    Users,
    Participants,
    Results,
    Questions,
    NewTest(Option<u32>),
    NewClosed,
    Done,
    Cancel,
    StartTest,
    FinishTests,
    ClearQuestions,
    ClearParticipants,
    Announce(String),
}

/// Commands shown on the admin panel keyboard.
pub const ADMIN_PANEL: &[&[&str]] = &[
    &["/questions", "/users"],
    &["/participants", "/results"],
    &["/clearquestions", "/clearparticipants"],
    &["/newtest", "/newclosed"],
    &["/starttest", "/finishtests"],
];

impl Command {
    /// Parses `/name[@bot] args`; `None` for plain text, unknown commands or
    /// missing/invalid arguments.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let rest = text.strip_prefix('/')?;
        let (head, args) = match rest.split_once(char::is_whitespace) {
            Some((head, args)) => (head, args.trim()),
            None => (rest, ""),
        };
        let name = head.split('@').next().unwrap_or(head).to_ascii_lowercase();

        let command = match name.as_str() {
            "start" => Command::Start,
            "profile" => Command::Profile,
            "admin" => Command::Admin,
            "enroll" => Command::Enroll(
                args.split(|c: char| c == ',' || c.is_whitespace())
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect(),
            ),
            "who" => Command::Who(args.parse().ok()?),
            "users" => Command::Users,
            "participants" => Command::Participants,
            "results" => Command::Results,
            "questions" => Command::Questions,
            "newtest" if args.is_empty() => Command::NewTest(None),
            "newtest" => Command::NewTest(Some(args.parse().ok().filter(|n| *n > 0)?)),
            "newclosed" => Command::NewClosed,
            "done" => Command::Done,
            "cancel" => Command::Cancel,
            "starttest" => Command::StartTest,
            "finishtests" => Command::FinishTests,
            "clearquestions" => Command::ClearQuestions,
            "clearparticipants" => Command::ClearParticipants,
            "announce" if !args.is_empty() => Command::Announce(args.to_string()),
            _ => return None,
        };
        Some(command)
    }

    pub fn is_admin_only(&self) -> bool {
        !matches!(self, Command::Start | Command::Profile)
    }

    /// Commands that change the question bank through a wizard.
    pub fn needs_main_admin(&self) -> bool {
        matches!(self, Command::NewTest(_) | Command::NewClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_addressed_commands() {
        assert_eq!(Command::parse("/start"), Some(Command::Start));
        assert_eq!(Command::parse("/results@quiz_bot"), Some(Command::Results));
        assert_eq!(Command::parse("  /USERS "), Some(Command::Users));
    }

    #[test]
    fn parses_arguments() {
        assert_eq!(Command::parse("/newtest"), Some(Command::NewTest(None)));
        assert_eq!(Command::parse("/newtest 12"), Some(Command::NewTest(Some(12))));
        assert_eq!(Command::parse("/newtest x"), None);
        assert_eq!(Command::parse("/who 42"), Some(Command::Who(42)));
        assert_eq!(Command::parse("/who"), None);
        assert_eq!(
            Command::parse("/enroll 1, 2 abc"),
            Some(Command::Enroll(vec!["1".into(), "2".into(), "abc".into()]))
        );
        assert_eq!(
            Command::parse("/announce hello all"),
            Some(Command::Announce("hello all".into()))
        );
        assert_eq!(Command::parse("/announce"), None);
    }

    #[test]
    fn wizard_tokens_are_not_commands() {
        assert_eq!(Command::parse("/skip"), None);
        assert_eq!(Command::parse("Paris,London"), None);
        assert_eq!(Command::parse("3"), None);
    }

    #[test]
    fn roles() {
        assert!(!Command::Start.is_admin_only());
        assert!(Command::Results.is_admin_only());
        assert!(Command::NewClosed.needs_main_admin());
        assert!(!Command::StartTest.needs_main_admin());
    }
}
