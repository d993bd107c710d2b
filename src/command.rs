/// What an incoming chat line asks the bot to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Help,
    /// Arguments after the command word (date token, sort flag).
    Report(&'a str),
    Reset,
    Undo,
    /// Anything that is not a known command is treated as a transaction entry.
    Record(&'a str),
}

/// Command aliases, longest first so `/reset` is never captured by `/r`.
const ALIASES: [(&str, Kind); 8] = [
    ("/report", Kind::Report),
    ("/reset", Kind::Reset),
    ("/start", Kind::Help),
    ("/help", Kind::Help),
    ("/undo", Kind::Undo),
    ("/r", Kind::Report),
    ("/x", Kind::Reset),
    ("/u", Kind::Undo),
];

#[derive(Clone, Copy)]
enum Kind {
    Help,
    Report,
    Reset,
    Undo,
}

/// Matches the start of `text` against the command aliases.
///
/// The longest alias that prefixes the first word wins, and whatever follows it
/// (`/reportaz`, `/r03/2024`) counts as arguments. A `@botname` suffix on the
/// command word (used when addressing a bot in a group chat) is ignored.
pub fn parse_command(text: &str) -> Command<'_> {
    let trimmed = text.trim_start();
    let (word, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r),
        None => (trimmed, ""),
    };
    let (word, mentioned) = match word.split_once('@') {
        Some((w, _)) => (w, true),
        None => (word, false),
    };

    let Some((alias, kind)) = ALIASES.iter().find(|(alias, _)| word.starts_with(*alias)) else {
        return Command::Record(text);
    };

    match kind {
        Kind::Help => Command::Help,
        Kind::Report if mentioned => Command::Report(rest.trim()),
        Kind::Report => Command::Report(trimmed[alias.len()..].trim()),
        Kind::Reset => Command::Reset,
        Kind::Undo => Command::Undo,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_route_to_the_same_command() {
        assert_eq!(parse_command("/start"), Command::Help);
        assert_eq!(parse_command("/help"), Command::Help);
        assert_eq!(parse_command("/r"), Command::Report(""));
        assert_eq!(parse_command("/report"), Command::Report(""));
        assert_eq!(parse_command("/x"), Command::Reset);
        assert_eq!(parse_command("/reset"), Command::Reset);
        assert_eq!(parse_command("/u"), Command::Undo);
        assert_eq!(parse_command("/undo"), Command::Undo);
    }

    #[test]
    fn report_keeps_its_arguments() {
        assert_eq!(
            parse_command("/report 15/03/2024  za"),
            Command::Report("15/03/2024  za")
        );
        assert_eq!(parse_command("/r az"), Command::Report("az"));
    }

    #[test]
    fn reset_is_not_shadowed_by_report_alias() {
        assert_eq!(parse_command("/reset now"), Command::Reset);
        assert_eq!(parse_command("/undo"), Command::Undo);
    }

    #[test]
    fn group_chat_mentions_are_stripped() {
        assert_eq!(parse_command("/report@thuchi_bot 03/2024"), Command::Report("03/2024"));
        assert_eq!(parse_command("/help@thuchi_bot"), Command::Help);
    }

    #[test]
    fn attached_report_arguments_are_kept() {
        assert_eq!(parse_command("/reportaz"), Command::Report("az"));
        assert_eq!(parse_command("/r03/2024 za"), Command::Report("03/2024 za"));
        assert_eq!(parse_command("/resetall"), Command::Reset);
        assert_eq!(parse_command("/undone"), Command::Undo);
    }

    #[test]
    fn everything_else_is_a_transaction_entry() {
        assert_eq!(parse_command("+500k Lương"), Command::Record("+500k Lương"));
        assert_eq!(parse_command("/what"), Command::Record("/what"));
        assert_eq!(parse_command("/"), Command::Record("/"));
        assert_eq!(parse_command("hello"), Command::Record("hello"));
        assert_eq!(parse_command(""), Command::Record(""));
    }

    #[test]
    fn commands_are_case_sensitive() {
        assert_eq!(parse_command("/Report"), Command::Record("/Report"));
    }
}
