/// A bot command addressed in a message: `/name`, `/name args` or
/// `/name@botname args`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command<'a> {
    /// Lowercased command name without the slash or bot suffix.
    pub name: String,
    /// Bot username after `@`, if present.
    pub bot: Option<&'a str>,
    /// Trimmed remainder of the message. May be empty.
    pub args: &'a str,
}

/// Parse `text` as a command. Returns `None` for plain text.
pub fn parse_command(text: &str) -> Option<Command<'_>> {
    let text = text.trim_start();
    let body = text.strip_prefix('/')?;

    let (head, args) = match body.find(char::is_whitespace) {
        Some(pos) => (&body[..pos], body[pos..].trim()),
        None => (body, ""),
    };
    let (name, bot) = match head.split_once('@') {
        Some((name, bot)) => (name, Some(bot)),
        None => (head, None),
    };

    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }

    Some(Command {
        name: name.to_ascii_lowercase(),
        bot,
        args,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_command() {
        let cmd = parse_command("/start").unwrap();
        assert_eq!(cmd.name, "start");
        assert_eq!(cmd.bot, None);
        assert_eq!(cmd.args, "");
    }

    #[test]
    fn command_with_args_is_trimmed() {
        let cmd = parse_command("/rag   What is Claude?  ").unwrap();
        assert_eq!(cmd.name, "rag");
        assert_eq!(cmd.args, "What is Claude?");
    }

    #[test]
    fn command_addressed_to_bot() {
        let cmd = parse_command("/ctx@ctx_helper_bot safety research").unwrap();
        assert_eq!(cmd.name, "ctx");
        assert_eq!(cmd.bot, Some("ctx_helper_bot"));
        assert_eq!(cmd.args, "safety research");
    }

    #[test]
    fn multiline_args_are_kept() {
        let cmd = parse_command("/ask first line\nsecond line").unwrap();
        assert_eq!(cmd.args, "first line\nsecond line");
    }

    #[test]
    fn plain_text_and_paths_are_not_commands() {
        assert_eq!(parse_command("hello there"), None);
        assert_eq!(parse_command("/"), None);
        assert_eq!(parse_command("/tmp/file.txt"), None);
    }

    #[test]
    fn name_is_lowercased() {
        assert_eq!(parse_command("/RAG x").unwrap().name, "rag");
    }
}
