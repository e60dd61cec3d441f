//! Line input parsing
//!
//! Plain lines are submissions. Lines starting with `/` are local commands
//! and never reach the conversation.

/// One parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Submit the text (empty text is ignored by the controller)
    Submit(String),
    /// Store the completion credential
    SetKey(String),
    /// Remove the completion credential
    ClearKey,
    /// Reopen the streaming socket
    Reconnect,
    /// Show local help
    Help,
    /// Leave the session
    Quit,
}

/// Help text for local commands
pub const HELP: &str = "\
Commands:
  /key <value>   store the completion credential (replies come from the API)
  /key           clear it (replies stream over the socket)
  /connect       reopen the streaming socket
  /quit          exit";

/// Parse one input line
#[must_use]
pub fn parse_input(line: &str) -> Input {
    let line = line.trim_end_matches(['\r', '\n']);

    let Some(command) = line.strip_prefix('/') else {
        return Input::Submit(line.to_string());
    };

    let (name, rest) = match command.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };

    match name {
        "key" if rest.is_empty() => Input::ClearKey,
        "key" => Input::SetKey(rest.to_string()),
        "connect" => Input::Reconnect,
        "quit" | "exit" => Input::Quit,
        "help" => Input::Help,
        // Unknown commands are ordinary text
        _ => Input::Submit(line.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_text() {
        assert_eq!(parse_input("Hello there\n"), Input::Submit("Hello there".to_string()));
        assert_eq!(parse_input(""), Input::Submit(String::new()));
    }

    #[test]
    fn test_key_commands() {
        assert_eq!(parse_input("/key sk-or-123"), Input::SetKey("sk-or-123".to_string()));
        assert_eq!(parse_input("/key   spaced  "), Input::SetKey("spaced".to_string()));
        assert_eq!(parse_input("/key"), Input::ClearKey);
        assert_eq!(parse_input("/key   "), Input::ClearKey);
    }

    #[test]
    fn test_other_commands() {
        assert_eq!(parse_input("/connect"), Input::Reconnect);
        assert_eq!(parse_input("/quit"), Input::Quit);
        assert_eq!(parse_input("/exit"), Input::Quit);
        assert_eq!(parse_input("/help"), Input::Help);
        assert_eq!(parse_input("/shrug"), Input::Submit("/shrug".to_string()));
    }
}
