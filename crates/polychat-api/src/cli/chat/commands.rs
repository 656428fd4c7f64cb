//! Slash command parsing for the chat loop.

use console::style;

#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    Help,
    /// Clear the terminal screen.
    Clear,
    /// Exit the chat session.
    Exit,
    /// End the session: the free-tier counter goes back to zero.
    Logout,
    /// Show rounds used and remaining.
    Usage,
    /// Reprint the last round's cards in display order.
    Last,
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input doesn't start with `/`.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let cmd = trimmed
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase();

    match cmd.as_str() {
        "/help" | "/h" | "/?" => Some(ChatCommand::Help),
        "/clear" | "/cls" => Some(ChatCommand::Clear),
        "/exit" | "/quit" | "/q" => Some(ChatCommand::Exit),
        "/logout" => Some(ChatCommand::Logout),
        "/usage" => Some(ChatCommand::Usage),
        "/last" => Some(ChatCommand::Last),
        other => Some(ChatCommand::Unknown(other.to_string())),
    }
}

pub fn print_help() {
    println!();
    println!("  {}", style("Available commands:").bold());
    println!();
    println!("  {}    {}", style("/help").cyan(), "Show this help message");
    println!("  {}   {}", style("/usage").cyan(), "Show free rounds left");
    println!("  {}    {}", style("/last").cyan(), "Show the last answers again");
    println!("  {}  {}", style("/logout").cyan(), "End the session and reset the free tier");
    println!("  {}   {}", style("/clear").cyan(), "Clear the screen");
    println!("  {}    {}", style("/quit").cyan(), "Leave polychat");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exit() {
        assert_eq!(parse("/exit"), Some(ChatCommand::Exit));
        assert_eq!(parse("/quit"), Some(ChatCommand::Exit));
        assert_eq!(parse("/Q"), Some(ChatCommand::Exit));
    }

    #[test]
    fn test_parse_logout() {
        assert_eq!(parse("  /logout  "), Some(ChatCommand::Logout));
    }

    #[test]
    fn test_parse_not_command() {
        assert_eq!(parse("what is /dev/null?"), None);
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(parse("/foo bar"), Some(ChatCommand::Unknown("/foo".to_string())));
    }
}
