use thiserror::Error;

/// A line typed into the interactive session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quantity(String),
    Volatility(String),
    Tier(String),
    Send,
    Connect,
    Disconnect,
    Show,
    Raw,
    Tiers,
    Status,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command '{0}', type 'help' for a list")]
    Unknown(String),

    #[error("'{0}' needs a value")]
    MissingArgument(&'static str),
}

pub const HELP: &str = "\
Commands:
  qty <n>             set the order quantity in USD
  vol <n>             set the volatility
  tier <index|name>   select a fee tier
  send                send the current parameters
  connect             connect to the backend
  disconnect          close the connection
  show                print the dashboard
  raw                 print the last raw message
  tiers               list fee tiers
  status              print the connection status
  help                show this help
  quit                close the connection and exit";

impl Command {
    /// Parses one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let argument = |name: &'static str| {
            if rest.is_empty() {
                Err(CommandError::MissingArgument(name))
            } else {
                Ok(rest.to_string())
            }
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "qty" | "quantity" => Command::Quantity(argument("qty")?),
            "vol" | "volatility" => Command::Volatility(argument("vol")?),
            "tier" => Command::Tier(argument("tier")?),
            "send" => Command::Send,
            "connect" => Command::Connect,
            "disconnect" => Command::Disconnect,
            "show" => Command::Show,
            "raw" => Command::Raw,
            "tiers" => Command::Tiers,
            "status" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Command::parse("qty 2500").unwrap(),
            Some(Command::Quantity("2500".to_string()))
        );
        assert_eq!(
            Command::parse("  tier   VIP 1 ").unwrap(),
            Some(Command::Tier("VIP 1".to_string()))
        );
        assert_eq!(Command::parse("SEND").unwrap(), Some(Command::Send));
        assert_eq!(Command::parse("exit").unwrap(), Some(Command::Quit));
        assert_eq!(Command::parse("   ").unwrap(), None);
    }

    #[test]
    fn test_vol_keeps_raw_text() {
        // Coercion happens when the form is read, not here.
        assert_eq!(
            Command::parse("vol abc").unwrap(),
            Some(Command::Volatility("abc".to_string()))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            Command::parse("qty"),
            Err(CommandError::MissingArgument("qty"))
        );
        assert_eq!(
            Command::parse("buy 1"),
            Err(CommandError::Unknown("buy".to_string()))
        );
    }
}
