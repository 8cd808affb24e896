use crate::workflow::validation::parse_chat_id;
use crate::workflow::WorkflowError;

pub const CREATE_USAGE: &str = "Usage: /create_project &lt;project_name&gt; &lt;telegram_chat_id&gt;";
pub const DELETE_USAGE: &str = "Usage: /delete_project &lt;project_name&gt;";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    CreateProject { name: String, chat_id: i64 },
    ListProjects,
    DeleteProject { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Plain text, not a `/command`.
    NotACommand,
    Unknown(String),
    /// Wrong number of arguments; carries the usage line.
    Usage(&'static str),
    /// Arguments present but malformed.
    Invalid(String),
}

impl Command {
    /// Parse a message text such as `/create_project acme -100123` or
    /// `/list_projects@grafana_bot`. A `@mention` of any bot other than
    /// `bot_username` makes the text `NotACommand`.
    pub fn parse(text: &str, bot_username: Option<&str>) -> Result<Command, ParseError> {
        let text = text.trim();
        let Some(rest) = text.strip_prefix('/') else {
            return Err(ParseError::NotACommand);
        };

        let (head, args) = match rest.split_once(char::is_whitespace) {
            Some((head, args)) => (head, args.trim()),
            None => (rest, ""),
        };
        // `/cmd@BotName` addresses a specific bot in group chats.
        let name = match head.split_once('@') {
            Some((name, mention)) => {
                let ours = bot_username
                    .map(|own| own.trim_start_matches('@').eq_ignore_ascii_case(mention))
                    .unwrap_or(false);
                if !ours {
                    return Err(ParseError::NotACommand);
                }
                name
            }
            None => head,
        };

        Self::from_parts(name, args)
    }

    /// Build a command from its name and the raw argument text.
    pub fn from_parts(name: &str, args: &str) -> Result<Command, ParseError> {
        match name.to_ascii_lowercase().as_str() {
            "start" | "help" => Ok(Command::Help),
            "list_projects" => Ok(Command::ListProjects),
            "create_project" => {
                let tokens: Vec<&str> = args.split_whitespace().collect();
                match tokens.as_slice() {
                    [name, chat_id] => {
                        let chat_id = parse_chat_id(chat_id).map_err(|e| match e {
                            WorkflowError::Validation(msg) => ParseError::Invalid(msg),
                            other => ParseError::Invalid(other.to_string()),
                        })?;
                        Ok(Command::CreateProject { name: name.to_string(), chat_id })
                    }
                    _ => Err(ParseError::Usage(CREATE_USAGE)),
                }
            }
            "delete_project" => {
                if args.is_empty() {
                    Err(ParseError::Usage(DELETE_USAGE))
                } else {
                    Ok(Command::DeleteProject { name: args.to_string() })
                }
            }
            other => Err(ParseError::Unknown(other.to_string())),
        }
    }

    /// Commands that change Grafana state.
    pub fn is_mutating(&self) -> bool {
        matches!(self, Command::CreateProject { .. } | Command::DeleteProject { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOT: Option<&str> = Some("grafana_bot");

    #[test]
    fn test_parse_create_project() {
        assert_eq!(
            Command::parse("/create_project acme -1001234567890", BOT),
            Ok(Command::CreateProject { name: "acme".to_string(), chat_id: -1001234567890 })
        );
    }

    #[test]
    fn test_parse_bot_suffix_and_aliases() {
        assert_eq!(Command::parse("/list_projects@Grafana_Bot", BOT), Ok(Command::ListProjects));
        assert_eq!(Command::parse("/start", BOT), Ok(Command::Help));
        assert_eq!(Command::parse("/HELP", BOT), Ok(Command::Help));
    }

    #[test]
    fn test_create_project_usage() {
        assert_eq!(Command::parse("/create_project", BOT), Err(ParseError::Usage(CREATE_USAGE)));
        assert_eq!(Command::parse("/create_project acme", BOT), Err(ParseError::Usage(CREATE_USAGE)));
        assert_eq!(
            Command::parse("/create_project acme 1 extra", BOT),
            Err(ParseError::Usage(CREATE_USAGE))
        );
    }

    #[test]
    fn test_create_project_bad_chat_id() {
        assert!(matches!(Command::parse("/create_project acme abc", BOT), Err(ParseError::Invalid(_))));
    }

    #[test]
    fn test_delete_project_takes_rest_of_line() {
        assert_eq!(
            Command::parse("/delete_project   acme  ", BOT),
            Ok(Command::DeleteProject { name: "acme".to_string() })
        );
        assert_eq!(Command::parse("/delete_project", BOT), Err(ParseError::Usage(DELETE_USAGE)));
    }

    #[test]
    fn test_non_commands_and_unknown() {
        assert_eq!(Command::parse("hello", BOT), Err(ParseError::NotACommand));
        assert_eq!(Command::parse("/frobnicate", BOT), Err(ParseError::Unknown("frobnicate".to_string())));
    }

    #[test]
    fn test_mention_of_another_bot_is_ignored() {
        assert_eq!(
            Command::parse("/delete_project@some_other_bot acme", BOT),
            Err(ParseError::NotACommand)
        );
        assert_eq!(
            Command::parse("/delete_project@grafana_bot acme", BOT),
            Ok(Command::DeleteProject { name: "acme".to_string() })
        );
        // Without a known username no mention can be confirmed as ours.
        assert_eq!(Command::parse("/help@grafana_bot", None), Err(ParseError::NotACommand));
        assert_eq!(Command::parse("/help", None), Ok(Command::Help));
    }

    #[test]
    fn test_mutating_commands() {
        assert!(Command::DeleteProject { name: "x".to_string() }.is_mutating());
        assert!(!Command::ListProjects.is_mutating());
    }
}
