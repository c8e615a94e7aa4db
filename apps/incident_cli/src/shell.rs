//! Line syntax of the interactive session.

use shared::domain::{IncidentId, IncidentStatus};

pub const HELP: &str = "\
commands:
  show                          print the table as last rendered
  refresh                       refetch incidents from the server
  add <title> | <description>   create an open incident
  set <id> <status>             pick a status (open, inprogress, closed)
  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Empty,
    Help,
    Quit,
    Show,
    Refresh,
    Add { title: String, description: String },
    Set { id: IncidentId, status: IncidentStatus },
}

pub fn parse(line: &str) -> Result<Input, String> {
    let line = line.trim();
    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(word, rest)| (word, rest.trim()));

    match word {
        "" => Ok(Input::Empty),
        "help" | "?" => Ok(Input::Help),
        "quit" | "exit" => Ok(Input::Quit),
        "show" => Ok(Input::Show),
        "refresh" => Ok(Input::Refresh),
        "add" => {
            let (title, description) = rest.split_once('|').unwrap_or((rest, ""));
            Ok(Input::Add {
                title: title.to_string(),
                description: description.to_string(),
            })
        }
        "set" => {
            let mut parts = rest.split_whitespace();
            let (Some(id), Some(status), None) = (parts.next(), parts.next(), parts.next()) else {
                return Err("usage: set <id> <status>".to_string());
            };
            let id = id
                .parse::<i64>()
                .map_err(|_| format!("'{id}' is not an incident id"))?;
            let status = status.parse::<IncidentStatus>().map_err(|err| err.to_string())?;
            Ok(Input::Set {
                id: IncidentId(id),
                status,
            })
        }
        other => Err(format!("unknown command '{other}'; type 'help'")),
    }
}
