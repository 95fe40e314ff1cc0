use crate::domain::{Location, LocationId, RankedLocation};
use crate::geocoding::Geocoder;
use crate::ranking::find_nearest;
use crate::store::StoreHandle;
use std::io;
use std::str::FromStr;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::LinesStream;
use tracing::{debug, instrument};

pub const HELP: &str = "\
Commands:
  find <address>                 list the nearest locations to an address
  list                           show all locations
  add <name> | <address>         add a location
  edit <id> <name> | <address>   change the name and address of a location
  delete <id>                    remove a location
  help                           show this help
  quit                           exit";

#[derive(Debug, PartialEq)]
pub enum ConsoleCommand {
    Find(String),
    List,
    Add { name: String, address: String },
    Edit { id: LocationId, name: String, address: String },
    Delete(LocationId),
    Help,
    Quit,
}

impl FromStr for ConsoleCommand {
    type Err = ConsoleCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (keyword, rest) = match line.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest.trim()),
            None => (line, ""),
        };

        match keyword.to_lowercase().as_str() {
            "" => Err(ConsoleCommandError::Empty),
            "find" => Ok(ConsoleCommand::Find(rest.to_string())),
            "list" => Ok(ConsoleCommand::List),
            "help" => Ok(ConsoleCommand::Help),
            "quit" | "exit" => Ok(ConsoleCommand::Quit),
            "add" => {
                let (name, address) = name_and_address(rest)?;
                Ok(ConsoleCommand::Add { name, address })
            }
            "edit" => {
                let (id, rest) = rest.split_once(char::is_whitespace).ok_or(ConsoleCommandError::MissingArguments("edit"))?;
                let (name, address) = name_and_address(rest)?;
                Ok(ConsoleCommand::Edit {
                    id: parse_id(id)?,
                    name,
                    address,
                })
            }
            "delete" => Ok(ConsoleCommand::Delete(parse_id(rest)?)),
            other => Err(ConsoleCommandError::Unknown(other.to_string())),
        }
    }
}

fn name_and_address(arguments: &str) -> Result<(String, String), ConsoleCommandError> {
    let (name, address) = arguments.split_once('|').ok_or(ConsoleCommandError::MissingSeparator)?;
    Ok((name.trim().to_string(), address.trim().to_string()))
}

fn parse_id(value: &str) -> Result<LocationId, ConsoleCommandError> {
    value.trim().parse().map_err(|_| ConsoleCommandError::InvalidId(value.trim().to_string()))
}

#[derive(Error, Debug, PartialEq)]
pub enum ConsoleCommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}', type 'help' for a list of commands")]
    Unknown(String),
    #[error("missing arguments for '{0}', type 'help' for usage")]
    MissingArguments(&'static str),
    #[error("separate the name and the address with '|'")]
    MissingSeparator,
    #[error("invalid location id '{0}'")]
    InvalidId(String),
}

/// Reads commands from stdin until it closes or `quit` is entered.
///
/// A command runs to completion before the next line is read, so queries never overlap.
#[instrument(skip_all)]
pub async fn run(geocoder: &dyn Geocoder, store: &StoreHandle, limit: usize) -> io::Result<()> {
    let mut lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());
    println!("{}", HELP);

    while let Some(line) = lines.next().await {
        match line?.parse::<ConsoleCommand>() {
            Ok(ConsoleCommand::Quit) => break,
            Ok(command) => {
                debug!(?command, "⌨️ Executing command");
                println!("{}", execute(command, geocoder, store, limit).await);
            }
            Err(ConsoleCommandError::Empty) => {}
            Err(e) => println!("{}", e),
        }
    }

    Ok(())
}

/// Runs a single command and renders its outcome.
pub async fn execute(command: ConsoleCommand, geocoder: &dyn Geocoder, store: &StoreHandle, limit: usize) -> String {
    match command {
        ConsoleCommand::Find(address) => match find_nearest(&address, geocoder, store, limit).await {
            Ok(ranked) if ranked.is_empty() => "No locations could be located.".to_string(),
            Ok(ranked) => render_ranking(&ranked),
            Err(e) => format!("Error: {}", e),
        },
        ConsoleCommand::List => render_locations(&store.snapshot()),
        ConsoleCommand::Add { name, address } => match store.add(&name, &address).await {
            Ok(location) => format!("Added \"{}\" with id {}.", location.name(), location.id()),
            Err(e) => format!("Error: {}", e),
        },
        ConsoleCommand::Edit { id, name, address } => match store.edit(id, &name, &address).await {
            Ok(location) => format!("Updated \"{}\".", location.name()),
            Err(e) => format!("Error: {}", e),
        },
        ConsoleCommand::Delete(id) => match store.delete(id).await {
            Ok(location) => format!("Deleted \"{}\".", location.name()),
            Err(e) => format!("Error: {}", e),
        },
        ConsoleCommand::Help => HELP.to_string(),
        ConsoleCommand::Quit => String::new(),
    }
}

fn render_ranking(ranked: &[RankedLocation]) -> String {
    ranked
        .iter()
        .enumerate()
        .map(|(index, location)| format!("{}. {} - {} ({:.2} km)", index + 1, location.name(), location.address(), location.distance_km()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_locations(locations: &[Location]) -> String {
    if locations.is_empty() {
        return "No locations yet.".to_string();
    }

    locations
        .iter()
        .map(|location| {
            let state = match location.coordinates() {
                Some(c) => format!("{:.4}, {:.4}", c.latitude(), c.longitude()),
                None => "unresolved".to_string(),
            };
            format!("[{}] {} - {} ({})", location.id(), location.name(), location.address(), state)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
