use clap::{Args, Subcommand};
use serde::{Serialize, de::DeserializeOwned};

#[derive(Debug, Args)]
pub(crate) struct EntityCommand {
    #[command(subcommand)]
    pub(crate) command: EntitySubcommand,
}

#[derive(Debug, Subcommand)]
pub(crate) enum EntitySubcommand {
    /// Print every record
    List,

    /// Print one record
    Get { id: i64 },

    /// Create (no id) or update (with id) a record from its JSON form
    Save { json: String },

    /// Delete a record
    Delete { id: i64 },
}

pub(crate) fn parse<T: DeserializeOwned>(json: &str) -> Result<T, String> {
    serde_json::from_str(json).map_err(|error| format!("invalid JSON input: {error}"))
}

pub(crate) fn print<T: Serialize>(value: &T) -> Result<(), String> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|error| format!("failed to render JSON: {error}"))?;

    #[expect(clippy::print_stdout, reason = "command output")]
    {
        println!("{rendered}");
    }

    Ok(())
}
