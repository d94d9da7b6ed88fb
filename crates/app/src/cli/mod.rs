use clap::{Parser, Subcommand};
use inventory_app::{
    config::{DatabaseConfig, LoggingConfig},
    context::AppContext,
};

mod categories;
mod db;
mod entity;
mod orders;
mod products;

#[derive(Debug, Parser)]
#[command(name = "inventory-app", about = "Inventory CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) logging: LoggingConfig,

    #[command(flatten)]
    database: DatabaseConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Schema management
    Db(db::DbCommand),

    /// Products and their categories
    Products(entity::EntityCommand),

    /// Product categories
    Categories(entity::EntityCommand),

    /// Orders and their line items
    Orders(entity::EntityCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        let context = AppContext::from_config(&self.database)
            .await
            .map_err(|error| format!("failed to initialise application: {error}"))?;

        match self.command {
            Commands::Db(command) => db::run(&context, command).await,
            Commands::Products(command) => products::run(&context, command).await,
            Commands::Categories(command) => categories::run(&context, command).await,
            Commands::Orders(command) => orders::run(&context, command).await,
        }
    }
}
