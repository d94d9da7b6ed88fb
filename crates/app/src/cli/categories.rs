use inventory_app::{context::AppContext, domain::categories::models::ProductCategory};

use super::entity::{EntityCommand, EntitySubcommand, parse, print};

pub(crate) async fn run(context: &AppContext, command: EntityCommand) -> Result<(), String> {
    let service = &context.categories;

    match command.command {
        EntitySubcommand::List => print(
            &service
                .get_all()
                .await
                .map_err(|error| format!("failed to list categories: {error}"))?,
        ),
        EntitySubcommand::Get { id } => print(
            &service
                .get_by_id(id)
                .await
                .map_err(|error| format!("failed to get category {id}: {error}"))?,
        ),
        EntitySubcommand::Save { json } => print(
            &service
                .save(parse::<ProductCategory>(&json)?)
                .await
                .map_err(|error| format!("failed to save category: {error}"))?,
        ),
        EntitySubcommand::Delete { id } => service
            .delete(id)
            .await
            .map_err(|error| format!("failed to delete category {id}: {error}")),
    }
}
