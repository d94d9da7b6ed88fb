use inventory_app::{context::AppContext, domain::products::models::Product};

use super::entity::{EntityCommand, EntitySubcommand, parse, print};

pub(crate) async fn run(context: &AppContext, command: EntityCommand) -> Result<(), String> {
    let service = &context.products;

    match command.command {
        EntitySubcommand::List => print(
            &service
                .get_all()
                .await
                .map_err(|error| format!("failed to list products: {error}"))?,
        ),
        EntitySubcommand::Get { id } => print(
            &service
                .get_by_id(id)
                .await
                .map_err(|error| format!("failed to get product {id}: {error}"))?,
        ),
        EntitySubcommand::Save { json } => print(
            &service
                .save(parse::<Product>(&json)?)
                .await
                .map_err(|error| format!("failed to save product: {error}"))?,
        ),
        EntitySubcommand::Delete { id } => service
            .delete(id)
            .await
            .map_err(|error| format!("failed to delete product {id}: {error}")),
    }
}
