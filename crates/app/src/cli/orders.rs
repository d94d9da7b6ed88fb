use inventory_app::{context::AppContext, domain::orders::models::OrderDetails};

use super::entity::{EntityCommand, EntitySubcommand, parse, print};

pub(crate) async fn run(context: &AppContext, command: EntityCommand) -> Result<(), String> {
    let service = &context.orders;

    match command.command {
        EntitySubcommand::List => print(
            &service
                .get_all()
                .await
                .map_err(|error| format!("failed to list orders: {error}"))?,
        ),
        EntitySubcommand::Get { id } => print(
            &service
                .get_by_id(id)
                .await
                .map_err(|error| format!("failed to get order {id}: {error}"))?,
        ),
        EntitySubcommand::Save { json } => print(
            &service
                .save(parse::<OrderDetails>(&json)?)
                .await
                .map_err(|error| format!("failed to save order: {error}"))?,
        ),
        EntitySubcommand::Delete { id } => service
            .delete(id)
            .await
            .map_err(|error| format!("failed to delete order {id}: {error}")),
    }
}
