//! `(price)`: the price of the originating command.

use tracing::warn;

use crate::context::ResolutionContext;
use crate::pipeline::Resolver;

/// `"<price> <points name>"`, with `0` when the command has no enabled price.
pub(crate) async fn price(resolver: &Resolver, ctx: &ResolutionContext) -> String {
    let collaborators = resolver.collaborators();
    let amount = match &ctx.command {
        Some(command) => match collaborators.prices.prices().await {
            Ok(prices) => prices
                .into_iter()
                .find(|p| p.command == *command)
                .map_or(0, |p| p.price),
            Err(e) => {
                warn!(command = %command, error = %e, "price lookup failed");
                0
            }
        },
        None => 0,
    };
    format!("{amount} {}", collaborators.points.points_name(amount))
}
