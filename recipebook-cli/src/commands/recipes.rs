//! Recipes command - fetch and list the stored recipes

use anyhow::Result;

use recipebook_core::services::EntryPoint;
use recipebook_core::OperationResult;

use super::{get_context, log_command, spinner};
use crate::output;

pub async fn run(json: bool) -> Result<()> {
    let ctx = get_context(EntryPoint::Cli)?;
    log_command(&ctx, "recipes");

    if ctx.auth_service.auto_login().is_none() {
        anyhow::bail!("Not logged in. Run 'rb login' first.");
    }

    let progress = spinner("Fetching recipes...");
    let result = ctx.data_storage_service.fetch_recipes().await;
    progress.finish_and_clear();
    let recipes = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&OperationResult::ok(recipes))?);
        return Ok(());
    }

    if recipes.is_empty() {
        output::warning("No recipes stored yet. Add some with 'rb shell'.");
        return Ok(());
    }

    println!("{}", output::recipe_table(&recipes));
    Ok(())
}
