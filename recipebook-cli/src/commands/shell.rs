//! Shell command - interactive session over one context
//!
//! The shell keeps a single `RecipeBookContext` for the whole process, so the
//! in-memory shopping list and recipe edits survive between commands. After
//! each command, snapshots published on the change channels are rendered for
//! the current view.

use std::io::{self, BufRead, Write};

use anyhow::{anyhow, bail, Result};
use colored::Colorize;
use dialoguer::{Confirm, Input, Select};
use tokio::runtime::Handle;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::sync::watch;

use recipebook_core::ports::Navigator;
use recipebook_core::services::EntryPoint;
use recipebook_core::{Ingredient, Recipe, RecipeBookContext, User, View};

use super::auth::{self, AuthMode};
use super::{get_context, log_command, spinner};
use crate::output;

/// A parsed shell line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellCommand {
    Recipes,
    Recipe(usize),
    NewRecipe,
    EditRecipe(usize),
    DeleteRecipe(usize),
    ToShopping(usize),
    Shopping,
    AddItem,
    EditItem(usize),
    DeleteItem(usize),
    Save,
    Fetch,
    Login,
    Signup,
    Logout,
    Help,
    Quit,
}

const HELP: &[(&str, &str)] = &[
    ("recipes", "List recipes (fetches them if none are loaded)"),
    ("recipe <i>", "Show recipe i"),
    ("new-recipe", "Create a recipe"),
    ("edit-recipe <i>", "Edit recipe i"),
    ("delete-recipe <i>", "Delete recipe i"),
    ("to-shopping <i>", "Add the ingredients of recipe i to the shopping list"),
    ("shopping", "Show the shopping list"),
    ("add-item", "Add an item to the shopping list"),
    ("edit-item <i>", "Edit or delete shopping list item i"),
    ("delete-item <i>", "Delete shopping list item i"),
    ("save", "Save all recipes to the server"),
    ("fetch", "Load recipes from the server"),
    ("login / signup", "Authenticate"),
    ("logout", "Log out"),
    ("help", "Show this help"),
    ("quit", "Leave the shell"),
];

impl ShellCommand {
    /// Parse one input line; blank lines yield `None`
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(None);
        };
        let arg = words.next();
        if words.next().is_some() {
            bail!("Too many arguments for '{}'", name);
        }

        let index = || -> Result<usize> {
            let raw = arg.ok_or_else(|| anyhow!("'{}' needs an index", name))?;
            raw.parse()
                .map_err(|_| anyhow!("'{}' is not a valid index", raw))
        };
        let no_arg = |command: ShellCommand| -> Result<ShellCommand> {
            match arg {
                Some(_) => bail!("'{}' takes no arguments", name),
                None => Ok(command),
            }
        };

        let command = match name {
            "recipes" => no_arg(ShellCommand::Recipes)?,
            "recipe" => ShellCommand::Recipe(index()?),
            "new-recipe" => no_arg(ShellCommand::NewRecipe)?,
            "edit-recipe" => ShellCommand::EditRecipe(index()?),
            "delete-recipe" => ShellCommand::DeleteRecipe(index()?),
            "to-shopping" => ShellCommand::ToShopping(index()?),
            "shopping" => no_arg(ShellCommand::Shopping)?,
            "add-item" => no_arg(ShellCommand::AddItem)?,
            "edit-item" => ShellCommand::EditItem(index()?),
            "delete-item" => ShellCommand::DeleteItem(index()?),
            "save" => no_arg(ShellCommand::Save)?,
            "fetch" => no_arg(ShellCommand::Fetch)?,
            "login" => no_arg(ShellCommand::Login)?,
            "signup" => no_arg(ShellCommand::Signup)?,
            "logout" => no_arg(ShellCommand::Logout)?,
            "help" | "?" => no_arg(ShellCommand::Help)?,
            "quit" | "exit" => no_arg(ShellCommand::Quit)?,
            other => bail!("Unknown command '{}'. Type 'help' for a list.", other),
        };
        Ok(Some(command))
    }

    /// Commands behind the auth guard
    pub fn requires_auth(&self) -> bool {
        matches!(
            self,
            ShellCommand::Recipes
                | ShellCommand::Recipe(_)
                | ShellCommand::NewRecipe
                | ShellCommand::EditRecipe(_)
                | ShellCommand::DeleteRecipe(_)
                | ShellCommand::ToShopping(_)
                | ShellCommand::Save
                | ShellCommand::Fetch
        )
    }

    fn name(&self) -> &'static str {
        match self {
            ShellCommand::Recipes => "recipes",
            ShellCommand::Recipe(_) => "recipe",
            ShellCommand::NewRecipe => "new-recipe",
            ShellCommand::EditRecipe(_) => "edit-recipe",
            ShellCommand::DeleteRecipe(_) => "delete-recipe",
            ShellCommand::ToShopping(_) => "to-shopping",
            ShellCommand::Shopping => "shopping",
            ShellCommand::AddItem => "add-item",
            ShellCommand::EditItem(_) => "edit-item",
            ShellCommand::DeleteItem(_) => "delete-item",
            ShellCommand::Save => "save",
            ShellCommand::Fetch => "fetch",
            ShellCommand::Login => "login",
            ShellCommand::Signup => "signup",
            ShellCommand::Logout => "logout",
            ShellCommand::Help => "help",
            ShellCommand::Quit => "quit",
        }
    }
}

/// Keep only the newest snapshot waiting on a channel
fn latest<T: Clone>(rx: &mut broadcast::Receiver<T>) -> Option<T> {
    let mut last = None;
    loop {
        match rx.try_recv() {
            Ok(value) => last = Some(value),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return last,
        }
    }
}

struct Shell {
    ctx: RecipeBookContext,
    runtime: Handle,
    recipes_rx: broadcast::Receiver<Vec<Recipe>>,
    list_rx: broadcast::Receiver<Vec<Ingredient>>,
    editing_rx: broadcast::Receiver<usize>,
    user_rx: watch::Receiver<Option<User>>,
}

impl Shell {
    fn new(ctx: RecipeBookContext, runtime: Handle) -> Self {
        let recipes_rx = ctx.recipe_service.subscribe();
        let list_rx = ctx.shopping_list_service.subscribe();
        let editing_rx = ctx.shopping_list_service.subscribe_editing();
        let user_rx = ctx.auth_service.subscribe_user();
        Self {
            ctx,
            runtime,
            recipes_rx,
            list_rx,
            editing_rx,
            user_rx,
        }
    }

    fn view(&self) -> View {
        self.ctx.navigator.current().unwrap_or(View::Auth)
    }

    fn prompt(&self) -> String {
        let who = match self.ctx.auth_service.current_user() {
            Some(user) => user.email,
            None => "guest".to_string(),
        };
        format!("{} {}> ", who.cyan(), self.view().path().dimmed())
    }

    fn start(&mut self) {
        // Absorb the initial value so only later changes are reported
        self.user_rx.borrow_and_update();

        println!("{}", "Recipe Book".bold());
        match self.ctx.auth_service.auto_login() {
            Some(user) => {
                self.user_rx.borrow_and_update();
                println!("Welcome back, {}.", user.email.bold());
                if let Err(e) = self.show_recipes() {
                    output::error(&e.to_string());
                }
            }
            None => {
                self.ctx.navigator.navigate(View::Auth);
                output::info("Not logged in. Use 'login' or 'signup'. Type 'help' for all commands.");
            }
        }
    }

    fn execute(&mut self, command: ShellCommand) -> Result<()> {
        log_command(&self.ctx, command.name());

        if command.requires_auth() && !self.ctx.auth_service.is_authenticated() {
            self.ctx.navigator.navigate(View::Auth);
            bail!("Please log in first ('login' or 'signup')");
        }

        match command {
            ShellCommand::Recipes => self.show_recipes(),
            ShellCommand::Recipe(i) => {
                let recipe = self.ctx.recipe_service.get_recipe(i)?;
                output::print_recipe(i, &recipe);
                Ok(())
            }
            ShellCommand::NewRecipe => self.edit_recipe(None),
            ShellCommand::EditRecipe(i) => self.edit_recipe(Some(i)),
            ShellCommand::DeleteRecipe(i) => self.delete_recipe(i),
            ShellCommand::ToShopping(i) => {
                let recipe = self.ctx.recipe_service.get_recipe(i)?;
                let count = recipe.ingredients.len();
                self.ctx.recipe_service.add_ingredients_to_shopping_list(recipe.ingredients);
                output::success(&format!("Added {} ingredients to the shopping list", count));
                Ok(())
            }
            ShellCommand::Shopping => {
                self.ctx.navigator.navigate(View::ShoppingList);
                // Drop pending snapshots; the full list is printed here
                latest(&mut self.list_rx);
                let ingredients = self.ctx.shopping_list_service.get_ingredients();
                if ingredients.is_empty() {
                    println!("The shopping list is empty.");
                } else {
                    println!("{}", output::ingredient_table(&ingredients));
                }
                Ok(())
            }
            ShellCommand::AddItem => self.add_item(),
            ShellCommand::EditItem(i) => self.edit_item(i),
            ShellCommand::DeleteItem(i) => {
                let removed = self.ctx.shopping_list_service.delete_ingredient(i)?;
                output::success(&format!("Removed {}", removed.name));
                Ok(())
            }
            ShellCommand::Save => {
                let progress = spinner("Saving recipes...");
                let result = self
                    .runtime
                    .block_on(self.ctx.data_storage_service.try_store_recipes());
                progress.finish_and_clear();
                let count = result?;
                output::success(&format!("Saved {} recipes", count));
                Ok(())
            }
            ShellCommand::Fetch => {
                self.fetch()?;
                Ok(())
            }
            ShellCommand::Login => self.authenticate(AuthMode::Login),
            ShellCommand::Signup => self.authenticate(AuthMode::Signup),
            ShellCommand::Logout => {
                self.ctx.auth_service.logout();
                Ok(())
            }
            ShellCommand::Help => {
                let mut table = output::create_table();
                table.set_header(vec!["Command", "Description"]);
                for (name, description) in HELP {
                    table.add_row(vec![*name, *description]);
                }
                println!("{}", table);
                Ok(())
            }
            ShellCommand::Quit => Ok(()),
        }
    }

    fn fetch(&mut self) -> Result<usize> {
        let progress = spinner("Fetching recipes...");
        let result = self.runtime.block_on(self.ctx.data_storage_service.fetch_recipes());
        progress.finish_and_clear();
        Ok(result?.len())
    }

    /// Show the recipe list, loading it first if nothing is loaded yet
    fn show_recipes(&mut self) -> Result<()> {
        self.ctx.navigator.navigate(View::Recipes);
        if self.ctx.recipe_service.get_recipes().is_empty() {
            self.fetch()?;
        }
        latest(&mut self.recipes_rx);

        let recipes = self.ctx.recipe_service.get_recipes();
        if recipes.is_empty() {
            println!("No recipes yet. Create one with 'new-recipe'.");
        } else {
            println!("{}", output::recipe_table(&recipes));
        }
        Ok(())
    }

    fn edit_recipe(&mut self, index: Option<usize>) -> Result<()> {
        let existing = index
            .map(|i| self.ctx.recipe_service.get_recipe(i))
            .transpose()?;
        let recipe = recipe_form(existing.as_ref())?;

        match index {
            Some(i) => {
                self.ctx.recipe_service.update_recipe(i, recipe)?;
                output::success(&format!("Updated recipe {}", i));
            }
            None => {
                let i = self.ctx.recipe_service.add_recipe(recipe);
                output::success(&format!("Created recipe {}", i));
            }
        }
        self.ctx.navigator.navigate(View::Recipes);
        Ok(())
    }

    fn delete_recipe(&mut self, index: usize) -> Result<()> {
        let recipe = self.ctx.recipe_service.get_recipe(index)?;
        if !Confirm::new()
            .with_prompt(format!("Delete '{}'?", recipe.name))
            .default(false)
            .interact()?
        {
            println!("Cancelled.");
            return Ok(());
        }
        self.ctx.recipe_service.delete_recipe(index)?;
        self.ctx.navigator.navigate(View::Recipes);
        Ok(())
    }

    fn add_item(&mut self) -> Result<()> {
        let ingredient = ingredient_form(None)?;
        if !self.ctx.shopping_list_service.add_ingredient(ingredient) {
            output::warning("Amount must be greater than zero; nothing added");
        }
        Ok(())
    }

    fn edit_item(&mut self, index: usize) -> Result<()> {
        let current = self.ctx.shopping_list_service.start_editing(index)?;
        let editing = latest(&mut self.editing_rx).unwrap_or(index);

        let actions = ["Update", "Delete", "Clear"];
        let action = Select::new()
            .with_prompt(format!("Item {}: {} {}", editing, current.name, output::format_amount(current.amount)))
            .items(&actions)
            .default(0)
            .interact()?;

        match action {
            0 => {
                let edited = ingredient_form(Some(&current))?;
                self.ctx.shopping_list_service.update_ingredient(editing, edited)?;
            }
            1 => {
                self.ctx.shopping_list_service.delete_ingredient(editing)?;
            }
            _ => println!("Cleared."),
        }
        Ok(())
    }

    fn authenticate(&mut self, mode: AuthMode) -> Result<()> {
        let email: String = Input::new().with_prompt("E-Mail").interact_text()?;
        let password = dialoguer::Password::new().with_prompt("Password").interact()?;
        let credentials = recipebook_core::Credentials::new(email, password);

        self.runtime.block_on(auth::submit(&self.ctx, mode, &credentials))?;
        self.show_recipes()
    }

    /// Print whatever changed since the last command
    fn render_changes(&mut self) {
        if self.user_rx.has_changed().unwrap_or(false) {
            let user = self.user_rx.borrow_and_update().clone();
            match user {
                Some(user) => output::success(&format!("Logged in as {}", user.email)),
                None => output::warning("Logged out"),
            }
        }

        let view = self.view();
        if let Some(ingredients) = latest(&mut self.list_rx) {
            if view == View::ShoppingList {
                println!("{}", output::ingredient_table(&ingredients));
            }
        }
        if let Some(recipes) = latest(&mut self.recipes_rx) {
            if view == View::Recipes {
                println!("{}", output::recipe_table(&recipes));
            }
        }
        latest(&mut self.editing_rx);
    }

    fn run(mut self) -> Result<()> {
        self.start();
        let stdin = io::stdin();
        let mut line = String::new();

        loop {
            self.render_changes();
            print!("{}", self.prompt());
            io::stdout().flush()?;

            line.clear();
            if stdin.lock().read_line(&mut line)? == 0 {
                println!();
                break;
            }

            match ShellCommand::parse(&line) {
                Ok(None) => continue,
                Ok(Some(ShellCommand::Quit)) => break,
                Ok(Some(command)) => {
                    if let Err(e) = self.execute(command) {
                        output::error(&e.to_string());
                    }
                }
                Err(e) => output::error(&e.to_string()),
            }
        }

        // Receivers are dropped with the shell
        Ok(())
    }
}

/// Ask for a name and an amount, defaulting to `current`
fn ingredient_form(current: Option<&Ingredient>) -> Result<Ingredient> {
    let mut name = Input::<String>::new().with_prompt("Name");
    if let Some(current) = current {
        name = name.default(current.name.clone());
    }
    let name = name.interact_text()?;

    let mut amount = Input::<String>::new()
        .with_prompt("Amount")
        .validate_with(|input: &String| -> std::result::Result<(), String> {
            Ingredient::parse_amount(input).map(|_| ()).map_err(|e| e.to_string())
        });
    if let Some(current) = current {
        amount = amount.default(output::format_amount(current.amount));
    }
    let amount = Ingredient::parse_amount(&amount.interact_text()?)?;

    Ok(Ingredient::new(name, amount))
}

/// Ask for every recipe field; ingredients can be kept, removed or added
fn recipe_form(current: Option<&Recipe>) -> Result<Recipe> {
    let field = |prompt: &str, default: Option<&String>| -> Result<String> {
        let mut input = Input::<String>::new().with_prompt(prompt);
        if let Some(default) = default {
            input = input.default(default.clone());
        }
        Ok(input.interact_text()?)
    };

    let name = field("Name", current.map(|r| &r.name))?;
    let image_path = field("Image URL", current.map(|r| &r.image_path))?;
    let description = field("Description", current.map(|r| &r.description))?;

    let mut ingredients = Vec::new();
    if let Some(recipe) = current {
        for ingredient in &recipe.ingredients {
            let keep = Confirm::new()
                .with_prompt(format!(
                    "Keep {} {}?",
                    ingredient.name,
                    output::format_amount(ingredient.amount)
                ))
                .default(true)
                .interact()?;
            if keep {
                ingredients.push(ingredient.clone());
            }
        }
    }
    while Confirm::new()
        .with_prompt("Add an ingredient?")
        .default(false)
        .interact()?
    {
        ingredients.push(ingredient_form(None)?);
    }

    let recipe = Recipe::new(name, description, image_path, ingredients);
    recipe.validate()?;
    Ok(recipe)
}

pub async fn run() -> Result<()> {
    let ctx = get_context(EntryPoint::Shell)?;
    let runtime = Handle::current();

    // Prompts block; keep them off the runtime so the logout timer still fires
    tokio::task::spawn_blocking(move || Shell::new(ctx, runtime).run()).await?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(ShellCommand::parse("recipes").unwrap(), Some(ShellCommand::Recipes));
        assert_eq!(ShellCommand::parse("  recipe 2 ").unwrap(), Some(ShellCommand::Recipe(2)));
        assert_eq!(ShellCommand::parse("edit-item 0").unwrap(), Some(ShellCommand::EditItem(0)));
        assert_eq!(ShellCommand::parse("exit").unwrap(), Some(ShellCommand::Quit));
        assert_eq!(ShellCommand::parse("   ").unwrap(), None);
    }

    #[test]
    fn test_parse_errors() {
        assert!(ShellCommand::parse("recipe").is_err());
        assert!(ShellCommand::parse("recipe one").is_err());
        assert!(ShellCommand::parse("recipe -1").is_err());
        assert!(ShellCommand::parse("shopping 3").is_err());
        assert!(ShellCommand::parse("delete-item 1 2").is_err());
        assert!(ShellCommand::parse("bake").is_err());
    }

    #[test]
    fn test_auth_guard() {
        assert!(ShellCommand::Recipes.requires_auth());
        assert!(ShellCommand::Save.requires_auth());
        assert!(!ShellCommand::Shopping.requires_auth());
        assert!(!ShellCommand::Login.requires_auth());
    }

    #[test]
    fn test_latest_keeps_newest_snapshot() {
        let (tx, mut rx) = broadcast::channel(4);
        tx.send(1).unwrap();
        tx.send(2).unwrap();
        assert_eq!(latest(&mut rx), Some(2));
        assert_eq!(latest(&mut rx), None);
    }
}
