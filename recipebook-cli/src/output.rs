//! Output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, ContentArrangement, Table};
use recipebook_core::{Ingredient, Recipe};

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Format bytes as human-readable size
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Amounts are whole numbers in practice; don't print `5.0`
pub fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 && amount.abs() < 1e15 {
        format!("{}", amount as i64)
    } else {
        format!("{}", amount)
    }
}

pub fn recipe_table(recipes: &[Recipe]) -> Table {
    let mut table = create_table();
    table.set_header(vec!["#", "Name", "Description", "Ingredients"]);
    for (index, recipe) in recipes.iter().enumerate() {
        table.add_row(vec![
            Cell::new(index),
            Cell::new(&recipe.name),
            Cell::new(&recipe.description),
            Cell::new(recipe.ingredients.len()),
        ]);
    }
    table
}

pub fn ingredient_table(ingredients: &[Ingredient]) -> Table {
    let mut table = create_table();
    table.set_header(vec!["#", "Name", "Amount"]);
    for (index, ingredient) in ingredients.iter().enumerate() {
        table.add_row(vec![
            Cell::new(index),
            Cell::new(&ingredient.name),
            Cell::new(format_amount(ingredient.amount)),
        ]);
    }
    table
}

/// Print one recipe with its ingredients
pub fn print_recipe(index: usize, recipe: &Recipe) {
    println!("{} {}", format!("[{}]", index).dimmed(), recipe.name.bold());
    println!("{}", recipe.description);
    println!("{} {}", "Image:".dimmed(), recipe.image_path);
    if recipe.ingredients.is_empty() {
        println!("{}", "No ingredients".dimmed());
    } else {
        for ingredient in &recipe.ingredients {
            println!("  - {} {}", ingredient.name, format_amount(ingredient.amount));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(5.0), "5");
        assert_eq!(format_amount(2.5), "2.5");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(2048), "2.0 KB");
    }
}
