//! Recipe domain model

use serde::{Deserialize, Serialize};

use super::ingredient::Ingredient;
use super::result::{Error, Result};

/// A recipe as kept in memory and stored in the remote document.
///
/// Recipes are identified only by their position in the recipe list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub name: String,
    /// Older documents use `desc`
    #[serde(alias = "desc", default)]
    pub description: String,
    #[serde(default)]
    pub image_path: String,
    /// Missing or null in the stored document means no ingredients
    #[serde(default, deserialize_with = "deserialize_ingredients")]
    pub ingredients: Vec<Ingredient>,
}

/// Deserialize ingredients that may be absent or null
fn deserialize_ingredients<'de, D>(deserializer: D) -> std::result::Result<Vec<Ingredient>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<Vec<Ingredient>> = Option::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

impl Recipe {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        image_path: impl Into<String>,
        ingredients: Vec<Ingredient>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            image_path: image_path.into(),
            ingredients,
        }
    }

    /// Validate the recipe the way the edit form does before submitting
    ///
    /// Name, image path and description are required, and every ingredient
    /// needs a name and a positive whole amount.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("Recipe name is required"));
        }
        if self.image_path.trim().is_empty() {
            return Err(Error::validation("Recipe image path is required"));
        }
        if self.description.trim().is_empty() {
            return Err(Error::validation("Recipe description is required"));
        }
        for ingredient in &self.ingredients {
            ingredient.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_ingredients_default_to_empty() {
        let recipe: Recipe = serde_json::from_str(
            r#"{"name":"Schnitzel","description":"Tasty","imagePath":"http://img"}"#,
        )
        .unwrap();
        assert!(recipe.ingredients.is_empty());

        let recipe: Recipe = serde_json::from_str(
            r#"{"name":"Schnitzel","description":"Tasty","imagePath":"http://img","ingredients":null}"#,
        )
        .unwrap();
        assert!(recipe.ingredients.is_empty());
    }

    #[test]
    fn test_desc_alias() {
        let recipe: Recipe =
            serde_json::from_str(r#"{"name":"Burger","desc":"Big","imagePath":"x"}"#).unwrap();
        assert_eq!(recipe.description, "Big");
    }

    #[test]
    fn test_serializes_camel_case() {
        let recipe = Recipe::new("Burger", "Big", "http://img", vec![Ingredient::new("Buns", 2.0)]);
        let json = serde_json::to_value(&recipe).unwrap();
        assert_eq!(json["imagePath"], "http://img");
        assert_eq!(json["ingredients"][0]["amount"], 2.0);
    }

    #[test]
    fn test_validate_requires_fields() {
        let valid = Recipe::new("Burger", "Big", "http://img", vec![Ingredient::new("Buns", 2.0)]);
        assert!(valid.validate().is_ok());

        let mut missing_name = valid.clone();
        missing_name.name = String::new();
        assert!(missing_name.validate().is_err());

        let mut bad_ingredient = valid.clone();
        bad_ingredient.ingredients.push(Ingredient::new("Meat", 0.0));
        assert!(bad_ingredient.validate().is_err());
    }
}
