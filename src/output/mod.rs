use anyhow::{Context, Result};
use serde_json::Value;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::cli::{Language, OutputFormat};
use crate::recipe::Recipe;

/// Section headings for one language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Labels {
    pub servings: &'static str,
    pub ingredients: &'static str,
    pub steps: &'static str,
    pub tips: &'static str,
    pub health: &'static str,
}

impl Labels {
    pub fn for_language(language: Language) -> Self {
        match language {
            Language::English => Labels {
                servings: "Servings",
                ingredients: "Ingredients",
                steps: "Instructions",
                tips: "Tips & Tricks",
                health: "Health Assessment",
            },
            Language::French => Labels {
                servings: "Portions",
                ingredients: "Ingrédients",
                steps: "Préparation",
                tips: "Astuces",
                health: "Évaluation santé",
            },
        }
    }
}

/// Render raw recipe JSON in the requested format
pub fn format_recipe(recipe_json: &str, format: OutputFormat, language: Language) -> Result<String> {
    match format {
        OutputFormat::Json => format_as_json(recipe_json),
        OutputFormat::Markdown => {
            let recipe: Recipe =
                serde_json::from_str(recipe_json).context("Failed to parse recipe JSON")?;
            Ok(format_as_markdown(&recipe, language))
        }
    }
}

/// Pretty-print with two-space indentation, keeping key order and non-ASCII text
pub fn format_as_json(recipe_json: &str) -> Result<String> {
    let value: Value = serde_json::from_str(recipe_json).context("Failed to parse recipe JSON")?;
    Ok(serde_json::to_string_pretty(&value)?)
}

pub fn format_as_markdown(recipe: &Recipe, language: Language) -> String {
    let labels = Labels::for_language(language);
    let mut md = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(md, "# {}\n", recipe.title);
    let _ = writeln!(md, "**{}:** {}\n", labels.servings, recipe.servings);

    let _ = writeln!(md, "## {}\n", labels.ingredients);
    for ingredient in &recipe.ingredients {
        let _ = writeln!(md, "- {}", ingredient);
    }
    md.push('\n');

    let _ = writeln!(md, "## {}\n", labels.steps);
    for (i, step) in recipe.steps.iter().enumerate() {
        let _ = writeln!(md, "{}. {}", i + 1, step);
    }
    md.push('\n');

    if !recipe.tips.is_empty() {
        let _ = writeln!(md, "## {}\n", labels.tips);
        for tip in &recipe.tips {
            let _ = writeln!(md, "- {}", tip);
        }
        md.push('\n');
    }

    let _ = writeln!(md, "## {}\n", labels.health);
    let _ = writeln!(
        md,
        "{} {}",
        recipe.healthiness.indicator, recipe.healthiness.rationale
    );

    md
}

/// `<base>.<ext>` for the chosen format; the base is kept verbatim
pub fn output_path(base: &str, format: OutputFormat) -> PathBuf {
    PathBuf::from(format!("{}.{}", base, format.extension()))
}

/// Save rendered output to file
pub fn save_to_file(content: &str, path: &Path) -> Result<()> {
    fs_err::write(path, content).context("Failed to write output file")?;
    Ok(())
}
