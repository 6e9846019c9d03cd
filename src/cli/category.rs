//! Category management commands.
//!
//! Provides commands to list, add, delete, hide, reorder and recolor
//! categories in the local catalog.

use clap::{Args, Subcommand, ValueEnum};
use serde::Serialize;

use crate::catalog::Direction;
use crate::cli::common::{print_json, CliError, CliResult, StoreArgs};
use crate::models::RgbColor;

/// Manage categories
#[derive(Debug, Clone, Args)]
pub struct CategoryArgs {
    /// Category subcommand
    #[command(subcommand)]
    pub command: CategoryCommand,
}

/// Category management subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum CategoryCommand {
    /// List all categories
    List(ListCategoriesArgs),
    /// Add a new category at the end
    Add(AddCategoryArgs),
    /// Delete a category together with all of its sites
    Delete(DeleteCategoryArgs),
    /// Hide a visible category, or show a hidden one
    Toggle(ToggleCategoryArgs),
    /// Move a category one step, or into another category's position
    Move(MoveCategoryArgs),
    /// Set a category's color
    Color(ColorCategoryArgs),
}

/// List all categories
#[derive(Debug, Clone, Args)]
pub struct ListCategoriesArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Add a new category
#[derive(Debug, Clone, Args)]
pub struct AddCategoryArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Category name
    #[arg(value_name = "NAME")]
    pub name: String,
}

/// Delete a category and its sites
#[derive(Debug, Clone, Args)]
pub struct DeleteCategoryArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Category name
    #[arg(value_name = "NAME")]
    pub name: String,
}

/// Toggle a category's visibility
#[derive(Debug, Clone, Args)]
pub struct ToggleCategoryArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Category name
    #[arg(value_name = "NAME")]
    pub name: String,
}

/// One-step move direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MoveDirection {
    /// Towards the front
    Up,
    /// Towards the back
    Down,
}

/// Reorder a category
#[derive(Debug, Clone, Args)]
pub struct MoveCategoryArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Category name
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Swap with the neighbour in this direction
    #[arg(long, value_enum, conflicts_with = "to", required_unless_present = "to")]
    pub direction: Option<MoveDirection>,

    /// Take this category's position instead
    #[arg(long, value_name = "NAME")]
    pub to: Option<String>,
}

/// Set a category's color
#[derive(Debug, Clone, Args)]
pub struct ColorCategoryArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Category name
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Color in hex format (#RRGGBB)
    #[arg(value_name = "HEX")]
    pub color: String,
}

// JSON response types
#[derive(Debug, Serialize)]
struct CategoryItem {
    name: String,
    order: i64,
    color: String,
    hidden: bool,
    sites: usize,
}

#[derive(Debug, Serialize)]
struct ListCategoriesResponse {
    categories: Vec<CategoryItem>,
    count: usize,
}

impl CategoryArgs {
    /// Execute the category command
    pub fn execute(&self) -> CliResult<()> {
        match &self.command {
            CategoryCommand::List(args) => args.execute(),
            CategoryCommand::Add(args) => args.execute(),
            CategoryCommand::Delete(args) => args.execute(),
            CategoryCommand::Toggle(args) => args.execute(),
            CategoryCommand::Move(args) => args.execute(),
            CategoryCommand::Color(args) => args.execute(),
        }
    }
}

impl ListCategoriesArgs {
    /// Execute the list command
    pub fn execute(&self) -> CliResult<()> {
        let session = self.store.open_session()?;
        let store = session.store();

        let categories: Vec<CategoryItem> = store
            .categories()
            .iter()
            .map(|cat| CategoryItem {
                name: cat.name.clone(),
                order: cat.order,
                color: store.category_color(&cat.name).to_hex(),
                hidden: store.is_hidden(&cat.name),
                sites: store
                    .sites()
                    .iter()
                    .filter(|site| site.category == cat.name)
                    .count(),
            })
            .collect();

        let response = ListCategoriesResponse {
            count: categories.len(),
            categories,
        };

        if self.json {
            print_json(&response)?;
        } else if response.count == 0 {
            println!("No categories defined.");
        } else {
            println!("Categories ({}):", response.count);
            println!();
            for cat in response.categories {
                let hidden = if cat.hidden { "hidden" } else { "" };
                println!(
                    "  {:<24} {} {:>4} sites  {}",
                    cat.name, cat.color, cat.sites, hidden
                );
            }
        }

        Ok(())
    }
}

impl AddCategoryArgs {
    /// Execute the add command
    pub fn execute(&self) -> CliResult<()> {
        let mut session = self.store.open_session()?;
        let created = session.apply(|store| store.upsert_category(&self.name))?;

        let name = self.name.trim();
        if !created {
            return Err(CliError::validation(format!(
                "Category '{name}' already exists"
            )));
        }

        println!("Category '{name}' added successfully.");
        Ok(())
    }
}

impl DeleteCategoryArgs {
    /// Execute the delete command
    pub fn execute(&self) -> CliResult<()> {
        let mut session = self.store.open_session()?;
        let removed = session.delete_category(&self.name)?;

        println!(
            "Category '{}' deleted successfully ({} sites removed).",
            self.name,
            removed.len()
        );
        Ok(())
    }
}

impl ToggleCategoryArgs {
    /// Execute the toggle command
    pub fn execute(&self) -> CliResult<()> {
        let mut session = self.store.open_session()?;
        let hidden = session.apply(|store| store.toggle_category_visibility(&self.name))?;

        let state = if hidden { "hidden" } else { "shown" };
        println!("Category '{}' is now {state}.", self.name);
        Ok(())
    }
}

impl MoveCategoryArgs {
    /// Execute the move command
    pub fn execute(&self) -> CliResult<()> {
        let mut session = self.store.open_session()?;
        let index = session
            .store()
            .categories()
            .iter()
            .position(|cat| cat.name == self.name)
            .ok_or_else(|| CliError::validation(format!("Category '{}' not found", self.name)))?;

        let moved = match (&self.to, self.direction) {
            (Some(target), _) => {
                if !session.store().has_category(target) {
                    return Err(CliError::validation(format!(
                        "Category '{target}' not found"
                    )));
                }
                session.apply(|store| Ok(store.reorder_categories_by_name(&self.name, target)))?
            }
            (None, Some(direction)) => {
                let direction = match direction {
                    MoveDirection::Up => Direction::Up,
                    MoveDirection::Down => Direction::Down,
                };
                session.apply(|store| Ok(store.reorder_categories(index, direction)))?
            }
            (None, None) => {
                return Err(CliError::validation("Specify --direction or --to"));
            }
        };

        if moved {
            println!("Category '{}' moved.", self.name);
        } else {
            println!("Category '{}' already in place.", self.name);
        }
        Ok(())
    }
}

impl ColorCategoryArgs {
    /// Execute the color command
    pub fn execute(&self) -> CliResult<()> {
        let color = RgbColor::from_hex(&self.color).map_err(|e| {
            CliError::validation(format!("Invalid hex color '{}': {e}", self.color))
        })?;

        let mut session = self.store.open_session()?;
        session.apply(|store| store.set_category_color(&self.name, color))?;

        println!("Category '{}' color set to {}.", self.name, color.to_hex());
        Ok(())
    }
}
