//! Command-line arguments

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "plumbstock", version, about = "Plumbing-supply inventory item store")]
pub struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the stored items (overrides the config)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List stored items, most recent first
    List,
    /// Show one item
    Show { id: i64 },
    /// Add a new item
    Add(ItemFields),
    /// Update an item by id, or the item staged with `edit` when no id is given
    Update {
        id: Option<i64>,
        #[command(flatten)]
        fields: ItemFields,
    },
    /// Stage an item for editing
    Edit { id: i64 },
    /// Delete an item
    Delete { id: i64 },
    /// Remove every stored item
    Clear {
        /// Confirm removal of all items
        #[arg(long)]
        yes: bool,
    },
    /// Show a category page: matching items plus samples
    Category(CategoryArgs),
    /// Headline figures for all items or one category
    Stats {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        reorder_level: Option<i64>,
    },
    /// Items below the reorder level
    LowStock {
        #[arg(long)]
        reorder_level: Option<i64>,
    },
    /// Print the effective configuration
    Config,
}

/// Item fields as typed by the user; numbers are normalized by the store.
#[derive(Debug, Default, Args)]
pub struct ItemFields {
    #[arg(long)]
    pub code: Option<String>,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub price: Option<String>,
    #[arg(long)]
    pub size: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub stock: Option<String>,
    #[arg(long)]
    pub material: Option<String>,
    /// Display type shown on category pages
    #[arg(long = "type")]
    pub item_type: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    /// Image file to attach
    #[arg(long)]
    pub image: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct CategoryArgs {
    pub category: String,
    /// JSON file of sample items shown alongside stored ones
    #[arg(long)]
    pub samples: Option<PathBuf>,
    /// Only rows of this material ("all" for every material)
    #[arg(long)]
    pub material: Option<String>,
    /// Match name, type, or size
    #[arg(long)]
    pub search: Option<String>,
    /// name, type, material, size, stock, price, or value
    #[arg(long)]
    pub sort: Option<String>,
    /// Sort descending
    #[arg(long)]
    pub desc: bool,
    #[arg(long)]
    pub reorder_level: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_add_with_loose_numbers() {
        let cli = Cli::parse_from([
            "plumbstock", "add", "--name", "Elbow", "--price", "49.50", "--stock", "10",
        ]);
        match cli.command {
            Command::Add(fields) => {
                assert_eq!(fields.name.as_deref(), Some("Elbow"));
                assert_eq!(fields.price.as_deref(), Some("49.50"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn update_id_is_optional() {
        let cli = Cli::parse_from(["plumbstock", "update", "--stock", "4"]);
        assert!(matches!(cli.command, Command::Update { id: None, .. }));
    }
}
