//! Command handlers
//!
//! Each handler drives the item store and writes its report to `out`.

use std::io::Write;
use std::path::Path;

use chrono::Utc;
use plumbstock_core::image::load_image;
use plumbstock_core::{
    aggregate, low_stock, Category, CategoryRow, CategoryView, InventoryItem, ItemDraft,
    ItemStore, KeyValueStorage, Loose, RowQuery, SortDescriptor, SortField, UpdateOutcome,
};

use crate::cli::{CategoryArgs, Command, ItemFields};

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

pub fn run<S: KeyValueStorage, W: Write>(
    store: &ItemStore<S>,
    command: Command,
    json: bool,
    out: &mut W,
) -> CommandResult {
    match command {
        Command::List => {
            let items = store.list();
            if json {
                print_json(out, &items)?;
            } else if items.is_empty() {
                writeln!(out, "No items stored.")?;
            } else {
                write_items(out, &items)?;
            }
        }
        Command::Show { id } => {
            let item = store.get(id).ok_or_else(|| format!("no item with id {}", id))?;
            if json {
                print_json(out, &item)?;
            } else {
                write_item_detail(out, &item)?;
            }
        }
        Command::Add(fields) => {
            let draft = draft_from_fields(fields, store.config().max_image_bytes)?;
            let item = store.add(draft)?;
            report(out, json, "Added", &item)?;
        }
        Command::Update { id, fields } => {
            let mut draft = draft_from_fields(fields, store.config().max_image_bytes)?;
            match (id, store.staged_for_edit()) {
                (Some(id), _) => draft.id = Some(Loose::Int(id)),
                (None, Some(staged)) => {
                    draft.id = Some(Loose::Int(staged.id));
                    draft.original_item_code = Some(staged.item_code);
                }
                (None, None) => return Err("no id given and no item staged for editing".into()),
            }
            match store.update(draft)? {
                UpdateOutcome::Replaced(item) => report(out, json, "Updated", &item)?,
                UpdateOutcome::Inserted(item) => {
                    report(out, json, "Not found, added as new", &item)?
                }
            }
        }
        Command::Edit { id } => {
            let item = store.get(id).ok_or_else(|| format!("no item with id {}", id))?;
            store.stage_for_edit(&item)?;
            writeln!(out, "Staged {} ({}) for editing", item.id, item.name)?;
        }
        Command::Delete { id } => {
            let before = store.list().len();
            let remaining = store.delete(id)?;
            if remaining.len() < before {
                writeln!(out, "Deleted {}; {} items remain", id, remaining.len())?;
            } else {
                writeln!(out, "No item with id {}", id)?;
            }
        }
        Command::Clear { yes } => {
            if !yes {
                return Err("refusing to clear all items without --yes".into());
            }
            store.clear()?;
            writeln!(out, "Cleared all items")?;
        }
        Command::Category(args) => run_category(store, args, json, out)?,
        Command::Stats {
            category,
            reorder_level,
        } => {
            let reorder_level = reorder_level.unwrap_or(store.config().default_reorder_level);
            let stats = match category {
                Some(name) => {
                    let category = parse_category(&name)?;
                    CategoryView::build(&store.list(), category, &[], reorder_level).stats
                }
                None => aggregate(&store.list(), reorder_level),
            };
            if json {
                print_json(out, &stats)?;
            } else {
                writeln!(out, "Items:       {}", stats.total)?;
                writeln!(out, "Low stock:   {}", stats.low_stock)?;
                writeln!(out, "Total value: {:.2}", stats.total_value)?;
                writeln!(out, "Types:       {}", stats.distinct_types)?;
            }
        }
        Command::LowStock { reorder_level } => {
            let reorder_level = reorder_level.unwrap_or(store.config().default_reorder_level);
            let items = store.list();
            let low: Vec<InventoryItem> = low_stock(&items, reorder_level)
                .into_iter()
                .cloned()
                .collect();
            if json {
                print_json(out, &low)?;
            } else if low.is_empty() {
                writeln!(out, "Nothing below reorder level {}", reorder_level)?;
            } else {
                write_items(out, &low)?;
            }
        }
        Command::Config => {
            write!(out, "{}", store.config().to_toml()?)?;
        }
    }
    Ok(())
}

fn run_category<S: KeyValueStorage, W: Write>(
    store: &ItemStore<S>,
    args: CategoryArgs,
    json: bool,
    out: &mut W,
) -> CommandResult {
    let category = parse_category(&args.category)?;
    let samples = match &args.samples {
        Some(path) => load_samples(path)?,
        None => Vec::new(),
    };
    let reorder_level = args
        .reorder_level
        .unwrap_or(store.config().default_reorder_level);

    let view = CategoryView::build(&store.list(), category, &samples, reorder_level);
    let sort = match args.sort.as_deref() {
        Some(field) => {
            let field: SortField = field.parse()?;
            Some(if args.desc {
                SortDescriptor::descending(field)
            } else {
                SortDescriptor::ascending(field)
            })
        }
        None => None,
    };
    let query = RowQuery {
        material: args.material,
        search: args.search,
        sort,
    };
    let rows = query.apply(&view.rows);

    if json {
        print_json(
            out,
            &serde_json::json!({ "category": category, "stats": view.stats, "rows": rows }),
        )?;
        return Ok(());
    }

    writeln!(
        out,
        "{}: {} items, {} low stock, value {:.2}, {} types",
        category,
        view.stats.total,
        view.stats.low_stock,
        view.stats.total_value,
        view.stats.distinct_types
    )?;
    write_rows(out, &rows)?;
    Ok(())
}

fn parse_category(name: &str) -> Result<Category, Box<dyn std::error::Error>> {
    Ok(name.parse::<Category>()?)
}

/// Sample files may hold complete items or loose drafts with ids.
fn load_samples(path: &Path) -> Result<Vec<InventoryItem>, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    let drafts: Vec<ItemDraft> = serde_json::from_str(&content)?;
    let now = Utc::now();
    Ok(drafts
        .into_iter()
        .filter_map(|draft| draft.into_legacy_item(now))
        .collect())
}

fn draft_from_fields(
    fields: ItemFields,
    max_image_bytes: usize,
) -> Result<ItemDraft, Box<dyn std::error::Error>> {
    let image = match &fields.image {
        Some(path) => Some(load_image(path, max_image_bytes)?),
        None => None,
    };
    Ok(ItemDraft {
        item_code: fields.code.map(Loose::Text),
        name: fields.name.map(Loose::Text),
        price: fields.price.map(Loose::Text),
        size: fields.size.map(Loose::Text),
        category: fields.category.map(Loose::Text),
        stock_level: fields.stock.map(Loose::Text),
        material: fields.material.map(Loose::Text),
        item_type: fields.item_type.map(Loose::Text),
        description: fields.description.map(Loose::Text),
        image,
        ..Default::default()
    })
}

fn report<W: Write>(out: &mut W, json: bool, verb: &str, item: &InventoryItem) -> CommandResult {
    if json {
        print_json(out, item)
    } else {
        writeln!(out, "{} {} ({})", verb, item.id, item.name)?;
        Ok(())
    }
}

fn print_json<W: Write, T: serde::Serialize + ?Sized>(out: &mut W, value: &T) -> CommandResult {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn write_items<W: Write>(out: &mut W, items: &[InventoryItem]) -> CommandResult {
    writeln!(
        out,
        "{:<14} {:<10} {:<28} {:<9} {:>7} {:>9}",
        "ID", "CODE", "NAME", "CATEGORY", "STOCK", "PRICE"
    )?;
    for item in items {
        writeln!(
            out,
            "{:<14} {:<10} {:<28} {:<9} {:>7} {:>9.2}",
            item.id,
            truncate(&item.item_code, 10),
            truncate(&item.name, 28),
            item.category,
            item.stock_level,
            item.price
        )?;
    }
    Ok(())
}

fn write_item_detail<W: Write>(out: &mut W, item: &InventoryItem) -> CommandResult {
    writeln!(out, "ID:          {}", item.id)?;
    writeln!(out, "Code:        {}", item.item_code)?;
    writeln!(out, "Name:        {}", item.name)?;
    writeln!(out, "Category:    {}", item.category)?;
    writeln!(out, "Material:    {}", item.material)?;
    writeln!(out, "Size:        {}", item.size)?;
    writeln!(out, "Stock:       {}", item.stock_level)?;
    writeln!(out, "Price:       {:.2}", item.price)?;
    writeln!(out, "Description: {}", item.description)?;
    writeln!(out, "Image:       {}", if item.has_image() { "yes" } else { "no" })?;
    writeln!(out, "Added:       {}", item.date_added.to_rfc3339())?;
    writeln!(out, "Modified:    {}", item.date_modified.to_rfc3339())?;
    Ok(())
}

fn write_rows<W: Write>(out: &mut W, rows: &[CategoryRow]) -> CommandResult {
    writeln!(
        out,
        "{:<28} {:<12} {:<10} {:<12} {:>7} {:>9} {:>10}",
        "NAME", "TYPE", "MATERIAL", "SIZE", "STOCK", "PRICE", "VALUE"
    )?;
    for row in rows {
        let marker = if row.is_low_stock() { " !" } else { "" };
        writeln!(
            out,
            "{:<28} {:<12} {:<10} {:<12} {:>7} {:>9.2} {:>10.2}{}",
            truncate(&row.name, 28),
            truncate(&row.item_type, 12),
            truncate(&row.material, 10),
            truncate(&row.size, 12),
            row.stock_level,
            row.price,
            row.value,
            marker
        )?;
    }
    Ok(())
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut cut: String = s.chars().take(width.saturating_sub(1)).collect();
        cut.push('~');
        cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plumbstock_core::MemoryStorage;

    fn run_text(store: &ItemStore<MemoryStorage>, command: Command) -> String {
        let mut out = Vec::new();
        run(store, command, false, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn add(store: &ItemStore<MemoryStorage>, name: &str, stock: &str) -> InventoryItem {
        let fields = ItemFields {
            name: Some(name.into()),
            stock: Some(stock.into()),
            price: Some("2.50".into()),
            category: Some("Fittings".into()),
            ..Default::default()
        };
        store
            .add(draft_from_fields(fields, 1024).unwrap())
            .unwrap()
    }

    #[test]
    fn add_normalizes_text_numbers() {
        let store = ItemStore::new(MemoryStorage::new());
        let item = add(&store, "Elbow", "10");
        assert_eq!(item.stock_level, 10);
        assert_eq!(item.price, 2.5);
        assert_eq!(item.category, Category::Fittings);
    }

    #[test]
    fn clear_requires_confirmation() {
        let store = ItemStore::new(MemoryStorage::new());
        add(&store, "Elbow", "10");
        let mut out = Vec::new();
        assert!(run(&store, Command::Clear { yes: false }, false, &mut out).is_err());
        assert_eq!(store.list().len(), 1);
        run_text(&store, Command::Clear { yes: true });
        assert!(store.list().is_empty());
    }

    #[test]
    fn update_uses_staged_item() {
        let store = ItemStore::new(MemoryStorage::new());
        let item = add(&store, "Elbow", "10");
        run_text(&store, Command::Edit { id: item.id });

        let text = run_text(
            &store,
            Command::Update {
                id: None,
                fields: ItemFields {
                    stock: Some("4".into()),
                    ..Default::default()
                },
            },
        );
        assert!(text.starts_with("Updated"));
        assert_eq!(store.get(item.id).unwrap().stock_level, 4);
        assert!(store.staged_for_edit().is_none());
    }

    #[test]
    fn update_without_target_fails() {
        let store = ItemStore::new(MemoryStorage::new());
        let mut out = Vec::new();
        let command = Command::Update {
            id: None,
            fields: ItemFields::default(),
        };
        assert!(run(&store, command, false, &mut out).is_err());
    }

    #[test]
    fn low_stock_lists_only_low_items() {
        let store = ItemStore::new(MemoryStorage::new());
        add(&store, "Elbow", "40");
        add(&store, "Tee", "2");
        let text = run_text(
            &store,
            Command::LowStock {
                reorder_level: Some(15),
            },
        );
        assert!(text.contains("Tee"));
        assert!(!text.contains("Elbow"));
    }

    #[test]
    fn category_json_has_rows_and_stats() {
        let store = ItemStore::new(MemoryStorage::new());
        add(&store, "Elbow", "40");
        let mut out = Vec::new();
        let args = CategoryArgs {
            category: "fittings".into(),
            samples: None,
            material: None,
            search: None,
            sort: Some("name".into()),
            desc: false,
            reorder_level: None,
        };
        run(&store, Command::Category(args), true, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["stats"]["total"], 1);
        assert_eq!(value["rows"][0]["type"], "Fitting");
    }

    #[test]
    fn samples_file_fills_category() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fittings.json");
        std::fs::write(
            &path,
            r#"[{"id": 1, "name": "Sample Coupling", "category": "fittings", "stockLevel": 3},
                {"id": 2, "name": "Sample Union", "type": "Union", "stockLevel": 30},
                {"name": "no id, skipped"}]"#,
        )
        .unwrap();
        let samples = load_samples(&path).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].name, "Sample Coupling");
        assert_eq!(samples[1].item_type.as_deref(), Some("Union"));

        let store = ItemStore::new(MemoryStorage::new());
        let mut out = Vec::new();
        let args = CategoryArgs {
            category: "fittings".into(),
            samples: Some(path),
            material: None,
            search: None,
            sort: None,
            desc: false,
            reorder_level: None,
        };
        run(&store, Command::Category(args), true, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["rows"][0]["type"], "Fitting");
        assert_eq!(value["rows"][1]["type"], "Union");
        assert_eq!(value["stats"]["distinctTypes"], 2);
    }

    #[test]
    fn oversized_image_is_rejected_before_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.png");
        std::fs::write(&path, vec![0u8; 2048]).unwrap();
        let fields = ItemFields {
            name: Some("Valve".into()),
            image: Some(path),
            ..Default::default()
        };
        assert!(draft_from_fields(fields, 1024).is_err());
    }

    #[test]
    fn truncate_marks_cut_text() {
        assert_eq!(truncate("Elbow", 10), "Elbow");
        assert_eq!(truncate("Compression Coupling", 8), "Compres~");
    }
}
