use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use jsonbase_core::{DatabaseConfig, DatabaseCore, Document, WriteMode};
use serde_json::{Map, Value};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jsonbase")]
#[command(about = "JsonBase CLI - query and maintain JSON document collections")]
#[command(version)]
struct Cli {
    /// Directory holding the collection files
    #[arg(long, env = "JSONBASE_DIR", default_value = "storage", global = true)]
    dir: PathBuf,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG wins when set
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Rewrite files in place instead of write-then-rename
    #[arg(long, global = true)]
    in_place: bool,

    /// Write compact JSON instead of pretty-printed
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Insert a document (object) or several (array of objects)
    Insert { collection: String, document: String },
    /// Print matching documents
    Find {
        collection: String,
        #[arg(default_value = "{}")]
        query: String,
        /// Print only the first match (or null)
        #[arg(long)]
        one: bool,
    },
    /// Count matching documents
    Count {
        collection: String,
        #[arg(default_value = "{}")]
        query: String,
    },
    /// Merge a patch into every matching document
    Update {
        collection: String,
        query: String,
        patch: String,
    },
    /// Delete every matching document
    Delete { collection: String, query: String },
    /// Index management commands
    Index {
        #[command(subcommand)]
        action: IndexAction,
    },
    /// Group documents by a field
    Group { collection: String, field: String },
    /// Aggregate a numeric field (sum, avg, min, max)
    Aggregate {
        collection: String,
        field: String,
        op: String,
    },
    /// Import data from JSON file: { "collection": [documents...], ... }
    Import {
        /// JSON file to import
        file: PathBuf,
    },
    /// Export collections to a JSON file
    Export {
        /// Output JSON file
        file: PathBuf,
        /// Export only specific collection
        #[arg(long)]
        collection: Option<String>,
    },
    /// List collection names
    Collections,
}

#[derive(Subcommand)]
enum IndexAction {
    /// Create (or rebuild) the index on a field
    Create { collection: String, field: String },
    /// Drop the index on a field
    Drop { collection: String, field: String },
    /// List indexed fields
    List { collection: String },
    /// Rebuild every index from the stored documents
    Rebuild { collection: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(cli, &mut out)
}

fn init_tracing(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli, out: &mut impl Write) -> Result<()> {
    let mut config = DatabaseConfig::default().with_pretty(!cli.compact);
    if cli.in_place {
        config = config.with_write_mode(WriteMode::InPlace);
    }

    let db = DatabaseCore::open_with_config(&cli.dir, config)
        .with_context(|| format!("Failed to open database: {}", cli.dir.display()))?;
    debug!(dir = %cli.dir.display(), "database ready");

    match cli.command {
        Commands::Insert {
            collection,
            document,
        } => insert(&db, &collection, &document, out),
        Commands::Find {
            collection,
            query,
            one,
        } => find(&db, &collection, &query, one, out),
        Commands::Count { collection, query } => {
            let query = parse_json(&query, "query")?;
            let count = db.collection(&collection)?.count(&query)?;
            writeln!(out, "{}", count)?;
            Ok(())
        }
        Commands::Update {
            collection,
            query,
            patch,
        } => {
            let query = parse_json(&query, "query")?;
            let patch = parse_json(&patch, "patch")?;
            let modified = db
                .collection(&collection)?
                .update(&query, &patch)
                .with_context(|| format!("Failed to update {}", collection))?;
            writeln!(out, "{}", modified)?;
            Ok(())
        }
        Commands::Delete { collection, query } => {
            let query = parse_json(&query, "query")?;
            let deleted = db
                .collection(&collection)?
                .delete(&query)
                .with_context(|| format!("Failed to delete from {}", collection))?;
            writeln!(out, "{}", deleted)?;
            Ok(())
        }
        Commands::Index { action } => index(&db, action, out),
        Commands::Group { collection, field } => group(&db, &collection, &field, out),
        Commands::Aggregate {
            collection,
            field,
            op,
        } => {
            let result = db.collection(&collection)?.aggregate(&field, &op)?;
            writeln!(out, "{}", result)?;
            Ok(())
        }
        Commands::Import { file } => import_data(&db, &file, out),
        Commands::Export { file, collection } => {
            export_data(&db, &file, collection.as_deref(), out)
        }
        Commands::Collections => {
            for name in db.list_collections()? {
                writeln!(out, "{}", name)?;
            }
            Ok(())
        }
    }
}

fn parse_json(text: &str, what: &str) -> Result<Value> {
    serde_json::from_str(text).with_context(|| format!("Invalid JSON {}: {}", what, text))
}

fn print_pretty(value: &impl serde::Serialize, out: &mut impl Write) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
    writeln!(out, "{}", json)?;
    Ok(())
}

fn insert(db: &DatabaseCore, collection: &str, document: &str, out: &mut impl Write) -> Result<()> {
    let mut coll = db.collection(collection)?;
    let inserted = match parse_json(document, "document")? {
        Value::Array(documents) => coll.insert_many(documents),
        single => coll.insert_one(single).map(|doc| vec![doc]),
    }
    .with_context(|| format!("Failed to insert into {}", collection))?;

    for doc in &inserted {
        writeln!(out, "{}", doc.id())?;
    }
    Ok(())
}

fn find(
    db: &DatabaseCore,
    collection: &str,
    query: &str,
    one: bool,
    out: &mut impl Write,
) -> Result<()> {
    let query = parse_json(query, "query")?;
    let coll = db.collection(collection)?;

    if one {
        let found = coll
            .find_one(&query)
            .with_context(|| format!("Failed to query collection: {}", collection))?;
        print_pretty(&found, out)
    } else {
        let found = coll
            .find(&query)
            .with_context(|| format!("Failed to query collection: {}", collection))?;
        print_pretty(&found, out)
    }
}

fn index(db: &DatabaseCore, action: IndexAction, out: &mut impl Write) -> Result<()> {
    match action {
        IndexAction::Create { collection, field } => {
            db.collection(&collection)?.create_index(&field)?;
            info!(collection = %collection, field = %field, "index created");
        }
        IndexAction::Drop { collection, field } => {
            db.collection(&collection)?
                .drop_index(&field)
                .with_context(|| format!("Failed to drop index {} on {}", field, collection))?;
        }
        IndexAction::List { collection } => {
            for field in db.collection(&collection)?.list_indexes() {
                writeln!(out, "{}", field)?;
            }
        }
        IndexAction::Rebuild { collection } => {
            db.collection(&collection)?.reindex()?;
        }
    }
    Ok(())
}

/// Groups as a JSON object; the absent/null group is keyed `"null"`
fn group(db: &DatabaseCore, collection: &str, field: &str, out: &mut impl Write) -> Result<()> {
    let groups = db.collection(collection)?.group_by(field)?;

    let mut output: Map<String, Value> = Map::new();
    for (key, members) in groups {
        let key = key.unwrap_or_else(|| "null".to_string());
        let entry = output
            .entry(key)
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(list) = entry {
            list.extend(members.into_iter().map(Document::into_value));
        }
    }
    print_pretty(&output, out)
}

/// Import data from JSON file
/// Format: { "collection_name": [documents...], ... }
fn import_data(db: &DatabaseCore, file: &Path, out: &mut impl Write) -> Result<()> {
    let content = fs::read_to_string(file)
        .with_context(|| format!("Failed to read file: {}", file.display()))?;

    let data: Map<String, Value> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in file: {}", file.display()))?;

    let mut total_docs = 0;
    for (collection_name, documents) in data {
        let Value::Array(docs) = documents else {
            bail!("Collection '{}' must be an array", collection_name);
        };

        let count = docs.len();
        db.collection(&collection_name)?
            .insert_many(docs)
            .with_context(|| format!("Failed to insert documents into {}", collection_name))?;
        total_docs += count;

        writeln!(out, "Imported {} documents into '{}'", count, collection_name)?;
    }

    writeln!(
        out,
        "Total: {} documents imported to {}",
        total_docs,
        db.path().display()
    )?;
    Ok(())
}

/// Export collections to a JSON file in the import format
fn export_data(
    db: &DatabaseCore,
    file: &Path,
    collection_filter: Option<&str>,
    out: &mut impl Write,
) -> Result<()> {
    let collections = db.list_collections()?;
    if let Some(filter) = collection_filter {
        if !collections.iter().any(|name| name == filter) {
            bail!("Collection '{}' not found in {}", filter, db.path().display());
        }
    }

    let mut output: Map<String, Value> = Map::new();
    let mut total_docs = 0;

    for coll_name in collections {
        if let Some(filter) = collection_filter {
            if coll_name != filter {
                continue;
            }
        }

        let docs = db
            .collection(&coll_name)?
            .find(&Value::Object(Map::new()))
            .with_context(|| format!("Failed to query collection: {}", coll_name))?;

        writeln!(out, "Exporting {} documents from '{}'", docs.len(), coll_name)?;
        total_docs += docs.len();
        output.insert(
            coll_name,
            Value::Array(docs.into_iter().map(Document::into_value).collect()),
        );
    }

    let json = serde_json::to_string_pretty(&output).context("Failed to serialize to JSON")?;
    fs::write(file, json).with_context(|| format!("Failed to write to file: {}", file.display()))?;

    writeln!(
        out,
        "Total: {} documents exported to {}",
        total_docs,
        file.display()
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn exec(dir: &Path, args: &[&str]) -> Result<String> {
        let mut argv = vec!["jsonbase", "--dir", dir.to_str().unwrap()];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv)?;

        let mut out = Vec::new();
        run(cli, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn test_insert_find_count() {
        let dir = TempDir::new().unwrap();
        let docs = r#"[{"_id": 1, "name": "Alice"}, {"_id": 2, "name": "Bob"}]"#;
        let ids = exec(dir.path(), &["insert", "users", docs]).unwrap();
        assert_eq!(ids, "1\n2\n");

        let found = exec(dir.path(), &["find", "users", r#"{"name": "Bob"}"#]).unwrap();
        let parsed: Value = serde_json::from_str(&found).unwrap();
        assert_eq!(parsed, serde_json::json!([{"_id": 2, "name": "Bob"}]));

        assert_eq!(exec(dir.path(), &["count", "users"]).unwrap(), "2\n");

        let missing = exec(dir.path(), &["find", "users", r#"{"name": "Zed"}"#, "--one"]).unwrap();
        assert_eq!(missing.trim(), "null");
    }

    #[test]
    fn test_update_delete_counts() {
        let dir = TempDir::new().unwrap();
        exec(dir.path(), &["insert", "t", r#"[{"v": 1}, {"v": 1}, {"v": 2}]"#]).unwrap();

        let updated = exec(dir.path(), &["update", "t", r#"{"v": 1}"#, r#"{"v": 3}"#]).unwrap();
        assert_eq!(updated, "2\n");
        assert_eq!(exec(dir.path(), &["delete", "t", r#"{"v": {"$gt": 2}}"#]).unwrap(), "2\n");
        assert_eq!(exec(dir.path(), &["count", "t"]).unwrap(), "1\n");
    }

    #[test]
    fn test_index_commands() {
        let dir = TempDir::new().unwrap();
        exec(dir.path(), &["insert", "t", r#"{"k": "a"}"#]).unwrap();
        exec(dir.path(), &["index", "create", "t", "k"]).unwrap();
        assert_eq!(exec(dir.path(), &["index", "list", "t"]).unwrap(), "k\n");

        exec(dir.path(), &["index", "rebuild", "t"]).unwrap();
        exec(dir.path(), &["index", "drop", "t", "k"]).unwrap();
        assert_eq!(exec(dir.path(), &["index", "list", "t"]).unwrap(), "");
        assert!(exec(dir.path(), &["index", "drop", "t", "k"]).is_err());
    }

    #[test]
    fn test_group_and_aggregate() {
        let dir = TempDir::new().unwrap();
        let docs = r#"[
            {"_id": 1, "c": "A", "v": 10},
            {"_id": 2, "c": "A", "v": 20},
            {"_id": 3, "v": 30}
        ]"#;
        exec(dir.path(), &["insert", "s", docs]).unwrap();

        let grouped = exec(dir.path(), &["group", "s", "c"]).unwrap();
        let grouped: Value = serde_json::from_str(&grouped).unwrap();
        assert_eq!(grouped["A"].as_array().unwrap().len(), 2);
        assert_eq!(grouped["null"].as_array().unwrap().len(), 1);

        assert_eq!(exec(dir.path(), &["aggregate", "s", "v", "sum"]).unwrap(), "60\n");
        assert_eq!(exec(dir.path(), &["aggregate", "s", "v", "nope"]).unwrap(), "null\n");
    }

    #[test]
    fn test_import_export_roundtrip() {
        let dir = TempDir::new().unwrap();
        let db_dir = dir.path().join("db");
        let input = dir.path().join("in.json");
        fs::write(&input, r#"{"a": [{"_id": 1}], "b": [{"_id": "x", "n": 2}]}"#).unwrap();

        let report = exec(&db_dir, &["import", input.to_str().unwrap()]).unwrap();
        assert!(report.contains("Total: 2 documents imported"));
        assert_eq!(exec(&db_dir, &["collections"]).unwrap(), "a\nb\n");

        let output = dir.path().join("out.json");
        exec(&db_dir, &["export", output.to_str().unwrap(), "--collection", "b"]).unwrap();
        let exported: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(exported, serde_json::json!({"b": [{"_id": "x", "n": 2}]}));

        let missing = exec(&db_dir, &["export", output.to_str().unwrap(), "--collection", "zzz"]);
        assert!(missing.is_err());
    }

    #[test]
    fn test_compact_flag() {
        let dir = TempDir::new().unwrap();
        exec(dir.path(), &["--compact", "insert", "c", r#"{"_id": 1}"#]).unwrap();
        let raw = fs::read_to_string(dir.path().join("c.json")).unwrap();
        assert_eq!(raw.trim(), r#"[{"_id":1}]"#);
    }

    #[test]
    fn test_invalid_json_argument() {
        let dir = TempDir::new().unwrap();
        let err = exec(dir.path(), &["find", "users", "{not json"]).unwrap_err();
        assert!(err.to_string().contains("Invalid JSON query"));
    }
}
