//! Command handlers for the `notebase` binary.
//!
//! # Responsibility
//! - Open the note database and build a [`NotesService`] per invocation.
//! - Render results for a terminal or as JSON.

use anyhow::{bail, Context, Result};
use log::warn;
use notebase_core::db::open_db;
use notebase_core::{
    init_logging, CoreConfig, CorpusStatus, ImportOutcome, NoteContent, NotesService,
    PathTreeNode, SqliteNoteStore,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use crate::cli::{Cli, Commands, ImportArgs, SearchArgs, ShowArgs, TreeArgs};

pub fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
        start_logging(level, log_dir)?;
    }

    let conn = open_db(&cli.db)
        .with_context(|| format!("failed to open database `{}`", cli.db.display()))?;
    let store = SqliteNoteStore::try_new(&conn)?;
    let service = NotesService::new(store, &config);

    match cli.command {
        Commands::Import(args) => import(&service, &args),
        Commands::Tree(args) => tree(&service, &args),
        Commands::Search(args) => search(&service, &args),
        Commands::Show(args) => show(&service, &args),
        Commands::Status => status(&service),
    }
}

fn load_config(path: Option<&Path>) -> Result<CoreConfig> {
    let Some(path) = path else {
        return Ok(CoreConfig::default());
    };
    let payload = fs::read_to_string(path)
        .with_context(|| format!("failed to read config `{}`", path.display()))?;
    CoreConfig::from_json(&payload)
        .with_context(|| format!("invalid config `{}`", path.display()))
}

fn start_logging(level: &str, log_dir: &Path) -> Result<()> {
    let log_dir = if log_dir.is_absolute() {
        log_dir.to_path_buf()
    } else {
        std::env::current_dir()?.join(log_dir)
    };
    let Some(log_dir) = log_dir.to_str() else {
        bail!("log directory `{}` is not valid UTF-8", log_dir.display());
    };
    init_logging(level, log_dir)?;
    Ok(())
}

fn import(service: &NotesService<SqliteNoteStore<'_>>, args: &ImportArgs) -> Result<()> {
    let files = collect_import_files(&args.dir)?;
    match service.import(&files)? {
        ImportOutcome::Success { imported } => {
            println!("imported {imported} notes");
            println!("{}", service.status().message());
            Ok(())
        }
        ImportOutcome::Failure { reason } => bail!("import rejected: {reason}"),
    }
}

fn tree(service: &NotesService<SqliteNoteStore<'_>>, args: &TreeArgs) -> Result<()> {
    let snapshot = refresh(service)?;
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&snapshot.tree().to_forest())?
        );
    } else {
        let mut out = String::new();
        render_tree(snapshot.tree().root(), 0, &mut out);
        print!("{out}");
    }
    Ok(())
}

fn search(service: &NotesService<SqliteNoteStore<'_>>, args: &SearchArgs) -> Result<()> {
    refresh(service)?;
    let hits = service.search(Some(&args.query), args.limit);
    if hits.is_empty() {
        println!("no matches");
        return Ok(());
    }
    for hit in hits {
        match hit.content.as_text() {
            Some(text) => println!("{}\t{}", hit.key, preview(text, 80)),
            None => println!("{}", hit.key),
        }
    }
    Ok(())
}

fn show(service: &NotesService<SqliteNoteStore<'_>>, args: &ShowArgs) -> Result<()> {
    refresh(service)?;
    let content = match service.note_for_node_id(&args.target) {
        Some(hit) => hit.content,
        None => match service.note(&args.target) {
            Some(content) => content,
            None => bail!("no note for `{}`", args.target),
        },
    };
    match content {
        NoteContent::Text(text) => println!("{text}"),
        NoteContent::Malformed { kind } => bail!("note `{}` holds a {kind} value", args.target),
    }
    Ok(())
}

fn status(service: &NotesService<SqliteNoteStore<'_>>) -> Result<()> {
    let snapshot = refresh(service)?;
    let report = snapshot.report();
    println!("{}", service.status().message());
    println!("notes: {}", snapshot.corpus().len());
    println!("indexed: {}", report.indexed);
    println!("skipped: {}", report.skipped.len());
    match service.store().last_import()? {
        Some(batch) => println!(
            "last import: {} notes at {} (epoch ms)",
            batch.note_count, batch.imported_at
        ),
        None => println!("last import: never"),
    }
    Ok(())
}

fn refresh(
    service: &NotesService<SqliteNoteStore<'_>>,
) -> Result<std::sync::Arc<notebase_core::Snapshot>> {
    let snapshot = service.refresh()?;
    if let CorpusStatus::Empty = service.status() {
        eprintln!("{}", service.status().message());
    }
    Ok(snapshot)
}

/// Reads every UTF-8 file under `dir`, keyed by `<dir name>/<relative path>`.
///
/// Files that are not valid UTF-8 are skipped with a warning. Symlinks are
/// not followed.
pub(crate) fn collect_import_files(dir: &Path) -> Result<BTreeMap<String, String>> {
    if !dir.is_dir() {
        bail!("`{}` is not a directory", dir.display());
    }
    let prefix = dir
        .canonicalize()?
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .unwrap_or_default();

    let mut files = BTreeMap::new();
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry.with_context(|| format!("failed to walk `{}`", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let Some(key) = import_key(&prefix, dir, path) else {
            warn!(
                "event=notes_import module=cli status=skipped reason=non_utf8_path path={}",
                path.display()
            );
            continue;
        };
        let bytes =
            fs::read(path).with_context(|| format!("failed to read `{}`", path.display()))?;
        match String::from_utf8(bytes) {
            Ok(text) => {
                files.insert(key, text);
            }
            Err(_) => {
                warn!(
                    "event=notes_import module=cli status=skipped reason=non_utf8_content key={}",
                    key
                );
                eprintln!("skipping non-UTF-8 file `{key}`");
            }
        }
    }
    Ok(files)
}

fn import_key(prefix: &str, root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut segments = Vec::new();
    if !prefix.is_empty() {
        segments.push(prefix.to_string());
    }
    for component in relative.components() {
        segments.push(component.as_os_str().to_str()?.to_string());
    }
    Some(segments.join("/"))
}

fn render_tree(node: &PathTreeNode, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    let marker = if node.children.is_some() { "/" } else { "" };
    out.push_str(&format!("{indent}{}{marker}\n", node.name));
    for child in node.children() {
        render_tree(child, depth + 1, out);
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    let line = text.lines().next().unwrap_or_default().trim();
    if line.chars().count() <= max_chars {
        return line.to_string();
    }
    let mut cut: String = line.chars().take(max_chars).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::{collect_import_files, preview, render_tree};
    use notebase_core::build_tree;
    use std::fs;

    #[test]
    fn import_keys_are_prefixed_with_folder_name() {
        let dir = tempfile::tempdir().unwrap();
        let vault = dir.path().join("vault");
        fs::create_dir_all(vault.join("daily")).unwrap();
        fs::write(vault.join("a.md"), "alpha").unwrap();
        fs::write(vault.join("daily").join("today.md"), "entry").unwrap();
        fs::write(vault.join("image.bin"), [0xff_u8, 0xfe, 0x00]).unwrap();

        let files = collect_import_files(&vault).unwrap();
        let keys: Vec<&str> = files.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["vault/a.md", "vault/daily/today.md"]);
        assert_eq!(files["vault/a.md"], "alpha");
    }

    #[cfg(unix)]
    #[test]
    fn import_survives_directory_symlink_loop() {
        let dir = tempfile::tempdir().unwrap();
        let vault = dir.path().join("vault");
        fs::create_dir_all(&vault).unwrap();
        fs::write(vault.join("a.md"), "alpha").unwrap();
        std::os::unix::fs::symlink(&vault, vault.join("loop")).unwrap();

        let files = collect_import_files(&vault).unwrap();
        let keys: Vec<&str> = files.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["vault/a.md"]);
    }

    #[test]
    fn import_rejects_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(collect_import_files(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn tree_listing_marks_folders() {
        let mut out = String::new();
        render_tree(&build_tree(["vault/a.md", "vault/daily/b.md"]), 0, &mut out);
        assert_eq!(out, "root/\n  vault/\n    a.md\n    daily/\n      b.md\n");
    }

    #[test]
    fn preview_uses_first_line_and_truncates() {
        assert_eq!(preview("title\nbody", 80), "title");
        assert_eq!(preview("abcdef", 3), "abc...");
    }
}
