//! Document library commands (admin)

use super::Context;
use crate::api::types::{FileSystemItem, ItemKind};
use crate::auth::Route;
use crate::cli::FileCommand;
use crate::error::{DocchatError, Result};
use crate::format::{format_size, format_timestamp};

use colored::Colorize;
use prettytable::{format, Table};
use std::collections::HashSet;
use std::path::PathBuf;

/// Folder depth past which the breadcrumb walk gives up.
const MAX_BREADCRUMB_DEPTH: usize = 32;

/// Handle file commands
pub async fn handle_files(ctx: &Context, command: FileCommand) -> Result<()> {
    ctx.guard(Route::Documents).await?;

    match command {
        FileCommand::Browse { folder, json } => {
            let items = ctx.client.browse(folder).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
                return Ok(());
            }
            let crumbs = breadcrumb(ctx, folder).await?;
            println!("\n{}", crumbs.join(" / ").bold());
            print_items(&items);
        }
        FileCommand::Mkdir { name, parent } => {
            let name = name.trim();
            if name.is_empty() {
                return Err(
                    DocchatError::Validation("Folder name cannot be empty".to_string()).into(),
                );
            }
            let folder = ctx.client.create_folder(name, parent).await?;
            println!(
                "{}",
                format!("Created folder {} (id {})", folder.name, folder.id).green()
            );
        }
        FileCommand::Upload { path, folder } => {
            if !path.is_file() {
                return Err(DocchatError::NotFound(path.display().to_string()).into());
            }
            let record = ctx.client.upload(&path, folder).await?;
            println!(
                "{}",
                format!("Uploaded {} (id {})", record.name, record.id).green()
            );
        }
        FileCommand::Download { id, output } => {
            let file = ctx.client.download(id).await?;
            let target = download_target(output, file.filename.as_deref(), id);
            tokio::fs::write(&target, &file.bytes).await?;
            println!(
                "{}",
                format!(
                    "Saved {} ({})",
                    target.display(),
                    format_size(file.bytes.len() as u64)
                )
                .green()
            );
        }
        FileCommand::Rm { id } => {
            ctx.client.delete_item(ItemKind::File, id).await?;
            println!("{}", format!("Deleted file {}", id).green());
        }
        FileCommand::Rmdir { id } => {
            ctx.client.delete_item(ItemKind::Folder, id).await?;
            println!("{}", format!("Deleted folder {} and its contents", id).green());
        }
    }

    Ok(())
}

/// `Root / parent / folder`, walking `parent_id` links up from `folder`.
async fn breadcrumb(ctx: &Context, folder: Option<i64>) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let mut seen = HashSet::new();
    let mut current = folder;

    while let Some(id) = current {
        if !seen.insert(id) || names.len() >= MAX_BREADCRUMB_DEPTH {
            tracing::warn!("Folder hierarchy above {} loops or is too deep", id);
            break;
        }
        let folder = ctx.client.folder(id).await?;
        names.push(folder.name);
        current = folder.parent_id;
    }

    names.push("Root".to_string());
    names.reverse();
    Ok(names)
}

fn print_items(items: &[FileSystemItem]) {
    if items.is_empty() {
        println!("{}", "This folder is empty.".yellow());
        return;
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(prettytable::row![
        "Type".bold(),
        "ID".bold(),
        "Name".bold(),
        "Size".bold(),
        "Modified".bold()
    ]);

    let mut sorted: Vec<&FileSystemItem> = items.iter().collect();
    sorted.sort_by(|a, b| {
        (a.kind != ItemKind::Folder, a.name.to_lowercase())
            .cmp(&(b.kind != ItemKind::Folder, b.name.to_lowercase()))
    });

    for item in sorted {
        let name = match item.kind {
            ItemKind::Folder => format!("{}/", item.name).blue().bold(),
            ItemKind::File => item.name.normal(),
        };
        let size = item.size.map(format_size).unwrap_or_else(|| "-".to_string());
        table.add_row(prettytable::row![
            item.kind,
            item.id,
            name,
            size,
            format_timestamp(&item.updated_at)
        ]);
    }
    table.printstd();
}

/// Where a download is written: the explicit path, a directory joined with
/// the served name, or the served name in the current directory.
fn download_target(output: Option<PathBuf>, served: Option<&str>, id: i64) -> PathBuf {
    let name = served
        .and_then(|n| std::path::Path::new(n).file_name())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(format!("document-{}", id)));
    match output {
        Some(path) if path.is_dir() => path.join(name),
        Some(path) => path,
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_target_prefers_explicit_file() {
        let target = download_target(Some(PathBuf::from("/tmp/out.pdf")), Some("a.pdf"), 1);
        assert_eq!(target, PathBuf::from("/tmp/out.pdf"));
    }

    #[test]
    fn test_download_target_joins_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let target = download_target(Some(dir.path().to_path_buf()), Some("a.pdf"), 1);
        assert_eq!(target, dir.path().join("a.pdf"));
    }

    #[test]
    fn test_download_target_strips_served_directories() {
        assert_eq!(
            download_target(None, Some("../../etc/passwd"), 3),
            PathBuf::from("passwd")
        );
        assert_eq!(download_target(None, None, 3), PathBuf::from("document-3"));
    }
}
