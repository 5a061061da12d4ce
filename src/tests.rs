/*!
 * Tests for concatfs functionality
 */

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indicatif::ProgressBar;
use tempfile::{tempdir, TempDir};

use crate::classifier::TextClassifier;
use crate::engine::ConcatenationEngine;
use crate::error::{ConcatError, ErrorKind, Result};
use crate::policy::PathPolicy;
use crate::selection::{SelectionResolver, SelectionSet};
use crate::service::{FileService, ListDirectoryRequest, ReadFileRequest};
use crate::tree::TreeIndex;
use crate::walker::{DirectoryWalker, WalkOptions};

// Helper function to create a test directory structure
fn setup_test_directory() -> io::Result<(TempDir, PathBuf)> {
    let temp_dir = tempdir()?;
    let root = fs::canonicalize(temp_dir.path())?;

    fs::create_dir(root.join("src"))?;
    fs::create_dir(root.join("src").join("nested"))?;
    fs::create_dir(root.join("docs"))?;

    let mut main = File::create(root.join("src").join("main.py"))?;
    writeln!(main, "print('hello')")?;

    let mut lib = File::create(root.join("src").join("nested").join("lib.rs"))?;
    write!(lib, "pub fn f() {{}}")?;

    let mut readme = File::create(root.join("README.md"))?;
    writeln!(readme, "# Project")?;

    let mut notes = File::create(root.join("docs").join("notes.txt"))?;
    writeln!(notes, "some notes")?;

    let mut rules = File::create(root.join(".cursorrules"))?;
    writeln!(rules, "Be concise.")?;

    // Non-text files
    File::create(root.join("logo.png"))?.write_all(&[0x89, b'P', b'N', b'G'])?;
    File::create(root.join("Makefile"))?.write_all(b"all:\n")?;

    // Excluded directories
    fs::create_dir_all(root.join("node_modules").join("pkg"))?;
    File::create(root.join("node_modules").join("pkg").join("index.js"))?.write_all(b"x")?;
    fs::create_dir(root.join(".git"))?;
    File::create(root.join(".git").join("HEAD.txt"))?.write_all(b"ref")?;

    Ok((temp_dir, root))
}

fn walker_for(root: &Path) -> DirectoryWalker {
    DirectoryWalker::new(
        PathPolicy::with_roots([root]),
        TextClassifier::default(),
        WalkOptions::default(),
    )
}

fn engine() -> ConcatenationEngine {
    ConcatenationEngine::new(TextClassifier::default(), Arc::new(ProgressBar::hidden())).unwrap()
}

fn ids(root: &Path, entries: &[crate::types::PathEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|e| {
            Path::new(&e.id)
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .to_string()
        })
        .collect()
}

#[test]
fn test_non_recursive_listing() -> Result<()> {
    let (_temp, root) = setup_test_directory()?;
    let walker = walker_for(&root);

    let listing = walker.walk(&root, false)?;
    assert_eq!(
        ids(&root, &listing.entries),
        vec!["docs", "src", ".cursorrules", "README.md"]
    );
    assert!(listing.entries[0].is_directory);
    assert!(!listing.entries[3].is_directory);
    assert_eq!(listing.skipped_dirs, 2);
    Ok(())
}

#[test]
fn test_recursive_listing_returns_text_files_only() -> Result<()> {
    let (_temp, root) = setup_test_directory()?;
    let walker = walker_for(&root);

    let entries = walker.list(&root, true)?;
    assert_eq!(
        ids(&root, &entries),
        vec![
            "docs/notes.txt",
            "src/nested/lib.rs",
            "src/main.py",
            ".cursorrules",
            "README.md"
        ]
    );
    assert!(entries.iter().all(|e| !e.is_directory));
    Ok(())
}

#[test]
fn test_directory_with_nothing_listable_is_empty() -> Result<()> {
    let temp = tempdir()?;
    let root = fs::canonicalize(temp.path())?;
    fs::create_dir_all(root.join("node_modules").join("a"))?;
    fs::create_dir(root.join("dist"))?;
    File::create(root.join("image.png"))?;
    File::create(root.join("node_modules").join("a").join("x.js"))?;

    let walker = walker_for(&root);
    assert!(walker.list(&root, true)?.is_empty());
    assert!(walker.list(&root, false)?.is_empty());
    Ok(())
}

#[test]
fn test_listing_errors_are_distinguishable() -> Result<()> {
    let (_temp, root) = setup_test_directory()?;
    let walker = walker_for(&root);

    let missing = walker.list(&root.join("missing"), false).unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::NotFound);

    let denied = walker.list(Path::new("/"), false).unwrap_err();
    assert_eq!(denied.kind(), ErrorKind::AccessDenied);
    Ok(())
}

#[test]
fn test_sensitive_children_are_hidden() -> Result<()> {
    let (_temp, root) = setup_test_directory()?;
    File::create(root.join(".env"))?.write_all(b"API_KEY=1")?;
    fs::create_dir(root.join("secrets"))?;
    File::create(root.join("secrets").join("a.txt"))?.write_all(b"x")?;

    let walker = walker_for(&root);
    let names: Vec<String> = walker
        .list(&root, true)?
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert!(!names.contains(&".env".to_string()));
    assert!(!names.contains(&"a.txt".to_string()));
    Ok(())
}

#[test]
fn test_ignore_patterns_hide_entries() -> Result<()> {
    let (_temp, root) = setup_test_directory()?;
    let options = WalkOptions {
        ignore_patterns: vec!["*.md".to_string(), "docs".to_string()],
        ..WalkOptions::default()
    };
    let walker = DirectoryWalker::new(
        PathPolicy::with_roots([&root]),
        TextClassifier::default(),
        options,
    );

    let entries = walker.list(&root, true)?;
    let rel = ids(&root, &entries);
    assert!(!rel.contains(&"README.md".to_string()));
    assert!(!rel.contains(&"docs/notes.txt".to_string()));
    assert!(rel.contains(&"src/main.py".to_string()));
    Ok(())
}

#[test]
fn test_respect_gitignore() -> Result<()> {
    let (_temp, root) = setup_test_directory()?;
    let mut gitignore = File::create(root.join(".gitignore"))?;
    writeln!(gitignore, "docs/")?;
    writeln!(gitignore, "*.py")?;

    let options = WalkOptions {
        respect_gitignore: true,
        ..WalkOptions::default()
    };
    let walker = DirectoryWalker::new(
        PathPolicy::with_roots([&root]),
        TextClassifier::default(),
        options,
    );

    let rel = ids(&root, &walker.list(&root, true)?);
    assert!(!rel.contains(&"docs/notes.txt".to_string()));
    assert!(!rel.contains(&"src/main.py".to_string()));
    assert!(rel.contains(&"src/nested/lib.rs".to_string()));
    assert!(rel.contains(&".gitignore".to_string()));
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_symlink_cycle_is_not_followed() -> Result<()> {
    let (_temp, root) = setup_test_directory()?;
    std::os::unix::fs::symlink(&root, root.join("src").join("loop"))?;

    let walker = walker_for(&root);
    let entries = walker.list(&root, true)?;
    let rel = ids(&root, &entries);
    assert_eq!(rel.len(), 5);
    assert!(!rel.iter().any(|p| p.starts_with("src/loop")));

    // The tree builder terminates too
    let index = walker.build_tree(&root)?;
    assert!(index.contains(&root.join("src").join("loop").to_string_lossy()));
    Ok(())
}

#[test]
fn test_max_depth_bounds_recursion() -> Result<()> {
    let (_temp, root) = setup_test_directory()?;
    let options = WalkOptions {
        max_depth: 1,
        ..WalkOptions::default()
    };
    let walker = DirectoryWalker::new(
        PathPolicy::with_roots([&root]),
        TextClassifier::default(),
        options,
    );
    let rel = ids(&root, &walker.list(&root, true)?);
    assert!(rel.contains(&"src/main.py".to_string()));
    assert!(!rel.contains(&"src/nested/lib.rs".to_string()));
    Ok(())
}

#[test]
fn test_lazy_tree_expansion() -> Result<()> {
    let (_temp, root) = setup_test_directory()?;
    let walker = walker_for(&root);
    let root_id = root.to_string_lossy().to_string();
    let src_id = root.join("src").to_string_lossy().to_string();

    let mut index = TreeIndex::new(&root);
    walker.expand(&mut index, &root_id)?;
    assert_eq!(index.children(&root_id).len(), 4);
    assert!(!index.is_loaded(&src_id));

    walker.expand(&mut index, &src_id)?;
    assert!(index.is_loaded(&src_id));
    assert_eq!(index.children(&src_id).len(), 2);
    Ok(())
}

#[test]
fn test_resolve_directory_selection_with_duplicates() -> Result<()> {
    let (_temp, root) = setup_test_directory()?;
    let walker = walker_for(&root);
    let main_py = root.join("src").join("main.py");

    let selection = SelectionSet::from_ids([
        main_py.to_string_lossy().to_string(),
        root.join("src").to_string_lossy().to_string(),
        root.join("logo.png").to_string_lossy().to_string(),
    ]);
    let index = TreeIndex::new(&root);
    let resolution = SelectionResolver::new(&walker).resolve(&selection, &index)?;

    assert_eq!(
        resolution.files,
        vec![main_py, root.join("src").join("nested").join("lib.rs")]
    );
    Ok(())
}

#[test]
fn test_resolve_picks_up_late_discovered_children() -> Result<()> {
    let (_temp, root) = setup_test_directory()?;
    let walker = walker_for(&root);
    let docs_id = root.join("docs").to_string_lossy().to_string();

    let mut index = TreeIndex::new(&root);
    walker.expand(&mut index, &root.to_string_lossy())?;
    let mut selection = SelectionSet::new();
    selection.toggle(&docs_id, true, &index);

    // File appears after the directory was checked
    File::create(root.join("docs").join("later.md"))?.write_all(b"late")?;

    let resolution = SelectionResolver::new(&walker).resolve(&selection, &index)?;
    assert_eq!(resolution.len(), 2);
    assert!(resolution.files.contains(&root.join("docs").join("later.md")));
    Ok(())
}

#[test]
fn test_resolve_counts_skipped_dirs_and_reports_empty() -> Result<()> {
    let temp = tempdir()?;
    let root = fs::canonicalize(temp.path())?;
    fs::create_dir(root.join("build"))?;
    File::create(root.join("build").join("out.js"))?;

    let walker = walker_for(&root);
    let selection = SelectionSet::from_ids([root.to_string_lossy().to_string()]);
    let resolution = SelectionResolver::new(&walker).resolve(&selection, &TreeIndex::new(&root))?;
    assert!(resolution.is_empty());
    assert_eq!(resolution.skipped_dirs, 1);
    Ok(())
}

#[test]
fn test_concatenate_selected_directory_end_to_end() -> Result<()> {
    let (_temp, root) = setup_test_directory()?;
    let service = FileService::new(walker_for(&root));

    let selection = SelectionSet::from_ids([root.to_string_lossy().to_string()]);
    let resolution =
        SelectionResolver::new(service.walker()).resolve(&selection, &TreeIndex::new(&root))?;
    let result = engine().concatenate_resolution(&resolution, &service, &root);

    assert_eq!(result.stats.processed_files, 5);
    assert_eq!(result.stats.errors, 0);
    assert_eq!(result.stats.skipped_dirs, 2);
    assert!(result.content.contains("1. [docs/notes.txt](#file-1)"));
    assert!(result.content.contains("## File 3: `src/main.py`\n\n```python\nprint('hello')\n```"));
    assert!(result
        .content
        .contains("## File 2: `src/nested/lib.rs`\n\n```rust\npub fn f() {}\n```"));
    assert!(result
        .content
        .contains("## File 4: `.cursorrules` (Cursorrules)\n\n### This file describes the overall"));
    assert!(result.content.contains("- Directories skipped: 2"));
    assert!(!result.content.contains("node_modules"));
    Ok(())
}

#[test]
fn test_unreadable_file_counts_as_error() -> Result<()> {
    let (_temp, root) = setup_test_directory()?;
    let service = FileService::new(walker_for(&root));
    let files = vec![root.join("README.md"), root.join("gone.md")];

    let result = engine().concatenate(&files, &service, &root);
    assert_eq!(result.stats.processed_files, 1);
    assert_eq!(result.stats.errors, 1);
    assert!(result
        .content
        .contains("## File 2: `gone.md`\n\n*[Error reading file: Path not found"));
    assert!(result.content.contains("- Errors encountered: 1"));
    Ok(())
}

#[test]
fn test_read_file_contract() -> Result<()> {
    let (_temp, root) = setup_test_directory()?;
    let service = FileService::new(walker_for(&root));
    let read = |p: &Path| {
        service.read_file(&ReadFileRequest {
            path: p.to_string_lossy().to_string(),
        })
    };

    let ok = read(&root.join("README.md"));
    assert!(ok.success);
    assert_eq!(ok.content.as_deref(), Some("# Project\n"));

    let dir = read(&root.join("src"));
    assert!(!dir.success);

    let binary = read(&root.join("logo.png"));
    assert_eq!(binary.error.as_deref(), Some(
        format!("Not a valid text file: {}", root.join("logo.png").display()).as_str()
    ));

    let outside = read(Path::new("/etc/hosts"));
    assert_eq!(outside.error.as_deref(), Some("Access not allowed for security reasons"));

    let empty = service.read_file(&ReadFileRequest { path: "  ".to_string() });
    assert!(!empty.success);
    Ok(())
}

#[test]
fn test_read_text_rejects_directories_named_like_text() -> Result<()> {
    let (_temp, root) = setup_test_directory()?;
    fs::create_dir(root.join("weird.md"))?;
    let service = FileService::new(walker_for(&root));

    match service.read_text(&root.join("weird.md")) {
        Err(ConcatError::IsDirectory(_)) => Ok(()),
        other => panic!("expected IsDirectory, got {:?}", other),
    }
}

#[test]
fn test_list_directory_contract() -> Result<()> {
    let (_temp, root) = setup_test_directory()?;
    let service = FileService::new(walker_for(&root));

    let response = service.list_directory(&ListDirectoryRequest {
        path: root.to_string_lossy().to_string(),
        recursive: true,
    });
    assert!(response.success);
    assert_eq!(response.entries.map(|e| e.len()), Some(5));

    let json = service.handle_json(
        "list",
        &serde_json::json!({ "path": root.join("nope") }).to_string(),
    )?;
    let value: serde_json::Value = serde_json::from_str(&json)?;
    assert_eq!(value["success"], false);
    assert!(value["error"].as_str().unwrap().starts_with("Path not found"));

    let empty = service.list_directory(&ListDirectoryRequest {
        path: String::new(),
        recursive: false,
    });
    assert!(!empty.success);
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_symlink_out_of_root_is_refused() -> Result<()> {
    let temp = tempdir()?;
    let base = fs::canonicalize(temp.path())?;
    let proj = base.join("proj");
    let keys = base.join("home").join(".ssh");
    fs::create_dir(&proj)?;
    fs::create_dir_all(&keys)?;
    fs::create_dir(base.join("outside"))?;
    fs::write(keys.join("id_rsa.txt"), "PRIVATE KEY")?;
    fs::write(base.join("outside").join("plan.md"), "outside root")?;
    fs::write(proj.join("a.md"), "inside")?;
    std::os::unix::fs::symlink(keys.join("id_rsa.txt"), proj.join("notes.txt"))?;
    std::os::unix::fs::symlink(base.join("outside"), proj.join("linked"))?;

    let service = FileService::new(walker_for(&proj));

    // Listing hides both links
    let rel = ids(&proj, &service.walker().list(&proj, true)?);
    assert_eq!(rel, vec!["a.md"]);

    // Reading through the file link is denied
    let response = service.read_file(&ReadFileRequest {
        path: proj.join("notes.txt").to_string_lossy().to_string(),
    });
    assert!(!response.success);
    assert_eq!(
        response.error.as_deref(),
        Some("Access not allowed for security reasons")
    );
    assert!(response.content.is_none());

    // Listing the directory link itself is denied
    let denied = service.walker().list(&proj.join("linked"), false).unwrap_err();
    assert_eq!(denied.kind(), ErrorKind::AccessDenied);

    // A concatenation naming the link directly records an error, not the key
    let files = vec![proj.join("a.md"), proj.join("notes.txt")];
    let result = engine().concatenate(&files, &service, &proj);
    assert_eq!(result.stats.processed_files, 1);
    assert_eq!(result.stats.errors, 1);
    assert!(!result.content.contains("PRIVATE KEY"));
    Ok(())
}

#[test]
fn test_binary_files_are_ignored_without_fetching() -> Result<()> {
    let (_temp, root) = setup_test_directory()?;
    let provider = |path: &Path| -> Result<String> {
        assert!(
            !path.to_string_lossy().ends_with(".png"),
            "binary file should not be fetched"
        );
        Ok(fs::read_to_string(path)?)
    };
    let files = vec![root.join("src").join("main.py"), root.join("logo.png")];

    let result = engine().concatenate(&files, &provider, &root);
    assert_eq!(result.stats.processed_files, 1);
    assert_eq!(result.stats.ignored_files, 1);
    assert_eq!(result.stats.errors, 0);
    assert!(result.content.contains("2. [logo.png](#file-2)"));
    assert!(result
        .content
        .contains("## File 2: `logo.png`\n\n*Skipped: binary file type*\n"));
    assert!(result.content.contains("- Files ignored: 1"));
    Ok(())
}
