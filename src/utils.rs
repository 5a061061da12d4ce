/*!
 * Utility functions and default tables for concatfs
 */

use std::path::Path;

use once_cell::sync::Lazy;

/// Format a count with thousands separators (`12345` -> `12,345`)
pub fn format_with_commas(num: usize) -> String {
    let digits = num.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Format a number with human-readable units
pub fn format_number(num: usize) -> String {
    if num >= 1_000_000 {
        format!("{:.1}M", num as f64 / 1_000_000.0)
    } else if num >= 1_000 {
        format!("{:.1}K", num as f64 / 1_000.0)
    } else {
        num.to_string()
    }
}

/// Lower-cased extension of a file name: the text after the last `.`.
///
/// A name without a `.` has no extension. A leading-dot name such as
/// `.gitignore` has the extension `gitignore`.
pub fn extension_of(name: &str) -> Option<String> {
    name.rfind('.').map(|idx| name[idx + 1..].to_ascii_lowercase())
}

/// Final component of a path as a string
pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

/// Path relative to `root`, with forward slashes and no leading separator
pub fn relative_display(path: &Path, root: &Path) -> String {
    let rel = path
        .strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string();
    let rel = rel.replace('\\', "/");
    let trimmed = rel.trim_start_matches('/');
    if trimmed.is_empty() {
        file_name_of(path)
    } else {
        trimmed.to_string()
    }
}

/// Extensions treated as text, without the leading dot
pub static DEFAULT_TEXT_EXTENSIONS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "txt", "md", "py", "js", "html", "css", "json", "xml", "yaml", "yml", "sh", "bat", "ps1",
        "java", "c", "cpp", "h", "hpp", "cs", "php", "rb", "go", "rs", "ts", "jsx", "tsx", "vue",
        "scala", "kt", "groovy", "gradle", "sql", "gitignore", "env", "cfg", "ini", "toml", "csv",
    ]
});

/// Whole file names treated as text regardless of extension
pub static DEFAULT_TEXT_FILENAMES: Lazy<Vec<&'static str>> = Lazy::new(|| vec![".cursorrules"]);

/// Generated file names never listed, even with a text extension
pub static DEFAULT_IGNORED_FILENAMES: Lazy<Vec<&'static str>> =
    Lazy::new(|| vec!["package-lock.json"]);

/// Known binary extensions. These win over the text set and are skipped
/// by the concatenation engine without being fetched.
pub static DEFAULT_BINARY_EXTENSIONS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        // Images
        "jpg", "jpeg", "png", "gif", "bmp", "ico",
        // Audio & video
        "mp3", "mp4", "wav", "avi", "mov",
        // Archives
        "zip", "tar", "gz", "rar",
        // Executables & libraries
        "exe", "dll", "so", "dylib",
        // Compiled bytecode
        "pyc", "class",
    ]
});

/// Directory names never listed or descended into
pub static DEFAULT_EXCLUDED_DIRS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        // Dependencies
        "node_modules",
        "vendor",
        "site-packages",
        // Version Control
        ".git",
        ".svn",
        // Build & Dist
        ".next",
        "dist",
        "build",
        // Python
        "__pycache__",
        "venv",
        // IDEs & Editors
        ".idea",
        ".vscode",
    ]
});

/// Extension -> markdown fence language
pub static DEFAULT_FENCE_LANGUAGES: Lazy<Vec<(&'static str, &'static str)>> = Lazy::new(|| {
    vec![
        ("ts", "typescript"),
        ("tsx", "typescript"),
        ("js", "javascript"),
        ("jsx", "javascript"),
        ("py", "python"),
        ("java", "java"),
        ("cpp", "cpp"),
        ("hpp", "cpp"),
        ("c", "c"),
        ("h", "c"),
        ("cs", "csharp"),
        ("go", "go"),
        ("rs", "rust"),
        ("rb", "ruby"),
        ("php", "php"),
        ("html", "html"),
        ("css", "css"),
        ("scss", "scss"),
        ("sass", "sass"),
        ("less", "less"),
        ("json", "json"),
        ("yml", "yaml"),
        ("yaml", "yaml"),
        ("md", "markdown"),
        ("sql", "sql"),
        ("sh", "bash"),
        ("bash", "bash"),
        ("ps1", "powershell"),
        ("bat", "batch"),
        ("xml", "xml"),
        ("toml", "toml"),
        ("ini", "ini"),
        ("kt", "kotlin"),
        ("scala", "scala"),
        ("groovy", "groovy"),
        ("gradle", "groovy"),
        ("vue", "vue"),
        ("csv", "csv"),
        ("dockerfile", "dockerfile"),
    ]
});

/// Fence tag for anything not in the language table
pub const PLAIN_TEXT_LANGUAGE: &str = "plaintext";

/// Path components that always veto access (credential stores, shell history)
pub static DEFAULT_SENSITIVE_COMPONENTS: Lazy<Vec<&'static str>> =
    Lazy::new(|| vec![".ssh", ".aws", ".config", ".gnupg", ".bash_history"]);

/// Case-insensitive substrings that veto any path component containing them
pub static DEFAULT_SENSITIVE_TERMS: Lazy<Vec<&'static str>> =
    Lazy::new(|| vec!["password", "secret"]);

/// Case-insensitive substrings marking an env key whose value gets masked
pub static DEFAULT_MASKED_KEY_TERMS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "key",
        "token",
        "secret",
        "password",
        "auth",
        "pwd",
        "credential",
    ]
});
