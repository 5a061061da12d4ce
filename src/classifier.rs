/*!
 * Text file detection and fence language mapping
 */

use std::collections::{HashMap, HashSet};

use crate::utils::{
    extension_of, DEFAULT_BINARY_EXTENSIONS, DEFAULT_FENCE_LANGUAGES, DEFAULT_TEXT_EXTENSIONS,
    DEFAULT_IGNORED_FILENAMES, DEFAULT_TEXT_FILENAMES, PLAIN_TEXT_LANGUAGE,
};

/// Lookup tables used by [`TextClassifier`]. Extensions are stored
/// lower-case without the leading dot.
#[derive(Debug, Clone)]
pub struct ClassifierTables {
    pub text_extensions: HashSet<String>,
    pub text_filenames: HashSet<String>,
    pub ignored_filenames: HashSet<String>,
    pub binary_extensions: HashSet<String>,
    pub fence_languages: HashMap<String, String>,
}

impl Default for ClassifierTables {
    fn default() -> Self {
        Self {
            text_extensions: DEFAULT_TEXT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            text_filenames: DEFAULT_TEXT_FILENAMES.iter().map(|s| s.to_string()).collect(),
            ignored_filenames: DEFAULT_IGNORED_FILENAMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            binary_extensions: DEFAULT_BINARY_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            fence_languages: DEFAULT_FENCE_LANGUAGES
                .iter()
                .map(|(ext, lang)| (ext.to_string(), lang.to_string()))
                .collect(),
        }
    }
}

/// Classifies file names as text or not
#[derive(Debug, Clone, Default)]
pub struct TextClassifier {
    tables: ClassifierTables,
}

impl TextClassifier {
    /// Create a classifier over custom tables
    pub fn new(tables: ClassifierTables) -> Self {
        Self { tables }
    }

    /// The tables in use
    pub fn tables(&self) -> &ClassifierTables {
        &self.tables
    }

    /// Whether `filename` names a text file eligible for inclusion
    pub fn is_text_file(&self, filename: &str) -> bool {
        if self.tables.ignored_filenames.contains(&filename.to_lowercase()) {
            return false;
        }
        if self.tables.text_filenames.contains(filename) {
            return true;
        }
        match extension_of(filename) {
            Some(ext) => {
                !self.tables.binary_extensions.contains(&ext)
                    && self.tables.text_extensions.contains(&ext)
            }
            None => false,
        }
    }

    /// Whether the extension of `filename` is in the binary set
    pub fn is_binary(&self, filename: &str) -> bool {
        extension_of(filename).is_some_and(|ext| self.tables.binary_extensions.contains(&ext))
    }

    /// Markdown fence tag for `filename`
    pub fn fence_language(&self, filename: &str) -> &str {
        extension_of(filename)
            .and_then(|ext| self.tables.fence_languages.get(&ext))
            .map(String::as_str)
            .unwrap_or(PLAIN_TEXT_LANGUAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_extensions_are_text() {
        let c = TextClassifier::default();
        let names = ["a.txt", "README.md", "main.py", "App.TSX", "data.csv", "x.env", ".gitignore"];
        for name in names {
            assert!(c.is_text_file(name), "{name} should be text");
        }
    }

    #[test]
    fn cursorrules_is_text_but_no_extension_is_not() {
        let c = TextClassifier::default();
        assert!(c.is_text_file(".cursorrules"));
        assert!(!c.is_text_file("Makefile"));
        assert!(!c.is_text_file("LICENSE"));
    }

    #[test]
    fn lock_files_are_never_text() {
        let c = TextClassifier::default();
        assert!(!c.is_text_file("package-lock.json"));
        assert!(!c.is_text_file("Package-Lock.json"));
        assert!(c.is_text_file("package.json"));
    }

    #[test]
    fn binary_and_unknown_extensions_are_not_text() {
        let c = TextClassifier::default();
        for name in ["logo.png", "song.mp3", "a.zip", "tool.exe", "mod.pyc", "x.unknown"] {
            assert!(!c.is_text_file(name), "{name} should not be text");
        }
    }

    #[test]
    fn binary_set_wins_over_text_set() {
        let mut tables = ClassifierTables::default();
        tables.text_extensions.insert("png".to_string());
        let c = TextClassifier::new(tables);
        assert!(!c.is_text_file("logo.png"));
        assert!(c.is_binary("logo.PNG"));
    }

    #[test]
    fn classification_is_stable() {
        let c = TextClassifier::default();
        for name in ["a.rs", "b.png", ".cursorrules", "c"] {
            assert_eq!(c.is_text_file(name), c.is_text_file(name));
        }
    }

    #[test]
    fn fence_languages() {
        let c = TextClassifier::default();
        assert_eq!(c.fence_language("a.py"), "python");
        assert_eq!(c.fence_language("a.ts"), "typescript");
        assert_eq!(c.fence_language("a.tsx"), "typescript");
        assert_eq!(c.fence_language("lib.RS"), "rust");
        assert_eq!(c.fence_language("notes.txt"), "plaintext");
        assert_eq!(c.fence_language("Makefile"), "plaintext");
    }
}
