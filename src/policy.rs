/*!
 * Path access policy
 *
 * Every path is normalized lexically, checked against the sensitive
 * veto list, then accepted only if it sits under an allow-listed root.
 * No filesystem call happens here, so the check can run before `stat`.
 */

use std::env;
use std::path::{Component, Path, PathBuf};

use crate::utils::{DEFAULT_SENSITIVE_COMPONENTS, DEFAULT_SENSITIVE_TERMS};

/// Deny rules applied before the allow-list
#[derive(Debug, Clone)]
pub struct PolicyRules {
    /// Component names that veto a path (`.ssh`, `.aws`, ...), ignoring ASCII case
    pub sensitive_components: Vec<String>,
    /// Case-insensitive substrings that veto any component containing them
    pub sensitive_terms: Vec<String>,
    /// Veto `.env` and `.env.*` file names
    pub deny_env_files: bool,
}

impl Default for PolicyRules {
    fn default() -> Self {
        Self {
            sensitive_components: DEFAULT_SENSITIVE_COMPONENTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            sensitive_terms: DEFAULT_SENSITIVE_TERMS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            deny_env_files: true,
        }
    }
}

/// Decides whether a path may be read
#[derive(Debug, Clone)]
pub struct PathPolicy {
    rules: PolicyRules,
    allowed_roots: Vec<PathBuf>,
}

impl PathPolicy {
    /// Create a policy with the given rules and allow-listed roots
    pub fn new(rules: PolicyRules, allowed_roots: Vec<PathBuf>) -> Self {
        let allowed_roots = allowed_roots.iter().map(|p| normalize(p)).collect();
        Self {
            rules,
            allowed_roots,
        }
    }

    /// Policy with default deny rules and the given roots
    pub fn with_roots<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Self::new(
            PolicyRules::default(),
            roots.into_iter().map(|p| p.as_ref().to_path_buf()).collect(),
        )
    }

    /// Allow-listed roots after normalization
    pub fn allowed_roots(&self) -> &[PathBuf] {
        &self.allowed_roots
    }

    /// Whether `path` may be read
    pub fn is_allowed(&self, path: &Path) -> bool {
        let normalized = normalize(path);

        if self.is_sensitive(&normalized) {
            log::debug!("Blocked access to sensitive path: {}", normalized.display());
            return false;
        }

        if self
            .allowed_roots
            .iter()
            .any(|root| normalized.starts_with(root))
        {
            return true;
        }

        log::debug!("Path not explicitly allowed: {}", normalized.display());
        false
    }

    fn is_sensitive(&self, path: &Path) -> bool {
        path.components().any(|component| match component {
            Component::Normal(os) => {
                let name = os.to_string_lossy();
                self.is_sensitive_component(&name)
            }
            _ => false,
        })
    }

    fn is_sensitive_component(&self, name: &str) -> bool {
        if self
            .rules
            .sensitive_components
            .iter()
            .any(|c| c.eq_ignore_ascii_case(name))
        {
            return true;
        }
        let lower = name.to_lowercase();
        if self.rules.deny_env_files && (lower == ".env" || lower.starts_with(".env.")) {
            return true;
        }
        self.rules
            .sensitive_terms
            .iter()
            .any(|term| lower.contains(&term.to_lowercase()))
    }
}

/// Lexically normalize a path: make it absolute against the current
/// directory, drop `.`, resolve `..`, collapse separators.
pub fn normalize(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root
                if !matches!(
                    out.components().next_back(),
                    Some(Component::RootDir) | Some(Component::Prefix(_)) | None
                ) {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
