// modules.rs — Where imported modules come from
//
// A module path (`context`, `golang.org/x/net/context`) is resolved to a set
// of `.go` declaration files by consulting `ModuleSource`s in order: the
// unit's own `vendor` directory, stub directories named on the command line,
// then the stubs embedded in the binary.
//
// Preconditions: none.
// Postconditions: returned files are sorted by file name.
// Failure modes: I/O errors while reading a stub directory.
// Side effects: reads the filesystem (`DirModules` only).

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

/// One declaration file of a module.
#[derive(Debug, Clone)]
pub struct ModuleFile {
    /// Path shown in diagnostics.
    pub path: PathBuf,
    pub text: String,
}

/// A place module declarations can be found.
pub trait ModuleSource {
    /// Human-readable origin, for logs.
    fn describe(&self) -> String;

    /// Files of `module`, or `None` when this source does not provide it.
    fn find(&self, module: &str) -> io::Result<Option<Vec<ModuleFile>>>;
}

// ── Built-in stubs ──────────────────────────────────────────────────────────

/// (module path, file name, contents)
const BUILTIN: &[(&str, &str, &str)] = &[
    (
        "context",
        "context.go",
        include_str!("../stubs/context/context.go"),
    ),
    (
        "golang.org/x/net/context",
        "context.go",
        include_str!("../stubs/golang.org/x/net/context/context.go"),
    ),
    ("errors", "errors.go", include_str!("../stubs/errors/errors.go")),
    ("fmt", "fmt.go", include_str!("../stubs/fmt/fmt.go")),
    ("time", "time.go", include_str!("../stubs/time/time.go")),
];

/// Declaration stubs compiled into the binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinModules;

impl BuiltinModules {
    pub fn module_paths() -> impl Iterator<Item = &'static str> {
        BUILTIN.iter().map(|(module, _, _)| *module)
    }
}

impl ModuleSource for BuiltinModules {
    fn describe(&self) -> String {
        "built-in stubs".to_string()
    }

    fn find(&self, module: &str) -> io::Result<Option<Vec<ModuleFile>>> {
        let files: Vec<ModuleFile> = BUILTIN
            .iter()
            .filter(|(m, _, _)| *m == module)
            .map(|(m, name, text)| ModuleFile {
                path: Path::new("$builtin").join(m).join(name),
                text: (*text).to_string(),
            })
            .collect();
        Ok((!files.is_empty()).then_some(files))
    }
}

// ── Stub directories ────────────────────────────────────────────────────────

/// Modules laid out as `<root>/<module path>/*.go`.
#[derive(Debug, Clone)]
pub struct DirModules {
    root: PathBuf,
}

impl DirModules {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirModules { root: root.into() }
    }
}

/// Module paths are relative, slash-separated and never climb out of a root.
fn is_clean_module_path(module: &str) -> bool {
    !module.is_empty()
        && Path::new(module)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

impl ModuleSource for DirModules {
    fn describe(&self) -> String {
        format!("stub dir {}", self.root.display())
    }

    fn find(&self, module: &str) -> io::Result<Option<Vec<ModuleFile>>> {
        if !is_clean_module_path(module) {
            return Ok(None);
        }
        let dir = self.root.join(module);
        if !dir.is_dir() {
            return Ok(None);
        }
        let mut files = Vec::new();
        for path in list_go_files(&dir)? {
            let text = fs::read_to_string(&path)?;
            files.push(ModuleFile { path, text });
        }
        Ok((!files.is_empty()).then_some(files))
    }
}

/// Whether the go tool would build `name`: a `.go` file that is not a test
/// and does not start with `_` or `.`.
fn is_source_name(name: &str) -> bool {
    name.ends_with(".go")
        && !name.ends_with("_test.go")
        && !name.starts_with('_')
        && !name.starts_with('.')
}

/// Buildable `.go` files of a directory, sorted by file name.
pub fn list_go_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if is_source_name(name) && entry.file_type()?.is_file() {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

// ── Registry ────────────────────────────────────────────────────────────────

/// Ordered list of module sources; the first source providing a module wins.
#[derive(Clone)]
pub struct ModuleRegistry {
    sources: Vec<Arc<dyn ModuleSource + Send + Sync>>,
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self.sources.iter().map(|s| s.describe()).collect();
        f.debug_struct("ModuleRegistry")
            .field("sources", &names)
            .finish()
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::with_stub_dirs(&[])
    }
}

impl ModuleRegistry {
    /// An empty registry; no module resolves.
    pub fn empty() -> Self {
        ModuleRegistry {
            sources: Vec::new(),
        }
    }

    /// Stub directories (in order) followed by the built-in stubs.
    pub fn with_stub_dirs(dirs: &[PathBuf]) -> Self {
        let mut registry = Self::empty();
        for dir in dirs {
            registry.push(DirModules::new(dir.clone()));
        }
        registry.push(BuiltinModules);
        registry
    }

    pub fn push(&mut self, source: impl ModuleSource + Send + Sync + 'static) {
        self.sources.push(Arc::new(source));
    }

    /// Consult `source` before every source already registered.
    pub fn prepend(&mut self, source: impl ModuleSource + Send + Sync + 'static) {
        self.sources.insert(0, Arc::new(source));
    }

    pub fn find(&self, module: &str) -> io::Result<Option<Vec<ModuleFile>>> {
        for source in &self.sources {
            if let Some(files) = source.find(module)? {
                debug!(module, source = %source.describe(), files = files.len(), "module found");
                return Ok(Some(files));
            }
        }
        debug!(module, "module not found");
        Ok(None)
    }
}
