// provider.rs — Loading and checking one analysis unit
//
// A unit is a directory of `.go` files forming one package. The provider
// reads the files in file-name order, parses them into a fresh `Session`,
// and type-checks the package, importing modules through the session's
// `ModuleRegistry`. A `vendor` directory inside the unit provides modules
// for that unit only, ahead of every other source.
//
// Preconditions: `base_dir` is the directory unit identifiers are relative to.
// Postconditions: file ids follow file-name order; displayed paths are
//                 `<ident>/<file name>`.
// Failure modes: `UnitError::Load` (missing directory, no files, unreadable
//                file, syntax error, mixed package clauses) and
//                `UnitError::TypeCheck`.
// Side effects: reads the filesystem.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::binding::ObjKind;
use crate::check::{self, ModuleError, ParsedFile, Session};
use crate::error::UnitError;
use crate::id::{ScopeId, TypeId};
use crate::modules::{list_go_files, DirModules, ModuleRegistry};

/// A parsed and type-checked unit.
#[derive(Debug)]
pub struct CheckedUnit {
    pub ident: String,
    pub session: Session,
    pub files: Vec<ParsedFile>,
    /// Package scope of the unit.
    pub package: ScopeId,
}

impl CheckedUnit {
    /// Look up type `name` in the package scope of `module`, importing the
    /// module into this unit's session if the unit did not already.
    pub fn resolve_type(&mut self, module: &str, name: &str) -> Result<TypeId, UnitError> {
        let info = self.session.load_module(module).map_err(|e| {
            let reason = match e {
                ModuleError::NotFound => "module not found".to_string(),
                ModuleError::Cycle => "import cycle".to_string(),
                ModuleError::Io(message) => message,
                ModuleError::Failed(diag) => diag.render(&self.session.sources),
            };
            UnitError::UnresolvedModule {
                unit: self.ident.clone(),
                module: module.to_string(),
                reason,
            }
        })?;

        let symbols = &self.session.symbols;
        symbols
            .lookup_local(info.scope, name)
            .map(|obj| symbols.obj(obj))
            .filter(|obj| obj.kind == ObjKind::TypeName)
            .map(|obj| obj.ty)
            .ok_or_else(|| UnitError::UnresolvedType {
                unit: self.ident.clone(),
                module: module.to_string(),
                name: name.to_string(),
            })
    }

    /// SHA-256 over each unit file's displayed path and contents, in file
    /// order, hex encoded.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for file in &self.files {
            let source = self.session.sources.file(file.id);
            hasher.update(source.path.to_string_lossy().as_bytes());
            hasher.update([0u8]);
            hasher.update(source.text.as_bytes());
            hasher.update([0u8]);
        }
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }
}

/// Produces checked units; the analysis core depends only on this trait.
pub trait UnitProvider {
    fn load_unit(&self, ident: &str, base_dir: &Path) -> Result<CheckedUnit, UnitError>;
}

/// Reads units from the filesystem and checks them with the bundled front end.
#[derive(Debug, Clone, Default)]
pub struct FsProvider {
    modules: Arc<ModuleRegistry>,
}

impl FsProvider {
    pub fn new(modules: ModuleRegistry) -> Self {
        FsProvider {
            modules: Arc::new(modules),
        }
    }
}

impl UnitProvider for FsProvider {
    fn load_unit(&self, ident: &str, base_dir: &Path) -> Result<CheckedUnit, UnitError> {
        let load = |message: String| UnitError::Load {
            unit: ident.to_string(),
            message,
        };

        let dir = base_dir.join(ident);
        let paths = list_go_files(&dir)
            .map_err(|e| load(format!("{ident}: cannot read unit directory: {e}")))?;
        if paths.is_empty() {
            return Err(load(format!("{ident}: no Go files in {}", dir.display())));
        }

        let vendor = dir.join("vendor");
        let modules = if vendor.is_dir() {
            debug!(unit = ident, vendor = %vendor.display(), "using vendored modules");
            let mut registry = (*self.modules).clone();
            registry.prepend(DirModules::new(vendor));
            Arc::new(registry)
        } else {
            Arc::clone(&self.modules)
        };
        let mut session = Session::new(modules);
        let mut files = Vec::with_capacity(paths.len());
        for path in &paths {
            let display = match path.file_name() {
                Some(name) => Path::new(ident).join(name),
                None => path.clone(),
            };
            let text = fs::read_to_string(path)
                .map_err(|e| load(format!("{}: {e}", display.display())))?;
            let parsed = session
                .parse_file(display, text)
                .map_err(|d| load(d.render(&session.sources)))?;
            files.push(parsed);
        }
        debug!(unit = ident, files = files.len(), "unit parsed");

        let name = check::package_name(&files).map_err(|d| load(d.render(&session.sources)))?;
        let package = session
            .check_package(&name, &files)
            .map_err(|d| UnitError::TypeCheck {
                unit: ident.to_string(),
                message: d.render(&session.sources),
            })?;
        debug!(
            unit = ident,
            package = %name,
            bindings = session.bindings.len(),
            objects = session.symbols.object_count(),
            "unit type-checked"
        );

        Ok(CheckedUnit {
            ident: ident.to_string(),
            session,
            files,
            package,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    fn temp_base() -> PathBuf {
        let n = COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!(
            "ctxlint_provider_test_{}_{}",
            std::process::id(),
            n
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    fn write_unit(base: &Path, unit: &str, files: &[(&str, &str)]) {
        let dir = base.join(unit);
        fs::create_dir_all(&dir).expect("mkdir");
        for (name, text) in files {
            fs::write(dir.join(name), text).expect("write");
        }
    }

    #[test]
    fn loads_files_in_name_order_with_display_paths() {
        let base = temp_base();
        write_unit(
            &base,
            "svc",
            &[
                ("b.go", "package svc\n\nfunc b() {}\n"),
                ("a.go", "package svc\n\nfunc a() {\n\tb()\n}\n"),
            ],
        );
        let unit = FsProvider::default()
            .load_unit("svc", &base)
            .expect("unit loads");
        let paths: Vec<PathBuf> = unit
            .files
            .iter()
            .map(|f| unit.session.sources.path(f.id).to_path_buf())
            .collect();
        assert_eq!(paths, vec![PathBuf::from("svc/a.go"), PathBuf::from("svc/b.go")]);
        assert_eq!(unit.fingerprint().len(), 64);
        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn missing_directory_is_load_error() {
        let base = temp_base();
        let err = FsProvider::default()
            .load_unit("nowhere", &base)
            .expect_err("missing");
        assert!(matches!(err, UnitError::Load { .. }), "{err:?}");
        assert!(err.to_string().starts_with("nowhere: cannot read unit directory"));
        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn empty_directory_is_load_error() {
        let base = temp_base();
        write_unit(&base, "empty", &[("README", "x")]);
        let err = FsProvider::default()
            .load_unit("empty", &base)
            .expect_err("no files");
        assert!(err.to_string().starts_with("empty: no Go files"), "{err}");
        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn syntax_and_type_errors_are_distinguished() {
        let base = temp_base();
        write_unit(&base, "bad_syntax", &[("m.go", "package m\nfunc (\n")]);
        write_unit(&base, "bad_types", &[("m.go", "package m\n\nvar x int = \"s\"\n")]);
        let provider = FsProvider::default();
        let syntax = provider.load_unit("bad_syntax", &base).expect_err("syntax");
        assert!(matches!(syntax, UnitError::Load { .. }), "{syntax:?}");
        assert!(syntax.to_string().starts_with("bad_syntax/m.go:"), "{syntax}");
        let types = provider.load_unit("bad_types", &base).expect_err("types");
        assert!(matches!(types, UnitError::TypeCheck { .. }), "{types:?}");
        assert!(types.to_string().starts_with("bad_types/m.go:3:13:"), "{types}");
        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn vendored_modules_are_private_to_their_unit() {
        let base = temp_base();
        write_unit(
            &base,
            "with_vendor/vendor/example.com/ctx",
            &[("ctx.go", "package ctx\n\ntype Handle interface {\n\tDone() <-chan struct{}\n}\n")],
        );
        write_unit(&base, "with_vendor", &[("m.go", "package m\n\nimport \"example.com/ctx\"\n\nvar h ctx.Handle\n")]);
        write_unit(&base, "without", &[("m.go", "package m\n")]);

        let provider = FsProvider::default();
        let mut vendored = provider.load_unit("with_vendor", &base).expect("loads");
        assert!(vendored.resolve_type("example.com/ctx", "Handle").is_ok());
        let mut plain = provider.load_unit("without", &base).expect("loads");
        let err = plain.resolve_type("example.com/ctx", "Handle").expect_err("not vendored");
        assert!(matches!(err, UnitError::UnresolvedModule { .. }));
        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn resolves_sentinel_even_when_unit_does_not_import_it() {
        let base = temp_base();
        write_unit(&base, "plain", &[("m.go", "package main\n\nfunc main() {}\n")]);
        let mut unit = FsProvider::default()
            .load_unit("plain", &base)
            .expect("unit loads");
        let ctx = unit
            .resolve_type("golang.org/x/net/context", "Context")
            .expect("resolves");
        let std_ctx = unit.resolve_type("context", "Context").expect("resolves");
        assert_eq!(ctx, std_ctx);

        let missing = unit.resolve_type("golang.org/x/nope", "Context").expect_err("module");
        assert!(matches!(missing, UnitError::UnresolvedModule { .. }));
        let no_type = unit
            .resolve_type("context", "Background")
            .expect_err("not a type");
        assert!(matches!(no_type, UnitError::UnresolvedType { .. }));
        let _ = fs::remove_dir_all(&base);
    }
}
