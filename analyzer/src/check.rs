// check.rs — Type checking of Go packages into a shared session
//
// A `Session` owns everything a checked unit refers to: source text, the
// type table, scopes and objects, and the identifier binding table. The unit
// package and every module it imports (transitively) are checked into the
// same session, so a type reached through two import paths is one `TypeId`.
//
// Checking a package runs in passes: file scopes and imports, type names,
// aliases, underlying types, function and method signatures, package-level
// constants, package-level variables, and finally function bodies.
//
// Preconditions: files come from `Session::parse_file`.
// Postconditions: every identifier resolved during checking is recorded in
//                 `bindings` with role `Def` or `Use`.
// Failure modes: the first type error aborts the package with a `Diagnostic`.
// Side effects: imports read module files through the `ModuleRegistry`.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::ast::{self, Expr, ExprKind, Ident, Stmt, StmtKind, TypeExpr, TypeExprKind};
use crate::binding::{BindingTable, Builtin, ObjKind, Role, ScopeKind, Symbols};
use crate::diag::{codes, DiagCode, Diagnostic};
use crate::id::{FileId, ObjId, ScopeId, TypeId};
use crate::modules::{ModuleFile, ModuleRegistry};
use crate::parser;
use crate::source::{Pos, SourceMap};
use crate::types::{BasicKind, FuncSig, TypeKind, TypeTable};

// ── Session ─────────────────────────────────────────────────────────────────

/// A file registered in a session together with its syntax tree.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub id: FileId,
    pub ast: ast::File,
}

/// An imported module: its package scope and package-clause name.
#[derive(Debug, Clone)]
pub struct ModuleInfo {
    pub scope: ScopeId,
    pub name: String,
}

#[derive(Debug, Clone)]
enum ModuleState {
    Checking,
    Ready(ModuleInfo),
}

/// Why a module could not be imported.
#[derive(Debug, Clone)]
pub enum ModuleError {
    NotFound,
    Cycle,
    Io(String),
    Failed(Diagnostic),
}

/// Type-checking state for one unit and its imports.
#[derive(Debug)]
pub struct Session {
    pub sources: SourceMap,
    pub types: TypeTable,
    pub symbols: Symbols,
    pub bindings: BindingTable,
    pub universe: ScopeId,
    registry: Arc<ModuleRegistry>,
    modules: HashMap<String, ModuleState>,
    /// Field and interface-method objects of struct/interface types.
    member_objs: HashMap<(TypeId, String), ObjId>,
}

impl Session {
    pub fn new(registry: Arc<ModuleRegistry>) -> Self {
        let mut types = TypeTable::new();
        let mut symbols = Symbols::new();
        let mut member_objs = HashMap::new();
        let universe = symbols.new_scope(None, ScopeKind::Universe);

        let predeclared = [
            ("bool", BasicKind::Bool),
            ("int", BasicKind::Int),
            ("int32", BasicKind::Int32),
            ("int64", BasicKind::Int64),
            ("uint8", BasicKind::Uint8),
            ("float64", BasicKind::Float64),
            ("string", BasicKind::String),
            ("byte", BasicKind::Uint8),
            ("rune", BasicKind::Int32),
        ];
        for (name, kind) in predeclared {
            let _ = symbols.declare(universe, name, ObjKind::TypeName, types.basic(kind), None);
        }
        let error = types.error_type();
        let _ = symbols.declare(universe, "error", ObjKind::TypeName, error, None);
        let any = types.empty_interface();
        let _ = symbols.declare(universe, "any", ObjKind::TypeName, any, None);

        // error.Error
        let members = symbols.new_scope(Some(universe), ScopeKind::Members);
        let error_iface = types.underlying(error);
        let error_sig = types
            .interface_methods(error)
            .and_then(|m| m.first())
            .map(|(_, sig)| *sig)
            .unwrap_or_else(|| types.invalid());
        let method = symbols.new_obj(members, "Error", ObjKind::Field, error_sig, None);
        member_objs.insert((error_iface, "Error".to_string()), method);
        if let Some(n) = types.as_named(error) {
            types.named_mut(n).members.push(("Error".to_string(), method));
        }

        let untyped_bool = types.basic(BasicKind::UntypedBool);
        let _ = symbols.declare(universe, "true", ObjKind::Const, untyped_bool, None);
        let _ = symbols.declare(universe, "false", ObjKind::Const, untyped_bool, None);
        let untyped_int = types.basic(BasicKind::UntypedInt);
        let _ = symbols.declare(universe, "iota", ObjKind::Const, untyped_int, None);
        let nil = types.basic(BasicKind::UntypedNil);
        let _ = symbols.declare(universe, "nil", ObjKind::Nil, nil, None);
        for builtin in Builtin::ALL {
            let _ = symbols.declare(
                universe,
                builtin.name(),
                ObjKind::Builtin(builtin),
                types.invalid(),
                None,
            );
        }

        Session {
            sources: SourceMap::new(),
            types,
            symbols,
            bindings: BindingTable::new(),
            universe,
            registry,
            modules: HashMap::new(),
            member_objs,
        }
    }

    /// Register a file and parse it. The first syntax error is returned.
    pub fn parse_file(
        &mut self,
        path: impl Into<PathBuf>,
        text: impl Into<String>,
    ) -> Result<ParsedFile, Diagnostic> {
        let id = self.sources.add(path, text);
        let result = parser::parse(&self.sources.file(id).text);
        if let Some(err) = result.errors.first() {
            return Err(Diagnostic::new(id, *err.span(), err.to_string()).with_code(codes::E0001));
        }
        match result.file {
            Some(ast) => Ok(ParsedFile { id, ast }),
            None => Err(Diagnostic::new(id, (0..0).into(), "expected package clause")
                .with_code(codes::E0001)),
        }
    }

    /// Check the files of one package. Returns the package scope.
    pub fn check_package(
        &mut self,
        pkg_name: &str,
        files: &[ParsedFile],
    ) -> Result<ScopeId, Diagnostic> {
        let scope = self.symbols.new_scope(Some(self.universe), ScopeKind::Package);
        let mut checker = Checker::new(self, pkg_name);
        checker.package(scope, files)?;
        Ok(scope)
    }

    /// Import `module` into the session, checking it on first use.
    pub fn load_module(&mut self, module: &str) -> Result<ModuleInfo, ModuleError> {
        match self.modules.get(module) {
            Some(ModuleState::Ready(info)) => return Ok(info.clone()),
            Some(ModuleState::Checking) => return Err(ModuleError::Cycle),
            None => {}
        }
        let files = self
            .registry
            .find(module)
            .map_err(|e| ModuleError::Io(e.to_string()))?
            .ok_or(ModuleError::NotFound)?;

        self.modules
            .insert(module.to_string(), ModuleState::Checking);
        match self.check_module_files(files) {
            Ok(info) => {
                debug!(module, package = %info.name, "module checked");
                self.modules
                    .insert(module.to_string(), ModuleState::Ready(info.clone()));
                Ok(info)
            }
            Err(diag) => {
                self.modules.remove(module);
                Err(ModuleError::Failed(diag))
            }
        }
    }

    fn check_module_files(&mut self, files: Vec<ModuleFile>) -> Result<ModuleInfo, Diagnostic> {
        let mut parsed = Vec::with_capacity(files.len());
        for file in files {
            parsed.push(self.parse_file(file.path, file.text)?);
        }
        let name = package_name(&parsed)?;
        let scope = self.check_package(&name, &parsed)?;
        Ok(ModuleInfo { scope, name })
    }
}

/// The package-clause name shared by all files.
pub fn package_name(files: &[ParsedFile]) -> Result<String, Diagnostic> {
    let Some(first) = files.first() else {
        return Ok(String::new());
    };
    let name = &first.ast.package.name;
    for file in &files[1..] {
        let other = &file.ast.package;
        if &other.name != name {
            return Err(Diagnostic::new(
                file.id,
                other.span,
                format!("package {}; expected package {}", other.name, name),
            )
            .with_code(codes::E0002)
            .with_related(first.id, first.ast.package.span, "first package clause"));
        }
    }
    Ok(name.clone())
}

fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

fn unparen(e: &Expr) -> &Expr {
    match &e.kind {
        ExprKind::Paren(inner) => unparen(inner),
        _ => e,
    }
}

fn is_recv(e: &Expr) -> bool {
    matches!(unparen(e).kind, ExprKind::Unary(ast::UnaryOp::Recv, _))
}

/// Send, receive, or a receive assigned to at most two operands.
fn is_comm(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::Send { .. } => true,
        StmtKind::Expr(e) => is_recv(e),
        StmtKind::ShortVar { lhs, rhs } => lhs.len() <= 2 && matches!(rhs.as_slice(), [e] if is_recv(e)),
        StmtKind::Assign {
            lhs,
            op: ast::AssignOp::Assign,
            rhs,
        } => lhs.len() <= 2 && matches!(rhs.as_slice(), [e] if is_recv(e)),
        _ => false,
    }
}

// ── Operands ────────────────────────────────────────────────────────────────

/// What an expression denotes.
#[derive(Debug, Clone)]
enum Operand {
    /// Call of a function without results.
    NoValue,
    Value(TypeId),
    /// Call of a function with two or more results.
    Multi(Vec<TypeId>),
    Type(TypeId),
    Package(ScopeId, String),
    Builtin(Builtin),
}

#[derive(Debug, Clone, Copy)]
enum ValueContext {
    Assign,
    Return,
}

fn mismatch(ctx: ValueContext, want: usize, got: usize) -> String {
    match ctx {
        ValueContext::Assign => format!(
            "assignment mismatch: {want} variable{} but {got} value{}",
            if want == 1 { "" } else { "s" },
            if got == 1 { "" } else { "s" }
        ),
        ValueContext::Return if got < want => {
            format!("not enough return values (want {want}, got {got})")
        }
        ValueContext::Return => format!("too many return values (want {want}, got {got})"),
    }
}

// ── Checker ─────────────────────────────────────────────────────────────────

struct FuncEntry<'f> {
    file: FileId,
    file_scope: ScopeId,
    decl: &'f ast::FuncDecl,
    sig: TypeId,
    recv: Option<TypeId>,
}

struct Checker<'a> {
    s: &'a mut Session,
    /// Package name of the package being checked, used to print its types.
    pkg: String,
    file: FileId,
    results: Vec<TypeId>,
    named_results: bool,
    loop_depth: u32,
    /// Enclosing loops, switches and selects.
    break_depth: u32,
}

impl<'a> Checker<'a> {
    fn new(s: &'a mut Session, pkg: &str) -> Self {
        Checker {
            s,
            pkg: pkg.to_string(),
            file: FileId(0),
            results: Vec::new(),
            named_results: false,
            loop_depth: 0,
            break_depth: 0,
        }
    }

    fn error(&self, span: ast::Span, code: DiagCode, message: impl Into<String>) -> Diagnostic {
        Diagnostic::new(self.file, span, message).with_code(code)
    }

    fn record(&mut self, ident: &Ident, obj: ObjId, role: Role) {
        self.s
            .bindings
            .record(Pos::of_span(self.file, ident.span), obj, role);
    }

    fn type_str(&self, t: TypeId) -> String {
        self.s.types.display(t)
    }

    fn intern(&mut self, kind: TypeKind) -> TypeId {
        self.s.types.intern(kind)
    }

    // ── Package passes ──

    fn package(&mut self, pkg_scope: ScopeId, files: &[ParsedFile]) -> Result<(), Diagnostic> {
        // Pass 1: file scopes and imports
        let mut file_scopes = Vec::with_capacity(files.len());
        for file in files {
            self.file = file.id;
            let scope = self.s.symbols.new_scope(Some(pkg_scope), ScopeKind::File);
            for import in &file.ast.imports {
                self.import(scope, import)?;
            }
            file_scopes.push(scope);
        }

        // Pass 2: type names
        let mut aliases = Vec::new();
        let mut named = Vec::new();
        for (file, &file_scope) in files.iter().zip(&file_scopes) {
            self.file = file.id;
            for decl in &file.ast.decls {
                let ast::Decl::Type(spec) = decl else {
                    continue;
                };
                let ty = if spec.alias {
                    self.s.types.invalid()
                } else {
                    self.s.types.new_named(&spec.name.name, &self.pkg)
                };
                let obj = self.declare(pkg_scope, &spec.name, ObjKind::TypeName, ty)?;
                if spec.alias {
                    aliases.push((file.id, file_scope, spec, obj));
                } else {
                    named.push((file.id, file_scope, spec, ty));
                }
            }
        }

        // Pass 3: alias targets, in declaration order
        for &(file, file_scope, spec, obj) in &aliases {
            self.file = file;
            let target = self.resolve_type(file_scope, &spec.ty)?;
            self.s.symbols.obj_mut(obj).ty = target;
        }

        // Pass 4: underlying types
        let mut declared = Vec::with_capacity(named.len());
        for &(file, file_scope, spec, ty) in &named {
            self.file = file;
            let underlying = match &spec.ty.kind {
                TypeExprKind::Struct(fields) => {
                    let (t, members) = self.struct_type(file_scope, fields)?;
                    self.set_members(ty, members);
                    t
                }
                TypeExprKind::Interface(methods) => {
                    let (t, members) = self.interface_type(file_scope, methods)?;
                    self.set_members(ty, members);
                    t
                }
                _ => self.resolve_type(file_scope, &spec.ty)?,
            };
            declared.push((ty, underlying));
        }
        // Chains such as `type A B; type B struct{}` settle after at most
        // one round per declaration.
        for _ in 0..declared.len().max(1) {
            for &(ty, underlying) in &declared {
                self.s.types.set_underlying(ty, underlying);
            }
        }

        // Pass 5: function and method signatures
        let mut funcs = Vec::new();
        for (file, &file_scope) in files.iter().zip(&file_scopes) {
            self.file = file.id;
            for decl in &file.ast.decls {
                let ast::Decl::Func(func) = decl else {
                    continue;
                };
                let sig = self.resolve_sig(file_scope, &func.sig)?;
                let recv = match &func.recv {
                    Some(recv) => Some(self.method(pkg_scope, file_scope, func, recv, sig)?),
                    None => {
                        self.declare(pkg_scope, &func.name, ObjKind::Func, sig)?;
                        None
                    }
                };
                funcs.push(FuncEntry {
                    file: file.id,
                    file_scope,
                    decl: func,
                    sig,
                    recv,
                });
            }
        }

        // Pass 6: package-level constants, in source order
        for (file, &file_scope) in files.iter().zip(&file_scopes) {
            self.file = file.id;
            for decl in &file.ast.decls {
                if let ast::Decl::Const(spec) = decl {
                    self.const_spec(file_scope, pkg_scope, spec)?;
                }
            }
        }

        // Pass 7: package-level variables, in source order
        for (file, &file_scope) in files.iter().zip(&file_scopes) {
            self.file = file.id;
            for decl in &file.ast.decls {
                if let ast::Decl::Var(spec) = decl {
                    self.var_spec(file_scope, pkg_scope, spec)?;
                }
            }
        }

        // Pass 8: bodies
        for entry in &funcs {
            if let Some(body) = &entry.decl.body {
                self.file = entry.file;
                let scope = self
                    .s
                    .symbols
                    .new_scope(Some(entry.file_scope), ScopeKind::Func);
                if let (Some(recv), Some(recv_ty)) = (&entry.decl.recv, entry.recv) {
                    for name in &recv.names {
                        self.declare_var(scope, name, recv_ty)?;
                    }
                }
                self.func_body(scope, &entry.decl.sig, entry.sig, body)?;
            }
        }
        Ok(())
    }

    fn import(&mut self, file_scope: ScopeId, import: &ast::ImportSpec) -> Result<(), Diagnostic> {
        let path = &import.path;
        let info = match self.s.load_module(path) {
            Ok(info) => info,
            Err(ModuleError::NotFound) => {
                return Err(self
                    .error(
                        import.path_span,
                        codes::E0300,
                        format!("could not import {path} (module not found)"),
                    )
                    .with_hint("add a stub directory that provides it with --stub-dir"))
            }
            Err(ModuleError::Cycle) => {
                return Err(self.error(
                    import.path_span,
                    codes::E0301,
                    format!("import cycle not allowed: {path}"),
                ))
            }
            Err(ModuleError::Io(message)) => {
                return Err(self.error(
                    import.path_span,
                    codes::E0300,
                    format!("could not import {path}: {message}"),
                ))
            }
            Err(ModuleError::Failed(diag)) => return Err(diag),
        };

        let name = import
            .name
            .as_ref()
            .map_or(info.name.clone(), |id| id.name.clone());
        if name == "_" {
            return Ok(());
        }
        let pos = import
            .name
            .as_ref()
            .map(|id| Pos::of_span(self.file, id.span));
        let invalid = self.s.types.invalid();
        let obj = self
            .s
            .symbols
            .new_obj(file_scope, &name, ObjKind::PkgName(info.scope), invalid, pos);
        if self.s.symbols.insert(obj).is_err() {
            return Err(self.error(
                import.path_span,
                codes::E0101,
                format!("{name} redeclared in this block"),
            ));
        }
        if let Some(id) = &import.name {
            self.record(id, obj, Role::Def);
        }
        Ok(())
    }

    fn set_members(&mut self, named: TypeId, members: Vec<(String, ObjId)>) {
        if let Some(n) = self.s.types.as_named(named) {
            self.s.types.named_mut(n).members = members;
        }
    }

    /// Attach a method to its receiver's named type. Returns the receiver type.
    fn method(
        &mut self,
        pkg_scope: ScopeId,
        file_scope: ScopeId,
        func: &ast::FuncDecl,
        recv: &ast::Field,
        sig: TypeId,
    ) -> Result<TypeId, Diagnostic> {
        let recv_ty = self.resolve_type(file_scope, &recv.ty)?;
        let (base, pointer_recv) = match self.s.types.kind(recv_ty) {
            TypeKind::Pointer(base) => (*base, true),
            _ => (recv_ty, false),
        };
        let named = self.s.types.as_named(base).filter(|_| {
            !matches!(
                self.s.types.kind(self.s.types.underlying(base)),
                TypeKind::Pointer(_) | TypeKind::Interface(_)
            )
        });
        let Some(named) = named else {
            return Err(self.error(
                recv.ty.span,
                codes::E0302,
                format!("invalid receiver type {}", self.type_str(recv_ty)),
            ));
        };
        let info = self.s.types.named(named);
        let name = &func.name.name;
        let declared_here = self
            .s
            .symbols
            .lookup_local(pkg_scope, &info.name)
            .is_some_and(|obj| self.s.symbols.obj(obj).ty == base);
        if !declared_here {
            return Err(self.error(
                recv.ty.span,
                codes::E0302,
                format!(
                    "cannot define new methods on non-local type {}",
                    self.type_str(base)
                ),
            ));
        }
        let duplicate = info.methods.iter().any(|m| &m.name == name)
            || info.members.iter().any(|(n, _)| n == name);
        if duplicate && name != "_" {
            return Err(self.error(
                func.name.span,
                codes::E0101,
                format!("field and method with the same name {name}"),
            ));
        }
        let pos = Some(Pos::of_span(self.file, func.name.span));
        let obj = self
            .s
            .symbols
            .new_obj(pkg_scope, name, ObjKind::Func, sig, pos);
        self.record(&func.name, obj, Role::Def);
        self.s.types.named_mut(named).methods.push(crate::types::Method {
            name: name.clone(),
            obj,
            sig,
            pointer_recv,
        });
        Ok(recv_ty)
    }

    // ── Declarations ──

    /// Declare `ident` in `scope` and record its definition.
    fn declare(
        &mut self,
        scope: ScopeId,
        ident: &Ident,
        kind: ObjKind,
        ty: TypeId,
    ) -> Result<ObjId, Diagnostic> {
        let pos = Some(Pos::of_span(self.file, ident.span));
        let obj = self.s.symbols.new_obj(scope, &ident.name, kind, ty, pos);
        if let Err(existing) = self.s.symbols.insert(obj) {
            let mut diag = self.error(
                ident.span,
                codes::E0101,
                format!("{} redeclared in this block", ident.name),
            );
            if let Some(prev) = self.s.symbols.obj(existing).pos {
                let span = (prev.offset as usize..prev.offset as usize + ident.name.len()).into();
                diag = diag.with_related(prev.file, span, format!("other declaration of {}", ident.name));
            }
            return Err(diag);
        }
        self.record(ident, obj, Role::Def);
        Ok(obj)
    }

    fn declare_var(&mut self, scope: ScopeId, ident: &Ident, ty: TypeId) -> Result<ObjId, Diagnostic> {
        self.declare(scope, ident, ObjKind::Var, ty)
    }

    /// `var names [T] [= values]`: values are evaluated in `eval_scope`, names
    /// declared in `decl_scope` afterwards.
    fn var_spec(
        &mut self,
        eval_scope: ScopeId,
        decl_scope: ScopeId,
        spec: &ast::VarSpec,
    ) -> Result<(), Diagnostic> {
        let declared = match &spec.ty {
            Some(ty) => Some(self.resolve_type(eval_scope, ty)?),
            None => None,
        };
        let values = if spec.values.is_empty() {
            Vec::new()
        } else {
            self.value_list(
                eval_scope,
                &spec.values,
                spec.names.len(),
                spec.span,
                ValueContext::Assign,
            )?
        };

        for (i, name) in spec.names.iter().enumerate() {
            let ty = match (declared, values.get(i)) {
                (Some(t), Some(&v)) => {
                    self.expect_assignable(v, t, spec.values[i.min(spec.values.len() - 1)].span, "variable declaration")?;
                    t
                }
                (Some(t), None) => t,
                (None, Some(&v)) => self.s.types.default_type(v).ok_or_else(|| {
                    self.error(
                        spec.span,
                        codes::E0202,
                        "use of untyped nil in variable declaration",
                    )
                })?,
                (None, None) => self.s.types.invalid(),
            };
            self.declare_var(decl_scope, name, ty)?;
        }
        Ok(())
    }

    /// `const names [T] = values`, one value per name. Constants keep an
    /// untyped value type unless a type is given.
    fn const_spec(
        &mut self,
        eval_scope: ScopeId,
        decl_scope: ScopeId,
        spec: &ast::VarSpec,
    ) -> Result<(), Diagnostic> {
        let declared = match &spec.ty {
            Some(ty) => Some(self.resolve_type(eval_scope, ty)?),
            None => None,
        };
        if spec.values.len() != spec.names.len() {
            let message = if spec.values.len() < spec.names.len() {
                "missing init expr for const declaration"
            } else {
                "extra init expr"
            };
            return Err(self.error(spec.span, codes::E0201, message));
        }
        for (name, value) in spec.names.iter().zip(&spec.values) {
            let v = self.value(eval_scope, value)?;
            let constant = matches!(
                self.s.types.basic_kind(v),
                Some(k) if k != BasicKind::UntypedNil && k != BasicKind::Invalid
            );
            if !constant {
                return Err(self.error(
                    value.span,
                    codes::E0202,
                    format!("value of type {} is not constant", self.type_str(v)),
                ));
            }
            let ty = match declared {
                Some(t) => {
                    self.expect_assignable(v, t, value.span, "constant declaration")?;
                    t
                }
                None => v,
            };
            self.declare(decl_scope, name, ObjKind::Const, ty)?;
        }
        Ok(())
    }

    fn func_body(
        &mut self,
        scope: ScopeId,
        sig_ast: &ast::Signature,
        sig: TypeId,
        body: &ast::Block,
    ) -> Result<(), Diagnostic> {
        let sig = self
            .s
            .types
            .func_sig(sig)
            .cloned()
            .unwrap_or_else(|| FuncSig {
                params: Vec::new(),
                results: Vec::new(),
                variadic: false,
            });
        self.declare_fields(scope, &sig_ast.params, &sig.params)?;
        self.declare_fields(scope, &sig_ast.results, &sig.results)?;

        let saved_results = std::mem::replace(&mut self.results, sig.results.clone());
        let saved_named = std::mem::replace(
            &mut self.named_results,
            sig_ast.results.iter().any(|f| !f.names.is_empty()),
        );
        let saved_depth = std::mem::replace(&mut self.loop_depth, 0);
        let saved_breaks = std::mem::replace(&mut self.break_depth, 0);

        let outcome = self.stmts(scope, &body.stmts);

        self.results = saved_results;
        self.named_results = saved_named;
        self.loop_depth = saved_depth;
        self.break_depth = saved_breaks;
        outcome
    }

    /// Declare named parameters or results; `types` is the flattened list.
    fn declare_fields(
        &mut self,
        scope: ScopeId,
        fields: &[ast::Field],
        types: &[TypeId],
    ) -> Result<(), Diagnostic> {
        let mut next = types.iter().copied();
        for field in fields {
            if field.names.is_empty() {
                next.next();
                continue;
            }
            for name in &field.names {
                let ty = next.next().unwrap_or_else(|| self.s.types.invalid());
                self.declare_var(scope, name, ty)?;
            }
        }
        Ok(())
    }

    // ── Type expressions ──

    fn resolve_type(&mut self, scope: ScopeId, te: &TypeExpr) -> Result<TypeId, Diagnostic> {
        match &te.kind {
            TypeExprKind::Name(id) => {
                let obj = self.lookup(scope, id)?;
                self.type_name(obj, id)
            }
            TypeExprKind::Qualified(pkg, sel) => {
                let obj = self.qualified(scope, pkg, sel)?;
                self.type_name(obj, sel)
            }
            TypeExprKind::Pointer(base) => {
                let base = self.resolve_type(scope, base)?;
                Ok(self.intern(TypeKind::Pointer(base)))
            }
            TypeExprKind::Slice(elem) => {
                let elem = self.resolve_type(scope, elem)?;
                Ok(self.intern(TypeKind::Slice(elem)))
            }
            TypeExprKind::Map { key, value } => {
                let key = self.resolve_type(scope, key)?;
                let value = self.resolve_type(scope, value)?;
                Ok(self.intern(TypeKind::Map { key, value }))
            }
            TypeExprKind::Chan { recv_only, elem } => {
                let elem = self.resolve_type(scope, elem)?;
                Ok(self.intern(TypeKind::Chan {
                    recv_only: *recv_only,
                    elem,
                }))
            }
            TypeExprKind::Func(sig) => self.resolve_sig(scope, sig),
            TypeExprKind::Struct(fields) => Ok(self.struct_type(scope, fields)?.0),
            TypeExprKind::Interface(methods) => Ok(self.interface_type(scope, methods)?.0),
            TypeExprKind::Ellipsis(_) => Err(self.error(te.span, codes::E0202, "invalid use of ...")),
        }
    }

    fn type_name(&self, obj: ObjId, id: &Ident) -> Result<TypeId, Diagnostic> {
        let object = self.s.symbols.obj(obj);
        if object.kind != ObjKind::TypeName {
            return Err(self.error(id.span, codes::E0104, format!("{} is not a type", id.name)));
        }
        Ok(object.ty)
    }

    fn resolve_sig(&mut self, scope: ScopeId, sig: &ast::Signature) -> Result<TypeId, Diagnostic> {
        let mut params = Vec::new();
        let variadic = sig.is_variadic();
        for field in &sig.params {
            let ty = match &field.ty.kind {
                TypeExprKind::Ellipsis(elem) => {
                    let elem = self.resolve_type(scope, elem)?;
                    self.intern(TypeKind::Slice(elem))
                }
                _ => self.resolve_type(scope, &field.ty)?,
            };
            params.extend(std::iter::repeat(ty).take(field.names.len().max(1)));
        }
        let mut results = Vec::new();
        for field in &sig.results {
            let ty = self.resolve_type(scope, &field.ty)?;
            results.extend(std::iter::repeat(ty).take(field.names.len().max(1)));
        }
        Ok(self.intern(TypeKind::Func(FuncSig {
            params,
            results,
            variadic,
        })))
    }

    fn struct_type(
        &mut self,
        scope: ScopeId,
        fields: &[ast::Field],
    ) -> Result<(TypeId, Vec<(String, ObjId)>), Diagnostic> {
        let members = self.s.symbols.new_scope(Some(scope), ScopeKind::Members);
        let mut layout = Vec::new();
        let mut objs = Vec::new();
        for field in fields {
            let ty = self.resolve_type(scope, &field.ty)?;
            for name in &field.names {
                let obj = self.declare(members, name, ObjKind::Field, ty)?;
                layout.push((name.name.clone(), ty));
                objs.push((name.name.clone(), obj));
            }
        }
        let t = self.intern(TypeKind::Struct(layout));
        self.register_members(t, &objs);
        Ok((t, objs))
    }

    fn interface_type(
        &mut self,
        scope: ScopeId,
        methods: &[ast::MethodSpec],
    ) -> Result<(TypeId, Vec<(String, ObjId)>), Diagnostic> {
        let members = self.s.symbols.new_scope(Some(scope), ScopeKind::Members);
        let mut set = Vec::new();
        let mut objs = Vec::new();
        for method in methods {
            let sig = self.resolve_sig(scope, &method.sig)?;
            let obj = self.declare(members, &method.name, ObjKind::Field, sig)?;
            set.push((method.name.name.clone(), sig));
            objs.push((method.name.name.clone(), obj));
        }
        set.sort_by(|a, b| a.0.cmp(&b.0));
        let t = self.intern(TypeKind::Interface(set));
        self.register_members(t, &objs);
        Ok((t, objs))
    }

    fn register_members(&mut self, t: TypeId, objs: &[(String, ObjId)]) {
        for (name, obj) in objs {
            self.s
                .member_objs
                .entry((t, name.clone()))
                .or_insert(*obj);
        }
    }

    // ── Name lookup ──

    fn lookup(&mut self, scope: ScopeId, id: &Ident) -> Result<ObjId, Diagnostic> {
        let Some(obj) = self.s.symbols.lookup(scope, &id.name) else {
            return Err(self.error(id.span, codes::E0100, format!("undefined: {}", id.name)));
        };
        self.record(id, obj, Role::Use);
        Ok(obj)
    }

    /// `pkg.Name` where `pkg` is an imported package.
    fn qualified(&mut self, scope: ScopeId, pkg: &Ident, sel: &Ident) -> Result<ObjId, Diagnostic> {
        let obj = self.lookup(scope, pkg)?;
        let ObjKind::PkgName(pkg_scope) = self.s.symbols.obj(obj).kind else {
            return Err(self.error(pkg.span, codes::E0104, format!("{} is not a package", pkg.name)));
        };
        self.package_member(pkg_scope, &pkg.name, sel)
    }

    fn package_member(&mut self, pkg_scope: ScopeId, pkg: &str, sel: &Ident) -> Result<ObjId, Diagnostic> {
        if !is_exported(&sel.name) {
            return Err(self.error(
                sel.span,
                codes::E0103,
                format!("name {} not exported by package {pkg}", sel.name),
            ));
        }
        let Some(obj) = self.s.symbols.lookup_local(pkg_scope, &sel.name) else {
            return Err(self.error(sel.span, codes::E0100, format!("undefined: {pkg}.{}", sel.name)));
        };
        self.record(sel, obj, Role::Use);
        Ok(obj)
    }

    fn obj_operand(&self, obj: ObjId) -> Operand {
        let object = self.s.symbols.obj(obj);
        match object.kind {
            ObjKind::TypeName => Operand::Type(object.ty),
            ObjKind::PkgName(scope) => Operand::Package(scope, object.name.clone()),
            ObjKind::Builtin(b) => Operand::Builtin(b),
            ObjKind::Var | ObjKind::Field | ObjKind::Func | ObjKind::Const | ObjKind::Nil => {
                Operand::Value(object.ty)
            }
        }
    }

    /// Field or method `name` of a value of type `t`.
    fn lookup_member(&self, t: TypeId, name: &str) -> Option<(ObjId, TypeId)> {
        let types = &self.s.types;
        let (base, via_pointer) = match types.kind(t) {
            TypeKind::Pointer(base) => (*base, true),
            _ => (t, false),
        };
        if let Some(n) = types.as_named(base) {
            if let Some(m) = types.named(n).methods.iter().find(|m| m.name == name) {
                return Some((m.obj, m.sig));
            }
        }
        let underlying = types.underlying(base);
        let ty = match types.kind(underlying) {
            TypeKind::Struct(fields) => fields.iter().find(|(n, _)| n == name)?.1,
            TypeKind::Interface(methods) if !via_pointer => {
                methods.iter().find(|(n, _)| n == name)?.1
            }
            _ => return None,
        };
        let own = types
            .as_named(base)
            .and_then(|n| types.named(n).members.iter().find(|(n, _)| n == name))
            .map(|(_, obj)| *obj);
        let obj = own.or_else(|| {
            self.s
                .member_objs
                .get(&(underlying, name.to_string()))
                .copied()
        })?;
        Some((obj, ty))
    }

    // ── Statements ──

    fn stmts(&mut self, scope: ScopeId, stmts: &[Stmt]) -> Result<(), Diagnostic> {
        for stmt in stmts {
            self.stmt(scope, stmt)?;
        }
        Ok(())
    }

    fn new_block(&mut self, parent: ScopeId) -> ScopeId {
        self.s.symbols.new_scope(Some(parent), ScopeKind::Block)
    }

    fn stmt(&mut self, scope: ScopeId, stmt: &Stmt) -> Result<(), Diagnostic> {
        match &stmt.kind {
            StmtKind::Var(specs) => {
                for spec in specs {
                    self.var_spec(scope, scope, spec)?;
                }
                Ok(())
            }
            StmtKind::Const(specs) => {
                for spec in specs {
                    self.const_spec(scope, scope, spec)?;
                }
                Ok(())
            }
            StmtKind::ShortVar { lhs, rhs } => self.short_var(scope, lhs, rhs, stmt.span),
            StmtKind::Assign { lhs, op, rhs } => self.assign(scope, lhs, *op, rhs, stmt.span),
            StmtKind::IncDec { expr, inc } => {
                let t = self.assign_target(scope, expr)?;
                if !self.s.types.is_numeric(t) {
                    let op = if *inc { "++" } else { "--" };
                    return Err(self.error(
                        stmt.span,
                        codes::E0202,
                        format!("invalid operation: {op} on non-numeric type {}", self.type_str(t)),
                    ));
                }
                Ok(())
            }
            StmtKind::Expr(e) => match &unparen(e).kind {
                ExprKind::Call { .. } | ExprKind::Unary(ast::UnaryOp::Recv, _) => {
                    self.expr(scope, e)?;
                    Ok(())
                }
                _ => Err(self.error(e.span, codes::E0205, "expression is not used")),
            },
            StmtKind::Go(e) | StmtKind::Defer(e) => {
                if !matches!(unparen(e).kind, ExprKind::Call { .. }) {
                    let what = if matches!(stmt.kind, StmtKind::Go(_)) { "go" } else { "defer" };
                    return Err(self.error(
                        e.span,
                        codes::E0205,
                        format!("expression in {what} must be function call"),
                    ));
                }
                self.expr(scope, e)?;
                Ok(())
            }
            StmtKind::Send { chan, value } => self.send(scope, chan, value, stmt.span),
            StmtKind::Return(values) => self.return_stmt(scope, values, stmt.span),
            StmtKind::Block(block) => {
                let inner = self.new_block(scope);
                self.stmts(inner, &block.stmts)
            }
            StmtKind::If(ifs) => self.if_stmt(scope, ifs),
            StmtKind::For(f) => self.for_stmt(scope, f),
            StmtKind::Range(r) => self.range_stmt(scope, r),
            StmtKind::Switch(sw) => self.switch_stmt(scope, sw),
            StmtKind::Select(clauses) => self.select_stmt(scope, clauses),
            StmtKind::Break if self.break_depth == 0 => Err(self.error(
                stmt.span,
                codes::E0205,
                "break is not in a loop, switch, or select",
            )),
            StmtKind::Continue if self.loop_depth == 0 => {
                Err(self.error(stmt.span, codes::E0205, "continue is not in a loop"))
            }
            StmtKind::Break | StmtKind::Continue => Ok(()),
            // Accepted trailing fallthroughs are stripped by `clause_body`.
            StmtKind::Fallthrough => Err(self.error(
                stmt.span,
                codes::E0205,
                "fallthrough statement out of place",
            )),
        }
    }

    fn short_var(
        &mut self,
        scope: ScopeId,
        lhs: &[Ident],
        rhs: &[Expr],
        span: ast::Span,
    ) -> Result<(), Diagnostic> {
        let values = self.value_list(scope, rhs, lhs.len(), span, ValueContext::Assign)?;

        let mut seen = HashSet::new();
        for id in lhs {
            if !id.is_blank() && !seen.insert(id.name.as_str()) {
                return Err(self.error(
                    id.span,
                    codes::E0101,
                    format!("{} repeated on left side of :=", id.name),
                ));
            }
        }

        let mut fresh = Vec::new();
        for (id, &value) in lhs.iter().zip(&values) {
            if id.is_blank() {
                if self.s.types.default_type(value).is_none() {
                    return Err(self.error(id.span, codes::E0202, "use of untyped nil in assignment"));
                }
                continue;
            }
            match self.s.symbols.lookup_local(scope, &id.name) {
                Some(existing) => {
                    self.record(id, existing, Role::Use);
                    let object = self.s.symbols.obj(existing);
                    if object.kind != ObjKind::Var {
                        return Err(self.error(id.span, codes::E0200, format!("cannot assign to {}", id.name)));
                    }
                    let target = object.ty;
                    self.expect_assignable(value, target, id.span, "assignment")?;
                }
                None => {
                    let ty = self.s.types.default_type(value).ok_or_else(|| {
                        self.error(id.span, codes::E0202, "use of untyped nil in assignment")
                    })?;
                    fresh.push((id, ty));
                }
            }
        }
        if fresh.is_empty() {
            return Err(self.error(span, codes::E0102, "no new variables on left side of :="));
        }
        for (id, ty) in fresh {
            self.declare_var(scope, id, ty)?;
        }
        Ok(())
    }

    fn assign(
        &mut self,
        scope: ScopeId,
        lhs: &[Expr],
        op: ast::AssignOp,
        rhs: &[Expr],
        span: ast::Span,
    ) -> Result<(), Diagnostic> {
        if op != ast::AssignOp::Assign {
            let (Some(target), Some(value)) = (lhs.first(), rhs.first()) else {
                return Err(self.error(span, codes::E0201, mismatch(ValueContext::Assign, 1, 0)));
            };
            let t = self.assign_target(scope, target)?;
            let v = self.value(scope, value)?;
            let bin = match op {
                ast::AssignOp::Add => ast::BinaryOp::Add,
                ast::AssignOp::Sub => ast::BinaryOp::Sub,
                ast::AssignOp::Mul => ast::BinaryOp::Mul,
                _ => ast::BinaryOp::Div,
            };
            let result = self.arithmetic(bin, t, v, span)?;
            return self.expect_assignable(result, t, span, "assignment");
        }

        let values = self.value_list(scope, rhs, lhs.len(), span, ValueContext::Assign)?;
        for (target, &value) in lhs.iter().zip(&values) {
            if let ExprKind::Ident(id) = &unparen(target).kind {
                if id.is_blank() {
                    if self.s.types.default_type(value).is_none() {
                        return Err(self.error(id.span, codes::E0202, "use of untyped nil in assignment"));
                    }
                    continue;
                }
            }
            let t = self.assign_target(scope, target)?;
            self.expect_assignable(value, t, target.span, "assignment")?;
        }
        Ok(())
    }

    /// Type of an assignable location: a variable, a field, `*p` or `s[i]`.
    fn assign_target(&mut self, scope: ScopeId, target: &Expr) -> Result<TypeId, Diagnostic> {
        let inner = unparen(target);
        match &inner.kind {
            ExprKind::Ident(id) => {
                let obj = self.lookup(scope, id)?;
                let object = self.s.symbols.obj(obj);
                if object.kind != ObjKind::Var {
                    return Err(self.error(id.span, codes::E0200, format!("cannot assign to {}", id.name)));
                }
                Ok(object.ty)
            }
            ExprKind::Selector(_, sel) => {
                let t = self.value(scope, inner)?;
                let bound = self
                    .s
                    .bindings
                    .get(Pos::of_span(self.file, sel.span))
                    .map(|b| self.s.symbols.obj(b.obj).kind);
                match bound {
                    Some(ObjKind::Var) => Ok(t),
                    Some(ObjKind::Field) if self.s.types.func_sig(t).is_none() => Ok(t),
                    _ => Err(self.error(
                        inner.span,
                        codes::E0200,
                        format!("cannot assign to {}", sel.name),
                    )),
                }
            }
            ExprKind::Unary(ast::UnaryOp::Deref, _) => self.value(scope, inner),
            ExprKind::Index(base, index) => Ok(self.index(scope, base, index, inner.span)?.0),
            _ => Err(self.error(inner.span, codes::E0200, "cannot assign to expression")),
        }
    }

    fn return_stmt(&mut self, scope: ScopeId, values: &[Expr], span: ast::Span) -> Result<(), Diagnostic> {
        let want = self.results.clone();
        if values.is_empty() {
            if want.is_empty() || self.named_results {
                return Ok(());
            }
            return Err(self.error(span, codes::E0201, mismatch(ValueContext::Return, want.len(), 0)));
        }
        let got = self.value_list(scope, values, want.len(), span, ValueContext::Return)?;
        for (i, (&g, &w)) in got.iter().zip(&want).enumerate() {
            let at = values.get(i).map_or(span, |e| e.span);
            self.expect_assignable(g, w, at, "return statement")?;
        }
        Ok(())
    }

    fn if_stmt(&mut self, scope: ScopeId, ifs: &ast::IfStmt) -> Result<(), Diagnostic> {
        let header = self.new_block(scope);
        if let Some(init) = &ifs.init {
            self.stmt(header, init)?;
        }
        self.condition(header, &ifs.cond, "if")?;
        let then = self.new_block(header);
        self.stmts(then, &ifs.then.stmts)?;
        if let Some(els) = &ifs.els {
            match &els.kind {
                StmtKind::If(inner) => self.if_stmt(header, inner)?,
                StmtKind::Block(block) => {
                    let inner = self.new_block(header);
                    self.stmts(inner, &block.stmts)?;
                }
                _ => self.stmt(header, els)?,
            }
        }
        Ok(())
    }

    fn for_stmt(&mut self, scope: ScopeId, f: &ast::ForStmt) -> Result<(), Diagnostic> {
        let header = self.new_block(scope);
        if let Some(init) = &f.init {
            self.stmt(header, init)?;
        }
        if let Some(cond) = &f.cond {
            self.condition(header, cond, "for")?;
        }
        if let Some(post) = &f.post {
            if matches!(post.kind, StmtKind::ShortVar { .. }) {
                return Err(self.error(post.span, codes::E0205, "cannot declare in post statement of for loop"));
            }
            self.stmt(header, post)?;
        }
        let body = self.new_block(header);
        self.looping(body, &f.body.stmts)
    }

    fn looping(&mut self, body: ScopeId, stmts: &[Stmt]) -> Result<(), Diagnostic> {
        self.loop_depth += 1;
        self.break_depth += 1;
        let outcome = self.stmts(body, stmts);
        self.loop_depth -= 1;
        self.break_depth -= 1;
        outcome
    }

    fn range_stmt(&mut self, scope: ScopeId, r: &ast::RangeStmt) -> Result<(), Diagnostic> {
        let header = self.new_block(scope);
        let xt = self.value(header, &r.expr)?;
        let types = &self.s.types;
        let int = types.basic(BasicKind::Int);
        let (key, value) = match types.kind(types.underlying(xt)) {
            TypeKind::Slice(elem) => (int, Some(*elem)),
            TypeKind::Map { key, value } => (*key, Some(*value)),
            TypeKind::Chan { elem, .. } => (*elem, None),
            _ if types.is_string(xt) => (int, Some(types.basic(BasicKind::Int32))),
            _ if types.is_integer(xt) => (types.default_type(xt).unwrap_or(int), None),
            _ => {
                return Err(self.error(
                    r.expr.span,
                    codes::E0202,
                    format!("cannot range over value of type {}", self.type_str(xt)),
                ))
            }
        };
        if let (Some(extra), None) = (&r.value, value) {
            return Err(self.error(
                extra.span,
                codes::E0201,
                format!(
                    "range over value of type {} permits only one iteration variable",
                    self.type_str(xt)
                ),
            ));
        }

        let targets = [(r.key.as_ref(), Some(key)), (r.value.as_ref(), value)];
        let mut fresh = false;
        for (target, ty) in targets {
            let (Some(target), Some(ty)) = (target, ty) else {
                continue;
            };
            if let ExprKind::Ident(id) = &unparen(target).kind {
                if id.is_blank() {
                    continue;
                }
                if r.define {
                    self.declare_var(header, id, ty)?;
                    fresh = true;
                    continue;
                }
            }
            let t = self.assign_target(header, target)?;
            self.expect_assignable(ty, t, target.span, "range")?;
        }
        if r.define && !fresh {
            return Err(self.error(
                r.key.as_ref().map_or(r.expr.span, |k| k.span),
                codes::E0102,
                "no new variables on left side of :=",
            ));
        }

        let body = self.new_block(header);
        self.looping(body, &r.body.stmts)
    }

    fn send(&mut self, scope: ScopeId, chan: &Expr, value: &Expr, span: ast::Span) -> Result<(), Diagnostic> {
        let ct = self.value(scope, chan)?;
        let v = self.value(scope, value)?;
        match self.s.types.kind(self.s.types.underlying(ct)) {
            TypeKind::Chan {
                recv_only: false,
                elem,
            } => self.expect_assignable(v, *elem, value.span, "send"),
            TypeKind::Chan { .. } => Err(self.error(
                span,
                codes::E0202,
                format!(
                    "invalid operation: cannot send to receive-only channel of type {}",
                    self.type_str(ct)
                ),
            )),
            _ => Err(self.error(
                span,
                codes::E0202,
                format!("invalid operation: cannot send to non-channel of type {}", self.type_str(ct)),
            )),
        }
    }

    // ── Switch and select ──

    fn switch_stmt(&mut self, scope: ScopeId, sw: &ast::SwitchStmt) -> Result<(), Diagnostic> {
        let header = self.new_block(scope);
        if let Some(init) = &sw.init {
            self.stmt(header, init)?;
        }
        self.single_default(sw.clauses.iter().map(|c| (c.exprs.is_none(), c.span)), "switch")?;
        match &sw.kind {
            ast::SwitchKind::Expr(tag) => self.expr_switch(header, tag.as_ref(), &sw.clauses),
            ast::SwitchKind::Type { bind, subject } => {
                self.type_switch(header, bind.as_ref(), subject, &sw.clauses)
            }
        }
    }

    fn single_default(
        &self,
        clauses: impl Iterator<Item = (bool, ast::Span)>,
        what: &str,
    ) -> Result<(), Diagnostic> {
        let mut seen = false;
        for (is_default, span) in clauses {
            if is_default && std::mem::replace(&mut seen, true) {
                return Err(self.error(span, codes::E0205, format!("multiple defaults in {what}")));
            }
        }
        Ok(())
    }

    fn expr_switch(
        &mut self,
        header: ScopeId,
        tag: Option<&Expr>,
        clauses: &[ast::CaseClause],
    ) -> Result<(), Diagnostic> {
        let tag_ty = match tag {
            Some(tag) => {
                let t = self.value(header, tag)?;
                let typed = self.s.types.default_type(t).ok_or_else(|| {
                    self.error(tag.span, codes::E0202, "use of untyped nil in switch expression")
                })?;
                Some(typed)
            }
            None => None,
        };
        for (i, clause) in clauses.iter().enumerate() {
            for e in clause.exprs.iter().flatten() {
                let v = self.value(header, e)?;
                match tag_ty {
                    Some(t) => {
                        self.binary(ast::BinaryOp::Eq, t, v, e.span)?;
                    }
                    None if !self.s.types.is_boolean(v) => {
                        return Err(self.error(
                            e.span,
                            codes::E0202,
                            format!("invalid case: mismatched types {} and bool", self.type_str(v)),
                        ))
                    }
                    None => {}
                }
            }
            let scope = self.new_block(header);
            self.clause_body(scope, &clause.body, i + 1 < clauses.len())?;
        }
        Ok(())
    }

    fn type_switch(
        &mut self,
        header: ScopeId,
        bind: Option<&Ident>,
        subject: &Expr,
        clauses: &[ast::CaseClause],
    ) -> Result<(), Diagnostic> {
        let xt = self.value(header, subject)?;
        if self.s.types.interface_methods(xt).is_none() {
            return Err(self.error(
                subject.span,
                codes::E0202,
                format!("value of type {} is not an interface", self.type_str(xt)),
            ));
        }
        for clause in clauses {
            // `None` stands for a `nil` case.
            let mut cases = Vec::new();
            for e in clause.exprs.iter().flatten() {
                match self.expr(header, e)? {
                    Operand::Type(t) => {
                        self.expect_possible(xt, t, e.span, "type switch case")?;
                        cases.push(Some(t));
                    }
                    Operand::Value(t) if self.s.types.basic_kind(t) == Some(BasicKind::UntypedNil) => {
                        cases.push(None)
                    }
                    _ => return Err(self.error(e.span, codes::E0104, "case is not a type")),
                }
            }
            let scope = self.new_block(header);
            if let Some(bind) = bind.filter(|b| !b.is_blank()) {
                // One implicit variable per clause; the guard name itself
                // stays unbound.
                let ty = match cases.as_slice() {
                    [Some(t)] => *t,
                    _ => xt,
                };
                let pos = Some(Pos::of_span(self.file, bind.span));
                let obj = self.s.symbols.new_obj(scope, &bind.name, ObjKind::Var, ty, pos);
                if self.s.symbols.insert(obj).is_err() {
                    return Err(self.error(
                        bind.span,
                        codes::E0101,
                        format!("{} redeclared in this block", bind.name),
                    ));
                }
            }
            self.clause_body(scope, &clause.body, false)?;
        }
        Ok(())
    }

    /// Whether a value of interface type `iface` can hold dynamic type `t`.
    fn expect_possible(&self, iface: TypeId, t: TypeId, span: ast::Span, what: &str) -> Result<(), Diagnostic> {
        let types = &self.s.types;
        if types.interface_methods(t).is_some() || types.implements(t, iface) {
            return Ok(());
        }
        Err(self.error(
            span,
            codes::E0200,
            format!(
                "impossible {what}: {} does not implement {}",
                self.type_str(t),
                self.type_str(iface)
            ),
        ))
    }

    /// Statements of one switch or select clause. A trailing `fallthrough`
    /// is dropped when `fallthrough_ok`.
    fn clause_body(&mut self, scope: ScopeId, body: &[Stmt], fallthrough_ok: bool) -> Result<(), Diagnostic> {
        let body = match body.split_last() {
            Some((last, rest)) if fallthrough_ok && last.kind == StmtKind::Fallthrough => rest,
            _ => body,
        };
        self.break_depth += 1;
        let outcome = self.stmts(scope, body);
        self.break_depth -= 1;
        outcome
    }

    fn select_stmt(&mut self, scope: ScopeId, clauses: &[ast::CommClause]) -> Result<(), Diagnostic> {
        self.single_default(clauses.iter().map(|c| (c.comm.is_none(), c.span)), "select")?;
        for clause in clauses {
            let inner = self.new_block(scope);
            if let Some(comm) = &clause.comm {
                if !is_comm(comm) {
                    return Err(self.error(
                        comm.span,
                        codes::E0205,
                        "select case must be receive, send or assign recv",
                    ));
                }
                self.stmt(inner, comm)?;
            }
            self.clause_body(inner, &clause.body, false)?;
        }
        Ok(())
    }

    fn condition(&mut self, scope: ScopeId, cond: &Expr, what: &str) -> Result<(), Diagnostic> {
        let t = self.value(scope, cond)?;
        if !self.s.types.is_boolean(t) {
            return Err(self.error(
                cond.span,
                codes::E0202,
                format!("non-boolean condition in {what} statement"),
            ));
        }
        Ok(())
    }

    // ── Expressions ──

    /// Exactly `want` values from an expression list, spreading a single
    /// multi-value call.
    fn value_list(
        &mut self,
        scope: ScopeId,
        exprs: &[Expr],
        want: usize,
        span: ast::Span,
        ctx: ValueContext,
    ) -> Result<Vec<TypeId>, Diagnostic> {
        if let (ValueContext::Assign, [only], 2) = (ctx, exprs, want) {
            if let Some(t) = self.comma_ok(scope, only, span)? {
                return Ok(vec![t, self.s.types.basic(BasicKind::UntypedBool)]);
            }
        }
        if exprs.len() == 1 && want != 1 {
            return match self.expr(scope, &exprs[0])? {
                Operand::Multi(types) if types.len() == want => Ok(types),
                Operand::Multi(types) => Err(self.error(span, codes::E0201, mismatch(ctx, want, types.len()))),
                Operand::NoValue => Err(self.error(exprs[0].span, codes::E0205, "function call (no value) used as value")),
                _ => Err(self.error(span, codes::E0201, mismatch(ctx, want, 1))),
            };
        }
        if exprs.len() != want {
            return Err(self.error(span, codes::E0201, mismatch(ctx, want, exprs.len())));
        }
        exprs.iter().map(|e| self.value(scope, e)).collect()
    }

    /// `m[k]`, `x.(T)` and `<-ch` yield an extra untyped bool when two
    /// values are wanted. Returns the first value's type for those forms.
    fn comma_ok(&mut self, scope: ScopeId, e: &Expr, span: ast::Span) -> Result<Option<TypeId>, Diagnostic> {
        let inner = unparen(e);
        match &inner.kind {
            ExprKind::Index(base, index) => match self.index(scope, base, index, inner.span)? {
                (t, true) => Ok(Some(t)),
                (_, false) => Err(self.error(span, codes::E0201, mismatch(ValueContext::Assign, 2, 1))),
            },
            ExprKind::TypeAssert(_, Some(_)) | ExprKind::Unary(ast::UnaryOp::Recv, _) => {
                Ok(Some(self.value(scope, inner)?))
            }
            _ => Ok(None),
        }
    }

    fn expect_assignable(&self, value: TypeId, target: TypeId, span: ast::Span, context: &str) -> Result<(), Diagnostic> {
        if self.s.types.assignable(value, target) {
            return Ok(());
        }
        Err(self.error(
            span,
            codes::E0200,
            format!(
                "cannot use value of type {} as {} value in {context}",
                self.type_str(value),
                self.type_str(target)
            ),
        ))
    }

    fn value(&mut self, scope: ScopeId, e: &Expr) -> Result<TypeId, Diagnostic> {
        let operand = self.expr(scope, e)?;
        self.single(operand, e.span)
    }

    fn single(&self, operand: Operand, span: ast::Span) -> Result<TypeId, Diagnostic> {
        match operand {
            Operand::Value(t) => Ok(t),
            Operand::NoValue => Err(self.error(span, codes::E0205, "function call (no value) used as value")),
            Operand::Multi(types) => Err(self.error(
                span,
                codes::E0201,
                format!("multiple-value ({} values) in single-value context", types.len()),
            )),
            Operand::Type(t) => Err(self.error(
                span,
                codes::E0104,
                format!("{} (type) is not an expression", self.type_str(t)),
            )),
            Operand::Package(_, name) => Err(self.error(
                span,
                codes::E0104,
                format!("use of package {name} without selector"),
            )),
            Operand::Builtin(b) => Err(self.error(
                span,
                codes::E0104,
                format!("{} (built-in function) must be called", b.name()),
            )),
        }
    }

    fn expr(&mut self, scope: ScopeId, e: &Expr) -> Result<Operand, Diagnostic> {
        match &e.kind {
            ExprKind::Ident(id) => {
                if id.is_blank() {
                    return Err(self.error(id.span, codes::E0202, "cannot use _ as value"));
                }
                let obj = self.lookup(scope, id)?;
                Ok(self.obj_operand(obj))
            }
            ExprKind::Int => Ok(Operand::Value(self.s.types.basic(BasicKind::UntypedInt))),
            ExprKind::Float => Ok(Operand::Value(self.s.types.basic(BasicKind::UntypedFloat))),
            ExprKind::Char => Ok(Operand::Value(self.s.types.basic(BasicKind::UntypedRune))),
            ExprKind::Str(_) => Ok(Operand::Value(self.s.types.basic(BasicKind::UntypedString))),
            ExprKind::Paren(inner) => self.expr(scope, inner),
            ExprKind::Selector(base, sel) => self.selector(scope, base, sel),
            ExprKind::Call { callee, args, spread } => self.call(scope, callee, args, *spread, e.span),
            ExprKind::Index(base, index) => Ok(Operand::Value(self.index(scope, base, index, e.span)?.0)),
            ExprKind::SliceExpr { base, lo, hi } => {
                let bt = self.value(scope, base)?;
                for bound in [lo, hi].into_iter().flatten() {
                    let t = self.value(scope, bound)?;
                    if !self.s.types.is_integer(t) {
                        return Err(self.error(bound.span, codes::E0202, "invalid argument: index must be integer"));
                    }
                }
                let types = &self.s.types;
                if types.is_string(bt) {
                    return Ok(Operand::Value(types.default_type(bt).unwrap_or(bt)));
                }
                match types.kind(types.underlying(bt)) {
                    TypeKind::Slice(_) => Ok(Operand::Value(bt)),
                    _ => Err(self.error(
                        e.span,
                        codes::E0202,
                        format!("cannot slice value of type {}", self.type_str(bt)),
                    )),
                }
            }
            ExprKind::TypeAssert(x, ty) => {
                let Some(ty) = ty else {
                    return Err(self.error(e.span, codes::E0202, "use of .(type) outside type switch"));
                };
                let xt = self.value(scope, x)?;
                if self.s.types.interface_methods(xt).is_none() {
                    return Err(self.error(
                        x.span,
                        codes::E0202,
                        format!("invalid operation: value of type {} is not an interface", self.type_str(xt)),
                    ));
                }
                let t = self.resolve_type(scope, ty)?;
                self.expect_possible(xt, t, ty.span, "type assertion")?;
                Ok(Operand::Value(t))
            }
            ExprKind::CompositeLit { ty, elems } => {
                let Some(ty) = ty else {
                    return Err(self.error(e.span, codes::E0202, "invalid composite literal type: missing type"));
                };
                let t = self.resolve_type(scope, ty)?;
                self.composite(scope, t, elems, e.span)?;
                Ok(Operand::Value(t))
            }
            ExprKind::Type(te) => Ok(Operand::Type(self.resolve_type(scope, te)?)),
            ExprKind::Unary(op, operand) => self.unary(scope, *op, operand, e.span),
            ExprKind::Binary(op, lhs, rhs) => {
                let lt = self.value(scope, lhs)?;
                let rt = self.value(scope, rhs)?;
                self.binary(*op, lt, rt, e.span).map(Operand::Value)
            }
            ExprKind::FuncLit(sig, body) => {
                let ty = self.resolve_sig(scope, sig)?;
                let inner = self.s.symbols.new_scope(Some(scope), ScopeKind::Func);
                self.func_body(inner, sig, ty, body)?;
                Ok(Operand::Value(ty))
            }
        }
    }

    /// Element type of `base[index]`, and whether `base` is a map.
    fn index(&mut self, scope: ScopeId, base: &Expr, index: &Expr, span: ast::Span) -> Result<(TypeId, bool), Diagnostic> {
        let bt = self.value(scope, base)?;
        let under = self.s.types.underlying(bt);
        if let TypeKind::Map { key, value } = *self.s.types.kind(under) {
            let it = self.value(scope, index)?;
            self.expect_assignable(it, key, index.span, "map index")?;
            return Ok((value, true));
        }
        let it = self.value(scope, index)?;
        if !self.s.types.is_integer(it) {
            return Err(self.error(index.span, codes::E0202, "invalid argument: index must be integer"));
        }
        match self.s.types.kind(under) {
            TypeKind::Slice(elem) => Ok((*elem, false)),
            _ if self.s.types.is_string(bt) => Ok((self.s.types.basic(BasicKind::Uint8), false)),
            _ => Err(self.error(
                span,
                codes::E0202,
                format!("invalid operation: cannot index value of type {}", self.type_str(bt)),
            )),
        }
    }

    // ── Composite literals ──

    fn composite(&mut self, scope: ScopeId, t: TypeId, elems: &[ast::Element], span: ast::Span) -> Result<(), Diagnostic> {
        let under = self.s.types.underlying(t);
        match self.s.types.kind(under).clone() {
            TypeKind::Struct(fields) => self.struct_lit(scope, t, &fields, elems, span),
            TypeKind::Slice(elem) => {
                for el in elems {
                    if let Some(key) = &el.key {
                        let kt = self.value(scope, key)?;
                        if !self.s.types.is_integer(kt) {
                            return Err(self.error(key.span, codes::E0202, "index must be non-negative integer constant"));
                        }
                    }
                    self.element(scope, &el.value, elem)?;
                }
                Ok(())
            }
            TypeKind::Map { key, value } => {
                for el in elems {
                    let Some(k) = &el.key else {
                        return Err(self.error(el.value.span, codes::E0202, "missing key in map literal"));
                    };
                    self.element(scope, k, key)?;
                    self.element(scope, &el.value, value)?;
                }
                Ok(())
            }
            _ => Err(self.error(
                span,
                codes::E0202,
                format!("invalid composite literal type {}", self.type_str(t)),
            )),
        }
    }

    /// One literal element of type `want`. An elided `{...}` takes `want`,
    /// or its base type when `want` is a pointer.
    fn element(&mut self, scope: ScopeId, value: &Expr, want: TypeId) -> Result<(), Diagnostic> {
        if let ExprKind::CompositeLit { ty: None, elems } = &value.kind {
            let lit = match self.s.types.kind(want) {
                TypeKind::Pointer(base) => *base,
                _ => want,
            };
            return self.composite(scope, lit, elems, value.span);
        }
        let v = self.value(scope, value)?;
        self.expect_assignable(v, want, value.span, "composite literal")
    }

    fn struct_lit(
        &mut self,
        scope: ScopeId,
        t: TypeId,
        fields: &[(String, TypeId)],
        elems: &[ast::Element],
        span: ast::Span,
    ) -> Result<(), Diagnostic> {
        let keyed = elems.iter().filter(|el| el.key.is_some()).count();
        if keyed == 0 {
            if !elems.is_empty() && elems.len() != fields.len() {
                let message = if elems.len() < fields.len() {
                    "too few values in struct literal"
                } else {
                    "too many values in struct literal"
                };
                return Err(self.error(span, codes::E0201, message));
            }
            for (el, &(_, ft)) in elems.iter().zip(fields) {
                self.element(scope, &el.value, ft)?;
            }
            return Ok(());
        }
        if keyed != elems.len() {
            return Err(self.error(
                span,
                codes::E0202,
                "mixture of field:value and value elements in struct literal",
            ));
        }

        let mut seen = HashSet::new();
        for el in elems {
            let key = el.key.as_ref().map_or(el.value.span, |k| k.span);
            let Some(ExprKind::Ident(name)) = el.key.as_ref().map(|k| &k.kind) else {
                return Err(self.error(key, codes::E0202, "invalid field name in struct literal"));
            };
            let Some(&(_, ft)) = fields.iter().find(|(n, _)| n == &name.name) else {
                return Err(self.error(
                    name.span,
                    codes::E0203,
                    format!("unknown field {} in struct literal of type {}", name.name, self.type_str(t)),
                ));
            };
            if !seen.insert(name.name.as_str()) {
                return Err(self.error(
                    name.span,
                    codes::E0101,
                    format!("duplicate field name {} in struct literal", name.name),
                ));
            }
            if let Some((obj, _)) = self.lookup_member(t, &name.name) {
                self.record(name, obj, Role::Use);
            }
            self.element(scope, &el.value, ft)?;
        }
        Ok(())
    }

    fn selector(&mut self, scope: ScopeId, base: &Expr, sel: &Ident) -> Result<Operand, Diagnostic> {
        match self.expr(scope, base)? {
            Operand::Package(pkg_scope, name) => {
                let obj = self.package_member(pkg_scope, &name, sel)?;
                Ok(self.obj_operand(obj))
            }
            Operand::Type(t) => Err(self.error(
                sel.span,
                codes::E0202,
                format!("method expression {}.{} is not supported", self.type_str(t), sel.name),
            )),
            other => {
                let t = self.single(other, base.span)?;
                let Some((obj, ty)) = self.lookup_member(t, &sel.name) else {
                    return Err(self.error(
                        sel.span,
                        codes::E0203,
                        format!(
                            "{} undefined (type {} has no field or method {})",
                            sel.name,
                            self.type_str(t),
                            sel.name
                        ),
                    ));
                };
                self.record(sel, obj, Role::Use);
                Ok(Operand::Value(ty))
            }
        }
    }

    fn unary(&mut self, scope: ScopeId, op: ast::UnaryOp, operand: &Expr, span: ast::Span) -> Result<Operand, Diagnostic> {
        use ast::UnaryOp;
        if op == UnaryOp::Deref {
            return match self.expr(scope, operand)? {
                Operand::Type(t) => Ok(Operand::Type(self.intern(TypeKind::Pointer(t)))),
                other => {
                    let t = self.single(other, operand.span)?;
                    match self.s.types.kind(self.s.types.underlying(t)) {
                        TypeKind::Pointer(base) => Ok(Operand::Value(*base)),
                        _ => Err(self.error(
                            span,
                            codes::E0202,
                            format!("invalid operation: cannot indirect value of type {}", self.type_str(t)),
                        )),
                    }
                }
            };
        }

        let t = self.value(scope, operand)?;
        let types = &self.s.types;
        let ok = match op {
            UnaryOp::Neg | UnaryOp::Plus => types.is_numeric(t),
            UnaryOp::Not => types.is_boolean(t),
            UnaryOp::Addr => !types.is_untyped(t),
            UnaryOp::Recv => matches!(types.kind(types.underlying(t)), TypeKind::Chan { .. }),
            UnaryOp::Deref => false,
        };
        if !ok {
            return Err(self.error(
                span,
                codes::E0202,
                format!("invalid operation: operator not defined on value of type {}", self.type_str(t)),
            ));
        }
        Ok(Operand::Value(match op {
            UnaryOp::Addr => self.intern(TypeKind::Pointer(t)),
            UnaryOp::Recv => match self.s.types.kind(self.s.types.underlying(t)) {
                TypeKind::Chan { elem, .. } => *elem,
                _ => self.s.types.invalid(),
            },
            _ => t,
        }))
    }

    fn binary(&self, op: ast::BinaryOp, lt: TypeId, rt: TypeId, span: ast::Span) -> Result<TypeId, Diagnostic> {
        let types = &self.s.types;
        if op.is_logical() {
            if !types.is_boolean(lt) || !types.is_boolean(rt) {
                return Err(self.error(
                    span,
                    codes::E0202,
                    format!("invalid operation: operator {op} not defined on non-boolean operands"),
                ));
            }
            return Ok(if types.is_untyped(lt) { rt } else { lt });
        }
        if op.is_comparison() {
            if !types.assignable(lt, rt) && !types.assignable(rt, lt) {
                return Err(self.error(
                    span,
                    codes::E0202,
                    format!(
                        "invalid operation: mismatched types {} and {}",
                        self.type_str(lt),
                        self.type_str(rt)
                    ),
                ));
            }
            let ordered = matches!(
                op,
                ast::BinaryOp::Lt | ast::BinaryOp::Le | ast::BinaryOp::Gt | ast::BinaryOp::Ge
            );
            if ordered && !(types.is_numeric(lt) || types.is_string(lt)) {
                return Err(self.error(
                    span,
                    codes::E0202,
                    format!("invalid operation: operator {op} not defined on {}", self.type_str(lt)),
                ));
            }
            return Ok(types.basic(BasicKind::UntypedBool));
        }
        self.arithmetic(op, lt, rt, span)
    }

    fn arithmetic(&self, op: ast::BinaryOp, lt: TypeId, rt: TypeId, span: ast::Span) -> Result<TypeId, Diagnostic> {
        let types = &self.s.types;
        let mismatched = || {
            self.error(
                span,
                codes::E0202,
                format!(
                    "invalid operation: mismatched types {} and {}",
                    self.type_str(lt),
                    self.type_str(rt)
                ),
            )
        };
        let t = match (types.is_untyped(lt), types.is_untyped(rt)) {
            (true, true) if types.is_numeric(lt) && types.is_numeric(rt) => types.untyped_join(lt, rt),
            (true, true) if lt == rt => lt,
            (true, true) => return Err(mismatched()),
            (true, false) if types.assignable(lt, rt) => rt,
            (false, true) if types.assignable(rt, lt) => lt,
            (false, false) if lt == rt => lt,
            _ => return Err(mismatched()),
        };
        let defined = match op {
            ast::BinaryOp::Add => types.is_numeric(t) || types.is_string(t),
            ast::BinaryOp::Rem => types.is_integer(t),
            _ => types.is_numeric(t),
        };
        if !defined {
            return Err(self.error(
                span,
                codes::E0202,
                format!("invalid operation: operator {op} not defined on {}", self.type_str(t)),
            ));
        }
        Ok(t)
    }

    fn call(
        &mut self,
        scope: ScopeId,
        callee: &Expr,
        args: &[Expr],
        spread: bool,
        span: ast::Span,
    ) -> Result<Operand, Diagnostic> {
        match self.expr(scope, callee)? {
            Operand::Type(t) if spread => Err(self.error(
                span,
                codes::E0202,
                format!("invalid use of ... in conversion to {}", self.type_str(t)),
            )),
            Operand::Type(t) => {
                let [arg] = args else {
                    return Err(self.error(
                        span,
                        codes::E0201,
                        format!("wrong argument count in conversion to {}", self.type_str(t)),
                    ));
                };
                let v = self.value(scope, arg)?;
                if !self.convertible(v, t) {
                    return Err(self.error(
                        arg.span,
                        codes::E0200,
                        format!(
                            "cannot convert value of type {} to type {}",
                            self.type_str(v),
                            self.type_str(t)
                        ),
                    ));
                }
                Ok(Operand::Value(t))
            }
            Operand::Builtin(Builtin::Append) => self.append(scope, args, spread, span),
            Operand::Builtin(b) if spread => Err(self.error(
                span,
                codes::E0202,
                format!("invalid use of ... with built-in {}", b.name()),
            )),
            Operand::Builtin(b) => self.builtin(scope, b, args, span),
            other => {
                let f = self.single(other, callee.span)?;
                let Some(sig) = self.s.types.func_sig(f).cloned() else {
                    return Err(self.error(
                        callee.span,
                        codes::E0204,
                        format!("invalid operation: cannot call non-function (value of type {})", self.type_str(f)),
                    ));
                };
                if spread {
                    self.spread_arguments(scope, &sig, args, span)?;
                } else {
                    self.arguments(scope, &sig, args, span)?;
                }
                Ok(match sig.results.as_slice() {
                    [] => Operand::NoValue,
                    [single] => Operand::Value(*single),
                    many => Operand::Multi(many.to_vec()),
                })
            }
        }
    }

    fn convertible(&self, v: TypeId, t: TypeId) -> bool {
        let types = &self.s.types;
        if types.assignable(v, t) {
            return true;
        }
        let vu = types.underlying(v);
        let tu = types.underlying(t);
        if vu == tu {
            return true;
        }
        let bytes = |u: TypeId| {
            matches!(types.kind(u), TypeKind::Slice(elem) if types.basic_kind(*elem) == Some(BasicKind::Uint8))
        };
        (types.is_numeric(v) && types.is_numeric(t))
            || (types.is_string(t) && (types.is_integer(v) || bytes(vu)))
            || (bytes(tu) && types.is_string(v))
    }

    fn arguments(&mut self, scope: ScopeId, sig: &FuncSig, args: &[Expr], span: ast::Span) -> Result<(), Diagnostic> {
        let mut actual: Vec<(TypeId, ast::Span)> = Vec::with_capacity(args.len());
        if let [only] = args {
            match self.expr(scope, only)? {
                Operand::Multi(types) if sig.params.len() > 1 || sig.variadic => {
                    actual.extend(types.into_iter().map(|t| (t, only.span)));
                }
                other => actual.push((self.single(other, only.span)?, only.span)),
            }
        } else {
            for arg in args {
                actual.push((self.value(scope, arg)?, arg.span));
            }
        }

        let n = sig.params.len();
        let too_few = if sig.variadic { actual.len() + 1 < n } else { actual.len() < n };
        if too_few {
            return Err(self.error(span, codes::E0201, "not enough arguments in call"));
        }
        if !sig.variadic && actual.len() > n {
            return Err(self.error(span, codes::E0201, "too many arguments in call"));
        }
        for (i, &(t, at)) in actual.iter().enumerate() {
            let param = if sig.variadic && i + 1 >= n {
                match self.s.types.kind(sig.params[n - 1]) {
                    TypeKind::Slice(elem) => *elem,
                    _ => sig.params[n - 1],
                }
            } else {
                sig.params[i]
            };
            self.expect_assignable(t, param, at, "argument")?;
        }
        Ok(())
    }

    /// `f(a, b, rest...)`: the final argument is passed as the variadic slice.
    fn spread_arguments(&mut self, scope: ScopeId, sig: &FuncSig, args: &[Expr], span: ast::Span) -> Result<(), Diagnostic> {
        if !sig.variadic {
            return Err(self.error(span, codes::E0201, "cannot use ... in call to non-variadic function"));
        }
        if args.len() < sig.params.len() {
            return Err(self.error(span, codes::E0201, "not enough arguments in call"));
        }
        if args.len() > sig.params.len() {
            return Err(self.error(span, codes::E0201, "too many arguments in call"));
        }
        for (arg, &param) in args.iter().zip(&sig.params) {
            let t = self.value(scope, arg)?;
            self.expect_assignable(t, param, arg.span, "argument")?;
        }
        Ok(())
    }

    fn one_arg<'e>(&self, b: Builtin, args: &'e [Expr], span: ast::Span) -> Result<&'e Expr, Diagnostic> {
        match args {
            [arg] => Ok(arg),
            _ => Err(self.error(
                span,
                codes::E0201,
                format!("wrong number of arguments for {} (expected 1, found {})", b.name(), args.len()),
            )),
        }
    }

    /// `append(s, x...)` or `append(s, t...)`; the result has the type of `s`.
    fn append(&mut self, scope: ScopeId, args: &[Expr], spread: bool, span: ast::Span) -> Result<Operand, Diagnostic> {
        let Some((first, rest)) = args.split_first() else {
            return Err(self.error(span, codes::E0201, "not enough arguments for append"));
        };
        let st = self.value(scope, first)?;
        let TypeKind::Slice(elem) = *self.s.types.kind(self.s.types.underlying(st)) else {
            return Err(self.error(
                first.span,
                codes::E0202,
                format!("invalid argument: value of type {} is not a slice", self.type_str(st)),
            ));
        };
        if !spread {
            for arg in rest {
                let t = self.value(scope, arg)?;
                self.expect_assignable(t, elem, arg.span, "argument to append")?;
            }
            return Ok(Operand::Value(st));
        }
        let [tail] = rest else {
            return Err(self.error(span, codes::E0201, "can only use ... with final argument in list"));
        };
        let tt = self.value(scope, tail)?;
        // append([]byte, string...)
        let bytes = self.s.types.basic_kind(elem) == Some(BasicKind::Uint8) && self.s.types.is_string(tt);
        if !bytes {
            let slice = self.intern(TypeKind::Slice(elem));
            self.expect_assignable(tt, slice, tail.span, "argument to append")?;
        }
        Ok(Operand::Value(st))
    }

    fn builtin(&mut self, scope: ScopeId, b: Builtin, args: &[Expr], span: ast::Span) -> Result<Operand, Diagnostic> {
        match b {
            Builtin::Len | Builtin::Cap => {
                let arg = self.one_arg(b, args, span)?;
                let t = self.value(scope, arg)?;
                let types = &self.s.types;
                let ok = match types.kind(types.underlying(t)) {
                    TypeKind::Slice(_) | TypeKind::Chan { .. } => true,
                    TypeKind::Map { .. } => b == Builtin::Len,
                    _ => b == Builtin::Len && types.is_string(t),
                };
                if !ok {
                    return Err(self.error(
                        arg.span,
                        codes::E0202,
                        format!("invalid argument: value of type {} for built-in {}", self.type_str(t), b.name()),
                    ));
                }
                Ok(Operand::Value(self.s.types.basic(BasicKind::Int)))
            }
            Builtin::Close => {
                let arg = self.one_arg(b, args, span)?;
                let t = self.value(scope, arg)?;
                match self.s.types.kind(self.s.types.underlying(t)) {
                    TypeKind::Chan { recv_only: false, .. } => Ok(Operand::NoValue),
                    TypeKind::Chan { .. } => Err(self.error(
                        arg.span,
                        codes::E0202,
                        "invalid operation: cannot close receive-only channel",
                    )),
                    _ => Err(self.error(
                        arg.span,
                        codes::E0202,
                        format!("invalid operation: non-chan argument of type {} for close", self.type_str(t)),
                    )),
                }
            }
            Builtin::Delete => {
                let [m, k] = args else {
                    return Err(self.error(
                        span,
                        codes::E0201,
                        format!("wrong number of arguments for delete (expected 2, found {})", args.len()),
                    ));
                };
                let mt = self.value(scope, m)?;
                let TypeKind::Map { key, .. } = *self.s.types.kind(self.s.types.underlying(mt)) else {
                    return Err(self.error(
                        m.span,
                        codes::E0202,
                        format!("invalid argument: value of type {} is not a map", self.type_str(mt)),
                    ));
                };
                let kt = self.value(scope, k)?;
                self.expect_assignable(kt, key, k.span, "argument to delete")?;
                Ok(Operand::NoValue)
            }
            Builtin::Make => {
                let Some((first, sizes)) = args.split_first() else {
                    return Err(self.error(span, codes::E0201, "not enough arguments for make"));
                };
                let Operand::Type(t) = self.expr(scope, first)? else {
                    return Err(self.error(first.span, codes::E0104, "first argument to make is not a type"));
                };
                let (min, max) = match self.s.types.kind(self.s.types.underlying(t)) {
                    TypeKind::Slice(_) => (1, 2),
                    TypeKind::Map { .. } | TypeKind::Chan { .. } => (0, 1),
                    _ => {
                        return Err(self.error(
                            first.span,
                            codes::E0202,
                            format!("invalid argument: cannot make {}", self.type_str(t)),
                        ))
                    }
                };
                if sizes.len() < min || sizes.len() > max {
                    return Err(self.error(
                        span,
                        codes::E0201,
                        format!("wrong number of arguments for make {}", self.type_str(t)),
                    ));
                }
                for size in sizes {
                    let st = self.value(scope, size)?;
                    if !self.s.types.is_integer(st) {
                        return Err(self.error(size.span, codes::E0202, "size argument to make must be integer"));
                    }
                }
                Ok(Operand::Value(t))
            }
            // Handled by `append`.
            Builtin::Append => self.append(scope, args, false, span),
            Builtin::New => {
                let arg = self.one_arg(b, args, span)?;
                match self.expr(scope, arg)? {
                    Operand::Type(t) => Ok(Operand::Value(self.intern(TypeKind::Pointer(t)))),
                    _ => Err(self.error(arg.span, codes::E0104, "argument to new is not a type")),
                }
            }
            Builtin::Panic => {
                let arg = self.one_arg(b, args, span)?;
                self.value(scope, arg)?;
                Ok(Operand::NoValue)
            }
            Builtin::Print | Builtin::Println => {
                for arg in args {
                    self.value(scope, arg)?;
                }
                Ok(Operand::NoValue)
            }
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(Arc::new(ModuleRegistry::default()))
    }

    fn check(src: &str) -> Result<(Session, ScopeId), String> {
        let mut s = session();
        let file = s.parse_file("p/a.go", src).map_err(|d| d.render(&s.sources))?;
        let name = file.ast.package.name.clone();
        match s.check_package(&name, &[file]) {
            Ok(scope) => Ok((s, scope)),
            Err(d) => Err(d.render(&s.sources)),
        }
    }

    fn check_ok(src: &str) -> (Session, ScopeId) {
        match check(src) {
            Ok(r) => r,
            Err(e) => panic!("unexpected check error: {e}"),
        }
    }

    fn check_err(src: &str) -> String {
        match check(src) {
            Ok(_) => panic!("expected a check error"),
            Err(e) => e,
        }
    }

    /// All objects named `name` that have a `Def` binding, in program order.
    fn defs_named(s: &Session, name: &str) -> Vec<ObjId> {
        s.bindings
            .iter()
            .filter(|(_, b)| b.role == Role::Def && s.symbols.obj(b.obj).name == name)
            .map(|(_, b)| b.obj)
            .collect()
    }

    fn uses_of(s: &Session, obj: ObjId) -> usize {
        s.bindings
            .iter()
            .filter(|(_, b)| b.role == Role::Use && b.obj == obj)
            .count()
    }

    #[test]
    fn both_context_paths_name_the_same_type() {
        let (s, _) = check_ok(
            "package p\n\nimport (\n\tstd \"context\"\n\t\"golang.org/x/net/context\"\n)\n\nfunc f(a std.Context, b context.Context) {\n\ta = b\n\tb = a\n}\n",
        );
        let a = defs_named(&s, "a")[0];
        let b = defs_named(&s, "b")[0];
        assert_eq!(s.symbols.obj(a).ty, s.symbols.obj(b).ty);
    }

    #[test]
    fn short_var_reuses_parameter_in_function_scope() {
        let (s, _) = check_ok(
            "package p\n\nimport \"context\"\n\nfunc f(ctx context.Context) {\n\tctx, cancel := context.WithCancel(ctx)\n\tdefer cancel()\n\t_ = ctx\n}\n",
        );
        let ctx_defs = defs_named(&s, "ctx");
        assert_eq!(ctx_defs.len(), 1, "ctx must not be redeclared");
        // LHS of := and the argument and the blank assignment.
        assert_eq!(uses_of(&s, ctx_defs[0]), 3);
        assert_eq!(defs_named(&s, "cancel").len(), 1);
    }

    #[test]
    fn nested_block_shadows() {
        let (s, _) = check_ok(
            "package p\n\nimport \"context\"\n\nfunc f(ctx context.Context) {\n\tif true {\n\t\tctx := context.TODO()\n\t\t_ = ctx\n\t}\n}\n",
        );
        let defs = defs_named(&s, "ctx");
        assert_eq!(defs.len(), 2);
        assert_ne!(s.symbols.obj(defs[0]).parent, s.symbols.obj(defs[1]).parent);
    }

    #[test]
    fn no_new_variables() {
        let err = check_err("package p\n\nfunc f() {\n\tx := 1\n\tx := 2\n\t_ = x\n}\n");
        assert!(err.ends_with("no new variables on left side of :="), "{err}");
        assert!(err.starts_with("p/a.go:5:2:"), "{err}");
    }

    #[test]
    fn undefined_name() {
        let err = check_err("package p\n\nfunc f() {\n\ty = 1\n}\n");
        assert_eq!(err, "p/a.go:4:2: undefined: y");
    }

    #[test]
    fn name_visible_only_after_declaration() {
        let err = check_err("package p\n\nfunc f() {\n\tx := x\n}\n");
        assert!(err.ends_with("undefined: x"), "{err}");
    }

    #[test]
    fn unknown_module_is_type_error() {
        let err = check_err("package p\n\nimport \"net/http\"\n");
        assert!(err.contains("could not import net/http"), "{err}");
    }

    #[test]
    fn assignability_is_enforced() {
        let err = check_err(
            "package p\n\nimport \"context\"\n\nfunc f(ctx context.Context) {\n\tctx = 1\n}\n",
        );
        assert!(err.contains("cannot use value of type untyped int as context.Context"), "{err}");
    }

    #[test]
    fn methods_and_fields_resolve() {
        let (s, _) = check_ok(
            "package p\n\nimport \"context\"\n\ntype Server struct {\n\tctx context.Context\n\tname string\n}\n\nfunc (s *Server) Ctx() context.Context {\n\treturn s.ctx\n}\n\nfunc use(s *Server) {\n\ts.ctx = s.Ctx()\n\tprintln(s.name)\n}\n",
        );
        let field = defs_named(&s, "ctx")[0];
        assert_eq!(s.symbols.obj(field).kind, ObjKind::Field);
        assert_eq!(uses_of(&s, field), 2);
    }

    #[test]
    fn multi_value_forwarding_and_variadic() {
        check_ok(
            "package p\n\nimport (\n\t\"errors\"\n\t\"fmt\"\n)\n\nfunc pair() (int, error) {\n\treturn 1, errors.New(\"x\")\n}\n\nfunc f() {\n\tfmt.Println(pair())\n\tfmt.Println()\n\tfmt.Println(1, \"a\", nil)\n\tn, err := pair()\n\t_, _ = n, err\n}\n",
        );
    }

    #[test]
    fn wrong_argument_count() {
        let err = check_err(
            "package p\n\nimport \"context\"\n\nfunc f() {\n\tcontext.WithCancel()\n}\n",
        );
        assert!(err.ends_with("not enough arguments in call"), "{err}");
    }

    #[test]
    fn interface_satisfaction_through_pointer_receiver() {
        check_ok(
            "package p\n\ntype myErr struct{}\n\nfunc (e *myErr) Error() string {\n\treturn \"x\"\n}\n\nfunc f() error {\n\tvar e myErr\n\treturn &e\n}\n",
        );
    }

    #[test]
    fn time_durations_and_conversions() {
        check_ok(
            "package p\n\nimport (\n\t\"context\"\n\t\"time\"\n)\n\nfunc f(parent context.Context, n int) {\n\tctx, cancel := context.WithTimeout(parent, time.Duration(n)*time.Second)\n\tdefer cancel()\n\tselectDone(ctx)\n}\n\nfunc selectDone(ctx context.Context) {\n\t<-ctx.Done()\n\tif ctx.Err() != nil {\n\t\treturn\n\t}\n}\n",
        );
    }

    #[test]
    fn func_literals_capture_and_open_scope() {
        let (s, _) = check_ok(
            "package p\n\nimport \"context\"\n\nfunc f(ctx context.Context) {\n\tgo func() {\n\t\tctx = context.WithValue(ctx, 1, 2)\n\t}()\n\tfor i := 0; i < 3; i++ {\n\t\tif i == 1 {\n\t\t\tbreak\n\t\t}\n\t}\n}\n",
        );
        assert_eq!(defs_named(&s, "ctx").len(), 1);
    }

    #[test]
    fn break_outside_loop() {
        let err = check_err("package p\n\nfunc f() {\n\tbreak\n}\n");
        assert!(err.ends_with("break is not in a loop, switch, or select"), "{err}");
    }

    #[test]
    fn break_in_switch_but_continue_needs_a_loop() {
        check_ok("package p\n\nfunc f(n int) {\n\tswitch n {\n\tcase 1:\n\t\tbreak\n\t}\n}\n");
        let err = check_err("package p\n\nfunc f(n int) {\n\tswitch n {\n\tcase 1:\n\t\tcontinue\n\t}\n}\n");
        assert!(err.ends_with("continue is not in a loop"), "{err}");
    }

    #[test]
    fn constants_and_iota() {
        let (s, _) = check_ok(
            "package p\n\nimport \"time\"\n\nconst (\n\tA = iota\n\tB\n)\n\nconst grace time.Duration = 2 * time.Second\n\nfunc f() int {\n\tconst local = \"x\"\n\tvar d time.Duration = grace\n\t_ = d\n\treturn A + B + len(local)\n}\n",
        );
        let b = defs_named(&s, "B")[0];
        assert_eq!(s.symbols.obj(b).kind, ObjKind::Const);
        assert_eq!(s.types.display(s.symbols.obj(b).ty), "untyped int");
        let grace = defs_named(&s, "grace")[0];
        assert_eq!(s.types.display(s.symbols.obj(grace).ty), "time.Duration");
    }

    #[test]
    fn constants_are_not_assignable_or_computed_at_run_time() {
        let err = check_err("package p\n\nconst c = 1\n\nfunc f() {\n\tc = 2\n}\n");
        assert!(err.ends_with("cannot assign to c"), "{err}");
        let err = check_err(
            "package p\n\nimport \"errors\"\n\nconst e = errors.New(\"x\")\n",
        );
        assert!(err.ends_with("value of type error is not constant"), "{err}");
    }

    #[test]
    fn range_variables_take_element_types() {
        let (s, _) = check_ok(
            "package p\n\nfunc f(xs []string, m map[string]int, ch chan bool, s string) {\n\tfor i, x := range xs {\n\t\tvar _ int = i\n\t\tvar _ string = x\n\t}\n\tfor k, v := range m {\n\t\tvar _ string = k\n\t\tvar _ int = v\n\t}\n\tfor b := range ch {\n\t\tvar _ bool = b\n\t}\n\tfor _, r := range s {\n\t\tvar _ rune = r\n\t}\n\tvar last string\n\tfor _, last = range xs {\n\t}\n\tfor range 3 {\n\t\tcontinue\n\t}\n}\n",
        );
        assert_eq!(defs_named(&s, "x").len(), 1);
        let last = defs_named(&s, "last")[0];
        assert_eq!(uses_of(&s, last), 1);
    }

    #[test]
    fn range_over_channel_has_one_variable() {
        let err = check_err(
            "package p\n\nfunc f(ch chan int) {\n\tfor a, b := range ch {\n\t\t_, _ = a, b\n\t}\n}\n",
        );
        assert!(err.contains("permits only one iteration variable"), "{err}");
    }

    #[test]
    fn switch_rules() {
        check_ok(
            "package p\n\nfunc f(n int) int {\n\tswitch m := n * 2; m {\n\tcase 1, 2:\n\t\tfallthrough\n\tcase 3:\n\t\treturn m\n\tdefault:\n\t}\n\tswitch {\n\tcase n > 1:\n\t}\n\treturn 0\n}\n",
        );
        let err = check_err("package p\n\nfunc f(n int) {\n\tswitch n {\n\tcase 1:\n\t\tfallthrough\n\t}\n}\n");
        assert!(err.ends_with("fallthrough statement out of place"), "{err}");
        let err = check_err("package p\n\nfunc f(n int) {\n\tswitch n {\n\tdefault:\n\tdefault:\n\t}\n}\n");
        assert!(err.ends_with("multiple defaults in switch"), "{err}");
        let err = check_err("package p\n\nfunc f(n int) {\n\tswitch {\n\tcase n:\n\t}\n}\n");
        assert!(err.contains("mismatched types int and bool"), "{err}");
        let err = check_err("package p\n\nfunc f(n int) {\n\tswitch n {\n\tcase \"a\":\n\t}\n}\n");
        assert!(err.contains("mismatched types int and untyped string"), "{err}");
    }

    #[test]
    fn type_switch_binds_per_clause() {
        let (s, _) = check_ok(
            "package p\n\nimport \"context\"\n\nfunc f(x any) string {\n\tswitch v := x.(type) {\n\tcase error:\n\t\treturn v.Error()\n\tcase context.Context, nil:\n\t\t_ = v\n\t}\n\treturn \"\"\n}\n",
        );
        assert!(defs_named(&s, "v").is_empty(), "the guard name declares nothing");
        let err = check_err(
            "package p\n\nfunc f(x any) {\n\tswitch v := x.(type) {\n\tcase int, string:\n\t\t_ = v + 1\n\t}\n}\n",
        );
        assert!(err.contains("not defined on interface{}"), "{err}");
        let err = check_err("package p\n\nfunc f(n int) {\n\tswitch n.(type) {\n\t}\n}\n");
        assert!(err.ends_with("value of type int is not an interface"), "{err}");
    }

    #[test]
    fn select_comm_clauses() {
        check_ok(
            "package p\n\nimport \"context\"\n\nfunc f(ctx context.Context, in <-chan int, out chan int) int {\n\tvar n int\n\tfor {\n\t\tselect {\n\t\tcase <-ctx.Done():\n\t\t\treturn n\n\t\tcase v, ok := <-in:\n\t\t\tif !ok {\n\t\t\t\tbreak\n\t\t\t}\n\t\t\tn += v\n\t\tcase n = <-in:\n\t\tcase out <- n:\n\t\tdefault:\n\t\t}\n\t}\n}\n",
        );
        let err = check_err(
            "package p\n\nfunc f(n int) {\n\tselect {\n\tcase n = 1:\n\t}\n}\n",
        );
        assert!(err.ends_with("select case must be receive, send or assign recv"), "{err}");
        let err = check_err("package p\n\nfunc f(in <-chan int) {\n\tin <- 1\n}\n");
        assert!(err.contains("cannot send to receive-only channel"), "{err}");
    }

    #[test]
    fn composite_literal_keys_resolve_to_fields() {
        let (s, _) = check_ok(
            "package p\n\nimport \"context\"\n\ntype job struct {\n\tctx  context.Context\n\tname string\n}\n\nfunc f(ctx context.Context) []*job {\n\tj := job{ctx: ctx, name: \"a\"}\n\tnames := map[string][]int{\"a\": {1, 2}}\n\t_ = names\n\treturn []*job{&j, {ctx, \"b\"}}\n}\n",
        );
        let field = defs_named(&s, "ctx")[0];
        assert_eq!(s.symbols.obj(field).kind, ObjKind::Field);
        assert_eq!(uses_of(&s, field), 1);

        let err = check_err("package p\n\ntype t struct {\n\ta int\n}\n\nvar v = t{b: 1}\n");
        assert!(err.contains("unknown field b in struct literal of type p.t"), "{err}");
        let err = check_err("package p\n\nvar m = map[string]int{1: 1}\n");
        assert!(err.contains("as string value in composite literal"), "{err}");
        let err = check_err("package p\n\ntype t struct {\n\ta, b int\n}\n\nvar v = t{1}\n");
        assert!(err.ends_with("too few values in struct literal"), "{err}");
    }

    #[test]
    fn comma_ok_forms() {
        check_ok(
            "package p\n\nimport \"context\"\n\nfunc f(m map[string]int, x any, ch chan int) {\n\tv, ok := m[\"k\"]\n\tctx, isCtx := x.(context.Context)\n\tn, open := <-ch\n\t_, _, _, _, _, _ = v, ok, ctx, isCtx, n, open\n\tvar b bool\n\tv, b = m[\"j\"]\n\t_ = b\n}\n",
        );
        let err = check_err("package p\n\nfunc f(xs []int) {\n\tv, ok := xs[0]\n\t_, _ = v, ok\n}\n");
        assert!(err.ends_with("assignment mismatch: 2 variables but 1 value"), "{err}");
    }

    #[test]
    fn builtins_for_maps_slices_and_channels() {
        check_ok(
            "package p\n\nfunc f(extra []string) int {\n\tm := make(map[string]int)\n\tm[\"a\"] = 1\n\tdelete(m, \"a\")\n\txs := make([]string, 0, 4)\n\txs = append(xs, \"a\", \"b\")\n\txs = append(xs, extra...)\n\tb := append([]byte(\"x\"), \"yz\"...)\n\tch := make(chan int, 1)\n\tclose(ch)\n\treturn len(m) + cap(xs) + len(b) + len(xs[1:]) + len(\"abc\"[:2])\n}\n",
        );
        let err = check_err("package p\n\nfunc f(ch <-chan int) {\n\tclose(ch)\n}\n");
        assert!(err.ends_with("cannot close receive-only channel"), "{err}");
        let err = check_err("package p\n\nvar m = make(int)\n");
        assert!(err.ends_with("cannot make int"), "{err}");
    }

    #[test]
    fn spread_arguments() {
        check_ok(
            "package p\n\nimport \"fmt\"\n\nfunc f(args []any) {\n\tfmt.Println(args...)\n\t_ = fmt.Sprintf(\"%v\", args...)\n}\n",
        );
        let err = check_err("package p\n\nfunc g(a []int) {}\n\nfunc f(a []int) {\n\tg(a...)\n}\n");
        assert!(err.ends_with("cannot use ... in call to non-variadic function"), "{err}");
    }

    #[test]
    fn type_assertions() {
        let err = check_err(
            "package p\n\nimport \"context\"\n\nfunc f(err error) {\n\t_ = err.(context.CancelFunc)\n}\n",
        );
        assert!(err.contains("impossible type assertion: context.CancelFunc does not implement error"), "{err}");
        let err = check_err("package p\n\nfunc f(x any) {\n\t_ = x.(type)\n}\n");
        assert!(err.ends_with("use of .(type) outside type switch"), "{err}");
    }

    #[test]
    fn return_count_checked() {
        let err = check_err("package p\n\nfunc f() (int, error) {\n\treturn 1\n}\n");
        assert!(err.contains("not enough return values"), "{err}");
    }

    #[test]
    fn mixed_package_clauses() {
        let mut s = session();
        let a = s.parse_file("p/a.go", "package a\n").expect("parse");
        let b = s.parse_file("p/b.go", "package b\n").expect("parse");
        let err = package_name(&[a, b]).expect_err("mismatch");
        assert_eq!(
            err.render(&s.sources),
            "p/b.go:1:9: package b; expected package a\n\tp/a.go:1:9: first package clause"
        );
    }

    #[test]
    fn redeclaration_points_at_the_other_declaration() {
        let err = check_err("package p\n\nfunc f() {\n\tvar x int\n\tvar x string\n}\n");
        assert_eq!(
            err,
            "p/a.go:5:6: x redeclared in this block\n\tp/a.go:4:6: other declaration of x"
        );
    }

    #[test]
    fn missing_module_carries_a_hint() {
        let err = check_err("package p\n\nimport \"net/http\"\n");
        assert_eq!(
            err,
            "p/a.go:3:8: could not import net/http (module not found)\n\thint: add a stub directory that provides it with --stub-dir"
        );
    }

    #[test]
    fn syntax_error_diagnostic() {
        let mut s = session();
        let err = s.parse_file("p/a.go", "package p\nfunc (\n").expect_err("syntax");
        assert_eq!(err.code, Some(codes::E0001));
    }

    #[test]
    fn modules_are_imported_once() {
        let mut s = session();
        let first = s.load_module("context").expect("context");
        let files = s.sources.len();
        let again = s.load_module("context").expect("context");
        assert_eq!(first.scope, again.scope);
        assert_eq!(s.sources.len(), files);
        assert!(matches!(s.load_module("nope/nope"), Err(ModuleError::NotFound)));
    }
}
