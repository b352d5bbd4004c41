// matcher.rs — Identifier occurrences of the sentinel type
//
// A direct recursive walk over the unit's syntax trees. Every identifier with
// an entry in the binding table is checked against the sentinel type by
// `TypeId` identity; matching identifiers become `Occurrence`s.
//
// Preconditions: `unit` type-checked; `sentinel` resolved against the same
//                session.
// Postconditions: occurrences are in program order.
// Failure modes: none.
// Side effects: none.

use crate::ast::{
    Block, Decl, Expr, ExprKind, Field, File, Ident, Signature, Stmt, StmtKind, SwitchKind,
    TypeExpr, TypeExprKind, VarSpec,
};
use crate::binding::{BindingTable, ObjKind, Role, Symbols};
use crate::id::{FileId, ObjId, ScopeId};
use crate::resolve::Sentinel;
use crate::source::Pos;

/// Symbol identity: the declaring scope and the declared name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolKey {
    pub scope: ScopeId,
    pub name: String,
}

/// One identifier whose resolved object has the sentinel type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub symbol: SymbolKey,
    pub obj: ObjId,
    pub pos: Pos,
    /// Left-hand side of an assignment re-binding an existing variable.
    pub is_assign: bool,
}

/// Collect sentinel-typed occurrences from `files` (file id, syntax tree).
pub fn match_occurrences<'f>(
    files: impl IntoIterator<Item = (FileId, &'f File)>,
    symbols: &Symbols,
    bindings: &BindingTable,
    sentinel: Sentinel,
) -> Vec<Occurrence> {
    let mut out = Vec::new();
    for (file, ast) in files {
        let mut m = Matcher {
            symbols,
            bindings,
            sentinel,
            file,
            out: &mut out,
        };
        m.file(ast);
    }
    out.sort_by_key(|o| o.pos);
    out
}

struct Matcher<'a> {
    symbols: &'a Symbols,
    bindings: &'a BindingTable,
    sentinel: Sentinel,
    file: FileId,
    out: &'a mut Vec<Occurrence>,
}

impl Matcher<'_> {
    fn ident(&mut self, id: &Ident, lhs: bool) {
        let pos = Pos::of_span(self.file, id.span);
        let Some(binding) = self.bindings.get(pos) else {
            return;
        };
        let obj = self.symbols.obj(binding.obj);
        if obj.ty != self.sentinel.ty {
            return;
        }
        self.out.push(Occurrence {
            symbol: SymbolKey {
                scope: obj.parent,
                name: obj.name.clone(),
            },
            obj: binding.obj,
            pos,
            is_assign: lhs && binding.role == Role::Use && obj.kind == ObjKind::Var,
        });
    }

    fn file(&mut self, file: &File) {
        for import in &file.imports {
            if let Some(name) = &import.name {
                self.ident(name, false);
            }
        }
        for decl in &file.decls {
            match decl {
                Decl::Func(f) => {
                    if let Some(recv) = &f.recv {
                        self.field(recv);
                    }
                    self.ident(&f.name, false);
                    self.signature(&f.sig);
                    if let Some(body) = &f.body {
                        self.block(body);
                    }
                }
                Decl::Type(spec) => {
                    self.ident(&spec.name, false);
                    self.type_expr(&spec.ty);
                }
                Decl::Var(spec) | Decl::Const(spec) => self.var_spec(spec),
            }
        }
    }

    fn field(&mut self, field: &Field) {
        for name in &field.names {
            self.ident(name, false);
        }
        self.type_expr(&field.ty);
    }

    fn signature(&mut self, sig: &Signature) {
        for field in sig.params.iter().chain(&sig.results) {
            self.field(field);
        }
    }

    fn type_expr(&mut self, ty: &TypeExpr) {
        match &ty.kind {
            TypeExprKind::Name(id) => self.ident(id, false),
            TypeExprKind::Qualified(pkg, sel) => {
                self.ident(pkg, false);
                self.ident(sel, false);
            }
            TypeExprKind::Pointer(inner)
            | TypeExprKind::Slice(inner)
            | TypeExprKind::Ellipsis(inner)
            | TypeExprKind::Chan { elem: inner, .. } => self.type_expr(inner),
            TypeExprKind::Map { key, value } => {
                self.type_expr(key);
                self.type_expr(value);
            }
            TypeExprKind::Func(sig) => self.signature(sig),
            TypeExprKind::Struct(fields) => {
                for field in fields {
                    self.field(field);
                }
            }
            TypeExprKind::Interface(methods) => {
                for method in methods {
                    self.ident(&method.name, false);
                    self.signature(&method.sig);
                }
            }
        }
    }

    fn var_spec(&mut self, spec: &VarSpec) {
        for name in &spec.names {
            self.ident(name, false);
        }
        if let Some(ty) = &spec.ty {
            self.type_expr(ty);
        }
        for value in &spec.values {
            self.expr(value);
        }
    }

    fn block(&mut self, block: &Block) {
        self.stmts(&block.stmts);
    }

    fn stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Var(specs) | StmtKind::Const(specs) => {
                for spec in specs {
                    self.var_spec(spec);
                }
            }
            StmtKind::ShortVar { lhs, rhs } => {
                for id in lhs {
                    self.ident(id, true);
                }
                for e in rhs {
                    self.expr(e);
                }
            }
            StmtKind::Assign { lhs, rhs, .. } => {
                for target in lhs {
                    match &target.kind {
                        ExprKind::Ident(id) => self.ident(id, true),
                        _ => self.expr(target),
                    }
                }
                for e in rhs {
                    self.expr(e);
                }
            }
            StmtKind::IncDec { expr, .. } => self.expr(expr),
            StmtKind::Send { chan, value } => {
                self.expr(chan);
                self.expr(value);
            }
            StmtKind::Expr(e) | StmtKind::Go(e) | StmtKind::Defer(e) => self.expr(e),
            StmtKind::Return(values) => {
                for e in values {
                    self.expr(e);
                }
            }
            StmtKind::Block(block) => self.block(block),
            StmtKind::If(ifs) => {
                if let Some(init) = &ifs.init {
                    self.stmt(init);
                }
                self.expr(&ifs.cond);
                self.block(&ifs.then);
                if let Some(els) = &ifs.els {
                    self.stmt(els);
                }
            }
            StmtKind::For(f) => {
                if let Some(init) = &f.init {
                    self.stmt(init);
                }
                if let Some(cond) = &f.cond {
                    self.expr(cond);
                }
                if let Some(post) = &f.post {
                    self.stmt(post);
                }
                self.block(&f.body);
            }
            // `for k, v = range` re-binds without being an assignment event.
            StmtKind::Range(r) => {
                for target in r.key.iter().chain(&r.value) {
                    self.expr(target);
                }
                self.expr(&r.expr);
                self.block(&r.body);
            }
            StmtKind::Switch(sw) => {
                if let Some(init) = &sw.init {
                    self.stmt(init);
                }
                match &sw.kind {
                    SwitchKind::Expr(tag) => {
                        if let Some(tag) = tag {
                            self.expr(tag);
                        }
                    }
                    SwitchKind::Type { bind, subject } => {
                        if let Some(bind) = bind {
                            self.ident(bind, false);
                        }
                        self.expr(subject);
                    }
                }
                for clause in &sw.clauses {
                    for e in clause.exprs.iter().flatten() {
                        self.expr(e);
                    }
                    self.stmts(&clause.body);
                }
            }
            StmtKind::Select(clauses) => {
                for clause in clauses {
                    if let Some(comm) = &clause.comm {
                        self.stmt(comm);
                    }
                    self.stmts(&clause.body);
                }
            }
            StmtKind::Break | StmtKind::Continue | StmtKind::Fallthrough => {}
        }
    }

    fn expr(&mut self, e: &Expr) {
        match &e.kind {
            ExprKind::Ident(id) => self.ident(id, false),
            ExprKind::Int | ExprKind::Float | ExprKind::Char | ExprKind::Str(_) => {}
            ExprKind::Selector(base, sel) => {
                self.expr(base);
                self.ident(sel, false);
            }
            ExprKind::Call { callee, args, .. } => {
                self.expr(callee);
                for arg in args {
                    self.expr(arg);
                }
            }
            ExprKind::Index(base, index) => {
                self.expr(base);
                self.expr(index);
            }
            ExprKind::SliceExpr { base, lo, hi } => {
                self.expr(base);
                for bound in [lo, hi].into_iter().flatten() {
                    self.expr(bound);
                }
            }
            ExprKind::TypeAssert(inner, ty) => {
                self.expr(inner);
                if let Some(ty) = ty {
                    self.type_expr(ty);
                }
            }
            ExprKind::CompositeLit { ty, elems } => {
                if let Some(ty) = ty {
                    self.type_expr(ty);
                }
                for el in elems {
                    if let Some(key) = &el.key {
                        self.expr(key);
                    }
                    self.expr(&el.value);
                }
            }
            ExprKind::Type(ty) => self.type_expr(ty),
            ExprKind::Unary(_, inner) | ExprKind::Paren(inner) => self.expr(inner),
            ExprKind::Binary(_, lhs, rhs) => {
                self.expr(lhs);
                self.expr(rhs);
            }
            ExprKind::FuncLit(sig, body) => {
                self.signature(sig);
                self.block(body);
            }
        }
    }
}
