// AST node types for Go source files.
//
// Covers the Go subset accepted by the parser. Every node carries a
// `SimpleSpan` (byte offsets into its own file) for positions in downstream
// phases; pairing a span with the file's `FileId` yields a program-order `Pos`.
//
// Preconditions: produced by the parser from a valid or partially-valid token stream.
// Postconditions: each node's span covers the source range of the construct.
// Failure modes: none (data-only module).
// Side effects: none.

use chumsky::span::SimpleSpan;

/// Byte-offset span (alias for chumsky's `SimpleSpan`).
pub type Span = SimpleSpan;

// ── Root ──

/// One parsed `.go` file.
#[derive(Debug, Clone, PartialEq)]
pub struct File {
    pub package: Ident,
    pub imports: Vec<ImportSpec>,
    pub decls: Vec<Decl>,
    pub span: Span,
}

/// `import [name] "path"`
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSpec {
    pub name: Option<Ident>,
    pub path: String,
    pub path_span: Span,
}

// ── Declarations ──

#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Func(FuncDecl),
    Type(TypeSpec),
    Var(VarSpec),
    Const(VarSpec),
}

/// `func [(recv)] Name(params) results [body]`
///
/// Stub files omit the body.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    pub recv: Option<Field>,
    pub name: Ident,
    pub sig: Signature,
    pub body: Option<Block>,
    pub span: Span,
}

/// `type Name Type` or `type Name = Type`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSpec {
    pub name: Ident,
    pub alias: bool,
    pub ty: TypeExpr,
    pub span: Span,
}

/// `var a, b T = x, y` (type and values are each optional, not both), or a
/// `const` spec. A constant spec inside a group that omits its values
/// repeats the type and values of the previous spec.
#[derive(Debug, Clone, PartialEq)]
pub struct VarSpec {
    pub names: Vec<Ident>,
    pub ty: Option<TypeExpr>,
    pub values: Vec<Expr>,
    pub span: Span,
}

/// Parameter and result lists of a function or function type.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub params: Vec<Field>,
    pub results: Vec<Field>,
    pub span: Span,
}

impl Signature {
    /// Whether the last parameter is declared `...T`.
    pub fn is_variadic(&self) -> bool {
        self.params
            .last()
            .is_some_and(|f| matches!(f.ty.kind, TypeExprKind::Ellipsis(_)))
    }
}

/// A parameter, result, receiver or struct field group: `a, b T` or just `T`.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub names: Vec<Ident>,
    pub ty: TypeExpr,
}

/// A method specification inside `interface { ... }`.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSpec {
    pub name: Ident,
    pub sig: Signature,
}

// ── Types ──

#[derive(Debug, Clone, PartialEq)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExprKind {
    /// `T`
    Name(Ident),
    /// `pkg.T`
    Qualified(Ident, Ident),
    /// `*T`
    Pointer(Box<TypeExpr>),
    /// `[]T`
    Slice(Box<TypeExpr>),
    /// `map[K]V`
    Map { key: Box<TypeExpr>, value: Box<TypeExpr> },
    /// `chan T` (`recv_only == false`) or `<-chan T`
    Chan { recv_only: bool, elem: Box<TypeExpr> },
    /// `func(params) results`
    Func(Signature),
    /// `struct { fields }`
    Struct(Vec<Field>),
    /// `interface { methods }`
    Interface(Vec<MethodSpec>),
    /// `...T` (last parameter only)
    Ellipsis(Box<TypeExpr>),
}

// ── Statements ──

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `var x T` or a parenthesized group.
    Var(Vec<VarSpec>),
    Const(Vec<VarSpec>),
    /// `a, b := x, y`
    ShortVar { lhs: Vec<Ident>, rhs: Vec<Expr> },
    /// `a, b = x, y` or `a op= x`
    Assign {
        lhs: Vec<Expr>,
        op: AssignOp,
        rhs: Vec<Expr>,
    },
    IncDec { expr: Expr, inc: bool },
    Expr(Expr),
    /// `ch <- value`
    Send { chan: Expr, value: Expr },
    Go(Expr),
    Defer(Expr),
    Return(Vec<Expr>),
    Block(Block),
    If(IfStmt),
    For(ForStmt),
    Range(RangeStmt),
    Switch(SwitchStmt),
    Select(Vec<CommClause>),
    Break,
    Continue,
    Fallthrough,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
}

/// `if [init;] cond { then } [else ...]`
#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub init: Option<Box<Stmt>>,
    pub cond: Expr,
    pub then: Block,
    pub els: Option<Box<Stmt>>,
}

/// `for [init]; [cond]; [post] { body }`, `for cond { body }` or `for { body }`
#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub init: Option<Box<Stmt>>,
    pub cond: Option<Expr>,
    pub post: Option<Box<Stmt>>,
    pub body: Block,
}

/// `for [key [, value] (:= | =)] range expr { body }`
#[derive(Debug, Clone, PartialEq)]
pub struct RangeStmt {
    pub key: Option<Expr>,
    pub value: Option<Expr>,
    /// `:=` declares `key` and `value`; both are identifiers then.
    pub define: bool,
    pub expr: Expr,
    pub body: Block,
}

/// `switch [init;] [tag] { clauses }`
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchStmt {
    pub init: Option<Box<Stmt>>,
    pub kind: SwitchKind,
    pub clauses: Vec<CaseClause>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SwitchKind {
    /// Expression switch; no tag means `switch true`.
    Expr(Option<Expr>),
    /// `switch [bind :=] subject.(type)`. Case lists hold types and `nil`.
    Type { bind: Option<Ident>, subject: Expr },
}

/// `case a, b: stmts` or `default: stmts` (`exprs == None`).
#[derive(Debug, Clone, PartialEq)]
pub struct CaseClause {
    pub exprs: Option<Vec<Expr>>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// `case <send or receive>: stmts` or `default: stmts` (`comm == None`).
#[derive(Debug, Clone, PartialEq)]
pub struct CommClause {
    pub comm: Option<Box<Stmt>>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

// ── Expressions ──

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Ident(Ident),
    Int,
    Float,
    Char,
    Str(String),
    /// `x.sel`
    Selector(Box<Expr>, Ident),
    /// `f(args)`; `spread` when the last argument is written `xs...`
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        spread: bool,
    },
    /// `x[i]`
    Index(Box<Expr>, Box<Expr>),
    /// `x[lo:hi]`
    SliceExpr {
        base: Box<Expr>,
        lo: Option<Box<Expr>>,
        hi: Option<Box<Expr>>,
    },
    /// `x.(T)`, or `x.(type)` (`None`) in a type switch guard
    TypeAssert(Box<Expr>, Option<TypeExpr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Paren(Box<Expr>),
    /// `func(params) results { body }`
    FuncLit(Signature, Block),
    /// `T{elems}`; the type is elided for nested literals such as the
    /// inner `{1, 2}` of `[]Point{{1, 2}}`.
    CompositeLit {
        ty: Option<TypeExpr>,
        elems: Vec<Element>,
    },
    /// A type in operand position: `[]byte(s)`, `make(map[string]int)`.
    Type(TypeExpr),
}

/// `[key:] value` in a composite literal.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub key: Option<Expr>,
    pub value: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
    Deref,
    Addr,
    Recv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Mul,
    Div,
    Rem,
    Add,
    Sub,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        };
        f.write_str(s)
    }
}

// ── Identifier ──

/// An identifier with its source text and span.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn is_blank(&self) -> bool {
        self.name == "_"
    }
}
