// types.rs — Type table for one checking session
//
// Unnamed (structural) types are hash-consed so that structurally identical
// types share one `TypeId`; every named type declaration allocates a fresh
// `NamedId` and its own `TypeId`. Type identity is therefore `TypeId`
// equality, which is the comparison the context-overwrite analysis relies on.
//
// Preconditions: named types have their underlying type set before their
//                values are checked.
// Postconditions: `intern` is idempotent for equal `TypeKind`s.
// Failure modes: none; unresolved named types report as `invalid type`.
// Side effects: none.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::id::{next_raw, NamedId, ObjId, TypeId};

// ── Basic types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicKind {
    Invalid,
    Bool,
    Int,
    Int32,
    Int64,
    Uint8,
    Float64,
    String,
    UntypedBool,
    UntypedInt,
    UntypedRune,
    UntypedFloat,
    UntypedString,
    UntypedNil,
}

const ALL_BASIC: [BasicKind; 14] = [
    BasicKind::Invalid,
    BasicKind::Bool,
    BasicKind::Int,
    BasicKind::Int32,
    BasicKind::Int64,
    BasicKind::Uint8,
    BasicKind::Float64,
    BasicKind::String,
    BasicKind::UntypedBool,
    BasicKind::UntypedInt,
    BasicKind::UntypedRune,
    BasicKind::UntypedFloat,
    BasicKind::UntypedString,
    BasicKind::UntypedNil,
];

impl BasicKind {
    pub fn name(self) -> &'static str {
        match self {
            BasicKind::Invalid => "invalid type",
            BasicKind::Bool => "bool",
            BasicKind::Int => "int",
            BasicKind::Int32 => "int32",
            BasicKind::Int64 => "int64",
            BasicKind::Uint8 => "uint8",
            BasicKind::Float64 => "float64",
            BasicKind::String => "string",
            BasicKind::UntypedBool => "untyped bool",
            BasicKind::UntypedInt => "untyped int",
            BasicKind::UntypedRune => "untyped rune",
            BasicKind::UntypedFloat => "untyped float",
            BasicKind::UntypedString => "untyped string",
            BasicKind::UntypedNil => "untyped nil",
        }
    }

    pub fn is_untyped(self) -> bool {
        matches!(
            self,
            BasicKind::UntypedBool
                | BasicKind::UntypedInt
                | BasicKind::UntypedRune
                | BasicKind::UntypedFloat
                | BasicKind::UntypedString
                | BasicKind::UntypedNil
        )
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            BasicKind::Int
                | BasicKind::Int32
                | BasicKind::Int64
                | BasicKind::Uint8
                | BasicKind::UntypedInt
                | BasicKind::UntypedRune
        )
    }

    pub fn is_numeric(self) -> bool {
        self.is_integer() || matches!(self, BasicKind::Float64 | BasicKind::UntypedFloat)
    }

    pub fn is_string(self) -> bool {
        matches!(self, BasicKind::String | BasicKind::UntypedString)
    }

    pub fn is_boolean(self) -> bool {
        matches!(self, BasicKind::Bool | BasicKind::UntypedBool)
    }

    /// Rank used to combine two untyped numeric constants (`1 + 2.5` is float).
    fn untyped_rank(self) -> u8 {
        match self {
            BasicKind::UntypedInt => 1,
            BasicKind::UntypedRune => 2,
            BasicKind::UntypedFloat => 3,
            _ => 0,
        }
    }
}

// ── Type descriptors ────────────────────────────────────────────────────────

/// Parameter and result types of a function. A variadic function's last
/// parameter type is the slice type `[]T`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FuncSig {
    pub params: Vec<TypeId>,
    pub results: Vec<TypeId>,
    pub variadic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Basic(BasicKind),
    Named(NamedId),
    Pointer(TypeId),
    Slice(TypeId),
    Map { key: TypeId, value: TypeId },
    Chan { recv_only: bool, elem: TypeId },
    Func(FuncSig),
    /// Fields in declaration order.
    Struct(Vec<(String, TypeId)>),
    /// Methods sorted by name; each type is a `Func` signature.
    Interface(Vec<(String, TypeId)>),
    /// Result list of a multi-value call.
    Tuple(Vec<TypeId>),
}

/// A method declared on a named type.
#[derive(Debug, Clone)]
pub struct Method {
    pub name: String,
    pub obj: ObjId,
    pub sig: TypeId,
    pub pointer_recv: bool,
}

/// Declaration record of a named type.
#[derive(Debug, Clone)]
pub struct NamedInfo {
    pub name: String,
    /// Package name used when printing (`context.Context`); empty for
    /// predeclared types.
    pub pkg: String,
    pub underlying: Option<TypeId>,
    pub methods: Vec<Method>,
    /// Field or interface-method objects declared by the type's own literal.
    pub members: Vec<(String, ObjId)>,
}

// ── Type table ──────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct TypeTable {
    kinds: Vec<TypeKind>,
    interned: HashMap<TypeKind, TypeId>,
    named: Vec<NamedInfo>,
    basics: Vec<TypeId>,
    error: TypeId,
    empty_interface: TypeId,
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeTable {
    pub fn new() -> Self {
        let mut table = TypeTable {
            kinds: Vec::new(),
            interned: HashMap::new(),
            named: Vec::new(),
            basics: Vec::new(),
            error: TypeId(0),
            empty_interface: TypeId(0),
        };
        for kind in ALL_BASIC {
            let id = table.intern(TypeKind::Basic(kind));
            table.basics.push(id);
        }
        table.empty_interface = table.intern(TypeKind::Interface(Vec::new()));

        // type error interface { Error() string }
        let string = table.basic(BasicKind::String);
        let error_sig = table.intern(TypeKind::Func(FuncSig {
            params: Vec::new(),
            results: vec![string],
            variadic: false,
        }));
        let error_iface = table.intern(TypeKind::Interface(vec![("Error".to_string(), error_sig)]));
        table.error = table.new_named("error", "");
        table.set_underlying(table.error, error_iface);
        table
    }

    /// Return the id of a structural type, allocating it on first use.
    pub fn intern(&mut self, kind: TypeKind) -> TypeId {
        if let Some(&id) = self.interned.get(&kind) {
            return id;
        }
        let id = TypeId(next_raw(self.kinds.len()));
        self.kinds.push(kind.clone());
        self.interned.insert(kind, id);
        id
    }

    pub fn kind(&self, t: TypeId) -> &TypeKind {
        &self.kinds[t.index()]
    }

    pub fn basic(&self, kind: BasicKind) -> TypeId {
        self.basics[kind as usize]
    }

    pub fn invalid(&self) -> TypeId {
        self.basic(BasicKind::Invalid)
    }

    pub fn error_type(&self) -> TypeId {
        self.error
    }

    pub fn empty_interface(&self) -> TypeId {
        self.empty_interface
    }

    // ── Named types ──

    /// Declare a new named type. Its underlying type is set later.
    pub fn new_named(&mut self, name: &str, pkg: &str) -> TypeId {
        let named = NamedId(next_raw(self.named.len()));
        self.named.push(NamedInfo {
            name: name.to_string(),
            pkg: pkg.to_string(),
            underlying: None,
            methods: Vec::new(),
            members: Vec::new(),
        });
        self.intern(TypeKind::Named(named))
    }

    pub fn as_named(&self, t: TypeId) -> Option<NamedId> {
        match self.kind(t) {
            TypeKind::Named(n) => Some(*n),
            _ => None,
        }
    }

    pub fn named(&self, id: NamedId) -> &NamedInfo {
        &self.named[id.index()]
    }

    pub fn named_mut(&mut self, id: NamedId) -> &mut NamedInfo {
        &mut self.named[id.index()]
    }

    /// Set the underlying type of named type `t`. The stored underlying type
    /// is never itself a named type.
    pub fn set_underlying(&mut self, t: TypeId, underlying: TypeId) {
        let underlying = self.underlying(underlying);
        if let Some(n) = self.as_named(t) {
            self.named[n.index()].underlying = Some(underlying);
        }
    }

    pub fn underlying(&self, t: TypeId) -> TypeId {
        match self.kind(t) {
            TypeKind::Named(n) => self.named[n.index()]
                .underlying
                .unwrap_or_else(|| self.invalid()),
            _ => t,
        }
    }

    /// Named and typed predeclared types count as "named" for assignability.
    pub fn is_named(&self, t: TypeId) -> bool {
        match self.kind(t) {
            TypeKind::Named(_) => true,
            TypeKind::Basic(k) => !k.is_untyped() && *k != BasicKind::Invalid,
            _ => false,
        }
    }

    // ── Classification ──

    pub fn basic_kind(&self, t: TypeId) -> Option<BasicKind> {
        match self.kind(self.underlying(t)) {
            TypeKind::Basic(k) => Some(*k),
            _ => None,
        }
    }

    pub fn is_invalid(&self, t: TypeId) -> bool {
        self.basic_kind(t) == Some(BasicKind::Invalid)
    }

    pub fn is_untyped(&self, t: TypeId) -> bool {
        self.basic_kind(t).is_some_and(BasicKind::is_untyped)
    }

    pub fn is_numeric(&self, t: TypeId) -> bool {
        self.basic_kind(t).is_some_and(BasicKind::is_numeric)
    }

    pub fn is_integer(&self, t: TypeId) -> bool {
        self.basic_kind(t).is_some_and(BasicKind::is_integer)
    }

    pub fn is_string(&self, t: TypeId) -> bool {
        self.basic_kind(t).is_some_and(BasicKind::is_string)
    }

    pub fn is_boolean(&self, t: TypeId) -> bool {
        self.basic_kind(t).is_some_and(BasicKind::is_boolean)
    }

    pub fn func_sig(&self, t: TypeId) -> Option<&FuncSig> {
        match self.kind(self.underlying(t)) {
            TypeKind::Func(sig) => Some(sig),
            _ => None,
        }
    }

    pub fn interface_methods(&self, t: TypeId) -> Option<&[(String, TypeId)]> {
        match self.kind(self.underlying(t)) {
            TypeKind::Interface(methods) => Some(methods),
            _ => None,
        }
    }

    /// Default type of an untyped constant; `None` for untyped nil.
    pub fn default_type(&self, t: TypeId) -> Option<TypeId> {
        let kind = match self.kind(t) {
            TypeKind::Basic(k) => *k,
            _ => return Some(t),
        };
        let typed = match kind {
            BasicKind::UntypedBool => BasicKind::Bool,
            BasicKind::UntypedInt => BasicKind::Int,
            BasicKind::UntypedRune => BasicKind::Int32,
            BasicKind::UntypedFloat => BasicKind::Float64,
            BasicKind::UntypedString => BasicKind::String,
            BasicKind::UntypedNil => return None,
            _ => return Some(t),
        };
        Some(self.basic(typed))
    }

    /// Result type of combining two untyped constants of numeric kind.
    pub fn untyped_join(&self, a: TypeId, b: TypeId) -> TypeId {
        match (self.kind(a), self.kind(b)) {
            (TypeKind::Basic(x), TypeKind::Basic(y)) if x.untyped_rank() >= y.untyped_rank() => a,
            _ => b,
        }
    }

    // ── Method sets and assignability ──

    /// Signature of method `name` in the method set of `t`.
    ///
    /// Values of a named type `T` carry the methods with value receivers;
    /// `*T` carries all methods of `T`.
    pub fn method_set_lookup(&self, t: TypeId, name: &str) -> Option<TypeId> {
        if let Some(methods) = self.interface_methods(t) {
            return methods.iter().find(|(n, _)| n == name).map(|(_, sig)| *sig);
        }
        match self.kind(t) {
            TypeKind::Named(n) => self.named[n.index()]
                .methods
                .iter()
                .find(|m| m.name == name && !m.pointer_recv)
                .map(|m| m.sig),
            TypeKind::Pointer(base) => match self.kind(*base) {
                TypeKind::Named(n) => self.named[n.index()]
                    .methods
                    .iter()
                    .find(|m| m.name == name)
                    .map(|m| m.sig),
                _ => None,
            },
            _ => None,
        }
    }

    /// Whether `t` implements interface type `iface`.
    pub fn implements(&self, t: TypeId, iface: TypeId) -> bool {
        let Some(methods) = self.interface_methods(iface) else {
            return false;
        };
        methods
            .iter()
            .all(|(name, sig)| self.method_set_lookup(t, name) == Some(*sig))
    }

    /// Whether an untyped constant of kind `from` can become a value of the
    /// basic type `to`.
    fn representable(from: BasicKind, to: BasicKind) -> bool {
        match from {
            BasicKind::UntypedBool => to == BasicKind::Bool,
            BasicKind::UntypedInt | BasicKind::UntypedRune => to.is_numeric() && !to.is_untyped(),
            BasicKind::UntypedFloat => to == BasicKind::Float64,
            BasicKind::UntypedString => to == BasicKind::String,
            _ => false,
        }
    }

    /// Whether a value of type `v` may be assigned to a variable of type `t`.
    pub fn assignable(&self, v: TypeId, t: TypeId) -> bool {
        if v == t || self.is_invalid(v) || self.is_invalid(t) {
            return true;
        }
        let tu = self.underlying(t);

        if let TypeKind::Basic(vb) = self.kind(v) {
            if vb.is_untyped() {
                return match (vb, self.kind(tu)) {
                    (BasicKind::UntypedNil, kind) => matches!(
                        kind,
                        TypeKind::Pointer(_)
                            | TypeKind::Slice(_)
                            | TypeKind::Map { .. }
                            | TypeKind::Func(_)
                            | TypeKind::Interface(_)
                            | TypeKind::Chan { .. }
                    ),
                    (_, TypeKind::Interface(_)) => self
                        .default_type(v)
                        .is_some_and(|d| self.implements(d, t)),
                    (_, TypeKind::Basic(tb)) => Self::representable(*vb, *tb),
                    _ => false,
                };
            }
        }

        let vu = self.underlying(v);
        let one_unnamed = !self.is_named(v) || !self.is_named(t);
        if vu == tu && one_unnamed {
            return true;
        }
        if let TypeKind::Interface(_) = self.kind(tu) {
            return self.implements(v, t);
        }
        if let (
            TypeKind::Chan {
                recv_only: false,
                elem: ve,
            },
            TypeKind::Chan { elem: te, .. },
        ) = (self.kind(vu), self.kind(tu))
        {
            return ve == te && one_unnamed;
        }
        false
    }

    // ── Printing ──

    pub fn display(&self, t: TypeId) -> String {
        let mut out = String::new();
        self.write_type(&mut out, t);
        out
    }

    fn write_type(&self, out: &mut String, t: TypeId) {
        match self.kind(t) {
            TypeKind::Basic(k) => out.push_str(k.name()),
            TypeKind::Named(n) => {
                let info = &self.named[n.index()];
                if !info.pkg.is_empty() {
                    out.push_str(&info.pkg);
                    out.push('.');
                }
                out.push_str(&info.name);
            }
            TypeKind::Pointer(base) => {
                out.push('*');
                self.write_type(out, *base);
            }
            TypeKind::Slice(elem) => {
                out.push_str("[]");
                self.write_type(out, *elem);
            }
            TypeKind::Map { key, value } => {
                out.push_str("map[");
                self.write_type(out, *key);
                out.push(']');
                self.write_type(out, *value);
            }
            TypeKind::Chan { recv_only, elem } => {
                out.push_str(if *recv_only { "<-chan " } else { "chan " });
                self.write_type(out, *elem);
            }
            TypeKind::Func(sig) => {
                out.push_str("func");
                self.write_sig(out, sig);
            }
            TypeKind::Struct(fields) => {
                out.push_str("struct{");
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str("; ");
                    }
                    let _ = write!(out, "{name} ");
                    self.write_type(out, *ty);
                }
                out.push('}');
            }
            TypeKind::Interface(methods) => {
                out.push_str("interface{");
                for (i, (name, sig)) in methods.iter().enumerate() {
                    if i > 0 {
                        out.push_str("; ");
                    }
                    out.push_str(name);
                    if let TypeKind::Func(sig) = self.kind(*sig) {
                        self.write_sig(out, sig);
                    }
                }
                out.push('}');
            }
            TypeKind::Tuple(items) => {
                out.push('(');
                self.write_list(out, items, false);
                out.push(')');
            }
        }
    }

    fn write_sig(&self, out: &mut String, sig: &FuncSig) {
        out.push('(');
        self.write_list(out, &sig.params, sig.variadic);
        out.push(')');
        match sig.results.as_slice() {
            [] => {}
            [single] => {
                out.push(' ');
                self.write_type(out, *single);
            }
            many => {
                out.push_str(" (");
                self.write_list(out, many, false);
                out.push(')');
            }
        }
    }

    fn write_list(&self, out: &mut String, items: &[TypeId], variadic: bool) {
        for (i, ty) in items.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let last = i + 1 == items.len();
            match self.kind(*ty) {
                TypeKind::Slice(elem) if variadic && last => {
                    out.push_str("...");
                    self.write_type(out, *elem);
                }
                _ => self.write_type(out, *ty),
            }
        }
    }
}
