// binding.rs — Objects, lexical scopes and the identifier binding table
//
// Every declared entity (variable, field, type name, function, imported
// package, builtin) is an `Object` in the session's arena, owned by exactly
// one `Scope`. The `BindingTable` maps each identifier occurrence, keyed by
// its program-order position, to the object it resolves to and whether the
// occurrence declares the object or uses it.
//
// Preconditions: scopes are created parent-first.
// Postconditions: every object records the scope it was declared in.
// Failure modes: `declare` reports the existing object on redeclaration.
// Side effects: none.

use std::collections::{BTreeMap, HashMap};

use crate::id::{next_raw, ObjId, ScopeId, TypeId};
use crate::source::Pos;

// ── Objects ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Append,
    Cap,
    Close,
    Delete,
    Len,
    Make,
    New,
    Panic,
    Print,
    Println,
}

impl Builtin {
    pub const ALL: [Builtin; 10] = [
        Builtin::Append,
        Builtin::Cap,
        Builtin::Close,
        Builtin::Delete,
        Builtin::Len,
        Builtin::Make,
        Builtin::New,
        Builtin::Panic,
        Builtin::Print,
        Builtin::Println,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Append => "append",
            Builtin::Cap => "cap",
            Builtin::Close => "close",
            Builtin::Delete => "delete",
            Builtin::Len => "len",
            Builtin::Make => "make",
            Builtin::New => "new",
            Builtin::Panic => "panic",
            Builtin::Print => "print",
            Builtin::Println => "println",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjKind {
    /// Variable, parameter, named result or receiver.
    Var,
    /// Struct field or interface method.
    Field,
    TypeName,
    /// Function or method.
    Func,
    /// Imported package; the scope is the package scope of the module.
    PkgName(ScopeId),
    Builtin(Builtin),
    /// Declared constant, `true`, `false` or `iota`.
    Const,
    Nil,
}

#[derive(Debug, Clone)]
pub struct Object {
    pub name: String,
    pub kind: ObjKind,
    pub ty: TypeId,
    /// Scope the object was declared in.
    pub parent: ScopeId,
    /// Declaring identifier; `None` for predeclared objects.
    pub pos: Option<Pos>,
}

// ── Scopes ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Universe,
    Package,
    File,
    Func,
    Block,
    /// Members of one struct or interface literal.
    Members,
}

#[derive(Debug)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    pub kind: ScopeKind,
    names: HashMap<String, ObjId>,
}

/// Arena of scopes and objects for one checking session.
#[derive(Debug, Default)]
pub struct Symbols {
    scopes: Vec<Scope>,
    objects: Vec<Object>,
}

impl Symbols {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_scope(&mut self, parent: Option<ScopeId>, kind: ScopeKind) -> ScopeId {
        let id = ScopeId(next_raw(self.scopes.len()));
        self.scopes.push(Scope {
            parent,
            kind,
            names: HashMap::new(),
        });
        id
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn obj(&self, id: ObjId) -> &Object {
        &self.objects[id.index()]
    }

    pub fn obj_mut(&mut self, id: ObjId) -> &mut Object {
        &mut self.objects[id.index()]
    }

    /// Allocate an object owned by `parent` without making it visible by name.
    pub fn new_obj(
        &mut self,
        parent: ScopeId,
        name: &str,
        kind: ObjKind,
        ty: TypeId,
        pos: Option<Pos>,
    ) -> ObjId {
        let id = ObjId(next_raw(self.objects.len()));
        self.objects.push(Object {
            name: name.to_string(),
            kind,
            ty,
            parent,
            pos,
        });
        id
    }

    /// Make `obj` visible under its name in its parent scope. Blank names are
    /// never inserted. Returns the previous object on redeclaration.
    pub fn insert(&mut self, obj: ObjId) -> Result<(), ObjId> {
        let object = &self.objects[obj.index()];
        if object.name == "_" {
            return Ok(());
        }
        let scope = &mut self.scopes[object.parent.index()];
        if let Some(&existing) = scope.names.get(&object.name) {
            return Err(existing);
        }
        scope.names.insert(object.name.clone(), obj);
        Ok(())
    }

    /// `new_obj` followed by `insert`.
    pub fn declare(
        &mut self,
        parent: ScopeId,
        name: &str,
        kind: ObjKind,
        ty: TypeId,
        pos: Option<Pos>,
    ) -> Result<ObjId, ObjId> {
        let obj = self.new_obj(parent, name, kind, ty, pos);
        self.insert(obj).map(|()| obj)
    }

    pub fn lookup_local(&self, scope: ScopeId, name: &str) -> Option<ObjId> {
        self.scopes[scope.index()].names.get(name).copied()
    }

    /// Innermost object named `name` visible from `scope`.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<ObjId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(obj) = self.lookup_local(id, name) {
                return Some(obj);
            }
            current = self.scopes[id.index()].parent;
        }
        None
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }
}

// ── Binding table ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The identifier declares the object.
    Def,
    /// The identifier refers to an existing object.
    Use,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub obj: ObjId,
    pub role: Role,
}

/// Identifier position → resolved object, in program order.
#[derive(Debug, Default)]
pub struct BindingTable {
    entries: BTreeMap<Pos, Binding>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, pos: Pos, obj: ObjId, role: Role) {
        self.entries.insert(pos, Binding { obj, role });
    }

    pub fn get(&self, pos: Pos) -> Option<Binding> {
        self.entries.get(&pos).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Pos, Binding)> + '_ {
        self.entries.iter().map(|(p, b)| (*p, *b))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
