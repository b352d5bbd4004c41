// id.rs — Dense arena identifiers shared by the front end and the analysis
//
// Every object, scope, type and source file of a checking session is stored
// in an arena and referred to by one of these newtypes. IDs are allocated in
// source order, so they are stable for identical input.

/// Index of a source file within a session's `SourceMap`.
///
/// Unit files receive the lowest indices (sorted by file name); module stub
/// files are appended as they are imported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

/// Identifier of a lexical scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u32);

/// Identifier of a declared object (variable, field, type name, function...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjId(pub u32);

/// Identifier of an interned type descriptor.
///
/// Two `TypeId`s are equal iff the types are identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

/// Identifier of a named type's declaration record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamedId(pub u32);

impl FileId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl ScopeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl ObjId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl NamedId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Convert an arena length into the next dense id value.
pub(crate) fn next_raw(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}
