// resolve.rs — Sentinel type resolution
//
// Looks up the hazard ("sentinel") type by module path and type name in the
// type universe of one checked unit.
//
// Preconditions: `unit` type-checked successfully.
// Postconditions: the returned `TypeId` is comparable with every type in the
//                 unit's binding table.
// Failure modes: `UnresolvedModule`, `UnresolvedType` (per unit).
// Side effects: may import the sentinel module into the unit's session.

use tracing::debug;

use crate::error::UnitError;
use crate::id::TypeId;
use crate::provider::CheckedUnit;

/// Module path and type name designating the sentinel type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentinelSpec {
    pub module: String,
    pub type_name: String,
}

impl Default for SentinelSpec {
    fn default() -> Self {
        SentinelSpec {
            module: "golang.org/x/net/context".to_string(),
            type_name: "Context".to_string(),
        }
    }
}

/// A resolved sentinel type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sentinel {
    pub ty: TypeId,
}

pub fn resolve_sentinel(unit: &mut CheckedUnit, spec: &SentinelSpec) -> Result<Sentinel, UnitError> {
    let ty = unit.resolve_type(&spec.module, &spec.type_name)?;
    debug!(
        unit = %unit.ident,
        module = %spec.module,
        ty = %unit.session.types.display(ty),
        "sentinel resolved"
    );
    Ok(Sentinel { ty })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::Session;
    use crate::modules::ModuleRegistry;
    use std::sync::Arc;

    fn unit(src: &str) -> CheckedUnit {
        let mut session = Session::new(Arc::new(ModuleRegistry::default()));
        let file = session.parse_file("u/a.go", src).expect("parse");
        let package = session
            .check_package(&file.ast.package.name.clone(), std::slice::from_ref(&file))
            .expect("check");
        CheckedUnit {
            ident: "u".to_string(),
            session,
            files: vec![file],
            package,
        }
    }

    #[test]
    fn default_names_the_net_context_type() {
        let mut u = unit("package u\n");
        let sentinel = resolve_sentinel(&mut u, &SentinelSpec::default()).expect("resolves");
        assert_eq!(u.session.types.display(sentinel.ty), "context.Context");
    }

    #[test]
    fn sentinel_matches_type_used_by_unit() {
        let mut u = unit(
            "package u\n\nimport \"context\"\n\nvar root = context.Background()\n",
        );
        let sentinel = resolve_sentinel(&mut u, &SentinelSpec::default()).expect("resolves");
        let root = u
            .session
            .symbols
            .lookup_local(u.package, "root")
            .expect("declared");
        assert_eq!(u.session.symbols.obj(root).ty, sentinel.ty);
    }

    #[test]
    fn missing_type_is_unresolved_type() {
        let mut u = unit("package u\n");
        let spec = SentinelSpec {
            module: "time".into(),
            type_name: "Timer".into(),
        };
        let err = resolve_sentinel(&mut u, &spec).expect_err("no Timer");
        assert_eq!(err.to_string(), "u: module time has no type Timer");
    }

    #[test]
    fn missing_module_is_unresolved_module() {
        let mut u = unit("package u\n");
        let spec = SentinelSpec {
            module: "example.com/ctx".into(),
            type_name: "Context".into(),
        };
        let err = resolve_sentinel(&mut u, &spec).expect_err("no module");
        assert_eq!(
            err.to_string(),
            "u: cannot import sentinel module example.com/ctx: module not found"
        );
    }
}
