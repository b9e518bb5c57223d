//! The loader that runs bundled modules.
//!
//! Output is `bootstrap_prologue()` followed by `call_site(...)`. Module
//! bodies reach the loader through three globals the prologue declares:
//! `__require(id)`, `__export(id, getters)` and `__exportStar(id, exports)`.

use super::graph::ModuleId;

const PROLOGUE: &str = r#"let __require, __export, __exportStar;
function bootstrap(modules, entry) {
  const cache = {};
  const started = {};
  const exportsOf = (id) => cache[id] || (cache[id] = {});
  __export = (id, getters) => {
    const target = exportsOf(id);
    for (const name in getters)
      Object.defineProperty(target, name, { get: getters[name], enumerable: true });
  };
  __exportStar = (id, source) => {
    const target = exportsOf(id);
    for (const name in source)
      if (name !== "default" && !Object.prototype.hasOwnProperty.call(target, name))
        Object.defineProperty(target, name, { get: () => source[name], enumerable: true });
  };
  __require = (id) => {
    if (!started[id]) {
      started[id] = true;
      modules[id]();
    }
    return exportsOf(id);
  };
  return __require(entry);
}
"#;

/// The constant loader definition.
#[must_use]
pub fn bootstrap_prologue() -> &'static str {
    PROLOGUE
}

/// `bootstrap({ <modules> }, <entry>);` where `modules` is the already
/// rendered, comma-separated list of module functions.
#[must_use]
pub fn call_site(modules: &str, entry: ModuleId) -> String {
    if modules.is_empty() {
        format!("bootstrap({{}}, {entry});\n")
    } else {
        format!("bootstrap({{\n{modules}\n}}, {entry});\n")
    }
}

/// Complete loader output: prologue (unless omitted) plus call site.
#[must_use]
pub fn assemble(modules: &str, entry: ModuleId, omit_bootstrap: bool) -> String {
    let call = call_site(modules, entry);
    if omit_bootstrap {
        call
    } else {
        format!("{}{call}", bootstrap_prologue())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_site() {
        assert_eq!(
            call_site("  0() {\n    // /entry.ts\n  }", 0),
            "bootstrap({\n  0() {\n    // /entry.ts\n  }\n}, 0);\n"
        );
        assert_eq!(call_site("", 3), "bootstrap({}, 3);\n");
    }

    #[test]
    fn test_assemble_prepends_prologue() {
        let full = assemble("", 0, false);
        assert!(full.starts_with("let __require, __export, __exportStar;\n"));
        assert!(full.ends_with("bootstrap({}, 0);\n"));
        assert_eq!(assemble("", 0, true), "bootstrap({}, 0);\n");
    }

    #[test]
    fn test_prologue_defines_loader_globals() {
        let prologue = bootstrap_prologue();
        for name in ["function bootstrap(", "__require = ", "__export = ", "__exportStar = "] {
            assert!(prologue.contains(name), "missing {name}");
        }
    }
}
