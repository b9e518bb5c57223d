//! Linking: turning the module graph into output text.
//!
//! Each module becomes a function keyed by its id inside one `bootstrap`
//! call. Modules render independently (in parallel) and are merged in
//! ascending id order, so output never depends on scheduling.

use super::graph::{ModuleGraph, ModuleId, ModuleRecord};
use super::output::OutputPlan;
use super::runtime;
use super::{CompileOptions, CompileResult};
use crate::log::{Location, Log, Msg, MsgCode};
use rayon::prelude::*;
use std::fmt::Write;
use tsbundle_parser::{Code, Part, Stmt, ValueStmt};

const MODULE_INDENT: &str = "  ";
const BODY_INDENT: &str = "    ";

/// One module's rendered text plus the problems found rendering it.
struct Rendered {
    text: String,
    msgs: Vec<Msg>,
}

impl ModuleGraph {
    /// Render one result per target of `plan`. Performs no I/O and never
    /// mutates the graph.
    ///
    /// Problems go to `log`; rendering continues past them.
    pub fn compile(&self, log: &Log, plan: &OutputPlan, options: &CompileOptions) -> Vec<CompileResult> {
        let needed = self.modules_for(plan, options.bundle);
        let rendered: Vec<(ModuleId, Rendered)> = needed
            .par_iter()
            .filter_map(|&id| self.get(id).map(|module| (id, module)))
            .map(|(id, module)| {
                let rendered = if options.bundle {
                    render_module_function(module)
                } else {
                    render_top_level(module)
                };
                (id, rendered)
            })
            .collect();

        let mut texts: Vec<Option<String>> = vec![None; self.len()];
        for (id, Rendered { text, msgs }) in rendered {
            for msg in msgs {
                log.append(msg);
            }
            texts[id] = Some(text);
        }

        plan.targets()
            .iter()
            .map(|target| {
                let contents = if options.bundle {
                    let functions: Vec<&str> = self
                        .reachable_from(target.entry)
                        .into_iter()
                        .filter_map(|id| texts[id].as_deref())
                        .collect();
                    runtime::assemble(
                        &functions.join(",\n"),
                        target.entry,
                        options.omit_bootstrap_for_tests,
                    )
                } else {
                    texts[target.entry].clone().unwrap_or_default()
                };
                CompileResult {
                    abs_path: target.abs_path.clone(),
                    contents,
                }
            })
            .collect()
    }

    /// Ascending ids of every module some target needs.
    fn modules_for(&self, plan: &OutputPlan, bundle: bool) -> Vec<ModuleId> {
        let mut needed = vec![false; self.len()];
        for target in plan.targets() {
            if bundle {
                for id in self.reachable_from(target.entry) {
                    needed[id] = true;
                }
            } else if let Some(slot) = needed.get_mut(target.entry) {
                *slot = true;
            }
        }
        needed
            .iter()
            .enumerate()
            .filter_map(|(id, &n)| n.then_some(id))
            .collect()
    }
}

/// `  <id>() {\n    // <path>\n    <stmts>\n  }`
fn render_module_function(module: &ModuleRecord) -> Rendered {
    let mut text = format!("{MODULE_INDENT}{}() {{\n{BODY_INDENT}// {}\n", module.id, module.path);
    let msgs = render_stmts(module, BODY_INDENT, &mut text);
    text.push_str(MODULE_INDENT);
    text.push('}');
    Rendered { text, msgs }
}

/// Statements at column zero, for output without the loader.
fn render_top_level(module: &ModuleRecord) -> Rendered {
    let mut text = String::new();
    let msgs = render_stmts(module, "", &mut text);
    Rendered { text, msgs }
}

/// Append each statement on its own line(s), `indent` deep.
///
/// `ElidedEmpty` markers that would end up next to each other in the output
/// collapse into one `;`.
fn render_stmts(module: &ModuleRecord, indent: &str, out: &mut String) -> Vec<Msg> {
    let mut msgs = Vec::new();
    let mut after_empty = false;

    for stmt in &module.stmts {
        match stmt {
            Stmt::ElidedNone => {}
            Stmt::ElidedEmpty => {
                if !after_empty {
                    let _ = writeln!(out, "{indent};");
                }
                after_empty = true;
            }
            Stmt::Value(value) => {
                after_empty = false;
                if let Some(code) = render_code(module, value, &mut msgs) {
                    push_indented(out, &code, indent, value.verbatim_lines);
                }
            }
        }
    }
    msgs
}

/// Substitute loader parts. `None` when the statement cannot be generated.
fn render_code(module: &ModuleRecord, value: &ValueStmt, msgs: &mut Vec<Msg>) -> Option<String> {
    let parts = match &value.code {
        Code::Parts(parts) => parts,
        Code::Unsupported { construct, span } => {
            msgs.push(Msg::error(
                MsgCode::CompileError,
                Some(Location::from_index(&module.path, &module.lines, *span)),
                format!("Code generation for \"{construct}\" is not supported"),
            ));
            return None;
        }
    };

    let mut code = String::new();
    for part in parts {
        match part {
            Part::Text(text) => code.push_str(text),
            Part::SelfId => {
                let _ = write!(code, "{}", module.id);
            }
            Part::Require(index) => {
                let record = module.import_records.get(*index);
                match record.and_then(|r| r.resolved) {
                    Some(id) => {
                        let _ = write!(code, "__require({id})");
                    }
                    None => {
                        if let Some(record) = record {
                            msgs.push(Msg::error(
                                MsgCode::CompileError,
                                Some(Location::from_index(&module.path, &module.lines, record.span)),
                                format!("Import \"{}\" has no resolved module", record.specifier),
                            ));
                        }
                        code.push_str("__require(void 0)");
                    }
                }
            }
        }
    }
    Some(code)
}

/// Indent every line of `code`; with `verbatim_lines` only the first.
fn push_indented(out: &mut String, code: &str, indent: &str, verbatim_lines: bool) {
    for (n, line) in code.split('\n').enumerate() {
        if (n == 0 || !verbatim_lines) && !line.is_empty() {
            out.push_str(indent);
        }
        out.push_str(line);
        out.push('\n');
    }
}
