use crate::compute::Ledger;
use crate::store::{EntityId, EntitySnapshot, FormulaTerm};
use std::collections::HashMap;
use std::fmt::Write;

/// Renders how an entity's resolved balance is derived, one formula level per line.
///
/// ```text
/// AUDIT TRACE for 'Net Worth':
/// --------------------------------------------------
/// [L1] Net Worth [500.000] = 1×B[250.000] + 1×C[250.000]
///    |--[L2] B [250.000] = 1×A[250.000]
///    |  `--[L3] A [250.000] -> Raw
///    `--[L2] C [250.000] = 1×A[250.000]
///       `--(A -> Ref to L3)
/// ```
pub fn format_trace(snapshot: &EntitySnapshot, ledger: &Ledger, target: EntityId) -> String {
    let mut tracer = Tracer {
        snapshot,
        ledger,
        visited_at_level: HashMap::new(),
        output: String::new(),
    };

    match snapshot.get(target) {
        Some(entity) => {
            let _ = writeln!(tracer.output, "AUDIT TRACE for '{}':", entity.name);
            let _ = writeln!(tracer.output, "--------------------------------------------------");
            tracer.trace_node(target, 1, "");
        }
        None => {
            let _ = writeln!(tracer.output, "Error: Unknown entity {}", target);
        }
    }
    tracer.output
}

struct Tracer<'a> {
    snapshot: &'a EntitySnapshot,
    ledger: &'a Ledger,
    visited_at_level: HashMap<EntityId, usize>,
    output: String,
}

impl<'a> Tracer<'a> {
    fn trace_node(&mut self, id: EntityId, level: usize, prefix: &str) {
        let snapshot = self.snapshot;
        let Some(entity) = snapshot.get(id) else {
            let _ = writeln!(self.output, "{}{} (missing, contributes 0)", prefix, id);
            return;
        };

        if let Some(&first_seen) = self.visited_at_level.get(&id) {
            let _ = writeln!(self.output, "{}({} -> Ref to L{})", prefix, entity.name, first_seen);
            return;
        }
        self.visited_at_level.insert(id, level);

        let mut header = format!("[L{}] {} {}", level, entity.name, self.format_value(id));
        if entity.archived {
            header.push_str(" (archived)");
        }

        if entity.has_formula() {
            let formula_str = self.format_formula(&entity.formula);
            let _ = writeln!(self.output, "{}{} = {}", prefix, header, formula_str);

            // Repeated targets are printed once; the formula line shows every term.
            let mut children: Vec<EntityId> = Vec::with_capacity(entity.formula.len());
            for term in &entity.formula {
                if !children.contains(&term.target) {
                    children.push(term.target);
                }
            }
            self.recurse_children(prefix, &children, level);
        } else if entity.is_calculated {
            let _ = writeln!(self.output, "{}{} = (empty formula)", prefix, header);
        } else {
            let _ = writeln!(self.output, "{}{} -> Raw", prefix, header);
        }
    }

    fn recurse_children(&mut self, prefix: &str, children: &[EntityId], level: usize) {
        let stem = self.build_child_stem(prefix, level);
        for (i, &child) in children.iter().enumerate() {
            let connector = if i == children.len() - 1 { "`--" } else { "|--" };
            let full_prefix = format!("{}{}", stem, connector);
            self.trace_node(child, level + 1, &full_prefix);
        }
    }

    fn format_formula(&self, formula: &[FormulaTerm]) -> String {
        let mut out = String::new();
        for (i, term) in formula.iter().enumerate() {
            let coefficient = if i == 0 {
                format!("{}", term.coefficient)
            } else if term.coefficient < 0.0 {
                out.push_str(" - ");
                format!("{}", -term.coefficient)
            } else {
                out.push_str(" + ");
                format!("{}", term.coefficient)
            };
            let _ = write!(out, "{}×{}", coefficient, self.format_target_ref(term.target));
        }
        out
    }

    fn format_target_ref(&self, id: EntityId) -> String {
        if !self.snapshot.contains(id) {
            return format!("{}(missing)", id);
        }
        format!("{}{}", self.snapshot.name_of(id), self.format_value(id))
    }

    fn format_value(&self, id: EntityId) -> String {
        match self.ledger.get(id) {
            Some(v) if self.ledger.fallbacks().contains(&id) => format!("[{:.3} fallback]", v),
            Some(v) => format!("[{:.3}]", v),
            None => "[?]".to_string(),
        }
    }

    fn build_child_stem(&self, current_prefix: &str, level: usize) -> String {
        if level == 1 {
            return "   ".to_string();
        }
        current_prefix.replace("`--", "   ").replace("|--", "|  ")
    }
}
