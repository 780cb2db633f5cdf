//! In-place edits of a parsed document's requirement blocks.

use anyhow::anyhow;
use hcl_edit::structure::{Block, Body, Structure};
use hcl_edit::{Decor, Decorate};
use provup_types::RequirementFact;
use tracing::debug;

use crate::error::EditResult;
use crate::locate::{
    BlockPath, REQUIREMENTS_BLOCK, WRAPPER_BLOCK, block_mut, first_wrapper, locate_blocks,
};
use crate::render::{empty_block, entry_attribute};

const INDENT_STEP: &str = "  ";

/// Consolidates `facts` into the first requirement block of `body` and removes all others.
///
/// Without an existing requirement block, one is appended to the first `terraform` block,
/// which is itself created at the end of the document when missing. Entries are written in
/// name order; an entry that already exists keeps its position and has its value replaced.
pub fn rewrite_requirements(body: &mut Body, facts: &[RequirementFact]) -> EditResult<()> {
    let located = locate_blocks(body);
    let (target, rest) = match located.split_first() {
        Some((first, rest)) => (*first, rest.to_vec()),
        None => (create_target(body)?, Vec::new()),
    };

    write_entries(body, target, facts)?;

    for path in rest.iter().rev() {
        strip_at(body, *path);
    }
    debug!(
        entries = facts.len(),
        stripped = rest.len(),
        "rewrote requirement block"
    );
    Ok(())
}

/// Removes every requirement block, and any `terraform` block left empty by that.
///
/// Returns the number of requirement blocks removed.
pub fn strip_requirements(body: &mut Body) -> usize {
    let located = locate_blocks(body);
    for path in located.iter().rev() {
        strip_at(body, *path);
    }
    located.len()
}

fn create_target(body: &mut Body) -> EditResult<BlockPath> {
    let wrapper = match first_wrapper(body) {
        Some(index) => index,
        None => {
            let mut block = empty_block(WRAPPER_BLOCK, "")?;
            if !body.is_empty() || trailing_comments(body).is_some() {
                block.decor_mut().set_prefix("\n");
            }
            body.set_prefer_omit_trailing_newline(false);
            push_after_comments(body, block);
            if body.decor().suffix().is_some_and(|s| s.trim().is_empty()) {
                body.decor_mut().set_suffix("");
            }
            body.len() - 1
        }
    };

    let parent = block_mut(body, wrapper).ok_or_else(|| anyhow!("no block at index {wrapper}"))?;
    let parent_indent = indent_of(parent.decor());
    ensure_multiline(parent, &parent_indent);
    let indent = parent
        .body
        .iter()
        .next()
        .map(|s| indent_of(s.decor()))
        .filter(|indent| indent.len() > parent_indent.len())
        .unwrap_or_else(|| format!("{parent_indent}{INDENT_STEP}"));
    push_after_comments(&mut parent.body, empty_block(REQUIREMENTS_BLOCK, &indent)?);

    Ok(BlockPath {
        wrapper,
        child: parent.body.len() - 1,
    })
}

fn write_entries(body: &mut Body, target: BlockPath, facts: &[RequirementFact]) -> EditResult<()> {
    let wrapper = block_mut(body, target.wrapper)
        .ok_or_else(|| anyhow!("no wrapper block at {target:?}"))?;
    let wrapper_indent = indent_of(wrapper.decor());
    let block = block_mut(&mut wrapper.body, target.child)
        .ok_or_else(|| anyhow!("no requirement block at {target:?}"))?;

    let block_indent = indent_of(block.decor());
    ensure_multiline(block, &block_indent);
    let first_entry_indent = block
        .body
        .iter()
        .find_map(|s| s.as_attribute())
        .map(|attr| indent_of(attr.decor()));
    let step = match &first_entry_indent {
        Some(entry_indent) => indent_step(&block_indent, entry_indent),
        None => indent_step(&wrapper_indent, &block_indent),
    };
    let entry_indent = first_entry_indent.unwrap_or_else(|| format!("{block_indent}{step}"));

    let mut ordered: Vec<&RequirementFact> = facts.iter().collect();
    ordered.sort_by(|a, b| a.name.cmp(&b.name));

    for fact in ordered {
        if let Some(mut existing) = block.body.get_attribute_mut(&fact.name) {
            let indent = indent_of(existing.decor());
            *existing.value_mut() = entry_attribute(fact, &indent, &step)?.value;
        } else {
            push_after_comments(&mut block.body, entry_attribute(fact, &entry_indent, &step)?);
        }
    }
    Ok(())
}

/// Comment lines at the end of a body, kept in its decor suffix; `None` when it is blank.
fn trailing_comments(body: &Body) -> Option<&str> {
    body.decor()
        .suffix()
        .map(|s| &**s)
        .filter(|s| !s.trim().is_empty())
}

/// Appends `structure` after any trailing comments of `body`.
///
/// The comments move into the new structure's prefix; the body suffix keeps only the
/// whitespace that follows the last comment line.
fn push_after_comments(body: &mut Body, structure: impl Into<Structure>) {
    let mut structure: Structure = structure.into();
    if let Some(suffix) = trailing_comments(body).map(str::to_string) {
        let split = suffix.rfind('\n').map_or(suffix.len(), |i| i + 1);
        let (comments, tail) = suffix.split_at(split);
        let mut prefix = comments.to_string();
        if !prefix.ends_with('\n') {
            prefix.push('\n');
        }
        prefix.push_str(structure.decor().prefix().map_or("", |p| &**p));
        structure.decor_mut().set_prefix(prefix);
        body.decor_mut().set_suffix(tail.to_string());
    }
    body.push(structure);
}

/// The indentation one level adds, given an outer line's indent and an inner one's.
fn indent_step(outer: &str, inner: &str) -> String {
    match inner.strip_prefix(outer) {
        Some(step) if !step.is_empty() => step.to_string(),
        _ => INDENT_STEP.to_string(),
    }
}

fn strip_at(body: &mut Body, path: BlockPath) {
    let Some(wrapper) = block_mut(body, path.wrapper) else {
        return;
    };
    if path.child < wrapper.body.len() {
        remove_structure(&mut wrapper.body, path.child);
    }
    if wrapper.body.is_empty() {
        remove_structure(body, path.wrapper);
    }
}

/// Removes a structure; when it was the first one, blank lines that separated it from its
/// successor are dropped too.
fn remove_structure(body: &mut Body, index: usize) {
    body.remove(index);
    if index != 0 {
        return;
    }
    if let Some(next) = body.get_mut(0) {
        let prefix = next.decor().prefix().map(|p| p.to_string());
        if let Some(prefix) = prefix {
            next.decor_mut().set_prefix(trim_blank_lines(&prefix).to_string());
        }
    }
}

fn trim_blank_lines(mut text: &str) -> &str {
    while let Some((line, rest)) = text.split_once('\n') {
        if !line.trim().is_empty() {
            break;
        }
        text = rest;
    }
    text
}

/// Whitespace between the last line break of a prefix and the structure itself.
fn indent_of(decor: &Decor) -> String {
    let prefix = decor.prefix().map_or("", |p| &**p);
    let last_line = prefix.rsplit('\n').next().unwrap_or("");
    if last_line.chars().all(|c| c == ' ' || c == '\t') {
        last_line.to_string()
    } else {
        String::new()
    }
}

/// Turns `name {}` or `name { a = 1 }` into the multi-line form so entries can be added.
fn ensure_multiline(block: &mut Block, indent: &str) {
    if !block.body.prefer_oneline() {
        return;
    }
    block.body.set_prefer_oneline(false);
    block.body.decor_mut().set_prefix("");
    block.body.decor_mut().set_suffix(indent.to_string());
    let inner = format!("{indent}{INDENT_STEP}");
    for mut structure in block.body.iter_mut() {
        let decor = structure.decor_mut();
        decor.set_prefix(inner.clone());
        decor.set_suffix("");
    }
}
