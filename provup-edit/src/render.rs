//! Text generation for requirement entries and freshly created blocks.
//!
//! Fragments are rendered as text at the indentation of their destination and parsed back, so
//! the resulting nodes carry exactly the whitespace and comments they will be written with.

use crate::error::{EditError, EditResult};
use hcl_edit::structure::{Attribute, Block, Structure};
use provup_types::RequirementFact;

/// Explanatory comment written inside entries without a source address.
pub fn no_source_comment(name: &str) -> String {
    format!(
        "# TF-UPGRADE-TODO
#
# No source detected for this provider. You must add a source address
# in the following format:
#
# source = \"your.domain.com/organization/{name}\"
#
# For more information, see the provider source documentation:
#
# https://www.terraform.io/docs/configuration/providers.html#provider-source"
    )
}

/// Renders `name = { ... }` for one fact, every line prefixed by `indent` and the object's
/// contents nested one `step` deeper.
pub fn render_entry(fact: &RequirementFact, indent: &str, step: &str) -> String {
    let inner = format!("{indent}{step}");
    let mut out = format!("{indent}{} = {{\n", fact.name);

    let source = fact.provenance.source().map(|addr| addr.to_string());
    if source.is_none() {
        for line in no_source_comment(&fact.name).lines() {
            out.push_str(&inner);
            out.push_str(line);
            out.push('\n');
        }
    }

    match (source.as_deref(), fact.version_constraint()) {
        (Some(source), Some(version)) => {
            out.push_str(&format!("{inner}source  = {}\n", quote(source)));
            out.push_str(&format!("{inner}version = {}\n", quote(version)));
        }
        (Some(source), None) => out.push_str(&format!("{inner}source = {}\n", quote(source))),
        (None, Some(version)) => out.push_str(&format!("{inner}version = {}\n", quote(version))),
        (None, None) => {}
    }

    out.push_str(indent);
    out.push_str("}\n");
    out
}

/// Parses a rendered entry into an attribute node.
pub fn entry_attribute(
    fact: &RequirementFact,
    indent: &str,
    step: &str,
) -> EditResult<Attribute> {
    let text = render_entry(fact, indent, step);
    parse_single(&fact.name, &text)?
        .into_attribute()
        .map_err(|_| EditError::Render {
            name: fact.name.clone(),
            message: "rendered entry is not an attribute".to_string(),
        })
}

/// An empty multi-line block `<ident> {\n<indent>}` whose own line starts with `indent`.
pub fn empty_block(ident: &str, indent: &str) -> EditResult<Block> {
    let text = format!("{indent}{ident} {{\n{indent}}}\n");
    parse_single(ident, &text)?
        .into_block()
        .map_err(|_| EditError::Render {
            name: ident.to_string(),
            message: "rendered block is not a block".to_string(),
        })
}

fn parse_single(name: &str, text: &str) -> EditResult<Structure> {
    let mut body = hcl_edit::parser::parse_body(text).map_err(|err| EditError::Render {
        name: name.to_string(),
        message: err.message().to_string(),
    })?;
    if body.len() != 1 {
        return Err(EditError::Render {
            name: name.to_string(),
            message: format!("expected one structure, got {}", body.len()),
        });
    }
    Ok(body.remove(0))
}

/// Quotes a string literal, escaping template sequences so the value is written verbatim.
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    let mut chars = value.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' | '%' if chars.peek() == Some(&'{') => {
                out.push(ch);
                out.push(ch);
            }
            ch => out.push(ch),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use provup_types::{ProviderAddr, Provenance};

    fn fact(name: &str, provenance: Provenance, version: Option<&str>) -> RequirementFact {
        RequirementFact {
            name: name.to_string(),
            provenance,
            version: version.map(str::to_string),
            origin: None,
        }
    }

    #[test]
    fn aligns_source_and_version() {
        let f = fact(
            "aws",
            Provenance::Resolved(ProviderAddr::default_for("aws")),
            Some("~> 2.0"),
        );
        assert_eq!(
            render_entry(&f, "    ", "  "),
            "    aws = {\n      source  = \"hashicorp/aws\"\n      version = \"~> 2.0\"\n    }\n"
        );
    }

    #[test]
    fn source_only_has_single_space() {
        let f = fact(
            "acme",
            Provenance::Declared(ProviderAddr::new("example.com", "acme", "acme")),
            None,
        );
        assert_eq!(
            render_entry(&f, "", "  "),
            "acme = {\n  source = \"example.com/acme/acme\"\n}\n"
        );
    }

    #[test]
    fn nests_with_the_given_step() {
        let f = fact(
            "aws",
            Provenance::Resolved(ProviderAddr::default_for("aws")),
            None,
        );
        assert_eq!(
            render_entry(&f, "        ", "    "),
            "        aws = {\n            source = \"hashicorp/aws\"\n        }\n"
        );
    }

    #[test]
    fn unknown_source_gets_comment_inside_braces() {
        let f = fact("foo", Provenance::NotKnown, None);
        let text = render_entry(&f, "  ", "  ");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "  foo = {");
        assert_eq!(lines[1], "    # TF-UPGRADE-TODO");
        assert_eq!(
            lines[6],
            "    # source = \"your.domain.com/organization/foo\""
        );
        assert_eq!(*lines.last().unwrap(), "  }");
        assert!(!lines.iter().any(|l| l.contains('{') && l.contains('#')));
    }

    #[test]
    fn rendered_entries_parse_back() {
        let f = fact(
            "bar",
            Provenance::Legacy(ProviderAddr::legacy("bar")),
            Some("1.0"),
        );
        let attr = entry_attribute(&f, "    ", "  ").unwrap();
        assert!(attr.has_key("bar"));
        assert!(attr.value.is_object());
    }

    #[test]
    fn invalid_name_is_a_render_error() {
        let f = fact("not valid", Provenance::NotKnown, None);
        assert!(matches!(
            entry_attribute(&f, "", "  "),
            Err(EditError::Render { .. })
        ));
    }

    #[test]
    fn quote_escapes_template_markers() {
        assert_eq!(quote("a\"b"), "\"a\\\"b\"");
        assert_eq!(quote("${x}"), "\"$${x}\"");
        assert_eq!(quote("~> 1.0"), "\"~> 1.0\"");
    }
}
