use hcl_edit::structure::{Block, Body, Structure};

pub const WRAPPER_BLOCK: &str = "terraform";
pub const REQUIREMENTS_BLOCK: &str = "required_providers";

/// Position of a `required_providers` block: the root structure index of its `terraform`
/// wrapper and the structure index within the wrapper's body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BlockPath {
    pub wrapper: usize,
    pub child: usize,
}

/// All requirement blocks of a document, in document order.
pub fn locate_blocks(body: &Body) -> Vec<BlockPath> {
    let mut found = Vec::new();
    for (wrapper, structure) in body.iter().enumerate() {
        let Some(block) = structure.as_block().filter(|b| b.has_ident(WRAPPER_BLOCK)) else {
            continue;
        };
        for (child, inner) in block.body.iter().enumerate() {
            if inner
                .as_block()
                .is_some_and(|b| b.has_ident(REQUIREMENTS_BLOCK))
            {
                found.push(BlockPath { wrapper, child });
            }
        }
    }
    found
}

/// Root index of the first `terraform` block, if any.
pub fn first_wrapper(body: &Body) -> Option<usize> {
    body.iter()
        .position(|s| s.as_block().is_some_and(|b| b.has_ident(WRAPPER_BLOCK)))
}

pub(crate) fn block_mut(body: &mut Body, index: usize) -> Option<&mut Block> {
    body.get_mut(index).and_then(Structure::as_block_mut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn finds_blocks_in_document_order() {
        let body: Body = r#"resource "a" "b" {}

terraform {
  required_version = ">= 0.12"
  required_providers {}
  backend "local" {}
  required_providers {}
}

terraform {
  required_providers {}
}
"#
        .parse()
        .unwrap();

        assert_eq!(
            locate_blocks(&body),
            vec![
                BlockPath { wrapper: 1, child: 1 },
                BlockPath { wrapper: 1, child: 3 },
                BlockPath { wrapper: 2, child: 0 },
            ]
        );
        assert_eq!(first_wrapper(&body), Some(1));
    }

    #[test]
    fn ignores_nested_lookalikes() {
        let body: Body = r#"module "m" {
  source = "./m"
}

locals {
  required_providers = {}
}
"#
        .parse()
        .unwrap();
        assert!(locate_blocks(&body).is_empty());
        assert_eq!(first_wrapper(&body), None);
    }
}
