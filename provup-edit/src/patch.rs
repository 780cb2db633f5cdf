use std::collections::{BTreeMap, BTreeSet};

use camino::Utf8PathBuf;
use diffy::PatchFormatter;

/// Renders a git-style unified diff of every file whose contents differ.
///
/// Paths present only in `after` are rendered as new files.
pub fn render_patch(
    before: &BTreeMap<Utf8PathBuf, String>,
    after: &BTreeMap<Utf8PathBuf, String>,
) -> String {
    let mut out = String::new();
    let formatter = PatchFormatter::new();
    let paths: BTreeSet<&Utf8PathBuf> = before.keys().chain(after.keys()).collect();

    for path in paths {
        let old = before.get(path);
        let Some(new) = after.get(path) else {
            continue;
        };
        if old == Some(new) {
            continue;
        }

        out.push_str(&format!("diff --git a/{0} b/{0}\n", path));
        match old {
            Some(_) => out.push_str(&format!("--- a/{0}\n+++ b/{0}\n", path)),
            None => {
                out.push_str("new file mode 100644\n");
                out.push_str(&format!("--- /dev/null\n+++ b/{0}\n", path));
            }
        }

        let patch = diffy::create_patch(old.map_or("", String::as_str), new);
        let body = formatter.fmt_patch(&patch).to_string();
        // diffy writes its own file header; keep only the hunks.
        for line in body.lines().skip_while(|l| !l.starts_with("@@")) {
            out.push_str(line);
            out.push('\n');
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn map(entries: &[(&str, &str)]) -> BTreeMap<Utf8PathBuf, String> {
        entries
            .iter()
            .map(|(p, c)| (Utf8PathBuf::from(*p), c.to_string()))
            .collect()
    }

    #[test]
    fn unchanged_files_are_omitted() {
        let before = map(&[("main.tf", "a\n")]);
        assert_eq!(render_patch(&before, &before), "");
    }

    #[test]
    fn modified_file_has_git_header_and_hunk() {
        let before = map(&[("main.tf", "a\nb\n")]);
        let after = map(&[("main.tf", "a\nc\n")]);
        let patch = render_patch(&before, &after);

        assert!(patch.starts_with("diff --git a/main.tf b/main.tf\n--- a/main.tf\n+++ b/main.tf\n@@"));
        assert!(patch.contains("-b\n"));
        assert!(patch.contains("+c\n"));
        assert_eq!(patch.matches("+++").count(), 1);
    }

    #[test]
    fn created_file_diffs_against_dev_null() {
        let before = BTreeMap::new();
        let after = map(&[("providers.tf", "terraform {\n}\n")]);
        let patch = render_patch(&before, &after);

        assert!(patch.contains("--- /dev/null\n+++ b/providers.tf\n"));
        assert!(patch.contains("+terraform {\n"));
    }
}
