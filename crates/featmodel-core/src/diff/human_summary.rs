//! Human-readable summary renderer for feature diffs.

use crate::diff::model::{Delta, FeatureDiff};

/// Render a human-readable Markdown summary of a [`FeatureDiff`].
///
/// The summary is intended for release review. It is informational only
/// and does not affect the structured diff. Output is deterministic for a
/// given diff.
pub fn render_human_summary(diff: &FeatureDiff) -> String {
    let mut out = String::new();

    out.push_str("## Feature Diff\n\n");
    out.push_str(&format!(
        "**Previous**: `{}`  \n**Current**: `{}`\n\n",
        diff.previous, diff.current
    ));

    if diff.is_empty() {
        out.push_str("_No changes detected._\n");
        return out;
    }

    for delta in &diff.deltas {
        out.push_str(&format!("### {}\n\n", section_title(&delta.id)));
        render_delta(&mut out, delta, 0);
        out.push('\n');
    }

    out
}

fn section_title(id: &str) -> String {
    match id {
        "bundles" => "Bundles".to_string(),
        "configurations" => "Configurations".to_string(),
        "framework-properties" => "Framework Properties".to_string(),
        "extensions" => "Extensions".to_string(),
        other => format!("Extension `{}`", other),
    }
}

fn render_delta(out: &mut String, delta: &Delta, depth: usize) {
    let indent = "  ".repeat(depth);

    for removed in &delta.removed {
        out.push_str(&format!("{indent}- **Removed**: `{removed}`\n"));
    }
    for added in &delta.added {
        out.push_str(&format!("{indent}- **Added**: `{added}`\n"));
    }
    for item in &delta.updated_items {
        out.push_str(&format!(
            "{indent}- **Updated**: `{}`: `{}` → `{}`\n",
            item.id, item.previous, item.current
        ));
    }
    for child in &delta.children {
        out.push_str(&format!("{indent}- **Changed**: `{}`\n", child.id));
        render_delta(out, child, depth + 1);
    }
}
