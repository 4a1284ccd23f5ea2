//! Plain-text rendering of resolution results

use crate::data::ResolutionResult;

/// Renders the records of a successful result, one expansion per line
///
/// `empty_message` is printed when there are no records.
pub fn render_records(result: &ResolutionResult, empty_message: &str) -> String {
    let records = result.records();
    if records.is_empty() {
        return format!("{}\n", empty_message);
    }

    let mut out = String::new();
    for record in records {
        out.push_str(&format!("{}\n", record));
        if let Some(comment) = &record.comment {
            out.push_str(&format!("    {}\n", comment));
        }

        let mut details = Vec::new();
        if let Some(code) = &record.classification_code {
            details.push(format!("dewey {}", code));
        }
        if let Some(added) = &record.added_at {
            details.push(format!("added {}", added.format("%Y-%m-%d")));
        }
        if !details.is_empty() {
            out.push_str(&format!("    ({})\n", details.join(", ")));
        }
    }

    if result.is_stale {
        out.push_str("(cached data is stale)\n");
    }
    out
}
