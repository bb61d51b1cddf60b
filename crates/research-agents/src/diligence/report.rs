//! Report finishing: stylesheet wrapping and a completeness heuristic.

/// Inlined so the report renders the same in a browser and a mail client
pub const STYLESHEET: &str = r"<style>
    .report-container { font-family: Arial, sans-serif; line-height: 1.6; max-width: 1200px; margin: 0 auto; }
    h1 { color: #1E3A8A; border-bottom: 2px solid #4B72B0; padding-bottom: 10px; font-size: 24px; margin-top: 25px; }
    h2 { color: #2C5282; margin-top: 20px; border-bottom: 1px solid #BEE3F8; padding-bottom: 5px; font-size: 20px; }
    table { width: 100%; border-collapse: collapse; margin: 20px 0; font-size: 14px; }
    th { background-color: #E6F2FF; padding: 12px; text-align: left; border: 1px solid #BEE3F8; font-weight: bold; }
    td { padding: 10px; border: 1px solid #E2E8F0; vertical-align: top; }
    tr:nth-child(even) { background-color: #F7FAFC; }
    .section { margin-bottom: 30px; padding: 15px; background-color: #FFFFFF; border-radius: 8px; box-shadow: 0 1px 3px rgba(0,0,0,0.1); }
    .highlight { background-color: #FFFBEA; padding: 15px; border-left: 4px solid #F6AD55; margin: 15px 0; }
    a { color: #3182CE; text-decoration: none; }
    a:hover { text-decoration: underline; }
    .tweet { border-left: 3px solid #1DA1F2; padding: 10px 10px 10px 15px; margin: 10px 0; background-color: #F7FAFC; }
    ul, ol { margin-left: 20px; margin-bottom: 15px; }
    li { margin-bottom: 5px; }
</style>";

/// Shorter replies are treated as incomplete
pub const MIN_REPORT_CHARS: usize = 1000;

/// A finished report mentions at least one of these
pub const KEY_SECTIONS: [&str; 4] = ["founder", "fund", "market", "competitor"];

/// Wrap a model reply in the report container.
///
/// Full documents (`<html` or `<!doctype`) pass through untouched. A reply
/// holding a `<body>` is cut down to that element first.
pub fn wrap_report(content: &str) -> String {
    // ASCII lowering keeps byte offsets valid for slicing `content`
    let lower = content.to_ascii_lowercase();
    if lower.contains("<html") || lower.contains("<!doctype") {
        return content.to_string();
    }

    let body = match (lower.find("<body"), lower.find("</body>")) {
        (Some(start), Some(end)) if start < end => &content[start..end + "</body>".len()],
        _ => content,
    };

    format!("<div class='report-container'>{STYLESHEET}{body}</div>")
}

/// Whether the model's reply reads like a finished report
pub fn looks_complete(content: &str) -> bool {
    let lower = content.to_lowercase();
    content.chars().count() >= MIN_REPORT_CHARS && KEY_SECTIONS.iter().any(|s| lower.contains(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_is_wrapped() {
        let html = wrap_report("<h1>Acme</h1>");
        assert!(html.starts_with("<div class='report-container'><style>"));
        assert!(html.ends_with("<h1>Acme</h1></div>"));
    }

    #[test]
    fn test_full_document_passes_through() {
        let doc = "<!DOCTYPE html><html><body><h1>Acme</h1></body></html>";
        assert_eq!(wrap_report(doc), doc);
    }

    #[test]
    fn test_body_is_cut_out() {
        let reply = "Here you go:\n<BODY class='x'><h1>Acme</h1></Body>\nAnything else?";
        let html = wrap_report(reply);
        assert!(html.contains("<BODY class='x'><h1>Acme</h1></Body></div>"));
        assert!(!html.contains("Here you go"));
        assert!(!html.contains("Anything else?"));
    }

    #[test]
    fn test_non_ascii_before_body() {
        let reply = "Résumé — <body><p>ok</p></body>";
        assert!(wrap_report(reply).contains("<body><p>ok</p></body></div>"));
    }

    #[test]
    fn test_completeness() {
        assert!(!looks_complete("<h1>Founders</h1>"));
        assert!(!looks_complete(&"x".repeat(MIN_REPORT_CHARS)));

        let report = format!("<h2>Funding</h2>{}", "x".repeat(MIN_REPORT_CHARS));
        assert!(looks_complete(&report));
    }
}
