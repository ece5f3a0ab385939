use camino::Utf8Path;
use fanout_types::RunReport;

use crate::describe_outcome;

/// Render every non-succeeded root as a GitHub Actions workflow command annotation.
///
/// Format:
/// `::error file={manifest},title=fanout {hook}::{root}: {outcome}`
pub fn render_github_annotations(report: &RunReport, base: &Utf8Path) -> Vec<String> {
    let mut out = Vec::new();

    for r in report.results.iter().filter(|r| !r.result.outcome.is_success()) {
        let label = r.root.display_from(base);
        let manifest = r
            .root
            .manifest()
            .strip_prefix(base)
            .map(|p| p.as_str())
            .unwrap_or(r.root.manifest().as_str());

        let message = escape_data(&format!("{label}: {}", describe_outcome(&r.result)));
        out.push(format!(
            "::error file={},title={}::{}",
            escape_property(manifest),
            escape_property(&format!("fanout {}", report.hook)),
            message
        ));
    }

    out
}

fn escape_data(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn escape_property(s: &str) -> String {
    escape_data(s).replace(':', "%3A").replace(',', "%2C")
}
