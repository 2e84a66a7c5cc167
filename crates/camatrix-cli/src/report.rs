//! Local web report rendering the snapshot diff as an HTML table.

use std::sync::Arc;

use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use tracing::info;

use camatrix_domain::DiffEntry;

/// Serves the rendered diff on localhost until the process is stopped.
pub async fn serve_report(entries: &[DiffEntry], port: u16) -> anyhow::Result<()> {
    let html = Arc::new(render_report(entries));
    let app = Router::new().route("/", get(index)).with_state(html);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    info!("web report available at http://localhost:{port}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn index(State(html): State<Arc<String>>) -> Html<String> {
    Html((*html).clone())
}

/// Renders the full report page.
fn render_report(entries: &[DiffEntry]) -> String {
    let mut page = String::from(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Conditional Access Impact Matrix</title>
    <style>
      body { font-family: sans-serif; margin: 2rem auto; max-width: 60rem; }
      h1 { text-align: center; }
      table { width: 100%; border-collapse: collapse; margin-top: 2rem; }
      th, td { text-align: left; padding: 0.5rem; border-bottom: 1px solid #ddd; }
      p.empty { text-align: center; margin-top: 2rem; }
    </style>
  </head>
  <body>
    <h1>Conditional Access Impact Matrix</h1>
    <p style="text-align:center">Review the effects of your Conditional Access changes</p>
"#,
    );

    if entries.is_empty() {
        page.push_str("    <p class=\"empty\">No user changes</p>\n");
    } else {
        page.push_str(
            "    <table>\n      <thead>\n        <tr><th>user</th><th>CA policy</th><th>old value</th><th>new value</th></tr>\n      </thead>\n      <tbody>\n",
        );
        for entry in entries {
            page.push_str(&format!(
                "        <tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                escape(&entry.upn),
                escape(&entry.policy),
                entry.old,
                entry.new,
            ));
        }
        page.push_str("      </tbody>\n    </table>\n");
    }

    page.push_str("  </body>\n</html>\n");
    page
}

/// Minimal HTML escaping for directory-supplied strings.
fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(upn: &str, policy: &str) -> DiffEntry {
        DiffEntry {
            upn: upn.to_string(),
            policy: policy.to_string(),
            old: "✅ Included",
            new: "❌ Excluded",
        }
    }

    #[test]
    fn report_lists_every_change() {
        let html = render_report(&[entry("a@x.com", "PolicyX"), entry("b@x.com", "PolicyY")]);
        assert!(html.contains("a@x.com"));
        assert!(html.contains("PolicyY"));
        assert!(html.contains("✅ Included"));
        assert!(html.contains("❌ Excluded"));
    }

    #[test]
    fn empty_diff_renders_placeholder() {
        let html = render_report(&[]);
        assert!(html.contains("No user changes"));
        assert!(!html.contains("<table>"));
    }

    #[test]
    fn directory_strings_are_escaped() {
        let html = render_report(&[entry("a@x.com", "<script>alert(1)</script>")]);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
