//! HTML rendering for the dashboard and upload pages

use crate::presenter::{ChartSpec, DashboardView, SummaryCard, TableView};
use crate::upload::{UploadOutcome, UploadTable};
use std::fmt::Write;
use tracing::warn;

const BOOTSTRAP_CSS: &str = "https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.min.css";
const PLOTLY_JS: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Escape text for HTML element content and attribute values
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Chart description as JSON safe to embed in a `<script>` element
#[must_use]
pub fn chart_json(chart: &ChartSpec) -> String {
    match serde_json::to_string(chart) {
        Ok(json) => json.replace("</", "<\\/"),
        Err(e) => {
            warn!("Failed to serialize chart: {}", e);
            "null".to_string()
        }
    }
}

fn page(title: &str, body: &str, scripts: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<link rel="stylesheet" href="{BOOTSTRAP_CSS}">
<link rel="stylesheet" href="/assets/dashboard.css">
</head>
<body>
<div class="container-fluid">
<nav class="nav my-2"><a class="nav-link" href="/">Forecast</a><a class="nav-link" href="/upload">Upload CSV</a></nav>
{body}
</div>
{scripts}
</body>
</html>
"#,
        title = escape_html(title),
    )
}

fn render_card(out: &mut String, card: &SummaryCard) {
    let _ = write!(
        out,
        r#"<div class="col-auto"><div class="card mb-3 bg-dark text-center summary-card"><div class="card-body">
<h4 class="card-title text-white">{}</h4>
<p class="card-text text-white">{}</p>
</div></div></div>
"#,
        escape_html(&card.title),
        escape_html(&card.value)
    );
}

fn render_table(out: &mut String, columns: &[String], rows: &[Vec<String>], id: &str) {
    let _ = write!(
        out,
        r#"<table class="table table-bordered table-sm" id="{id}"><thead><tr>"#
    );
    for column in columns {
        let _ = write!(out, "<th>{}</th>", escape_html(column));
    }
    out.push_str("</tr></thead><tbody>\n");
    for row in rows {
        out.push_str("<tr>");
        for cell in row {
            let _ = write!(out, "<td>{}</td>", escape_html(cell));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody></table>\n");
}

fn render_forecast_table(out: &mut String, table: &TableView) {
    out.push_str(r#"<div class="row"><div class="col-12 border p-3">"#);
    render_table(out, &table.columns, &table.rows, "forecast-table");
    out.push_str("</div></div>\n");
}

/// Full dashboard page
#[must_use]
pub fn render_dashboard(view: &DashboardView) -> String {
    let mut body = String::new();
    let _ = write!(
        body,
        "<div class=\"row\"><div class=\"col-12\"><h1>{}</h1></div></div>\n<hr>\n",
        escape_html(&view.title)
    );

    for notice in &view.notices {
        let _ = writeln!(
            body,
            r#"<div class="alert alert-warning" role="alert">{}</div>"#,
            escape_html(notice)
        );
    }

    body.push_str("<div class=\"row justify-content-center\">\n");
    for card in &view.cards {
        render_card(&mut body, card);
    }
    body.push_str("</div>\n");

    render_forecast_table(&mut body, &view.table);

    body.push_str(
        r#"<div class="row"><div class="col-12"><div class="card"><div class="card-body">
<div id="forecast-chart"></div>
<button id="refresh-chart" class="btn btn-outline-secondary btn-sm">Refresh chart</button>
</div></div></div></div>
"#,
    );

    let scripts = format!(
        r#"<script type="application/json" id="chart-spec">{}</script>
<script src="{PLOTLY_JS}"></script>
<script src="/assets/dashboard.js"></script>"#,
        chart_json(&view.chart)
    );

    page(&view.title, &body, &scripts)
}

/// All rows are rendered; rows past the first page start hidden and
/// `dashboard.js` pages through them
fn render_upload_table(out: &mut String, table: &UploadTable) {
    let page_size = table.page_size.max(1);
    let page_count = table.page_count().max(1);

    let _ = writeln!(out, "<h5>{}</h5>", escape_html(&table.filename));
    let _ = write!(
        out,
        r#"<div class="upload-table" data-page-count="{page_count}">"#
    );
    out.push_str(r#"<table class="table table-bordered table-sm" id="upload-table"><thead><tr>"#);
    for column in &table.columns {
        let _ = write!(out, "<th>{}</th>", escape_html(column));
    }
    out.push_str("</tr></thead><tbody>\n");
    for (index, row) in table.rows.iter().enumerate() {
        let page = index / page_size;
        let hidden = if page == 0 { "" } else { " hidden" };
        let _ = write!(out, r#"<tr data-page="{page}"{hidden}>"#);
        for cell in row {
            let _ = write!(out, "<td>{}</td>", escape_html(cell));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody></table>\n");

    if page_count > 1 {
        let _ = writeln!(
            out,
            r#"<nav class="upload-pager mb-2"><button type="button" class="btn btn-outline-secondary btn-sm" data-page-step="-1">Previous</button>
<span class="page-status mx-2">Page 1 of {page_count}</span>
<button type="button" class="btn btn-outline-secondary btn-sm" data-page-step="1">Next</button></nav>"#
        );
    }
    out.push_str("</div>\n");

    let _ = writeln!(
        out,
        r#"<p class="text-muted">Rows: {} ({} per page)</p>"#,
        table.rows.len(),
        page_size
    );
}

/// Upload form plus the outcome of the last upload
#[must_use]
pub fn render_upload_page(outcome: &UploadOutcome) -> String {
    let mut body = String::from(
        r#"<h2>Other CSV files</h2>
<form method="post" action="/upload" enctype="multipart/form-data" class="mb-3">
<input type="file" name="file" accept=".csv" class="form-control mb-2">
<button type="submit" class="btn btn-primary" style="font-size: 18px">Choose CSV file</button>
</form>
<div id="output-data-upload">
"#,
    );

    match outcome {
        UploadOutcome::Table(table) => render_upload_table(&mut body, table),
        other => {
            let message = other.message().unwrap_or_default();
            let _ = writeln!(body, "<div>{}</div>", escape_html(message));
        }
    }
    body.push_str("</div>\n");

    page(
        "Upload CSV",
        &body,
        r#"<script src="/assets/dashboard.js"></script>"#,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presenter::{ChartKind, ChartSeries};
    use crate::upload::{EMPTY_MESSAGE, NOT_CSV_MESSAGE, PAGE_SIZE};

    fn view() -> DashboardView {
        DashboardView {
            title: "PM <Forecast>".to_string(),
            cards: vec![SummaryCard {
                title: "Today's PM10".to_string(),
                value: "10.00 µg/m³".to_string(),
            }],
            table: TableView {
                columns: vec!["Date".to_string(), "PM10".to_string()],
                rows: vec![vec!["2024-01-01".to_string(), "10.00".to_string()]],
            },
            chart: ChartSpec {
                kind: ChartKind::Bar,
                title: "PM10 Levels Over 7 Days".to_string(),
                x_label: "Date".to_string(),
                y_label: "PM10 Value".to_string(),
                x: vec!["2024-01-01".to_string()],
                series: vec![ChartSeries {
                    name: "PM10".to_string(),
                    values: vec![10.0],
                }],
            },
            notices: vec!["PM2.5 forecast unavailable".to_string()],
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_chart_json_cannot_close_script() {
        let mut chart = view().chart;
        chart.title = "</script><script>alert(1)</script>".to_string();
        let json = chart_json(&chart);
        assert!(!json.contains("</script>"));
        let parsed: ChartSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.title, chart.title);
    }

    #[test]
    fn test_render_dashboard() {
        let html = render_dashboard(&view());
        assert!(html.contains("<h1>PM &lt;Forecast&gt;</h1>"));
        assert!(html.contains("10.00 µg/m³"));
        assert!(html.contains("<td>2024-01-01</td><td>10.00</td>"));
        assert!(html.contains("alert-warning"));
        assert!(html.contains(r#"id="chart-spec""#));
        assert!(html.contains("\"kind\":\"bar\""));
    }

    #[test]
    fn test_render_upload_messages() {
        let html = render_upload_page(&UploadOutcome::Empty {
            message: EMPTY_MESSAGE.to_string(),
        });
        assert!(html.contains(EMPTY_MESSAGE));
        assert!(html.contains("enctype=\"multipart/form-data\""));

        let html = render_upload_page(&UploadOutcome::NotCsv {
            message: NOT_CSV_MESSAGE.to_string(),
        });
        assert!(html.contains(NOT_CSV_MESSAGE));
        assert!(!html.contains("upload-table\""));
    }

    #[test]
    fn test_render_upload_table_pages() {
        let table = UploadTable {
            filename: "big.csv".to_string(),
            columns: vec!["n".to_string()],
            rows: (0..25).map(|i| vec![i.to_string()]).collect(),
            page_size: PAGE_SIZE,
        };
        let html = render_upload_page(&UploadOutcome::Table(table));
        assert!(html.contains("<h5>big.csv</h5>"));
        assert!(html.contains(r#"<tr data-page="0"><td>9</td></tr>"#));
        assert!(html.contains(r#"<tr data-page="1" hidden><td>10</td></tr>"#));
        assert!(html.contains(r#"<tr data-page="2" hidden><td>24</td></tr>"#));
        assert!(html.contains(r#"data-page-count="3""#));
        assert!(html.contains("Page 1 of 3"));
        assert!(html.contains("Rows: 25 (10 per page)"));
    }

    #[test]
    fn test_render_single_page_has_no_pager() {
        let table = UploadTable {
            filename: "small.csv".to_string(),
            columns: vec!["n".to_string()],
            rows: vec![vec!["1".to_string()]],
            page_size: PAGE_SIZE,
        };
        let html = render_upload_page(&UploadOutcome::Table(table));
        assert!(!html.contains("upload-pager"));
        assert!(html.contains("Rows: 1 (10 per page)"));
    }
}
