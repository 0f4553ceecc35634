use crate::models::EnrichedEntity;
use crate::sort::SortOrder;
use chrono::{DateTime, Utc};
use html_escape::encode_double_quoted_attribute;

pub struct DashboardView<'a> {
    pub branches: &'a [String],
    pub selected_branch: Option<&'a str>,
    pub sort: SortOrder,
    pub show_sort: bool,
    pub last_updated: Option<&'a str>,
    pub entities: &'a [EnrichedEntity],
    pub error: Option<&'a str>,
}

pub fn render_index(view: &DashboardView<'_>) -> String {
    let cards: String = view.entities.iter().map(render_card).collect();
    let last_updated = view
        .last_updated
        .map(|raw| format!("Last Updated: {}", escape_html(&format_last_updated(raw))))
        .unwrap_or_default();

    INDEX_HTML
        .replace("{{BRANCH_HIDDEN}}", hidden(!view.branches.is_empty()))
        .replace("{{BRANCH_OPTIONS}}", &branch_options(view.branches, view.selected_branch))
        .replace("{{SORT_HIDDEN}}", hidden(view.show_sort))
        .replace("{{SORT_OPTIONS}}", &sort_options(view.sort))
        .replace("{{ERROR_HIDDEN}}", hidden(view.error.is_some()))
        .replace("{{ERROR}}", &escape_html(view.error.unwrap_or_default()))
        .replace("{{LAST_UPDATED}}", &last_updated)
        .replace("{{CARDS}}", &cards)
}

pub fn render_card(entity: &EnrichedEntity) -> String {
    let width = entity.progress_percent.clamp(0.0, 100.0);
    CARD_HTML
        .replace("{{NAME}}", &escape_html(&entity.name))
        .replace("{{ACCOUNT}}", &escape_html(&entity.account))
        .replace("{{LOWEST}}", &euros(entity.lowest))
        .replace("{{LOWEST_DAY}}", &entity.lowest_day.to_string())
        .replace("{{HIGHEST}}", &euros(entity.highest))
        .replace("{{HIGHEST_DAY}}", &entity.highest_day.to_string())
        .replace("{{AVERAGE}}", &euros(entity.average))
        .replace("{{TOTAL}}", &euros(entity.total))
        .replace("{{PERCENT}}", &format!("{:.2}", entity.progress_percent))
        .replace("{{ETA}}", &entity.est_days_to_target.to_string())
        .replace("{{WIDTH}}", &format!("{width:.2}"))
        .replace("{{COLOR}}", &progress_color(entity.progress_percent))
}

/// Red at 0%, yellow at 50%, green at 100%.
pub fn progress_color(percent: f64) -> String {
    let ratio = percent.clamp(0.0, 100.0) / 100.0;
    let (r, g) = if ratio < 0.5 {
        (255.0, 255.0 * (ratio / 0.5))
    } else {
        (255.0 * (1.0 - (ratio - 0.5) / 0.5), 255.0)
    };
    format!("rgb({},{},0)", r.round() as u8, g.round() as u8)
}

/// RFC 3339 timestamps keep their offset; epoch values (seconds or
/// milliseconds) are shown in UTC. Anything else is shown as given.
pub fn format_last_updated(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return "unknown".to_string();
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return timestamp.format("%Y-%m-%d %H:%M").to_string();
    }
    if let Ok(epoch) = raw.parse::<i64>() {
        let parsed = if epoch.abs() >= 100_000_000_000 {
            DateTime::<Utc>::from_timestamp_millis(epoch)
        } else {
            DateTime::<Utc>::from_timestamp(epoch, 0)
        };
        if let Some(timestamp) = parsed {
            return timestamp.format("%Y-%m-%d %H:%M UTC").to_string();
        }
    }
    raw.to_string()
}

/// Safe for element text and double-quoted attributes. Braces are encoded too
/// so user text can never form a `{{PLACEHOLDER}}` for a later replace.
pub fn escape_html(text: &str) -> String {
    encode_double_quoted_attribute(text)
        .replace('{', "&#123;")
        .replace('}', "&#125;")
}

fn euros(amount: f64) -> String {
    format!("€{amount:.2}")
}

fn hidden(visible: bool) -> &'static str {
    if visible { "" } else { "hidden" }
}

fn branch_options(branches: &[String], selected: Option<&str>) -> String {
    let mut options = String::from("<option disabled value=\"\"");
    if selected.is_none() {
        options.push_str(" selected");
    }
    options.push_str(">Select Branch</option>");
    for branch in branches {
        let escaped = escape_html(branch);
        let marker = if selected == Some(branch.as_str()) { " selected" } else { "" };
        options.push_str(&format!(r#"<option value="{escaped}"{marker}>{escaped}</option>"#));
    }
    options
}

fn sort_options(current: SortOrder) -> String {
    SortOrder::CHOICES
        .iter()
        .map(|choice| {
            let marker = if *choice == current { " selected" } else { "" };
            format!(r#"<option value="{choice}"{marker}>{}</option>"#, choice.label())
        })
        .collect()
}

const CARD_HTML: &str = r#"
      <article class="card">
        <header>
          <h3>{{NAME}}</h3>
          <p class="account">Site ID: {{ACCOUNT}}</p>
        </header>
        <div class="figures">
          <div class="stat"><span class="label">Lowest Spend</span><span class="value">{{LOWEST}} <small>(Day {{LOWEST_DAY}})</small></span></div>
          <div class="stat"><span class="label">Total Spend</span><span class="value">{{TOTAL}}</span></div>
          <div class="stat"><span class="label">Highest Spend</span><span class="value">{{HIGHEST}} <small>(Day {{HIGHEST_DAY}})</small></span></div>
          <div class="stat"><span class="label">Percentage of Target</span><span class="value">{{PERCENT}}%</span></div>
          <div class="stat"><span class="label">Average Spend/Day</span><span class="value">{{AVERAGE}}</span></div>
          <div class="stat"><span class="label">Days Left to Target</span><span class="value">{{ETA}}</span></div>
        </div>
        <div class="track" role="progressbar" aria-valuenow="{{PERCENT}}" aria-valuemin="0" aria-valuemax="100">
          <div class="fill" style="width: {{WIDTH}}%; background-color: {{COLOR}};"></div>
        </div>
      </article>"#;

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Spend Dashboard</title>
  <style>
    :root {
      --bg: #1f2326;
      --card: #2c3236;
      --ink: #f1efe9;
      --muted: #a7a29a;
      --track: #444;
      --error: #e0614f;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(960px, 100%);
      margin: 0 auto;
      display: grid;
      gap: 24px;
    }

    h1 {
      margin: 0;
      font-size: clamp(1.8rem, 4vw, 2.4rem);
    }

    .controls {
      display: flex;
      flex-wrap: wrap;
      gap: 12px;
    }

    select {
      background: var(--card);
      color: var(--ink);
      border: 1px solid #555;
      border-radius: 8px;
      padding: 8px 12px;
      font-size: 1rem;
    }

    .updated {
      margin: 0;
      color: var(--muted);
    }

    .error {
      color: var(--error);
      font-weight: 600;
    }

    .card {
      background: var(--card);
      border-radius: 16px;
      padding: 20px;
      display: grid;
      gap: 16px;
    }

    .card header {
      text-align: center;
    }

    .card h3 {
      margin: 0;
    }

    .account {
      margin: 4px 0 0;
      color: var(--muted);
    }

    .figures {
      display: grid;
      grid-template-columns: repeat(2, 1fr);
      gap: 12px;
      text-align: center;
    }

    .stat .label {
      display: block;
      font-size: 0.8rem;
      text-transform: uppercase;
      letter-spacing: 0.1em;
      color: var(--muted);
    }

    .stat .value {
      font-size: 1.2rem;
      font-weight: 600;
    }

    .track {
      height: 24px;
      background: var(--track);
      border-radius: 12px;
      overflow: hidden;
    }

    .fill {
      height: 100%;
      transition: width 0.5s ease, background-color 0.5s ease;
    }

    [hidden] {
      display: none !important;
    }
  </style>
</head>
<body>
  <main class="app">
    <h1>Spend Dashboard</h1>

    <form class="controls" id="controls" method="get" action="/">
      <select name="branch" id="branch" {{BRANCH_HIDDEN}}>{{BRANCH_OPTIONS}}</select>
      <select name="sort" id="sort" {{SORT_HIDDEN}}>{{SORT_OPTIONS}}</select>
      <noscript><button type="submit">Apply</button></noscript>
    </form>

    <p class="error" id="error-message" {{ERROR_HIDDEN}}>{{ERROR}}</p>
    <p class="updated" id="last-updated">{{LAST_UPDATED}}</p>

    <section id="stats">{{CARDS}}
    </section>
  </main>

  <script>
    const form = document.getElementById('controls');
    form.querySelectorAll('select').forEach((select) => {
      select.addEventListener('change', () => form.submit());
    });
  </script>
</body>
</html>
"#;
