use crate::controller::PageView;
use crate::render::TopologyView;
use crate::schema::{ActorGroup, MaterializedView};

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ActorView {
    pub id: u32,
    pub fragment_id: u32,
    pub downstream: Vec<u32>,
    /// Materialized views backed by this actor's fragment.
    pub views: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NodeView {
    pub node: String,
    pub actors: Vec<ActorView>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MviewView {
    pub id: String,
    pub name: String,
    pub fragment_ids: Vec<u32>,
    pub actor_count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TotalsView {
    pub nodes: usize,
    pub actors: usize,
    pub edges: usize,
    pub views: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReportData {
    pub nodes: Vec<NodeView>,
    pub views: Vec<MviewView>,
    pub totals: TotalsView,
}

/// Collects the topology handed over by the page into report data.
#[derive(Debug, Default)]
pub struct HtmlReport {
    data: Option<ReportData>,
}

impl HtmlReport {
    pub fn data(&self) -> Option<&ReportData> {
        self.data.as_ref()
    }
}

impl TopologyView for HtmlReport {
    fn render(&mut self, actor_groups: &[ActorGroup], materialized_views: &[MaterializedView]) {
        self.data = Some(build_report_data(actor_groups, materialized_views));
    }
}

pub fn build_report_data(
    actor_groups: &[ActorGroup],
    materialized_views: &[MaterializedView],
) -> ReportData {
    // fragment -> views depending on it
    let mut fragment_views: BTreeMap<u32, Vec<String>> = BTreeMap::new();
    for mv in materialized_views {
        for &f in &mv.fragment_ids {
            fragment_views.entry(f).or_default().push(mv.name.clone());
        }
    }

    let nodes: Vec<NodeView> = actor_groups
        .iter()
        .map(|g| NodeView {
            node: g.node.clone(),
            actors: g
                .actors
                .iter()
                .map(|a| ActorView {
                    id: a.id,
                    fragment_id: a.fragment_id,
                    downstream: a.downstream.clone(),
                    views: fragment_views
                        .get(&a.fragment_id)
                        .cloned()
                        .unwrap_or_default(),
                })
                .collect(),
        })
        .collect();

    let views = materialized_views
        .iter()
        .map(|mv| {
            let fragments: BTreeSet<u32> = mv.fragment_ids.iter().copied().collect();
            let actor_count = actor_groups
                .iter()
                .flat_map(|g| &g.actors)
                .filter(|a| fragments.contains(&a.fragment_id))
                .count();
            MviewView {
                id: mv.id.clone(),
                name: mv.name.clone(),
                fragment_ids: mv.fragment_ids.clone(),
                actor_count,
            }
        })
        .collect();

    ReportData {
        totals: TotalsView {
            nodes: actor_groups.len(),
            actors: actor_groups.iter().map(|g| g.actors.len()).sum(),
            edges: actor_groups.iter().map(ActorGroup::edge_count).sum(),
            views: materialized_views.len(),
        },
        nodes,
        views,
    }
}

#[derive(Serialize)]
struct PageData<'a> {
    error: Option<&'a str>,
    data: Option<&'a ReportData>,
}

/// Render the page as self-contained HTML (page data embedded as JSON).
///
/// The error banner is shown whenever a message is set; below it either the
/// topology or a "No Data" block.
///
/// Important: we avoid `format!()` because the HTML contains many `{}` from JS
/// template literals (e.g., `${x}`), which would conflict with Rust formatting.
pub fn render_page(view: &PageView) -> anyhow::Result<String> {
    let mut report = HtmlReport::default();
    view.present(&mut report);

    let page = PageData {
        error: view.error.as_deref(),
        data: report.data(),
    };
    // `</` would close the script element early.
    let json = serde_json::to_string(&page)?.replace("</", "<\\/");

    const TEMPLATE: &str = r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Streaming</title>
<style>
  body { font-family: system-ui, -apple-system, Segoe UI, Roboto, Arial, sans-serif; margin: 0; }
  header { padding: 12px 16px; border-bottom: 1px solid #ddd; }
  .container { display: flex; height: calc(100vh - 58px); }
  .sidebar { width: 320px; border-right: 1px solid #ddd; padding: 12px; overflow: auto; }
  .main { flex: 1; padding: 12px; overflow: auto; }

  .summary { display: flex; gap: 16px; flex-wrap: wrap; font-size: 14px; color: #333; }
  .pill { padding: 4px 8px; border: 1px solid #ddd; border-radius: 999px; background: #fafafa; }
  .error { margin: 12px 16px; padding: 8px 12px; border: 1px solid #f1b0b0; border-radius: 6px; background: #fdecea; color: #8a1c1c; }
  .nodata { margin: 48px auto; text-align: center; color: #777; }

  .mv { cursor: pointer; padding: 4px 6px; border-radius: 4px; }
  .mv:hover { background: #f3f3f3; }
  .mv.selected { background: #e9f2ff; border: 1px solid #cfe3ff; }
  .muted { color: #777; font-size: 12px; }
  tr.hit td { background: #fff7d6; }

  table { border-collapse: collapse; width: 100%; margin: 8px 0 20px; }
  th, td { border-bottom: 1px solid #eee; padding: 6px 8px; text-align: left; font-size: 14px; }
  th { background: white; border-bottom: 1px solid #ddd; }
  .num { text-align: right; font-variant-numeric: tabular-nums; }
  code { font-family: ui-monospace, SFMono-Regular, Menlo, Consolas, monospace; font-size: 13px; }
</style>
</head>
<body>
<div id="error" class="error" style="display:none;"></div>
<div id="page"></div>

<script>
// Embedded page data (JSON object literal)
const PAGE = __PAGE__;

const state = { selected: null };

function escapeHtml(s) {
  return String(s)
    .replaceAll("&", "&amp;")
    .replaceAll("<", "&lt;")
    .replaceAll(">", "&gt;")
    .replaceAll('"', "&quot;")
    .replaceAll("'", "&#39;");
}

function renderError() {
  if (!PAGE.error) return;
  const el = document.getElementById("error");
  el.textContent = PAGE.error;
  el.style.display = "block";
}

function renderNoData() {
  document.getElementById("page").innerHTML = `<div class="nodata">No Data</div>`;
}

function renderStreaming(data) {
  const t = data.totals;
  document.getElementById("page").innerHTML = `
    <header><div class="summary">
      <span class="pill">nodes: <b>${t.nodes}</b></span>
      <span class="pill">actors: <b>${t.actors}</b></span>
      <span class="pill">edges: <b>${t.edges}</b></span>
      <span class="pill">materialized views: <b>${t.views}</b></span>
    </div></header>
    <div class="container">
      <div class="sidebar"><div id="views"></div></div>
      <div class="main"><div id="nodes"></div></div>
    </div>
  `;
  renderViews(data);
  renderNodes(data);
}

function renderViews(data) {
  const root = document.getElementById("views");
  root.innerHTML = "";
  for (const mv of data.views) {
    const row = document.createElement("div");
    row.className = "mv" + (state.selected === mv.name ? " selected" : "");
    row.innerHTML = `${escapeHtml(mv.name)} <span class="muted">(${mv.actor_count} actors, fragments ${mv.fragment_ids.join(", ")})</span>`;
    row.onclick = () => {
      state.selected = state.selected === mv.name ? null : mv.name;
      renderViews(data);
      renderNodes(data);
    };
    root.appendChild(row);
  }
}

function renderNodes(data) {
  const root = document.getElementById("nodes");
  root.innerHTML = "";
  for (const group of data.nodes) {
    const h = document.createElement("h3");
    h.textContent = group.node;
    root.appendChild(h);

    const tbl = document.createElement("table");
    tbl.innerHTML = `<thead><tr>
      <th class="num">actor</th><th class="num">fragment</th><th>downstream</th><th>views</th>
    </tr></thead>`;
    const body = document.createElement("tbody");
    for (const a of group.actors) {
      const tr = document.createElement("tr");
      if (state.selected && a.views.includes(state.selected)) tr.className = "hit";
      tr.innerHTML = `
        <td class="num">${a.id}</td>
        <td class="num">${a.fragment_id}</td>
        <td><code>[${a.downstream.join(", ")}]</code></td>
        <td>${a.views.map(escapeHtml).join(", ")}</td>
      `;
      body.appendChild(tr);
    }
    tbl.appendChild(body);
    root.appendChild(tbl);
  }
}

renderError();
if (PAGE.data) renderStreaming(PAGE.data);
else renderNoData();
</script>
</body>
</html>
"#;

    Ok(TEMPLATE.replace("__PAGE__", &json))
}
