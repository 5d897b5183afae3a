use std::fmt::Write as _;

use crate::map_view::{BOUNDARY_ERROR_MESSAGE, LOADING_MESSAGE, MapView, ViewStatus};
use crate::path::boundary_path;

const STROKE: &str = "#ffffff";
const STROKE_WIDTH: &str = "0.01";
const HIGHLIGHT_STROKE: &str = "#000000";
const HIGHLIGHT_STROKE_WIDTH: &str = "0.03";
const DIMMED_OPACITY: &str = "0.3";
const HOVER_FILTER: &str = "brightness(0.7)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapRender {
    Loading(&'static str),
    Failed(&'static str),
    Svg(String),
}

impl MapView {
    /// Render the choropleth, or the loading/error placeholder text.
    pub fn render(&self) -> MapRender {
        match self.status() {
            ViewStatus::Loading => MapRender::Loading(LOADING_MESSAGE),
            ViewStatus::Failed(_) => MapRender::Failed(BOUNDARY_ERROR_MESSAGE),
            ViewStatus::Ready => MapRender::Svg(self.render_svg()),
        }
    }

    fn render_svg(&self) -> String {
        let view_box = self.view_box();
        let hovered = self.interaction.hovered();
        let options = self.options();
        let mut out = String::new();

        let _ = write!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{view_box}" preserveAspectRatio="xMidYMid meet" style="max-height:500px" data-sector="{}""#,
            options.sector
        );
        if let Some(year) = self.performance_year() {
            let _ = write!(out, r#" data-year="{year}""#);
        }
        out.push('>');
        let _ = write!(
            out,
            r#"<g transform="matrix(1 0 0 -1 0 {})">"#,
            view_box.mirror_offset()
        );

        let Some(collection) = self.collection() else {
            out.push_str("</g></svg>");
            return out;
        };

        for (feature, county) in collection.features.iter().zip(self.counties()) {
            let d = boundary_path(&feature.rings);
            if d.is_empty() {
                continue;
            }
            let (stroke, stroke_width) = if county.highlighted {
                (HIGHLIGHT_STROKE, HIGHLIGHT_STROKE_WIDTH)
            } else {
                (STROKE, STROKE_WIDTH)
            };
            let name = escape_xml(&county.name);

            let _ = write!(
                out,
                r#"<a href="/county/{}" data-county="{name}" data-object-id="{}"><path d="{d}" fill="{}" stroke="{stroke}" stroke-width="{stroke_width}""#,
                escape_xml(&county.slug),
                county.object_id,
                county.color,
            );
            if county.dimmed {
                let _ = write!(out, r#" opacity="{DIMMED_OPACITY}""#);
            }
            if hovered == Some(county.name.as_str()) {
                let _ = write!(out, r#" style="filter:{HOVER_FILTER}""#);
            }
            let _ = write!(out, "><title>{name}");
            if let Some(score) = county.score {
                let _ = write!(out, " | Score: {score:.1}");
                if let Some(rank) = county.rank {
                    let _ = write!(out, " | Rank: #{rank}");
                }
            }
            out.push_str("</title></path></a>");
        }

        out.push_str("</g></svg>");
        out
    }
}

fn escape_xml(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
