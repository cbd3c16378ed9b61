//! Visualization utilities for sequenced routes.
//!
//! Generates an SVG map of the open path and an SVG bar chart of leg
//! distances, with optional PNG export.

use crate::instance::{haversine_km, Point};
use std::fs::File;
use std::io::Write;
use std::path::Path;
#[cfg(not(feature = "native-png"))]
use std::process::Command;
#[cfg(feature = "native-png")]
use resvg::usvg;
#[cfg(feature = "native-png")]
use resvg::render;
#[cfg(feature = "native-png")]
use resvg::FitTo;
#[cfg(feature = "native-png")]
use resvg::tiny_skia::{Pixmap, Transform};
#[cfg(feature = "native-png")]
use resvg::usvg::TreeParsing;

/// SVG visualization generator
pub struct Visualizer {
    /// Canvas width
    pub width: f64,
    /// Canvas height
    pub height: f64,
    /// Margin
    pub margin: f64,
    /// Stop marker radius
    pub node_radius: f64,
}

impl Default for Visualizer {
    fn default() -> Self {
        Visualizer {
            width: 800.0,
            height: 800.0,
            margin: 50.0,
            node_radius: 8.0,
        }
    }
}

/// Escape text for use inside SVG markup
fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

impl Visualizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate SVG map of an ordered route (longitude on x, latitude on y)
    pub fn generate_svg(&self, title: &str, route: &[Point]) -> String {
        let mut svg = String::new();

        let (min_x, max_x, min_y, max_y) = self.get_bounds(route);

        let span_x = max_x - min_x;
        let span_y = max_y - min_y;
        let scale_x = (self.width - 2.0 * self.margin) / if span_x > 0.0 { span_x } else { 1.0 };
        let scale_y = (self.height - 2.0 * self.margin) / if span_y > 0.0 { span_y } else { 1.0 };
        let scale = scale_x.min(scale_y);

        svg.push_str(&format!(
            r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">
<style>
    .node {{ fill: #3498db; stroke: #2c3e50; stroke-width: 2; }}
    .start {{ fill: #2ecc71; stroke: #27ae60; stroke-width: 2; }}
    .end {{ fill: #e74c3c; stroke: #c0392b; stroke-width: 2; }}
    .edge {{ stroke: #34495e; stroke-width: 2; fill: none; }}
    .label {{ font-family: Arial; font-size: 10px; fill: #2c3e50; }}
    .title {{ font-family: Arial; font-size: 14px; fill: #2c3e50; font-weight: bold; }}
</style>
<rect width="100%" height="100%" fill="#ecf0f1"/>
"##,
            self.width, self.height, self.width, self.height
        ));

        let total_km: f64 = route.windows(2).map(|w| haversine_km(&w[0], &w[1])).sum();
        svg.push_str(&format!(
            r##"<text x="{}" y="25" class="title">Route: {} | Stops: {} | Distance: {:.1} km</text>
"##,
            self.margin,
            escape(title),
            route.len(),
            total_km
        ));

        let transform = |p: &Point| -> (f64, f64) {
            let tx = self.margin + (p.lng - min_x) * scale;
            let ty = self.height - self.margin - (p.lat - min_y) * scale;
            (tx, ty)
        };

        svg.push_str(r##"<defs>
<marker id="arrow" markerWidth="10" markerHeight="10" refX="9" refY="3" orient="auto" markerUnits="strokeWidth">
<path d="M0,0 L0,6 L9,3 z" fill="#34495e"/>
</marker>
</defs>
"##);

        // Open path: no edge from the last stop back to the first
        for w in route.windows(2) {
            let (x1, y1) = transform(&w[0]);
            let (x2, y2) = transform(&w[1]);

            svg.push_str(&format!(
                r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" class="edge" marker-end="url(#arrow)"/>
"#,
                x1, y1, x2, y2
            ));
        }

        let last = route.len().saturating_sub(1);
        for (i, p) in route.iter().enumerate() {
            let (x, y) = transform(p);

            let class = if i == 0 {
                "start"
            } else if i == last {
                "end"
            } else {
                "node"
            };

            svg.push_str(&format!(
                r##"<circle cx="{:.2}" cy="{:.2}" r="{}" class="{}"/>
"##,
                x, y, self.node_radius, class
            ));

            svg.push_str(&format!(
                r##"<text x="{:.2}" y="{:.2}" class="label" text-anchor="middle">{}</text>
"##,
                x, y - self.node_radius - 3.0, i + 1
            ));
        }

        let legend_y = self.height - 30.0;
        svg.push_str(&format!(r##"
<rect x="{}" y="{}" width="15" height="15" class="start"/>
<text x="{}" y="{}" class="label">Start</text>
<rect x="{}" y="{}" width="15" height="15" class="node"/>
<text x="{}" y="{}" class="label">Stop</text>
<rect x="{}" y="{}" width="15" height="15" class="end"/>
<text x="{}" y="{}" class="label">End</text>
"##,
            self.margin, legend_y, self.margin + 20.0, legend_y + 12.0,
            self.margin + 80.0, legend_y, self.margin + 100.0, legend_y + 12.0,
            self.margin + 160.0, legend_y, self.margin + 180.0, legend_y + 12.0
        ));

        svg.push_str("</svg>");

        svg
    }

    /// Generate a bar chart of great-circle leg distances
    pub fn generate_leg_chart_svg(&self, title: &str, route: &[Point]) -> String {
        let legs: Vec<f64> = route.windows(2).map(|w| haversine_km(&w[0], &w[1])).collect();
        let mut svg = String::new();

        let width = self.width;
        let height = 300.0;
        let margin = 50.0;

        svg.push_str(&format!(
            r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">
<style>
    .bar {{ fill: #3498db; stroke: #2c3e50; stroke-width: 1; }}
    .axis {{ stroke: #2c3e50; stroke-width: 1; }}
    .label {{ font-family: Arial; font-size: 12px; fill: #2c3e50; }}
    .title {{ font-family: Arial; font-size: 14px; fill: #2c3e50; font-weight: bold; }}
</style>
<rect width="100%" height="100%" fill="#ecf0f1"/>
"##,
            width, height, width, height
        ));

        svg.push_str(&format!(
            r#"<text x="{}" y="25" class="title">Leg distances (km) - {}</text>
"#,
            margin,
            escape(title)
        ));

        let plot_width = width - 2.0 * margin;
        let plot_height = height - 2.0 * margin;
        let baseline = height - margin;

        svg.push_str(&format!(
            r##"<line x1="{}" y1="{}" x2="{}" y2="{}" class="axis"/>
<line x1="{}" y1="{}" x2="{}" y2="{}" class="axis"/>
"##,
            margin, baseline, width - margin, baseline,
            margin, margin, margin, baseline
        ));

        let max_leg = legs.iter().cloned().fold(0.0, f64::max);
        let y_scale = if max_leg > 0.0 { plot_height / max_leg } else { 0.0 };
        let slot = plot_width / legs.len().max(1) as f64;
        let bar_width = (slot * 0.7).max(1.0);

        svg.push_str(&format!(
            r#"<text x="{}" y="{}" class="label" text-anchor="end">{:.1}</text>
"#,
            margin - 5.0, margin + 4.0, max_leg
        ));

        for (i, &leg) in legs.iter().enumerate() {
            let x = margin + i as f64 * slot + (slot - bar_width) / 2.0;
            let h = leg * y_scale;

            svg.push_str(&format!(
                r##"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" class="bar"/>
"##,
                x, baseline - h, bar_width, h
            ));
            svg.push_str(&format!(
                r##"<text x="{:.2}" y="{:.2}" class="label" text-anchor="middle">{}-{}</text>
"##,
                x + bar_width / 2.0, baseline + 15.0, i + 1, i + 2
            ));
        }

        svg.push_str("</svg>");

        svg
    }

    /// Save SVG to file
    pub fn save_svg<P: AsRef<Path>>(&self, svg: &str, path: P) -> std::io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(svg.as_bytes())?;
        Ok(())
    }

    /// Save SVG as PNG.
    /// Uses resvg with the `native-png` feature, otherwise tries `rsvg-convert`,
    /// then `magick convert`, then `inkscape`.
    pub fn save_png<P: AsRef<Path>>(&self, svg: &str, path: P) -> std::io::Result<()> {
        Self::svg_to_png_file(svg, path.as_ref())
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
    }

    /// Render an SVG string directly to PNG file using available renderer.
    pub fn svg_to_png_file(svg: &str, out: &Path) -> Result<(), Box<dyn std::error::Error>> {
        #[cfg(feature = "native-png")]
        {
            let opt = usvg::Options::default();
            let rtree = usvg::Tree::from_str(svg, &opt)?;
            let (w, h) = Self::svg_size(svg);
            let mut pixmap = Pixmap::new(w, h).ok_or("Failed to create pixmap")?;
            render(&rtree, FitTo::Original, Transform::default(), pixmap.as_mut()).ok_or("resvg render failed")?;
            pixmap.save_png(out)?;
            return Ok(());
        }

        #[cfg(not(feature = "native-png"))]
        {
            let tmp = out.with_extension("svg.tmp");
            std::fs::write(&tmp, svg)?;
            let tmp_owned = tmp.to_string_lossy().to_string();
            let out_owned = out.to_string_lossy().to_string();
            let tmp_s: &str = &tmp_owned;
            let out_s: &str = &out_owned;

            let attempts: [(&str, Vec<&str>); 3] = [
                ("rsvg-convert", vec!["-o", out_s, tmp_s]),
                ("magick", vec!["convert", tmp_s, out_s]),
                ("inkscape", vec![tmp_s, "--export-type=png", "--export-filename", out_s]),
            ];

            for (program, args) in attempts.iter() {
                if let Ok(status) = Command::new(program).args(args).status() {
                    if status.success() {
                        let _ = std::fs::remove_file(&tmp);
                        return Ok(());
                    }
                }
            }

            let _ = std::fs::remove_file(&tmp);
            Err("No SVG->PNG converter succeeded (tried rsvg-convert, magick, inkscape)".into())
        }
    }

    /// Canvas size from the `width`/`height` attributes, 800x800 if absent
    #[cfg_attr(not(feature = "native-png"), allow(dead_code))]
    fn svg_size(svg: &str) -> (u32, u32) {
        let attr = |name: &str| -> Option<u32> {
            let (_, rest) = svg.split_once(&format!("{}=\"", name))?;
            let (value, _) = rest.split_once('"')?;
            value.parse::<f64>().ok().map(|v| v.max(1.0) as u32)
        };
        (attr("width").unwrap_or(800), attr("height").unwrap_or(800))
    }

    /// Get coordinate bounds as (min_lng, max_lng, min_lat, max_lat)
    fn get_bounds(&self, route: &[Point]) -> (f64, f64, f64, f64) {
        if route.is_empty() {
            return (0.0, 1.0, 0.0, 1.0);
        }

        let mut min_x = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_y = f64::NEG_INFINITY;

        for p in route {
            min_x = min_x.min(p.lng);
            max_x = max_x.max(p.lng);
            min_y = min_y.min(p.lat);
            max_y = max_y.max(p.lat);
        }

        (min_x, max_x, min_y, max_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route() -> Vec<Point> {
        vec![
            Point::new(28.6139, 77.2090),
            Point::new(27.1767, 78.0081),
            Point::new(26.9124, 75.7873),
        ]
    }

    #[test]
    fn test_visualizer_open_path() {
        let viz = Visualizer::new();
        let svg = viz.generate_svg("Golden <Triangle>", &route());

        assert!(svg.contains("svg"));
        assert!(svg.contains("Golden &lt;Triangle&gt;"));
        assert!(svg.contains("Stops: 3"));
        // three stops, two legs
        assert_eq!(svg.matches("class=\"edge\"").count(), 2);
        assert_eq!(svg.matches("<circle").count(), 3);
    }

    #[test]
    fn test_leg_chart_has_one_bar_per_leg() {
        let viz = Visualizer::new();
        let svg = viz.generate_leg_chart_svg("trip", &route());
        assert_eq!(svg.matches("class=\"bar\"").count(), 2);
        assert!(svg.contains("1-2"));
        assert!(svg.contains("2-3"));
    }

    #[test]
    fn test_degenerate_routes_render() {
        let viz = Visualizer::new();
        assert!(viz.generate_svg("empty", &[]).ends_with("</svg>"));
        let single = viz.generate_svg("one", &[Point::new(1.0, 1.0)]);
        assert_eq!(single.matches("class=\"edge\"").count(), 0);
        assert!(viz.generate_leg_chart_svg("none", &[]).ends_with("</svg>"));
    }

    #[test]
    fn test_svg_size() {
        assert_eq!(Visualizer::svg_size(r#"<svg width="640" height="300">"#), (640, 300));
        assert_eq!(Visualizer::svg_size("<svg>"), (800, 800));
    }

    #[test]
    fn test_save_svg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("route.svg");
        let viz = Visualizer::new();
        viz.save_svg(&viz.generate_svg("t", &route()), &path).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().starts_with("<?xml"));
    }
}
