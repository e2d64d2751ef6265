//! SVG output for the province map and the bubble field

use std::fmt::Write as _;

use crate::geometry::{FeatureCollection, Projection, CANVAS_HEIGHT, CANVAS_WIDTH};
use crate::index::ProvinceIndex;
use crate::layout::Bubble;

/// Fill for provinces without events
const EMPTY_FILL: (u8, u8, u8) = (232, 238, 245);

/// Fill for the busiest province
const FULL_FILL: (u8, u8, u8) = (31, 95, 168);

/// Fill for provinces where the selected artist performed
const HIGHLIGHT_FILL: &str = "#f5a623";

const BADGE_RADIUS: f64 = 10.0;

/// Escape text for use in SVG content and attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Linear blend between the empty and full fills
pub fn shade(intensity: f64) -> String {
    let t = if intensity.is_finite() { intensity.clamp(0.0, 1.0) } else { 0.0 };
    let mix = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
    format!(
        "#{:02x}{:02x}{:02x}",
        mix(EMPTY_FILL.0, FULL_FILL.0),
        mix(EMPTY_FILL.1, FULL_FILL.1),
        mix(EMPTY_FILL.2, FULL_FILL.2)
    )
}

/// Standalone SVG document of the province map
///
/// Each feature is shaded by its event count relative to the busiest
/// province; provinces where `selected_artist` performed are highlighted.
/// Provinces with events get a count badge at their center.
pub fn render_map(
    collection: &FeatureCollection,
    projection: &Projection,
    index: &ProvinceIndex,
    selected_artist: Option<&str>,
) -> String {
    let max = index.max_count().max(1) as f64;
    let mut svg = String::new();
    let mut badges = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" width="{w}" height="{h}">"#,
        w = CANVAS_WIDTH,
        h = CANVAS_HEIGHT
    );
    svg.push_str("<g class=\"provinces\" stroke=\"#ffffff\" stroke-width=\"0.5\" fill-rule=\"evenodd\">\n");

    for feature in &collection.features {
        let d = projection.path(&feature.geometry);
        if d.is_empty() {
            continue;
        }
        let name = feature.name();
        let count = index.count(name);
        let fill = match selected_artist {
            Some(artist) if index.has_artist(name, artist) => HIGHLIGHT_FILL.to_string(),
            _ => shade(count as f64 / max),
        };
        let _ = writeln!(
            svg,
            r#"<path d="{}" fill="{}"><title>{} ({})</title></path>"#,
            d,
            fill,
            escape(name),
            count
        );

        if count > 0 {
            if let Some((cx, cy)) = projection.center(&feature.geometry) {
                let _ = writeln!(
                    badges,
                    r##"<circle cx="{cx:.2}" cy="{cy:.2}" r="{r}" fill="#d9534f"/><text x="{cx:.2}" y="{cy:.2}" text-anchor="middle" dominant-baseline="central" font-size="10" fill="#ffffff">{count}</text>"##,
                    cx = cx,
                    cy = cy,
                    r = BADGE_RADIUS,
                    count = count
                );
            }
        }
    }

    svg.push_str("</g>\n<g class=\"badges\">\n");
    svg.push_str(&badges);
    svg.push_str("</g>\n</svg>\n");
    svg
}

/// Standalone SVG document of the bubble field
pub fn render_bubbles(bubbles: &[Bubble], width: f64, height: f64) -> String {
    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" width="{w}" height="{h}">"#,
        w = width,
        h = height
    );
    for bubble in bubbles {
        let (cx, cy) = bubble.center();
        let _ = writeln!(
            svg,
            r##"<g class="bubble"><circle cx="{cx:.2}" cy="{cy:.2}" r="{r:.2}" fill="{fill}"/><text x="{cx:.2}" y="{cy:.2}" text-anchor="middle" dominant-baseline="central" font-size="12">{artist} ({count})</text></g>"##,
            cx = cx,
            cy = cy,
            r = bubble.size / 2.0,
            fill = shade(bubble.intensity),
            artist = escape(&bubble.artist),
            count = bubble.count
        );
    }
    svg.push_str("</svg>\n");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use perfmap_common::Performance;

    const MAP: &str = r#"{"features":[
        {"properties":{"name":"浙江省"},"geometry":{"type":"Polygon","coordinates":[[[0,0],[2,0],[2,2],[0,2],[0,0]]]}},
        {"properties":{"name":"四川省"},"geometry":{"type":"Polygon","coordinates":[[[4,0],[6,0],[6,2],[4,0]]]}},
        {"properties":{"name":"<odd & name>"},"geometry":{"type":"Polygon","coordinates":[[[7,1],[8,1],[8,2],[7,1]]]}},
        {"properties":{"name":"点"},"geometry":{"type":"Point","coordinates":[1,1]}}
    ]}"#;

    fn event(artist: &str, province: &str) -> Performance {
        Performance {
            id: 0,
            artist: artist.to_string(),
            kind: "concert".to_string(),
            province: province.to_string(),
            city: None,
            venue: None,
            notes: None,
            date: None,
            poster: None,
            created_at: Utc::now(),
        }
    }

    fn render(selected: Option<&str>) -> String {
        let collection = FeatureCollection::from_json(MAP).unwrap();
        let projection = Projection::for_collection(&collection).unwrap();
        let events = vec![event("A", "浙江"), event("B", "浙江省"), event("B", "四川")];
        let index = ProvinceIndex::build(&events);
        render_map(&collection, &projection, &index, selected)
    }

    #[test]
    fn test_shade_endpoints() {
        assert_eq!(shade(0.0), "#e8eef5");
        assert_eq!(shade(1.0), "#1f5fa8");
        assert_eq!(shade(7.0), "#1f5fa8");
        assert_eq!(shade(f64::NAN), "#e8eef5");
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a<b>&\"c'"), "a&lt;b&gt;&amp;&quot;c&apos;");
        assert_eq!(escape("浙江"), "浙江");
    }

    #[test]
    fn test_map_has_one_path_per_supported_feature() {
        let svg = render(None);
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"viewBox="0 0 800 600""#));
        assert_eq!(svg.matches("<path ").count(), 3);
        assert!(svg.contains("&lt;odd &amp; name&gt;"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_map_shades_by_count_and_badges_busy_provinces() {
        let svg = render(None);
        // 浙江 has the most events, the unnamed province none
        assert!(svg.contains(r##"fill="#1f5fa8"><title>浙江省 (2)</title>"##));
        assert!(svg.contains(r##"fill="#e8eef5"><title>&lt;odd &amp; name&gt; (0)</title>"##));
        assert_eq!(svg.matches("<circle").count(), 2);
    }

    #[test]
    fn test_map_highlights_selected_artist() {
        let svg = render(Some("A"));
        assert!(svg.contains(r##"fill="#f5a623"><title>浙江省 (2)</title>"##));
        assert!(!svg.contains(r##"fill="#f5a623"><title>四川省"##));
    }

    #[test]
    fn test_bubbles_svg() {
        let bubbles = vec![Bubble {
            artist: "A&B".to_string(),
            count: 2,
            size: 40.0,
            intensity: 1.0,
            x: 20.0,
            y: 30.0,
            vx: 0.0,
            vy: 0.0,
            phase: 0.0,
        }];
        let svg = render_bubbles(&bubbles, 300.0, 200.0);
        assert!(svg.contains(r#"cx="40.00" cy="50.00" r="20.00""#));
        assert!(svg.contains("A&amp;B (2)"));
    }
}
