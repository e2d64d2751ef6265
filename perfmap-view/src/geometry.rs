//! Province boundary geometry and canvas projection
//!
//! The boundary dataset is a GeoJSON `FeatureCollection` whose features carry
//! `Polygon` or `MultiPolygon` geometries in `[longitude, latitude]` order.
//! [`Projection`] fits the whole collection onto a fixed logical canvas,
//! preserving aspect ratio, with the y axis flipped so north is up.

use serde::Deserialize;
use std::fmt::Write as _;
use thiserror::Error;

/// Logical canvas width
pub const CANVAS_WIDTH: f64 = 800.0;

/// Logical canvas height
pub const CANVAS_HEIGHT: f64 = 600.0;

/// Margin kept free on every side of the canvas
pub const CANVAS_PADDING: f64 = 40.0;

/// Why a collection cannot be projected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("map data contains no coordinates")]
    EmptyBounds,

    #[error("all map coordinates coincide")]
    Degenerate,
}

/// A position; any elements after longitude and latitude are ignored
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "Vec<f64>")]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl TryFrom<Vec<f64>> for Coord {
    type Error = String;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        match values.as_slice() {
            [x, y, ..] => Ok(Coord::new(*x, *y)),
            _ => Err(format!("position needs two numbers, got {}", values.len())),
        }
    }
}

/// Closed sequence of positions
pub type Ring = Vec<Coord>;

/// Outer ring followed by any holes
pub type Polygon = Vec<Ring>;

/// Feature geometry
///
/// Anything other than `Polygon`/`MultiPolygon` (including a `null` geometry)
/// becomes `Unsupported` instead of failing the whole document.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(try_from = "Option<RawGeometry>")]
pub enum Geometry {
    Polygon(Polygon),
    MultiPolygon(Vec<Polygon>),
    #[default]
    Unsupported,
}

#[derive(Deserialize)]
struct RawGeometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: serde_json::Value,
}

impl TryFrom<Option<RawGeometry>> for Geometry {
    type Error = serde_json::Error;

    fn try_from(raw: Option<RawGeometry>) -> Result<Self, Self::Error> {
        let Some(raw) = raw else {
            return Ok(Geometry::Unsupported);
        };
        match raw.kind.as_str() {
            "Polygon" => Ok(Geometry::Polygon(serde_json::from_value(raw.coordinates)?)),
            "MultiPolygon" => Ok(Geometry::MultiPolygon(serde_json::from_value(raw.coordinates)?)),
            _ => Ok(Geometry::Unsupported),
        }
    }
}

impl Geometry {
    /// The polygons of this geometry (empty when unsupported)
    pub fn polygons(&self) -> &[Polygon] {
        match self {
            Geometry::Polygon(polygon) => std::slice::from_ref(polygon),
            Geometry::MultiPolygon(polygons) => polygons,
            Geometry::Unsupported => &[],
        }
    }

    fn coords(&self) -> impl Iterator<Item = &Coord> {
        self.polygons().iter().flatten().flatten()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeatureProperties {
    #[serde(default)]
    pub name: String,
}

/// One province outline
#[derive(Debug, Clone, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub properties: Option<FeatureProperties>,
    #[serde(default)]
    pub geometry: Geometry,
}

impl Feature {
    /// Source province name (empty when the feature has none)
    pub fn name(&self) -> &str {
        self.properties.as_ref().map_or("", |p| p.name.as_str())
    }
}

/// GeoJSON `FeatureCollection`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Axis-aligned bounding box in source coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    fn at(c: Coord) -> Self {
        Self {
            min_x: c.x,
            min_y: c.y,
            max_x: c.x,
            max_y: c.y,
        }
    }

    fn include(&mut self, c: Coord) {
        self.min_x = self.min_x.min(c.x);
        self.min_y = self.min_y.min(c.y);
        self.max_x = self.max_x.max(c.x);
        self.max_y = self.max_y.max(c.y);
    }

    /// Bounds over every coordinate of every ring of every feature
    ///
    /// `None` when the collection holds no supported coordinates.
    pub fn of(collection: &FeatureCollection) -> Option<Self> {
        let mut coords = collection
            .features
            .iter()
            .flat_map(|feature| feature.geometry.coords())
            .copied();
        let mut bounds = Bounds::at(coords.next()?);
        for c in coords {
            bounds.include(c);
        }
        Some(bounds)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Uniform-scale projection from source coordinates onto the canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    bounds: Bounds,
    scale: f64,
    height: f64,
    padding: f64,
}

impl Projection {
    /// Projection onto the standard 800×600 canvas with 40 units of padding
    pub fn new(bounds: Bounds) -> Result<Self, GeometryError> {
        Self::with_canvas(bounds, CANVAS_WIDTH, CANVAS_HEIGHT, CANVAS_PADDING)
    }

    /// Projection onto an arbitrary canvas
    ///
    /// An axis with zero span does not constrain the scale; when both do, the
    /// projection is degenerate.
    pub fn with_canvas(
        bounds: Bounds,
        width: f64,
        height: f64,
        padding: f64,
    ) -> Result<Self, GeometryError> {
        let fit = |available: f64, span: f64| (span > 0.0).then(|| available / span);
        let scale = match (
            fit(width - 2.0 * padding, bounds.width()),
            fit(height - 2.0 * padding, bounds.height()),
        ) {
            (Some(sx), Some(sy)) => sx.min(sy),
            (Some(s), None) | (None, Some(s)) => s,
            (None, None) => return Err(GeometryError::Degenerate),
        };

        Ok(Self {
            bounds,
            scale,
            height,
            padding,
        })
    }

    /// Fit a whole collection onto the standard canvas
    pub fn for_collection(collection: &FeatureCollection) -> Result<Self, GeometryError> {
        let bounds = Bounds::of(collection).ok_or(GeometryError::EmptyBounds)?;
        Self::new(bounds)
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Canvas position of a source coordinate
    pub fn project(&self, c: Coord) -> (f64, f64) {
        let x = self.padding + (c.x - self.bounds.min_x) * self.scale;
        let y = self.height - (self.padding + (c.y - self.bounds.min_y) * self.scale);
        (x, y)
    }

    /// SVG path data for a geometry
    ///
    /// Every ring becomes one closed subpath (`M`, `L`…, `Z`); subpaths are
    /// separated by a space. Unsupported geometry yields an empty string.
    pub fn path(&self, geometry: &Geometry) -> String {
        let mut subpaths = Vec::new();
        for ring in geometry.polygons().iter().flatten() {
            let mut d = String::new();
            for (i, c) in ring.iter().enumerate() {
                let (x, y) = self.project(*c);
                let command = if i == 0 { 'M' } else { 'L' };
                if i > 0 {
                    d.push(' ');
                }
                // Writing to a String cannot fail
                let _ = write!(d, "{}{:.2},{:.2}", command, x, y);
            }
            if !d.is_empty() {
                d.push_str(" Z");
                subpaths.push(d);
            }
        }
        subpaths.join(" ")
    }

    /// Label anchor: mean of the projected outer-ring points of every polygon
    pub fn center(&self, geometry: &Geometry) -> Option<(f64, f64)> {
        let points: Vec<(f64, f64)> = geometry
            .polygons()
            .iter()
            .filter_map(|polygon| polygon.first())
            .flatten()
            .map(|c| self.project(*c))
            .collect();
        if points.is_empty() {
            return None;
        }
        let n = points.len() as f64;
        let (sx, sy) = points
            .iter()
            .fold((0.0, 0.0), |(ax, ay), (x, y)| (ax + x, ay + y));
        Some((sx / n, sy / n))
    }
}
