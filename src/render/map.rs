//! Place maps.
//!
//! `SvgMapRenderer` draws the whitelisted country outlines from a GeoJSON
//! boundary file, overlays the geocoded points coloured by mention count
//! (white to red), and labels each point with its place name.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::config::MapConfig;
use crate::error::{Error, Result};
use crate::geo::GeocodedPoint;

const CANVAS_WIDTH: f64 = 800.0;
const MAX_CANVAS_HEIGHT: f64 = 1000.0;
const MARGIN_DEGREES: f64 = 1.0;
const GRID_STEP_DEGREES: f64 = 5.0;
const POINT_RADIUS: f64 = 5.0;

/// Ramp end points, light to dark.
const LIGHT_RED: (f64, f64, f64) = (254.0, 224.0, 210.0);
const DARK_RED: (f64, f64, f64) = (165.0, 15.0, 21.0);

pub trait MapRenderer {
    /// Draw `points`; returns where the map went. Nothing is drawn for an
    /// empty point list.
    fn render(&self, points: &[GeocodedPoint], title: &str) -> Result<Option<PathBuf>>;
}

pub fn render_map(
    renderer: &dyn MapRenderer,
    points: &[GeocodedPoint],
    title: &str,
) -> Result<Option<PathBuf>> {
    if points.is_empty() {
        return Ok(None);
    }
    renderer.render(points, title)
}

pub struct SvgMapRenderer {
    boundaries: PathBuf,
    regions: HashSet<String>,
    region_property: String,
    output_dir: PathBuf,
}

type Ring = Vec<(f64, f64)>;

struct Region {
    id: String,
    rings: Vec<Ring>,
}

impl SvgMapRenderer {
    pub fn from_config(config: &MapConfig) -> Self {
        Self {
            boundaries: config.boundaries.clone(),
            regions: config.regions.iter().cloned().collect(),
            region_property: config.region_property.clone(),
            output_dir: config.output_dir.clone(),
        }
    }

    fn load_regions(&self) -> Result<Vec<Region>> {
        let raw = fs::read_to_string(&self.boundaries)
            .map_err(|e| Error::Map(format!("{}: {}", self.boundaries.display(), e)))?;
        let geojson: Value = serde_json::from_str(&raw)
            .map_err(|e| Error::Map(format!("{}: {}", self.boundaries.display(), e)))?;

        let features = geojson
            .get("features")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::Map("boundary file has no \"features\" array".to_string()))?;

        let regions: Vec<Region> = features
            .iter()
            .filter_map(|feature| {
                let id = feature
                    .get("properties")?
                    .get(&self.region_property)?
                    .as_str()?;
                if !self.regions.contains(id) {
                    return None;
                }
                Some(Region {
                    id: id.to_string(),
                    rings: geometry_rings(feature.get("geometry")?),
                })
            })
            .collect();

        if regions.is_empty() {
            tracing::warn!(
                path = %self.boundaries.display(),
                "no whitelisted regions found in boundary file"
            );
        }
        Ok(regions)
    }
}

impl MapRenderer for SvgMapRenderer {
    fn render(&self, points: &[GeocodedPoint], title: &str) -> Result<Option<PathBuf>> {
        if points.is_empty() {
            return Ok(None);
        }

        let regions = self.load_regions()?;
        let svg = draw_svg(&regions, points, title);

        fs::create_dir_all(&self.output_dir)
            .map_err(|e| Error::Map(format!("{}: {}", self.output_dir.display(), e)))?;
        let path = unique_path(&self.output_dir, &slug(title));
        fs::write(&path, svg).map_err(|e| Error::Map(format!("{}: {}", path.display(), e)))?;

        tracing::info!(path = %path.display(), points = points.len(), "map written");
        Ok(Some(path))
    }
}

/// Outer and inner rings of a Polygon or MultiPolygon; other geometry
/// types yield nothing.
fn geometry_rings(geometry: &Value) -> Vec<Ring> {
    let coords = match geometry.get("coordinates") {
        Some(c) => c,
        None => return Vec::new(),
    };
    let polygons: Vec<&Value> = match geometry.get("type").and_then(Value::as_str) {
        Some("Polygon") => vec![coords],
        Some("MultiPolygon") => coords.as_array().map(|a| a.iter().collect()).unwrap_or_default(),
        _ => Vec::new(),
    };

    polygons
        .into_iter()
        .filter_map(Value::as_array)
        .flatten()
        .filter_map(|ring| {
            let ring: Ring = ring
                .as_array()?
                .iter()
                .filter_map(|pos| {
                    let pos = pos.as_array()?;
                    Some((pos.first()?.as_f64()?, pos.get(1)?.as_f64()?))
                })
                .collect();
            (ring.len() >= 3).then_some(ring)
        })
        .collect()
}

struct Bounds {
    min_lng: f64,
    max_lng: f64,
    min_lat: f64,
    max_lat: f64,
}

impl Bounds {
    fn covering(regions: &[Region], points: &[GeocodedPoint]) -> Self {
        let mut b = Bounds {
            min_lng: f64::INFINITY,
            max_lng: f64::NEG_INFINITY,
            min_lat: f64::INFINITY,
            max_lat: f64::NEG_INFINITY,
        };
        let coords = regions
            .iter()
            .flat_map(|r| r.rings.iter().flatten().copied())
            .chain(points.iter().map(|p| (p.longitude, p.latitude)));
        for (lng, lat) in coords {
            b.min_lng = b.min_lng.min(lng);
            b.max_lng = b.max_lng.max(lng);
            b.min_lat = b.min_lat.min(lat);
            b.max_lat = b.max_lat.max(lat);
        }
        b.min_lng -= MARGIN_DEGREES;
        b.max_lng += MARGIN_DEGREES;
        b.min_lat -= MARGIN_DEGREES;
        b.max_lat += MARGIN_DEGREES;
        b
    }
}

/// Equirectangular projection onto the canvas.
struct Projection {
    bounds: Bounds,
    scale: f64,
    height: f64,
}

impl Projection {
    fn new(bounds: Bounds) -> Self {
        let lng_span = bounds.max_lng - bounds.min_lng;
        let lat_span = bounds.max_lat - bounds.min_lat;
        let scale = (CANVAS_WIDTH / lng_span).min(MAX_CANVAS_HEIGHT / lat_span);
        Self {
            height: lat_span * scale,
            bounds,
            scale,
        }
    }

    fn project(&self, lng: f64, lat: f64) -> (f64, f64) {
        (
            (lng - self.bounds.min_lng) * self.scale,
            (self.bounds.max_lat - lat) * self.scale,
        )
    }
}

fn draw_svg(regions: &[Region], points: &[GeocodedPoint], title: &str) -> String {
    let projection = Projection::new(Bounds::covering(regions, points));
    let width = (projection.bounds.max_lng - projection.bounds.min_lng) * projection.scale;
    let height = projection.height;

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w:.0}\" height=\"{h:.0}\" viewBox=\"0 0 {w:.1} {h:.1}\">\n",
        w = width,
        h = height
    ));
    svg.push_str(&format!("<title>{}</title>\n", escape(title)));
    svg.push_str("<rect width=\"100%\" height=\"100%\" fill=\"#ffffff\"/>\n");

    for region in regions {
        let mut d = String::new();
        for ring in &region.rings {
            for (i, (lng, lat)) in ring.iter().enumerate() {
                let (x, y) = projection.project(*lng, *lat);
                d.push_str(&format!("{}{:.1},{:.1} ", if i == 0 { "M" } else { "L" }, x, y));
            }
            d.push_str("Z ");
        }
        svg.push_str(&format!(
            "<path data-region=\"{}\" d=\"{}\" fill=\"#1f77b4\" fill-rule=\"evenodd\" stroke=\"#ffffff\" stroke-width=\"0.5\"/>\n",
            escape(&region.id),
            d.trim_end()
        ));
    }

    draw_grid(&mut svg, &projection, width, height);

    let min_mentions = points.iter().map(|p| p.mentions).min().unwrap_or(0);
    let max_mentions = points.iter().map(|p| p.mentions).max().unwrap_or(0);
    for point in points {
        let (x, y) = projection.project(point.longitude, point.latitude);
        svg.push_str(&format!(
            "<circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"{}\" fill=\"{}\" stroke=\"#000000\" stroke-width=\"0.5\"><title>{} ({})</title></circle>\n",
            x,
            y,
            POINT_RADIUS,
            mention_color(point.mentions, min_mentions, max_mentions),
            escape(&point.place),
            point.mentions
        ));
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" font-family=\"sans-serif\" font-size=\"12\">{}</text>\n",
            x + POINT_RADIUS + 2.0,
            y - POINT_RADIUS,
            escape(&point.place)
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

fn draw_grid(svg: &mut String, projection: &Projection, width: f64, height: f64) {
    let b = &projection.bounds;
    let mut lng = (b.min_lng / GRID_STEP_DEGREES).ceil() * GRID_STEP_DEGREES;
    while lng <= b.max_lng {
        let (x, _) = projection.project(lng, b.max_lat);
        svg.push_str(&format!(
            "<line x1=\"{x:.1}\" y1=\"0\" x2=\"{x:.1}\" y2=\"{height:.1}\" stroke=\"#999999\" stroke-opacity=\"0.5\"/>\n"
        ));
        lng += GRID_STEP_DEGREES;
    }
    let mut lat = (b.min_lat / GRID_STEP_DEGREES).ceil() * GRID_STEP_DEGREES;
    while lat <= b.max_lat {
        let (_, y) = projection.project(b.min_lng, lat);
        svg.push_str(&format!(
            "<line x1=\"0\" y1=\"{y:.1}\" x2=\"{width:.1}\" y2=\"{y:.1}\" stroke=\"#999999\" stroke-opacity=\"0.5\"/>\n"
        ));
        lat += GRID_STEP_DEGREES;
    }
}

fn mention_color(mentions: usize, min: usize, max: usize) -> String {
    let t = if max > min {
        (mentions - min) as f64 / (max - min) as f64
    } else {
        1.0
    };
    let lerp = |a: f64, b: f64| (a + (b - a) * t).round() as u8;
    format!(
        "#{:02x}{:02x}{:02x}",
        lerp(LIGHT_RED.0, DARK_RED.0),
        lerp(LIGHT_RED.1, DARK_RED.1),
        lerp(LIGHT_RED.2, DARK_RED.2)
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn slug(title: &str) -> String {
    let slug = title
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        "map".to_string()
    } else {
        slug
    }
}

/// `<slug>.svg`, or `<slug>-<n>.svg` when that name is taken.
fn unique_path(dir: &Path, slug: &str) -> PathBuf {
    let first = dir.join(format!("{}.svg", slug));
    if !first.exists() {
        return first;
    }
    (2..)
        .map(|n| dir.join(format!("{}-{}.svg", slug, n)))
        .find(|p| !p.exists())
        .unwrap_or(first)
}
