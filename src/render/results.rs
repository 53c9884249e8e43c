//! Terminal and JSON rendering of a search report.

use std::io::Write;
use std::path::PathBuf;

use colored::Colorize;
use unicode_width::UnicodeWidthStr;

use super::map::{render_map, MapRenderer};
use crate::error::Result;
use crate::search::engine::{SearchHit, SearchReport};

const WRAP_WIDTH: usize = 96;
const INDENT: &str = "   ";

fn map_title(report: &SearchReport, rank: usize) -> String {
    format!("{} {}", report.query, rank)
}

/// Draw one map per hit that has geocoded points.
fn draw_maps(report: &SearchReport, map: Option<&dyn MapRenderer>) -> Result<Vec<Option<PathBuf>>> {
    report
        .hits
        .iter()
        .enumerate()
        .map(|(i, hit)| match (map, hit.points.as_deref()) {
            (Some(renderer), Some(points)) => render_map(renderer, points, &map_title(report, i + 1)),
            _ => Ok(None),
        })
        .collect()
}

/// Print every hit: metadata fields, score, context and map location.
pub fn render_results(
    out: &mut dyn Write,
    report: &SearchReport,
    map: Option<&dyn MapRenderer>,
) -> Result<()> {
    if report.hits.is_empty() {
        writeln!(out, "{} No results found for: {}", "→".dimmed(), report.query.cyan())?;
        return Ok(());
    }

    let maps = draw_maps(report, map)?;

    writeln!(out, "{}", report.query.bold().cyan())?;
    writeln!(out)?;

    for (i, (hit, map_path)) in report.hits.iter().zip(&maps).enumerate() {
        render_hit(out, i + 1, hit)?;
        if let Some(path) = map_path {
            writeln!(out, "{}{} {}", INDENT, "Map:".dimmed(), path.display())?;
        } else if map.is_some() && hit.points.as_ref().map(Vec::is_empty).unwrap_or(false) {
            writeln!(out, "{}{}", INDENT, "No places found in context".dimmed())?;
        }
        writeln!(out)?;
    }

    Ok(())
}

fn render_hit(out: &mut dyn Write, rank: usize, hit: &SearchHit) -> Result<()> {
    writeln!(
        out,
        "{}. {}",
        rank.to_string().bold(),
        format!("(row {})", hit.index).dimmed()
    )?;

    for field in &hit.fields {
        let value = field.value.as_deref().unwrap_or("-");
        writeln!(out, "{}{}", INDENT, format!("{}: {}", field.label, value).italic().dimmed())?;
    }

    let score = format!("{:.3}", hit.score);
    writeln!(out, "{}{} {}", INDENT, "Similarity Score:".dimmed(), score.green())?;

    for line in hit.context.lines() {
        for wrapped in wrap(line, WRAP_WIDTH) {
            writeln!(out, "{}{}", INDENT, wrapped)?;
        }
    }

    if let Some(points) = &hit.points {
        for p in points {
            writeln!(
                out,
                "{}{} {} ({:.2}, {:.2}) x{}",
                INDENT,
                "•".red(),
                p.place,
                p.latitude,
                p.longitude,
                p.mentions
            )?;
        }
    }
    Ok(())
}

/// Emit the report as pretty JSON, with map paths when maps were drawn.
pub fn render_json(
    out: &mut dyn Write,
    report: &SearchReport,
    map: Option<&dyn MapRenderer>,
) -> Result<()> {
    let maps = draw_maps(report, map)?;
    let hits: Vec<_> = report
        .hits
        .iter()
        .zip(&maps)
        .map(|(hit, map_path)| {
            serde_json::json!({
                "index": hit.index,
                "score": (hit.score as f64 * 1000.0).round() / 1000.0,
                "fields": hit.fields,
                "context": hit.context,
                "entities": hit.entities,
                "places": hit.points,
                "map": map_path.as_ref().map(|p| p.display().to_string()),
            })
        })
        .collect();

    let body = serde_json::json!({ "query": report.query, "results": hits });
    let text = serde_json::to_string_pretty(&body)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    writeln!(out, "{}", text)?;
    Ok(())
}

/// Greedy word wrap by display width.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && current.width() + 1 + word.width() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeocodedPoint;
    use crate::search::context::EntityCounts;
    use crate::search::engine::FieldValue;
    use std::cell::RefCell;

    struct RecordingRenderer {
        titles: RefCell<Vec<String>>,
    }

    impl MapRenderer for RecordingRenderer {
        fn render(&self, _points: &[GeocodedPoint], title: &str) -> Result<Option<PathBuf>> {
            self.titles.borrow_mut().push(title.to_string());
            Ok(Some(PathBuf::from(format!("maps/{}.svg", title.replace(' ', "-")))))
        }
    }

    fn report(points: Option<Vec<GeocodedPoint>>) -> SearchReport {
        SearchReport {
            query: "weather".to_string(),
            hits: vec![SearchHit {
                index: 2,
                score: 0.455_84,
                fields: vec![FieldValue {
                    label: "Book".to_string(),
                    value: Some("Twenty Years After".to_string()),
                }],
                context: "Lyon is industrial.\nThe weather was bad.".to_string(),
                entities: EntityCounts::from([("Lyon".to_string(), 1)]),
                points,
            }],
        }
    }

    fn render_to_string(report: &SearchReport, map: Option<&dyn MapRenderer>) -> String {
        colored::control::set_override(false);
        let mut out = Vec::new();
        render_results(&mut out, report, map).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_text_output_rounds_score_and_shows_context() {
        let text = render_to_string(&report(None), None);
        assert!(text.contains("Similarity Score: 0.456"));
        assert!(text.contains("Book: Twenty Years After"));
        assert!(text.contains("   Lyon is industrial.\n   The weather was bad.\n"));
        assert!(!text.contains("Map:"));
    }

    #[test]
    fn test_fields_come_before_score_and_context() {
        let text = render_to_string(&report(None), None);
        let field = text.find("Book: Twenty Years After").unwrap();
        let score = text.find("Similarity Score:").unwrap();
        let context = text.find("Lyon is industrial.").unwrap();
        assert!(field < score && score < context, "{text}");
    }

    #[test]
    fn test_map_drawn_only_for_hits_with_points() {
        let renderer = RecordingRenderer {
            titles: RefCell::new(Vec::new()),
        };
        let lyon = GeocodedPoint {
            place: "Lyon".to_string(),
            latitude: 45.75,
            longitude: 4.85,
            mentions: 1,
        };

        let text = render_to_string(&report(Some(vec![lyon])), Some(&renderer));
        assert!(text.contains("Map: maps/weather-1.svg"));
        assert_eq!(renderer.titles.borrow().as_slice(), ["weather 1".to_string()]);

        let text = render_to_string(&report(Some(Vec::new())), Some(&renderer));
        assert!(text.contains("No places found in context"));
        assert_eq!(renderer.titles.borrow().len(), 1);
    }

    #[test]
    fn test_empty_report() {
        let empty = SearchReport {
            query: "nothing".to_string(),
            hits: Vec::new(),
        };
        assert!(render_to_string(&empty, None).contains("No results found for: nothing"));
    }

    #[test]
    fn test_json_output() {
        let mut out = Vec::new();
        render_json(&mut out, &report(None), None).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["query"], "weather");
        assert_eq!(value["results"][0]["index"], 2);
        assert_eq!(value["results"][0]["score"], 0.456);
        assert_eq!(value["results"][0]["entities"]["Lyon"], 1);
        assert!(value["results"][0]["map"].is_null());
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap("one two three", 7), vec!["one two", "three"]);
        assert_eq!(wrap("", 10), vec![""]);
        assert_eq!(wrap("unbreakable", 4), vec!["unbreakable"]);
    }
}
