//! Geocode command - single gazetteer lookup

use anyhow::Result;
use colored::Colorize;

use corpus_search::{geocode, Config, GeoNames};

pub fn run(config: &Config, place: &str, json: bool) -> Result<()> {
    let gazetteer = GeoNames::from_config(&config.gazetteer)?;
    let coords = geocode(&gazetteer, place)?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "place": place,
                "found": coords.is_some(),
                "latitude": coords.map(|c| c.latitude),
                "longitude": coords.map(|c| c.longitude),
            })
        );
        return Ok(());
    }

    match coords {
        Some(c) => println!(
            "{} {} ({:.4}, {:.4})",
            "✓".green().bold(),
            place.cyan(),
            c.latitude,
            c.longitude
        ),
        None => println!(
            "{} No gazetteer match for: {}",
            "→".dimmed(),
            place.cyan()
        ),
    }

    Ok(())
}
