//! Plain-text and JSON output for an analysis result.

use seasonal_core::knowledge::{Occasion, Recommendation};
use seasonal_core::{SeasonEntry, SeasonReport};
use std::fmt::Write;

pub fn text(report: &SeasonReport, entry: &SeasonEntry, occasion: Option<(&str, &Occasion)>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Your color season: {}", report.season);
    let _ = writeln!(out, "{}", entry.description);

    section(&mut out, "Best colors", &entry.colors);
    section(&mut out, "Avoid", &entry.avoid);
    section(&mut out, "Hair colors", &entry.hair);
    section(&mut out, "Makeup", &entry.makeup);
    section(&mut out, "Jewelry", &entry.jewelry);

    if let Some((name, occasion)) = occasion {
        let _ = writeln!(out, "\n{name} outfit");
        let _ = writeln!(out, "  Outfit:      {}", occasion.outfit);
        let _ = writeln!(out, "  Shoes:       {}", occasion.shoes);
        let _ = writeln!(out, "  Accessories: {}", occasion.accessories);
        let _ = writeln!(out, "  Makeup:      {}", occasion.makeup);
    }

    if !entry.occasions.is_empty() {
        let names: Vec<&str> = entry.occasions.keys().map(String::as_str).collect();
        let _ = writeln!(out, "\nOccasions: {}", names.join(", "));
    }
    out
}

pub fn json(
    report: &SeasonReport,
    entry: &SeasonEntry,
    occasion: Option<(&str, &Occasion)>,
) -> serde_json::Value {
    serde_json::json!({
        "season": report.season,
        "analysis": report,
        "recommendations": entry,
        "occasion": occasion.map(|(name, o)| serde_json::json!({ "name": name, "details": o })),
    })
}

fn section(out: &mut String, title: &str, items: &[Recommendation]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n{title}");
    for item in items {
        let _ = writeln!(out, "  - {}: {}", item.name, item.reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seasonal_core::reducer::Clustering;
    use seasonal_core::{FaceRegion, Hsv, KnowledgeBase, Season};

    fn report() -> SeasonReport {
        let dominant = Hsv::new(5, 200, 200);
        SeasonReport {
            season: Season::TrueWinter,
            face: FaceRegion { x: 0, y: 0, width: 200, height: 200, confidence: 0.9 },
            sample_count: 100,
            dominant,
            clustering: Clustering {
                centroids: vec![dominant; 3],
                sizes: vec![100, 0, 0],
                inertia: 0.0,
            },
        }
    }

    #[test]
    fn test_text_lists_recommendations_and_occasion() {
        let kb = KnowledgeBase::embedded().unwrap();
        let entry = kb.lookup(Season::TrueWinter).unwrap();
        let out = text(&report(), entry, entry.occasion(Some("Cocktail Party")));

        assert!(out.starts_with("Your color season: True Winter\n"));
        assert!(out.contains("  - Royal Blue: Enhances natural coolness"));
        assert!(out.contains("Cocktail Party outfit"));
        assert!(out.contains("Silver metallic heels"));
    }

    #[test]
    fn test_json_shape() {
        let kb = KnowledgeBase::embedded().unwrap();
        let entry = kb.lookup(Season::TrueWinter).unwrap();
        let value = json(&report(), entry, entry.occasion(None));

        assert_eq!(value["season"], "True Winter");
        assert_eq!(value["analysis"]["sample_count"], 100);
        assert_eq!(value["occasion"]["name"], "Business Formal");
        assert!(value["recommendations"]["colors"].is_array());
    }
}
