//! Static skill descriptor printed by `pdfstitch --skill-info`.
//!
//! Agent frameworks discover tools by reading this record; nothing in it
//! touches the conversion pipeline.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub author: String,
    pub category: String,
    pub tags: Vec<String>,
    pub language: String,
    pub framework: String,
    pub features: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Descriptor for this build.
pub fn skill_info() -> SkillInfo {
    SkillInfo {
        name: "pdfstitch".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        description: "Render every page of a PDF and stitch them into one long image, \
                      scrollable like a slideshow"
            .into(),
        author: "EdgeQuake".into(),
        category: "tools".into(),
        tags: strings(&["pdf", "image", "convert", "document", "slides"]),
        language: "Rust".into(),
        framework: "pdfium-render, image".into(),
        features: strings(&[
            "PDF to page images",
            "Vertical image stitching",
            "Custom DPI",
            "Custom page spacing",
            "Batch conversion",
            "Convert from URL",
        ]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_tracks_cargo() {
        let info = skill_info();
        assert_eq!(info.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(info.name, "pdfstitch");
        assert!(info.tags.iter().any(|t| t == "pdf"));
    }

    #[test]
    fn serialises_to_flat_json() {
        let json = serde_json::to_value(skill_info()).unwrap();
        assert!(json["features"].as_array().unwrap().len() >= 6);
        assert_eq!(json["language"], "Rust");
    }
}
