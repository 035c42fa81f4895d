//! Static lookup tables used when rendering notifications.

/// GeoNet shaking descriptions indexed by Modified Mercalli intensity − 1.
const INTENSITY_DESCRIPTIONS: [&str; 12] = [
    "unnoticeable",
    "unnoticeable",
    "weak",
    "light",
    "moderate",
    "strong",
    "severe",
    "extreme",
    "extreme",
    "extreme",
    "extreme",
    "extreme",
];

/// Display names for volcanoes whose feed title lacks the dual name.
const VOLCANO_DISPLAY_NAMES: &[(&str, &str)] = &[
    ("whiteisland", "Whakaari/White Island"),
    ("taranakiegmont", "Taranaki/Mt Egmont"),
];

/// Hashtags for volcanoes whose display name does not collapse cleanly.
const VOLCANO_HASHTAGS: &[(&str, &str)] = &[
    ("whiteisland", "Whakaari"),
    ("taranakiegmont", "Taranaki"),
    ("aucklandvolcanicfield", "AucklandVolcanicField"),
];

/// Describes the shaking for an intensity in 1–12.
///
/// Returns `None` outside that range.
pub fn intensity_description(mmi: u8) -> Option<&'static str> {
    usize::from(mmi)
        .checked_sub(1)
        .and_then(|i| INTENSITY_DESCRIPTIONS.get(i))
        .copied()
}

/// Name to show for a volcano, falling back to the feed title.
pub fn volcano_display_name<'a>(id: &str, title: &'a str) -> &'a str {
    lookup(VOLCANO_DISPLAY_NAMES, id).unwrap_or(title)
}

/// Hashtag (without `#`) for a volcano.
///
/// Uses the override table, otherwise strips everything but letters and
/// digits from the feed title.
pub fn volcano_hashtag(id: &str, title: &str) -> String {
    match lookup(VOLCANO_HASHTAGS, id) {
        Some(tag) => tag.to_string(),
        None => title.chars().filter(|c| c.is_alphanumeric()).collect(),
    }
}

fn lookup(table: &'static [(&'static str, &'static str)], id: &str) -> Option<&'static str> {
    table.iter().find(|(key, _)| *key == id).map(|(_, v)| *v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intensity_bounds() {
        assert_eq!(intensity_description(0), None);
        assert_eq!(intensity_description(1), Some("unnoticeable"));
        assert_eq!(intensity_description(4), Some("light"));
        assert_eq!(intensity_description(12), Some("extreme"));
        assert_eq!(intensity_description(13), None);
    }

    #[test]
    fn display_name_override() {
        assert_eq!(
            volcano_display_name("whiteisland", "White Island"),
            "Whakaari/White Island"
        );
        assert_eq!(volcano_display_name("ruapehu", "Ruapehu"), "Ruapehu");
    }

    #[test]
    fn hashtags() {
        assert_eq!(volcano_hashtag("whiteisland", "White Island"), "Whakaari");
        assert_eq!(volcano_hashtag("kermadecislands", "Kermadec Islands"), "KermadecIslands");
        assert_eq!(volcano_hashtag("tongariro", "Tongariro"), "Tongariro");
    }
}
