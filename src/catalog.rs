use crate::config::{DownloadConfig, SearchEntry, UrlEntry};
use crate::models::SEARCH_MIN_BYTES;
use crate::{DownloadError, Result};

pub const DEFAULT_PRESET: &str = "products";

const DATE_IDEAS_DIR: &str = "images/date-ideas";

#[derive(Debug, Clone, Copy)]
pub struct PresetInfo {
    pub name: &'static str,
    pub description: &'static str,
}

pub const PRESETS: &[PresetInfo] = &[
    PresetInfo {
        name: "products",
        description: "inline product page list (empty; pass a JSON file instead)",
    },
    PresetInfo {
        name: "date-ideas",
        description: "Valentine's date ideas, direct Pexels URLs",
    },
    PresetInfo {
        name: "date-ideas-v2",
        description: "couple-focused alternatives, two per idea",
    },
    PresetInfo {
        name: "date-ideas-final",
        description: "verified Pexels photo ids, two per idea",
    },
    PresetInfo {
        name: "date-ideas-search",
        description: "Pexels API keyword searches (needs PEXELS_API_KEY)",
    },
];

/// Built-in download list, used when no config file is given.
pub fn preset(name: &str) -> Result<DownloadConfig> {
    match name {
        "products" => Ok(DownloadConfig {
            output_dir: Some("images".to_string()),
            ..DownloadConfig::default()
        }),
        "date-ideas" => Ok(direct_list(DATE_IDEAS_DIR, 1_000, DATE_IDEAS)),
        "date-ideas-v2" => Ok(direct_list(DATE_IDEAS_DIR, 1_000, DATE_IDEAS_V2)),
        "date-ideas-final" => Ok(date_ideas_final()),
        "date-ideas-search" => Ok(date_ideas_search()),
        other => Err(DownloadError::UnknownPreset(other.to_string())),
    }
}

/// Compressed 1200px rendition of a Pexels photo.
pub fn pexels_url(photo_id: u64) -> String {
    format!(
        "https://images.pexels.com/photos/{photo_id}/pexels-photo-{photo_id}.jpeg?auto=compress&cs=tinysrgb&w=1200"
    )
}

fn direct_list(output_dir: &str, min_bytes: u64, entries: &[(&str, &str)]) -> DownloadConfig {
    DownloadConfig {
        output_dir: Some(output_dir.to_string()),
        min_bytes: Some(min_bytes),
        images: entries
            .iter()
            .map(|(filename, url)| UrlEntry {
                url: url.to_string(),
                filename: filename.to_string(),
                min_bytes: None,
            })
            .collect(),
        ..DownloadConfig::default()
    }
}

const DATE_IDEAS: &[(&str, &str)] = &[
    ("spa-thermal-baths.jpg", "https://images.pexels.com/photos/3188/love-romantic-bath-candlelight.jpg?auto=compress&cs=tinysrgb&w=1200"),
    ("love-letters.jpg", "https://images.pexels.com/photos/745045/pexels-photo-745045.jpeg?auto=compress&cs=tinysrgb&w=1200"),
    ("vision-board.jpg", "https://images.pexels.com/photos/7176026/pexels-photo-7176026.jpeg?auto=compress&cs=tinysrgb&w=1200"),
    ("ice-skating.jpg", "https://images.pexels.com/photos/1839151/pexels-photo-1839151.jpeg?auto=compress&cs=tinysrgb&w=1200"),
    ("bike-ride.jpg", "https://images.pexels.com/photos/1578750/pexels-photo-1578750.jpeg?auto=compress&cs=tinysrgb&w=1200"),
    ("picnic-park.jpg", "https://images.pexels.com/photos/1656579/pexels-photo-1656579.jpeg?auto=compress&cs=tinysrgb&w=1200"),
    ("board-games.jpg", "https://images.pexels.com/photos/4691567/pexels-photo-4691567.jpeg?auto=compress&cs=tinysrgb&w=1200"),
    ("restaurant-date.jpg", "https://images.pexels.com/photos/1267320/pexels-photo-1267320.jpeg?auto=compress&cs=tinysrgb&w=1200"),
    ("cocktail-night.jpg", "https://images.pexels.com/photos/5947019/pexels-photo-5947019.jpeg?auto=compress&cs=tinysrgb&w=1200"),
    ("camping-tent.jpg", "https://images.pexels.com/photos/2398220/pexels-photo-2398220.jpeg?auto=compress&cs=tinysrgb&w=1200"),
];

const DATE_IDEAS_V2: &[(&str, &str)] = &[
    ("camping-tent-a.jpg", "https://images.pexels.com/photos/6271625/pexels-photo-6271625.jpeg?auto=compress&cs=tinysrgb&w=1200"),
    ("camping-tent-b.jpg", "https://images.pexels.com/photos/7363069/pexels-photo-7363069.jpeg?auto=compress&cs=tinysrgb&w=1200"),
    ("cocktail-night-a.jpg", "https://images.pexels.com/photos/5490965/pexels-photo-5490965.jpeg?auto=compress&cs=tinysrgb&w=1200"),
    ("cocktail-night-b.jpg", "https://images.pexels.com/photos/3171815/pexels-photo-3171815.jpeg?auto=compress&cs=tinysrgb&w=1200"),
    ("picnic-park-a.jpg", "https://images.pexels.com/photos/1322185/pexels-photo-1322185.jpeg?auto=compress&cs=tinysrgb&w=1200"),
    ("picnic-park-b.jpg", "https://images.pexels.com/photos/5765828/pexels-photo-5765828.jpeg?auto=compress&cs=tinysrgb&w=1200"),
    ("bike-ride-a.jpg", "https://images.pexels.com/photos/2549018/pexels-photo-2549018.jpeg?auto=compress&cs=tinysrgb&w=1200"),
    ("bike-ride-b.jpg", "https://images.pexels.com/photos/1548771/pexels-photo-1548771.jpeg?auto=compress&cs=tinysrgb&w=1200"),
    ("ice-skating-a.jpg", "https://images.pexels.com/photos/1216544/pexels-photo-1216544.jpeg?auto=compress&cs=tinysrgb&w=1200"),
    ("ice-skating-b.jpg", "https://images.pexels.com/photos/5858106/pexels-photo-5858106.jpeg?auto=compress&cs=tinysrgb&w=1200"),
    ("vision-board-a.jpg", "https://images.pexels.com/photos/8112172/pexels-photo-8112172.jpeg?auto=compress&cs=tinysrgb&w=1200"),
    ("vision-board-b.jpg", "https://images.pexels.com/photos/5428833/pexels-photo-5428833.jpeg?auto=compress&cs=tinysrgb&w=1200"),
    ("love-letters-a.jpg", "https://images.pexels.com/photos/6205509/pexels-photo-6205509.jpeg?auto=compress&cs=tinysrgb&w=1200"),
    ("love-letters-b.jpg", "https://images.pexels.com/photos/4226896/pexels-photo-4226896.jpeg?auto=compress&cs=tinysrgb&w=1200"),
];

const DATE_IDEAS_FINAL: &[(&str, u64)] = &[
    ("camping-final-a.jpg", 6324452),
    ("camping-final-b.jpg", 6324456),
    ("cocktail-final-a.jpg", 3859842),
    ("cocktail-final-b.jpg", 3171815),
    ("picnic-final-a.jpg", 5119609),
    ("picnic-final-b.jpg", 19759639),
    ("bike-final-a.jpg", 10509678),
    ("bike-final-b.jpg", 8350895),
    ("skating-final-a.jpg", 6712141),
    ("skating-final-b.jpg", 6711948),
    ("vision-final-a.jpg", 6899260),
    ("vision-final-b.jpg", 4348401),
    ("letters-final-a.jpg", 1809347),
    ("letters-final-b.jpg", 6205759),
];

fn date_ideas_final() -> DownloadConfig {
    let mut config = direct_list(DATE_IDEAS_DIR, 5_000, &[]);
    config.images = DATE_IDEAS_FINAL
        .iter()
        .map(|(filename, photo_id)| UrlEntry {
            url: pexels_url(*photo_id),
            filename: filename.to_string(),
            min_bytes: None,
        })
        .collect();
    config
}

const DATE_IDEAS_SEARCHES: &[(&str, [&str; 2])] = &[
    ("couple camping tent night romantic", ["camping-tent-v3a.jpg", "camping-tent-v3b.jpg"]),
    ("couple making cocktails together home", ["cocktail-night-v3a.jpg", "cocktail-night-v3b.jpg"]),
    ("couple picnic park romantic blanket", ["picnic-park-v3a.jpg", "picnic-park-v3b.jpg"]),
    ("couple cycling biking together", ["bike-ride-v3a.jpg", "bike-ride-v3b.jpg"]),
    ("couple ice skating romantic winter", ["ice-skating-v3a.jpg", "ice-skating-v3b.jpg"]),
    ("couple crafting creative project together", ["vision-board-v3a.jpg", "vision-board-v3b.jpg"]),
    ("couple writing letter romantic pen paper", ["love-letters-v3a.jpg", "love-letters-v3b.jpg"]),
];

fn date_ideas_search() -> DownloadConfig {
    DownloadConfig {
        output_dir: Some(DATE_IDEAS_DIR.to_string()),
        min_bytes: Some(SEARCH_MIN_BYTES),
        searches: DATE_IDEAS_SEARCHES
            .iter()
            .map(|(query, filenames)| SearchEntry {
                query: query.to_string(),
                filenames: filenames.iter().map(|f| f.to_string()).collect(),
                min_bytes: None,
            })
            .collect(),
        ..DownloadConfig::default()
    }
}
