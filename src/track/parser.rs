/// Separator between the artist and the title in a video title.
pub const TITLE_SEPARATOR: &str = " - ";

/// Trailing markers removed from a parsed title, checked in order.
/// Only the first one that matches is removed.
pub const NOISE_SUFFIXES: &[&str] = &[
    "(Official Music Video)",
    "(Official Video)",
    "[Official Music Video]",
    "[Official Video]",
    "/ Official Video",
    "(Official Lyric Video)",
    "(Lyric Video)",
    "(Official Audio)",
    "(Official Visualizer)",
    "(Visualizer)",
    "(Audio)",
];

/// Splits a raw video title into `(artist, title)`.
///
/// Titles without an `"Artist - Title"` shape come back with an empty artist and
/// the trimmed input as the title, so they can still be searched by title alone.
pub fn parse_title(raw_title: &str) -> (String, String) {
    let trimmed = raw_title.trim();
    let Some((artist, title)) = trimmed.split_once(TITLE_SEPARATOR) else {
        return (String::new(), trimmed.to_string());
    };
    let artist = artist.trim();
    let title = title.trim();
    if artist.is_empty() || title.is_empty() {
        return (String::new(), trimmed.to_string());
    }
    (artist.to_string(), strip_noise_suffix(title).to_string())
}

fn strip_noise_suffix(title: &str) -> &str {
    for suffix in NOISE_SUFFIXES {
        if let Some(stripped) = strip_suffix_ignore_ascii_case(title, suffix) {
            let stripped = stripped.trim();
            // "Artist - (Official Video)" keeps the marker rather than an empty title
            if stripped.is_empty() {
                return title;
            }
            return stripped;
        }
    }
    title
}

fn strip_suffix_ignore_ascii_case<'a>(value: &'a str, suffix: &str) -> Option<&'a str> {
    let split_at = value.len().checked_sub(suffix.len())?;
    if !value.is_char_boundary(split_at) {
        return None;
    }
    let (head, tail) = value.split_at(split_at);
    tail.eq_ignore_ascii_case(suffix).then_some(head)
}
