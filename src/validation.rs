use lazy_regex::regex_is_match;
use url::Url;

pub const PLAYLIST_NAME_MAX_CHARS: usize = 100;

const YOUTUBE_HOSTS: &[&str] = &[
    "www.youtube.com",
    "youtube.com",
    "m.youtube.com",
    "music.youtube.com",
    "youtu.be",
];

/// Accepts YouTube mix/playlist links, i.e. URLs that carry a `list` parameter.
pub fn is_youtube_playlist_url(youtube_url: &str) -> bool {
    let Ok(parsed) = Url::parse(youtube_url.trim()) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    if !YOUTUBE_HOSTS.contains(&host) {
        return false;
    }
    youtube_playlist_id(&parsed).is_some()
}

pub fn youtube_playlist_id(parsed: &Url) -> Option<String> {
    parsed
        .query_pairs()
        .find_map(|(key, value)| (key == "list").then(|| value.into_owned()))
        .filter(|list_id| !list_id.is_empty())
}

pub fn is_playlist_name_allowed(name: &str) -> bool {
    let length = name.chars().count();
    if length == 0 || length > PLAYLIST_NAME_MAX_CHARS {
        return false;
    }
    !regex_is_match!(r#"[<>:"/\\|?*]"#, name)
}
