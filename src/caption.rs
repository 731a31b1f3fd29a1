/// `"<title> by <channel> #tag #tag"`. Tags may be given with or without the
/// leading `#`; empty ones are dropped.
pub fn share_caption<S: AsRef<str>>(title: &str, channel: &str, hashtags: &[S]) -> String {
    let mut caption = format!("{} by {}", title.trim(), channel.trim());
    for tag in hashtags {
        let tag = tag.as_ref().trim().trim_start_matches('#');
        if tag.is_empty() {
            continue;
        }
        caption.push_str(" #");
        caption.push_str(tag);
    }
    caption
}

/// Splits free-form hashtag input on whitespace and commas.
pub fn parse_hashtags(input: &str) -> Vec<&str> {
    input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|tag| !tag.is_empty())
        .collect()
}
