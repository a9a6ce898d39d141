pub mod http;

use once_cell::sync::Lazy;
use regex::Regex;

static URL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://[^\s]+").unwrap());

static FILENAME_FORBIDDEN_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[\\/*?:"<>|]"#).unwrap());

/// Telegram's ceiling for media captions.
pub const CAPTION_LIMIT: usize = 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRequest {
    pub url: String,
    pub clean: bool,
    pub audio: bool,
    pub translate: bool,
}

/// Extracts the first URL from free text and derives the intent flags from
/// the surrounding tokens. Pure and panic-free; text without a URL yields
/// `None` and the caller no-ops.
pub fn parse_request(text: &str) -> Option<ParsedRequest> {
    let found = URL_REGEX.find(text)?;
    let url = found.as_str().to_string();

    let mut rest = String::with_capacity(text.len() - url.len());
    rest.push_str(&text[..found.start()]);
    rest.push_str(&text[found.end()..]);
    let rest = rest.to_lowercase();

    let audio = rest.contains("!a") || rest.contains("audio") || rest.contains("аудіо");
    let clean = rest.contains('-') || rest.contains('!') || rest.contains("clear") || rest.contains("чисто");
    let translate = rest
        .split_whitespace()
        .any(|token| token == "translate" || token == "переклад" || token == "tr");

    Some(ParsedRequest {
        url,
        clean,
        audio,
        translate,
    })
}

pub fn sanitize_filename(name: &str) -> String {
    let cleaned = FILENAME_FORBIDDEN_REGEX.replace_all(name, "");
    let cleaned = cleaned.replace('\n', " ");
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        return "audio".to_string();
    }

    cleaned.chars().take(50).collect()
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(text: &str) -> String {
    escape_html(text).replace('"', "&quot;")
}

/// Escapes a caption body, truncating to `budget` characters of escaped
/// output. Truncation appends an ellipsis and never splits an entity.
fn escape_truncated(body: &str, budget: usize) -> String {
    let full = escape_html(body);
    if full.chars().count() <= budget {
        return full;
    }

    let mut out = String::new();
    let mut used = 0usize;
    for ch in body.chars() {
        let len = match ch {
            '&' => 5,
            '<' | '>' => 4,
            _ => 1,
        };
        if used + len > budget.saturating_sub(1) {
            break;
        }
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
        used += len;
    }
    out.push('…');
    out
}

/// Builds the outgoing HTML caption: linked author, optional body paragraph,
/// trailing link back to the source. Author names and bodies are untrusted
/// and escaped; an over-long body is truncated so the author/source frame
/// always survives intact.
pub fn build_caption(author_name: &str, author_url: &str, body: &str, source_url: &str) -> String {
    let header = format!(
        "👤 <a href=\"{}\"><b>{}</b></a>",
        escape_attr(author_url),
        escape_html(author_name)
    );
    let footer = format!("🔗 <a href=\"{}\">Оригінал</a>", escape_attr(source_url));

    let body = body.trim();
    if body.is_empty() {
        return format!("{}\n\n{}", header, footer);
    }

    let frame_chars = header.chars().count() + footer.chars().count() + "\n\n📝 \n\n".chars().count();
    let budget = CAPTION_LIMIT.saturating_sub(frame_chars);

    format!("{}\n\n📝 {}\n\n{}", header, escape_truncated(body, budget), footer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_extracts_exactly_the_url() {
        let req = parse_request("check this https://example-shortvideo.com/@alice/video/123 -").unwrap();
        assert_eq!(req.url, "https://example-shortvideo.com/@alice/video/123");
        assert!(req.clean);
        assert!(!req.audio);
        assert!(!req.translate);
    }

    #[test]
    fn parse_flags_come_from_tokens_outside_the_url() {
        // "-" inside the URL path must not trigger clean mode
        let req = parse_request("https://x.com/some-user/status/1").unwrap();
        assert!(!req.clean);

        let req = parse_request("audio https://x.com/u/status/1").unwrap();
        assert!(req.audio);

        let req = parse_request("!a https://x.com/u/status/1").unwrap();
        assert!(req.audio);
        assert!(req.clean);

        let req = parse_request("переклад https://x.com/u/status/1").unwrap();
        assert!(req.translate);
        assert!(!req.clean);

        let req = parse_request("чисто https://x.com/u/status/1").unwrap();
        assert!(req.clean);
    }

    #[test]
    fn parse_without_url_is_none() {
        assert_eq!(parse_request(""), None);
        assert_eq!(parse_request("just words, no link"), None);
    }

    #[test]
    fn sanitize_filename_strips_forbidden_chars() {
        assert_eq!(sanitize_filename("DJ / Bee: <Loop>?"), "DJ  Bee Loop");
        assert_eq!(sanitize_filename("line\nbreak"), "line break");
        assert_eq!(sanitize_filename(""), "audio");
        assert_eq!(sanitize_filename("///"), "audio");

        let long = "x".repeat(120);
        assert_eq!(sanitize_filename(&long).chars().count(), 50);
    }

    #[test]
    fn caption_without_body_is_header_and_footer() {
        let caption = build_caption("Alice", "https://x.com/alice", "", "https://x.com/alice/status/1");
        assert_eq!(
            caption,
            "👤 <a href=\"https://x.com/alice\"><b>Alice</b></a>\n\n🔗 <a href=\"https://x.com/alice/status/1\">Оригінал</a>"
        );
    }

    #[test]
    fn caption_escapes_untrusted_author_and_body() {
        let caption = build_caption(
            "Eve <script>",
            "https://x.com/eve?a=1&b=\"2\"",
            "1 < 2 & 3 > 2",
            "https://x.com/eve/status/1",
        );

        assert!(caption.contains("<b>Eve &lt;script&gt;</b>"));
        assert!(caption.contains("href=\"https://x.com/eve?a=1&amp;b=&quot;2&quot;\""));
        assert!(caption.contains("📝 1 &lt; 2 &amp; 3 &gt; 2"));
    }

    #[test]
    fn long_captions_truncate_the_body_and_keep_the_frame() {
        let body = "słowo ".repeat(400);
        let caption = build_caption("Alice", "https://x.com/alice", &body, "https://x.com/alice/status/1");

        assert!(caption.chars().count() <= CAPTION_LIMIT);
        assert!(caption.ends_with("🔗 <a href=\"https://x.com/alice/status/1\">Оригінал</a>"));
        assert!(caption.contains('…'));
        assert!(caption.starts_with("👤 <a href=\"https://x.com/alice\"><b>Alice</b></a>"));
    }

    #[test]
    fn truncation_never_splits_an_entity() {
        // a body of only ampersands forces the cut to land between entities
        let body = "&".repeat(2000);
        let caption = build_caption("A", "https://e.com/a", &body, "https://e.com/p/1");

        assert!(caption.chars().count() <= CAPTION_LIMIT);
        let body_part = caption
            .split("📝 ")
            .nth(1)
            .and_then(|s| s.split("\n\n").next())
            .unwrap();
        let trimmed = body_part.trim_end_matches('…');
        assert!(trimmed.chars().count() % 5 == 0, "entities must stay whole: {}", trimmed);
    }
}
