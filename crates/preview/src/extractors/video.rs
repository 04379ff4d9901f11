// ABOUTME: Video field extraction: schema VideoObject first, then embeds, URL ID parsing and Open Graph.
// ABOUTME: Recognizes YouTube, Vimeo and Dailymotion URLs and builds canonical embed URLs.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use super::duration::normalize_duration;
use super::fields::{extract_field_text_single, extract_first_attr, host_of, resolve_url};
use crate::classify::video_platform;
use crate::dom::ParsedDocument;
use crate::images::resolve_image_url;
use crate::preview::VideoDetails;
use crate::schema::{SchemaSet, VIDEO_TYPES};

static YOUTUBE_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").unwrap());

const EMBED_IFRAME_SELECTOR: &str = "iframe[src*='youtube.com/embed/'], iframe[src*='youtube-nocookie.com/embed/'], iframe[src*='player.vimeo.com/video/'], iframe[src*='dailymotion.com/embed/video/']";

const OG_VIDEO_SELECTORS: &[&str] = &[
    "meta[property='og:video:secure_url']",
    "meta[property='og:video:url']",
    "meta[property='og:video']",
    "meta[name='twitter:player']",
];

const DURATION_SELECTORS: &[&str] = &[
    "meta[itemprop='duration']",
    "meta[property='video:duration']",
    "meta[property='og:video:duration']",
];

const CHANNEL_SELECTORS: &[&str] = &[
    "[itemprop='author'] [itemprop='name']",
    "link[itemprop='name']",
    ".channel-name",
    ".ytd-channel-name",
    "meta[name='author']",
];

/// A video identified on a known platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRef {
    pub platform: &'static str,
    pub id: String,
}

impl VideoRef {
    /// Canonical embeddable player URL.
    pub fn embed_url(&self) -> String {
        match self.platform {
            "YouTube" => format!("https://www.youtube.com/embed/{}", self.id),
            "Vimeo" => format!("https://player.vimeo.com/video/{}", self.id),
            _ => format!("https://www.dailymotion.com/embed/video/{}", self.id),
        }
    }

    /// Platform-provided thumbnail, when the ID alone is enough to build one.
    pub fn thumbnail_url(&self) -> Option<String> {
        (self.platform == "YouTube")
            .then(|| format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", self.id))
    }
}

fn youtube_id(url: &Url, host: &str) -> Option<String> {
    let candidate = if host == "youtu.be" {
        url.path_segments()?.next().map(str::to_string)
    } else if let Some(v) = url.query_pairs().find(|(k, _)| k == "v") {
        Some(v.1.into_owned())
    } else {
        let mut segments = url.path_segments()?;
        match segments.next() {
            Some("embed" | "shorts" | "live" | "v") => segments.next().map(str::to_string),
            _ => None,
        }
    };
    let candidate = candidate?;
    YOUTUBE_ID_RE.is_match(&candidate).then_some(candidate)
}

fn vimeo_id(url: &Url) -> Option<String> {
    url.path_segments()?
        .filter(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))
        .last()
        .map(str::to_string)
}

fn dailymotion_id(url: &Url, host: &str) -> Option<String> {
    let mut segments = url.path_segments()?;
    let raw = if host == "dai.ly" {
        segments.next()?
    } else {
        segments.find(|s| *s == "video")?;
        segments.next()?
    };
    // Slugs look like `x8abc12_some-title`.
    let id = raw.split('_').next()?;
    (!id.is_empty()).then(|| id.to_string())
}

/// Identify a YouTube, Vimeo or Dailymotion video from a page or embed URL.
pub fn parse_video_url(raw: &str) -> Option<VideoRef> {
    let url = Url::parse(raw).ok()?;
    let host = host_of(raw)?;
    let matches = |domain: &str| host == domain || host.ends_with(&format!(".{domain}"));

    if matches("youtube.com") || matches("youtube-nocookie.com") || host == "youtu.be" {
        return youtube_id(&url, &host).map(|id| VideoRef {
            platform: "YouTube",
            id,
        });
    }
    if matches("vimeo.com") {
        return vimeo_id(&url).map(|id| VideoRef {
            platform: "Vimeo",
            id,
        });
    }
    if matches("dailymotion.com") || host == "dai.ly" {
        return dailymotion_id(&url, &host).map(|id| VideoRef {
            platform: "Dailymotion",
            id,
        });
    }
    None
}

/// Video details: schema first, then embeds, URL ID parsing and Open Graph.
pub fn extract_video(doc: &ParsedDocument, page_url: &str, schemas: &SchemaSet) -> VideoDetails {
    let record = schemas.find(VIDEO_TYPES);
    let record = record.as_ref();

    let page_ref = parse_video_url(page_url);

    let iframe_src = extract_first_attr(doc, &[EMBED_IFRAME_SELECTOR], "src")
        .and_then(|src| resolve_url(&src, page_url));

    let embed_url = record
        .and_then(|r| r.text_at(&["embedUrl"]))
        .and_then(|u| resolve_url(&u, page_url))
        .or(iframe_src)
        .or_else(|| page_ref.as_ref().map(VideoRef::embed_url))
        .or_else(|| {
            extract_first_attr(doc, OG_VIDEO_SELECTORS, "content")
                .and_then(|u| resolve_url(&u, page_url))
        });

    let video_ref = page_ref.or_else(|| embed_url.as_deref().and_then(parse_video_url));

    let platform = video_platform(page_url)
        .or_else(|| video_ref.as_ref().map(|v| v.platform))
        .map(str::to_string);

    let thumbnail = record
        .and_then(|r| r.first_text(&[&["thumbnailUrl"], &["thumbnail", "url"], &["image"]]))
        .and_then(|u| resolve_image_url(&u, page_url))
        .or_else(|| {
            extract_first_attr(
                doc,
                &["meta[property='og:image']", "meta[name='twitter:image']"],
                "content",
            )
            .and_then(|u| resolve_image_url(&u, page_url))
        })
        .or_else(|| video_ref.as_ref().and_then(VideoRef::thumbnail_url));

    let duration = record
        .and_then(|r| r.text_at(&["duration"]))
        .or_else(|| extract_first_attr(doc, DURATION_SELECTORS, "content"))
        .and_then(|d| normalize_duration(&d));

    let channel = record
        .and_then(|r| {
            r.first_text(&[
                &["author", "name"],
                &["author"],
                &["creator", "name"],
                &["publisher", "name"],
            ])
        })
        .or_else(|| extract_field_text_single(doc, CHANNEL_SELECTORS));

    VideoDetails {
        embed_url,
        video_id: video_ref.map(|v| v.id),
        platform,
        thumbnail,
        duration,
        channel,
    }
}
