use std::sync::Arc;

use regex::Regex;

use super::{parse_base, send_checked, truncate_chars, SNIPPET_MAX_CHARS};
use crate::error::ThreadlineError;
use crate::provider::http::shared_client;
use crate::tools::tool::{AgentTool, Tool, ToolExecutionContext};
use crate::tools::types::ToolParameters;

const TOOL: &str = "youtube_transcript";
const SERVICE: &str = "YouTube";

/// Create the `youtube_transcript` tool. Reads the caption track advertised
/// on the watch page under `base_url` (e.g. `https://www.youtube.com`).
pub fn youtube_transcript_tool(base_url: &str) -> Arc<dyn Tool> {
    let base_url = base_url.to_string();
    Arc::new(AgentTool::new(
        TOOL,
        "Fetches the transcript of a given YouTube video URL.",
        ToolParameters::object()
            .string("videoUrl", "The full URL of the YouTube video.", true)
            .build(),
        move |args, _ctx: ToolExecutionContext| {
            let base_url = base_url.clone();
            async move {
                let video_url = args.get_str("videoUrl")?;
                let Some(video_id) = extract_video_id(video_url) else {
                    return Err(ThreadlineError::tool(
                        TOOL,
                        format!("could not extract a valid YouTube video ID from the URL: {video_url}"),
                    ));
                };
                fetch_transcript(&base_url, &video_id).await
            }
        },
    ))
}

/// Video ID from a watch, short, embed or `youtu.be` URL, or a bare ID.
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();
    let candidate = match reqwest::Url::parse(input) {
        Ok(url) => match url.host_str()? {
            "www.youtube.com" | "youtube.com" | "m.youtube.com" => {
                let mut segments = url.path_segments()?;
                match segments.next() {
                    Some("watch") => url
                        .query_pairs()
                        .find(|(key, _)| key == "v")
                        .map(|(_, value)| value.into_owned()),
                    Some("shorts") | Some("embed") | Some("live") => {
                        segments.next().map(str::to_string)
                    }
                    _ => None,
                }
            }
            "youtu.be" => url.path_segments()?.next().map(str::to_string),
            _ => None,
        },
        Err(_) => Some(input.to_string()),
    }?;
    is_video_id(&candidate).then_some(candidate)
}

fn is_video_id(candidate: &str) -> bool {
    candidate.len() == 11
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

async fn fetch_transcript(base_url: &str, video_id: &str) -> Result<String, ThreadlineError> {
    let mut url = parse_base(TOOL, base_url)?;
    url.path_segments_mut()
        .map_err(|_| ThreadlineError::tool(TOOL, format!("invalid endpoint '{base_url}'")))?
        .pop_if_empty()
        .push("watch");

    let request = shared_client()
        .get(url)
        .query(&[("v", video_id)])
        .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9");
    let page = send_checked(TOOL, SERVICE, request)
        .await?
        .text()
        .await
        .map_err(|e| ThreadlineError::tool(TOOL, format!("unreadable watch page: {e}")))?;

    let Some(track_url) = caption_track_url(&page)? else {
        return Ok(no_transcript(video_id));
    };
    let xml = send_checked(TOOL, SERVICE, shared_client().get(&track_url))
        .await?
        .text()
        .await
        .map_err(|e| ThreadlineError::tool(TOOL, format!("unreadable caption track: {e}")))?;

    let transcript = caption_text(&xml)?;
    if transcript.is_empty() {
        return Ok(no_transcript(video_id));
    }
    let (snippet, truncated) = truncate_chars(&transcript, SNIPPET_MAX_CHARS);
    let mut out = format!("Transcript for YouTube video ID {video_id}:\n{snippet}");
    if truncated {
        out.push_str("... (truncated)");
    }
    Ok(out)
}

fn no_transcript(video_id: &str) -> String {
    format!("No transcript found for YouTube video ID: {video_id}. The video might not have captions.")
}

fn compile(pattern: &str) -> Result<Regex, ThreadlineError> {
    Regex::new(pattern).map_err(|e| ThreadlineError::tool(TOOL, e.to_string()))
}

/// First caption track `baseUrl` embedded in the watch page's player config.
fn caption_track_url(page: &str) -> Result<Option<String>, ThreadlineError> {
    let tracks = compile(r#"(?s)"captionTracks":\s*\[(.*?)\]"#)?;
    let base_url = compile(r#""baseUrl":"([^"]+)""#)?;
    Ok(tracks
        .captures(page)
        .and_then(|caps| base_url.captures(caps.get(1)?.as_str()))
        .and_then(|caps| caps.get(1))
        .map(|m| {
            m.as_str()
                .replace("\\u0026", "&")
                .replace("\\u003d", "=")
                .replace("\\/", "/")
        }))
}

/// Plain text of a timed-text XML track, cues joined by spaces.
fn caption_text(xml: &str) -> Result<String, ThreadlineError> {
    let cue = compile(r"(?s)<text[^>]*>(.*?)</text>")?;
    let cues: Vec<String> = cue
        .captures_iter(xml)
        .filter_map(|caps| caps.get(1))
        .map(|m| decode_entities(m.as_str()))
        .filter(|text| !text.is_empty())
        .collect();
    Ok(cues.join(" "))
}

fn decode_entities(raw: &str) -> String {
    raw.replace("&amp;", "&")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace('\n', " ")
        .trim()
        .to_string()
}
