use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use url::Url;

// matches the quoted uri attribute inside #EXT-X-KEY / #EXT-X-MAP lines
static URI_ATTRIBUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)URI="([^"]+)""#).expect("uri attribute regex should compile"));

/// what a single manifest line is, decided on its trimmed form
/// classification never mutates - the rewrite pass works on the raw line
#[derive(Debug, PartialEq, Eq)]
pub enum PlaylistLine<'a> {
    Blank,
    /// any other tag or comment, passed through verbatim
    Directive(&'a str),
    /// #EXT-X-KEY or #EXT-X-MAP, only the URI="..." attribute gets rewritten
    KeyDirective(&'a str),
    /// bare segment or variant-playlist reference
    Resource(&'a str),
}

pub fn classify(line: &str) -> PlaylistLine<'_> {
    let trimmed = line.trim();

    if trimmed.is_empty() {
        PlaylistLine::Blank
    } else if trimmed.starts_with("#EXT-X-KEY") || trimmed.starts_with("#EXT-X-MAP") {
        PlaylistLine::KeyDirective(trimmed)
    } else if trimmed.starts_with('#') {
        PlaylistLine::Directive(trimmed)
    } else {
        PlaylistLine::Resource(trimmed)
    }
}

pub struct PlaylistRewriter;

impl PlaylistRewriter {
    /// rewrite every resource reference in an m3u8 so it routes back through /proxy/hls
    ///
    /// `base` must be the final post-redirect manifest url, relative segment paths
    /// resolve against it. line count and order are preserved, a reference that fails
    /// to resolve keeps its original text instead of failing the whole manifest.
    pub fn rewrite(text: &str, base: &Url, proxy_origin: &str) -> String {
        let lines: Vec<String> = text
            .split('\n')
            .map(|line| match classify(line) {
                PlaylistLine::Blank | PlaylistLine::Directive(_) => line.to_string(),
                PlaylistLine::KeyDirective(_) => Self::rewrite_uri_attribute(line, base, proxy_origin),
                PlaylistLine::Resource(reference) => {
                    match base.join(reference) {
                        Ok(absolute) => Self::proxy_url(absolute.as_str(), proxy_origin),
                        Err(e) => {
                            debug!("leaving unresolvable reference as-is: {} - {}", reference, e);
                            line.to_string()
                        }
                    }
                }
            })
            .collect();

        lines.join("\n")
    }

    /// swap only the quoted value of URI="...", everything else on the line stays put
    fn rewrite_uri_attribute(line: &str, base: &Url, proxy_origin: &str) -> String {
        URI_ATTRIBUTE
            .replace(line, |caps: &regex::Captures| {
                let uri = &caps[1];
                match base.join(uri) {
                    Ok(absolute) => {
                        format!(r#"URI="{}""#, Self::proxy_url(absolute.as_str(), proxy_origin))
                    }
                    Err(e) => {
                        debug!("leaving unresolvable key uri as-is: {} - {}", uri, e);
                        caps[0].to_string()
                    }
                }
            })
            .into_owned()
    }

    fn proxy_url(absolute_url: &str, proxy_origin: &str) -> String {
        format!(
            "{}/proxy/hls?src={}",
            proxy_origin,
            urlencoding::encode(absolute_url)
        )
    }
}
