use camproxy::server::utils::playlist_utils::{PlaylistLine, PlaylistRewriter, classify};
use url::Url;

fn base() -> Url {
    Url::parse("https://host/live/index.m3u8").unwrap()
}

#[test]
fn test_classification() {
    assert_eq!(classify(""), PlaylistLine::Blank);
    assert_eq!(classify("   "), PlaylistLine::Blank);
    assert_eq!(classify("#EXTM3U"), PlaylistLine::Directive("#EXTM3U"));
    assert_eq!(
        classify("#EXTINF:4.000,"),
        PlaylistLine::Directive("#EXTINF:4.000,")
    );
    assert_eq!(
        classify(r#"#EXT-X-KEY:METHOD=AES-128,URI="key1.bin""#),
        PlaylistLine::KeyDirective(r#"#EXT-X-KEY:METHOD=AES-128,URI="key1.bin""#)
    );
    assert_eq!(
        classify(r#"#EXT-X-MAP:URI="init.mp4""#),
        PlaylistLine::KeyDirective(r#"#EXT-X-MAP:URI="init.mp4""#)
    );
    assert_eq!(
        classify("segment1.ts"),
        PlaylistLine::Resource("segment1.ts")
    );
    assert_eq!(
        classify("https://cdn.example.com/variant/720p.m3u8"),
        PlaylistLine::Resource("https://cdn.example.com/variant/720p.m3u8")
    );
}

#[test]
fn test_directives_and_blanks_pass_through_untouched() {
    let manifest = "#EXTM3U\n#EXT-X-VERSION:3\n\n#EXT-X-TARGETDURATION:4\n#EXTINF:4.0,\n";

    let rewritten = PlaylistRewriter::rewrite(manifest, &base(), "http://proxy.local");

    assert_eq!(rewritten, manifest);
}

#[test]
fn test_relative_segment_is_replaced_with_proxy_url() {
    let rewritten = PlaylistRewriter::rewrite("segment1.ts", &base(), "http://proxy.local");

    assert_eq!(
        rewritten,
        "http://proxy.local/proxy/hls?src=https%3A%2F%2Fhost%2Flive%2Fsegment1.ts"
    );
}

#[test]
fn test_absolute_reference_keeps_resource_identity() {
    let original = "https://cdn.example.com/seg/42.ts";
    let rewritten = PlaylistRewriter::rewrite(original, &base(), "http://proxy.local");

    let encoded = rewritten
        .strip_prefix("http://proxy.local/proxy/hls?src=")
        .expect("rewritten line should point at the proxy");
    let decoded = urlencoding::decode(encoded).unwrap();

    assert_eq!(decoded, original);
}

#[test]
fn test_key_line_only_changes_the_quoted_uri() {
    let line = r#"#EXT-X-KEY:METHOD=AES-128,URI="key1.bin",IV=0x00000000000000000000000000000001"#;
    let rewritten = PlaylistRewriter::rewrite(line, &base(), "http://proxy.local");

    assert!(rewritten.starts_with("#EXT-X-KEY:METHOD=AES-128,URI=\""));
    assert!(rewritten.ends_with("\",IV=0x00000000000000000000000000000001"));

    let start = rewritten.find("URI=\"").unwrap() + 5;
    let end = rewritten[start..].find('"').unwrap() + start;
    let proxy_url = &rewritten[start..end];

    let encoded = proxy_url
        .strip_prefix("http://proxy.local/proxy/hls?src=")
        .unwrap();
    assert_eq!(
        urlencoding::decode(encoded).unwrap(),
        "https://host/live/key1.bin"
    );
}

#[test]
fn test_map_uri_is_rewritten_case_insensitively() {
    let line = r#"#EXT-X-MAP:uri="init.mp4""#;
    let rewritten = PlaylistRewriter::rewrite(line, &base(), "http://proxy.local");

    assert!(rewritten.contains("/proxy/hls?src=https%3A%2F%2Fhost%2Flive%2Finit.mp4"));
}

#[test]
fn test_unresolvable_reference_is_left_alone() {
    // a base that can't absorb relative references forces the join to fail
    let opaque_base = Url::parse("mailto:user@host").unwrap();
    let rewritten = PlaylistRewriter::rewrite("segment1.ts", &opaque_base, "http://proxy.local");

    assert_eq!(rewritten, "segment1.ts");
}

#[test]
fn test_unresolvable_key_uri_keeps_directive_intact() {
    let opaque_base = Url::parse("mailto:user@host").unwrap();
    let line = r#"#EXT-X-KEY:METHOD=AES-128,URI="key1.bin""#;

    let rewritten = PlaylistRewriter::rewrite(line, &opaque_base, "http://proxy.local");

    assert_eq!(rewritten, line);
}

#[test]
fn test_line_count_and_order_are_preserved() {
    let manifest = "#EXTM3U\n#EXTINF:4.0,\nsegment1.ts\n#EXTINF:4.0,\nsegment2.ts\n";
    let rewritten = PlaylistRewriter::rewrite(manifest, &base(), "http://proxy.local");

    let original_lines: Vec<&str> = manifest.split('\n').collect();
    let rewritten_lines: Vec<&str> = rewritten.split('\n').collect();

    assert_eq!(original_lines.len(), rewritten_lines.len());
    assert_eq!(rewritten_lines[0], "#EXTM3U");
    assert_eq!(rewritten_lines[1], "#EXTINF:4.0,");
    assert!(rewritten_lines[2].contains("segment1.ts"));
    assert_eq!(rewritten_lines[3], "#EXTINF:4.0,");
    assert!(rewritten_lines[4].contains("segment2.ts"));
    assert_eq!(rewritten_lines[5], "");
}

#[test]
fn test_full_live_manifest_end_to_end() {
    let manifest = concat!(
        "#EXTM3U\n",
        "#EXT-X-VERSION:3\n",
        "#EXT-X-TARGETDURATION:4\n",
        "#EXT-X-MEDIA-SEQUENCE:1077\n",
        "#EXT-X-KEY:METHOD=AES-128,URI=\"key1.bin\"\n",
        "#EXTINF:4.000,\n",
        "segment1.ts\n"
    );

    let rewritten = PlaylistRewriter::rewrite(manifest, &base(), "http://proxy.local");
    let lines: Vec<&str> = rewritten.split('\n').collect();

    assert_eq!(lines[0], "#EXTM3U");
    assert_eq!(lines[1], "#EXT-X-VERSION:3");
    assert_eq!(lines[2], "#EXT-X-TARGETDURATION:4");
    assert_eq!(lines[3], "#EXT-X-MEDIA-SEQUENCE:1077");
    assert_eq!(
        lines[4],
        "#EXT-X-KEY:METHOD=AES-128,URI=\"http://proxy.local/proxy/hls?src=https%3A%2F%2Fhost%2Flive%2Fkey1.bin\""
    );
    assert_eq!(lines[5], "#EXTINF:4.000,");
    assert_eq!(
        lines[6],
        "http://proxy.local/proxy/hls?src=https%3A%2F%2Fhost%2Flive%2Fsegment1.ts"
    );
}

#[test]
fn test_resolution_is_anchored_to_the_final_url() {
    // the manifest was requested from A but redirected to B, references
    // must resolve against B
    let redirected = Url::parse("https://edge7.cdn.example.com/live/index.m3u8").unwrap();
    let rewritten = PlaylistRewriter::rewrite("segment1.ts", &redirected, "http://proxy.local");

    let encoded = rewritten
        .strip_prefix("http://proxy.local/proxy/hls?src=")
        .unwrap();
    assert_eq!(
        urlencoding::decode(encoded).unwrap(),
        "https://edge7.cdn.example.com/live/segment1.ts"
    );
}
