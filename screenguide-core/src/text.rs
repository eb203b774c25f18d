use regex::Regex;
use std::sync::OnceLock;

fn tag_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // `regex` has no backreferences, so opening/closing names are not paired.
        Regex::new(r"(?s)<[^>]+>.*?</[^>]+>").expect("valid tag block regex")
    })
}

fn noise_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Only known event markers; bracketed user words are kept.
        Regex::new(
            r"(?i)\[\s*(?:noise|music|laughter|laughs|inaudible|silence|blank_audio|applause)\s*\]",
        )
        .expect("valid noise marker regex")
    })
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s{2,}").expect("valid whitespace regex"))
}

fn thinking_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<thinking>.*?</thinking>|<think>.*?</think>|<reasoning>.*?</reasoning>")
            .expect("valid thinking regex")
    })
}

pub fn filter_transcription_output(text: &str) -> String {
    let mut out = tag_block_re().replace_all(text, "").to_string();
    out = noise_marker_re().replace_all(&out, "").to_string();
    out = whitespace_re().replace_all(&out, " ").to_string();
    out.trim().to_string()
}

pub fn filter_advice_output(text: &str) -> String {
    let out = thinking_re().replace_all(text, "");
    let out = out.trim();
    let out = out
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(out);
    out.trim().to_string()
}
