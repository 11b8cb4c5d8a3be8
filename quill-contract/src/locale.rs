//! Supported site locales and the rules for picking one per request.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    En,
    Cn,
}

impl Lang {
    pub const SUPPORTED: [Lang; 2] = [Lang::En, Lang::Cn];
    pub const FALLBACK: Lang = Lang::En;

    pub fn code(&self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::Cn => "cn",
        }
    }

    /// Matches a language tag such as `cn`, `zh-CN` or `en-US;q=0.8`'s tag
    /// part against the supported set. `zh` is served by `cn`.
    pub fn from_tag(tag: &str) -> Option<Lang> {
        let primary = tag
            .trim()
            .split(['-', '_'])
            .next()?
            .to_ascii_lowercase();
        match primary.as_str() {
            "en" => Some(Lang::En),
            "cn" | "zh" => Some(Lang::Cn),
            _ => None,
        }
    }

    /// Locale carried by the first segment of a URL path, if any.
    pub fn from_path(path: &str) -> Option<Lang> {
        let first = path.trim_start_matches('/').split('/').next()?;
        Lang::SUPPORTED.into_iter().find(|l| l.code() == first)
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Lang {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Lang::SUPPORTED
            .into_iter()
            .find(|l| l.code() == s)
            .ok_or_else(|| format!("unsupported locale: {}", s))
    }
}

/// Where a negotiated locale came from, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocaleSource {
    Cookie,
    Header,
    Fallback,
}

/// Parses an `Accept-Language` value into tags ordered by descending quality.
pub fn parse_accept_language(header: &str) -> Vec<(String, f32)> {
    let mut langs: Vec<(String, f32)> = header
        .split(',')
        .filter_map(|part| {
            let mut iter = part.trim().split(';');
            let lang = iter.next()?.trim().to_string();

            if lang.is_empty() || lang == "*" {
                return None;
            }

            let quality = iter
                .next()
                .and_then(|q| q.trim().strip_prefix("q="))
                .and_then(|q| q.parse().ok())
                .unwrap_or(1.0);

            if quality <= 0.0 {
                return None;
            }

            Some((lang, quality))
        })
        .collect();

    // stable sort keeps header order among equal weights
    langs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    langs
}

/// Cookie first, then `Accept-Language`, then the fixed fallback.
pub fn negotiate(cookie: Option<&str>, accept_language: Option<&str>) -> (Lang, LocaleSource) {
    if let Some(lang) = cookie.and_then(Lang::from_tag) {
        return (lang, LocaleSource::Cookie);
    }

    let from_header = accept_language.and_then(|header| {
        parse_accept_language(header)
            .iter()
            .find_map(|(tag, _)| Lang::from_tag(tag))
    });
    if let Some(lang) = from_header {
        return (lang, LocaleSource::Header);
    }

    (Lang::FALLBACK, LocaleSource::Fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_beats_header() {
        assert_eq!(
            negotiate(Some("cn"), Some("en")),
            (Lang::Cn, LocaleSource::Cookie)
        );
    }

    #[test]
    fn nothing_selects_fallback() {
        assert_eq!(negotiate(None, None), (Lang::En, LocaleSource::Fallback));
        assert_eq!(
            negotiate(Some("fr"), Some("de-DE,fr;q=0.5")),
            (Lang::En, LocaleSource::Fallback)
        );
    }

    #[test]
    fn header_quality_is_respected() {
        assert_eq!(
            negotiate(None, Some("en;q=0.4, zh-CN;q=0.9, de")),
            (Lang::Cn, LocaleSource::Header)
        );
        assert_eq!(
            negotiate(None, Some("zh;q=0, en-GB")),
            (Lang::En, LocaleSource::Header)
        );
    }

    #[test]
    fn path_locale_is_the_whole_first_segment() {
        assert_eq!(Lang::from_path("/cn/post/hello"), Some(Lang::Cn));
        assert_eq!(Lang::from_path("/en"), Some(Lang::En));
        assert_eq!(Lang::from_path("/english/post"), None);
        assert_eq!(Lang::from_path("/"), None);
    }
}
