use sha2::{Digest, Sha256};

use crate::debug_println;
use crate::error::CalcError;
use crate::format;
use crate::price::PriceFeed;

// Reserved words are matched on the trimmed raw text, before any glyph
// normalization, first match wins. Everything else is arithmetic.
#[derive(Debug, Clone, PartialEq)]
pub enum SecretCommand {
    Arithmetic,
    Crypto(&'static str),
    Hash(String),
    Roi(String),
    OpenNotes,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SideEffect {
    OpenNotes,
}

impl SecretCommand {
    pub fn parse(raw: &str) -> SecretCommand {
        let expr = raw.trim();
        if expr.eq_ignore_ascii_case("BTC") {
            return SecretCommand::Crypto("bitcoin");
        }
        if expr.eq_ignore_ascii_case("ETH") {
            return SecretCommand::Crypto("ethereum");
        }
        let bytes = expr.as_bytes();
        if bytes.len() >= 5 && bytes[..5].eq_ignore_ascii_case(b"HASH ") {
            // Keyword match is case-insensitive, the payload keeps its case
            return SecretCommand::Hash(expr[5..].to_owned());
        }
        if bytes.len() >= 4 && bytes[..4].eq_ignore_ascii_case(b"ROI ") {
            return SecretCommand::Roi(expr[4..].to_owned());
        }
        if expr.eq_ignore_ascii_case("NOTE") {
            return SecretCommand::OpenNotes;
        }
        SecretCommand::Arithmetic
    }
}

// Always returns displayable text. Failures become the literal strings
// "Error" and "API Error", the arithmetic fallback reuses whatever the
// preview last rendered, and NOTE leaves the display untouched.
pub fn dispatch(raw: &str, preview: &str, feed: &dyn PriceFeed) -> (String, Option<SideEffect>) {
    match SecretCommand::parse(raw) {
        SecretCommand::Crypto(coin) => {
            let display = match feed.usd_price(coin) {
                Ok(price) => format::price(&price),
                Err(err) => {
                    debug_println(&format!("Price lookup failed: {}", err));
                    "API Error".to_owned()
                }
            };
            (display, None)
        }
        SecretCommand::Hash(payload) => (sha256_hex(&payload), None),
        SecretCommand::Roi(args) => {
            let display = match roi(&args) {
                Ok(value) => format::plain_float(value),
                Err(err) => {
                    debug_println(&format!("ROI parse failed: {}", err));
                    "Error".to_owned()
                }
            };
            (display, None)
        }
        SecretCommand::OpenNotes => (raw.to_owned(), Some(SideEffect::OpenNotes)),
        SecretCommand::Arithmetic => (preview.to_owned(), None),
    }
}

fn sha256_hex(payload: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    hex::encode(hasher.finalize())
}

// principal * (1 + rate/100 * time), exactly three numeric tokens
fn roi(args: &str) -> Result<f64, CalcError> {
    let fields: Vec<&str> = args.split_whitespace().collect();
    if fields.len() != 3 {
        return Err(CalcError::MalformedArgs);
    }
    let principal: f64 = fields[0].parse().map_err(|_| CalcError::MalformedArgs)?;
    let rate: f64 = fields[1].parse().map_err(|_| CalcError::MalformedArgs)?;
    let time: f64 = fields[2].parse().map_err(|_| CalcError::MalformedArgs)?;
    Ok(principal * (1.0 + rate / 100.0 * time))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedFeed(i64);
    impl PriceFeed for FixedFeed {
        fn usd_price(&self, coin: &str) -> Result<serde_json::Number, CalcError> {
            // Only bitcoin is quoted, so tests prove which id was requested
            if coin == "bitcoin" {
                Ok(serde_json::Number::from(self.0))
            } else {
                Err(CalcError::Network(format!("unknown coin {}", coin)))
            }
        }
    }

    struct DownFeed;
    impl PriceFeed for DownFeed {
        fn usd_price(&self, _coin: &str) -> Result<serde_json::Number, CalcError> {
            Err(CalcError::Network("connection refused".to_owned()))
        }
    }

    #[test]
    fn keywords_match_case_insensitively() {
        assert_eq!(SecretCommand::parse("BTC"), SecretCommand::Crypto("bitcoin"));
        assert_eq!(SecretCommand::parse("btc"), SecretCommand::Crypto("bitcoin"));
        assert_eq!(SecretCommand::parse(" btc "), SecretCommand::Crypto("bitcoin"));
        assert_eq!(SecretCommand::parse("eth"), SecretCommand::Crypto("ethereum"));
        assert_eq!(SecretCommand::parse("note"), SecretCommand::OpenNotes);
    }

    #[test]
    fn hash_keeps_payload_case() {
        assert_eq!(
            SecretCommand::parse("hash HeLLo"),
            SecretCommand::Hash("HeLLo".to_owned())
        );
        assert_eq!(
            SecretCommand::parse("HASH  two  spaces"),
            SecretCommand::Hash(" two  spaces".to_owned())
        );
    }

    #[test]
    fn near_misses_fall_back_to_arithmetic() {
        assert_eq!(SecretCommand::parse("HASH"), SecretCommand::Arithmetic);
        assert_eq!(SecretCommand::parse("HASHING"), SecretCommand::Arithmetic);
        assert_eq!(SecretCommand::parse("ROI"), SecretCommand::Arithmetic);
        assert_eq!(SecretCommand::parse("BTCX"), SecretCommand::Arithmetic);
        assert_eq!(SecretCommand::parse("2+2"), SecretCommand::Arithmetic);
        assert_eq!(SecretCommand::parse(""), SecretCommand::Arithmetic);
    }

    #[test]
    fn hash_dispatch_produces_known_digest() {
        let (display, effect) = dispatch("HASH hello", "", &DownFeed);
        assert_eq!(
            display,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert!(effect.is_none());
    }

    #[test]
    fn roi_dispatch_formats_a_plain_number() {
        let (display, _) = dispatch("ROI 100 10 2", "", &DownFeed);
        assert_eq!(display, "120.0");
        let (display, _) = dispatch("roi 1000 5 0.5", "", &DownFeed);
        assert_eq!(display, "1025.0");
    }

    #[test]
    fn roi_rejects_malformed_arguments() {
        for bad in ["ROI 100 abc 2", "ROI 100 10", "ROI 100 10 2 9", "ROI 1 2 x"] {
            let (display, _) = dispatch(bad, "", &DownFeed);
            assert_eq!(display, "Error", "input {:?}", bad);
        }
    }

    #[test]
    fn crypto_dispatch_uses_the_feed() {
        let (display, _) = dispatch("btc", "", &FixedFeed(65000));
        assert_eq!(display, "65,000");
        let (display, _) = dispatch("ETH", "", &FixedFeed(65000));
        assert_eq!(display, "API Error");
        let (display, _) = dispatch("BTC", "", &DownFeed);
        assert_eq!(display, "API Error");
    }

    #[test]
    fn arithmetic_fallback_reuses_the_cached_preview() {
        let (display, effect) = dispatch("2+3", "99", &DownFeed);
        assert_eq!(display, "99");
        assert!(effect.is_none());
        let (display, _) = dispatch("garbage", "", &DownFeed);
        assert_eq!(display, "");
    }

    #[test]
    fn note_keeps_the_display_and_signals_the_editor() {
        let (display, effect) = dispatch(" note ", "", &DownFeed);
        assert_eq!(display, " note ");
        assert_eq!(effect, Some(SideEffect::OpenNotes));
    }
}
