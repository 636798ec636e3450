use crate::debug_println;
use crate::error::CalcError;

// The dispatcher only needs "what is this coin worth in USD". Keeping the
// lookup behind a trait keeps dispatch testable without a network.
pub trait PriceFeed {
    fn usd_price(&self, coin: &str) -> Result<serde_json::Number, CalcError>;
}

// Live feed. Expects a body shaped { "<coin>": { "usd": <number> } }; any
// transport error, bad status, or shape mismatch is one uniform failure.
// No timeout is configured, a hung request blocks the prompt.
pub struct CoinGecko;

impl PriceFeed for CoinGecko {
    fn usd_price(&self, coin: &str) -> Result<serde_json::Number, CalcError> {
        let url = format!(
            "https://api.coingecko.com/api/v3/simple/price?ids={}&vs_currencies=usd",
            coin
        );
        debug_println(&format!("GET {}", url));
        let response =
            reqwest::blocking::get(&url).map_err(|err| CalcError::Network(err.to_string()))?;
        if !response.status().is_success() {
            return Err(CalcError::Network(format!("status {}", response.status())));
        }
        let body: serde_json::Value = response
            .json()
            .map_err(|err| CalcError::Network(err.to_string()))?;
        match body.get(coin).and_then(|entry| entry.get("usd")) {
            Some(serde_json::Value::Number(price)) => Ok(price.clone()),
            _ => Err(CalcError::Network("unexpected response shape".to_owned())),
        }
    }
}
