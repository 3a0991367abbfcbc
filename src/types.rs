/// file: src/types.rs
/// description: wire frames exchanged with the dashboard realtime endpoints and their payload models
use serde::{Deserialize, Serialize};

// Client -> server frames
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientFrame {
    AuthRequest {
        token: String,
    },
    SubscribeCryptoPage {
        page: u32,
        size: u32,
    },
    SubscribeMarketData,
    SubscribeCrypto {
        #[serde(rename = "cryptoId")]
        crypto_id: String,
    },
}

impl ClientFrame {
    /// Wire tag of the frame. Use this for logging; `Debug` would print the token.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientFrame::AuthRequest { .. } => "AUTH_REQUEST",
            ClientFrame::SubscribeCryptoPage { .. } => "SUBSCRIBE_CRYPTO_PAGE",
            ClientFrame::SubscribeMarketData => "SUBSCRIBE_MARKET_DATA",
            ClientFrame::SubscribeCrypto { .. } => "SUBSCRIBE_CRYPTO",
        }
    }

    pub fn to_text(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

// Server -> client payloads
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CryptoListing {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub current_price: f64,
    #[serde(default)]
    pub market_cap: Option<i64>,
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
    #[serde(default)]
    pub circulating_supply: Option<i64>,
    #[serde(default)]
    pub price_change_percentage_24h: f64,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub size: u32,
    pub total_pages: u32,
}

/// `data` field of a homepage `CRYPTO_DATA` frame.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoPage {
    pub crypto_list: Vec<CryptoListing>,
    pub pagination: Pagination,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarketSummary {
    pub total_coins: u64,
    pub total_exchanges: u64,
    pub total_market_cap: f64,
    pub market_cap_change_24h: f64,
    pub volume_24h: f64,
    pub btc_dominance: f64,
    pub eth_dominance: f64,
}

/// `cryptoData` field of a detail `CRYPTO_DATA` frame.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoDetail {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub image: Option<String>,
    pub current_price: f64,
    pub market_cap: Option<i64>,
    pub market_cap_rank: Option<u32>,
    pub circulating_supply: Option<i64>,
    pub price_change_percentage_24h: f64,
    pub fully_diluted_valuation: Option<i64>,
    pub total_supply: Option<i64>,
    pub high_24h: f64,
    pub low_24h: f64,
    pub market_cap_change_percentage_24h: f64,
    pub max_supply: Option<i64>,
    pub ath: f64,
    pub atl: f64,
    pub ath_date: Option<String>,
    pub atl_date: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertCondition {
    PriceAbove,
    PriceBelow,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertNotification {
    #[serde(default)]
    pub alert_id: Option<i64>,
    #[serde(default)]
    pub crypto_id: Option<String>,
    pub crypto_name: String,
    #[serde(default)]
    pub crypto_image: Option<String>,
    pub threshold_value: f64,
    pub alert_condition: AlertCondition,
    pub current_price: f64,
}

/// `alertData` is either one alert or a batch of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AlertPayload {
    Many(Vec<AlertNotification>),
    One(Box<AlertNotification>),
}

impl AlertPayload {
    pub fn into_vec(self) -> Vec<AlertNotification> {
        match self {
            AlertPayload::Many(alerts) => alerts,
            AlertPayload::One(alert) => vec![*alert],
        }
    }
}

impl CryptoListing {
    pub fn is_gaining(&self) -> bool {
        self.price_change_percentage_24h >= 0.0
    }
}

impl AlertNotification {
    /// Human readable condition, as shown on the alert toast.
    pub fn condition_label(&self) -> &'static str {
        match self.alert_condition {
            AlertCondition::PriceAbove => "Price above target",
            AlertCondition::PriceBelow => "Price below target",
            AlertCondition::Other => "Price alert triggered",
        }
    }
}
