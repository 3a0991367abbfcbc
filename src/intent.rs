/// file: src/intent.rs
/// description: subscription intents a channel re-declares after every handshake
use crate::types::ClientFrame;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionIntent {
    CryptoPage { page: u32, size: u32 },
    MarketData,
    Crypto { crypto_id: String },
}

/// Identifies the topic an intent speaks for; a newer intent for the same
/// topic replaces the older one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    CryptoPage,
    MarketData,
    Crypto,
}

impl SubscriptionIntent {
    pub fn topic(&self) -> Topic {
        match self {
            SubscriptionIntent::CryptoPage { .. } => Topic::CryptoPage,
            SubscriptionIntent::MarketData => Topic::MarketData,
            SubscriptionIntent::Crypto { .. } => Topic::Crypto,
        }
    }

    pub fn to_frame(&self) -> ClientFrame {
        match self {
            SubscriptionIntent::CryptoPage { page, size } => ClientFrame::SubscribeCryptoPage {
                page: *page,
                size: *size,
            },
            SubscriptionIntent::MarketData => ClientFrame::SubscribeMarketData,
            SubscriptionIntent::Crypto { crypto_id } => ClientFrame::SubscribeCrypto {
                crypto_id: crypto_id.clone(),
            },
        }
    }
}

/// Ordered set of active intents, at most one per topic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntentSet {
    intents: Vec<SubscriptionIntent>,
}

impl IntentSet {
    pub fn new(intents: impl IntoIterator<Item = SubscriptionIntent>) -> Self {
        let mut set = Self::default();
        for intent in intents {
            set.upsert(intent);
        }
        set
    }

    /// Returns false when the exact intent was already active.
    pub fn upsert(&mut self, intent: SubscriptionIntent) -> bool {
        match self
            .intents
            .iter_mut()
            .find(|existing| existing.topic() == intent.topic())
        {
            Some(existing) if *existing == intent => false,
            Some(existing) => {
                *existing = intent;
                true
            }
            None => {
                self.intents.push(intent);
                true
            }
        }
    }

    pub fn frames(&self) -> Vec<ClientFrame> {
        self.intents.iter().map(SubscriptionIntent::to_frame).collect()
    }
}
