use crate::{
    client_state::{ChannelStatus, ConnectionState},
    notify::{AlertToast, Direction},
    types::{CryptoDetail, CryptoListing, MarketSummary, Pagination},
};

// ANSI color codes
pub struct Colors;

impl Colors {
    pub const RESET: &'static str = "\x1b[0m";
    pub const BOLD: &'static str = "\x1b[1m";
    pub const DIM: &'static str = "\x1b[2m";

    pub const WHITE: &'static str = "\x1b[37m";
    pub const GRAY: &'static str = "\x1b[90m";

    pub const BRIGHT_RED: &'static str = "\x1b[91m";
    pub const BRIGHT_GREEN: &'static str = "\x1b[92m";
    pub const BRIGHT_YELLOW: &'static str = "\x1b[93m";
    pub const BRIGHT_BLUE: &'static str = "\x1b[94m";
    pub const BRIGHT_MAGENTA: &'static str = "\x1b[95m";
    pub const BRIGHT_CYAN: &'static str = "\x1b[96m";
}

/// Dollar price with two decimals above $1 and enough significant digits
/// below it (capped at 8), truncated rather than rounded.
pub fn format_price(price: f64) -> String {
    if !price.is_finite() {
        return "-".to_string();
    }
    if price == 0.0 {
        return "$0".to_string();
    }

    let decimals: usize = if price >= 1.0 {
        2
    } else {
        ((price.abs().log10().floor().abs() as usize) + 3).min(8)
    };
    let factor = 10f64.powi(decimals as i32);
    let truncated = (price * factor).floor() / factor;

    format!("${}", group_thousands(&format!("{:.*}", decimals, truncated)))
}

pub fn format_percentage(value: f64) -> String {
    format!("{:.2}%", value.abs())
}

/// 1.23T / 4.56B / 7.89M / 1.00K; `-` below a thousand.
pub fn format_compact(value: f64) -> String {
    const UNITS: [(f64, &str); 4] = [
        (1_000_000_000_000.0, "T"),
        (1_000_000_000.0, "B"),
        (1_000_000.0, "M"),
        (1_000.0, "K"),
    ];
    UNITS
        .iter()
        .find(|(threshold, _)| value >= *threshold)
        .map(|(threshold, unit)| format!("{:.2}{}", value / threshold, unit))
        .unwrap_or_else(|| "-".to_string())
}

fn group_thousands(number: &str) -> String {
    let (int_part, frac_part) = match number.split_once('.') {
        Some((int_part, frac)) => (int_part, Some(frac)),
        None => (number, None),
    };
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(digits) => ("-", digits),
        None => ("", int_part),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

pub struct DashboardFormatter {
    colored: bool,
}

impl DashboardFormatter {
    pub fn new(colored: bool) -> Self {
        Self { colored }
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.colored {
            format!("{}{}{}", color, text, Colors::RESET)
        } else {
            text.to_string()
        }
    }

    fn change(&self, value: f64) -> String {
        let (color, arrow) = if value >= 0.0 {
            (Colors::BRIGHT_GREEN, "▲")
        } else {
            (Colors::BRIGHT_RED, "▼")
        };
        self.paint(color, &format!("{} {}", arrow, format_percentage(value)))
    }

    pub fn format_listings(
        &self,
        listings: &[CryptoListing],
        pagination: Option<&Pagination>,
    ) -> String {
        let mut out = String::new();
        out.push_str(&self.paint(
            Colors::GRAY,
            "┌──────┬──────────────────────┬──────────────────┬────────────┬────────────┐",
        ));
        out.push('\n');
        out.push_str(&format!(
            "│ {:<4} │ {:<20} │ {:>16} │ {:>10} │ {:>10} │\n",
            "#", "NAME", "PRICE", "24H", "MCAP"
        ));
        out.push_str(&self.paint(
            Colors::GRAY,
            "├──────┼──────────────────────┼──────────────────┼────────────┼────────────┤",
        ));
        out.push('\n');

        for listing in listings {
            let rank = listing
                .market_cap_rank
                .map(|r| r.to_string())
                .unwrap_or_else(|| "-".to_string());
            let name = format!("{} ({})", listing.name, listing.symbol.to_uppercase());
            // Pad before painting so escape codes do not break alignment.
            let change = format!(
                "{} {:>7}",
                if listing.is_gaining() { "▲" } else { "▼" },
                format_percentage(listing.price_change_percentage_24h)
            );
            let change = self.paint(
                if listing.is_gaining() {
                    Colors::BRIGHT_GREEN
                } else {
                    Colors::BRIGHT_RED
                },
                &change,
            );
            out.push_str(&format!(
                "│ {:<4} │ {:<20.20} │ {:>16} │ {:>10} │ {:>10} │\n",
                rank,
                name,
                format_price(listing.current_price),
                change,
                listing
                    .market_cap
                    .map(|cap| format_compact(cap as f64))
                    .unwrap_or_else(|| "-".to_string()),
            ));
        }

        out.push_str(&self.paint(
            Colors::GRAY,
            "└──────┴──────────────────────┴──────────────────┴────────────┴────────────┘",
        ));
        if let Some(pagination) = pagination {
            out.push_str(&format!(
                "\n  page {} of {} ({} per page)",
                pagination.page, pagination.total_pages, pagination.size
            ));
        }
        out
    }

    pub fn format_market(&self, market: &MarketSummary) -> String {
        format!(
            "{} coins: {}  exchanges: {}  market cap: ${} {}  24h volume: ${}  BTC {:.1}%  ETH {:.1}%",
            self.paint(Colors::BOLD, "MARKET"),
            market.total_coins,
            market.total_exchanges,
            format_compact(market.total_market_cap),
            self.change(market.market_cap_change_24h),
            format_compact(market.volume_24h),
            market.btc_dominance,
            market.eth_dominance,
        )
    }

    pub fn format_detail(&self, asset: &CryptoDetail) -> String {
        format!(
            "{} {}  {}  {}\n  24h high {}  low {}  ATH {}  ATL {}\n  market cap ${}  supply {}",
            self.paint(Colors::BOLD, &asset.name),
            self.paint(Colors::DIM, &asset.symbol.to_uppercase()),
            self.paint(Colors::BRIGHT_CYAN, &format_price(asset.current_price)),
            self.change(asset.price_change_percentage_24h),
            format_price(asset.high_24h),
            format_price(asset.low_24h),
            format_price(asset.ath),
            format_price(asset.atl),
            asset
                .market_cap
                .map(|cap| format_compact(cap as f64))
                .unwrap_or_else(|| "-".to_string()),
            asset
                .circulating_supply
                .map(|supply| format_compact(supply as f64))
                .unwrap_or_else(|| "-".to_string()),
        )
    }

    pub fn format_toast(&self, toast: &AlertToast) -> String {
        let (color, arrow) = match toast.direction {
            Some(Direction::Up) => (Colors::BRIGHT_GREEN, "▲"),
            Some(Direction::Down) => (Colors::BRIGHT_RED, "▼"),
            None => (Colors::BRIGHT_BLUE, "•"),
        };
        format!(
            "{} {} {}  {}  target {}  current {}",
            self.paint(Colors::BRIGHT_MAGENTA, "[ALERT]"),
            self.paint(Colors::BOLD, &toast.crypto_name),
            self.paint(color, arrow),
            self.paint(color, toast.condition),
            format_price(toast.target),
            format_price(toast.current),
        )
    }

    pub fn format_status(&self, status: &ChannelStatus) -> String {
        let (color, label) = match (status.terminal, status.state) {
            (Some(failure), _) => (Colors::BRIGHT_RED, format!("OFFLINE ({})", failure)),
            (None, ConnectionState::Subscribed) => (Colors::BRIGHT_GREEN, "LIVE".to_string()),
            (None, ConnectionState::Connecting | ConnectionState::Authenticating) => {
                (Colors::BRIGHT_YELLOW, status.state.to_string())
            }
            (None, _) if status.retry_count > 0 => (
                Colors::BRIGHT_YELLOW,
                format!("RECONNECTING (attempt {})", status.retry_count),
            ),
            (None, state) => (Colors::WHITE, state.to_string()),
        };
        format!(
            "{} {}",
            self.paint(Colors::BOLD, &format!("[{}]", status.channel)),
            self.paint(color, &label)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client_state::TerminalFailure;

    #[test]
    fn prices_follow_dashboard_rules() {
        assert_eq!(format_price(0.0), "$0");
        assert_eq!(format_price(61234.567), "$61,234.56");
        assert_eq!(format_price(1.0), "$1.00");
        assert_eq!(format_price(0.5), "$0.5000");
        assert_eq!(format_price(0.000012345), "$0.00001234");
    }

    #[test]
    fn compact_numbers() {
        assert_eq!(format_compact(2_350_000_000_000.0), "2.35T");
        assert_eq!(format_compact(12_500_000.0), "12.50M");
        assert_eq!(format_compact(999.0), "-");
    }

    #[test]
    fn status_line_shows_offline_state() {
        let formatter = DashboardFormatter::new(false);
        let mut status = ChannelStatus::new("homepage");
        status.terminal = Some(TerminalFailure::RetriesExhausted { attempts: 3 });
        assert_eq!(
            formatter.format_status(&status),
            "[homepage] OFFLINE (offline after 3 reconnect attempts)"
        );

        status.terminal = None;
        status.state = ConnectionState::Subscribed;
        assert_eq!(formatter.format_status(&status), "[homepage] LIVE");
    }

    #[test]
    fn listings_table_includes_pagination() {
        let formatter = DashboardFormatter::new(false);
        let listing = CryptoListing {
            id: "bitcoin".into(),
            symbol: "btc".into(),
            name: "Bitcoin".into(),
            current_price: 61000.0,
            market_cap_rank: Some(1),
            ..Default::default()
        };
        let table = formatter.format_listings(
            &[listing],
            Some(&Pagination {
                page: 1,
                size: 10,
                total_pages: 5,
            }),
        );
        assert!(table.contains("Bitcoin (BTC)"));
        assert!(table.contains("$61,000.00"));
        assert!(table.ends_with("page 1 of 5 (10 per page)"));
    }
}
