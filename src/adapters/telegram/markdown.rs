//! MarkdownV2 rendering for discovery notifications

use chrono::{DateTime, Utc};

use crate::domain::{HoneypotRisk, ScoredToken};
use crate::ports::notifier::OutboundMessage;

/// Characters Telegram reserves in MarkdownV2
const RESERVED: &[char] = &[
    '\\', '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

/// Backslash-escape every MarkdownV2 reserved character
pub fn escape_markdown_v2(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 8);
    for c in input.chars() {
        if RESERVED.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Dollar amount, or `N/A` when the feed reported nothing
pub fn format_usd(value: f64) -> String {
    if !value.is_finite() || value <= 0.0 {
        return "N/A".to_string();
    }
    if value < 1.0 {
        let fixed = format!("{:.10}", value);
        let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
        format!("${}", trimmed)
    } else {
        format!("${}", group_thousands(value.round() as u64))
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Render the announcement for a newly discovered token
pub fn format_discovery_message(
    scored: &ScoredToken,
    detected_at: DateTime<Utc>,
    bot_username: Option<&str>,
) -> OutboundMessage {
    let token = &scored.token;
    let result = &scored.result;
    let esc = escape_markdown_v2;
    let mint = esc(&token.mint);

    let mut text = String::new();
    text.push_str("🚀 *New SPL Token Detected\\!*\n\n");
    text.push_str(&format!("📛 *Name*: {}\n", esc(&token.name)));
    text.push_str(&format!("🔤 *Symbol*: {}\n", esc(&token.symbol)));
    text.push_str(&format!("📍 *Mint*: `{}`\n\n", mint));

    text.push_str(&format!(
        "🎯 *Score*: {}/100 {} {} risk\n",
        result.score,
        result.tier.marker(),
        esc(result.tier.as_str())
    ));
    text.push_str(&format!("📝 *Signals*: {}\n", esc(&result.reason_text())));
    text.push_str(&format!("👥 *Holders*: {}\n", token.holder_count));
    text.push_str(&format!(
        "🛡️ *Security*: {}\n",
        esc(&HoneypotRisk::from_holders(token.holder_count).to_string())
    ));
    text.push_str(&format!("💰 *Price*: {}\n", esc(&format_usd(token.price_usd))));
    text.push_str(&format!("📊 *Market Cap*: {}\n", esc(&format_usd(token.market_cap_usd))));
    text.push_str(&format!("💧 *Liquidity*: {}\n", esc(&format_usd(token.liquidity_usd))));
    text.push_str(&format!("📈 *Volume 24h*: {}\n", esc(&format_usd(token.volume_24h_usd))));
    text.push_str(&format!(
        "🔄 *5m*: {} buys / {} sells\n",
        token.stats_5m.num_buys, token.stats_5m.num_sells
    ));
    text.push_str(&format!("🏷️ *Source*: {}\n", esc(token.source.as_str())));
    if let Some(launchpad) = &token.launchpad {
        text.push_str(&format!("🧪 *Launchpad*: {}\n", esc(launchpad)));
    }

    text.push_str(&format!(
        "\n⏰ *Detected*: {}\n\n",
        esc(&detected_at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
    ));
    text.push_str(&format!("🔗 [Solscan](https://solscan.io/token/{})\n", mint));
    text.push_str(&format!("🪐 [Jupiter](https://jup.ag/tokens/{})", mint));

    let message = OutboundMessage::new(text);
    match bot_username.map(str::trim).filter(|u| !u.is_empty()) {
        Some(username) => message.with_button(
            "🤖 Go Bot",
            format!("https://t.me/{}", username.trim_start_matches('@')),
        ),
        None => message,
    }
}
