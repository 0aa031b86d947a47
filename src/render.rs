//! HTML rendering for the explorer
//!
//! Renders the enriched record set as a table and single records as a
//! detail page, with the display unit helpers (yoctoNEAR, TGas). All
//! values are chain identifiers or decoded numbers; markup is assembled
//! with plain string formatting.

use crate::decode::DecodedInput;
use crate::records::{Record, RecordDetail};
use std::fmt::Write;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

const NEAR_EXPLORER: &str = "https://explorer.mainnet.near.org";

/// Format a yoctoNEAR amount for display: whole-ish amounts in NEAR with
/// three decimals, dust as raw yoctoNEAR.
pub fn format_near(yocto: u128) -> String {
    if yocto == 0 {
        "0".to_string()
    } else if yocto >= 10u128.pow(21) {
        format!("{:.3}N", yocto as f64 / 1e24)
    } else {
        format!("{yocto}yoctoN")
    }
}

/// Format an attached/burnt gas amount in teragas.
pub fn format_tgas(gas: u64) -> String {
    format!("{}TGas", (gas as f64 / 1e12).round() as u64)
}

/// Render a block timestamp (nanoseconds since epoch) as RFC 3339.
pub fn format_timestamp(nanos: u64) -> String {
    let seconds = (nanos / 1_000_000_000) as i64;
    OffsetDateTime::from_unix_timestamp(seconds)
        .ok()
        .and_then(|t| t.format(&Rfc3339).ok())
        .unwrap_or_else(|| nanos.to_string())
}

/// Render a block timestamp as an age relative to `now` ("3 minutes",
/// "2 days"). Timestamps in the future or out of range fall back to the
/// absolute form.
pub fn format_age(nanos: u64, now: OffsetDateTime) -> String {
    let seconds = (nanos / 1_000_000_000) as i64;
    let Ok(then) = OffsetDateTime::from_unix_timestamp(seconds) else {
        return format_timestamp(nanos);
    };
    let elapsed = (now - then).whole_seconds();
    if elapsed < 0 {
        return format_timestamp(nanos);
    }
    match elapsed {
        0..=59 => plural(elapsed, "second"),
        60..=3_599 => plural(elapsed / 60, "minute"),
        3_600..=86_399 => plural(elapsed / 3_600, "hour"),
        _ => plural(elapsed / 86_400, "day"),
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit}")
    } else {
        format!("{count} {unit}s")
    }
}

/// Truncate a long value behind a tooltip carrying the full text.
fn truncate_cell(value: &str) -> String {
    if value.len() > 42 {
        format!(
            "<p data-toggle=\"tooltip\" title=\"{value}\">{}...</p>",
            &value[..39]
        )
    } else {
        value.to_string()
    }
}

/// One-line summary of a decoded input for the table.
fn summarize_input(input: &DecodedInput) -> String {
    match input {
        DecodedInput::EthTransaction(tx) => match tx.to {
            Some(to) => format!("to 0x{:x}, value {}", to, tx.value),
            None => format!("deploy, value {}", tx.value),
        },
        DecodedInput::RawHex(hex) => truncate_cell(hex),
    }
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{title}</title></head>\n\
         <body>\n{body}\n</body>\n</html>\n"
    )
}

/// Render the enriched record set as the main table page. `now` anchors
/// the relative-age column.
pub fn render_table(records: &[Record], now: OffsetDateTime) -> String {
    let mut body = String::new();
    body.push_str("<tt><table class=\"table table-stripped\">\n<thead><tr>");
    for key in [
        "Receipt Hash",
        "Aurora Method",
        "Near Block",
        "Near Time",
        "Value",
        "Fee",
    ] {
        let _ = write!(body, "<th scope=\"col\">{key}</th>");
    }
    body.push_str("</tr></thead>\n<tbody>\n");

    for record in records {
        body.push_str("<tr>");
        let _ = write!(
            body,
            "<td><a href=\"/r/{}/{}\">{}...</a></td>",
            record.receipt_id,
            record.tx_id,
            &record.receipt_id[..record.receipt_id.len().min(10)]
        );
        let _ = write!(body, "<td>{}</td>", record.method);
        let _ = write!(
            body,
            "<td><a href=\"{NEAR_EXPLORER}/blocks/{}\">{}</a></td>",
            record.block_hash, record.block_height
        );
        let _ = write!(
            body,
            "<td><p data-toggle=\"tooltip\" title=\"{}\">{}</p></td>",
            format_timestamp(record.timestamp),
            format_age(record.timestamp, now)
        );
        let _ = write!(body, "<td>{}</td>", summarize_input(&record.input));
        let _ = write!(
            body,
            "<td><p data-toggle=\"tooltip\" title=\"{}\">{}</p></td>",
            record.tokens_burnt,
            format_near(record.tokens_burnt)
        );
        body.push_str("</tr>\n");
    }
    body.push_str("</tbody></table></tt>");

    page("Aurora Explorer", &body)
}

/// Render the per-record detail page.
pub fn render_detail(detail: &RecordDetail) -> String {
    let mut body = String::new();
    body.push_str("<tt><a href=\"/\">&lt;-- Aurora Explorer</a>\n");
    body.push_str("<table class=\"table table-stripped\"><tbody>\n");

    let mut field = |key: &str, value: String| {
        let _ = write!(body, "<tr><td>{key}</td><td>{value}</td></tr>\n");
    };

    field(
        "Receipt Hash",
        format!(
            "<a href=\"{NEAR_EXPLORER}/transactions/{}#{}\">{}</a>",
            detail.tx_id, detail.receipt_id, detail.receipt_id
        ),
    );
    field(
        "Block",
        format!(
            "<a href=\"{NEAR_EXPLORER}/blocks/{}\">{}</a>",
            detail.block_hash, detail.block_height
        ),
    );
    field("Timestamp", format_timestamp(detail.timestamp));
    field("Gas Burnt", format_tgas(detail.gas_burnt));
    field("Fee", format_near(detail.tokens_burnt));
    field(
        "Method",
        detail.method.clone().unwrap_or_else(|| "-".to_string()),
    );

    match &detail.input {
        Some(DecodedInput::EthTransaction(tx)) => {
            field("Sender", "unresolved".to_string());
            field("Nonce", tx.nonce.to_string());
            field("Gas Price", tx.gas_price.to_string());
            field("Gas", tx.gas.to_string());
            field(
                "To",
                match tx.to {
                    Some(to) => format!("0x{to:x}"),
                    None => "(deploy)".to_string(),
                },
            );
            field("Value", tx.value.to_string());
            field("Data", truncate_cell(&format!("0x{}", hex::encode(&tx.data))));
            field(
                "Signature",
                format!("v={} r=0x{:x} s=0x{:x}", tx.signature.v, tx.signature.r, tx.signature.s),
            );
        }
        Some(DecodedInput::RawHex(hex)) => field("Input", truncate_cell(hex)),
        None => field("Input", "-".to_string()),
    }

    body.push_str("</tbody></table></tt>");
    page("Aurora Explorer", &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_near_zero() {
        assert_eq!(format_near(0), "0");
    }

    #[test]
    fn test_format_near_dust() {
        assert_eq!(format_near(123), "123yoctoN");
    }

    #[test]
    fn test_format_near_whole() {
        assert_eq!(format_near(10u128.pow(24)), "1.000N");
        assert_eq!(format_near(2_500_000_000_000_000_000_000_000), "2.500N");
    }

    #[test]
    fn test_format_tgas() {
        assert_eq!(format_tgas(300_000_000_000_000), "300TGas");
        assert_eq!(format_tgas(424_555_062_500), "0TGas");
    }

    #[test]
    fn test_truncate_cell() {
        let short = "0xabcdef";
        assert_eq!(truncate_cell(short), short);

        let long = "a".repeat(50);
        let cell = truncate_cell(&long);
        assert!(cell.contains("..."));
        assert!(cell.contains(&long));
    }

    #[test]
    fn test_format_age() {
        let now = OffsetDateTime::from_unix_timestamp(1_000_000_000).unwrap();
        let nanos = |offset_secs: u64| (1_000_000_000 - offset_secs) * 1_000_000_000;

        assert_eq!(format_age(nanos(0), now), "0 seconds");
        assert_eq!(format_age(nanos(1), now), "1 second");
        assert_eq!(format_age(nanos(59), now), "59 seconds");
        assert_eq!(format_age(nanos(180), now), "3 minutes");
        assert_eq!(format_age(nanos(7_200), now), "2 hours");
        assert_eq!(format_age(nanos(200_000), now), "2 days");
    }

    #[test]
    fn test_format_age_future_falls_back_to_absolute() {
        let now = OffsetDateTime::from_unix_timestamp(1_000_000_000).unwrap();
        let future = 1_000_000_060u64 * 1_000_000_000;
        assert_eq!(format_age(future, now), format_timestamp(future));
    }

    #[test]
    fn test_render_table_contains_record() {
        let record = Record {
            receipt_id: "R1234567890abcdef".to_string(),
            tx_id: "T1".to_string(),
            block_hash: "B1".to_string(),
            gas_attached: 300_000_000_000_000,
            gas_burnt: 424_555_062_500,
            tokens_attached: 0,
            tokens_burnt: 42_455_506_250_000_000_000,
            method: "submit".to_string(),
            input: DecodedInput::RawHex("0xdead".to_string()),
            success_value: Some("0x".to_string()),
            success_receipt_id: None,
            timestamp: 1_000_000_000_000_000_000,
            block_height: 100,
        };
        // Ten minutes after the record's block timestamp.
        let now = OffsetDateTime::from_unix_timestamp(1_000_000_600).unwrap();
        let html = render_table(std::slice::from_ref(&record), now);

        assert!(html.contains("Aurora Explorer"));
        assert!(html.contains("submit"));
        assert!(html.contains("/r/R1234567890abcdef/T1"));
        assert!(html.contains("blocks/B1"));
        assert!(html.contains("10 minutes"));
        // Absolute time stays reachable through the tooltip.
        assert!(html.contains("2001-09-09T01:46:40Z"));
    }
}
