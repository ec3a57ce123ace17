//! Message text grammar.
//!
//! Tokens are split on whitespace. The first token names the account. The
//! first remaining token shaped like an amount (optional sign, digits,
//! optional fraction, optional trailing `k`/`K` for thousands) is the stake.
//! A three letter token directly after the amount is the currency code,
//! `USD` when absent. Tokens like `@1.95` carry odds, first the quoted odds
//! and then the corrected ones. Whatever is left, in order, is the bet
//! details. Identical text always parses to the identical record.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::message::{InboundMessage, MessageId};

/// Rejection for a message the grammar cannot read. Scoped to that one
/// message, the caller logs it and moves on.
#[derive(Error, Debug, PartialEq, Eq)]
#[error("MalformedInput: {0}")]
pub(crate) struct MalformedInput(pub(crate) String);

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BetRecord {
    pub(crate) message_id: MessageId,
    pub(crate) received_at: DateTime<Utc>,
    pub(crate) account: String,
    pub(crate) details: String,
    pub(crate) amount: Decimal,
    pub(crate) odds: Option<Decimal>,
    pub(crate) correct_odds: Option<Decimal>,
    pub(crate) currency: String,
}

pub(crate) fn parse(msg: &InboundMessage) -> Result<BetRecord, MalformedInput> {
    let mut tokens = msg.text.split_whitespace();

    let Some(account) = tokens.next() else {
        return Err(MalformedInput("empty message text".to_string()));
    };
    if parse_amount(account).is_some() {
        return Err(MalformedInput(
            "message starts with an amount, the account name is missing".to_string(),
        ));
    }

    let mut amount = None;
    let mut currency = None;
    let mut odds: Vec<Decimal> = Vec::new();
    let mut details: Vec<&str> = Vec::new();

    let mut tokens = tokens.peekable();
    while let Some(token) = tokens.next() {
        if odds.len() < 2 {
            if let Some(value) = parse_odds(token) {
                odds.push(value);
                continue;
            }
        }

        if amount.is_none() {
            if let Some(value) = parse_amount(token) {
                amount = Some(value);
                // the currency code rides directly behind the amount
                if let Some(next) = tokens.peek() {
                    if is_currency(next) {
                        currency = Some(next.to_uppercase());
                        tokens.next();
                    }
                }
                continue;
            }
        }

        details.push(token);
    }

    let Some(amount) = amount else {
        return Err(MalformedInput("no amount in message".to_string()));
    };

    Ok(BetRecord {
        message_id: msg.message_id.clone(),
        received_at: msg.received_at,
        account: account.to_string(),
        details: details.join(" "),
        amount,
        odds: odds.first().copied(),
        correct_odds: odds.get(1).copied(),
        currency: currency.unwrap_or_else(|| "USD".to_string()),
    })
}

fn parse_amount(token: &str) -> Option<Decimal> {
    let (digits, thousands) = match token.strip_suffix(['k', 'K']) {
        Some(stripped) => (stripped, true),
        None => (token, false),
    };

    // Decimal::from_str already rejects empty input, lone signs and anything
    // with letters, so it is the whole shape check
    let value = Decimal::from_str(digits).ok()?;
    if thousands {
        Some(value * Decimal::ONE_THOUSAND)
    } else {
        Some(value)
    }
}

fn parse_odds(token: &str) -> Option<Decimal> {
    Decimal::from_str(token.strip_prefix('@')?).ok()
}

fn is_currency(token: &str) -> bool {
    token.len() == 3 && token.chars().all(|c| c.is_ascii_alphabetic())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(text: &str) -> InboundMessage {
        InboundMessage {
            message_id: "msg_1".to_string(),
            received_at: "2024-03-01T12:00:00Z".parse().unwrap(),
            text: text.to_string(),
        }
    }

    #[test]
    fn plain_bet() {
        let record = parse(&msg("AccountA bets 50 on TeamX")).unwrap();

        assert_eq!(record.message_id, "msg_1");
        assert_eq!(record.account, "AccountA");
        assert_eq!(record.details, "bets on TeamX");
        assert_eq!(record.amount, Decimal::from(50));
        assert_eq!(record.odds, None);
        assert_eq!(record.correct_odds, None);
        assert_eq!(record.currency, "USD");
    }

    #[test]
    fn thousands_suffix_and_currency() {
        let record = parse(&msg("Marco 50k PHP on MUN/CHE")).unwrap();

        assert_eq!(record.amount, Decimal::from(50000));
        assert_eq!(record.currency, "PHP");
        assert_eq!(record.details, "on MUN/CHE");
    }

    #[test]
    fn fractional_thousands() {
        let record = parse(&msg("Marco 1.5k PHP on MUN/CHE")).unwrap();

        assert_eq!(record.amount, Decimal::from(1500));
    }

    #[test]
    fn odds_pair() {
        let record = parse(&msg("Marco MUN/CHE u2.5 @1.95 @2.05 50k PHP")).unwrap();

        assert_eq!(record.account, "Marco");
        assert_eq!(record.details, "MUN/CHE u2.5");
        assert_eq!(record.amount, Decimal::from(50000));
        assert_eq!(record.odds, Some("1.95".parse().unwrap()));
        assert_eq!(record.correct_odds, Some("2.05".parse().unwrap()));
        assert_eq!(record.currency, "PHP");
    }

    #[test]
    fn negative_amount() {
        let record = parse(&msg("Marco correction -25 late entry")).unwrap();

        assert_eq!(record.amount, Decimal::from(-25));
        assert_eq!(record.details, "correction late entry");
    }

    #[test]
    fn first_amount_wins() {
        let record = parse(&msg("Marco split 50 then 60 more")).unwrap();

        assert_eq!(record.amount, Decimal::from(50));
        assert_eq!(record.details, "split then 60 more");
    }

    #[test]
    fn short_word_after_amount_is_not_currency() {
        let record = parse(&msg("AccountA bets 50 on TeamX")).unwrap();

        assert_eq!(record.currency, "USD");
        assert!(record.details.contains("on"));
    }

    #[test]
    fn missing_amount_is_rejected() {
        let Err(MalformedInput(reason)) = parse(&msg("AccountA shrugs at TeamX")) else {
            panic!();
        };
        assert_eq!(reason, "no amount in message");
    }

    #[test]
    fn empty_text_is_rejected() {
        let Err(MalformedInput(reason)) = parse(&msg("   ")) else {
            panic!();
        };
        assert_eq!(reason, "empty message text");
    }

    #[test]
    fn leading_amount_is_rejected() {
        let Err(MalformedInput(_)) = parse(&msg("50 on TeamX")) else {
            panic!();
        };
    }
}
