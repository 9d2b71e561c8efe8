//! Feeds the bot from standard input, one event per line.
//!
//! A line starts with the numeric user id, followed by
//!
//! - `@lat, lon` for a shared location,
//! - `#file_id` for an uploaded photo,
//! - `!message_id data` for a pressed button,
//! - `^user_id text` for an answer to a message forwarded from that user,
//! - `/command args` or plain text.

use raydb_chat::{Bot, Event, Input};
use raydb_core::{
    entities::{Location, LocationError, Timestamp, UserId},
    gateways::messenger::MessageId,
};
use std::time::Duration;
use thiserror::Error;
use tokio::{
    io::{stdin, AsyncBufReadExt as _, BufReader},
    time::MissedTickBehavior,
};

#[derive(Debug, Error, PartialEq)]
pub enum LineError {
    #[error("A line needs a user id and an input")]
    Incomplete,
    #[error("Invalid user id {0:?}")]
    UserId(String),
    #[error("Invalid message id {0:?}")]
    MessageId(String),
    #[error(transparent)]
    Location(#[from] LocationError),
}

pub fn parse_event(line: &str) -> Result<Event, LineError> {
    let (user, rest) = line
        .trim()
        .split_once(char::is_whitespace)
        .ok_or(LineError::Incomplete)?;
    let user = user
        .parse::<UserId>()
        .map_err(|_| LineError::UserId(user.to_string()))?;
    let rest = rest.trim();
    let input = if let Some(location) = rest.strip_prefix('@') {
        Input::Location(location.parse::<Location>()?)
    } else if let Some(file_id) = rest.strip_prefix('#') {
        Input::Photo(file_id.trim().to_string())
    } else if let Some(callback) = rest.strip_prefix('!') {
        let (message, data) = callback
            .split_once(char::is_whitespace)
            .ok_or(LineError::Incomplete)?;
        let message = message
            .parse()
            .map(MessageId)
            .map_err(|_| LineError::MessageId(message.to_string()))?;
        Input::Callback {
            data: data.trim().to_string(),
            message,
        }
    } else if let Some(reply) = rest.strip_prefix('^') {
        let (to, text) = reply
            .split_once(char::is_whitespace)
            .ok_or(LineError::Incomplete)?;
        let to = to
            .parse::<UserId>()
            .map_err(|_| LineError::UserId(to.to_string()))?;
        Input::Reply {
            to,
            text: text.trim().to_string(),
        }
    } else {
        Input::parse_line(rest)
    };
    Ok(Event {
        user,
        user_name: None,
        input,
    })
}

pub async fn run(mut bot: Bot, sweep_interval: Duration) -> anyhow::Result<()> {
    let mut lines = BufReader::new(stdin()).lines();
    let mut sweep_ticker = tokio::time::interval(sweep_interval);
    sweep_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!("Reading events from stdin");
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("End of input");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_event(&line) {
                    Ok(event) => bot.handle(event, Timestamp::now()),
                    Err(err) => warn!("Ignoring line {:?}: {}", line, err),
                }
            }
            _ = sweep_ticker.tick() => {
                bot.sweep(Timestamp::now());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(line: &str) -> Input {
        parse_event(line).unwrap().input
    }

    #[test]
    fn parse_text_and_commands() {
        let event = parse_event("42 bakery").unwrap();
        assert_eq!(UserId::new(42), event.user);
        assert_eq!(Input::Text("bakery".into()), event.input);
        assert_eq!(
            Input::Command {
                name: "review".into(),
                args: "m6 2".into()
            },
            input("7 /Review m6 2")
        );
    }

    #[test]
    fn parse_location_photo_and_callback() {
        assert!(matches!(input("7 @60.2, 30.1"), Input::Location(_)));
        assert_eq!(Input::Photo("AbC".into()), input("7 #AbC"));
        assert_eq!(
            Input::Callback {
                data: "poi:12".into(),
                message: MessageId(3)
            },
            input("7 !3 poi:12")
        );
        assert_eq!(
            Input::Reply {
                to: UserId::new(42),
                text: "It opens at nine".into()
            },
            input("2 ^42 It opens at nine")
        );
    }

    #[test]
    fn reject_malformed_lines() {
        assert_eq!(Err(LineError::Incomplete), parse_event("42").map(|e| e.user));
        assert_eq!(
            Err(LineError::UserId("bob".into())),
            parse_event("bob hello").map(|e| e.user)
        );
        assert_eq!(
            Err(LineError::MessageId("x".into())),
            parse_event("1 !x poi:1").map(|e| e.user)
        );
        assert!(parse_event("1 @100, 200").is_err());
        assert_eq!(Err(LineError::Incomplete), parse_event("1 ^42").map(|e| e.user));
    }
}
