use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone};
use std::io::{self, Write};

use super::Notifier;
use crate::error::Result;

/// Prints alerts to stdout: timestamp, title, link, then a blank line.
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn send(&self, title: &str, url: &str) -> Result<()> {
        print_alert(&format_alert(&Local::now(), title, url))
    }
}

fn print_alert(alert: &str) -> Result<()> {
    write_alert(&mut io::stdout().lock(), alert)
}

/// A closed or broken stdout is reported as an error rather than a panic.
pub fn write_alert<W: Write>(out: &mut W, alert: &str) -> Result<()> {
    out.write_all(alert.as_bytes())?;
    out.flush()?;
    Ok(())
}

pub fn format_alert<Tz: TimeZone>(at: &DateTime<Tz>, title: &str, url: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{}\n{}\n{}\n\n", at.format("%b %-d, %-I:%M%p"), title, url)
}
