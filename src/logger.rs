use ansi_term::Colour;
use chrono_tz::Tz;
use env_logger::{Builder, Env};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Console logger, optionally mirrored (uncoloured) into `log_file`.
///
/// `RUST_LOG` overrides the default `info` filter. Unknown timezone names
/// fall back to UTC.
pub fn init(timezone: &str, log_file: Option<&Path>) -> std::io::Result<()> {
    let log_file: Option<File> = match log_file {
        Some(path) => Some(OpenOptions::new().create(true).append(true).open(path)?),
        None => None,
    };

    let parsed_tz = timezone.parse::<Tz>().ok();
    let tz = parsed_tz.unwrap_or(Tz::UTC);

    Builder::from_env(Env::default().default_filter_or("info"))
        .format(move |buf, record| {
            let timestamp = chrono::Utc::now()
                .with_timezone(&tz)
                .format("%Y-%m-%dT%H:%M:%S%:z");

            let level = match record.level() {
                log::Level::Error => Colour::Red.paint(record.level().to_string()),
                log::Level::Warn => Colour::Yellow.paint(record.level().to_string()),
                log::Level::Info => Colour::Green.paint(record.level().to_string()),
                log::Level::Debug => Colour::Blue.paint(record.level().to_string()),
                log::Level::Trace => Colour::Purple.paint(record.level().to_string()),
            };

            if let Some(file) = &log_file {
                let _ = writeln!(
                    &*file,
                    "[{} {} {}] {}",
                    timestamp,
                    record.level(),
                    record.module_path().unwrap_or_default(),
                    record.args()
                );
            }

            writeln!(
                buf,
                "[{} {} {}] {}",
                timestamp,
                level,
                record.module_path().unwrap_or_default(),
                record.args()
            )
        })
        .init();

    if parsed_tz.is_none() {
        log::warn!("Unknown log timezone {:?}, using UTC", timezone);
    }

    Ok(())
}
