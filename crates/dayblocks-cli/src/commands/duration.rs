use clap::{Subcommand, ValueEnum};
use dayblocks_core::duration;

use super::CliResult;

#[derive(Clone, Copy, ValueEnum)]
pub enum Grain {
    /// 1h30m
    Hm,
    /// 1h30m25s
    Hms,
    /// 01:30:25
    Clock,
    /// 1h 30min
    Human,
}

#[derive(Subcommand)]
pub enum DurationAction {
    /// Duration text to seconds
    Parse {
        text: String,
        /// Accept partial forms like "23m4.5s"
        #[arg(long)]
        loose: bool,
    },
    /// Seconds to duration text
    Format {
        seconds: f64,
        #[arg(long, value_enum, default_value = "hms")]
        grain: Grain,
    },
}

pub fn run(action: DurationAction) -> CliResult {
    match action {
        DurationAction::Parse { text, loose } => {
            let seconds = if loose {
                duration::parse_loose(&text)?
            } else {
                duration::parse(&text)?
            };
            println!("{seconds}");
        }
        DurationAction::Format { seconds, grain } => {
            let text = match grain {
                Grain::Hm => duration::format_hm(seconds),
                Grain::Hms => duration::format_hms(seconds),
                Grain::Clock => duration::format_clock(seconds),
                Grain::Human => duration::format_human(seconds),
            };
            println!("{text}");
        }
    }
    Ok(())
}
