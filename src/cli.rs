use chrono::{Local, NaiveDate};

use zonecal::{
    calendar::{Calendar, Event},
    storage::config::{Config, DisplayConfig},
    Session,
};

use crate::sample::add_sample_events;

pub const USAGE: &str = "Usage: zonecal [--agenda [YYYY-MM-DD]] [--calendar NAME] [--sample] [--json]";

#[derive(Debug, Clone, PartialEq)]
pub struct CliOptions {
    pub agenda_date: NaiveDate,
    pub calendar: Option<String>,
    pub sample: bool,
    pub json: bool,
}

pub enum CliMode {
    Help,
    Agenda(CliOptions),
}

pub fn parse_cli_mode() -> Result<CliMode, String> {
    parse_args(std::env::args().skip(1), Local::now().date_naive())
}

fn parse_args(args: impl Iterator<Item = String>, today: NaiveDate) -> Result<CliMode, String> {
    let mut options = CliOptions {
        agenda_date: today,
        calendar: None,
        sample: false,
        json: false,
    };
    let mut args = args.peekable();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--sample" => options.sample = true,
            "--json" => options.json = true,
            "--agenda" => {
                if let Some(next) = args.next_if(|next| !next.starts_with("--")) {
                    options.agenda_date = NaiveDate::parse_from_str(&next, "%Y-%m-%d")
                        .map_err(|_| format!("Invalid date '{}'. Use YYYY-MM-DD.", next))?;
                }
            }
            "--calendar" => {
                let name = args
                    .next_if(|next| !next.starts_with("--"))
                    .ok_or_else(|| "--calendar requires a calendar name".to_string())?;
                options.calendar = Some(name);
            }
            "--help" => return Ok(CliMode::Help),
            _ => return Err(format!("Unknown argument: {}", arg)),
        }
    }

    Ok(CliMode::Agenda(options))
}

pub fn run_agenda_mode(options: &CliOptions) -> anyhow::Result<()> {
    let config = Config::load_or_create()?;
    let mut session = Session::from_config(&config)?;

    if let Some(name) = &options.calendar {
        session.activate(name)?;
    }
    if options.sample {
        add_sample_events(session.active_mut()?, options.agenda_date)?;
    }

    let calendar = session.active()?;
    let events = calendar.events_on(options.agenda_date);
    tracing::info!("Showing {} event(s) for {}", events.len(), options.agenda_date);

    if options.json {
        println!("{}", serde_json::to_string_pretty(&events)?);
    } else {
        println!("{}", format_agenda_text(options.agenda_date, calendar, &events, &config.display));
    }

    Ok(())
}

fn format_agenda_text(date: NaiveDate, calendar: &Calendar, events: &[Event], display: &DisplayConfig) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "Agenda – {} ({}, {})",
        date.format(&display.date_format),
        calendar.name(),
        calendar.timezone()
    ));
    lines.push(String::new());

    if events.is_empty() {
        lines.push("No events scheduled.".to_string());
    } else {
        for event in events {
            let marker = if calendar.is_in_series(event) { "*" } else { "-" };
            lines.push(format!("{} {}", marker, event));
        }
    }

    lines.join("\n")
}
