use crate::infra::{format_timestamp, seeded_directory, Desk};
use crate::routes::{appointment_rows, visit_rows};
use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use clap::Args;
use std::path::PathBuf;
use visitor_desk::error::AppError;
use visitor_desk::export::{CsvExporter, DocumentRenderer};
use visitor_desk::workflows::appointments::{HostId, NewAppointment, Requester};
use visitor_desk::workflows::visits::{
    AccessLogEntry, AccessStatus, OverstayResolution, Token, VisitBoardRow, VisitorId,
};
use visitor_desk::workflows::RouteSettings;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Meeting day (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) date: Option<NaiveDate>,
    /// Write the final visit board as CSV to this path.
    #[arg(long)]
    pub(crate) export: Option<PathBuf>,
}

fn clock(day: NaiveDate, hour: i64, minute: i64) -> NaiveDateTime {
    day.and_time(NaiveTime::MIN) + Duration::hours(hour) + Duration::minutes(minute)
}

fn visitor(day: NaiveDate, name: &str, company: &str, hour: i64, minutes: u32) -> NewAppointment {
    let slug = name.to_lowercase().replace(' ', ".");
    NewAppointment {
        requester: Requester {
            id: format!("req-{slug}"),
            name: name.to_string(),
            email: format!("{slug}@{}.test", company.to_lowercase()),
            company: Some(company.to_string()),
        },
        host_id: HostId("host-1".to_string()),
        purpose: "Partner review".to_string(),
        requested_date: day,
        requested_time: clock(day, hour, 0).time(),
        duration_minutes: Some(minutes),
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { date, export } = args;
    let day = date.unwrap_or_else(|| Local::now().date_naive());
    let desk = Desk::in_memory(seeded_directory(), RouteSettings::default());

    println!("Visitor desk demo for {day}");

    let jane = desk
        .appointments
        .create(visitor(day, "Jane Smith", "Acme", 9, 30))?;
    let sam = desk
        .appointments
        .create(visitor(day, "Sam Lee", "Globex", 10, 45))?;
    println!("\nRequested appointments");
    for record in [&jane, &sam] {
        println!(
            "  {} {} at {} ({})",
            record.id,
            record.requester.name,
            format_timestamp(Some(record.starts_at())),
            record.approval_status.label()
        );
    }

    let prompt = desk.appointments.request_approval(&jane.id)?;
    println!("\nLocations offered for {}:", jane.id);
    for location in &prompt.locations {
        println!("  {} {}", location.id.0, location.name);
    }
    let chosen = prompt.locations.last().map(|location| location.id.clone());
    let jane = desk.appointments.confirm_approval(&jane.id, chosen)?;

    desk.appointments.request_decline(&sam.id)?;
    let sam = desk
        .appointments
        .confirm_decline(&sam.id, "Host travelling that week")?;
    for record in [&jane, &sam] {
        println!(
            "  {} -> {}{}",
            record.id,
            record.approval_status.label(),
            record
                .decline_comment
                .as_deref()
                .map(|comment| format!(" ({comment})"))
                .unwrap_or_default()
        );
    }

    let badge = Token("RFID-1001".to_string());
    desk.visits
        .issue_token(&jane.id, VisitorId("visitor-jane".to_string()), badge.clone())?;
    desk.visits.check_in(&badge, clock(day, 9, 0))?;
    for (location, status, minute) in [
        ("Lobby", AccessStatus::Allowed, 2),
        ("Lab", AccessStatus::Allowed, 10),
        ("Server Room", AccessStatus::Denied, 20),
    ] {
        desk.visits.record_scan(AccessLogEntry {
            token: badge.clone(),
            location: location.to_string(),
            status,
            timestamp: clock(day, 9, minute),
        })?;
    }
    println!(
        "\n{} checked in, last seen at {}",
        badge,
        desk.visits.current_location(&badge)?
    );

    let check = clock(day, 9, 45);
    let flagged = desk.visits.overstays(check)?;
    println!("\nOverstays at {}", format_timestamp(Some(check)));
    print_board(&flagged);

    let new_end = desk.visits.extend_stay(&badge, 30)?;
    println!("Stay extended to {}", format_timestamp(Some(new_end)));

    let wrap_up = clock(day, 10, 20);
    let ended = desk
        .visits
        .resolve_overstay(&badge, wrap_up, OverstayResolution::End)?;
    println!("Meeting ended: {}", ended.status().label());

    let board = desk.visits.visit_board(wrap_up)?;
    println!("\nVisit board");
    print_board(&board);
    println!(
        "\nAppointment export: {} rows, visit export: {} rows",
        appointment_rows(&[jane, sam]).len(),
        board.len()
    );

    if let Some(path) = export {
        CsvExporter.render_to_path(&visit_rows(&board), &path)?;
        println!("Visit board written to {}", path.display());
    }

    Ok(())
}

fn print_board(rows: &[VisitBoardRow]) {
    if rows.is_empty() {
        println!("  (none)");
        return;
    }
    for row in rows {
        let actions: Vec<&str> = row.actions.iter().map(|action| action.label()).collect();
        println!(
            "  {:<10} {:<14} {:<12} ends {}{}",
            row.token.to_string(),
            row.status_label,
            row.current_location,
            format_timestamp(row.scheduled_end),
            if actions.is_empty() {
                String::new()
            } else {
                format!(" [{}]", actions.join(" / "))
            }
        );
    }
}
