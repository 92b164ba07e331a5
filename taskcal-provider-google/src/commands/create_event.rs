use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use google_calendar::types::SendUpdates;
use taskcal_core::protocol::{CreateEvent, CreatedEvent, EventDateTime, EventRequest};

use crate::session::Session;

pub async fn handle(cmd: CreateEvent) -> Result<CreatedEvent> {
    let client = Session::ensure_authenticated().await?.client();
    let google_event = to_google(&cmd.event)?;

    let response = client
        .events()
        .insert(
            &cmd.calendar_id,
            0,
            0,
            false,
            SendUpdates::None,
            false,
            &google_event,
        )
        .await
        .with_context(|| format!("Failed to create event: {}", &google_event.summary))?;

    Ok(from_google(response.body, &cmd.event))
}

fn to_google_time(time: &EventDateTime) -> Result<google_calendar::types::EventDateTime> {
    let instant = DateTime::parse_from_rfc3339(&time.date_time)
        .with_context(|| format!("Invalid event time '{}'", time.date_time))?;

    Ok(google_calendar::types::EventDateTime {
        date: None,
        date_time: Some(instant.with_timezone(&Utc)),
        time_zone: time.time_zone.clone(),
    })
}

fn to_google(event: &EventRequest) -> Result<google_calendar::types::Event> {
    Ok(google_calendar::types::Event {
        summary: event.summary.clone(),
        start: Some(to_google_time(&event.start)?),
        end: Some(to_google_time(&event.end)?),
        ..Default::default()
    })
}

/// Render Google's start back in the event's own zone, falling back to what
/// was sent when the response has no usable time.
fn from_google(created: google_calendar::types::Event, sent: &EventRequest) -> CreatedEvent {
    let start = created
        .start
        .and_then(|start| {
            let instant = start.date_time?;
            let zone_name = if start.time_zone.is_empty() {
                sent.start.time_zone.clone()
            } else {
                start.time_zone
            };
            let date_time = match zone_name.parse::<Tz>() {
                Ok(zone) => instant.with_timezone(&zone).to_rfc3339(),
                Err(_) => instant.to_rfc3339(),
            };
            Some(EventDateTime {
                date_time,
                time_zone: zone_name,
            })
        })
        .unwrap_or_else(|| sent.start.clone());

    CreatedEvent {
        id: created.id,
        summary: created.summary,
        start,
        html_link: Some(created.html_link).filter(|link| !link.is_empty()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn request() -> EventRequest {
        EventRequest {
            summary: "Email client about delay".into(),
            start: EventDateTime {
                date_time: "2024-01-01T10:00:00+05:30".into(),
                time_zone: "Asia/Kolkata".into(),
            },
            end: EventDateTime {
                date_time: "2024-01-01T11:00:00+05:30".into(),
                time_zone: "Asia/Kolkata".into(),
            },
        }
    }

    #[test]
    fn converts_to_utc_instant_with_zone_name() {
        let event = to_google(&request()).unwrap();
        let start = event.start.unwrap();

        assert_eq!(event.summary, "Email client about delay");
        assert_eq!(
            start.date_time,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 4, 30, 0).unwrap())
        );
        assert_eq!(start.time_zone, "Asia/Kolkata");
        assert!(start.date.is_none());
        assert!(event.id.is_empty());
    }

    #[test]
    fn rejects_malformed_time() {
        let mut bad = request();
        bad.end.date_time = "tomorrow at ten".into();
        assert!(to_google(&bad).is_err());
    }

    #[test]
    fn created_event_start_is_rendered_in_its_zone() {
        let mut created = to_google(&request()).unwrap();
        created.id = "abc123".into();
        created.html_link = "https://calendar.google.com/event?eid=abc123".into();

        let confirmed = from_google(created, &request());

        assert_eq!(confirmed.id, "abc123");
        assert_eq!(confirmed.start.date_time, "2024-01-01T10:00:00+05:30");
        assert_eq!(confirmed.start.time_zone, "Asia/Kolkata");
        assert!(confirmed.html_link.is_some());
    }

    #[test]
    fn missing_start_falls_back_to_request() {
        let created = google_calendar::types::Event {
            id: "abc123".into(),
            summary: "Email client about delay".into(),
            ..Default::default()
        };

        let confirmed = from_google(created, &request());
        assert_eq!(confirmed.start, request().start);
        assert_eq!(confirmed.html_link, None);
    }
}
