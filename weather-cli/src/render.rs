use std::fmt::Write;

use chrono::Local;
use weather_core::{DrainReport, QueueEntry, ViewState};

pub fn view(view: &ViewState, temperature: Option<&str>) -> String {
    let mut out = String::new();

    if view.loading {
        let _ = writeln!(out, "Loading...");
    }
    if let Some(error) = &view.error {
        let _ = writeln!(out, "Error: {error}");
    }
    if let Some(weather) = &view.weather {
        let loc = &weather.location;
        let cur = &weather.current;
        let _ = writeln!(out, "{}, {}, {}", loc.name, loc.region, loc.country);
        if let Some(temperature) = temperature {
            let _ = writeln!(out, "  Temperature: {temperature}");
        }
        let _ = writeln!(out, "  Condition: {}", cur.condition.text);
        if !cur.condition.icon.is_empty() {
            let _ = writeln!(out, "  Icon: {}", icon_url(&cur.condition.icon));
        }
        let _ = writeln!(out, "  Humidity: {}%", cur.humidity);
        let _ = writeln!(out, "  Pressure: {} mb", cur.pressure_mb);
        let _ = writeln!(out, "  Visibility: {} km", cur.vis_km);
    }
    if !view.recent.is_empty() {
        out.push_str(&recent_list(&view.recent));
    }

    out
}

/// WeatherAPI returns protocol-relative icon URLs.
fn icon_url(icon: &str) -> String {
    if icon.starts_with("//") { format!("https:{icon}") } else { icon.to_string() }
}

pub fn recent_list(items: &[String]) -> String {
    if items.is_empty() {
        return "No recent searches.\n".to_string();
    }
    let mut out = String::from("Recent Searches:\n");
    for (i, city) in items.iter().enumerate() {
        let _ = writeln!(out, "  {}. {city}", i + 1);
    }
    out
}

pub fn queue_list(entries: &[QueueEntry]) -> String {
    if entries.is_empty() {
        return "Offline queue is empty.\n".to_string();
    }
    let mut out = format!("{} queued lookup(s):\n", entries.len());
    for entry in entries {
        let when = entry
            .submitted_at()
            .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| entry.timestamp.to_string());
        let _ = writeln!(out, "  {when}  {:?}", entry.city_name);
    }
    out
}

pub fn drain_report(report: &DrainReport) -> String {
    if report.is_empty() {
        return "Nothing to replay.\n".to_string();
    }
    let mut out = format!(
        "Replayed {} queued lookup(s), {} succeeded.\n",
        report.attempted(),
        report.succeeded()
    );
    for (entry, reason) in report.failures() {
        let _ = writeln!(out, "  dropped {:?}: {reason}", entry.city_name);
    }
    out
}

pub fn banner(message: &str) -> String {
    format!("*** weather notification: {message} ***")
}

#[cfg(test)]
mod tests {
    use super::*;
    use weather_core::{
        ReplayOutcome,
        model::{Condition, CurrentConditions, WeatherLocation, WeatherRecord},
    };

    fn oslo() -> WeatherRecord {
        WeatherRecord {
            location: WeatherLocation {
                name: "Oslo".into(),
                region: "Oslo".into(),
                country: "Norway".into(),
                lat: None,
                lon: None,
                localtime: None,
            },
            current: CurrentConditions {
                temp_c: 3.0,
                temp_f: 37.4,
                condition: Condition { text: "Overcast".into(), icon: "//cdn.weatherapi.com/122.png".into() },
                humidity: 87,
                pressure_mb: 1012.0,
                vis_km: 10.0,
                feelslike_c: None,
                feelslike_f: None,
                wind_kph: None,
                last_updated_epoch: None,
            },
        }
    }

    #[test]
    fn renders_record_and_recent() {
        let state = ViewState {
            weather: Some(oslo()),
            recent: vec!["Oslo".into(), "Lima".into()],
            ..ViewState::default()
        };

        let out = view(&state, Some("37.4 °F"));

        assert!(out.starts_with("Oslo, Oslo, Norway\n"));
        assert!(out.contains("Temperature: 37.4 °F"));
        assert!(out.contains("Icon: https://cdn.weatherapi.com/122.png"));
        assert!(out.contains("Humidity: 87%"));
        assert!(out.contains("Pressure: 1012 mb"));
        assert!(out.contains("Visibility: 10 km"));
        assert!(out.contains("  2. Lima"));
        assert!(!out.contains("Loading"));
    }

    #[test]
    fn renders_loading_and_error() {
        let state = ViewState {
            loading: true,
            error: Some("City not found. Please try again.".into()),
            ..ViewState::default()
        };

        let out = view(&state, None);
        assert_eq!(out, "Loading...\nError: City not found. Please try again.\n");
    }

    #[test]
    fn drain_report_lists_dropped_entries() {
        let report = DrainReport {
            outcomes: vec![
                (QueueEntry { city_name: "Paris".into(), timestamp: 1 }, ReplayOutcome::Ok),
                (
                    QueueEntry { city_name: "Atlantis".into(), timestamp: 2 },
                    ReplayOutcome::Failed("not found".into()),
                ),
            ],
        };

        let out = drain_report(&report);
        assert!(out.starts_with("Replayed 2 queued lookup(s), 1 succeeded."));
        assert!(out.contains(r#"dropped "Atlantis": not found"#));
    }

    #[test]
    fn empty_lists_have_messages() {
        assert_eq!(queue_list(&[]), "Offline queue is empty.\n");
        assert_eq!(recent_list(&[]), "No recent searches.\n");
        assert_eq!(drain_report(&DrainReport::default()), "Nothing to replay.\n");
    }
}
