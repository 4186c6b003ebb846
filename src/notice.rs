//! Notice input model and the one place where missing fields turn into
//! display placeholders.

use serde::Deserialize;
use std::path::PathBuf;

/// Where the header logo comes from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum LogoSource {
    Bytes(Vec<u8>),
    /// `data:` URI, base64 or raw.
    DataUri(String),
    Path(PathBuf),
}

impl From<String> for LogoSource {
    fn from(value: String) -> Self {
        if value.starts_with("data:") {
            LogoSource::DataUri(value)
        } else {
            LogoSource::Path(PathBuf::from(value))
        }
    }
}

impl LogoSource {
    /// Short description for logs; never includes inline image data.
    pub fn describe(&self) -> String {
        match self {
            LogoSource::Bytes(bytes) => format!("inline bytes ({} bytes)", bytes.len()),
            LogoSource::DataUri(uri) => {
                let header = uri.split(',').next().unwrap_or("data:");
                format!("{header} ({} chars)", uri.len())
            }
            LogoSource::Path(path) => path.display().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScheduleSlot {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub units_label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScheduleDay {
    pub date: Option<String>,
    pub slots: Vec<ScheduleSlot>,
}

/// A regulatory work notice. Free text arrives already localized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NoticeDocument {
    pub title: String,
    pub building_label: String,
    pub body_text: String,
    pub logo_image: Option<LogoSource>,
    pub work_start_date: Option<String>,
    pub work_end_date: Option<String>,
    pub work_start_time: Option<String>,
    pub work_end_time: Option<String>,
    pub job_type_label: Option<String>,
    pub service_provider_label: Option<String>,
    pub contact_label: Option<String>,
    pub schedule: Option<Vec<ScheduleDay>>,
}

/// Fixed strings drawn by the renderer, supplied by the caller's
/// localization layer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NoticeLabels {
    pub official_notice: String,
    pub to_be_determined: String,
    pub dates_to_be_announced: String,
    pub work_period: String,
    pub starting: String,
    pub daily_hours: String,
    pub job_type: String,
    pub schedule_title: String,
    pub date_placeholder: String,
    pub units_placeholder: String,
    pub generated_on: String,
    pub range_separator: String,
}

impl Default for NoticeLabels {
    fn default() -> Self {
        Self {
            official_notice: "OFFICIAL NOTICE".to_string(),
            to_be_determined: "TBD".to_string(),
            dates_to_be_announced: "Dates to be announced".to_string(),
            work_period: "Work period:".to_string(),
            starting: "Starting".to_string(),
            daily_hours: "Daily hours:".to_string(),
            job_type: "Job type:".to_string(),
            schedule_title: "WORK SCHEDULE".to_string(),
            date_placeholder: "Date TBD".to_string(),
            units_placeholder: "Units TBD".to_string(),
            generated_on: "Generated on".to_string(),
            range_separator: " \u{2013} ".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDay {
    pub date: String,
    pub slots: Vec<String>,
}

/// Notice with every optional field resolved to display text or `None`
/// ("skip this element").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNotice<'a> {
    pub title: &'a str,
    pub building_label: &'a str,
    pub body_text: &'a str,
    pub work_period: String,
    pub daily_hours: Option<String>,
    pub job_type: Option<String>,
    pub service_provider: Option<&'a str>,
    pub contact: Option<&'a str>,
    pub schedule: Vec<ResolvedDay>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl<'a> ResolvedNotice<'a> {
    pub fn resolve(doc: &'a NoticeDocument, labels: &NoticeLabels) -> Self {
        let sep = labels.range_separator.as_str();
        let tbd = labels.to_be_determined.as_str();

        let period = match (present(&doc.work_start_date), present(&doc.work_end_date)) {
            (Some(start), Some(end)) => format!("{start}{sep}{end}"),
            (Some(start), None) => format!("{} {start}", labels.starting),
            _ => labels.dates_to_be_announced.clone(),
        };
        let work_period = format!("{} {period}", labels.work_period);

        let daily_hours = match (present(&doc.work_start_time), present(&doc.work_end_time)) {
            (None, None) => None,
            (start, end) => Some(format!(
                "{} {}{sep}{}",
                labels.daily_hours,
                start.unwrap_or(tbd),
                end.unwrap_or(tbd)
            )),
        };

        let job_type = present(&doc.job_type_label).map(|job| format!("{} {job}", labels.job_type));

        let schedule = doc
            .schedule
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|day| ResolvedDay {
                date: present(&day.date)
                    .unwrap_or(&labels.date_placeholder)
                    .to_string(),
                slots: day
                    .slots
                    .iter()
                    .map(|slot| {
                        format!(
                            "{}{sep}{} | {}",
                            present(&slot.start_time).unwrap_or(tbd),
                            present(&slot.end_time).unwrap_or(tbd),
                            present(&slot.units_label).unwrap_or(&labels.units_placeholder)
                        )
                    })
                    .collect(),
            })
            .collect();

        Self {
            title: doc.title.trim(),
            building_label: doc.building_label.trim(),
            body_text: &doc.body_text,
            work_period,
            daily_hours,
            job_type,
            service_provider: present(&doc.service_provider_label),
            contact: present(&doc.contact_label),
            schedule,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn labels() -> NoticeLabels {
        NoticeLabels {
            range_separator: " - ".to_string(),
            ..NoticeLabels::default()
        }
    }

    #[test]
    fn work_period_phrasing_follows_known_dates() {
        let mut doc = NoticeDocument {
            work_start_date: Some("May 4, 2026".to_string()),
            work_end_date: Some("May 9, 2026".to_string()),
            ..NoticeDocument::default()
        };
        let labels = labels();
        assert_eq!(
            ResolvedNotice::resolve(&doc, &labels).work_period,
            "Work period: May 4, 2026 - May 9, 2026"
        );

        doc.work_end_date = None;
        assert_eq!(
            ResolvedNotice::resolve(&doc, &labels).work_period,
            "Work period: Starting May 4, 2026"
        );

        doc.work_start_date = None;
        assert_eq!(
            ResolvedNotice::resolve(&doc, &labels).work_period,
            "Work period: Dates to be announced"
        );

        doc.work_end_date = Some("May 9, 2026".to_string());
        assert_eq!(
            ResolvedNotice::resolve(&doc, &labels).work_period,
            "Work period: Dates to be announced"
        );
    }

    #[test]
    fn blank_strings_count_as_missing() {
        let doc = NoticeDocument {
            work_start_date: Some("   ".to_string()),
            job_type_label: Some(String::new()),
            ..NoticeDocument::default()
        };
        let resolved = ResolvedNotice::resolve(&doc, &labels());
        assert_eq!(resolved.work_period, "Work period: Dates to be announced");
        assert_eq!(resolved.job_type, None);
    }

    #[test]
    fn daily_hours_fill_the_missing_side_with_placeholder() {
        let doc = NoticeDocument {
            work_start_time: Some("8:00 AM".to_string()),
            ..NoticeDocument::default()
        };
        let resolved = ResolvedNotice::resolve(&doc, &labels());
        assert_eq!(
            resolved.daily_hours.as_deref(),
            Some("Daily hours: 8:00 AM - TBD")
        );
        let empty = NoticeDocument::default();
        let bare = ResolvedNotice::resolve(&empty, &labels());
        assert_eq!(bare.daily_hours, None);
    }

    #[test]
    fn schedule_slots_resolve_to_single_lines() {
        let doc = NoticeDocument {
            schedule: Some(vec![ScheduleDay {
                date: None,
                slots: vec![
                    ScheduleSlot {
                        start_time: Some("9:00".to_string()),
                        end_time: Some("12:00".to_string()),
                        units_label: Some("Units 101-108".to_string()),
                    },
                    ScheduleSlot::default(),
                ],
            }]),
            ..NoticeDocument::default()
        };
        let resolved = ResolvedNotice::resolve(&doc, &labels());
        assert_eq!(
            resolved.schedule,
            vec![ResolvedDay {
                date: "Date TBD".to_string(),
                slots: vec![
                    "9:00 - 12:00 | Units 101-108".to_string(),
                    "TBD - TBD | Units TBD".to_string(),
                ],
            }]
        );
    }

    #[test]
    fn notice_deserializes_from_camel_case_json() {
        let doc: NoticeDocument = serde_json::from_str(
            r#"{
                "title": "Balcony Inspection",
                "buildingLabel": "Harbor View Towers",
                "bodyText": "Inspectors will access balconies.",
                "logoImage": "data:image/png;base64,AAAA",
                "workStartDate": null,
                "serviceProviderLabel": "Acme Facade Co.",
                "schedule": [{"date": "Mon, May 4", "slots": [{"startTime": "9:00"}]}]
            }"#,
        )
        .unwrap();
        assert_eq!(doc.building_label, "Harbor View Towers");
        assert_eq!(doc.work_start_date, None);
        assert!(matches!(doc.logo_image, Some(LogoSource::DataUri(_))));
        let schedule = doc.schedule.unwrap();
        assert_eq!(schedule[0].slots[0].start_time.as_deref(), Some("9:00"));
        assert_eq!(schedule[0].slots[0].units_label, None);
    }

    #[test]
    fn logo_description_hides_inline_data() {
        let source = LogoSource::from("data:image/png;base64,QUJD".to_string());
        assert_eq!(source.describe(), "data:image/png;base64 (26 chars)");
        let path = LogoSource::from("/srv/logos/acme.png".to_string());
        assert_eq!(path, LogoSource::Path(PathBuf::from("/srv/logos/acme.png")));
    }
}
