//! Facility login export: one row per login session.

use chrono::{NaiveDate, NaiveTime};
use phc_model::columns::{BLOCK_NAME, DATE, DISTRICT_NAME, PHC_NAME, PHC_UPTIME};
use phc_model::{FactKind, QualityReport, WarehouseConfig};
use polars::prelude::DataFrame;

use super::{FactPreprocessor, RowFilter, ensure_any_parsed};
use crate::datetime::{DMY_FORMAT, parse_dmy};
use crate::error::Result;
use crate::frame::FactFrame;
use crate::frame_builder::ColumnValues;
use crate::table::TextTable;

pub const LOGIN_TIME: &str = "Login Time";
pub const LOGOUT_TIME: &str = "Logout Time";
pub const DISTRICT: &str = "District";
pub const BLOCK: &str = "Block";
pub const PHC: &str = "PHC";

const SESSION_TIME_FORMAT: &str = "%H:%M:%S";

const REQUIRED: &[&str] = &[DATE, LOGIN_TIME, LOGOUT_TIME, DISTRICT, BLOCK, PHC];

pub const DROPPED_COLUMNS: &[&str] = &[
    "SL No.",
    "Cluster",
    "LT Name",
    "Qualification",
    "Approval Date",
    "Phase",
    "Location",
    LOGIN_TIME,
    LOGOUT_TIME,
    "Duration(hh:mm:ss)",
    "Remark",
    "WorkbookName",
];

#[derive(Debug, Clone)]
struct Session {
    date: Option<NaiveDate>,
    login: Option<NaiveTime>,
    logout: Option<NaiveTime>,
}

impl Session {
    /// Logout minus login, in whole seconds.
    fn uptime_secs(&self) -> Option<i64> {
        Some((self.logout? - self.login?).num_seconds())
    }
}

pub struct PhcLoginPreprocessor;

impl FactPreprocessor for PhcLoginPreprocessor {
    fn kind(&self) -> FactKind {
        FactKind::PhcLogin
    }

    fn required_columns(&self) -> &'static [&'static str] {
        REQUIRED
    }

    fn description(&self) -> &'static str {
        "Derives facility uptime per login session"
    }

    fn preprocess(&self, raw: &DataFrame, _config: &WarehouseConfig) -> Result<FactFrame> {
        let kind = self.kind();
        let dataset = kind.as_str();
        let mut table = TextTable::from_frame(raw)?;
        table.require(dataset, self.required_columns())?;

        let raw_dates = table.required(dataset, DATE)?;
        let raw_logins = table.required(dataset, LOGIN_TIME)?;
        let raw_logouts = table.required(dataset, LOGOUT_TIME)?;
        let mut sessions: Vec<Session> = (0..table.height())
            .map(|row| Session {
                date: raw_dates[row].as_deref().and_then(parse_dmy),
                login: raw_logins[row].as_deref().and_then(parse_session_time),
                logout: raw_logouts[row].as_deref().and_then(parse_session_time),
            })
            .collect();

        let dates: Vec<_> = sessions.iter().map(|s| s.date).collect();
        ensure_any_parsed(kind, DATE, raw_dates, &dates, DMY_FORMAT)?;
        let logins: Vec<_> = sessions.iter().map(|s| s.login).collect();
        ensure_any_parsed(kind, LOGIN_TIME, raw_logins, &logins, SESSION_TIME_FORMAT)?;
        let logouts: Vec<_> = sessions.iter().map(|s| s.logout).collect();
        ensure_any_parsed(kind, LOGOUT_TIME, raw_logouts, &logouts, SESSION_TIME_FORMAT)?;

        let mut quality = QualityReport::new();
        let mut filter = RowFilter {
            kind,
            quality: &mut quality,
        };
        let keep: Vec<bool> = sessions.iter().map(|s| s.date.is_some()).collect();
        filter.apply(
            &mut table,
            &mut sessions,
            &keep,
            "login_date",
            "unparseable login date",
        );
        let keep: Vec<bool> = sessions
            .iter()
            .map(|s| s.login.is_some() && s.logout.is_some())
            .collect();
        filter.apply(
            &mut table,
            &mut sessions,
            &keep,
            "session_time",
            "unparseable login or logout time",
        );
        filter.missing_facility(&mut table, &mut sessions, PHC);

        table.drop_columns(DROPPED_COLUMNS);
        table.rename(DISTRICT, DISTRICT_NAME);
        table.rename(BLOCK, BLOCK_NAME);
        table.rename(PHC, PHC_NAME);

        let mut builder = table.into_builder();
        builder
            .set(
                DATE,
                ColumnValues::Date(sessions.iter().map(|s| s.date).collect()),
            )
            .set(
                PHC_UPTIME,
                ColumnValues::Int(sessions.iter().map(Session::uptime_secs).collect()),
            );

        Ok(FactFrame::new(kind, builder.build()?).with_quality(quality))
    }
}

fn parse_session_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), SESSION_TIME_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uptime_is_logout_minus_login() {
        let session = Session {
            date: NaiveDate::from_ymd_opt(2024, 1, 1),
            login: parse_session_time("09:00:00"),
            logout: parse_session_time("17:30:15"),
        };
        assert_eq!(session.uptime_secs(), Some(30_615));
    }

    #[test]
    fn session_times_are_24h_only() {
        assert!(parse_session_time("09:00:00 AM").is_none());
        assert!(parse_session_time("9:05:00").is_some());
    }
}
