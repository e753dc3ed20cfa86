//! Domain model for driver shift scheduling.
//!
//! Drivers, courses and day-off requests are read-only inputs owned by
//! collaborators. [`ShiftAssignment`] is the only record the engine writes.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::ScheduleError;

/// Wire format for dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[inline]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

opaque_id!(
    /// Opaque identifier of a driver.
    DriverId
);

opaque_id!(
    /// Opaque identifier of a delivery course.
    CourseId
);

/// A calendar day, serialized as `YYYY-MM-DD`.
///
/// ```
/// use shift_scheduling::domain::DateKey;
///
/// let day: DateKey = "2025-06-01".parse().unwrap();
/// assert_eq!(day.to_string(), "2025-06-01");
/// assert!("2025-13-01".parse::<DateKey>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateKey(NaiveDate);

impl DateKey {
    #[inline]
    pub const fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    #[inline]
    pub const fn date(self) -> NaiveDate {
        self.0
    }

    pub fn plus_days(self, days: i64) -> Option<Self> {
        self.0.checked_add_signed(Duration::days(days)).map(Self)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl FromStr for DateKey {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match NaiveDate::parse_from_str(s, DATE_FORMAT) {
            // chrono accepts signs and unpadded fields; only the canonical form is valid
            Ok(date) if date.format(DATE_FORMAT).to_string() == s => Ok(Self(date)),
            _ => Err(ScheduleError::InvalidDate(s.to_string())),
        }
    }
}

impl From<NaiveDate> for DateKey {
    fn from(value: NaiveDate) -> Self {
        Self(value)
    }
}

/// An inclusive range of calendar days with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    start: DateKey,
    end: DateKey,
}

impl DateRange {
    /// Creates a range, rejecting `start > end`.
    ///
    /// ```
    /// use shift_scheduling::domain::{DateKey, DateRange};
    ///
    /// let a = DateKey::from_ymd(2025, 6, 1).unwrap();
    /// let b = DateKey::from_ymd(2025, 6, 3).unwrap();
    /// assert_eq!(DateRange::new(a, b).unwrap().len_days(), 3);
    /// assert!(DateRange::new(b, a).is_err());
    /// ```
    pub fn new(start: DateKey, end: DateKey) -> Result<Self, ScheduleError> {
        if start > end {
            return Err(ScheduleError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn single(day: DateKey) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// Parses both bounds from their wire form.
    pub fn parse(start: &str, end: &str) -> Result<Self, ScheduleError> {
        Self::new(start.parse()?, end.parse()?)
    }

    #[inline]
    pub fn start(&self) -> DateKey {
        self.start
    }

    #[inline]
    pub fn end(&self) -> DateKey {
        self.end
    }

    pub fn len_days(&self) -> i64 {
        (self.end.date() - self.start.date()).num_days() + 1
    }

    pub fn contains(&self, day: DateKey) -> bool {
        self.start <= day && day <= self.end
    }

    /// Days in ascending order.
    pub fn days(&self) -> impl Iterator<Item = DateKey> + '_ {
        let end = self.end.date();
        self.start
            .date()
            .iter_days()
            .take_while(move |d| *d <= end)
            .map(DateKey)
    }

    /// Rejects ranges spanning more than `max_days` days.
    pub fn ensure_max_days(&self, max_days: i64) -> Result<(), ScheduleError> {
        let days = self.len_days();
        if days > max_days {
            return Err(ScheduleError::DateRangeTooLong {
                days,
                max: max_days,
            });
        }
        Ok(())
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// A driver and the courses it may serve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub id: DriverId,
    pub name: String,
    #[serde(default)]
    pub capable_course_ids: BTreeSet<CourseId>,
}

impl Driver {
    pub fn new(id: impl Into<DriverId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            capable_course_ids: BTreeSet::new(),
        }
    }

    pub fn with_courses(mut self, courses: impl IntoIterator<Item = impl Into<CourseId>>) -> Self {
        for course in courses {
            self.capable_course_ids.insert(course.into());
        }
        self
    }

    pub fn can_serve(&self, course: &CourseId) -> bool {
        self.capable_course_ids.contains(course)
    }

    /// Canonical listing order: display name, then id.
    pub fn listing_order(a: &Driver, b: &Driver) -> Ordering {
        a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id))
    }
}

/// A delivery course. `order` fixes the fill order of draft generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    pub order: i32,
}

impl Course {
    pub fn new(id: impl Into<CourseId>, name: impl Into<String>, order: i32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            order,
        }
    }

    /// Fill order: `order`, then id.
    pub fn fill_order(a: &Course, b: &Course) -> Ordering {
        a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id))
    }
}

/// A driver's request to be off on one date.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayOffRequest {
    pub driver_id: DriverId,
    pub date: DateKey,
}

impl DayOffRequest {
    pub fn new(driver_id: impl Into<DriverId>, date: DateKey) -> Self {
        Self {
            driver_id: driver_id.into(),
            date,
        }
    }
}

/// Key of one cell of the assignment grid.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellKey {
    pub date: DateKey,
    pub course_id: CourseId,
}

impl CellKey {
    pub fn new(date: DateKey, course_id: impl Into<CourseId>) -> Self {
        Self {
            date,
            course_id: course_id.into(),
        }
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.date, self.course_id)
    }
}

/// The driver on a (date, course) cell, `None` meaning unfilled.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftAssignment {
    pub date: DateKey,
    pub course_id: CourseId,
    #[serde(default)]
    pub driver_id: Option<DriverId>,
}

impl ShiftAssignment {
    pub fn new(date: DateKey, course_id: impl Into<CourseId>, driver_id: Option<DriverId>) -> Self {
        Self {
            date,
            course_id: course_id.into(),
            driver_id,
        }
    }

    pub fn assigned(date: DateKey, course_id: impl Into<CourseId>, driver_id: impl Into<DriverId>) -> Self {
        Self::new(date, course_id, Some(driver_id.into()))
    }

    pub fn unfilled(date: DateKey, course_id: impl Into<CourseId>) -> Self {
        Self::new(date, course_id, None)
    }

    pub fn key(&self) -> CellKey {
        CellKey::new(self.date, self.course_id.clone())
    }

    pub fn is_filled(&self) -> bool {
        self.driver_id.is_some()
    }
}

/// The read-only collaborator data one scheduling view works against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roster {
    pub courses: Vec<Course>,
    pub drivers: Vec<Driver>,
    #[serde(default)]
    pub day_offs: Vec<DayOffRequest>,
}

impl Roster {
    pub fn new(courses: Vec<Course>, drivers: Vec<Driver>, day_offs: Vec<DayOffRequest>) -> Self {
        Self {
            courses,
            drivers,
            day_offs,
        }
    }

    pub fn course(&self, id: &CourseId) -> Option<&Course> {
        self.courses.iter().find(|c| &c.id == id)
    }

    pub fn driver(&self, id: &DriverId) -> Option<&Driver> {
        self.drivers.iter().find(|d| &d.id == id)
    }

    /// Courses in fill order.
    pub fn ordered_courses(&self) -> Vec<Course> {
        let mut courses = self.courses.clone();
        courses.sort_by(Course::fill_order);
        courses
    }

    /// Day-off requests falling inside `range`.
    pub fn day_offs_in(&self, range: DateRange) -> Vec<DayOffRequest> {
        self.day_offs
            .iter()
            .filter(|r| range.contains(r.date))
            .cloned()
            .collect()
    }

    pub fn require_course(&self, id: &CourseId) -> Result<&Course, ScheduleError> {
        self.course(id)
            .ok_or_else(|| ScheduleError::UnknownCourse(id.clone()))
    }

    pub fn require_driver(&self, id: &DriverId) -> Result<&Driver, ScheduleError> {
        self.driver(id)
            .ok_or_else(|| ScheduleError::UnknownDriver(id.clone()))
    }
}
