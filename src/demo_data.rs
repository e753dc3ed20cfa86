//! Demo rosters for the scheduling server.

use chrono::{Datelike, NaiveDate, Weekday};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::domain::{Course, DateKey, DateRange, DayOffRequest, Driver, DriverId, Roster};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoData {
    Small,
    Large,
}

impl std::str::FromStr for DemoData {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SMALL" => Ok(DemoData::Small),
            "LARGE" => Ok(DemoData::Large),
            _ => Err(()),
        }
    }
}

impl DemoData {
    pub fn as_str(&self) -> &'static str {
        match self {
            DemoData::Small => "SMALL",
            DemoData::Large => "LARGE",
        }
    }

    fn parameters(&self) -> DemoDataParameters {
        match self {
            DemoData::Small => DemoDataParameters {
                courses: &["North Loop", "Harbor Run", "Old Town", "Airport Express"],
                days_in_schedule: 14,
                driver_count: 8,
                capability_count_distribution: &[(1, 3.0), (2, 2.0), (3, 1.0)],
                day_off_count_distribution: &[(0, 2.0), (1, 4.0), (2, 2.0), (3, 1.0)],
            },
            DemoData::Large => DemoDataParameters {
                courses: &[
                    "North Loop",
                    "Harbor Run",
                    "Old Town",
                    "Airport Express",
                    "Riverside",
                    "Industrial Park",
                    "University",
                    "Hillcrest",
                    "Market Street",
                    "Lakeshore",
                ],
                days_in_schedule: 28,
                driver_count: 24,
                capability_count_distribution: &[(1, 2.0), (2, 3.0), (3, 2.0), (4, 1.0)],
                day_off_count_distribution: &[(1, 2.0), (3, 3.0), (5, 2.0), (8, 1.0)],
            },
        }
    }
}

struct DemoDataParameters {
    courses: &'static [&'static str],
    days_in_schedule: i64,
    driver_count: usize,
    capability_count_distribution: &'static [(usize, f64)],
    day_off_count_distribution: &'static [(usize, f64)],
}

/// List of available demo data sets.
pub fn list_demo_data() -> Vec<&'static str> {
    vec!["SMALL", "LARGE"]
}

/// First day of every demo schedule: the first Monday of June 2025.
pub fn schedule_start() -> DateKey {
    DateKey::new(find_next_monday(
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap_or_default(),
    ))
}

/// The date range the demo's day-off requests cover.
pub fn schedule_range(demo: DemoData) -> DateRange {
    let start = schedule_start();
    let end = start
        .plus_days(demo.parameters().days_in_schedule - 1)
        .unwrap_or(start);
    DateRange::new(start, end).unwrap_or_else(|_| DateRange::single(start))
}

/// Generates a demo roster. The same demo always yields the same roster.
pub fn generate(demo: DemoData) -> Roster {
    let params = demo.parameters();
    let mut rng = StdRng::seed_from_u64(0);

    let courses: Vec<Course> = params
        .courses
        .iter()
        .enumerate()
        .map(|(i, name)| Course::new(format!("c{}", i + 1), *name, (i as i32 + 1) * 10))
        .collect();

    let name_permutations = generate_name_permutations(&mut rng);

    let mut drivers = Vec::with_capacity(params.driver_count);
    for i in 0..params.driver_count {
        let name = &name_permutations[i % name_permutations.len()];
        let capability_count = pick_count(&mut rng, params.capability_count_distribution);
        let capable: Vec<&Course> = courses
            .choose_multiple(&mut rng, capability_count.min(courses.len()))
            .collect();
        drivers.push(
            Driver::new(format!("d{}", i + 1), name.as_str())
                .with_courses(capable.iter().map(|c| c.id.clone())),
        );
    }

    let mut day_offs = Vec::new();
    for date in schedule_range(demo).days() {
        let off_count = pick_count(&mut rng, params.day_off_count_distribution);
        let off: Vec<DriverId> = drivers
            .choose_multiple(&mut rng, off_count.min(drivers.len()))
            .map(|d| d.id.clone())
            .collect();
        for driver_id in off {
            day_offs.push(DayOffRequest::new(driver_id, date));
        }
    }

    Roster::new(courses, drivers, day_offs)
}

fn find_next_monday(date: NaiveDate) -> NaiveDate {
    let days_until_monday = match date.weekday() {
        Weekday::Mon => 0,
        Weekday::Tue => 6,
        Weekday::Wed => 5,
        Weekday::Thu => 4,
        Weekday::Fri => 3,
        Weekday::Sat => 2,
        Weekday::Sun => 1,
    };
    date + chrono::Duration::days(days_until_monday)
}

/// Pick a count based on weighted distribution.
fn pick_count(rng: &mut StdRng, distribution: &[(usize, f64)]) -> usize {
    let total_weight: f64 = distribution.iter().map(|(_, w)| w).sum();
    let mut choice = rng.gen::<f64>() * total_weight;

    for (count, weight) in distribution {
        if choice < *weight {
            return *count;
        }
        choice -= weight;
    }
    distribution.last().map(|(c, _)| *c).unwrap_or(1)
}

const FIRST_NAMES: &[&str] = &[
    "Amy", "Beth", "Carl", "Dan", "Elsa", "Flo", "Gus", "Hugo", "Ivy", "Jay",
];
const LAST_NAMES: &[&str] = &[
    "Cole", "Fox", "Green", "Jones", "King", "Li", "Poe", "Rye", "Smith", "Watt",
];

fn generate_name_permutations(rng: &mut StdRng) -> Vec<String> {
    let mut names = Vec::with_capacity(FIRST_NAMES.len() * LAST_NAMES.len());
    for first in FIRST_NAMES {
        for last in LAST_NAMES {
            names.push(format!("{} {}", first, last));
        }
    }
    names.shuffle(rng);
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_small() {
        let roster = generate(DemoData::Small);

        assert_eq!(roster.courses.len(), 4);
        assert_eq!(roster.drivers.len(), 8);
        assert!(roster
            .day_offs
            .iter()
            .all(|r| schedule_range(DemoData::Small).contains(r.date)));
    }

    #[test]
    fn test_generate_large() {
        let roster = generate(DemoData::Large);

        assert_eq!(roster.courses.len(), 10);
        assert_eq!(roster.drivers.len(), 24);
        assert!(!roster.day_offs.is_empty());
    }

    #[test]
    fn test_drivers_are_capable_of_known_courses() {
        let roster = generate(DemoData::Small);

        for driver in &roster.drivers {
            assert!(
                !driver.capable_course_ids.is_empty(),
                "Driver {} has no courses",
                driver.name
            );
            for course in &driver.capable_course_ids {
                assert!(roster.course(course).is_some());
            }
        }
    }

    #[test]
    fn test_generation_is_reproducible() {
        assert_eq!(generate(DemoData::Small), generate(DemoData::Small));
    }

    #[test]
    fn test_schedule_starts_on_monday() {
        let start = schedule_start();
        assert_eq!(start.date().weekday(), Weekday::Mon);
        assert_eq!(start.to_string(), "2025-06-02");
        assert_eq!(schedule_range(DemoData::Small).len_days(), 14);
    }

    #[test]
    fn test_demo_data_from_str() {
        assert_eq!("SMALL".parse::<DemoData>(), Ok(DemoData::Small));
        assert_eq!("small".parse::<DemoData>(), Ok(DemoData::Small));
        assert_eq!("LARGE".parse::<DemoData>(), Ok(DemoData::Large));
        assert!("invalid".parse::<DemoData>().is_err());
    }
}
