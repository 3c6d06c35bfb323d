//! Startup seeding of sample data.
//!
//! # Invariants
//! - Only the School root is saved; students, addresses and phone numbers
//!   are persisted through the cascade.
//! - Seeding is not idempotent: a second run is rejected by the unique
//!   email constraint.

use crate::config::Profile;
use crate::model::address::Address;
use crate::model::school::{Location, School};
use crate::model::student::Student;
use crate::repo::school_repo::SchoolRepository;
use crate::repo::RepoResult;
use chrono::NaiveDate;
use log::{error, info};

// Evaluated at compile time, so an invalid literal fails the build.
const MIRAI_BIRTH_DATE: NaiveDate = match NaiveDate::from_ymd_opt(1981, 9, 21) {
    Some(date) => date,
    None => panic!("invalid birth date for Mirai"),
};
const TOUMA_BIRTH_DATE: NaiveDate = match NaiveDate::from_ymd_opt(1984, 7, 19) {
    Some(date) => date,
    None => panic!("invalid birth date for Touma"),
};

/// Builds the unsaved sample graph: one school in Budapest with two students.
pub fn sample_school() -> School {
    let full_address = Address::new("Hungary")
        .with_city("Budapest")
        .with_street("Nagymezo utca 44.")
        .with_zip_code(1065);
    let partial_address = Address::new("Hungary")
        .with_city("Budapest")
        .with_street("Alkotmany utca 20.");

    let mirai = Student::new("Mirai")
        .with_birth_date(MIRAI_BIRTH_DATE)
        .with_email("mirai@universe.com")
        .with_address(full_address)
        .with_phone_number("555-6666")
        .with_phone_number("555-7777")
        .with_phone_number("555-8888");
    let touma = Student::new("Touma")
        .with_birth_date(TOUMA_BIRTH_DATE)
        .with_email("touma@universe.com")
        .with_address(partial_address)
        .with_phone_numbers(["333-7777", "777-3333"]);

    School::new("Codecool Budapest", Location::Budapest)
        .with_student(mirai)
        .with_student(touma)
}

/// Persists `sample_school()` and returns it with ids assigned.
pub fn seed_sample_school<R: SchoolRepository>(repo: &R) -> RepoResult<School> {
    let mut school = sample_school();
    match repo.save(&mut school) {
        Ok(school_id) => {
            info!(
                "event=seed_run module=seed status=ok school_id={school_id} students={}",
                school.students.len()
            );
            Ok(school)
        }
        Err(err) => {
            error!("event=seed_run module=seed status=error error={err}");
            Err(err)
        }
    }
}

/// Runs the seeder when `profile` enables it.
///
/// Returns `Ok(None)` when seeding is skipped.
pub fn run_startup_seed<R: SchoolRepository>(
    profile: Profile,
    repo: &R,
) -> RepoResult<Option<School>> {
    if !profile.seeds_sample_data() {
        info!(
            "event=seed_run module=seed status=skipped profile={}",
            profile.as_str()
        );
        return Ok(None);
    }
    seed_sample_school(repo).map(Some)
}

#[cfg(test)]
mod tests {
    use super::sample_school;
    use crate::model::school::Location;
    use chrono::NaiveDate;

    #[test]
    fn sample_school_has_one_full_and_one_partial_address() {
        let school = sample_school();
        assert_eq!(school.location, Location::Budapest);
        assert_eq!(school.students.len(), 2);

        let zip_codes = school
            .students
            .iter()
            .map(|student| student.address.as_ref().and_then(|a| a.zip_code))
            .collect::<Vec<_>>();
        assert_eq!(zip_codes, vec![Some(1065), None]);
        assert!(school.students.iter().all(|s| s.id.is_none()));
    }

    #[test]
    fn sample_students_carry_their_exact_birth_dates() {
        let birth_dates = sample_school()
            .students
            .iter()
            .map(|student| student.birth_date)
            .collect::<Vec<_>>();
        assert_eq!(
            birth_dates,
            vec![
                NaiveDate::from_ymd_opt(1981, 9, 21),
                NaiveDate::from_ymd_opt(1984, 7, 19),
            ]
        );
    }
}
