//! Student entity.
//!
//! # Invariants
//! - `email` must be present and unique once persisted. It is optional in
//!   memory so that the storage constraint, not the type system, is what
//!   rejects a missing value.
//! - `age` is derived from `birth_date` and never persisted; every loaded
//!   student starts with `age == None`.
//! - `phone_numbers` keeps insertion order across save/load.

use crate::model::address::Address;
use crate::model::school::SchoolId;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Surrogate key of a `students` row.
pub type StudentId = i64;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: Option<StudentId>,
    pub name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub email: Option<String>,
    /// Transient: filled by `calculate_age`, never stored.
    #[serde(skip)]
    pub age: Option<u32>,
    /// Owned address, saved and deleted together with the student.
    pub address: Option<Address>,
    pub phone_numbers: Vec<String>,
    /// Back-reference to the owning school.
    pub school_id: Option<SchoolId>,
}

impl Student {
    /// Creates an unsaved student with only a name set.
    ///
    /// The name is optional in storage; use `Student::default()` for a
    /// student without one.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_birth_date(mut self, birth_date: NaiveDate) -> Self {
        self.birth_date = Some(birth_date);
        self
    }

    pub fn with_address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    /// Appends one phone number, keeping earlier ones.
    pub fn with_phone_number(mut self, phone_number: impl Into<String>) -> Self {
        self.phone_numbers.push(phone_number.into());
        self
    }

    /// Replaces the whole phone number list.
    pub fn with_phone_numbers<I, S>(mut self, phone_numbers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.phone_numbers = phone_numbers.into_iter().map(Into::into).collect();
        self
    }

    /// Computes full years between `birth_date` and `today` and caches the
    /// result in `age`.
    ///
    /// Returns `None` (and clears `age`) when the birth date is unknown or
    /// lies after `today`.
    pub fn calculate_age(&mut self, today: NaiveDate) -> Option<u32> {
        self.age = self
            .birth_date
            .and_then(|birth_date| today.years_since(birth_date));
        self.age
    }

    /// `calculate_age` against the local calendar date.
    pub fn calculate_age_now(&mut self) -> Option<u32> {
        self.calculate_age(Local::now().date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::Student;
    use chrono::NaiveDate;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn age_counts_only_completed_years() {
        let mut student = Student::new("Alpaca").with_birth_date(date(1965, 8, 23));

        assert_eq!(student.calculate_age(date(2018, 8, 22)), Some(52));
        assert_eq!(student.calculate_age(date(2018, 8, 23)), Some(53));
        assert_eq!(student.age, Some(53));
    }

    #[test]
    fn age_is_unset_without_birth_date_or_for_future_birth_date() {
        let mut unknown = Student::new("Guanaco");
        assert_eq!(unknown.calculate_age(date(2020, 1, 1)), None);

        let mut unborn = Student::new("Llama").with_birth_date(date(2030, 1, 1));
        unborn.age = Some(7);
        assert_eq!(unborn.calculate_age(date(2020, 1, 1)), None);
        assert_eq!(unborn.age, None);
    }

    #[test]
    fn age_is_skipped_by_serde() {
        let mut student = Student::new("Vicugna")
            .with_email("vicugna@universe.com")
            .with_birth_date(date(1990, 1, 1));
        student.calculate_age(date(2020, 6, 1));

        let json = serde_json::to_value(&student).unwrap();
        assert!(json.get("age").is_none());

        let back: Student = serde_json::from_value(json).unwrap();
        assert_eq!(back.age, None);
        assert_eq!(back.email.as_deref(), Some("vicugna@universe.com"));
    }

    #[test]
    fn default_student_has_no_name() {
        let student = Student::default().with_email("anonymous@universe.com");
        assert_eq!(student.name, None);
        assert_eq!(student.id, None);
        assert!(student.phone_numbers.is_empty());
    }

    #[test]
    fn phone_number_helpers_keep_order() {
        let student = Student::new("Mirai")
            .with_phone_number("555-6666")
            .with_phone_number("555-7777");
        assert_eq!(student.phone_numbers, vec!["555-6666", "555-7777"]);

        let replaced = student.with_phone_numbers(["333-7777", "777-3333"]);
        assert_eq!(replaced.phone_numbers, vec!["333-7777", "777-3333"]);
    }
}
