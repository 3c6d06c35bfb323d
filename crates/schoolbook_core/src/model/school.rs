//! School aggregate root.
//!
//! # Invariants
//! - A school owns its students: saving the school saves them, and a student
//!   removed from `students` is deleted on the next save.
//! - `Student::school_id` of every owned student matches `School::id` after a
//!   successful save.

use crate::model::student::{Student, StudentId};
use serde::{Deserialize, Serialize};

/// Surrogate key of a `schools` row.
pub type SchoolId = i64;

/// Cities a school can be located in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Location {
    Budapest,
    Miskolc,
    Krakow,
    Warsaw,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct School {
    pub id: Option<SchoolId>,
    pub name: Option<String>,
    pub location: Location,
    pub students: Vec<Student>,
}

impl School {
    pub fn new(name: impl Into<String>, location: Location) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::located_in(location)
        }
    }

    /// Creates an unsaved school without a name.
    pub fn located_in(location: Location) -> Self {
        Self {
            id: None,
            name: None,
            location,
            students: Vec::new(),
        }
    }

    pub fn with_student(mut self, student: Student) -> Self {
        self.add_student(student);
        self
    }

    /// Attaches a student and points its back-reference at this school.
    ///
    /// For an unsaved school the back-reference stays `None` until the school
    /// is persisted.
    pub fn add_student(&mut self, mut student: Student) {
        student.school_id = self.id;
        self.students.push(student);
    }

    /// Detaches a persisted student from the collection.
    ///
    /// The student row is deleted when the school is saved next.
    pub fn remove_student(&mut self, student_id: StudentId) -> Option<Student> {
        let index = self
            .students
            .iter()
            .position(|student| student.id == Some(student_id))?;
        Some(self.students.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::{Location, School};
    use crate::model::student::Student;

    #[test]
    fn add_student_sets_back_reference_for_saved_school() {
        let mut school = School::new("Codecool Budapest", Location::Budapest);
        school.id = Some(4);

        school.add_student(Student::new("Mirai").with_email("mirai@universe.com"));

        assert_eq!(school.students[0].school_id, Some(4));
    }

    #[test]
    fn remove_student_only_matches_persisted_ids() {
        let mut first = Student::new("Mirai");
        first.id = Some(1);
        let mut school = School::new("Codecool Budapest", Location::Budapest)
            .with_student(first)
            .with_student(Student::new("Touma"));

        assert!(school.remove_student(2).is_none());
        let removed = school.remove_student(1).unwrap();
        assert_eq!(removed.name.as_deref(), Some("Mirai"));
        assert_eq!(school.students.len(), 1);
    }

    #[test]
    fn location_serializes_as_upper_case_name() {
        let json = serde_json::to_string(&Location::Budapest).unwrap();
        assert_eq!(json, "\"BUDAPEST\"");
    }
}
