//! School repository: the aggregate root of the object graph.
//!
//! # Invariants
//! - Saving a school saves every student in its collection and points their
//!   `school_id` at it.
//! - Students previously attached to the school but absent from the
//!   collection are deleted on save (orphan removal), before new students
//!   are written.
//! - Deleting a school deletes its students via `ON DELETE CASCADE`, which
//!   in turn removes their addresses and phone numbers.

use crate::model::school::{Location, School, SchoolId};
use crate::model::student::StudentId;
use crate::repo::student_repo::{query_students, write_student, STUDENT_SELECT_SQL};
use crate::repo::{count_rows, ensure_tables, RepoError, RepoResult};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::collections::HashSet;

/// Repository interface for schools.
pub trait SchoolRepository {
    /// Inserts or updates one school and cascades to its students.
    fn save(&self, school: &mut School) -> RepoResult<SchoolId>;
    fn save_all(&self, schools: &mut [School]) -> RepoResult<Vec<SchoolId>>;
    /// Loads every school with its students.
    fn find_all(&self) -> RepoResult<Vec<School>>;
    fn find_by_id(&self, id: SchoolId) -> RepoResult<Option<School>>;
    fn count(&self) -> RepoResult<usize>;
    fn delete_by_id(&self, id: SchoolId) -> RepoResult<()>;
    fn delete_all(&self) -> RepoResult<usize>;
}

/// SQLite-backed school repository.
pub struct SqliteSchoolRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSchoolRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(
            conn,
            &["schools", "students", "addresses", "student_phone_numbers"],
        )?;
        Ok(Self { conn })
    }
}

impl SchoolRepository for SqliteSchoolRepository<'_> {
    fn save(&self, school: &mut School) -> RepoResult<SchoolId> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut staged = school.clone();
        let id = write_school(&tx, &mut staged)?;
        tx.commit()?;

        *school = staged;
        Ok(id)
    }

    fn save_all(&self, schools: &mut [School]) -> RepoResult<Vec<SchoolId>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut staged = schools.to_vec();
        let ids = staged
            .iter_mut()
            .map(|school| write_school(&tx, school))
            .collect::<RepoResult<Vec<_>>>()?;
        tx.commit()?;

        schools.clone_from_slice(&staged);
        Ok(ids)
    }

    fn find_all(&self) -> RepoResult<Vec<School>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, location FROM schools ORDER BY id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut schools = Vec::new();
        while let Some(row) = rows.next()? {
            schools.push(parse_school_row(row)?);
        }

        for school in &mut schools {
            load_students(self.conn, school)?;
        }
        Ok(schools)
    }

    fn find_by_id(&self, id: SchoolId) -> RepoResult<Option<School>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, location FROM schools WHERE id = ?1;")?;
        let mut rows = stmt.query([id])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };

        let mut school = parse_school_row(row)?;
        load_students(self.conn, &mut school)?;
        Ok(Some(school))
    }

    fn count(&self) -> RepoResult<usize> {
        count_rows(self.conn, "schools")
    }

    fn delete_by_id(&self, id: SchoolId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute("DELETE FROM schools WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "school",
                id,
            });
        }
        tx.commit()?;
        Ok(())
    }

    fn delete_all(&self) -> RepoResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let deleted = tx.execute("DELETE FROM schools;", [])?;
        tx.commit()?;
        Ok(deleted)
    }
}

fn write_school(conn: &Connection, school: &mut School) -> RepoResult<SchoolId> {
    let id = match school.id {
        None => {
            conn.execute(
                "INSERT INTO schools (name, location) VALUES (?1, ?2);",
                params![school.name.as_deref(), location_to_db(school.location)],
            )?;
            conn.last_insert_rowid()
        }
        Some(id) => {
            let changed = conn.execute(
                "UPDATE schools SET name = ?2, location = ?3 WHERE id = ?1;",
                params![id, school.name.as_deref(), location_to_db(school.location)],
            )?;
            if changed == 0 {
                return Err(RepoError::NotFound {
                    entity: "school",
                    id,
                });
            }
            remove_orphaned_students(conn, id, school)?;
            id
        }
    };

    for student in &mut school.students {
        student.school_id = Some(id);
        write_student(conn, student)?;
    }

    school.id = Some(id);
    Ok(id)
}

fn remove_orphaned_students(
    conn: &Connection,
    school_id: SchoolId,
    school: &School,
) -> RepoResult<()> {
    let kept = school
        .students
        .iter()
        .filter_map(|student| student.id)
        .collect::<HashSet<StudentId>>();

    let mut stmt = conn.prepare("SELECT id FROM students WHERE school_id = ?1;")?;
    let attached = stmt
        .query_map([school_id], |row| row.get::<_, StudentId>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    for student_id in attached.into_iter().filter(|id| !kept.contains(id)) {
        conn.execute("DELETE FROM students WHERE id = ?1;", [student_id])?;
    }
    Ok(())
}

fn load_students(conn: &Connection, school: &mut School) -> RepoResult<()> {
    school.students = query_students(
        conn,
        &format!("{STUDENT_SELECT_SQL} WHERE s.school_id = ?1 ORDER BY s.id ASC;"),
        [school.id],
    )?;
    Ok(())
}

fn parse_school_row(row: &Row<'_>) -> RepoResult<School> {
    let location_text: String = row.get("location")?;
    let location = parse_location(&location_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid location `{location_text}` in schools.location"
        ))
    })?;

    Ok(School {
        id: Some(row.get("id")?),
        name: row.get("name")?,
        location,
        students: Vec::new(),
    })
}

fn location_to_db(location: Location) -> &'static str {
    match location {
        Location::Budapest => "BUDAPEST",
        Location::Miskolc => "MISKOLC",
        Location::Krakow => "KRAKOW",
        Location::Warsaw => "WARSAW",
    }
}

fn parse_location(value: &str) -> Option<Location> {
    match value {
        "BUDAPEST" => Some(Location::Budapest),
        "MISKOLC" => Some(Location::Miskolc),
        "KRAKOW" => Some(Location::Krakow),
        "WARSAW" => Some(Location::Warsaw),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{location_to_db, parse_location};
    use crate::model::school::Location;

    #[test]
    fn location_db_names_round_trip() {
        for location in [
            Location::Budapest,
            Location::Miskolc,
            Location::Krakow,
            Location::Warsaw,
        ] {
            assert_eq!(parse_location(location_to_db(location)), Some(location));
        }
        assert_eq!(parse_location("budapest"), None);
    }
}
