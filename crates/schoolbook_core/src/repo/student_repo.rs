//! Student repository.
//!
//! # Responsibility
//! - Persist students together with their owned address and phone numbers.
//! - Provide the name-prefix/birth-date filter and the country projection.
//!
//! # Invariants
//! - A student's address is written before the student row that points at it.
//! - Phone numbers are rewritten as a whole on every save, keeping list order
//!   in the `position` column.
//! - Loaded students never carry a computed `age`.

use crate::model::address::Address;
use crate::model::student::{Student, StudentId};
use crate::repo::address_repo::write_address;
use crate::repo::{count_rows, ensure_tables, RepoError, RepoResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Params, Row, Transaction, TransactionBehavior};

pub(crate) const STUDENT_SELECT_SQL: &str = "SELECT
    s.id,
    s.name,
    s.birth_date,
    s.email,
    s.school_id,
    a.id AS address_id,
    a.country,
    a.city,
    a.street,
    a.zip_code
FROM students s
LEFT JOIN addresses a ON a.id = s.address_id";

/// Repository interface for students.
pub trait StudentRepository {
    /// Inserts or updates one student with its address and phone numbers.
    fn save(&self, student: &mut Student) -> RepoResult<StudentId>;
    /// Saves all students in one transaction.
    fn save_all(&self, students: &mut [Student]) -> RepoResult<Vec<StudentId>>;
    fn find_all(&self) -> RepoResult<Vec<Student>>;
    fn find_by_id(&self, id: StudentId) -> RepoResult<Option<Student>>;
    fn count(&self) -> RepoResult<usize>;
    /// Deletes one student and, through the schema, its address and phones.
    fn delete_by_id(&self, id: StudentId) -> RepoResult<()>;
    fn delete_all(&self) -> RepoResult<usize>;
    /// Students whose name starts with `prefix` (case-sensitive) OR whose
    /// birth date lies in `[from, to]`.
    fn find_by_name_starting_with_or_birth_date_between(
        &self,
        prefix: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepoResult<Vec<Student>>;
    /// Distinct countries over all student addresses. Addresses without a
    /// country contribute nothing.
    fn find_all_country(&self) -> RepoResult<Vec<String>>;
}

/// SQLite-backed student repository.
pub struct SqliteStudentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStudentRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["students", "addresses", "student_phone_numbers"])?;
        Ok(Self { conn })
    }
}

impl StudentRepository for SqliteStudentRepository<'_> {
    fn save(&self, student: &mut Student) -> RepoResult<StudentId> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut staged = student.clone();
        let id = write_student(&tx, &mut staged)?;
        tx.commit()?;

        *student = staged;
        Ok(id)
    }

    fn save_all(&self, students: &mut [Student]) -> RepoResult<Vec<StudentId>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut staged = students.to_vec();
        let ids = staged
            .iter_mut()
            .map(|student| write_student(&tx, student))
            .collect::<RepoResult<Vec<_>>>()?;
        tx.commit()?;

        students.clone_from_slice(&staged);
        Ok(ids)
    }

    fn find_all(&self) -> RepoResult<Vec<Student>> {
        query_students(
            self.conn,
            &format!("{STUDENT_SELECT_SQL} ORDER BY s.id ASC;"),
            [],
        )
    }

    fn find_by_id(&self, id: StudentId) -> RepoResult<Option<Student>> {
        let students = query_students(
            self.conn,
            &format!("{STUDENT_SELECT_SQL} WHERE s.id = ?1;"),
            [id],
        )?;
        Ok(students.into_iter().next())
    }

    fn count(&self) -> RepoResult<usize> {
        count_rows(self.conn, "students")
    }

    fn delete_by_id(&self, id: StudentId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute("DELETE FROM students WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "student",
                id,
            });
        }
        tx.commit()?;
        Ok(())
    }

    fn delete_all(&self) -> RepoResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let deleted = tx.execute("DELETE FROM students;", [])?;
        tx.commit()?;
        Ok(deleted)
    }

    fn find_by_name_starting_with_or_birth_date_between(
        &self,
        prefix: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepoResult<Vec<Student>> {
        // substr() instead of LIKE: LIKE folds ASCII case and treats `%`/`_`
        // in the prefix as wildcards.
        query_students(
            self.conn,
            &format!(
                "{STUDENT_SELECT_SQL}
                 WHERE substr(s.name, 1, length(?1)) = ?1
                    OR s.birth_date BETWEEN ?2 AND ?3
                 ORDER BY s.id ASC;"
            ),
            params![prefix, from, to],
        )
    }

    fn find_all_country(&self) -> RepoResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT a.country
             FROM students s
             INNER JOIN addresses a ON a.id = s.address_id
             WHERE a.country IS NOT NULL
             ORDER BY a.country ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut countries = Vec::new();
        while let Some(row) = rows.next()? {
            countries.push(row.get(0)?);
        }
        Ok(countries)
    }
}

/// Writes one student graph (address, student row, phone numbers) on an
/// open transaction, assigning generated ids into `student`.
pub(crate) fn write_student(conn: &Connection, student: &mut Student) -> RepoResult<StudentId> {
    let address_id = match student.address.as_mut() {
        Some(address) => Some(write_address(conn, address)?),
        None => None,
    };

    let id = match student.id {
        None => {
            conn.execute(
                "INSERT INTO students (name, birth_date, email, address_id, school_id)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    student.name.as_deref(),
                    student.birth_date,
                    student.email.as_deref(),
                    address_id,
                    student.school_id,
                ],
            )?;
            conn.last_insert_rowid()
        }
        Some(id) => {
            // Replacing or clearing address_id fires the orphan-removal trigger.
            let changed = conn.execute(
                "UPDATE students
                 SET
                    name = ?2,
                    birth_date = ?3,
                    email = ?4,
                    address_id = ?5,
                    school_id = ?6
                 WHERE id = ?1;",
                params![
                    id,
                    student.name.as_deref(),
                    student.birth_date,
                    student.email.as_deref(),
                    address_id,
                    student.school_id,
                ],
            )?;
            if changed == 0 {
                return Err(RepoError::NotFound {
                    entity: "student",
                    id,
                });
            }
            id
        }
    };

    replace_phone_numbers(conn, id, &student.phone_numbers)?;
    student.id = Some(id);
    Ok(id)
}

/// Runs a student SELECT built on `STUDENT_SELECT_SQL` and hydrates phone
/// numbers for every returned row.
pub(crate) fn query_students<P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> RepoResult<Vec<Student>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut students = Vec::new();
    while let Some(row) = rows.next()? {
        students.push(parse_student_row(row)?);
    }

    for student in &mut students {
        if let Some(id) = student.id {
            student.phone_numbers = load_phone_numbers(conn, id)?;
        }
    }
    Ok(students)
}

fn parse_student_row(row: &Row<'_>) -> RepoResult<Student> {
    let address = match row.get::<_, Option<i64>>("address_id")? {
        Some(address_id) => Some(Address {
            id: Some(address_id),
            country: row.get("country")?,
            city: row.get("city")?,
            street: row.get("street")?,
            zip_code: row.get("zip_code")?,
        }),
        None => None,
    };

    let email: Option<String> = row.get("email")?;
    if email.is_none() {
        return Err(RepoError::InvalidData(
            "students.email is NULL in persisted row".to_string(),
        ));
    }

    Ok(Student {
        id: Some(row.get("id")?),
        name: row.get("name")?,
        birth_date: row.get("birth_date")?,
        email,
        age: None,
        address,
        phone_numbers: Vec::new(),
        school_id: row.get("school_id")?,
    })
}

fn load_phone_numbers(conn: &Connection, student_id: StudentId) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT phone_number
         FROM student_phone_numbers
         WHERE student_id = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([student_id])?;
    let mut phone_numbers = Vec::new();
    while let Some(row) = rows.next()? {
        phone_numbers.push(row.get(0)?);
    }
    Ok(phone_numbers)
}

fn replace_phone_numbers(
    conn: &Connection,
    student_id: StudentId,
    phone_numbers: &[String],
) -> RepoResult<()> {
    conn.execute(
        "DELETE FROM student_phone_numbers WHERE student_id = ?1;",
        [student_id],
    )?;
    let mut stmt = conn.prepare(
        "INSERT INTO student_phone_numbers (student_id, position, phone_number)
         VALUES (?1, ?2, ?3);",
    )?;
    for (position, phone_number) in phone_numbers.iter().enumerate() {
        stmt.execute(params![student_id, position as i64, phone_number.as_str()])?;
    }
    Ok(())
}
