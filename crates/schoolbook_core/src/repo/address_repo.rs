//! Address repository.
//!
//! # Invariants
//! - Addresses saved here directly are unowned until a student points at them.
//! - `update_all_to_uk_by_student_name` is one set-based UPDATE; nothing is
//!   cached in memory, so later reads see the new values.

use crate::model::address::{Address, AddressId};
use crate::repo::{count_rows, ensure_tables, RepoError, RepoResult};
use log::debug;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

const ADDRESS_SELECT_SQL: &str = "SELECT
    id,
    country,
    city,
    street,
    zip_code
FROM addresses";

/// Repository interface for addresses.
pub trait AddressRepository {
    fn save(&self, address: &mut Address) -> RepoResult<AddressId>;
    fn save_all(&self, addresses: &mut [Address]) -> RepoResult<Vec<AddressId>>;
    fn find_all(&self) -> RepoResult<Vec<Address>>;
    fn find_by_id(&self, id: AddressId) -> RepoResult<Option<Address>>;
    fn count(&self) -> RepoResult<usize>;
    /// Deletes one address; an owning student is detached, not deleted.
    fn delete_by_id(&self, id: AddressId) -> RepoResult<()>;
    fn delete_all(&self) -> RepoResult<usize>;
    /// Sets `country = 'UK'` on every address owned by a student whose name
    /// matches the `LIKE`-style pattern `name` (`%` and `_` are wildcards).
    /// Matching is case-sensitive. Returns the number of rows changed.
    fn update_all_to_uk_by_student_name(&self, name: &str) -> RepoResult<usize>;
}

/// SQLite-backed address repository.
pub struct SqliteAddressRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAddressRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["addresses", "students"])?;
        Ok(Self { conn })
    }
}

impl AddressRepository for SqliteAddressRepository<'_> {
    fn save(&self, address: &mut Address) -> RepoResult<AddressId> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut staged = address.clone();
        let id = write_address(&tx, &mut staged)?;
        tx.commit()?;

        *address = staged;
        Ok(id)
    }

    fn save_all(&self, addresses: &mut [Address]) -> RepoResult<Vec<AddressId>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut staged = addresses.to_vec();
        let ids = staged
            .iter_mut()
            .map(|address| write_address(&tx, address))
            .collect::<RepoResult<Vec<_>>>()?;
        tx.commit()?;

        addresses.clone_from_slice(&staged);
        Ok(ids)
    }

    fn find_all(&self) -> RepoResult<Vec<Address>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ADDRESS_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut addresses = Vec::new();
        while let Some(row) = rows.next()? {
            addresses.push(parse_address_row(row)?);
        }
        Ok(addresses)
    }

    fn find_by_id(&self, id: AddressId) -> RepoResult<Option<Address>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ADDRESS_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_address_row(row)?));
        }
        Ok(None)
    }

    fn count(&self) -> RepoResult<usize> {
        count_rows(self.conn, "addresses")
    }

    fn delete_by_id(&self, id: AddressId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute("DELETE FROM addresses WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "address",
                id,
            });
        }
        tx.commit()?;
        Ok(())
    }

    fn delete_all(&self) -> RepoResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let deleted = tx.execute("DELETE FROM addresses;", [])?;
        tx.commit()?;
        Ok(deleted)
    }

    fn update_all_to_uk_by_student_name(&self, name: &str) -> RepoResult<usize> {
        // GLOB instead of LIKE: SQLite's LIKE folds ASCII case.
        let pattern = like_pattern_to_glob(name);
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let updated = tx.execute(
            "UPDATE addresses
             SET country = 'UK'
             WHERE id IN (
                SELECT s.address_id
                FROM students s
                WHERE s.name GLOB ?1
                  AND s.address_id IS NOT NULL
             );",
            [pattern.as_str()],
        )?;
        tx.commit()?;

        debug!("event=bulk_update module=repo status=ok table=addresses rows={updated}");
        Ok(updated)
    }
}

/// Inserts a new address or updates an existing one, writing the generated
/// id back into `address`.
pub(crate) fn write_address(conn: &Connection, address: &mut Address) -> RepoResult<AddressId> {
    match address.id {
        None => {
            conn.execute(
                "INSERT INTO addresses (country, city, street, zip_code)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    address.country.as_deref(),
                    address.city.as_deref(),
                    address.street.as_deref(),
                    address.zip_code,
                ],
            )?;
            let id = conn.last_insert_rowid();
            address.id = Some(id);
            Ok(id)
        }
        Some(id) => {
            let changed = conn.execute(
                "UPDATE addresses
                 SET
                    country = ?2,
                    city = ?3,
                    street = ?4,
                    zip_code = ?5
                 WHERE id = ?1;",
                params![
                    id,
                    address.country.as_deref(),
                    address.city.as_deref(),
                    address.street.as_deref(),
                    address.zip_code,
                ],
            )?;
            if changed == 0 {
                return Err(RepoError::NotFound {
                    entity: "address",
                    id,
                });
            }
            Ok(id)
        }
    }
}

fn parse_address_row(row: &Row<'_>) -> RepoResult<Address> {
    Ok(Address {
        id: Some(row.get("id")?),
        country: row.get("country")?,
        city: row.get("city")?,
        street: row.get("street")?,
        zip_code: row.get("zip_code")?,
    })
}

/// Rewrites a `LIKE` pattern as the equivalent `GLOB` pattern. GLOB
/// metacharacters in the input are bracketed so they match literally.
fn like_pattern_to_glob(pattern: &str) -> String {
    let mut glob = String::with_capacity(pattern.len());
    for ch in pattern.chars() {
        match ch {
            '%' => glob.push('*'),
            '_' => glob.push('?'),
            '*' => glob.push_str("[*]"),
            '?' => glob.push_str("[?]"),
            '[' => glob.push_str("[[]"),
            other => glob.push(other),
        }
    }
    glob
}
