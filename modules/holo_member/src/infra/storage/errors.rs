//! Sorting database failures into "the row was refused" and everything else.

use sea_orm::{DbErr, RuntimeErr};
use sqlx::error::{DatabaseError, ErrorKind};

/// True when the database refused the written values: a constraint or a
/// value it cannot store. Connection, pool and I/O failures are not refusals.
pub fn is_rejected_write(err: &DbErr) -> bool {
    match err {
        DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(db)))
        | DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(db))) => {
            is_rejected_write_code(&**db)
        }
        _ => false,
    }
}

fn is_rejected_write_code(db: &dyn DatabaseError) -> bool {
    if !matches!(db.kind(), ErrorKind::Other) {
        return true;
    }
    let Some(code) = db.code() else {
        return false;
    };
    if code.len() == 5 {
        // Postgres SQLSTATE class 22 (data exception) or 23 (integrity)
        code.starts_with("22") || code.starts_with("23")
    } else {
        // SQLite extended codes of the SQLITE_CONSTRAINT family
        code.parse::<u32>().is_ok_and(|c| c & 0xff == 19)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct Refusal {
        code: &'static str,
        check: bool,
    }

    impl fmt::Display for Refusal {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "database error {}", self.code)
        }
    }

    impl StdError for Refusal {}

    impl DatabaseError for Refusal {
        fn message(&self) -> &str {
            "database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.code))
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            if self.check {
                ErrorKind::CheckViolation
            } else {
                ErrorKind::Other
            }
        }
    }

    fn exec_err(code: &'static str, check: bool) -> DbErr {
        DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(Box::new(
            Refusal { code, check },
        ))))
    }

    #[test]
    fn constraint_kinds_are_rejections() {
        assert!(is_rejected_write(&exec_err("23514", true)));
        assert!(is_rejected_write(&exec_err("275", true)));
    }

    #[test]
    fn postgres_data_and_integrity_classes_are_rejections() {
        // numeric_value_out_of_range, string_data_right_truncation, not_null_violation
        for code in ["22003", "22001", "23502"] {
            assert!(is_rejected_write(&exec_err(code, false)), "{code}");
        }
        let query = DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(Box::new(
            Refusal { code: "22003", check: false },
        ))));
        assert!(is_rejected_write(&query));
    }

    #[test]
    fn sqlite_constraint_family_is_a_rejection() {
        // SQLITE_CONSTRAINT_TRIGGER, SQLITE_CONSTRAINT_NOTNULL, plain SQLITE_CONSTRAINT
        for code in ["1811", "1299", "19"] {
            assert!(is_rejected_write(&exec_err(code, false)), "{code}");
        }
    }

    #[test]
    fn server_side_failures_are_not_rejections() {
        // admin_shutdown, serialization_failure, SQLITE_BUSY, SQLITE_ERROR, SQLITE_IOERR_WRITE
        for code in ["57P01", "40001", "5", "1", "778"] {
            assert!(!is_rejected_write(&exec_err(code, false)), "{code}");
        }
    }

    #[test]
    fn transport_failures_are_not_rejections() {
        let io = DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "connection reset by peer",
        ))));
        assert!(!is_rejected_write(&io));

        let pool = DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::PoolTimedOut));
        assert!(!is_rejected_write(&pool));

        assert!(!is_rejected_write(&DbErr::Exec(RuntimeErr::Internal(
            "statement failed".into()
        ))));
        assert!(!is_rejected_write(&DbErr::ConnectionAcquire(
            sea_orm::ConnAcquireErr::Timeout
        )));
    }
}
