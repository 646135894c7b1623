use sqlx::PgConnection;

/// Table holding the demo users.
pub const USERS_TABLE: &str = "demo_users";

/// Rows inserted into an empty users table, in order.
pub const SAMPLE_USERS: [(&str, &str); 3] = [
    ("Juan Pérez", "juan.perez@example.com"),
    ("María García", "maria.garcia@example.com"),
    ("Carlos López", "carlos.lopez@example.com"),
];

/// Create the users table if it does not exist.
///
/// # Errors
///
/// Returns a [`sqlx::Error`] if the DDL statement fails.
pub async fn ensure_users_table(conn: &mut PgConnection) -> Result<(), sqlx::Error> {
    let create = format!(
        "CREATE TABLE IF NOT EXISTS {USERS_TABLE} (
            id SERIAL PRIMARY KEY,
            name VARCHAR(100) NOT NULL,
            email VARCHAR(100) UNIQUE NOT NULL,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )"
    );
    sqlx::query(&create).execute(conn).await?;
    Ok(())
}

/// Insert [`SAMPLE_USERS`] when the table is empty. Returns the number of
/// rows inserted.
///
/// # Errors
///
/// Returns a [`sqlx::Error`] if the count or any insert fails.
pub async fn seed_if_empty(conn: &mut PgConnection) -> Result<usize, sqlx::Error> {
    let count_query = format!("SELECT COUNT(*) FROM {USERS_TABLE}");
    let (count,): (i64,) = sqlx::query_as(&count_query).fetch_one(&mut *conn).await?;
    if count > 0 {
        return Ok(0);
    }

    let insert = format!("INSERT INTO {USERS_TABLE} (name, email) VALUES ($1, $2)");
    for (name, email) in SAMPLE_USERS {
        sqlx::query(&insert)
            .bind(name)
            .bind(email)
            .execute(&mut *conn)
            .await?;
    }
    Ok(SAMPLE_USERS.len())
}
