//! Book database operations

use shared::models::{Book, BookUpsert};
use sqlx::{PgConnection, PgPool};

pub async fn get_for_admin(pool: &PgPool, book_id: i64) -> Result<Option<Book>, sqlx::Error> {
    sqlx::query_as::<_, Book>(
        r#"
        SELECT id, title, author, price, stock, sale, status, created_at, updated_at
        FROM books
        WHERE id = $1
        "#,
    )
    .bind(book_id)
    .fetch_optional(pool)
    .await
}

/// Predicated decrement: no prior read, the `stock >= $2` guard is the lock.
/// Returns whether a row was updated.
pub async fn decrease_stock_and_record_sale(
    conn: &mut PgConnection,
    book_id: i64,
    quantity: i32,
    now: i64,
) -> Result<bool, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        UPDATE books
        SET stock = stock - $2, sale = sale + $2, updated_at = $3
        WHERE id = $1 AND stock >= $2
        "#,
    )
    .bind(book_id)
    .bind(quantity)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(rows.rows_affected() == 1)
}

pub async fn upsert(pool: &PgPool, book: &BookUpsert, now: i64) -> Result<Book, sqlx::Error> {
    let row = sqlx::query_as::<_, Book>(
        r#"
        INSERT INTO books (id, title, author, price, stock, sale, status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
        ON CONFLICT (id)
        DO UPDATE SET
            title = EXCLUDED.title, author = EXCLUDED.author, price = EXCLUDED.price,
            stock = EXCLUDED.stock, sale = EXCLUDED.sale, status = EXCLUDED.status,
            updated_at = EXCLUDED.updated_at
        RETURNING id, title, author, price, stock, sale, status, created_at, updated_at
        "#,
    )
    .bind(book.id)
    .bind(&book.title)
    .bind(&book.author)
    .bind(book.price)
    .bind(book.stock)
    .bind(book.sale)
    .bind(book.status)
    .bind(now)
    .fetch_one(pool)
    .await?;

    // Keep BIGSERIAL ahead of explicitly chosen ids
    sqlx::query("SELECT setval(pg_get_serial_sequence('books', 'id'), GREATEST((SELECT MAX(id) FROM books), 1))")
        .execute(pool)
        .await?;

    Ok(row)
}
