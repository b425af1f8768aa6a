use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgConnection, PgPool, Row};
use uuid::Uuid;

use crate::award;
use crate::error::EngineError;
use crate::feedback;
use crate::models::{
    Behavior, Certificate, CompletionAward, Feedback, IssuedCertificate, LeaderboardEntry,
    Session, SessionStatus, UserStanding,
};
use crate::session;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let noor = Uuid::parse_str("51c0e8a2-7d3b-4f19-a6e4-0b9d2c7f8e31")?;
    let tomas = Uuid::parse_str("a47b2e90-3c1d-4e85-9f26-d8e1b5a0c472")?;
    let wren = Uuid::parse_str("e2f96d14-8a5c-4b07-b3d1-6c4a9e2f0b58")?;
    let users = vec![
        (noor, "Noor Haddad", "noor.haddad@peerlearning.dev"),
        (tomas, "Tomás Okafor", "tomas.okafor@peerlearning.dev"),
        (wren, "Wren Castellano", "wren.castellano@peerlearning.dev"),
    ];

    for (id, name, email) in users {
        sqlx::query(
            r#"
            INSERT INTO peer_learning.users (id, full_name, email)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO UPDATE SET full_name = EXCLUDED.full_name
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .execute(pool)
        .await?;
    }

    let calculus = Uuid::parse_str("6a1f4d1e-8c0b-4d5e-9a57-2f3b8c9d0e11")?;
    let essays = Uuid::parse_str("9b2e5c3a-1d4f-4a6b-8c7d-0e1f2a3b4c55")?;
    let sessions = vec![
        (
            calculus,
            "Limits without tears",
            Some(4),
            noor,
            NaiveDate::from_ymd_opt(2026, 2, 2).context("invalid date")?,
            vec![tomas, wren],
        ),
        (
            essays,
            "Structuring a persuasive essay",
            None,
            wren,
            NaiveDate::from_ymd_opt(2026, 2, 9).context("invalid date")?,
            vec![tomas],
        ),
    ];

    for (id, title, max_seats, creator_id, scheduled_for, attendees) in sessions {
        sqlx::query(
            r#"
            INSERT INTO peer_learning.sessions (id, title, max_seats, creator_id, scheduled_for)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(max_seats)
        .bind(creator_id)
        .bind(scheduled_for)
        .execute(pool)
        .await?;

        for (position, user_id) in attendees.into_iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO peer_learning.session_attendees (session_id, user_id, position)
                VALUES ($1, $2, $3)
                ON CONFLICT (session_id, user_id) DO NOTHING
                "#,
            )
            .bind(id)
            .bind(user_id)
            .bind(position as i32)
            .execute(pool)
            .await?;
        }
    }

    let feedback = vec![
        ("seed-001", calculus, tomas, 5, Behavior::Good, "Epsilon-delta finally clicked", None),
        (
            "seed-002",
            calculus,
            wren,
            4,
            Behavior::Good,
            "Squeeze theorem intuition",
            Some("More worked examples please"),
        ),
        ("seed-003", essays, tomas, 3, Behavior::Neutral, "Topic sentences", None),
    ];

    for (source_key, session_id, student_id, rating, behavior, learned, comment) in feedback {
        sqlx::query(
            r#"
            INSERT INTO peer_learning.feedback
            (id, session_id, student_id, rating, behavior, learned, comment, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(session_id)
        .bind(student_id)
        .bind(rating)
        .bind(behavior.as_str())
        .bind(learned)
        .bind(comment)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    Ok(())
}

async fn load_session(
    conn: &mut PgConnection,
    session_id: Uuid,
    for_update: bool,
) -> anyhow::Result<Session> {
    let mut query = String::from(
        "SELECT id, title, status, max_seats, creator_id, scheduled_for \
         FROM peer_learning.sessions WHERE id = $1",
    );
    if for_update {
        query.push_str(" FOR UPDATE");
    }

    let row = sqlx::query(&query)
        .bind(session_id)
        .fetch_optional(&mut *conn)
        .await?
        .with_context(|| format!("session {session_id} not found"))?;

    let status: String = row.get("status");
    let max_seats: Option<i32> = row.get("max_seats");

    let attendees: Vec<Uuid> = sqlx::query(
        "SELECT user_id FROM peer_learning.session_attendees \
         WHERE session_id = $1 ORDER BY position",
    )
    .bind(session_id)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(|row| row.get("user_id"))
    .collect();

    Ok(Session {
        id: row.get("id"),
        title: row.get("title"),
        status: status.parse()?,
        attendees,
        max_seats: max_seats.map(|seats| seats.max(0) as usize),
        creator_id: row.get("creator_id"),
        scheduled_for: row.get("scheduled_for"),
    })
}

async fn load_feedback(conn: &mut PgConnection, session_id: Uuid) -> anyhow::Result<Vec<Feedback>> {
    let rows = sqlx::query(
        "SELECT id, session_id, student_id, rating, behavior, learned, comment \
         FROM peer_learning.feedback WHERE session_id = $1 ORDER BY submitted_at",
    )
    .bind(session_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut entries = Vec::with_capacity(rows.len());
    for row in rows {
        let behavior: String = row.get("behavior");
        entries.push(Feedback {
            id: row.get("id"),
            session_id: row.get("session_id"),
            student_id: row.get("student_id"),
            rating: row.get("rating"),
            behavior: behavior.parse()?,
            learned: row.get("learned"),
            comment: row.get("comment"),
        });
    }

    Ok(entries)
}

async fn load_standing(conn: &mut PgConnection, user_id: Uuid) -> anyhow::Result<UserStanding> {
    let total_points: i64 =
        sqlx::query("SELECT total_points FROM peer_learning.users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?
            .with_context(|| format!("user {user_id} not found"))?
            .get("total_points");

    let badges: Vec<String> = sqlx::query("SELECT name FROM peer_learning.badges WHERE user_id = $1")
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(|row| row.get("name"))
        .collect();

    Ok(UserStanding {
        user_id,
        total_points,
        badges,
    })
}

/// Session plus its feedback, read on one connection.
pub async fn fetch_snapshot(
    pool: &PgPool,
    session_id: Uuid,
) -> anyhow::Result<(Session, Vec<Feedback>)> {
    let mut conn = pool.acquire().await?;
    let session = load_session(&mut conn, session_id, false).await?;
    let feedback = load_feedback(&mut conn, session_id).await?;
    Ok((session, feedback))
}

pub async fn join_session(pool: &PgPool, session_id: Uuid, user_id: Uuid) -> anyhow::Result<Session> {
    let mut tx = pool.begin().await?;
    let mut joined = load_session(&mut tx, session_id, true).await?;
    session::add_attendee(&mut joined, user_id)?;

    sqlx::query(
        r#"
        INSERT INTO peer_learning.session_attendees (session_id, user_id, position)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(session_id)
    .bind(user_id)
    .bind((joined.attendees.len() - 1) as i32)
    .execute(&mut *tx)
    .await
    .context("failed to record attendee")?;

    tx.commit().await?;
    tracing::info!(%session_id, %user_id, attendees = joined.attendees.len(), "attendee joined");
    Ok(joined)
}

async fn insert_feedback(
    conn: &mut PgConnection,
    entry: &Feedback,
    source_key: &str,
) -> anyhow::Result<bool> {
    feedback::validate(entry)?;

    let result = sqlx::query(
        r#"
        INSERT INTO peer_learning.feedback
        (id, session_id, student_id, rating, behavior, learned, comment, source_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(entry.id)
    .bind(entry.session_id)
    .bind(entry.student_id)
    .bind(entry.rating)
    .bind(entry.behavior.as_str())
    .bind(entry.learned.trim())
    .bind(entry.comment.as_deref())
    .bind(source_key)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn submit_feedback(pool: &PgPool, entry: &Feedback) -> anyhow::Result<()> {
    let mut conn = pool.acquire().await?;
    insert_feedback(&mut conn, entry, &format!("cli-{}", entry.id)).await?;
    tracing::info!(
        session_id = %entry.session_id,
        user_id = %entry.student_id,
        rating = entry.rating,
        "feedback recorded"
    );
    Ok(())
}

pub async fn import_feedback_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        session_id: Uuid,
        student_email: String,
        rating: i32,
        behavior: String,
        learned: String,
        comment: Option<String>,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut tx = pool.begin().await?;
    let mut inserted = 0usize;

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let line = index + 2;
        let row = result.with_context(|| format!("malformed CSV row on line {line}"))?;
        let student_id: Uuid = sqlx::query("SELECT id FROM peer_learning.users WHERE email = $1")
            .bind(&row.student_email)
            .fetch_optional(&mut *tx)
            .await?
            .with_context(|| format!("unknown student {} on line {line}", row.student_email))?
            .get("id");

        let entry = Feedback {
            id: Uuid::new_v4(),
            session_id: row.session_id,
            student_id,
            rating: row.rating,
            behavior: row
                .behavior
                .parse()
                .with_context(|| format!("invalid behavior on line {line}"))?,
            learned: row.learned,
            comment: row.comment.filter(|comment| !comment.trim().is_empty()),
        };
        let source_key = row
            .source_key
            .unwrap_or_else(|| import_source_key(&row.student_email, &entry));

        if insert_feedback(&mut tx, &entry, &source_key)
            .await
            .with_context(|| format!("rejected feedback on line {line}"))?
        {
            inserted += 1;
        }
    }

    tx.commit().await?;
    tracing::info!(path = %csv_path.display(), inserted, "feedback import committed");
    Ok(inserted)
}

/// Key for CSV rows without a `source_key`, derived from the row content so a
/// re-run of the same file skips rows it already stored.
fn import_source_key(student_email: &str, entry: &Feedback) -> String {
    let content = format!(
        "{}\u{1f}{}\u{1f}{}\u{1f}{}\u{1f}{}\u{1f}{}",
        entry.session_id,
        student_email.trim().to_ascii_lowercase(),
        entry.rating,
        entry.behavior.as_str(),
        entry.learned.trim(),
        entry.comment.as_deref().unwrap_or("").trim(),
    );
    format!(
        "import-{}",
        Uuid::new_v5(&Uuid::NAMESPACE_OID, content.as_bytes())
    )
}

/// Completes a session and persists the award in one transaction.
///
/// The status update is a check-and-set on `status <> 'completed'`, so a
/// repeated call fails instead of adding points twice.
pub async fn complete_session(pool: &PgPool, session_id: Uuid) -> anyhow::Result<CompletionAward> {
    let mut tx = pool.begin().await?;
    let stored = load_session(&mut tx, session_id, true).await?;
    let entries = load_feedback(&mut tx, session_id).await?;
    let standing = load_standing(&mut tx, stored.creator_id).await?;
    let (_, award) = award::plan_completion(&stored, &entries, &standing)?;

    let updated = sqlx::query(
        r#"
        UPDATE peer_learning.sessions
        SET status = 'completed', completed_at = now()
        WHERE id = $1 AND status <> 'completed'
        "#,
    )
    .bind(session_id)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(EngineError::InvalidStateTransition {
            session_id,
            from: SessionStatus::Completed,
            to: SessionStatus::Completed,
        }
        .into());
    }

    sqlx::query("UPDATE peer_learning.users SET total_points = total_points + $2 WHERE id = $1")
        .bind(award.recipient_id)
        .bind(award.points.total)
        .execute(&mut *tx)
        .await?;

    for badge in &award.badges {
        sqlx::query(
            r#"
            INSERT INTO peer_learning.badges (user_id, name, threshold_points)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, name) DO NOTHING
            "#,
        )
        .bind(award.recipient_id)
        .bind(badge.name)
        .bind(badge.threshold_points)
        .execute(&mut *tx)
        .await?;
    }

    if let Some(certificate) = &award.certificate {
        sqlx::query(
            r#"
            INSERT INTO peer_learning.certificates
            (id, certificate_type, user_id, session_id, average_rating)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (session_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(certificate.certificate_type.as_str())
        .bind(certificate.user_id)
        .bind(certificate.session_id)
        .bind(certificate.average_rating)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    tracing::info!(
        %session_id,
        user_id = %award.recipient_id,
        points = award.points.total,
        badges = award.badges.len(),
        "session completed"
    );
    Ok(award)
}

pub async fn fetch_certificate(
    pool: &PgPool,
    session_id: Uuid,
) -> anyhow::Result<Option<IssuedCertificate>> {
    let row = sqlx::query(
        "SELECT certificate_type, user_id, session_id, average_rating, issued_at \
         FROM peer_learning.certificates WHERE session_id = $1",
    )
    .bind(session_id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };
    let certificate_type: String = row.get("certificate_type");
    let issued_at: DateTime<Utc> = row.get("issued_at");

    Ok(Some(IssuedCertificate {
        certificate: Certificate {
            certificate_type: certificate_type.parse()?,
            user_id: row.get("user_id"),
            session_id: row.get("session_id"),
            average_rating: row.get("average_rating"),
        },
        issued_at,
    }))
}

pub async fn fetch_leaderboard(pool: &PgPool, limit: i64) -> anyhow::Result<Vec<LeaderboardEntry>> {
    let rows = sqlx::query(
        r#"
        SELECT u.full_name, u.email, u.total_points, COUNT(b.name) AS badge_count
        FROM peer_learning.users u
        LEFT JOIN peer_learning.badges b ON b.user_id = u.id
        GROUP BY u.id, u.full_name, u.email, u.total_points
        ORDER BY u.total_points DESC, u.full_name
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| LeaderboardEntry {
            full_name: row.get("full_name"),
            email: row.get("email"),
            total_points: row.get("total_points"),
            badge_count: row.get("badge_count"),
        })
        .collect())
}
