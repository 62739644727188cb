//! SQLite-Implementierung von SpielerRepository und SpielerVerwaltung

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pinguin_core::Pid;
use sqlx::Row;

use crate::error::DbError;
use crate::models::{BanRecord, NeuerBan, SpielerRecord};
use crate::repository::{DbResult, SpielerRepository, SpielerVerwaltung};
use crate::sqlite::pool::SqliteDb;

const SPIELER_SPALTEN: &str = "id, username, password_hash, email, aktiv, registriert_am, \
     permaban, hausarrest, approval, rejection, coins, safe_chat, moderator, \
     stealth_moderator, charakter, agent_status, minuten_gespielt, \
     playercard_geoeffnet, map_kategorie, status_feld, buch_geaendert";

#[async_trait]
impl SpielerRepository for SqliteDb {
    async fn nach_name(&self, username: &str) -> DbResult<Option<SpielerRecord>> {
        let sql = format!("SELECT {SPIELER_SPALTEN} FROM spieler WHERE username = ?");
        let row = sqlx::query(&sql)
            .bind(username.to_lowercase())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_spieler(&r)).transpose()
    }

    async fn nach_id(&self, id: Pid) -> DbResult<Option<SpielerRecord>> {
        let sql = format!("SELECT {SPIELER_SPALTEN} FROM spieler WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id.inner() as i64)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_spieler(&r)).transpose()
    }

    async fn buddies(&self, id: Pid) -> DbResult<Vec<Pid>> {
        let rows = sqlx::query("SELECT buddy_id FROM buddies WHERE spieler_id = ? ORDER BY buddy_id")
            .bind(id.inner() as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|r| {
                let buddy: i64 = r.try_get("buddy_id")?;
                pid_aus_i64(buddy)
            })
            .collect()
    }

    async fn aktiver_ban(&self, id: Pid, jetzt: DateTime<Utc>) -> DbResult<Option<BanRecord>> {
        let rows = sqlx::query(
            "SELECT id, spieler_id, grund, laeuft_ab, erstellt_am FROM bans WHERE spieler_id = ?",
        )
        .bind(id.inner() as i64)
        .fetch_all(&self.pool)
        .await?;

        // Zeitvergleich in Rust, RFC3339-Texte sind nicht sicher lexikografisch sortierbar
        let mut aktiv: Option<BanRecord> = None;
        for row in &rows {
            let ban = row_to_ban(row)?;
            if ban.laeuft_ab <= jetzt {
                continue;
            }
            if aktiv.as_ref().map_or(true, |a| ban.laeuft_ab > a.laeuft_ab) {
                aktiv = Some(ban);
            }
        }
        Ok(aktiv)
    }
}

#[async_trait]
impl SpielerVerwaltung for SqliteDb {
    async fn anlegen(&self, s: &SpielerRecord) -> DbResult<()> {
        let sql = format!(
            "INSERT INTO spieler ({SPIELER_SPALTEN}) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        );
        sqlx::query(&sql)
            .bind(s.id.inner() as i64)
            .bind(s.username.to_lowercase())
            .bind(&s.password_hash)
            .bind(&s.email)
            .bind(s.aktiv as i64)
            .bind(s.registriert_am.to_rfc3339())
            .bind(s.permaban as i64)
            .bind(s.hausarrest as i64)
            .bind(s.approval as i64)
            .bind(s.rejection as i64)
            .bind(s.coins as i64)
            .bind(s.safe_chat as i64)
            .bind(s.moderator as i64)
            .bind(s.stealth_moderator as i64)
            .bind(s.charakter.map(|c| c as i64))
            .bind(s.agent_status as i64)
            .bind(s.minuten_gespielt as i64)
            .bind(s.playercard_geoeffnet as i64)
            .bind(s.map_kategorie as i64)
            .bind(s.status_feld as i64)
            .bind(s.buch_geaendert as i64)
            .execute(&self.pool)
            .await
            .map_err(|e| DbError::beim_anlegen(e, &s.username))?;
        Ok(())
    }

    async fn buddy_hinzufuegen(&self, id: Pid, buddy: Pid) -> DbResult<()> {
        sqlx::query("INSERT OR IGNORE INTO buddies (spieler_id, buddy_id) VALUES (?, ?)")
            .bind(id.inner() as i64)
            .bind(buddy.inner() as i64)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn ban_anlegen(&self, ban: NeuerBan<'_>) -> DbResult<BanRecord> {
        let jetzt = Utc::now();
        let ergebnis = sqlx::query(
            "INSERT INTO bans (spieler_id, grund, laeuft_ab, erstellt_am) VALUES (?, ?, ?, ?)",
        )
        .bind(ban.spieler_id.inner() as i64)
        .bind(ban.grund)
        .bind(ban.laeuft_ab.to_rfc3339())
        .bind(jetzt.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(BanRecord {
            id: ergebnis.last_insert_rowid(),
            spieler_id: ban.spieler_id,
            grund: ban.grund.to_string(),
            laeuft_ab: ban.laeuft_ab,
            erstellt_am: jetzt,
        })
    }
}

// ---------------------------------------------------------------------------
// Hilfsfunktionen
// ---------------------------------------------------------------------------

fn pid_aus_i64(wert: i64) -> DbResult<Pid> {
    u32::try_from(wert)
        .map(Pid)
        .map_err(|_| DbError::UngueltigeDaten(format!("Ungueltige Spieler-ID {wert}")))
}

fn zeit_parsen(text: &str, spalte: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::UngueltigeDaten(format!("{spalte} '{text}': {e}")))
}

fn zahl<T: TryFrom<i64>>(row: &sqlx::sqlite::SqliteRow, spalte: &str) -> DbResult<T> {
    let wert: i64 = row.try_get(spalte)?;
    T::try_from(wert)
        .map_err(|_| DbError::UngueltigeDaten(format!("{spalte} ausserhalb des Wertebereichs: {wert}")))
}

fn flag(row: &sqlx::sqlite::SqliteRow, spalte: &str) -> DbResult<bool> {
    let wert: i64 = row.try_get(spalte)?;
    Ok(wert != 0)
}

fn row_to_spieler(row: &sqlx::sqlite::SqliteRow) -> DbResult<SpielerRecord> {
    let id: i64 = row.try_get("id")?;
    let registriert_am: String = row.try_get("registriert_am")?;
    let charakter: Option<i64> = row.try_get("charakter")?;

    Ok(SpielerRecord {
        id: pid_aus_i64(id)?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        email: row.try_get("email")?,
        aktiv: flag(row, "aktiv")?,
        registriert_am: zeit_parsen(&registriert_am, "registriert_am")?,
        permaban: flag(row, "permaban")?,
        hausarrest: flag(row, "hausarrest")?,
        approval: zahl(row, "approval")?,
        rejection: zahl(row, "rejection")?,
        coins: zahl(row, "coins")?,
        safe_chat: flag(row, "safe_chat")?,
        moderator: flag(row, "moderator")?,
        stealth_moderator: flag(row, "stealth_moderator")?,
        charakter: charakter
            .map(|c| {
                u32::try_from(c)
                    .map_err(|_| DbError::UngueltigeDaten(format!("Ungueltiger Charakter {c}")))
            })
            .transpose()?,
        agent_status: flag(row, "agent_status")?,
        minuten_gespielt: zahl(row, "minuten_gespielt")?,
        playercard_geoeffnet: flag(row, "playercard_geoeffnet")?,
        map_kategorie: zahl(row, "map_kategorie")?,
        status_feld: zahl(row, "status_feld")?,
        buch_geaendert: zahl(row, "buch_geaendert")?,
    })
}

fn row_to_ban(row: &sqlx::sqlite::SqliteRow) -> DbResult<BanRecord> {
    let spieler_id: i64 = row.try_get("spieler_id")?;
    let laeuft_ab: String = row.try_get("laeuft_ab")?;
    let erstellt_am: String = row.try_get("erstellt_am")?;

    Ok(BanRecord {
        id: row.try_get("id")?,
        spieler_id: pid_aus_i64(spieler_id)?,
        grund: row.try_get("grund")?,
        laeuft_ab: zeit_parsen(&laeuft_ab, "laeuft_ab")?,
        erstellt_am: zeit_parsen(&erstellt_am, "erstellt_am")?,
    })
}
