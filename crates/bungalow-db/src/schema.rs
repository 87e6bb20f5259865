//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode. UUIDs (record keys and
//! cross-resource references) are stored as strings, enums as strings
//! with ASSERT constraints, and money as `decimal`.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Cabins
-- =======================================================================
DEFINE TABLE cabin SCHEMAFULL;
DEFINE FIELD name ON TABLE cabin TYPE string;
DEFINE FIELD name_lower_case ON TABLE cabin TYPE string;
DEFINE FIELD max_capacity ON TABLE cabin TYPE int ASSERT $value >= 1;
DEFINE FIELD regular_price ON TABLE cabin TYPE decimal;
DEFINE FIELD discount ON TABLE cabin TYPE decimal DEFAULT 0dec;
DEFINE FIELD description ON TABLE cabin TYPE option<string>;
DEFINE FIELD images ON TABLE cabin TYPE array<string> DEFAULT [];
DEFINE FIELD image ON TABLE cabin TYPE option<string>;
DEFINE FIELD created_at ON TABLE cabin TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE cabin TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_cabin_name ON TABLE cabin \
    COLUMNS name_lower_case UNIQUE;

-- =======================================================================
-- Guests
-- =======================================================================
DEFINE TABLE guest SCHEMAFULL;
DEFINE FIELD full_name ON TABLE guest TYPE string;
DEFINE FIELD full_name_lower_case ON TABLE guest TYPE string;
DEFINE FIELD email ON TABLE guest TYPE string;
DEFINE FIELD national_id ON TABLE guest TYPE string;
DEFINE FIELD nationality ON TABLE guest TYPE string;
DEFINE FIELD country_flag ON TABLE guest TYPE option<string>;
DEFINE FIELD created_at ON TABLE guest TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE guest TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_guest_email ON TABLE guest \
    COLUMNS email UNIQUE;

-- =======================================================================
-- Bookings
-- =======================================================================
DEFINE TABLE booking SCHEMAFULL;
DEFINE FIELD cabin_id ON TABLE booking TYPE string;
DEFINE FIELD guest_id ON TABLE booking TYPE string;
DEFINE FIELD start_date ON TABLE booking TYPE datetime;
DEFINE FIELD num_nights ON TABLE booking TYPE int ASSERT $value >= 1;
DEFINE FIELD end_date ON TABLE booking TYPE datetime;
DEFINE FIELD hotel_time_zone ON TABLE booking TYPE string;
DEFINE FIELD num_guests ON TABLE booking TYPE int ASSERT $value >= 1;
DEFINE FIELD status ON TABLE booking TYPE string \
    ASSERT $value IN ['unconfirmed', 'checked-in', 'checked-out'];
DEFINE FIELD has_breakfast ON TABLE booking TYPE bool DEFAULT false;
DEFINE FIELD is_paid ON TABLE booking TYPE bool DEFAULT false;
DEFINE FIELD cabin_price ON TABLE booking TYPE decimal;
DEFINE FIELD extra_price ON TABLE booking TYPE option<decimal>;
DEFINE FIELD total_price ON TABLE booking TYPE decimal;
DEFINE FIELD observations ON TABLE booking TYPE option<string>;
DEFINE FIELD pnr_code ON TABLE booking TYPE string;
DEFINE FIELD created_at ON TABLE booking TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE booking TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_booking_pnr ON TABLE booking \
    COLUMNS pnr_code UNIQUE;
DEFINE INDEX idx_booking_cabin ON TABLE booking COLUMNS cabin_id;
DEFINE INDEX idx_booking_guest ON TABLE booking COLUMNS guest_id;
DEFINE INDEX idx_booking_created ON TABLE booking COLUMNS created_at;

-- =======================================================================
-- Settings
-- =======================================================================
DEFINE TABLE settings SCHEMAFULL;
DEFINE FIELD min_booking_length ON TABLE settings TYPE int \
    ASSERT $value >= 1;
DEFINE FIELD max_booking_length ON TABLE settings TYPE int \
    ASSERT $value >= 1;
DEFINE FIELD max_guests_per_booking ON TABLE settings TYPE int \
    ASSERT $value >= 1;
DEFINE FIELD breakfast_price ON TABLE settings TYPE decimal;
DEFINE FIELD is_active ON TABLE settings TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE settings TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE settings TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_settings_active ON TABLE settings COLUMNS is_active;

-- =======================================================================
-- Staff users
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD full_name ON TABLE user TYPE string;
DEFINE FIELD full_name_lower_case ON TABLE user TYPE string;
DEFINE FIELD role ON TABLE user TYPE string \
    ASSERT $value IN ['receptionist', 'manager', 'admin', 'superAdmin'];
DEFINE FIELD is_active ON TABLE user TYPE bool DEFAULT false;
DEFINE FIELD lang ON TABLE user TYPE string DEFAULT 'en';
DEFINE FIELD dark_mode ON TABLE user TYPE bool DEFAULT false;
DEFINE FIELD avatar ON TABLE user TYPE option<string>;
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_email ON TABLE user \
    COLUMNS email UNIQUE;
";

/// Returns the raw SurrealQL for schema v1 (useful for inspection).
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

/// Run all pending migrations against the given database connection.
///
/// Migrations are tracked in the `_migration` table, so calling this
/// repeatedly is a no-op once the schema is current.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }
        info!(
            version = migration.version,
            name = migration.name,
            "Applying migration"
        );
        db.query(migration.sql).await?.check().map_err(|e| {
            DbError::Migration(format!(
                "Migration v{} '{}' failed: {}",
                migration.version, migration.name, e,
            ))
        })?;

        db.query("CREATE _migration SET version = $version, name = $name")
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

        info!(version = migration.version, "Migration applied");
    }

    Ok(())
}
