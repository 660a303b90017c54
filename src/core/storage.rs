//! Award repository - create/read/update/delete over a single stored JSON blob.
//!
//! The whole collection is one JSON array kept under [`AWARDS_KEY`] in the
//! `system_state` table. Every mutation loads the array, changes it and writes it
//! back inside one database transaction, so a failed write leaves the stored
//! collection untouched. There is no merge: the last write wins.
//!
//! Missing records are not errors. Update-style functions return `Ok(None)` and
//! [`delete_award`] returns `Ok(false)` when the id is unknown.

use crate::{
    config::{BankRegistry, Config},
    core::award::{Award, AwardUpdate, NewAward, RecordRejection, StoredAward},
    entities::{SystemState, system_state},
    errors::{Error, Result},
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{Set, TransactionTrait, prelude::*};
use tracing::{debug, info, instrument, warn};

/// Key under which the award array is stored.
pub const AWARDS_KEY: &str = "macau-spending-rewards-awards";

/// Reads a raw value from the key-value `system_state` table.
pub async fn get_state_value<C>(db: &C, key: &str) -> Result<Option<String>>
where
    C: ConnectionTrait,
{
    let state = SystemState::find()
        .filter(system_state::Column::Key.eq(key))
        .one(db)
        .await?;
    Ok(state.map(|s| s.value))
}

/// Inserts or replaces a raw value in the key-value `system_state` table.
pub async fn set_state_value<C>(db: &C, key: &str, value: String) -> Result<()>
where
    C: ConnectionTrait,
{
    let now = Utc::now().naive_utc();

    let existing = SystemState::find()
        .filter(system_state::Column::Key.eq(key))
        .one(db)
        .await?;

    if let Some(state) = existing {
        let mut active_model: system_state::ActiveModel = state.into();
        active_model.value = Set(value);
        active_model.updated_at = Set(now);
        active_model.update(db).await?;
    } else {
        let new_state = system_state::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value),
            updated_at: Set(now),
            ..Default::default()
        };
        new_state.insert(db).await?;
    }

    Ok(())
}

/// Loads and migrates the stored collection.
///
/// Each element is decoded on its own. Records of the wrong shape, or that cannot be
/// turned into an award even after migration, are skipped with a warning. A blob
/// that is not a JSON array at all is an error, so that it is never silently
/// overwritten.
async fn load_awards<C>(db: &C, banks: &BankRegistry) -> Result<Vec<Award>>
where
    C: ConnectionTrait,
{
    let Some(raw) = get_state_value(db, AWARDS_KEY).await? else {
        return Ok(Vec::new());
    };

    let records: Vec<serde_json::Value> = serde_json::from_str(&raw)?;
    let total = records.len();
    let awards: Vec<Award> = records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| {
            let parsed = serde_json::from_value::<StoredAward>(record)
                .map_err(|_| RecordRejection::NotAnAward)
                .and_then(|stored| stored.migrate(banks).into_award());
            match parsed {
                Ok(award) => Some(award),
                Err(reason) => {
                    warn!("Skipping stored award #{index}: {reason}");
                    None
                }
            }
        })
        .collect();

    debug!("Loaded {} of {total} stored awards", awards.len());
    Ok(awards)
}

async fn save_awards<C>(db: &C, awards: &[Award]) -> Result<()>
where
    C: ConnectionTrait,
{
    let json = serde_json::to_string(awards)?;
    set_state_value(db, AWARDS_KEY, json).await
}

/// Returns every award in insertion order.
#[instrument(skip(db, banks))]
pub async fn list_awards(db: &DatabaseConnection, banks: &BankRegistry) -> Result<Vec<Award>> {
    load_awards(db, banks).await
}

/// Finds one award by id.
pub async fn get_award(
    db: &DatabaseConnection,
    banks: &BankRegistry,
    id: &str,
) -> Result<Option<Award>> {
    Ok(load_awards(db, banks)
        .await?
        .into_iter()
        .find(|award| award.id == id))
}

/// Validates and stores a single award.
///
/// # Errors
/// Returns the validation error from [`NewAward::into_award`], or a database error.
#[instrument(skip(db, config))]
pub async fn create_award(
    db: &DatabaseConnection,
    config: &Config,
    new_award: NewAward,
    today: NaiveDate,
) -> Result<Award> {
    let mut created = create_awards(db, config, vec![new_award], today).await?;
    created.pop().ok_or(Error::InvalidBatch {
        count: 0,
        max: config.rules.max_batch_size,
    })
}

/// Validates and stores a batch of awards submitted together.
///
/// The batch must hold between one and `max_batch_size` awards. Either every award
/// is valid and all are stored, or nothing is stored.
#[instrument(skip(db, config))]
pub async fn create_awards(
    db: &DatabaseConnection,
    config: &Config,
    new_awards: Vec<NewAward>,
    today: NaiveDate,
) -> Result<Vec<Award>> {
    let max = config.rules.max_batch_size;
    if new_awards.is_empty() || new_awards.len() > max {
        return Err(Error::InvalidBatch {
            count: new_awards.len(),
            max,
        });
    }

    let created = new_awards
        .into_iter()
        .map(|new_award| new_award.into_award(config, today))
        .collect::<Result<Vec<_>>>()?;

    let txn = db.begin().await?;
    let mut awards = load_awards(&txn, &config.banks).await?;
    awards.extend(created.iter().cloned());
    save_awards(&txn, &awards).await?;
    txn.commit().await?;

    info!("Created {} award(s)", created.len());
    Ok(created)
}

/// Applies field-level edits to an award.
///
/// Returns `Ok(None)` if no award has this id.
#[instrument(skip(db, config))]
pub async fn update_award(
    db: &DatabaseConnection,
    config: &Config,
    id: &str,
    update: AwardUpdate,
    today: NaiveDate,
) -> Result<Option<Award>> {
    let txn = db.begin().await?;
    let mut awards = load_awards(&txn, &config.banks).await?;

    let Some(slot) = awards.iter_mut().find(|award| award.id == id) else {
        debug!("Update of unknown award {id} ignored");
        return Ok(None);
    };

    let updated = update.apply(slot, config, today)?;
    *slot = updated.clone();

    save_awards(&txn, &awards).await?;
    txn.commit().await?;

    info!("Updated award {id}");
    Ok(Some(updated))
}

/// Flips the redeemed flag of an award, stamping `now` as the redemption time when
/// it becomes redeemed and clearing it otherwise.
///
/// This does not check expiry; see
/// [`can_toggle_redeemed`](crate::core::eligibility::can_toggle_redeemed).
pub async fn toggle_redeemed(
    db: &DatabaseConnection,
    config: &Config,
    id: &str,
    now: DateTime<Utc>,
) -> Result<Option<Award>> {
    let Some(award) = get_award(db, &config.banks, id).await? else {
        return Ok(None);
    };
    let update = AwardUpdate::toggle_redeemed(&award, now);
    update_award(db, config, id, update, now.date_naive()).await
}

/// Sets or clears the merchant of an award.
pub async fn set_merchant(
    db: &DatabaseConnection,
    config: &Config,
    id: &str,
    merchant: Option<String>,
    today: NaiveDate,
) -> Result<Option<Award>> {
    update_award(db, config, id, AwardUpdate::merchant(merchant), today).await
}

/// Deletes an award. Returns `Ok(false)` if no award has this id.
#[instrument(skip(db, banks))]
pub async fn delete_award(db: &DatabaseConnection, banks: &BankRegistry, id: &str) -> Result<bool> {
    let txn = db.begin().await?;
    let mut awards = load_awards(&txn, banks).await?;
    let before = awards.len();
    awards.retain(|award| award.id != id);

    if awards.len() == before {
        return Ok(false);
    }

    save_awards(&txn, &awards).await?;
    txn.commit().await?;

    info!("Deleted award {id}");
    Ok(true)
}

/// Replaces the entire collection.
#[instrument(skip(db, awards), fields(count = awards.len()))]
pub async fn replace_all(db: &DatabaseConnection, awards: &[Award]) -> Result<()> {
    save_awards(db, awards).await?;
    info!("Replaced award collection with {} award(s)", awards.len());
    Ok(())
}

/// Removes every award.
pub async fn clear_awards(db: &DatabaseConnection) -> Result<()> {
    replace_all(db, &[]).await
}

/// Merchant names already used, filtered by a case-insensitive substring and sorted.
#[must_use]
pub fn merchant_suggestions(awards: &[Award], partial: &str) -> Vec<String> {
    let partial_lower = partial.trim().to_lowercase();
    let mut merchants: Vec<String> = awards
        .iter()
        .filter_map(|award| award.merchant.as_deref())
        .filter(|merchant| merchant.to_lowercase().contains(&partial_lower))
        .map(str::to_string)
        .collect();
    merchants.sort();
    merchants.dedup();
    merchants
}
