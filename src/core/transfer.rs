//! JSON backup export and import.
//!
//! Import is two-step: [`parse_import`] validates a file into an [`ImportPreview`]
//! without touching storage, then [`apply_import`] replaces the whole collection.
//! Replacing existing data needs explicit confirmation.

use crate::{
    config::BankRegistry,
    core::{
        award::{Award, RecordRejection, StoredAward},
        storage,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

/// Format version written to export files.
pub const EXPORT_VERSION: &str = "1.0";

/// Application name written to export files.
pub const APP_NAME: &str = "澳門消費獎賞記錄器";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportFile<'a> {
    awards: &'a [Award],
    export_date: String,
    version: &'static str,
    app_name: &'static str,
}

/// Serializes the whole collection as a pretty-printed backup file.
pub fn export_awards(awards: &[Award], now: DateTime<Utc>) -> Result<String> {
    let file = ExportFile {
        awards,
        export_date: now.to_rfc3339(),
        version: EXPORT_VERSION,
        app_name: APP_NAME,
    };
    Ok(serde_json::to_string_pretty(&file)?)
}

/// Suggested file name for a backup taken at `now`.
#[must_use]
pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!("award-buddy-backup-{}.json", now.format("%Y-%m-%d"))
}

/// Result of validating an import file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportPreview {
    /// Records that passed validation, in file order
    pub accepted: Vec<Award>,
    /// Position in the file and reason for every dropped record
    pub rejected: Vec<(usize, RecordRejection)>,
}

fn import_records(json: &str) -> Result<Vec<Value>> {
    let document: Value = serde_json::from_str(json).map_err(|e| Error::MalformedImport {
        message: format!("not valid JSON: {e}"),
    })?;

    match document {
        Value::Array(records) => Ok(records),
        Value::Object(mut object) => match object.remove("awards") {
            Some(Value::Array(records)) => Ok(records),
            _ => Err(Error::MalformedImport {
                message: "missing \"awards\" array".to_string(),
            }),
        },
        _ => Err(Error::MalformedImport {
            message: "expected an object with an \"awards\" array".to_string(),
        }),
    }
}

/// Validates an import file.
///
/// Accepts an export file or a bare array of award records. Records missing a
/// required field (including `bank`) or carrying an unsupported value are dropped
/// and reported in [`ImportPreview::rejected`]; the rest go through the same
/// migration as stored data.
///
/// # Errors
/// Returns [`Error::MalformedImport`] when the file is not JSON of the expected
/// shape or when no record survives validation.
#[instrument(skip(json, banks))]
pub fn parse_import(json: &str, banks: &BankRegistry) -> Result<ImportPreview> {
    let records = import_records(json)?;
    let total = records.len();

    let mut preview = ImportPreview {
        accepted: Vec::with_capacity(total),
        rejected: Vec::new(),
    };

    for (index, record) in records.into_iter().enumerate() {
        let parsed = serde_json::from_value::<StoredAward>(record)
            .map_err(|_| RecordRejection::NotAnAward)
            .and_then(|stored| {
                stored.check_required()?;
                stored.migrate(banks).into_award()
            });

        match parsed {
            Ok(award) => preview.accepted.push(award),
            Err(reason) => {
                warn!("Dropping import record #{index}: {reason}");
                preview.rejected.push((index, reason));
            }
        }
    }

    if preview.accepted.is_empty() {
        return Err(Error::MalformedImport {
            message: format!("none of the {total} record(s) is a valid award"),
        });
    }

    info!(
        "Import preview: {} accepted, {} rejected",
        preview.accepted.len(),
        preview.rejected.len()
    );
    Ok(preview)
}

/// Replaces the stored collection with the previewed awards.
///
/// Returns the number of imported awards.
///
/// # Errors
/// Returns [`Error::ImportNotConfirmed`] when awards are already stored and
/// `confirmed` is false. Nothing is written in that case.
#[instrument(skip(db, banks, preview), fields(incoming = preview.accepted.len()))]
pub async fn apply_import(
    db: &DatabaseConnection,
    banks: &BankRegistry,
    preview: ImportPreview,
    confirmed: bool,
) -> Result<usize> {
    let existing = storage::list_awards(db, banks).await?.len();
    if existing > 0 && !confirmed {
        return Err(Error::ImportNotConfirmed {
            incoming: preview.accepted.len(),
            existing,
        });
    }

    storage::replace_all(db, &preview.accepted).await?;
    info!("Imported {} award(s), replacing {existing}", preview.accepted.len());
    Ok(preview.accepted.len())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::config::rules::DEFAULT_FALLBACK_BANK;
    use crate::test_utils::*;

    const TWO_VALID_ONE_BROKEN: &str = r#"{
        "awards": [
            {"id": "a1", "value": 100, "bank": "大豐銀行股份有限公司",
             "drawDate": "2025-09-01", "expiryDate": "2025-09-07", "redeemed": false},
            {"id": "a2", "value": 0, "isThankYou": false, "bank": "大豐銀行",
             "drawDate": "2025-09-02", "expiryDate": "2025-09-07", "redeemed": true},
            {"id": "a3", "value": 50, "bank": "大豐銀行股份有限公司",
             "expiryDate": "2025-09-07", "redeemed": false}
        ],
        "exportDate": "2025-09-10T00:00:00Z",
        "version": "1.0"
    }"#;

    #[test]
    fn test_parse_import_drops_incomplete_records() {
        let banks = test_config().banks;
        let preview = parse_import(TWO_VALID_ONE_BROKEN, &banks).unwrap();

        assert_eq!(preview.accepted.len(), 2);
        assert_eq!(preview.rejected, vec![(2, RecordRejection::MissingDrawDate)]);

        // legacy bank name mapped, thank-you flag re-derived
        let second = &preview.accepted[1];
        assert_eq!(second.bank, "大豐銀行股份有限公司");
        assert!(second.is_thank_you());
        assert!(second.redeemed);
    }

    #[test]
    fn test_parse_import_rejects_record_without_bank() {
        let banks = test_config().banks;
        let json = r#"[
            {"id": "a", "value": 10, "bank": "大豐銀行股份有限公司",
             "drawDate": "2025-09-01", "expiryDate": "2025-09-07"},
            {"id": "b", "value": 10, "drawDate": "2025-09-01", "expiryDate": "2025-09-07"},
            {"id": "c", "value": 10, "bank": "  ", "drawDate": "2025-09-01", "expiryDate": "2025-09-07"}
        ]"#;
        let preview = parse_import(json, &banks).unwrap();
        assert_eq!(preview.accepted.len(), 1);
        assert_eq!(preview.accepted[0].id, "a");
        assert_eq!(
            preview.rejected,
            vec![
                (1, RecordRejection::MissingBank),
                (2, RecordRejection::MissingBank)
            ]
        );
        assert!(preview.accepted.iter().all(|a| a.bank != DEFAULT_FALLBACK_BANK));
    }

    #[test]
    fn test_parse_import_rejects_unsupported_value() {
        let banks = test_config().banks;
        let json = r#"[
            {"id": "a", "value": 2000000000, "bank": "大豐銀行股份有限公司",
             "drawDate": "2025-09-01", "expiryDate": "2025-09-07"},
            {"id": "b", "value": 200, "bank": "大豐銀行股份有限公司",
             "drawDate": "2025-09-01", "expiryDate": "2025-09-07"}
        ]"#;
        let preview = parse_import(json, &banks).unwrap();
        assert_eq!(preview.rejected, vec![(0, RecordRejection::UnsupportedValue)]);

        let summary = crate::core::report::summarize(
            &preview.accepted,
            &banks,
            date(2025, 9, 6).and_hms_opt(12, 0, 0).unwrap(),
        );
        assert_eq!(summary.totals.total.value, 200);
    }

    #[test]
    fn test_parse_import_accepts_bare_array() {
        let banks = test_config().banks;
        let json = r#"[{"id": "x", "value": 10, "bank": "大豐銀行股份有限公司",
                        "drawDate": "2025-09-01", "expiryDate": "2025-09-07"}]"#;
        let preview = parse_import(json, &banks).unwrap();
        assert_eq!(preview.accepted.len(), 1);
        assert!(!preview.accepted[0].redeemed);
    }

    #[test]
    fn test_parse_import_rejects_when_nothing_valid() {
        let banks = test_config().banks;
        let json = r#"{"awards": [{"value": 10}, "junk", 42]}"#;
        assert!(matches!(
            parse_import(json, &banks),
            Err(Error::MalformedImport { .. })
        ));
        assert!(matches!(
            parse_import(r#"{"awards": []}"#, &banks),
            Err(Error::MalformedImport { .. })
        ));
    }

    #[test]
    fn test_parse_import_rejects_wrong_shape() {
        let banks = test_config().banks;
        for json in ["not json", "{}", "\"text\"", r#"{"awards": {}}"#] {
            assert!(
                matches!(parse_import(json, &banks), Err(Error::MalformedImport { .. })),
                "{json} should be rejected"
            );
        }
    }

    #[test]
    fn test_export_file_shape() {
        let awards = vec![sample_award(0, date(2025, 9, 1))];
        let now = date(2025, 9, 10).and_hms_opt(8, 0, 0).unwrap().and_utc();
        let json = export_awards(&awards, now).unwrap();
        let document: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(document["version"], "1.0");
        assert_eq!(document["appName"], APP_NAME);
        assert_eq!(document["exportDate"], "2025-09-10T08:00:00+00:00");
        assert_eq!(document["awards"][0]["drawDate"], "2025-09-01");
        assert_eq!(document["awards"][0]["expiryDate"], "2025-09-07");
        assert_eq!(document["awards"][0]["isThankYou"], true);
        assert_eq!(export_file_name(now), "award-buddy-backup-2025-09-10.json");
    }

    #[test]
    fn test_export_can_be_imported() {
        let banks = test_config().banks;
        let awards = vec![
            with_merchant(sample_award(100, date(2025, 9, 1)), "Cafe"),
            sample_award(20, date(2025, 9, 3)),
        ];
        let now = date(2025, 9, 10).and_hms_opt(8, 0, 0).unwrap().and_utc();
        let preview = parse_import(&export_awards(&awards, now).unwrap(), &banks).unwrap();
        assert_eq!(preview.accepted, awards);
        assert!(preview.rejected.is_empty());
    }

    #[tokio::test]
    async fn test_apply_import_into_empty_repository() -> Result<()> {
        let db = setup_test_db().await?;
        let banks = test_config().banks;
        let preview = parse_import(TWO_VALID_ONE_BROKEN, &banks)?;

        let imported = apply_import(&db, &banks, preview, false).await?;
        assert_eq!(imported, 2);
        assert_eq!(storage::list_awards(&db, &banks).await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_apply_import_requires_confirmation_to_replace() -> Result<()> {
        let db = setup_test_db().await?;
        let config = test_config();
        storage::create_award(
            &db,
            &config,
            new_award_input(10, date(2025, 9, 1)),
            date(2025, 9, 1),
        )
        .await?;

        let preview = parse_import(TWO_VALID_ONE_BROKEN, &config.banks)?;
        let result = apply_import(&db, &config.banks, preview.clone(), false).await;
        assert!(matches!(
            result,
            Err(Error::ImportNotConfirmed {
                incoming: 2,
                existing: 1
            })
        ));
        assert_eq!(storage::list_awards(&db, &config.banks).await?.len(), 1);

        apply_import(&db, &config.banks, preview, true).await?;
        let ids: Vec<String> = storage::list_awards(&db, &config.banks)
            .await?
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec!["a1".to_string(), "a2".to_string()]);
        Ok(())
    }
}
