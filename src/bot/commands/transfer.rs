//! Backup Discord commands - `export` and `import`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{Context, Now},
        core::{
            award::RecordRejection,
            storage,
            transfer::{self, ImportPreview},
        },
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use std::fmt::Write;
    use tracing::info;

    const MAX_LISTED_REJECTIONS: usize = 10;

    fn rejection_report(rejected: &[(usize, RecordRejection)]) -> Result<String> {
        let mut report = String::new();
        if rejected.is_empty() {
            return Ok(report);
        }
        writeln!(
            &mut report,
            "⚠️ {} record(s) were skipped:",
            rejected.len()
        )?;
        for (index, reason) in rejected.iter().take(MAX_LISTED_REJECTIONS) {
            writeln!(&mut report, "• record #{}: {reason}", index + 1)?;
        }
        if rejected.len() > MAX_LISTED_REJECTIONS {
            writeln!(
                &mut report,
                "• …and {} more",
                rejected.len() - MAX_LISTED_REJECTIONS
            )?;
        }
        Ok(report)
    }

    /// Exports every award as a JSON backup file.
    #[poise::command(slash_command, prefix_command)]
    pub async fn export(ctx: Context<'_>) -> Result<()> {
        let now = Now::read();
        let data = ctx.data();
        let awards = storage::list_awards(&data.database, &data.config.banks).await?;

        let json = transfer::export_awards(&awards, now.utc)?;
        let attachment = serenity::CreateAttachment::bytes(
            json.into_bytes(),
            transfer::export_file_name(now.utc),
        );

        ctx.send(
            poise::CreateReply::default()
                .content(format!("💾 Exported {} award(s).", awards.len()))
                .attachment(attachment),
        )
        .await?;
        Ok(())
    }

    /// Replaces all awards with the contents of a JSON backup file.
    ///
    /// When awards are already stored, the command must be repeated with
    /// `confirm: true` to replace them.
    #[poise::command(slash_command)]
    pub async fn import(
        ctx: Context<'_>,
        #[description = "Backup file exported by /export"] file: serenity::Attachment,
        #[description = "Replace the existing awards (required when any exist)"]
        confirm: Option<bool>,
    ) -> Result<()> {
        let data = ctx.data();
        ctx.defer().await?;

        let bytes = file.download().await?;
        let json = String::from_utf8(bytes).map_err(|_| Error::MalformedImport {
            message: "the file is not UTF-8 text".to_string(),
        })?;

        let preview: ImportPreview = transfer::parse_import(&json, &data.config.banks)?;
        let skipped = rejection_report(&preview.rejected)?;

        match transfer::apply_import(
            &data.database,
            &data.config.banks,
            preview,
            confirm.unwrap_or(false),
        )
        .await
        {
            Ok(imported) => {
                info!("Imported {imported} award(s) from {}", file.filename);
                ctx.say(format!("✅ Imported {imported} award(s).\n{skipped}"))
                    .await?;
            }
            Err(Error::ImportNotConfirmed { incoming, existing }) => {
                ctx.say(format!(
                    "⚠️ This will replace your {existing} existing award(s) with {incoming} imported award(s).\n\
                     Run `/import` again with `confirm: true` to continue.\n{skipped}"
                ))
                .await?;
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_rejection_report() -> Result<()> {
            assert_eq!(rejection_report(&[])?, "");

            let report = rejection_report(&[(2, RecordRejection::MissingDrawDate)])?;
            assert!(report.starts_with("⚠️ 1 record(s) were skipped:"));
            assert!(report.contains("record #3: missing drawDate"));

            let many: Vec<_> = (0..12).map(|i| (i, RecordRejection::MissingId)).collect();
            let report = rejection_report(&many)?;
            assert!(report.contains("…and 2 more"));
            Ok(())
        }
    }
}

// Re-export all commands
pub use inner::*;
