//! Administrator user management.

use std::path::Path;

use anyhow::{bail, Context as _, Result};

use rollcall_core::models::{BulkKind, ExportKind, NewLocalUser, NewUser, UserFilter};
use rollcall_core::UserAdmin;

use crate::cli::{CreateArgs, CreateLocalArgs, UsersCommand};
use crate::render;

use super::{confirm, explain, explain_admin_gate, Context};

pub async fn run(ctx: &Context, command: UsersCommand) -> Result<()> {
    let session = &ctx.session;
    let (admin, _me) = UserAdmin::connect(session)
        .await
        .map_err(|e| explain_admin_gate(session, e))?;

    match command {
        UsersCommand::List { filter, page, json } => {
            let list = admin
                .list_users(&filter.into(), page, ctx.config.page_size())
                .await
                .map_err(|e| explain(session, e, "Failed to fetch the user list."))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&list)?);
            } else {
                for line in render::user_table(&list) {
                    println!("{}", line);
                }
            }
        }
        UsersCommand::Create(args) => {
            admin
                .create_user(&new_user(args))
                .await
                .map_err(|e| explain(session, e, "Registration failed."))?;
            println!("Registered.");
        }
        UsersCommand::CreateLocal(args) => {
            let password = rpassword::prompt_password("Password for the new account: ")?;
            admin
                .create_local_user(&new_local_user(args, password))
                .await
                .map_err(|e| explain(session, e, "Registration failed."))?;
            println!("Registered.");
        }
        UsersCommand::Delete { id, yes } => {
            if !yes && !confirm(&format!("Soft-delete user {}?", id))? {
                println!("Cancelled.");
                return Ok(());
            }
            admin
                .delete_user(id)
                .await
                .map_err(|e| explain(session, e, "Deletion failed."))?;
            println!("Deleted.");
        }
        UsersCommand::Import { file, commit } => {
            bulk(ctx, &admin, BulkKind::Import, &file, commit).await?;
        }
        UsersCommand::BulkDelete { file, commit } => {
            bulk(ctx, &admin, BulkKind::Delete, &file, commit).await?;
        }
        UsersCommand::Export {
            template,
            output,
            filter,
        } => {
            let kind = if template {
                ExportKind::Template
            } else {
                ExportKind::Full
            };
            let filter: UserFilter = filter.into();
            let csv = admin
                .export(kind, &filter)
                .await
                .map_err(|e| explain(session, e, "CSV export failed."))?;
            let path = output.unwrap_or_else(|| kind.file_name().into());
            std::fs::write(&path, &csv)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {} bytes to {}.", csv.len(), path.display());
        }
    }
    Ok(())
}

/// Preview a CSV file, and execute it when asked and the preview is clean.
async fn bulk(
    ctx: &Context,
    admin: &UserAdmin<'_>,
    kind: BulkKind,
    file: &Path,
    commit: bool,
) -> Result<()> {
    let session = &ctx.session;
    let contents =
        std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.csv".to_string());

    let preview = admin
        .preview(kind, file_name, contents)
        .await
        .map_err(|e| explain(session, e, "Preview failed."))?;
    println!("Preview:");
    for line in render::bulk_lines(preview.result()) {
        println!("{}", line);
    }

    if !commit {
        if preview.can_commit() {
            println!("No errors. Re-run with --commit to execute.");
        }
        return Ok(());
    }
    if !preview.can_commit() {
        bail!("The preview reported errors; nothing was executed.");
    }

    let result = admin
        .commit(&preview)
        .await
        .map_err(|e| explain(session, e, "Bulk operation failed."))?;
    println!("Executed:");
    for line in render::bulk_lines(&result) {
        println!("{}", line);
    }
    if result.is_clean() {
        println!("Done.");
    }
    Ok(())
}

fn new_user(args: CreateArgs) -> NewUser {
    let mut user = NewUser::new(args.role, args.name, args.email);
    user.full_name_kana = args.kana;
    user.gender = args.gender;
    user.school_person_id = args.school_id;
    user.date_of_birth = args.birth_date;
    user.grade = args.grade;
    user.class_name = args.class_name;
    user
}

fn new_local_user(args: CreateLocalArgs, password: String) -> NewLocalUser {
    let mut user = NewLocalUser::new(args.name, args.email, args.login_id, password);
    user.role = args.role;
    user.full_name_kana = args.kana;
    user.gender = args.gender;
    user.school_person_id = args.school_id;
    user.date_of_birth = args.birth_date;
    user
}
