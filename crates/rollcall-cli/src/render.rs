//! Plain-text rendering of profiles, user pages and bulk results.

use rollcall_core::models::{BulkResult, BulkRowStatus, Identity, UserListResponse};
use rollcall_core::utils::{format_date, format_optional, truncate_string};

/// Placeholder for an absent value
const EMPTY: &str = "—";

/// Placeholder for an unassigned school ID
const NOT_SET: &str = "not set";

/// Column width for names in the user table
const NAME_WIDTH: usize = 20;

/// Column width for email addresses in the user table
const EMAIL_WIDTH: usize = 28;

pub fn identity_lines(me: &Identity) -> Vec<(&'static str, String)> {
    vec![
        ("Name", me.full_name.clone()),
        ("Name (kana)", format_optional(me.full_name_kana.as_deref(), EMPTY)),
        ("Role", me.role.to_string()),
        ("School ID", format_optional(me.school_person_id.as_deref(), NOT_SET)),
        ("Email", me.email.clone()),
        ("Grade", format_optional(me.grade, EMPTY)),
        ("Class", format_optional(me.class_name.as_deref(), EMPTY)),
        ("Gender", me.gender.clone()),
        ("Date of birth", format_optional(me.date_of_birth, EMPTY)),
    ]
}

pub fn print_identity(me: &Identity) {
    for (label, value) in identity_lines(me) {
        println!("{:<14} {}", format!("{}:", label), value);
    }
}

pub fn user_table(list: &UserListResponse) -> Vec<String> {
    let mut lines = vec![format!(
        "{:>6}  {:<8}  {:<nw$}  {:<ew$}  {:>5}  {:<6}  {:<10}  {}",
        "ID",
        "Role",
        "Name",
        "Email",
        "Grade",
        "Class",
        "School ID",
        "Updated",
        nw = NAME_WIDTH,
        ew = EMAIL_WIDTH,
    )];

    for user in &list.items {
        let mut name = truncate_string(&user.full_name, NAME_WIDTH);
        if user.is_deleted {
            name = truncate_string(&format!("{} (deleted)", user.full_name), NAME_WIDTH);
        }
        lines.push(format!(
            "{:>6}  {:<8}  {:<nw$}  {:<ew$}  {:>5}  {:<6}  {:<10}  {}",
            user.id,
            user.role.to_string(),
            name,
            truncate_string(&user.email, EMAIL_WIDTH),
            format_optional(user.grade, EMPTY),
            format_optional(user.class_name.as_deref(), EMPTY),
            format_optional(user.school_person_id.as_deref(), EMPTY),
            format_date(&user.updated_at),
            nw = NAME_WIDTH,
            ew = EMAIL_WIDTH,
        ));
    }

    lines.push(format!(
        "Page {} of {} ({} users)",
        list.page,
        list.total_pages(),
        list.total
    ));
    lines
}

pub fn bulk_lines(result: &BulkResult) -> Vec<String> {
    let mut lines = vec![format!(
        "Total: {}  OK: {}  Errors: {}",
        result.total, result.success, result.errors
    )];
    for row in &result.rows {
        let status = match row.status {
            BulkRowStatus::Ok => "ok",
            BulkRowStatus::Error => "ERROR",
        };
        match row.message.as_deref().filter(|m| !m.is_empty()) {
            Some(message) => lines.push(format!("  line {:>4}  {:<5}  {}", row.line_number, status, message)),
            None => lines.push(format!("  line {:>4}  {}", row.line_number, status)),
        }
    }
    lines
}
