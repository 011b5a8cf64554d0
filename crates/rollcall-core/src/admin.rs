//! Administrative user operations.
//!
//! `UserAdmin` wraps the `/admin/users*` endpoints. Each call obtains a
//! token through the session manager first and fails with
//! `ApiError::Unauthenticated` when none can be had.
//!
//! CSV bulk operations are two-phase: `preview` runs the file as a dry run,
//! and `commit` replays the same file for real only when the preview came
//! back without row errors.

use reqwest::multipart;
use tracing::{debug, info};

use crate::api::ApiError;
use crate::auth::{AccessToken, SessionManager};
use crate::models::{
    BulkKind, BulkResult, ExportKind, Identity, NewLocalUser, NewUser, UserFilter,
    UserListResponse,
};

/// Rows per page in the admin listing.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// A CSV file that has been dry-run against a bulk endpoint.
#[derive(Debug, Clone)]
pub struct BulkPreview {
    kind: BulkKind,
    file_name: String,
    contents: Vec<u8>,
    result: BulkResult,
}

impl BulkPreview {
    pub fn kind(&self) -> BulkKind {
        self.kind
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn result(&self) -> &BulkResult {
        &self.result
    }

    pub fn can_commit(&self) -> bool {
        self.result.is_clean()
    }
}

pub struct UserAdmin<'a> {
    session: &'a SessionManager,
}

impl<'a> UserAdmin<'a> {
    /// Wrap a session without checking the role. The server still enforces it.
    pub fn new(session: &'a SessionManager) -> Self {
        Self { session }
    }

    /// Fetch the identity and refuse anyone who is not an admin.
    pub async fn connect(session: &'a SessionManager) -> Result<(Self, Identity), ApiError> {
        let me = session.fetch_identity().await?;
        if !me.is_admin() {
            return Err(ApiError::AdminRequired);
        }
        Ok((Self::new(session), me))
    }

    async fn token(&self) -> Result<AccessToken, ApiError> {
        self.session
            .ensure_access_token()
            .await
            .ok_or(ApiError::Unauthenticated)
    }

    pub async fn list_users(
        &self,
        filter: &UserFilter,
        page: u32,
        page_size: u32,
    ) -> Result<UserListResponse, ApiError> {
        let token = self.token().await?;
        let mut query = vec![
            ("page", page.max(1).to_string()),
            ("page_size", page_size.to_string()),
        ];
        query.extend(filter.to_query());

        let list: UserListResponse = self
            .session
            .api()
            .get_json("/admin/users", &query, Some(token.as_str()))
            .await?;
        debug!(total = list.total, page = list.page, "Fetched user list");
        Ok(list)
    }

    pub async fn create_user(&self, user: &NewUser) -> Result<(), ApiError> {
        let token = self.token().await?;
        self.session
            .api()
            .post_json_ack("/admin/users", &user.normalized(), Some(token.as_str()))
            .await?;
        info!(email = %user.email, role = user.role.as_str(), "Registered user");
        Ok(())
    }

    /// Register a local-ID account. Short passwords are refused before any
    /// token is requested.
    pub async fn create_local_user(&self, user: &NewLocalUser) -> Result<(), ApiError> {
        user.validate()?;
        let token = self.token().await?;
        self.session
            .api()
            .post_json_ack("/admin/users/local", &user.normalized(), Some(token.as_str()))
            .await?;
        info!(login_id = %user.login_id, role = user.role.as_str(), "Registered local user");
        Ok(())
    }

    /// Soft-delete a user. The record stays visible with `include_deleted`.
    pub async fn delete_user(&self, user_id: i64) -> Result<(), ApiError> {
        let token = self.token().await?;
        self.session
            .api()
            .delete(&format!("/admin/users/{}", user_id), Some(token.as_str()))
            .await?;
        info!(user_id, "Deleted user");
        Ok(())
    }

    async fn run_bulk(
        &self,
        kind: BulkKind,
        file_name: &str,
        contents: &[u8],
        dry_run: bool,
    ) -> Result<BulkResult, ApiError> {
        let token = self.token().await?;
        let part = multipart::Part::bytes(contents.to_vec())
            .file_name(file_name.to_string())
            .mime_str("text/csv")?;
        let form = multipart::Form::new().part("file", part);
        let query = [("dry_run", dry_run.to_string())];

        let result: BulkResult = self
            .session
            .api()
            .post_multipart(kind.path(), &query, form, Some(token.as_str()))
            .await?;
        debug!(
            ?kind,
            dry_run,
            total = result.total,
            errors = result.errors,
            "Bulk request finished"
        );
        Ok(result)
    }

    /// Dry-run a CSV file and keep it for a later `commit`.
    pub async fn preview(
        &self,
        kind: BulkKind,
        file_name: impl Into<String>,
        contents: Vec<u8>,
    ) -> Result<BulkPreview, ApiError> {
        let file_name = file_name.into();
        let result = self.run_bulk(kind, &file_name, &contents, true).await?;
        Ok(BulkPreview {
            kind,
            file_name,
            contents,
            result,
        })
    }

    /// Execute a previewed file. Refused without a request if the preview had errors.
    pub async fn commit(&self, preview: &BulkPreview) -> Result<BulkResult, ApiError> {
        if !preview.can_commit() {
            return Err(ApiError::Validation(format!(
                "Preview reported {} row error(s); fix the file before executing",
                preview.result.errors
            )));
        }
        let result = self
            .run_bulk(preview.kind, &preview.file_name, &preview.contents, false)
            .await?;
        info!(kind = ?preview.kind, success = result.success, errors = result.errors, "Bulk operation executed");
        Ok(result)
    }

    /// Download users as CSV. The filter only applies to full exports.
    pub async fn export(&self, kind: ExportKind, filter: &UserFilter) -> Result<Vec<u8>, ApiError> {
        let token = self.token().await?;
        let mut query = vec![("type", kind.as_str().to_string())];
        if kind == ExportKind::Full {
            query.extend(filter.to_query());
        }
        self.session
            .api()
            .get_bytes("/admin/users/export", &query, Some(token.as_str()))
            .await
    }
}
