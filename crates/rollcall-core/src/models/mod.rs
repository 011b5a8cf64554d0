//! Data models exchanged with the user-management API.
//!
//! - `Identity`: the signed-in user's own profile
//! - `UserListItem`, `UserListResponse`, `UserFilter`: the admin listing
//! - `NewUser`, `NewLocalUser`: registration payloads
//! - `BulkResult`, `BulkRowResult`: per-row outcomes of CSV bulk operations

pub mod bulk;
pub mod user;

pub use bulk::{BulkKind, BulkResult, BulkRowResult, BulkRowStatus, ExportKind};
pub use user::{Identity, NewLocalUser, NewUser, Role, UserFilter, UserListItem, UserListResponse};
