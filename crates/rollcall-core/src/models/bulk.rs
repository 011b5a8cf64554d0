use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkRowStatus {
    Ok,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkRowResult {
    pub line_number: u32,
    pub status: BulkRowStatus,
    #[serde(default)]
    pub message: Option<String>,
}

/// Outcome of a CSV bulk run, dry or real.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkResult {
    pub total: u32,
    pub success: u32,
    pub errors: u32,
    #[serde(default)]
    pub rows: Vec<BulkRowResult>,
}

impl BulkResult {
    pub fn is_clean(&self) -> bool {
        self.errors == 0
    }

    pub fn failed_rows(&self) -> impl Iterator<Item = &BulkRowResult> {
        self.rows.iter().filter(|r| r.status == BulkRowStatus::Error)
    }
}

/// Which bulk endpoint a CSV file is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkKind {
    Import,
    Delete,
}

impl BulkKind {
    pub fn path(&self) -> &'static str {
        match self {
            BulkKind::Import => "/admin/users/bulk_import",
            BulkKind::Delete => "/admin/users/bulk_delete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    /// Every user matching the current filter
    Full,
    /// Header-only file to fill in for imports
    Template,
}

impl ExportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportKind::Full => "full",
            ExportKind::Template => "template",
        }
    }

    /// Default download name.
    pub fn file_name(&self) -> &'static str {
        match self {
            ExportKind::Full => "users.csv",
            ExportKind::Template => "users_template.csv",
        }
    }
}
