use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::ApiError;

/// Minimum password length accepted for local-ID accounts.
pub const MIN_LOCAL_PASSWORD_LENGTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

impl Role {
    /// Wire name, as used in payloads and query strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Student => write!(f, "Student"),
            Role::Teacher => write!(f, "Teacher"),
            Role::Admin => write!(f, "Admin"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "teacher" => Ok(Role::Teacher),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{}' (expected student, teacher or admin)", other)),
        }
    }
}

/// The signed-in user's profile, as returned by `GET /users/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub role: Role,
    pub full_name: String,
    #[serde(default)]
    pub full_name_kana: Option<String>,
    pub email: String,
    #[serde(default)]
    pub school_person_id: Option<String>,
    #[serde(default)]
    pub grade: Option<i32>,
    #[serde(default)]
    pub class_name: Option<String>,
    pub gender: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// One row of the admin user listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserListItem {
    pub id: i64,
    #[serde(default)]
    pub school_person_id: Option<String>,
    pub role: Role,
    pub full_name: String,
    #[serde(default)]
    pub full_name_kana: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    pub email: String,
    #[serde(default)]
    pub grade: Option<i32>,
    #[serde(default)]
    pub class_name: Option<String>,
    pub gender: String,
    pub is_active: bool,
    pub is_deleted: bool,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserListResponse {
    pub items: Vec<UserListItem>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

impl UserListResponse {
    /// Number of pages the listing spans; at least one.
    pub fn total_pages(&self) -> u32 {
        if self.page_size == 0 {
            return 1;
        }
        let pages = self.total.div_ceil(u64::from(self.page_size));
        u32::try_from(pages).unwrap_or(u32::MAX).max(1)
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }
}

/// Listing/export filter. Unset fields are left out of the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub grade: Option<i32>,
    pub class_name: Option<String>,
    pub keyword: Option<String>,
    pub include_deleted: bool,
}

impl UserFilter {
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(role) = self.role {
            query.push(("role", role.as_str().to_string()));
        }
        if let Some(grade) = self.grade {
            query.push(("grade", grade.to_string()));
        }
        if let Some(class_name) = non_blank(&self.class_name) {
            query.push(("class_name", class_name));
        }
        if let Some(keyword) = non_blank(&self.keyword) {
            query.push(("keyword", keyword));
        }
        if self.include_deleted {
            query.push(("include_deleted", "true".to_string()));
        }
        query
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn default_gender() -> String {
    "unknown".to_string()
}

/// Registration payload for an account that signs in with Google.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    pub role: Role,
    pub full_name: String,
    pub full_name_kana: Option<String>,
    pub email: String,
    #[serde(default = "default_gender")]
    pub gender: String,
    pub school_person_id: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub grade: Option<i32>,
    pub class_name: Option<String>,
}

impl NewUser {
    pub fn new(role: Role, full_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            role,
            full_name: full_name.into(),
            full_name_kana: None,
            email: email.into(),
            gender: default_gender(),
            school_person_id: None,
            date_of_birth: None,
            grade: None,
            class_name: None,
        }
    }

    /// Payload as sent: blank optionals become null and only students keep
    /// grade and class.
    pub fn normalized(&self) -> Self {
        let student = self.role == Role::Student;
        Self {
            role: self.role,
            full_name: self.full_name.clone(),
            full_name_kana: non_blank(&self.full_name_kana),
            email: self.email.clone(),
            gender: self.gender.clone(),
            school_person_id: non_blank(&self.school_person_id),
            date_of_birth: self.date_of_birth,
            grade: if student { self.grade } else { None },
            class_name: if student { non_blank(&self.class_name) } else { None },
        }
    }
}

/// Registration payload for a teacher or admin signing in with a local ID.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLocalUser {
    pub role: Role,
    pub full_name: String,
    pub full_name_kana: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default = "default_gender")]
    pub gender: String,
    pub email: String,
    pub school_person_id: Option<String>,
    pub login_id: String,
    pub password: String,
}

impl NewLocalUser {
    pub fn new(
        full_name: impl Into<String>,
        email: impl Into<String>,
        login_id: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            role: Role::Teacher,
            full_name: full_name.into(),
            full_name_kana: None,
            date_of_birth: None,
            gender: default_gender(),
            email: email.into(),
            school_person_id: None,
            login_id: login_id.into(),
            password: password.into(),
        }
    }

    /// Local checks run before anything is sent.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.password.chars().count() < MIN_LOCAL_PASSWORD_LENGTH {
            return Err(ApiError::Validation(format!(
                "Password must be at least {} characters",
                MIN_LOCAL_PASSWORD_LENGTH
            )));
        }
        Ok(())
    }

    pub fn normalized(&self) -> Self {
        Self {
            full_name_kana: non_blank(&self.full_name_kana),
            school_person_id: non_blank(&self.school_person_id),
            ..self.clone()
        }
    }
}

impl fmt::Debug for NewLocalUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewLocalUser")
            .field("role", &self.role)
            .field("full_name", &self.full_name)
            .field("email", &self.email)
            .field("login_id", &self.login_id)
            .field("password", &"<redacted>")
            .finish_non_exhaustive()
    }
}
